//! Command handlers. Each runs one place operation and prints the result as
//! pretty JSON on stdout.

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use wayfind_core::{BoundingBox, GeoPoint};
use wayfind_places::{BoundsQuery, PlaceService};

#[derive(Debug, Args)]
pub struct BoundsArgs {
    #[arg(long, allow_negative_numbers = true)]
    pub north: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub south: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub east: f64,
    #[arg(long, allow_negative_numbers = true)]
    pub west: f64,
}

/// Optional caller location used for distance sorting.
#[derive(Debug, Args)]
pub struct LocationArgs {
    #[arg(long, allow_negative_numbers = true, requires = "lng")]
    pub lat: Option<f64>,
    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    pub lng: Option<f64>,
}

impl LocationArgs {
    pub fn point(&self) -> anyhow::Result<Option<GeoPoint>> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Ok(Some(GeoPoint::new(lat, lng)?)),
            _ => Ok(None),
        }
    }
}

pub async fn run_bounds(
    service: &PlaceService,
    bounds: &BoundsArgs,
    location: &LocationArgs,
    category: Option<String>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let bbox = BoundingBox::new(bounds.north, bounds.south, bounds.east, bounds.west)?;
    let mut query = BoundsQuery::new(bbox);
    if let Some(point) = location.point()? {
        query = query.with_location(point);
    }
    run_bounds_query(service, with_options(query, category, limit)).await
}

pub async fn run_near(
    service: &PlaceService,
    lat: f64,
    lng: f64,
    radius_m: f64,
    category: Option<String>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let query = BoundsQuery::radius(GeoPoint::new(lat, lng)?, radius_m);
    run_bounds_query(service, with_options(query, category, limit)).await
}

pub async fn run_search(
    service: &PlaceService,
    query: &str,
    location: &LocationArgs,
    limit: usize,
) -> anyhow::Result<()> {
    let results = service
        .search_places(query, location.point()?, limit)
        .await?;
    tracing::info!(count = results.len(), "search complete");
    print_json(&results)
}

pub async fn run_suggest(
    service: &PlaceService,
    query: &str,
    location: &LocationArgs,
    limit: usize,
) -> anyhow::Result<()> {
    let results = service
        .search_suggestions(query, limit, location.point()?)
        .await?;
    print_json(&results)
}

pub async fn run_place(service: &PlaceService, id: &str) -> anyhow::Result<()> {
    match service.get_place(id).await? {
        Some(place) => print_json(&place),
        None => anyhow::bail!("place {id} not found"),
    }
}

async fn run_bounds_query(service: &PlaceService, query: BoundsQuery) -> anyhow::Result<()> {
    let result = service.fetch_places_in_bounds(&query).await?;
    tracing::info!(
        total = result.metrics.total,
        fallback_triggered = result.metrics.fallback_triggered,
        "bounds fetch complete"
    );
    print_json(&result)
}

fn with_options(query: BoundsQuery, category: Option<String>, limit: Option<usize>) -> BoundsQuery {
    let query = match category {
        Some(category) => query.with_category(category),
        None => query,
    };
    match limit {
        Some(limit) => query.with_limit(limit),
        None => query,
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render JSON")?;
    println!("{rendered}");
    Ok(())
}
