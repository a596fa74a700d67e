//! Great-circle distance.
//!
//! Every distance inside the workspace is in meters. Conversion to miles only
//! happens where output is formatted for display, via [`meters_to_miles`].

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

const METERS_PER_MILE: f64 = 1_609.344;

/// A validated WGS84 coordinate pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Builds a point, rejecting non-finite or out-of-range degrees.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError`] when either coordinate is NaN/infinite or
    /// outside the valid latitude/longitude range.
    pub fn new(lat: f64, lng: f64) -> Result<Self, QueryError> {
        Ok(Self {
            lat: check_latitude("lat", lat)?,
            lng: check_longitude("lng", lng)?,
        })
    }

    /// Builds a point from optional parts, returning `None` unless both are
    /// present and finite. Used for records, not caller input.
    #[must_use]
    pub fn from_parts(lat: Option<f64>, lng: Option<f64>) -> Option<Self> {
        match (lat, lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => Some(Self { lat, lng }),
            _ => None,
        }
    }

    /// Distance to `other` in meters.
    #[must_use]
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        distance_meters(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Haversine distance in meters between two coordinate pairs given in degrees.
///
/// Deterministic and always non-negative for finite input.
#[must_use]
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1] for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_METERS * c
}

#[must_use]
pub fn meters_to_miles(meters: f64) -> f64 {
    meters / METERS_PER_MILE
}

pub(crate) fn check_latitude(field: &'static str, value: f64) -> Result<f64, QueryError> {
    if !value.is_finite() {
        return Err(QueryError::NonFinite { field });
    }
    if !(-90.0..=90.0).contains(&value) {
        return Err(QueryError::LatitudeOutOfRange { field, value });
    }
    Ok(value)
}

pub(crate) fn check_longitude(field: &'static str, value: f64) -> Result<f64, QueryError> {
    if !value.is_finite() {
        return Err(QueryError::NonFinite { field });
    }
    if !(-180.0..=180.0).contains(&value) {
        return Err(QueryError::LongitudeOutOfRange { field, value });
    }
    Ok(value)
}
