//! Geographic coordinates and Spherical Mercator projection.
//!
//! # Responsibility
//! - Validate WGS84 coordinates before they reach the registry.
//! - Convert between degrees and the world (EPSG:3857) positions reported by
//!   map surfaces.
//!
//! # Invariants
//! - A `Coordinate` accepted by `Coordinate::new` is finite and in range.
//! - Projection clamps latitude to the Mercator limit; it never yields
//!   infinite `y`.

use crate::model::incident::IncidentValidationError;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt::{Display, Formatter};

pub const MIN_LATITUDE: f64 = -90.0;
pub const MAX_LATITUDE: f64 = 90.0;
pub const MIN_LONGITUDE: f64 = -180.0;
pub const MAX_LONGITUDE: f64 = 180.0;

/// Latitude beyond which Spherical Mercator diverges.
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;

/// Half the equatorial circumference of the WGS84 sphere, in metres.
const ORIGIN_SHIFT: f64 = PI * 6_378_137.0;

/// Initial map view of the incident screen.
pub const BUENOS_AIRES: Coordinate = Coordinate {
    latitude: -34.6037,
    longitude: -58.3816,
};

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a validated coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, IncidentValidationError> {
        let coordinate = Self {
            latitude,
            longitude,
        };
        coordinate.validate()?;
        Ok(coordinate)
    }

    /// Checks finiteness and degree ranges.
    pub fn validate(&self) -> Result<(), IncidentValidationError> {
        if !self.latitude.is_finite() || !self.longitude.is_finite() {
            return Err(IncidentValidationError::NonFiniteCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }
        if !(MIN_LATITUDE..=MAX_LATITUDE).contains(&self.latitude) {
            return Err(IncidentValidationError::LatitudeOutOfRange(self.latitude));
        }
        if !(MIN_LONGITUDE..=MAX_LONGITUDE).contains(&self.longitude) {
            return Err(IncidentValidationError::LongitudeOutOfRange(
                self.longitude,
            ));
        }
        Ok(())
    }

    /// Projects into Spherical Mercator metres.
    pub fn to_mercator(&self) -> MercatorPoint {
        let latitude = self
            .latitude
            .clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
        let x = self.longitude * ORIGIN_SHIFT / 180.0;
        let y = ((90.0 + latitude) * PI / 360.0).tan().ln() / (PI / 180.0);
        MercatorPoint {
            x,
            y: y * ORIGIN_SHIFT / 180.0,
        }
    }

    /// Short label used as list subtitle, e.g. `Lat: -34.6037, Lon: -58.3816`.
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lat: {:.4}, Lon: {:.4}", self.latitude, self.longitude)
    }
}

/// A world position in Spherical Mercator (EPSG:3857) metres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MercatorPoint {
    pub x: f64,
    pub y: f64,
}

impl MercatorPoint {
    /// Converts back to degrees.
    ///
    /// Points on a wrapped copy of the world (|lon| > 180) are rejected rather
    /// than normalized.
    pub fn to_coordinate(&self) -> Result<Coordinate, IncidentValidationError> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(IncidentValidationError::NonFiniteCoordinate {
                latitude: self.y,
                longitude: self.x,
            });
        }
        let longitude = self.x / ORIGIN_SHIFT * 180.0;
        let y_degrees = self.y / ORIGIN_SHIFT * 180.0;
        let latitude = 180.0 / PI * (2.0 * (y_degrees * PI / 180.0).exp().atan() - PI / 2.0);
        Coordinate::new(latitude, longitude)
    }
}
