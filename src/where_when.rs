//! `WhereWhen`: where on the sky and when the event was observed

use chrono::{DateTime, Utc};

use crate::definitions::{DEGREES, IntoUtc, SkyCoordSystem};
use crate::how_why::Reference;

/// Sky position with an error radius
#[derive(Debug, Clone, PartialEq)]
pub struct Position2D {
    pub ra: f64,
    pub dec: f64,
    /// Error radius, same units as the position
    pub err: f64,
    pub units: String,
    pub system: SkyCoordSystem,
}

impl Position2D {
    pub fn new(ra: f64, dec: f64, err: f64, units: impl Into<String>, system: SkyCoordSystem) -> Self {
        Self {
            ra,
            dec,
            err,
            units: units.into(),
            system,
        }
    }

    /// Position in degrees
    pub fn degrees(ra: f64, dec: f64, err: f64, system: SkyCoordSystem) -> Self {
        Self::new(ra, dec, err, DEGREES, system)
    }
}

/// Observatory position on the Earth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodeticPosition {
    /// Degrees east
    pub longitude: f64,
    /// Degrees north
    pub latitude: f64,
    /// Metres above the reference ellipsoid
    pub elevation: f64,
}

/// Unit string of a geodetic `Position3D`
pub const GEODETIC_UNIT: &str = "deg-deg-m";

/// Where the observing instrument was: a named site, a geodetic position,
/// or both.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObservatoryLocation {
    pub id: Option<String>,
    pub position: Option<GeodeticPosition>,
}

impl ObservatoryLocation {
    pub fn named(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            position: None,
        }
    }

    pub fn geodetic(longitude: f64, latitude: f64, elevation: f64) -> Self {
        Self {
            id: None,
            position: Some(GeodeticPosition {
                longitude,
                latitude,
                elevation,
            }),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl From<&str> for ObservatoryLocation {
    fn from(id: &str) -> Self {
        Self::named(id)
    }
}

impl From<String> for ObservatoryLocation {
    fn from(id: String) -> Self {
        Self::named(id)
    }
}

impl From<GeodeticPosition> for ObservatoryLocation {
    fn from(position: GeodeticPosition) -> Self {
        Self {
            id: None,
            position: Some(position),
        }
    }
}

/// Observation context
#[derive(Debug, Clone, PartialEq)]
pub struct WhereWhen {
    pub id: Option<String>,
    pub observatory: ObservatoryLocation,
    pub coords: Position2D,
    pub obs_time: DateTime<Utc>,
    /// Uncertainty of `obs_time` in seconds
    pub time_error: Option<f64>,
    pub descriptions: Vec<String>,
    pub references: Vec<Reference>,
}

impl WhereWhen {
    pub fn new(
        coords: Position2D,
        obs_time: impl IntoUtc,
        observatory: impl Into<ObservatoryLocation>,
    ) -> Self {
        Self {
            id: None,
            observatory: observatory.into(),
            coords,
            obs_time: obs_time.into_utc(),
            time_error: None,
            descriptions: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn with_time_error(mut self, seconds: f64) -> Self {
        self.time_error = Some(seconds);
        self
    }

    pub fn add_description(&mut self, text: impl Into<String>) -> &mut Self {
        self.descriptions.push(text.into());
        self
    }

    pub fn add_reference(&mut self, reference: Reference) -> &mut Self {
        self.references.push(reference);
        self
    }
}
