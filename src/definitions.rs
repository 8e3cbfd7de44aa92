//! Controlled vocabularies and fixed identifiers of the VOEvent v2.0 format

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::error::VoeventError;

/// Namespace of the VOEvent v2.0 root element
pub const VOEVENT_NAMESPACE: &str = "http://www.ivoa.net/xml/VOEvent/v2.0";

/// Published location of the VOEvent v2.0 schema
pub const VOEVENT_SCHEMA_URL: &str = "http://www.ivoa.net/xml/VOEvent/VOEvent-v2.0.xsd";

pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Schema version written to the root `version` attribute
pub const VOEVENT_VERSION: &str = "2.0";

/// Prefix of every IVORN
pub const IVORN_SCHEME: &str = "ivo://";

/// Unit used for sky positions by default
pub const DEGREES: &str = "deg";

/// Value of `xsi:schemaLocation` on packets written by this crate
pub fn schema_location() -> String {
    format!("{VOEVENT_NAMESPACE} {VOEVENT_SCHEMA_URL}")
}

/// Timestamps accepted by the setters. Naive values are taken as UTC.
pub trait IntoUtc {
    fn into_utc(self) -> DateTime<Utc>;
}

impl<Tz: TimeZone> IntoUtc for DateTime<Tz> {
    fn into_utc(self) -> DateTime<Utc> {
        self.with_timezone(&Utc)
    }
}

impl IntoUtc for NaiveDateTime {
    fn into_utc(self) -> DateTime<Utc> {
        self.and_utc()
    }
}

const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// `xs:dateTime` text without a zone suffix; fractional seconds only when present
pub(crate) fn format_datetime(value: &DateTime<Utc>) -> String {
    value.format(ISO_FORMAT).to_string()
}

/// Read an `xs:dateTime`. Values without a zone are taken as UTC.
pub(crate) fn parse_datetime(field: &str, text: &str) -> Result<DateTime<Utc>, VoeventError> {
    let text = text.trim();
    if let Ok(zoned) = DateTime::parse_from_rfc3339(text) {
        return Ok(zoned.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(text, ISO_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| VoeventError::invalid_value(field, text))
}

macro_rules! token_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $token:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Token as written in VOEvent XML
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $token),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = VoeventError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($token => Ok($name::$variant),)+
                    other => Err(VoeventError::invalid_value($field, other)),
                }
            }
        }
    };
}

token_enum!(
    /// Packet role. `Test` packets must never be acted upon.
    Role, "role" {
        Observation => "observation",
        Prediction => "prediction",
        Utility => "utility",
        Test => "test",
    }
);

token_enum!(
    /// Relationship of a cited packet to the citing one
    CiteType, "cite" {
        Followup => "followup",
        Supersedes => "supersedes",
        Retraction => "retraction",
    }
);

token_enum!(
    /// `dataType` attribute of a Param
    DataType, "dataType" {
        String => "string",
        Int => "int",
        Float => "float",
    }
);

token_enum!(TimeScale, "time scale" {
    Utc => "UTC",
    Tt => "TT",
    Tdb => "TDB",
    Gps => "GPS",
});

token_enum!(SpaceFrame, "space frame" {
    Fk4 => "FK4",
    Fk5 => "FK5",
    Icrs => "ICRS",
    Galactic => "GAL",
});

token_enum!(RefPosition, "reference position" {
    Geocentric => "GEO",
    Topocentric => "TOPO",
    Barycentric => "BARY",
});

impl Default for Role {
    fn default() -> Self {
        Role::Observation
    }
}

/// STC id of the geodetic system used for observatory positions
pub const GEODETIC_COORD_SYSTEM: &str = "UTC-GEOD-TOPO";

/// Sky coordinate system of an observation position, written as an STC id
/// such as `UTC-FK5-GEO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SkyCoordSystem {
    pub time_scale: TimeScale,
    pub frame: SpaceFrame,
    pub ref_position: RefPosition,
}

impl SkyCoordSystem {
    pub const fn new(time_scale: TimeScale, frame: SpaceFrame, ref_position: RefPosition) -> Self {
        Self {
            time_scale,
            frame,
            ref_position,
        }
    }

    pub const fn fk4() -> Self {
        Self::geocentric_utc(SpaceFrame::Fk4)
    }

    pub const fn fk5() -> Self {
        Self::geocentric_utc(SpaceFrame::Fk5)
    }

    pub const fn icrs() -> Self {
        Self::geocentric_utc(SpaceFrame::Icrs)
    }

    pub const fn galactic() -> Self {
        Self::geocentric_utc(SpaceFrame::Galactic)
    }

    const fn geocentric_utc(frame: SpaceFrame) -> Self {
        Self::new(TimeScale::Utc, frame, RefPosition::Geocentric)
    }

    /// STC id, e.g. `UTC-FK5-GEO`
    pub fn id(&self) -> String {
        format!("{}-{}-{}", self.time_scale, self.frame, self.ref_position)
    }
}

impl fmt::Display for SkyCoordSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl FromStr for SkyCoordSystem {
    type Err = VoeventError;

    /// Accepts a bare frame name (`fk4`, `fk5`, `icrs`, `galactic`), which
    /// implies UTC and a geocentric reference position, or a full STC id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        let invalid = || VoeventError::InvalidCoordinateSystem {
            token: token.to_string(),
        };

        match token.to_ascii_lowercase().as_str() {
            "fk4" => return Ok(Self::fk4()),
            "fk5" => return Ok(Self::fk5()),
            "icrs" => return Ok(Self::icrs()),
            "gal" | "galactic" => return Ok(Self::galactic()),
            _ => {}
        }

        let parts: Vec<String> = token.split('-').map(str::to_ascii_uppercase).collect();
        let [time_scale, frame, ref_position] = parts.as_slice() else {
            return Err(invalid());
        };

        Ok(Self::new(
            time_scale.parse().map_err(|_| invalid())?,
            frame.parse().map_err(|_| invalid())?,
            ref_position.parse().map_err(|_| invalid())?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_tokens() {
        assert_eq!(Role::Test.to_string(), "test");
        assert_eq!("observation".parse::<Role>().unwrap(), Role::Observation);
        assert_eq!(Role::default(), Role::Observation);
        assert_eq!(Role::ALL.len(), 4);

        match "operational".parse::<Role>() {
            Err(VoeventError::InvalidValue { field, value }) => {
                assert_eq!(field, "role");
                assert_eq!(value, "operational");
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_bare_frames_default_to_utc_geocentric() {
        assert_eq!("fk5".parse::<SkyCoordSystem>().unwrap().id(), "UTC-FK5-GEO");
        assert_eq!("FK4".parse::<SkyCoordSystem>().unwrap().id(), "UTC-FK4-GEO");
        assert_eq!("icrs".parse::<SkyCoordSystem>().unwrap(), SkyCoordSystem::icrs());
        assert_eq!(
            "galactic".parse::<SkyCoordSystem>().unwrap().to_string(),
            "UTC-GAL-GEO"
        );
    }

    #[test]
    fn test_full_stc_ids() {
        let system: SkyCoordSystem = "TDB-ICRS-BARY".parse().unwrap();
        assert_eq!(system.time_scale, TimeScale::Tdb);
        assert_eq!(system.frame, SpaceFrame::Icrs);
        assert_eq!(system.ref_position, RefPosition::Barycentric);

        let lower: SkyCoordSystem = "utc-fk5-topo".parse().unwrap();
        assert_eq!(lower.id(), "UTC-FK5-TOPO");
    }

    #[test]
    fn test_unknown_coordinate_tokens_rejected() {
        for token in ["fk9", "", "UTC-FK5", "UTC-FK5-MARS", "UTC-GEOD-TOPO", "UTC-FK5-GEO-X"] {
            match token.parse::<SkyCoordSystem>() {
                Err(VoeventError::InvalidCoordinateSystem { token: reported }) => {
                    assert_eq!(reported, token)
                }
                other => panic!("Expected InvalidCoordinateSystem for {token:?}, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_datetime_text_forms() {
        let whole = Utc.with_ymd_and_hms(2014, 11, 7, 1, 5, 9).unwrap();
        assert_eq!(format_datetime(&whole), "2014-11-07T01:05:09");
        assert_eq!(parse_datetime("Date", "2014-11-07T01:05:09").unwrap(), whole);
        assert_eq!(parse_datetime("Date", "2014-11-07T01:05:09Z").unwrap(), whole);
        assert_eq!(parse_datetime("Date", "2014-11-07T02:05:09+01:00").unwrap(), whole);

        let fractional = whole + chrono::Duration::milliseconds(250);
        let text = format_datetime(&fractional);
        assert_eq!(text, "2014-11-07T01:05:09.250");
        assert_eq!(parse_datetime("ISOTime", &text).unwrap(), fractional);

        assert!(parse_datetime("Date", "yesterday").is_err());
    }

    #[test]
    fn test_naive_times_taken_as_utc() {
        let naive = chrono::NaiveDate::from_ymd_opt(2014, 11, 7)
            .unwrap()
            .and_hms_opt(1, 5, 9)
            .unwrap();
        assert_eq!(naive.into_utc(), Utc.with_ymd_and_hms(2014, 11, 7, 1, 5, 9).unwrap());
    }

    #[test]
    fn test_schema_location_pairs_namespace_and_url() {
        let location = schema_location();
        let mut parts = location.split_whitespace();
        assert_eq!(parts.next(), Some(VOEVENT_NAMESPACE));
        assert_eq!(parts.next(), Some(VOEVENT_SCHEMA_URL));
        assert_eq!(parts.next(), None);
    }
}
