//! # voevent-author Library
//!
//! Author VOEvent v2.0 packets through typed section setters, serialize them
//! to XML, read them back, and validate them against the VOEvent v2.0 XSD
//! through libxml2.
//!
//! ```no_run
//! use chrono::Utc;
//! use voevent_author::{Param, Position2D, Role, SkyCoordSystem, Voevent};
//!
//! let mut voevent = Voevent::new("hotwired.org/gaia_demo", 1, Role::Test)?;
//! voevent.set_who(Utc::now(), Some("foo.hotwired.hotwireduniverse.org/bar"));
//! voevent.what_mut().add_param(Param::new("mag", 18.77).with_ucd("phot.mag"));
//! voevent.add_where_when(
//!     Position2D::degrees(168.47841, -23.01221, 0.0, SkyCoordSystem::fk5()),
//!     Utc::now(),
//!     "Gaia",
//! );
//! voevent_author::assert_valid(&voevent)?;
//! let xml = voevent_author::dumps(&voevent, true);
//! # Ok::<(), voevent_author::VoeventError>(())
//! ```

pub mod cli;
pub mod config;
pub mod definitions;
pub mod demo;
pub mod error;
pub mod error_reporter;
pub mod file_discovery;
pub mod how_why;
pub mod libxml2;
pub mod output;
pub mod parse;
pub mod schema_loader;
pub mod serialize;
pub mod validator;
pub mod voevent;
pub mod what;
pub mod where_when;
pub mod who;
pub mod xml;

pub use config::{Config, ConfigError, ConfigManager};
pub use definitions::{
    CiteType, DataType, IntoUtc, RefPosition, Role, SkyCoordSystem, SpaceFrame, TimeScale,
};
pub use error::{LibXml2Error, Result, VoeventError};
pub use file_discovery::FileDiscovery;
pub use how_why::{Citations, EventIvorn, How, Inference, Reference, Why};
pub use libxml2::{LibXml2Wrapper, ValidationResult, Violation, XmlSchemaPtr};
pub use parse::{from_element, load, load_path, loads};
pub use schema_loader::{SchemaLoader, SchemaReference, SchemaSource, extract_schema_references};
pub use serialize::{dump, dump_to_path, dumps, to_element};
pub use validator::{
    FileValidationResult, PerformanceMetrics, SchemaValidator, ValidationConfig, ValidationEngine,
    ValidationResults, ValidationStatus, assert_valid, is_valid,
};
pub use voevent::{Voevent, VoeventBuilder};
pub use what::{Group, GroupMember, Param, ParamValue, What, WhatItem};
pub use where_when::{GeodeticPosition, ObservatoryLocation, Position2D, WhereWhen};
pub use who::{Author, AuthorField, Who};
pub use xml::Element;
