//! Shared helpers for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use voevent_author::demo::gaia_packet;
use voevent_author::{Element, Voevent, dumps};

/// A fixed `Who` timestamp so packets compare equal across runs
pub fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2014, 12, 2, 13, 55, 0).unwrap()
}

pub fn gaia() -> Voevent {
    gaia_packet(fixed_time()).unwrap()
}

/// The Gaia packet with an unknown element appended to `What`
pub fn gaia_with_extension() -> Voevent {
    let mut voevent = gaia();
    voevent
        .what_mut()
        .add_extension(Element::new("Mood").with_text("gloomy"));
    voevent
}

/// The Gaia packet with `WhereWhen` removed
pub fn gaia_without_where_when() -> Voevent {
    let mut voevent = gaia();
    voevent.take_where_when();
    voevent
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

pub fn write_packet(dir: &Path, name: &str, voevent: &Voevent) -> PathBuf {
    write_file(dir, name, &dumps(voevent, true))
}

/// A well-formed document bound to a foreign schema
pub const FOREIGN_DOCUMENT: &str = r#"<?xml version="1.0"?>
<catalog xmlns="http://example.com/catalog"
         xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
         xsi:schemaLocation="http://example.com/catalog http://example.com/catalog.xsd">
  <entry>not a packet</entry>
</catalog>
"#;

pub const MALFORMED_DOCUMENT: &str = "<voe:VOEvent><Who>";
