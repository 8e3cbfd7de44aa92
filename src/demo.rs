//! The Gaia14adi alert as a complete example packet
//!
//! Gaia published Gaia14adi on 2 Dec 2014: a fading source on top of a 2MASS
//! galaxy, alert magnitude 18.77, historic magnitude 19.62 with a scatter of
//! 0.07, and no positional error.

use chrono::{DateTime, TimeZone, Utc};

use crate::definitions::{Role, SkyCoordSystem};
use crate::error::Result;
use crate::how_why::Reference;
use crate::voevent::Voevent;
use crate::what::{Group, Param};
use crate::where_when::Position2D;

pub const GAIA_STREAM: &str = "hotwired.org/gaia_demo";

/// Build the Gaia14adi packet with `generated` as the `Who` timestamp
pub fn gaia_packet(generated: DateTime<Utc>) -> Result<Voevent> {
    let mut voevent = Voevent::new(GAIA_STREAM, 1, Role::Test)?;

    voevent.set_who(generated, Some("foo.hotwired.hotwireduniverse.org/bar"));
    voevent.set_author([
        ("title", "Hotwired VOEvent Hands-on"),
        ("contactName", "Joe Bloggs"),
    ])?;
    voevent.set_description("This is not an official Gaia data product.");

    voevent
        .what_mut()
        .add_param(Param::new("mag", 18.77).with_ucd("phot.mag"))
        .add_group(Group::new(
            "historic",
            [
                Param::new("hist_mag", 19.62).with_ucd("phot.mag"),
                Param::new("hist_scatter", 0.07).with_ucd("phot.mag"),
            ],
        ));

    // Gaia cites no positional error
    voevent.add_where_when(
        Position2D::degrees(168.47841, -23.01221, 0.0, SkyCoordSystem::fk5()),
        gaia_observation_time(),
        "Gaia",
    );

    voevent.add_how(
        ["Scraped from the Gaia website", "This is Gaia14adi"],
        [Reference::new("http://gsaweb.ast.cam.ac.uk/alerts/")],
    );

    voevent
        .add_why(None, None::<DateTime<Utc>>)
        .set_description("Fading source on top of 2MASS Galaxy (offset from bulge)");

    Ok(voevent)
}

/// 2014-11-07T01:05:09 UTC
pub fn gaia_observation_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2014, 11, 7, 1, 5, 9)
        .single()
        .unwrap_or_default()
}
