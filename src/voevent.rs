//! VOEvent packet root and section setters
//!
//! A [`Voevent`] starts as a skeleton (`Who` and `What` present but empty,
//! no other sections) and is filled in through typed setters. Replacing
//! setters (`set_who`, `add_where_when`, `set_how`, ...) only touch their own
//! section; appending setters (`add_how`, `add_citations`) create the section
//! on first use.
//!
//! Nothing here validates against the schema. Call
//! [`crate::validator::is_valid`] or [`crate::validator::assert_valid`] when
//! needed; an invalid packet can still be serialized for inspection.

use std::fmt::Display;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use crate::definitions::{IVORN_SCHEME, IntoUtc, Role, VOEVENT_VERSION};
use crate::error::{Result, VoeventError};
use crate::how_why::{Citations, EventIvorn, How, Reference, Why, set_first};
use crate::what::What;
use crate::where_when::{ObservatoryLocation, Position2D, WhereWhen};
use crate::who::{Author, Who};

/// Authority plus optional resource path of an IVORN
static STREAM_REGEX: OnceLock<Regex> = OnceLock::new();

fn stream_regex() -> &'static Regex {
    STREAM_REGEX.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\-_.!~*'()+=]{2,}(/[A-Za-z0-9\-_.!~*'()+=]+)*$")
            .expect("Failed to compile IVORN stream regex")
    })
}

fn validate_stream(stream: &str) -> Result<()> {
    if stream_regex().is_match(stream) {
        Ok(())
    } else {
        Err(VoeventError::InvalidIdentifier {
            value: stream.to_string(),
            reason: "stream must be an IVORN authority optionally followed by /resource segments"
                .to_string(),
        })
    }
}

fn validate_stream_id(stream_id: &str) -> Result<()> {
    let reason = if stream_id.is_empty() {
        "stream id must not be empty"
    } else if stream_id.chars().any(char::is_whitespace) {
        "stream id must not contain whitespace"
    } else if stream_id.contains('#') {
        "stream id must not contain '#'"
    } else {
        return Ok(());
    };

    Err(VoeventError::InvalidIdentifier {
        value: stream_id.to_string(),
        reason: reason.to_string(),
    })
}

/// Description inserted into `Who` by default
pub fn provenance_note() -> String {
    format!(
        "VOEvent created with voevent-author, version {}.",
        env!("CARGO_PKG_VERSION")
    )
}

/// Prefix `ivo://` unless already present
fn with_ivorn_scheme(ivorn: &str) -> String {
    if ivorn.starts_with(IVORN_SCHEME) {
        ivorn.to_string()
    } else {
        format!("{IVORN_SCHEME}{ivorn}")
    }
}

/// Builder for [`Voevent`]
#[derive(Debug, Clone)]
pub struct VoeventBuilder {
    stream: String,
    stream_id: String,
    role: Role,
    version: String,
    provenance_note: bool,
}

impl VoeventBuilder {
    pub fn role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }

    /// Schema version attribute. Anything but `2.0` fails validation.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Whether to add the provenance description to `Who` (default: yes)
    pub fn provenance_note(mut self, enabled: bool) -> Self {
        self.provenance_note = enabled;
        self
    }

    pub fn build(self) -> Result<Voevent> {
        validate_stream(&self.stream)?;
        validate_stream_id(&self.stream_id)?;

        let ivorn = format!("{IVORN_SCHEME}{}#{}", self.stream, self.stream_id);
        debug!(ivorn = %ivorn, role = %self.role, "Created VOEvent skeleton");

        let mut who = Who::default();
        if self.provenance_note {
            who.descriptions.push(provenance_note());
        }

        Ok(Voevent {
            ivorn,
            role: self.role,
            version: self.version,
            who,
            what: What::default(),
            where_when: None,
            how: None,
            why: None,
            citations: None,
            descriptions: Vec::new(),
            references: Vec::new(),
        })
    }
}

/// A VOEvent v2.0 packet
#[derive(Debug, Clone, PartialEq)]
pub struct Voevent {
    ivorn: String,
    role: Role,
    version: String,
    who: Who,
    what: What,
    where_when: Option<WhereWhen>,
    how: Option<How>,
    why: Option<Why>,
    citations: Option<Citations>,
    descriptions: Vec<String>,
    references: Vec<Reference>,
}

impl Voevent {
    /// Create a skeleton packet with IVORN `ivo://<stream>#<stream_id>`
    pub fn new(stream: &str, stream_id: impl Display, role: Role) -> Result<Self> {
        Self::builder(stream, stream_id).role(role).build()
    }

    pub fn builder(stream: impl Into<String>, stream_id: impl Display) -> VoeventBuilder {
        VoeventBuilder {
            stream: stream.into(),
            stream_id: stream_id.to_string(),
            role: Role::default(),
            version: VOEVENT_VERSION.to_string(),
            provenance_note: true,
        }
    }

    /// Reassemble a packet from parsed parts. The IVORN is taken as written.
    pub(crate) fn from_parts(ivorn: String, role: Role, version: String) -> Self {
        Self {
            ivorn,
            role,
            version,
            who: Who::default(),
            what: What::default(),
            where_when: None,
            how: None,
            why: None,
            citations: None,
            descriptions: Vec::new(),
            references: Vec::new(),
        }
    }

    pub fn ivorn(&self) -> &str {
        &self.ivorn
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn who(&self) -> &Who {
        &self.who
    }

    pub fn who_mut(&mut self) -> &mut Who {
        &mut self.who
    }

    pub fn what(&self) -> &What {
        &self.what
    }

    pub fn what_mut(&mut self) -> &mut What {
        &mut self.what
    }

    pub fn where_when(&self) -> Option<&WhereWhen> {
        self.where_when.as_ref()
    }

    pub fn where_when_mut(&mut self) -> Option<&mut WhereWhen> {
        self.where_when.as_mut()
    }

    pub fn how(&self) -> Option<&How> {
        self.how.as_ref()
    }

    pub fn how_mut(&mut self) -> Option<&mut How> {
        self.how.as_mut()
    }

    pub fn why(&self) -> Option<&Why> {
        self.why.as_ref()
    }

    pub fn why_mut(&mut self) -> Option<&mut Why> {
        self.why.as_mut()
    }

    pub fn citations(&self) -> Option<&Citations> {
        self.citations.as_ref()
    }

    /// Root-level descriptions
    pub fn descriptions(&self) -> &[String] {
        &self.descriptions
    }

    /// Root-level references
    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    /// Set the packet generation time and, when given, the author IVORN.
    ///
    /// `author_ivorn` may omit the `ivo://` scheme.
    pub fn set_who(&mut self, date: impl IntoUtc, author_ivorn: Option<&str>) -> &mut Who {
        self.who.set_date(date);
        if let Some(author_ivorn) = author_ivorn {
            self.who.author_ivorn = Some(with_ivorn_scheme(author_ivorn));
        }
        debug!(ivorn = %self.ivorn, "Set Who");
        &mut self.who
    }

    /// Set Author fields from `(element name, value)` pairs such as
    /// `("contactName", "Joe Bloggs")`.
    ///
    /// Unknown keys fail with [`VoeventError::UnsupportedAuthorField`] and
    /// leave the packet unchanged.
    pub fn set_author<K, V>(&mut self, fields: impl IntoIterator<Item = (K, V)>) -> Result<&mut Author>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        self.who.author.update(fields)?;
        Ok(&mut self.who.author)
    }

    /// Replace the whole Author block
    pub fn set_author_block(&mut self, author: Author) {
        self.who.author = author;
    }

    /// Build the full WhereWhen in one call, replacing any existing one
    pub fn add_where_when(
        &mut self,
        coords: Position2D,
        obs_time: impl IntoUtc,
        observatory_location: impl Into<ObservatoryLocation>,
    ) -> &mut WhereWhen {
        self.set_where_when(WhereWhen::new(coords, obs_time, observatory_location))
    }

    pub fn set_where_when(&mut self, where_when: WhereWhen) -> &mut WhereWhen {
        debug!(ivorn = %self.ivorn, system = %where_when.coords.system, "Set WhereWhen");
        self.where_when.insert(where_when)
    }

    /// Append descriptions and references to How, creating it when absent
    pub fn add_how<D>(
        &mut self,
        descriptions: impl IntoIterator<Item = D>,
        references: impl IntoIterator<Item = Reference>,
    ) -> &mut How
    where
        D: Into<String>,
    {
        let how = self.how.get_or_insert_with(How::default);
        how.descriptions.extend(descriptions.into_iter().map(Into::into));
        how.references.extend(references);
        how
    }

    pub fn set_how(&mut self, how: How) -> &mut How {
        self.how.insert(how)
    }

    /// Create Why when absent and set the given attributes. `expires` takes
    /// the same timestamp forms as [`Voevent::set_who`]; pass
    /// `None::<DateTime<Utc>>` to leave it unset.
    pub fn add_why(&mut self, importance: Option<f64>, expires: Option<impl IntoUtc>) -> &mut Why {
        let why = self.why.get_or_insert_with(Why::default);
        if let Some(importance) = importance {
            why.importance = Some(importance);
        }
        if let Some(expires) = expires {
            why.expires = Some(expires.into_utc());
        }
        why
    }

    pub fn set_why(&mut self, why: Why) -> &mut Why {
        self.why.insert(why)
    }

    /// Append cited packets, creating Citations when absent
    pub fn add_citations(&mut self, event_ivorns: impl IntoIterator<Item = EventIvorn>) -> &mut Citations {
        let citations = self.citations.get_or_insert_with(Citations::default);
        citations.event_ivorns.extend(event_ivorns);
        citations
    }

    /// Set the root Description, replacing the first one when present
    pub fn set_description(&mut self, text: impl Into<String>) {
        set_first(&mut self.descriptions, text);
    }

    pub fn add_description(&mut self, text: impl Into<String>) {
        self.descriptions.push(text.into());
    }

    pub fn add_reference(&mut self, reference: Reference) {
        self.references.push(reference);
    }

    pub(crate) fn set_who_block(&mut self, who: Who) {
        self.who = who;
    }

    pub(crate) fn set_what_block(&mut self, what: What) {
        self.what = what;
    }

    pub(crate) fn set_citations(&mut self, citations: Citations) {
        self.citations = Some(citations);
    }

    pub fn take_where_when(&mut self) -> Option<WhereWhen> {
        self.where_when.take()
    }

    pub fn take_how(&mut self) -> Option<How> {
        self.how.take()
    }

    pub fn take_why(&mut self) -> Option<Why> {
        self.why.take()
    }

    pub fn take_citations(&mut self) -> Option<Citations> {
        self.citations.take()
    }

    /// Serialize to a UTF-8 XML document
    pub fn to_xml_string(&self, pretty: bool) -> String {
        crate::serialize::dumps(self, pretty)
    }

    /// Parse packet text into the typed model
    pub fn from_xml_str(xml: &str) -> Result<Self> {
        crate::parse::loads(xml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    use crate::definitions::{CiteType, SkyCoordSystem};
    use crate::what::Param;

    fn packet() -> Voevent {
        Voevent::new("hotwired.org/gaia_demo", 1, Role::Test).unwrap()
    }

    #[test]
    fn test_ivorn_composition() {
        let v = packet();
        assert_eq!(v.ivorn(), "ivo://hotwired.org/gaia_demo#1");
        assert_eq!(v.role(), Role::Test);
        assert_eq!(v.version(), "2.0");
    }

    #[test]
    fn test_skeleton_sections() {
        let v = packet();
        assert_eq!(v.who().descriptions, vec![provenance_note()]);
        assert!(v.what().is_empty());
        assert!(v.where_when().is_none());
        assert!(v.how().is_none());
        assert!(v.why().is_none());
        assert!(v.citations().is_none());

        let bare = Voevent::builder("hotwired.org/gaia_demo", "a1")
            .provenance_note(false)
            .build()
            .unwrap();
        assert!(bare.who().descriptions.is_empty());
        assert_eq!(bare.role(), Role::Observation);
    }

    #[test]
    fn test_invalid_streams_rejected() {
        for stream in [
            "",
            "ab",
            "hotwired.org/gaia demo",
            "hotwired.org#demo",
            "hotwired.org/demo?x=1",
            "ivo://hotwired.org/demo",
            "hotwired.org/demo/",
            "/hotwired.org",
        ] {
            match Voevent::new(stream, 1, Role::Test) {
                Err(VoeventError::InvalidIdentifier { value, .. }) => assert_eq!(value, stream),
                other => panic!("Expected InvalidIdentifier for {stream:?}, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_invalid_stream_ids_rejected() {
        for stream_id in ["", "a b", "1#2"] {
            assert!(matches!(
                Voevent::new("hotwired.org/gaia_demo", stream_id, Role::Test),
                Err(VoeventError::InvalidIdentifier { .. })
            ));
        }
    }

    #[test]
    fn test_set_who_replaces_and_prefixes_scheme() {
        let mut v = packet();
        let first = Utc.with_ymd_and_hms(2014, 12, 2, 13, 55, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2014, 12, 3, 9, 0, 0).unwrap();

        v.set_who(first, Some("foo.hotwired.hotwireduniverse.org/bar"));
        v.set_who(second, Some("ivo://other.org/author"));

        assert_eq!(v.who().date, Some(second));
        assert_eq!(v.who().author_ivorn.as_deref(), Some("ivo://other.org/author"));

        v.set_who(first, None);
        assert_eq!(v.who().author_ivorn.as_deref(), Some("ivo://other.org/author"));
    }

    #[test]
    fn test_set_author_rejects_unknown_keys() {
        let mut v = packet();
        v.set_author([("title", "Hotwired VOEvent Hands-on")]).unwrap();

        let before = v.clone();
        let result = v.set_author([("contactName", "Joe"), ("nickname", "JB")]);
        assert!(matches!(result, Err(VoeventError::UnsupportedAuthorField { .. })));
        assert_eq!(v, before);
    }

    #[test]
    fn test_add_where_when_replaces() {
        let mut v = packet();
        let obs_time = Utc.with_ymd_and_hms(2014, 11, 7, 1, 5, 9).unwrap();
        v.add_where_when(
            Position2D::degrees(1.0, 2.0, 0.1, SkyCoordSystem::icrs()),
            obs_time,
            "Elsewhere",
        );
        v.add_where_when(
            Position2D::degrees(168.47841, -23.01221, 0.0, SkyCoordSystem::fk5()),
            obs_time,
            "Gaia",
        );

        let where_when = v.where_when().unwrap();
        assert_eq!(where_when.coords.ra, 168.47841);
        assert_eq!(where_when.observatory.id.as_deref(), Some("Gaia"));
    }

    #[test]
    fn test_add_how_appends_in_order() {
        let mut v = packet();
        v.add_how(["Scraped from the Gaia website"], Vec::<Reference>::new());
        v.add_how(
            ["This is Gaia14adi"],
            [Reference::new("http://gsaweb.ast.cam.ac.uk/alerts/")],
        );

        let how = v.how().unwrap();
        assert_eq!(
            how.descriptions,
            vec!["Scraped from the Gaia website", "This is Gaia14adi"]
        );
        assert_eq!(how.references.len(), 1);

        v.set_how(How::default());
        assert!(v.how().unwrap().descriptions.is_empty());
    }

    #[test]
    fn test_add_why_keeps_existing_attributes() {
        let mut v = packet();
        v.add_why(Some(0.8), None::<DateTime<Utc>>)
            .set_description("Fading source on top of 2MASS Galaxy (offset from bulge)");
        v.add_why(None, None::<DateTime<Utc>>);

        let why = v.why().unwrap();
        assert_eq!(why.importance, Some(0.8));
        assert_eq!(why.descriptions.len(), 1);
    }

    #[test]
    fn test_add_why_expires_accepts_naive_and_zoned_times() {
        let expected = Utc.with_ymd_and_hms(2014, 12, 2, 13, 55, 0).unwrap();

        let mut v = packet();
        v.add_why(None, Some(expected.naive_utc()));
        assert_eq!(v.why().unwrap().expires, Some(expected));

        let zoned = FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2014, 12, 2, 14, 55, 0)
            .unwrap();
        let mut v = packet();
        v.add_why(Some(0.1), Some(zoned));
        assert_eq!(v.why().unwrap().expires, Some(expected));
    }

    #[test]
    fn test_citations_and_take() {
        let mut v = packet();
        v.add_citations([EventIvorn::new("ivo://hotwired.org/gaia_demo#0", CiteType::Supersedes)]);
        v.add_citations([EventIvorn::new("ivo://hotwired.org/gaia_demo#2", CiteType::Followup)]);
        assert_eq!(v.citations().unwrap().event_ivorns.len(), 2);

        assert!(v.take_citations().is_some());
        assert!(v.citations().is_none());
    }

    #[test]
    fn test_root_description_first_match() {
        let mut v = packet();
        v.set_description("draft");
        v.add_description("second");
        v.set_description("This is not an official Gaia data product.");

        assert_eq!(
            v.descriptions(),
            &["This is not an official Gaia data product.", "second"]
        );
    }

    #[test]
    fn test_what_mutation_through_accessor() {
        let mut v = packet();
        v.what_mut().add_param(Param::new("mag", 18.77).with_ucd("phot.mag"));
        assert_eq!(v.what().param("mag").and_then(Param::value), Some("18.77"));
    }
}
