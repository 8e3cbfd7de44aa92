//! Typed packet to XML text
//!
//! Sections are lowered into an [`Element`] tree in schema order and written
//! through the element tree's quick-xml writer. Serialization never validates.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::definitions::{
    GEODETIC_COORD_SYSTEM, VOEVENT_NAMESPACE, XSI_NAMESPACE, format_datetime, schema_location,
};
use crate::error::Result;
use crate::how_why::{Citations, How, Inference, Reference, Why};
use crate::voevent::Voevent;
use crate::what::{Group, GroupMember, Param, What, WhatItem};
use crate::where_when::{GEODETIC_UNIT, ObservatoryLocation, WhereWhen};
use crate::who::Who;
use crate::xml::Element;

/// Serialize a packet to a UTF-8 XML document
pub fn dumps(voevent: &Voevent, pretty: bool) -> String {
    to_element(voevent).to_document_string(pretty)
}

/// Write the serialized packet to `sink`. Sink errors are returned unchanged.
pub fn dump<W: Write>(voevent: &Voevent, sink: &mut W, pretty: bool) -> Result<()> {
    to_element(voevent).write_xml(&mut *sink, pretty, true)?;
    sink.flush()?;
    Ok(())
}

/// Write the serialized packet to a file, creating or truncating it
pub fn dump_to_path(voevent: &Voevent, path: impl AsRef<Path>, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    let mut file = File::create(path)?;
    dump(voevent, &mut file, pretty)?;
    debug!(ivorn = %voevent.ivorn(), path = %path.display(), "Wrote VOEvent");
    Ok(())
}

/// Lower a packet to its root `voe:VOEvent` element
pub fn to_element(voevent: &Voevent) -> Element {
    let mut root = Element::new("voe:VOEvent")
        .with_attribute("xmlns:voe", VOEVENT_NAMESPACE)
        .with_attribute("xmlns:xsi", XSI_NAMESPACE)
        .with_attribute("xsi:schemaLocation", schema_location())
        .with_attribute("ivorn", voevent.ivorn())
        .with_attribute("role", voevent.role().as_str())
        .with_attribute("version", voevent.version())
        .with_child(who_element(voevent.who()))
        .with_child(what_element(voevent.what()));

    if let Some(where_when) = voevent.where_when() {
        root.push_child(where_when_element(where_when));
    }
    if let Some(how) = voevent.how() {
        root.push_child(how_element(how));
    }
    if let Some(why) = voevent.why() {
        root.push_child(why_element(why));
    }
    if let Some(citations) = voevent.citations() {
        root.push_child(citations_element(citations));
    }

    root.with_text_children("Description", voevent.descriptions())
        .with_references(voevent.references())
}

trait WithReferences {
    fn with_references(self, references: &[Reference]) -> Self;
}

impl WithReferences for Element {
    fn with_references(mut self, references: &[Reference]) -> Self {
        for reference in references {
            self.push_child(reference_element(reference));
        }
        self
    }
}

fn reference_element(reference: &Reference) -> Element {
    Element::new("Reference")
        .with_attribute("uri", &reference.uri)
        .with_optional_attribute("type", reference.ref_type.as_deref())
        .with_optional_attribute("mimetype", reference.mimetype.as_deref())
        .with_optional_attribute("meaning", reference.meaning.as_deref())
}

fn who_element(who: &Who) -> Element {
    let date = who.date.as_ref().map(format_datetime);
    let mut element = Element::new("Who")
        .with_optional_text_child("AuthorIVORN", who.author_ivorn.as_deref())
        .with_optional_text_child("Date", date.as_deref())
        .with_text_children("Description", &who.descriptions)
        .with_references(&who.references);

    if !who.author.is_empty() {
        let mut author = Element::new("Author");
        for (field, value) in who.author.fields() {
            author.push_child(Element::new(field.tag()).with_text(value));
        }
        element.push_child(author);
    }
    element
}

fn what_element(what: &What) -> Element {
    let mut element = Element::new("What");
    for item in what.items() {
        let child = match item {
            WhatItem::Param(param) => param_element(param),
            WhatItem::Group(group) => group_element(group),
            WhatItem::Extension(extension) => extension.clone(),
        };
        element.push_child(child);
    }
    element
        .with_text_children("Description", &what.descriptions)
        .with_references(&what.references)
}

fn param_element(param: &Param) -> Element {
    Element::new("Param")
        .with_attribute("name", &param.name)
        .with_optional_attribute("value", param.value.as_deref())
        .with_optional_attribute("unit", param.unit.as_deref())
        .with_optional_attribute("ucd", param.ucd.as_deref())
        .with_optional_attribute("dataType", param.data_type.map(|t| t.as_str()))
        .with_optional_attribute("utype", param.utype.as_deref())
        .with_text_children("Description", &param.descriptions)
        .with_references(&param.references)
}

fn group_element(group: &Group) -> Element {
    let mut element = Element::new("Group")
        .with_optional_attribute("name", group.name.as_deref())
        .with_optional_attribute("type", group.group_type.as_deref());
    for member in &group.members {
        let child = match member {
            GroupMember::Param(param) => param_element(param),
            GroupMember::Group(nested) => group_element(nested),
        };
        element.push_child(child);
    }
    element
        .with_text_children("Description", &group.descriptions)
        .with_references(&group.references)
}

fn where_when_element(where_when: &WhereWhen) -> Element {
    let system_id = where_when.coords.system.id();
    let coords = &where_when.coords;

    let time = Element::new("Time")
        .with_attribute("unit", "s")
        .with_child(
            Element::new("TimeInstant")
                .with_child(Element::new("ISOTime").with_text(format_datetime(&where_when.obs_time))),
        )
        .with_optional_text_child("Error", where_when.time_error.map(|e| e.to_string()).as_deref());

    let position = Element::new("Position2D")
        .with_attribute("unit", &coords.units)
        .with_child(Element::new("Name1").with_text("RA"))
        .with_child(Element::new("Name2").with_text("Dec"))
        .with_child(
            Element::new("Value2")
                .with_child(Element::new("C1").with_text(coords.ra.to_string()))
                .with_child(Element::new("C2").with_text(coords.dec.to_string())),
        )
        .with_child(Element::new("Error2Radius").with_text(coords.err.to_string()));

    let observation = Element::new("ObservationLocation")
        .with_child(Element::new("AstroCoordSystem").with_attribute("id", &system_id))
        .with_child(
            Element::new("AstroCoords")
                .with_attribute("coord_system_id", &system_id)
                .with_child(time)
                .with_child(position),
        );

    Element::new("WhereWhen")
        .with_optional_attribute("id", where_when.id.as_deref())
        .with_child(
            Element::new("ObsDataLocation")
                .with_child(observatory_element(&where_when.observatory))
                .with_child(observation),
        )
        .with_text_children("Description", &where_when.descriptions)
        .with_references(&where_when.references)
}

fn observatory_element(observatory: &ObservatoryLocation) -> Element {
    let element = Element::new("ObservatoryLocation")
        .with_optional_attribute("id", observatory.id.as_deref());

    match &observatory.position {
        Some(position) => element
            .with_child(Element::new("AstroCoordSystem").with_attribute("id", GEODETIC_COORD_SYSTEM))
            .with_child(
                Element::new("AstroCoords")
                    .with_attribute("coord_system_id", GEODETIC_COORD_SYSTEM)
                    .with_child(
                        Element::new("Position3D")
                            .with_attribute("unit", GEODETIC_UNIT)
                            .with_child(
                                Element::new("Value3")
                                    .with_child(Element::new("C1").with_text(position.longitude.to_string()))
                                    .with_child(Element::new("C2").with_text(position.latitude.to_string()))
                                    .with_child(Element::new("C3").with_text(position.elevation.to_string())),
                            ),
                    ),
            ),
        None => element,
    }
}

fn how_element(how: &How) -> Element {
    Element::new("How")
        .with_text_children("Description", &how.descriptions)
        .with_references(&how.references)
}

fn why_element(why: &Why) -> Element {
    let mut element = Element::new("Why")
        .with_optional_attribute("importance", why.importance.map(|i| i.to_string()).as_deref())
        .with_optional_attribute("expires", why.expires.as_ref().map(format_datetime).as_deref())
        .with_text_children("Name", &why.names)
        .with_text_children("Concept", &why.concepts);
    for inference in &why.inferences {
        element.push_child(inference_element(inference));
    }
    element
        .with_text_children("Description", &why.descriptions)
        .with_references(&why.references)
}

fn inference_element(inference: &Inference) -> Element {
    Element::new("Inference")
        .with_optional_attribute("probability", inference.probability.map(|p| p.to_string()).as_deref())
        .with_optional_attribute("relation", inference.relation.as_deref())
        .with_text_children("Name", &inference.names)
        .with_text_children("Concept", &inference.concepts)
        .with_text_children("Description", &inference.descriptions)
        .with_references(&inference.references)
}

fn citations_element(citations: &Citations) -> Element {
    let mut element = Element::new("Citations");
    for event_ivorn in &citations.event_ivorns {
        element.push_child(
            Element::new("EventIVORN")
                .with_attribute("cite", event_ivorn.cite.as_str())
                .with_text(&event_ivorn.ivorn),
        );
    }
    element.with_optional_text_child("Description", citations.description.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    use crate::definitions::{Role, SkyCoordSystem};
    use crate::where_when::Position2D;

    fn packet() -> Voevent {
        let mut v = Voevent::builder("hotwired.org/gaia_demo", 1)
            .role(Role::Test)
            .provenance_note(false)
            .build()
            .unwrap();
        v.set_who(Utc.with_ymd_and_hms(2014, 12, 2, 13, 55, 0).unwrap(), None);
        v
    }

    #[test]
    fn test_root_attributes_and_declaration() {
        let text = dumps(&packet(), false);

        assert!(text.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(text.contains(r#"<voe:VOEvent xmlns:voe="http://www.ivoa.net/xml/VOEvent/v2.0""#));
        assert!(text.contains(r#"ivorn="ivo://hotwired.org/gaia_demo#1""#));
        assert!(text.contains(r#"role="test""#));
        assert!(text.contains(r#"version="2.0""#));
        assert!(text.contains("<Who><Date>2014-12-02T13:55:00</Date></Who><What/>"));
    }

    #[test]
    fn test_section_order_is_fixed() {
        let mut v = packet();
        v.set_description("root");
        v.add_why(Some(0.5), None::<DateTime<Utc>>);
        v.add_how(["detected"], Vec::<Reference>::new());
        v.add_where_when(
            Position2D::degrees(1.0, 2.0, 0.0, SkyCoordSystem::fk5()),
            Utc.with_ymd_and_hms(2014, 11, 7, 1, 5, 9).unwrap(),
            "Gaia",
        );

        let root = to_element(&v);
        let order: Vec<_> = root.children().iter().map(Element::name).collect();
        assert_eq!(
            order,
            vec!["Who", "What", "WhereWhen", "How", "Why", "Description"]
        );
    }

    #[test]
    fn test_where_when_structure() {
        let mut v = packet();
        v.add_where_when(
            Position2D::degrees(168.47841, -23.01221, 0.0, SkyCoordSystem::fk5()),
            Utc.with_ymd_and_hms(2014, 11, 7, 1, 5, 9).unwrap(),
            "Gaia",
        );

        let text = dumps(&v, false);
        assert!(text.contains(r#"<ObservatoryLocation id="Gaia"/>"#));
        assert!(text.contains(r#"<AstroCoordSystem id="UTC-FK5-GEO"/>"#));
        assert!(text.contains("<ISOTime>2014-11-07T01:05:09</ISOTime>"));
        assert!(text.contains("<C1>168.47841</C1><C2>-23.01221</C2>"));
        assert!(text.contains("<Error2Radius>0</Error2Radius>"));
    }

    #[test]
    fn test_dump_propagates_sink_errors() {
        struct BrokenSink;

        impl Write for BrokenSink {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "sink closed"))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        match dump(&packet(), &mut BrokenSink, true) {
            Err(crate::error::VoeventError::Io(err)) => {
                assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe)
            }
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_dump_matches_dumps() {
        let v = packet();
        let mut buffer = Vec::new();
        dump(&v, &mut buffer, true).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), dumps(&v, true));
    }
}
