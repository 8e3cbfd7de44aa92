//! XML text to typed packet
//!
//! Text is parsed by libxml2 (no network access), lifted into an
//! [`Element`] tree and mapped onto the typed model. Unknown elements inside
//! `What` are kept as extension content; anywhere else they are an error.

use std::fs;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::definitions::{
    DataType, Role, SkyCoordSystem, VOEVENT_NAMESPACE, VOEVENT_VERSION, parse_datetime,
};
use crate::error::{Result, VoeventError};
use crate::how_why::{Citations, EventIvorn, How, Inference, Reference, Why};
use crate::libxml2::LibXml2Wrapper;
use crate::voevent::Voevent;
use crate::what::{Group, GroupMember, Param, What, WhatItem};
use crate::where_when::{GeodeticPosition, ObservatoryLocation, Position2D, WhereWhen};
use crate::who::{AuthorField, Who};
use crate::xml::Element;

/// Parse packet text
pub fn loads(xml: &str) -> Result<Voevent> {
    let root = parse_root(xml.as_bytes(), "<string>")?;
    from_element(&root)
}

/// Parse a packet from any reader
pub fn load<R: Read>(reader: &mut R) -> Result<Voevent> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;
    let root = parse_root(&buffer, "<reader>")?;
    from_element(&root)
}

/// Parse a packet file
pub fn load_path(path: impl AsRef<Path>) -> Result<Voevent> {
    let path = path.as_ref();
    let content = fs::read(path)?;
    let root = parse_root(&content, &path.display().to_string())?;
    from_element(&root)
}

fn parse_root(content: &[u8], name: &str) -> Result<Element> {
    let wrapper = LibXml2Wrapper::new();
    let doc = wrapper
        .parse_document(content, name)
        .map_err(|err| VoeventError::parse(err.to_string()))?;
    doc.root_element()
        .ok_or_else(|| VoeventError::parse(format!("{name}: document has no root element")))
}

/// Map a lifted `VOEvent` root element onto the typed model
pub fn from_element(root: &Element) -> Result<Voevent> {
    if root.local_name() != "VOEvent" {
        return Err(VoeventError::parse(format!(
            "expected a VOEvent root element, found <{}>",
            root.name()
        )));
    }
    if let Some(namespace) = root.namespace()
        && namespace != VOEVENT_NAMESPACE
    {
        return Err(VoeventError::parse(format!(
            "unsupported VOEvent namespace {namespace}"
        )));
    }

    let ivorn = required_attribute(root, "ivorn")?.to_string();
    let role = match root.attribute("role") {
        Some(role) => role.parse::<Role>()?,
        None => Role::default(),
    };
    let version = root.attribute("version").unwrap_or(VOEVENT_VERSION).to_string();

    let mut voevent = Voevent::from_parts(ivorn, role, version);
    for child in root.children() {
        match child.local_name() {
            "Who" => voevent.set_who_block(parse_who(child)?),
            "What" => voevent.set_what_block(parse_what(child)?),
            "WhereWhen" => {
                voevent.set_where_when(parse_where_when(child)?);
            }
            "How" => {
                voevent.set_how(parse_how(child)?);
            }
            "Why" => {
                voevent.set_why(parse_why(child)?);
            }
            "Citations" => voevent.set_citations(parse_citations(child)?),
            "Description" => voevent.add_description(text_of(child)),
            "Reference" => voevent.add_reference(parse_reference(child)?),
            _ => return Err(unexpected(root, child)),
        }
    }

    debug!(ivorn = %voevent.ivorn(), "Parsed VOEvent");
    Ok(voevent)
}

fn unexpected(parent: &Element, child: &Element) -> VoeventError {
    VoeventError::parse(format!(
        "unexpected element <{}> in <{}>",
        child.name(),
        parent.local_name()
    ))
}

/// Fail on any child not named in `allowed`
fn check_children(element: &Element, allowed: &[&str]) -> Result<()> {
    match element
        .children()
        .iter()
        .find(|child| !allowed.contains(&child.local_name()))
    {
        Some(child) => Err(unexpected(element, child)),
        None => Ok(()),
    }
}

fn required_child<'a>(element: &'a Element, name: &str) -> Result<&'a Element> {
    element.child(name).ok_or_else(|| {
        VoeventError::parse(format!(
            "<{}> is missing required <{name}>",
            element.local_name()
        ))
    })
}

fn required_attribute<'a>(element: &'a Element, key: &str) -> Result<&'a str> {
    element.attribute(key).ok_or_else(|| {
        VoeventError::parse(format!(
            "<{}> is missing required attribute '{key}'",
            element.local_name()
        ))
    })
}

fn optional_attribute(element: &Element, key: &str) -> Option<String> {
    element.attribute(key).map(str::to_string)
}

fn text_of(element: &Element) -> String {
    element.text().unwrap_or_default().to_string()
}

fn texts(element: &Element, name: &str) -> Vec<String> {
    element.children_named(name).map(text_of).collect()
}

fn parse_f64(field: &str, text: &str) -> Result<f64> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| VoeventError::invalid_value(field, text))
}

fn child_f64(element: &Element, name: &str) -> Result<f64> {
    parse_f64(name, &text_of(required_child(element, name)?))
}

fn references(element: &Element) -> Result<Vec<Reference>> {
    element.children_named("Reference").map(parse_reference).collect()
}

fn parse_reference(element: &Element) -> Result<Reference> {
    check_children(element, &[])?;
    Ok(Reference {
        uri: required_attribute(element, "uri")?.to_string(),
        ref_type: optional_attribute(element, "type"),
        mimetype: optional_attribute(element, "mimetype"),
        meaning: optional_attribute(element, "meaning"),
    })
}

fn parse_who(element: &Element) -> Result<Who> {
    check_children(
        element,
        &["AuthorIVORN", "Date", "Description", "Reference", "Author"],
    )?;

    let mut who = Who {
        author_ivorn: element.child("AuthorIVORN").map(text_of),
        date: element
            .child("Date")
            .map(|date| parse_datetime("Date", &text_of(date)))
            .transpose()?,
        descriptions: texts(element, "Description"),
        references: references(element)?,
        ..Who::default()
    };

    // Author fields are single-valued; a repeated field keeps its last value.
    for author in element.children_named("Author") {
        for field in author.children() {
            let key: AuthorField = field.local_name().parse()?;
            who.author.set(key, text_of(field));
        }
    }
    Ok(who)
}

fn parse_what(element: &Element) -> Result<What> {
    let mut what = What::default();
    for child in element.children() {
        match child.local_name() {
            "Param" => what.items.push(WhatItem::Param(parse_param(child)?)),
            "Group" => what.items.push(WhatItem::Group(parse_group(child)?)),
            "Description" => what.descriptions.push(text_of(child)),
            "Reference" => what.references.push(parse_reference(child)?),
            _ => what.items.push(WhatItem::Extension(child.clone())),
        }
    }
    Ok(what)
}

fn parse_param(element: &Element) -> Result<Param> {
    check_children(element, &["Description", "Reference", "Value"])?;

    let data_type = element
        .attribute("dataType")
        .map(str::parse::<DataType>)
        .transpose()?;
    let value = optional_attribute(element, "value").or_else(|| element.child("Value").map(text_of));

    Ok(Param {
        name: element.attribute("name").unwrap_or_default().to_string(),
        value,
        unit: optional_attribute(element, "unit"),
        ucd: optional_attribute(element, "ucd"),
        data_type,
        utype: optional_attribute(element, "utype"),
        descriptions: texts(element, "Description"),
        references: references(element)?,
    })
}

fn parse_group(element: &Element) -> Result<Group> {
    let mut group = Group {
        name: optional_attribute(element, "name"),
        group_type: optional_attribute(element, "type"),
        ..Group::default()
    };

    for child in element.children() {
        match child.local_name() {
            "Param" => group.members.push(GroupMember::Param(parse_param(child)?)),
            "Group" => group.members.push(GroupMember::Group(parse_group(child)?)),
            "Description" => group.descriptions.push(text_of(child)),
            "Reference" => group.references.push(parse_reference(child)?),
            _ => return Err(unexpected(element, child)),
        }
    }
    Ok(group)
}

fn parse_where_when(element: &Element) -> Result<WhereWhen> {
    check_children(element, &["ObsDataLocation", "Description", "Reference"])?;
    let data_location = required_child(element, "ObsDataLocation")?;
    check_children(data_location, &["ObservatoryLocation", "ObservationLocation"])?;

    let observatory = match data_location.child("ObservatoryLocation") {
        Some(location) => parse_observatory(location)?,
        None => ObservatoryLocation::default(),
    };

    let observation = required_child(data_location, "ObservationLocation")?;
    check_children(observation, &["AstroCoordSystem", "AstroCoords"])?;
    let coords = required_child(observation, "AstroCoords")?;
    check_children(coords, &["Time", "Position2D"])?;

    let system_id = match observation.child("AstroCoordSystem") {
        Some(system) => required_attribute(system, "id")?,
        None => required_attribute(coords, "coord_system_id")?,
    };
    let system: SkyCoordSystem = system_id.parse()?;

    let time = required_child(coords, "Time")?;
    check_children(time, &["TimeInstant", "Error"])?;
    let instant = required_child(time, "TimeInstant")?;
    check_children(instant, &["ISOTime"])?;
    let obs_time = parse_datetime("ISOTime", &text_of(required_child(instant, "ISOTime")?))?;
    let time_error = time
        .child("Error")
        .map(|error| parse_f64("Error", &text_of(error)))
        .transpose()?;

    let position = required_child(coords, "Position2D")?;
    check_children(position, &["Name1", "Name2", "Value2", "Error2Radius"])?;
    let value2 = required_child(position, "Value2")?;
    check_children(value2, &["C1", "C2"])?;
    let err = match position.child("Error2Radius") {
        Some(radius) => parse_f64("Error2Radius", &text_of(radius))?,
        None => 0.0,
    };

    Ok(WhereWhen {
        id: optional_attribute(element, "id"),
        observatory,
        coords: Position2D::new(
            child_f64(value2, "C1")?,
            child_f64(value2, "C2")?,
            err,
            required_attribute(position, "unit")?,
            system,
        ),
        obs_time,
        time_error,
        descriptions: texts(element, "Description"),
        references: references(element)?,
    })
}

fn parse_observatory(element: &Element) -> Result<ObservatoryLocation> {
    check_children(element, &["AstroCoordSystem", "AstroCoords"])?;

    let position = match element.child("AstroCoords") {
        Some(coords) => {
            check_children(coords, &["Position3D"])?;
            let position = required_child(coords, "Position3D")?;
            check_children(position, &["Name1", "Name2", "Name3", "Value3"])?;
            let value3 = required_child(position, "Value3")?;
            check_children(value3, &["C1", "C2", "C3"])?;
            Some(GeodeticPosition {
                longitude: child_f64(value3, "C1")?,
                latitude: child_f64(value3, "C2")?,
                elevation: child_f64(value3, "C3")?,
            })
        }
        None => None,
    };

    Ok(ObservatoryLocation {
        id: optional_attribute(element, "id"),
        position,
    })
}

fn parse_how(element: &Element) -> Result<How> {
    check_children(element, &["Description", "Reference"])?;
    Ok(How {
        descriptions: texts(element, "Description"),
        references: references(element)?,
    })
}

fn parse_why(element: &Element) -> Result<Why> {
    check_children(
        element,
        &["Name", "Concept", "Inference", "Description", "Reference"],
    )?;

    Ok(Why {
        importance: element
            .attribute("importance")
            .map(|value| parse_f64("importance", value))
            .transpose()?,
        expires: element
            .attribute("expires")
            .map(|value| parse_datetime("expires", value))
            .transpose()?,
        names: texts(element, "Name"),
        concepts: texts(element, "Concept"),
        inferences: element
            .children_named("Inference")
            .map(parse_inference)
            .collect::<Result<_>>()?,
        descriptions: texts(element, "Description"),
        references: references(element)?,
    })
}

fn parse_inference(element: &Element) -> Result<Inference> {
    check_children(element, &["Name", "Concept", "Description", "Reference"])?;

    Ok(Inference {
        probability: element
            .attribute("probability")
            .map(|value| parse_f64("probability", value))
            .transpose()?,
        relation: optional_attribute(element, "relation"),
        names: texts(element, "Name"),
        concepts: texts(element, "Concept"),
        descriptions: texts(element, "Description"),
        references: references(element)?,
    })
}

fn parse_citations(element: &Element) -> Result<Citations> {
    check_children(element, &["EventIVORN", "Description"])?;

    let event_ivorns = element
        .children_named("EventIVORN")
        .map(|event| {
            Ok(EventIvorn {
                ivorn: text_of(event).trim().to_string(),
                cite: required_attribute(event, "cite")?.parse()?,
            })
        })
        .collect::<Result<_>>()?;

    Ok(Citations {
        event_ivorns,
        description: element.child("Description").map(text_of),
    })
}
