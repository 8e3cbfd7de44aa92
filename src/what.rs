//! `What`: the packet payload of Params, Groups and extension elements

use crate::definitions::DataType;
use crate::error::{Result, VoeventError};
use crate::how_why::{Reference, set_first};
use crate::xml::Element;

/// Text of a Param value plus the `dataType` implied by its Rust type
#[derive(Debug, Clone, PartialEq)]
pub struct ParamValue {
    pub text: String,
    pub data_type: Option<DataType>,
}

macro_rules! param_value_from {
    ($data_type:expr => $($ty:ty),+) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(value: $ty) -> Self {
                    ParamValue {
                        text: value.to_string(),
                        data_type: $data_type,
                    }
                }
            }
        )+
    };
}

param_value_from!(Some(DataType::Float) => f32, f64);
param_value_from!(Some(DataType::Int) => i8, i16, i32, i64, u8, u16, u32, u64, usize);
param_value_from!(None => &str, String, &String);

/// A named value with optional unit and UCD
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Param {
    pub name: String,
    pub value: Option<String>,
    pub unit: Option<String>,
    pub ucd: Option<String>,
    pub data_type: Option<DataType>,
    pub utype: Option<String>,
    pub descriptions: Vec<String>,
    pub references: Vec<Reference>,
}

impl Param {
    /// Numeric values get `dataType` set to `int` or `float`; text values
    /// leave it unset (the schema default is `string`).
    pub fn new(name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            value: Some(value.text),
            data_type: value.data_type,
            ..Self::default()
        }
    }

    pub fn with_ucd(mut self, ucd: impl Into<String>) -> Self {
        self.ucd = Some(ucd.into());
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Override the inferred `dataType`
    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn with_utype(mut self, utype: impl Into<String>) -> Self {
        self.utype = Some(utype.into());
        self
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.descriptions.push(text.into());
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

/// Entry of a Group
#[derive(Debug, Clone, PartialEq)]
pub enum GroupMember {
    Param(Param),
    Group(Group),
}

/// A named collection of Params and nested Groups
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    pub name: Option<String>,
    pub group_type: Option<String>,
    pub members: Vec<GroupMember>,
    pub descriptions: Vec<String>,
    pub references: Vec<Reference>,
}

impl Group {
    /// Create a group owning `params`
    pub fn new(name: impl Into<String>, params: impl IntoIterator<Item = Param>) -> Self {
        Self {
            name: Some(name.into()),
            members: params.into_iter().map(GroupMember::Param).collect(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, group_type: impl Into<String>) -> Self {
        self.group_type = Some(group_type.into());
        self
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.descriptions.push(text.into());
        self
    }

    pub fn add_param(&mut self, param: Param) -> &mut Self {
        self.members.push(GroupMember::Param(param));
        self
    }

    pub fn add_group(&mut self, group: Group) -> &mut Self {
        self.members.push(GroupMember::Group(group));
        self
    }

    /// Direct Params, in order
    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.members.iter().filter_map(|member| match member {
            GroupMember::Param(param) => Some(param),
            GroupMember::Group(_) => None,
        })
    }

    /// First direct Param with the given name
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params().find(|param| param.name == name)
    }

    /// Nested Groups, in order
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.members.iter().filter_map(|member| match member {
            GroupMember::Group(group) => Some(group),
            GroupMember::Param(_) => None,
        })
    }
}

/// Entry of the `What` payload
#[derive(Debug, Clone, PartialEq)]
pub enum WhatItem {
    Param(Param),
    Group(Group),
    /// Schema-free content. Any extension element makes the packet invalid.
    Extension(Element),
}

impl WhatItem {
    /// Local element name of the item
    pub fn tag(&self) -> &str {
        match self {
            WhatItem::Param(_) => "Param",
            WhatItem::Group(_) => "Group",
            WhatItem::Extension(element) => element.local_name(),
        }
    }
}

/// Packet payload
///
/// Items keep insertion order. Name lookups return the first match; the
/// ordered views expose every same-named entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct What {
    pub items: Vec<WhatItem>,
    pub descriptions: Vec<String>,
    pub references: Vec<Reference>,
}

impl What {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.descriptions.is_empty() && self.references.is_empty()
    }

    pub fn items(&self) -> &[WhatItem] {
        &self.items
    }

    pub fn add_param(&mut self, param: Param) -> &mut Self {
        self.items.push(WhatItem::Param(param));
        self
    }

    pub fn add_group(&mut self, group: Group) -> &mut Self {
        self.items.push(WhatItem::Group(group));
        self
    }

    /// Append a schema-free element
    pub fn add_extension(&mut self, element: Element) -> &mut Self {
        self.items.push(WhatItem::Extension(element));
        self
    }

    /// Top-level Params, in order
    pub fn params(&self) -> impl Iterator<Item = &Param> {
        self.items.iter().filter_map(|item| match item {
            WhatItem::Param(param) => Some(param),
            _ => None,
        })
    }

    /// First top-level Param with the given name
    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params().find(|param| param.name == name)
    }

    pub fn param_mut(&mut self, name: &str) -> Option<&mut Param> {
        self.items.iter_mut().find_map(|item| match item {
            WhatItem::Param(param) if param.name == name => Some(param),
            _ => None,
        })
    }

    /// Every top-level Param with the given name, in order
    pub fn params_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Param> + 'a {
        self.params().filter(move |param| param.name == name)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.items.iter().filter_map(|item| match item {
            WhatItem::Group(group) => Some(group),
            _ => None,
        })
    }

    /// First Group with the given name
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups().find(|group| group.name.as_deref() == Some(name))
    }

    /// Move top-level Params into a new Group appended to `What`.
    ///
    /// The first Param matching each name is taken, in the order the names
    /// are given. When any name has no match, nothing is moved.
    pub fn group_params<S: AsRef<str>>(
        &mut self,
        names: &[S],
        group_name: impl Into<String>,
    ) -> Result<()> {
        let mut indices: Vec<usize> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let index = (0..self.items.len())
                .find(|index| {
                    !indices.contains(index)
                        && matches!(&self.items[*index], WhatItem::Param(param) if param.name == name)
                })
                .ok_or_else(|| VoeventError::invalid_value("Param", name))?;
            indices.push(index);
        }

        let mut slots: Vec<Option<WhatItem>> =
            std::mem::take(&mut self.items).into_iter().map(Some).collect();
        let params: Vec<Param> = indices
            .iter()
            .filter_map(|&index| match slots[index].take() {
                Some(WhatItem::Param(param)) => Some(param),
                _ => None,
            })
            .collect();
        self.items = slots.into_iter().flatten().collect();

        self.add_group(Group::new(group_name, params));
        Ok(())
    }

    /// Extension elements, in order
    pub fn extensions(&self) -> impl Iterator<Item = &Element> {
        self.items.iter().filter_map(|item| match item {
            WhatItem::Extension(element) => Some(element),
            _ => None,
        })
    }

    /// Every extension element with the given local name, in order
    pub fn extensions_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.extensions().filter(move |element| element.local_name() == tag)
    }

    /// Assign text to the first extension element named `tag`, appending a
    /// new one when none exists. Later same-named elements are untouched.
    pub fn set_text_child(&mut self, tag: &str, text: impl Into<String>) -> &mut Self {
        let existing = self.items.iter_mut().find_map(|item| match item {
            WhatItem::Extension(element) if element.local_name() == tag => Some(element),
            _ => None,
        });

        match existing {
            Some(element) => element.set_text(text),
            None => self
                .items
                .push(WhatItem::Extension(Element::new(tag).with_text(text))),
        }
        self
    }

    /// Remove every extension element with the given local name
    pub fn remove_extensions(&mut self, tag: &str) -> Vec<Element> {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.items)
            .into_iter()
            .partition(|item| matches!(item, WhatItem::Extension(element) if element.local_name() == tag));
        self.items = kept;
        removed
            .into_iter()
            .filter_map(|item| match item {
                WhatItem::Extension(element) => Some(element),
                _ => None,
            })
            .collect()
    }

    pub fn remove_item(&mut self, index: usize) -> Option<WhatItem> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn add_description(&mut self, text: impl Into<String>) -> &mut Self {
        self.descriptions.push(text.into());
        self
    }

    /// Replace the first description, adding one when there is none
    pub fn set_description(&mut self, text: impl Into<String>) -> &mut Self {
        set_first(&mut self.descriptions, text);
        self
    }

    pub fn add_reference(&mut self, reference: Reference) -> &mut Self {
        self.references.push(reference);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaia_what() -> What {
        let mut what = What::new();
        what.add_param(Param::new("mag", 18.77).with_ucd("phot.mag"));
        what.add_param(Param::new("hist_mag", 19.62).with_ucd("phot.mag"));
        what.add_param(Param::new("hist_scatter", 0.07).with_ucd("phot.mag"));
        what
    }

    #[test]
    fn test_numeric_values_set_data_type() {
        let float = Param::new("mag", 18.77);
        assert_eq!(float.value(), Some("18.77"));
        assert_eq!(float.data_type, Some(DataType::Float));

        let int = Param::new("count", 42);
        assert_eq!(int.value(), Some("42"));
        assert_eq!(int.data_type, Some(DataType::Int));

        let text = Param::new("class", "unknown");
        assert_eq!(text.data_type, None);

        let overridden = Param::new("id", 7).with_data_type(DataType::String);
        assert_eq!(overridden.data_type, Some(DataType::String));
    }

    #[test]
    fn test_group_params_moves_without_duplicates() {
        let mut what = gaia_what();
        what.group_params(&["hist_scatter", "hist_mag"], "historic").unwrap();

        let group = what.group("historic").unwrap();
        let names: Vec<_> = group.params().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["hist_scatter", "hist_mag"]);

        let remaining: Vec<_> = what.params().map(|p| p.name.as_str()).collect();
        assert_eq!(remaining, vec!["mag"]);
        assert_eq!(what.items().len(), 2);
    }

    #[test]
    fn test_group_params_unknown_name_moves_nothing() {
        let mut what = gaia_what();
        let before = what.clone();

        let result = what.group_params(&["hist_mag", "missing"], "historic");
        assert!(matches!(result, Err(VoeventError::InvalidValue { .. })));
        assert_eq!(what, before);
    }

    #[test]
    fn test_group_params_takes_first_match_per_name() {
        let mut what = What::new();
        what.add_param(Param::new("mag", 1));
        what.add_param(Param::new("mag", 2));

        what.group_params(&["mag"], "first").unwrap();
        assert_eq!(what.param("mag").and_then(Param::value), Some("2"));

        what.group_params(&["mag"], "second").unwrap();
        assert!(what.param("mag").is_none());
        assert_eq!(what.groups().count(), 2);
    }

    #[test]
    fn test_duplicate_names_first_match_and_ordered_view() {
        let mut what = What::new();
        what.add_param(Param::new("flux", 1.5));
        what.add_param(Param::new("flux", 2.5));

        assert_eq!(what.param("flux").and_then(Param::value), Some("1.5"));
        let all: Vec<_> = what.params_named("flux").filter_map(Param::value).collect();
        assert_eq!(all, vec!["1.5", "2.5"]);

        what.param_mut("flux").unwrap().unit = Some("mJy".to_string());
        assert_eq!(what.params().nth(1).and_then(|p| p.unit.as_deref()), None);
    }

    #[test]
    fn test_extension_set_text_child_and_removal() {
        let mut what = gaia_what();
        for i in 0..5 {
            what.add_extension(Element::new("foo").with_text(format!("foo{i}")));
        }
        assert_eq!(what.extensions_named("foo").count(), 5);

        what.set_text_child("foo", "replaced");
        let texts: Vec<_> = what.extensions_named("foo").filter_map(Element::text).collect();
        assert_eq!(texts[0], "replaced");
        assert_eq!(texts[1], "foo1");

        what.set_text_child("shortcut", "some text");
        assert_eq!(what.items().last().map(WhatItem::tag), Some("shortcut"));

        let removed = what.remove_extensions("foo");
        assert_eq!(removed.len(), 5);
        assert_eq!(what.extensions().count(), 1);
        assert_eq!(what.params().count(), 3);
    }

    #[test]
    fn test_nested_groups() {
        let mut outer = Group::new("outer", [Param::new("a", 1)]);
        outer.add_group(Group::new("inner", [Param::new("b", 2)]));

        assert_eq!(outer.param("a").and_then(Param::value), Some("1"));
        assert_eq!(outer.groups().count(), 1);
        assert_eq!(outer.members.len(), 2);
    }
}
