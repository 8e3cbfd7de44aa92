//! `Who`: packet provenance and author contact details

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};

use crate::definitions::IntoUtc;
use crate::error::VoeventError;
use crate::how_why::Reference;

/// Provenance block of a packet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Who {
    /// IVORN of the author, including the `ivo://` scheme
    pub author_ivorn: Option<String>,
    /// When the packet was generated (not when the observation was made)
    pub date: Option<DateTime<Utc>>,
    pub descriptions: Vec<String>,
    pub references: Vec<Reference>,
    /// Written only when at least one field is set
    pub author: Author,
}

impl Who {
    /// Set the packet generation time, truncated to whole seconds
    pub fn set_date(&mut self, date: impl IntoUtc) {
        self.date = Some(date.into_utc().trunc_subsecs(0));
    }
}

/// Single-valued contact fields of the `Author` block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorField {
    Title,
    ShortName,
    LogoUrl,
    ContactName,
    ContactEmail,
    ContactPhone,
    Contributor,
}

impl AuthorField {
    /// Schema order
    pub const ALL: [AuthorField; 7] = [
        AuthorField::Title,
        AuthorField::ShortName,
        AuthorField::LogoUrl,
        AuthorField::ContactName,
        AuthorField::ContactEmail,
        AuthorField::ContactPhone,
        AuthorField::Contributor,
    ];

    /// Element name in VOEvent XML
    pub fn tag(&self) -> &'static str {
        match self {
            AuthorField::Title => "title",
            AuthorField::ShortName => "shortName",
            AuthorField::LogoUrl => "logoURL",
            AuthorField::ContactName => "contactName",
            AuthorField::ContactEmail => "contactEmail",
            AuthorField::ContactPhone => "contactPhone",
            AuthorField::Contributor => "contributor",
        }
    }
}

impl fmt::Display for AuthorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for AuthorField {
    type Err = VoeventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuthorField::ALL
            .into_iter()
            .find(|field| field.tag() == s)
            .ok_or_else(|| VoeventError::UnsupportedAuthorField {
                field: s.to_string(),
            })
    }
}

/// Contact details of the packet author
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Author {
    pub title: Option<String>,
    pub short_name: Option<String>,
    pub logo_url: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub contributor: Option<String>,
}

impl Author {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, field: AuthorField) -> &mut Option<String> {
        match field {
            AuthorField::Title => &mut self.title,
            AuthorField::ShortName => &mut self.short_name,
            AuthorField::LogoUrl => &mut self.logo_url,
            AuthorField::ContactName => &mut self.contact_name,
            AuthorField::ContactEmail => &mut self.contact_email,
            AuthorField::ContactPhone => &mut self.contact_phone,
            AuthorField::Contributor => &mut self.contributor,
        }
    }

    pub fn get(&self, field: AuthorField) -> Option<&str> {
        let value = match field {
            AuthorField::Title => &self.title,
            AuthorField::ShortName => &self.short_name,
            AuthorField::LogoUrl => &self.logo_url,
            AuthorField::ContactName => &self.contact_name,
            AuthorField::ContactEmail => &self.contact_email,
            AuthorField::ContactPhone => &self.contact_phone,
            AuthorField::Contributor => &self.contributor,
        };
        value.as_deref()
    }

    pub fn set(&mut self, field: AuthorField, value: impl Into<String>) {
        *self.slot(field) = Some(value.into());
    }

    pub fn with(mut self, field: AuthorField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    /// Set fields from `(element name, value)` pairs.
    ///
    /// Every key is checked before anything is written, so an unknown key
    /// leaves the block untouched.
    pub fn update<K, V>(&mut self, fields: impl IntoIterator<Item = (K, V)>) -> Result<(), VoeventError>
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let parsed = fields
            .into_iter()
            .map(|(key, value)| Ok((key.as_ref().parse::<AuthorField>()?, value.into())))
            .collect::<Result<Vec<_>, VoeventError>>()?;

        for (field, value) in parsed {
            self.set(field, value);
        }
        Ok(())
    }

    /// Set fields in schema order
    pub fn fields(&self) -> impl Iterator<Item = (AuthorField, &str)> {
        AuthorField::ALL
            .into_iter()
            .filter_map(|field| self.get(field).map(|value| (field, value)))
    }

    pub fn is_empty(&self) -> bool {
        self.fields().next().is_none()
    }
}
