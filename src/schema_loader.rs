//! Schema sources and `xsi:schemaLocation` extraction
//!
//! The VOEvent v2.0 XSD ships inside the binary and is parsed once per
//! process. A local XSD file can be used instead; nothing is ever fetched
//! over the network.

use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use tracing::debug;

use crate::definitions::VOEVENT_NAMESPACE;
use crate::error::{Result, VoeventError};
use crate::libxml2::{LibXml2Wrapper, XmlSchemaPtr};

/// VOEvent v2.0 schema embedded at build time
pub const EMBEDDED_SCHEMA: &str = include_str!("../schemas/VOEvent-v2.0.xsd");

/// Parsed embedded schema, shared by every validator in the process
static EMBEDDED_PARSED: OnceLock<std::result::Result<XmlSchemaPtr, String>> = OnceLock::new();

/// libxml2 schema parsing is not thread-safe
static SCHEMA_PARSE_LOCK: Mutex<()> = Mutex::new(());

/// Cached regex for xsi:schemaLocation extraction
static SCHEMA_LOCATION_REGEX: OnceLock<Regex> = OnceLock::new();

/// Cached regex for xsi:noNamespaceSchemaLocation extraction
static NO_NAMESPACE_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_schema_location_regex() -> &'static Regex {
    SCHEMA_LOCATION_REGEX.get_or_init(|| {
        Regex::new(r#"xsi:schemaLocation\s*=\s*["']([^"']*)["']"#)
            .expect("Failed to compile schemaLocation regex")
    })
}

fn get_no_namespace_regex() -> &'static Regex {
    NO_NAMESPACE_REGEX.get_or_init(|| {
        Regex::new(r#"xsi:noNamespaceSchemaLocation\s*=\s*["']([^"']*)["']"#)
            .expect("Failed to compile noNamespaceSchemaLocation regex")
    })
}

/// One namespace/location pair named by a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaReference {
    /// `None` for `xsi:noNamespaceSchemaLocation`
    pub namespace: Option<String>,
    pub url: String,
}

impl SchemaReference {
    pub fn is_voevent(&self) -> bool {
        self.namespace.as_deref() == Some(VOEVENT_NAMESPACE)
    }
}

/// Collect the schema references declared in a document.
///
/// Only the text up to the end of the root start tag is scanned.
pub fn extract_schema_references(content: &str) -> Vec<SchemaReference> {
    let head = root_start_tag(content);
    let mut references = Vec::new();

    for caps in get_schema_location_regex().captures_iter(head) {
        let tokens: Vec<&str> = caps[1].split_whitespace().collect();
        for pair in tokens.chunks_exact(2) {
            references.push(SchemaReference {
                namespace: Some(pair[0].to_string()),
                url: pair[1].to_string(),
            });
        }
    }

    for caps in get_no_namespace_regex().captures_iter(head) {
        references.push(SchemaReference {
            namespace: None,
            url: caps[1].trim().to_string(),
        });
    }

    references
}

/// Prolog, comments and the root start tag of a document
fn root_start_tag(content: &str) -> &str {
    let mut offset = 0;
    while let Some(start) = content[offset..].find('<') {
        let tag_start = offset + start;
        let rest = &content[tag_start..];
        if rest.starts_with("<?") || rest.starts_with("<!") {
            match rest.find('>') {
                Some(end) => offset = tag_start + end + 1,
                None => return content,
            }
            continue;
        }
        return match rest.find('>') {
            Some(end) => &content[..tag_start + end + 1],
            None => content,
        };
    }
    content
}

/// Where a validator's schema comes from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SchemaSource {
    /// The VOEvent v2.0 schema built into the crate
    #[default]
    Embedded,
    /// A local XSD file
    File(PathBuf),
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaSource::Embedded => write!(f, "embedded VOEvent v2.0 schema"),
            SchemaSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl From<Option<PathBuf>> for SchemaSource {
    fn from(path: Option<PathBuf>) -> Self {
        path.map(SchemaSource::File).unwrap_or_default()
    }
}

/// Loads and parses schemas
pub struct SchemaLoader {
    wrapper: LibXml2Wrapper,
}

impl SchemaLoader {
    pub fn new() -> Self {
        Self {
            wrapper: LibXml2Wrapper::new(),
        }
    }

    /// Parse the schema for `source`. The embedded schema is parsed once per
    /// process and shared.
    pub fn load(&self, source: &SchemaSource) -> Result<XmlSchemaPtr> {
        match source {
            SchemaSource::Embedded => self.load_embedded(),
            SchemaSource::File(path) => self.load_file(path),
        }
    }

    fn load_embedded(&self) -> Result<XmlSchemaPtr> {
        let parsed = EMBEDDED_PARSED.get_or_init(|| {
            debug!("Parsing embedded VOEvent v2.0 schema");
            self.parse(EMBEDDED_SCHEMA.as_bytes())
                .map_err(|err| err.to_string())
        });

        parsed.clone().map_err(|details| VoeventError::SchemaLoad {
            source_name: SchemaSource::Embedded.to_string(),
            details,
        })
    }

    fn load_file(&self, path: &Path) -> Result<XmlSchemaPtr> {
        let schema_load_error = |details: String| VoeventError::SchemaLoad {
            source_name: path.display().to_string(),
            details,
        };

        let data = fs::read(path).map_err(|err| schema_load_error(err.to_string()))?;
        debug!(path = %path.display(), bytes = data.len(), "Parsing schema file");
        self.parse(&data)
            .map_err(|err| schema_load_error(err.to_string()))
    }

    fn parse(&self, data: &[u8]) -> std::result::Result<XmlSchemaPtr, crate::error::LibXml2Error> {
        // A poisoned lock only means another parse panicked; libxml2 state is unaffected.
        let _guard = SCHEMA_PARSE_LOCK
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.wrapper.parse_schema_from_memory(data)
    }
}

impl Default for SchemaLoader {
    fn default() -> Self {
        Self::new()
    }
}
