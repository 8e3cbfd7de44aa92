//! LibXML2 FFI Wrapper Module
//!
//! Safe wrappers around the handful of libxml2 calls this crate needs:
//! XSD parsing, in-memory document parsing, schema validation of a parsed
//! document, and lifting a parsed document into an owned [`Element`] tree.
//!
//! ## Why libxml2
//!
//! The Rust ecosystem has good XML readers (roxmltree, quick-xml, xml-rs) but
//! no mature XML Schema (XSD) validator. libxml2 is the reference validator for
//! VOEvent tooling (the Python tooling reaches it through lxml), so packets are
//! checked here by the same engine the rest of the community uses.
//!
//! ## Thread Safety Strategy
//!
//! Following the libxml2 threading notes (http://xmlsoft.org/threads.html):
//!
//! - **Initialization**: `xmlInitParser` is not thread-safe and runs exactly
//!   once behind a `std::sync::Once`.
//! - **Schema parsing**: not thread-safe. Schemas are parsed once and cached
//!   (see `schema_loader`), never concurrently.
//! - **Document parsing and validation**: thread-safe for distinct documents.
//!   Every validation builds its own validation context, so a single parsed
//!   schema can be shared through `Arc` across rayon workers.
//!
//! ## Error capture
//!
//! Validation errors are reported through a structured error callback. Only
//! the first violation is kept; libxml2 may keep validating after it, but the
//! rest are discarded.

use std::ffi::{CStr, c_void};
use std::marker::PhantomData;
use std::ptr;
use std::sync::{Arc, Once};

use libc::{c_char, c_int, c_ushort};

use crate::error::{LibXml2Error, LibXml2Result};
use crate::xml::Element;

/// Global initialization flag for libxml2
static LIBXML2_INIT: Once = Once::new();

// xmlParserOption flags
const XML_PARSE_NOERROR: c_int = 1 << 5;
const XML_PARSE_NOWARNING: c_int = 1 << 6;
const XML_PARSE_NONET: c_int = 1 << 11;
const XML_PARSE_NOCDATA: c_int = 1 << 14;

const DOCUMENT_PARSE_OPTIONS: c_int =
    XML_PARSE_NOERROR | XML_PARSE_NOWARNING | XML_PARSE_NONET | XML_PARSE_NOCDATA;

// xmlElementType values
const XML_ELEMENT_NODE: c_int = 1;
const XML_TEXT_NODE: c_int = 3;
const XML_CDATA_SECTION_NODE: c_int = 4;

/// ## Opaque libxml2 structures
#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

/// Leading fields of libxml2's `xmlNs`
#[repr(C)]
pub struct XmlNs {
    pub next: *mut XmlNs,
    pub ns_type: c_int,
    pub href: *const c_char,
    pub prefix: *const c_char,
}

/// Leading fields of libxml2's `xmlNode`; only ever read through pointers
/// handed out by libxml2.
#[repr(C)]
pub struct XmlNode {
    pub _private: *mut c_void,
    pub node_type: c_int,
    pub name: *const c_char,
    pub children: *mut XmlNode,
    pub last: *mut XmlNode,
    pub parent: *mut XmlNode,
    pub next: *mut XmlNode,
    pub prev: *mut XmlNode,
    pub doc: *mut XmlDoc,
    pub ns: *mut XmlNs,
    pub content: *const c_char,
    pub properties: *mut XmlAttr,
    pub ns_def: *mut XmlNs,
    pub psvi: *mut c_void,
    pub line: c_ushort,
    pub extra: c_ushort,
}

/// Leading fields of libxml2's `xmlAttr`
#[repr(C)]
pub struct XmlAttr {
    pub _private: *mut c_void,
    pub node_type: c_int,
    pub name: *const c_char,
    pub children: *mut XmlNode,
    pub last: *mut XmlNode,
    pub parent: *mut XmlNode,
    pub next: *mut XmlAttr,
    pub prev: *mut XmlAttr,
    pub doc: *mut XmlDoc,
    pub ns: *mut XmlNs,
}

#[repr(C)]
pub struct xmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlFreeFunc = Option<unsafe extern "C" fn(mem: *mut c_void)>;

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *mut xmlError)>;

// External libxml2 FFI declarations
#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();

    // Schema parsing functions
    pub fn xmlSchemaNewMemParserCtxt(
        buffer: *const c_char,
        size: c_int,
    ) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);

    // Schema validation functions
    pub fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaValidateDoc(ctxt: *mut XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;
    pub fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );

    // Document functions
    pub fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    pub fn xmlFreeDoc(doc: *mut XmlDoc);
    pub fn xmlDocGetRootElement(doc: *const XmlDoc) -> *mut XmlNode;
    pub fn xmlGetNodePath(node: *const XmlNode) -> *mut c_char;

    // Error state
    pub fn xmlGetLastError() -> *const xmlError;
    pub fn xmlResetLastError();

    // Deallocator paired with libxml2's xmlMalloc
    #[allow(non_upper_case_globals)]
    pub static xmlFree: XmlFreeFunc;
}

/// First schema violation reported by libxml2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// libxml2 node path of the offending element, e.g. `/voe:VOEvent/What/foo`
    pub path: String,
    /// Line in the validated text, 0 when unknown
    pub line: i32,
    /// libxml2's description of the problem
    pub message: String,
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    let c_str = unsafe { CStr::from_ptr(ptr) };
    Some(c_str.to_string_lossy().into_owned())
}

/// Node path for an error node. The buffer comes from xmlMalloc and goes
/// back through libxml2's own `xmlFree`, whatever allocator it was built with.
unsafe fn node_path(node: *const XmlNode) -> Option<String> {
    if node.is_null() {
        return None;
    }
    let raw = unsafe { xmlGetNodePath(node) };
    let path = unsafe { cstr_to_string(raw) };
    if !raw.is_null()
        && let Some(free) = unsafe { xmlFree }
    {
        unsafe { free(raw as *mut c_void) };
    }
    path
}

/// Callback for libxml2 to report validation errors (structured)
unsafe extern "C" fn first_violation_callback(user_data: *mut c_void, error: *mut xmlError) {
    let slot = unsafe { &mut *(user_data as *mut Option<Violation>) };
    if slot.is_some() || error.is_null() {
        return;
    }

    let error = unsafe { &*error };
    let message = unsafe { cstr_to_string(error.message) }
        .map(|m| m.trim().to_string())
        .unwrap_or_else(|| format!("libxml2 error code {}", error.code));
    let path = unsafe { node_path(error.node as *const XmlNode) }
        .unwrap_or_else(|| format!("line {}", error.line));

    *slot = Some(Violation {
        path,
        line: error.line,
        message,
    });
}

/// Thread-safe wrapper for libxml2 schema pointer with proper resource management
#[derive(Debug)]
pub struct XmlSchemaPtr {
    inner: Arc<XmlSchemaInner>,
}

#[derive(Debug)]
struct XmlSchemaInner {
    ptr: *mut XmlSchema,
    _phantom: PhantomData<XmlSchema>,
}

// Safety: libxml2 documentation states that xmlSchema structures are thread-safe for reading
unsafe impl Send for XmlSchemaInner {}
unsafe impl Sync for XmlSchemaInner {}

impl XmlSchemaPtr {
    /// # Safety
    ///
    /// `ptr` must come from `xmlSchemaParse` and must not be freed elsewhere.
    pub(crate) unsafe fn from_raw(ptr: *mut XmlSchema) -> LibXml2Result<Self> {
        if ptr.is_null() {
            return Err(LibXml2Error::SchemaParseFailed);
        }

        Ok(XmlSchemaPtr {
            inner: Arc::new(XmlSchemaInner {
                ptr,
                _phantom: PhantomData,
            }),
        })
    }

    pub(crate) fn as_ptr(&self) -> *const XmlSchema {
        self.inner.ptr
    }

    /// Check if the schema pointer is valid (non-null)
    pub fn is_valid(&self) -> bool {
        !self.inner.ptr.is_null()
    }
}

impl Clone for XmlSchemaPtr {
    fn clone(&self) -> Self {
        XmlSchemaPtr {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Drop for XmlSchemaInner {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe {
                xmlSchemaFree(self.ptr);
            }
            self.ptr = ptr::null_mut();
        }
    }
}

/// A parsed libxml2 document, freed on drop
pub struct XmlDocPtr {
    ptr: *mut XmlDoc,
}

impl XmlDocPtr {
    /// Lift the document's root element into an owned [`Element`] tree
    pub fn root_element(&self) -> Option<Element> {
        let root = unsafe { xmlDocGetRootElement(self.ptr) };
        if root.is_null() {
            None
        } else {
            Some(unsafe { node_to_element(root) })
        }
    }

    /// libxml2 node path of the root element, e.g. `/voe:VOEvent`
    pub fn root_path(&self) -> Option<String> {
        unsafe { node_path(xmlDocGetRootElement(self.ptr)) }
    }

    /// True when the root element has a direct child element named `local_name`
    pub fn root_has_child(&self, local_name: &str) -> bool {
        let root = unsafe { xmlDocGetRootElement(self.ptr) };
        if root.is_null() {
            return false;
        }
        let mut child = unsafe { (*root).children } as *const XmlNode;
        while !child.is_null() {
            let current = unsafe { &*child };
            if current.node_type == XML_ELEMENT_NODE
                && unsafe { cstr_to_string(current.name) }.as_deref() == Some(local_name)
            {
                return true;
            }
            child = current.next;
        }
        false
    }
}

impl Drop for XmlDocPtr {
    fn drop(&mut self) {
        if !self.ptr.is_null() {
            unsafe { xmlFreeDoc(self.ptr) };
            self.ptr = ptr::null_mut();
        }
    }
}

unsafe fn qualified_name(name: *const c_char, ns: *const XmlNs) -> (String, Option<String>) {
    let local = unsafe { cstr_to_string(name) }.unwrap_or_default();
    if ns.is_null() {
        return (local, None);
    }
    let ns = unsafe { &*ns };
    let href = unsafe { cstr_to_string(ns.href) };
    match unsafe { cstr_to_string(ns.prefix) } {
        Some(prefix) => (format!("{prefix}:{local}"), href),
        None => (local, href),
    }
}

unsafe fn collect_text(mut node: *const XmlNode, out: &mut String) {
    while !node.is_null() {
        let current = unsafe { &*node };
        if matches!(current.node_type, XML_TEXT_NODE | XML_CDATA_SECTION_NODE)
            && let Some(text) = unsafe { cstr_to_string(current.content) }
        {
            out.push_str(&text);
        }
        node = current.next;
    }
}

unsafe fn node_to_element(node: *const XmlNode) -> Element {
    let node = unsafe { &*node };
    let (name, namespace) = unsafe { qualified_name(node.name, node.ns) };
    let mut element = Element::new(name);
    element.set_namespace(namespace);

    // Declarations are kept as attributes so the element re-serializes on its own.
    let mut ns_def = node.ns_def as *const XmlNs;
    while !ns_def.is_null() {
        let current = unsafe { &*ns_def };
        let key = match unsafe { cstr_to_string(current.prefix) } {
            Some(prefix) => format!("xmlns:{prefix}"),
            None => "xmlns".to_string(),
        };
        element.set_attribute(key, unsafe { cstr_to_string(current.href) }.unwrap_or_default());
        ns_def = current.next;
    }

    let mut attr = node.properties as *const XmlAttr;
    while !attr.is_null() {
        let current = unsafe { &*attr };
        let (key, _) = unsafe { qualified_name(current.name, current.ns) };
        let mut value = String::new();
        unsafe { collect_text(current.children, &mut value) };
        element.set_attribute(key, value);
        attr = current.next;
    }

    let mut segments = Vec::new();
    let mut child = node.children as *const XmlNode;
    while !child.is_null() {
        let current = unsafe { &*child };
        match current.node_type {
            XML_ELEMENT_NODE => {
                element.push_child(unsafe { node_to_element(child) });
            }
            XML_TEXT_NODE | XML_CDATA_SECTION_NODE => {
                if let Some(content) = unsafe { cstr_to_string(current.content) } {
                    segments.push(content);
                }
            }
            _ => {}
        }
        child = current.next;
    }

    // Whitespace-only runs next to child elements are indentation, not content.
    let has_children = !element.children().is_empty();
    let text: String = segments
        .iter()
        .filter(|segment| !has_children || !segment.trim().is_empty())
        .map(String::as_str)
        .collect();
    if !text.is_empty() {
        element.set_text(text);
    }

    element
}

/// Validation result from libxml2
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    /// Validation succeeded (return code 0)
    Valid,
    /// Validation failed; carries the first violation libxml2 reported
    Invalid { code: i32, violation: Violation },
    /// Internal error occurred (return code < 0)
    InternalError { code: i32 },
}

impl ValidationResult {
    /// Create ValidationResult from libxml2 return code and the captured violation
    pub fn from_code(code: c_int, violation: Option<Violation>) -> Self {
        match code {
            0 => ValidationResult::Valid,
            n if n > 0 => ValidationResult::Invalid {
                code: n,
                violation: violation.unwrap_or_else(|| Violation {
                    path: "/".to_string(),
                    line: 0,
                    message: format!("document failed validation with code {n}"),
                }),
            },
            n => ValidationResult::InternalError { code: n },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationResult::Invalid { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ValidationResult::InternalError { .. })
    }

    /// First violation, when the document was invalid
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            ValidationResult::Invalid { violation, .. } => Some(violation),
            _ => None,
        }
    }
}

/// LibXML2 wrapper providing safe access to libxml2 functionality
pub struct LibXml2Wrapper {
    _phantom: PhantomData<()>,
}

impl LibXml2Wrapper {
    /// Create a wrapper, initializing libxml2 on first use
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
        });

        LibXml2Wrapper {
            _phantom: PhantomData,
        }
    }

    /// Parse an XML schema from memory buffer
    ///
    /// **IMPORTANT**: Schema parsing is NOT thread-safe in libxml2. Callers
    /// parse each schema once and share the resulting [`XmlSchemaPtr`].
    pub fn parse_schema_from_memory(&self, schema_data: &[u8]) -> LibXml2Result<XmlSchemaPtr> {
        let size = c_int::try_from(schema_data.len()).map_err(|_| {
            LibXml2Error::DocumentTooLarge {
                size: schema_data.len(),
            }
        })?;

        unsafe {
            let parser_ctxt = xmlSchemaNewMemParserCtxt(schema_data.as_ptr() as *const c_char, size);
            if parser_ctxt.is_null() {
                return Err(LibXml2Error::MemoryAllocation);
            }

            let schema_ptr = xmlSchemaParse(parser_ctxt);
            xmlSchemaFreeParserCtxt(parser_ctxt);

            XmlSchemaPtr::from_raw(schema_ptr)
        }
    }

    /// Parse a document from memory without touching the network
    ///
    /// `name` is only used in error messages.
    pub fn parse_document(&self, content: &[u8], name: &str) -> LibXml2Result<XmlDocPtr> {
        let size = c_int::try_from(content.len()).map_err(|_| LibXml2Error::DocumentTooLarge {
            size: content.len(),
        })?;

        unsafe {
            xmlResetLastError();
            let doc = xmlReadMemory(
                content.as_ptr() as *const c_char,
                size,
                ptr::null(),
                ptr::null(),
                DOCUMENT_PARSE_OPTIONS,
            );

            if doc.is_null() {
                let detail = last_error_message().unwrap_or_else(|| "unknown error".to_string());
                return Err(LibXml2Error::MalformedDocument {
                    name: format!("{name}: {detail}"),
                });
            }

            Ok(XmlDocPtr { ptr: doc })
        }
    }

    /// Validate a parsed document against a schema
    ///
    /// Safe to call concurrently for distinct documents: each call creates its
    /// own validation context.
    pub fn validate_document(
        &self,
        schema: &XmlSchemaPtr,
        doc: &XmlDocPtr,
        name: &str,
    ) -> LibXml2Result<ValidationResult> {
        unsafe {
            let valid_ctxt = xmlSchemaNewValidCtxt(schema.as_ptr());
            if valid_ctxt.is_null() {
                return Err(LibXml2Error::ValidationContextCreationFailed);
            }

            let mut first: Option<Violation> = None;
            let first_ptr = &mut first as *mut Option<Violation> as *mut c_void;
            xmlSchemaSetValidStructuredErrors(
                valid_ctxt,
                Some(first_violation_callback),
                first_ptr,
            );

            let result_code = xmlSchemaValidateDoc(valid_ctxt, doc.ptr);

            // Always free the validation context
            xmlSchemaFreeValidCtxt(valid_ctxt);

            match ValidationResult::from_code(result_code, first) {
                ValidationResult::InternalError { code } => Err(LibXml2Error::ValidationFailed {
                    code,
                    name: name.to_string(),
                }),
                result => Ok(result),
            }
        }
    }

    /// Parse and validate XML content held in memory
    pub fn validate_memory(
        &self,
        schema: &XmlSchemaPtr,
        xml_content: &[u8],
        name: &str,
    ) -> LibXml2Result<ValidationResult> {
        let doc = self.parse_document(xml_content, name)?;
        self.validate_document(schema, &doc, name)
    }
}

unsafe fn last_error_message() -> Option<String> {
    let error = unsafe { xmlGetLastError() };
    if error.is_null() {
        return None;
    }
    let error = unsafe { &*error };
    unsafe { cstr_to_string(error.message) }
        .map(|m| format!("line {}: {}", error.line, m.trim()))
}

impl Default for LibXml2Wrapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIMPLE_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="root">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="element" type="xs:string"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

    const VALID_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root><element>Hello World</element></root>"#;

    const INVALID_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<root>
    <invalid>content</invalid>
    <another>content</another>
</root>"#;

    #[test]
    fn test_schema_parsing_success() {
        let wrapper = LibXml2Wrapper::new();
        let schema = wrapper.parse_schema_from_memory(SIMPLE_XSD.as_bytes()).unwrap();
        assert!(schema.is_valid());
    }

    #[test]
    fn test_schema_parsing_invalid_schema() {
        let wrapper = LibXml2Wrapper::new();
        let result = wrapper.parse_schema_from_memory(b"<invalid>not a schema</invalid>");

        match result {
            Err(LibXml2Error::SchemaParseFailed) => (),
            Err(other) => panic!("Expected SchemaParseFailed, got {:?}", other),
            Ok(_) => panic!("Expected SchemaParseFailed, got a schema"),
        }
    }

    #[test]
    fn test_schema_parsing_empty_data() {
        let wrapper = LibXml2Wrapper::new();
        assert!(wrapper.parse_schema_from_memory(&[]).is_err());
    }

    #[test]
    fn test_validate_memory_valid() {
        let wrapper = LibXml2Wrapper::new();
        let schema = wrapper.parse_schema_from_memory(SIMPLE_XSD.as_bytes()).unwrap();

        let result = wrapper
            .validate_memory(&schema, VALID_XML.as_bytes(), "valid.xml")
            .unwrap();
        assert_eq!(result, ValidationResult::Valid);
    }

    #[test]
    fn test_validate_memory_keeps_first_violation_only() {
        let wrapper = LibXml2Wrapper::new();
        let schema = wrapper.parse_schema_from_memory(SIMPLE_XSD.as_bytes()).unwrap();

        let result = wrapper
            .validate_memory(&schema, INVALID_XML.as_bytes(), "invalid.xml")
            .unwrap();
        assert!(result.is_invalid());

        let violation = result.violation().unwrap();
        assert_eq!(violation.path, "/root/invalid");
        assert!(violation.message.contains("invalid"));
        assert!(!violation.message.contains("another"));
    }

    #[test]
    fn test_malformed_document() {
        let wrapper = LibXml2Wrapper::new();
        let result = wrapper.parse_document(b"<root><unclosed></root>", "broken.xml");

        match result {
            Err(LibXml2Error::MalformedDocument { name }) => assert!(name.contains("broken.xml")),
            Err(other) => panic!("Expected MalformedDocument, got {:?}", other),
            Ok(_) => panic!("Expected MalformedDocument"),
        }
    }

    #[test]
    fn test_root_element_lifting() {
        let wrapper = LibXml2Wrapper::new();
        let doc = wrapper
            .parse_document(
                br#"<voe:VOEvent xmlns:voe="urn:test" ivorn="ivo://a.b/c#1">
  <Who><Date>2014-11-07T01:05:09</Date></Who>
  <What><Param name="mag" value="18.77"/><Description>Fish &amp; chips</Description></What>
</voe:VOEvent>"#,
                "lift.xml",
            )
            .unwrap();

        let root = doc.root_element().unwrap();
        assert_eq!(root.name(), "voe:VOEvent");
        assert_eq!(root.local_name(), "VOEvent");
        assert_eq!(root.namespace(), Some("urn:test"));
        assert_eq!(root.attribute("ivorn"), Some("ivo://a.b/c#1"));
        assert_eq!(root.attribute("xmlns:voe"), Some("urn:test"));
        assert!(root.text().is_none());

        let who = root.child("Who").unwrap();
        assert_eq!(who.child("Date").and_then(Element::text), Some("2014-11-07T01:05:09"));

        let what = root.child("What").unwrap();
        assert_eq!(what.child("Param").and_then(|p| p.attribute("value")), Some("18.77"));
        assert_eq!(
            what.child("Description").and_then(Element::text),
            Some("Fish & chips")
        );
    }

    #[test]
    fn test_lifting_drops_indentation_beside_children() {
        let wrapper = LibXml2Wrapper::new();
        let doc = wrapper
            .parse_document(
                b"<note>hello<b>x</b>\n    <c/>\n  </note>",
                "mixed.xml",
            )
            .unwrap();

        let note = doc.root_element().unwrap();
        assert_eq!(note.text(), Some("hello"));
        assert_eq!(note.children().len(), 2);
    }

    #[test]
    fn test_root_children_and_path() {
        let wrapper = LibXml2Wrapper::new();
        let doc = wrapper
            .parse_document(
                br#"<voe:VOEvent xmlns:voe="urn:test"><Who/><!-- WhereWhen --></voe:VOEvent>"#,
                "root.xml",
            )
            .unwrap();

        assert_eq!(doc.root_path().as_deref(), Some("/voe:VOEvent"));
        assert!(doc.root_has_child("Who"));
        assert!(!doc.root_has_child("WhereWhen"));
    }

    #[test]
    fn test_validation_result_from_code() {
        assert_eq!(ValidationResult::from_code(0, None), ValidationResult::Valid);
        assert!(ValidationResult::from_code(5, None).is_invalid());
        assert_eq!(
            ValidationResult::from_code(-1, None),
            ValidationResult::InternalError { code: -1 }
        );
    }

    #[test]
    fn test_validation_result_predicates() {
        let valid = ValidationResult::Valid;
        assert!(valid.is_valid());
        assert!(!valid.is_invalid());
        assert!(!valid.is_error());
        assert!(valid.violation().is_none());

        let invalid = ValidationResult::from_code(1, None);
        assert!(!invalid.is_valid());
        assert!(invalid.is_invalid());
        assert_eq!(invalid.violation().map(|v| v.path.as_str()), Some("/"));

        let error = ValidationResult::InternalError { code: -1 };
        assert!(error.is_error());
    }

    #[test]
    fn test_schema_ptr_cloning() {
        let wrapper = LibXml2Wrapper::new();
        let schema = wrapper.parse_schema_from_memory(SIMPLE_XSD.as_bytes()).unwrap();
        let cloned_schema = schema.clone();

        assert!(cloned_schema.is_valid());
        assert_eq!(schema.as_ptr(), cloned_schema.as_ptr());
    }

    #[test]
    fn test_concurrent_validation_with_shared_schema() {
        use rayon::prelude::*;

        let wrapper = LibXml2Wrapper::new();
        let schema = wrapper.parse_schema_from_memory(SIMPLE_XSD.as_bytes()).unwrap();

        let results: Vec<bool> = (0..32)
            .into_par_iter()
            .map(|i| {
                let content = if i % 2 == 0 { VALID_XML } else { INVALID_XML };
                wrapper
                    .validate_memory(&schema, content.as_bytes(), "parallel.xml")
                    .map(|r| r.is_valid())
                    .unwrap_or(false)
            })
            .collect();

        assert_eq!(results.iter().filter(|&&valid| valid).count(), 16);
    }
}
