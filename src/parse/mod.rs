pub mod attributes;
pub(crate) mod builder;
pub mod dom_parser;
pub mod stream_parser;
pub mod xml_writer;

use serde::{Deserialize, Serialize};

use crate::error::{HierarchyError, Result};
use crate::model::{Hierarchy, ItemId, ItemKind};

pub use attributes::{parse_bool, parse_color, parse_timestamp};
pub use dom_parser::DomParser;
pub use stream_parser::StreamingParser;
pub use xml_writer::{write_hierarchy, write_item, write_scoped};

/// Namespace of the store's hierarchy XML.
pub const ONENOTE_NAMESPACE: &str = "http://schemas.microsoft.com/office/onenote/2013/onenote";

/// Converts store XML into hierarchy items.
///
/// Implementations must produce identical hierarchies for identical input.
pub trait HierarchyParser {
    /// Parse a whole snapshot rooted at `Notebooks`.
    fn parse_root(&self, xml: &str) -> Result<Hierarchy>;

    /// Parse one element and its descendants into `hierarchy` as a detached
    /// item whose parent link is `parent`.
    fn parse(&self, hierarchy: &mut Hierarchy, xml: &str, parent: Option<ItemId>) -> Result<ItemId>;

    /// Re-parse `item` from `xml`, overwriting its attributes and replacing
    /// its child collections. The item keeps its handle, identity and place
    /// in its parent. On error the item is left as it was.
    fn parse_existing(&self, hierarchy: &mut Hierarchy, xml: &str, item: ItemId) -> Result<()>;
}

/// Selectable parser implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserEngine {
    /// Forward-only reader (quick-xml).
    #[default]
    Streaming,
    /// Whole-document tree (roxmltree).
    Dom,
}

impl HierarchyParser for ParserEngine {
    fn parse_root(&self, xml: &str) -> Result<Hierarchy> {
        match self {
            ParserEngine::Streaming => StreamingParser.parse_root(xml),
            ParserEngine::Dom => DomParser.parse_root(xml),
        }
    }

    fn parse(&self, hierarchy: &mut Hierarchy, xml: &str, parent: Option<ItemId>) -> Result<ItemId> {
        match self {
            ParserEngine::Streaming => StreamingParser.parse(hierarchy, xml, parent),
            ParserEngine::Dom => DomParser.parse(hierarchy, xml, parent),
        }
    }

    fn parse_existing(&self, hierarchy: &mut Hierarchy, xml: &str, item: ItemId) -> Result<()> {
        match self {
            ParserEngine::Streaming => StreamingParser.parse_existing(hierarchy, xml, item),
            ParserEngine::Dom => DomParser.parse_existing(hierarchy, xml, item),
        }
    }
}

/// What an element's local name means to the parsers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Element {
    Item(ItemKind),
    OpenSections,
    Notebooks,
}

impl Element {
    pub(crate) fn from_local_name(name: &str) -> Option<Element> {
        match name {
            "OpenSections" => Some(Element::OpenSections),
            "Notebooks" => Some(Element::Notebooks),
            other => ItemKind::from_element_name(other).map(Element::Item),
        }
    }
}

/// What an element means, or `None` when it is outside the store
/// namespace or not one the parsers track.
pub(crate) fn classify(namespace: Option<&str>, name: &str) -> Option<Element> {
    if namespace != Some(ONENOTE_NAMESPACE) {
        return None;
    }
    Element::from_local_name(name)
}

/// Name for messages: the bare local name inside the store namespace,
/// `{namespace}name` outside it.
pub(crate) fn display_name(namespace: Option<&str>, name: &str) -> String {
    match namespace {
        Some(ns) if ns != ONENOTE_NAMESPACE => format!("{{{}}}{}", ns, name),
        _ => name.to_string(),
    }
}

/// Kind of a child element that `parent` tracks, or `None` to skip it.
pub(crate) fn child_kind(parent: ItemKind, namespace: Option<&str>, name: &str) -> Option<ItemKind> {
    match classify(namespace, name) {
        Some(Element::Item(kind)) if parent.accepts(kind) => Some(kind),
        _ => {
            log::debug!("skipping <{}> inside {}", display_name(namespace, name), parent);
            None
        }
    }
}

/// Kind of the element at the top of a single-item fragment.
pub(crate) fn top_item_kind(namespace: Option<&str>, name: &str) -> Result<ItemKind> {
    match classify(namespace, name) {
        Some(Element::Item(kind)) => Ok(kind),
        _ => Err(HierarchyError::UnsupportedElement(display_name(namespace, name))),
    }
}

/// Reject a snapshot whose top element is not `Notebooks`.
pub(crate) fn check_root_element(namespace: Option<&str>, name: &str) -> Result<()> {
    match classify(namespace, name) {
        Some(Element::Notebooks) => Ok(()),
        _ => Err(HierarchyError::UnsupportedElement(display_name(namespace, name))),
    }
}

/// Check what precedes the first element.
///
/// The declaration, comments, processing instructions and whitespace are
/// passed over. A document without an element, or one that opens with text
/// or CDATA, is `UnsupportedNodeType`. A misplaced declaration, a doctype
/// or an unterminated construct is `MalformedXml`.
pub(crate) fn check_prolog(xml: &str) -> Result<()> {
    let doc = xml.strip_prefix('\u{feff}').unwrap_or(xml);
    let mut rest = doc;
    loop {
        rest = rest.trim_start_matches(is_xml_space);
        if rest.is_empty() {
            return Err(HierarchyError::UnsupportedNodeType(
                "document has no element".to_string(),
            ));
        }
        if let Some(pi) = rest.strip_prefix("<?") {
            let end = pi
                .find("?>")
                .ok_or_else(|| HierarchyError::malformed("unterminated processing instruction"))?;
            let target = pi[..end].split(is_xml_space).next().unwrap_or_default();
            if target == "xml" && rest.len() != doc.len() {
                return Err(HierarchyError::malformed("the XML declaration must come first"));
            }
            rest = &pi[end + 2..];
        } else if let Some(comment) = rest.strip_prefix("<!--") {
            let end = comment
                .find("-->")
                .ok_or_else(|| HierarchyError::malformed("unterminated comment"))?;
            rest = &comment[end + 3..];
        } else if rest.starts_with("<![CDATA[") {
            return Err(HierarchyError::UnsupportedNodeType("CDATA section".to_string()));
        } else if rest.starts_with("<!") {
            return Err(HierarchyError::malformed(
                "document type declarations are not supported",
            ));
        } else if rest.starts_with('<') {
            return Ok(());
        } else {
            let preview: String = rest.chars().take(20).collect();
            return Err(HierarchyError::UnsupportedNodeType(format!("text {:?}", preview)));
        }
    }
}

fn is_xml_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}
