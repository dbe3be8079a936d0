use std::borrow::Cow;

use quick_xml::NsReader;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{QName, ResolveResult};

use crate::error::{HierarchyError, Result};
use crate::model::{Hierarchy, ItemId, ItemKind, Node};
use crate::parse::builder::{self, TreeBuilder};
use crate::parse::{
    attributes, check_prolog, check_root_element, child_kind, classify, display_name,
    top_item_kind, Element, HierarchyParser, ONENOTE_NAMESPACE,
};

/// Parses in one forward pass over the document (quick-xml).
///
/// Items are built depth-first as their start tags are read; the only
/// state kept is the call chain down to the current element. Reading
/// always continues to the end of the document, so a well-formedness error
/// anywhere is reported the same way a whole-document parser reports it.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamingParser;

impl HierarchyParser for StreamingParser {
    fn parse_root(&self, xml: &str) -> Result<Hierarchy> {
        let mut events = Events::open(xml)?;
        let top = events.first_element()?;
        if let Err(err) = top.name().and_then(|name| check_root_element(top.namespace(), name)) {
            return events.finish(Err(err));
        }

        builder::build_root(|b| {
            let built = build_notebooks(b, &mut events, &top);
            events.finish(built)
        })
    }

    fn parse(&self, hierarchy: &mut Hierarchy, xml: &str, parent: Option<ItemId>) -> Result<ItemId> {
        let mut events = Events::open(xml)?;
        let top = events.first_element()?;
        let kind = match top.name().and_then(|name| top_item_kind(top.namespace(), name)) {
            Ok(kind) => kind,
            Err(err) => return events.finish(Err(err)),
        };
        builder::build_detached(hierarchy, parent, |b, parent| {
            let built = build_item(b, &mut events, &top, kind, parent);
            events.finish(built)
        })
    }

    fn parse_existing(&self, hierarchy: &mut Hierarchy, xml: &str, item: ItemId) -> Result<()> {
        let mut events = Events::open(xml)?;
        let top = events.first_element()?;
        let kind = match top.name().and_then(|name| top_item_kind(top.namespace(), name)) {
            Ok(kind) => kind,
            Err(err) => return events.finish(Err(err)),
        };
        builder::build_existing(hierarchy, item, |b, parent| {
            let built = build_item(b, &mut events, &top, kind, parent);
            events.finish(built)
        })
    }
}

/// A start tag, with its namespace resolved at the point it was read.
struct Tag<'a> {
    start: BytesStart<'a>,
    empty: bool,
    namespace: Option<Cow<'static, str>>,
}

impl Tag<'_> {
    fn name(&self) -> Result<&str> {
        std::str::from_utf8(self.start.local_name().into_inner()).map_err(HierarchyError::malformed)
    }

    fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }
}

enum Step<'a> {
    Open(Tag<'a>),
    Close,
    Eof,
    Other,
}

/// The reader's event stream with the document-level checks quick-xml
/// leaves to the caller: unbound prefixes, attribute values, unbalanced
/// tags and anything after the top element.
struct Events<'a> {
    reader: NsReader<&'a [u8]>,
    depth: usize,
    started: bool,
    closed: bool,
}

impl<'a> Events<'a> {
    fn open(xml: &'a str) -> Result<Self> {
        check_prolog(xml)?;
        let mut reader = NsReader::from_str(xml.strip_prefix('\u{feff}').unwrap_or(xml));
        reader.config_mut().trim_text(true);
        Ok(Events {
            reader,
            depth: 0,
            started: false,
            closed: false,
        })
    }

    fn next(&mut self) -> Result<Step<'a>> {
        match self.reader.read_event().map_err(HierarchyError::malformed)? {
            Event::Start(start) => {
                let tag = self.tag(start, false)?;
                self.depth += 1;
                Ok(Step::Open(tag))
            }
            Event::Empty(start) => {
                let tag = self.tag(start, true)?;
                self.closed = self.depth == 0;
                Ok(Step::Open(tag))
            }
            Event::End(_) => {
                self.depth = self
                    .depth
                    .checked_sub(1)
                    .ok_or_else(|| HierarchyError::malformed("unexpected end tag"))?;
                self.closed = self.depth == 0;
                Ok(Step::Close)
            }
            Event::Text(text) => {
                self.check_content()?;
                text.unescape().map_err(HierarchyError::malformed)?;
                Ok(Step::Other)
            }
            Event::CData(_) => {
                self.check_content()?;
                Ok(Step::Other)
            }
            Event::Comment(_) | Event::PI(_) => Ok(Step::Other),
            Event::Decl(_) if !self.started => Ok(Step::Other),
            Event::Decl(_) => Err(HierarchyError::malformed("misplaced XML declaration")),
            Event::DocType(_) => Err(HierarchyError::malformed(
                "document type declarations are not supported",
            )),
            Event::Eof if self.depth > 0 => {
                Err(HierarchyError::malformed("document ended inside an element"))
            }
            Event::Eof if !self.started => Err(HierarchyError::UnsupportedNodeType(
                "document has no element".to_string(),
            )),
            Event::Eof => Ok(Step::Eof),
        }
    }

    fn tag(&self, start: BytesStart<'a>, empty: bool) -> Result<Tag<'a>> {
        if self.closed {
            return Err(HierarchyError::malformed("content after the document element"));
        }
        let namespace = match self.reader.resolve_element(start.name()).0 {
            ResolveResult::Bound(ns) if ns.as_ref() == ONENOTE_NAMESPACE.as_bytes() => {
                Some(Cow::Borrowed(ONENOTE_NAMESPACE))
            }
            ResolveResult::Bound(ns) => {
                Some(Cow::Owned(String::from_utf8_lossy(ns.as_ref()).into_owned()))
            }
            ResolveResult::Unbound => None,
            ResolveResult::Unknown(prefix) => return Err(unknown_prefix(&prefix)),
        };

        for attr in start.attributes() {
            let attr = attr.map_err(HierarchyError::malformed)?;
            if is_namespace_binding(attr.key) {
                continue;
            }
            if let Some(prefix) = attr.key.prefix() {
                if prefix.into_inner() != b"xml" {
                    if let ResolveResult::Unknown(prefix) = self.reader.resolve_attribute(attr.key).0 {
                        return Err(unknown_prefix(&prefix));
                    }
                }
            }
            attribute_value(&attr)?;
        }
        Ok(Tag {
            start,
            empty,
            namespace,
        })
    }

    fn check_content(&self) -> Result<()> {
        if self.depth == 0 {
            return Err(HierarchyError::malformed("text outside the document element"));
        }
        Ok(())
    }

    fn first_element(&mut self) -> Result<Tag<'a>> {
        loop {
            match self.next()? {
                Step::Open(tag) => {
                    self.started = true;
                    return Ok(tag);
                }
                Step::Close | Step::Eof => {
                    return Err(HierarchyError::malformed("no document element"));
                }
                Step::Other => {}
            }
        }
    }

    /// Consume an untracked element and everything inside it.
    fn skip(&mut self, tag: &Tag<'_>) -> Result<()> {
        if tag.empty {
            return Ok(());
        }
        let outer = self.depth.saturating_sub(1);
        while self.depth > outer {
            self.next()?;
        }
        Ok(())
    }

    /// Read to the end of the document after the top element was built.
    ///
    /// A well-formedness error anywhere in the document takes precedence
    /// over an earlier failure in `built`.
    fn finish<T>(&mut self, built: Result<T>) -> Result<T> {
        if let Err(HierarchyError::MalformedXml(_)) = built {
            return built;
        }
        while !matches!(self.next()?, Step::Eof) {}
        built
    }
}

fn unknown_prefix(prefix: &[u8]) -> HierarchyError {
    HierarchyError::MalformedXml(format!(
        "unknown namespace prefix '{}'",
        String::from_utf8_lossy(prefix)
    ))
}

fn is_namespace_binding(key: QName<'_>) -> bool {
    let key = key.into_inner();
    key == b"xmlns" || key.starts_with(b"xmlns:")
}

/// Attribute value after end-of-line and whitespace normalization, with
/// references expanded.
fn attribute_value(attr: &Attribute<'_>) -> Result<String> {
    let raw = std::str::from_utf8(&attr.value).map_err(HierarchyError::malformed)?;
    if raw.contains('<') {
        return Err(HierarchyError::malformed("'<' in attribute value"));
    }
    let normalized = raw.replace("\r\n", " ").replace(['\t', '\r', '\n'], " ");
    let value = quick_xml::escape::unescape(&normalized).map_err(HierarchyError::malformed)?;
    Ok(value.into_owned())
}

fn apply_attributes(node: &mut Node, start: &BytesStart<'_>) -> Result<()> {
    for attr in start.attributes() {
        let attr = attr.map_err(HierarchyError::malformed)?;
        if is_namespace_binding(attr.key) {
            continue;
        }
        let key = std::str::from_utf8(attr.key.local_name().into_inner())
            .map_err(HierarchyError::malformed)?;
        attributes::apply(node, key, &attribute_value(&attr)?)?;
    }
    Ok(())
}

fn build_notebooks(b: &mut TreeBuilder<'_>, events: &mut Events<'_>, top: &Tag<'_>) -> Result<()> {
    if top.empty {
        return Ok(());
    }
    loop {
        let child = match events.next()? {
            Step::Open(tag) => tag,
            Step::Close => return Ok(()),
            Step::Eof => return Err(unexpected_eof("Notebooks")),
            Step::Other => continue,
        };
        let name = child.name()?;
        match classify(child.namespace(), name) {
            Some(Element::Item(ItemKind::Notebook)) => {
                let id = build_item(b, events, &child, ItemKind::Notebook, None)?;
                b.push_notebook(id);
            }
            Some(Element::OpenSections) => build_open_sections(b, events, &child)?,
            _ => {
                log::debug!("skipping <{}> under Notebooks", display_name(child.namespace(), name));
                events.skip(&child)?;
            }
        }
    }
}

/// Build the item whose start tag was just read. Returns once its end tag
/// has been consumed; an empty element has no content to read.
fn build_item(
    b: &mut TreeBuilder<'_>,
    events: &mut Events<'_>,
    tag: &Tag<'_>,
    kind: ItemKind,
    parent: Option<ItemId>,
) -> Result<ItemId> {
    let mut node = Node::blank(kind);
    apply_attributes(&mut node, &tag.start)?;
    let id = b.add(node, parent)?;
    if tag.empty {
        return Ok(id);
    }

    loop {
        let child = match events.next()? {
            Step::Open(tag) => tag,
            Step::Close => return Ok(id),
            Step::Eof => return Err(unexpected_eof(kind.element_name())),
            Step::Other => continue,
        };
        match child_kind(kind, child.namespace(), child.name()?) {
            Some(child_kind) => {
                let child_id = build_item(b, events, &child, child_kind, Some(id))?;
                b.append_child(id, child_id);
            }
            None => events.skip(&child)?,
        }
    }
}

fn build_open_sections(b: &mut TreeBuilder<'_>, events: &mut Events<'_>, tag: &Tag<'_>) -> Result<()> {
    let mut id = String::new();
    for attr in tag.start.attributes() {
        let attr = attr.map_err(HierarchyError::malformed)?;
        if attr.key.into_inner() == b"ID" {
            id = attribute_value(&attr)?;
        }
    }
    b.open_sections(id);
    if tag.empty {
        return Ok(());
    }

    loop {
        let child = match events.next()? {
            Step::Open(tag) => tag,
            Step::Close => return Ok(()),
            Step::Eof => return Err(unexpected_eof("OpenSections")),
            Step::Other => continue,
        };
        let name = child.name()?;
        if classify(child.namespace(), name) == Some(Element::Item(ItemKind::Section)) {
            let section = build_item(b, events, &child, ItemKind::Section, None)?;
            b.push_open_section(section);
        } else {
            log::debug!("skipping <{}> under OpenSections", display_name(child.namespace(), name));
            events.skip(&child)?;
        }
    }
}

fn unexpected_eof(inside: &str) -> HierarchyError {
    HierarchyError::MalformedXml(format!("document ended inside <{}>", inside))
}
