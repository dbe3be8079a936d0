use roxmltree::{Document, Node as XmlNode};

use crate::error::{HierarchyError, Result};
use crate::model::{Hierarchy, ItemId, ItemKind, Node};
use crate::parse::builder::{self, TreeBuilder};
use crate::parse::{
    attributes, check_prolog, check_root_element, child_kind, classify, display_name,
    top_item_kind, Element, HierarchyParser,
};

/// Parses by loading the whole document into a tree first (roxmltree).
#[derive(Debug, Clone, Copy, Default)]
pub struct DomParser;

impl HierarchyParser for DomParser {
    fn parse_root(&self, xml: &str) -> Result<Hierarchy> {
        let doc = load(xml)?;
        let top = doc.root_element();
        check_root_element(top.tag_name().namespace(), top.tag_name().name())?;

        builder::build_root(|b| {
            for child in top.children().filter(|n| n.is_element()) {
                let (namespace, name) = (child.tag_name().namespace(), child.tag_name().name());
                match classify(namespace, name) {
                    Some(Element::Item(ItemKind::Notebook)) => {
                        let id = build_item(b, child, ItemKind::Notebook, None)?;
                        b.push_notebook(id);
                    }
                    Some(Element::OpenSections) => build_open_sections(b, child)?,
                    _ => log::debug!("skipping <{}> under Notebooks", display_name(namespace, name)),
                }
            }
            Ok(())
        })
    }

    fn parse(&self, hierarchy: &mut Hierarchy, xml: &str, parent: Option<ItemId>) -> Result<ItemId> {
        let doc = load(xml)?;
        let top = doc.root_element();
        let kind = top_item_kind(top.tag_name().namespace(), top.tag_name().name())?;
        builder::build_detached(hierarchy, parent, |b, parent| build_item(b, top, kind, parent))
    }

    fn parse_existing(&self, hierarchy: &mut Hierarchy, xml: &str, item: ItemId) -> Result<()> {
        let doc = load(xml)?;
        let top = doc.root_element();
        let kind = top_item_kind(top.tag_name().namespace(), top.tag_name().name())?;
        builder::build_existing(hierarchy, item, |b, parent| build_item(b, top, kind, parent))
    }
}

fn load(xml: &str) -> Result<Document<'_>> {
    check_prolog(xml)?;
    Document::parse(xml).map_err(HierarchyError::malformed)
}

fn build_item(
    b: &mut TreeBuilder<'_>,
    element: XmlNode<'_, '_>,
    kind: ItemKind,
    parent: Option<ItemId>,
) -> Result<ItemId> {
    let mut node = Node::blank(kind);
    for attr in element.attributes() {
        attributes::apply(&mut node, attr.name(), attr.value())?;
    }
    let id = b.add(node, parent)?;

    for child in element.children().filter(|n| n.is_element()) {
        let tag = child.tag_name();
        if let Some(child_kind) = child_kind(kind, tag.namespace(), tag.name()) {
            let child_id = build_item(b, child, child_kind, Some(id))?;
            b.append_child(id, child_id);
        }
    }
    Ok(id)
}

fn build_open_sections(b: &mut TreeBuilder<'_>, element: XmlNode<'_, '_>) -> Result<()> {
    b.open_sections(element.attribute("ID").unwrap_or_default().to_string());
    for child in element.children().filter(|n| n.is_element()) {
        let (namespace, name) = (child.tag_name().namespace(), child.tag_name().name());
        if classify(namespace, name) == Some(Element::Item(ItemKind::Section)) {
            let id = build_item(b, child, ItemKind::Section, None)?;
            b.push_open_section(id);
        } else {
            log::debug!("skipping <{}> under OpenSections", display_name(namespace, name));
        }
    }
    Ok(())
}
