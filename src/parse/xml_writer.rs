use std::fmt::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;

use crate::error::Result;
use crate::model::{Hierarchy, HierarchyScope, ItemData, ItemId, ItemKind, ItemRef};
use crate::parse::ONENOTE_NAMESPACE;

const DECLARATION: &str = "<?xml version=\"1.0\"?>\n";

/// Render a whole hierarchy back to store XML.
pub fn write_hierarchy(hierarchy: &Hierarchy) -> String {
    write_root(hierarchy, HierarchyScope::Pages)
}

/// Render one item and everything below it.
pub fn write_item(hierarchy: &Hierarchy, id: ItemId) -> Result<String> {
    write_scoped(hierarchy, Some(id), HierarchyScope::Pages)
}

/// Render the part of `hierarchy` a store query for `scope` at `depth`
/// would return. `None` is the whole store.
pub fn write_scoped(
    hierarchy: &Hierarchy,
    scope: Option<ItemId>,
    depth: HierarchyScope,
) -> Result<String> {
    match scope {
        None => Ok(write_root(hierarchy, depth)),
        Some(id) => {
            let item = hierarchy.item(id)?;
            let mut out = String::from(DECLARATION);
            write_element(&mut out, item, depth, 0, true);
            Ok(out)
        }
    }
}

fn write_root(hierarchy: &Hierarchy, depth: HierarchyScope) -> String {
    let mut out = String::from(DECLARATION);
    let root = hierarchy.root();
    let open = root
        .open_sections()
        .filter(|_| matches!(depth, HierarchyScope::Sections | HierarchyScope::Pages));

    if root.notebooks().is_empty() && open.is_none() {
        let _ = writeln!(out, "<one:Notebooks xmlns:one=\"{}\"/>", ONENOTE_NAMESPACE);
        return out;
    }

    let _ = writeln!(out, "<one:Notebooks xmlns:one=\"{}\">", ONENOTE_NAMESPACE);
    for item in root.notebooks().iter().filter_map(|id| hierarchy.get(id)) {
        write_element(&mut out, item, depth, 1, false);
    }
    if let Some(open) = open {
        let sections: Vec<_> = open.sections().iter().filter_map(|id| hierarchy.get(id)).collect();
        if sections.is_empty() {
            let _ = writeln!(out, "  <one:OpenSections ID=\"{}\"/>", escape(open.id.as_str()));
        } else {
            let _ = writeln!(out, "  <one:OpenSections ID=\"{}\">", escape(open.id.as_str()));
            for section in sections {
                write_element(&mut out, section, depth, 2, false);
            }
            out.push_str("  </one:OpenSections>\n");
        }
    }
    out.push_str("</one:Notebooks>\n");
    out
}

/// Whether a query at `depth` reaches children of kind `child` below an
/// element written at `level` (0 is the scope item, 1 a top-level notebook).
fn includes(depth: HierarchyScope, level: usize, child: ItemKind) -> bool {
    match depth {
        HierarchyScope::Itself | HierarchyScope::Notebooks => false,
        HierarchyScope::Children => level == 0,
        HierarchyScope::Sections => child != ItemKind::Page,
        HierarchyScope::Pages => true,
    }
}

fn write_element(out: &mut String, item: ItemRef<'_>, depth: HierarchyScope, level: usize, top: bool) {
    let hierarchy = item.hierarchy();
    let indent = "  ".repeat(level);
    let tag = item.kind().element_name();

    let _ = write!(out, "{}<one:{}", indent, tag);
    if top {
        let _ = write!(out, " xmlns:one=\"{}\"", ONENOTE_NAMESPACE);
    }
    for (name, value) in attributes(item) {
        let _ = write!(out, " {}=\"{}\"", name, escape(value.as_str()));
    }

    let children: Vec<_> = item
        .children()
        .iter()
        .filter_map(|id| hierarchy.get(id))
        .filter(|child| includes(depth, level, child.kind()))
        .collect();
    if children.is_empty() {
        out.push_str("/>\n");
        return;
    }
    out.push_str(">\n");
    for child in children {
        write_element(out, child, depth, level + 1, false);
    }
    let _ = writeln!(out, "{}</one:{}>", indent, tag);
}

fn attributes(item: ItemRef<'_>) -> Vec<(&'static str, String)> {
    let header = item.header();
    let mut attrs = vec![("ID", header.id.clone()), ("name", header.name.clone())];
    match item.data() {
        ItemData::Notebook(nb) => {
            if !nb.display_name.is_empty() {
                attrs.push(("nickname", nb.display_name.clone()));
            }
            if !nb.path.is_empty() {
                attrs.push(("path", nb.path.clone()));
            }
            if let Some(color) = nb.color {
                attrs.push(("color", color.to_string()));
            }
        }
        ItemData::SectionGroup(sg) => {
            if !sg.path.is_empty() {
                attrs.push(("path", sg.path.clone()));
            }
            flag(&mut attrs, "isRecycleBin", sg.is_recycle_bin);
        }
        ItemData::Section(s) => {
            if !s.path.is_empty() {
                attrs.push(("path", s.path.clone()));
            }
            if let Some(color) = s.color {
                attrs.push(("color", color.to_string()));
            }
            flag(&mut attrs, "encrypted", s.is_encrypted);
            flag(&mut attrs, "locked", s.is_locked);
            flag(&mut attrs, "isInRecycleBin", s.is_in_recycle_bin);
            flag(&mut attrs, "isDeletedPages", s.is_deleted_pages);
        }
        ItemData::Page(p) => {
            attrs.push(("dateTime", timestamp(p.created)));
            if p.level != 0 {
                attrs.push(("pageLevel", p.level.to_string()));
            }
            flag(&mut attrs, "isInRecycleBin", p.is_in_recycle_bin);
        }
    }

    attrs.push(("lastModifiedTime", timestamp(header.last_modified)));
    flag(&mut attrs, "isUnread", header.is_unread);
    attrs
}

fn flag(attrs: &mut Vec<(&'static str, String)>, name: &'static str, set: bool) {
    if set {
        attrs.push((name, "true".to_string()));
    }
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}
