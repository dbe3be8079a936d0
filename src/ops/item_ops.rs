use crate::error::{HierarchyError, Result};
use crate::model::{Hierarchy, ItemData, ItemId, ItemKind, ItemRef};
use crate::ops::traverse;

const NOTEBOOK_INVALID_CHARS: &[char] = &['\\', '/', '*', '?', '"', '|', '<', '>', ':', '%', '#', '.'];
const SECTION_INVALID_CHARS: &[char] = &['\\', '/', '*', '?', '"', '|', '<', '>', ':', '%', '#', '&'];

/// Characters the store refuses in names of `kind`.
pub fn invalid_characters(kind: ItemKind) -> &'static [char] {
    match kind {
        ItemKind::Notebook => NOTEBOOK_INVALID_CHARS,
        ItemKind::SectionGroup | ItemKind::Section => SECTION_INVALID_CHARS,
        ItemKind::Page => &[],
    }
}

/// Whether the store would accept `name` for an item of `kind`.
pub fn is_valid_name(kind: ItemKind, name: &str) -> bool {
    if name.trim().is_empty() {
        return false;
    }
    !name.contains(invalid_characters(kind))
}

/// Whether the item is, or sits in, a recycle bin.
pub fn is_in_recycle_bin(item: ItemRef<'_>) -> bool {
    match item.data() {
        ItemData::Notebook(_) => false,
        ItemData::SectionGroup(sg) => sg.is_recycle_bin,
        ItemData::Section(s) => s.is_in_recycle_bin || s.is_deleted_pages,
        ItemData::Page(p) => p.is_in_recycle_bin,
    }
}

/// The notebook's recycle bin section group, if the snapshot includes it.
pub fn recycle_bin(hierarchy: &Hierarchy, notebook: ItemId) -> Result<Option<ItemRef<'_>>> {
    let item = hierarchy.item(notebook)?;
    let nb = item.as_notebook().ok_or(HierarchyError::InvalidItemKind {
        expected: "notebook",
        found: item.kind(),
    })?;
    Ok(nb
        .section_groups()
        .iter()
        .filter_map(|id| hierarchy.get(id))
        .find(|sg| sg.as_section_group().is_some_and(|sg| sg.is_recycle_bin)))
}

/// The notebook at the top of `item`'s parent chain; a notebook is its own.
/// `None` for open sections and for partial trees parsed without one.
pub fn try_get_notebook(item: ItemRef<'_>) -> Option<ItemRef<'_>> {
    let mut top = item;
    while let Some(parent) = top.parent() {
        top = parent;
    }
    (top.kind() == ItemKind::Notebook).then_some(top)
}

/// Path of `item` from its notebook, e.g. `Work\Projects\Plan`.
///
/// The notebook contributes its display name when `use_display_name` is set
/// and one exists. Items with no notebook above them get a leading separator.
pub fn relative_path(item: ItemRef<'_>, use_display_name: bool, separator: &str) -> String {
    let mut parts = Vec::new();
    let mut current = Some(item);
    let mut rooted = false;
    while let Some(node) = current {
        if let Some(nb) = node.as_notebook() {
            let name = if use_display_name && !nb.display_name.is_empty() {
                nb.display_name.as_str()
            } else {
                node.name()
            };
            parts.push(name);
            rooted = true;
            break;
        }
        parts.push(node.name());
        current = node.parent();
    }
    parts.reverse();

    let joined = parts.join(separator);
    if rooted {
        joined
    } else {
        format!("{separator}{joined}")
    }
}

/// Identity comparison: same kind and same store id.
pub fn item_equals(a: ItemRef<'_>, b: ItemRef<'_>) -> bool {
    a == b
}

/// First item reachable from the root whose store id is `id`.
pub fn find_by_id<'h>(hierarchy: &'h Hierarchy, id: &str) -> Option<ItemRef<'h>> {
    traverse::root_descendants_where(hierarchy, |item| item.id() == id).next()
}
