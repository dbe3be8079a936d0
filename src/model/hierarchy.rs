use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{HierarchyError, Result};
use crate::model::collection::{Children, ChildrenIter, ItemList};
use crate::model::item::{
    ItemData, ItemHeader, ItemKey, ItemKind, Node, Notebook, Page, Section, SectionGroup,
};
use crate::ops::item_ops;

/// Handle to an item inside a [`Hierarchy`].
///
/// The generation makes handles to removed items detectable: once a slot is
/// freed and reused, old handles no longer resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId {
    index: u32,
    generation: u32,
}

impl ItemId {
    pub(crate) fn from_parts(index: u32, generation: u32) -> Self {
        ItemId { index, generation }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Sections open in the application but not part of any notebook.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenSections {
    pub id: String,
    pub(crate) sections: ItemList,
}

impl OpenSections {
    pub(crate) fn new(id: String) -> Self {
        OpenSections {
            id,
            sections: ItemList::new(ItemKind::Section),
        }
    }

    pub fn sections(&self) -> &ItemList {
        &self.sections
    }
}

/// Top-level aggregate: the notebooks, then any open sections.
#[derive(Debug, Clone, PartialEq)]
pub struct Root {
    pub(crate) notebooks: ItemList,
    pub(crate) open_sections: Option<OpenSections>,
}

impl Default for Root {
    fn default() -> Self {
        Root {
            notebooks: ItemList::new(ItemKind::Notebook),
            open_sections: None,
        }
    }
}

impl Root {
    pub fn notebooks(&self) -> &ItemList {
        &self.notebooks
    }

    pub fn open_sections(&self) -> Option<&OpenSections> {
        self.open_sections.as_ref()
    }

    /// Every notebook in order, followed by every open section.
    pub fn items(&self) -> ChildrenIter<'_> {
        let open: &[ItemId] = match &self.open_sections {
            Some(open) => open.sections.as_slice(),
            None => &[],
        };
        Children::from_slices(self.notebooks.as_slice(), open).iter()
    }
}

/// Arena owning every item of one hierarchy snapshot, plus its [`Root`].
///
/// Child links are owned lists of handles; parent links and the
/// notebook-to-root link are plain back-references.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hierarchy {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: Root,
}

impl Hierarchy {
    pub fn new() -> Self {
        Hierarchy::default()
    }

    pub fn root(&self) -> &Root {
        &self.root
    }

    /// Number of live items, attached or not.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.node(id).is_some()
    }

    pub fn node(&self, id: ItemId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub(crate) fn node_mut(&mut self, id: ItemId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn get(&self, id: ItemId) -> Option<ItemRef<'_>> {
        self.node(id).map(|node| ItemRef {
            hierarchy: self,
            handle: id,
            node,
        })
    }

    /// Like [`Hierarchy::get`], but a dead handle is an `InvalidArgument`.
    pub fn item(&self, id: ItemId) -> Result<ItemRef<'_>> {
        self.get(id).ok_or_else(|| HierarchyError::dead_handle("item"))
    }

    // -----------------------------------------------------------------------
    // Allocation
    // -----------------------------------------------------------------------

    pub(crate) fn alloc(&mut self, node: Node) -> ItemId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            ItemId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            ItemId {
                index,
                generation: 0,
            }
        }
    }

    /// Free one slot, leaving its children untouched.
    pub(crate) fn free_node(&mut self, id: ItemId) -> Option<Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        Some(node)
    }

    /// Free `id` and everything below it.
    pub(crate) fn free_subtree(&mut self, id: ItemId) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(mut node) = self.free_node(current) {
                stack.extend(node.data.take_children());
            }
        }
    }

    // -----------------------------------------------------------------------
    // Root wiring
    // -----------------------------------------------------------------------

    pub(crate) fn push_notebook(&mut self, id: ItemId) {
        if let Some(Node {
            data: ItemData::Notebook(nb),
            ..
        }) = self.node_mut(id)
        {
            nb.in_root = true;
            self.root.notebooks.push(id);
        }
    }

    pub(crate) fn set_open_sections(&mut self, id: String) {
        self.root.open_sections = Some(OpenSections::new(id));
    }

    pub(crate) fn push_open_section(&mut self, id: ItemId) {
        if let Some(open) = self.root.open_sections.as_mut() {
            open.sections.push(id);
        }
    }

    // -----------------------------------------------------------------------
    // Local mutations
    // -----------------------------------------------------------------------

    /// Append a parsed but unattached item to `parent`'s collections, or to
    /// the root notebook list when `parent` is `None`.
    pub fn attach(&mut self, parent: Option<ItemId>, child: ItemId) -> Result<()> {
        let node = self
            .node(child)
            .ok_or_else(|| HierarchyError::dead_handle("child"))?;
        let kind = node.kind();
        if self.is_attached(child) {
            return Err(HierarchyError::InvalidArgument(format!(
                "{kind} {} is already attached",
                node.header.id
            )));
        }
        if node.parent.is_some() && node.parent != parent {
            return Err(HierarchyError::InvalidArgument(format!(
                "{kind} {} was parsed for a different parent",
                node.header.id
            )));
        }

        match parent {
            None if kind == ItemKind::Notebook => {
                self.push_notebook(child);
                Ok(())
            }
            None => Err(HierarchyError::InvalidItemKind {
                expected: "notebook",
                found: kind,
            }),
            Some(parent) => {
                let parent_node = self
                    .node_mut(parent)
                    .ok_or_else(|| HierarchyError::dead_handle("parent"))?;
                if !parent_node.data.push_child(child, kind) {
                    return Err(HierarchyError::InvalidItemKind {
                        expected: "a child kind this parent can hold",
                        found: kind,
                    });
                }
                if let Some(node) = self.node_mut(child) {
                    node.parent = Some(parent);
                }
                Ok(())
            }
        }
    }

    /// Remove an item from whichever collection holds it and free its subtree.
    /// Its handle, and the handles of everything below it, stop resolving.
    pub fn remove(&mut self, id: ItemId) -> Result<()> {
        if !self.contains(id) {
            return Err(HierarchyError::dead_handle("item"));
        }
        self.detach(id);
        self.free_subtree(id);
        Ok(())
    }

    /// Overwrite an item's name. Notebooks keep their folder name and change
    /// their display name instead.
    pub fn rename(&mut self, id: ItemId, name: &str) -> Result<()> {
        let kind = self.item(id)?.kind();
        if !item_ops::is_valid_name(kind, name) {
            return Err(HierarchyError::InvalidArgument(format!(
                "invalid {kind} name: {name:?}"
            )));
        }
        let node = self
            .node_mut(id)
            .ok_or_else(|| HierarchyError::dead_handle("item"))?;
        match &mut node.data {
            ItemData::Notebook(nb) => nb.display_name = name.to_string(),
            _ => node.header.name = name.to_string(),
        }
        Ok(())
    }

    fn is_attached(&self, id: ItemId) -> bool {
        let Some(node) = self.node(id) else {
            return false;
        };
        match node.parent {
            Some(parent) => self
                .node(parent)
                .is_some_and(|p| p.data.children().contains(id)),
            None => match &node.data {
                ItemData::Notebook(nb) => nb.in_root,
                ItemData::Section(_) => self
                    .root
                    .open_sections
                    .as_ref()
                    .is_some_and(|open| open.sections.contains(id)),
                _ => false,
            },
        }
    }

    /// Take an item out of its owning collection without freeing it.
    pub(crate) fn detach(&mut self, id: ItemId) {
        let Some(node) = self.node(id) else {
            return;
        };
        let kind = node.kind();
        match node.parent {
            Some(parent) => {
                if let Some(p) = self.node_mut(parent) {
                    p.data.remove_child(id, kind);
                }
            }
            None => {
                self.root.notebooks.remove(id, kind);
                if let Some(open) = self.root.open_sections.as_mut() {
                    open.sections.remove(id, kind);
                }
            }
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
            if let ItemData::Notebook(nb) = &mut node.data {
                nb.in_root = false;
            }
        }
    }

    /// Point `id` at a new parent, moving it between collections so that
    /// membership and parent links stay consistent.
    pub(crate) fn relink(&mut self, id: ItemId, parent: ItemId) -> Result<()> {
        let kind = self.item(id)?.kind();
        let parent_kind = self.item(parent)?.kind();
        if !parent_kind.accepts(kind) {
            return Err(HierarchyError::InvalidItemKind {
                expected: match kind {
                    ItemKind::Page => "section",
                    _ => "notebook or section group",
                },
                found: parent_kind,
            });
        }
        self.detach(id);
        self.attach(Some(parent), id)
    }

    /// Move the parsed contents of the detached item `source` into `target`.
    ///
    /// Scalars are overwritten, except the identity. With `with_children`
    /// the owned collections take the source's order and membership: an
    /// incoming child whose [`ItemKey`] matches an existing child is merged
    /// into it recursively, so the existing handle survives; unmatched old
    /// children are freed. Without `with_children` the target keeps its
    /// children and the source's are freed. `source` is consumed either way.
    pub(crate) fn merge_into(
        &mut self,
        target: ItemId,
        source: ItemId,
        with_children: bool,
    ) -> Result<()> {
        let target_kind = self.item(target)?.kind();
        let source_kind = self.item(source)?.kind();
        if target_kind != source_kind {
            return Err(HierarchyError::InvalidItemKind {
                expected: target_kind.name(),
                found: source_kind,
            });
        }

        let Some(mut fresh) = self.free_node(source) else {
            return Err(HierarchyError::dead_handle("source"));
        };
        let Some(existing) = self.node_mut(target) else {
            return Err(HierarchyError::dead_handle("target"));
        };

        existing.header.name = std::mem::take(&mut fresh.header.name);
        existing.header.is_unread = fresh.header.is_unread;
        existing.header.last_modified = fresh.header.last_modified;

        let in_root = matches!(&existing.data, ItemData::Notebook(nb) if nb.in_root);
        std::mem::swap(&mut existing.data, &mut fresh.data);
        if let ItemData::Notebook(nb) = &mut existing.data {
            nb.in_root = in_root;
        }

        // `fresh.data` now holds the old payload.
        let incoming = existing.data.take_children();
        let previous = fresh.data.take_children();

        if !with_children {
            for child in incoming {
                self.free_subtree(child);
            }
            self.adopt_children(target, previous);
            return Ok(());
        }

        let mut by_key: HashMap<ItemKey, ItemId> = HashMap::with_capacity(previous.len());
        let mut stale = Vec::new();
        for child in previous {
            let Some(key) = self.node(child).map(Node::key) else {
                continue;
            };
            match by_key.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(child);
                }
                Entry::Occupied(_) => stale.push(child),
            }
        }

        let mut merged = Vec::with_capacity(incoming.len());
        for child in incoming {
            let Some(key) = self.node(child).map(Node::key) else {
                continue;
            };
            match by_key.remove(&key) {
                Some(old) => {
                    self.merge_into(old, child, true)?;
                    merged.push(old);
                }
                None => merged.push(child),
            }
        }
        stale.extend(by_key.into_values());

        self.adopt_children(target, merged);
        for child in stale {
            self.free_subtree(child);
        }
        Ok(())
    }

    /// Link `children` under `parent` in order, without kind checks.
    fn adopt_children(&mut self, parent: ItemId, children: Vec<ItemId>) {
        for child in children {
            let Some(node) = self.node_mut(child) else {
                continue;
            };
            node.parent = Some(parent);
            let kind = node.kind();
            if let Some(owner) = self.node_mut(parent) {
                owner.data.push_child(child, kind);
            }
        }
    }
}

/// Borrowed view of one live item.
///
/// Equality is identity equality: same kind and same store id, regardless
/// of which hierarchy or handle the views come from.
#[derive(Clone, Copy)]
pub struct ItemRef<'h> {
    hierarchy: &'h Hierarchy,
    handle: ItemId,
    node: &'h Node,
}

impl<'h> ItemRef<'h> {
    pub fn handle(&self) -> ItemId {
        self.handle
    }

    pub fn hierarchy(&self) -> &'h Hierarchy {
        self.hierarchy
    }

    pub fn kind(&self) -> ItemKind {
        self.node.kind()
    }

    pub fn header(&self) -> &'h ItemHeader {
        &self.node.header
    }

    pub fn id(&self) -> &'h str {
        &self.node.header.id
    }

    pub fn name(&self) -> &'h str {
        &self.node.header.name
    }

    pub fn is_unread(&self) -> bool {
        self.node.header.is_unread
    }

    pub fn last_modified(&self) -> DateTime<Utc> {
        self.node.header.last_modified
    }

    pub fn data(&self) -> &'h ItemData {
        &self.node.data
    }

    pub fn parent(&self) -> Option<ItemRef<'h>> {
        self.node.parent.and_then(|p| self.hierarchy.get(p))
    }

    pub fn children(&self) -> Children<'h> {
        self.node.data.children()
    }

    pub fn key(&self) -> ItemKey {
        self.node.key()
    }

    pub fn as_notebook(&self) -> Option<&'h Notebook> {
        match &self.node.data {
            ItemData::Notebook(nb) => Some(nb),
            _ => None,
        }
    }

    pub fn as_section_group(&self) -> Option<&'h SectionGroup> {
        match &self.node.data {
            ItemData::SectionGroup(sg) => Some(sg),
            _ => None,
        }
    }

    pub fn as_section(&self) -> Option<&'h Section> {
        match &self.node.data {
            ItemData::Section(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_page(&self) -> Option<&'h Page> {
        match &self.node.data {
            ItemData::Page(p) => Some(p),
            _ => None,
        }
    }
}

impl PartialEq for ItemRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.kind() == other.kind() && self.id() == other.id()
    }
}

impl Eq for ItemRef<'_> {}

impl fmt::Debug for ItemRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemRef")
            .field("kind", &self.kind())
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}
