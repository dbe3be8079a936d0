use crate::error::{HierarchyError, Result};
use crate::model::{Hierarchy, ItemId, Node};

/// Writes parsed items into a hierarchy and undoes them unless committed.
///
/// Every engine goes through this, so a failed parse never leaves part of
/// a subtree behind in the arena.
pub(crate) struct TreeBuilder<'h> {
    hierarchy: &'h mut Hierarchy,
    created: Vec<ItemId>,
    committed: bool,
}

impl<'h> TreeBuilder<'h> {
    pub(crate) fn new(hierarchy: &'h mut Hierarchy) -> Self {
        TreeBuilder {
            hierarchy,
            created: Vec::new(),
            committed: false,
        }
    }

    /// Allocate `node` under `parent`. The parent must be alive and able to
    /// hold the node's kind. The node is not appended to the parent's
    /// collections; see [`TreeBuilder::append_child`].
    pub(crate) fn add(&mut self, mut node: Node, parent: Option<ItemId>) -> Result<ItemId> {
        if let Some(parent) = parent {
            let parent_kind = self
                .hierarchy
                .node(parent)
                .ok_or_else(|| HierarchyError::dead_handle("parent"))?
                .kind();
            if !parent_kind.accepts(node.kind()) {
                return Err(HierarchyError::InvalidItemKind {
                    expected: "an item this parent can hold",
                    found: node.kind(),
                });
            }
        }
        node.parent = parent;
        let id = self.hierarchy.alloc(node);
        self.created.push(id);
        Ok(id)
    }

    /// Append a child parsed in this session to its parent's collection.
    pub(crate) fn append_child(&mut self, parent: ItemId, child: ItemId) {
        let Some(kind) = self.hierarchy.node(child).map(Node::kind) else {
            return;
        };
        if let Some(node) = self.hierarchy.node_mut(parent) {
            node.data.push_child(child, kind);
        }
    }

    pub(crate) fn push_notebook(&mut self, id: ItemId) {
        self.hierarchy.push_notebook(id);
    }

    pub(crate) fn open_sections(&mut self, id: String) {
        self.hierarchy.set_open_sections(id);
    }

    pub(crate) fn push_open_section(&mut self, id: ItemId) {
        self.hierarchy.push_open_section(id);
    }

    pub(crate) fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for TreeBuilder<'_> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        log::debug!("parse failed, discarding {} item(s)", self.created.len());
        for &id in self.created.iter().rev() {
            self.hierarchy.free_node(id);
        }
    }
}

/// Run an engine that builds one detached item under `parent`.
pub(crate) fn build_detached<F>(
    hierarchy: &mut Hierarchy,
    parent: Option<ItemId>,
    engine: F,
) -> Result<ItemId>
where
    F: FnOnce(&mut TreeBuilder<'_>, Option<ItemId>) -> Result<ItemId>,
{
    if let Some(parent) = parent {
        if !hierarchy.contains(parent) {
            return Err(HierarchyError::dead_handle("parent"));
        }
    }
    let mut builder = TreeBuilder::new(hierarchy);
    let id = engine(&mut builder, parent)?;
    builder.commit();
    Ok(id)
}

/// Run an engine that re-parses `item` in place.
///
/// The subtree is first built as a detached copy under the item's own
/// parent; only once that succeeds is it merged into the item.
pub(crate) fn build_existing<F>(hierarchy: &mut Hierarchy, item: ItemId, engine: F) -> Result<()>
where
    F: FnOnce(&mut TreeBuilder<'_>, Option<ItemId>) -> Result<ItemId>,
{
    let (kind, parent) = {
        let node = hierarchy
            .node(item)
            .ok_or_else(|| HierarchyError::dead_handle("item"))?;
        (node.kind(), node.parent())
    };

    let fresh = {
        let mut builder = TreeBuilder::new(hierarchy);
        let fresh = engine(&mut builder, parent)?;
        let fresh_kind = builder.hierarchy.node(fresh).map(Node::kind);
        if fresh_kind != Some(kind) {
            return Err(HierarchyError::InvalidItemKind {
                expected: kind.name(),
                found: fresh_kind.unwrap_or(kind),
            });
        }
        builder.commit();
        fresh
    };

    // A freshly parsed copy is detached and carries a parent link only
    // for kind validation; clear it before merging.
    if let Some(node) = hierarchy.node_mut(fresh) {
        node.parent = None;
    }
    hierarchy.merge_into(item, fresh, true)
}

/// Run an engine that fills a brand new hierarchy.
pub(crate) fn build_root<F>(engine: F) -> Result<Hierarchy>
where
    F: FnOnce(&mut TreeBuilder<'_>) -> Result<()>,
{
    let mut hierarchy = Hierarchy::new();
    let mut builder = TreeBuilder::new(&mut hierarchy);
    engine(&mut builder)?;
    builder.commit();
    Ok(hierarchy)
}
