//! Fetching parts of the hierarchy from the store and merging them into a
//! cached tree.

use crate::error::Result;
use crate::io::session::{HandleMode, StoreSession};
use crate::io::store::{HierarchyStore, StoreConnector};
use crate::model::{Hierarchy, HierarchyScope, ItemId, ItemKind, OnetreeConfig};
use crate::parse::{HierarchyParser, ParserEngine};

/// Store session plus the parser its snapshots are read with.
pub struct HierarchyClient<C: StoreConnector> {
    session: StoreSession<C>,
    engine: ParserEngine,
}

impl<C: StoreConnector> HierarchyClient<C> {
    pub fn new(connector: C, mode: HandleMode, engine: ParserEngine) -> Self {
        HierarchyClient {
            session: StoreSession::new(connector, mode),
            engine,
        }
    }

    pub fn from_config(connector: C, config: &OnetreeConfig) -> Self {
        Self::new(connector, config.store.mode, config.parser.engine)
    }

    pub fn session(&self) -> &StoreSession<C> {
        &self.session
    }

    pub fn engine(&self) -> ParserEngine {
        self.engine
    }

    /// The whole store down to `depth`.
    pub fn get_hierarchy(&self, depth: HierarchyScope) -> Result<Hierarchy> {
        let xml = self.session.run(|store| store.fetch_subtree(None, depth))?;
        self.engine.parse_root(&xml)
    }

    pub fn get_full_hierarchy(&self) -> Result<Hierarchy> {
        self.get_hierarchy(HierarchyScope::Pages)
    }

    /// Load `item`'s subtree down to `depth`.
    ///
    /// Unless `force` is set, an item that already has children is left as
    /// is. Depths that cannot add children (`Itself`, `Notebooks`) and pages
    /// are no-ops. A failed fetch or parse leaves the item untouched.
    pub fn update_descendants(
        &self,
        hierarchy: &mut Hierarchy,
        item: ItemId,
        depth: HierarchyScope,
        force: bool,
    ) -> Result<()> {
        let current = hierarchy.item(item)?;
        if matches!(depth, HierarchyScope::Itself | HierarchyScope::Notebooks)
            || current.kind() == ItemKind::Page
        {
            return Ok(());
        }
        if !force && !current.children().is_empty() {
            return Ok(());
        }

        let id = current.id().to_string();
        log::debug!("refreshing {} {:?} at {:?}", current.kind(), id, depth);
        let xml = self.session.run(|store| store.fetch_subtree(Some(&id), depth))?;
        self.engine.parse_existing(hierarchy, &xml, item)
    }

    /// `item`'s direct children as the store has them now, without touching
    /// the cached item.
    ///
    /// The children belong to a detached copy of `item` parsed into
    /// `hierarchy`; the caller owns that copy and frees it with
    /// [`Hierarchy::remove`] on the copy's handle (the children's parent).
    /// A page has no children and is not fetched.
    pub fn get_children(&self, hierarchy: &mut Hierarchy, item: ItemId) -> Result<Vec<ItemId>> {
        let current = hierarchy.item(item)?;
        if current.kind() == ItemKind::Page {
            return Ok(Vec::new());
        }

        let id = current.id().to_string();
        let xml = self
            .session
            .run(|store| store.fetch_subtree(Some(&id), HierarchyScope::Children))?;
        let copy = self.engine.parse(hierarchy, &xml, None)?;
        Ok(hierarchy.item(copy)?.children().iter().collect())
    }

    /// `item`'s parent as the store has it now, parsed as a new detached
    /// item. The cached item and its parent link are left alone. A notebook
    /// has no parent and is not fetched.
    pub fn get_parent(&self, hierarchy: &mut Hierarchy, item: ItemId) -> Result<Option<ItemId>> {
        let current = hierarchy.item(item)?;
        if current.kind() == ItemKind::Notebook {
            return Ok(None);
        }

        let id = current.id().to_string();
        let xml = self.session.run(|store| {
            let parent_id = store.fetch_parent_id(&id)?;
            store.fetch_subtree(Some(&parent_id), HierarchyScope::Itself)
        })?;
        self.engine.parse(hierarchy, &xml, None).map(Some)
    }

    /// `item`'s direct children, fetched first if it has none or `force` is set.
    pub fn get_and_update_children(
        &self,
        hierarchy: &mut Hierarchy,
        item: ItemId,
        force: bool,
    ) -> Result<Vec<ItemId>> {
        self.update_descendants(hierarchy, item, HierarchyScope::Children, force)?;
        Ok(hierarchy.item(item)?.children().iter().collect())
    }

    /// `item`'s parent, fetched if it has none or `force` is set.
    ///
    /// A fetched parent that is the item's current parent only has its own
    /// fields refreshed. Any other parent is parsed as a new detached item
    /// and the item is moved under it. Notebooks have no parent.
    pub fn get_and_update_parent(
        &self,
        hierarchy: &mut Hierarchy,
        item: ItemId,
        force: bool,
    ) -> Result<Option<ItemId>> {
        let current = hierarchy.item(item)?;
        if current.kind() == ItemKind::Notebook {
            return Ok(None);
        }
        let known_parent = current.parent();
        if let (false, Some(parent)) = (force, known_parent) {
            return Ok(Some(parent.handle()));
        }

        let id = current.id().to_string();
        let known_parent = known_parent.map(|p| (p.handle(), p.key()));
        log::debug!("refreshing parent of {} {:?}", current.kind(), id);
        let xml = self.session.run(|store| {
            let parent_id = store.fetch_parent_id(&id)?;
            store.fetch_subtree(Some(&parent_id), HierarchyScope::Itself)
        })?;
        let fresh = self.engine.parse(hierarchy, &xml, None)?;
        let fresh_key = hierarchy.item(fresh)?.key();

        let linked = match known_parent {
            Some((handle, key)) if key == fresh_key => {
                hierarchy.merge_into(handle, fresh, false).map(|()| handle)
            }
            _ => hierarchy.relink(item, fresh).map(|()| fresh),
        };
        if linked.is_err() {
            hierarchy.free_subtree(fresh);
        }
        linked.map(Some)
    }
}
