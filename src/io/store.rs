use crate::error::Result;
use crate::model::HierarchyScope;

/// The external system of record, seen only through XML snapshots.
pub trait HierarchyStore {
    /// Snapshot of the hierarchy below `scope_id` (the whole store when
    /// `None`), down to `depth`.
    fn fetch_subtree(&self, scope_id: Option<&str>, depth: HierarchyScope) -> Result<String>;

    /// Store id of the immediate parent of `id`.
    fn fetch_parent_id(&self, id: &str) -> Result<String>;
}

/// Produces store handles for a [`StoreSession`](crate::io::session::StoreSession).
pub trait StoreConnector {
    type Store: HierarchyStore;

    fn connect(&self) -> Result<Self::Store>;
}
