use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::error::{HierarchyError, Result};
use crate::io::store::{HierarchyStore, StoreConnector};
use crate::model::{Hierarchy, HierarchyScope, ItemRef};
use crate::ops::item_ops;
use crate::parse::{HierarchyParser, ParserEngine, write_scoped};

struct Inner {
    hierarchy: Hierarchy,
    fetches: AtomicUsize,
    connects: AtomicUsize,
    available: AtomicBool,
}

/// A hierarchy store backed by one full snapshot held in memory.
///
/// Scoped queries are answered by cutting the snapshot down to the requested
/// depth and writing it back out as XML. Clones share the snapshot and the
/// counters, so the store doubles as its own connector.
#[derive(Clone)]
pub struct SnapshotStore {
    inner: Arc<Inner>,
}

impl SnapshotStore {
    pub fn from_xml(xml: &str, engine: ParserEngine) -> Result<Self> {
        let hierarchy = engine.parse_root(xml)?;
        log::debug!("snapshot store loaded {} item(s)", hierarchy.len());
        Ok(SnapshotStore {
            inner: Arc::new(Inner {
                hierarchy,
                fetches: AtomicUsize::new(0),
                connects: AtomicUsize::new(0),
                available: AtomicBool::new(true),
            }),
        })
    }

    pub fn open(path: &Path, engine: ParserEngine) -> Result<Self> {
        let xml = fs::read_to_string(path)
            .map_err(|e| HierarchyError::Store(format!("could not read {}: {}", path.display(), e)))?;
        Self::from_xml(&xml, engine)
    }

    /// The snapshot every query is served from.
    pub fn snapshot(&self) -> &Hierarchy {
        &self.inner.hierarchy
    }

    /// Number of store calls (`fetch_subtree` and `fetch_parent_id`) served.
    pub fn fetch_count(&self) -> usize {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    pub fn connect_count(&self) -> usize {
        self.inner.connects.load(Ordering::SeqCst)
    }

    /// While unavailable, connecting and fetching fail with a store error.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.inner.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(HierarchyError::Store("store is not available".to_string()))
        }
    }

    fn lookup(&self, id: &str) -> Result<ItemRef<'_>> {
        item_ops::find_by_id(&self.inner.hierarchy, id)
            .ok_or_else(|| HierarchyError::Store(format!("no item with id {id:?}")))
    }
}

impl HierarchyStore for SnapshotStore {
    fn fetch_subtree(&self, scope_id: Option<&str>, depth: HierarchyScope) -> Result<String> {
        self.check_available()?;
        self.inner.fetches.fetch_add(1, Ordering::SeqCst);
        log::trace!("fetch_subtree({:?}, {:?})", scope_id, depth);
        let scope = scope_id.map(|id| self.lookup(id)).transpose()?;
        write_scoped(&self.inner.hierarchy, scope.map(|item| item.handle()), depth)
    }

    fn fetch_parent_id(&self, id: &str) -> Result<String> {
        self.check_available()?;
        self.inner.fetches.fetch_add(1, Ordering::SeqCst);
        let item = self.lookup(id)?;
        item.parent()
            .map(|parent| parent.id().to_string())
            .ok_or_else(|| HierarchyError::Store(format!("{} {id:?} has no parent", item.kind())))
    }
}

impl StoreConnector for SnapshotStore {
    type Store = SnapshotStore;

    fn connect(&self) -> Result<SnapshotStore> {
        self.check_available()?;
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::StreamingParser;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    const SNAPSHOT: &str = r#"<one:Notebooks xmlns:one="http://schemas.microsoft.com/office/onenote/2013/onenote">
  <one:Notebook ID="n1" name="nb">
    <one:Section ID="s1" name="s">
      <one:Page ID="p1" name="p"/>
    </one:Section>
  </one:Notebook>
</one:Notebooks>"#;

    #[test]
    fn test_scoped_fetch_parses_back() {
        let store = SnapshotStore::from_xml(SNAPSHOT, ParserEngine::Streaming).unwrap();
        let xml = store.fetch_subtree(Some("s1"), HierarchyScope::Children).unwrap();
        let mut h = Hierarchy::new();
        let id = StreamingParser.parse(&mut h, &xml, None).unwrap();
        let section = h.get(id).unwrap();
        assert_eq!(section.id(), "s1");
        assert_eq!(section.children().len(), 1);
        assert_eq!(store.fetch_count(), 1);
    }

    #[test]
    fn test_parent_ids() {
        let store = SnapshotStore::from_xml(SNAPSHOT, ParserEngine::Dom).unwrap();
        assert_eq!(store.fetch_parent_id("p1").unwrap(), "s1");
        assert_eq!(store.fetch_parent_id("s1").unwrap(), "n1");
        assert!(matches!(store.fetch_parent_id("n1"), Err(HierarchyError::Store(_))));
        assert!(matches!(store.fetch_parent_id("nope"), Err(HierarchyError::Store(_))));
    }

    #[test]
    fn test_unavailable() {
        let store = SnapshotStore::from_xml(SNAPSHOT, ParserEngine::Streaming).unwrap();
        store.set_available(false);
        assert!(store.connect().is_err());
        assert!(store.fetch_subtree(None, HierarchyScope::Pages).is_err());
        assert_eq!(store.fetch_count(), 0);
        store.set_available(true);
        let handle = store.connect().unwrap();
        handle.fetch_subtree(None, HierarchyScope::Notebooks).unwrap();
        assert_eq!(store.connect_count(), 1);
        assert_eq!(store.fetch_count(), 1);
    }

    #[test]
    fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();
        let store = SnapshotStore::open(file.path(), ParserEngine::Streaming).unwrap();
        assert_eq!(store.snapshot().len(), 3);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            SnapshotStore::open(&missing, ParserEngine::Streaming),
            Err(HierarchyError::Store(_))
        ));
    }
}
