pub mod config_io;
pub mod session;
pub mod snapshot_store;
pub mod store;

pub use session::{HandleMode, StoreSession};
pub use snapshot_store::SnapshotStore;
pub use store::{HierarchyStore, StoreConnector};
