pub mod item_ops;
pub mod navigate;
pub mod pool;
pub mod refresh;
pub mod traverse;

pub use navigate::{after_self, after_self_where, ancestors, ancestors_where, before_self, before_self_where};
pub use refresh::HierarchyClient;
pub use traverse::{
    all_pages, all_pages_where, descendants, descendants_where, root_all_pages, root_all_pages_where,
    root_descendants, root_descendants_where, traverse, traverse_where,
};
