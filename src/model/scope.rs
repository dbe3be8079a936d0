use serde::{Deserialize, Serialize};

/// How deep a store query reaches below its scope item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyScope {
    /// The scope item alone.
    Itself,
    /// The scope item and its direct children.
    Children,
    /// Notebooks only.
    Notebooks,
    /// Everything down to sections, without pages.
    Sections,
    /// Everything, pages included.
    Pages,
}
