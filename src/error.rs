use crate::model::ItemKind;

/// Errors raised by parsing, traversal, refresh and store access.
#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    /// A dead or foreign item handle, or an unusable value, was passed to an entry point.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// An element that is not a hierarchy kind appeared where one was expected.
    #[error("unsupported element <{0}>")]
    UnsupportedElement(String),
    /// The document does not start with an element.
    #[error("unsupported top-level content: {0}")]
    UnsupportedNodeType(String),
    #[error("invalid item kind: expected {expected}, found {found}")]
    InvalidItemKind {
        expected: &'static str,
        found: ItemKind,
    },
    #[error("store handle is not acquired (manual mode requires init)")]
    StoreUnavailable,
    #[error("invalid value {value:?} for attribute {name}")]
    InvalidAttribute { name: String, value: String },
    #[error("malformed XML: {0}")]
    MalformedXml(String),
    #[error("store error: {0}")]
    Store(String),
}

pub type Result<T> = std::result::Result<T, HierarchyError>;

impl HierarchyError {
    pub(crate) fn dead_handle(what: &str) -> Self {
        HierarchyError::InvalidArgument(format!("{what} does not refer to a live item"))
    }

    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        HierarchyError::MalformedXml(err.to_string())
    }
}
