/// Error types for Tab Shelf
use thiserror::Error;

/// Failure raised by an external collaborator (store, tab surface, badge)
/// or by configuration/import parsing.
#[derive(Error, Debug)]
pub enum ShelfError {
    /// The persisted store rejected a read or write
    #[error("Storage error: {0}")]
    Store(String),

    /// The browser tab surface failed to query, open or close tabs
    #[error("Tab control error: {0}")]
    Tabs(String),

    #[error("Badge error: {0}")]
    Badge(String),

    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ShelfError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    pub fn tabs(message: impl Into<String>) -> Self {
        Self::Tabs(message.into())
    }

    pub fn badge(message: impl Into<String>) -> Self {
        Self::Badge(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Reasons an import payload is rejected. Import is all-or-nothing, so any
/// of these leaves the existing shelf untouched.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("file is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("file has no groups array")]
    MissingGroups,

    #[error("group '{0}' contains a tab without a URL")]
    EmptyUrl(String),

    #[error("domain '{0}' appears in more than one group")]
    DuplicateDomain(String),
}

pub type Result<T> = std::result::Result<T, ShelfError>;
