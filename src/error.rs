use thiserror::Error;

/// Main error type for the hierarchy service
#[derive(Error, Debug)]
pub enum HierarchyError {
    /// The graph store answered with a failure status or could not be reached
    #[error("Graph store error: {0}")]
    Store(String),

    /// HTTP transport errors from the store client
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed result documents
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenient Result type using HierarchyError
pub type Result<T> = std::result::Result<T, HierarchyError>;
