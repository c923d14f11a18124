//! Error handling and result types for BPlusTree operations.
//!
//! Ordinary misuse of the index (inserting a pair twice, deleting a pair that is
//! not there) is not an error at all: those calls are silent no-ops. The types in
//! this module cover construction-time precondition failures and the reports
//! produced by the invariant checker.

use thiserror::Error;

/// Error type for B+ tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BPlusTreeError {
    /// The requested branching factor cannot produce a well-formed tree.
    #[error("Invalid degree: degree {degree} is below the minimum of {min}")]
    InvalidDegree { degree: usize, min: usize },
    /// Internal data structure integrity violation.
    #[error("Data integrity error: {0}")]
    DataIntegrityError(String),
    /// Arena bookkeeping disagrees with the tree structure.
    #[error("Arena error: {0}")]
    ArenaError(String),
    /// Tree corruption detected.
    #[error("Corrupted tree: {0}")]
    CorruptedTree(String),
}

impl BPlusTreeError {
    /// Create an InvalidDegree error with context
    pub fn invalid_degree(degree: usize, min: usize) -> Self {
        Self::InvalidDegree { degree, min }
    }

    /// Create a DataIntegrityError with context
    pub fn data_integrity(context: &str, details: &str) -> Self {
        Self::DataIntegrityError(format!("{}: {}", context, details))
    }

    /// Create an ArenaError with context
    pub fn arena_error(operation: &str, details: &str) -> Self {
        Self::ArenaError(format!("{} failed: {}", operation, details))
    }

    /// Create a CorruptedTree error with context
    pub fn corrupted_tree(component: &str, details: &str) -> Self {
        Self::CorruptedTree(format!("{} corruption: {}", component, details))
    }

    /// Check if this error is a degree error
    pub fn is_degree_error(&self) -> bool {
        matches!(self, Self::InvalidDegree { .. })
    }

    /// Check if this error was produced by the invariant checker
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::CorruptedTree(_) | Self::DataIntegrityError(_) | Self::ArenaError(_)
        )
    }
}

/// Public result type for tree operations that may fail
pub type BTreeResult<T> = Result<T, BPlusTreeError>;

/// Result type for tree construction
pub type InitResult<T> = Result<T, BPlusTreeError>;

/// Error raised while reading a playback script.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// A command verb was not followed by its key and pointer.
    #[error("line {line}: missing {token} in `{text}`")]
    MissingToken {
        line: usize,
        token: &'static str,
        text: String,
    },
    /// The key token could not be parsed into the tree's key type.
    #[error("line {line}: invalid key `{token}` in `{text}`")]
    InvalidKey {
        line: usize,
        token: String,
        text: String,
    },
    /// The pointer token could not be parsed into the tree's pointer type.
    #[error("line {line}: invalid pointer `{token}` in `{text}`")]
    InvalidPointer {
        line: usize,
        token: String,
        text: String,
    },
    /// A command carried more tokens than `<verb> <key> <pointer>`.
    #[error("line {line}: unexpected trailing input in `{text}`")]
    TrailingInput { line: usize, text: String },
    /// The script could not be read.
    #[error("cannot read script: {0}")]
    Io(#[from] std::io::Error),
}

impl PlaybackError {
    /// The 1-based line number of the offending line, when known.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::MissingToken { line, .. }
            | Self::InvalidKey { line, .. }
            | Self::InvalidPointer { line, .. }
            | Self::TrailingInput { line, .. } => Some(*line),
            Self::Io(_) => None,
        }
    }

    /// The text of the offending line, when known.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::MissingToken { text, .. }
            | Self::InvalidKey { text, .. }
            | Self::InvalidPointer { text, .. }
            | Self::TrailingInput { text, .. } => Some(text),
            Self::Io(_) => None,
        }
    }
}
