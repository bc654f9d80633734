//! Error types for the Notegrove core library.

use thiserror::Error;

/// All errors that can occur within the Notegrove core library.
#[derive(Debug, Error)]
pub enum NotegroveError {
    /// A SQLite operation failed.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A required field was missing or violated a length/format bound.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A category name collides case-insensitively for the same owner.
    #[error("Duplicate category name: {0}")]
    DuplicateName(String),

    /// A referenced note, category, or parent does not exist for this owner.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A category parent assignment would make the category its own ancestor.
    #[error("Invalid parent: {0}")]
    InvalidParent(String),

    /// A category delete was blocked because notes still reference it.
    #[error("Category still has notes: {0}")]
    HasNotes(String),

    /// A category delete was blocked because subcategories still reference it.
    #[error("Category still has subcategories: {0}")]
    HasSubcategories(String),

    /// An import merge was requested without a duplicate-resolution strategy.
    #[error("Import merge requires a duplicate strategy")]
    MissingStrategy,

    /// An import source could not be parsed as the expected format.
    #[error("Parse error: {0}")]
    Parse(String),

    /// An import source file could not be read.
    #[error("Read error: {0}")]
    Read(String),

    /// The opened file is not a valid Notegrove database.
    #[error("Invalid database: {0}")]
    InvalidDatabase(String),

    /// An I/O operation on the filesystem failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored note data could not be deserialized from JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias that pins the error type to [`NotegroveError`].
pub type Result<T> = std::result::Result<T, NotegroveError>;

impl NotegroveError {
    /// Returns a short, human-readable message suitable for display to the end user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Database(e) => format!("Failed to save: {e}"),
            Self::Validation(msg) => msg.clone(),
            Self::DuplicateName(name) => {
                format!("A category named \"{name}\" already exists")
            }
            Self::NotFound(_) => "The item no longer exists".to_string(),
            Self::InvalidParent(msg) => msg.clone(),
            Self::HasNotes(name) => format!(
                "\"{name}\" still contains notes — move or delete them first"
            ),
            Self::HasSubcategories(name) => format!(
                "\"{name}\" still has subcategories — move or delete them first"
            ),
            Self::MissingStrategy => {
                "Choose how duplicate notes should be handled before importing".to_string()
            }
            Self::Parse(msg) => format!("Could not read import data: {msg}"),
            Self::Read(msg) => format!("Could not read file: {msg}"),
            Self::InvalidDatabase(_) => "Could not open notes database".to_string(),
            Self::Io(e) => format!("File error: {e}"),
            Self::Json(e) => format!("Data format error: {e}"),
        }
    }
}
