//! Application-wide error types.
//!
//! Library modules use specific error types via `thiserror`
//! ([`SearchError`] for the search engine, [`ConfigError`] for the config
//! file), while the CLI uses `anyhow` for convenient error propagation.
//!
//! # Example
//!
//! ```ignore
//! use metafill::error::{Result, ResultExt};
//!
//! fn write_lyrics(path: &Path, lrc: &str) -> Result<()> {
//!     std::fs::write(path, lrc).with_context(format!("writing {}", path.display()))?;
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

use crate::config::ConfigError;
use crate::search::SearchError;

/// Application-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level application error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Provider search error
    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    /// Tag reading error
    #[error("Tag error for {path}: {message}")]
    Tags { path: PathBuf, message: String },

    /// File not found
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn tags(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Tags {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, SearchError> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Search(e).context(ctx))
    }
}
