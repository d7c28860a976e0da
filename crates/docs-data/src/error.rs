//! Error types for loading documentation data.
//!
//! Only failures that abort the whole build surface as [`DocsError`]. Per-module
//! problems (a broken `routes.json`, an unparseable error file) are logged and
//! skipped by the individual loaders instead.

use std::path::PathBuf;

/// Result type for documentation data operations.
pub type Result<T> = std::result::Result<T, DocsError>;

/// Errors raised while reading module descriptors and data files.
#[derive(thiserror::Error, Debug)]
pub enum DocsError {
    /// A file could not be read from disk.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file was read but is not valid JSON, or does not fit the expected shape.
    #[error("failed to parse {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A JSON file parsed, but its top-level value is not an object.
    #[error("expected a JSON object in {}", .path.display())]
    NotAnObject { path: PathBuf },

    /// A glob pattern built from a module directory was rejected.
    #[error("invalid glob pattern {pattern}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// The application root's own package descriptor is missing or broken.
    ///
    /// Unlike sub-module descriptors this is fatal: the root package supplies
    /// the name and version every generator stamps on its output.
    #[error("cannot load root package in {}: {reason}", .root.display())]
    RootPackage { root: PathBuf, reason: String },

    /// A route path could not be compiled into a matcher.
    #[error(transparent)]
    Pattern(#[from] crate::pattern::PatternError),
}
