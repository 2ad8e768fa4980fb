//! Error types for the patch pipeline.
//!
//! All fallible functions in this crate return [`Result<T>`], which uses [`Error`]
//! as the error type. External error types (`std::io::Error`, `serde_json::Error`,
//! image errors) are automatically converted via `From` impls.

use camino::Utf8PathBuf;
use std::fmt;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Why a queued code replacement could not be accepted.
///
/// Carried by [`Error::Collision`] so callers can react to the specific
/// collision instead of matching on error message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    /// The entry names an object event, but no matching game object exists
    /// to attach it to. Resolving this requires manual intervention.
    UnattachedEvent,
    /// The same code entry was queued for replacement twice in one batch.
    DuplicateReplace,
}

impl fmt::Display for CollisionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionKind::UnattachedEvent => f.write_str("unattached object event"),
            CollisionKind::DuplicateReplace => f.write_str("duplicate replacement"),
        }
    }
}

/// Errors that can occur while generating or applying patches.
#[derive(Error, Debug)]
pub enum Error {
    /// Filesystem I/O failed (reading definitions, flushing the queue, etc.).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse or serialize JSON (definition records, archive model).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Decoding or encoding an image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// An archive file was required but does not exist on disk.
    #[error("archive file not found: {0}")]
    ArchiveNotFound(Utf8PathBuf),

    /// A patch file could not be parsed.
    #[error("malformed patch: {0}")]
    MalformedPatch(String),

    /// A code replacement was rejected by the import group.
    #[error("code import collision ({kind}) for entry '{entry}'")]
    Collision { kind: CollisionKind, entry: String },

    /// A definition record is unusable (bad field values, dangling references).
    #[error("invalid {kind} definition '{name}': {reason}")]
    InvalidDefinition {
        kind: &'static str,
        name: String,
        reason: String,
    },

    /// A sprite definition references an image file that is not on disk.
    #[error("sprite '{name}' references missing image file: {path}")]
    MissingSpriteImage { name: String, path: Utf8PathBuf },

    /// A filmstrip image does not match `FrameCount x Size`.
    #[error(
        "sprite '{name}': image is {actual_width}x{actual_height}, \
         expected {expected_width}x{expected_height}"
    )]
    FilmstripMismatch {
        name: String,
        actual_width: u32,
        actual_height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    /// `TextureAtlas::pack` was called with no registered entries.
    #[error("texture atlas has no entries to pack")]
    EmptyAtlas,
}

impl Error {
    /// Shorthand for [`Error::Collision`].
    pub fn collision(kind: CollisionKind, entry: impl Into<String>) -> Self {
        Error::Collision {
            kind,
            entry: entry.into(),
        }
    }
}
