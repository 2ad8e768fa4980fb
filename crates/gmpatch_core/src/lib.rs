//! Patch reconciliation engine for compiled game-data archives.
//!
//! The crate turns the difference between a vanilla and a modded archive into
//! a portable on-disk patch set (unified-diff patches for changed code, JSON
//! definition records and images for new entities), and replays such a patch
//! set onto another copy of the archive, tolerating upstream drift through
//! offset and fuzzy hunk matching.
//!
//! The two halves of the pipeline:
//! - [`generate::generate_patches`] diffs modded against vanilla and stages
//!   results on an [`session::ImportSession`].
//! - [`apply::apply_patches`] replays a scope's on-disk patch set onto a
//!   target archive transactionally.

pub mod apply;
pub mod archive;
pub mod atlas;
pub mod definitions;
pub mod diff;
pub mod error;
pub mod generate;
pub mod import;
pub mod packer;
pub mod patch;
pub mod session;

pub use apply::{apply_patches, ApplyPrompt, ApplyReport, AutoContinue, WarningChoice};
pub use archive::{Archive, ArchiveCodec, JsonCodec};
pub use error::{CollisionKind, Error, Result};
pub use generate::{generate_patches, GenerationReport};
pub use session::{FileKind, ImportSession, ScopeLayout};
