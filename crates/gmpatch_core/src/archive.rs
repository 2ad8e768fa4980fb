//! In-memory archive model and the codec seam.
//!
//! The proprietary container format and the bytecode decompiler/compiler are
//! external collaborators. This module owns everything the pipeline needs from
//! them: an in-memory [`Archive`] graph of named entities, a line view of each
//! code entry's decompiled source, and the [`ArchiveCodec`] trait where a real
//! container codec plugs in. The bundled [`JsonCodec`] round-trips the model
//! through serde and stands in for the proprietary reader/writer.

use crate::error::{Error, Result};
use crate::packer::PackedRect;
use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// One compiled code entry, carried in decompiled source form.
///
/// Entries with a `parent` are the duplicate/alias children of another entry
/// and are never diffed or patched directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub source: String,
}

impl CodeEntry {
    /// Whether this is a top-level entry (not an alias child).
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// A script alias mapping a named script to its underlying code entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub name: String,
    pub code_entry: String,
}

/// How a sprite's playback speed value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlaybackType {
    FramesPerSecond,
    FramesPerGameFrame,
}

/// Placement of one sprite frame on a texture page.
///
/// `source` is the packed sub-rectangle on the page; `target_offset` is where
/// the frame's pixels land relative to the sprite's own origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteFrame {
    pub page: TexturePageId,
    pub source: PackedRect,
    pub target_offset: [i32; 2],
}

/// A sprite entity. `frames` is empty until atlas packing assigns placements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteEntry {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Left, right, bottom, top.
    pub margins: [i32; 4],
    pub bbox_mode: u32,
    pub origin: [i32; 2],
    pub playback_speed: f32,
    pub playback_type: PlaybackType,
    #[serde(default)]
    pub frames: Vec<SpriteFrame>,
}

/// A game object entity. The event table is opaque and passed through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    pub collision_shape: String,
    pub events: serde_json::Value,
}

/// Handle to a texture page registered in an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TexturePageId(pub usize);

/// A composited page image holding multiple sprites' pixel data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TexturePage {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// PNG-encoded page image.
    pub png: Vec<u8>,
}

/// The in-memory archive graph, exclusively owned by the current run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Archive {
    pub display_name: String,
    pub code: Vec<CodeEntry>,
    pub scripts: Vec<ScriptEntry>,
    pub sprites: Vec<SpriteEntry>,
    pub objects: Vec<ObjectEntry>,
    pub texture_pages: Vec<TexturePage>,
}

impl Archive {
    pub fn code_by_name(&self, name: &str) -> Option<&CodeEntry> {
        self.code.iter().find(|c| c.name == name)
    }

    pub fn code_by_name_mut(&mut self, name: &str) -> Option<&mut CodeEntry> {
        self.code.iter_mut().find(|c| c.name == name)
    }

    pub fn script_by_name(&self, name: &str) -> Option<&ScriptEntry> {
        self.scripts.iter().find(|s| s.name == name)
    }

    pub fn sprite_by_name(&self, name: &str) -> Option<&SpriteEntry> {
        self.sprites.iter().find(|s| s.name == name)
    }

    pub fn object_by_name(&self, name: &str) -> Option<&ObjectEntry> {
        self.objects.iter().find(|o| o.name == name)
    }

    /// Top-level code entries, skipping alias/duplicate children.
    pub fn root_code(&self) -> impl Iterator<Item = &CodeEntry> {
        self.code.iter().filter(|c| c.is_root())
    }

    /// The line view of a code entry's decompiled source, as consumed by the
    /// differ. Both `\n` and `\r\n` sources split to the same lines.
    pub fn code_lines(&self, name: &str) -> Option<Vec<String>> {
        self.code_by_name(name).map(|c| split_lines(&c.source))
    }

    /// Register a new texture page and return its handle.
    pub fn add_texture_page(&mut self, page: TexturePage) -> TexturePageId {
        self.texture_pages.push(page);
        TexturePageId(self.texture_pages.len() - 1)
    }

    pub fn texture_page(&self, id: TexturePageId) -> Option<&TexturePage> {
        self.texture_pages.get(id.0)
    }
}

/// Split decompiled source into lines, tolerating `\r\n` endings.
pub fn split_lines(source: &str) -> Vec<String> {
    source
        .split('\n')
        .map(|line| line.trim_end_matches('\r').to_string())
        .collect()
}

/// Reader/writer seam for the on-disk container format.
pub trait ArchiveCodec {
    fn load(&self, path: &Utf8Path) -> Result<Archive>;
    fn save(&self, archive: &Archive, path: &Utf8Path) -> Result<()>;
}

/// Serde-based codec that stores the archive model as pretty-printed JSON.
///
/// Stands in where the proprietary container codec plugs in; the rest of the
/// pipeline only sees [`Archive`] values and does not care which codec
/// produced them.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ArchiveCodec for JsonCodec {
    fn load(&self, path: &Utf8Path) -> Result<Archive> {
        if !path.as_std_path().exists() {
            return Err(Error::ArchiveNotFound(path.to_owned()));
        }

        let contents = std::fs::read(path.as_std_path())?;
        let archive = serde_json::from_slice(&contents)?;
        Ok(archive)
    }

    fn save(&self, archive: &Archive, path: &Utf8Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent.as_std_path())?;
        }

        let contents = serde_json::to_vec_pretty(archive)?;
        std::fs::write(path.as_std_path(), contents)?;
        Ok(())
    }
}
