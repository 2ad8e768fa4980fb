//! Texture atlas building and sprite image export.
//!
//! A [`TextureAtlas`] collects every sprite frame registered for one apply
//! run, slices multi-frame filmstrips, and packs the whole set onto a single
//! page with the deterministic shelf packer. Packing consumes the atlas and
//! yields a [`PackedAtlas`], which can composite the page into an archive and
//! bind per-sprite frame placements.
//!
//! Frame order is correctness-critical: entries keep their insertion order
//! end-to-end so a filmstrip's left-to-right order becomes the sprite's
//! playback order.

use crate::archive::{Archive, SpriteEntry, SpriteFrame, TexturePage, TexturePageId};
use crate::definitions::SpriteDefinition;
use crate::error::{Error, Result};
use crate::packer::{self, PackedRect};
use camino::Utf8Path;
use image::{imageops, RgbaImage};
use std::collections::HashMap;
use std::io::Cursor;
use tracing::debug;

#[derive(Debug)]
struct AtlasEntry {
    owner: String,
    image: RgbaImage,
}

/// Collects sprite frames prior to packing.
#[derive(Debug, Default)]
pub struct TextureAtlas {
    entries: Vec<AtlasEntry>,
}

impl TextureAtlas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Load a sprite's image and register one atlas entry per frame.
    ///
    /// Multi-frame images must be horizontal filmstrips of exactly
    /// `FrameCount` frames, each `Size[0] x Size[1]` pixels.
    pub fn add(&mut self, def: &SpriteDefinition, image_path: &Utf8Path) -> Result<()> {
        let image = image::open(image_path.as_std_path())?.to_rgba8();

        let expected_width = def.size[0] * def.frame_count;
        let expected_height = def.size[1];
        if image.dimensions() != (expected_width, expected_height) {
            return Err(Error::FilmstripMismatch {
                name: def.name.clone(),
                actual_width: image.width(),
                actual_height: image.height(),
                expected_width,
                expected_height,
            });
        }

        debug!(sprite = %def.name, frames = def.frame_count, "registering atlas entries");
        for frame in 0..def.frame_count {
            let slice =
                imageops::crop_imm(&image, frame * def.size[0], 0, def.size[0], def.size[1])
                    .to_image();
            self.entries.push(AtlasEntry {
                owner: def.name.clone(),
                image: slice,
            });
        }

        Ok(())
    }

    /// Pack all entries. Placement is a pure function of the insertion-ordered
    /// size list, so equal inputs produce equal pages.
    pub fn pack(self) -> Result<PackedAtlas> {
        if self.entries.is_empty() {
            return Err(Error::EmptyAtlas);
        }

        let sizes: Vec<(u32, u32)> = self
            .entries
            .iter()
            .map(|e| e.image.dimensions())
            .collect();
        let (rects, (width, height)) = packer::pack(&sizes);
        debug!(entries = self.entries.len(), width, height, "atlas packed");

        let placed = self
            .entries
            .into_iter()
            .zip(rects)
            .map(|(entry, rect)| PlacedEntry {
                owner: entry.owner,
                image: entry.image,
                rect,
            })
            .collect();

        Ok(PackedAtlas {
            entries: placed,
            width,
            height,
        })
    }
}

#[derive(Debug)]
struct PlacedEntry {
    owner: String,
    image: RgbaImage,
    rect: PackedRect,
}

/// A packed atlas: every entry has its final position on the page.
#[derive(Debug)]
pub struct PackedAtlas {
    entries: Vec<PlacedEntry>,
    width: u32,
    height: u32,
}

impl PackedAtlas {
    pub fn canvas_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Composite the page image and register it as a new texture page.
    pub fn save(&self, archive: &mut Archive) -> Result<TexturePageId> {
        let mut canvas = RgbaImage::new(self.width, self.height);
        for entry in &self.entries {
            imageops::replace(
                &mut canvas,
                &entry.image,
                i64::from(entry.rect.x),
                i64::from(entry.rect.y),
            );
        }

        let page = TexturePage {
            name: format!("gmpatch_page_{}", archive.texture_pages.len()),
            width: self.width,
            height: self.height,
            png: encode_png(&canvas)?,
        };
        Ok(archive.add_texture_page(page))
    }

    /// Placement records for every entry owned by `sprite_name`, in original
    /// insertion order (which is the filmstrip frame order).
    pub fn bind_frames(&self, sprite_name: &str, page: TexturePageId) -> Vec<SpriteFrame> {
        self.entries
            .iter()
            .filter(|e| e.owner == sprite_name)
            .map(|e| SpriteFrame {
                page,
                source: e.rect,
                target_offset: [0, 0],
            })
            .collect()
    }
}

/// Reassemble a sprite's filmstrip from its texture-page placements, for
/// exporting alongside its definition during generation.
pub fn export_sprite_image(archive: &Archive, sprite: &SpriteEntry) -> Result<RgbaImage> {
    let mut strip = RgbaImage::new(sprite.width * sprite.frames.len().max(1) as u32, sprite.height);
    let mut pages: HashMap<usize, RgbaImage> = HashMap::new();

    for (index, frame) in sprite.frames.iter().enumerate() {
        let page = archive.texture_page(frame.page).ok_or_else(|| {
            Error::InvalidDefinition {
                kind: "sprite",
                name: sprite.name.clone(),
                reason: format!("frame {index} references a missing texture page"),
            }
        })?;

        let decoded = match pages.entry(frame.page.0) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                entry.insert(image::load_from_memory(&page.png)?.to_rgba8())
            }
        };

        let slice = imageops::crop_imm(
            decoded,
            frame.source.x,
            frame.source.y,
            frame.source.width,
            frame.source.height,
        )
        .to_image();
        imageops::replace(
            &mut strip,
            &slice,
            i64::from(index as u32 * sprite.width),
            0,
        );
    }

    Ok(strip)
}

/// PNG-encode an RGBA image.
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    image.write_to(&mut Cursor::new(&mut buffer), image::ImageFormat::Png)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::PlaybackType;
    use camino::Utf8PathBuf;
    use image::Rgba;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    fn sample_def(frame_count: u32) -> SpriteDefinition {
        SpriteDefinition {
            name: "spr_test".to_string(),
            image_file: "spr_test.png".to_string(),
            frame_count,
            size: [16, 16],
            margins: [0, 15, 15, 0],
            bounding_box_mode: 0,
            origin: [0, 0],
            playback_speed: 15.0,
            playback_type: PlaybackType::FramesPerSecond,
        }
    }

    /// A 32x16 filmstrip: frame 0 solid red, frame 1 solid blue.
    fn write_filmstrip(dir: &Utf8Path) -> Utf8PathBuf {
        let strip =
            RgbaImage::from_fn(32, 16, |x, _| if x < 16 { RED } else { BLUE });
        let path = dir.join("spr_test.png");
        std::fs::write(path.as_std_path(), encode_png(&strip).unwrap()).unwrap();
        path
    }

    fn temp_dir() -> (tempfile::TempDir, Utf8PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        (dir, path)
    }

    #[test]
    fn two_frame_filmstrip_packs_in_order() {
        let (_guard, dir) = temp_dir();
        let image_path = write_filmstrip(&dir);

        let mut atlas = TextureAtlas::new();
        atlas.add(&sample_def(2), &image_path).unwrap();
        assert_eq!(atlas.len(), 2);

        let packed = atlas.pack().unwrap();
        let mut archive = Archive::default();
        let page = packed.save(&mut archive).unwrap();

        let frames = packed.bind_frames("spr_test", page);
        assert_eq!(frames.len(), 2);
        assert!(!frames[0].source.intersects(&frames[1].source));
        assert_eq!(frames[0].source.width, 16);
        assert_eq!(frames[0].source.height, 16);

        // Frame order must match the filmstrip: first placement red, second blue.
        let page_image = image::load_from_memory(&archive.texture_pages[0].png)
            .unwrap()
            .to_rgba8();
        assert_eq!(
            *page_image.get_pixel(frames[0].source.x, frames[0].source.y),
            RED
        );
        assert_eq!(
            *page_image.get_pixel(frames[1].source.x, frames[1].source.y),
            BLUE
        );
    }

    #[test]
    fn filmstrip_size_mismatch_is_rejected() {
        let (_guard, dir) = temp_dir();
        let image_path = write_filmstrip(&dir);

        // Claims 3 frames, but the image is only 2 frames wide.
        let mut atlas = TextureAtlas::new();
        let err = atlas.add(&sample_def(3), &image_path).unwrap_err();
        assert!(matches!(err, Error::FilmstripMismatch { .. }));
    }

    #[test]
    fn empty_atlas_does_not_pack() {
        assert!(matches!(
            TextureAtlas::new().pack(),
            Err(Error::EmptyAtlas)
        ));
    }

    #[test]
    fn export_reassembles_the_filmstrip() {
        let (_guard, dir) = temp_dir();
        let image_path = write_filmstrip(&dir);

        let mut atlas = TextureAtlas::new();
        let def = sample_def(2);
        atlas.add(&def, &image_path).unwrap();
        let packed = atlas.pack().unwrap();

        let mut archive = Archive::default();
        let page = packed.save(&mut archive).unwrap();
        let sprite = def.to_entry(packed.bind_frames("spr_test", page));

        let exported = export_sprite_image(&archive, &sprite).unwrap();
        assert_eq!(exported.dimensions(), (32, 16));
        assert_eq!(*exported.get_pixel(0, 0), RED);
        assert_eq!(*exported.get_pixel(16, 0), BLUE);
    }
}
