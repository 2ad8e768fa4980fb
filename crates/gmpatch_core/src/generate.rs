//! Patch generation: diff a modded archive against vanilla.
//!
//! Walks every top-level entity in the modded archive and stages the portable
//! form of whatever differs from vanilla: unified-diff patches for changed
//! code, verbatim source for new code, and JSON definition records (plus
//! exported images) for new scripts, sprites, and game objects. Everything is
//! staged on the [`ImportSession`]; nothing reaches disk until the caller
//! flushes, which is what makes regeneration idempotent.

use crate::archive::{split_lines, Archive};
use crate::atlas::{encode_png, export_sprite_image};
use crate::definitions::{GameObjectDefinition, ScriptDefinition, SpriteDefinition};
use crate::diff::make_patches;
use crate::error::Result;
use crate::patch::PatchFile;
use crate::session::{FileKind, ImportSession};
use tracing::{debug, info};

/// Per-kind counts of what one generation pass staged.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub patched: usize,
    pub new_code: usize,
    pub scripts: usize,
    pub sprites: usize,
    pub objects: usize,
    pub warnings: Vec<String>,
}

/// Diff `modded` against `vanilla` and stage the results on `session`.
///
/// Malformed modded entries are skipped with a recorded warning rather than
/// failing the whole pass.
pub fn generate_patches(
    vanilla: &Archive,
    modded: &Archive,
    session: &mut ImportSession,
) -> Result<GenerationReport> {
    let mut report = GenerationReport::default();

    for mod_code in modded.root_code() {
        if mod_code.name.is_empty() {
            session.warn("skipping code entry with empty name");
            continue;
        }

        match vanilla.code_by_name(&mod_code.name) {
            Some(vanilla_code) if vanilla_code.is_root() => {
                let old = split_lines(&vanilla_code.source);
                let new = split_lines(&mod_code.source);
                let hunks = make_patches(&old, &new);
                if hunks.is_empty() {
                    debug!(name = %mod_code.name, "unchanged, skipping");
                    continue;
                }

                let patch = PatchFile::for_code_entry(&mod_code.name, hunks);
                if session.queue_file(&mod_code.name, patch.to_string(), FileKind::Patch) {
                    info!(name = %mod_code.name, "generated patch");
                    report.patched += 1;
                }
            }
            Some(_) => {
                // The vanilla entry is an alias child; nothing to diff against.
                debug!(name = %mod_code.name, "vanilla counterpart is an alias, skipping");
            }
            None => {
                if session.queue_file(&mod_code.name, mod_code.source.clone(), FileKind::Code) {
                    info!(name = %mod_code.name, "staged new source file");
                    report.new_code += 1;
                }
            }
        }
    }

    for script in &modded.scripts {
        if vanilla.script_by_name(&script.name).is_some() {
            continue;
        }
        if script.code_entry.is_empty() {
            session.warn(format!(
                "skipping script '{}' with empty code reference",
                script.name
            ));
            continue;
        }

        let def = ScriptDefinition::from_entry(script);
        let text = serde_json::to_string_pretty(&def)?;
        if session.queue_file(&script.name, text, FileKind::Script) {
            report.scripts += 1;
        }
    }

    for sprite in &modded.sprites {
        if vanilla.sprite_by_name(&sprite.name).is_some() {
            continue;
        }
        if sprite.frames.is_empty() {
            session.warn(format!("skipping sprite '{}' with no frames", sprite.name));
            continue;
        }

        let png = match export_sprite_image(modded, sprite).and_then(|image| encode_png(&image)) {
            Ok(png) => png,
            Err(err) => {
                session.warn(format!("skipping sprite '{}': {err}", sprite.name));
                continue;
            }
        };

        let def = SpriteDefinition::from_entry(sprite, format!("{}.png", sprite.name));
        let text = serde_json::to_string_pretty(&def)?;
        if session.queue_file(&sprite.name, text, FileKind::Sprite) {
            session.queue_image(&sprite.name, png);
            report.sprites += 1;
        }
    }

    for object in &modded.objects {
        if vanilla.object_by_name(&object.name).is_some() {
            continue;
        }

        let def = GameObjectDefinition::from_entry(object);
        let text = serde_json::to_string_pretty(&def)?;
        if session.queue_file(&object.name, text, FileKind::GameObject) {
            report.objects += 1;
        }
    }

    report.warnings = session.warnings().to_vec();
    info!(
        patched = report.patched,
        new_code = report.new_code,
        scripts = report.scripts,
        sprites = report.sprites,
        objects = report.objects,
        "generation pass complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{
        CodeEntry, ObjectEntry, PlaybackType, ScriptEntry, SpriteEntry, SpriteFrame, TexturePage,
        TexturePageId,
    };
    use crate::packer::PackedRect;

    fn code(name: &str, source: &str) -> CodeEntry {
        CodeEntry {
            name: name.to_string(),
            parent: None,
            source: source.to_string(),
        }
    }

    #[test]
    fn unchanged_code_stages_nothing() {
        let vanilla = Archive {
            code: vec![code("scr_test", "a = 1")],
            ..Archive::default()
        };
        let modded = vanilla.clone();

        let mut session = ImportSession::new();
        let report = generate_patches(&vanilla, &modded, &mut session).unwrap();

        assert_eq!(report.patched, 0);
        assert_eq!(report.new_code, 0);
        assert!(session.staged().is_empty());
    }

    #[test]
    fn modified_code_stages_one_patch() {
        let vanilla = Archive {
            code: vec![code("scr_test", "a = 1")],
            ..Archive::default()
        };
        let modded = Archive {
            code: vec![code("scr_test", "a = 2")],
            ..Archive::default()
        };

        let mut session = ImportSession::new();
        let report = generate_patches(&vanilla, &modded, &mut session).unwrap();

        assert_eq!(report.patched, 1);
        let staged = &session.staged()[0];
        assert_eq!(staged.kind, FileKind::Patch);
        assert!(staged.text.starts_with("--- a/Code/scr_test.gml\n"));
        assert!(staged.text.contains("-a = 1\n+a = 2\n"));
    }

    #[test]
    fn new_code_is_staged_verbatim() {
        let vanilla = Archive::default();
        let modded = Archive {
            code: vec![code("scr_new", "fresh = true")],
            ..Archive::default()
        };

        let mut session = ImportSession::new();
        let report = generate_patches(&vanilla, &modded, &mut session).unwrap();

        assert_eq!(report.new_code, 1);
        assert_eq!(session.staged()[0].kind, FileKind::Code);
        assert_eq!(session.staged()[0].text, "fresh = true");
    }

    #[test]
    fn alias_children_are_not_diffed() {
        let vanilla = Archive::default();
        let modded = Archive {
            code: vec![CodeEntry {
                name: "scr_dup".to_string(),
                parent: Some("scr_root".to_string()),
                source: "whatever".to_string(),
            }],
            ..Archive::default()
        };

        let mut session = ImportSession::new();
        let report = generate_patches(&vanilla, &modded, &mut session).unwrap();
        assert_eq!(report.new_code, 0);
        assert!(session.staged().is_empty());
    }

    #[test]
    fn modded_only_entities_become_definitions() {
        let vanilla = Archive::default();
        let mut modded = Archive::default();
        modded.scripts.push(ScriptEntry {
            name: "scr_alias".to_string(),
            code_entry: "gml_GlobalScript_scr_alias".to_string(),
        });
        modded.objects.push(ObjectEntry {
            name: "obj_new".to_string(),
            collision_shape: "rectangle".to_string(),
            events: serde_json::json!({"Create": []}),
        });

        let mut session = ImportSession::new();
        let report = generate_patches(&vanilla, &modded, &mut session).unwrap();

        assert_eq!(report.scripts, 1);
        assert_eq!(report.objects, 1);
        assert_eq!(session.count_of(FileKind::Script), 1);
        assert_eq!(session.count_of(FileKind::GameObject), 1);
    }

    #[test]
    fn vanilla_entities_are_not_reemitted() {
        let mut vanilla = Archive::default();
        vanilla.scripts.push(ScriptEntry {
            name: "scr_shared".to_string(),
            code_entry: "gml_GlobalScript_scr_shared".to_string(),
        });
        let modded = vanilla.clone();

        let mut session = ImportSession::new();
        let report = generate_patches(&vanilla, &modded, &mut session).unwrap();
        assert_eq!(report.scripts, 0);
        assert!(session.staged().is_empty());
    }

    #[test]
    fn sprite_with_frames_exports_definition_and_image() {
        let vanilla = Archive::default();
        let mut modded = Archive::default();

        let pixel = image::RgbaImage::from_pixel(16, 16, image::Rgba([255, 0, 0, 255]));
        modded.texture_pages.push(TexturePage {
            name: "page_0".to_string(),
            width: 16,
            height: 16,
            png: encode_png(&pixel).unwrap(),
        });
        modded.sprites.push(SpriteEntry {
            name: "spr_new".to_string(),
            width: 16,
            height: 16,
            margins: [0, 15, 15, 0],
            bbox_mode: 0,
            origin: [0, 0],
            playback_speed: 15.0,
            playback_type: PlaybackType::FramesPerSecond,
            frames: vec![SpriteFrame {
                page: TexturePageId(0),
                source: PackedRect {
                    x: 0,
                    y: 0,
                    width: 16,
                    height: 16,
                },
                target_offset: [0, 0],
            }],
        });

        let mut session = ImportSession::new();
        let report = generate_patches(&vanilla, &modded, &mut session).unwrap();

        assert_eq!(report.sprites, 1);
        assert_eq!(session.count_of(FileKind::Sprite), 1);
        let def: SpriteDefinition =
            serde_json::from_str(&session.staged()[0].text).unwrap();
        assert_eq!(def.image_file, "spr_new.png");
        assert_eq!(def.frame_count, 1);
    }

    #[test]
    fn malformed_entries_warn_instead_of_failing() {
        let vanilla = Archive::default();
        let mut modded = Archive::default();
        modded.scripts.push(ScriptEntry {
            name: "scr_broken".to_string(),
            code_entry: String::new(),
        });

        let mut session = ImportSession::new();
        let report = generate_patches(&vanilla, &modded, &mut session).unwrap();

        assert_eq!(report.scripts, 0);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("scr_broken"));
    }
}
