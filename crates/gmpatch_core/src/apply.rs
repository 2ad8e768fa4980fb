//! Patch application: replay a scope's on-disk patch set onto an archive.
//!
//! One apply run walks the staged pipeline
//! `Objects -> Code -> Scripts -> Patches -> Sprites -> {Commit | Abort}`.
//! All mutations happen on a private clone of the target archive; the clone
//! replaces the target only when the run commits, so an abort at any stage
//! leaves the caller's archive byte-identical to where it started.
//!
//! Fatal errors (missing images, collisions, malformed definitions) unwind as
//! `Err`. Recoverable trouble (a patch that will not apply even fuzzily) goes
//! through the injectable [`ApplyPrompt`], letting the operator abort or
//! continue with an accumulated warning that gates the final commit.

use crate::archive::Archive;
use crate::atlas::TextureAtlas;
use crate::definitions::{GameObjectDefinition, ScriptDefinition, SpriteDefinition};
use crate::diff::{ApplyMode, Patcher};
use crate::error::{Error, Result};
use crate::import::CodeImportGroup;
use crate::patch::PatchFile;
use crate::session::{FileKind, ScopeLayout};
use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

/// Operator decision for a patch that parsed or applied badly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningChoice {
    Continue,
    Abort,
}

/// Decision points an apply run can raise mid-flight.
///
/// The console binding lives outside the core; tests and non-interactive
/// runs plug in [`AutoContinue`].
pub trait ApplyPrompt {
    /// A patch file is unparsable or some hunks failed even fuzzily.
    fn patch_trouble(&mut self, file_name: &str, detail: &str) -> WarningChoice;

    /// Last call before commit when warnings were accumulated. Returning
    /// `false` discards all staged changes.
    fn confirm_commit(&mut self, warnings: &[String]) -> bool;
}

/// Non-interactive prompt: always continue, always commit.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoContinue;

impl ApplyPrompt for AutoContinue {
    fn patch_trouble(&mut self, _file_name: &str, _detail: &str) -> WarningChoice {
        WarningChoice::Continue
    }

    fn confirm_commit(&mut self, _warnings: &[String]) -> bool {
        true
    }
}

/// What one apply run did, and whether it committed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub committed: bool,
    /// Why the run stopped short of commit, when the operator chose to.
    pub aborted: Option<String>,
    pub objects_added: usize,
    pub new_code: usize,
    pub scripts_added: usize,
    pub patched: usize,
    /// Patches whose target entry does not exist here (version mismatch).
    pub skipped_patches: usize,
    pub sprites_added: usize,
    pub warnings: Vec<String>,
}

/// Apply one scope's patch set to `target`.
///
/// `target` is only modified when the run commits; the report says whether it
/// did. Fatal problems return `Err` and leave `target` untouched.
pub fn apply_patches(
    target: &mut Archive,
    layout: &ScopeLayout,
    prompt: &mut dyn ApplyPrompt,
) -> Result<ApplyReport> {
    let mut staged = target.clone();
    let mut report = ApplyReport::default();
    let mut import_group = CodeImportGroup::new();

    // Objects first: later code files may attach events to them.
    for path in files_with_extension(&layout.dir(FileKind::GameObject), ".json")? {
        let def: GameObjectDefinition = parse_definition(&path, "game object")?;
        if staged.object_by_name(&def.name).is_some() {
            debug!(name = %def.name, "object already present, skipping");
            continue;
        }
        staged.objects.push(def.to_entry());
        report.objects_added += 1;
    }

    // Brand-new code files.
    for path in files_with_extension(&layout.dir(FileKind::Code), ".gml")? {
        let name = file_stem(&path, ".gml");
        let text = std::fs::read_to_string(path.as_std_path())?;
        import_group.queue_replace(&staged, &name, text)?;
        report.new_code += 1;
    }

    // Script aliases. References may resolve against code queued just above.
    for path in files_with_extension(&layout.dir(FileKind::Script), ".json")? {
        let def: ScriptDefinition = parse_definition(&path, "script")?;
        if staged.script_by_name(&def.name).is_some() {
            debug!(name = %def.name, "script already present, skipping");
            continue;
        }
        let entry = def.to_entry(&staged, &import_group)?;
        staged.scripts.push(entry);
        report.scripts_added += 1;
    }

    // Patches against existing code, reapplied fuzzily.
    for path in files_with_extension(&layout.dir(FileKind::Patch), ".gml.patch")? {
        let file_name = path.file_name().unwrap_or("<patch>").to_string();
        let text = std::fs::read_to_string(path.as_std_path())?;

        let patch = match PatchFile::from_text(&text) {
            Ok(patch) => patch,
            Err(err) => {
                let detail = err.to_string();
                match prompt.patch_trouble(&file_name, &detail) {
                    WarningChoice::Abort => {
                        report.aborted = Some(format!("aborted on unparsable patch {file_name}"));
                        return Ok(report);
                    }
                    WarningChoice::Continue => {
                        report.warnings.push(format!("{file_name}: {detail}"));
                        continue;
                    }
                }
            }
        };

        let name = patch.code_entry_name().to_string();
        let Some(lines) = staged.code_lines(&name) else {
            // Presumed to target a different archive version.
            debug!(name, "patch target not in this archive, skipping");
            report.skipped_patches += 1;
            continue;
        };

        let mut patcher = Patcher::new(patch.hunks, lines);
        if !patcher.apply(ApplyMode::Fuzzy) {
            let failed: Vec<usize> = patcher
                .results()
                .iter()
                .enumerate()
                .filter(|(_, r)| !r.success)
                .map(|(i, _)| i + 1)
                .collect();
            let detail = format!("hunk(s) {failed:?} failed to apply even fuzzily");
            match prompt.patch_trouble(&file_name, &detail) {
                WarningChoice::Abort => {
                    report.aborted = Some(format!("aborted on failing patch {file_name}"));
                    return Ok(report);
                }
                WarningChoice::Continue => report.warnings.push(format!("{file_name}: {detail}")),
            }
        }

        import_group.queue_replace(&staged, &name, patcher.result_lines().join("\n"))?;
        report.patched += 1;
    }

    // Sprites: validate everything up front, then pack one shared atlas.
    let mut pending_sprites = Vec::new();
    for path in files_with_extension(&layout.dir(FileKind::Sprite), ".json")? {
        let def: SpriteDefinition = parse_definition(&path, "sprite")?;
        def.validate()?;

        let image_path = layout.dir(FileKind::Sprite).join(&def.image_file);
        if !image_path.as_std_path().exists() {
            return Err(Error::MissingSpriteImage {
                name: def.name.clone(),
                path: image_path,
            });
        }
        if staged.sprite_by_name(&def.name).is_some() {
            debug!(name = %def.name, "sprite already present, skipping");
            continue;
        }
        pending_sprites.push((def, image_path));
    }

    // Zero sprites: no atlas, no empty texture page.
    if !pending_sprites.is_empty() {
        let mut atlas = TextureAtlas::new();
        for (def, image_path) in &pending_sprites {
            atlas.add(def, image_path)?;
        }
        let packed = atlas.pack()?;
        let page = packed.save(&mut staged)?;

        for (def, _) in &pending_sprites {
            let frames = packed.bind_frames(&def.name, page);
            staged.sprites.push(def.to_entry(frames));
            report.sprites_added += 1;
        }
    }

    // Final gate: surface accumulated warnings once before committing.
    if !report.warnings.is_empty() && !prompt.confirm_commit(&report.warnings) {
        report.aborted = Some("discarded at final commit prompt".to_string());
        return Ok(report);
    }

    import_group.commit(&mut staged);
    *target = staged;
    report.committed = true;
    info!(
        objects = report.objects_added,
        code = report.new_code,
        scripts = report.scripts_added,
        patched = report.patched,
        sprites = report.sprites_added,
        "apply run committed"
    );
    Ok(report)
}

/// Files in `dir` with the given extension, sorted by name for deterministic
/// stage order. A missing directory is an empty scope, not an error.
fn files_with_extension(dir: &Utf8Path, extension: &str) -> Result<Vec<Utf8PathBuf>> {
    if !dir.as_std_path().is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir.as_std_path())? {
        let entry = entry?;
        let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
            continue;
        };
        let name = path.file_name().unwrap_or_default();
        // ".gml" must not pick up ".gml.patch" files from the shared folder.
        if name.ends_with(extension) && !(extension == ".gml" && name.ends_with(".gml.patch")) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_stem(path: &Utf8Path, extension: &str) -> String {
    let name = path.file_name().unwrap_or_default();
    name.strip_suffix(extension).unwrap_or(name).to_string()
}

fn parse_definition<T: serde::de::DeserializeOwned>(
    path: &Utf8Path,
    kind: &'static str,
) -> Result<T> {
    let text = std::fs::read_to_string(path.as_std_path())?;
    serde_json::from_str(&text).map_err(|err| Error::InvalidDefinition {
        kind,
        name: path.file_name().unwrap_or_default().to_string(),
        reason: err.to_string(),
    })
}
