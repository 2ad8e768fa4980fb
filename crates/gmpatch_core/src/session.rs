//! Staged file output for one generation run.
//!
//! An [`ImportSession`] buffers every file a generation pass wants to write,
//! plus exported sprite images and accumulated warnings. Nothing touches disk
//! until [`ImportSession::flush`], which reconciles each kind's folder against
//! the queued set: stale files are deleted first (across all kinds), then all
//! queued entries are written. A run that never flushes leaves the output
//! tree untouched.

use crate::error::Result;
use camino::{Utf8Path, Utf8PathBuf};
use std::collections::HashSet;
use tracing::{debug, warn};

/// What a staged file is, which decides its folder and extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Code,
    Script,
    Sprite,
    Patch,
    GameObject,
}

impl FileKind {
    pub const ALL: [FileKind; 5] = [
        FileKind::Code,
        FileKind::Script,
        FileKind::Sprite,
        FileKind::Patch,
        FileKind::GameObject,
    ];

    /// Folder under the scope root. Code and patches share `Code/`.
    pub fn folder(&self) -> &'static str {
        match self {
            FileKind::Code | FileKind::Patch => "Code",
            FileKind::Script => "Scripts",
            FileKind::Sprite => "Sprites",
            FileKind::GameObject => "GameObjects",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Code => ".gml",
            FileKind::Script | FileKind::Sprite | FileKind::GameObject => ".json",
            FileKind::Patch => ".gml.patch",
        }
    }
}

/// Resolves the on-disk folder layout for one scope (a chapter or `global`).
#[derive(Debug, Clone)]
pub struct ScopeLayout {
    root: Utf8PathBuf,
}

impl ScopeLayout {
    pub fn new(output_root: &Utf8Path, scope: &str) -> Self {
        Self {
            root: output_root.join(scope),
        }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn dir(&self, kind: FileKind) -> Utf8PathBuf {
        self.root.join(kind.folder())
    }

    pub fn file_path(&self, kind: FileKind, name: &str) -> Utf8PathBuf {
        self.dir(kind).join(format!("{name}{}", kind.extension()))
    }
}

/// One queued output file.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub name: String,
    pub text: String,
    pub kind: FileKind,
}

/// An exported sprite image, written next to its definition record.
#[derive(Debug, Clone)]
struct StagedImage {
    name: String,
    png: Vec<u8>,
}

/// Per-run staging state: the file queue, exported images, and warnings.
///
/// One session per run; discard it when the run ends. Duplicate logical names
/// are rejected regardless of kind so the same asset cannot be filed under
/// two scopes in a single pass.
#[derive(Debug, Default)]
pub struct ImportSession {
    queue: Vec<StagedFile>,
    images: Vec<StagedImage>,
    names: HashSet<String>,
    image_names: HashSet<String>,
    warnings: Vec<String>,
}

impl ImportSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a file for the flush pass. Returns `false` (and stages nothing)
    /// when the logical name was already queued this run.
    pub fn queue_file(&mut self, name: &str, text: String, kind: FileKind) -> bool {
        if !self.names.insert(name.to_string()) {
            debug!(name, ?kind, "duplicate logical name rejected");
            return false;
        }

        self.queue.push(StagedFile {
            name: name.to_string(),
            text,
            kind,
        });
        true
    }

    /// Queue an exported sprite image, keyed independently of text files.
    pub fn queue_image(&mut self, name: &str, png: Vec<u8>) -> bool {
        if !self.image_names.insert(name.to_string()) {
            return false;
        }
        self.images.push(StagedImage {
            name: name.to_string(),
            png,
        });
        true
    }

    /// Record a non-fatal problem to surface in the report.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.warnings.push(message);
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn staged(&self) -> &[StagedFile] {
        &self.queue
    }

    pub fn count_of(&self, kind: FileKind) -> usize {
        self.queue.iter().filter(|f| f.kind == kind).count()
    }

    /// Reconcile the scope's folders with the queued set and write everything.
    ///
    /// Deletions run first for every kind (skipping kinds in `preserve`),
    /// removing files of the kind's extension that are not in the queued set.
    /// Only then are queued entries written, so a partially-written state can
    /// never be destroyed by a later kind's reset pass. Code files already on
    /// disk are never overwritten; hand-edited sources survive regeneration.
    pub fn flush(&self, layout: &ScopeLayout, preserve: &[FileKind]) -> Result<()> {
        for kind in FileKind::ALL {
            std::fs::create_dir_all(layout.dir(kind).as_std_path())?;
            if !preserve.contains(&kind) {
                self.reset_kind(layout, kind)?;
            }
        }

        for file in &self.queue {
            let path = layout.file_path(file.kind, &file.name);
            if file.kind == FileKind::Code && path.as_std_path().exists() {
                debug!(%path, "keeping existing source file");
                continue;
            }
            std::fs::write(path.as_std_path(), &file.text)?;
        }

        let sprite_dir = layout.dir(FileKind::Sprite);
        for image in &self.images {
            let path = sprite_dir.join(format!("{}.png", image.name));
            std::fs::write(path.as_std_path(), &image.png)?;
        }

        Ok(())
    }

    /// Delete this kind's stale files: right extension, not in the queued set.
    fn reset_kind(&self, layout: &ScopeLayout, kind: FileKind) -> Result<()> {
        let wanted: HashSet<Utf8PathBuf> = self
            .queue
            .iter()
            .filter(|f| f.kind == kind)
            .map(|f| layout.file_path(kind, &f.name))
            .chain(
                // Sprite images live beside their definitions.
                (kind == FileKind::Sprite)
                    .then(|| {
                        self.images
                            .iter()
                            .map(|i| layout.dir(kind).join(format!("{}.png", i.name)))
                    })
                    .into_iter()
                    .flatten(),
            )
            .collect();

        for entry in std::fs::read_dir(layout.dir(kind).as_std_path())? {
            let entry = entry?;
            let Ok(path) = Utf8PathBuf::from_path_buf(entry.path()) else {
                continue;
            };
            let name = path.file_name().unwrap_or_default();
            let matches_kind = name.ends_with(kind.extension())
                || (kind == FileKind::Sprite && name.ends_with(".png"));
            if matches_kind && !wanted.contains(&path) {
                debug!(%path, "removing stale output file");
                std::fs::remove_file(path.as_std_path())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    fn temp_layout() -> (tempfile::TempDir, ScopeLayout) {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap();
        let layout = ScopeLayout::new(&root, "global");
        (dir, layout)
    }

    #[test]
    fn duplicate_names_rejected_across_kinds() {
        let mut session = ImportSession::new();
        assert!(session.queue_file("x", "code".to_string(), FileKind::Code));
        assert!(!session.queue_file("x", "script".to_string(), FileKind::Script));

        assert_eq!(session.staged().len(), 1);
        assert_eq!(session.staged()[0].kind, FileKind::Code);
    }

    #[test]
    fn kind_table_matches_disk_layout() {
        let layout = ScopeLayout::new(Utf8Path::new("out"), "global");
        assert_eq!(
            layout.file_path(FileKind::Code, "scr_a"),
            Utf8PathBuf::from("out/global/Code/scr_a.gml")
        );
        assert_eq!(
            layout.file_path(FileKind::Patch, "scr_a"),
            Utf8PathBuf::from("out/global/Code/scr_a.gml.patch")
        );
        assert_eq!(
            layout.file_path(FileKind::Script, "scr_a"),
            Utf8PathBuf::from("out/global/Scripts/scr_a.json")
        );
        assert_eq!(
            layout.file_path(FileKind::Sprite, "spr_a"),
            Utf8PathBuf::from("out/global/Sprites/spr_a.json")
        );
        assert_eq!(
            layout.file_path(FileKind::GameObject, "obj_a"),
            Utf8PathBuf::from("out/global/GameObjects/obj_a.json")
        );
    }

    #[test]
    fn flush_writes_queued_files() {
        let (_dir, layout) = temp_layout();
        let mut session = ImportSession::new();
        session.queue_file("scr_a", "a = 1".to_string(), FileKind::Code);
        session.queue_file("scr_b", "patch body".to_string(), FileKind::Patch);
        session.flush(&layout, &[]).unwrap();

        let code = layout.file_path(FileKind::Code, "scr_a");
        let patch = layout.file_path(FileKind::Patch, "scr_b");
        assert_eq!(std::fs::read_to_string(code.as_std_path()).unwrap(), "a = 1");
        assert_eq!(
            std::fs::read_to_string(patch.as_std_path()).unwrap(),
            "patch body"
        );
    }

    #[test]
    fn flush_deletes_stale_files_of_kind() {
        let (_dir, layout) = temp_layout();

        // A stale patch from a previous run.
        std::fs::create_dir_all(layout.dir(FileKind::Patch).as_std_path()).unwrap();
        let stale = layout.file_path(FileKind::Patch, "scr_old");
        std::fs::write(stale.as_std_path(), "old").unwrap();

        let mut session = ImportSession::new();
        session.queue_file("scr_new", "new".to_string(), FileKind::Patch);
        session.flush(&layout, &[]).unwrap();

        assert!(!stale.as_std_path().exists());
        assert!(layout
            .file_path(FileKind::Patch, "scr_new")
            .as_std_path()
            .exists());
    }

    #[test]
    fn deleting_code_does_not_touch_patches() {
        let (_dir, layout) = temp_layout();

        std::fs::create_dir_all(layout.dir(FileKind::Patch).as_std_path()).unwrap();
        let patch = layout.file_path(FileKind::Patch, "scr_a");
        std::fs::write(patch.as_std_path(), "patch").unwrap();

        // An empty queue flush preserving only patches clears code files but
        // must leave the .gml.patch alone even though it shares the folder.
        let session = ImportSession::new();
        session.flush(&layout, &[FileKind::Patch]).unwrap();

        assert!(patch.as_std_path().exists());
    }

    #[test]
    fn existing_code_files_are_never_overwritten() {
        let (_dir, layout) = temp_layout();

        std::fs::create_dir_all(layout.dir(FileKind::Code).as_std_path()).unwrap();
        let path = layout.file_path(FileKind::Code, "scr_a");
        std::fs::write(path.as_std_path(), "hand edited").unwrap();

        let mut session = ImportSession::new();
        session.queue_file("scr_a", "regenerated".to_string(), FileKind::Code);
        session.flush(&layout, &[FileKind::Code]).unwrap();

        assert_eq!(
            std::fs::read_to_string(path.as_std_path()).unwrap(),
            "hand edited"
        );
    }

    #[test]
    fn preserved_kinds_keep_stale_files() {
        let (_dir, layout) = temp_layout();

        std::fs::create_dir_all(layout.dir(FileKind::Code).as_std_path()).unwrap();
        let stale = layout.file_path(FileKind::Code, "scr_manual");
        std::fs::write(stale.as_std_path(), "manual").unwrap();

        let session = ImportSession::new();
        session.flush(&layout, &[FileKind::Code]).unwrap();

        assert!(stale.as_std_path().exists());
    }

    #[test]
    fn sprite_flush_writes_definition_and_image() {
        let (_dir, layout) = temp_layout();
        let mut session = ImportSession::new();
        session.queue_file("spr_a", "{}".to_string(), FileKind::Sprite);
        session.queue_image("spr_a", vec![1, 2, 3]);
        session.flush(&layout, &[]).unwrap();

        assert!(layout
            .file_path(FileKind::Sprite, "spr_a")
            .as_std_path()
            .exists());
        let image = layout.dir(FileKind::Sprite).join("spr_a.png");
        assert_eq!(std::fs::read(image.as_std_path()).unwrap(), vec![1, 2, 3]);
    }
}
