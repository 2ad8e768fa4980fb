//! Batched code replacement with a single commit.
//!
//! A [`CodeImportGroup`] accumulates "replace this code entry's source"
//! operations during an apply run and swaps them into the archive in one
//! batch. Queueing is where collisions surface; committing cannot fail.

use crate::archive::{Archive, CodeEntry};
use crate::error::{CollisionKind, Error, Result};
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug)]
struct QueuedReplace {
    name: String,
    source: String,
}

/// Accumulates code replacements for one apply run.
#[derive(Debug, Default)]
pub struct CodeImportGroup {
    queued: Vec<QueuedReplace>,
    names: HashSet<String>,
}

impl CodeImportGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a replacement for `name`, creating the entry at commit time if
    /// it does not exist yet.
    ///
    /// Errors with a structured [`CollisionKind`] when the same entry is
    /// queued twice, or when the entry would be a brand-new object event with
    /// no game object to attach it to.
    pub fn queue_replace(&mut self, archive: &Archive, name: &str, source: String) -> Result<()> {
        if self.names.contains(name) {
            return Err(Error::collision(CollisionKind::DuplicateReplace, name));
        }

        if archive.code_by_name(name).is_none() {
            if let Some(object) = event_object_name(name) {
                if archive.object_by_name(object).is_none() {
                    return Err(Error::collision(CollisionKind::UnattachedEvent, name));
                }
            }
        }

        self.names.insert(name.to_string());
        self.queued.push(QueuedReplace {
            name: name.to_string(),
            source,
        });
        Ok(())
    }

    /// Whether a replacement for `name` is already queued.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }

    /// Swap every queued source into the archive. Existing entries are
    /// replaced in place; new entries are appended as top-level code.
    pub fn commit(self, archive: &mut Archive) {
        for replace in self.queued {
            debug!(name = %replace.name, "importing code entry");
            match archive.code_by_name_mut(&replace.name) {
                Some(entry) => entry.source = replace.source,
                None => archive.code.push(CodeEntry {
                    name: replace.name,
                    parent: None,
                    source: replace.source,
                }),
            }
        }
    }
}

/// For object event entries (`gml_Object_<object>_<event>_<n>`), the name of
/// the object the event belongs to.
fn event_object_name(code_name: &str) -> Option<&str> {
    let rest = code_name.strip_prefix("gml_Object_")?;
    // Strip the trailing `_<event>_<n>` pair to recover the object name.
    let (rest, _number) = rest.rsplit_once('_')?;
    let (object, _event) = rest.rsplit_once('_')?;
    Some(object)
}
