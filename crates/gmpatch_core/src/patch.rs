//! The portable patch file format.
//!
//! A patch file is a textual header block declaring `basePath`/`patchedPath`
//! (POSIX-style `a/...` and `b/...` relative paths) followed by one or more
//! hunks in unified-diff syntax. External tooling parses the `a/`/`b/` prefix
//! and `.gml` suffix conventions, so rendering is bit-exact:
//!
//! ```text
//! --- a/Code/scr_test.gml
//! +++ b/Code/scr_test.gml
//! @@ -1,3 +1,3 @@
//!  context line
//! -old line
//! +new line
//! ```

use crate::error::{Error, Result};
use std::fmt;

/// One line-level operation within a hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchLine {
    Context(String),
    Add(String),
    Remove(String),
}

impl PatchLine {
    /// The text of the line, without its operation prefix.
    pub fn text(&self) -> &str {
        match self {
            PatchLine::Context(s) | PatchLine::Add(s) | PatchLine::Remove(s) => s,
        }
    }

    /// Whether this line is present on the old (pre-patch) side.
    pub fn on_old_side(&self) -> bool {
        matches!(self, PatchLine::Context(_) | PatchLine::Remove(_))
    }

    /// Whether this line is present on the new (post-patch) side.
    pub fn on_new_side(&self) -> bool {
        matches!(self, PatchLine::Context(_) | PatchLine::Add(_))
    }
}

/// One contiguous block of line-level changes.
///
/// Starts are one-based as rendered in `@@` headers; a zero-length range uses
/// the unified-diff convention of pointing at the line *before* the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub old_len: usize,
    pub new_start: usize,
    pub new_len: usize,
    pub lines: Vec<PatchLine>,
}

impl fmt::Display for Hunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_len, self.new_start, self.new_len
        )?;
        for line in &self.lines {
            match line {
                PatchLine::Context(s) => writeln!(f, " {s}")?,
                PatchLine::Add(s) => writeln!(f, "+{s}")?,
                PatchLine::Remove(s) => writeln!(f, "-{s}")?,
            }
        }
        Ok(())
    }
}

/// A parsed patch file: base/patched paths plus an ordered hunk list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchFile {
    pub base_path: String,
    pub patched_path: String,
    pub hunks: Vec<Hunk>,
}

impl PatchFile {
    /// Build a patch file for a code entry, using the `a/Code/<name>.gml`
    /// path convention.
    pub fn for_code_entry(name: &str, hunks: Vec<Hunk>) -> Self {
        Self {
            base_path: format!("a/Code/{name}.gml"),
            patched_path: format!("b/Code/{name}.gml"),
            hunks,
        }
    }

    /// The code entry name this patch targets: the base path's file stem with
    /// the `.gml` suffix removed.
    pub fn code_entry_name(&self) -> &str {
        let file = self.base_path.rsplit('/').next().unwrap_or(&self.base_path);
        file.strip_suffix(".gml").unwrap_or(file)
    }

    /// Parse the textual patch format. The inverse of `to_string`.
    pub fn from_text(text: &str) -> Result<Self> {
        let mut lines = text.lines().peekable();

        let base_path = header_line(lines.next(), "--- ")?;
        let patched_path = header_line(lines.next(), "+++ ")?;

        let mut hunks = Vec::new();
        while let Some(header) = lines.next() {
            if header.is_empty() {
                continue;
            }
            let (old_start, old_len, new_start, new_len) = parse_hunk_header(header)?;

            let mut body = Vec::new();
            let (mut old_seen, mut new_seen) = (0usize, 0usize);
            while old_seen < old_len || new_seen < new_len {
                let line = lines
                    .next()
                    .ok_or_else(|| Error::MalformedPatch("truncated hunk body".to_string()))?;

                if let Some(added) = line.strip_prefix('+') {
                    body.push(PatchLine::Add(added.to_string()));
                    new_seen += 1;
                } else if let Some(removed) = line.strip_prefix('-') {
                    body.push(PatchLine::Remove(removed.to_string()));
                    old_seen += 1;
                } else if line.starts_with('\\') {
                    // "\ No newline at end of file" markers carry no content.
                } else {
                    // Context: either " text" or a bare empty line.
                    let text = line.strip_prefix(' ').unwrap_or(line);
                    body.push(PatchLine::Context(text.to_string()));
                    old_seen += 1;
                    new_seen += 1;
                }
            }

            hunks.push(Hunk {
                old_start,
                old_len,
                new_start,
                new_len,
                lines: body,
            });
        }

        if hunks.is_empty() {
            return Err(Error::MalformedPatch("patch contains no hunks".to_string()));
        }

        Ok(Self {
            base_path,
            patched_path,
            hunks,
        })
    }
}

impl fmt::Display for PatchFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {}", self.base_path)?;
        writeln!(f, "+++ {}", self.patched_path)?;
        for hunk in &self.hunks {
            write!(f, "{hunk}")?;
        }
        Ok(())
    }
}

fn header_line(line: Option<&str>, prefix: &str) -> Result<String> {
    line.and_then(|l| l.strip_prefix(prefix))
        .map(|path| path.to_string())
        .ok_or_else(|| Error::MalformedPatch(format!("expected '{}' header line", prefix.trim())))
}

/// Parse `@@ -start,len +start,len @@`. A bare `start` defaults its len to 1.
fn parse_hunk_header(line: &str) -> Result<(usize, usize, usize, usize)> {
    let malformed = || Error::MalformedPatch(format!("bad hunk header: {line}"));

    let inner = line
        .strip_prefix("@@ -")
        .and_then(|rest| rest.strip_suffix(" @@"))
        .ok_or_else(malformed)?;
    let (old_part, new_part) = inner.split_once(" +").ok_or_else(malformed)?;

    let parse_range = |part: &str| -> Result<(usize, usize)> {
        match part.split_once(',') {
            Some((start, len)) => Ok((
                start.parse().map_err(|_| malformed())?,
                len.parse().map_err(|_| malformed())?,
            )),
            None => Ok((part.parse().map_err(|_| malformed())?, 1)),
        }
    };

    let (old_start, old_len) = parse_range(old_part)?;
    let (new_start, new_len) = parse_range(new_part)?;
    Ok((old_start, old_len, new_start, new_len))
}
