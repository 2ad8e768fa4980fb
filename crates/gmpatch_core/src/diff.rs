//! Line diffing and (fuzzy) hunk reapplication.
//!
//! [`make_patches`] turns two decompiled line sequences into hunks via the
//! `similar` diff engine. [`Patcher`] reapplies those hunks to a line buffer,
//! optionally tolerating upstream drift: [`ApplyMode::Offset`] searches nearby
//! positions for an exact context match, and [`ApplyMode::Fuzzy`] additionally
//! accepts approximate context matches. Removed lines always have to match
//! exactly; only context is allowed to drift.

use crate::patch::{Hunk, PatchLine};
use similar::{capture_diff_slices, group_diff_ops, Algorithm, DiffOp};

/// Context lines kept around each change when generating hunks.
const CONTEXT_LINES: usize = 3;

/// Minimum fraction of old-side lines that must match for a fuzzy placement.
const MIN_FUZZ_SCORE: f32 = 0.6;

/// Diff two line sequences into unified-diff hunks. Identical inputs produce
/// an empty hunk list.
pub fn make_patches(old: &[String], new: &[String]) -> Vec<Hunk> {
    let ops = capture_diff_slices(Algorithm::Myers, old, new);
    group_diff_ops(ops, CONTEXT_LINES)
        .into_iter()
        .map(|group| hunk_from_group(&group, old, new))
        .collect()
}

fn hunk_from_group(group: &[DiffOp], old: &[String], new: &[String]) -> Hunk {
    let mut lines = Vec::new();
    for op in group {
        match *op {
            DiffOp::Equal { old_index, len, .. } => {
                for line in &old[old_index..old_index + len] {
                    lines.push(PatchLine::Context(line.clone()));
                }
            }
            DiffOp::Delete {
                old_index, old_len, ..
            } => {
                for line in &old[old_index..old_index + old_len] {
                    lines.push(PatchLine::Remove(line.clone()));
                }
            }
            DiffOp::Insert {
                new_index, new_len, ..
            } => {
                for line in &new[new_index..new_index + new_len] {
                    lines.push(PatchLine::Add(line.clone()));
                }
            }
            DiffOp::Replace {
                old_index,
                old_len,
                new_index,
                new_len,
            } => {
                for line in &old[old_index..old_index + old_len] {
                    lines.push(PatchLine::Remove(line.clone()));
                }
                for line in &new[new_index..new_index + new_len] {
                    lines.push(PatchLine::Add(line.clone()));
                }
            }
        }
    }

    let old_len = lines.iter().filter(|l| l.on_old_side()).count();
    let new_len = lines.iter().filter(|l| l.on_new_side()).count();
    let old_index = group.first().map_or(0, |op| op.old_range().start);
    let new_index = group.first().map_or(0, |op| op.new_range().start);

    Hunk {
        // Unified convention: one-based, except a zero-length range points at
        // the line before the change.
        old_start: if old_len == 0 { old_index } else { old_index + 1 },
        old_len,
        new_start: if new_len == 0 { new_index } else { new_index + 1 },
        new_len,
        lines,
    }
}

/// How strictly hunks must match their declared positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyMode {
    /// Hunks apply at their declared offsets only.
    Exact,
    /// Search nearby offsets for an exact context match.
    Offset,
    /// Offset search first, then approximate context matching.
    Fuzzy,
}

/// Outcome of applying one hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkResult {
    pub success: bool,
    /// Lines the hunk was shifted from its declared position.
    pub offset: isize,
    /// Whether the placement needed approximate context matching.
    pub fuzzy: bool,
}

/// Reapplies a hunk list to a line buffer.
///
/// A failed hunk leaves the buffer untouched for that hunk only; later hunks
/// still get a chance to apply.
#[derive(Debug)]
pub struct Patcher {
    hunks: Vec<Hunk>,
    lines: Vec<String>,
    results: Vec<HunkResult>,
}

impl Patcher {
    pub fn new(hunks: Vec<Hunk>, lines: Vec<String>) -> Self {
        Self {
            hunks,
            lines,
            results: Vec::new(),
        }
    }

    /// Apply all hunks in order. Returns `true` when every hunk applied.
    pub fn apply(&mut self, mode: ApplyMode) -> bool {
        self.results.clear();
        // Net lines added by the hunks applied so far; shifts later anchors.
        let mut delta: isize = 0;

        let hunks = std::mem::take(&mut self.hunks);
        for hunk in &hunks {
            let old_side: Vec<&str> = hunk
                .lines
                .iter()
                .filter(|l| l.on_old_side())
                .map(PatchLine::text)
                .collect();
            let anchor = self.anchor_position(hunk, delta, old_side.len());

            match self.find_position(&old_side, hunk, anchor, mode) {
                Some((position, fuzzy)) => {
                    let replacement = self.build_replacement(hunk, position);
                    let added = replacement.len() as isize - old_side.len() as isize;
                    self.lines
                        .splice(position..position + old_side.len(), replacement);
                    delta += added;
                    self.results.push(HunkResult {
                        success: true,
                        offset: position as isize - anchor as isize,
                        fuzzy,
                    });
                }
                None => self.results.push(HunkResult {
                    success: false,
                    offset: 0,
                    fuzzy: false,
                }),
            }
        }
        self.hunks = hunks;

        self.results.iter().all(|r| r.success)
    }

    /// Per-hunk outcomes of the last `apply` call.
    pub fn results(&self) -> &[HunkResult] {
        &self.results
    }

    pub fn result_lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Where the hunk expects to land after earlier hunks shifted the buffer.
    fn anchor_position(&self, hunk: &Hunk, delta: isize, pattern_len: usize) -> usize {
        let declared = if hunk.old_len == 0 {
            hunk.old_start
        } else {
            hunk.old_start.saturating_sub(1)
        };
        let shifted = declared as isize + delta;
        let max = self.lines.len().saturating_sub(pattern_len);
        shifted.clamp(0, max as isize) as usize
    }

    fn find_position(
        &self,
        old_side: &[&str],
        hunk: &Hunk,
        anchor: usize,
        mode: ApplyMode,
    ) -> Option<(usize, bool)> {
        if old_side.is_empty() {
            // Pure insertion: nothing to match against.
            return Some((anchor, false));
        }
        if old_side.len() > self.lines.len() {
            return None;
        }
        let max = self.lines.len() - old_side.len();

        if self.matches_exactly(old_side, anchor) {
            return Some((anchor, false));
        }
        if mode == ApplyMode::Exact {
            return None;
        }

        for position in nearest_first(anchor, max) {
            if self.matches_exactly(old_side, position) {
                return Some((position, false));
            }
        }
        if mode == ApplyMode::Offset {
            return None;
        }

        for position in std::iter::once(anchor).chain(nearest_first(anchor, max)) {
            if let Some(score) = self.fuzz_score(hunk, position) {
                if score >= MIN_FUZZ_SCORE {
                    return Some((position, true));
                }
            }
        }
        None
    }

    fn matches_exactly(&self, old_side: &[&str], position: usize) -> bool {
        old_side
            .iter()
            .zip(&self.lines[position..])
            .all(|(expected, actual)| *expected == actual)
    }

    /// Fraction of old-side lines matching the window at `position`. Removed
    /// lines must match exactly or the placement is rejected outright.
    fn fuzz_score(&self, hunk: &Hunk, position: usize) -> Option<f32> {
        let mut cursor = position;
        let mut total = 0usize;
        let mut matched = 0usize;

        for line in &hunk.lines {
            match line {
                PatchLine::Context(expected) => {
                    total += 1;
                    if self.lines[cursor] == *expected {
                        matched += 1;
                    }
                    cursor += 1;
                }
                PatchLine::Remove(expected) => {
                    if self.lines[cursor] != *expected {
                        return None;
                    }
                    total += 1;
                    matched += 1;
                    cursor += 1;
                }
                PatchLine::Add(_) => {}
            }
        }

        Some(matched as f32 / total as f32)
    }

    /// The new-side lines for a hunk placed at `position`. Context lines keep
    /// whatever the buffer actually contains, so fuzzy drift is preserved.
    fn build_replacement(&self, hunk: &Hunk, position: usize) -> Vec<String> {
        let mut cursor = position;
        let mut replacement = Vec::new();

        for line in &hunk.lines {
            match line {
                PatchLine::Context(_) => {
                    replacement.push(self.lines[cursor].clone());
                    cursor += 1;
                }
                PatchLine::Remove(_) => cursor += 1,
                PatchLine::Add(text) => replacement.push(text.clone()),
            }
        }

        replacement
    }
}

/// Candidate positions ordered by distance from `anchor`: +1, -1, +2, -2, ...
fn nearest_first(anchor: usize, max: usize) -> impl Iterator<Item = usize> {
    (1..=max.max(anchor)).flat_map(move |distance| {
        let above = anchor.checked_add(distance).filter(|&p| p <= max);
        let below = anchor.checked_sub(distance);
        above.into_iter().chain(below)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn identical_inputs_yield_no_hunks() {
        let text = lines(&["a = 1", "b = 2"]);
        assert!(make_patches(&text, &text).is_empty());
    }

    #[test]
    fn single_line_change_yields_one_hunk() {
        let old = lines(&["a = 1"]);
        let new = lines(&["a = 2"]);
        let hunks = make_patches(&old, &new);

        assert_eq!(hunks.len(), 1);
        assert_eq!((hunks[0].old_start, hunks[0].old_len), (1, 1));
        assert_eq!(
            hunks[0].lines,
            vec![
                PatchLine::Remove("a = 1".to_string()),
                PatchLine::Add("a = 2".to_string()),
            ]
        );
    }

    fn numbered(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn round_trip_exact() {
        let old = numbered(30);
        let mut new = old.clone();
        new[4] = "changed early".to_string();
        new.insert(20, "inserted late".to_string());
        new.remove(27);

        let hunks = make_patches(&old, &new);
        assert!(hunks.len() >= 2);

        let mut patcher = Patcher::new(hunks, old);
        assert!(patcher.apply(ApplyMode::Exact));
        assert_eq!(patcher.result_lines(), new.as_slice());
    }

    #[test]
    fn offset_mode_tolerates_shifted_target() {
        let old = numbered(20);
        let mut new = old.clone();
        new[10] = "changed".to_string();
        let hunks = make_patches(&old, &new);

        // Upstream prepended two lines since the patch was generated.
        let mut shifted = lines(&["prelude 0", "prelude 1"]);
        shifted.extend(old);

        let mut patcher = Patcher::new(hunks, shifted);
        assert!(patcher.apply(ApplyMode::Offset));
        assert_eq!(patcher.result_lines()[12], "changed");
        assert_eq!(patcher.results()[0].offset, 2);
        assert!(!patcher.results()[0].fuzzy);
    }

    #[test]
    fn fuzzy_mode_tolerates_context_drift() {
        let old = numbered(20);
        let mut new = old.clone();
        new[10] = "changed".to_string();
        let hunks = make_patches(&old, &new);

        // Upstream edited a context line next to the change.
        let mut drifted = old.clone();
        drifted[9] = "upstream tweak".to_string();

        let mut strict = Patcher::new(hunks.clone(), drifted.clone());
        assert!(!strict.apply(ApplyMode::Offset));

        let mut fuzzy = Patcher::new(hunks, drifted);
        assert!(fuzzy.apply(ApplyMode::Fuzzy));
        assert!(fuzzy.results()[0].fuzzy);
        assert_eq!(fuzzy.result_lines()[10], "changed");
        // The drifted context line survives.
        assert_eq!(fuzzy.result_lines()[9], "upstream tweak");
    }

    #[test]
    fn removed_line_mismatch_fails_even_fuzzily() {
        let old = numbered(10);
        let mut new = old.clone();
        new[5] = "changed".to_string();
        let hunks = make_patches(&old, &new);

        let mut target = old;
        target[5] = "already different".to_string();

        let mut patcher = Patcher::new(hunks, target.clone());
        assert!(!patcher.apply(ApplyMode::Fuzzy));
        assert!(!patcher.results()[0].success);
        // Failed hunk leaves the buffer untouched.
        assert_eq!(patcher.result_lines(), target.as_slice());
    }

    #[test]
    fn later_hunks_apply_after_a_failure() {
        let old = numbered(40);
        let mut new = old.clone();
        new[2] = "first change".to_string();
        new[30] = "second change".to_string();
        let hunks = make_patches(&old, &new);
        assert_eq!(hunks.len(), 2);

        // Break only the first hunk's target.
        let mut target = old;
        target[2] = "conflicting edit".to_string();

        let mut patcher = Patcher::new(hunks, target);
        assert!(!patcher.apply(ApplyMode::Fuzzy));
        assert!(!patcher.results()[0].success);
        assert!(patcher.results()[1].success);
        assert_eq!(patcher.result_lines()[30], "second change");
    }

    #[test]
    fn pure_insertion_hunk_applies() {
        let old = lines(&["only line"]);
        let mut new = old.clone();
        new.push("appended".to_string());
        let hunks = make_patches(&old, &new);

        let mut patcher = Patcher::new(hunks, old);
        assert!(patcher.apply(ApplyMode::Exact));
        assert_eq!(patcher.result_lines(), new.as_slice());
    }

    #[test]
    fn round_trip_through_text_format() {
        use crate::patch::PatchFile;

        let old = numbered(12);
        let mut new = old.clone();
        new[6] = "edited".to_string();

        let patch = PatchFile::for_code_entry("scr_test", make_patches(&old, &new));
        let reparsed = PatchFile::from_text(&patch.to_string()).unwrap();

        let mut patcher = Patcher::new(reparsed.hunks, old);
        assert!(patcher.apply(ApplyMode::Fuzzy));
        assert_eq!(patcher.result_lines(), new.as_slice());
    }
}
