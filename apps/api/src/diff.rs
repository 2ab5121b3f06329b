//! Character-level diff between two documents.
//!
//! `compute_diff` finds a longest common subsequence of the two inputs' `char`s and
//! expresses everything outside it as Delete/Insert runs between Equal runs. Within a
//! changed region the Delete run always precedes the Insert run.
//!
//! The LCS is found with Hirschberg's divide-and-conquer so memory stays linear in
//! the shorter input; the common prefix and suffix are trimmed first, which keeps
//! the quadratic part small for typical before/after résumé edits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    Equal,
    Insert,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOp {
    pub kind: DiffKind,
    pub text: String,
}

/// Ordered edit script. Never empty runs; adjacent runs never share a kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffScript {
    ops: Vec<DiffOp>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub unchanged_chars: usize,
    pub inserted_chars: usize,
    pub deleted_chars: usize,
}

impl DiffScript {
    pub fn ops(&self) -> &[DiffOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// True when the two inputs were identical.
    pub fn is_unchanged(&self) -> bool {
        self.ops.iter().all(|op| op.kind == DiffKind::Equal)
    }

    /// Rebuilds the old text from Equal + Delete runs.
    pub fn old_text(&self) -> String {
        self.collect_text(DiffKind::Delete)
    }

    /// Rebuilds the new text from Equal + Insert runs.
    pub fn new_text(&self) -> String {
        self.collect_text(DiffKind::Insert)
    }

    pub fn stats(&self) -> DiffStats {
        let mut stats = DiffStats::default();
        for op in &self.ops {
            let n = op.text.chars().count();
            match op.kind {
                DiffKind::Equal => stats.unchanged_chars += n,
                DiffKind::Insert => stats.inserted_chars += n,
                DiffKind::Delete => stats.deleted_chars += n,
            }
        }
        stats
    }

    fn collect_text(&self, side: DiffKind) -> String {
        self.ops
            .iter()
            .filter(|op| op.kind == DiffKind::Equal || op.kind == side)
            .map(|op| op.text.as_str())
            .collect()
    }
}

/// Computes a minimal character-level edit script from `old` to `new`.
///
/// Total and deterministic; no whitespace or case normalization.
pub fn compute_diff(old: &str, new: &str) -> DiffScript {
    let a: Vec<char> = old.chars().collect();
    let b: Vec<char> = new.chars().collect();

    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let mut edits = Vec::with_capacity(a.len().max(b.len()));
    edits.extend(a[..prefix].iter().map(|&c| (DiffKind::Equal, c)));
    hirschberg(
        &a[prefix..a.len() - suffix],
        &b[prefix..b.len() - suffix],
        &mut edits,
    );
    edits.extend(a[a.len() - suffix..].iter().map(|&c| (DiffKind::Equal, c)));

    DiffScript {
        ops: coalesce(edits),
    }
}

fn hirschberg(a: &[char], b: &[char], out: &mut Vec<(DiffKind, char)>) {
    if a.is_empty() {
        out.extend(b.iter().map(|&c| (DiffKind::Insert, c)));
        return;
    }
    if b.is_empty() {
        out.extend(a.iter().map(|&c| (DiffKind::Delete, c)));
        return;
    }
    if a.len() == 1 {
        match b.iter().position(|&c| c == a[0]) {
            Some(j) => {
                out.extend(b[..j].iter().map(|&c| (DiffKind::Insert, c)));
                out.push((DiffKind::Equal, a[0]));
                out.extend(b[j + 1..].iter().map(|&c| (DiffKind::Insert, c)));
            }
            None => {
                out.push((DiffKind::Delete, a[0]));
                out.extend(b.iter().map(|&c| (DiffKind::Insert, c)));
            }
        }
        return;
    }

    let mid = a.len() / 2;
    let forward = lcs_row(&a[..mid], b, false);
    let backward = lcs_row(&a[mid..], b, true);

    // Split b where the two halves' LCS lengths sum to the maximum.
    let mut split = 0;
    let mut best = 0;
    for j in 0..=b.len() {
        let total = forward[j] + backward[b.len() - j];
        if total > best {
            best = total;
            split = j;
        }
    }

    hirschberg(&a[..mid], &b[..split], out);
    hirschberg(&a[mid..], &b[split..], out);
}

/// Last row of the LCS table: `row[j]` is the LCS length of `a` and the first `j`
/// chars of `b`. With `reversed`, both inputs are read back to front.
fn lcs_row(a: &[char], b: &[char], reversed: bool) -> Vec<usize> {
    let at = |i: usize| if reversed { a[a.len() - 1 - i] } else { a[i] };
    let bt = |j: usize| if reversed { b[b.len() - 1 - j] } else { b[j] };

    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for i in 0..a.len() {
        let ca = at(i);
        for j in 0..b.len() {
            cur[j + 1] = if ca == bt(j) {
                prev[j] + 1
            } else {
                cur[j].max(prev[j + 1])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev
}

/// Merges per-char edits into runs, putting each region's deletions before its insertions.
fn coalesce(edits: Vec<(DiffKind, char)>) -> Vec<DiffOp> {
    let mut ops = Vec::new();
    let mut equal = String::new();
    let mut deleted = String::new();
    let mut inserted = String::new();

    for (kind, c) in edits {
        match kind {
            DiffKind::Equal => {
                flush(&mut ops, DiffKind::Delete, &mut deleted);
                flush(&mut ops, DiffKind::Insert, &mut inserted);
                equal.push(c);
            }
            DiffKind::Delete => {
                flush(&mut ops, DiffKind::Equal, &mut equal);
                deleted.push(c);
            }
            DiffKind::Insert => {
                flush(&mut ops, DiffKind::Equal, &mut equal);
                inserted.push(c);
            }
        }
    }
    flush(&mut ops, DiffKind::Delete, &mut deleted);
    flush(&mut ops, DiffKind::Insert, &mut inserted);
    flush(&mut ops, DiffKind::Equal, &mut equal);
    ops
}

fn flush(ops: &mut Vec<DiffOp>, kind: DiffKind, buf: &mut String) {
    if !buf.is_empty() {
        ops.push(DiffOp {
            kind,
            text: std::mem::take(buf),
        });
    }
}
