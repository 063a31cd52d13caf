//! Collapse/expand state over a flat comment sequence.
//!
//! The thread tree is never materialized: the pre-order sequence plus the
//! per-comment `level` already encode it, so every tree operation here is
//! a contiguous-range scan by index. The subtree of the comment at `i` is
//! the maximal run after `i` whose level stays strictly greater.
//!
//! All operations are total over valid indices and raise no errors;
//! calling them with an index outside the sequence is a caller bug, not a
//! recoverable condition.

use crate::item::{Comment, Visibility};

/// End (exclusive) of the subtree rooted at `index`.
fn subtree_end(comments: &[Comment], index: usize) -> usize {
    let level = comments[index].level;
    comments[index + 1..]
        .iter()
        .position(|c| c.level <= level)
        .map_or(comments.len(), |offset| index + 1 + offset)
}

/// Number of descendants of the comment at `index`, counted against the
/// full sequence regardless of visibility.
pub fn child_count(comments: &[Comment], index: usize) -> usize {
    subtree_end(comments, index) - index - 1
}

/// Collapses or expands the comment at `index`.
///
/// Collapsing marks the comment `Compact` and hides its descendants,
/// leaving already-hidden ones untouched. Expanding marks the comment
/// `Visible` and forces *every* descendant visible, including subtrees
/// under a child that was independently collapsed earlier. The expansion
/// side is intentionally lossy: nested collapse state does not survive a
/// collapse/expand cycle of an ancestor.
pub fn toggle(comments: &mut [Comment], index: usize) {
    let was_visible = comments[index].visibility == Visibility::Visible;
    comments[index].visibility = if was_visible { Visibility::Compact } else { Visibility::Visible };

    let end = subtree_end(comments, index);
    for c in &mut comments[index + 1..end] {
        if was_visible {
            if c.visibility != Visibility::Hidden {
                c.visibility = Visibility::Hidden;
            }
        } else {
            c.visibility = Visibility::Visible;
        }
    }
}

/// Indices of the currently displayable subsequence: every comment whose
/// visibility is not `Hidden`, in order.
pub fn displayable(comments: &[Comment]) -> Vec<usize> {
    comments
        .iter()
        .enumerate()
        .filter(|(_, c)| c.visibility != Visibility::Hidden)
        .map(|(i, _)| i)
        .collect()
}

/// Nearest thread root at or before `index`, scanning backward through
/// the displayable view. Used to collapse the whole thread containing a
/// comment from any depth.
pub fn root_of(comments: &[Comment], index: usize) -> Option<usize> {
    (0..=index)
        .rev()
        .find(|&i| comments[i].visibility != Visibility::Hidden && comments[i].level == 0)
}
