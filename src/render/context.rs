//! Render state carried through the merge-decision loop.

use std::collections::{HashMap, HashSet};

/// Mutable bookkeeping for one generate call.
///
/// A trench can be touched twice by the loop — once as the right side of a
/// merge with its left neighbor, once as the potential left side of the
/// next merge — so every visual element tracks whether it was already
/// emitted. All indices in the sets are 1-based trench numbers (seam
/// numbers for `printed_pass`); `committed_x` is keyed by the 0-based list
/// position because a merge fixes the right trench's X before the loop
/// reaches it.
#[derive(Debug, Default)]
pub struct RenderState {
    /// X cursor for the next freely placed trench.
    pub cursor_x: f64,
    /// Outer-left X positions fixed by a previous merge.
    pub committed_x: HashMap<usize, f64>,
    pub drawn_top: HashSet<usize>,
    pub drawn_pipe: HashSet<usize>,
    pub drawn_surface: HashSet<usize>,
    pub printed_trench: HashSet<usize>,
    pub printed_pass: HashSet<usize>,
    pub printed_depth: HashSet<usize>,
    pub printed_gok: HashSet<usize>,
    /// The right trench of the last merge is already fully drawn; skip its
    /// standalone pass.
    pub skip_single_next: bool,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }
}
