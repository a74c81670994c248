//! Drawing generation for a normalized element list.
//!
//! This module is organized into submodules:
//! - `defaults`: layout constants
//! - `context`: `RenderState` tracked across the merge loop
//! - `geometry`: interpolation and quad helpers
//! - `elevation`: front view (contours, passage blocks, depth/GOK dims)
//! - `plan`: top view (trench rectangles, surface restoration)
//! - `pipe`: pipe profiles, straight and piecewise
//! - `aufmass`: quantity-survey text composer
//!
//! The entry point is [`render`]: a single left-to-right scan over the
//! trenches. At every seam it either draws the current trench standalone
//! or merges it with its right neighbor (passage or plain connection);
//! the right trench of a merge is revisited as the next left side, so the
//! scan advances by one trench per iteration and deduplicates everything
//! that would otherwise be drawn twice.

pub mod aufmass;
pub mod context;
pub mod defaults;
pub mod elevation;
pub mod geometry;
pub mod pipe;
pub mod plan;

use std::collections::HashSet;

use glam::{DVec2, dvec2};

use crate::elements::{Element, PassageSpec, PipeSpec, SurfaceSpec, TrenchSpec};
use crate::errors::GenerateError;
use crate::sink::{DrawingSink, Layer};

use aufmass::Aufmass;
use context::RenderState;
use defaults::{
    CLEARANCE_BOTTOM, CLEARANCE_SIDE, DIM_OFFSET_FRONT, EPS_DRAW, EPS_LEN, PLAN_SHIFT, TRENCH_GAP,
};
use elevation::GokSide;
use geometry::{band, rect};
use pipe::ProfileSegment;

/// Typed views over a flat element list, preserving original order.
/// All lookups are pure; the renderer queries them repeatedly.
pub struct Buckets<'a> {
    pub trenches: Vec<&'a TrenchSpec>,
    pub pipes: Vec<&'a PipeSpec>,
    pub surfaces: Vec<&'a SurfaceSpec>,
    pub passages: Vec<&'a PassageSpec>,
    /// Seams carrying a plain connection.
    pub join_seams: HashSet<usize>,
    /// Youngest manual Aufmaß override, trimmed; `None` when absent or empty.
    pub manual_lines: Option<Vec<String>>,
}

impl<'a> Buckets<'a> {
    pub fn collect(elements: &'a [Element]) -> Self {
        let mut trenches = Vec::new();
        let mut pipes = Vec::new();
        let mut surfaces = Vec::new();
        let mut passages = Vec::new();
        let mut join_seams = HashSet::new();
        let mut manual_lines = None;
        for e in elements {
            match e {
                Element::Trench(t) => trenches.push(t),
                Element::Pipe(p) => pipes.push(p),
                Element::Surface(s) => surfaces.push(s),
                Element::Passage(p) => passages.push(p),
                Element::Connection(c) => {
                    if let Some(b) = c.between {
                        join_seams.insert(b);
                    }
                }
                Element::AufmassOverride(o) => {
                    let lines: Vec<String> = o
                        .lines
                        .iter()
                        .map(|l| l.trim().to_string())
                        .filter(|l| !l.is_empty())
                        .collect();
                    // youngest override wins, even an empty one
                    manual_lines = if lines.is_empty() { None } else { Some(lines) };
                }
            }
        }
        Buckets {
            trenches,
            pipes,
            surfaces,
            passages,
            join_seams,
            manual_lines,
        }
    }

    /// Surface segments owned by trench `n`, ordered by `seq` when any
    /// segment carries one, else in original order.
    pub fn surfaces_for(&self, n: usize) -> Vec<&'a SurfaceSpec> {
        let mut list: Vec<&'a SurfaceSpec> = self
            .surfaces
            .iter()
            .copied()
            .filter(|s| s.for_trench == n)
            .collect();
        if list.iter().any(|s| s.seq.is_some()) {
            list.sort_by_key(|s| s.seq.unwrap_or(1));
        }
        list
    }

    /// First pipe owned by trench `n`; only the first is ever drawn.
    pub fn first_pipe_for(&self, n: usize) -> Option<&'a PipeSpec> {
        self.pipes.iter().copied().find(|p| p.for_trench == n)
    }

    /// Passage at a seam. Prefers the `between` field; when no passage in
    /// the list uses it, falls back to the legacy positional lookup
    /// (passage k belongs to seam k).
    pub fn passage_at(&self, seam: usize) -> Option<&'a PassageSpec> {
        if self.passages.iter().any(|p| p.between.is_some()) {
            self.passages
                .iter()
                .copied()
                .find(|p| p.between == Some(seam))
        } else {
            seam.checked_sub(1)
                .and_then(|k| self.passages.get(k))
                .copied()
        }
    }

    /// Any passage or connection at this seam?
    pub fn link_at(&self, seam: usize) -> bool {
        self.passage_at(seam).is_some() || self.join_seams.contains(&seam)
    }

    /// A plain connection without a passage at this seam?
    pub fn join_only_at(&self, seam: usize) -> bool {
        self.join_seams.contains(&seam) && self.passage_at(seam).is_none()
    }
}

/// Render a normalized element list into the sink; returns the Aufmaß text.
pub fn render<S: DrawingSink>(
    sink: &mut S,
    elements: &[Element],
) -> Result<String, GenerateError> {
    let buckets = Buckets::collect(elements);
    if buckets.trenches.is_empty() {
        return Err(GenerateError::NoTrenches);
    }

    let max_depth = buckets
        .trenches
        .iter()
        .map(|t| t.depths().0)
        .fold(0.0, f64::max);
    let max_gok = buckets.trenches.iter().map(|t| t.gok).fold(0.0, f64::max);
    let y_plan = CLEARANCE_BOTTOM + PLAN_SHIFT + max_depth + max_gok.max(0.0);

    let renderer = Renderer {
        sink,
        buckets,
        st: RenderState::new(),
        survey: Aufmass::new(),
        max_depth,
        y_plan,
    };
    renderer.run()
}

struct Renderer<'a, S: DrawingSink> {
    sink: &'a mut S,
    buckets: Buckets<'a>,
    st: RenderState,
    survey: Aufmass,
    max_depth: f64,
    y_plan: f64,
}

impl<S: DrawingSink> Renderer<'_, S> {
    /// Baseline Y of a trench's inner floor reference: with no slope and
    /// no GOK every ceiling lands on `CLEARANCE_BOTTOM + max_depth`.
    fn base_y(&self, t: &TrenchSpec) -> f64 {
        CLEARANCE_BOTTOM + (self.max_depth - t.depths().0) + t.gok
    }

    fn line(&mut self, a: DVec2, b: DVec2, layer: Layer) {
        self.sink.add_outline(&[a, b], layer, false);
    }

    fn run(mut self) -> Result<String, GenerateError> {
        let n = self.buckets.trenches.len();
        for i in 0..n {
            if i + 1 < n && self.buckets.link_at(i + 1) {
                self.render_merge(i)?;
            } else {
                self.render_solo(i);
            }
        }

        let manual = self.buckets.manual_lines.take();
        let text = self.survey.into_text(manual.as_deref());
        self.sink.add_text_block(
            &format!("Aufmaß:\n{text}"),
            dvec2(0.0, -3.0),
            Layer::TrenchOuter,
        );
        Ok(text)
    }

    /// Trench `i` with no link to its right neighbor.
    fn render_solo(&mut self, i: usize) {
        // The right trench of the previous merge is already fully drawn.
        if self.st.skip_single_next {
            self.st.skip_single_next = false;
            return;
        }

        let bg = self.buckets.trenches[i];
        let nr = i + 1;
        let (t_ref, t_left, t_right) = bg.depths();
        let x_start = self
            .st
            .committed_x
            .get(&i)
            .copied()
            .unwrap_or(self.st.cursor_x);
        let base = self.base_y(bg);

        elevation::draw_trench_front(
            self.sink,
            dvec2(x_start, base - CLEARANCE_BOTTOM),
            bg.length,
            t_ref,
            t_left,
            t_right,
            CLEARANCE_SIDE,
            CLEARANCE_BOTTOM,
        );

        if !self.st.drawn_top.contains(&nr) {
            plan::draw_trench_top(
                self.sink,
                dvec2(x_start + CLEARANCE_SIDE, self.y_plan),
                bg.length,
                bg.width,
                false,
                false,
                nr == self.buckets.trenches.len(),
            );
            self.st.drawn_top.insert(nr);
        }

        if let Some(p) = self.buckets.first_pipe_for(nr) {
            if p.diameter > 0.0 && !self.st.drawn_pipe.contains(&nr) {
                let want = if p.wants_full_span() { None } else { p.length };
                let eff = pipe::draw_pipe_front(
                    self.sink,
                    x_start + CLEARANCE_SIDE,
                    bg.length,
                    p.diameter,
                    want,
                    p.offset,
                    base + (t_ref - t_left),
                    base + (t_ref - t_right),
                );
                if eff > 0.0 {
                    self.survey.pipe(nr, eff, p.diameter, p.offset);
                    self.st.drawn_pipe.insert(nr);
                }
            }
        }

        let segments = self.buckets.surfaces_for(nr);
        if !segments.is_empty() && !self.st.drawn_surface.contains(&nr) {
            if segments.iter().any(|s| s.length.unwrap_or(0.0) > 0.0) {
                plan::draw_surface_top_segments(
                    self.sink,
                    dvec2(x_start + CLEARANCE_SIDE, self.y_plan),
                    bg.length,
                    bg.width,
                    &segments,
                    false,
                    false,
                );
                self.survey
                    .surface_segments(nr, &segments, bg.length, bg.width, true, true);
            } else {
                let offset = segments[0].offset;
                if offset > 0.0 {
                    plan::draw_surface_top(
                        self.sink,
                        dvec2(x_start + CLEARANCE_SIDE, self.y_plan),
                        bg.length,
                        bg.width,
                        offset,
                        false,
                        false,
                    );
                    self.survey.surface_single(
                        nr,
                        offset,
                        bg.length + 2.0 * offset,
                        bg.width + 2.0 * offset,
                        &segments[0].material,
                    );
                }
            }
            self.st.drawn_surface.insert(nr);
        }

        if !self.st.printed_trench.contains(&nr) {
            self.survey
                .trench(nr, bg.length, bg.width, (t_ref, t_left, t_right), bg.gok);
            self.st.printed_trench.insert(nr);
        }

        self.st.committed_x.entry(i).or_insert(x_start);
        self.st.cursor_x = self
            .st
            .cursor_x
            .max(x_start + bg.length + 2.0 * CLEARANCE_SIDE + TRENCH_GAP);
    }

    /// Trenches `i` and `i + 1` joined by a passage or plain connection.
    fn render_merge(&mut self, i: usize) -> Result<(), GenerateError> {
        let n = self.buckets.trenches.len();
        let seam = i + 1;
        let bg1 = self.buckets.trenches[i];
        let bg2 = self.buckets.trenches[i + 1];
        let (l1, b1) = (bg1.length, bg1.width);
        let (l2, b2) = (bg2.length, bg2.width);
        let (t1, t1l, t1r) = bg1.depths();
        let (t2, t2l, t2r) = bg2.depths();

        // A passage beats a connection at the same seam; with no passage
        // this merge is a plain join with zero gap width.
        let passage = self.buckets.passage_at(seam);
        let join_only = passage.is_none();
        let p_w = match passage {
            Some(p) => p
                .length
                .ok_or(GenerateError::MissingPassageLength { seam })?,
            None => 0.0,
        };

        // A linked side is an internal boundary and loses its clearance.
        let linked_left = i > 0 && self.buckets.link_at(i);
        let linked_right = i + 2 < n && self.buckets.link_at(i + 2);
        let left_clear = if linked_left { 0.0 } else { CLEARANCE_SIDE };
        let right_clear = if linked_right { 0.0 } else { CLEARANCE_SIDE };

        let join_l = i > 0 && self.buckets.join_only_at(i);
        let join_r = i + 2 < n && self.buckets.join_only_at(i + 2);

        let base_l = self.base_y(bg1);
        let base_r = self.base_y(bg2);
        let y_top_l = base_l + t1;
        let y_top_r = base_r + t2;

        let x_start = self
            .st
            .committed_x
            .get(&i)
            .copied()
            .unwrap_or(self.st.cursor_x);
        let x_l = x_start;
        let x_inner_left = x_start + left_clear;
        let x_seam = x_inner_left + l1;
        let x_right_start = x_seam + p_w;
        let x_inner_right = x_right_start + l2;
        let x_r = x_inner_right + right_clear;

        // ----- plan view -------------------------------------------------
        if !self.st.drawn_top.contains(&(i + 1)) {
            plan::draw_trench_top(
                self.sink,
                dvec2(x_inner_left, self.y_plan),
                l1,
                b1,
                join_l,
                join_only,
                false,
            );
            self.st.drawn_top.insert(i + 1);
        }
        if !self.st.drawn_top.contains(&(i + 2)) {
            plan::draw_trench_top(
                self.sink,
                dvec2(x_right_start, self.y_plan),
                l2,
                b2,
                join_only,
                join_r,
                i + 2 == n,
            );
            self.st.drawn_top.insert(i + 2);
        }

        // GOK dimensions exist only for merged trenches, where the shifted
        // ceiling is a visible discontinuity.
        let y_gok_ref = CLEARANCE_BOTTOM + self.max_depth;
        if bg1.gok.abs() > EPS_LEN && !self.st.printed_gok.contains(&(i + 1)) {
            elevation::add_gok_dim(
                self.sink,
                x_inner_left,
                y_top_l,
                bg1.gok,
                GokSide::Left,
                y_gok_ref,
            );
            self.st.printed_gok.insert(i + 1);
        }
        if bg2.gok.abs() > EPS_LEN && !self.st.printed_gok.contains(&(i + 2)) {
            elevation::add_gok_dim(
                self.sink,
                x_inner_right,
                y_top_r,
                bg2.gok,
                GokSide::Right,
                y_gok_ref,
            );
            self.st.printed_gok.insert(i + 2);
        }

        // Plan seam line: only the step band where the widths differ; the
        // overlapping band stays open.
        if join_only && (b1 - b2).abs() > EPS_LEN {
            let y_lo = self.y_plan + b1.min(b2);
            let y_hi = self.y_plan + b1.max(b2);
            if y_hi - y_lo > EPS_LEN {
                self.line(dvec2(x_seam, y_lo), dvec2(x_seam, y_hi), Layer::TrenchOuter);
            }
        }

        // ----- surfaces --------------------------------------------------
        let segments_l = self.buckets.surfaces_for(i + 1);
        if !segments_l.is_empty() && !self.st.drawn_surface.contains(&(i + 1)) {
            if segments_l.iter().any(|s| s.length.unwrap_or(0.0) > 0.0) {
                plan::draw_surface_top_segments(
                    self.sink,
                    dvec2(x_inner_left, self.y_plan),
                    l1,
                    b1,
                    &segments_l,
                    join_l,
                    join_only,
                );
                self.survey
                    .surface_segments(i + 1, &segments_l, l1, b1, !join_l, false);
            } else {
                let offset = segments_l[0].offset;
                if offset > 0.0 {
                    plan::draw_surface_top(
                        self.sink,
                        dvec2(x_inner_left, self.y_plan),
                        l1,
                        b1,
                        offset,
                        join_l,
                        join_only,
                    );
                    self.survey.surface_single(
                        i + 1,
                        offset,
                        l1 + 2.0 * offset,
                        b1 + 2.0 * offset,
                        &segments_l[0].material,
                    );
                }
            }
            self.st.drawn_surface.insert(i + 1);
        }

        let segments_r = self.buckets.surfaces_for(i + 2);
        if !segments_r.is_empty() && !self.st.drawn_surface.contains(&(i + 2)) {
            if segments_r.iter().any(|s| s.length.unwrap_or(0.0) > 0.0) {
                plan::draw_surface_top_segments(
                    self.sink,
                    dvec2(x_right_start, self.y_plan),
                    l2,
                    b2,
                    &segments_r,
                    join_only,
                    join_r,
                );
                self.survey
                    .surface_segments(i + 2, &segments_r, l2, b2, false, !join_r);
            } else {
                let offset = segments_r[0].offset;
                if offset > 0.0 {
                    plan::draw_surface_top(
                        self.sink,
                        dvec2(x_right_start, self.y_plan),
                        l2,
                        b2,
                        offset,
                        join_only,
                        join_r,
                    );
                    self.survey.surface_single(
                        i + 2,
                        offset,
                        l2 + 2.0 * offset,
                        b2 + 2.0 * offset,
                        &segments_r[0].material,
                    );
                }
            }
            self.st.drawn_surface.insert(i + 2);
        }

        // ----- elevation: inner contours ---------------------------------
        elevation::draw_inner_walls(
            self.sink,
            x_inner_left,
            base_l,
            l1,
            t1,
            t1l,
            t1r,
            !linked_left,
            false,
        );
        elevation::draw_inner_walls(
            self.sink,
            x_right_start,
            base_r,
            l2,
            t2,
            t2l,
            t2r,
            false,
            !linked_right,
        );

        // Floor levels at both ends of both trenches.
        let y_in_l_left = base_l + (t1 - t1l);
        let y_in_l_right = base_l + (t1 - t1r);
        let y_in_r_left = base_r + (t2 - t2l);
        let y_in_r_right = base_r + (t2 - t2r);
        let y_out_l_left = y_in_l_left - CLEARANCE_BOTTOM;
        let y_out_l_right = y_in_l_right - CLEARANCE_BOTTOM;
        let y_out_r_left = y_in_r_left - CLEARANCE_BOTTOM;
        let y_out_r_right = y_in_r_right - CLEARANCE_BOTTOM;

        // ----- elevation: outer contour ----------------------------------
        if !linked_left {
            self.line(
                dvec2(x_l, y_out_l_left),
                dvec2(x_l, y_top_l),
                Layer::TrenchOuter,
            );
        }
        if !linked_right {
            self.line(
                dvec2(x_r, y_out_r_right),
                dvec2(x_r, y_top_r),
                Layer::TrenchOuter,
            );
        }

        // Ceiling pieces end exactly at the seam edges; the higher ceiling
        // bridges a real gap.
        let has_top_step = (y_top_l - y_top_r).abs() > EPS_LEN;
        self.line(
            dvec2(x_l, y_top_l),
            dvec2(x_seam, y_top_l),
            Layer::TrenchOuter,
        );
        self.line(
            dvec2(x_right_start, y_top_r),
            dvec2(x_r, y_top_r),
            Layer::TrenchOuter,
        );
        if has_top_step {
            let (y_lo, y_hi) = (y_top_l.min(y_top_r), y_top_l.max(y_top_r));
            self.line(dvec2(x_seam, y_lo), dvec2(x_seam, y_hi), Layer::TrenchOuter);
            if !join_only {
                self.line(
                    dvec2(x_right_start, y_lo),
                    dvec2(x_right_start, y_hi),
                    Layer::TrenchOuter,
                );
            }
        }
        if x_right_start - x_seam > EPS_LEN {
            let y_bridge = y_top_l.max(y_top_r);
            self.line(
                dvec2(x_seam, y_bridge),
                dvec2(x_right_start, y_bridge),
                Layer::TrenchOuter,
            );
        }

        // Ceiling patch at the left neighbor seam when that neighbor is a
        // plain connection with a height step.
        if join_l {
            let bg0 = self.buckets.trenches[i - 1];
            let y_top0 = self.base_y(bg0) + bg0.depths().0;
            if (y_top0 - y_top_l).abs() > EPS_LEN {
                let top_off = if y_top0 <= y_top_l + EPS_LEN {
                    CLEARANCE_SIDE
                } else {
                    -CLEARANCE_SIDE
                };
                let x_from = (x_start + top_off).max(x_l);
                // never past the seam, against overhang into the gap
                let x_to = x_seam.min(x_right_start) - EPS_DRAW;
                if x_to - x_from > EPS_LEN {
                    self.line(dvec2(x_from, y_top_l), dvec2(x_to, y_top_l), Layer::TrenchOuter);
                }
            }
        }

        // Outer bottom: horizontal stubs at free ends only.
        if !linked_left {
            self.line(
                dvec2(x_l, y_out_l_left),
                dvec2(x_inner_left, y_out_l_left),
                Layer::TrenchOuter,
            );
        }
        if !linked_right {
            self.line(
                dvec2(x_inner_right, y_out_r_right),
                dvec2(x_r, y_out_r_right),
                Layer::TrenchOuter,
            );
        }

        // Outer step at the seam. For a connection both gap edges coincide,
        // so a single vertical suffices.
        let has_step = (y_out_l_right - y_out_r_left).abs() > EPS_LEN;
        let step_dir = if !has_step {
            0.0
        } else if y_out_l_right <= y_out_r_left + EPS_LEN {
            CLEARANCE_SIDE
        } else {
            -CLEARANCE_SIDE
        };
        let x_join_r = x_seam + step_dir;
        let x_step_out_r = x_right_start + step_dir;
        if has_step {
            let (y_lo, y_hi) = (
                y_out_l_right.min(y_out_r_left),
                y_out_l_right.max(y_out_r_left),
            );
            self.line(dvec2(x_join_r, y_lo), dvec2(x_join_r, y_hi), Layer::TrenchOuter);
        }

        // Left outer floor slope, clipped against the left neighbor step.
        let mut cap_left = 0.0;
        let mut step_dir_l = 0.0;
        let mut x_join_l = None;
        if join_l {
            let bg0 = self.buckets.trenches[i - 1];
            let (t0, _, t0r) = bg0.depths();
            let y_out_prev_right = self.base_y(bg0) + (t0 - t0r) - CLEARANCE_BOTTOM;
            if (y_out_prev_right - y_out_l_left).abs() > EPS_LEN {
                step_dir_l = if y_out_prev_right <= y_out_l_left + EPS_LEN {
                    CLEARANCE_SIDE
                } else {
                    -CLEARANCE_SIDE
                };
                x_join_l = Some(x_start + step_dir_l);
            }
            if step_dir_l > 0.0 {
                cap_left = CLEARANCE_SIDE;
            }
        }
        let x_l0 = match x_join_l {
            // the neighbor is deeper: pull the slope into its step vertical
            Some(xj) if step_dir_l < 0.0 => (x_inner_left - EPS_DRAW).min(xj),
            _ => x_inner_left + cap_left + if cap_left > 0.0 { EPS_DRAW } else { 0.0 },
        };
        if let Some((a, b)) = elevation::clip_slope(
            dvec2(x_inner_left, y_out_l_left),
            dvec2(x_join_r, y_out_l_right),
            x_l0,
            x_join_r,
        ) {
            self.line(a, b, Layer::TrenchOuter);
        }

        // Right outer floor slope, clipped against the next seam step.
        let x_r0 = if join_only && has_step {
            x_step_out_r - EPS_DRAW
        } else {
            x_join_r
        };
        let mut x_r1 = x_inner_right;
        if join_r {
            let bg3 = self.buckets.trenches[i + 2];
            let (t3, t3l, _) = bg3.depths();
            let y_out_next_left = self.base_y(bg3) + (t3 - t3l) - CLEARANCE_BOTTOM;
            let x_seam_next = x_right_start + l2;
            if (y_out_r_right - y_out_next_left).abs() > EPS_LEN {
                let step_dir_next = if y_out_r_right <= y_out_next_left + EPS_LEN {
                    CLEARANCE_SIDE
                } else {
                    -CLEARANCE_SIDE
                };
                if step_dir_next < 0.0 {
                    x_r1 = x_r1.min(x_seam_next + step_dir_next - EPS_DRAW);
                }
            } else {
                x_r1 = x_r1.min(x_seam_next - EPS_DRAW);
            }
        }
        if let Some((a, b)) = elevation::clip_slope(
            dvec2(x_join_r, y_out_r_left),
            dvec2(x_inner_right, y_out_r_right),
            x_r0,
            x_r1,
        ) {
            self.line(a, b, Layer::TrenchOuter);
        }

        // Inner floors, with a vertical connector only when the floor
        // heights at the seam differ.
        self.line(
            dvec2(x_inner_left, y_in_l_left),
            dvec2(x_seam, y_in_l_right),
            Layer::TrenchInner,
        );
        self.line(
            dvec2(x_seam, y_in_r_left),
            dvec2(x_inner_right, y_in_r_right),
            Layer::TrenchInner,
        );
        if (y_in_l_right - y_in_r_left).abs() > EPS_LEN {
            let (y_lo, y_hi) = (
                y_in_l_right.min(y_in_r_left),
                y_in_l_right.max(y_in_r_left),
            );
            self.line(dvec2(x_seam, y_lo), dvec2(x_seam, y_hi), Layer::TrenchInner);
        }

        // ----- soil hatching ---------------------------------------------
        if left_clear > EPS_LEN {
            elevation::hatch_quad(
                self.sink,
                rect(x_start, y_out_l_left, x_start + left_clear, y_top_l),
            );
        }
        if right_clear > EPS_LEN {
            elevation::hatch_quad(
                self.sink,
                rect(x_r - right_clear, y_out_r_right, x_r, y_top_r),
            );
        }
        elevation::hatch_quad(
            self.sink,
            band(
                x_inner_left,
                y_out_l_left,
                x_seam,
                y_out_l_right,
                y_in_l_right,
                y_in_l_left,
            ),
        );
        // the right bottom band closes the cluster; internal seams get it
        // from the next iteration
        if !linked_right {
            elevation::hatch_quad(
                self.sink,
                band(
                    x_seam,
                    y_out_r_left,
                    x_inner_right,
                    y_out_r_right,
                    y_in_r_right,
                    y_in_r_left,
                ),
            );
        }
        if join_only && has_step {
            let (x0, x1) = (x_seam.min(x_join_r), x_seam.max(x_join_r));
            let (y_lo, y_hi) = (
                y_out_l_right.min(y_out_r_left),
                y_out_l_right.max(y_out_r_left),
            );
            elevation::hatch_quad(self.sink, rect(x0, y_lo, x1, y_hi));
        }

        // ----- passage block ---------------------------------------------
        if let Some(p) = passage {
            let y_ref = y_top_l.max(y_top_r);
            elevation::draw_pass_symbol(
                self.sink,
                x_seam,
                x_right_start,
                y_ref,
                p.pattern.as_deref(),
            );
            elevation::add_pass_len_dim(self.sink, x_seam, x_right_start, y_ref);
        }

        // ----- pipes -----------------------------------------------------
        // One continuous pipe per cluster, drawn from the left-most
        // unmerged trench across all links until a true gap.
        if !linked_left {
            let (last, _span, profile) = self.cluster_extent(i);
            let cluster_pipe = (i..=last).find_map(|k| {
                self.buckets
                    .first_pipe_for(k + 1)
                    .filter(|p| p.wants_full_span())
            });
            if let Some(p) = cluster_pipe {
                if p.diameter > 0.0 {
                    let eff = pipe::draw_pipe_front_piecewise(
                        self.sink,
                        x_inner_left,
                        p.diameter,
                        &profile,
                        p.offset,
                    );
                    if eff > 0.0 {
                        self.survey.pipe_span(i + 1, last + 1, eff, p.diameter, p.offset);
                        for k in i..=last {
                            self.st.drawn_pipe.insert(k + 1);
                        }
                    }
                }
            }
        }

        // Explicit-length pipes of either side, within their own trench.
        for (nr, x_origin, inner_len, floor_a, floor_b) in [
            (i + 1, x_inner_left, l1, y_in_l_left, y_in_l_right),
            (i + 2, x_right_start, l2, y_in_r_left, y_in_r_right),
        ] {
            if let Some(p) = self.buckets.first_pipe_for(nr) {
                if p.diameter > 0.0 && !self.st.drawn_pipe.contains(&nr) {
                    let want = if p.wants_full_span() { None } else { p.length };
                    let eff = pipe::draw_pipe_front(
                        self.sink,
                        x_origin,
                        inner_len,
                        p.diameter,
                        want,
                        p.offset,
                        floor_a,
                        floor_b,
                    );
                    if eff > 0.0 {
                        self.survey.pipe(nr, eff, p.diameter, p.offset);
                        self.st.drawn_pipe.insert(nr);
                    }
                }
            }
        }

        // ----- depth dimensions ------------------------------------------
        // Bases sit outside the merge so neighboring merges cannot overlap.
        if !self.st.printed_depth.contains(&(i + 1)) {
            if (t1l - t1r).abs() < EPS_LEN {
                elevation::add_depth_dim(
                    self.sink,
                    x_inner_left,
                    y_top_l,
                    t1l,
                    x_inner_left - DIM_OFFSET_FRONT,
                );
            } else {
                elevation::add_depth_dim(
                    self.sink,
                    x_inner_left,
                    y_top_l,
                    t1l,
                    x_inner_left - DIM_OFFSET_FRONT,
                );
                elevation::add_depth_dim(
                    self.sink,
                    x_seam,
                    y_top_l,
                    t1r,
                    x_seam - DIM_OFFSET_FRONT,
                );
            }
            self.st.printed_depth.insert(i + 1);
        }
        if !self.st.printed_depth.contains(&(i + 2)) {
            if (t2l - t2r).abs() < EPS_LEN {
                elevation::add_depth_dim(
                    self.sink,
                    x_inner_right,
                    y_top_r,
                    t2r,
                    x_inner_right + DIM_OFFSET_FRONT,
                );
            } else {
                elevation::add_depth_dim(
                    self.sink,
                    x_seam,
                    y_top_r,
                    t2l,
                    x_seam + DIM_OFFSET_FRONT,
                );
                elevation::add_depth_dim(
                    self.sink,
                    x_inner_right,
                    y_top_r,
                    t2r,
                    x_inner_right + DIM_OFFSET_FRONT,
                );
            }
            self.st.printed_depth.insert(i + 2);
        }

        // ----- Aufmaß ----------------------------------------------------
        if !self.st.printed_trench.contains(&(i + 1)) {
            self.survey.trench(i + 1, l1, b1, (t1, t1l, t1r), bg1.gok);
            self.st.printed_trench.insert(i + 1);
        }
        if !self.st.printed_trench.contains(&(i + 2)) {
            self.survey.trench(i + 2, l2, b2, (t2, t2l, t2r), bg2.gok);
            self.st.printed_trench.insert(i + 2);
        }
        if passage.is_some() && !self.st.printed_pass.contains(&seam) {
            self.survey.passage(seam, p_w);
            self.st.printed_pass.insert(seam);
        }

        // ----- bookkeeping -----------------------------------------------
        self.st.committed_x.insert(i, x_start);
        self.st.committed_x.insert(i + 1, x_right_start);
        self.st.cursor_x = self
            .st
            .cursor_x
            .max(x_inner_right + right_clear + TRENCH_GAP);
        self.st.skip_single_next = true;
        Ok(())
    }

    /// Rightward extent of the contiguous cluster starting at `start`:
    /// last trench index, total horizontal span, and the floor profile
    /// (trench floors plus passage spans at the preceding floor height).
    /// Connections extend the cluster without adding span.
    fn cluster_extent(&self, start: usize) -> (usize, f64, Vec<ProfileSegment>) {
        let n = self.buckets.trenches.len();
        let mut span = 0.0;
        let mut profile = Vec::new();
        let mut k = start;
        loop {
            let bg = self.buckets.trenches[k];
            let (t, t_left, t_right) = bg.depths();
            let base = self.base_y(bg);
            let y_left = base + (t - t_left);
            let y_right = base + (t - t_right);
            span += bg.length;
            if bg.length > EPS_LEN {
                profile.push(ProfileSegment {
                    length: bg.length,
                    y_left,
                    y_right,
                });
            }

            let seam = k + 1;
            if k + 1 >= n {
                break;
            }
            if self.buckets.join_seams.contains(&seam) {
                k += 1;
                continue;
            }
            if let Some(p) = self.buckets.passage_at(seam) {
                let p_w = p.length.unwrap_or(0.0);
                span += p_w;
                if p_w > EPS_LEN {
                    profile.push(ProfileSegment {
                        length: p_w,
                        y_left: y_right,
                        y_right,
                    });
                }
                k += 1;
                continue;
            }
            break;
        }
        (k, span, profile)
    }
}
