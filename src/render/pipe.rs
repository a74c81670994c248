//! Pipe cross-sections in the elevation view.
//!
//! A pipe lies on the trench floor and keeps [`PIPE_SIDE_CLEARANCE`] to
//! both walls. The floor may slope within one trench and may jump at
//! merge seams; a cluster-spanning pipe follows the whole piecewise floor
//! profile as a single shape. Both drawers return the effective horizontal
//! span; a span at or below [`EPS_DRAW`] draws nothing and returns 0.

use glam::{DVec2, dvec2};

use crate::sink::{DrawingSink, Layer, LinearDimension};

use super::defaults::{
    DIM_EXT_OFFSET, DIM_TEXT_HEIGHT, EPS_DRAW, EPS_LEN, PIPE_DIM_OFFSET, PIPE_SIDE_CLEARANCE,
};
use super::geometry::y_on_line;

fn length_dim(p1: DVec2, p2: DVec2) -> LinearDimension {
    LinearDimension {
        base: dvec2(p1.x, p1.y.min(p2.y) - PIPE_DIM_OFFSET),
        p1,
        p2,
        angle_deg: 0.0,
        layer: Layer::PipeDim,
        text_height: DIM_TEXT_HEIGHT,
        extension_offset: DIM_EXT_OFFSET,
        text: None,
    }
}

/// One profile piece of a cluster floor: horizontal extent plus the floor
/// height at its left and right end.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProfileSegment {
    pub length: f64,
    pub y_left: f64,
    pub y_right: f64,
}

/// Straight pipe within one trench. `origin_x` is the trench's inner left
/// edge; the floor interpolates between `floor_left` and `floor_right`.
/// `span_length` limits the drawn length (`None` = full usable span),
/// `offset` shifts the start from the left wall.
#[allow(clippy::too_many_arguments)]
pub fn draw_pipe_front(
    sink: &mut impl DrawingSink,
    origin_x: f64,
    inner_length: f64,
    diameter: f64,
    span_length: Option<f64>,
    offset: f64,
    floor_left: f64,
    floor_right: f64,
) -> f64 {
    let left = origin_x + PIPE_SIDE_CLEARANCE + offset.max(0.0);
    let right_limit = origin_x + inner_length - PIPE_SIDE_CLEARANCE;
    let right = match span_length {
        Some(want) => (left + want).min(right_limit),
        None => right_limit,
    };
    let effective = right - left;
    if effective <= EPS_DRAW {
        crate::log::debug!("skipping pipe with zero usable span");
        return 0.0;
    }

    let floor_a = dvec2(origin_x, floor_left);
    let floor_b = dvec2(origin_x + inner_length, floor_right);
    let y0 = y_on_line(floor_a, floor_b, left);
    let y1 = y_on_line(floor_a, floor_b, right);

    sink.add_outline(
        &[
            dvec2(left, y0),
            dvec2(right, y1),
            dvec2(right, y1 + diameter),
            dvec2(left, y0 + diameter),
        ],
        Layer::Pipe,
        true,
    );
    sink.add_outline(
        &[
            dvec2(left, y0 + diameter / 2.0),
            dvec2(right, y1 + diameter / 2.0),
        ],
        Layer::PipeAxis,
        false,
    );
    sink.add_linear_dimension(&length_dim(dvec2(left, y0), dvec2(right, y1)));

    effective
}

/// Continuous pipe across a merged cluster, following the piecewise floor
/// profile (trench floors plus passage spans). `origin_x` is the cluster's
/// inner left edge. Drawn once as a single closed shape.
pub fn draw_pipe_front_piecewise(
    sink: &mut impl DrawingSink,
    origin_x: f64,
    diameter: f64,
    segments: &[ProfileSegment],
    offset: f64,
) -> f64 {
    let total: f64 = segments.iter().map(|s| s.length).sum();
    let start_s = PIPE_SIDE_CLEARANCE + offset.max(0.0);
    let end_s = total - PIPE_SIDE_CLEARANCE;
    let effective = end_s - start_s;
    if effective <= EPS_DRAW {
        crate::log::debug!("skipping cluster pipe with zero usable span");
        return 0.0;
    }

    // Bottom profile clipped to [start_s, end_s], in cluster-local x.
    let mut bottom: Vec<DVec2> = Vec::new();
    let mut push = |p: DVec2| {
        if bottom.last().is_none_or(|q| (*q - p).length() > EPS_LEN) {
            bottom.push(p);
        }
    };
    let mut acc = 0.0;
    for seg in segments {
        let (s0, s1) = (acc, acc + seg.length);
        acc = s1;
        if s1 <= start_s || s0 >= end_s {
            continue;
        }
        let a = dvec2(s0, seg.y_left);
        let b = dvec2(s1, seg.y_right);
        let x0 = s0.max(start_s);
        let x1 = s1.min(end_s);
        push(dvec2(x0, y_on_line(a, b, x0)));
        push(dvec2(x1, y_on_line(a, b, x1)));
    }
    if bottom.len() < 2 {
        return 0.0;
    }

    let mut outline: Vec<DVec2> = bottom
        .iter()
        .map(|p| dvec2(origin_x + p.x, p.y))
        .collect();
    let axis: Vec<DVec2> = outline
        .iter()
        .map(|p| dvec2(p.x, p.y + diameter / 2.0))
        .collect();
    let first = outline[0];
    let last = outline[outline.len() - 1];
    for p in bottom.iter().rev() {
        outline.push(dvec2(origin_x + p.x, p.y + diameter));
    }

    sink.add_outline(&outline, Layer::Pipe, true);
    sink.add_outline(&axis, Layer::PipeAxis, false);
    sink.add_linear_dimension(&length_dim(first, last));

    effective
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;

    #[test]
    fn full_span_keeps_side_clearances() {
        let mut sink = RecordingSink::new();
        let eff = draw_pipe_front(&mut sink, 0.2, 10.0, 0.15, None, 0.0, 0.2, 0.2);
        assert!((eff - 9.0).abs() < 1e-9);
        assert_eq!(sink.outlines_on(Layer::Pipe), 1);
        assert_eq!(sink.outlines_on(Layer::PipeAxis), 1);
        assert_eq!(sink.dimensions().count(), 1);
    }

    #[test]
    fn explicit_span_is_clamped_to_the_trench() {
        let mut sink = RecordingSink::new();
        let eff = draw_pipe_front(&mut sink, 0.0, 6.0, 0.15, Some(20.0), 0.0, 0.0, 0.0);
        assert!((eff - 5.0).abs() < 1e-9);
    }

    #[test]
    fn oversized_offset_draws_nothing() {
        let mut sink = RecordingSink::new();
        let eff = draw_pipe_front(&mut sink, 0.0, 6.0, 0.15, None, 5.5, 0.0, 0.0);
        assert_eq!(eff, 0.0);
        assert!(sink.ops.is_empty());
    }

    #[test]
    fn sloped_floor_tilts_the_pipe() {
        let mut sink = RecordingSink::new();
        draw_pipe_front(&mut sink, 0.0, 10.0, 0.2, None, 0.0, 1.0, 0.0);
        let Some(crate::sink::SinkOp::Outline { points, .. }) = sink.ops.first() else {
            panic!("expected outline");
        };
        // floor at x=0.5 is 0.95, at x=9.5 is 0.05
        assert!((points[0].y - 0.95).abs() < 1e-9);
        assert!((points[1].y - 0.05).abs() < 1e-9);
    }

    #[test]
    fn piecewise_profile_spans_passages() {
        let mut sink = RecordingSink::new();
        let segments = [
            ProfileSegment {
                length: 10.0,
                y_left: 1.2,
                y_right: 1.2,
            },
            ProfileSegment {
                length: 1.0,
                y_left: 1.2,
                y_right: 1.2,
            },
            ProfileSegment {
                length: 8.0,
                y_left: 0.2,
                y_right: 0.2,
            },
        ];
        let eff = draw_pipe_front_piecewise(&mut sink, 0.2, 0.15, &segments, 0.0);
        assert!((eff - 18.0).abs() < 1e-9);
        assert_eq!(sink.outlines_on(Layer::Pipe), 1);
        let Some(crate::sink::SinkOp::Outline { points, closed, .. }) = sink.ops.first() else {
            panic!("expected outline");
        };
        assert!(*closed);
        // bottom: start, seam end (jump at 11.0), end, plus the mirrored top
        assert!(points.len() >= 8);
    }

    #[test]
    fn degenerate_cluster_span_draws_nothing() {
        let mut sink = RecordingSink::new();
        let segments = [ProfileSegment {
            length: 0.9,
            y_left: 0.2,
            y_right: 0.2,
        }];
        let eff = draw_pipe_front_piecewise(&mut sink, 0.0, 0.15, &segments, 0.0);
        assert_eq!(eff, 0.0);
        assert!(sink.ops.is_empty());
    }
}
