//! Plan-view renderer: trench rectangles and surface-restoration zones.
//!
//! Edges are drawn individually so a side shared with a plain connection
//! can be clipped (left invisible); a real passage never clips, the gap
//! is visually evident.

use glam::{DVec2, dvec2};

use crate::elements::SurfaceSpec;
use crate::sink::{DrawingSink, Layer, LinearDimension};

use super::defaults::{
    DIM_EXT_OFFSET, DIM_OFFSET_PLAN, DIM_TEXT_HEIGHT, EPS_LEN, PLAN_LENGTH_DIM_EXTRA,
    SURFACE_DIM_OFFSET, SURFACE_DIM_STACK, SURFACE_SEG_DIM_EXTRA,
};

fn dim(base: DVec2, p1: DVec2, p2: DVec2, angle_deg: f64, layer: Layer) -> LinearDimension {
    LinearDimension {
        base,
        p1,
        p2,
        angle_deg,
        layer,
        text_height: DIM_TEXT_HEIGHT,
        extension_offset: DIM_EXT_OFFSET,
        text: None,
    }
}

/// Trench rectangle in the plan view, with optional side clipping and the
/// width dimension on the left (or right, for the last trench overall).
pub fn draw_trench_top(
    sink: &mut impl DrawingSink,
    top_left: DVec2,
    length: f64,
    width: f64,
    clip_left: bool,
    clip_right: bool,
    dim_right: bool,
) {
    let (x, y) = (top_left.x, top_left.y);

    sink.add_outline(
        &[dvec2(x, y), dvec2(x + length, y)],
        Layer::TrenchOuter,
        false,
    );
    sink.add_outline(
        &[dvec2(x, y + width), dvec2(x + length, y + width)],
        Layer::TrenchOuter,
        false,
    );
    if !clip_left {
        sink.add_outline(
            &[dvec2(x, y), dvec2(x, y + width)],
            Layer::TrenchOuter,
            false,
        );
    }
    if !clip_right {
        sink.add_outline(
            &[dvec2(x + length, y), dvec2(x + length, y + width)],
            Layer::TrenchOuter,
            false,
        );
    }

    let y_top = y + width;
    sink.add_linear_dimension(&dim(
        dvec2(x, y_top + DIM_OFFSET_PLAN + PLAN_LENGTH_DIM_EXTRA),
        dvec2(x, y_top),
        dvec2(x + length, y_top),
        0.0,
        Layer::TrenchOuter,
    ));

    let vx = if dim_right { x + length } else { x };
    let base_x = if dim_right {
        vx + DIM_OFFSET_PLAN
    } else {
        x - DIM_OFFSET_PLAN
    };
    sink.add_linear_dimension(&dim(
        dvec2(base_x, y),
        dvec2(vx, y),
        dvec2(vx, y + width),
        90.0,
        Layer::TrenchOuter,
    ));
}

/// Uniform surface-restoration zone: one dashed rectangle `offset` outside
/// the trench footprint, clipped flush on internal sides.
pub fn draw_surface_top(
    sink: &mut impl DrawingSink,
    trench_top_left: DVec2,
    trench_length: f64,
    trench_width: f64,
    offset: f64,
    clip_left: bool,
    clip_right: bool,
) {
    let (tlx, tly) = (trench_top_left.x, trench_top_left.y);
    let left = if clip_left { tlx } else { tlx - offset };
    let right = if clip_right {
        tlx + trench_length
    } else {
        tlx + trench_length + offset
    };
    let outer_top = tly + trench_width + offset;
    let outer_bot = tly - offset;

    sink.add_outline(
        &[
            dvec2(left, outer_bot),
            dvec2(right, outer_bot),
            dvec2(right, outer_top),
            dvec2(left, outer_top),
        ],
        Layer::Surface,
        true,
    );

    // Border-zone dimension only at the free left end.
    if offset > EPS_LEN && !clip_left {
        sink.add_linear_dimension(&dim(
            dvec2(left - SURFACE_DIM_OFFSET, outer_top),
            dvec2(left, outer_top),
            dvec2(left, outer_bot),
            90.0,
            Layer::SurfaceDim,
        ));
    }

    sink.add_linear_dimension(&dim(
        dvec2((left + right) / 2.0, outer_top + SURFACE_DIM_OFFSET + SURFACE_DIM_STACK),
        dvec2(left, outer_top),
        dvec2(right, outer_top),
        0.0,
        Layer::SurfaceDim,
    ));
}

/// One normalized surface segment: consumed length and border offset.
struct Segment {
    length: f64,
    offset: f64,
}

/// Clamp the raw segment lengths against the trench length: a shortfall
/// extends the last segment, an overflow clips it.
fn normalize_segments(segments: &[&SurfaceSpec], trench_length: f64) -> Vec<Segment> {
    let mut norm: Vec<Segment> = segments
        .iter()
        .map(|s| Segment {
            length: s.length.unwrap_or(0.0).max(0.0),
            offset: s.offset.max(0.0),
        })
        .collect();
    let total: f64 = norm.iter().map(|s| s.length).sum();
    if let Some(last) = norm.last_mut() {
        if total < trench_length {
            last.length += trench_length - total;
        } else if total > trench_length {
            last.length = (last.length - (total - trench_length)).max(0.0);
        }
    }
    norm
}

/// Stepped surface-restoration polygon: each segment may use a different
/// border offset, producing a staircase outline, plus per-segment length
/// and width dimensions.
pub fn draw_surface_top_segments(
    sink: &mut impl DrawingSink,
    trench_top_left: DVec2,
    trench_length: f64,
    trench_width: f64,
    segments: &[&SurfaceSpec],
    clip_left: bool,
    clip_right: bool,
) {
    if segments.is_empty() {
        return;
    }
    let (tlx, tly) = (trench_top_left.x, trench_top_left.y);
    let w = trench_width;
    let norm = normalize_segments(segments, trench_length);

    // Cumulative inner boundaries, ending at the trench length.
    let mut boundaries = vec![0.0];
    let mut acc = 0.0;
    for seg in &norm {
        acc += seg.length;
        boundaries.push(acc);
    }

    let off0 = norm[0].offset;
    let off_last = norm[norm.len() - 1].offset;
    let x_left_outer = if clip_left { tlx } else { tlx - off0 };
    let x_right_outer = if clip_right {
        tlx + trench_length
    } else {
        tlx + trench_length + off_last
    };

    // Bottom path left→right with steps, then the top path back.
    let mut pts = vec![dvec2(x_left_outer, tly - off0)];
    for j in 0..norm.len() - 1 {
        let x_step = tlx + boundaries[j + 1];
        pts.push(dvec2(x_step, tly - norm[j].offset));
        pts.push(dvec2(x_step, tly - norm[j + 1].offset));
    }
    pts.push(dvec2(x_right_outer, tly - off_last));
    pts.push(dvec2(x_right_outer, tly + w + off_last));
    for j in (0..norm.len() - 1).rev() {
        let x_step = tlx + boundaries[j + 1];
        pts.push(dvec2(x_step, tly + w + norm[j + 1].offset));
        pts.push(dvec2(x_step, tly + w + norm[j].offset));
    }
    pts.push(dvec2(x_left_outer, tly + w + off0));
    sink.add_outline(&pts, Layer::Surface, true);

    // Per-segment length dimensions; free outer ends extend by the border
    // zone, internal seam ends do not.
    let max_off = norm.iter().map(|s| s.offset).fold(0.0, f64::max);
    let y_dim = tly + w + max_off + SURFACE_DIM_OFFSET + SURFACE_SEG_DIM_EXTRA;
    for (j, seg) in norm.iter().enumerate() {
        let mut x1 = tlx + boundaries[j];
        let mut x2 = tlx + boundaries[j + 1];
        if j == 0 && !clip_left {
            x1 -= seg.offset;
        }
        if j == norm.len() - 1 && !clip_right {
            x2 += seg.offset;
        }
        let y_ref = tly + w + seg.offset;
        sink.add_linear_dimension(&dim(
            dvec2((x1 + x2) / 2.0, y_dim),
            dvec2(x1, y_ref),
            dvec2(x2, y_ref),
            0.0,
            Layer::SurfaceDim,
        ));
    }

    // Per-segment width dimensions (trench width + both border zones).
    for (j, seg) in norm.iter().enumerate() {
        if seg.offset <= EPS_LEN {
            continue;
        }
        let cx = (tlx + boundaries[j] + tlx + boundaries[j + 1]) / 2.0;
        let top_y = tly - seg.offset;
        let bot_y = tly + w + seg.offset;
        sink.add_linear_dimension(&dim(
            dvec2(cx, (top_y + bot_y) / 2.0),
            dvec2(cx, bot_y),
            dvec2(cx, top_y),
            90.0,
            Layer::SurfaceDim,
        ));
    }
}
