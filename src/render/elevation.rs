//! Elevation-view renderer: trench contours, passage blocks, depth and
//! GOK dimensions, and the soil hatching between inner and outer contour.

use glam::{DVec2, dvec2};

use crate::sink::{DrawingSink, HatchFill, Layer, LinearDimension};

use super::defaults::{
    CLEARANCE_BOTTOM, DIM_EXT_OFFSET, DIM_OFFSET_FRONT, DIM_TEXT_HEIGHT, EPS_DRAW, EPS_LEN,
    GOK_DIM_SHIFT, HATCH_PATTERN, HATCH_SCALE, PASS_DIM_OFFSET, PASS_SYMBOL_HEIGHT,
};
use super::geometry::y_on_line;

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

/// Soil quad with the default earth fill.
pub fn hatch_quad(sink: &mut impl DrawingSink, quad: [DVec2; 4]) {
    sink.add_hatch_region(
        &quad,
        &[],
        Layer::Soil,
        &HatchFill::from_pattern(HATCH_PATTERN, HATCH_SCALE),
    );
}

/// Standalone trench in the elevation view: inner trapezoid, outer
/// contour, soil annulus as one hatched region, and the depth
/// dimension(s). The right depth gets its own dimension only when the two
/// side depths differ.
#[allow(clippy::too_many_arguments)]
pub fn draw_trench_front(
    sink: &mut impl DrawingSink,
    origin: DVec2,
    length: f64,
    depth_ref: f64,
    depth_left: f64,
    depth_right: f64,
    clearance_left: f64,
    clearance_bottom: f64,
) {
    let (ox, oy) = (origin.x, origin.y);

    let x0 = ox + clearance_left;
    let x1 = x0 + length;
    let yb = oy + clearance_bottom;
    let y_top = yb + depth_ref.max(depth_left).max(depth_right);

    let y_floor_left = y_top - depth_left;
    let y_floor_right = y_top - depth_right;
    let y_out_left = y_floor_left - clearance_bottom;
    let y_out_right = y_floor_right - clearance_bottom;

    // The inner ceiling is nudged below the outer one so coincident edges
    // do not produce duplicate lines.
    let inner = [
        dvec2(x0, y_floor_left),
        dvec2(x1, y_floor_right),
        dvec2(x1, y_top - EPS_DRAW),
        dvec2(x0, y_top - EPS_DRAW),
    ];
    sink.add_outline(&inner, Layer::TrenchInner, true);

    let outer = [
        dvec2(ox, y_out_left),
        dvec2(ox + length + 2.0 * clearance_left, y_out_right),
        dvec2(ox + length + 2.0 * clearance_left, y_top),
        dvec2(ox, y_top),
    ];
    sink.add_outline(&outer, Layer::TrenchOuter, true);

    sink.add_hatch_region(
        &outer,
        &[inner.to_vec()],
        Layer::Soil,
        &HatchFill::from_pattern(HATCH_PATTERN, HATCH_SCALE),
    );

    sink.add_linear_dimension(&dim(
        dvec2(x0 - DIM_OFFSET_FRONT, yb),
        dvec2(x0, y_top),
        dvec2(x0, y_floor_left),
        90.0,
        Layer::TrenchOuter,
    ));
    if (depth_left - depth_right).abs() > EPS_LEN {
        sink.add_linear_dimension(&dim(
            dvec2(x1 + DIM_OFFSET_FRONT, yb),
            dvec2(x1, y_top),
            dvec2(x1, y_floor_right),
            90.0,
            Layer::TrenchOuter,
        ));
    }
}

/// Inner contour of one merge participant: the side walls that are not
/// internal boundaries plus the inner ceiling line.
#[allow(clippy::too_many_arguments)]
pub fn draw_inner_walls(
    sink: &mut impl DrawingSink,
    x_inner: f64,
    base_y: f64,
    length: f64,
    depth_ref: f64,
    depth_left: f64,
    depth_right: f64,
    left_wall: bool,
    right_wall: bool,
) {
    let y_top = base_y + depth_ref;
    let y_floor_left = y_top - depth_left;
    let y_floor_right = y_top - depth_right;
    let x_right = x_inner + length;

    if left_wall {
        sink.add_outline(
            &[dvec2(x_inner, y_floor_left), dvec2(x_inner, y_top)],
            Layer::TrenchInner,
            false,
        );
    }
    if right_wall {
        sink.add_outline(
            &[dvec2(x_right, y_floor_right), dvec2(x_right, y_top)],
            Layer::TrenchInner,
            false,
        );
    }
    if length > EPS_LEN {
        sink.add_outline(
            &[dvec2(x_inner, y_top), dvec2(x_right, y_top)],
            Layer::TrenchInner,
            false,
        );
    }
}

/// Passage block: a hatched rectangle hanging just under the higher of the
/// two adjoining ceilings, spanning exactly the passage length. The hatch
/// boundary is inset so its edges cannot fight the frame.
pub fn draw_pass_symbol(
    sink: &mut impl DrawingSink,
    x0: f64,
    x1: f64,
    y_top: f64,
    pattern: Option<&str>,
) {
    if x1 - x0 <= EPS_LEN {
        return;
    }
    let y1 = y_top;
    let y0 = y1 - PASS_SYMBOL_HEIGHT;

    let inset = EPS_DRAW;
    sink.add_hatch_region(
        &[
            dvec2(x0 + inset, y0 + inset),
            dvec2(x1 - inset, y0 + inset),
            dvec2(x1 - inset, y1 - inset),
            dvec2(x0 + inset, y1 - inset),
        ],
        &[],
        Layer::Passage,
        &HatchFill::from_pattern(pattern.unwrap_or(HATCH_PATTERN), HATCH_SCALE),
    );
    sink.add_outline(
        &[
            dvec2(x0, y0),
            dvec2(x1, y0),
            dvec2(x1, y1),
            dvec2(x0, y1),
        ],
        Layer::Passage,
        true,
    );
}

/// Horizontal passage length dimension above the ceiling.
pub fn add_pass_len_dim(sink: &mut impl DrawingSink, x0: f64, x1: f64, y_ref: f64) {
    sink.add_linear_dimension(&dim(
        dvec2(x0, y_ref + PASS_DIM_OFFSET),
        dvec2(x0, y_ref),
        dvec2(x1, y_ref),
        0.0,
        Layer::TrenchOuter,
    ));
}

/// Vertical depth dimension at `x_col`, measured downwards from `y_top`.
pub fn add_depth_dim(sink: &mut impl DrawingSink, x_col: f64, y_top: f64, depth: f64, base_x: f64) {
    sink.add_linear_dimension(&dim(
        dvec2(base_x, CLEARANCE_BOTTOM),
        dvec2(x_col, y_top),
        dvec2(x_col, y_top - depth),
        90.0,
        Layer::TrenchOuter,
    ));
}

/// Which side of a merge a GOK dimension belongs to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GokSide {
    Left,
    Right,
}

/// Vertical GOK dimension between the no-GOK global ceiling `y_ref` and
/// the trench's shifted ceiling. Only drawn for merged trenches, where the
/// discontinuity needs to be made explicit.
pub fn add_gok_dim(
    sink: &mut impl DrawingSink,
    x_col: f64,
    y_top: f64,
    gok: f64,
    side: GokSide,
    y_ref: f64,
) {
    if gok.abs() < EPS_LEN {
        return;
    }
    let base_x = match side {
        GokSide::Left => x_col - (DIM_OFFSET_FRONT + GOK_DIM_SHIFT),
        GokSide::Right => x_col + (DIM_OFFSET_FRONT + GOK_DIM_SHIFT),
    };
    let sign = if gok >= 0.0 { "+" } else { "-" };
    sink.add_linear_dimension(&LinearDimension {
        base: dvec2(base_x, y_ref),
        p1: dvec2(x_col, y_ref),
        p2: dvec2(x_col, y_top),
        angle_deg: 90.0,
        layer: Layer::TrenchOuter,
        text_height: DIM_TEXT_HEIGHT,
        extension_offset: DIM_EXT_OFFSET,
        text: Some(format!("GOK {sign}<> m")),
    });
}

/// Clip the start of a sloped outer floor line against a neighboring step
/// vertical and reinterpolate its y. Returns `None` when nothing remains.
pub fn clip_slope(
    raw_start: DVec2,
    raw_end: DVec2,
    new_start_x: f64,
    new_end_x: f64,
) -> Option<(DVec2, DVec2)> {
    if new_end_x - new_start_x <= EPS_DRAW {
        return None;
    }
    let y0 = y_on_line(raw_start, raw_end, new_start_x);
    let y1 = y_on_line(raw_start, raw_end, new_end_x);
    Some((dvec2(new_start_x, y0), dvec2(new_end_x, y1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{RecordingSink, SinkOp};

    #[test]
    fn solo_trench_emits_two_contours_one_hatch() {
        let mut sink = RecordingSink::new();
        draw_trench_front(&mut sink, dvec2(0.0, 0.0), 10.0, 1.5, 1.5, 1.5, 0.2, 0.2);
        assert_eq!(sink.outlines_on(Layer::TrenchInner), 1);
        assert_eq!(sink.outlines_on(Layer::TrenchOuter), 1);
        assert_eq!(sink.hatches_on(Layer::Soil), 1);
        assert_eq!(sink.dimensions().count(), 1);
        // the annulus hole is the inner contour
        let Some(SinkOp::Hatch { holes, .. }) =
            sink.ops.iter().find(|op| matches!(op, SinkOp::Hatch { .. }))
        else {
            panic!("expected hatch");
        };
        assert_eq!(holes.len(), 1);
    }

    #[test]
    fn sloped_trench_gets_a_second_depth_dimension() {
        let mut sink = RecordingSink::new();
        draw_trench_front(&mut sink, dvec2(0.0, 0.0), 5.0, 1.1, 1.1, 1.03, 0.2, 0.2);
        assert_eq!(sink.dimensions().count(), 2);
    }

    #[test]
    fn pass_symbol_spans_exactly_the_gap() {
        let mut sink = RecordingSink::new();
        draw_pass_symbol(&mut sink, 10.4, 11.9, 2.2, None);
        let Some(SinkOp::Outline { points, .. }) = sink
            .ops
            .iter()
            .find(|op| matches!(op, SinkOp::Outline { .. }))
        else {
            panic!("expected frame");
        };
        assert!((points[1].x - points[0].x - 1.5).abs() < 1e-9);
        assert!((points[2].y - points[1].y - PASS_SYMBOL_HEIGHT).abs() < 1e-9);
        assert_eq!(sink.hatches_on(Layer::Passage), 1);
    }

    #[test]
    fn gok_dimension_carries_text_template() {
        let mut sink = RecordingSink::new();
        add_gok_dim(&mut sink, 0.2, 2.29, 0.09, GokSide::Left, 2.2);
        let d = sink.dimensions().next().unwrap();
        assert_eq!(d.text.as_deref(), Some("GOK +<> m"));
        let mut sink = RecordingSink::new();
        add_gok_dim(&mut sink, 0.2, 1.9, -0.3, GokSide::Right, 2.2);
        let d = sink.dimensions().next().unwrap();
        assert_eq!(d.text.as_deref(), Some("GOK -<> m"));
    }

    #[test]
    fn zero_gok_draws_no_dimension() {
        let mut sink = RecordingSink::new();
        add_gok_dim(&mut sink, 0.2, 2.2, 0.0, GokSide::Left, 2.2);
        assert!(sink.ops.is_empty());
    }

    #[test]
    fn clip_slope_drops_degenerate_remainder() {
        let a = dvec2(0.0, 0.0);
        let b = dvec2(10.0, 1.0);
        assert!(clip_slope(a, b, 9.9995, 10.0).is_none());
        let (p, q) = clip_slope(a, b, 5.0, 10.0).unwrap();
        assert!((p.y - 0.5).abs() < 1e-12);
        assert!((q.y - 1.0).abs() < 1e-12);
    }
}
