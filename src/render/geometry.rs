//! Small pure geometry helpers shared by the view renderers.

use glam::{DVec2, dvec2};

/// Interpolate the y value of the line through `a` and `b` at `x`.
/// A (near-)vertical line returns `a.y`.
pub fn y_on_line(a: DVec2, b: DVec2, x: f64) -> f64 {
    if (b.x - a.x).abs() < 1e-12 {
        return a.y;
    }
    let t = (x - a.x) / (b.x - a.x);
    a.y + t * (b.y - a.y)
}

/// Axis-aligned rectangle corners, counter-clockwise from bottom left.
pub fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> [DVec2; 4] {
    [
        dvec2(x0, y0),
        dvec2(x1, y0),
        dvec2(x1, y1),
        dvec2(x0, y1),
    ]
}

/// Quad with independent floor heights at both ends (soil band under a
/// sloped trench floor): bottom edge from `(x0, y0_bot)` to `(x1, y1_bot)`,
/// top edge back from `(x1, y1_top)` to `(x0, y0_top)`.
pub fn band(x0: f64, y0_bot: f64, x1: f64, y1_bot: f64, y1_top: f64, y0_top: f64) -> [DVec2; 4] {
    [
        dvec2(x0, y0_bot),
        dvec2(x1, y1_bot),
        dvec2(x1, y1_top),
        dvec2(x0, y0_top),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_linearly() {
        let a = dvec2(0.0, 1.0);
        let b = dvec2(10.0, 2.0);
        assert!((y_on_line(a, b, 5.0) - 1.5).abs() < 1e-12);
        assert!((y_on_line(a, b, 0.0) - 1.0).abs() < 1e-12);
        assert!((y_on_line(a, b, 10.0) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn vertical_line_returns_start_y() {
        let a = dvec2(3.0, 1.0);
        let b = dvec2(3.0, 9.0);
        assert_eq!(y_on_line(a, b, 3.0), 1.0);
    }

    #[test]
    fn rect_is_counter_clockwise() {
        let r = rect(0.0, 0.0, 2.0, 1.0);
        assert_eq!(r[0], dvec2(0.0, 0.0));
        assert_eq!(r[2], dvec2(2.0, 1.0));
    }
}
