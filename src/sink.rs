//! Abstract drawing sink.
//!
//! The engine never serializes anything itself; it emits outlines, hatch
//! regions, linear dimensions and text blocks to a [`DrawingSink`]. A DXF
//! writer (or any other backend) implements the trait and owns the finished
//! drawing artifact. [`RecordingSink`] captures the call sequence verbatim
//! and is what the test suite asserts against.

use glam::DVec2;

/// Drawing layers, mapping to the layer names of the DXF drawing template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Outer trench contour ("Baugraben")
    TrenchOuter,
    /// Inner excavation contour ("InnerRechteck")
    TrenchInner,
    /// Soil annulus hatching ("Zwischenraum")
    Soil,
    /// Pipe cross-section ("Rohr")
    Pipe,
    /// Pipe symmetry axis, dash-dot ("Symmetrie")
    PipeAxis,
    /// Pipe dimensions ("Bemassung_Rohr")
    PipeDim,
    /// Surface restoration, dashed ("Oberflaeche")
    Surface,
    /// Surface dimensions ("Bemassung_Oberfl")
    SurfaceDim,
    /// Passage block ("Durchstich")
    Passage,
}

impl Layer {
    /// The layer name a DXF backend should register.
    pub fn name(self) -> &'static str {
        match self {
            Layer::TrenchOuter => "Baugraben",
            Layer::TrenchInner => "InnerRechteck",
            Layer::Soil => "Zwischenraum",
            Layer::Pipe => "Rohr",
            Layer::PipeAxis => "Symmetrie",
            Layer::PipeDim => "Bemassung_Rohr",
            Layer::Surface => "Oberflaeche",
            Layer::SurfaceDim => "Bemassung_Oberfl",
            Layer::Passage => "Durchstich",
        }
    }
}

/// Hatch pattern fill parameters.
///
/// The EARTH pattern is tilted by 45 degrees, everything else draws upright.
#[derive(Clone, Debug, PartialEq)]
pub struct HatchFill {
    pub pattern: String,
    pub scale: f64,
    pub angle_deg: f64,
}

impl HatchFill {
    pub fn from_pattern(pattern: &str, scale: f64) -> Self {
        let angle_deg = if pattern.eq_ignore_ascii_case("EARTH") {
            45.0
        } else {
            0.0
        };
        HatchFill {
            pattern: pattern.to_string(),
            scale,
            angle_deg,
        }
    }
}

/// One linear dimension, in the parameter shape a DXF `add_linear_dim`
/// call expects.
#[derive(Clone, Debug, PartialEq)]
pub struct LinearDimension {
    /// Location of the dimension line (its distance from p1/p2 matters).
    pub base: DVec2,
    /// First measure point.
    pub p1: DVec2,
    /// Second measure point.
    pub p2: DVec2,
    /// 0 for horizontal, 90 for vertical dimensions.
    pub angle_deg: f64,
    pub layer: Layer,
    pub text_height: f64,
    /// Extension-line overshoot and offset (dimexe/dimexo).
    pub extension_offset: f64,
    /// Optional dimension text template; `<>` is replaced by the measured
    /// value (used by the GOK dimension).
    pub text: Option<String>,
}

/// Consumer of the generated 2D geometry.
///
/// All coordinates are in meters in drawing space. Calls arrive in a
/// deterministic order: identical input lists produce identical call
/// sequences.
pub trait DrawingSink {
    /// Add an open or closed polyline.
    fn add_outline(&mut self, points: &[DVec2], layer: Layer, closed: bool);

    /// Add a hatched region. `boundary` is the outer loop; each entry of
    /// `holes` is an island subtracted from it.
    fn add_hatch_region(
        &mut self,
        boundary: &[DVec2],
        holes: &[Vec<DVec2>],
        layer: Layer,
        fill: &HatchFill,
    );

    /// Add a linear dimension.
    fn add_linear_dimension(&mut self, dim: &LinearDimension);

    /// Add a multi-line text block anchored at `location` (top left).
    fn add_text_block(&mut self, text: &str, location: DVec2, layer: Layer);
}

/// A recorded sink call.
#[derive(Clone, Debug, PartialEq)]
pub enum SinkOp {
    Outline {
        points: Vec<DVec2>,
        layer: Layer,
        closed: bool,
    },
    Hatch {
        boundary: Vec<DVec2>,
        holes: Vec<Vec<DVec2>>,
        layer: Layer,
        fill: HatchFill,
    },
    Dimension(LinearDimension),
    Text {
        text: String,
        location: DVec2,
        layer: Layer,
    },
}

/// Sink that records every call for inspection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordingSink {
    pub ops: Vec<SinkOp>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count outlines on a layer, optionally filtered by closedness.
    pub fn outlines_on(&self, layer: Layer) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SinkOp::Outline { layer: l, .. } if *l == layer))
            .count()
    }

    pub fn hatches_on(&self, layer: Layer) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, SinkOp::Hatch { layer: l, .. } if *l == layer))
            .count()
    }

    pub fn dimensions(&self) -> impl Iterator<Item = &LinearDimension> {
        self.ops.iter().filter_map(|op| match op {
            SinkOp::Dimension(d) => Some(d),
            _ => None,
        })
    }
}

impl DrawingSink for RecordingSink {
    fn add_outline(&mut self, points: &[DVec2], layer: Layer, closed: bool) {
        self.ops.push(SinkOp::Outline {
            points: points.to_vec(),
            layer,
            closed,
        });
    }

    fn add_hatch_region(
        &mut self,
        boundary: &[DVec2],
        holes: &[Vec<DVec2>],
        layer: Layer,
        fill: &HatchFill,
    ) {
        self.ops.push(SinkOp::Hatch {
            boundary: boundary.to_vec(),
            holes: holes.to_vec(),
            layer,
            fill: fill.clone(),
        });
    }

    fn add_linear_dimension(&mut self, dim: &LinearDimension) {
        self.ops.push(SinkOp::Dimension(dim.clone()));
    }

    fn add_text_block(&mut self, text: &str, location: DVec2, layer: Layer) {
        self.ops.push(SinkOp::Text {
            text: text.to_string(),
            location,
            layer,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::dvec2;

    #[test]
    fn earth_pattern_is_tilted() {
        let fill = HatchFill::from_pattern("EARTH", 0.05);
        assert_eq!(fill.angle_deg, 45.0);
        let fill = HatchFill::from_pattern("earth", 0.05);
        assert_eq!(fill.angle_deg, 45.0);
    }

    #[test]
    fn other_patterns_draw_upright() {
        let fill = HatchFill::from_pattern("ANSI31", 0.05);
        assert_eq!(fill.angle_deg, 0.0);
    }

    #[test]
    fn recording_sink_captures_order() {
        let mut sink = RecordingSink::new();
        sink.add_outline(&[dvec2(0.0, 0.0), dvec2(1.0, 0.0)], Layer::TrenchOuter, false);
        sink.add_text_block("x", dvec2(0.0, -3.0), Layer::TrenchOuter);
        assert_eq!(sink.ops.len(), 2);
        assert!(matches!(sink.ops[0], SinkOp::Outline { .. }));
        assert!(matches!(sink.ops[1], SinkOp::Text { .. }));
    }
}
