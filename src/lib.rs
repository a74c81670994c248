//! Deterministic 2D layout engine for excavation-trench CAD drawings.
//!
//! Takes a flat list of construction elements — trenches ("Baugraben"),
//! pipes, surface-restoration zones, passages ("Durchstich") and plain
//! connections ("Verbindung") — and computes plan and elevation views for
//! an arbitrary chain of trenches: outlines, sloped floors, stepped
//! ceilings, soil hatching, dimension lines, and the matching
//! quantity-survey ("Aufmaß") text. Geometry is emitted to an abstract
//! [`DrawingSink`]; a DXF writer or any other backend implements the four
//! sink operations and owns the finished artifact.
//!
//! The engine is a pure, synchronous function of its input: no global
//! state, no I/O, identical input produces an identical call sequence.
//!
//! ```
//! use aushub::{RecordingSink, generate};
//! use serde_json::json;
//!
//! let elements = [json!({
//!     "type": "Baugraben", "length": 10.0, "width": 2.0, "depth": 1.5,
//! })];
//! let mut sink = RecordingSink::new();
//! let aufmass = generate(&mut sink, &elements).unwrap();
//! assert_eq!(aufmass, "Baugraben 1: l=10.0 m  b=2.0 m  t=1.5 m");
//! assert!(!sink.ops.is_empty());
//! ```

pub mod elements;
pub mod errors;
pub mod log;
pub mod normalize;
pub mod render;
pub mod sink;

pub use elements::{
    AufmassOverride, ConnectionSpec, Element, PassageSpec, PipeSpec, SurfaceSpec, TrenchSpec,
    parse_elements,
};
pub use errors::GenerateError;
pub use normalize::normalize;
pub use sink::{DrawingSink, HatchFill, Layer, LinearDimension, RecordingSink, SinkOp};

use serde_json::Value;

/// Generate a drawing from a dynamically-typed element list.
///
/// Classifies and normalizes the list, then renders it into `sink`.
/// Returns the final sorted Aufmaß text; the sink holds the drawing.
/// Fails without partial output semantics: on error the caller should
/// discard the sink and report the message verbatim.
pub fn generate<S: DrawingSink>(sink: &mut S, elements: &[Value]) -> Result<String, GenerateError> {
    let parsed = parse_elements(elements);
    let normalized = normalize(parsed);
    render::render(sink, &normalized)
}
