//! Layout constants (all in meters, matching the drawing template).

/// Free soil margin left/right of a trench in the elevation view.
pub const CLEARANCE_SIDE: f64 = 0.20;
/// Free soil margin below the trench floor.
pub const CLEARANCE_BOTTOM: f64 = 0.20;
/// Horizontal gap between two unconnected trenches.
pub const TRENCH_GAP: f64 = 1.50;
/// Vertical distance from the elevation ceiling to the plan view.
pub const PLAN_SHIFT: f64 = 1.50;

/// Visible height of the passage block in the elevation view.
pub const PASS_SYMBOL_HEIGHT: f64 = 0.40;
/// Distance of the passage length dimension above the ceiling.
pub const PASS_DIM_OFFSET: f64 = 0.50;
/// Extra horizontal shift of the GOK dimension base line.
pub const GOK_DIM_SHIFT: f64 = 0.35;

/// Clearance between pipe ends and the trench walls.
pub const PIPE_SIDE_CLEARANCE: f64 = 0.50;
/// Distance of the pipe length dimension below the pipe.
pub const PIPE_DIM_OFFSET: f64 = 0.45;

pub const DIM_TEXT_HEIGHT: f64 = 0.20;
pub const DIM_EXT_OFFSET: f64 = 0.10;
/// Depth dimension offset in the elevation view.
pub const DIM_OFFSET_FRONT: f64 = 0.70;
/// Dimension offset in the plan view.
pub const DIM_OFFSET_PLAN: f64 = 0.50;
/// Extra stacking distance for the plan-view length dimension.
pub const PLAN_LENGTH_DIM_EXTRA: f64 = 0.55;
/// Surface dimension offset in the plan view.
pub const SURFACE_DIM_OFFSET: f64 = 0.75;
/// Extra stacking distance for the uniform surface length dimension.
pub const SURFACE_DIM_STACK: f64 = 0.35;
/// Extra clearance for per-segment surface length dimensions.
pub const SURFACE_SEG_DIM_EXTRA: f64 = 0.45;

pub const HATCH_PATTERN: &str = "EARTH";
pub const HATCH_SCALE: f64 = 0.05;

/// Semantic equality tolerance for meter-valued coordinates.
pub const EPS_LEN: f64 = 1e-6;
/// Minimum drawable extent (~1 mm); also the overlap nudge that keeps
/// adjoining edges from producing duplicate lines.
pub const EPS_DRAW: f64 = 1e-3;
