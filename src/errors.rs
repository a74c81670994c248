//! Error types for drawing generation.
//!
//! Renderer errors are fatal for the whole generate call — dimension lines
//! reference absolute coordinates from earlier steps, so no partial output
//! is safe. Messages are user-actionable and meant to be reported verbatim.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while generating a drawing.
#[derive(Error, Diagnostic, Debug)]
pub enum GenerateError {
    /// The element list contains no trench; there is no layout origin.
    #[error("the element list contains no trench")]
    #[diagnostic(
        code(aushub::generate::no_trenches),
        help("add a Baugraben element before generating a drawing")
    )]
    NoTrenches,

    /// A passage is about to be drawn but carries no length.
    #[error("passage at seam {seam} has no length")]
    #[diagnostic(
        code(aushub::generate::missing_passage_length),
        help("set the passage's length field; passage geometry cannot be inferred")
    )]
    MissingPassageLength { seam: usize },
}
