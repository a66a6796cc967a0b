//! Error types for mesh classification, stencil evaluation and operator
//! assembly.

use thiserror::Error;

use crate::geometry::Axis;
use crate::stencil::{BoundaryKind, DerivativeOrder};

/// Errors raised while building a [`crate::mesh::CartesianMesh`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    #[error("mesh extent along {axis:?} must be at least 1")]
    EmptyAxis { axis: Axis },

    #[error("domain bounds along {axis:?} must be finite with upper > lower (got {lower}..{upper})")]
    InvalidBounds { axis: Axis, lower: f64, upper: f64 },

    #[error("object {id}: {reason}")]
    InvalidObject { id: usize, reason: String },

    #[error("duplicate object id {id}")]
    DuplicateObject { id: usize },

    #[error("mesh line along {axis:?} through {coordinate:?} lies entirely inside solid material")]
    EnclosedLine { axis: Axis, coordinate: [usize; 3] },
}

/// Errors raised by stencil construction and evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StencilError {
    #[error("unknown stencil family '{0}'")]
    UnknownFamily(String),

    #[error("stencil family {family} does not provide {order:?} derivatives")]
    UnsupportedOrder {
        family: &'static str,
        order: DerivativeOrder,
    },

    #[error("stencil family {family} has no {kind:?} closure")]
    UnsupportedKind {
        family: &'static str,
        kind: BoundaryKind,
    },

    #[error("stencil radius {radius} is outside the supported range 1..={max}")]
    InvalidRadius { radius: usize, max: usize },

    #[error("stencil family {family} takes no tuning for {order:?} derivatives")]
    TuningUnsupported {
        family: &'static str,
        order: DerivativeOrder,
    },

    #[error("expected {expected} tuning coefficients, got {got}")]
    InvalidTuning { expected: usize, got: usize },

    #[error("psi must lie in [0, 1], got {0}")]
    PsiOutOfRange(f64),

    #[error("closure buffer too small: need {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },

    #[error("closure system is singular at psi = {psi}")]
    SingularClosure { psi: f64 },
}

/// Errors raised while assembling or applying a derivative operator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OperatorError {
    #[error("axis {axis:?} has a single grid point; no derivative can be formed")]
    DegenerateAxis { axis: Axis },

    #[error("boundary kind {kind:?} is not supported by the selected stencil (axis {axis:?})")]
    UnsupportedKind { axis: Axis, kind: BoundaryKind },

    #[error(
        "fluid line along {axis:?} through {coordinate:?} has {points} interior points, \
         the stencil needs at least {required}"
    )]
    LineTooShort {
        axis: Axis,
        coordinate: [usize; 3],
        points: usize,
        required: usize,
    },

    #[error("{what} has length {got}, expected {expected}")]
    SizeMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Stencil(#[from] StencilError),
}
