// Copyright 2025 Lars Brubaker
// License: SGI Free Software License B (MIT-compatible)

use crate::tess::FillRule;

/// Errors reported by the public tessellation and mesh-building entry points.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TessError {
    /// Malformed input: short contours, inconsistent counts, non-finite coordinates.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// The requested fill rule is not implemented.
    #[error("unsupported fill rule: {0:?}")]
    Unsupported(FillRule),
    /// A structural invariant of the mesh or the sweep status was found broken.
    #[error("internal inconsistency: {0}")]
    InternalInconsistency(&'static str),
    #[error("allocation failure")]
    AllocationFailure,
    /// The cancellation check asked the sweep to stop.
    #[error("tessellation cancelled")]
    Cancelled,
}

impl From<std::collections::TryReserveError> for TessError {
    fn from(_: std::collections::TryReserveError) -> Self {
        TessError::AllocationFailure
    }
}

pub type Result<T> = std::result::Result<T, TessError>;
