//! Rejection reasons for surface requests.
//!
//! These never escape `World`: it logs them and drops the request.

use thiserror::Error;

use crate::vr::surface::SurfaceHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WorldError {
    #[error("no parent surface with handle {0}")]
    UnknownParent(SurfaceHandle),
    #[error("no surface with handle {0}")]
    UnknownSurface(SurfaceHandle),
}
