//! Numerical primitives for the SCPN slip inversion core.

pub mod linalg;
pub mod nnls;
pub mod tikhonov;
pub mod transform;
