//! Geodetic fault-slip inversion.
//!
//! Geometry: patch, projection, basis
//! Assembly: fault, regularization, gbuild
//! Solve: observations, inversion, metrics

pub mod basis;
pub mod fault;
pub mod gbuild;
pub mod greens;
pub mod inversion;
pub mod metrics;
pub mod observations;
pub mod patch;
pub mod projection;
pub mod regularization;

pub use fault::{FaultModel, SlipIndex};
pub use greens::{GreensKernel, KernelOutput};
pub use inversion::{InversionOptions, InversionResult, SlipInversion};
pub use observations::{GpsDataset, Observations, ScalarDataset};
pub use patch::{GeometryWarning, Patch, PatchGeometry};
pub use projection::{FlatEarthProjection, MapContext, Projection};
