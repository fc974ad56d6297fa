// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Green's Function Kernel
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Seam for the elastic half-space displacement kernel.
//!
//! The inversion never computes elastic responses itself. A kernel maps a
//! unit slip on one patch to surface (or buried) displacements at every
//! observation point.

use ndarray::{Array2, ArrayView2};
use slip_types::error::{SlipError, SlipResult};

use crate::patch::PatchGeometry;

/// Displacements produced by one kernel call.
#[derive(Debug, Clone)]
pub struct KernelOutput {
    /// `(N, 3)` east, north, up.
    pub displacement: Array2<f64>,
    /// `(N, 3)` numerical error estimate; unused by the inversion.
    pub error: Array2<f64>,
}

impl KernelOutput {
    /// Output without an error estimate.
    pub fn exact(displacement: Array2<f64>) -> Self {
        let error = Array2::zeros(displacement.raw_dim());
        KernelOutput {
            displacement,
            error,
        }
    }
}

/// Elastic displacement kernel.
///
/// `observations` are `(N, 3)` local Cartesian positions, `slip` is a
/// direction in the patch frame (strike-slip, dip-slip, opening) and
/// `patch.reference` is the patch top centre. Implementations are called
/// concurrently from the rayon pool.
pub trait GreensKernel: Sync {
    fn evaluate(
        &self,
        observations: ArrayView2<f64>,
        slip: [f64; 3],
        patch: &PatchGeometry,
    ) -> SlipResult<KernelOutput>;
}

/// Run the kernel and check the returned shape.
pub(crate) fn evaluate_checked<K: GreensKernel + ?Sized>(
    kernel: &K,
    observations: ArrayView2<f64>,
    slip: [f64; 3],
    patch: &PatchGeometry,
) -> SlipResult<Array2<f64>> {
    let out = kernel.evaluate(observations, slip, patch)?;
    let expected = (observations.nrows(), 3);
    if out.displacement.dim() != expected {
        return Err(SlipError::Kernel(format!(
            "kernel returned {:?} displacements, expected {:?}",
            out.displacement.dim(),
            expected
        )));
    }
    if out.displacement.iter().any(|v| !v.is_finite()) {
        return Err(SlipError::Kernel(format!(
            "non-finite displacement for patch at {:?}",
            patch.reference
        )));
    }
    Ok(out.displacement)
}
