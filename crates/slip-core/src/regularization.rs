// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Regularization Builder
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Laplacian smoothing over each segment's patch grid.

use ndarray::{concatenate, Array2, Axis};
use slip_math::linalg::block_diag;
use slip_math::tikhonov::laplacian_operator;
use slip_types::error::{SlipError, SlipResult};
use tracing::debug;

/// One segment's block: a Laplacian per slip-basis component, stacked
/// vertically in component order and scaled by `penalty`.
///
/// Columns follow the segment-local expanded layout
/// `(il * n_width + iw) * n_basis + k`.
pub fn segment_block(
    n_length: usize,
    n_width: usize,
    n_basis: usize,
    penalty: f64,
) -> SlipResult<Array2<f64>> {
    if n_length == 0 || n_width == 0 || n_basis == 0 {
        return Err(SlipError::config(format!(
            "regularization grid is empty ({n_length} x {n_width}, {n_basis} basis)"
        )));
    }
    if !penalty.is_finite() || penalty < 0.0 {
        return Err(SlipError::config(format!(
            "penalty must be finite and >= 0 (got {penalty})"
        )));
    }

    let n_columns = n_length * n_width * n_basis;
    let mut parts = Vec::with_capacity(n_basis);
    for k in 0..n_basis {
        let connectivity =
            Array2::from_shape_fn((n_length, n_width), |(il, iw)| (il * n_width + iw) * n_basis + k);
        parts.push(laplacian_operator(connectivity.view(), n_columns)?);
    }
    let views: Vec<_> = parts.iter().map(|p| p.view()).collect();
    let block = concatenate(Axis(0), &views)
        .map_err(|e| SlipError::config(format!("regularization stacking: {e}")))?;
    debug!(n_length, n_width, n_basis, penalty, rows = block.nrows(), "segment regularization block");
    Ok(block * penalty)
}

/// Combine segment blocks block-diagonally, adding a zero row and column for
/// the leveling offset when present.
pub fn assemble(blocks: &[Array2<f64>], leveling_offset: bool) -> Array2<f64> {
    let mut all: Vec<Array2<f64>> = blocks.to_vec();
    if leveling_offset {
        all.push(Array2::zeros((1, 1)));
    }
    block_diag(&all)
}
