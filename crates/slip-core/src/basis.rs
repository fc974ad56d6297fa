//! Slip-basis and observation-basis helpers.

use ndarray::{Array2, Array3, ArrayView2, ArrayView3};
use slip_types::error::{SlipError, SlipResult};

/// `(n, 3, 3)` stack of identity matrices: east, north and up unit rows for
/// each of `n` GPS stations.
pub fn cardinal_basis(n: usize) -> Array3<f64> {
    Array3::from_shape_fn((n, 3, 3), |(_, i, j)| if i == j { 1.0 } else { 0.0 })
}

/// Convert per-patch basis coefficients into components along the cardinal
/// slip axes (strike-slip, dip-slip, opening).
///
/// `slip` is `(n, ds)`, `basis` is `(n, ds, 3)`; the result is `(n, 3)` with
/// `out[i] = Σ_k slip[i, k] · basis[i, k]`.
pub fn cardinal_components(
    slip: ArrayView2<f64>,
    basis: ArrayView3<f64>,
) -> SlipResult<Array2<f64>> {
    let (n, ds) = slip.dim();
    let (bn, bds, dim) = basis.dim();
    if bn != n {
        return Err(SlipError::mismatch("slip basis (patches)", n, bn));
    }
    if bds != ds {
        return Err(SlipError::mismatch("slip basis (directions)", ds, bds));
    }
    if dim != 3 {
        return Err(SlipError::mismatch("slip basis (components)", 3, dim));
    }

    let mut out = Array2::zeros((n, 3));
    for i in 0..n {
        for k in 0..ds {
            let coeff = slip[[i, k]];
            for c in 0..3 {
                out[[i, c]] += coeff * basis[[i, k, c]];
            }
        }
    }
    Ok(out)
}
