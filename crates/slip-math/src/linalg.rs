//! Dense linear algebra utilities.
//!
//! Triangular solves against a Cholesky factor, block-diagonal stacking and
//! a power iteration for the spectral norm of a Gram matrix.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

/// Power iterations used for the Lipschitz estimate.
const POWER_ITERS: usize = 50;

/// Solve `L y = b` for lower-triangular `L`.
pub fn forward_substitute(l: ArrayView2<f64>, b: ArrayView1<f64>) -> Array1<f64> {
    let n = b.len();
    let mut y = Array1::zeros(n);
    for i in 0..n {
        let mut v = b[i];
        for k in 0..i {
            v -= l[[i, k]] * y[k];
        }
        y[i] = v / l[[i, i]];
    }
    y
}

/// Solve `Lᵀ x = y` for lower-triangular `L`.
pub fn backward_substitute_transposed(l: ArrayView2<f64>, y: ArrayView1<f64>) -> Array1<f64> {
    let n = y.len();
    let mut x = Array1::zeros(n);
    for i in (0..n).rev() {
        let mut v = y[i];
        for k in (i + 1)..n {
            v -= l[[k, i]] * x[k];
        }
        x[i] = v / l[[i, i]];
    }
    x
}

/// Solve `A x = b` given the Cholesky factor `L` of `A`.
pub fn cholesky_solve(l: ArrayView2<f64>, b: ArrayView1<f64>) -> Array1<f64> {
    let y = forward_substitute(l, b);
    backward_substitute_transposed(l, y.view())
}

/// Stack matrices along the diagonal; off-diagonal blocks are zero.
pub fn block_diag(blocks: &[Array2<f64>]) -> Array2<f64> {
    let rows: usize = blocks.iter().map(|b| b.nrows()).sum();
    let cols: usize = blocks.iter().map(|b| b.ncols()).sum();
    let mut out = Array2::zeros((rows, cols));
    let (mut r0, mut c0) = (0, 0);
    for b in blocks {
        out.slice_mut(s![r0..r0 + b.nrows(), c0..c0 + b.ncols()])
            .assign(b);
        r0 += b.nrows();
        c0 += b.ncols();
    }
    out
}

/// Stack `top` over `bottom`, padding the narrower one with zero columns.
pub fn vstack_padded(top: ArrayView2<f64>, bottom: ArrayView2<f64>) -> Array2<f64> {
    let cols = top.ncols().max(bottom.ncols());
    let mut out = Array2::zeros((top.nrows() + bottom.nrows(), cols));
    out.slice_mut(s![..top.nrows(), ..top.ncols()]).assign(&top);
    out.slice_mut(s![top.nrows().., ..bottom.ncols()])
        .assign(&bottom);
    out
}

/// Largest eigenvalue of a symmetric positive semi-definite matrix.
pub fn spectral_radius_psd(h: ArrayView2<f64>) -> f64 {
    let n = h.nrows();
    if n == 0 {
        return 0.0;
    }
    let mut v = Array1::from_elem(n, 1.0 / (n as f64).sqrt());
    let mut lambda = 0.0;
    for _ in 0..POWER_ITERS {
        let w = h.dot(&v);
        let norm = w.dot(&w).sqrt();
        if norm <= f64::MIN_POSITIVE {
            return 0.0;
        }
        lambda = v.dot(&w);
        v = w / norm;
    }
    // Rayleigh quotient of the final iterate, never below the last estimate.
    lambda.max(v.dot(&h.dot(&v)))
}
