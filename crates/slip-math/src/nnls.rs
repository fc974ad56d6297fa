// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Non-Negative Least Squares
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Solvers for `min ||A x - b||₂ subject to x ≥ 0`.
//!
//! Two strategies sit behind [`NonNegativeSolver`]:
//!
//! * [`ActiveSetNnls`]: Lawson–Hanson active set on the normal equations.
//!   The Cholesky factor of the passive block is grown one column at a time
//!   and only rebuilt when variables leave the passive set. A column that is
//!   numerically dependent on the passive set is set aside until the set
//!   changes, as in the classic Lawson–Hanson algorithm.
//! * [`ProjectedGradientNnls`]: accelerated projected gradient (Nesterov
//!   momentum with gradient-based adaptive restart), step `1/λ_max(AᵀA)`.
//!   Tolerates rank-deficient systems but converges slowly on badly
//!   conditioned ones.
//!
//! Both return [`SlipError::Solver`] with the residual, the iteration count
//! and the system shape instead of a partially converged answer.

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};
use slip_types::error::{SlipError, SlipResult};
use tracing::debug;

use crate::linalg::{cholesky_solve, spectral_radius_psd};

/// Default KKT tolerance of the active-set solver, relative to `||Aᵀb||∞`.
const ACTIVE_SET_TOL: f64 = 1e-10;

/// Pivot floor (relative) below which a passive column counts as dependent.
const PIVOT_REL_TOL: f64 = 1e-13;

/// Default projected-gradient tolerance, relative to `||Aᵀb||∞`.
const PG_TOL: f64 = 1e-8;

/// Default projected-gradient iteration cap.
const PG_MAX_ITERS: usize = 50_000;

/// Iterations between projected-gradient convergence checks.
const PG_CHECK_EVERY: usize = 10;

/// Safety margin on the Lipschitz estimate from power iteration.
const LIPSCHITZ_MARGIN: f64 = 1.05;

/// Result of a successful non-negative solve.
#[derive(Debug, Clone)]
pub struct NnlsSolution {
    pub x: Array1<f64>,
    /// `||A x - b||₂`.
    pub residual: f64,
    pub iterations: usize,
}

/// Strategy interface for the constrained solve.
pub trait NonNegativeSolver: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, a: ArrayView2<f64>, b: ArrayView1<f64>) -> SlipResult<NnlsSolution>;
}

fn check_shapes(a: &ArrayView2<f64>, b: &ArrayView1<f64>) -> SlipResult<()> {
    if a.nrows() != b.len() {
        return Err(SlipError::mismatch("NNLS right-hand side", a.nrows(), b.len()));
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(SlipError::Solver {
            status: "non-finite input".to_string(),
            iterations: 0,
            residual: f64::NAN,
            rows: a.nrows(),
            cols: a.ncols(),
        });
    }
    Ok(())
}

fn residual_norm(a: &ArrayView2<f64>, b: &ArrayView1<f64>, x: &Array1<f64>) -> f64 {
    let r = a.dot(x) - b;
    r.dot(&r).sqrt()
}

fn inf_norm(v: &Array1<f64>) -> f64 {
    v.iter().fold(0.0_f64, |m, x| m.max(x.abs()))
}

fn solver_error(
    status: &str,
    iterations: usize,
    a: &ArrayView2<f64>,
    b: &ArrayView1<f64>,
    x: &Array1<f64>,
) -> SlipError {
    SlipError::Solver {
        status: status.to_string(),
        iterations,
        residual: residual_norm(a, b, x),
        rows: a.nrows(),
        cols: a.ncols(),
    }
}

// ─────────────────────────── active set ──────────────────────────────

/// Lawson–Hanson active-set NNLS.
#[derive(Debug, Clone)]
pub struct ActiveSetNnls {
    /// Cap on passive-set changes; 0 means `3 · ncols`.
    pub max_iterations: usize,
    /// KKT tolerance relative to `||Aᵀb||∞`.
    pub tolerance: f64,
}

impl Default for ActiveSetNnls {
    fn default() -> Self {
        ActiveSetNnls {
            max_iterations: 0,
            tolerance: ACTIVE_SET_TOL,
        }
    }
}

/// Cholesky factor of `H[P, P]` kept in the top-left `p × p` corner.
struct PassiveFactor {
    indices: Vec<usize>,
    l: Array2<f64>,
}

impl PassiveFactor {
    fn new(n: usize) -> Self {
        PassiveFactor {
            indices: Vec::with_capacity(n),
            l: Array2::zeros((n, n)),
        }
    }

    fn len(&self) -> usize {
        self.indices.len()
    }

    /// Append column `j`; `false` if it is numerically dependent on `P`.
    fn push(&mut self, h: &Array2<f64>, j: usize) -> bool {
        let p = self.len();
        let mut row = vec![0.0; p];
        for i in 0..p {
            let mut v = h[[self.indices[i], j]];
            for k in 0..i {
                v -= self.l[[i, k]] * row[k];
            }
            row[i] = v / self.l[[i, i]];
        }
        let d = h[[j, j]] - row.iter().map(|v| v * v).sum::<f64>();
        if !d.is_finite() || d <= PIVOT_REL_TOL * h[[j, j]].abs().max(f64::MIN_POSITIVE) {
            return false;
        }
        for (k, v) in row.into_iter().enumerate() {
            self.l[[p, k]] = v;
        }
        self.l[[p, p]] = d.sqrt();
        self.indices.push(j);
        true
    }

    fn pop(&mut self) {
        if self.indices.pop().is_some() {
            let p = self.len();
            self.l.row_mut(p).fill(0.0);
        }
    }

    /// Refactor the current passive set column by column. Dropping columns
    /// only enlarges the remaining pivots, so this fails only on round-off.
    fn rebuild(&mut self, h: &Array2<f64>) -> bool {
        let indices = std::mem::take(&mut self.indices);
        self.l.fill(0.0);
        indices.into_iter().all(|j| self.push(h, j))
    }

    fn solve(&self, g: &Array1<f64>) -> Array1<f64> {
        let p = self.len();
        let rhs: Array1<f64> = self.indices.iter().map(|&i| g[i]).collect();
        cholesky_solve(self.l.slice(s![..p, ..p]), rhs.view())
    }
}

impl NonNegativeSolver for ActiveSetNnls {
    fn name(&self) -> &'static str {
        "active_set"
    }

    fn solve(&self, a: ArrayView2<f64>, b: ArrayView1<f64>) -> SlipResult<NnlsSolution> {
        check_shapes(&a, &b)?;
        let n = a.ncols();
        let h = a.t().dot(&a);
        let g = a.t().dot(&b);
        let tol = self.tolerance.max(f64::EPSILON) * inf_norm(&g).max(f64::MIN_POSITIVE);
        let max_iter = if self.max_iterations == 0 {
            3 * n.max(1)
        } else {
            self.max_iterations
        };

        let mut x = Array1::zeros(n);
        let mut passive = vec![false; n];
        let mut factor = PassiveFactor::new(n);
        // Columns set aside until the passive set changes again.
        let mut excluded = vec![false; n];
        let mut iterations = 0usize;

        loop {
            let w = &g - &h.dot(&x);
            let candidate = (0..n)
                .filter(|&j| !passive[j] && !excluded[j] && w[j] > tol)
                .max_by(|&i, &j| w[i].total_cmp(&w[j]));
            let Some(j) = candidate else {
                break;
            };
            if iterations >= max_iter {
                return Err(solver_error("iteration limit reached", iterations, &a, &b, &x));
            }
            iterations += 1;

            if !factor.push(&h, j) {
                // Numerically dependent on the passive columns.
                excluded[j] = true;
                continue;
            }
            passive[j] = true;

            let z = factor.solve(&g);
            if z[z.len() - 1] <= 0.0 {
                // Round-off made the entering variable useless.
                factor.pop();
                passive[j] = false;
                excluded[j] = true;
                continue;
            }
            excluded.fill(false);

            let mut z = z;
            loop {
                if z.iter().all(|&v| v > 0.0) {
                    for (k, &idx) in factor.indices.iter().enumerate() {
                        x[idx] = z[k];
                    }
                    break;
                }

                let mut alpha = f64::INFINITY;
                let mut hit = None;
                for (k, &idx) in factor.indices.iter().enumerate() {
                    if z[k] <= 0.0 {
                        let denom = x[idx] - z[k];
                        let ratio = if denom > 0.0 { x[idx] / denom } else { 0.0 };
                        if ratio < alpha {
                            alpha = ratio;
                            hit = Some(idx);
                        }
                    }
                }
                let alpha = if alpha.is_finite() { alpha } else { 0.0 };
                for (k, &idx) in factor.indices.iter().enumerate() {
                    x[idx] += alpha * (z[k] - x[idx]);
                }
                if let Some(idx) = hit {
                    x[idx] = 0.0;
                }

                let zero_tol = 10.0 * f64::EPSILON * inf_norm(&x);
                let before = factor.len();
                factor.indices.retain(|&idx| {
                    let keep = x[idx] > zero_tol;
                    if !keep {
                        x[idx] = 0.0;
                        passive[idx] = false;
                    }
                    keep
                });
                if factor.len() == before {
                    return Err(solver_error("stalled inner loop", iterations, &a, &b, &x));
                }
                if !factor.rebuild(&h) {
                    return Err(solver_error(
                        "rank deficient passive set",
                        iterations,
                        &a,
                        &b,
                        &x,
                    ));
                }

                iterations += 1;
                if iterations > max_iter {
                    return Err(solver_error("iteration limit reached", iterations, &a, &b, &x));
                }
                z = factor.solve(&g);
            }
        }

        let residual = residual_norm(&a, &b, &x);
        debug!(
            solver = "active_set",
            rows = a.nrows(),
            cols = n,
            iterations,
            passive = factor.len(),
            residual,
            "NNLS finished"
        );
        Ok(NnlsSolution {
            x,
            residual,
            iterations,
        })
    }
}

// ───────────────────────── projected gradient ────────────────────────

/// Accelerated projected-gradient NNLS.
#[derive(Debug, Clone)]
pub struct ProjectedGradientNnls {
    pub max_iterations: usize,
    /// Tolerance on the projected gradient relative to `||Aᵀb||∞`.
    pub tolerance: f64,
}

impl Default for ProjectedGradientNnls {
    fn default() -> Self {
        ProjectedGradientNnls {
            max_iterations: PG_MAX_ITERS,
            tolerance: PG_TOL,
        }
    }
}

/// Infinity norm of the projected gradient `∇f` restricted to the feasible cone.
fn projected_gradient_norm(x: &Array1<f64>, grad: &Array1<f64>) -> f64 {
    x.iter()
        .zip(grad.iter())
        .map(|(&xi, &gi)| if xi > 0.0 { gi.abs() } else { (-gi).max(0.0) })
        .fold(0.0, f64::max)
}

impl NonNegativeSolver for ProjectedGradientNnls {
    fn name(&self) -> &'static str {
        "projected_gradient"
    }

    fn solve(&self, a: ArrayView2<f64>, b: ArrayView1<f64>) -> SlipResult<NnlsSolution> {
        check_shapes(&a, &b)?;
        let n = a.ncols();
        let h = a.t().dot(&a);
        let g = a.t().dot(&b);
        let g_scale = inf_norm(&g);
        let mut x = Array1::zeros(n);

        let lipschitz = spectral_radius_psd(h.view()) * LIPSCHITZ_MARGIN;
        if g_scale == 0.0 || lipschitz <= f64::MIN_POSITIVE {
            return Ok(NnlsSolution {
                residual: residual_norm(&a, &b, &x),
                x,
                iterations: 0,
            });
        }
        let step = 1.0 / lipschitz;
        let tol = self.tolerance.max(f64::EPSILON) * g_scale;
        let mut x_prev = x.clone();
        // Iterations since the last momentum restart.
        let mut since_restart = 0usize;

        for k in 0..self.max_iterations {
            let t = since_restart as f64;
            let y = &x + &((&x - &x_prev) * (t / (t + 3.0)));
            let grad = h.dot(&y) - &g;
            let x_next = (&y - &(&grad * step)).mapv(|v| v.max(0.0));
            // Gradient restart: drop the momentum once the step points uphill.
            if grad.dot(&(&x_next - &x)) > 0.0 {
                since_restart = 0;
            } else {
                since_restart += 1;
            }
            x_prev = std::mem::replace(&mut x, x_next);

            if (k + 1) % PG_CHECK_EVERY == 0 {
                let grad_x = h.dot(&x) - &g;
                if projected_gradient_norm(&x, &grad_x) <= tol {
                    let residual = residual_norm(&a, &b, &x);
                    debug!(
                        solver = "projected_gradient",
                        rows = a.nrows(),
                        cols = n,
                        iterations = k + 1,
                        residual,
                        "NNLS finished"
                    );
                    return Ok(NnlsSolution {
                        x,
                        residual,
                        iterations: k + 1,
                    });
                }
            }
        }

        Err(solver_error(
            "projected gradient did not converge",
            self.max_iterations,
            &a,
            &b,
            &x,
        ))
    }
}
