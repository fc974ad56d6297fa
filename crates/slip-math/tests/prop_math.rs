// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Property-Based Tests (proptest) for slip-math
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Property-based tests for slip-math using proptest.
//!
//! Covers: transform composition and inversion, NNLS feasibility and
//! optimality, Laplacian operator structure.

use ndarray::{Array1, Array2};
use proptest::prelude::*;
use slip_math::nnls::{ActiveSetNnls, NonNegativeSolver};
use slip_math::tikhonov::laplacian_operator;
use slip_math::transform::Transform;

fn close3(a: [f64; 3], b: [f64; 3], tol: f64) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= tol * (1.0 + y.abs()))
}

fn patch_like(
    offset: [f64; 3],
    scale: [f64; 3],
    dip: f64,
    strike: f64,
    anchor: [f64; 3],
) -> Transform {
    Transform::translate(offset)
        + Transform::scale(scale)
        + Transform::rotate_x(dip)
        + Transform::rotate_z(strike)
        + Transform::translate(anchor)
}

// ── Transform Properties ─────────────────────────────────────────────

proptest! {
    /// inverse(t)(t(x)) == x for any non-degenerate patch-style chain.
    #[test]
    fn transform_round_trip(
        ox in -1.0f64..1.0, oy in -1.0f64..1.0,
        sx in 1.0f64..1e5, sy in 1.0f64..1e5,
        dip in 0.0f64..std::f64::consts::PI,
        strike in -std::f64::consts::PI..std::f64::consts::PI,
        ax in -1e5f64..1e5, ay in -1e5f64..1e5, az in -1e4f64..0.0,
        px in -2.0f64..2.0, py in -2.0f64..2.0, pz in -2.0f64..2.0,
    ) {
        let t = patch_like([ox, oy, 0.0], [sx, sy, 1.0], dip, strike, [ax, ay, az]);
        let inv = t.inverse().unwrap();
        let p = [px, py, pz];
        let back = inv.apply_point(t.apply_point(p));
        prop_assert!(close3(back, p, 1e-8), "{:?} -> {:?}", p, back);
    }

    /// (a + b)(x) == b(a(x)).
    #[test]
    fn composition_applies_left_first(
        theta in -3.0f64..3.0,
        tx in -10.0f64..10.0,
        s in 0.1f64..10.0,
        px in -5.0f64..5.0, py in -5.0f64..5.0, pz in -5.0f64..5.0,
    ) {
        let a = Transform::rotate_z(theta);
        let b = Transform::scale([s, 1.0, 1.0]) + Transform::translate([tx, 0.0, 0.0]);
        let p = [px, py, pz];
        let lhs = (a + b).apply_point(p);
        let rhs = b.apply_point(a.apply_point(p));
        prop_assert!(close3(lhs, rhs, 1e-12));
    }

    /// Rotations preserve lengths.
    #[test]
    fn rotation_is_isometric(
        theta in -6.3f64..6.3,
        px in -5.0f64..5.0, py in -5.0f64..5.0, pz in -5.0f64..5.0,
    ) {
        let norm = |v: [f64; 3]| (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        let p = [px, py, pz];
        for t in [Transform::rotate_x(theta), Transform::rotate_z(theta)] {
            prop_assert!((norm(t.apply_point(p)) - norm(p)).abs() < 1e-12);
        }
    }
}

// ── NNLS Properties ──────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The active-set solution is feasible and satisfies the KKT conditions:
    /// the gradient vanishes on positive entries and is non-negative elsewhere.
    #[test]
    fn active_set_kkt(
        rows in 4usize..12,
        cols in 1usize..4,
        seed in 0u64..1000,
    ) {
        // Well-conditioned pseudo-random A: identity-dominant plus a smooth term.
        let a = Array2::from_shape_fn((rows, cols), |(i, j)| {
            let base = if i == j { 3.0 } else { 0.0 };
            base + ((i as f64 + 1.0) * (j as f64 + 2.0) * 0.37 + seed as f64).sin()
        });
        let b = Array1::from_shape_fn(rows, |i| ((i as f64) * 1.3 + seed as f64 * 0.1).cos());

        let sol = ActiveSetNnls::default().solve(a.view(), b.view()).unwrap();
        prop_assert!(sol.x.iter().all(|&v| v >= 0.0));

        let grad = a.t().dot(&(a.dot(&sol.x) - &b));
        let scale = a.t().dot(&b).iter().fold(1.0_f64, |m, v| m.max(v.abs()));
        for j in 0..cols {
            if sol.x[j] > 0.0 {
                prop_assert!(grad[j].abs() < 1e-8 * scale, "grad[{}] = {}", j, grad[j]);
            } else {
                prop_assert!(grad[j] > -1e-8 * scale, "grad[{}] = {}", j, grad[j]);
            }
        }
    }
}

// ── Laplacian Properties ─────────────────────────────────────────────

proptest! {
    /// Every row sums to zero and the centre weight equals minus the
    /// neighbour count.
    #[test]
    fn laplacian_rows_balanced(nl in 1usize..12, nw in 1usize..12) {
        let conn = Array2::from_shape_fn((nl, nw), |(i, j)| i * nw + j);
        let op = laplacian_operator(conn.view(), nl * nw).unwrap();
        prop_assert_eq!(op.dim(), (nl * nw, nl * nw));
        for i in 0..nl {
            for j in 0..nw {
                let row = op.row(i * nw + j);
                prop_assert!(row.sum().abs() < 1e-12);
                let neighbours = [i > 0, i + 1 < nl, j > 0, j + 1 < nw]
                    .iter()
                    .filter(|&&b| b)
                    .count();
                prop_assert_eq!(row[i * nw + j], -(neighbours as f64));
            }
        }
    }
}
