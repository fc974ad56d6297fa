// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Affine Transform
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Composable 3-D affine transforms stored as 4×4 homogeneous matrices.
//!
//! Transforms compose left to right: `(a + b).apply(x)` applies `a` first and
//! then `b`, so a chain reads in the order the operations happen:
//!
//! ```text
//! translate(-anchor) + scale(l, w, 1) + rotate_x(dip) + rotate_z(θ) + translate(p)
//! ```

use std::ops::Add;

use ndarray::{Array2, ArrayView2};
use slip_types::error::{SlipError, SlipResult};

/// Pivots below this are treated as a singular linear part.
const SINGULAR_DET: f64 = 1e-300;

/// Row-major homogeneous matrix acting on column vectors `[x, y, z, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    m: [[f64; 4]; 4],
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn translate(v: [f64; 3]) -> Self {
        let mut t = Self::IDENTITY;
        t.m[0][3] = v[0];
        t.m[1][3] = v[1];
        t.m[2][3] = v[2];
        t
    }

    /// Anisotropic scale along the three axes.
    pub fn scale(v: [f64; 3]) -> Self {
        let mut t = Self::IDENTITY;
        t.m[0][0] = v[0];
        t.m[1][1] = v[1];
        t.m[2][2] = v[2];
        t
    }

    /// Counter-clockwise rotation about +x by `theta` radians.
    pub fn rotate_x(theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        let mut t = Self::IDENTITY;
        t.m[1][1] = c;
        t.m[1][2] = -s;
        t.m[2][1] = s;
        t.m[2][2] = c;
        t
    }

    /// Counter-clockwise rotation about +z by `theta` radians.
    pub fn rotate_z(theta: f64) -> Self {
        let (s, c) = theta.sin_cos();
        let mut t = Self::IDENTITY;
        t.m[0][0] = c;
        t.m[0][1] = -s;
        t.m[1][0] = s;
        t.m[1][1] = c;
        t
    }

    /// `self` followed by `next`.
    pub fn then(self, next: Transform) -> Transform {
        let mut out = [[0.0; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = (0..4).map(|k| next.m[i][k] * self.m[k][j]).sum();
            }
        }
        Transform { m: out }
    }

    pub fn apply_point(&self, p: [f64; 3]) -> [f64; 3] {
        let m = &self.m;
        [
            m[0][0] * p[0] + m[0][1] * p[1] + m[0][2] * p[2] + m[0][3],
            m[1][0] * p[0] + m[1][1] * p[1] + m[1][2] * p[2] + m[1][3],
            m[2][0] * p[0] + m[2][1] * p[1] + m[2][2] * p[2] + m[2][3],
        ]
    }

    /// Apply to an `(N, 3)` array of points.
    pub fn apply(&self, points: ArrayView2<f64>) -> SlipResult<Array2<f64>> {
        if points.ncols() != 3 {
            return Err(SlipError::mismatch("transform points (columns)", 3, points.ncols()));
        }
        let mut out = Array2::zeros(points.raw_dim());
        for (src, mut dst) in points.outer_iter().zip(out.outer_iter_mut()) {
            let q = self.apply_point([src[0], src[1], src[2]]);
            dst[0] = q[0];
            dst[1] = q[1];
            dst[2] = q[2];
        }
        Ok(out)
    }

    /// Inverse of an affine transform: `[A t]⁻¹ = [A⁻¹  -A⁻¹ t]`.
    pub fn inverse(&self) -> SlipResult<Transform> {
        let a = &self.m;
        let cof = [
            [
                a[1][1] * a[2][2] - a[1][2] * a[2][1],
                a[0][2] * a[2][1] - a[0][1] * a[2][2],
                a[0][1] * a[1][2] - a[0][2] * a[1][1],
            ],
            [
                a[1][2] * a[2][0] - a[1][0] * a[2][2],
                a[0][0] * a[2][2] - a[0][2] * a[2][0],
                a[0][2] * a[1][0] - a[0][0] * a[1][2],
            ],
            [
                a[1][0] * a[2][1] - a[1][1] * a[2][0],
                a[0][1] * a[2][0] - a[0][0] * a[2][1],
                a[0][0] * a[1][1] - a[0][1] * a[1][0],
            ],
        ];
        let det = a[0][0] * cof[0][0] + a[0][1] * cof[1][0] + a[0][2] * cof[2][0];
        if !det.is_finite() || det.abs() < SINGULAR_DET {
            return Err(SlipError::config(format!(
                "transform is not invertible (det = {det:e})"
            )));
        }

        let mut inv = Self::IDENTITY;
        for i in 0..3 {
            for j in 0..3 {
                inv.m[i][j] = cof[i][j] / det;
            }
        }
        for i in 0..3 {
            inv.m[i][3] = -(0..3).map(|k| inv.m[i][k] * a[k][3]).sum::<f64>();
        }
        Ok(inv)
    }
}

impl Add for Transform {
    type Output = Transform;

    fn add(self, rhs: Transform) -> Transform {
        self.then(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::f64::consts::FRAC_PI_2;

    fn close(a: [f64; 3], b: [f64; 3], tol: f64) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < tol)
    }

    #[test]
    fn test_translate_then_scale_order() {
        let t = Transform::translate([1.0, 0.0, 0.0]) + Transform::scale([2.0, 3.0, 4.0]);
        // translate first: (1,1,1) -> (2,1,1), then scale -> (4,3,4)
        assert!(close(t.apply_point([1.0, 1.0, 1.0]), [4.0, 3.0, 4.0], 1e-14));

        let u = Transform::scale([2.0, 3.0, 4.0]) + Transform::translate([1.0, 0.0, 0.0]);
        assert!(close(u.apply_point([1.0, 1.0, 1.0]), [3.0, 3.0, 4.0], 1e-14));
    }

    #[test]
    fn test_rotate_z_quarter_turn() {
        let t = Transform::rotate_z(FRAC_PI_2);
        assert!(close(t.apply_point([1.0, 0.0, 0.0]), [0.0, 1.0, 0.0], 1e-14));
        assert!(close(t.apply_point([0.0, 1.0, 0.0]), [-1.0, 0.0, 0.0], 1e-14));
    }

    #[test]
    fn test_rotate_x_quarter_turn() {
        let t = Transform::rotate_x(FRAC_PI_2);
        assert!(close(t.apply_point([0.0, 1.0, 0.0]), [0.0, 0.0, 1.0], 1e-14));
        assert!(close(t.apply_point([0.0, 0.0, 1.0]), [0.0, -1.0, 0.0], 1e-14));
    }

    #[test]
    fn test_composition_associative() {
        let a = Transform::translate([1.0, -2.0, 0.5]);
        let b = Transform::rotate_x(0.3);
        let c = Transform::scale([2.0, 0.5, 1.5]);
        let left = (a + b) + c;
        let right = a + (b + c);
        let p = [0.7, -1.1, 3.0];
        assert!(close(left.apply_point(p), right.apply_point(p), 1e-12));
    }

    #[test]
    fn test_inverse_round_trip() {
        let t = Transform::translate([-0.5, -1.0, 0.0])
            + Transform::scale([2.0e5, 6.0e4, 1.0])
            + Transform::rotate_x(45f64.to_radians())
            + Transform::rotate_z(20f64.to_radians())
            + Transform::translate([1.0e3, -2.0e3, 0.0]);
        let inv = t.inverse().unwrap();
        for p in [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.25, 0.8, -3.0]] {
            let back = inv.apply_point(t.apply_point(p));
            assert!(close(back, p, 1e-9), "{back:?} vs {p:?}");
        }
    }

    #[test]
    fn test_zero_scale_not_invertible() {
        let t = Transform::scale([1.0, 0.0, 1.0]);
        assert!(matches!(t.inverse(), Err(SlipError::Configuration(_))));
    }

    #[test]
    fn test_apply_batch_matches_point() {
        let t = Transform::rotate_z(0.4) + Transform::translate([3.0, 4.0, -1.0]);
        let pts = array![[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]];
        let out = t.apply(pts.view()).unwrap();
        for i in 0..2 {
            let q = t.apply_point([pts[[i, 0]], pts[[i, 1]], pts[[i, 2]]]);
            assert!(close([out[[i, 0]], out[[i, 1]], out[[i, 2]]], q, 1e-14));
        }
    }

    #[test]
    fn test_apply_rejects_wrong_width() {
        let pts = array![[0.0, 1.0]];
        assert!(Transform::IDENTITY.apply(pts.view()).is_err());
    }
}
