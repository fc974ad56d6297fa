// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — System Matrix Builder
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Dense forward operator G.
//!
//! Column `j` of G is the response of every observation row to unit slip on
//! patch `index.patch_of(j)` along basis direction `index.basis_of(j)`,
//! projected onto the row's measurement direction. Columns are independent,
//! so they are evaluated on the rayon pool when requested.

use ndarray::{s, Array1, Array2, ArrayView2};
use rayon::prelude::*;
use slip_types::error::{SlipError, SlipResult};
use tracing::{debug, info};

use crate::fault::FaultModel;
use crate::greens::{evaluate_checked, GreensKernel};

#[derive(Debug, Clone, Copy)]
pub struct SystemMatrixOptions {
    /// Evaluate columns in parallel.
    pub parallel: bool,
    /// Value of the leveling-offset column on leveling rows.
    pub leveling_offset_sign: f64,
}

impl Default for SystemMatrixOptions {
    fn default() -> Self {
        SystemMatrixOptions {
            parallel: true,
            leveling_offset_sign: 1.0,
        }
    }
}

fn column<K: GreensKernel + ?Sized>(
    j: usize,
    positions: ArrayView2<f64>,
    obs_basis: ArrayView2<f64>,
    model: &FaultModel,
    kernel: &K,
) -> SlipResult<Array1<f64>> {
    let patch = &model.patches[model.index.patch_of(j)];
    let disp = evaluate_checked(kernel, positions, model.column_direction(j), &patch.geometry())?;
    Ok((&disp * &obs_basis).sum_axis(ndarray::Axis(1)))
}

/// Build G for `(rows, 3)` Cartesian positions and `(rows, 3)` measurement
/// directions. The last `n_leveling` rows are leveling rows; when there are
/// any, one extra column holds `leveling_offset_sign` on exactly those rows.
pub fn build_system_matrix<K: GreensKernel + ?Sized>(
    positions: ArrayView2<f64>,
    obs_basis: ArrayView2<f64>,
    model: &FaultModel,
    n_leveling: usize,
    kernel: &K,
    options: SystemMatrixOptions,
) -> SlipResult<Array2<f64>> {
    let rows = positions.nrows();
    if positions.ncols() != 3 {
        return Err(SlipError::mismatch("observation positions (columns)", 3, positions.ncols()));
    }
    if obs_basis.dim() != (rows, 3) {
        return Err(SlipError::mismatch("observation basis", rows * 3, obs_basis.len()));
    }
    if n_leveling > rows {
        return Err(SlipError::mismatch("leveling rows", rows, n_leveling));
    }

    let n_slip = model.index.n_columns();
    let n_cols = n_slip + usize::from(n_leveling > 0);
    info!(rows, cols = n_cols, parallel = options.parallel, "building system matrix");

    let columns: Vec<Array1<f64>> = if options.parallel {
        (0..n_slip)
            .into_par_iter()
            .map(|j| column(j, positions, obs_basis, model, kernel))
            .collect::<SlipResult<Vec<_>>>()?
    } else {
        (0..n_slip)
            .map(|j| column(j, positions, obs_basis, model, kernel))
            .collect::<SlipResult<Vec<_>>>()?
    };

    let mut g = Array2::zeros((rows, n_cols));
    for (j, col) in columns.iter().enumerate() {
        g.column_mut(j).assign(col);
    }
    if n_leveling > 0 {
        g.slice_mut(s![rows - n_leveling.., n_slip])
            .fill(options.leveling_offset_sign);
        debug!(n_leveling, sign = options.leveling_offset_sign, "leveling offset column appended");
    }
    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::greens::KernelOutput;
    use crate::patch::PatchGeometry;
    use ndarray::array;
    use slip_types::config::FaultSegmentConfig;

    /// Displacement = slip direction scaled by patch reference x + 1.
    struct Linear;

    impl GreensKernel for Linear {
        fn evaluate(
            &self,
            observations: ArrayView2<f64>,
            slip: [f64; 3],
            patch: &PatchGeometry,
        ) -> SlipResult<KernelOutput> {
            let scale = 1.0 + patch.reference[0].abs() * 1e-3;
            let d = Array2::from_shape_fn((observations.nrows(), 3), |(i, c)| {
                slip[c] * scale * (1.0 + i as f64)
            });
            Ok(KernelOutput::exact(d))
        }
    }

    struct Failing;

    impl GreensKernel for Failing {
        fn evaluate(
            &self,
            _observations: ArrayView2<f64>,
            _slip: [f64; 3],
            _patch: &PatchGeometry,
        ) -> SlipResult<KernelOutput> {
            Err(SlipError::Kernel("singular geometry".to_string()))
        }
    }

    fn model() -> FaultModel {
        let f = FaultSegmentConfig {
            name: "s".to_string(),
            strike: 0.0,
            dip: 90.0,
            length: 4_000.0,
            width: 2_000.0,
            position: [0.0, 0.0, 0.0],
            n_length: 2,
            n_width: 1,
            basis: vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            penalty: 1.0,
        };
        FaultModel::assemble_cartesian(&[f], &[[0.0, 0.0, 0.0]]).unwrap()
    }

    fn rows() -> (Array2<f64>, Array2<f64>) {
        let pos = array![
            [1000.0, 0.0, 0.0],
            [1000.0, 0.0, 0.0],
            [0.0, 2000.0, 0.0],
            [0.0, 3000.0, 0.0]
        ];
        let basis = array![
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.6, 0.8, 0.0],
            [0.0, 0.0, 1.0]
        ];
        (pos, basis)
    }

    #[test]
    fn test_shape_and_projection() {
        let (pos, basis) = rows();
        let g = build_system_matrix(
            pos.view(),
            basis.view(),
            &model(),
            0,
            &Linear,
            SystemMatrixOptions::default(),
        )
        .unwrap();
        assert_eq!(g.dim(), (4, 4));
        // Column 1: basis (0, 1, 0). Row 1 has basis north -> 2 * scale.
        assert!(g[[0, 1]].abs() < 1e-12);
        assert!(g[[1, 1]] > 0.0);
        // Vertical row sees nothing from horizontal slip.
        assert!(g.row(3).iter().all(|v| v.abs() < 1e-12));
        // Row 2 dot (0.6, 0.8, 0) with (1, 0, 0).
        assert!((g[[2, 0]] / g[[2, 1]] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (pos, basis) = rows();
        let m = model();
        let par = build_system_matrix(
            pos.view(),
            basis.view(),
            &m,
            1,
            &Linear,
            SystemMatrixOptions {
                parallel: true,
                leveling_offset_sign: 1.0,
            },
        )
        .unwrap();
        let seq = build_system_matrix(
            pos.view(),
            basis.view(),
            &m,
            1,
            &Linear,
            SystemMatrixOptions {
                parallel: false,
                leveling_offset_sign: 1.0,
            },
        )
        .unwrap();
        assert_eq!(par, seq);
    }

    #[test]
    fn test_leveling_column() {
        let (pos, basis) = rows();
        let g = build_system_matrix(
            pos.view(),
            basis.view(),
            &model(),
            2,
            &Linear,
            SystemMatrixOptions {
                parallel: false,
                leveling_offset_sign: -1.0,
            },
        )
        .unwrap();
        assert_eq!(g.dim(), (4, 5));
        assert_eq!(g.column(4).to_vec(), vec![0.0, 0.0, -1.0, -1.0]);
    }

    #[test]
    fn test_kernel_error_propagates() {
        let (pos, basis) = rows();
        let err = build_system_matrix(
            pos.view(),
            basis.view(),
            &model(),
            0,
            &Failing,
            SystemMatrixOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SlipError::Kernel(_)));
    }

    #[test]
    fn test_too_many_leveling_rows() {
        let (pos, basis) = rows();
        assert!(build_system_matrix(
            pos.view(),
            basis.view(),
            &model(),
            5,
            &Linear,
            SystemMatrixOptions::default(),
        )
        .is_err());
    }
}
