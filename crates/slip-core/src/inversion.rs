// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Inversion Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! End-to-end slip inversion.
//!
//! Pipeline:
//! 1. stack observations (GPS, InSAR, leveling) and centre the projection
//! 2. assemble the fault model and its regularization blocks
//! 3. build G, weight rows and data by 1/σ
//! 4. solve `min ||[G/σ; L] x - [d/σ; 0]||` subject to `x ≥ 0`
//! 5. split the solution into slip, leveling offset and predictions

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ndarray::{concatenate, Array1, Array2, Axis};
use slip_math::linalg::vstack_padded;
use slip_math::nnls::{ActiveSetNnls, NonNegativeSolver, ProjectedGradientNnls};
use slip_types::config::{FaultSegmentConfig, InversionConfig, SolverConfig, SolverKind};
use slip_types::error::{SlipError, SlipResult};
use tracing::{debug, info};

use crate::basis::cardinal_components;
use crate::fault::{FaultModel, SlipIndex};
use crate::gbuild::{build_system_matrix, SystemMatrixOptions};
use crate::greens::GreensKernel;
use crate::observations::{DatasetSplit, Observations, StackedObservations};
use crate::patch::GeometryWarning;
use crate::projection::Projection;

/// Run-time switches of one inversion.
#[derive(Debug, Clone)]
pub struct InversionOptions {
    pub leveling_offset_sign: f64,
    pub parallel: bool,
    /// Checked once, right before the constrained solve.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl Default for InversionOptions {
    fn default() -> Self {
        InversionOptions {
            leveling_offset_sign: 1.0,
            parallel: true,
            cancel: None,
        }
    }
}

/// Solved slip of one patch, in geodetic coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchSlip {
    /// Index into [`FaultModel::segments`].
    pub segment: usize,
    /// Top centre as (lon, lat, height).
    pub top_center: [f64; 3],
    pub strike: f64,
    pub dip: f64,
    pub length: f64,
    pub width: f64,
    /// Strike-slip, dip-slip, opening.
    pub slip: [f64; 3],
}

impl PatchSlip {
    pub fn area(&self) -> f64 {
        self.length * self.width
    }
}

/// Everything an inversion run produces.
#[derive(Debug, Clone)]
pub struct InversionResult {
    /// `(n_patches, n_basis)` non-negative basis coefficients.
    pub slip: Array2<f64>,
    /// `(n_patches, 3)` slip along strike, dip and normal.
    pub cardinal_slip: Array2<f64>,
    /// Leveling datum shift in displacement units, when leveling data exist.
    pub leveling_offset: Option<f64>,
    /// Predicted displacement per dataset.
    pub predicted: DatasetSplit,
    /// Predicted displacement per stacked row.
    pub predicted_rows: Array1<f64>,
    pub patches: Vec<PatchSlip>,
    /// Raw solver vector, offset coefficient included.
    pub solution: Array1<f64>,
    /// `||A x - b||₂` of the weighted, regularized system.
    pub residual: f64,
    pub iterations: usize,
    pub solver: &'static str,
    /// Unweighted forward operator.
    pub system_matrix: Array2<f64>,
    pub regularization: Array2<f64>,
    pub observations: StackedObservations,
    pub index: SlipIndex,
    pub warnings: Vec<GeometryWarning>,
}

/// Instantiate the solver selected in `config`; zero fields keep the
/// solver's defaults.
pub fn solver_from_config(config: &SolverConfig) -> Box<dyn NonNegativeSolver> {
    match config.kind {
        SolverKind::ActiveSet => {
            let mut s = ActiveSetNnls::default();
            if config.max_iterations > 0 {
                s.max_iterations = config.max_iterations;
            }
            if config.tolerance > 0.0 {
                s.tolerance = config.tolerance;
            }
            Box::new(s)
        }
        SolverKind::ProjectedGradient => {
            let mut s = ProjectedGradientNnls::default();
            if config.max_iterations > 0 {
                s.max_iterations = config.max_iterations;
            }
            if config.tolerance > 0.0 {
                s.tolerance = config.tolerance;
            }
            Box::new(s)
        }
    }
}

/// Inversion driver over a projection and a Green's-function kernel.
pub struct SlipInversion<P: Projection, K: GreensKernel> {
    projection: P,
    kernel: K,
    solver: Box<dyn NonNegativeSolver>,
    options: InversionOptions,
}

impl<P: Projection, K: GreensKernel> SlipInversion<P, K> {
    /// Driver with the active-set solver and default options.
    pub fn new(projection: P, kernel: K) -> Self {
        SlipInversion {
            projection,
            kernel,
            solver: Box::new(ActiveSetNnls::default()),
            options: InversionOptions::default(),
        }
    }

    /// Driver configured from the non-geometric parts of `config`.
    pub fn from_config(config: &InversionConfig, projection: P, kernel: K) -> SlipResult<Self> {
        config.validate()?;
        Ok(SlipInversion {
            projection,
            kernel,
            solver: solver_from_config(&config.solver),
            options: InversionOptions {
                leveling_offset_sign: config.leveling_offset_sign,
                parallel: config.parallel,
                cancel: None,
            },
        })
    }

    pub fn with_solver(mut self, solver: Box<dyn NonNegativeSolver>) -> Self {
        self.solver = solver;
        self
    }

    pub fn with_options(mut self, options: InversionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.options.cancel = Some(flag);
        self
    }

    pub fn options(&self) -> &InversionOptions {
        &self.options
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    fn cancelled(&self) -> bool {
        self.options
            .cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Invert `observations` for slip on `faults`.
    pub fn run(
        &self,
        faults: &[FaultSegmentConfig],
        observations: &Observations,
    ) -> SlipResult<InversionResult> {
        let sign = self.options.leveling_offset_sign;
        if !sign.is_finite() || sign == 0.0 {
            return Err(SlipError::config(
                "leveling_offset_sign must be finite and non-zero",
            ));
        }
        if observations.is_empty() {
            return Err(SlipError::config("no observations to invert"));
        }

        let stacked = observations.stack()?;
        let (lons, lats) = stacked.lon_lat();
        let context = self.projection.make_context(&lons, &lats);
        debug!(?context, "projection context");

        let model = FaultModel::assemble(faults, &self.projection, &context)?;
        let positions = self
            .projection
            .geodetic_to_cartesian(stacked.positions_geo.view(), &context)?;

        let n_leveling = stacked.n_leveling;
        let g = build_system_matrix(
            positions.view(),
            stacked.basis.view(),
            &model,
            n_leveling,
            &self.kernel,
            SystemMatrixOptions {
                parallel: self.options.parallel,
                leveling_offset_sign: sign,
            },
        )?;
        let l = model.regularization(n_leveling > 0);

        let inv_sigma = stacked.sigma.mapv(|s| 1.0 / s);
        let g_weighted = &g * &inv_sigma.view().insert_axis(Axis(1));
        let d_weighted = &stacked.displacement * &inv_sigma;
        let a = vstack_padded(g_weighted.view(), l.view());
        let b = concatenate(Axis(0), &[d_weighted.view(), Array1::zeros(l.nrows()).view()])
            .map_err(|e| SlipError::config(format!("right-hand side stacking: {e}")))?;

        if self.cancelled() {
            info!("inversion cancelled before solve");
            return Err(SlipError::Cancelled);
        }

        info!(
            solver = self.solver.name(),
            rows = a.nrows(),
            cols = a.ncols(),
            data_rows = stacked.rows(),
            "solving regularized NNLS"
        );
        let solution = self.solver.solve(a.view(), b.view())?;

        let index = model.index;
        let slip = index.reshape(solution.x.view())?;
        let leveling_offset = (n_leveling > 0).then(|| solution.x[index.n_columns()] * sign);
        let cardinal_slip = cardinal_components(slip.view(), model.slip_basis.view())?;

        let predicted_rows = g.dot(&solution.x);
        let predicted = stacked.split(predicted_rows.view())?;

        let patches = self.patch_report(&model, &cardinal_slip, &context)?;
        info!(
            residual = solution.residual,
            iterations = solution.iterations,
            max_slip = cardinal_slip.iter().fold(0.0_f64, |m, v| m.max(v.abs())),
            "inversion finished"
        );

        Ok(InversionResult {
            slip,
            cardinal_slip,
            leveling_offset,
            predicted,
            predicted_rows,
            patches,
            residual: solution.residual,
            iterations: solution.iterations,
            solution: solution.x,
            solver: self.solver.name(),
            system_matrix: g,
            regularization: l,
            observations: stacked,
            index,
            warnings: model.warnings,
        })
    }

    fn patch_report(
        &self,
        model: &FaultModel,
        cardinal_slip: &Array2<f64>,
        context: &P::Context,
    ) -> SlipResult<Vec<PatchSlip>> {
        let tops = Array2::from_shape_fn((model.n_patches(), 3), |(i, c)| {
            model.patches[i].top_center()[c]
        });
        let tops_geo = self.projection.cartesian_to_geodetic(tops.view(), context)?;
        let mut out = Vec::with_capacity(model.n_patches());
        for (s, segment) in model.segments.iter().enumerate() {
            for i in segment.patches.clone() {
                let p = &model.patches[i];
                out.push(PatchSlip {
                    segment: s,
                    top_center: [tops_geo[[i, 0]], tops_geo[[i, 1]], tops_geo[[i, 2]]],
                    strike: p.strike(),
                    dip: p.dip(),
                    length: p.length(),
                    width: p.width(),
                    slip: [
                        cardinal_slip[[i, 0]],
                        cardinal_slip[[i, 1]],
                        cardinal_slip[[i, 2]],
                    ],
                });
            }
        }
        Ok(out)
    }
}
