// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Observations
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Geodetic observation sets and their normalization into one stacked
//! system.
//!
//! Row order of the stacked system is fixed: GPS (three rows per station,
//! east/north/up), then InSAR, then leveling. The leveling block is always
//! last because the datum-offset column of G targets the trailing rows.

use std::ops::Range;

use ndarray::{concatenate, s, Array1, Array2, ArrayView1, Axis};
use slip_types::error::{SlipError, SlipResult};

use crate::basis::cardinal_basis;

/// Accept `(N, 2)` (lon, lat) or `(N, 3)` (lon, lat, height) positions.
fn normalize_positions(positions: Array2<f64>, what: &str) -> SlipResult<Array2<f64>> {
    match positions.ncols() {
        3 => Ok(positions),
        2 => {
            let mut out = Array2::zeros((positions.nrows(), 3));
            out.slice_mut(s![.., ..2]).assign(&positions);
            Ok(out)
        }
        n => Err(SlipError::mismatch(format!("{what} positions (columns)"), 3, n)),
    }
}

fn check_finite<'a>(values: impl IntoIterator<Item = &'a f64>, what: &str) -> SlipResult<()> {
    if values.into_iter().any(|v| !v.is_finite()) {
        return Err(SlipError::config(format!("{what} contains non-finite values")));
    }
    Ok(())
}

fn check_sigma<'a>(values: impl IntoIterator<Item = &'a f64>, what: &str) -> SlipResult<()> {
    if values.into_iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return Err(SlipError::config(format!(
            "{what} uncertainties must be finite and > 0"
        )));
    }
    Ok(())
}

/// Three-component GPS displacements.
#[derive(Debug, Clone)]
pub struct GpsDataset {
    /// `(N, 3)` lon, lat, height.
    pub positions: Array2<f64>,
    /// `(N, 3)` east, north, up.
    pub displacements: Array2<f64>,
    /// `(N, 3)` one-sigma per component.
    pub sigmas: Array2<f64>,
}

impl GpsDataset {
    pub fn new(
        positions: Array2<f64>,
        displacements: Array2<f64>,
        sigmas: Array2<f64>,
    ) -> SlipResult<Self> {
        let dataset = GpsDataset {
            positions: normalize_positions(positions, "GPS")?,
            displacements,
            sigmas,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Shape, finiteness and sigma checks. Re-run by [`Observations::stack`]
    /// since the fields are public.
    pub fn validate(&self) -> SlipResult<()> {
        let n = self.positions.nrows();
        if self.positions.ncols() != 3 {
            return Err(SlipError::mismatch(
                "GPS positions (columns)",
                3,
                self.positions.ncols(),
            ));
        }
        if self.displacements.dim() != (n, 3) {
            return Err(SlipError::mismatch(
                "GPS displacements",
                n * 3,
                self.displacements.len(),
            ));
        }
        if self.sigmas.dim() != (n, 3) {
            return Err(SlipError::mismatch("GPS sigmas", n * 3, self.sigmas.len()));
        }
        check_finite(self.positions.iter(), "GPS positions")?;
        check_finite(self.displacements.iter(), "GPS displacements")?;
        check_sigma(self.sigmas.iter(), "GPS")
    }

    pub fn empty() -> Self {
        GpsDataset {
            positions: Array2::zeros((0, 3)),
            displacements: Array2::zeros((0, 3)),
            sigmas: Array2::zeros((0, 3)),
        }
    }

    /// Number of stations.
    pub fn len(&self) -> usize {
        self.positions.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for GpsDataset {
    fn default() -> Self {
        Self::empty()
    }
}

/// Scalar displacements along a per-row unit direction (InSAR line of
/// sight, leveling vertical).
#[derive(Debug, Clone)]
pub struct ScalarDataset {
    pub positions: Array2<f64>,
    pub displacements: Array1<f64>,
    pub sigmas: Array1<f64>,
    /// `(N, 3)` east, north, up components of the measurement direction.
    pub basis: Array2<f64>,
}

impl ScalarDataset {
    pub fn new(
        positions: Array2<f64>,
        displacements: Array1<f64>,
        sigmas: Array1<f64>,
        basis: Array2<f64>,
    ) -> SlipResult<Self> {
        let dataset = ScalarDataset {
            positions: normalize_positions(positions, "scalar observation")?,
            displacements,
            sigmas,
            basis,
        };
        dataset.validate()?;
        Ok(dataset)
    }

    /// Shape, finiteness and sigma checks. Re-run by [`Observations::stack`].
    pub fn validate(&self) -> SlipResult<()> {
        let n = self.positions.nrows();
        if self.positions.ncols() != 3 {
            return Err(SlipError::mismatch(
                "scalar observation positions (columns)",
                3,
                self.positions.ncols(),
            ));
        }
        if self.displacements.len() != n {
            return Err(SlipError::mismatch(
                "scalar observation displacements",
                n,
                self.displacements.len(),
            ));
        }
        if self.sigmas.len() != n {
            return Err(SlipError::mismatch(
                "scalar observation sigmas",
                n,
                self.sigmas.len(),
            ));
        }
        if self.basis.nrows() != n {
            return Err(SlipError::mismatch(
                "scalar observation basis",
                n,
                self.basis.nrows(),
            ));
        }
        if self.basis.ncols() != 3 {
            return Err(SlipError::mismatch(
                "scalar observation basis (columns)",
                3,
                self.basis.ncols(),
            ));
        }
        check_finite(self.positions.iter(), "observation positions")?;
        check_finite(self.displacements.iter(), "observation displacements")?;
        check_finite(self.basis.iter(), "observation basis")?;
        check_sigma(self.sigmas.iter(), "observation")?;
        if self
            .basis
            .rows()
            .into_iter()
            .any(|r| r.iter().all(|v| *v == 0.0))
        {
            return Err(SlipError::config("observation basis rows must be non-zero"));
        }
        Ok(())
    }

    /// Vertical-only measurements (basis `[0, 0, 1]`), as for leveling.
    pub fn vertical(
        positions: Array2<f64>,
        displacements: Array1<f64>,
        sigmas: Array1<f64>,
    ) -> SlipResult<Self> {
        let n = positions.nrows();
        let basis = Array2::from_shape_fn((n, 3), |(_, c)| if c == 2 { 1.0 } else { 0.0 });
        Self::new(positions, displacements, sigmas, basis)
    }

    pub fn empty() -> Self {
        ScalarDataset {
            positions: Array2::zeros((0, 3)),
            displacements: Array1::zeros(0),
            sigmas: Array1::zeros(0),
            basis: Array2::zeros((0, 3)),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ScalarDataset {
    fn default() -> Self {
        Self::empty()
    }
}

/// All observations of one inversion run. Absent kinds are empty datasets.
#[derive(Debug, Clone, Default)]
pub struct Observations {
    pub gps: GpsDataset,
    pub insar: ScalarDataset,
    pub leveling: ScalarDataset,
}

/// Observations flattened to one row per scalar measurement.
#[derive(Debug, Clone)]
pub struct StackedObservations {
    pub displacement: Array1<f64>,
    pub sigma: Array1<f64>,
    /// `(rows, 3)` measurement direction per row.
    pub basis: Array2<f64>,
    /// `(rows, 3)` geodetic position per row.
    pub positions_geo: Array2<f64>,
    pub n_gps: usize,
    pub n_insar: usize,
    pub n_leveling: usize,
}

/// Predicted (or any per-row) displacement split back per dataset.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    /// `(n_gps, 3)` east, north, up.
    pub gps: Array2<f64>,
    pub insar: Array1<f64>,
    pub leveling: Array1<f64>,
}

impl Observations {
    pub fn new(gps: GpsDataset, insar: ScalarDataset, leveling: ScalarDataset) -> Self {
        Observations {
            gps,
            insar,
            leveling,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.gps.is_empty() && self.insar.is_empty() && self.leveling.is_empty()
    }

    /// Concatenate GPS (3 rows per station), InSAR and leveling rows.
    pub fn stack(&self) -> SlipResult<StackedObservations> {
        self.gps.validate()?;
        self.insar.validate()?;
        self.leveling.validate()?;

        let n_gps = self.gps.len();
        let gps_rows = n_gps * 3;

        let gps_disp = Array1::from_iter(self.gps.displacements.iter().copied());
        let gps_sigma = Array1::from_iter(self.gps.sigmas.iter().copied());
        let gps_basis = cardinal_basis(n_gps)
            .into_shape_with_order((gps_rows, 3))
            .map_err(|e| SlipError::config(format!("GPS basis reshape: {e}")))?;
        let mut gps_pos = Array2::zeros((gps_rows, 3));
        for (i, station) in self.gps.positions.rows().into_iter().enumerate() {
            for c in 0..3 {
                gps_pos.row_mut(3 * i + c).assign(&station);
            }
        }

        let cat1 = |parts: [ArrayView1<f64>; 3]| {
            concatenate(Axis(0), &parts)
                .map_err(|e| SlipError::config(format!("observation stacking: {e}")))
        };
        let displacement = cat1([
            gps_disp.view(),
            self.insar.displacements.view(),
            self.leveling.displacements.view(),
        ])?;
        let sigma = cat1([
            gps_sigma.view(),
            self.insar.sigmas.view(),
            self.leveling.sigmas.view(),
        ])?;
        let basis = concatenate(
            Axis(0),
            &[gps_basis.view(), self.insar.basis.view(), self.leveling.basis.view()],
        )
        .map_err(|e| SlipError::config(format!("observation stacking: {e}")))?;
        let positions_geo = concatenate(
            Axis(0),
            &[
                gps_pos.view(),
                self.insar.positions.view(),
                self.leveling.positions.view(),
            ],
        )
        .map_err(|e| SlipError::config(format!("observation stacking: {e}")))?;

        let stacked = StackedObservations {
            displacement,
            sigma,
            basis,
            positions_geo,
            n_gps,
            n_insar: self.insar.len(),
            n_leveling: self.leveling.len(),
        };
        stacked.check()?;
        Ok(stacked)
    }
}

impl StackedObservations {
    pub fn rows(&self) -> usize {
        self.displacement.len()
    }

    pub fn gps_rows(&self) -> Range<usize> {
        0..3 * self.n_gps
    }

    pub fn insar_rows(&self) -> Range<usize> {
        let start = 3 * self.n_gps;
        start..start + self.n_insar
    }

    pub fn leveling_rows(&self) -> Range<usize> {
        let start = 3 * self.n_gps + self.n_insar;
        start..start + self.n_leveling
    }

    /// All per-row arrays must agree with the tracked dataset counts.
    pub fn check(&self) -> SlipResult<()> {
        let rows = 3 * self.n_gps + self.n_insar + self.n_leveling;
        for (what, found) in [
            ("stacked displacement", self.displacement.len()),
            ("stacked sigma", self.sigma.len()),
            ("stacked basis", self.basis.nrows()),
            ("stacked positions", self.positions_geo.nrows()),
        ] {
            if found != rows {
                return Err(SlipError::mismatch(what, rows, found));
            }
        }
        Ok(())
    }

    /// Split a per-row vector into GPS / InSAR / leveling parts.
    pub fn split(&self, values: ArrayView1<f64>) -> SlipResult<DatasetSplit> {
        if values.len() != self.rows() {
            return Err(SlipError::mismatch("per-row values", self.rows(), values.len()));
        }
        let gps = values
            .slice(s![self.gps_rows()])
            .to_owned()
            .into_shape_with_order((self.n_gps, 3))
            .map_err(|e| SlipError::config(format!("GPS reshape: {e}")))?;
        Ok(DatasetSplit {
            gps,
            insar: values.slice(s![self.insar_rows()]).to_owned(),
            leveling: values.slice(s![self.leveling_rows()]).to_owned(),
        })
    }

    /// (lon, lat) columns, used to centre the projection.
    pub fn lon_lat(&self) -> (Vec<f64>, Vec<f64>) {
        (
            self.positions_geo.column(0).to_vec(),
            self.positions_geo.column(1).to_vec(),
        )
    }
}
