// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Inversion Metrics
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Data misfit and moment summaries of a solved model.

use std::ops::Range;

use slip_types::constants::SHEAR_MODULUS;

use crate::inversion::InversionResult;

/// Misfit of one dataset. Means skip non-finite entries over stacked rows;
/// `npts` counts measurement points (stations for GPS).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetMisfit {
    pub mean_abs: f64,
    /// Mean of `|residual| / σ`.
    pub mean_normalized: f64,
    pub npts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Misfit {
    pub gps: DatasetMisfit,
    pub insar: DatasetMisfit,
    pub leveling: DatasetMisfit,
}

fn finite_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

impl InversionResult {
    fn dataset_misfit(&self, rows: Range<usize>, npts: usize) -> DatasetMisfit {
        let obs = &self.observations;
        let residual = |i: usize| (obs.displacement[i] - self.predicted_rows[i]).abs();
        DatasetMisfit {
            mean_abs: finite_mean(rows.clone().map(residual)),
            mean_normalized: finite_mean(rows.clone().map(|i| residual(i) / obs.sigma[i])),
            npts,
        }
    }

    /// Per-dataset residual statistics; empty datasets report NaN means.
    pub fn misfit(&self) -> Misfit {
        let obs = &self.observations;
        Misfit {
            gps: self.dataset_misfit(obs.gps_rows(), obs.n_gps),
            insar: self.dataset_misfit(obs.insar_rows(), obs.n_insar),
            leveling: self.dataset_misfit(obs.leveling_rows(), obs.n_leveling),
        }
    }

    /// Scalar seismic moment `Σ μ · A · |s|` (N·m) from in-plane slip
    /// (strike-slip and dip-slip); opening does not contribute.
    pub fn seismic_moment(&self, shear_modulus: f64) -> f64 {
        self.patches
            .iter()
            .map(|p| shear_modulus * p.area() * p.slip[0].hypot(p.slip[1]))
            .sum()
    }

    /// Moment magnitude from the moment at the default shear modulus.
    /// Returns `-inf` for a slip-free model.
    pub fn moment_magnitude(&self) -> f64 {
        moment_magnitude(self.seismic_moment(SHEAR_MODULUS))
    }
}

/// `Mw = 2/3 · log10(M0 · 1e7) - 10.7` with `M0` in N·m.
pub fn moment_magnitude(moment: f64) -> f64 {
    2.0 / 3.0 * (moment * 1.0e7).log10() - 10.7
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magnitude_reference_values() {
        // 1e7 dyne-cm scale: M0 = 1e19 N·m -> Mw = 2/3 * 26 - 10.7.
        let mw = moment_magnitude(1.0e19);
        assert!((mw - (2.0 / 3.0 * 26.0 - 10.7)).abs() < 1e-12);
        assert!(moment_magnitude(0.0).is_infinite());
    }

    #[test]
    fn test_finite_mean_skips_nan() {
        let m = finite_mean([1.0, f64::NAN, 3.0].into_iter());
        assert_eq!(m, 2.0);
        assert!(finite_mean(std::iter::empty()).is_nan());
    }
}
