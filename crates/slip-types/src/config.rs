// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Config
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
use serde::{Deserialize, Serialize};

use crate::error::{SlipError, SlipResult};

/// Top-level inversion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InversionConfig {
    /// Fault segments, processed in order.
    pub faults: Vec<FaultSegmentConfig>,
    /// Sign of the leveling datum-offset column (default: +1).
    #[serde(default = "default_leveling_offset_sign")]
    pub leveling_offset_sign: f64,
    /// Evaluate Green's-function columns on the rayon pool (default: true).
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    #[serde(default)]
    pub solver: SolverConfig,
}

/// One rupture segment, discretized into `n_length × n_width` patches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultSegmentConfig {
    #[serde(default)]
    pub name: String,
    /// Strike in degrees clockwise from north.
    pub strike: f64,
    /// Dip in degrees from horizontal.
    pub dip: f64,
    /// Along-strike length (m).
    pub length: f64,
    /// Down-dip width (m).
    pub width: f64,
    /// Top-centre anchor as (lon, lat, height).
    pub position: [f64; 3],
    #[serde(rename = "Nlength")]
    pub n_length: usize,
    #[serde(rename = "Nwidth")]
    pub n_width: usize,
    /// Slip directions in the patch frame (strike-slip, dip-slip, opening).
    pub basis: Vec<[f64; 3]>,
    /// Smoothing weight applied to this segment's Laplacian block.
    pub penalty: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SolverKind {
    /// Lawson–Hanson active set.
    #[default]
    ActiveSet,
    /// Accelerated projected gradient.
    ProjectedGradient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub kind: SolverKind,
    /// Iteration cap; 0 selects the solver's own default.
    #[serde(default)]
    pub max_iterations: usize,
    /// Optimality tolerance; 0 selects the solver's own default.
    #[serde(default)]
    pub tolerance: f64,
}

fn default_leveling_offset_sign() -> f64 {
    1.0
}
fn default_parallel() -> bool {
    true
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            kind: SolverKind::ActiveSet,
            max_iterations: 0,
            tolerance: 0.0,
        }
    }
}

impl FaultSegmentConfig {
    pub fn patch_count(&self) -> usize {
        self.n_length * self.n_width
    }

    /// Checks everything that can be checked before any geometry is built.
    pub fn validate(&self) -> SlipResult<()> {
        let label = if self.name.is_empty() {
            "fault segment"
        } else {
            self.name.as_str()
        };
        for (field, value) in [
            ("strike", self.strike),
            ("dip", self.dip),
            ("length", self.length),
            ("width", self.width),
        ] {
            if !value.is_finite() {
                return Err(SlipError::config(format!("{label}: {field} must be finite")));
            }
        }
        if self.length <= 0.0 || self.width <= 0.0 {
            return Err(SlipError::config(format!(
                "{label}: length and width must be > 0 (got {} x {})",
                self.length, self.width
            )));
        }
        if self.position.iter().any(|v| !v.is_finite()) {
            return Err(SlipError::config(format!("{label}: position must be finite")));
        }
        if self.patch_count() == 0 {
            return Err(SlipError::config(format!(
                "{label}: declares zero patches (Nlength={}, Nwidth={})",
                self.n_length, self.n_width
            )));
        }
        if self.basis.is_empty() {
            return Err(SlipError::config(format!(
                "{label}: at least one slip basis direction is required"
            )));
        }
        if self
            .basis
            .iter()
            .any(|b| b.iter().any(|v| !v.is_finite()) || b.iter().all(|v| *v == 0.0))
        {
            return Err(SlipError::config(format!(
                "{label}: slip basis directions must be finite and non-zero"
            )));
        }
        if !self.penalty.is_finite() || self.penalty < 0.0 {
            return Err(SlipError::config(format!(
                "{label}: penalty must be finite and >= 0 (got {})",
                self.penalty
            )));
        }
        Ok(())
    }
}

/// Validate each segment and the shared basis count; returns that count.
pub fn validate_segments(faults: &[FaultSegmentConfig]) -> SlipResult<usize> {
    let first = faults
        .first()
        .ok_or_else(|| SlipError::config("at least one fault segment is required"))?;
    for fault in faults {
        fault.validate()?;
    }
    let ds = first.basis.len();
    if let Some(other) = faults.iter().find(|f| f.basis.len() != ds) {
        return Err(SlipError::config(format!(
            "all segments must share the same number of slip basis directions: \
             expected {ds}, segment '{}' has {}",
            other.name,
            other.basis.len()
        )));
    }
    Ok(ds)
}

impl InversionConfig {
    /// Load from a JSON file.
    pub fn from_file(path: &str) -> SlipResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> SlipResult<()> {
        validate_segments(&self.faults)?;
        if !self.leveling_offset_sign.is_finite() || self.leveling_offset_sign == 0.0 {
            return Err(SlipError::config(
                "leveling_offset_sign must be finite and non-zero",
            ));
        }
        if !self.solver.tolerance.is_finite() || self.solver.tolerance < 0.0 {
            return Err(SlipError::config("solver.tolerance must be finite and >= 0"));
        }
        Ok(())
    }
}
