// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Fault Assembler
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Flattens fault segments into one globally indexed patch list.
//!
//! Every unknown of the inversion is a (patch, basis direction) pair.
//! [`SlipIndex`] is the single place that maps between that pair and the
//! column of G, the column of L and the position in the solution vector.

use std::ops::Range;

use ndarray::{Array2, Array3, ArrayView1};
use slip_types::config::{validate_segments, FaultSegmentConfig};
use slip_types::error::{SlipError, SlipResult};
use tracing::{debug, info};

use crate::patch::{GeometryWarning, Patch};
use crate::projection::Projection;
use crate::regularization;

/// Column layout: `column = patch * n_basis + k` (basis index fastest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlipIndex {
    pub n_patches: usize,
    pub n_basis: usize,
}

impl SlipIndex {
    pub fn new(n_patches: usize, n_basis: usize) -> Self {
        SlipIndex { n_patches, n_basis }
    }

    pub fn n_columns(&self) -> usize {
        self.n_patches * self.n_basis
    }

    #[inline]
    pub fn column(&self, patch: usize, k: usize) -> usize {
        patch * self.n_basis + k
    }

    #[inline]
    pub fn patch_of(&self, column: usize) -> usize {
        column / self.n_basis
    }

    #[inline]
    pub fn basis_of(&self, column: usize) -> usize {
        column % self.n_basis
    }

    /// Reshape the slip part of a solution vector to `(n_patches, n_basis)`.
    /// Extra trailing entries (the leveling offset) are ignored.
    pub fn reshape(&self, x: ArrayView1<f64>) -> SlipResult<Array2<f64>> {
        let n = self.n_columns();
        if x.len() < n {
            return Err(SlipError::mismatch("slip solution", n, x.len()));
        }
        Ok(Array2::from_shape_fn((self.n_patches, self.n_basis), |(p, k)| {
            x[self.column(p, k)]
        }))
    }
}

/// Where one segment landed in the global arrays.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentLayout {
    pub name: String,
    pub patches: Range<usize>,
    pub n_length: usize,
    pub n_width: usize,
    pub penalty: f64,
}

impl SegmentLayout {
    /// Range of expanded columns owned by this segment.
    pub fn columns(&self, index: &SlipIndex) -> Range<usize> {
        index.column(self.patches.start, 0)..index.column(self.patches.end, 0)
    }
}

/// All segments discretized into one patch list.
#[derive(Debug, Clone)]
pub struct FaultModel {
    pub patches: Vec<Patch>,
    /// `(n_patches, n_basis, 3)` slip directions in the patch frame.
    pub slip_basis: Array3<f64>,
    pub segments: Vec<SegmentLayout>,
    pub index: SlipIndex,
    /// Penalty-scaled smoothing block per segment.
    pub regularization_blocks: Vec<Array2<f64>>,
    pub warnings: Vec<GeometryWarning>,
}

impl FaultModel {
    /// Project each segment anchor through `projection` and assemble.
    pub fn assemble<P: Projection>(
        faults: &[FaultSegmentConfig],
        projection: &P,
        context: &P::Context,
    ) -> SlipResult<Self> {
        validate_segments(faults)?;
        let geodetic = Array2::from_shape_fn((faults.len(), 3), |(i, c)| faults[i].position[c]);
        let cartesian = projection.geodetic_to_cartesian(geodetic.view(), context)?;
        let anchors: Vec<[f64; 3]> = cartesian
            .rows()
            .into_iter()
            .map(|r| [r[0], r[1], r[2]])
            .collect();
        Self::assemble_cartesian(faults, &anchors)
    }

    /// Assemble with segment anchors already in the local Cartesian frame.
    pub fn assemble_cartesian(
        faults: &[FaultSegmentConfig],
        anchors: &[[f64; 3]],
    ) -> SlipResult<Self> {
        let n_basis = validate_segments(faults)?;
        if anchors.len() != faults.len() {
            return Err(SlipError::mismatch("segment anchors", faults.len(), anchors.len()));
        }

        let total: usize = faults.iter().map(|f| f.patch_count()).sum();
        let mut patches = Vec::with_capacity(total);
        let mut slip_basis = Array3::zeros((total, n_basis, 3));
        let mut segments = Vec::with_capacity(faults.len());
        let mut blocks = Vec::with_capacity(faults.len());
        let mut warnings = Vec::new();

        for (fault, anchor) in faults.iter().zip(anchors) {
            let segment = Patch::new(*anchor, fault.length, fault.width, fault.strike, fault.dip)?;
            let start = patches.len();
            for sub in segment.discretize(fault.n_length, fault.n_width)? {
                if let Some(w) = sub.surface_breach() {
                    warnings.push(w);
                }
                let p = patches.len();
                for (k, dir) in fault.basis.iter().enumerate() {
                    for c in 0..3 {
                        slip_basis[[p, k, c]] = dir[c];
                    }
                }
                patches.push(sub);
            }
            blocks.push(regularization::segment_block(
                fault.n_length,
                fault.n_width,
                n_basis,
                fault.penalty,
            )?);
            debug!(
                segment = %fault.name,
                patches = fault.patch_count(),
                penalty = fault.penalty,
                "segment discretized"
            );
            segments.push(SegmentLayout {
                name: fault.name.clone(),
                patches: start..patches.len(),
                n_length: fault.n_length,
                n_width: fault.n_width,
                penalty: fault.penalty,
            });
        }

        let index = SlipIndex::new(patches.len(), n_basis);
        info!(
            segments = segments.len(),
            patches = index.n_patches,
            columns = index.n_columns(),
            warnings = warnings.len(),
            "fault model assembled"
        );
        Ok(FaultModel {
            patches,
            slip_basis,
            segments,
            index,
            regularization_blocks: blocks,
            warnings,
        })
    }

    pub fn n_patches(&self) -> usize {
        self.index.n_patches
    }

    pub fn n_basis(&self) -> usize {
        self.index.n_basis
    }

    /// Patch behind every expanded column.
    pub fn patches_f(&self) -> Vec<&Patch> {
        (0..self.index.n_columns())
            .map(|j| &self.patches[self.index.patch_of(j)])
            .collect()
    }

    /// `(n_columns, 3)` slip direction of every expanded column.
    pub fn slip_basis_f(&self) -> Array2<f64> {
        let idx = self.index;
        Array2::from_shape_fn((idx.n_columns(), 3), |(j, c)| {
            self.slip_basis[[idx.patch_of(j), idx.basis_of(j), c]]
        })
    }

    /// Slip direction of one expanded column.
    pub fn column_direction(&self, column: usize) -> [f64; 3] {
        let (p, k) = (self.index.patch_of(column), self.index.basis_of(column));
        [
            self.slip_basis[[p, k, 0]],
            self.slip_basis[[p, k, 1]],
            self.slip_basis[[p, k, 2]],
        ]
    }

    /// Block-diagonal regularization matrix for the whole model.
    pub fn regularization(&self, leveling_offset: bool) -> Array2<f64> {
        regularization::assemble(&self.regularization_blocks, leveling_offset)
    }
}
