// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Fault Patch
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Planar rectangular fault element.
//!
//! Two frames are involved:
//!
//! * **global**: right-handed local Cartesian frame of the inversion
//!   (x east, y north, z up; the free surface is z = 0).
//! * **patch**: x along strike, y up-dip, z along the patch normal, scaled
//!   so the patch covers `[0, 1] × [0, 1] × {0}`. The origin is the
//!   bottom-left corner seen from the side the patch dips towards, and the
//!   top edge is y = 1.
//!
//! The anchor position refers to `anchor_offset` in patch coordinates;
//! by default that is the top centre `[0.5, 1, 0]`.

use std::fmt;

use ndarray::{Array2, ArrayView2};
use slip_math::transform::Transform;
use slip_types::constants::SURFACE_BREACH_TOL;
use slip_types::error::{SlipError, SlipResult};
use tracing::warn;

/// Top centre of the patch in patch coordinates.
pub const TOP_CENTER: [f64; 3] = [0.5, 1.0, 0.0];

/// Patch-frame origin, used as the anchor of discretized sub-patches.
pub const ORIGIN_CORNER: [f64; 3] = [0.0, 0.0, 0.0];

/// Corners in patch coordinates, counter-clockwise from the origin.
const LOCAL_CORNERS: [[f64; 3]; 4] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
];

/// Non-fatal report of a patch whose top edge rises above the free surface.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryWarning {
    pub anchor: [f64; 3],
    /// Highest corner elevation (m, positive = above the surface).
    pub max_z: f64,
    pub strike: f64,
    pub dip: f64,
}

impl fmt::Display for GeometryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "patch anchored at ({:.3}, {:.3}, {:.3}) breaches the free surface: \
             max z = {:.6e} (strike {:.2}, dip {:.2})",
            self.anchor[0], self.anchor[1], self.anchor[2], self.max_z, self.strike, self.dip
        )
    }
}

/// Parameters the Green's-function kernel needs from one patch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchGeometry {
    /// Top centre in the global frame.
    pub reference: [f64; 3],
    pub length: f64,
    pub width: f64,
    pub strike: f64,
    pub dip: f64,
}

/// One rectangular fault element with its patch↔global transforms.
#[derive(Debug, Clone)]
pub struct Patch {
    anchor: [f64; 3],
    length: f64,
    width: f64,
    strike: f64,
    dip: f64,
    to_global: Transform,
    to_local: Transform,
    max_corner_z: f64,
}

impl Patch {
    /// Patch whose `anchor` is its top centre.
    pub fn new(anchor: [f64; 3], length: f64, width: f64, strike: f64, dip: f64) -> SlipResult<Self> {
        Self::with_anchor_offset(anchor, length, width, strike, dip, TOP_CENTER)
    }

    /// Patch whose `anchor` is the point `anchor_offset` in patch coordinates.
    pub fn with_anchor_offset(
        anchor: [f64; 3],
        length: f64,
        width: f64,
        strike: f64,
        dip: f64,
        anchor_offset: [f64; 3],
    ) -> SlipResult<Self> {
        if anchor
            .iter()
            .chain(anchor_offset.iter())
            .chain([length, width, strike, dip].iter())
            .any(|v| !v.is_finite())
        {
            return Err(SlipError::config("patch parameters must be finite"));
        }
        if length <= 0.0 || width <= 0.0 {
            return Err(SlipError::config(format!(
                "patch length and width must be > 0 (got {length} x {width})"
            )));
        }

        let to_global = Transform::translate([
            -anchor_offset[0],
            -anchor_offset[1],
            -anchor_offset[2],
        ]) + Transform::scale([length, width, 1.0])
            + Transform::rotate_x(dip.to_radians())
            + Transform::rotate_z(std::f64::consts::FRAC_PI_2 - strike.to_radians())
            + Transform::translate(anchor);
        let to_local = to_global.inverse()?;

        let max_corner_z = LOCAL_CORNERS
            .iter()
            .map(|c| to_global.apply_point(*c)[2])
            .fold(f64::NEG_INFINITY, f64::max);

        let patch = Patch {
            anchor,
            length,
            width,
            strike,
            dip,
            to_global,
            to_local,
            max_corner_z,
        };
        if let Some(w) = patch.surface_breach() {
            warn!(max_z = w.max_z, "{w}");
        }
        Ok(patch)
    }

    pub fn anchor(&self) -> [f64; 3] {
        self.anchor
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn strike(&self) -> f64 {
        self.strike
    }

    pub fn dip(&self) -> f64 {
        self.dip
    }

    pub fn area(&self) -> f64 {
        self.length * self.width
    }

    pub fn local_to_global(&self, points: ArrayView2<f64>) -> SlipResult<Array2<f64>> {
        self.to_global.apply(points)
    }

    pub fn global_to_local(&self, points: ArrayView2<f64>) -> SlipResult<Array2<f64>> {
        self.to_local.apply(points)
    }

    pub fn local_to_global_point(&self, p: [f64; 3]) -> [f64; 3] {
        self.to_global.apply_point(p)
    }

    pub fn global_to_local_point(&self, p: [f64; 3]) -> [f64; 3] {
        self.to_local.apply_point(p)
    }

    pub fn top_center(&self) -> [f64; 3] {
        self.local_to_global_point(TOP_CENTER)
    }

    /// Global polygon, counter-clockwise in patch coordinates starting at the
    /// patch origin (bottom-left).
    pub fn corners(&self) -> [[f64; 3]; 4] {
        LOCAL_CORNERS.map(|c| self.local_to_global_point(c))
    }

    pub fn geometry(&self) -> PatchGeometry {
        PatchGeometry {
            reference: self.top_center(),
            length: self.length,
            width: self.width,
            strike: self.strike,
            dip: self.dip,
        }
    }

    pub fn breaches_surface(&self) -> bool {
        self.max_corner_z > SURFACE_BREACH_TOL
    }

    pub fn surface_breach(&self) -> Option<GeometryWarning> {
        self.breaches_surface().then(|| GeometryWarning {
            anchor: self.anchor,
            max_z: self.max_corner_z,
            strike: self.strike,
            dip: self.dip,
        })
    }

    /// Split into `nl × nw` equal sub-patches, length index major.
    ///
    /// Sub-patch `(il, iw)` lands at position `il * nw + iw` and is anchored
    /// at its own patch-frame origin.
    pub fn discretize(&self, nl: usize, nw: usize) -> SlipResult<Vec<Patch>> {
        if nl == 0 || nw == 0 {
            return Err(SlipError::config(format!(
                "discretize needs positive counts (got {nl} x {nw})"
            )));
        }
        let length = self.length / nl as f64;
        let width = self.width / nw as f64;
        let mut out = Vec::with_capacity(nl * nw);
        for il in 0..nl {
            for iw in 0..nw {
                let corner = self.local_to_global_point([
                    il as f64 / nl as f64,
                    iw as f64 / nw as f64,
                    0.0,
                ]);
                out.push(Patch::with_anchor_offset(
                    corner,
                    length,
                    width,
                    self.strike,
                    self.dip,
                    ORIGIN_CORNER,
                )?);
            }
        }
        Ok(out)
    }
}
