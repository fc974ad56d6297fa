// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Map Projection
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Geodetic ↔ local Cartesian projection.
//!
//! The inversion only relies on [`Projection`]; every position of one run
//! (observations, segment anchors, reported patch centres) goes through the
//! same context. [`FlatEarthProjection`] is the default: an equirectangular
//! tangent-plane approximation around the centre of the observation
//! bounding box, adequate for networks spanning a few degrees.

use ndarray::{Array2, ArrayView2};
use slip_types::constants::{
    DEFAULT_LAT0, DEFAULT_LON0, MAP_BUFFER_FRACTION, METERS_PER_DEGREE, MIN_MAP_BUFFER_DEG,
};
use slip_types::error::{SlipError, SlipResult};

/// Converts `(N, ≥2)` position arrays whose first two columns are
/// (lon, lat) in degrees or (x, y) in metres. Remaining columns pass
/// through unchanged.
pub trait Projection {
    type Context: Clone + std::fmt::Debug;

    fn make_context(&self, lons: &[f64], lats: &[f64]) -> Self::Context;

    fn geodetic_to_cartesian(
        &self,
        positions: ArrayView2<f64>,
        context: &Self::Context,
    ) -> SlipResult<Array2<f64>>;

    fn cartesian_to_geodetic(
        &self,
        positions: ArrayView2<f64>,
        context: &Self::Context,
    ) -> SlipResult<Array2<f64>>;
}

/// Buffered bounding box of a set of observations and its centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapContext {
    pub lon0: f64,
    pub lat0: f64,
    pub lower_left: [f64; 2],
    pub upper_right: [f64; 2],
}

impl MapContext {
    pub fn centered(lon0: f64, lat0: f64) -> Self {
        MapContext {
            lon0,
            lat0,
            lower_left: [lon0, lat0],
            upper_right: [lon0, lat0],
        }
    }

    fn meters_per_degree_lon(&self) -> f64 {
        METERS_PER_DEGREE * self.lat0.to_radians().cos()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FlatEarthProjection;

fn check_columns(positions: &ArrayView2<f64>) -> SlipResult<()> {
    if positions.ncols() < 2 {
        return Err(SlipError::mismatch("projected positions (columns)", 2, positions.ncols()));
    }
    Ok(())
}

fn buffered_range(values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let buffer = ((hi - lo) * MAP_BUFFER_FRACTION).max(MIN_MAP_BUFFER_DEG);
    (lo - buffer, hi + buffer)
}

impl Projection for FlatEarthProjection {
    type Context = MapContext;

    fn make_context(&self, lons: &[f64], lats: &[f64]) -> MapContext {
        if lons.is_empty() || lats.is_empty() {
            return MapContext {
                lon0: DEFAULT_LON0,
                lat0: DEFAULT_LAT0,
                lower_left: [-128.0, 26.0],
                upper_right: [-53.0, 48.0],
            };
        }
        let (lon_lo, lon_hi) = buffered_range(lons);
        let (lat_lo, lat_hi) = buffered_range(lats);
        MapContext {
            lon0: 0.5 * (lon_lo + lon_hi),
            lat0: 0.5 * (lat_lo + lat_hi),
            lower_left: [lon_lo, lat_lo],
            upper_right: [lon_hi, lat_hi],
        }
    }

    fn geodetic_to_cartesian(
        &self,
        positions: ArrayView2<f64>,
        context: &MapContext,
    ) -> SlipResult<Array2<f64>> {
        check_columns(&positions)?;
        let mut out = positions.to_owned();
        let m_lon = context.meters_per_degree_lon();
        for mut row in out.rows_mut() {
            row[0] = (row[0] - context.lon0) * m_lon;
            row[1] = (row[1] - context.lat0) * METERS_PER_DEGREE;
        }
        Ok(out)
    }

    fn cartesian_to_geodetic(
        &self,
        positions: ArrayView2<f64>,
        context: &MapContext,
    ) -> SlipResult<Array2<f64>> {
        check_columns(&positions)?;
        let m_lon = context.meters_per_degree_lon();
        if m_lon.abs() < f64::EPSILON {
            return Err(SlipError::config(format!(
                "projection centre latitude {} is too close to a pole",
                context.lat0
            )));
        }
        let mut out = positions.to_owned();
        for mut row in out.rows_mut() {
            row[0] = context.lon0 + row[0] / m_lon;
            row[1] = context.lat0 + row[1] / METERS_PER_DEGREE;
        }
        Ok(out)
    }
}
