// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Constants
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
/// Metres per degree of latitude used by the local flat-earth projection.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Tolerance on the global z of a patch's corners before it counts as
/// breaching the free surface (m).
pub const SURFACE_BREACH_TOL: f64 = 1e-10;

/// Default shear modulus for moment estimates (Pa).
pub const SHEAR_MODULUS: f64 = 30e9;

/// Minimum bounding-box buffer around the observations (degrees).
pub const MIN_MAP_BUFFER_DEG: f64 = 0.15;

/// Fraction of the observation span added as map buffer on each side.
pub const MAP_BUFFER_FRACTION: f64 = 1.0 / 20.0;

/// Projection origin used when no observation positions are available.
pub const DEFAULT_LON0: f64 = -90.0;
pub const DEFAULT_LAT0: f64 = 41.0;
