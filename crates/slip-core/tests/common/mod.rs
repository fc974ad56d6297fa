//! Shared fixtures for the slip-core integration tests.
#![allow(dead_code)]

use ndarray::{Array1, Array2, ArrayView2};
use slip_core::gbuild::{build_system_matrix, SystemMatrixOptions};
use slip_core::greens::{GreensKernel, KernelOutput};
use slip_core::observations::{GpsDataset, Observations, ScalarDataset};
use slip_core::patch::PatchGeometry;
use slip_core::projection::{FlatEarthProjection, Projection};
use slip_core::FaultModel;
use slip_types::config::FaultSegmentConfig;
use slip_types::error::SlipResult;

/// Point source at the patch centroid with `depth / R³` decay.
///
/// Not an elastic solution, but smooth, linear in slip and sensitive to
/// every slip direction, which is all the inversion needs.
pub struct PointSourceKernel;

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

impl GreensKernel for PointSourceKernel {
    fn evaluate(
        &self,
        observations: ArrayView2<f64>,
        slip: [f64; 3],
        patch: &PatchGeometry,
    ) -> SlipResult<KernelOutput> {
        let (ss, cs) = patch.strike.to_radians().sin_cos();
        let (sd, cd) = patch.dip.to_radians().sin_cos();
        let along = [ss, cs, 0.0];
        let up_dip = [-cs * cd, ss * cd, sd];
        let normal = cross(along, up_dip);
        let centroid = [
            patch.reference[0] - 0.5 * patch.width * up_dip[0],
            patch.reference[1] - 0.5 * patch.width * up_dip[1],
            patch.reference[2] - 0.5 * patch.width * up_dip[2],
        ];
        let depth = (-centroid[2]).max(100.0);
        let g: Vec<f64> = (0..3)
            .map(|c| slip[0] * along[c] + slip[1] * up_dip[c] + slip[2] * normal[c])
            .collect();
        let strength = patch.length * patch.width / (4.0 * std::f64::consts::PI);

        let mut disp = Array2::zeros((observations.nrows(), 3));
        for (i, obs) in observations.rows().into_iter().enumerate() {
            let dx = obs[0] - centroid[0];
            let dy = obs[1] - centroid[1];
            let dz = obs[2] - centroid[2];
            let r = (dx * dx + dy * dy + dz * dz).sqrt().max(1.0);
            let f = strength * depth / (r * r * r);
            disp[[i, 0]] = f * g[0];
            disp[[i, 1]] = f * g[1];
            disp[[i, 2]] = f * (g[2] + (g[0] * dx + g[1] * dy) / r);
        }
        Ok(KernelOutput::exact(disp))
    }
}

pub fn segment(
    name: &str,
    position: [f64; 3],
    n_length: usize,
    n_width: usize,
    penalty: f64,
) -> FaultSegmentConfig {
    FaultSegmentConfig {
        name: name.to_string(),
        strike: 30.0,
        dip: 60.0,
        length: 30_000.0,
        width: 15_000.0,
        position,
        n_length,
        n_width,
        basis: vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        penalty,
    }
}

/// `nx × ny` stations on a regular lon/lat grid centred on `centre`.
pub fn station_grid(centre: [f64; 2], half_span: [f64; 2], nx: usize, ny: usize) -> Array2<f64> {
    let mut out = Array2::zeros((nx * ny, 3));
    for i in 0..nx {
        for j in 0..ny {
            let fx = if nx > 1 { i as f64 / (nx - 1) as f64 } else { 0.5 };
            let fy = if ny > 1 { j as f64 / (ny - 1) as f64 } else { 0.5 };
            let row = i * ny + j;
            out[[row, 0]] = centre[0] - half_span[0] + 2.0 * half_span[0] * fx;
            out[[row, 1]] = centre[1] - half_span[1] + 2.0 * half_span[1] * fy;
        }
    }
    out
}

/// Noise-free per-row data for slip vector `x` (plus the offset coefficient
/// when leveling rows exist), computed through the same projection context
/// the inversion will use.
pub fn forward_rows(
    faults: &[FaultSegmentConfig],
    observations: &Observations,
    x: &Array1<f64>,
    offset: f64,
    offset_sign: f64,
) -> Array1<f64> {
    let stacked = observations.stack().unwrap();
    let (lons, lats) = stacked.lon_lat();
    let ctx = FlatEarthProjection.make_context(&lons, &lats);
    let model = FaultModel::assemble(faults, &FlatEarthProjection, &ctx).unwrap();
    let positions = FlatEarthProjection
        .geodetic_to_cartesian(stacked.positions_geo.view(), &ctx)
        .unwrap();
    let g = build_system_matrix(
        positions.view(),
        stacked.basis.view(),
        &model,
        stacked.n_leveling,
        &PointSourceKernel,
        SystemMatrixOptions {
            parallel: false,
            leveling_offset_sign: offset_sign,
        },
    )
    .unwrap();
    let mut full = Array1::zeros(g.ncols());
    full.slice_mut(ndarray::s![..x.len()]).assign(x);
    if stacked.n_leveling > 0 {
        full[x.len()] = offset;
    }
    g.dot(&full)
}

/// Replace the displacements of `template` with `rows` (stacked order).
pub fn with_displacements(template: &Observations, rows: &Array1<f64>) -> Observations {
    let stacked = template.stack().unwrap();
    let split = stacked.split(rows.view()).unwrap();
    let gps = GpsDataset::new(
        template.gps.positions.clone(),
        split.gps,
        template.gps.sigmas.clone(),
    )
    .unwrap();
    let insar = ScalarDataset::new(
        template.insar.positions.clone(),
        split.insar,
        template.insar.sigmas.clone(),
        template.insar.basis.clone(),
    )
    .unwrap();
    let leveling = ScalarDataset::new(
        template.leveling.positions.clone(),
        split.leveling,
        template.leveling.sigmas.clone(),
        template.leveling.basis.clone(),
    )
    .unwrap();
    Observations::new(gps, insar, leveling)
}

/// GPS-only template with uniform sigma and zero displacements.
pub fn gps_template(positions: Array2<f64>, sigma: f64) -> Observations {
    let n = positions.nrows();
    let gps = GpsDataset::new(
        positions,
        Array2::zeros((n, 3)),
        Array2::from_elem((n, 3), sigma),
    )
    .unwrap();
    Observations::new(gps, ScalarDataset::empty(), ScalarDataset::empty())
}
