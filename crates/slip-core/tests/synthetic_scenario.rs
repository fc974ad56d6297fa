// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Synthetic Rupture Scenario
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! 200 km × 60 km thrust-oblique segment, 40 × 20 patches, two oblique
//! slip directions, noisy GPS.

mod common;

use std::path::PathBuf;

use common::{forward_rows, gps_template, station_grid, with_displacements, PointSourceKernel};
use ndarray::Array1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use slip_core::{FlatEarthProjection, SlipInversion};
use slip_types::config::{InversionConfig, SolverKind};

const SIGMA: f64 = 0.002;

fn config_path(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("configs")
        .join(name)
        .to_string_lossy()
        .to_string()
}

/// Patches in the central asperity, length index 14..26, width index 4..14.
fn in_asperity(patch: usize, n_width: usize) -> bool {
    let (il, iw) = (patch / n_width, patch % n_width);
    (14..26).contains(&il) && (4..14).contains(&iw)
}

#[test]
fn test_synthetic_single_segment_recovery() {
    let cfg = InversionConfig::from_file(&config_path("synthetic_single_segment.json")).unwrap();
    let fault = &cfg.faults[0];
    assert_eq!((fault.n_length, fault.n_width), (40, 20));
    assert_eq!(cfg.solver.kind, SolverKind::ActiveSet);

    let n_patches = fault.patch_count();
    let n_basis = fault.basis.len();
    // Unit slip along the first basis direction inside the asperity only.
    let x_true = Array1::from_shape_fn(n_patches * n_basis, |j| {
        if j % n_basis == 0 && in_asperity(j / n_basis, fault.n_width) {
            1.0
        } else {
            0.0
        }
    });

    let template = gps_template(station_grid([-84.1, 43.15], [1.6, 0.8], 14, 10), SIGMA);
    let clean = forward_rows(&cfg.faults, &template, &x_true, 0.0, cfg.leveling_offset_sign);
    let mut rng = StdRng::seed_from_u64(42);
    let noise = Normal::new(0.0, SIGMA).unwrap();
    let noisy = clean.mapv(|v| v + noise.sample(&mut rng));
    let obs = with_displacements(&template, &noisy);

    let inversion = SlipInversion::from_config(&cfg, FlatEarthProjection, PointSourceKernel).unwrap();
    let res = inversion.run(&cfg.faults, &obs).unwrap();

    assert_eq!(res.slip.dim(), (800, 2));
    assert!(res.slip.iter().all(|v| *v >= 0.0));

    let (mut dominant, mut other) = (0.0, 0.0);
    for p in (0..n_patches).filter(|&p| in_asperity(p, fault.n_width)) {
        dominant += res.slip[[p, 0]];
        other += res.slip[[p, 1]];
    }
    assert!(dominant > other, "dominant {dominant} vs other {other}");

    // Predicted GPS within the noise level.
    let misfit = res.misfit();
    assert_eq!(misfit.gps.npts, 140);
    assert!(
        misfit.gps.mean_normalized < 2.0,
        "normalized misfit {}",
        misfit.gps.mean_normalized
    );
    assert!(misfit.insar.mean_abs.is_nan());

    let mw = res.moment_magnitude();
    assert!(mw.is_finite() && mw > 6.0, "Mw = {mw}");

    // Reported patch positions stay on the mapped fault trace.
    assert_eq!(res.patches.len(), 800);
    let top = &res.patches[0].top_center;
    assert!((top[0] - fault.position[0]).abs() < 2.0);
    assert!((top[1] - fault.position[1]).abs() < 1.0);
}
