// ─────────────────────────────────────────────────────────────────────
// SCPN Slip Core — Tikhonov Smoothing Operator
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Second-order (Laplacian) Tikhonov operator over a structured grid of
//! unknowns.
//!
//! `connectivity[[i, j]]` holds the column index of the unknown living at
//! grid cell `(i, j)`. Each cell contributes one row: `+1` on every existing
//! 4-neighbour and `-(neighbour count)` on itself, so edge and corner cells
//! use the reduced neighbour set and every row sums to zero.

use ndarray::{Array2, ArrayView2};
use slip_types::error::{SlipError, SlipResult};

/// Build the Laplacian rows for one grid, `n_columns` wide.
pub fn laplacian_operator(
    connectivity: ArrayView2<usize>,
    n_columns: usize,
) -> SlipResult<Array2<f64>> {
    let (nl, nw) = connectivity.dim();
    if let Some(&bad) = connectivity.iter().find(|&&c| c >= n_columns) {
        return Err(SlipError::config(format!(
            "connectivity index {bad} out of range for {n_columns} columns"
        )));
    }

    let mut op = Array2::zeros((nl * nw, n_columns));
    for i in 0..nl {
        for j in 0..nw {
            let row = i * nw + j;
            let centre = connectivity[[i, j]];
            let mut neighbours = Vec::with_capacity(4);
            if i > 0 {
                neighbours.push(connectivity[[i - 1, j]]);
            }
            if i + 1 < nl {
                neighbours.push(connectivity[[i + 1, j]]);
            }
            if j > 0 {
                neighbours.push(connectivity[[i, j - 1]]);
            }
            if j + 1 < nw {
                neighbours.push(connectivity[[i, j + 1]]);
            }
            for &nb in &neighbours {
                op[[row, nb]] += 1.0;
            }
            op[[row, centre]] -= neighbours.len() as f64;
        }
    }
    Ok(op)
}
