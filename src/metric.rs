//! C5 — per-vertex anisotropic metric from Hessian spectra of every
//! spin-compatible orbital-product pair (spec.md §4.5).

use nalgebra::{Matrix3, SymmetricEigen};

use crate::chem::orbital::product_hessian;
use crate::chem::ChemicalSystem;
use crate::config::{MetricSpec, MET_CST};
use crate::error::Error;
use crate::mesh::Point;

/// Real symmetric eigenvalues of the 3x3 Hessian stored as
/// `[xx,yy,zz,xy,xz,yz]`. Fails with `NumericalError` if the decomposition
/// produces a non-finite eigenvalue.
fn symmetric_eigenvalues_3(hess: [f64; 6]) -> Result<[f64; 3], Error> {
    let m = Matrix3::new(
        hess[0], hess[3], hess[4], //
        hess[3], hess[1], hess[5], //
        hess[4], hess[5], hess[2],
    );
    let eig = SymmetricEigen::new(m);
    let mut out = [0.0; 3];
    for k in 0..3 {
        let v = eig.eigenvalues[k];
        if !v.is_finite() {
            return Err(Error::NumericalError {
                component: "Metric",
                what: "symmetric eigensolver returned a non-finite eigenvalue",
                value: v.to_string(),
            });
        }
        out[k] = v;
    }
    Ok(out)
}

/// Builds the per-vertex size field `h(v)`, monotonically non-increasing as
/// more orbital pairs are folded in (spec.md §4.5's "monotone in v" clause
/// follows directly from `L(v)` being a running max).
pub fn build_metric(system: &ChemicalSystem, vertices: &[Point], met: &MetricSpec) -> Result<Vec<f64>, Error> {
    met.validate()?;

    let n = vertices.len();
    let seed = 1.0 / (met.met_max * met.met_max);
    let mut l = vec![seed; n];

    let indices = system.orbitals_for_metric_pairs();
    for (pi, &i) in indices.iter().enumerate() {
        for &j in &indices[pi..] {
            if !system.is_rhf() && system.orbitals[i].spin != system.orbitals[j].spin {
                continue;
            }
            for (vi, point) in vertices.iter().enumerate() {
                let ei = system.orbitals[i].eval(&system.nuclei, point.position);
                let ej = system.orbitals[j].eval(&system.nuclei, point.position);
                let hess = product_hessian(ei, ej);
                let eigs = symmetric_eigenvalues_3(hess)?;
                let local = eigs
                    .iter()
                    .map(|e| (MET_CST * e.abs()) / met.met_err)
                    .fold(f64::MIN, f64::max);
                if local > l[vi] {
                    l[vi] = local;
                }
            }
        }
    }

    Ok(l.into_iter()
        .map(|li| (1.0 / li.sqrt()).clamp(met.met_min, met.met_max))
        .collect())
}
