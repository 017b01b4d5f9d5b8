//! C8 — the probability functional `P_{n_u}(Ω)`, its shape derivative, and
//! per-atom population analysis (spec.md §4.7).
//!
//! `P_{n_u}` is the coefficient of `z^{n_u}` in the Poisson-binomial
//! generating polynomial `∏_k ((1-λ_k) + λ_k z)` built from the eigenvalues
//! of each determinant-pair's overlap matrix, summed with the
//! `cdet_D * cdet_D'` bilinear weight — "exactly `n_u` of the `λ_k`
//! independent trials land inside Ω". The shape derivative follows from two
//! standard facts combined: `dλ_k/dΩ(s) = v_k^T X(s) v_k` for a symmetric
//! matrix perturbed in direction `X(s)` (first-order eigenvalue
//! perturbation, `v_k` the matrix's own eigenvectors), and `∂P_ν/∂λ_k =
//! P_{ν-1}^{(-k)}(λ) - P_ν^{(-k)}(λ)`, where `P_m^{(-k)}` is the same
//! coefficient computed with the `k`-th eigenvalue dropped from the
//! product (differentiating `(1-λ_k+λ_k z)` against the rest of the
//! product and reading off the `z^ν` term). Chaining the two gives `G(s)`
//! directly in terms of quantities `OverlapMatrix` already stores — no
//! separate "compound matrix" machinery is needed.

use nalgebra::DMatrix;

use crate::chem::ChemicalSystem;
use crate::overlap::matrix::OverlapMatrix;
use crate::overlap::{build_nucleus_restricted_overlap_matrix, WorldTet};
use crate::overlap::quadrature::TetQuadrature;

/// The coefficient of `z^order` in `∏_k ((1-λ_k) + λ_k·z)`, i.e. the
/// Poisson-binomial probability of exactly `order` successes among
/// independent trials with success probabilities `eigs` — computed by the
/// standard O(n^2) incremental DP (processing one trial at a time,
/// updating `p[k]` from high to low so `p[k-1]` read during the update is
/// still the previous trial's value, and folding the `(1-λ)` "no success"
/// factor into every entry including `p[0]`).
pub fn poisson_binomial_term(eigs: &[f64], order: usize) -> f64 {
    let n = eigs.len();
    if order > n {
        return 0.0;
    }
    let mut p = vec![0.0; n + 1];
    p[0] = 1.0;
    for &lambda in eigs {
        for k in (1..=n).rev() {
            p[k] = p[k] * (1.0 - lambda) + p[k - 1] * lambda;
        }
        p[0] *= 1.0 - lambda;
    }
    p[order]
}

/// `poisson_binomial_term` of `eigs` with the `exclude`-th entry dropped.
fn poisson_binomial_term_excluding(eigs: &[f64], exclude: usize, order: usize) -> f64 {
    let others: Vec<f64> = eigs
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != exclude)
        .map(|(_, v)| *v)
        .collect();
    poisson_binomial_term(&others, order)
}

/// `P_{n_u}(Ω) = Σ_{D<=D'} mult(D,D') * cdet_D*cdet_D' * [z^{n_u}]
/// ∏_k((1-λ_k)+λ_k z)` over the eigenvalues of the `(D,D')` matrix
/// (spec.md §4.7).
pub fn compute_probability(matrices: &[OverlapMatrix], nu: usize) -> f64 {
    matrices
        .iter()
        .map(|m| {
            let eigs: Vec<f64> = m.diag.iter().copied().collect();
            m.multiplicity() * m.cmat * poisson_binomial_term(&eigs, nu)
        })
        .sum()
}

/// The symmetrized pointwise orbital-product matrix `X(s)_{kl} =
/// (φ_{a_k}(s)φ_{b_l}(s) + φ_{a_l}(s)φ_{b_k}(s)) / 2`, mirroring exactly
/// the symmetrization `OverlapMatrix::build` used to assemble `M` from the
/// raw orbital overlaps — `dM/dΩ(s)` in this same symmetrized basis is the
/// correct perturbation direction for the eigenvalues `OverlapMatrix`
/// stores.
fn pointwise_product_matrix(phis: &[f64], orb_a: &[usize], orb_b: &[usize]) -> DMatrix<f64> {
    let n = orb_a.len();
    let mut x = DMatrix::zeros(n, n);
    for k in 0..n {
        for l in 0..n {
            let direct = phis[orb_a[k]] * phis[orb_b[l]];
            let crossed = phis[orb_a[l]] * phis[orb_b[k]];
            x[(k, l)] = 0.5 * (direct + crossed);
        }
    }
    x
}

fn quadratic_form(coef: &DMatrix<f64>, k: usize, x: &DMatrix<f64>) -> f64 {
    let n = x.nrows();
    let mut total = 0.0;
    for a in 0..n {
        for b in 0..n {
            total += coef[(a, k)] * coef[(b, k)] * x[(a, b)];
        }
    }
    total
}

/// `G(s)`, the shape-derivative speed field at a single point of `∂Ω`
/// (spec.md §4.7), given every orbital's value already evaluated there.
pub fn shape_derivative_at_point(system: &ChemicalSystem, matrices: &[OverlapMatrix], point_phis: &[f64], nu: usize) -> f64 {
    let mut g = 0.0;
    if nu == 0 {
        return g;
    }
    for m in matrices {
        let (orb_a, orb_b) = m.canonical_orbitals(system);
        let x = pointwise_product_matrix(point_phis, &orb_a, &orb_b);
        let eigs: Vec<f64> = m.diag.iter().copied().collect();
        let n = m.n();
        let mut contribution = 0.0;
        for k in 0..n {
            let d_p_nu_d_lambda_k = poisson_binomial_term_excluding(&eigs, k, nu - 1) - poisson_binomial_term_excluding(&eigs, k, nu);
            if d_p_nu_d_lambda_k == 0.0 {
                continue;
            }
            contribution += d_p_nu_d_lambda_k * quadratic_form(&m.coef, k, &x);
        }
        g += m.multiplicity() * m.cmat * contribution;
    }
    g
}

/// `G(s)` sampled at every boundary vertex (spec.md §4.7's "the engine
/// emits G sampled at every boundary vertex").
pub fn shape_derivative_field(system: &ChemicalSystem, matrices: &[OverlapMatrix], boundary_points: &[[f64; 3]], nu: usize) -> Vec<f64> {
    boundary_points
        .iter()
        .map(|&p| {
            let phis: Vec<f64> = system.orbitals.iter().map(|o| o.eval(&system.nuclei, p).0).collect();
            shape_derivative_at_point(system, matrices, &phis, nu)
        })
        .collect()
}

/// Per-atom decomposition of `P_{n_u}(Ω)` (spec.md §4.7's "optionally
/// reports per-atom populations").
///
/// Viewing the eigenvalues as independent trial probabilities `λ_k`, the
/// standard Poisson-binomial identity `Σ_k λ_k * P_{ν-1}^{(-k)}(λ) = ν *
/// P_ν(λ)` holds regardless of homogeneity (it is linearity of
/// expectation: `Σ_k P(trial k succeeds ∧ total = ν) = E[total · 1{total =
/// ν}] = ν * P(total = ν)`, and `P(trial k succeeds ∧ total = ν) = λ_k *
/// P_{ν-1}^{(-k)}(λ)`). Since `Σ_nucleus R_nucleus = M` exactly (every
/// primitive belongs to exactly one nucleus, and the Mulliken 50/50 split
/// on cross terms sums back to full weight), `Σ_nucleus
/// quadratic_form(coef, k, R_nucleus) = λ_k`, so weighting each nucleus's
/// share of `λ_k` by `P_{ν-1}^{(-k)}(λ)` and dividing the total by `ν`
/// yields atomic contributions that sum exactly to `P_ν` — see DESIGN.md
/// for the derivation.
pub fn population_by_nucleus(
    system: &ChemicalSystem,
    matrices: &[OverlapMatrix],
    tets: &[WorldTet],
    quad: &TetQuadrature,
    nucleus_idx: usize,
    nu: usize,
) -> f64 {
    if nu == 0 {
        return 0.0;
    }
    let restricted = build_nucleus_restricted_overlap_matrix(system, tets, quad, nucleus_idx);

    let mut total = 0.0;
    for m in matrices {
        let (orb_a, orb_b) = m.canonical_orbitals(system);
        let n = m.n();
        let mut r = DMatrix::zeros(n, n);
        for k in 0..n {
            for l in 0..n {
                let direct = restricted[(orb_a[k], orb_b[l])];
                let crossed = restricted[(orb_a[l], orb_b[k])];
                r[(k, l)] = 0.5 * (direct + crossed);
            }
        }
        let eigs: Vec<f64> = m.diag.iter().copied().collect();
        let mut contribution = 0.0;
        for k in 0..n {
            let weight = poisson_binomial_term_excluding(&eigs, k, nu - 1);
            if weight == 0.0 {
                continue;
            }
            contribution += weight * quadratic_form(&m.coef, k, &r);
        }
        total += m.multiplicity() * m.cmat * contribution;
    }
    total / nu as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::{AngularType, ChemicalSystem, Determinant, MolecularOrbital, Nucleus, Primitive, Spin};
    use crate::mesh::{HexLabel, HexMesh, Mesh};
    use crate::overlap::geometry::interior_tetrahedra;
    use crate::overlap::integral::build_orbital_overlap_matrix;
    use nalgebra::DMatrix;

    #[test]
    fn term_0_is_the_product_of_complements_and_term_n_is_the_product() {
        let eigs = [0.3, 0.7, 0.9];
        let p0 = poisson_binomial_term(&eigs, 0);
        let expect_p0: f64 = eigs.iter().map(|l| 1.0 - l).product();
        assert!((p0 - expect_p0).abs() < 1e-12);
        let pn = poisson_binomial_term(&eigs, 3);
        assert!((pn - eigs.iter().product::<f64>()).abs() < 1e-12);
        assert_eq!(poisson_binomial_term(&eigs, 4), 0.0);
    }

    #[test]
    fn terms_sum_to_one_over_every_order() {
        let eigs = [0.3, 0.7, 0.9];
        let total: f64 = (0..=3).map(|nu| poisson_binomial_term(&eigs, nu)).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn probability_of_orthonormal_identity_basis_is_certainly_all_electrons_inside() {
        // O(Omega) = I (whole box, orthonormal orbitals): every eigenvalue
        // is 1, so all 3 electrons are certainly inside Omega. Exactly-k
        // probabilities for k < 3 must vanish; exactly-3 must be 1.
        let det = Determinant::new(vec![0, 1, 2], 1.0, false).unwrap();
        let identity = DMatrix::<f64>::identity(3, 3);
        let m = OverlapMatrix::build(0, 0, 0, &det, &det, &identity, false).unwrap();
        let p1 = compute_probability(&[m.clone()], 1);
        assert!(p1.abs() < 1e-9);
        let p2 = compute_probability(&[m.clone()], 2);
        assert!(p2.abs() < 1e-9);
        let p3 = compute_probability(&[m], 3);
        assert!((p3 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn nucleus_populations_sum_to_total_probability() {
        let nuclei = vec![
            Nucleus::new([0.0, 0.0, 0.0], 1.0).unwrap(),
            Nucleus::new([0.7, 0.0, 0.0], 1.0).unwrap(),
        ];
        let prim_a = Primitive::new(0, AngularType::S, 1.24, 1.0).unwrap();
        let prim_b = Primitive::new(1, AngularType::S, 1.24, 1.0).unwrap();
        let orbitals = vec![
            MolecularOrbital::new(vec![prim_a], Spin::Alpha).unwrap(),
            MolecularOrbital::new(vec![prim_b], Spin::Alpha).unwrap(),
        ];
        let determinants = vec![Determinant::new(vec![0, 1], 1.0, true).unwrap()];
        let system = ChemicalSystem::new(nuclei, orbitals, determinants).unwrap();

        let mut mesh = HexMesh::new_uniform(7, 7, 7, ([-2.0; 3], [2.0; 3])).unwrap();
        for hex in mesh.hexes.iter_mut() {
            let (i, j, k) = hex.cell;
            if (1..4).contains(&i) && (1..4).contains(&j) && (1..4).contains(&k) {
                hex.label = HexLabel::Interior;
            }
        }
        let tets = interior_tetrahedra(&Mesh::Hex(mesh));
        let quad = TetQuadrature::new();
        let global = build_orbital_overlap_matrix(&system, &tets, &quad);
        let matrices = crate::overlap::build_all(&system, &global, true).unwrap();

        let nu = 1;
        let total = compute_probability(&matrices, nu);
        let p0 = population_by_nucleus(&system, &matrices, &tets, &quad, 0, nu);
        let p1 = population_by_nucleus(&system, &matrices, &tets, &quad, 1, nu);
        assert!((total - (p0 + p1)).abs() < 1e-8, "{} vs {} + {}", total, p0, p1);
    }
}
