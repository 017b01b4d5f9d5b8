//! C7 — Gaussian-exact pairwise overlap integration over Ω (spec.md §4.6):
//! primitive product fusion collapses each primitive pair onto a single
//! fused Gaussian, which the pre-tabulated tetrahedron quadrature then
//! integrates, together with the two (possibly distinct) Cartesian
//! monomials, over every tetrahedron of the interior domain.

use nalgebra::DMatrix;

use crate::chem::{ChemicalSystem, MolecularOrbital, Nucleus};
use crate::overlap::geometry::WorldTet;
use crate::overlap::moments::fuse;
use crate::overlap::quadrature::{map_to_tet, TetQuadrature};
use crate::chem::primitive::monomial_value;

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// `∫_Ω c_i*P_i(x-A) * c_j*P_j(x-B) * exp(-α|x-A|²) * exp(-β|x-B|²) dx`,
/// evaluated as a sum over `tets` of the pre-tabulated quadrature rule
/// applied to the fused Gaussian (spec.md §4.6's two bullets combined).
#[allow(clippy::too_many_arguments)]
pub fn primitive_pair_overlap(
    tets: &[WorldTet],
    quad: &TetQuadrature,
    center_i: [f64; 3],
    powers_i: [i32; 3],
    coeff_i: f64,
    alpha: f64,
    center_j: [f64; 3],
    powers_j: [i32; 3],
    coeff_j: f64,
    beta: f64,
) -> f64 {
    if coeff_i == 0.0 || coeff_j == 0.0 {
        return 0.0;
    }
    let fused = fuse(center_i, alpha, center_j, beta);
    let mut total = 0.0;
    for tet in tets {
        for node in quad.nodes() {
            let (world, jac) = map_to_tet(*tet, node.point);
            let di = sub(world, center_i);
            let dj = sub(world, center_j);
            let mi = monomial_value(powers_i, di);
            let mj = monomial_value(powers_j, dj);
            let dp = sub(world, fused.center);
            let dist2 = dp[0] * dp[0] + dp[1] * dp[1] + dp[2] * dp[2];
            let gauss = fused.prefactor * (-fused.exponent * dist2).exp();
            total += node.weight * jac.abs() * mi * mj * gauss;
        }
    }
    coeff_i * coeff_j * total
}

/// Which primitive pairs count towards an orbital-pair overlap: either all
/// of them (the default, `nucleus_filter = None`), or only those sharing at
/// least one primitive centered on `nucleus_filter`, Mulliken-split 50/50
/// when only one of the pair's two primitives is centered there (spec.md
/// §4.7's "population analysis ... restricting the trace to primitives
/// centered on a given nucleus").
fn pair_share(nucleus_filter: Option<usize>, nucleus_i: usize, nucleus_j: usize) -> f64 {
    match nucleus_filter {
        None => 1.0,
        Some(n) => match (nucleus_i == n, nucleus_j == n) {
            (true, true) => 1.0,
            (true, false) | (false, true) => 0.5,
            (false, false) => 0.0,
        },
    }
}

fn orbital_pair_overlap_filtered(
    orb_i: &MolecularOrbital,
    orb_j: &MolecularOrbital,
    nuclei: &[Nucleus],
    tets: &[WorldTet],
    quad: &TetQuadrature,
    nucleus_filter: Option<usize>,
) -> f64 {
    let mut total = 0.0;
    for pi in orb_i.active_primitives() {
        let center_i = nuclei[pi.nucleus_ref].position;
        for pj in orb_j.active_primitives() {
            let share = pair_share(nucleus_filter, pi.nucleus_ref, pj.nucleus_ref);
            if share == 0.0 {
                continue;
            }
            let center_j = nuclei[pj.nucleus_ref].position;
            let raw = primitive_pair_overlap(
                tets,
                quad,
                center_i,
                pi.angular_type.powers(),
                pi.coefficient,
                pi.exponent,
                center_j,
                pj.angular_type.powers(),
                pj.coefficient,
                pj.exponent,
            );
            total += share * raw;
        }
    }
    total
}

/// `O_ij(Ω) = ∫_Ω φ_i φ_j dx` for one orbital pair (spec.md §4.6).
pub fn orbital_pair_overlap(
    orb_i: &MolecularOrbital,
    orb_j: &MolecularOrbital,
    nuclei: &[Nucleus],
    tets: &[WorldTet],
    quad: &TetQuadrature,
) -> f64 {
    orbital_pair_overlap_filtered(orb_i, orb_j, nuclei, tets, quad, None)
}

/// The full symmetric `n_morb x n_morb` orbital-overlap matrix over Ω.
pub fn build_orbital_overlap_matrix(system: &ChemicalSystem, tets: &[WorldTet], quad: &TetQuadrature) -> DMatrix<f64> {
    let n = system.nmorb();
    let mut o = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let v = orbital_pair_overlap(&system.orbitals[i], &system.orbitals[j], &system.nuclei, tets, quad);
            o[(i, j)] = v;
            o[(j, i)] = v;
        }
    }
    o
}

/// The `n_morb x n_morb` overlap matrix restricted (Mulliken-split) to
/// primitives centered on `nucleus_idx` — the building block of
/// population analysis (spec.md §4.7).
pub fn build_nucleus_restricted_overlap_matrix(
    system: &ChemicalSystem,
    tets: &[WorldTet],
    quad: &TetQuadrature,
    nucleus_idx: usize,
) -> DMatrix<f64> {
    let n = system.nmorb();
    let mut o = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in i..n {
            let v = orbital_pair_overlap_filtered(
                &system.orbitals[i],
                &system.orbitals[j],
                &system.nuclei,
                tets,
                quad,
                Some(nucleus_idx),
            );
            o[(i, j)] = v;
            o[(j, i)] = v;
        }
    }
    o
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::{AngularType, Determinant, Nucleus, Primitive, Spin};
    use crate::mesh::{HexLabel, HexMesh, Mesh};
    use crate::overlap::geometry::interior_tetrahedra;

    fn hydrogen_1s(exp: f64, coeff: f64) -> ChemicalSystem {
        let nuclei = vec![Nucleus::new([0.0; 3], 1.0).unwrap()];
        let prim = Primitive::new(0, AngularType::S, exp, coeff).unwrap();
        let orbitals = vec![MolecularOrbital::new(vec![prim], Spin::Alpha).unwrap()];
        let determinants = vec![Determinant::new(vec![0], 1.0, false).unwrap()];
        ChemicalSystem::new(nuclei, orbitals, determinants).unwrap()
    }

    fn whole_box_tets(mesh: &HexMesh) -> Vec<WorldTet> {
        let mut all_interior = mesh.clone();
        for hex in all_interior.hexes.iter_mut() {
            hex.label = HexLabel::Interior;
        }
        interior_tetrahedra(&Mesh::Hex(all_interior))
    }

    #[test]
    fn self_overlap_over_whole_box_approximates_normalization() {
        // c = (2/pi)^(3/4) normalizes a 1s Gaussian with alpha=1 so that
        // integral phi^2 over all space is 1; a big-enough box should come
        // close (spec.md §8 scenario 1's orbital).
        let c = (2.0 / std::f64::consts::PI).powf(0.75);
        let system = hydrogen_1s(1.0, c);
        let mesh = HexMesh::new_uniform(9, 9, 9, ([-6.0; 3], [6.0; 3])).unwrap();
        let tets = whole_box_tets(&mesh);
        let quad = TetQuadrature::new();
        let o = build_orbital_overlap_matrix(&system, &tets, &quad);
        assert!((o[(0, 0)] - 1.0).abs() < 1e-3, "o = {}", o[(0, 0)]);
    }

    #[test]
    fn overlap_matrix_is_symmetric() {
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

        let mesh = HexMesh::new_uniform(9, 9, 9, ([-4.0; 3], [4.0; 3])).unwrap();
        let tets = whole_box_tets(&mesh);
        let quad = TetQuadrature::new();
        let o = build_orbital_overlap_matrix(&system, &tets, &quad);
        assert!((o[(0, 1)] - o[(1, 0)]).abs() < 1e-12);
    }

    #[test]
    fn nucleus_restricted_overlaps_sum_to_the_full_matrix() {
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

        let mesh = HexMesh::new_uniform(7, 7, 7, ([-4.0; 3], [4.0; 3])).unwrap();
        let tets = whole_box_tets(&mesh);
        let quad = TetQuadrature::new();
        let full = build_orbital_overlap_matrix(&system, &tets, &quad);
        let r0 = build_nucleus_restricted_overlap_matrix(&system, &tets, &quad, 0);
        let r1 = build_nucleus_restricted_overlap_matrix(&system, &tets, &quad, 1);
        for i in 0..2 {
            for j in 0..2 {
                assert!((full[(i, j)] - (r0[(i, j)] + r1[(i, j)])).abs() < 1e-9);
            }
        }
    }
}
