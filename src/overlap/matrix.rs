//! C7 — per-determinant-pair overlap matrices and their spectral
//! decomposition (spec.md §4.6, §4.7).
//!
//! For a single determinant the `n_e x n_e` matrix of its own orbitals'
//! overlaps over Ω already is symmetric. For a pair of *distinct*
//! determinants `D != D'` the raw cross matrix `O_{D(k),D'(l)}` need not
//! be: swapping `k` and `l` picks up `O_{D(l),D'(k)}` instead, which is the
//! transpose entry of the *other* ordered pair `(D',D)`, not of this one.
//! This engine folds the two into one symmetric matrix per unordered pair
//! `{D,D'}` — `M_{kl} = (O_{D(k),D'(l)} + O_{D(l),D'(k)}) / 2` — which
//! collapses to the determinant's own (already symmetric) matrix when
//! `D = D'`, and is the realization of spec.md §4.6's "each such matrix is
//! real symmetric" for the general multideterminant case (see DESIGN.md).

use nalgebra::{DMatrix, DVector, SymmetricEigen};

use crate::chem::{ChemicalSystem, Determinant};
use crate::error::Error;

/// Identifies which (possibly equal) pair of determinants an
/// `OverlapMatrix` belongs to, plus the bookkeeping flags of spec.md §3.
#[derive(Clone, Copy, Debug)]
pub struct MatrixId {
    pub nmat: usize,
    pub det_a: usize,
    pub det_b: usize,
    pub symmetric: bool,
    pub rhf: bool,
}

impl MatrixId {
    pub fn is_diagonal(&self) -> bool {
        self.det_a == self.det_b
    }
}

/// A real symmetric `n_e x n_e` overlap matrix for one determinant pair,
/// plus its eigendecomposition `O = V diag(D) V^T` and the `cdet_D *
/// cdet_D'` prefactor (spec.md §3's `OverlapMatrix`). `lvect`/`rvect` are
/// scratch buffers the shape-derivative evaluation (C8) reuses per point
/// rather than reallocating.
#[derive(Clone, Debug)]
pub struct OverlapMatrix {
    pub id: MatrixId,
    pub coef: DMatrix<f64>,
    pub diag: DVector<f64>,
    pub cmat: f64,
    pub lvect: DVector<f64>,
    pub rvect: DVector<f64>,
}

impl OverlapMatrix {
    /// Builds the matrix for determinant pair `(det_a_idx, det_b_idx)` from
    /// the already-computed global orbital-overlap matrix. Fails with
    /// `NumericalError` if the eigensolver returns a non-finite eigenvalue
    /// (nalgebra's `SymmetricEigen` cannot itself report a status code, so
    /// this is this crate's realization of spec.md §4.6's "non-zero
    /// eigensolver status").
    pub fn build(
        nmat: usize,
        det_a_idx: usize,
        det_b_idx: usize,
        det_a: &Determinant,
        det_b: &Determinant,
        global_overlap: &DMatrix<f64>,
        rhf: bool,
    ) -> Result<Self, Error> {
        let (orb_a, sign_a) = det_a.canonical();
        let (orb_b, sign_b) = det_b.canonical();
        let n = orb_a.len();
        if orb_b.len() != n {
            return Err(Error::InvalidChemistry {
                component: "OverlapMatrix",
                what: "paired determinants must share the same electron count",
                value: format!("{} vs {}", n, orb_b.len()),
            });
        }

        let mut m = DMatrix::zeros(n, n);
        for k in 0..n {
            for l in 0..n {
                let direct = global_overlap[(orb_a[k], orb_b[l])];
                let crossed = global_overlap[(orb_a[l], orb_b[k])];
                m[(k, l)] = 0.5 * (direct + crossed);
            }
        }

        let eig = SymmetricEigen::new(m);
        for v in eig.eigenvalues.iter() {
            if !v.is_finite() {
                return Err(Error::NumericalError {
                    component: "OverlapMatrix",
                    what: "symmetric eigensolver returned a non-finite eigenvalue",
                    value: v.to_string(),
                });
            }
        }

        Ok(Self {
            id: MatrixId {
                nmat,
                det_a: det_a_idx,
                det_b: det_b_idx,
                symmetric: true,
                rhf,
            },
            coef: eig.eigenvectors,
            diag: eig.eigenvalues,
            cmat: sign_a * det_a.cdet * sign_b * det_b.cdet,
            lvect: DVector::zeros(n),
            rvect: DVector::zeros(n),
        })
    }

    pub fn n(&self) -> usize {
        self.diag.len()
    }

    /// The canonical (ascending) orbital index lists for this matrix's two
    /// determinants, needed by C8 to re-evaluate orbital products at a
    /// point in the same basis the matrix was assembled in.
    pub fn canonical_orbitals(&self, system: &ChemicalSystem) -> (Vec<usize>, Vec<usize>) {
        let (a, _) = system.determinants[self.id.det_a].canonical();
        let (b, _) = system.determinants[self.id.det_b].canonical();
        (a, b)
    }

    /// 1 for a diagonal (`D = D'`) matrix, 2 for an off-diagonal pair — the
    /// `{D,D'} = {D',D}` unordered pair is counted once here but contributes
    /// both orderings to the bilinear sums of C8.
    pub fn multiplicity(&self) -> f64 {
        if self.id.is_diagonal() {
            1.0
        } else {
            2.0
        }
    }
}

/// Builds one `OverlapMatrix` per unordered determinant pair `{a,b}`
/// (`a <= b`), from the full orbital-overlap matrix over Ω (spec.md §4.6).
pub fn build_all(system: &ChemicalSystem, global_overlap: &DMatrix<f64>, rhf: bool) -> Result<Vec<OverlapMatrix>, Error> {
    let ndet = system.ndet();
    let mut out = Vec::with_capacity(ndet * (ndet + 1) / 2);
    let mut nmat = 0;
    for a in 0..ndet {
        for b in a..ndet {
            out.push(OverlapMatrix::build(
                nmat,
                a,
                b,
                &system.determinants[a],
                &system.determinants[b],
                global_overlap,
                rhf,
            )?);
            nmat += 1;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chem::Determinant;

    fn identity_overlap(n: usize) -> DMatrix<f64> {
        DMatrix::identity(n, n)
    }

    #[test]
    fn single_determinant_over_whole_basis_is_identity() {
        let det = Determinant::new(vec![0, 1], 1.0, false).unwrap();
        let o = identity_overlap(2);
        let m = OverlapMatrix::build(0, 0, 0, &det, &det, &o, false).unwrap();
        assert_eq!(m.n(), 2);
        for &d in m.diag.iter() {
            assert!((d - 1.0).abs() < 1e-12);
        }
        assert!(m.id.is_diagonal());
        assert_eq!(m.multiplicity(), 1.0);
    }

    #[test]
    fn mismatched_electron_counts_are_rejected() {
        let det_a = Determinant::new(vec![0, 1], 1.0, false).unwrap();
        let det_b = Determinant::new(vec![0, 1, 2], 1.0, false).unwrap();
        let o = identity_overlap(3);
        assert!(OverlapMatrix::build(0, 0, 1, &det_a, &det_b, &o, false).is_err());
    }

    #[test]
    fn off_diagonal_pair_has_multiplicity_two() {
        let det_a = Determinant::new(vec![0, 1], 1.0, false).unwrap();
        let det_b = Determinant::new(vec![1, 0], 1.0, false).unwrap();
        let o = identity_overlap(2);
        let m = OverlapMatrix::build(0, 0, 1, &det_a, &det_b, &o, false).unwrap();
        assert_eq!(m.multiplicity(), 2.0);
    }

    #[test]
    fn build_all_produces_upper_triangular_count_of_matrices() {
        let nuclei = vec![crate::chem::Nucleus::new([0.0; 3], 1.0).unwrap()];
        let prim = crate::chem::Primitive::new(0, crate::chem::AngularType::S, 1.0, 1.0).unwrap();
        let orbitals = vec![
            crate::chem::MolecularOrbital::new(vec![prim], crate::chem::Spin::Alpha).unwrap(),
            crate::chem::MolecularOrbital::new(vec![prim], crate::chem::Spin::Alpha).unwrap(),
        ];
        let determinants = vec![
            Determinant::new(vec![0], 1.0, false).unwrap(),
            Determinant::new(vec![1], 1.0, false).unwrap(),
        ];
        let system = ChemicalSystem::new(nuclei, orbitals, determinants).unwrap();
        let o = identity_overlap(2);
        let matrices = build_all(&system, &o, false).unwrap();
        // 2 determinants -> 3 unordered pairs: (0,0), (0,1), (1,1).
        assert_eq!(matrices.len(), 3);
    }
}
