//! C7 — the overlap-matrix engine: Gaussian-exact integration of orbital
//! products over Ω, assembled into per-determinant-pair matrices and
//! spectrally decomposed (spec.md §4.6).

pub mod geometry;
pub mod integral;
pub mod matrix;
pub mod moments;
pub mod quadrature;

pub use geometry::{interior_tetrahedra, WorldTet};
pub use integral::{build_nucleus_restricted_overlap_matrix, build_orbital_overlap_matrix, orbital_pair_overlap};
pub use matrix::{build_all, MatrixId, OverlapMatrix};
pub use quadrature::TetQuadrature;
