//! Interior-tetrahedron extraction (spec.md §4.6): the overlap engine
//! integrates over "the tetrahedra of the interior" regardless of which
//! mesh variant carries the domain. A `TetMesh` already *is* the domain's
//! volumetric representation once the tet optimization path (`opt_mode >
//! 0`) has carved it out; a `HexMesh` instead carries the domain as the
//! set of `Interior`-labeled hexahedra, which this module splits into six
//! tetrahedra apiece along the cube's main diagonal.

use crate::mesh::{HexMesh, Mesh, TetMesh};

/// World-space corner positions of one tetrahedron.
pub type WorldTet = [[f64; 3]; 4];

/// The six tetrahedra a hexahedron (corners in the canonical order of
/// spec.md §4.3) splits into along the `corners[0]`-`corners[6]` main
/// diagonal. Each tet shares that diagonal as one edge, a standard
/// hex-to-six-tets decomposition.
const HEX_TO_TETS: [[usize; 4]; 6] = [
    [0, 1, 2, 6],
    [0, 2, 3, 6],
    [0, 3, 7, 6],
    [0, 7, 4, 6],
    [0, 4, 5, 6],
    [0, 5, 1, 6],
];

fn hex_interior_tets(mesh: &HexMesh) -> Vec<WorldTet> {
    let mut out = Vec::new();
    for hex in &mesh.hexes {
        if !hex.label.is_interior() {
            continue;
        }
        let p: [[f64; 3]; 8] = hex.corners.map(|c| mesh.vertices[c].position);
        for split in HEX_TO_TETS {
            out.push(split.map(|k| p[k]));
        }
    }
    out
}

fn tet_mesh_tets(mesh: &TetMesh) -> Vec<WorldTet> {
    mesh.tetrahedra
        .iter()
        .map(|t| t.map(|k| mesh.vertices[k].position))
        .collect()
}

/// World-space tetrahedra covering Ω, the current interior domain.
pub fn interior_tetrahedra(mesh: &Mesh) -> Vec<WorldTet> {
    match mesh {
        Mesh::Hex(m) => hex_interior_tets(m),
        Mesh::Tet(m) => tet_mesh_tets(m),
    }
}
