//! C6 — quadrilateral extractor: converts a labeled hexahedral partition
//! into oriented interface quads plus the adjacency table (spec.md §4.3).

use crate::error::Error;
use crate::mesh::hex::HexMesh;

/// One boundary quadrilateral, always label 10 (the only label quads carry
/// in this engine — spec.md §3).
#[derive(Clone, Copy, Debug)]
pub struct Quad {
    pub vertices: [usize; 4],
    pub label: i32,
}

/// `{quad_index, hex_exterior, hex_interior}` — `hex_exterior` is always
/// labeled Exterior and `hex_interior` always Interior (spec.md §3).
#[derive(Clone, Copy, Debug)]
pub struct AdjacencyRecord {
    pub quad_index: usize,
    pub hex_exterior: usize,
    pub hex_interior: usize,
}

/// The six faces in the fixed canonical traversal order of spec.md §4.3:
/// direction delta, and the quad's four corner positions (1-based in the
/// spec, here 0-based into `Hex::corners`).
const FACES: [((i64, i64, i64), [usize; 4]); 6] = [
    ((-1, 0, 0), [0, 4, 7, 3]), // -x: (1,5,8,4)
    ((1, 0, 0), [1, 2, 6, 5]),  // +x: (2,3,7,6)
    ((0, -1, 0), [0, 1, 5, 4]), // -y: (1,2,6,5)
    ((0, 1, 0), [2, 3, 7, 6]),  // +y: (3,4,8,7)
    ((0, 0, -1), [0, 3, 2, 1]), // -z: (1,4,3,2)
    ((0, 0, 1), [4, 5, 6, 7]),  // +z: (5,6,7,8)
];

/// Extracts interface quads and the adjacency table from a labeled
/// `HexMesh`, in the documented two-pass style (count, then fill) so the
/// adjacency array is allocated exactly once.
pub fn extract_interface(mesh: &HexMesh) -> Result<(Vec<Quad>, Vec<AdjacencyRecord>), Error> {
    // Pass 1: count.
    let mut count = 0usize;
    for hex in &mesh.hexes {
        if !hex.label.is_exterior() {
            continue;
        }
        for (delta, _) in FACES.iter() {
            if let Some(neighbor_idx) = mesh.neighbor_index(hex.cell, *delta) {
                if mesh.hexes[neighbor_idx].label.is_interior() {
                    count += 1;
                }
            }
        }
    }

    // Pass 2: fill, in the same traversal order.
    let mut quads = Vec::with_capacity(count);
    let mut adjacency = Vec::with_capacity(count);
    for (hex_idx, hex) in mesh.hexes.iter().enumerate() {
        if !hex.label.is_exterior() {
            continue;
        }
        for (delta, positions) in FACES.iter() {
            if let Some(neighbor_idx) = mesh.neighbor_index(hex.cell, *delta) {
                if mesh.hexes[neighbor_idx].label.is_interior() {
                    let vertices = [
                        hex.corners[positions[0]],
                        hex.corners[positions[1]],
                        hex.corners[positions[2]],
                        hex.corners[positions[3]],
                    ];
                    let quad_index = quads.len();
                    quads.push(Quad { vertices, label: 10 });
                    adjacency.push(AdjacencyRecord {
                        quad_index,
                        hex_exterior: hex_idx,
                        hex_interior: neighbor_idx,
                    });
                }
            }
        }
    }

    mesh.verify_invariants(adjacency.len(), quads.len())?;
    Ok((quads, adjacency))
}

/// The boundary-quad count a pristine uniform box (no interior domain
/// carved out yet — every hex `Exterior`) must have: the six outer faces
/// of the box, each contributing `(n_x-1)(n_y-1)` etc, per spec.md §4.3's
/// identity. Used by tests and by the orchestrator as a sanity check before
/// any level-set has been applied.
pub fn pristine_box_quad_count(mesh: &HexMesh) -> usize {
    let (nx1, ny1, nz1) = mesh.cell_counts();
    2 * (nx1 * ny1 + nx1 * nz1 + ny1 * nz1)
}
