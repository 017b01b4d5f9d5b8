//! C3 — hexahedral mesh topology: a uniform grid of `(n_x-1)(n_y-1)(n_z-1)`
//! hexahedra over `n_x*n_y*n_z` vertices.

use crate::error::Error;
use crate::mesh::point::Point;

/// The four labels a hex cell can carry. `ExteriorMarked`/`InteriorMarked`
/// realize the `trick_matrix` signed-label convention (spec.md §3, §9) as a
/// proper tagged variant instead of a `+-2`/`+-3` integer sign.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HexLabel {
    Exterior,
    Interior,
    ExteriorMarked,
    InteriorMarked,
}

impl HexLabel {
    pub fn is_exterior(self) -> bool {
        matches!(self, HexLabel::Exterior | HexLabel::ExteriorMarked)
    }

    pub fn is_interior(self) -> bool {
        matches!(self, HexLabel::Interior | HexLabel::InteriorMarked)
    }

    /// Wire-format signed integer label (2/3/-2/-3), used only at the IO
    /// boundary, per §9's "isolate representation conversions" note.
    pub fn to_wire(self) -> i32 {
        match self {
            HexLabel::Exterior => 2,
            HexLabel::Interior => 3,
            HexLabel::ExteriorMarked => -2,
            HexLabel::InteriorMarked => -3,
        }
    }

    pub fn from_wire(raw: i32) -> Result<Self, Error> {
        match raw {
            2 => Ok(HexLabel::Exterior),
            3 => Ok(HexLabel::Interior),
            -2 => Ok(HexLabel::ExteriorMarked),
            -3 => Ok(HexLabel::InteriorMarked),
            other => Err(Error::InvalidMesh {
                component: "HexLabel",
                invariant: "hex label must be in {2,3,-2,-3}",
                value: other.to_string(),
            }),
        }
    }
}

/// One hexahedron: eight vertex indices in the canonical corner order of
/// spec.md §4.3, plus its label.
#[derive(Clone, Debug)]
pub struct Hex {
    pub corners: [usize; 8],
    pub label: HexLabel,
    /// 0-based cell coordinate, kept to look up axis-aligned neighbors
    /// without re-deriving it from `corners`.
    pub cell: (usize, usize, usize),
}

/// A uniform hexahedral grid over the box `[0,n_x-1] x [0,n_y-1] x [0,n_z-1]`
/// vertex indices (actual coordinates live in `vertices`).
#[derive(Clone, Debug)]
pub struct HexMesh {
    pub n_x: usize,
    pub n_y: usize,
    pub n_z: usize,
    pub vertices: Vec<Point>,
    pub hexes: Vec<Hex>,
}

impl HexMesh {
    /// Vertex linearization of spec.md §4.3: `(a*n_y+b)*n_z+c`.
    #[inline]
    pub fn vertex_index(&self, a: usize, b: usize, c: usize) -> usize {
        (a * self.n_y + b) * self.n_z + c
    }

    /// Number of cells along each axis.
    #[inline]
    pub fn cell_counts(&self) -> (usize, usize, usize) {
        (self.n_x - 1, self.n_y - 1, self.n_z - 1)
    }

    #[inline]
    pub fn cell_index(&self, ci: usize, cj: usize, ck: usize) -> usize {
        let (_, ny1, nz1) = self.cell_counts();
        (ci * ny1 + cj) * nz1 + ck
    }

    /// Builds an empty uniform hex grid over `[x_min,x_max] x ... x
    /// [z_min,z_max]` with `n_x * n_y * n_z` vertices, every hex initially
    /// labeled `Exterior` (the level-set builder, C4, relabels interior
    /// cells). Fails with `InvalidMesh` if any axis count is below 3, per
    /// spec.md §4.3 (each box face needs at least one interior normal).
    pub fn new_uniform(
        n_x: usize,
        n_y: usize,
        n_z: usize,
        bounds: ([f64; 3], [f64; 3]),
    ) -> Result<Self, Error> {
        if n_x < 3 || n_y < 3 || n_z < 3 {
            return Err(Error::InvalidMesh {
                component: "HexMesh",
                invariant: "n_x, n_y, n_z must all be >= 3",
                value: format!("({}, {}, {})", n_x, n_y, n_z),
            });
        }

        let (lo, hi) = bounds;
        let dx = (hi[0] - lo[0]) / (n_x - 1) as f64;
        let dy = (hi[1] - lo[1]) / (n_y - 1) as f64;
        let dz = (hi[2] - lo[2]) / (n_z - 1) as f64;

        let mut vertices = Vec::with_capacity(n_x * n_y * n_z);
        for a in 0..n_x {
            for b in 0..n_y {
                for c in 0..n_z {
                    vertices.push(Point::new([
                        lo[0] + a as f64 * dx,
                        lo[1] + b as f64 * dy,
                        lo[2] + c as f64 * dz,
                    ]));
                }
            }
        }

        let mut mesh = Self {
            n_x,
            n_y,
            n_z,
            vertices,
            hexes: Vec::new(),
        };

        let (nx1, ny1, nz1) = mesh.cell_counts();
        let mut hexes = Vec::with_capacity(nx1 * ny1 * nz1);
        for ci in 0..nx1 {
            for cj in 0..ny1 {
                for ck in 0..nz1 {
                    let corners = [
                        mesh.vertex_index(ci, cj, ck),
                        mesh.vertex_index(ci + 1, cj, ck),
                        mesh.vertex_index(ci + 1, cj + 1, ck),
                        mesh.vertex_index(ci, cj + 1, ck),
                        mesh.vertex_index(ci, cj, ck + 1),
                        mesh.vertex_index(ci + 1, cj, ck + 1),
                        mesh.vertex_index(ci + 1, cj + 1, ck + 1),
                        mesh.vertex_index(ci, cj + 1, ck + 1),
                    ];
                    hexes.push(Hex {
                        corners,
                        label: HexLabel::Exterior,
                        cell: (ci, cj, ck),
                    });
                }
            }
        }
        mesh.hexes = hexes;
        Ok(mesh)
    }

    /// Index into `self.hexes` of the axis-aligned neighbor of `cell` in
    /// direction `(di,dj,dk)` (each in `{-1,0,1}`, exactly one non-zero), or
    /// `None` if that neighbor would fall outside the grid.
    pub fn neighbor_index(&self, cell: (usize, usize, usize), delta: (i64, i64, i64)) -> Option<usize> {
        let (nx1, ny1, nz1) = self.cell_counts();
        let ni = cell.0 as i64 + delta.0;
        let nj = cell.1 as i64 + delta.1;
        let nk = cell.2 as i64 + delta.2;
        if ni < 0 || nj < 0 || nk < 0 {
            return None;
        }
        let (ni, nj, nk) = (ni as usize, nj as usize, nk as usize);
        if ni >= nx1 || nj >= ny1 || nk >= nz1 {
            return None;
        }
        Some(self.cell_index(ni, nj, nk))
    }

    /// Checks the invariants of spec.md §4.3/§8: every hex label is one of
    /// the four tagged variants (guaranteed by the type system here, so
    /// this only double-checks cross-referential bounds) and the label-10
    /// boundary quad count matches the adjacency length, given the already
    /// extracted adjacency.
    pub fn verify_invariants(&self, adjacency_len: usize, quad_count: usize) -> Result<(), Error> {
        for hex in &self.hexes {
            for &c in &hex.corners {
                if c >= self.vertices.len() {
                    return Err(Error::InvalidMesh {
                        component: "HexMesh",
                        invariant: "hex corner index out of range",
                        value: c.to_string(),
                    });
                }
            }
        }
        if adjacency_len != quad_count {
            return Err(Error::InvalidMesh {
                component: "HexMesh",
                invariant: "adjacency length must equal label-10 quad count",
                value: format!("{} != {}", adjacency_len, quad_count),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_grids_smaller_than_three() {
        let bounds = ([0.0; 3], [1.0; 3]);
        assert!(HexMesh::new_uniform(2, 5, 5, bounds).is_err());
        assert!(HexMesh::new_uniform(5, 5, 5, bounds).is_ok());
    }

    #[test]
    fn vertex_count_and_cell_count_match_grid_dims() {
        let mesh = HexMesh::new_uniform(5, 4, 3, ([0.0; 3], [1.0, 1.0, 1.0])).unwrap();
        assert_eq!(mesh.vertices.len(), 5 * 4 * 3);
        assert_eq!(mesh.hexes.len(), 4 * 3 * 2);
    }

    #[test]
    fn neighbor_lookup_respects_grid_bounds() {
        let mesh = HexMesh::new_uniform(5, 5, 5, ([0.0; 3], [1.0; 3])).unwrap();
        assert!(mesh.neighbor_index((0, 0, 0), (-1, 0, 0)).is_none());
        assert!(mesh.neighbor_index((0, 0, 0), (1, 0, 0)).is_some());
    }

    #[test]
    fn hex_label_wire_round_trips() {
        for label in [
            HexLabel::Exterior,
            HexLabel::Interior,
            HexLabel::ExteriorMarked,
            HexLabel::InteriorMarked,
        ] {
            let rt = HexLabel::from_wire(label.to_wire()).unwrap();
            assert_eq!(rt.to_wire(), label.to_wire());
        }
        assert!(HexLabel::from_wire(0).is_err());
    }
}
