//! Tetrahedral mesh variant (spec.md §3): vertices carrying a per-vertex
//! scalar (the level-set sample for C4), edges, triangles and tetrahedra.
//! Boundary triangles are labeled 10 where they enclose the interior
//! domain, exactly like the hex mesh's boundary quads.

use crate::error::Error;
use crate::mesh::point::Point;

#[derive(Clone, Copy, Debug)]
pub struct Triangle {
    pub corners: [usize; 3],
    pub label: i32,
}

#[derive(Clone, Debug)]
pub struct TetMesh {
    pub vertices: Vec<Point>,
    pub edges: Vec<[usize; 2]>,
    pub triangles: Vec<Triangle>,
    pub tetrahedra: Vec<[usize; 4]>,
}

impl TetMesh {
    pub fn new(
        vertices: Vec<Point>,
        edges: Vec<[usize; 2]>,
        triangles: Vec<Triangle>,
        tetrahedra: Vec<[usize; 4]>,
    ) -> Result<Self, Error> {
        let mesh = Self {
            vertices,
            edges,
            triangles,
            tetrahedra,
        };
        mesh.verify_invariants()?;
        Ok(mesh)
    }

    fn verify_invariants(&self) -> Result<(), Error> {
        let n = self.vertices.len();
        let check = |idx: usize| -> Result<(), Error> {
            if idx >= n {
                Err(Error::InvalidMesh {
                    component: "TetMesh",
                    invariant: "vertex index out of range",
                    value: idx.to_string(),
                })
            } else {
                Ok(())
            }
        };
        for e in &self.edges {
            check(e[0])?;
            check(e[1])?;
        }
        for t in &self.triangles {
            for &c in &t.corners {
                check(c)?;
            }
        }
        for tet in &self.tetrahedra {
            for &c in tet {
                check(c)?;
            }
        }
        Ok(())
    }

    /// The boundary triangles (label 10) enclosing the interior domain.
    pub fn boundary_triangles(&self) -> impl Iterator<Item = &Triangle> {
        self.triangles.iter().filter(|t| t.label == 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_tetrahedron_vertex() {
        let vertices = vec![Point::new([0.0, 0.0, 0.0]), Point::new([1.0, 0.0, 0.0])];
        let tets = vec![[0, 1, 5, 0]];
        assert!(TetMesh::new(vertices, vec![], vec![], tets).is_err());
    }

    #[test]
    fn boundary_triangles_are_filtered_by_label() {
        let vertices = vec![
            Point::new([0.0, 0.0, 0.0]),
            Point::new([1.0, 0.0, 0.0]),
            Point::new([0.0, 1.0, 0.0]),
        ];
        let triangles = vec![
            Triangle { corners: [0, 1, 2], label: 10 },
            Triangle { corners: [0, 1, 2], label: 0 },
        ];
        let mesh = TetMesh::new(vertices, vec![], triangles, vec![]).unwrap();
        assert_eq!(mesh.boundary_triangles().count(), 1);
    }
}
