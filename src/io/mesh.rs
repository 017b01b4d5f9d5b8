//! `.mesh` (Medit format, spec.md §6): ASCII keyword sections, 1-based
//! indices on the wire, 0-based in memory — the conversion is isolated to
//! this module, per spec.md §9.
//!
//! `HexMesh` is write-only here: it represents only the *initial* uniform
//! box handed to the external remesher (mmg3d), which always works in
//! tetrahedra from then on — so only `TetMesh` needs a reader, to receive
//! mmg3d's output back into the engine for the next optimization step
//! (DESIGN.md records this as the resolution of an implicit spec gap).

use std::path::Path;

use crate::error::Error;
use crate::io::io_err;
use crate::mesh::{HexMesh, Point, TetMesh, Triangle};

const HEADER: &str = "MeshVersionFormatted 1\nDimension 3\n";

/// Renders a `HexMesh` as a `.mesh` body: `Vertices` plus `Hexahedra`
/// (corner indices 1-based, label = the hex's wire label).
pub fn write_hex(mesh: &HexMesh) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push_str(&format!("\nVertices\n{}\n", mesh.vertices.len()));
    for v in &mesh.vertices {
        out.push_str(&format!("{:.15e} {:.15e} {:.15e} 0\n", v.position[0], v.position[1], v.position[2]));
    }
    out.push_str(&format!("\nHexahedra\n{}\n", mesh.hexes.len()));
    for hex in &mesh.hexes {
        let c = hex.corners;
        out.push_str(&format!(
            "{} {} {} {} {} {} {} {} {}\n",
            c[0] + 1,
            c[1] + 1,
            c[2] + 1,
            c[3] + 1,
            c[4] + 1,
            c[5] + 1,
            c[6] + 1,
            c[7] + 1,
            hex.label.to_wire()
        ));
    }
    out.push_str("\nEnd\n");
    out
}

/// Renders a `TetMesh` as a `.mesh` body: `Vertices`, `Edges`,
/// `Triangles`, `Tetrahedra` in that order (spec.md §6's keyword list).
pub fn write_tet(mesh: &TetMesh) -> String {
    let mut out = String::new();
    out.push_str(HEADER);

    out.push_str(&format!("\nVertices\n{}\n", mesh.vertices.len()));
    for v in &mesh.vertices {
        out.push_str(&format!("{:.15e} {:.15e} {:.15e} 0\n", v.position[0], v.position[1], v.position[2]));
    }

    if !mesh.edges.is_empty() {
        out.push_str(&format!("\nEdges\n{}\n", mesh.edges.len()));
        for e in &mesh.edges {
            out.push_str(&format!("{} {} 0\n", e[0] + 1, e[1] + 1));
        }
    }

    if !mesh.triangles.is_empty() {
        out.push_str(&format!("\nTriangles\n{}\n", mesh.triangles.len()));
        for t in &mesh.triangles {
            out.push_str(&format!("{} {} {} {}\n", t.corners[0] + 1, t.corners[1] + 1, t.corners[2] + 1, t.label));
        }
    }

    if !mesh.tetrahedra.is_empty() {
        out.push_str(&format!("\nTetrahedra\n{}\n", mesh.tetrahedra.len()));
        for t in &mesh.tetrahedra {
            out.push_str(&format!("{} {} {} {} 0\n", t[0] + 1, t[1] + 1, t[2] + 1, t[3] + 1));
        }
    }

    out.push_str("\nEnd\n");
    out
}

fn parse_err(what: &str) -> Error {
    Error::FileSystemError {
        component: "mesh",
        path: "<in-memory>".into(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, what.to_string()),
    }
}

/// A whitespace/newline-agnostic tokenizer over the `.mesh` body: the
/// format is keyword-then-count-then-rows, so positional lookup by keyword
/// index is simpler and more robust than tracking line numbers, matching
/// the teacher's own whitespace-split `.xyz` reader.
fn section_rows<'a>(tokens: &'a [&'a str], keyword: &str, fields_per_row: usize) -> Option<(usize, Vec<&'a [&'a str]>)> {
    let pos = tokens.iter().position(|&t| t == keyword)?;
    let count: usize = tokens.get(pos + 1)?.parse().ok()?;
    let start = pos + 2;
    let mut rows = Vec::with_capacity(count);
    for i in 0..count {
        let row_start = start + i * fields_per_row;
        let row_end = row_start + fields_per_row;
        if row_end > tokens.len() {
            return None;
        }
        rows.push(&tokens[row_start..row_end]);
    }
    Some((start + count * fields_per_row, rows))
}

/// Parses a `.mesh` body into a `TetMesh` (spec.md §6's `Vertices`,
/// `Edges`, `Triangles`, `Tetrahedra` keywords; 1-based indices converted
/// to 0-based on the way in, per spec.md §9).
pub fn read_tet(text: &str) -> Result<TetMesh, Error> {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    let (_, vertex_rows) = section_rows(&tokens, "Vertices", 4).ok_or_else(|| parse_err("missing or malformed Vertices section"))?;
    let mut vertices = Vec::with_capacity(vertex_rows.len());
    for row in &vertex_rows {
        let x: f64 = row[0].parse().map_err(|_| parse_err("bad vertex x"))?;
        let y: f64 = row[1].parse().map_err(|_| parse_err("bad vertex y"))?;
        let z: f64 = row[2].parse().map_err(|_| parse_err("bad vertex z"))?;
        vertices.push(Point::new([x, y, z]));
    }

    let edges = match section_rows(&tokens, "Edges", 3) {
        Some((_, rows)) => rows
            .iter()
            .map(|row| -> Result<[usize; 2], Error> {
                let a: usize = row[0].parse().map_err(|_| parse_err("bad edge index"))?;
                let b: usize = row[1].parse().map_err(|_| parse_err("bad edge index"))?;
                Ok([a - 1, b - 1])
            })
            .collect::<Result<Vec<_>, Error>>()?,
        None => Vec::new(),
    };

    let triangles = match section_rows(&tokens, "Triangles", 4) {
        Some((_, rows)) => rows
            .iter()
            .map(|row| -> Result<Triangle, Error> {
                let a: usize = row[0].parse().map_err(|_| parse_err("bad triangle index"))?;
                let b: usize = row[1].parse().map_err(|_| parse_err("bad triangle index"))?;
                let c: usize = row[2].parse().map_err(|_| parse_err("bad triangle index"))?;
                let label: i32 = row[3].parse().map_err(|_| parse_err("bad triangle label"))?;
                Ok(Triangle {
                    corners: [a - 1, b - 1, c - 1],
                    label,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?,
        None => Vec::new(),
    };

    let tetrahedra = match section_rows(&tokens, "Tetrahedra", 5) {
        Some((_, rows)) => rows
            .iter()
            .map(|row| -> Result<[usize; 4], Error> {
                let a: usize = row[0].parse().map_err(|_| parse_err("bad tet index"))?;
                let b: usize = row[1].parse().map_err(|_| parse_err("bad tet index"))?;
                let c: usize = row[2].parse().map_err(|_| parse_err("bad tet index"))?;
                let d: usize = row[3].parse().map_err(|_| parse_err("bad tet index"))?;
                Ok([a - 1, b - 1, c - 1, d - 1])
            })
            .collect::<Result<Vec<_>, Error>>()?,
        None => Vec::new(),
    };

    TetMesh::new(vertices, edges, triangles, tetrahedra)
}

pub fn write_hex_file(path: impl AsRef<Path>, mesh: &HexMesh) -> Result<(), Error> {
    let path = path.as_ref();
    std::fs::write(path, write_hex(mesh)).map_err(|e| io_err("mesh", &path.display().to_string(), e))
}

pub fn write_tet_file(path: impl AsRef<Path>, mesh: &TetMesh) -> Result<(), Error> {
    let path = path.as_ref();
    std::fs::write(path, write_tet(mesh)).map_err(|e| io_err("mesh", &path.display().to_string(), e))
}

pub fn read_tet_file(path: impl AsRef<Path>) -> Result<TetMesh, Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| io_err("mesh", &path.display().to_string(), e))?;
    read_tet(&text)
}
