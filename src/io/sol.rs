//! `.sol` — the scalar-per-vertex companion file beside a `.mesh` (spec.md
//! §6): `MeshVersionFormatted 2`, `Dimension 3`, `SolAtVertices N / 1 1`,
//! `N` lines of `%.8le`-equivalent values, then `End`.

use std::path::Path;

use crate::error::Error;
use crate::io::io_err;

/// Renders `values` as a `.sol` file body.
pub fn write_sol(values: &[f64]) -> String {
    let mut out = String::new();
    out.push_str("MeshVersionFormatted 2\n");
    out.push_str("Dimension 3\n\n");
    out.push_str(&format!("SolAtVertices\n{}\n1 1\n", values.len()));
    for v in values {
        out.push_str(&format!("{:.8e}\n", v));
    }
    out.push_str("\nEnd\n");
    out
}

/// Parses a `.sol` file body back into its per-vertex scalars. Accepts
/// `End` with or without a preceding blank line or trailing newline (spec
/// §9's open question on the exact `\nEnd` convention is resolved, per
/// DESIGN.md, by being lenient on read and canonical on write).
pub fn read_sol(text: &str) -> Result<Vec<f64>, Error> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let pos = tokens
        .iter()
        .position(|&t| t == "SolAtVertices")
        .ok_or_else(|| Error::FileSystemError {
            component: "sol",
            path: "<in-memory>".into(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, "missing SolAtVertices section"),
        })?;

    let n: usize = tokens.get(pos + 1).and_then(|t| t.parse().ok()).ok_or_else(|| Error::FileSystemError {
        component: "sol",
        path: "<in-memory>".into(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidData, "malformed SolAtVertices count"),
    })?;

    // tokens[pos+2] and tokens[pos+3] are the "1 1" type-count/type-code pair.
    let values_start = pos + 4;
    let mut values = Vec::with_capacity(n);
    for i in 0..n {
        let tok = tokens.get(values_start + i).ok_or_else(|| Error::FileSystemError {
            component: "sol",
            path: "<in-memory>".into(),
            source: std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated SolAtVertices values"),
        })?;
        let v: f64 = tok.parse().map_err(|_| Error::FileSystemError {
            component: "sol",
            path: "<in-memory>".into(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, format!("bad scalar '{}'", tok)),
        })?;
        values.push(v);
    }
    Ok(values)
}

pub fn write_sol_file(path: impl AsRef<Path>, values: &[f64]) -> Result<(), Error> {
    let path = path.as_ref();
    std::fs::write(path, write_sol(values)).map_err(|e| io_err("sol", &path.display().to_string(), e))
}

pub fn read_sol_file(path: impl AsRef<Path>) -> Result<Vec<f64>, Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| io_err("sol", &path.display().to_string(), e))?;
    read_sol(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_values_to_eight_significant_figures() {
        let values = vec![1.0, -0.5, 3.14159265, 0.0, -1e-3];
        let text = write_sol(&values);
        let parsed = read_sol(&text).unwrap();
        assert_eq!(parsed.len(), values.len());
        for (a, b) in values.iter().zip(parsed.iter()) {
            assert!((a - b).abs() < 1e-8 * a.abs().max(1.0));
        }
    }

    #[test]
    fn rejects_missing_section() {
        assert!(read_sol("Dimension 3\nEnd\n").is_err());
    }

    #[test]
    fn rejects_truncated_values() {
        let text = "MeshVersionFormatted 2\nDimension 3\nSolAtVertices\n3\n1 1\n1.0\n2.0\nEnd\n";
        assert!(read_sol(text).is_err());
    }
}
