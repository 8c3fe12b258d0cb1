//! Plain-text diagnostic dump.
//!
//! The format is for eyeballing and quick plotting only: one
//! `x y z valence` line per vertex, then one `i j k` line per triangle
//! indexing those vertex lines from zero. It is not meant to be read back.

use std::fmt;
use std::io::{self, Write};

use indexmap::IndexMap;

use crate::error::MeshError;
use crate::mesh::HalfEdgeMesh;

/// Errors from [`write_ascii`].
#[derive(Debug)]
pub enum ExportError {
    /// The mesh could not be read.
    Mesh(MeshError),
    /// The writer failed.
    Io(io::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mesh(e) => write!(f, "cannot export mesh: {e}"),
            Self::Io(e) => write!(f, "export write failed: {e}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Mesh(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<MeshError> for ExportError {
    fn from(e: MeshError) -> Self {
        Self::Mesh(e)
    }
}

impl From<io::Error> for ExportError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Write `mesh` as whitespace-separated ASCII.
pub fn write_ascii<W: Write>(mesh: &HalfEdgeMesh, out: &mut W) -> Result<(), ExportError> {
    let vertices = mesh.vertices()?;
    let mut index = IndexMap::with_capacity(vertices.len());
    for (i, &v) in vertices.iter().enumerate() {
        let [x, y, z] = mesh.position(v)?;
        writeln!(out, "{x} {y} {z} {}", mesh.valence(v)?)?;
        index.insert(v, i);
    }
    for tri in mesh.triangles()? {
        let [i, j, k] = tri.map(|v| index.get(&v).copied().unwrap_or(usize::MAX));
        writeln!(out, "{i} {j} {k}")?;
    }
    Ok(())
}
