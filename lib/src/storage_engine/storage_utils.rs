// lib/src/storage_engine/storage_utils.rs

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use models::errors::{GraphError, GraphResult};
use models::Edge;
use tempfile::NamedTempFile;

/// Helper to serialize an Edge to bytes using MessagePack.
///
/// Struct fields are written by name: `props` is skipped when absent, which
/// positional encoding could not represent.
pub fn serialize_edge(edge: &Edge) -> GraphResult<Vec<u8>> {
    rmp_serde::to_vec_named(edge).map_err(|e| GraphError::SerializationError(e.to_string()))
}

/// Helper to deserialize bytes to an Edge.
pub fn deserialize_edge(bytes: &[u8]) -> GraphResult<Edge> {
    rmp_serde::from_slice(bytes).map_err(|e| GraphError::DeserializationError(e.to_string()))
}

/// Writes a full collection snapshot. The file is replaced atomically: data
/// goes to a temp file in the same directory, which is then renamed.
pub fn write_snapshot(path: &Path, edges: &BTreeMap<String, Edge>) -> GraphResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let temp = NamedTempFile::new_in(dir)?;
    {
        let mut buf = BufWriter::new(temp.as_file());
        rmp_serde::encode::write_named(&mut buf, edges)?;
        buf.flush()?;
    }
    temp.persist(path).map_err(|e| GraphError::Io(e.error))?;
    Ok(())
}

/// Reads a snapshot written by `write_snapshot`. A missing file is an empty
/// collection.
pub fn read_snapshot(path: &Path) -> GraphResult<BTreeMap<String, Edge>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let file = File::open(path)?;
    let edges = rmp_serde::from_read(BufReader::new(file))?;
    Ok(edges)
}
