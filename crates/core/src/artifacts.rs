//! Tabular artifacts for re-runnable ingestion
//!
//! Extraction is the expensive step of the pipeline. The chunk and triple
//! tables written here let a run be replayed into the graph later without
//! re-invoking the generative backend; replay is safe because the upsert is
//! idempotent.

use crate::{Chunk, Result, Triple};
use std::path::Path;

/// File name for the chunk table
pub const CHUNKS_FILE: &str = "chunks.csv";
/// File name for the triple table
pub const TRIPLES_FILE: &str = "triples.csv";

/// Write one row per chunk (id, content, source)
pub fn write_chunks(path: &Path, chunks: &[Chunk]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for chunk in chunks {
        writer.serialize(chunk)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a chunk table written by [`write_chunks`]
pub fn read_chunks(path: &Path) -> Result<Vec<Chunk>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut chunks = Vec::new();
    for record in reader.deserialize() {
        chunks.push(record?);
    }
    Ok(chunks)
}

/// Write one row per accepted triple
pub fn write_triples(path: &Path, triples: &[Triple]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for triple in triples {
        writer.serialize(triple)?;
    }
    writer.flush()?;
    Ok(())
}

/// Read a triple table written by [`write_triples`]
pub fn read_triples(path: &Path) -> Result<Vec<Triple>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut triples = Vec::new();
    for record in reader.deserialize() {
        triples.push(record?);
    }
    Ok(triples)
}
