//! Text chunks - the unit of extraction

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A piece of source text ready for triple extraction.
///
/// Chunks are produced by whatever splits documents upstream; the pipeline
/// treats them as immutable and consumes each one exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Opaque, stable chunk identifier
    pub id: String,

    /// The chunk text
    pub content: String,

    /// Label of the document this chunk came from
    pub source: String,
}

impl Chunk {
    /// Create a chunk with a fresh identifier
    pub fn new(content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            content: content.into(),
            source: source.into(),
        }
    }

    /// Create a chunk with a caller-supplied identifier
    pub fn with_id(
        id: impl Into<String>,
        content: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_creation() {
        let chunk = Chunk::new("The assassination took place in Sarajevo.", "ww1.txt");

        assert_eq!(chunk.content, "The assassination took place in Sarajevo.");
        assert_eq!(chunk.source, "ww1.txt");
        assert_eq!(chunk.id.len(), 32);
    }

    #[test]
    fn test_chunk_ids_are_distinct() {
        let a = Chunk::new("same text", "same.txt");
        let b = Chunk::new("same text", "same.txt");

        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_chunk_with_explicit_id() {
        let chunk = Chunk::with_id("chunk-7", "text", "doc");
        assert_eq!(chunk.id, "chunk-7");
    }
}
