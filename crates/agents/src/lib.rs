//! Pipeline engines for Graphloom
//!
//! This crate contains the engines built on the generative backend and the
//! graph repository:
//! - Extractor: turns text chunks into candidate triples
//! - Ingestor: drives chunk batches through extraction into the graph
//! - Translator: turns a question plus the graph schema into a query
//! - Answerer: executes the query with a direct-model fallback

pub mod answer;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod llm;
pub mod translate;

pub use answer::{Answer, Answerer, NO_ANSWER};
pub use error::{AgentError, Result};
pub use extract::Extractor;
pub use ingest::{IngestReport, Ingestor};
pub use llm::LlmClient;
pub use translate::Translator;
