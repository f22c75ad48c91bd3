//! Extraction Engine - turns text chunks into candidate triples

use crate::llm::strip_code_fences;
use crate::{AgentError, LlmClient, Result};
use futures::stream::{self, StreamExt};
use graphloom_core::triple::IMPORTANCE_DEFAULT;
use graphloom_core::{Chunk, Triple};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, warn};

const DEFAULT_EXTRACT_WORKERS: usize = 4;

const EXTRACTION_PROMPT: &str = "You are a network graph maker who extracts terms and their relations from a given context. \
You are provided with a context chunk (delimited by ```). \
Your task is to extract the ontology of terms mentioned in the given context. \
These terms should represent the key concepts as per the context.\n\
Thought 1: While traversing through each sentence, think about the key terms mentioned in it. \
Terms may include object, entity, location, organization, person, condition, acronym, documents, service, concept, etc. \
Terms should be as atomistic as possible.\n\n\
Thought 2: Think about how these terms can have a one on one relation with other terms. \
Terms that are mentioned in the same sentence or paragraph are typically related to each other. \
Terms can be related to many other terms.\n\n\
Thought 3: Find out the relation between each such related pair of terms.\n\n\
Format your output as a list of JSON objects. Each element must contain the keys \
'node_1', 'node_2', 'edge', 'entity', 'importance', and 'category'. \
'importance' is an integer from 1 to 5. Strictly respond in JSON format.";

fn extract_workers() -> usize {
    std::env::var("GRAPHLOOM_EXTRACT_WORKERS")
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_EXTRACT_WORKERS)
}

/// The Extraction Engine. Stateless between invocations; every call is one
/// backend round trip.
#[derive(Clone)]
pub struct Extractor {
    llm: LlmClient,
}

impl Extractor {
    /// Create a new extractor on top of a backend client
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Extract candidate triples from one chunk.
    ///
    /// Malformed backend output is a local failure: it is logged with the
    /// offending chunk id and yields an empty list, never an error, so a bad
    /// chunk cannot abort a batch.
    #[instrument(skip(self, chunk), fields(chunk_id = %chunk.id))]
    pub async fn extract(&self, chunk: &Chunk) -> Vec<Triple> {
        let prompt = build_prompt(&chunk.content);

        let response = match self.llm.generate_json(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!("Extraction call failed for chunk {}: {}", chunk.id, e);
                return Vec::new();
            }
        };

        match parse_extraction(&response) {
            Ok(triples) => {
                debug!("Chunk {} produced {} triples", chunk.id, triples.len());
                triples
            }
            Err(e) => {
                warn!("Discarding malformed extraction for chunk {}: {}", chunk.id, e);
                Vec::new()
            }
        }
    }

    /// Extract over a whole batch with bounded concurrency.
    ///
    /// Chunks are independent; results concatenate in completion order, which
    /// is fine because the downstream upsert is order-independent.
    #[instrument(skip(self, chunks))]
    pub async fn extract_batch(&self, chunks: &[Chunk]) -> Vec<Triple> {
        let workers = extract_workers();

        stream::iter(chunks)
            .map(|chunk| self.extract(chunk))
            .buffer_unordered(workers)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}

fn build_prompt(content: &str) -> String {
    format!("{EXTRACTION_PROMPT}\n\ncontext: ```{content}```")
}

// ==========================================
// RESPONSE PARSING
// ==========================================

/// Raw triple as emitted by the backend. Importance arrives as whatever the
/// model felt like (integer, float, string, or missing), so it stays loose
/// here and is coerced afterwards.
#[derive(Debug, Deserialize)]
struct RawTriple {
    #[serde(default)]
    node_1: String,
    #[serde(default)]
    node_2: String,
    #[serde(default)]
    edge: String,
    #[serde(default)]
    entity: String,
    #[serde(default)]
    importance: Value,
    #[serde(default)]
    category: String,
}

/// The payload shapes the backend is known to produce: a flat list, or a
/// legacy object wrapping the list under `nodes` or `ontology`. Resolved
/// once here; the rest of the pipeline only ever sees `Triple`.
#[derive(Deserialize)]
#[serde(untagged)]
enum ExtractionPayload {
    Flat(Vec<RawTriple>),
    Nodes { nodes: Vec<RawTriple> },
    Ontology { ontology: Vec<RawTriple> },
}

impl ExtractionPayload {
    fn into_raw(self) -> Vec<RawTriple> {
        match self {
            Self::Flat(items)
            | Self::Nodes { nodes: items }
            | Self::Ontology { ontology: items } => items,
        }
    }
}

fn parse_extraction(payload: &str) -> Result<Vec<Triple>> {
    let cleaned = normalize_json_payload(payload);

    let payload: ExtractionPayload = serde_json::from_str(&cleaned)
        .map_err(|e| AgentError::Processing(format!("Invalid extraction JSON: {e}")))?;

    Ok(payload
        .into_raw()
        .into_iter()
        .filter_map(raw_to_triple)
        .collect())
}

fn raw_to_triple(raw: RawTriple) -> Option<Triple> {
    Triple {
        node_1: raw.node_1,
        node_2: raw.node_2,
        edge: raw.edge,
        entity: raw.entity,
        importance: coerce_importance(&raw.importance),
        category: raw.category,
    }
    .normalize()
}

fn coerce_importance(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(IMPORTANCE_DEFAULT),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(IMPORTANCE_DEFAULT),
        _ => IMPORTANCE_DEFAULT,
    }
}

/// Trim fences and cut the payload down to its outermost JSON span
fn normalize_json_payload(payload: &str) -> String {
    let without_fence = strip_code_fences(payload);
    if without_fence.is_empty() {
        return without_fence;
    }

    // The model sometimes surrounds the JSON with prose; keep the outermost
    // bracketed span, whichever bracket kind opens first.
    let mut span: Option<(usize, char)> = None;
    for (open, close) in [('[', ']'), ('{', '}')] {
        if let Some(idx) = without_fence.find(open) {
            if span.map_or(true, |(best, _)| idx < best) {
                span = Some((idx, close));
            }
        }
    }

    if let Some((start, close)) = span {
        if let Some(end) = without_fence.rfind(close) {
            if start < end {
                return without_fence[start..=end].to_string();
            }
        }
    }

    without_fence
}
