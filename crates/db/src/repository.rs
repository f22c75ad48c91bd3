//! Repository pattern for graph store operations

use crate::{DbConnection, DbError, Result};
use graphloom_core::{GraphEdge, GraphNode, Triple};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use tracing::{instrument, warn};

/// Repository for all graph store operations
#[derive(Clone)]
pub struct Repository {
    db: DbConnection,
}

// One logical transaction per triple: both endpoint nodes and the edge merge
// together or not at all, so a failure can never leave a dangling edge.
// Record ids are derived from the identity keys (name for nodes, the
// (from, to, type) tuple for edges), which makes the merge idempotent.
const UPSERT_TRIPLE: &str = r#"
BEGIN TRANSACTION;
UPSERT type::thing('node', $node_1) SET
    name = $node_1,
    entity = $entity,
    importance = $importance,
    category = $category,
    updated_at = time::now();
UPSERT type::thing('node', $node_2) SET
    name = $node_2,
    entity = $entity,
    importance = $importance,
    category = $category,
    updated_at = time::now();
UPSERT type::thing('relation', [$node_1, $node_2, $edge]) SET
    from_node = type::thing('node', $node_1),
    to_node = type::thing('node', $node_2),
    relation_type = $edge,
    relationship = $edge,
    importance = $importance,
    category = $category,
    updated_at = time::now();
COMMIT TRANSACTION;
"#;

impl Repository {
    /// Create a new repository
    pub fn new(db: DbConnection) -> Self {
        Self { db }
    }

    // ==========================================
    // UPSERT OPERATIONS
    // ==========================================

    /// Merge a single triple into the graph
    #[instrument(skip(self, triple))]
    pub async fn upsert_triple(&self, triple: &Triple) -> Result<()> {
        self.db
            .query(UPSERT_TRIPLE)
            .bind(("node_1", triple.node_1.clone()))
            .bind(("node_2", triple.node_2.clone()))
            .bind(("edge", triple.edge.clone()))
            .bind(("entity", triple.entity.clone()))
            .bind(("importance", triple.importance))
            .bind(("category", triple.category.clone()))
            .await?
            .check()?;

        Ok(())
    }

    /// Merge a batch of triples, independently and in any order.
    ///
    /// A rejected triple is counted and skipped; it never aborts the batch.
    #[instrument(skip(self, triples))]
    pub async fn upsert_triples(&self, triples: &[Triple]) -> UpsertReport {
        let mut report = UpsertReport::default();

        for triple in triples {
            match self.upsert_triple(triple).await {
                Ok(()) => {
                    report.nodes_touched += 2;
                    report.edges_touched += 1;
                }
                Err(e) => {
                    warn!(
                        "Upsert failed for ({} -> {}): {}",
                        triple.node_1, triple.node_2, e
                    );
                    report.failed += 1;
                }
            }
        }

        report
    }

    // ==========================================
    // SCHEMA INTROSPECTION
    // ==========================================

    /// Read the distinct node labels and relation types currently present.
    ///
    /// An empty graph yields empty sets, not an error.
    #[instrument(skip(self))]
    pub async fn schema(&self) -> Result<GraphSchema> {
        #[derive(Deserialize)]
        struct EntityRow {
            #[serde(default)]
            entity: String,
        }

        #[derive(Deserialize)]
        struct RelationTypeRow {
            #[serde(default)]
            relation_type: String,
        }

        let entities: Vec<EntityRow> = self
            .db
            .query("SELECT entity FROM node")
            .await?
            .take(0)?;

        let relation_types: Vec<RelationTypeRow> = self
            .db
            .query("SELECT relation_type FROM relation")
            .await?
            .take(0)?;

        let labels: BTreeSet<String> = entities
            .into_iter()
            .map(|row| row.entity)
            .filter(|label| !label.is_empty())
            .collect();

        let relationship_types: BTreeSet<String> = relation_types
            .into_iter()
            .map(|row| row.relation_type)
            .filter(|rel| !rel.is_empty())
            .collect();

        Ok(GraphSchema {
            labels,
            relationship_types,
        })
    }

    // ==========================================
    // QUERY EXECUTION
    // ==========================================

    /// Execute a translated graph query.
    ///
    /// Rows deserialize leniently into [`GraphMatch`]; rows carrying no node
    /// text are dropped so generator noise cannot masquerade as an answer.
    #[instrument(skip(self, query))]
    pub async fn run_graph_query(&self, query: &str) -> Result<Vec<GraphMatch>> {
        let rows: Vec<GraphMatch> = self
            .db
            .query(query.to_string())
            .await?
            .take(0)?;

        Ok(rows
            .into_iter()
            .filter(|row| !row.node_text().is_empty())
            .collect())
    }

    // ==========================================
    // STATS AND LISTING
    // ==========================================

    /// Get graph statistics
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<GraphStats> {
        let stats: Vec<GraphStats> = self
            .db
            .query(
                r#"
                RETURN {
                    node_count: (SELECT count() FROM node GROUP ALL)[0].count,
                    relation_count: (SELECT count() FROM relation GROUP ALL)[0].count
                }
            "#,
            )
            .await?
            .take(0)?;

        stats
            .into_iter()
            .next()
            .ok_or_else(|| DbError::QueryFailed("stats".into()))
    }

    /// Look up a node by its exact name
    #[instrument(skip(self))]
    pub async fn node_by_name(&self, name: &str) -> Result<Option<GraphNode>> {
        let nodes: Vec<GraphNode> = self
            .db
            .query("SELECT * FROM node WHERE name = $name")
            .bind(("name", name.to_string()))
            .await?
            .take(0)?;

        Ok(nodes.into_iter().next())
    }

    /// List nodes ordered by name
    #[instrument(skip(self))]
    pub async fn list_nodes(&self, limit: usize) -> Result<Vec<GraphNode>> {
        let mut nodes: Vec<GraphNode> = self
            .db
            .query("SELECT id, name, entity, importance, category, created_at FROM node")
            .await?
            .take(0)?;

        // Sort and limit in Rust to sidestep SurrealDB multi-result `take`
        // quirks on ordered queries.
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        nodes.truncate(limit);

        Ok(nodes)
    }

    /// List edges with endpoint names resolved, ordered by relation type
    #[instrument(skip(self))]
    pub async fn list_relations(&self, limit: usize) -> Result<Vec<GraphEdge>> {
        let mut edges: Vec<GraphEdge> = self
            .db
            .query(
                r#"
                SELECT
                    id,
                    from_node.name AS from_node,
                    to_node.name AS to_node,
                    relation_type,
                    relationship,
                    importance,
                    category
                FROM relation
            "#,
            )
            .await?
            .take(0)?;

        edges.sort_by(|a, b| {
            (&a.relation_type, &a.from_node, &a.to_node)
                .cmp(&(&b.relation_type, &b.from_node, &b.to_node))
        });
        edges.truncate(limit);

        Ok(edges)
    }

    /// Remove every graph record. Used by reset flows and tests.
    #[instrument(skip(self))]
    pub async fn clear(&self) -> Result<()> {
        self.db
            .query("DELETE relation; DELETE node;")
            .await?
            .check()?;
        Ok(())
    }
}

// ==========================================
// RESULT TYPES
// ==========================================

/// Outcome of a batch upsert
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpsertReport {
    /// Node merges issued (two per successful triple)
    pub nodes_touched: usize,
    /// Edge merges issued (one per successful triple)
    pub edges_touched: usize,
    /// Triples the store rejected
    pub failed: usize,
}

/// The current shape of the graph: distinct labels and relation types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSchema {
    pub labels: BTreeSet<String>,
    pub relationship_types: BTreeSet<String>,
}

impl GraphSchema {
    /// True when the graph holds no labeled data yet
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.relationship_types.is_empty()
    }
}

/// One row of a translated query's result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphMatch {
    #[serde(default)]
    pub node: Value,
    #[serde(default)]
    pub related_node: Value,
    #[serde(default)]
    pub relationship_type: String,
    #[serde(default)]
    pub relationship_properties: Value,
}

impl GraphMatch {
    /// Best-effort display text for the matched node
    pub fn node_text(&self) -> String {
        value_text(&self.node)
    }

    /// Best-effort display text for the related node
    pub fn related_node_text(&self) -> String {
        value_text(&self.related_node)
    }

    /// The relationship detail string, when the properties carry one
    pub fn detail(&self) -> Option<String> {
        self.relationship_properties
            .get("relationship")
            .and_then(Value::as_str)
            .filter(|detail| !detail.is_empty())
            .map(str::to_string)
    }
}

/// Render a node value that may be a plain string or an object with a name
fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Object(obj) => obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        _ => String::new(),
    }
}

/// Graph record counts
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GraphStats {
    #[serde(default)]
    pub node_count: i64,
    #[serde(default)]
    pub relation_count: i64,
}
