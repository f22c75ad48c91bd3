//! Read views of persisted graph records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

/// A node in the property graph.
///
/// Nodes are singletons per distinct `name` string; two triples naming the
/// same string always merge into one node, last writer winning on the
/// annotation fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    /// Record identifier (derived from the name)
    pub id: Option<RecordId>,

    /// Exact, case-sensitive node name
    #[serde(default)]
    pub name: String,

    /// Concept-type label
    #[serde(default)]
    pub entity: String,

    /// Importance on a 1-5 scale
    #[serde(default)]
    pub importance: i64,

    /// Thematic category
    #[serde(default)]
    pub category: String,

    /// When this node was first merged
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A directed edge in the property graph, keyed by
/// `(from node name, to node name, relation type)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Record identifier (derived from the identity key)
    pub id: Option<RecordId>,

    /// Name of the node this edge starts at
    #[serde(default)]
    pub from_node: String,

    /// Name of the node this edge points to
    #[serde(default)]
    pub to_node: String,

    /// Relation description, the edge identity component
    #[serde(default)]
    pub relation_type: String,

    /// Display duplicate of the relation description
    #[serde(default)]
    pub relationship: String,

    /// Importance on a 1-5 scale
    #[serde(default)]
    pub importance: i64,

    /// Thematic category
    #[serde(default)]
    pub category: String,
}
