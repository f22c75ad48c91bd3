//! SurrealDB schema definitions

use crate::{DbConnection, Result};
use tracing::info;

/// Initialize the graph schema. Safe to run on every startup.
pub async fn initialize_schema(db: &DbConnection) -> Result<()> {
    info!("Initializing graph schema...");

    db.query(SCHEMA_DEFINITION).await?.check()?;

    info!("Schema initialized successfully");
    Ok(())
}

const SCHEMA_DEFINITION: &str = r#"
-- ============================================
-- TABLES
-- ============================================

-- Graph nodes, one record per distinct name
DEFINE TABLE IF NOT EXISTS node SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS name ON node TYPE string;
DEFINE FIELD IF NOT EXISTS entity ON node TYPE string DEFAULT '';
DEFINE FIELD IF NOT EXISTS importance ON node TYPE int DEFAULT 3;
DEFINE FIELD IF NOT EXISTS category ON node TYPE string DEFAULT '';
DEFINE FIELD IF NOT EXISTS created_at ON node TYPE datetime DEFAULT time::now();
DEFINE FIELD IF NOT EXISTS updated_at ON node TYPE datetime DEFAULT time::now();

-- Directed edges, one record per (from, to, relation type)
DEFINE TABLE IF NOT EXISTS relation SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS from_node ON relation TYPE record<node>;
DEFINE FIELD IF NOT EXISTS to_node ON relation TYPE record<node>;
DEFINE FIELD IF NOT EXISTS relation_type ON relation TYPE string;
DEFINE FIELD IF NOT EXISTS relationship ON relation TYPE string DEFAULT '';
DEFINE FIELD IF NOT EXISTS importance ON relation TYPE int DEFAULT 3;
DEFINE FIELD IF NOT EXISTS category ON relation TYPE string DEFAULT '';
DEFINE FIELD IF NOT EXISTS created_at ON relation TYPE datetime DEFAULT time::now();
DEFINE FIELD IF NOT EXISTS updated_at ON relation TYPE datetime DEFAULT time::now();

-- ============================================
-- INDEXES
-- ============================================

-- Node identity is the exact name string
DEFINE INDEX IF NOT EXISTS idx_node_name ON node FIELDS name UNIQUE;

-- Label and relation-type enumeration for schema introspection
DEFINE INDEX IF NOT EXISTS idx_node_entity ON node FIELDS entity;
DEFINE INDEX IF NOT EXISTS idx_relation_type ON relation FIELDS relation_type;

-- Edge identity is the (from, to, type) key
DEFINE INDEX IF NOT EXISTS idx_relation_identity ON relation FIELDS from_node, to_node, relation_type UNIQUE;
"#;
