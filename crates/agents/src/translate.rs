//! Query Translator - natural language to a schema-aware graph query

use crate::llm::strip_code_fences;
use crate::{LlmClient, Result};
use graphloom_db::GraphSchema;
use tracing::{debug, instrument};

/// Statement verbs that must never appear in a generated read query
const WRITE_VERBS: &[&str] = &[
    "create", "insert", "upsert", "update", "delete", "remove", "relate", "define",
];

/// Generates graph queries from free-text questions.
pub struct Translator {
    llm: LlmClient,
}

impl Translator {
    /// Create a new translator on top of a backend client
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    /// Generate a candidate SurrealQL query for the question.
    ///
    /// The current schema constrains what the model may reference. The output
    /// is returned raw; syntactic correctness is the executor's problem, and
    /// it falls back on failure.
    #[instrument(skip(self, schema))]
    pub async fn translate(&self, question: &str, schema: &GraphSchema) -> Result<String> {
        let prompt = build_query_prompt(question, schema);
        let raw = self.llm.generate_deterministic(&prompt).await?;
        let query = strip_code_fences(&raw);

        debug!("Candidate query: {}", query);

        Ok(query)
    }
}

fn build_query_prompt(question: &str, schema: &GraphSchema) -> String {
    let labels = join_sorted(&schema.labels);
    let relationship_types = join_sorted(&schema.relationship_types);

    format!(
        "You are a SurrealQL expert. Generate one optimized SurrealQL query to retrieve \
information for the user's question from a property graph.\n\
\n\
The graph schema:\n\
- Table `node` holds entities with fields: name, entity, importance, category. \
Existing entity labels: [{labels}]\n\
- Table `relation` holds directed edges with fields: from_node (record link to node), \
to_node (record link to node), relation_type, relationship, importance, category. \
Existing relation types: [{relationship_types}]\n\
\n\
Rules:\n\
- Output exactly one SELECT statement over the `relation` table and nothing else. \
No prose, no markdown.\n\
- Read every value through the relation row; never reference an unbound field.\n\
- Put all filtering predicates in the WHERE clause, never inline inside projections.\n\
- Project exactly these aliases: from_node.name AS node, to_node.name AS related_node, \
relation_type AS relationship_type, \
{{ relationship: relationship, importance: importance, category: category }} AS relationship_properties.\n\
- If a label or relation type implied by the question does not exist in the schema, \
relax the query accordingly.\n\
- Do not filter on importance.\n\
\n\
User question: {question}\n\
\n\
SurrealQL query:"
    )
}

fn join_sorted(values: &std::collections::BTreeSet<String>) -> String {
    values.iter().cloned().collect::<Vec<_>>().join(", ")
}

/// Defensive shape check applied before execution.
///
/// Generation is prompted to follow the read-only contract, but prompting is
/// not a guarantee; anything that is not a single SELECT over the relation
/// table is refused and routed to the fallback path.
pub fn validate_shape(query: &str) -> bool {
    let lowered = query.trim().to_lowercase();

    if !lowered.starts_with("select") {
        return false;
    }
    if !contains_word(&lowered, "relation") {
        return false;
    }
    if WRITE_VERBS.iter().any(|verb| contains_word(&lowered, verb)) {
        return false;
    }

    true
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric() && c != '_' && c != '.')
        .any(|word| word == needle || word.split('.').any(|part| part == needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn schema_with(labels: &[&str], rels: &[&str]) -> GraphSchema {
        GraphSchema {
            labels: labels.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
            relationship_types: rels.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>(),
        }
    }

    #[test]
    fn test_prompt_embeds_schema_and_question() {
        let schema = schema_with(&["Country", "Person"], &["ALLY_OF", "declared war on"]);
        let prompt = build_query_prompt("who were the allies of France?", &schema);

        assert!(prompt.contains("Country, Person"));
        assert!(prompt.contains("ALLY_OF, declared war on"));
        assert!(prompt.contains("who were the allies of France?"));
        assert!(prompt.contains("WHERE clause"));
        assert!(prompt.contains("relationship_properties"));
    }

    #[test]
    fn test_prompt_with_empty_schema() {
        let prompt = build_query_prompt("anything", &GraphSchema::default());
        assert!(prompt.contains("Existing entity labels: []"));
        assert!(prompt.contains("Existing relation types: []"));
    }

    #[test]
    fn test_validate_accepts_contract_query() {
        let query = "SELECT from_node.name AS node, to_node.name AS related_node, \
                     relation_type AS relationship_type, \
                     { relationship: relationship, importance: importance, category: category } AS relationship_properties \
                     FROM relation WHERE from_node.name = 'France'";
        assert!(validate_shape(query));
    }

    #[test]
    fn test_validate_rejects_write_statements() {
        assert!(!validate_shape("DELETE relation"));
        assert!(!validate_shape("UPDATE node SET name = 'x'"));
        assert!(!validate_shape(
            "SELECT * FROM relation; DELETE node"
        ));
        assert!(!validate_shape("CREATE node SET name = 'x'"));
    }

    #[test]
    fn test_validate_rejects_prose_and_wrong_tables() {
        assert!(!validate_shape("Here is your query: SELECT * FROM relation"));
        assert!(!validate_shape("SELECT * FROM users"));
        assert!(!validate_shape(""));
    }
}
