//! Graph store property tests
//!
//! These run entirely against the in-memory engine; no external services.

use graphloom_core::Triple;
use graphloom_db::{init_memory, Repository};

async fn test_repo() -> Repository {
    let db = init_memory().await.expect("Failed to create test database");
    Repository::new(db)
}

fn sample_triples() -> Vec<Triple> {
    vec![
        Triple::new("France", "Germany", "declared war on")
            .with_entity("Country")
            .with_importance(5)
            .with_category("Political"),
        Triple::new("Germany", "Belgium", "invaded")
            .with_entity("Country")
            .with_importance(5)
            .with_category("Military"),
        Triple::new("Archduke Franz Ferdinand", "Sarajevo", "assassinated in")
            .with_entity("Person")
            .with_importance(4)
            .with_category("Political"),
    ]
}

#[tokio::test]
async fn upsert_is_idempotent() {
    let repo = test_repo().await;
    let triples = sample_triples();

    repo.upsert_triples(&triples).await;
    let first = repo.stats().await.unwrap();

    repo.upsert_triples(&triples).await;
    let second = repo.stats().await.unwrap();

    assert_eq!(first.node_count, second.node_count);
    assert_eq!(first.relation_count, second.relation_count);

    // Attribute values reflect the latest merge
    let node = repo.node_by_name("France").await.unwrap().unwrap();
    assert_eq!(node.entity, "Country");
    assert_eq!(node.importance, 5);
}

#[tokio::test]
async fn upsert_is_order_independent() {
    let forward = test_repo().await;
    let reversed = test_repo().await;

    let triples = sample_triples();
    let mut backwards = triples.clone();
    backwards.reverse();

    forward.upsert_triples(&triples).await;
    reversed.upsert_triples(&backwards).await;

    let forward_stats = forward.stats().await.unwrap();
    let reversed_stats = reversed.stats().await.unwrap();
    assert_eq!(forward_stats.node_count, reversed_stats.node_count);
    assert_eq!(forward_stats.relation_count, reversed_stats.relation_count);

    let forward_edges = forward.list_relations(100).await.unwrap();
    let reversed_edges = reversed.list_relations(100).await.unwrap();
    let keys = |edges: &[graphloom_core::GraphEdge]| {
        edges
            .iter()
            .map(|e| (e.from_node.clone(), e.to_node.clone(), e.relation_type.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(keys(&forward_edges), keys(&reversed_edges));
}

#[tokio::test]
async fn same_name_merges_into_one_node() {
    let repo = test_repo().await;

    // Two triples naming the same string reference the same node, even with
    // diverging annotations; the last writer wins on shared attributes.
    repo.upsert_triple(
        &Triple::new("Mercury", "Solar System", "orbits in")
            .with_entity("Planet")
            .with_category("Astronomy"),
    )
    .await
    .unwrap();
    repo.upsert_triple(
        &Triple::new("Mercury", "Thermometer", "used in")
            .with_entity("Element")
            .with_category("Chemistry"),
    )
    .await
    .unwrap();

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.node_count, 3);
    assert_eq!(stats.relation_count, 2);

    let node = repo.node_by_name("Mercury").await.unwrap().unwrap();
    assert_eq!(node.entity, "Element");
    assert_eq!(node.category, "Chemistry");
}

#[tokio::test]
async fn distinct_relation_strings_are_distinct_edges() {
    let repo = test_repo().await;

    repo.upsert_triple(&Triple::new("France", "Germany", "declared war on"))
        .await
        .unwrap();
    repo.upsert_triple(&Triple::new("France", "Germany", "shares border with"))
        .await
        .unwrap();

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.node_count, 2);
    assert_eq!(stats.relation_count, 2);
}

#[tokio::test]
async fn schema_round_trip() {
    let repo = test_repo().await;

    repo.upsert_triple(
        &Triple::new("United Kingdom", "France", "ALLY_OF").with_entity("Country"),
    )
    .await
    .unwrap();

    let schema = repo.schema().await.unwrap();
    assert!(schema.relationship_types.contains("ALLY_OF"));
    assert!(schema.labels.contains("Country"));
}

#[tokio::test]
async fn schema_of_empty_graph_is_empty() {
    let repo = test_repo().await;

    let schema = repo.schema().await.unwrap();
    assert!(schema.labels.is_empty());
    assert!(schema.relationship_types.is_empty());
    assert!(schema.is_empty());
}

#[tokio::test]
async fn france_germany_scenario() {
    let repo = test_repo().await;

    let triple = Triple::new("France", "Germany", "declared war on")
        .with_entity("Country")
        .with_importance(5)
        .with_category("Political");

    repo.upsert_triple(&triple).await.unwrap();

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.node_count, 2);
    assert_eq!(stats.relation_count, 1);

    let edges = repo.list_relations(10).await.unwrap();
    assert_eq!(edges[0].relation_type, "declared war on");

    // Second pass changes nothing
    repo.upsert_triple(&triple).await.unwrap();

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.node_count, 2);
    assert_eq!(stats.relation_count, 1);
}

#[tokio::test]
async fn empty_batch_leaves_graph_unchanged() {
    let repo = test_repo().await;

    let report = repo.upsert_triples(&[]).await;
    assert_eq!(report.nodes_touched, 0);
    assert_eq!(report.edges_touched, 0);
    assert_eq!(report.failed, 0);

    let stats = repo.stats().await.unwrap();
    assert_eq!(stats.node_count, 0);
    assert_eq!(stats.relation_count, 0);
}

#[tokio::test]
async fn translated_query_shape_executes() {
    let repo = test_repo().await;

    repo.upsert_triple(
        &Triple::new("France", "Germany", "declared war on")
            .with_entity("Country")
            .with_importance(5)
            .with_category("Political"),
    )
    .await
    .unwrap();

    // The projection contract the query translator instructs the backend to emit
    let query = r#"
        SELECT
            from_node.name AS node,
            to_node.name AS related_node,
            relation_type AS relationship_type,
            { relationship: relationship, importance: importance, category: category } AS relationship_properties
        FROM relation
        WHERE from_node.name = 'France'
    "#;

    let matches = repo.run_graph_query(query).await.unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].node_text(), "France");
    assert_eq!(matches[0].related_node_text(), "Germany");
    assert_eq!(matches[0].relationship_type, "declared war on");
    assert_eq!(matches[0].detail().as_deref(), Some("declared war on"));
}

#[tokio::test]
async fn malformed_query_is_an_error_not_a_panic() {
    let repo = test_repo().await;

    let result = repo.run_graph_query("THIS IS NOT A QUERY").await;
    assert!(result.is_err());
}
