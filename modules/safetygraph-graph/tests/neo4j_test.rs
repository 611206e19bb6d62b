#![cfg(feature = "test-utils")]

// Loader contract against a live Neo4j.
//
// Requirements: Docker (for Neo4j via testcontainers)
//
// Run with: cargo test -p safetygraph-graph --features test-utils --test neo4j_test

use neo4rs::query;
use serde_json::json;

use safetygraph_common::UnifiedIncidentRecord;
use safetygraph_graph::{schema, GraphClient, GraphLoader, Neo4jGraph};
use safetygraph_harmonizer::Harmonizer;

async fn setup() -> (impl std::any::Any, GraphClient) {
    safetygraph_graph::testutil::neo4j_container().await
}

fn harmonize(raw: serde_json::Value) -> UnifiedIncidentRecord {
    Harmonizer::new().transform(&raw, None).unwrap()
}

async fn count(client: &GraphClient, cypher: &str) -> i64 {
    let mut stream = client.inner().execute(query(cypher)).await.unwrap();
    let row = stream.next().await.unwrap().unwrap();
    row.get::<i64>("n").unwrap()
}

#[tokio::test]
async fn schema_initialization_is_repeatable() {
    let (_container, client) = setup().await;

    let first = schema::initialize_schema(&client).await.unwrap();
    let second = schema::initialize_schema(&client).await.unwrap();

    assert!(first.is_complete());
    assert_eq!(first, second);
    assert_eq!(count(&client, "MATCH (d:Domain) RETURN count(d) AS n").await, 16);
    assert_eq!(count(&client, "MATCH (j:Jurisdiction) RETURN count(j) AS n").await, 9);
}

#[tokio::test]
async fn double_load_is_idempotent() {
    let (_container, client) = setup().await;
    let mut loader = GraphLoader::new(Box::new(Neo4jGraph::new(client.clone())));
    loader.initialize_schema().await.unwrap();

    let record = harmonize(json!({"genre_accident": "31", "scian": "236", "nb_lesions": 4}));
    assert!(loader.load(&record).await);
    let nodes = count(&client, "MATCH (n) RETURN count(n) AS n").await;
    let rels = count(&client, "MATCH ()-[r]->() RETURN count(r) AS n").await;

    assert!(loader.load(&record).await);
    assert_eq!(count(&client, "MATCH (n) RETURN count(n) AS n").await, nodes);
    assert_eq!(count(&client, "MATCH ()-[r]->() RETURN count(r) AS n").await, rels);

    let stats = loader.stats();
    assert_eq!(stats.nodes_created, 2);
    assert_eq!(stats.nodes_updated, 2);
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn shared_industry_code_yields_one_sector() {
    let (_container, client) = setup().await;
    let mut loader = GraphLoader::new(Box::new(Neo4jGraph::new(client.clone())));
    loader.initialize_schema().await.unwrap();

    let records = vec![
        harmonize(json!({"event_type": "42", "naics_code": "23821"})),
        harmonize(json!({"event_type": "51", "naics_code": "23821"})),
    ];
    assert_eq!(loader.load_batch(&records, 100).await, 2);

    assert_eq!(count(&client, "MATCH (s:Sector) RETURN count(s) AS n").await, 1);
    assert_eq!(
        count(&client, "MATCH (:Risk)-[r:IN_SECTOR]->(:Sector {code: '23821'}) RETURN count(r) AS n").await,
        2
    );
}

#[tokio::test]
async fn missing_reference_nodes_are_not_created() {
    let (_container, client) = setup().await;
    let mut loader = GraphLoader::new(Box::new(Neo4jGraph::new(client.clone())));

    let record = harmonize(json!({"deviation": "51", "geo": "PL"}));
    assert!(loader.load(&record).await);

    assert_eq!(count(&client, "MATCH (j:Jurisdiction) RETURN count(j) AS n").await, 0);
    assert_eq!(count(&client, "MATCH ()-[r]->() RETURN count(r) AS n").await, 0);
    assert_eq!(loader.stats().relationships_created, 0);
}

#[tokio::test]
async fn graph_stats_and_domain_listing() {
    let (_container, client) = setup().await;
    let mut loader = GraphLoader::new(Box::new(Neo4jGraph::new(client.clone())));
    loader.initialize_schema().await.unwrap();

    let few = harmonize(json!({"genre_accident": "31", "nb_lesions": 3}));
    let many = harmonize(json!({"genre_accident": "31", "nb_lesions": 12, "scian": "236"}));
    assert_eq!(loader.load_batch(&[few.clone(), many.clone()], 10).await, 2);

    let stats = loader.graph_stats().await.unwrap();
    assert_eq!(stats.risks, 2);
    assert_eq!(stats.domains, 16);
    assert_eq!(stats.jurisdictions, 9);
    assert_eq!(stats.sectors, 1);
    assert_eq!(
        stats.relationships as i64,
        count(&client, "MATCH ()-[r]->() RETURN count(r) AS n").await
    );

    let falls = loader.risks_by_domain("CHUTE", 10).await.unwrap();
    assert_eq!(falls.len(), 2);
    assert_eq!(falls[0].id, many.risk_id);
    assert_eq!(falls[0].total_incidents, Some(12));
    assert_eq!(falls[1].id, few.risk_id);
    assert_eq!(falls[1].source_system, "CNESST");
}

#[tokio::test]
async fn reload_stamps_updated_at() {
    let (_container, client) = setup().await;
    let mut loader = GraphLoader::new(Box::new(Neo4jGraph::new(client.clone())));
    let record = harmonize(json!({"event_type": "42"}));
    let stamped = "MATCH (r:Risk) WHERE r.updated_at IS NOT NULL RETURN count(r) AS n";

    assert!(loader.load(&record).await);
    assert_eq!(count(&client, stamped).await, 0);

    assert!(loader.load(&record).await);
    assert_eq!(count(&client, stamped).await, 1);
}
