//! Integration tests for the relational sink.
//! Requires a Postgres instance. Set DATABASE_TEST_URL or these tests are skipped.

use serde_json::json;
use sqlx::PgPool;

use safetygraph_harmonizer::Harmonizer;
use safetygraph_pipeline::RelationalSink;

/// Get a test database pool, or skip if no test DB is available.
async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;

    RelationalSink::new(pool.clone(), 10).ensure_table().await.ok()?;

    // Clean slate for each test
    sqlx::query("TRUNCATE hse_incidents_global RESTART IDENTITY")
        .execute(&pool)
        .await
        .ok()?;

    Some(pool)
}

fn harmonized(n: usize) -> Vec<safetygraph_common::UnifiedIncidentRecord> {
    let raw: Vec<_> = (0..n)
        .map(|i| json!({"event_type": "42", "naics_code": "23821", "id": format!("R-{i}"), "year": 2022}))
        .collect();
    Harmonizer::new().transform_batch(&raw, None).records
}

#[tokio::test]
async fn inserts_in_batches() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let sink = RelationalSink::new(pool.clone(), 2);

    let written = sink.insert(&harmonized(5)).await.unwrap();
    assert_eq!(written, 5);

    let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM hse_incidents_global")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 5);
}

#[tokio::test]
async fn row_carries_record_without_raw_payload() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let sink = RelationalSink::new(pool.clone(), 100);
    let records = harmonized(1);
    sink.insert(&records).await.unwrap();

    let (risk_code, source, year, record): (String, String, Option<i32>, serde_json::Value) = sqlx::query_as(
        "SELECT risk_code, source, year, record FROM hse_incidents_global WHERE risk_id = $1",
    )
    .bind(records[0].risk_id)
    .fetch_one(&pool)
    .await
    .unwrap();

    assert_eq!(risk_code, records[0].risk_code);
    assert_eq!(source, "OSHA_SEVERE_INJURY");
    assert_eq!(year, Some(2022));
    assert!(record.get("_source_record").is_none());
    assert_eq!(record["hazard_classification"]["unified"]["domain_code"], "CHUTE");
}

#[tokio::test]
async fn ensure_table_is_repeatable() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let sink = RelationalSink::new(pool, 100);
    sink.ensure_table().await.unwrap();
    sink.ensure_table().await.unwrap();
    assert_eq!(sink.insert(&[]).await.unwrap(), 0);
}
