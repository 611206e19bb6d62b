use neo4rs::query;
use tracing::{info, warn};

use crate::reference::{self, SeedReport};
use crate::GraphClient;

/// Idempotent schema setup: uniqueness constraints, lookup indexes, then the
/// reference Domain and Jurisdiction nodes. Safe to run on every start.
pub async fn initialize_schema(client: &GraphClient) -> Result<SeedReport, neo4rs::Error> {
    let g = &client.graph;

    info!("Initializing graph schema...");

    let constraints = [
        "CREATE CONSTRAINT risk_id IF NOT EXISTS FOR (n:Risk) REQUIRE n.id IS UNIQUE",
        "CREATE CONSTRAINT sector_code IF NOT EXISTS FOR (n:Sector) REQUIRE n.code IS UNIQUE",
        "CREATE CONSTRAINT domain_code IF NOT EXISTS FOR (n:Domain) REQUIRE n.code IS UNIQUE",
        "CREATE CONSTRAINT jurisdiction_code IF NOT EXISTS FOR (n:Jurisdiction) REQUIRE n.code IS UNIQUE",
    ];
    for c in &constraints {
        run_ignoring_exists(g, c).await?;
    }
    info!("Uniqueness constraints created");

    let indexes = [
        "CREATE INDEX risk_code IF NOT EXISTS FOR (n:Risk) ON (n.risk_code)",
        "CREATE INDEX risk_domain IF NOT EXISTS FOR (n:Risk) ON (n.domain_code)",
        "CREATE INDEX risk_country IF NOT EXISTS FOR (n:Risk) ON (n.primary_country)",
    ];
    for idx in &indexes {
        run_ignoring_exists(g, idx).await?;
    }
    info!("Property indexes created");

    for d in reference::domains() {
        let q = query(
            "MERGE (d:Domain {code: $code})
             SET d.name_fr = $name_fr,
                 d.name_en = $name_en,
                 d.danger_level = $danger_level",
        )
        .param("code", d.code.as_str())
        .param("name_fr", d.name_fr.as_str())
        .param("name_en", d.name_en.as_str())
        .param("danger_level", d.danger_level);
        g.run(q).await?;
    }

    for j in reference::jurisdictions() {
        let q = query(
            "MERGE (j:Jurisdiction {code: $code})
             SET j.name_en = $name_en,
                 j.name_fr = $name_fr,
                 j.level = $level",
        )
        .param("code", j.code.as_str())
        .param("name_en", j.name_en.as_str())
        .param("name_fr", j.name_fr.as_str())
        .param("level", j.level.as_str());
        g.run(q).await?;
    }

    let report = verify_schema(client).await?;
    info!(
        domains = report.domains,
        jurisdictions = report.jurisdictions,
        "Reference nodes seeded"
    );
    Ok(report)
}

/// Count the reference nodes currently in the graph.
pub async fn verify_schema(client: &GraphClient) -> Result<SeedReport, neo4rs::Error> {
    let mut stream = client
        .graph
        .execute(query(
            "OPTIONAL MATCH (d:Domain) WITH count(d) AS domains
             OPTIONAL MATCH (j:Jurisdiction)
             RETURN domains, count(j) AS jurisdictions",
        ))
        .await?;

    let mut report = SeedReport::default();
    if let Some(row) = stream.next().await? {
        report.domains = row.get::<i64>("domains").unwrap_or(0).max(0) as u64;
        report.jurisdictions = row.get::<i64>("jurisdictions").unwrap_or(0).max(0) as u64;
    }
    if report.domains == 0 {
        warn!("No Domain nodes found; run schema initialization before loading");
    }
    Ok(report)
}

async fn run_ignoring_exists(g: &neo4rs::Graph, cypher: &str) -> Result<(), neo4rs::Error> {
    match g.run(query(cypher)).await {
        Ok(_) => Ok(()),
        Err(e) => {
            let msg = e.to_string().to_lowercase();
            if msg.contains("already exists") || msg.contains("equivalent") {
                warn!("Already exists (skipped): {}", cypher.chars().take(80).collect::<String>());
                Ok(())
            } else {
                Err(e)
            }
        }
    }
}
