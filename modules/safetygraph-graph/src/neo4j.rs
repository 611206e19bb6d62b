use async_trait::async_trait;
use chrono::{DateTime, Utc};
use neo4rs::query;
use uuid::Uuid;

use crate::reference::SeedReport;
use crate::schema;
use crate::store::{GraphStats, GraphStore, MergeOutcome, RelKind, RiskNode, RiskSummary, SectorNode};
use crate::GraphClient;

/// Live Neo4j adapter.
pub struct Neo4jGraph {
    client: GraphClient,
}

impl Neo4jGraph {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &GraphClient {
        &self.client
    }

    /// Run a merge that returns `created` and report which way it went.
    async fn merge(&self, q: neo4rs::Query) -> anyhow::Result<MergeOutcome> {
        let mut stream = self.client.graph.execute(q).await?;
        let created = match stream.next().await? {
            Some(row) => row.get::<bool>("created")?,
            None => anyhow::bail!("merge returned no row"),
        };
        while stream.next().await?.is_some() {}
        Ok(if created { MergeOutcome::Created } else { MergeOutcome::Updated })
    }
}

#[async_trait]
impl GraphStore for Neo4jGraph {
    fn backend(&self) -> &'static str {
        "neo4j"
    }

    async fn seed_reference_nodes(&self) -> anyhow::Result<SeedReport> {
        Ok(schema::initialize_schema(&self.client).await?)
    }

    async fn merge_risk(&self, risk: &RiskNode) -> anyhow::Result<MergeOutcome> {
        // load_token is written only on create, so reading it back tells a
        // fresh node from a matched one.
        let token = Uuid::new_v4().to_string();
        let q = query(
            "MERGE (r:Risk {id: $id})
             ON CREATE SET
                r.risk_code = $risk_code,
                r.domain_code = $domain_code,
                r.hazard_code = $hazard_code,
                r.primary_country = $primary_country,
                r.source_system = $source_system,
                r.source_record_id = CASE WHEN $source_record_id <> '' THEN $source_record_id ELSE null END,
                r.status = $status,
                r.year = CASE WHEN $year >= 0 THEN $year ELSE null END,
                r.created_at = datetime($created_at),
                r.load_token = $token
             ON MATCH SET
                r.updated_at = datetime($now)
             SET
                r.title_en = $title_en,
                r.title_fr = $title_fr,
                r.validation_status = $validation_status,
                r.total_incidents = CASE WHEN $total_incidents >= 0 THEN $total_incidents ELSE r.total_incidents END,
                r.total_lost_days = CASE WHEN $total_lost_days >= 0 THEN $total_lost_days ELSE r.total_lost_days END
             RETURN r.load_token = $token AS created",
        )
        .param("id", risk.id.to_string())
        .param("risk_code", risk.risk_code.as_str())
        .param("domain_code", risk.domain_code.as_str())
        .param("hazard_code", risk.hazard_code.as_str())
        .param("primary_country", risk.primary_country.as_str())
        .param("source_system", risk.source_system.as_str())
        .param("source_record_id", risk.source_record_id.clone().unwrap_or_default())
        .param("status", risk.status.as_str())
        .param("year", risk.year.map(i64::from).unwrap_or(-1))
        .param("created_at", format_datetime(&risk.created_at))
        .param("token", token.as_str())
        .param("title_en", risk.title_en.as_str())
        .param("title_fr", risk.title_fr.as_str())
        .param("validation_status", risk.validation_status.as_str())
        .param("total_incidents", count_param(risk.total_incidents))
        .param("total_lost_days", count_param(risk.total_lost_days))
        .param("now", format_datetime(&Utc::now()));

        self.merge(q).await
    }

    async fn merge_sector(&self, sector: &SectorNode) -> anyhow::Result<MergeOutcome> {
        let token = Uuid::new_v4().to_string();
        let q = query(
            "MERGE (s:Sector {code: $code})
             ON CREATE SET
                s.taxonomy = $taxonomy,
                s.load_token = $token
             SET
                s.description = CASE WHEN $description <> '' THEN $description ELSE s.description END,
                s.scian = CASE WHEN $scian <> '' THEN $scian ELSE s.scian END,
                s.nace = CASE WHEN $nace <> '' THEN $nace ELSE s.nace END,
                s.isic = CASE WHEN $isic <> '' THEN $isic ELSE s.isic END
             RETURN s.load_token = $token AS created",
        )
        .param("code", sector.code.as_str())
        .param("taxonomy", sector.taxonomy.as_str())
        .param("token", token.as_str())
        .param("description", sector.description.clone().unwrap_or_default())
        .param("scian", sector.scian.clone().unwrap_or_default())
        .param("nace", sector.nace.clone().unwrap_or_default())
        .param("isic", sector.isic.clone().unwrap_or_default());

        self.merge(q).await
    }

    async fn link(&self, risk_id: Uuid, kind: RelKind, target_code: &str) -> anyhow::Result<u64> {
        let label = match kind {
            RelKind::BelongsToDomain => "Domain",
            RelKind::LocatedIn => "Jurisdiction",
            RelKind::InSector => "Sector",
        };
        let q = query(&format!(
            "MATCH (r:Risk {{id: $id}})
             MATCH (t:{label} {{code: $code}})
             MERGE (r)-[rel:{rel}]->(t)
             RETURN count(rel) AS linked",
            rel = kind.as_str(),
        ))
        .param("id", risk_id.to_string())
        .param("code", target_code);

        let mut stream = self.client.graph.execute(q).await?;
        let mut linked = 0u64;
        while let Some(row) = stream.next().await? {
            linked += row.get::<i64>("linked")?.max(0) as u64;
        }
        Ok(linked)
    }

    async fn graph_stats(&self) -> anyhow::Result<GraphStats> {
        let q = query(
            "CALL { MATCH (r:Risk) RETURN count(r) AS risks }
             CALL { MATCH (d:Domain) RETURN count(d) AS domains }
             CALL { MATCH (j:Jurisdiction) RETURN count(j) AS jurisdictions }
             CALL { MATCH (s:Sector) RETURN count(s) AS sectors }
             CALL { MATCH ()-[rel]->() RETURN count(rel) AS relationships }
             RETURN risks, domains, jurisdictions, sectors, relationships",
        );

        let mut stream = self.client.graph.execute(q).await?;
        let Some(row) = stream.next().await? else {
            return Ok(GraphStats::default());
        };
        let count = |key: &str| -> anyhow::Result<u64> { Ok(row.get::<i64>(key)?.max(0) as u64) };
        Ok(GraphStats {
            risks: count("risks")?,
            domains: count("domains")?,
            jurisdictions: count("jurisdictions")?,
            sectors: count("sectors")?,
            relationships: count("relationships")?,
        })
    }

    async fn risks_by_domain(&self, domain_code: &str, limit: usize) -> anyhow::Result<Vec<RiskSummary>> {
        let q = query(
            "MATCH (r:Risk)-[:BELONGS_TO_DOMAIN]->(:Domain {code: $domain_code})
             RETURN r.id AS id, r.risk_code AS risk_code, r.title_fr AS title_fr,
                    coalesce(r.total_incidents, -1) AS total_incidents, r.source_system AS source_system
             ORDER BY total_incidents DESC, risk_code
             LIMIT $limit",
        )
        .param("domain_code", domain_code)
        .param("limit", i64::try_from(limit).unwrap_or(i64::MAX));

        let mut stream = self.client.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            let id: String = row.get("id")?;
            let incidents: i64 = row.get("total_incidents")?;
            rows.push(RiskSummary {
                id: Uuid::parse_str(&id)?,
                risk_code: row.get("risk_code")?,
                title_fr: row.get("title_fr")?,
                total_incidents: u64::try_from(incidents).ok(),
                source_system: row.get("source_system")?,
            });
        }
        Ok(rows)
    }

    async fn close(&self) -> anyhow::Result<()> {
        // neo4rs releases pooled connections when the Graph is dropped.
        tracing::info!("Closing Neo4j graph store");
        Ok(())
    }
}

fn count_param(n: Option<u64>) -> i64 {
    n.and_then(|v| i64::try_from(v).ok()).unwrap_or(-1)
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
}
