use std::fmt;

use tracing::{info, warn};

use safetygraph_common::{Neo4jConfig, UnifiedIncidentRecord};

use crate::memory::MemoryGraph;
use crate::neo4j::Neo4jGraph;
use crate::reference::SeedReport;
use crate::store::{GraphStats, GraphStore, MergeOutcome, RelKind, RiskNode, RiskSummary, SectorNode};
use crate::GraphClient;

/// Counters accumulated by one loader until explicitly reset.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GraphLoadStats {
    pub records_loaded: u64,
    pub nodes_created: u64,
    pub nodes_updated: u64,
    pub relationships_created: u64,
    pub errors: u64,
}

impl GraphLoadStats {
    fn count_merge(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Created => self.nodes_created += 1,
            MergeOutcome::Updated => self.nodes_updated += 1,
        }
    }
}

impl fmt::Display for GraphLoadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Graph Load Stats ===")?;
        writeln!(f, "Records loaded:        {}", self.records_loaded)?;
        writeln!(f, "Nodes created:         {}", self.nodes_created)?;
        writeln!(f, "Nodes updated:         {}", self.nodes_updated)?;
        writeln!(f, "Relationships created: {}", self.relationships_created)?;
        writeln!(f, "Errors:                {}", self.errors)?;
        Ok(())
    }
}

/// Upserts unified records into a graph store.
pub struct GraphLoader {
    store: Box<dyn GraphStore>,
    stats: GraphLoadStats,
}

impl GraphLoader {
    pub fn new(store: Box<dyn GraphStore>) -> Self {
        Self { store, stats: GraphLoadStats::default() }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryGraph::new()))
    }

    /// Pick the backend from configuration. A missing or unreachable Neo4j
    /// yields the in-memory store.
    pub async fn from_config(config: Option<&Neo4jConfig>) -> Self {
        let Some(cfg) = config else {
            info!("No Neo4j configured, using in-memory graph store");
            return Self::in_memory();
        };
        match GraphClient::from_config(cfg).await {
            Ok(client) => {
                info!(uri = cfg.uri.as_str(), "Connected to Neo4j");
                Self::new(Box::new(Neo4jGraph::new(client)))
            }
            Err(e) => {
                warn!(uri = cfg.uri.as_str(), error = %e, "Neo4j unreachable, falling back to in-memory graph store");
                Self::in_memory()
            }
        }
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    pub fn store(&self) -> &dyn GraphStore {
        self.store.as_ref()
    }

    /// Create constraints and seed reference nodes. Idempotent.
    pub async fn initialize_schema(&self) -> anyhow::Result<SeedReport> {
        self.store.seed_reference_nodes().await
    }

    /// Load one record. Failures are logged and counted; the caller moves on.
    pub async fn load(&mut self, record: &UnifiedIncidentRecord) -> bool {
        let mut delta = GraphLoadStats::default();
        let result = self.upsert(record, &mut delta).await;
        self.stats.nodes_created += delta.nodes_created;
        self.stats.nodes_updated += delta.nodes_updated;
        self.stats.relationships_created += delta.relationships_created;
        match result {
            Ok(()) => {
                self.stats.records_loaded += 1;
                true
            }
            Err(e) => {
                self.stats.errors += 1;
                warn!(risk_id = %record.risk_id, error = %e, "Failed to load record into graph");
                false
            }
        }
    }

    /// Load records in chunks of `batch_size`, returning how many succeeded.
    pub async fn load_batch(&mut self, records: &[UnifiedIncidentRecord], batch_size: usize) -> usize {
        let mut loaded = 0;
        for (i, chunk) in records.chunks(batch_size.max(1)).enumerate() {
            for record in chunk {
                if self.load(record).await {
                    loaded += 1;
                }
            }
            info!(
                batch = i + 1,
                loaded,
                total = records.len(),
                backend = self.backend(),
                "Graph batch loaded"
            );
        }
        loaded
    }

    async fn upsert(&self, record: &UnifiedIncidentRecord, delta: &mut GraphLoadStats) -> anyhow::Result<()> {
        let risk = RiskNode::from(record);
        delta.count_merge(self.store.merge_risk(&risk).await?);

        delta.relationships_created += self
            .store
            .link(risk.id, RelKind::BelongsToDomain, &risk.domain_code)
            .await?;

        for code in &record.jurisdiction.applicable_jurisdictions {
            delta.relationships_created += self.store.link(risk.id, RelKind::LocatedIn, code).await?;
        }

        if let Some(sector) = SectorNode::from_classification(&record.industry_classification) {
            delta.count_merge(self.store.merge_sector(&sector).await?);
            delta.relationships_created += self.store.link(risk.id, RelKind::InSector, &sector.code).await?;
        }
        Ok(())
    }

    pub fn stats(&self) -> GraphLoadStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = GraphLoadStats::default();
    }

    /// What the store holds right now, across every run that wrote to it.
    pub async fn graph_stats(&self) -> anyhow::Result<GraphStats> {
        self.store.graph_stats().await
    }

    pub async fn risks_by_domain(&self, domain_code: &str, limit: usize) -> anyhow::Result<Vec<RiskSummary>> {
        self.store.risks_by_domain(domain_code, limit).await
    }

    /// Release the store's connections.
    pub async fn close(self) -> anyhow::Result<()> {
        self.store.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use uuid::Uuid;

    /// Store whose risk merge always fails.
    struct FailingStore;

    #[async_trait]
    impl GraphStore for FailingStore {
        fn backend(&self) -> &'static str {
            "failing"
        }
        async fn seed_reference_nodes(&self) -> anyhow::Result<SeedReport> {
            Ok(SeedReport::default())
        }
        async fn merge_risk(&self, _risk: &RiskNode) -> anyhow::Result<MergeOutcome> {
            anyhow::bail!("session expired")
        }
        async fn merge_sector(&self, _sector: &SectorNode) -> anyhow::Result<MergeOutcome> {
            Ok(MergeOutcome::Created)
        }
        async fn link(&self, _risk_id: Uuid, _kind: RelKind, _code: &str) -> anyhow::Result<u64> {
            Ok(0)
        }
        async fn graph_stats(&self) -> anyhow::Result<GraphStats> {
            Ok(GraphStats::default())
        }
        async fn risks_by_domain(&self, _code: &str, _limit: usize) -> anyhow::Result<Vec<RiskSummary>> {
            Ok(Vec::new())
        }
        async fn close(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn record() -> UnifiedIncidentRecord {
        let raw = serde_json::json!({"event_type": "42", "naics_code": "23821"});
        safetygraph_harmonizer::Harmonizer::new().transform(&raw, None).unwrap()
    }

    #[tokio::test]
    async fn failing_record_is_counted_and_skipped() {
        let mut loader = GraphLoader::new(Box::new(FailingStore));
        let records = vec![record(), record()];
        assert_eq!(loader.load_batch(&records, 10).await, 0);
        let stats = loader.stats();
        assert_eq!(stats.errors, 2);
        assert_eq!(stats.nodes_created, 0);
    }

    #[tokio::test]
    async fn unreachable_config_falls_back_to_memory() {
        let loader = GraphLoader::from_config(None).await;
        assert_eq!(loader.backend(), "memory");
    }

    #[test]
    fn stats_display_has_every_counter() {
        let stats = GraphLoadStats { nodes_created: 3, errors: 1, ..Default::default() };
        let out = stats.to_string();
        assert!(out.contains("Nodes created:         3"));
        assert!(out.contains("Errors:                1"));
    }
}
