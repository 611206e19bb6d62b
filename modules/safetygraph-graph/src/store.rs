use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use safetygraph_common::{IndustryClassification, IndustryTaxonomy, UnifiedIncidentRecord};

use crate::reference::SeedReport;

/// Whether a merge-by-key created the node or matched an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Created,
    Updated,
}

/// Relationship types written by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RelKind {
    BelongsToDomain,
    LocatedIn,
    InSector,
}

impl RelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BelongsToDomain => "BELONGS_TO_DOMAIN",
            Self::LocatedIn => "LOCATED_IN",
            Self::InSector => "IN_SECTOR",
        }
    }
}

/// Risk node properties projected from a unified record.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskNode {
    pub id: Uuid,
    pub risk_code: String,
    pub title_en: String,
    pub title_fr: String,
    pub domain_code: String,
    pub hazard_code: String,
    pub primary_country: String,
    pub source_system: String,
    pub source_record_id: Option<String>,
    pub status: String,
    pub validation_status: String,
    pub year: Option<i32>,
    pub total_incidents: Option<u64>,
    pub total_lost_days: Option<u64>,
    pub created_at: DateTime<Utc>,
    /// Set by the store when an existing node is merged again.
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&UnifiedIncidentRecord> for RiskNode {
    fn from(r: &UnifiedIncidentRecord) -> Self {
        let stats = r.incident_statistics.unwrap_or_default();
        Self {
            id: r.risk_id,
            risk_code: r.risk_code.clone(),
            title_en: r.title.en.clone(),
            title_fr: r.title.fr.clone(),
            domain_code: r.domain().code().to_string(),
            hazard_code: r.hazard_classification.unified.hazard_code.clone(),
            primary_country: r.jurisdiction.primary_country.clone(),
            source_system: r.source_system().as_str().to_string(),
            source_record_id: r.data_provenance.source_record_id.clone(),
            status: r.status.as_str().to_string(),
            validation_status: r.data_provenance.validation_status.as_str().to_string(),
            year: stats.year,
            total_incidents: stats.total_incidents,
            total_lost_days: stats.total_lost_days,
            created_at: r.metadata.created_at,
            updated_at: None,
        }
    }
}

/// Industry sector keyed by the record's own industry code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorNode {
    pub code: String,
    pub taxonomy: String,
    pub description: Option<String>,
    pub scian: Option<String>,
    pub nace: Option<String>,
    pub isic: Option<String>,
}

impl SectorNode {
    /// `None` when the record carries no industry code of its own.
    pub fn from_classification(c: &IndustryClassification) -> Option<Self> {
        let code = c.source_code()?.to_string();
        let own = match c.source_taxonomy {
            IndustryTaxonomy::Scian => c.scian.as_ref(),
            IndustryTaxonomy::Nace => c.nace.as_ref(),
            IndustryTaxonomy::Isic => c.isic.as_ref(),
        };
        Some(Self {
            code,
            taxonomy: c.source_taxonomy.as_str().to_string(),
            description: own.and_then(|i| i.description.clone()),
            scian: c.scian.as_ref().map(|i| i.code.clone()),
            nace: c.nace.as_ref().map(|i| i.code.clone()),
            isic: c.isic.as_ref().map(|i| i.code.clone()),
        })
    }
}

/// Node and relationship totals currently held by a store.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub risks: u64,
    pub domains: u64,
    pub jurisdictions: u64,
    pub sectors: u64,
    pub relationships: u64,
}

impl fmt::Display for GraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Graph Contents ===")?;
        writeln!(f, "Risks:         {}", self.risks)?;
        writeln!(f, "Domains:       {}", self.domains)?;
        writeln!(f, "Jurisdictions: {}", self.jurisdictions)?;
        writeln!(f, "Sectors:       {}", self.sectors)?;
        writeln!(f, "Relationships: {}", self.relationships)?;
        Ok(())
    }
}

/// One row of a per-domain risk listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskSummary {
    pub id: Uuid,
    pub risk_code: String,
    pub title_fr: String,
    pub total_incidents: Option<u64>,
    pub source_system: String,
}

impl From<&RiskNode> for RiskSummary {
    fn from(r: &RiskNode) -> Self {
        Self {
            id: r.id,
            risk_code: r.risk_code.clone(),
            title_fr: r.title_fr.clone(),
            total_incidents: r.total_incidents,
            source_system: r.source_system.clone(),
        }
    }
}

/// Property-graph backend the loader writes through.
///
/// Every write is a merge on a natural key. Link operations return how many
/// relationships the merge touched: zero when an endpoint is missing.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Short backend name for reports ("neo4j", "memory").
    fn backend(&self) -> &'static str;

    /// Create constraints and merge the reference domain and jurisdiction
    /// nodes. Safe to re-run.
    async fn seed_reference_nodes(&self) -> anyhow::Result<SeedReport>;

    async fn merge_risk(&self, risk: &RiskNode) -> anyhow::Result<MergeOutcome>;

    async fn merge_sector(&self, sector: &SectorNode) -> anyhow::Result<MergeOutcome>;

    /// Merge `(Risk {id})-[kind]->(target {code})`. Never creates the target.
    async fn link(&self, risk_id: Uuid, kind: RelKind, target_code: &str) -> anyhow::Result<u64>;

    async fn graph_stats(&self) -> anyhow::Result<GraphStats>;

    /// Risks linked to a domain, most incidents first, at most `limit` rows.
    async fn risks_by_domain(&self, domain_code: &str, limit: usize) -> anyhow::Result<Vec<RiskSummary>>;

    /// Release the backend's connections.
    async fn close(&self) -> anyhow::Result<()>;
}

#[async_trait]
impl<S: GraphStore + ?Sized> GraphStore for std::sync::Arc<S> {
    fn backend(&self) -> &'static str {
        (**self).backend()
    }

    async fn seed_reference_nodes(&self) -> anyhow::Result<SeedReport> {
        (**self).seed_reference_nodes().await
    }

    async fn merge_risk(&self, risk: &RiskNode) -> anyhow::Result<MergeOutcome> {
        (**self).merge_risk(risk).await
    }

    async fn merge_sector(&self, sector: &SectorNode) -> anyhow::Result<MergeOutcome> {
        (**self).merge_sector(sector).await
    }

    async fn link(&self, risk_id: Uuid, kind: RelKind, target_code: &str) -> anyhow::Result<u64> {
        (**self).link(risk_id, kind, target_code).await
    }

    async fn graph_stats(&self) -> anyhow::Result<GraphStats> {
        (**self).graph_stats().await
    }

    async fn risks_by_domain(&self, domain_code: &str, limit: usize) -> anyhow::Result<Vec<RiskSummary>> {
        (**self).risks_by_domain(domain_code, limit).await
    }

    async fn close(&self) -> anyhow::Result<()> {
        (**self).close().await
    }
}
