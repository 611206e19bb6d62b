//! In-memory stand-in for the graph store. Holds what the loader writes and
//! answers the same summary queries as the live store.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::reference::{self, DomainNode, JurisdictionNode, SeedReport};
use crate::store::{GraphStats, GraphStore, MergeOutcome, RelKind, RiskNode, RiskSummary, SectorNode};

#[derive(Default)]
struct MemoryState {
    risks: HashMap<Uuid, RiskNode>,
    sectors: HashMap<String, SectorNode>,
    domains: HashMap<String, DomainNode>,
    jurisdictions: HashMap<String, JurisdictionNode>,
    edges: BTreeSet<(Uuid, RelKind, String)>,
}

/// Same merge semantics as the live store, held in process memory.
#[derive(Default)]
pub struct MemoryGraph {
    state: Mutex<MemoryState>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| anyhow::anyhow!("in-memory graph lock poisoned"))
    }

    pub fn node_count(&self) -> usize {
        self.lock()
            .map(|s| s.risks.len() + s.sectors.len() + s.domains.len() + s.jurisdictions.len())
            .unwrap_or(0)
    }

    pub fn risk_count(&self) -> usize {
        self.lock().map(|s| s.risks.len()).unwrap_or(0)
    }

    pub fn sector_count(&self) -> usize {
        self.lock().map(|s| s.sectors.len()).unwrap_or(0)
    }

    pub fn relationship_count(&self) -> usize {
        self.lock().map(|s| s.edges.len()).unwrap_or(0)
    }

    pub fn relationships_of(&self, kind: RelKind) -> usize {
        self.lock()
            .map(|s| s.edges.iter().filter(|(_, k, _)| *k == kind).count())
            .unwrap_or(0)
    }

    pub fn risk(&self, id: Uuid) -> Option<RiskNode> {
        self.lock().ok()?.risks.get(&id).cloned()
    }
}

#[async_trait]
impl GraphStore for MemoryGraph {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn seed_reference_nodes(&self) -> anyhow::Result<SeedReport> {
        let mut state = self.lock()?;
        for d in reference::domains() {
            state.domains.insert(d.code.clone(), d);
        }
        for j in reference::jurisdictions() {
            state.jurisdictions.insert(j.code.clone(), j);
        }
        Ok(SeedReport {
            domains: state.domains.len() as u64,
            jurisdictions: state.jurisdictions.len() as u64,
        })
    }

    async fn merge_risk(&self, risk: &RiskNode) -> anyhow::Result<MergeOutcome> {
        let mut state = self.lock()?;
        match state.risks.get_mut(&risk.id) {
            Some(existing) => {
                existing.title_en = risk.title_en.clone();
                existing.title_fr = risk.title_fr.clone();
                existing.validation_status = risk.validation_status.clone();
                if risk.total_incidents.is_some() {
                    existing.total_incidents = risk.total_incidents;
                }
                if risk.total_lost_days.is_some() {
                    existing.total_lost_days = risk.total_lost_days;
                }
                existing.updated_at = Some(Utc::now());
                Ok(MergeOutcome::Updated)
            }
            None => {
                state.risks.insert(risk.id, risk.clone());
                Ok(MergeOutcome::Created)
            }
        }
    }

    async fn merge_sector(&self, sector: &SectorNode) -> anyhow::Result<MergeOutcome> {
        let mut state = self.lock()?;
        match state.sectors.get_mut(&sector.code) {
            Some(existing) => {
                let refresh = |slot: &mut Option<String>, new: &Option<String>| {
                    if new.is_some() {
                        slot.clone_from(new);
                    }
                };
                refresh(&mut existing.description, &sector.description);
                refresh(&mut existing.scian, &sector.scian);
                refresh(&mut existing.nace, &sector.nace);
                refresh(&mut existing.isic, &sector.isic);
                Ok(MergeOutcome::Updated)
            }
            None => {
                state.sectors.insert(sector.code.clone(), sector.clone());
                Ok(MergeOutcome::Created)
            }
        }
    }

    async fn link(&self, risk_id: Uuid, kind: RelKind, target_code: &str) -> anyhow::Result<u64> {
        let mut state = self.lock()?;
        let target_exists = match kind {
            RelKind::BelongsToDomain => state.domains.contains_key(target_code),
            RelKind::LocatedIn => state.jurisdictions.contains_key(target_code),
            RelKind::InSector => state.sectors.contains_key(target_code),
        };
        if !target_exists || !state.risks.contains_key(&risk_id) {
            return Ok(0);
        }
        state.edges.insert((risk_id, kind, target_code.to_string()));
        Ok(1)
    }

    async fn graph_stats(&self) -> anyhow::Result<GraphStats> {
        let state = self.lock()?;
        Ok(GraphStats {
            risks: state.risks.len() as u64,
            domains: state.domains.len() as u64,
            jurisdictions: state.jurisdictions.len() as u64,
            sectors: state.sectors.len() as u64,
            relationships: state.edges.len() as u64,
        })
    }

    async fn risks_by_domain(&self, domain_code: &str, limit: usize) -> anyhow::Result<Vec<RiskSummary>> {
        let state = self.lock()?;
        let mut rows: Vec<RiskSummary> = state
            .edges
            .iter()
            .filter(|(_, kind, code)| *kind == RelKind::BelongsToDomain && code == domain_code)
            .filter_map(|(id, _, _)| state.risks.get(id))
            .map(RiskSummary::from)
            .collect();
        rows.sort_by(|a, b| {
            Reverse(a.total_incidents)
                .cmp(&Reverse(b.total_incidents))
                .then_with(|| a.risk_code.cmp(&b.risk_code))
        });
        rows.truncate(limit);
        Ok(rows)
    }

    async fn close(&self) -> anyhow::Result<()> {
        let state = self.lock()?;
        tracing::info!(
            risks = state.risks.len(),
            sectors = state.sectors.len(),
            relationships = state.edges.len(),
            "Closing in-memory graph store"
        );
        Ok(())
    }
}
