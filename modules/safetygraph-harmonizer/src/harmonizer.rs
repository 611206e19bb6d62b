use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use safetygraph_common::{RawRecord, UnifiedDomain, UnifiedIncidentRecord};

use crate::concordance::Concordances;
use crate::detect::{SourceDetector, SourceKind};
use crate::error::HarmonizeError;
use crate::identifiers;
use crate::stats::TransformationStats;
use crate::transform;
use crate::validate::{self, ValidationReport};

/// A raw record that could not be harmonized. `index` is its zero-based
/// position in the batch; the display form counts from one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    pub index: usize,
    pub source_record_id: Option<String>,
    pub error: HarmonizeError,
}

impl std::fmt::Display for RecordFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.source_record_id {
            Some(id) => write!(f, "record #{} (id {}): {}", self.index + 1, id, self.error),
            None => write!(f, "record #{}: {}", self.index + 1, self.error),
        }
    }
}

/// Result of a batch transform: successes in input order plus every failure.
#[derive(Debug, Clone, Default)]
pub struct HarmonizedBatch {
    pub records: Vec<UnifiedIncidentRecord>,
    pub failures: Vec<RecordFailure>,
}

/// Turns raw source records into unified records and counts what it did.
///
/// Concordance tables are injected and shared read-only, so independent
/// harmonizers never see each other's state.
pub struct Harmonizer {
    concordances: Arc<Concordances>,
    detector: SourceDetector,
    stats: TransformationStats,
}

impl Default for Harmonizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Harmonizer {
    pub fn new() -> Self {
        Self::with_concordances(Concordances::shared())
    }

    pub fn with_concordances(concordances: Arc<Concordances>) -> Self {
        Self {
            concordances,
            detector: SourceDetector::default(),
            stats: TransformationStats::default(),
        }
    }

    pub fn with_detector(mut self, detector: SourceDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn concordances(&self) -> &Concordances {
        &self.concordances
    }

    /// Harmonize one raw value, reporting why it failed.
    pub fn try_transform(
        &mut self,
        raw: &Value,
        source_hint: Option<&str>,
    ) -> Result<UnifiedIncidentRecord, HarmonizeError> {
        let envelope = match RawRecord::from_value(raw.clone()) {
            Ok(envelope) => envelope,
            Err(e) => {
                let kind = source_hint.and_then(SourceKind::from_hint).unwrap_or(SourceKind::Generic);
                self.stats.record_attempt(kind);
                self.stats.record_failure();
                return Err(e.into());
            }
        };
        self.transform_envelope(&envelope, source_hint)
    }

    /// Harmonize one raw value. Failures are logged and counted, never raised.
    pub fn transform(&mut self, raw: &Value, source_hint: Option<&str>) -> Option<UnifiedIncidentRecord> {
        match self.try_transform(raw, source_hint) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to harmonize record");
                None
            }
        }
    }

    pub fn transform_envelope(
        &mut self,
        raw: &RawRecord,
        source_hint: Option<&str>,
    ) -> Result<UnifiedIncidentRecord, HarmonizeError> {
        let kind = self.detector.resolve(raw, source_hint);
        if kind == SourceKind::Generic && source_hint.is_none() {
            tracing::debug!("No source signature matched, using generic transform");
        }
        self.stats.record_attempt(kind);
        match transform::transform(kind, &self.concordances, raw) {
            Ok(record) => {
                self.stats.record_success(record.domain());
                Ok(record)
            }
            Err(e) => {
                self.stats.record_failure();
                Err(e)
            }
        }
    }

    /// Harmonize a batch. Order of successes is preserved; a failure never
    /// stops the batch.
    pub fn transform_batch(&mut self, records: &[Value], source_hint: Option<&str>) -> HarmonizedBatch {
        let mut batch = HarmonizedBatch::default();
        for (index, raw) in records.iter().enumerate() {
            match self.try_transform(raw, source_hint) {
                Ok(record) => batch.records.push(record),
                Err(error) => {
                    let failure = RecordFailure {
                        index,
                        source_record_id: source_record_id(raw),
                        error,
                    };
                    tracing::warn!(%failure, "Skipping record");
                    batch.failures.push(failure);
                }
            }
        }
        tracing::info!(
            harmonized = batch.records.len(),
            total = records.len(),
            "Batch harmonized"
        );
        batch
    }

    /// Check a record's invariants and stamp the outcome on its provenance.
    pub fn validate_record(&self, record: &mut UnifiedIncidentRecord) -> ValidationReport {
        validate::apply_validation(record)
    }

    pub fn generate_risk_id(&self) -> Uuid {
        identifiers::generate_risk_id()
    }

    pub fn generate_risk_code(&self, domain: UnifiedDomain, jurisdiction: &str, sequence: Option<u64>) -> String {
        identifiers::generate_risk_code(domain, jurisdiction, sequence)
    }

    pub fn stats(&self) -> &TransformationStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = TransformationStats::default();
    }
}

fn source_record_id(raw: &Value) -> Option<String> {
    let obj = raw.as_object()?;
    ["id", "ID", "ActivityNr", "numero_dossier"]
        .iter()
        .find_map(|k| match obj.get(*k)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn counts_by_source_and_domain() {
        let mut h = Harmonizer::new();
        h.transform(&json!({"event_type": "42"}), None).unwrap();
        h.transform(&json!({"deviation": "51"}), None).unwrap();
        h.transform(&json!({"anything": true}), None).unwrap();
        assert!(h.transform(&json!(null), None).is_none());

        let s = h.stats();
        assert_eq!(s.records_processed, 4);
        assert_eq!(s.records_harmonized, 3);
        assert_eq!(s.records_failed, 1);
        assert_eq!(s.source_count(SourceKind::Osha), 1);
        assert_eq!(s.source_count(SourceKind::Generic), 2);
        assert_eq!(s.domain_count(UnifiedDomain::Falls), 2);
        assert_eq!(s.domain_count(UnifiedDomain::Other), 1);
    }

    #[test]
    fn reset_clears_everything() {
        let mut h = Harmonizer::new();
        h.transform(&json!({"event_type": "42"}), None);
        h.reset_stats();
        assert_eq!(h.stats(), &TransformationStats::default());
    }

    #[test]
    fn stats_display_lists_sources() {
        let mut h = Harmonizer::new();
        h.transform(&json!({"genre_accident": "51"}), None);
        let out = h.stats().to_string();
        assert!(out.contains("Harmonized: 1"));
        assert!(out.contains("CNESST"));
        assert!(out.contains("ELEC"));
    }

    #[test]
    fn failures_are_numbered_from_one() {
        let mut h = Harmonizer::new();
        let batch = h.transform_batch(
            &[json!({"event_type": "42"}), json!({"genre_accident": "31", "nb_lesions": "many", "id": "Q-9"})],
            None,
        );
        assert_eq!(batch.failures.len(), 1);
        let failure = &batch.failures[0];
        assert_eq!(failure.index, 1);
        assert!(failure.to_string().starts_with("record #2 (id Q-9):"));
    }

    #[test]
    fn hint_routes_to_the_named_transform() {
        let mut h = Harmonizer::new();
        let r = h.transform(&json!({"genre_accident": "51"}), Some("osha")).unwrap();
        assert_eq!(r.jurisdiction.primary_country, "US");
        assert_eq!(r.domain(), UnifiedDomain::Other);
    }
}
