use safetygraph_common::{UnifiedIncidentRecord, ValidationStatus};

use crate::identifiers::is_well_formed_risk_code;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check structural invariants of a harmonized record.
pub fn check_record(record: &UnifiedIncidentRecord) -> ValidationReport {
    let mut errors = Vec::new();

    if !is_well_formed_risk_code(&record.risk_code) {
        errors.push(format!("risk_code {:?} is not <DOMAIN>-<JURISDICTION>-<SEQUENCE>", record.risk_code));
    }
    if record.version.major < 1 {
        errors.push(format!("version {} is below 1.0.0", record.version));
    }

    if record.hazard_classification.unified.hazard_code.is_empty() {
        errors.push("hazard_code is empty".into());
    }

    let jurisdiction = &record.jurisdiction;
    if jurisdiction.primary_country.trim().is_empty() {
        errors.push("primary_country is empty".into());
    }
    if jurisdiction.applicable_jurisdictions.is_empty() {
        errors.push("applicable_jurisdictions is empty".into());
    } else if !jurisdiction
        .applicable_jurisdictions
        .iter()
        .any(|j| j == &jurisdiction.primary_country)
    {
        errors.push(format!(
            "applicable_jurisdictions does not include primary country {}",
            jurisdiction.primary_country
        ));
    }

    if let Some(period) = record.incident_statistics.and_then(|s| s.reporting_period) {
        if period.end_date < period.start_date {
            errors.push(format!(
                "reporting period ends ({}) before it starts ({})",
                period.end_date, period.start_date
            ));
        }
    }

    if record.metadata.schema_version.is_empty() {
        errors.push("schema_version is empty".into());
    }

    ValidationReport { errors }
}

/// Validate and stamp the outcome onto the record's provenance. Records
/// awaiting review keep that status unless they are invalid.
pub fn apply_validation(record: &mut UnifiedIncidentRecord) -> ValidationReport {
    let report = check_record(record);
    let status = &mut record.data_provenance.validation_status;
    *status = match (report.is_valid(), *status) {
        (false, _) => ValidationStatus::Invalid,
        (true, ValidationStatus::ReviewRequired) => ValidationStatus::ReviewRequired,
        (true, _) => ValidationStatus::Valid,
    };
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concordance::Concordances;
    use crate::detect::SourceKind;
    use crate::transform::transform;
    use safetygraph_common::RawRecord;
    use serde_json::json;

    fn harmonize(kind: SourceKind, v: serde_json::Value) -> UnifiedIncidentRecord {
        transform(kind, &Concordances::builtin(), &RawRecord::from_value(v).unwrap()).unwrap()
    }

    #[test]
    fn fresh_records_validate() {
        let mut r = harmonize(SourceKind::Osha, json!({"event_type": "42"}));
        assert!(apply_validation(&mut r).is_valid());
        assert_eq!(r.data_provenance.validation_status, ValidationStatus::Valid);
    }

    #[test]
    fn review_status_survives_a_clean_check() {
        let mut r = harmonize(SourceKind::Generic, json!({"x": 1}));
        assert!(apply_validation(&mut r).is_valid());
        assert_eq!(r.data_provenance.validation_status, ValidationStatus::ReviewRequired);
    }

    #[test]
    fn broken_invariants_mark_the_record_invalid() {
        let mut r = harmonize(SourceKind::Esaw, json!({"deviation": "51", "geo": "DE"}));
        r.risk_code = "nope".into();
        r.jurisdiction.applicable_jurisdictions.clear();
        let report = apply_validation(&mut r);
        assert_eq!(report.errors.len(), 2);
        assert_eq!(r.data_provenance.validation_status, ValidationStatus::Invalid);
    }
}
