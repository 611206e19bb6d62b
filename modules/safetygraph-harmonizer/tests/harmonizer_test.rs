use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{json, Value};

use safetygraph_common::{SourceSystem, UnifiedDomain};
use safetygraph_harmonizer::{
    ConcordanceTable, Concordances, FallbackRule, HarmonizeError, Harmonizer, HazardEntry,
};

#[test]
fn osha_fall_code_harmonizes_to_falls() {
    let mut h = Harmonizer::new();
    let record = h.transform(&json!({"event_type": "42", "id": "A-1"}), Some("osha")).unwrap();

    let unified = &record.hazard_classification.unified;
    assert_eq!(unified.domain_code, UnifiedDomain::Falls);
    assert_eq!(unified.domain_code.code(), "CHUTE");
    assert_eq!(unified.domain_label.en, "Fall from height");
    assert_eq!(unified.domain_label.fr, "Chute de hauteur");
    assert_eq!(record.title, unified.domain_label);
}

#[test]
fn unknown_hazard_code_is_other_not_an_error() {
    let mut h = Harmonizer::new();
    for source in ["osha", "esaw", "cnesst"] {
        let raw = match source {
            "osha" => json!({"event_type": "999999"}),
            "esaw" => json!({"deviation": "999999"}),
            _ => json!({"genre_accident": "999999"}),
        };
        let record = h.try_transform(&raw, None).unwrap();
        assert_eq!(record.domain(), UnifiedDomain::Other, "{source}");
        assert_eq!(record.domain().code(), "AUTRE");
        assert!(record.hazard_classification.unified.hazard_code.ends_with("-99"));
    }
    assert_eq!(h.stats().records_failed, 0);
}

#[test]
fn malformed_record_is_reported_by_position() {
    let mut h = Harmonizer::new();
    let batch: Vec<Value> = vec![
        json!({"event_type": "42", "id": "r1"}),
        json!({"deviation": "61", "geo": "DE", "id": "r2"}),
        json!(["not", "a", "mapping"]),
        json!({"genre_accident": "31", "id": "r4"}),
        json!({"country": "FR", "id": "r5"}),
    ];

    let out = h.transform_batch(&batch, None);

    assert_eq!(out.records.len(), 4);
    assert_eq!(h.stats().records_harmonized, 4);
    assert_eq!(h.stats().records_failed, 1);
    assert_eq!(out.failures.len(), 1);
    assert_eq!(out.failures[0].index, 2);
    assert!(matches!(out.failures[0].error, HarmonizeError::Malformed(_)));

    let ids: Vec<_> = out
        .records
        .iter()
        .map(|r| r.data_provenance.source_record_id.as_deref().unwrap())
        .collect();
    assert_eq!(ids, vec!["r1", "r2", "r4", "r5"]);
}

#[test]
fn failure_keeps_the_source_id_when_it_has_one() {
    let mut h = Harmonizer::new();
    let out = h.transform_batch(
        &[json!({"genre_accident": "31", "id": "dossier-7", "nb_lesions": "n/a"})],
        None,
    );
    assert!(out.records.is_empty());
    assert_eq!(out.failures[0].source_record_id.as_deref(), Some("dossier-7"));
    assert!(out.failures[0].to_string().contains("dossier-7"));
}

#[test]
fn recognised_records_always_have_domain_and_jurisdiction() {
    let mut h = Harmonizer::new();
    let samples = [
        json!({"EventType": "21", "NAICS": "332"}),
        json!({"ActivityNr": 55}),
        json!({"DEVIATION": "11", "GEO": "ES"}),
        json!({"nace_r2": "H49"}),
        json!({"GenreAccident": "91"}),
        json!({"scian": "62"}),
    ];
    for raw in samples {
        let r = h.try_transform(&raw, None).unwrap();
        assert!(!r.domain().code().is_empty());
        assert!(!r.jurisdiction.applicable_jurisdictions.is_empty());
        assert_ne!(r.source_system(), SourceSystem::ManualEntry);
    }
}

#[test]
fn risk_ids_are_unique_within_a_harmonizer() {
    let h = Harmonizer::new();
    let ids: HashSet<_> = (0..500).map(|_| h.generate_risk_id()).collect();
    assert_eq!(ids.len(), 500);

    let mut h = Harmonizer::new();
    let raws = vec![json!({"event_type": "42"}); 50];
    let batch = h.transform_batch(&raws, None);
    let ids: HashSet<_> = batch.records.iter().map(|r| r.risk_id).collect();
    assert_eq!(ids.len(), 50);
}

#[test]
fn injected_tables_do_not_leak_between_harmonizers() {
    let mut custom = Concordances::builtin();
    custom.osha_event = ConcordanceTable::new(
        "osha_event",
        [("42", HazardEntry::new("GAZ-01", UnifiedDomain::Gas, "Fuite de gaz", "Gas leak"))],
        FallbackRule::None,
        HazardEntry::unclassified(),
    );
    let mut patched = Harmonizer::with_concordances(Arc::new(custom));
    let mut stock = Harmonizer::new();

    let raw = json!({"event_type": "42"});
    assert_eq!(patched.transform(&raw, None).unwrap().domain(), UnifiedDomain::Gas);
    assert_eq!(stock.transform(&raw, None).unwrap().domain(), UnifiedDomain::Falls);
}

#[test]
fn risk_code_follows_domain_and_jurisdiction() {
    let h = Harmonizer::new();
    assert_eq!(h.generate_risk_code(UnifiedDomain::Electrical, "qc", Some(7)), "ELEC-QC-00000007");
}
