//! Per-source transforms from a raw envelope to a unified record.
//!
//! Each transform reads its source's historical field spellings, resolves every
//! code through the concordance tables and assembles the record. Unmapped codes
//! are normal input; only an unusable count fails a record. A year that cannot
//! be read is dropped with a warning.

use chrono::{DateTime, Utc};

use safetygraph_common::{
    BilingualText, DataProvenance, HazardClassification, IncidentStatistics, IndustryClassification,
    IndustryCode, IndustryTaxonomy, Jurisdiction, RawRecord, RecordMetadata, RecordStatus,
    RecordVersion, ReportingPeriod, ResolvedCode, SourceHazard, SourceSystem, Subdivision,
    SubdivisionType, UnifiedDomain, UnifiedHazard, UnifiedIncidentRecord, ValidationStatus,
    SCHEMA_VERSION,
};

use crate::concordance::{CodeEntry, Concordances, HazardEntry, Resolution};
use crate::detect::SourceKind;
use crate::error::HarmonizeError;
use crate::identifiers::{generate_risk_code, generate_risk_id};

// Field aliases, newest spelling first.
const OSHA_EVENT: &[&str] = &["event_type", "EventType"];
const OSHA_EVENT_DESCRIPTION: &[&str] = &["event_description", "EventTitle"];
const OSHA_NATURE: &[&str] = &["nature", "Nature"];
const OSHA_BODY_PART: &[&str] = &["body_part", "PartOfBody"];
const OSHA_NAICS: &[&str] = &["naics_code", "NAICS", "Primary NAICS"];
const OSHA_ID: &[&str] = &["id", "ID", "ActivityNr"];
const OSHA_YEAR: &[&str] = &["year", "EventDate", "event_date"];

const ESAW_DEVIATION: &[&str] = &["deviation", "DEVIATION"];
const ESAW_GEO: &[&str] = &["geo", "GEO"];
const ESAW_NACE: &[&str] = &["nace_r2", "NACE_R2"];
const ESAW_VALUE: &[&str] = &["OBS_VALUE", "value"];
const ESAW_PERIOD: &[&str] = &["TIME_PERIOD", "year"];

const CNESST_GENRE: &[&str] = &["genre_accident", "GenreAccident"];
const CNESST_SCIAN: &[&str] = &["scian", "SCIAN"];
const CNESST_INCIDENTS: &[&str] = &["nombre_lesions", "nb_lesions"];
const CNESST_LOST_DAYS: &[&str] = &["jours_perdus", "JoursPerdus"];
const CNESST_YEAR: &[&str] = &["annee", "year"];
const CNESST_ID: &[&str] = &["id", "numero_dossier"];

const GENERIC_JURISDICTION: &[&str] = &["country", "jurisdiction", "geo"];

const EU: &str = "EU";

pub fn transform(
    kind: SourceKind,
    concordances: &Concordances,
    raw: &RawRecord,
) -> Result<UnifiedIncidentRecord, HarmonizeError> {
    if raw.is_empty() {
        return Err(HarmonizeError::Malformed("record has no fields".into()));
    }
    match kind {
        SourceKind::Osha => transform_osha(concordances, raw),
        SourceKind::Esaw => transform_esaw(concordances, raw),
        SourceKind::Cnesst => transform_cnesst(concordances, raw),
        SourceKind::Generic => transform_generic(raw),
    }
}

fn transform_osha(c: &Concordances, raw: &RawRecord) -> Result<UnifiedIncidentRecord, HarmonizeError> {
    let event_code = raw.text(OSHA_EVENT).unwrap_or_default();
    let nature_code = raw.text(OSHA_NATURE).unwrap_or_default();
    let body_part_code = raw.text(OSHA_BODY_PART).unwrap_or_default();

    let event = c.osha_event.resolve(&event_code);
    log_unresolved("osha_event", &event_code, &event);

    let year = raw.year(OSHA_YEAR);
    let statistics = year.map(|y| IncidentStatistics {
        year: Some(y),
        reporting_period: ReportingPeriod::calendar_year(y),
        ..Default::default()
    });

    let inspection = raw
        .text(&["source"])
        .is_some_and(|s| s.to_lowercase().contains("inspection"));

    Ok(RecordParts {
        risk_jurisdiction: "US",
        status: RecordStatus::Active,
        hazard: event.entry,
        source: SourceHazard::Osha {
            event_type_code: event_code,
            event_type_description: raw.text(OSHA_EVENT_DESCRIPTION),
            nature: resolved(&nature_code, c.osha_nature.resolve(&nature_code).entry),
            body_part: resolved(&body_part_code, c.osha_body_part.resolve(&body_part_code).entry),
        },
        jurisdiction: Jurisdiction {
            primary_country: "US".into(),
            country_name: Some(BilingualText::new("United States", "États-Unis")),
            subdivision: None,
            applicable_jurisdictions: vec!["US".into()],
        },
        industry: scian_industry(c, raw.text(OSHA_NAICS), None),
        statistics,
        source_system: if inspection {
            SourceSystem::OshaInspection
        } else {
            SourceSystem::OshaSevereInjury
        },
        source_record_id: raw.text(OSHA_ID),
        validation_status: ValidationStatus::Pending,
        tags: vec!["osha".into(), "usa".into()],
    }
    .assemble(raw))
}

fn transform_esaw(c: &Concordances, raw: &RawRecord) -> Result<UnifiedIncidentRecord, HarmonizeError> {
    let deviation_code = raw.text(ESAW_DEVIATION).unwrap_or_default();
    let deviation = c.esaw_deviation.resolve(&deviation_code);
    log_unresolved("esaw_deviation", &deviation_code, &deviation);

    let country: String = raw
        .text(ESAW_GEO)
        .map(|geo| geo.chars().take(2).collect::<String>().to_uppercase())
        .unwrap_or_else(|| EU.to_string());
    let mut applicable = vec![country.clone()];
    if country != EU {
        applicable.push(EU.to_string());
    }

    let total_incidents = raw.count(ESAW_VALUE)?;
    let year = raw.year(ESAW_PERIOD);
    let statistics = (total_incidents.is_some() || year.is_some()).then(|| IncidentStatistics {
        total_incidents,
        total_lost_days: None,
        year,
        reporting_period: year.and_then(ReportingPeriod::calendar_year),
    });

    let tags = vec!["esaw".into(), "eurostat".into(), country.to_lowercase()];
    Ok(RecordParts {
        risk_jurisdiction: &country,
        status: RecordStatus::Active,
        hazard: deviation.entry,
        source: SourceHazard::Esaw {
            deviation_code,
            deviation_description: deviation.entry.label.clone(),
        },
        jurisdiction: Jurisdiction {
            primary_country: country.clone(),
            country_name: None,
            subdivision: None,
            applicable_jurisdictions: applicable,
        },
        industry: nace_industry(c, raw.text(ESAW_NACE)),
        statistics,
        source_system: SourceSystem::EurostatEsaw,
        source_record_id: raw.text(&["id"]),
        validation_status: ValidationStatus::Pending,
        tags,
    }
    .assemble(raw))
}

fn transform_cnesst(c: &Concordances, raw: &RawRecord) -> Result<UnifiedIncidentRecord, HarmonizeError> {
    let genre_code = raw.text(CNESST_GENRE).unwrap_or_default();
    let genre = c.cnesst_genre.resolve(&genre_code);
    log_unresolved("cnesst_genre", &genre_code, &genre);

    let total_incidents = raw.count(CNESST_INCIDENTS)?;
    let total_lost_days = raw.count(CNESST_LOST_DAYS)?;
    let year = raw.year(CNESST_YEAR);
    let statistics = (total_incidents.is_some() || total_lost_days.is_some() || year.is_some())
        .then(|| IncidentStatistics {
            total_incidents,
            total_lost_days,
            year,
            reporting_period: year.and_then(ReportingPeriod::calendar_year),
        });

    Ok(RecordParts {
        risk_jurisdiction: "QC",
        status: RecordStatus::Active,
        hazard: genre.entry,
        source: SourceHazard::Cnesst {
            genre_accident_code: genre_code,
            genre_accident_description: raw.text(&["genre_description"]),
            nature_lesion_code: raw.text(&["nature_lesion"]),
            siege_lesion_code: raw.text(&["siege_lesion"]),
            agent_causal_code: raw.text(&["agent_causal"]),
        },
        jurisdiction: Jurisdiction {
            primary_country: "CA".into(),
            country_name: Some(BilingualText::new("Canada", "Canada")),
            subdivision: Some(Subdivision {
                code: "CA-QC".into(),
                name: BilingualText::new("Quebec", "Québec"),
                kind: SubdivisionType::StateProvincial,
            }),
            applicable_jurisdictions: vec!["CA".into(), "QC".into()],
        },
        industry: scian_industry(c, raw.text(CNESST_SCIAN), raw.text(&["secteur"])),
        statistics,
        source_system: SourceSystem::Cnesst,
        source_record_id: raw.text(CNESST_ID),
        validation_status: ValidationStatus::Pending,
        tags: vec!["cnesst".into(), "quebec".into(), "canada".into()],
    }
    .assemble(raw))
}

/// A 2 or 3 letter country code, upper-cased. Free-text names are not codes.
fn country_code(value: &str) -> Option<String> {
    let value = value.trim();
    ((2..=3).contains(&value.len()) && value.chars().all(|c| c.is_ascii_alphabetic()))
        .then(|| value.to_ascii_uppercase())
}

/// Minimal record for input no signature recognised. Always a draft awaiting review.
fn transform_generic(raw: &RawRecord) -> Result<UnifiedIncidentRecord, HarmonizeError> {
    let country = raw
        .text(GENERIC_JURISDICTION)
        .and_then(|c| country_code(&c))
        .unwrap_or_else(|| "XX".to_string());
    let other = HazardEntry {
        unified_code: "AUTRE-99".into(),
        domain: UnifiedDomain::Other,
        label: BilingualText::new(UnifiedDomain::Other.name_en(), UnifiedDomain::Other.name_fr()),
    };

    let mut record = RecordParts {
        risk_jurisdiction: &country,
        status: RecordStatus::Draft,
        hazard: &other,
        source: SourceHazard::Unclassified,
        jurisdiction: Jurisdiction {
            primary_country: country.clone(),
            country_name: None,
            subdivision: None,
            applicable_jurisdictions: vec![country.clone()],
        },
        industry: IndustryClassification::unknown(IndustryTaxonomy::Scian),
        statistics: None,
        source_system: SourceSystem::ManualEntry,
        source_record_id: raw.text(&["id"]),
        validation_status: ValidationStatus::ReviewRequired,
        tags: vec!["generic".into()],
    }
    .assemble(raw);
    record.title = BilingualText::new("Unclassified Record", "Enregistrement non classé");
    Ok(record)
}

// --- Assembly ---

struct RecordParts<'a> {
    risk_jurisdiction: &'a str,
    status: RecordStatus,
    hazard: &'a HazardEntry,
    source: SourceHazard,
    jurisdiction: Jurisdiction,
    industry: IndustryClassification,
    statistics: Option<IncidentStatistics>,
    source_system: SourceSystem,
    source_record_id: Option<String>,
    validation_status: ValidationStatus,
    tags: Vec<String>,
}

impl RecordParts<'_> {
    fn assemble(self, raw: &RawRecord) -> UnifiedIncidentRecord {
        let now: DateTime<Utc> = Utc::now();
        let domain = self.hazard.domain;
        let mut tags = self.tags;
        tags.push(domain.code().to_lowercase());

        UnifiedIncidentRecord {
            risk_id: generate_risk_id(),
            risk_code: generate_risk_code(domain, self.risk_jurisdiction, None),
            version: RecordVersion::INITIAL,
            status: self.status,
            title: self.hazard.label.clone(),
            jurisdiction: self.jurisdiction,
            hazard_classification: HazardClassification {
                source: self.source,
                unified: UnifiedHazard {
                    domain_code: domain,
                    hazard_code: self.hazard.unified_code.clone(),
                    domain_label: self.hazard.label.clone(),
                },
            },
            industry_classification: self.industry,
            incident_statistics: self.statistics,
            data_provenance: DataProvenance {
                source_system: self.source_system,
                source_record_id: self.source_record_id,
                extraction_date: now,
                validation_status: self.validation_status,
            },
            metadata: RecordMetadata {
                created_at: now,
                schema_version: SCHEMA_VERSION.to_string(),
                tags,
            },
            source_record: Some(raw.to_value()),
        }
    }
}

fn resolved(source_code: &str, entry: &CodeEntry) -> ResolvedCode {
    ResolvedCode {
        source_code: source_code.to_string(),
        unified_code: entry.unified_code.clone(),
        label: entry.label.clone(),
    }
}

fn scian_industry(c: &Concordances, code: Option<String>, description: Option<String>) -> IndustryClassification {
    let Some(code) = code else {
        return IndustryClassification::unknown(IndustryTaxonomy::Scian);
    };
    let entry = c.scian_industry.resolve(&code).entry;
    IndustryClassification {
        source_taxonomy: IndustryTaxonomy::Scian,
        scian: Some(IndustryCode {
            code,
            description: description.or_else(|| entry.label.clone()),
        }),
        nace: entry.nace.clone().map(|code| IndustryCode { code, description: entry.label.clone() }),
        isic: entry.isic.clone().map(|code| IndustryCode { code, description: None }),
    }
}

fn nace_industry(c: &Concordances, code: Option<String>) -> IndustryClassification {
    let Some(code) = code else {
        return IndustryClassification::unknown(IndustryTaxonomy::Nace);
    };
    let entry = c.nace_industry.resolve(&code).entry;
    IndustryClassification {
        source_taxonomy: IndustryTaxonomy::Nace,
        scian: entry.scian.clone().map(|code| IndustryCode { code, description: entry.label.clone() }),
        nace: Some(IndustryCode { code, description: entry.label.clone() }),
        isic: entry.isic.clone().map(|code| IndustryCode { code, description: None }),
    }
}

fn log_unresolved(table: &str, code: &str, resolution: &Resolution<'_, HazardEntry>) {
    if resolution.is_catch_all() {
        tracing::debug!(table, code, "No concordance for hazard code, using catch-all");
    }
}
