use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schema version stamped into every record's metadata.
pub const SCHEMA_VERSION: &str = "1.0.0";

// --- Enums ---

/// Unified hazard domains shared by every source regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum UnifiedDomain {
    #[serde(rename = "ELEC")]
    Electrical,
    #[serde(rename = "CHUTE")]
    Falls,
    #[serde(rename = "INCENDIE")]
    FireExplosion,
    #[serde(rename = "MACHINE")]
    Machinery,
    #[serde(rename = "ERGO")]
    Ergonomics,
    #[serde(rename = "CHIMIQUE")]
    Chemical,
    #[serde(rename = "GAZ")]
    Gas,
    #[serde(rename = "CONFINE")]
    ConfinedSpace,
    #[serde(rename = "THERMIQUE")]
    Thermal,
    #[serde(rename = "RPS")]
    Psychosocial,
    #[serde(rename = "BIOLOGIQUE")]
    Biological,
    #[serde(rename = "BRUIT")]
    Noise,
    #[serde(rename = "VIBRATION")]
    Vibration,
    #[serde(rename = "RAYONNEMENT")]
    Radiation,
    #[serde(rename = "VEHICULE")]
    Vehicle,
    #[serde(rename = "AUTRE")]
    Other,
}

impl UnifiedDomain {
    pub const ALL: [UnifiedDomain; 16] = [
        UnifiedDomain::Electrical,
        UnifiedDomain::Falls,
        UnifiedDomain::FireExplosion,
        UnifiedDomain::Machinery,
        UnifiedDomain::Ergonomics,
        UnifiedDomain::Chemical,
        UnifiedDomain::Gas,
        UnifiedDomain::ConfinedSpace,
        UnifiedDomain::Thermal,
        UnifiedDomain::Psychosocial,
        UnifiedDomain::Biological,
        UnifiedDomain::Noise,
        UnifiedDomain::Vibration,
        UnifiedDomain::Radiation,
        UnifiedDomain::Vehicle,
        UnifiedDomain::Other,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Electrical => "ELEC",
            Self::Falls => "CHUTE",
            Self::FireExplosion => "INCENDIE",
            Self::Machinery => "MACHINE",
            Self::Ergonomics => "ERGO",
            Self::Chemical => "CHIMIQUE",
            Self::Gas => "GAZ",
            Self::ConfinedSpace => "CONFINE",
            Self::Thermal => "THERMIQUE",
            Self::Psychosocial => "RPS",
            Self::Biological => "BIOLOGIQUE",
            Self::Noise => "BRUIT",
            Self::Vibration => "VIBRATION",
            Self::Radiation => "RAYONNEMENT",
            Self::Vehicle => "VEHICULE",
            Self::Other => "AUTRE",
        }
    }

    pub fn name_fr(self) -> &'static str {
        match self {
            Self::Electrical => "Électricité",
            Self::Falls => "Chutes",
            Self::FireExplosion => "Incendie/Explosion",
            Self::Machinery => "Machines",
            Self::Ergonomics => "Ergonomie",
            Self::Chemical => "Chimique",
            Self::Gas => "Gaz",
            Self::ConfinedSpace => "Espaces clos",
            Self::Thermal => "Thermique",
            Self::Psychosocial => "Psychosociaux",
            Self::Biological => "Biologique",
            Self::Noise => "Bruit",
            Self::Vibration => "Vibrations",
            Self::Radiation => "Rayonnements",
            Self::Vehicle => "Véhicules",
            Self::Other => "Autre",
        }
    }

    pub fn name_en(self) -> &'static str {
        match self {
            Self::Electrical => "Electrical",
            Self::Falls => "Falls",
            Self::FireExplosion => "Fire/Explosion",
            Self::Machinery => "Machinery",
            Self::Ergonomics => "Ergonomics",
            Self::Chemical => "Chemical",
            Self::Gas => "Gas",
            Self::ConfinedSpace => "Confined Spaces",
            Self::Thermal => "Thermal",
            Self::Psychosocial => "Psychosocial",
            Self::Biological => "Biological",
            Self::Noise => "Noise",
            Self::Vibration => "Vibration",
            Self::Radiation => "Radiation",
            Self::Vehicle => "Vehicles",
            Self::Other => "Other",
        }
    }

    /// Danger level on a 1-5 scale, seeded onto the graph's Domain nodes.
    pub fn danger_level(self) -> i64 {
        match self {
            Self::Electrical
            | Self::Falls
            | Self::FireExplosion
            | Self::Gas
            | Self::ConfinedSpace
            | Self::Vehicle => 5,
            Self::Machinery | Self::Chemical | Self::Biological | Self::Radiation => 4,
            Self::Ergonomics | Self::Thermal | Self::Psychosocial | Self::Noise | Self::Vibration => 3,
            Self::Other => 2,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.code().eq_ignore_ascii_case(code))
    }
}

impl std::fmt::Display for UnifiedDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// External reporting systems a record can originate from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceSystem {
    OshaInspection,
    OshaSevereInjury,
    BlsCfoi,
    BlsSoii,
    EurostatEsaw,
    Ilostat,
    Cnesst,
    Dares,
    Carsat,
    Kaggle,
    /// Generic fallback for records no signature recognised.
    ManualEntry,
    ApiImport,
}

impl SourceSystem {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OshaInspection => "OSHA_INSPECTION",
            Self::OshaSevereInjury => "OSHA_SEVERE_INJURY",
            Self::BlsCfoi => "BLS_CFOI",
            Self::BlsSoii => "BLS_SOII",
            Self::EurostatEsaw => "EUROSTAT_ESAW",
            Self::Ilostat => "ILOSTAT",
            Self::Cnesst => "CNESST",
            Self::Dares => "DARES",
            Self::Carsat => "CARSAT",
            Self::Kaggle => "KAGGLE",
            Self::ManualEntry => "MANUAL_ENTRY",
            Self::ApiImport => "API_IMPORT",
        }
    }
}

impl std::fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordStatus {
    Active,
    Draft,
}

impl RecordStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Draft => "DRAFT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Pending,
    ReviewRequired,
    Valid,
    Invalid,
}

impl ValidationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::ReviewRequired => "REVIEW_REQUIRED",
            Self::Valid => "VALID",
            Self::Invalid => "INVALID",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubdivisionType {
    StateProvincial,
    Regional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndustryTaxonomy {
    /// NAICS / SCIAN (North American).
    Scian,
    /// NACE Rev. 2 (European).
    Nace,
    /// ISIC Rev. 4 (UN).
    Isic,
}

impl IndustryTaxonomy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scian => "SCIAN",
            Self::Nace => "NACE",
            Self::Isic => "ISIC",
        }
    }
}

// --- Value types ---

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct BilingualText {
    pub en: String,
    pub fr: String,
}

impl BilingualText {
    pub fn new(en: impl Into<String>, fr: impl Into<String>) -> Self {
        Self { en: en.into(), fr: fr.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RecordVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl RecordVersion {
    pub const INITIAL: RecordVersion = RecordVersion { major: 1, minor: 0, patch: 0 };
}

impl std::fmt::Display for RecordVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// A source-native code paired with the unified code and label it resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedCode {
    pub source_code: String,
    pub unified_code: String,
    pub label: BilingualText,
}

// --- Jurisdiction ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Subdivision {
    /// ISO 3166-2 style code, e.g. `CA-QC`.
    pub code: String,
    pub name: BilingualText,
    #[serde(rename = "type")]
    pub kind: SubdivisionType,
}

impl Subdivision {
    /// The part after the country prefix (`CA-QC` -> `QC`).
    pub fn local_code(&self) -> &str {
        self.code.rsplit('-').next().unwrap_or(&self.code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Jurisdiction {
    pub primary_country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_name: Option<BilingualText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdivision: Option<Subdivision>,
    /// Primary country first, then subdivision, then supranational groupings.
    pub applicable_jurisdictions: Vec<String>,
}

// --- Classification ---

/// Source-native hazard codes, one shape per reporting regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "scheme", rename_all = "snake_case")]
pub enum SourceHazard {
    Osha {
        event_type_code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        event_type_description: Option<String>,
        nature: ResolvedCode,
        body_part: ResolvedCode,
    },
    Esaw {
        deviation_code: String,
        deviation_description: BilingualText,
    },
    Cnesst {
        genre_accident_code: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        genre_accident_description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nature_lesion_code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        siege_lesion_code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        agent_causal_code: Option<String>,
    },
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UnifiedHazard {
    pub domain_code: UnifiedDomain,
    /// Fine-grained unified hazard code, e.g. `CHUTE-01`.
    pub hazard_code: String,
    pub domain_label: BilingualText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HazardClassification {
    pub source: SourceHazard,
    pub unified: UnifiedHazard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IndustryCode {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IndustryClassification {
    pub source_taxonomy: IndustryTaxonomy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scian: Option<IndustryCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nace: Option<IndustryCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isic: Option<IndustryCode>,
}

impl IndustryClassification {
    pub fn unknown(source_taxonomy: IndustryTaxonomy) -> Self {
        Self { source_taxonomy, scian: None, nace: None, isic: None }
    }

    /// The code in the record's own taxonomy, if the source supplied one.
    pub fn source_code(&self) -> Option<&str> {
        let code = match self.source_taxonomy {
            IndustryTaxonomy::Scian => self.scian.as_ref(),
            IndustryTaxonomy::Nace => self.nace.as_ref(),
            IndustryTaxonomy::Isic => self.isic.as_ref(),
        };
        code.map(|c| c.code.as_str()).filter(|c| !c.is_empty())
    }
}

// --- Quantitative facts ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReportingPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ReportingPeriod {
    pub fn calendar_year(year: i32) -> Option<Self> {
        Some(Self {
            start_date: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end_date: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct IncidentStatistics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_incidents: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_lost_days: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting_period: Option<ReportingPeriod>,
}

// --- Provenance & metadata ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DataProvenance {
    pub source_system: SourceSystem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_record_id: Option<String>,
    pub extraction_date: DateTime<Utc>,
    pub validation_status: ValidationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RecordMetadata {
    pub created_at: DateTime<Utc>,
    pub schema_version: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

// --- The unified record ---

/// A harmonized workplace-injury record.
///
/// `risk_id` is the identity and never changes once assigned. `risk_code` is a
/// human-readable label that may collide across records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UnifiedIncidentRecord {
    pub risk_id: Uuid,
    pub risk_code: String,
    pub version: RecordVersion,
    pub status: RecordStatus,
    pub title: BilingualText,
    pub jurisdiction: Jurisdiction,
    pub hazard_classification: HazardClassification,
    pub industry_classification: IndustryClassification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_statistics: Option<IncidentStatistics>,
    pub data_provenance: DataProvenance,
    pub metadata: RecordMetadata,
    /// The raw source record, kept for audit only.
    #[serde(rename = "_source_record", default, skip_serializing_if = "Option::is_none")]
    #[schemars(skip)]
    pub source_record: Option<serde_json::Value>,
}

impl UnifiedIncidentRecord {
    pub fn domain(&self) -> UnifiedDomain {
        self.hazard_classification.unified.domain_code
    }

    pub fn source_system(&self) -> SourceSystem {
        self.data_provenance.source_system
    }

    pub fn total_incidents(&self) -> Option<u64> {
        self.incident_statistics.and_then(|s| s.total_incidents)
    }

    /// Copy of the record without the raw source payload, as written to exports.
    pub fn without_source_record(&self) -> Self {
        Self { source_record: None, ..self.clone() }
    }
}

/// JSON Schema of the unified record, for downstream consumers.
pub fn record_json_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(UnifiedIncidentRecord)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_codes_round_trip() {
        for domain in UnifiedDomain::ALL {
            assert_eq!(UnifiedDomain::from_code(domain.code()), Some(domain));
            let json = serde_json::to_value(domain).unwrap();
            assert_eq!(json, serde_json::json!(domain.code()));
        }
        assert_eq!(UnifiedDomain::from_code("chute"), Some(UnifiedDomain::Falls));
        assert_eq!(UnifiedDomain::from_code("nope"), None);
    }

    #[test]
    fn source_system_serializes_screaming_snake() {
        let json = serde_json::to_value(SourceSystem::EurostatEsaw).unwrap();
        assert_eq!(json, serde_json::json!("EUROSTAT_ESAW"));
        assert_eq!(SourceSystem::OshaSevereInjury.as_str(), "OSHA_SEVERE_INJURY");
    }

    #[test]
    fn subdivision_local_code_strips_country() {
        let sub = Subdivision {
            code: "CA-QC".into(),
            name: BilingualText::new("Quebec", "Québec"),
            kind: SubdivisionType::StateProvincial,
        };
        assert_eq!(sub.local_code(), "QC");
    }

    #[test]
    fn calendar_year_period_spans_the_year() {
        let period = ReportingPeriod::calendar_year(2023).unwrap();
        assert_eq!(period.start_date.to_string(), "2023-01-01");
        assert_eq!(period.end_date.to_string(), "2023-12-31");
    }

    #[test]
    fn schema_lists_identity_fields() {
        let schema = serde_json::to_value(record_json_schema()).unwrap();
        let required = schema["required"].as_array().unwrap();
        assert!(required.iter().any(|v| v == "risk_id"));
        assert!(required.iter().any(|v| v == "hazard_classification"));
    }
}
