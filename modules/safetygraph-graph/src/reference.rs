//! Reference nodes seeded once per graph: hazard domains and jurisdictions.

use safetygraph_common::UnifiedDomain;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainNode {
    pub code: String,
    pub name_fr: String,
    pub name_en: String,
    pub danger_level: i64,
}

impl From<UnifiedDomain> for DomainNode {
    fn from(d: UnifiedDomain) -> Self {
        Self {
            code: d.code().to_string(),
            name_fr: d.name_fr().to_string(),
            name_en: d.name_en().to_string(),
            danger_level: d.danger_level(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JurisdictionNode {
    pub code: String,
    pub name_en: String,
    pub name_fr: String,
    /// COUNTRY, PROVINCE, REGION or INTERNATIONAL.
    pub level: String,
}

// (code, name en, name fr, level)
const JURISDICTIONS: &[(&str, &str, &str, &str)] = &[
    ("US", "United States", "États-Unis", "COUNTRY"),
    ("CA", "Canada", "Canada", "COUNTRY"),
    ("QC", "Quebec", "Québec", "PROVINCE"),
    ("ON", "Ontario", "Ontario", "PROVINCE"),
    ("EU", "European Union", "Union européenne", "REGION"),
    ("FR", "France", "France", "COUNTRY"),
    ("DE", "Germany", "Allemagne", "COUNTRY"),
    ("GB", "United Kingdom", "Royaume-Uni", "COUNTRY"),
    ("INT", "International", "International", "INTERNATIONAL"),
];

pub fn domains() -> Vec<DomainNode> {
    UnifiedDomain::ALL.into_iter().map(DomainNode::from).collect()
}

pub fn jurisdictions() -> Vec<JurisdictionNode> {
    JURISDICTIONS
        .iter()
        .map(|&(code, en, fr, level)| JurisdictionNode {
            code: code.to_string(),
            name_en: en.to_string(),
            name_fr: fr.to_string(),
            level: level.to_string(),
        })
        .collect()
}

/// Counts of reference nodes present after seeding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub domains: u64,
    pub jurisdictions: u64,
}

impl SeedReport {
    pub fn is_complete(&self) -> bool {
        self.domains >= UnifiedDomain::ALL.len() as u64 && self.jurisdictions >= JURISDICTIONS.len() as u64
    }
}
