//! Concordance tables and the resolver.
//!
//! Lookup order for a code: exact key, then the table's prefix fallback, then
//! the table's catch-all. Resolution never fails; an unmapped code is normal input.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use safetygraph_common::{BilingualText, UnifiedDomain};

use crate::tables;

/// How a table retries a code that has no exact entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackRule {
    None,
    /// Codes longer than `width` characters are truncated to `width` and
    /// `suffix` is appended before the second lookup.
    Prefix { width: usize, suffix: &'static str },
}

impl FallbackRule {
    pub const fn truncate(width: usize) -> Self {
        Self::Prefix { width, suffix: "" }
    }

    fn fallback_key(self, code: &str) -> Option<String> {
        match self {
            Self::None => None,
            Self::Prefix { width, suffix } => {
                if code.chars().count() <= width {
                    return None;
                }
                let mut key: String = code.chars().take(width).collect();
                key.push_str(suffix);
                Some(key)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Fallback,
    CatchAll,
}

#[derive(Debug, Clone, Copy)]
pub struct Resolution<'a, E> {
    pub entry: &'a E,
    pub matched: MatchKind,
}

impl<E> Resolution<'_, E> {
    pub fn is_catch_all(&self) -> bool {
        self.matched == MatchKind::CatchAll
    }
}

/// One immutable lookup table for a (source system, code family) pair.
#[derive(Debug, Clone)]
pub struct ConcordanceTable<E> {
    name: &'static str,
    entries: HashMap<String, E>,
    fallback: FallbackRule,
    catch_all: E,
}

impl<E> ConcordanceTable<E> {
    pub fn new<K: Into<String>>(
        name: &'static str,
        entries: impl IntoIterator<Item = (K, E)>,
        fallback: FallbackRule,
        catch_all: E,
    ) -> Self {
        Self {
            name,
            entries: entries.into_iter().map(|(k, e)| (k.into(), e)).collect(),
            fallback,
            catch_all,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn catch_all(&self) -> &E {
        &self.catch_all
    }

    pub fn resolve(&self, code: &str) -> Resolution<'_, E> {
        let code = code.trim();
        if let Some(entry) = self.entries.get(code) {
            return Resolution { entry, matched: MatchKind::Exact };
        }
        if let Some(entry) = self
            .fallback
            .fallback_key(code)
            .and_then(|key| self.entries.get(&key))
        {
            return Resolution { entry, matched: MatchKind::Fallback };
        }
        Resolution { entry: &self.catch_all, matched: MatchKind::CatchAll }
    }
}

// --- Entry shapes ---

/// Hazard (event / deviation / genre) mapping to a unified domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HazardEntry {
    pub unified_code: String,
    pub domain: UnifiedDomain,
    pub label: BilingualText,
}

impl HazardEntry {
    pub fn new(unified_code: &str, domain: UnifiedDomain, label_fr: &str, label_en: &str) -> Self {
        Self {
            unified_code: unified_code.to_string(),
            domain,
            label: BilingualText::new(label_en, label_fr),
        }
    }

    pub fn unclassified() -> Self {
        Self::new("AUTRE-99", UnifiedDomain::Other, "Non classé", "Unclassified")
    }
}

/// Secondary code family (nature of injury, body part) without a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeEntry {
    pub unified_code: String,
    pub label: BilingualText,
}

impl CodeEntry {
    pub fn new(unified_code: &str, label_fr: &str, label_en: &str) -> Self {
        Self {
            unified_code: unified_code.to_string(),
            label: BilingualText::new(label_en, label_fr),
        }
    }
}

/// Industry cross-walk into the other taxonomies. The catch-all maps to nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndustryEntry {
    pub scian: Option<String>,
    pub nace: Option<String>,
    pub isic: Option<String>,
    pub label: Option<String>,
}

// --- The full set ---

/// Every concordance table the harmonizer consults. Built once, shared read-only.
#[derive(Debug, Clone)]
pub struct Concordances {
    pub osha_event: ConcordanceTable<HazardEntry>,
    pub osha_nature: ConcordanceTable<CodeEntry>,
    pub osha_body_part: ConcordanceTable<CodeEntry>,
    pub esaw_deviation: ConcordanceTable<HazardEntry>,
    pub cnesst_genre: ConcordanceTable<HazardEntry>,
    pub scian_industry: ConcordanceTable<IndustryEntry>,
    pub nace_industry: ConcordanceTable<IndustryEntry>,
}

impl Concordances {
    pub fn builtin() -> Self {
        Self {
            osha_event: hazard_table("osha_event", tables::OSHA_EVENT),
            osha_nature: ConcordanceTable::new(
                "osha_nature",
                code_rows(tables::OSHA_NATURE),
                FallbackRule::Prefix { width: 2, suffix: "1" },
                CodeEntry::new("NAT-99", "Non spécifié", "Unspecified"),
            ),
            osha_body_part: ConcordanceTable::new(
                "osha_body_part",
                code_rows(tables::OSHA_BODY_PART),
                FallbackRule::truncate(1),
                CodeEntry::new("BP-99", "Non spécifié", "Unspecified"),
            ),
            esaw_deviation: hazard_table("esaw_deviation", tables::ESAW_DEVIATION),
            cnesst_genre: hazard_table("cnesst_genre", tables::CNESST_GENRE),
            scian_industry: ConcordanceTable::new(
                "scian_industry",
                tables::SCIAN_CROSSWALK.iter().map(|&(code, nace, isic, label)| {
                    (
                        code,
                        IndustryEntry {
                            scian: Some(code.to_string()),
                            nace: Some(nace.to_string()),
                            isic: Some(isic.to_string()),
                            label: Some(label.to_string()),
                        },
                    )
                }),
                FallbackRule::truncate(2),
                IndustryEntry::default(),
            ),
            nace_industry: ConcordanceTable::new(
                "nace_industry",
                tables::NACE_CROSSWALK.iter().map(|&(code, scian, isic, label)| {
                    (
                        code,
                        IndustryEntry {
                            scian: Some(scian.to_string()),
                            nace: Some(code.to_string()),
                            isic: Some(isic.to_string()),
                            label: Some(label.to_string()),
                        },
                    )
                }),
                FallbackRule::truncate(3),
                IndustryEntry::default(),
            ),
        }
    }

    /// Process-wide instance, built on first use.
    pub fn shared() -> Arc<Self> {
        static SHARED: OnceLock<Arc<Concordances>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(Self::builtin())).clone()
    }
}

fn hazard_table(
    name: &'static str,
    rows: &[(&'static str, &'static str, UnifiedDomain, &'static str, &'static str)],
) -> ConcordanceTable<HazardEntry> {
    ConcordanceTable::new(
        name,
        rows.iter()
            .map(|&(code, unified, domain, fr, en)| (code, HazardEntry::new(unified, domain, fr, en))),
        FallbackRule::truncate(2),
        HazardEntry::unclassified(),
    )
}

fn code_rows(
    rows: &'static [(&'static str, &'static str, &'static str, &'static str)],
) -> impl Iterator<Item = (&'static str, CodeEntry)> {
    rows.iter()
        .map(|&(code, unified, fr, en)| (code, CodeEntry::new(unified, fr, en)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_wins_over_fallback() {
        let c = Concordances::builtin();
        let r = c.osha_event.resolve("422");
        assert_eq!(r.matched, MatchKind::Exact);
        assert_eq!(r.entry.unified_code, "CHUTE-03");
    }

    #[test]
    fn long_codes_fall_back_to_two_character_prefix() {
        let c = Concordances::builtin();
        let r = c.osha_event.resolve("4299");
        assert_eq!(r.matched, MatchKind::Fallback);
        assert_eq!(r.entry.domain, UnifiedDomain::Falls);
        assert_eq!(r.entry.unified_code, "CHUTE-01");
    }

    #[test]
    fn unknown_codes_resolve_to_catch_all() {
        let c = Concordances::builtin();
        for code in ["999999", "", "  ", "zz", "9"] {
            let r = c.osha_event.resolve(code);
            assert!(r.is_catch_all(), "{code:?} should hit the catch-all");
            assert_eq!(r.entry.domain, UnifiedDomain::Other);
            assert!(r.entry.unified_code.ends_with("-99"));
            assert_eq!(r.entry.label.en, "Unclassified");
            assert_eq!(r.entry.label.fr, "Non classé");
        }
    }

    #[test]
    fn two_character_codes_do_not_fall_back() {
        let c = Concordances::builtin();
        // "99" is not in the table and is not longer than the fallback width.
        assert!(c.esaw_deviation.resolve("99").is_catch_all());
    }

    #[test]
    fn nature_fallback_appends_suffix() {
        let c = Concordances::builtin();
        // 129 -> "12" + "1" -> 121 (fracture)
        let r = c.osha_nature.resolve("129");
        assert_eq!(r.matched, MatchKind::Fallback);
        assert_eq!(r.entry.unified_code, "NAT-01");
        assert_eq!(c.osha_nature.resolve("77").entry.unified_code, "NAT-99");
    }

    #[test]
    fn body_part_falls_back_to_first_character() {
        let c = Concordances::builtin();
        assert_eq!(c.osha_body_part.resolve("19").entry.unified_code, "BP-01");
        assert_eq!(c.osha_body_part.resolve("7").entry.unified_code, "BP-99");
    }

    #[test]
    fn families_have_independent_catch_alls() {
        let c = Concordances::builtin();
        assert_eq!(c.scian_industry.resolve("999999").entry, &IndustryEntry::default());
        assert_eq!(c.osha_nature.resolve("x").entry.unified_code, "NAT-99");
        assert_eq!(c.cnesst_genre.resolve("x").entry.unified_code, "AUTRE-99");
    }

    #[test]
    fn industry_crosswalk_prefix_fallback() {
        let c = Concordances::builtin();
        let exact = c.scian_industry.resolve("23821");
        assert_eq!(exact.entry.nace.as_deref(), Some("F4321"));
        let sector = c.scian_industry.resolve("237310");
        assert_eq!(sector.matched, MatchKind::Fallback);
        assert_eq!(sector.entry.nace.as_deref(), Some("F"));
        assert_eq!(c.nace_industry.resolve("F4399").entry.scian.as_deref(), Some("238"));
    }

    #[test]
    fn injected_tables_are_independent() {
        let table = ConcordanceTable::new(
            "custom",
            [("1", HazardEntry::new("GAZ-01", UnifiedDomain::Gas, "Fuite", "Leak"))],
            FallbackRule::None,
            HazardEntry::unclassified(),
        );
        assert_eq!(table.resolve("1").entry.domain, UnifiedDomain::Gas);
        assert!(table.resolve("12").is_catch_all());
        assert_eq!(Concordances::builtin().osha_event.resolve("1").entry.domain, UnifiedDomain::Other);
    }
}
