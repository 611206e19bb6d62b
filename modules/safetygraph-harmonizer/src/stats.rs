use std::collections::BTreeMap;
use std::fmt;

use safetygraph_common::UnifiedDomain;

use crate::detect::SourceKind;

/// Counters accumulated by one harmonizer until explicitly reset.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransformationStats {
    pub records_processed: u64,
    pub records_harmonized: u64,
    pub records_failed: u64,
    pub by_source: BTreeMap<SourceKind, u64>,
    pub by_domain: BTreeMap<UnifiedDomain, u64>,
}

impl TransformationStats {
    pub(crate) fn record_attempt(&mut self, source: SourceKind) {
        self.records_processed += 1;
        *self.by_source.entry(source).or_default() += 1;
    }

    pub(crate) fn record_success(&mut self, domain: UnifiedDomain) {
        self.records_harmonized += 1;
        *self.by_domain.entry(domain).or_default() += 1;
    }

    pub(crate) fn record_failure(&mut self) {
        self.records_failed += 1;
    }

    pub fn source_count(&self, source: SourceKind) -> u64 {
        self.by_source.get(&source).copied().unwrap_or_default()
    }

    pub fn domain_count(&self, domain: UnifiedDomain) -> u64 {
        self.by_domain.get(&domain).copied().unwrap_or_default()
    }
}

impl fmt::Display for TransformationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\n=== Harmonization Stats ===")?;
        writeln!(f, "Processed:  {}", self.records_processed)?;
        writeln!(f, "Harmonized: {}", self.records_harmonized)?;
        writeln!(f, "Failed:     {}", self.records_failed)?;
        if !self.by_source.is_empty() {
            writeln!(f, "\nBy source:")?;
            for (source, count) in &self.by_source {
                writeln!(f, "  {:<8} {}", source.name(), count)?;
            }
        }
        if !self.by_domain.is_empty() {
            let mut domains: Vec<_> = self.by_domain.iter().collect();
            domains.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            writeln!(f, "\nBy domain:")?;
            for (domain, count) in domains {
                writeln!(f, "  {:<12} {}", domain.code(), count)?;
            }
        }
        Ok(())
    }
}
