//! Source-system detection from raw record keys.

use std::fmt;

use safetygraph_common::RawRecord;

/// Transform family a raw record is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceKind {
    Osha,
    Esaw,
    Cnesst,
    Generic,
}

impl SourceKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Osha => "OSHA",
            Self::Esaw => "ESAW",
            Self::Cnesst => "CNESST",
            Self::Generic => "GENERIC",
        }
    }

    /// Parse a caller-supplied source identifier. Unknown hints return `None`.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "osha" | "osha_inspection" | "osha_severe_injury" => Some(Self::Osha),
            "esaw" | "eurostat" | "eurostat_esaw" => Some(Self::Esaw),
            "cnesst" => Some(Self::Cnesst),
            "generic" | "manual" | "manual_entry" => Some(Self::Generic),
            _ => None,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record matches when any of `keys` is present.
#[derive(Debug, Clone)]
pub struct SourceSignature {
    pub kind: SourceKind,
    pub keys: &'static [&'static str],
}

impl SourceSignature {
    pub fn matches(&self, record: &RawRecord) -> bool {
        record.contains_any(self.keys)
    }
}

pub const DEFAULT_SIGNATURES: &[SourceSignature] = &[
    SourceSignature { kind: SourceKind::Osha, keys: &["event_type", "EventType", "ActivityNr"] },
    SourceSignature { kind: SourceKind::Esaw, keys: &["deviation", "DEVIATION", "nace_r2"] },
    SourceSignature { kind: SourceKind::Cnesst, keys: &["genre_accident", "GenreAccident", "scian"] },
];

/// Ordered signature list; first match wins, generic otherwise.
#[derive(Debug, Clone)]
pub struct SourceDetector {
    signatures: Vec<SourceSignature>,
}

impl Default for SourceDetector {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNATURES.to_vec())
    }
}

impl SourceDetector {
    pub fn new(signatures: Vec<SourceSignature>) -> Self {
        Self { signatures }
    }

    pub fn detect(&self, record: &RawRecord) -> SourceKind {
        self.signatures
            .iter()
            .find(|sig| sig.matches(record))
            .map(|sig| sig.kind)
            .unwrap_or(SourceKind::Generic)
    }

    /// Honor a recognised hint; otherwise detect from the record.
    pub fn resolve(&self, record: &RawRecord, hint: Option<&str>) -> SourceKind {
        match hint {
            Some(h) => match SourceKind::from_hint(h) {
                Some(kind) => kind,
                None => {
                    tracing::warn!(hint = h, "Unknown source hint, detecting from record");
                    self.detect(record)
                }
            },
            None => self.detect(record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(v: serde_json::Value) -> RawRecord {
        RawRecord::from_value(v).unwrap()
    }

    #[test]
    fn detects_each_known_source() {
        let d = SourceDetector::default();
        assert_eq!(d.detect(&raw(json!({"EventType": "42"}))), SourceKind::Osha);
        assert_eq!(d.detect(&raw(json!({"ActivityNr": 1}))), SourceKind::Osha);
        assert_eq!(d.detect(&raw(json!({"DEVIATION": "51"}))), SourceKind::Esaw);
        assert_eq!(d.detect(&raw(json!({"nace_r2": "F"}))), SourceKind::Esaw);
        assert_eq!(d.detect(&raw(json!({"GenreAccident": "31"}))), SourceKind::Cnesst);
        assert_eq!(d.detect(&raw(json!({"foo": 1}))), SourceKind::Generic);
    }

    #[test]
    fn earlier_signatures_take_priority() {
        let d = SourceDetector::default();
        let both = raw(json!({"scian": "23", "event_type": "42"}));
        assert_eq!(d.detect(&both), SourceKind::Osha);
    }

    #[test]
    fn hint_overrides_detection() {
        let d = SourceDetector::default();
        let r = raw(json!({"event_type": "42"}));
        assert_eq!(d.resolve(&r, Some("CNESST")), SourceKind::Cnesst);
        assert_eq!(d.resolve(&r, Some("bogus")), SourceKind::Osha);
        assert_eq!(d.resolve(&r, None), SourceKind::Osha);
    }

    #[test]
    fn custom_signature_order() {
        let d = SourceDetector::new(vec![SourceSignature {
            kind: SourceKind::Cnesst,
            keys: &["scian"],
        }]);
        assert_eq!(d.detect(&raw(json!({"scian": "23", "event_type": "42"}))), SourceKind::Cnesst);
        assert_eq!(d.detect(&raw(json!({"event_type": "42"}))), SourceKind::Generic);
    }
}
