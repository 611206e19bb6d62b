pub mod concordance;
pub mod detect;
pub mod error;
pub mod harmonizer;
pub mod identifiers;
pub mod stats;
mod tables;
pub mod transform;
pub mod validate;

pub use concordance::{
    CodeEntry, ConcordanceTable, Concordances, FallbackRule, HazardEntry, IndustryEntry, MatchKind,
    Resolution,
};
pub use detect::{SourceDetector, SourceKind, SourceSignature};
pub use error::HarmonizeError;
pub use harmonizer::{HarmonizedBatch, Harmonizer, RecordFailure};
pub use stats::TransformationStats;
pub use validate::ValidationReport;
