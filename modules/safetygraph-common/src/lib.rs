pub mod config;
pub mod error;
pub mod raw;
pub mod types;

pub use config::{Config, Neo4jConfig};
pub use error::SafetyGraphError;
pub use raw::{RawFieldError, RawRecord};
pub use types::*;
