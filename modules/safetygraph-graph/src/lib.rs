pub mod client;
pub mod loader;
pub mod memory;
pub mod neo4j;
pub mod reference;
pub mod schema;
pub mod store;

#[cfg(feature = "test-utils")]
pub mod testutil;

pub use client::GraphClient;
pub use loader::{GraphLoadStats, GraphLoader};
pub use memory::MemoryGraph;
pub use neo4j::Neo4jGraph;
pub use reference::SeedReport;
pub use store::{GraphStats, GraphStore, MergeOutcome, RelKind, RiskNode, RiskSummary, SectorNode};
