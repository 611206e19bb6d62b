use neo4rs::{ConfigBuilder, Graph};

use safetygraph_common::Neo4jConfig;

/// Pooled Bolt connection to the Neo4j database that holds the risk graph.
#[derive(Clone)]
pub struct GraphClient {
    pub(crate) graph: Graph,
}

impl GraphClient {
    /// Open a pool of up to ten sessions. Fails if the server rejects the
    /// credentials or cannot be reached.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self, neo4rs::Error> {
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password)
            .fetch_size(500)
            .max_connections(10)
            .build()?;
        let graph = Graph::connect(config).await?;
        Ok(Self { graph })
    }

    /// Connect using the `NEO4J_*` settings.
    pub async fn from_config(config: &Neo4jConfig) -> Result<Self, neo4rs::Error> {
        Self::connect(&config.uri, &config.user, &config.password).await
    }

    /// Raw handle for ad-hoc Cypher, mostly in tests.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}
