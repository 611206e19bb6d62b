//! Disposable Neo4j for the live graph-store tests.

use testcontainers::{
    core::{ContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

use crate::GraphClient;

/// Start an empty Neo4j 5 community container and connect to its Bolt port.
///
/// Keep the returned container bound for the whole test; dropping it stops
/// the database.
pub async fn neo4j_container() -> (ContainerAsync<GenericImage>, GraphClient) {
    let image = GenericImage::new("neo4j", "5.25.1-community")
        .with_exposed_port(ContainerPort::Tcp(7687))
        .with_wait_for(WaitFor::message_on_stdout("Started."))
        .with_env_var("NEO4J_AUTH", "neo4j/safetygraph-test");

    let container: ContainerAsync<GenericImage> = image
        .start()
        .await
        .expect("neo4j container should start");

    let host_port = container
        .get_host_port_ipv4(7687)
        .await
        .expect("bolt port should be mapped");

    let uri = format!("bolt://127.0.0.1:{host_port}");
    let client = GraphClient::connect(&uri, "neo4j", "safetygraph-test")
        .await
        .expect("test credentials should be accepted");

    (container, client)
}
