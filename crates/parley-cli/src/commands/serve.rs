//! Run the HTTP/WebSocket API server.

use parley_config::schema::ParleyConfig;

use crate::commands::build_gateway;

pub async fn cmd_serve(config: ParleyConfig) -> parley_core::Result<()> {
    println!("Parley v{}", env!("CARGO_PKG_VERSION"));
    println!("   Model:      {}", config.agent.model);
    println!("   Classifier: {}", config.classifier.model);
    println!("   Listening:  http://{}", config.server.listen);
    println!();

    let gateway = build_gateway(&config);
    parley_server::start_server(config, gateway).await
}
