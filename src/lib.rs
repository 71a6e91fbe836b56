pub mod cli;
pub mod client;
pub mod config;
pub mod models;
pub mod server;
pub mod upstream;

use std::error::Error;
use std::sync::Arc;

use cli::Args;
use log::{ info, warn };
use server::Server;
use upstream::gemini::GeminiClient;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Upstream Base URL: {}", args.upstream_base_url);
    info!("Upstream Model: {}", args.upstream_model);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let api_key = config::resolve_api_key(&args);
    if api_key.is_none() {
        warn!(
            "No API key configured; the relay will answer 500 until API_KEY or {} is set.",
            config::FALLBACK_CREDENTIAL_VAR
        );
    }

    let upstream = Arc::new(
        GeminiClient::new(args.upstream_base_url.clone(), args.upstream_model.clone())
    );

    let server = Server::new(args, api_key, upstream);
    server.run().await
}
