//! `murmurd`: the murmur server binary.
//!
//! Usage:
//!   murmurd -c <context-name-or-path> [-- --data-dir=PATH --sqlite=PATH ...]
//!
//! The context name resolves to `/etc/murmur/<name>.toml`.
//! If a path with `/` or `.` is given, it's used directly.

mod bootstrap;
mod config;
mod identity_middleware;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use murmur_core::{Module, ServiceConfig};
use murmur_social::SocialModule;
use murmur_social::service::SocialConfig;
use tracing::info;

use config::ServerConfig;
use identity_middleware::IdentityState;

/// murmur server.
#[derive(Parser, Debug)]
#[command(name = "murmurd", about = "murmur social server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Storage and listen overrides: --data-dir=, --db=, --sqlite=, --listen=.
    #[arg(last = true)]
    overrides: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    // Load server configuration.
    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;

    // Verify configuration is valid.
    bootstrap::verify_config(&server_config)?;

    let mut service_config = ServiceConfig::from_args(&cli.overrides);
    if service_config.data_dir.is_none() {
        service_config.data_dir = Some(PathBuf::from(&server_config.storage.data_dir));
    }

    // Initialize embedded stores.
    let stores = bootstrap::open_stores(&service_config, &server_config)?;

    let social_module = SocialModule::new(
        Arc::clone(&stores.sql),
        Arc::clone(&stores.kv),
        SocialConfig {
            suggestion_limit: server_config.feed.suggestion_limit,
            max_content_chars: server_config.feed.max_content_chars,
        },
    )?;
    info!("Social module initialized");

    let module_routes = vec![(social_module.name(), social_module.routes())];
    let identity = Arc::new(IdentityState::from_config(&server_config.identity));
    let app = routes::build_router(identity, module_routes);

    // Start server.
    let listener = tokio::net::TcpListener::bind(&service_config.listen).await?;
    info!("murmur server listening on {}", service_config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
