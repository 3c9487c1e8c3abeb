//! HTTP front for the idea engine. One engine instance is shared across
//! handlers; every engine call runs on the blocking pool.

pub mod routes;
pub mod state;

use std::net::SocketAddr;

use ideadb_core::config::Config;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    init_tracing(&config);

    let bind: String = config.get_or("server.bind", "127.0.0.1:8080".to_string());
    let addr: SocketAddr = bind.parse()?;

    let state = AppState::new(&config)?;
    let app = routes::router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "ideadb API listening");
    axum::serve(listener, app).await?;
    Ok(())
}

fn init_tracing(config: &Config) {
    let level: String = config.get_or("server.log_level", "info".to_string());
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
