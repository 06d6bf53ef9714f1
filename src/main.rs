use axum::Router;
use tracing::{error, info, Level};

mod client;
mod models;
mod routes;
mod state;
mod utils;

use crate::state::app_state::AppState;
use crate::utils::conf_helper::{get_cached_config, init_config_and_bind};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let state = AppState::new();

    let listener = init_config_and_bind().await?;
    let config = get_cached_config();

    info!(
        "{} v{} listening on {}:{}",
        config.name, config.version, config.connection.ip, config.connection.port
    );

    if let Err(e) = client::register::register().await {
        error!("Registration failed, continuing standalone: {:#}", e);
    }

    tokio::spawn(client::register::start_heartbeat());

    let app = Router::new()
        .merge(routes::info_routes::health_routes(state.clone()))
        .merge(routes::data_routes::data_routes(state));

    axum::serve(listener, app).await?;
    Ok(())
}
