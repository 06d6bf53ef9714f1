use anyhow::Context;
use reqwest::Client;
use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use crate::utils::conf_helper;

#[derive(Serialize)]
pub struct HealthPayload<'a> {
    pub id: &'a str,
    pub timestamp: f64,
}

fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

pub async fn start_heartbeat() {
    let config = conf_helper::get_cached_config();
    let heartbeat_url = format!("http://{}/heartbeat", conf_helper::get_core_url());
    let interval = Duration::from_secs(config.configuration.heartbeat_interval_secs);
    let client = Client::new();

    info!(
        "Heartbeat worker started for ID: {} every {:?}",
        config.id, interval
    );

    loop {
        let payload = HealthPayload {
            id: &config.id,
            timestamp: now_secs(),
        };

        match client.post(&heartbeat_url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => info!("Heartbeat sent"),
            Ok(resp) => error!("Heartbeat server error: {}", resp.status()),
            Err(e) => error!("Heartbeat network error: {}", e),
        }

        sleep(interval).await;
    }
}

pub async fn register() -> anyhow::Result<()> {
    let config = conf_helper::get_cached_config();
    let register_url = format!("http://{}/register", conf_helper::get_core_url());

    info!("Registering to Plotune Core: {}", register_url);

    Client::new()
        .post(&register_url)
        .json(config)
        .send()
        .await
        .context("registration request failed")?
        .error_for_status()
        .context("core rejected registration")?;

    info!("Registered {} ({}) with Plotune Core", config.name, config.id);
    Ok(())
}
