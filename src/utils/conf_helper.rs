use anyhow::{anyhow, Context};
use std::sync::OnceLock;
use tokio::fs;
use tokio::net::TcpListener;
use tracing::info;

use crate::models::extension_model::ExtensionConfig;

const CONFIG_PATH_ENV: &str = "PLOTUNE_PLUGIN_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "plugin.json";

static CONFIG_CACHE: OnceLock<ExtensionConfig> = OnceLock::new();
static CORE_URL: OnceLock<String> = OnceLock::new();

pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

pub fn parse_config(data: &str) -> anyhow::Result<ExtensionConfig> {
    serde_json::from_str(data).context("plugin config is not valid JSON")
}

/// Loads plugin.json, binds the listener and records the port actually bound
/// (the configured port may be 0).
pub async fn init_config_and_bind() -> anyhow::Result<TcpListener> {
    let file_path = config_path();

    let data = fs::read_to_string(&file_path)
        .await
        .with_context(|| format!("reading {}", file_path))?;

    let mut config = parse_config(&data)?;

    let bind_addr = format!("{}:{}", config.connection.ip, config.connection.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {}", bind_addr))?;

    config.connection.port = listener.local_addr()?.port();

    let url = format!(
        "{}:{}",
        config.connection.target, config.connection.target_port
    );
    CORE_URL
        .set(url)
        .map_err(|_| anyhow!("core url already initialized"))?;

    info!(
        "Config initialized from {} with dynamic port: {}",
        file_path, config.connection.port
    );

    CONFIG_CACHE
        .set(config)
        .map_err(|_| anyhow!("config already initialized"))?;

    Ok(listener)
}

pub fn get_cached_config() -> &'static ExtensionConfig {
    CONFIG_CACHE.get().expect("Config not initialized")
}

pub fn get_core_url() -> &'static String {
    CORE_URL.get().expect("Core URL not initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_json_reports_context() {
        let err = parse_config("{ not json").unwrap_err();
        assert!(err.to_string().contains("plugin config"));
    }
}
