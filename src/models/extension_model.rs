use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtensionConfig {
    pub name: String,
    pub id: String,
    pub version: String,
    pub description: String,
    pub mode: String,
    pub author: String,
    pub cmd: Vec<String>,
    pub enabled: bool,
    pub last_updated: String,
    pub git_path: String,
    pub category: String,
    pub post_url: String,
    pub webpage: String,
    pub file_formats: Vec<String>,
    pub ask_form: bool,
    pub connection: Connection,
    #[serde(default)]
    pub configuration: ReaderConfiguration,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Connection {
    pub ip: String,
    pub port: u16,
    pub target: String,
    pub target_port: u16,
}

/// Reader behaviour tunable from plugin.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaderConfiguration {
    /// Retry with the other data format when the declared one does not fit the .dat file.
    #[serde(default = "default_fallback")]
    pub fallback_to_alternate_format: bool,
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
}

fn default_fallback() -> bool {
    true
}

fn default_heartbeat_interval() -> u64 {
    15
}

impl Default for ReaderConfiguration {
    fn default() -> Self {
        Self {
            fallback_to_alternate_format: default_fallback(),
            heartbeat_interval_secs: default_heartbeat_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_defaults_when_absent() {
        let json = r#"{
            "name": "COMTRADE Reader", "id": "comtrade_reader", "version": "0.1.0",
            "description": "", "mode": "offline", "author": "", "cmd": [], "enabled": true,
            "last_updated": "", "git_path": "", "category": "reader", "post_url": "",
            "webpage": "", "file_formats": ["cfg", "dat"], "ask_form": false,
            "connection": {"ip": "127.0.0.1", "port": 0, "target": "127.0.0.1", "target_port": 8000}
        }"#;
        let config: ExtensionConfig = serde_json::from_str(json).unwrap();
        assert!(config.configuration.fallback_to_alternate_format);
        assert_eq!(config.configuration.heartbeat_interval_secs, 15);
    }

    #[test]
    fn test_configuration_partial_override() {
        let config: ReaderConfiguration =
            serde_json::from_str(r#"{"fallback_to_alternate_format": false}"#).unwrap();
        assert!(!config.fallback_to_alternate_format);
        assert_eq!(config.heartbeat_interval_secs, 15);
    }
}
