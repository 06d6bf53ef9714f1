use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use comtrade_reader::ComtradeReader;

#[derive(Clone)]
pub struct SignalInfo {
    pub reader_id: String,
    pub reader: Arc<ComtradeReader>,
    pub original_name: String, // channel label inside the recording
}

#[derive(Clone)]
pub struct AppState {
    // unique_name -> SignalInfo
    pub signals: Arc<RwLock<HashMap<String, SignalInfo>>>,
    // reader id -> decoded recording
    pub readers: Arc<RwLock<HashMap<String, Arc<ComtradeReader>>>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            signals: Arc::new(RwLock::new(HashMap::new())),
            readers: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// `base`, or `base_1`, `base_2`, ... whichever is not taken yet.
pub fn unique_name<V>(taken: &HashMap<String, V>, base: &str) -> String {
    if !taken.contains_key(base) {
        return base.to_string();
    }
    (1..)
        .map(|i| format!("{}_{}", base, i))
        .find(|candidate| !taken.contains_key(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_name_suffixes() {
        let mut taken: HashMap<String, ()> = HashMap::new();
        assert_eq!(unique_name(&taken, "IA(A)"), "IA(A)");
        taken.insert("IA(A)".into(), ());
        taken.insert("IA(A)_1".into(), ());
        assert_eq!(unique_name(&taken, "IA(A)"), "IA(A)_2");
    }
}
