// Example usage of the COMTRADE reader

use comtrade_reader::{ComtradeReader, LoadState, Result};
use tracing::{debug, info, warn, Level};

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/recording.cfg".to_string());

    let reader = ComtradeReader::open(&path)?;
    debug!("state: {:?}", reader.state());
    assert_eq!(reader.state(), &LoadState::Parsed);

    if let Some(config) = reader.config() {
        info!("{}", config.file);
        info!("{}", config.counts);
        for segment in &config.sample_rates {
            info!("{}", segment);
        }
        info!("start {} / trigger {}", config.start_time, config.trigger_time);
        if let Some(offset) = config.trigger_offset() {
            info!("trigger at +{:.6} s", offset);
        }
        if config.channel_count_zeroed() {
            warn!("channel counts were inconsistent; no channels decoded");
        }
    }

    info!("Available signals:");
    for (id, name) in reader.list_signals() {
        let data = reader.read_signal_all(name)?;
        if data.is_empty() {
            info!("  [{}] {} (no samples)", id, name);
            continue;
        }
        let last = data.len() - 1;
        info!(
            "  [{}] {}: {} samples, first={} last={} @ {:.6}s",
            id, name, data.len(), data.values[0], data.values[last], data.timestamps[last]
        );
    }

    Ok(())
}
