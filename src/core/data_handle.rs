use axum::extract::ws::{Message, WebSocket};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::reader::ComtradeReader;

#[derive(Serialize)]
struct SignalPayload<'a> {
    timestamp: f64,
    value: f64,
    desc: &'a str,
    seq: u64,
    end_flag: bool,
}

/// Streams one channel of a decoded recording, point by point, then an end marker.
/// The reader is fully decoded before it is shared, so no lock is taken.
pub async fn handle_ws_fetch(
    mut socket: WebSocket,
    reader: Arc<ComtradeReader>,
    signal_name: String,
) {
    info!("ws_fetch streaming started: {}", signal_name);

    let series = match reader.read_signal_all(&signal_name) {
        Ok(series) => series,
        Err(e) => {
            error!("read_signal_all failed: {}", e);
            return;
        }
    };

    let desc = reader
        .config()
        .map(|c| c.file.station_name.as_str())
        .unwrap_or_default();

    let mut seq: u64 = 0;
    for (timestamp, value) in series.timestamps.iter().zip(series.values.iter()) {
        let payload = SignalPayload {
            timestamp: *timestamp,
            value: *value,
            desc,
            seq,
            end_flag: false,
        };

        let json = match serde_json::to_string(&payload) {
            Ok(j) => j,
            Err(e) => {
                error!("json serialize error: {}", e);
                return;
            }
        };

        if let Err(e) = socket.send(Message::Text(json.into())).await {
            warn!("ws send failed: {}", e);
            return;
        }

        seq += 1;
    }

    let end_payload = SignalPayload {
        timestamp: 0.0,
        value: 0.0,
        desc,
        seq,
        end_flag: true,
    };

    if let Ok(json) = serde_json::to_string(&end_payload) {
        let _ = socket.send(Message::Text(json.into())).await;
    }

    info!("ws_fetch finished: {} ({} points)", signal_name, seq);
}
