use axum::{
    extract::{ws::WebSocketUpgrade, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use comtrade_reader::{handle_ws_fetch, ComtradeError, ComtradeReader};

use crate::state::app_state::{unique_name, AppState, SignalInfo};
use crate::utils::conf_helper::get_cached_config;

#[derive(Serialize)]
pub struct ReaderSummary {
    pub id: String,
    pub station: String,
    pub signals_count: usize,
    pub headers: Vec<String>,
}

/// Response for GET /readers/{id}/headers
#[derive(Serialize)]
pub struct ReaderHeaders {
    pub id: String,
    pub headers: Vec<String>,
}

#[derive(Deserialize, Debug)]
pub struct FileReadRequest {
    pub mode: String, // "online" | "offline"
    pub path: String,
}

#[derive(Serialize, Debug)]
pub struct FileReadResponse {
    pub id: String,
    pub name: String,
    pub path: String,
    pub source: String,
    pub headers: Option<Vec<String>>,
    pub desc: Option<String>,
    pub tags: Option<Vec<String>>,
    pub created_at: Option<String>,
    pub source_url: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// =======================
/// ROUTER
/// =======================

pub fn data_routes(state: AppState) -> Router {
    Router::new()
        .route("/read-file", post(read_file))
        .route("/fetch/{signal}", get(ws_fetch))
        .route("/readers", get(list_readers))
        .route("/readers/{id}/headers", get(reader_headers))
        .route("/readers/{id}/config", get(reader_config))
        .with_state(state)
}

/// Decodes a recording; when the declared data format does not fit the
/// data file and fallback is enabled, retries once with the other format.
pub fn load_recording(path: &str, fallback: bool) -> comtrade_reader::Result<ComtradeReader> {
    let mut reader = ComtradeReader::new(path)?;
    let err = match reader.load() {
        Ok(()) => return Ok(reader),
        Err(e) => e,
    };

    let declared = match reader.config() {
        Some(config) if fallback && err.is_layout_mismatch() => config.data_format,
        _ => return Err(err),
    };

    warn!(
        "{} did not decode as {} ({}), retrying as {}",
        path,
        declared,
        err,
        declared.alternate()
    );
    let mut retry = ComtradeReader::new(path)?;
    retry.load_with_format(declared.alternate())?;
    Ok(retry)
}

fn error_status(err: &ComtradeError) -> StatusCode {
    match err {
        ComtradeError::NotComtrade(_) => StatusCode::BAD_REQUEST,
        ComtradeError::MissingSource(_) => StatusCode::NOT_FOUND,
        ComtradeError::Structural { .. }
        | ComtradeError::SizeMismatch { .. }
        | ComtradeError::MalformedRow { .. }
        | ComtradeError::FormatMismatch { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// =======================
/// HANDLERS
/// =======================

async fn read_file(
    State(state): State<AppState>,
    Json(request): Json<FileReadRequest>,
) -> Response {
    debug!("Reading file: mode={}, path={}", request.mode, request.path);

    let fallback = get_cached_config().configuration.fallback_to_alternate_format;
    let path = request.path.clone();
    let loaded = tokio::task::spawn_blocking(move || load_recording(&path, fallback)).await;

    let reader = match loaded {
        Ok(Ok(reader)) => Arc::new(reader),
        Ok(Err(e)) => {
            error!("Failed to open file {}: {}", request.path, e);
            return (error_status(&e), Json(ErrorBody { error: e.to_string() })).into_response();
        }
        Err(e) => {
            error!("Decode task failed for {}: {}", request.path, e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let reader_id = Uuid::new_v4().to_string();
    let mut exposed_headers = Vec::new();
    {
        let mut signals = state.signals.write().await;
        for (_index, label) in reader.list_signals() {
            let final_name = unique_name(&*signals, label);
            info!("Register signal: {} (original: {})", final_name, label);

            signals.insert(
                final_name.clone(),
                SignalInfo {
                    reader_id: reader_id.clone(),
                    reader: reader.clone(),
                    original_name: label.to_string(),
                },
            );
            exposed_headers.push(final_name);
        }
    }
    state
        .readers
        .write()
        .await
        .insert(reader_id.clone(), reader.clone());

    let file_name = std::path::Path::new(&request.path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());

    let config = reader.config();
    let desc = config.map(|c| c.file.to_string());
    let created_at = config
        .and_then(|c| c.start_time.to_datetime())
        .map(|t| t.to_string());
    let decoded = reader.decoded_format();
    let tags = config.map(|c| {
        vec![
            decoded.unwrap_or(c.data_format).to_string(),
            format!("{}Hz", c.line_frequency),
            format!("rev{}", c.file.rev_year),
        ]
    });

    Json(FileReadResponse {
        id: reader_id,
        name: file_name,
        path: request.path.clone(),
        source: request.path,
        headers: Some(exposed_headers),
        desc,
        tags,
        created_at,
        source_url: None,
    })
    .into_response()
}

async fn ws_fetch(
    State(state): State<AppState>,
    Path(signal_name): Path<String>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let signal_info = {
        let signals = state.signals.read().await;
        signals.get(&signal_name).cloned()
    };

    let signal_info = match signal_info {
        Some(info) => info,
        None => {
            error!("Signal not found: {}", signal_name);
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    debug!(
        "Fetch {} -> {} from reader {}",
        signal_name, signal_info.original_name, signal_info.reader_id
    );
    ws.on_upgrade(move |socket| {
        handle_ws_fetch(socket, signal_info.reader, signal_info.original_name)
    })
}

async fn list_readers(State(state): State<AppState>) -> impl IntoResponse {
    let readers = state.readers.read().await;

    let mut out: Vec<ReaderSummary> = readers
        .iter()
        .map(|(id, reader)| {
            let headers: Vec<String> = reader
                .list_signals()
                .into_iter()
                .map(|(_, label)| label.to_string())
                .collect();
            ReaderSummary {
                id: id.clone(),
                station: reader
                    .config()
                    .map(|c| c.file.station_name.clone())
                    .unwrap_or_default(),
                signals_count: headers.len(),
                headers,
            }
        })
        .collect();
    out.sort_by(|a, b| a.id.cmp(&b.id));

    Json(out)
}

async fn reader_headers(State(state): State<AppState>, Path(reader_id): Path<String>) -> Response {
    let readers = state.readers.read().await;
    let Some(reader) = readers.get(&reader_id) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    let headers = reader
        .list_signals()
        .into_iter()
        .map(|(_, label)| label.to_string())
        .collect();

    Json(ReaderHeaders {
        id: reader_id,
        headers,
    })
    .into_response()
}

async fn reader_config(State(state): State<AppState>, Path(reader_id): Path<String>) -> Response {
    let readers = state.readers.read().await;
    match readers.get(&reader_id).and_then(|r| r.config()) {
        Some(config) => Json(config).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comtrade_reader::DataFormat;
    use std::fs;
    use tempfile::TempDir;

    const CFG: &str = concat!(
        "ST,1,1999\n1,1A,0D\n1,VA,A,,V,1,0,,-1,1,1,1,P\n50\n1\n1000,2\n",
        "01/01/2021,00:00:00\n01/01/2021,00:00:00\nBINARY\n1\n"
    );

    #[test]
    fn test_load_recording_falls_back_to_alternate_format() {
        let dir = TempDir::new().unwrap();
        let cfg = dir.path().join("rec.cfg");
        fs::write(&cfg, CFG).unwrap();
        fs::write(dir.path().join("rec.dat"), "1,0,7\n2,1000,8\n").unwrap();
        let path = cfg.to_string_lossy().into_owned();

        let reader = load_recording(&path, true).unwrap();
        assert_eq!(reader.read_signal_all("VA(V)").unwrap().values, vec![7.0, 8.0]);
        assert_eq!(reader.config().unwrap().data_format, DataFormat::Binary);
        assert_eq!(reader.decoded_format(), Some(DataFormat::Ascii));

        let err = load_recording(&path, false).unwrap_err();
        assert!(matches!(err, ComtradeError::SizeMismatch { .. }));
        assert_eq!(error_status(&err), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_load_recording_does_not_retry_structural_errors() {
        let dir = TempDir::new().unwrap();
        let cfg = dir.path().join("bad.cfg");
        fs::write(&cfg, "ST,1,1999\n1,1A,0D\n").unwrap();
        fs::write(dir.path().join("bad.dat"), "").unwrap();

        let err = load_recording(&cfg.to_string_lossy(), true).unwrap_err();
        assert!(matches!(err, ComtradeError::Structural { .. }));
    }
}
