// ASCII (.dat) table decoder

use tracing::{debug, info};

use crate::core::constants::{DataFormat, ASCII_LEADING_COLUMNS};
use crate::core::dataset::{timing, DatasetBuilder, WaveformDataset};
use crate::core::error::{ComtradeError, Result};
use crate::core::format::ConfigDocument;

/// Decodes a comma-delimited table, one row per sample. The first two
/// columns (sample number, timestamp) are skipped; analog cells are taken
/// as-is and digital cells are non-zero for set.
pub fn decode(config: &ConfigDocument, text: &str) -> Result<WaveformDataset> {
    if config.data_format != DataFormat::Ascii {
        return Err(ComtradeError::FormatMismatch {
            expected: DataFormat::Ascii,
            declared: config.data_format,
        });
    }
    decode_rows(config, text)
}

/// Same as `decode`, without checking the declared data format.
pub(crate) fn decode_rows(config: &ConfigDocument, text: &str) -> Result<WaveformDataset> {
    let segment = timing(config)?;
    let sample_count = segment.end_sample;
    let analog_count = config.analog.len();
    let columns = ASCII_LEADING_COLUMNS + analog_count + config.digital.len();

    let rows: Vec<&str> = text
        .lines()
        .map(|row| row.trim_end_matches('\r'))
        .filter(|row| !row.trim().is_empty())
        .collect();
    if rows.len() != sample_count {
        return Err(ComtradeError::SizeMismatch {
            expected: sample_count,
            actual: rows.len(),
            unit: "rows",
        });
    }
    debug!("ascii decode: {} rows, {} columns", sample_count, columns);

    let mut builder = DatasetBuilder::new(config, segment);
    for (n, row) in rows.iter().enumerate() {
        let row_number = n + 1;
        let cells: Vec<&str> = row.split(',').map(str::trim).collect();
        if cells.len() < columns {
            return Err(ComtradeError::MalformedRow {
                row: row_number,
                message: format!("expected {} columns, got {}", columns, cells.len()),
            });
        }

        let channel_cells = &cells[ASCII_LEADING_COLUMNS..columns];
        for (ch, cell) in channel_cells[..analog_count].iter().enumerate() {
            let value: f64 = cell.parse().map_err(|_| ComtradeError::MalformedRow {
                row: row_number,
                message: format!(
                    "invalid analog value '{}' in column {}",
                    cell,
                    ch + ASCII_LEADING_COLUMNS
                ),
            })?;
            builder.push_analog(ch, value);
        }
        for (ch, cell) in channel_cells[analog_count..].iter().enumerate() {
            let state: i64 = cell.parse().map_err(|_| ComtradeError::MalformedRow {
                row: row_number,
                message: format!(
                    "invalid digital value '{}' in column {}",
                    cell,
                    ch + ASCII_LEADING_COLUMNS + analog_count
                ),
            })?;
            builder.push_digital(ch, state != 0);
        }
    }

    let dataset = builder.finish();
    info!(
        "decoded {} ascii samples ({} analog, {} digital)",
        dataset.sample_count(),
        dataset.analog_channels().len(),
        dataset.digital_channels().len()
    );
    Ok(dataset)
}
