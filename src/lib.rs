// COMTRADE (IEEE C37.111) reader
// Main library entry point

pub mod core;

// Re-export main types
pub use crate::core::constants::DataFormat;
pub use crate::core::data_handle::handle_ws_fetch;
pub use crate::core::dataset::WaveformDataset;
pub use crate::core::error::{ComtradeError, Result};
pub use crate::core::format::{
    AnalogChannel, ChannelCounts, ConfigDocument, Diagnostic, DigitalChannel, FileDescriptor,
    SampleRateSegment, TimeseriesChunk, Timestamp,
};
pub use crate::core::reader::{ComtradeReader, LoadState, RecordingPaths};

/// Parses configuration text into a `ConfigDocument`.
pub fn parse_config(text: &str) -> Result<ConfigDocument> {
    crate::core::config::parse(text)
}

/// Decodes a data file already in memory, choosing the decoder from the
/// document's declared data format.
pub fn decode(config: &ConfigDocument, data: &[u8]) -> Result<WaveformDataset> {
    decode_as(config, config.data_format, data)
}

/// Decodes `data` as `format`, whatever data file type the document declares.
/// The document itself is left as parsed.
pub fn decode_as(
    config: &ConfigDocument,
    format: DataFormat,
    data: &[u8],
) -> Result<WaveformDataset> {
    match format {
        DataFormat::Binary => crate::core::binary::decode_records(config, data),
        DataFormat::Ascii => {
            crate::core::ascii::decode_rows(config, &String::from_utf8_lossy(data))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        use crate::core::constants::*;
        assert_eq!(RECORD_PREFIX_SIZE, 8);
        assert_eq!(DIGITAL_WORD_BITS, 16);
    }

    const ASCII_CFG: &str = concat!(
        "ST,1,1999\n1,1A,0D\n1,VA,A,,V,2,0,,-1,1,1,1,P\n50\n1\n1000,1\n",
        "01/01/2021,00:00:00\n01/01/2021,00:00:00\nascii\n1\n"
    );

    #[test]
    fn test_decode_dispatches_on_declared_format() {
        let doc = parse_config(ASCII_CFG).unwrap();
        let dataset = decode(&doc, b"1,0,1.5\n").unwrap();
        assert_eq!(dataset.analog_channels()["VA(V)"], vec![1.5]);
    }

    #[test]
    fn test_decode_as_leaves_declared_format() {
        let doc = parse_config(ASCII_CFG).unwrap();
        let mut record = Vec::new();
        record.extend_from_slice(&1u32.to_le_bytes());
        record.extend_from_slice(&0u32.to_le_bytes());
        record.extend_from_slice(&3i16.to_le_bytes());

        let dataset = decode_as(&doc, DataFormat::Binary, &record).unwrap();
        // a = 2, b = 0
        assert_eq!(dataset.analog_channels()["VA(V)"], vec![6.0]);
        assert_eq!(doc.data_format, DataFormat::Ascii);
        assert!(matches!(
            decode_as(&doc, DataFormat::Binary, &record[..4]),
            Err(ComtradeError::SizeMismatch { .. })
        ));
    }
}
