// Binary (.dat) record decoder

use tracing::{debug, info};

use crate::core::constants::*;
use crate::core::dataset::{timing, DatasetBuilder, WaveformDataset};
use crate::core::error::{ComtradeError, Result};
use crate::core::format::ConfigDocument;

/// Byte layout of one sample record for a given channel configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    pub analog_bytes: usize,
    pub digital_bytes: usize,
}

impl RecordLayout {
    pub fn new(analog_channels: usize, digital_channels: usize) -> Self {
        Self {
            analog_bytes: ANALOG_SAMPLE_SIZE * analog_channels,
            digital_bytes: DIGITAL_WORD_SIZE * digital_channels.div_ceil(DIGITAL_WORD_BITS),
        }
    }

    pub fn unit_size(&self) -> usize {
        RECORD_PREFIX_SIZE + self.analog_bytes + self.digital_bytes
    }

    fn analog_offset(&self, sample: usize, channel: usize) -> usize {
        sample * self.unit_size() + RECORD_PREFIX_SIZE + channel * ANALOG_SAMPLE_SIZE
    }

    fn digital_offset(&self, sample: usize, channel: usize) -> usize {
        sample * self.unit_size()
            + RECORD_PREFIX_SIZE
            + self.analog_bytes
            + (channel / DIGITAL_WORD_BITS) * DIGITAL_WORD_SIZE
    }
}

fn read_i16(data: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([data[offset], data[offset + 1]])
}

/// Decodes fixed-size int16 sample records. The buffer must hold at least
/// `sample_count * unit_size` bytes; trailing bytes are ignored.
pub fn decode(config: &ConfigDocument, data: &[u8]) -> Result<WaveformDataset> {
    if config.data_format != DataFormat::Binary {
        return Err(ComtradeError::FormatMismatch {
            expected: DataFormat::Binary,
            declared: config.data_format,
        });
    }
    decode_records(config, data)
}

/// Same as `decode`, without checking the declared data format.
pub(crate) fn decode_records(config: &ConfigDocument, data: &[u8]) -> Result<WaveformDataset> {
    let segment = timing(config)?;
    let sample_count = segment.end_sample;
    let layout = RecordLayout::new(config.analog.len(), config.digital.len());

    let expected = sample_count
        .checked_mul(layout.unit_size())
        .ok_or_else(|| ComtradeError::structural(0, "sample count overflows record size"))?;
    if data.len() < expected {
        return Err(ComtradeError::SizeMismatch {
            expected,
            actual: data.len(),
            unit: "bytes",
        });
    }
    debug!(
        "binary decode: {} samples, {} bytes per record",
        sample_count,
        layout.unit_size()
    );

    let mut builder = DatasetBuilder::new(config, segment);
    for i in 0..sample_count {
        for (ch, descriptor) in config.analog.iter().enumerate() {
            let raw = read_i16(data, layout.analog_offset(i, ch));
            builder.push_analog(ch, descriptor.scale(f64::from(raw)));
        }
        for (ch, descriptor) in config.digital.iter().enumerate() {
            let word = read_i16(data, layout.digital_offset(i, ch));
            builder.push_digital(ch, descriptor.bit_of(word));
        }
    }

    let dataset = builder.finish();
    info!(
        "decoded {} binary samples ({} analog, {} digital)",
        dataset.sample_count(),
        dataset.analog_channels().len(),
        dataset.digital_channels().len()
    );
    Ok(dataset)
}
