// Data structures for COMTRADE configuration documents

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::constants::DataFormat;

/// Line 1: station name, recording device id, revision year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub station_name: String,
    pub rec_dev_id: i64,
    pub rev_year: String,
}

impl fmt::Display for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Station name:{}", self.station_name)?;
        writeln!(f, "ID:{}", self.rec_dev_id)?;
        write!(f, "IEEE Std C37.111-{} COMTRADE", self.rev_year)
    }
}

/// Line 2: `TT,##A,##D`. `total == analog + digital` holds after parsing,
/// possibly because all three were zeroed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCounts {
    pub total: usize,
    pub analog: usize,
    pub digital: usize,
}

impl fmt::Display for ChannelCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "There are {} channels, including:", self.total)?;
        writeln!(f, "analog: {}", self.analog)?;
        write!(f, "digital: {}", self.digital)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalogChannel {
    pub index: usize,
    pub ch_id: String,
    pub phase: String,
    pub ccbm: String,
    pub unit: String,
    pub a: f64,
    pub b: f64,
    /// Metadata only; never applied to sample values.
    pub skew: f64,
    pub min: f64,
    pub max: f64,
    pub primary: f64,
    pub secondary: f64,
    pub ps: String,
}

impl AnalogChannel {
    pub fn label(&self) -> String {
        format!("{}({})", self.ch_id, self.unit)
    }

    pub fn scale(&self, raw: f64) -> f64 {
        raw * self.a + self.b
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitalChannel {
    pub index: usize,
    pub ch_id: String,
    pub phase: String,
    pub ccbm: String,
    pub normal_state: i64,
}

impl DigitalChannel {
    pub fn label(&self) -> String {
        self.ch_id.clone()
    }

    /// Bit test against the status word, using the declared channel index as
    /// the bit position. The word is sign-extended first, so positions past 15
    /// read the sign bit.
    ///
    /// NOTE: word selection divides the channel position by 16 but the bit is
    /// not taken modulo 16. This is probably wrong for recordings with more
    /// than 16 digital channels; pin it against real multi-word files before
    /// changing it.
    pub fn bit_of(&self, word: i16) -> bool {
        let shift = self.index.min(63) as u32;
        (i64::from(word) >> shift) & 1 == 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleRateSegment {
    pub rate: f64,
    pub end_sample: usize,
}

impl fmt::Display for SampleRateSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rate: {:.3}Hz", self.rate)?;
        write!(f, "id: {}", self.end_sample)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timestamp {
    pub day: u32,
    pub month: u32,
    pub year: i32,
    pub hour: u32,
    pub minute: u32,
    pub second: f64,
}

impl Timestamp {
    /// None when any field is out of calendar range.
    pub fn to_datetime(&self) -> Option<NaiveDateTime> {
        if !(0.0..60.0).contains(&self.second) {
            return None;
        }
        let whole = self.second.trunc() as u32;
        let micros = ((self.second - self.second.trunc()) * 1_000_000.0).round() as u32;
        NaiveDate::from_ymd_opt(self.year, self.month, self.day)?
            .and_hms_micro_opt(self.hour, self.minute, whole, micros.min(999_999))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}/{:02}/{:04},{:02}:{:02}:{:09.6}",
            self.day, self.month, self.year, self.hour, self.minute, self.second
        )
    }
}

/// Non-fatal findings recorded while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// `TT != A + D`; all three counts were reset to zero and no channel
    /// descriptor lines were consumed.
    ChannelCountInconsistency {
        declared_total: usize,
        declared_analog: usize,
        declared_digital: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub file: FileDescriptor,
    pub counts: ChannelCounts,
    pub analog: Vec<AnalogChannel>,
    pub digital: Vec<DigitalChannel>,
    pub line_frequency: f64,
    pub sample_rates: Vec<SampleRateSegment>,
    pub start_time: Timestamp,
    pub trigger_time: Timestamp,
    pub data_format: DataFormat,
    pub time_multiplier: f64,
    pub diagnostics: Vec<Diagnostic>,
}

impl ConfigDocument {
    pub fn first_segment(&self) -> Option<&SampleRateSegment> {
        self.sample_rates.first()
    }

    pub fn sample_count(&self) -> usize {
        self.first_segment().map(|s| s.end_sample).unwrap_or(0)
    }

    pub fn channel_count_zeroed(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| matches!(d, Diagnostic::ChannelCountInconsistency { .. }))
    }

    /// Seconds from start of recording to trigger, when both stamps are valid dates.
    pub fn trigger_offset(&self) -> Option<f64> {
        let start = self.start_time.to_datetime()?;
        let trigger = self.trigger_time.to_datetime()?;
        let delta = trigger.signed_duration_since(start);
        delta
            .num_microseconds()
            .map(|us| us as f64 / 1_000_000.0)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimeseriesChunk {
    pub timestamps: Vec<f64>,
    pub values: Vec<f64>,
}

impl TimeseriesChunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            timestamps: Vec::with_capacity(cap),
            values: Vec::with_capacity(cap),
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digital(index: usize) -> DigitalChannel {
        DigitalChannel {
            index,
            ch_id: format!("D{}", index),
            phase: String::new(),
            ccbm: String::new(),
            normal_state: 0,
        }
    }

    #[test]
    fn test_bit_uses_declared_index() {
        let word = 0b0000_0000_0000_0101;
        assert!(digital(0).bit_of(word));
        assert!(!digital(1).bit_of(word));
        assert!(digital(2).bit_of(word));
        assert!(!digital(17).bit_of(word));
    }

    #[test]
    fn test_bit_past_word_reads_sign() {
        assert!(digital(20).bit_of(-1));
        assert!(!digital(20).bit_of(0x7fff));
    }

    #[test]
    fn test_file_descriptor_summary() {
        let file = FileDescriptor {
            station_name: "SUB1".into(),
            rec_dev_id: 7,
            rev_year: "1999".into(),
        };
        assert_eq!(
            file.to_string(),
            "Station name:SUB1\nID:7\nIEEE Std C37.111-1999 COMTRADE"
        );
    }

    #[test]
    fn test_timestamp_to_datetime() {
        let ts = Timestamp {
            day: 3,
            month: 11,
            year: 2020,
            hour: 14,
            minute: 5,
            second: 7.25,
        };
        let dt = ts.to_datetime().unwrap();
        assert_eq!(dt.to_string(), "2020-11-03 14:05:07.250");
        assert_eq!(ts.to_string(), "03/11/2020,14:05:07.250000");

        let bad = Timestamp { month: 13, ..ts };
        assert!(bad.to_datetime().is_none());
    }
}
