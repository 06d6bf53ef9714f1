// Configuration (.cfg) grammar parser

use std::str::FromStr;
use tracing::{debug, warn};

use crate::core::constants::{DataFormat, DEFAULT_REVISION_YEAR};
use crate::core::cursor::LineCursor;
use crate::core::error::{ComtradeError, Result};
use crate::core::format::*;

/// Comma-split fields of one configuration line, with the line number kept
/// for error reporting.
struct Fields<'a> {
    line: usize,
    parts: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    fn new(line: usize, text: &'a str) -> Self {
        Self {
            line,
            parts: text.split(',').collect(),
        }
    }

    fn len(&self) -> usize {
        self.parts.len()
    }

    fn optional(&self, i: usize) -> Option<&'a str> {
        self.parts.get(i).copied().filter(|s| !s.trim().is_empty())
    }

    fn text(&self, i: usize, name: &str) -> Result<&'a str> {
        self.parts
            .get(i)
            .copied()
            .ok_or_else(|| ComtradeError::structural(self.line, format!("missing field {}", name)))
    }

    fn number<T: FromStr>(&self, i: usize, name: &str) -> Result<T> {
        let raw = self.text(i, name)?;
        parse_number(self.line, raw, name)
    }

    fn number_or<T: FromStr>(&self, i: usize, name: &str, default: T) -> Result<T> {
        match self.optional(i) {
            Some(raw) => parse_number(self.line, raw, name),
            None => Ok(default),
        }
    }
}

fn parse_number<T: FromStr>(line: usize, raw: &str, name: &str) -> Result<T> {
    raw.trim().parse().map_err(|_| {
        ComtradeError::structural(line, format!("invalid {} value '{}'", name, raw.trim()))
    })
}

/// Parses a configuration document. The grammar is strictly ordered and the
/// number of channel and sample-rate lines depends on counts read earlier.
pub fn parse(text: &str) -> Result<ConfigDocument> {
    let mut cursor = LineCursor::new(text);
    let mut diagnostics = Vec::new();

    let line = cursor.line_number();
    let file = parse_file_descriptor(line, cursor.next_line("station line")?)?;

    let line = cursor.line_number();
    let counts_line = cursor.next_line("channel count line")?;
    let counts = parse_channel_counts(line, counts_line, &mut diagnostics)?;
    debug!(
        "{}: {} analog, {} digital channels",
        file.station_name, counts.analog, counts.digital
    );

    let analog = cursor
        .take(counts.analog, "analog channel")?
        .into_iter()
        .map(|(line, text)| parse_analog_channel(line, text))
        .collect::<Result<Vec<_>>>()?;

    let digital = cursor
        .take(counts.digital, "digital channel")?
        .into_iter()
        .map(|(line, text)| parse_digital_channel(line, text))
        .collect::<Result<Vec<_>>>()?;

    let line = cursor.line_number();
    let line_frequency = parse_number(line, cursor.next_line("line frequency")?, "line frequency")?;

    let line = cursor.line_number();
    let nrates: usize = parse_number(line, cursor.next_line("sample rate count")?, "nrates")?;

    let sample_rates = cursor
        .take(nrates, "sample rate")?
        .into_iter()
        .map(|(line, text)| parse_sample_rate(line, text))
        .collect::<Result<Vec<_>>>()?;

    let line = cursor.line_number();
    let start_time = parse_timestamp(line, cursor.next_line("start timestamp")?)?;

    let line = cursor.line_number();
    let trigger_time = parse_timestamp(line, cursor.next_line("trigger timestamp")?)?;

    let line = cursor.line_number();
    let tag = cursor.next_line("data file type")?;
    let data_format = DataFormat::from_tag(tag).ok_or_else(|| {
        ComtradeError::structural(line, format!("unsupported data file type '{}'", tag.trim()))
    })?;

    let line = cursor.line_number();
    let time_multiplier = parse_number(line, cursor.next_line("time multiplier")?, "timemult")?;

    debug!(
        "{}: {} sample rate segment(s), {} data",
        file.station_name,
        sample_rates.len(),
        data_format
    );

    Ok(ConfigDocument {
        file,
        counts,
        analog,
        digital,
        line_frequency,
        sample_rates,
        start_time,
        trigger_time,
        data_format,
        time_multiplier,
        diagnostics,
    })
}

fn parse_file_descriptor(line: usize, text: &str) -> Result<FileDescriptor> {
    let fields = Fields::new(line, text);
    Ok(FileDescriptor {
        station_name: fields.text(0, "station_name")?.to_string(),
        rec_dev_id: fields.number(1, "rec_dev_id")?,
        rev_year: fields
            .optional(2)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| DEFAULT_REVISION_YEAR.to_string()),
    })
}

fn parse_channel_counts(
    line: usize,
    text: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<ChannelCounts> {
    let fields = Fields::new(line, text);
    let total = fields.number(0, "TT")?;
    let analog = tagged_count(&fields, 1, 'A')?;
    let digital = tagged_count(&fields, 2, 'D')?;

    if analog.checked_add(digital) != Some(total) {
        warn!(
            "channel count mismatch at line {}: TT={} but {}A + {}D; discarding channels",
            line, total, analog, digital
        );
        diagnostics.push(Diagnostic::ChannelCountInconsistency {
            declared_total: total,
            declared_analog: analog,
            declared_digital: digital,
        });
        return Ok(ChannelCounts::default());
    }

    Ok(ChannelCounts {
        total,
        analog,
        digital,
    })
}

// `##A` / `##D`; a field without its suffix counts as zero
fn tagged_count(fields: &Fields, i: usize, suffix: char) -> Result<usize> {
    let raw = fields.text(i, &format!("##{}", suffix))?;
    if !raw.contains(suffix) {
        return Ok(0);
    }
    parse_number(fields.line, &raw.replace(suffix, ""), &format!("##{}", suffix))
}

fn parse_analog_channel(line: usize, text: &str) -> Result<AnalogChannel> {
    let fields = Fields::new(line, text);
    if fields.len() < 10 {
        return Err(ComtradeError::structural(
            line,
            format!("analog channel needs at least 10 fields, got {}", fields.len()),
        ));
    }
    Ok(AnalogChannel {
        index: fields.number(0, "An")?,
        ch_id: fields.text(1, "ch_id")?.to_string(),
        phase: fields.text(2, "ph")?.to_string(),
        ccbm: fields.text(3, "ccbm")?.to_string(),
        unit: fields.text(4, "uu")?.to_string(),
        a: fields.number(5, "a")?,
        b: fields.number(6, "b")?,
        skew: fields.number_or(7, "skew", 0.0)?,
        min: fields.number(8, "min")?,
        max: fields.number(9, "max")?,
        primary: fields.number_or(10, "primary", 1.0)?,
        secondary: fields.number_or(11, "secondary", 1.0)?,
        ps: fields
            .optional(12)
            .map(|s| s.trim().to_string())
            .unwrap_or_else(|| "P".to_string()),
    })
}

fn parse_digital_channel(line: usize, text: &str) -> Result<DigitalChannel> {
    let fields = Fields::new(line, text);
    Ok(DigitalChannel {
        index: fields.number(0, "Dn")?,
        ch_id: fields.text(1, "ch_id")?.to_string(),
        phase: fields.text(2, "ph")?.to_string(),
        ccbm: fields.text(3, "ccbm")?.to_string(),
        normal_state: fields.number(4, "y")?,
    })
}

fn parse_sample_rate(line: usize, text: &str) -> Result<SampleRateSegment> {
    let fields = Fields::new(line, text);
    Ok(SampleRateSegment {
        rate: fields.number(0, "samp")?,
        end_sample: fields.number(1, "endsamp")?,
    })
}

// dd/mm/yyyy,hh:mm:ss.ssssss
fn parse_timestamp(line: usize, text: &str) -> Result<Timestamp> {
    let fields = Fields::new(line, text);
    let date = Fields {
        line,
        parts: fields.text(0, "date")?.split('/').collect(),
    };
    let time = Fields {
        line,
        parts: fields.text(1, "time")?.split(':').collect(),
    };
    Ok(Timestamp {
        day: date.number(0, "day")?,
        month: date.number(1, "month")?,
        year: date.number(2, "year")?,
        hour: time.number(0, "hour")?,
        minute: time.number(1, "minute")?,
        second: time.number(2, "second")?,
    })
}
