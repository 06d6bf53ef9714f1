// COMTRADE recording reader: pairs .cfg/.dat files, parses and decodes them

use crate::core::compression::decompress;
use crate::core::constants::*;
use crate::core::dataset::WaveformDataset;
use crate::core::error::{ComtradeError, Result};
use crate::core::format::*;
use crate::core::config;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Location of a recording, independent of which of its files was named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingPaths {
    base: PathBuf,
}

impl RecordingPaths {
    /// Accepts `x.cfg`, `x.dat` or a compressed `x.dat.gz|zst|lz4`, any case.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut stem = path.to_path_buf();
        if extension_of(&stem)
            .and_then(|ext| CompressionType::from_extension(&ext))
            .is_some()
        {
            stem = stem.with_extension("");
        }
        match extension_of(&stem).as_deref() {
            Some(CONFIG_EXTENSION) | Some(DATA_EXTENSION) => Ok(Self {
                base: stem.with_extension(""),
            }),
            _ => Err(ComtradeError::NotComtrade(path.to_path_buf())),
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn config_path(&self) -> Result<PathBuf> {
        let candidates = [
            with_suffix(&self.base, CONFIG_EXTENSION),
            with_suffix(&self.base, &CONFIG_EXTENSION.to_ascii_uppercase()),
        ];
        candidates
            .iter()
            .find(|p| p.is_file())
            .cloned()
            .ok_or_else(|| ComtradeError::MissingSource(candidates[0].clone()))
    }

    /// The plain data file wins over archived copies.
    pub fn data_path(&self) -> Result<(PathBuf, CompressionType)> {
        let plain = [
            DATA_EXTENSION.to_string(),
            DATA_EXTENSION.to_ascii_uppercase(),
        ];
        let codecs = [
            CompressionType::None,
            CompressionType::Gzip,
            CompressionType::Zstd,
            CompressionType::Lz4,
        ];
        for codec in codecs {
            for ext in &plain {
                let name = match codec.extension() {
                    Some(suffix) => format!("{}.{}", ext, suffix),
                    None => ext.clone(),
                };
                let candidate = with_suffix(&self.base, &name);
                if candidate.is_file() {
                    return Ok((candidate, codec));
                }
            }
        }
        Err(ComtradeError::MissingSource(with_suffix(
            &self.base,
            DATA_EXTENSION,
        )))
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Progress of a reader. `Parsed` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Uninitialized,
    Parsing,
    Parsed,
    Failed(String),
}

#[derive(Debug)]
pub struct ComtradeReader {
    paths: RecordingPaths,
    state: LoadState,
    config: Option<ConfigDocument>,
    // format the data file was actually decoded as
    decoded_format: Option<DataFormat>,
    dataset: Option<WaveformDataset>,
}

impl ComtradeReader {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self {
            paths: RecordingPaths::from_path(path)?,
            state: LoadState::Uninitialized,
            config: None,
            decoded_format: None,
            dataset: None,
        })
    }

    /// Resolves, parses and decodes in one step.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = Self::new(path)?;
        reader.load()?;
        Ok(reader)
    }

    /// Decodes using the data format the configuration declares.
    pub fn load(&mut self) -> Result<()> {
        self.load_inner(None)
    }

    /// Decodes with `format` regardless of the declared data file type.
    pub fn load_with_format(&mut self, format: DataFormat) -> Result<()> {
        self.load_inner(Some(format))
    }

    fn load_inner(&mut self, format: Option<DataFormat>) -> Result<()> {
        match &self.state {
            LoadState::Parsed => return Ok(()),
            LoadState::Failed(reason) => return Err(ComtradeError::LoadFailed(reason.clone())),
            LoadState::Uninitialized | LoadState::Parsing => {}
        }

        self.state = LoadState::Parsing;
        let outcome = match Self::read_config(&self.paths) {
            Ok(config) => {
                let format = format.unwrap_or(config.data_format);
                let decoded = Self::read_data(&self.paths, &config, format);
                // retained even when the data file fails to decode
                self.config = Some(config);
                decoded.map(|dataset| (dataset, format))
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok((dataset, format)) => {
                self.dataset = Some(dataset);
                self.decoded_format = Some(format);
                self.state = LoadState::Parsed;
                Ok(())
            }
            Err(e) => {
                warn!("failed to load {}: {}", self.paths.base().display(), e);
                self.state = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn read_config(paths: &RecordingPaths) -> Result<ConfigDocument> {
        let config_path = paths.config_path()?;
        let text = fs::read(&config_path)?;
        config::parse(&String::from_utf8_lossy(&text))
    }

    fn read_data(
        paths: &RecordingPaths,
        config: &ConfigDocument,
        format: DataFormat,
    ) -> Result<WaveformDataset> {
        let (data_path, compression) = paths.data_path()?;
        if format != config.data_format {
            warn!(
                "{}: declared {} data, decoding as {}",
                data_path.display(),
                config.data_format,
                format
            );
        }
        debug!("reading {} ({:?}) as {}", data_path.display(), compression, format);
        let raw = fs::read(&data_path)?;
        let data = decompress(&raw, compression)?;

        let dataset = crate::decode_as(config, format, &data)?;

        info!(
            "loaded {}: {} samples at {} Hz",
            config.file.station_name,
            dataset.sample_count(),
            config.first_segment().map(|s| s.rate).unwrap_or_default()
        );
        Ok(dataset)
    }

    pub fn paths(&self) -> &RecordingPaths {
        &self.paths
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn config(&self) -> Option<&ConfigDocument> {
        self.config.as_ref()
    }

    /// The data format actually used; differs from the declared one after
    /// `load_with_format` with the alternate format.
    pub fn decoded_format(&self) -> Option<DataFormat> {
        self.decoded_format
    }

    pub fn dataset(&self) -> Option<&WaveformDataset> {
        self.dataset.as_ref()
    }

    fn loaded(&self) -> Result<&WaveformDataset> {
        self.dataset.as_ref().ok_or_else(|| {
            ComtradeError::LoadFailed(format!("recording not loaded ({:?})", self.state))
        })
    }

    pub fn list_signals(&self) -> Vec<(usize, &str)> {
        self.dataset
            .as_ref()
            .map(|d| {
                d.labels()
                    .iter()
                    .enumerate()
                    .map(|(i, label)| (i, label.as_str()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn get_signal_by_name(&self, name: &str) -> Option<usize> {
        self.list_signals()
            .into_iter()
            .find(|(_, label)| *label == name)
            .map(|(i, _)| i)
    }

    /// Full series for a channel label; digital channels read as 0.0 / 1.0.
    pub fn read_signal_all(&self, name: &str) -> Result<TimeseriesChunk> {
        let dataset = self.loaded()?;
        let values: Vec<f64> = if let Some(series) = dataset.analog_channels().get(name) {
            series.clone()
        } else if let Some(series) = dataset.digital_channels().get(name) {
            series.iter().map(|&set| if set { 1.0 } else { 0.0 }).collect()
        } else {
            return Err(ComtradeError::SignalNotFound(name.to_string()));
        };

        Ok(TimeseriesChunk {
            timestamps: dataset.time_vector(),
            values,
        })
    }

    pub fn read_time_range(
        &self,
        name: &str,
        start_time: f64,
        end_time: f64,
    ) -> Result<TimeseriesChunk> {
        let all = self.read_signal_all(name)?;
        let mut result = TimeseriesChunk::new();
        for (ts, val) in all.timestamps.iter().zip(all.values.iter()) {
            if *ts >= start_time && *ts <= end_time {
                result.timestamps.push(*ts);
                result.values.push(*val);
            }
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::binary::tests::{config_text, record};
    use std::io::Write;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn binary_recording(dir: &TempDir, cfg_name: &str, dat_name: &str) -> PathBuf {
        let cfg = config_text(&[("IA", 0.001, 0.0)], &[(0, "TRIP")], 1000.0, 2, "BINARY");
        let data = [record(1, &[1000], &[1]), record(2, &[2000], &[0])].concat();
        write(dir, dat_name, &data);
        write(dir, cfg_name, cfg.as_bytes())
    }

    #[test]
    fn test_open_binary_recording() {
        let dir = TempDir::new().unwrap();
        let cfg = binary_recording(&dir, "fault.cfg", "fault.dat");

        let reader = ComtradeReader::open(&cfg).unwrap();
        assert_eq!(reader.state(), &LoadState::Parsed);
        assert_eq!(reader.decoded_format(), Some(DataFormat::Binary));
        assert_eq!(reader.list_signals(), vec![(0, "IA(V)"), (1, "TRIP")]);
        assert_eq!(reader.get_signal_by_name("TRIP"), Some(1));

        let ia = reader.read_signal_all("IA(V)").unwrap();
        assert_eq!(ia.timestamps, vec![0.0, 0.001]);
        assert!((ia.values[1] - 2.0).abs() < 1e-9);

        let trip = reader.read_signal_all("TRIP").unwrap();
        assert_eq!(trip.values, vec![1.0, 0.0]);

        let later = reader.read_time_range("IA(V)", 0.0005, 1.0).unwrap();
        assert_eq!(later.len(), 1);

        assert!(matches!(
            reader.read_signal_all("VB(kV)"),
            Err(ComtradeError::SignalNotFound(_))
        ));
    }

    #[test]
    fn test_open_via_uppercase_data_path() {
        let dir = TempDir::new().unwrap();
        binary_recording(&dir, "FAULT.CFG", "FAULT.DAT");

        let reader = ComtradeReader::open(dir.path().join("FAULT.DAT")).unwrap();
        assert_eq!(reader.config().unwrap().file.station_name, "TEST");
        assert_eq!(reader.dataset().unwrap().sample_count(), 2);
    }

    #[test]
    fn test_gzip_archived_data() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = TempDir::new().unwrap();
        let cfg = config_text(&[("VA", 1.0, 0.0)], &[], 500.0, 2, "ascii");
        write(&dir, "rec.cfg", cfg.as_bytes());

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"1,0,3.5\n2,2000,4.5\n").unwrap();
        write(&dir, "rec.dat.gz", &encoder.finish().unwrap());

        let reader = ComtradeReader::open(dir.path().join("rec.cfg")).unwrap();
        let va = reader.read_signal_all("VA(V)").unwrap();
        assert_eq!(va.values, vec![3.5, 4.5]);
        assert_eq!(va.timestamps, vec![0.0, 0.002]);
    }

    #[test]
    fn test_not_comtrade_path() {
        assert!(matches!(
            ComtradeReader::new("recording.csv"),
            Err(ComtradeError::NotComtrade(_))
        ));
        assert!(ComtradeReader::new("recording.dat.gz").is_ok());
    }

    #[test]
    fn test_missing_data_file_fails_terminally() {
        let dir = TempDir::new().unwrap();
        let cfg = config_text(&[("IA", 1.0, 0.0)], &[], 1000.0, 1, "binary");
        let path = write(&dir, "lonely.cfg", cfg.as_bytes());

        let mut reader = ComtradeReader::new(&path).unwrap();
        assert_eq!(reader.state(), &LoadState::Uninitialized);
        assert!(matches!(reader.load(), Err(ComtradeError::MissingSource(_))));
        assert!(matches!(reader.state(), LoadState::Failed(_)));
        assert!(reader.dataset().is_none());
        assert_eq!(reader.config().unwrap().data_format, DataFormat::Binary);
        assert_eq!(reader.decoded_format(), None);
        assert!(reader.list_signals().is_empty());

        // terminal: adding the file afterwards does not revive the reader
        write(&dir, "lonely.dat", &record(1, &[5], &[]));
        assert!(matches!(reader.load(), Err(ComtradeError::LoadFailed(_))));
        assert!(ComtradeReader::open(&path).is_ok());
    }

    #[test]
    fn test_missing_config_file() {
        let dir = TempDir::new().unwrap();
        let err = ComtradeReader::open(dir.path().join("absent.dat")).unwrap_err();
        assert!(matches!(err, ComtradeError::MissingSource(_)));
    }

    #[test]
    fn test_retry_with_alternate_format() {
        let dir = TempDir::new().unwrap();
        // declares binary but ships an ascii table
        let cfg = config_text(&[("VA", 1.0, 0.0)], &[], 1000.0, 2, "binary");
        let path = write(&dir, "mislabelled.cfg", cfg.as_bytes());
        write(&dir, "mislabelled.dat", b"1,0,7\n2,1000,8\n");

        let mut first = ComtradeReader::new(&path).unwrap();
        assert!(first.load().unwrap_err().is_layout_mismatch());
        let declared = first.config().unwrap().data_format;
        assert_eq!(declared, DataFormat::Binary);

        let mut retry = ComtradeReader::new(&path).unwrap();
        retry.load_with_format(declared.alternate()).unwrap();
        // the parsed document keeps the declared tag
        assert_eq!(retry.config().unwrap().data_format, DataFormat::Binary);
        assert_eq!(retry.decoded_format(), Some(DataFormat::Ascii));
        assert_eq!(retry.read_signal_all("VA(V)").unwrap().values, vec![7.0, 8.0]);
    }

    #[test]
    fn test_paths_keep_dotted_stems() {
        let paths = RecordingPaths::from_path("/tmp/rec.2020.cfg").unwrap();
        assert_eq!(paths.base(), Path::new("/tmp/rec.2020"));
    }

    #[test]
    fn test_duplicate_labels_listed_once() {
        let dir = TempDir::new().unwrap();
        let cfg = concat!(
            "ST,1,1999\n2,2A,0D\n",
            "1,IA,A,LINE1,A,1,0,,-32767,32767,1,1,P\n",
            "2,IA,A,LINE2,A,1,0,,-32767,32767,1,1,P\n",
            "50\n1\n1000,1\n01/01/2021,00:00:00\n01/01/2021,00:00:00\nbinary\n1\n"
        );
        let path = write(&dir, "dup.cfg", cfg.as_bytes());
        write(&dir, "dup.dat", &record(1, &[11, 22], &[]));

        let reader = ComtradeReader::open(&path).unwrap();
        assert_eq!(reader.list_signals(), vec![(0, "IA(A)")]);
        assert_eq!(reader.read_signal_all("IA(A)").unwrap().values, vec![22.0]);
    }
}
