// Format constants for COMTRADE (IEEE C37.111) recordings

pub const CONFIG_EXTENSION: &str = "cfg";
pub const DATA_EXTENSION: &str = "dat";

// Binary record prefix: sample index(u32) timestamp(u32)
pub const RECORD_PREFIX_SIZE: usize = 4 + 4; // 8 bytes

// Analog samples are int16
pub const ANALOG_SAMPLE_SIZE: usize = 2;

// Digital status words: 16 channels per int16 word
pub const DIGITAL_WORD_SIZE: usize = 2;
pub const DIGITAL_WORD_BITS: usize = 16;

// Columns preceding channel data in an ascii row: sample index, timestamp
pub const ASCII_LEADING_COLUMNS: usize = 2;

// Revision year assumed when line 1 carries only station and device id
pub const DEFAULT_REVISION_YEAR: &str = "1991";

// Declared data layout of the .dat file
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Ascii,
    Binary,
}

impl DataFormat {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "ascii" => Some(DataFormat::Ascii),
            "binary" => Some(DataFormat::Binary),
            _ => None,
        }
    }

    pub fn alternate(self) -> Self {
        match self {
            DataFormat::Ascii => DataFormat::Binary,
            DataFormat::Binary => DataFormat::Ascii,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataFormat::Ascii => "ascii",
            DataFormat::Binary => "binary",
        }
    }
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Archive codecs accepted on the data file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None,
    Gzip,
    Lz4,
    Zstd,
}

impl CompressionType {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "gz" => Some(CompressionType::Gzip),
            "lz4" => Some(CompressionType::Lz4),
            "zst" => Some(CompressionType::Zstd),
            _ => None,
        }
    }

    pub fn extension(self) -> Option<&'static str> {
        match self {
            CompressionType::None => None,
            CompressionType::Gzip => Some("gz"),
            CompressionType::Lz4 => Some("lz4"),
            CompressionType::Zstd => Some("zst"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_format_tag_is_case_insensitive() {
        assert_eq!(DataFormat::from_tag("BINARY"), Some(DataFormat::Binary));
        assert_eq!(DataFormat::from_tag(" Ascii "), Some(DataFormat::Ascii));
        assert_eq!(DataFormat::from_tag("float32"), None);
        assert_eq!(DataFormat::Binary.alternate(), DataFormat::Ascii);
    }

    #[test]
    fn test_compression_extension() {
        assert_eq!(CompressionType::from_extension("GZ"), Some(CompressionType::Gzip));
        assert_eq!(CompressionType::from_extension("dat"), None);
        assert_eq!(CompressionType::Zstd.extension(), Some("zst"));
    }
}
