// Decompression of archived data files

use crate::core::constants::CompressionType;
use crate::core::error::{ComtradeError, Result};
use flate2::read::GzDecoder;
use std::borrow::Cow;
use std::io::Read;

pub fn decompress(data: &[u8], compression: CompressionType) -> Result<Cow<'_, [u8]>> {
    match compression {
        CompressionType::None => Ok(Cow::Borrowed(data)),

        CompressionType::Gzip => {
            let mut decoder = GzDecoder::new(data);
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| ComtradeError::DecompressionFailed(format!("Gzip: {}", e)))?;
            Ok(Cow::Owned(decompressed))
        }

        #[cfg(feature = "lz4")]
        CompressionType::Lz4 => {
            let mut decoder = lz4::Decoder::new(data)
                .map_err(|e| ComtradeError::DecompressionFailed(format!("LZ4: {}", e)))?;
            let mut decompressed = Vec::new();
            decoder
                .read_to_end(&mut decompressed)
                .map_err(|e| ComtradeError::DecompressionFailed(format!("LZ4: {}", e)))?;
            Ok(Cow::Owned(decompressed))
        }

        #[cfg(not(feature = "lz4"))]
        CompressionType::Lz4 => Err(ComtradeError::UnsupportedCompression("lz4".to_string())),

        #[cfg(feature = "zstd")]
        CompressionType::Zstd => zstd::decode_all(data)
            .map(Cow::Owned)
            .map_err(|e| ComtradeError::DecompressionFailed(format!("Zstd: {}", e))),

        #[cfg(not(feature = "zstd"))]
        CompressionType::Zstd => Err(ComtradeError::UnsupportedCompression("zstd".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decompress_none_borrows() {
        let data = b"1,0,1.5\n";
        let result = decompress(data, CompressionType::None).unwrap();
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(&*result, data);
    }

    #[test]
    fn test_decompress_gzip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let original = b"1,0,1.5\n2,1000,2.5\n";
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(original).unwrap();
        let compressed = encoder.finish().unwrap();

        let decompressed = decompress(&compressed, CompressionType::Gzip).unwrap();
        assert_eq!(&*decompressed, original);
    }

    #[test]
    fn test_decompress_gzip_garbage_fails() {
        let err = decompress(b"not gzip", CompressionType::Gzip).unwrap_err();
        assert!(matches!(err, ComtradeError::DecompressionFailed(_)));
    }

    #[cfg(feature = "zstd")]
    #[test]
    fn test_decompress_zstd() {
        let original = vec![7u8; 64];
        let compressed = zstd::encode_all(&original[..], 0).unwrap();
        let decompressed = decompress(&compressed, CompressionType::Zstd).unwrap();
        assert_eq!(&*decompressed, &original[..]);
    }

    #[cfg(feature = "lz4")]
    #[test]
    fn test_decompress_lz4_frame() {
        use std::io::Write;

        let original = b"1,0,1.5\n2,1000,2.5\n3,2000,3.5\n";
        let mut encoder = lz4::EncoderBuilder::new().build(Vec::new()).unwrap();
        encoder.write_all(original).unwrap();
        let (compressed, result) = encoder.finish();
        result.unwrap();

        let decompressed = decompress(&compressed, CompressionType::Lz4).unwrap();
        assert_eq!(&*decompressed, &original[..]);
    }
}
