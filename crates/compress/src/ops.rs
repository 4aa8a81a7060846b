//! In-memory compression operations.

use crate::Compression;
use crate::error::{ErrorKind, Result};
use bzip2::{Compression as BzCompression, read::BzDecoder, write::BzEncoder};
use exn::ResultExt;
use flate2::{Compression as GzCompression, read::GzDecoder, write::GzEncoder};
use std::io::{Read, Write};
use tracing::instrument;

// Cache payloads are packed on the request path, so favour speed over ratio.
// Corpus files are only ever decompressed here, the level does not matter.
const BZIP2_LEVEL: BzCompression = BzCompression::fast();
const GZIP_LEVEL: GzCompression = GzCompression::fast();
#[cfg(feature = "zstd")]
const ZSTD_LEVEL: i32 = 3;

fn drain(mut decoder: impl Read) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    decoder.read_to_end(&mut output).or_raise(|| ErrorKind::InvalidData)?;
    Ok(output)
}

impl Compression {
    /// Compress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use lectio_compress::Compression;
    ///
    /// let data = br#"{"1":"In the beginning..."}"#;
    /// let compressed = Compression::Gzip.compress(data).unwrap();
    /// assert_ne!(compressed, data);
    /// ```
    #[instrument(level = "trace", skip(input), fields(format = %self, input_size = input.len()))]
    pub fn compress(&self, input: &[u8]) -> Result<Vec<u8>> {
        let output = match self {
            Compression::None => input.to_vec(),
            Compression::Bzip2 => {
                let mut encoder = BzEncoder::new(Vec::new(), BZIP2_LEVEL);
                encoder.write_all(input).or_raise(|| ErrorKind::Io)?;
                encoder.finish().or_raise(|| ErrorKind::Io)?
            },
            Compression::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), GZIP_LEVEL);
                encoder.write_all(input).or_raise(|| ErrorKind::Io)?;
                encoder.finish().or_raise(|| ErrorKind::Io)?
            },
            #[cfg(feature = "zstd")]
            Compression::Zstd => zstd::encode_all(input, ZSTD_LEVEL).or_raise(|| ErrorKind::Encoder)?,
        };
        tracing::trace!(output_size = output.len(), "Compressed");
        Ok(output)
    }

    /// Decompress a byte slice in memory.
    ///
    /// # Examples
    ///
    /// ```
    /// use lectio_compress::Compression;
    ///
    /// let original = br#"{"1":"In the beginning..."}"#;
    /// let compressed = Compression::Bzip2.compress(original).unwrap();
    /// let decompressed = Compression::Bzip2.decompress(&compressed).unwrap();
    /// assert_eq!(decompressed, original);
    /// ```
    #[instrument(level = "trace", skip(input), fields(format = %self, input_size = input.len()))]
    pub fn decompress(&self, input: &[u8]) -> Result<Vec<u8>> {
        match self {
            Compression::None => Ok(input.to_vec()),
            Compression::Bzip2 => drain(BzDecoder::new(input)),
            Compression::Gzip => drain(GzDecoder::new(input)),
            #[cfg(feature = "zstd")]
            Compression::Zstd => drain(zstd::stream::read::Decoder::new(input).or_raise(|| ErrorKind::Encoder)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::Compression;
    use rstest::rstest;

    #[rstest]
    #[case(Compression::None)]
    #[case(Compression::Bzip2)]
    #[case(Compression::Gzip)]
    #[cfg_attr(feature = "zstd", case(Compression::Zstd))]
    fn test_unit_file_survives_packing(#[case] format: Compression) {
        let unit = br#"{"1":{"1":"In the beginning God created the heaven and the earth."}}"#;
        let packed = format.compress(unit).unwrap();
        assert_eq!(Compression::detect("genesis.json", &packed), format);
        assert_eq!(format.decompress(&packed).unwrap(), unit);
    }

    #[rstest]
    #[case(Compression::Bzip2)]
    #[case(Compression::Gzip)]
    #[cfg_attr(feature = "zstd", case(Compression::Zstd))]
    fn test_plain_json_is_not_compressed_data(#[case] format: Compression) {
        assert!(format.decompress(br#"{"1":"plain json"}"#).is_err());
    }

    #[test]
    fn test_empty_input() {
        let compressed = Compression::Gzip.compress(b"").unwrap();
        assert!(Compression::Gzip.decompress(&compressed).unwrap().is_empty());
    }
}
