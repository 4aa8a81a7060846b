//! Compression and decompression of corpus data.
//!
//! Two places in the reader deal with compressed bytes:
//!
//! - **Unit files** in the corpus source may be stored compressed
//!   (`genesis.json.gz`). The format is detected from the file extension
//!   ([`Compression::from_path`]) and cross-checked against magic bytes
//!   ([`Compression::detect`]).
//! - **Cache payloads** can be packed in memory when a cache is configured to
//!   compress its values ([`Compression::compress`], [`Compression::decompress`]).
//!
//! Bzip2 and Gzip are always available; Zstd is behind the `zstd` feature.
//! Enabling the `serde` feature lets configuration files name a format by its
//! short name (`"gzip"`, `"bz2"`, ...).

mod construct;
pub mod error;
mod ops;
mod util;

/// A supported compression format.
///
/// Defaults to [`None`](Self::None) (uncompressed).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    /// Uncompressed
    #[default]
    None,
    /// Bzip2 compression (.bz2)
    Bzip2,
    /// Gzip compression (.gz)
    Gzip,
    /// Zstd compression (.zst)
    #[cfg(feature = "zstd")]
    Zstd,
}

#[cfg(test)]
mod tests {
    use crate::Compression;

    #[test]
    fn compression_default() {
        assert_eq!(Compression::default(), Compression::None);
    }
}
