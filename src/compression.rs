//! Outer compression codec seam (gzip / legacy UNIX Z / none).
use std::io::{Read, Write};

use flate2::{read::GzDecoder, write::GzEncoder};
use log::warn;
use thiserror::Error;

use crate::error::FileError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid or empty compressed archive")]
    CorruptArchive,
    #[error("invalid compressed payload")]
    CorruptCompressedPayload,
}

impl From<Error> for FileError {
    fn from(e: Error) -> FileError {
        match e {
            Error::CorruptArchive => FileError::CorruptArchive,
            Error::CorruptCompressedPayload => FileError::CorruptCompressedPayload,
        }
    }
}

/// Outer compression scheme of an observation file container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    /// Plain readable content
    #[default]
    Plain,
    /// Gzip compressed container (`.gz`)
    Gzip,
    /// Legacy UNIX compress container (`.Z`)
    LegacyZ,
}

impl Compression {
    /// Scheme from the magic number, regardless of the file extension.
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes {
            [0x1f, 0x8b, ..] => Self::Gzip,
            [0x1f, 0x9d, ..] => Self::LegacyZ,
            _ => Self::Plain,
        }
    }
    /// Filename suffix of this scheme, leading dot included.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Plain => "",
            Self::Gzip => ".gz",
            Self::LegacyZ => ".Z",
        }
    }
}

impl std::str::FromStr for Compression {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | "none" => Ok(Self::Plain),
            "gz" | "gzip" => Ok(Self::Gzip),
            "Z" => Ok(Self::LegacyZ),
            _ => Err(Error::CorruptArchive),
        }
    }
}

/// Expose the readable content of a (possibly compressed) container.
/// Legacy Z containers are recognized but not decoded: the codec was
/// never ported and such archives must be recompressed upstream.
pub fn decompress(bytes: &[u8]) -> Result<(Vec<u8>, Compression), Error> {
    match Compression::detect(bytes) {
        Compression::Plain => Ok((bytes.to_vec(), Compression::Plain)),
        Compression::Gzip => {
            let mut buf = Vec::with_capacity(bytes.len() * 4);
            let mut decoder = GzDecoder::new(bytes);
            decoder
                .read_to_end(&mut buf)
                .map_err(|_| Error::CorruptArchive)?;
            if buf.is_empty() {
                return Err(Error::CorruptArchive);
            }
            Ok((buf, Compression::Gzip))
        },
        Compression::LegacyZ => {
            warn!("legacy .Z archives are not supported, recompress with gzip");
            Err(Error::CorruptArchive)
        },
    }
}

/// Wrap content into the requested container scheme.
pub fn compress(bytes: &[u8], scheme: Compression) -> Result<Vec<u8>, Error> {
    match scheme {
        Compression::Plain => Ok(bytes.to_vec()),
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder
                .write_all(bytes)
                .map_err(|_| Error::CorruptCompressedPayload)?;
            encoder.finish().map_err(|_| Error::CorruptCompressedPayload)
        },
        Compression::LegacyZ => {
            warn!("legacy .Z compression is not supported, writing gzip instead");
            compress(bytes, Compression::Gzip)
        },
    }
}
