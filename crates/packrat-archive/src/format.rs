use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Archive container kinds understood by the engine.
///
/// `Auto` is the "undetermined" sentinel: detection returns it for unknown content and the
/// facade treats it as a no-op for compress/extract and as an error for analysis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchiveType {
    Zip,
    Tar,
    TarGz,
    Gzip,
    Rar,
    Auto,
}

impl ArchiveType {
    pub const ALL: [ArchiveType; 6] = [
        Self::Zip,
        Self::Tar,
        Self::TarGz,
        Self::Gzip,
        Self::Rar,
        Self::Auto,
    ];

    /// Whether the engine can write archives of this type.
    pub fn supports_compression(self) -> bool {
        matches!(self, Self::Zip | Self::Tar | Self::TarGz | Self::Gzip)
    }

    /// Canonical file extension, without the leading dot.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Self::Zip => Some("zip"),
            Self::Tar => Some("tar"),
            Self::TarGz => Some("tar.gz"),
            Self::Gzip => Some("gz"),
            Self::Rar => Some("rar"),
            Self::Auto => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "ZIP",
            Self::Tar => "TAR",
            Self::TarGz => "TAR.GZ",
            Self::Gzip => "GZIP",
            Self::Rar => "RAR",
            Self::Auto => "AUTO",
        }
    }
}

impl fmt::Display for ArchiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zip" => Ok(Self::Zip),
            "tar" => Ok(Self::Tar),
            "tar.gz" | "targz" | "tgz" => Ok(Self::TarGz),
            "gzip" | "gz" => Ok(Self::Gzip),
            "rar" => Ok(Self::Rar),
            "auto" => Ok(Self::Auto),
            other => Err(Error::InvalidInput(format!("unknown archive type '{other}'"))),
        }
    }
}

/// Compression layer wrapped around a tar stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TarCompress {
    None,
    Gzip,
}

impl TarCompress {
    pub fn archive_type(self) -> ArchiveType {
        match self {
            Self::None => ArchiveType::Tar,
            Self::Gzip => ArchiveType::TarGz,
        }
    }

    /// Wrap a reader with the matching decoder. Gzip input may hold several members.
    pub fn decoder<R: Read>(self, reader: R) -> Decoder<R> {
        match self {
            Self::None => Decoder::Passthrough(reader),
            Self::Gzip => {
                Decoder::Gzip(Box::new(flate2::read::MultiGzDecoder::new(reader)))
            }
        }
    }

    /// Wrap a writer with the matching encoder at `level` (clamped to 0..=9).
    pub fn encoder<W: Write>(self, writer: W, level: u32) -> Encoder<W> {
        match self {
            Self::None => Encoder::Passthrough(writer),
            Self::Gzip => Encoder::Gzip(Box::new(flate2::write::GzEncoder::new(
                writer,
                gzip_level(level),
            ))),
        }
    }
}

/// Gzip levels outside 0..=9 are clamped rather than rejected.
pub(crate) fn gzip_level(level: u32) -> flate2::Compression {
    flate2::Compression::new(level.min(9))
}

/// Decoder wrapper for tar decompression.
#[derive(Debug)]
pub enum Decoder<R> {
    Passthrough(R),
    Gzip(Box<flate2::read::MultiGzDecoder<R>>),
}

impl<R: Read> Read for Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Passthrough(r) => r.read(buf),
            Self::Gzip(d) => d.read(buf),
        }
    }
}

/// Encoder wrapper for tar compression.
pub enum Encoder<W: Write> {
    Passthrough(W),
    Gzip(Box<flate2::write::GzEncoder<W>>),
}

impl<W: Write> Encoder<W> {
    /// Flush any compression trailer and hand back the inner writer.
    pub fn finish(self) -> std::io::Result<W> {
        match self {
            Self::Passthrough(w) => Ok(w),
            Self::Gzip(e) => e.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Passthrough(w) => w.write(buf),
            Self::Gzip(e) => e.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Passthrough(w) => w.flush(),
            Self::Gzip(e) => e.flush(),
        }
    }
}
