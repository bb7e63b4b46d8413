use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::format::ArchiveType;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported archive type: {0}")]
    UnsupportedType(ArchiveType),

    #[error(
        "{format} compression is not supported (proprietary format); use ZIP, TAR, or TAR.GZ instead"
    )]
    UnsupportedCompression { format: ArchiveType },

    #[error("failed to open '{path}': {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to create '{path}': {source}")]
    Create { path: PathBuf, source: io::Error },

    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to create directory: {path}: {source}")]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },

    #[error("failed to walk '{path}': {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("{operation} of '{path}' failed: archive is corrupted: {reason}")]
    Corrupted {
        operation: Operation,
        path: PathBuf,
        reason: String,
    },

    #[error("zip-slip attack detected: entry '{entry}' resolves to '{resolved}'")]
    ZipSlip { entry: PathBuf, resolved: PathBuf },

    #[error("failed to analyze {side} archive: {source}")]
    Compare {
        side: Side,
        #[source]
        source: Box<Error>,
    },

    #[error("conversion failed while {phase}: {source}")]
    Convert {
        phase: ConvertPhase,
        #[source]
        source: Box<Error>,
    },

    #[error("verification of '{path}' failed: {source}")]
    Verification {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),
}

impl Error {
    pub(crate) fn open(path: &Path, source: io::Error) -> Self {
        Self::Open {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn create(path: &Path, source: io::Error) -> Self {
        Self::Create {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn read(path: &Path, source: io::Error) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write(path: &Path, source: io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn corrupted(operation: Operation, path: &Path, reason: impl fmt::Display) -> Self {
        Self::Corrupted {
            operation,
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// The codec operation an error occurred in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Compress,
    Extract,
    Analyze,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Compress => "compression",
            Self::Extract => "extraction",
            Self::Analyze => "analysis",
        })
    }
}

/// Which archive of a comparison failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::First => "first",
            Self::Second => "second",
        })
    }
}

/// Which half of a conversion failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvertPhase {
    Extract,
    Compress,
}

impl fmt::Display for ConvertPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Extract => "extracting the source archive",
            Self::Compress => "creating the destination archive",
        })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rar_compression_message_names_alternatives() {
        let msg = Error::UnsupportedCompression {
            format: ArchiveType::Rar,
        }
        .to_string();
        assert!(msg.contains("RAR compression is not supported"));
        assert!(msg.contains("ZIP, TAR, or TAR.GZ"));
    }

    #[test]
    fn corrupted_names_operation_and_path() {
        let err = Error::corrupted(Operation::Analyze, Path::new("a.zip"), "bad header");
        assert_eq!(
            err.to_string(),
            "analysis of 'a.zip' failed: archive is corrupted: bad header"
        );
    }

    #[test]
    fn compare_error_names_side() {
        let err = Error::Compare {
            side: Side::Second,
            source: Box::new(Error::UnsupportedType(ArchiveType::Auto)),
        };
        assert!(err.to_string().starts_with("failed to analyze second archive"));
    }
}
