use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::format::ArchiveType;

/// Compression level used when a request does not set one.
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

/// A single compression job: pack `source` into `output` as `archive_type`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressRequest {
    pub source: PathBuf,
    pub output: PathBuf,
    pub archive_type: ArchiveType,
    pub exclude: Vec<String>,
    pub include: Vec<String>,
    /// 0..=9; each codec clamps or defaults values it cannot use.
    pub level: u32,
    pub verify: bool,
}

impl CompressRequest {
    pub fn new(
        source: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        archive_type: ArchiveType,
    ) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            archive_type,
            exclude: Vec::new(),
            include: Vec::new(),
            level: DEFAULT_COMPRESSION_LEVEL,
            verify: false,
        }
    }

    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_path(&self.source, "source path")?;
        require_path(&self.output, "output path")
    }
}

/// A single extraction job: unpack `archive` into `destination`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub archive: PathBuf,
    pub destination: PathBuf,
    pub archive_type: ArchiveType,
    pub overwrite: bool,
    pub preserve_permissions: bool,
}

impl ExtractRequest {
    pub fn new(
        archive: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        archive_type: ArchiveType,
    ) -> Self {
        Self {
            archive: archive.into(),
            destination: destination.into(),
            archive_type,
            overwrite: false,
            preserve_permissions: false,
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn preserve_permissions(mut self, preserve: bool) -> Self {
        self.preserve_permissions = preserve;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require_path(&self.archive, "archive path")?;
        require_path(&self.destination, "destination path")
    }
}

fn require_path(path: &Path, what: &str) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidInput(format!("{what} is empty")));
    }
    Ok(())
}
