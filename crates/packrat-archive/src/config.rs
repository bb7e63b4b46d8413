//! TOML defaults applied to new compress and extract requests.
//!
//! ```toml
//! [compress]
//! level = 9
//! verify = true
//! exclude = ["*.log", "target/*"]
//!
//! [extract]
//! overwrite = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::options::{CompressRequest, DEFAULT_COMPRESSION_LEVEL, ExtractRequest};
use crate::error::{Error, Result};
use crate::format::ArchiveType;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub compress: CompressDefaults,
    pub extract: ExtractDefaults,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressDefaults {
    pub level: u32,
    pub verify: bool,
    pub exclude: Vec<String>,
    pub include: Vec<String>,
}

impl Default for CompressDefaults {
    fn default() -> Self {
        Self {
            level: DEFAULT_COMPRESSION_LEVEL,
            verify: false,
            exclude: Vec::new(),
            include: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractDefaults {
    pub overwrite: bool,
    pub preserve_permissions: bool,
}

impl Default for ExtractDefaults {
    fn default() -> Self {
        Self {
            overwrite: false,
            preserve_permissions: true,
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        Self::from_toml_str(&text)
    }

    pub fn compress_request(
        &self,
        source: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
        archive_type: ArchiveType,
    ) -> CompressRequest {
        let defaults = &self.compress;
        CompressRequest::new(source, output, archive_type)
            .exclude(defaults.exclude.iter().cloned())
            .include(defaults.include.iter().cloned())
            .level(defaults.level)
            .verify(defaults.verify)
    }

    pub fn extract_request(
        &self,
        archive: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        archive_type: ArchiveType,
    ) -> ExtractRequest {
        ExtractRequest::new(archive, destination, archive_type)
            .overwrite(self.extract.overwrite)
            .preserve_permissions(self.extract.preserve_permissions)
    }
}
