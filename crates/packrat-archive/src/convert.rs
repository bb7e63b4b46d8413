//! Format conversion by extracting into a staging directory and recompressing it.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::archive::{compress, extract};
use crate::data::options::{CompressRequest, ExtractRequest};
use crate::detect;
use crate::error::{ConvertPhase, Error, Result};
use crate::format::ArchiveType;

/// Compression level used for the recompressed archive.
pub const CONVERT_LEVEL: u32 = 5;

const STAGING_SUFFIX: &str = ".tmp";

/// Convert `source` into `destination`.
///
/// An [`ArchiveType::Auto`] source type is detected from the file, and content that matches
/// no known format is rejected; an `Auto` destination type is taken from the destination's
/// extension. The staging directory `<destination>.tmp` is
/// cleared before use and removed afterwards whether or not the conversion succeeds.
pub fn convert(
    source: impl AsRef<Path>,
    destination: impl AsRef<Path>,
    source_type: ArchiveType,
    destination_type: ArchiveType,
) -> Result<()> {
    let source = source.as_ref();
    let destination = destination.as_ref();

    let source_type = match source_type {
        ArchiveType::Auto => detect::detect(source).map_err(|e| Error::Convert {
            phase: ConvertPhase::Extract,
            source: Box::new(e),
        })?,
        concrete => concrete,
    };
    // extracting Auto is a no-op, which would silently produce an empty archive
    if source_type == ArchiveType::Auto {
        return Err(Error::Convert {
            phase: ConvertPhase::Extract,
            source: Box::new(Error::UnsupportedType(ArchiveType::Auto)),
        });
    }
    let destination_type = match destination_type {
        ArchiveType::Auto => detect::from_extension(destination).ok_or_else(|| {
            Error::InvalidInput(format!(
                "cannot infer an archive type from '{}'",
                destination.display()
            ))
        })?,
        concrete => concrete,
    };

    info!(
        source = %source.display(),
        destination = %destination.display(),
        from = %source_type,
        to = %destination_type,
        "converting"
    );

    let staging = Staging::new(destination)?;
    let extract_request = ExtractRequest::new(source, staging.path(), source_type)
        .overwrite(true)
        .preserve_permissions(true);
    extract(&extract_request).map_err(|e| Error::Convert {
        phase: ConvertPhase::Extract,
        source: Box::new(e),
    })?;

    let compress_source = match destination_type {
        // a gzip stream holds one file; use it when the staging area has exactly one
        ArchiveType::Gzip => {
            single_file(staging.path())?.unwrap_or_else(|| staging.path().to_path_buf())
        }
        _ => staging.path().to_path_buf(),
    };
    let compress_request = CompressRequest::new(compress_source, destination, destination_type)
        .level(CONVERT_LEVEL);
    compress(&compress_request).map_err(|e| Error::Convert {
        phase: ConvertPhase::Compress,
        source: Box::new(e),
    })
}

fn single_file(dir: &Path) -> Result<Option<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|e| Error::read(dir, e))? {
        let entry = entry.map_err(|e| Error::read(dir, e))?;
        files.push(entry.path());
    }
    Ok(match files.as_slice() {
        [only] if only.is_file() => Some(only.clone()),
        _ => None,
    })
}

/// Staging directory removed on drop.
struct Staging(PathBuf);

impl Staging {
    fn new(destination: &Path) -> Result<Self> {
        let mut name = OsString::from(destination.as_os_str());
        name.push(STAGING_SUFFIX);
        let path = PathBuf::from(name);

        if path.exists() {
            debug!(path = %path.display(), "clearing stale staging directory");
            fs::remove_dir_all(&path).map_err(|e| Error::write(&path, e))?;
        }
        fs::create_dir_all(&path).map_err(|e| Error::DirectoryCreationFailed {
            path: path.clone(),
            source: e,
        })?;
        Ok(Self(path))
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for Staging {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.0) {
            warn!(path = %self.0.display(), error = %e, "failed to remove staging directory");
        }
    }
}
