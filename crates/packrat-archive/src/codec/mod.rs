//! Per-format codecs and the plumbing they share.
//!
//! Every codec exposes the same three operations: `compress`, `extract` and `analyze`.
//! [`ArchiveCodec`] dispatches over them with a total match on the format.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::data::options::{CompressRequest, ExtractRequest};
use crate::data::report::ArchiveInfo;
use crate::error::{Error, Operation, Result};
use crate::filter::PathFilter;
use crate::format::{ArchiveType, TarCompress};

pub mod gzip;
#[cfg(feature = "rar")]
pub mod rar;
pub mod tar;
pub mod zip;

pub use self::gzip::GzipCodec;
#[cfg(feature = "rar")]
pub use self::rar::RarCodec;
pub use self::tar::TarCodec;
pub use self::zip::ZipCodec;

pub enum ArchiveCodec {
    Zip(ZipCodec),
    Tar(TarCodec),
    Gzip(GzipCodec),
    #[cfg(feature = "rar")]
    Rar(RarCodec),
}

/// Pick the codec for a concrete archive type.
///
/// Returns `None` for [`ArchiveType::Auto`], and for RAR when the `rar` feature is off.
pub fn codec_for(archive_type: ArchiveType) -> Option<ArchiveCodec> {
    match archive_type {
        ArchiveType::Zip => Some(ArchiveCodec::Zip(ZipCodec)),
        ArchiveType::Tar => Some(ArchiveCodec::Tar(TarCodec::new(TarCompress::None))),
        ArchiveType::TarGz => Some(ArchiveCodec::Tar(TarCodec::new(TarCompress::Gzip))),
        ArchiveType::Gzip => Some(ArchiveCodec::Gzip(GzipCodec)),
        #[cfg(feature = "rar")]
        ArchiveType::Rar => Some(ArchiveCodec::Rar(RarCodec)),
        #[cfg(not(feature = "rar"))]
        ArchiveType::Rar => None,
        ArchiveType::Auto => None,
    }
}

impl ArchiveCodec {
    pub fn archive_type(&self) -> ArchiveType {
        match self {
            Self::Zip(_) => ArchiveType::Zip,
            Self::Tar(codec) => codec.archive_type(),
            Self::Gzip(_) => ArchiveType::Gzip,
            #[cfg(feature = "rar")]
            Self::Rar(_) => ArchiveType::Rar,
        }
    }

    pub fn compress(&self, request: &CompressRequest) -> Result<()> {
        match self {
            Self::Zip(codec) => codec.compress(request),
            Self::Tar(codec) => codec.compress(request),
            Self::Gzip(codec) => codec.compress(request),
            #[cfg(feature = "rar")]
            Self::Rar(codec) => codec.compress(request),
        }
    }

    pub fn extract(&self, request: &ExtractRequest) -> Result<()> {
        match self {
            Self::Zip(codec) => codec.extract(request),
            Self::Tar(codec) => codec.extract(request),
            Self::Gzip(codec) => codec.extract(request),
            #[cfg(feature = "rar")]
            Self::Rar(codec) => codec.extract(request),
        }
    }

    pub fn analyze(&self, path: &Path) -> Result<ArchiveInfo> {
        match self {
            Self::Zip(codec) => codec.analyze(path),
            Self::Tar(codec) => codec.analyze(path),
            Self::Gzip(codec) => codec.analyze(path),
            #[cfg(feature = "rar")]
            Self::Rar(codec) => codec.analyze(path),
        }
    }

    /// Re-read a freshly written archive end to end.
    pub fn verify(&self, path: &Path) -> Result<ArchiveInfo> {
        match self {
            Self::Gzip(codec) => codec.verify(path),
            _ => self.analyze(path),
        }
    }
}

/// A filesystem entry selected for compression.
pub(crate) struct SourceEntry {
    pub path: PathBuf,
    /// Archive-relative, `/` separated.
    pub name: String,
    pub is_dir: bool,
    pub mode: u32,
    pub modified: Option<SystemTime>,
}

/// Walk `source` in name order, pruning excluded subtrees.
///
/// The root is never filtered and is not yielded itself; a plain file source yields one entry
/// named after the file. Directories below it are pruned by exclude patterns and files are
/// tested with [`PathFilter::should_include`]. Symlinks and special files are skipped.
pub(crate) fn walk_source<'a>(
    source: &'a Path,
    filter: &'a PathFilter,
) -> impl Iterator<Item = Result<SourceEntry>> + 'a {
    WalkDir::new(source)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(move |e| {
            if e.depth() == 0 {
                true
            } else if e.file_type().is_dir() {
                !filter.is_excluded(e.path())
            } else {
                filter.should_include(e.path())
            }
        })
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(source).to_path_buf();
                    return Some(Err(Error::Walk { path, source: e }));
                }
            };

            let file_type = entry.file_type();
            if entry.depth() == 0 && file_type.is_dir() {
                return None;
            }
            if !file_type.is_dir() && !file_type.is_file() {
                debug!(path = %entry.path().display(), "skipping non-regular entry");
                return None;
            }

            let name = if entry.depth() == 0 {
                entry.file_name().to_string_lossy().into_owned()
            } else {
                archive_name(entry.path().strip_prefix(source).unwrap_or(entry.path()))
            };
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    let path = entry.path().to_path_buf();
                    return Some(Err(Error::Walk { path, source: e }));
                }
            };

            Some(Ok(SourceEntry {
                path: entry.path().to_path_buf(),
                name,
                is_dir: file_type.is_dir(),
                mode: file_mode(&metadata),
                modified: metadata.modified().ok(),
            }))
        })
}

/// Join path components with `/` regardless of platform.
pub(crate) fn archive_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    if metadata.is_dir() {
        0o755
    } else if metadata.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}

/// Fail early with an open error when the compression source is missing.
pub(crate) fn check_source(source: &Path) -> Result<fs::Metadata> {
    fs::metadata(source).map_err(|e| Error::open(source, e))
}

pub(crate) fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir_all(path).map_err(|e| Error::DirectoryCreationFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Create `path` for writing, making missing parent directories first.
pub(crate) fn create_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    File::create(path).map_err(|e| Error::create(path, e))
}

/// Whether an existing `target` must be left alone.
pub(crate) fn skip_existing(target: &Path, overwrite: bool) -> bool {
    let skip = !overwrite && target.exists();
    if skip {
        info!(path = %target.display(), "file exists, skipping");
    }
    skip
}

/// Stream one entry's payload from the archive into `target`.
pub(crate) fn write_entry<R: Read>(
    mut reader: R,
    target: &Path,
    archive: &Path,
) -> Result<u64> {
    let mut out = create_file(target)?;
    let mut buf = [0u8; 8192];
    let mut written = 0u64;
    loop {
        let n = reader
            .read(&mut buf)
            .map_err(|e| read_error(Operation::Extract, archive, e))?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n])
            .map_err(|e| Error::write(target, e))?;
        written += n as u64;
    }
    out.flush().map_err(|e| Error::write(target, e))?;
    debug!(path = %target.display(), bytes = written, "extracted");
    Ok(written)
}

/// Classify an error raised while decoding an archive stream.
///
/// Errors carrying an OS error code are I/O failures; anything synthesized by a decoder means
/// the archive itself is damaged.
pub(crate) fn read_error(operation: Operation, archive: &Path, e: io::Error) -> Error {
    if e.raw_os_error().is_some() {
        Error::read(archive, e)
    } else {
        Error::corrupted(operation, archive, e)
    }
}

#[cfg(unix)]
pub(crate) fn apply_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|e| Error::write(path, e))
}

#[cfg(not(unix))]
pub(crate) fn apply_mode(path: &Path, mode: u32) -> Result<()> {
    if mode & 0o222 == 0 {
        let mut perms = fs::metadata(path).map_err(|e| Error::read(path, e))?.permissions();
        perms.set_readonly(true);
        fs::set_permissions(path, perms).map_err(|e| Error::write(path, e))?;
    }
    Ok(())
}

/// Size of the archive file on disk.
pub(crate) fn archive_len(path: &Path) -> Result<u64> {
    fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| Error::open(path, e))
}
