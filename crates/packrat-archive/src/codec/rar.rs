use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;
use unrar::Archive;

use super::{apply_mode, archive_len, create_file, ensure_dir, skip_existing};
use crate::checksum::sha256_file;
use crate::data::options::{CompressRequest, ExtractRequest};
use crate::data::report::{ArchiveInfo, FileEntry, format_dos_time};
use crate::error::{Error, Operation, Result};
use crate::format::ArchiveType;
use crate::sanitize::resolve_entry;

/// Unix file-type bits; RAR archives made on Unix store `st_mode` in the attributes.
const UNIX_TYPE_MASK: u32 = 0o170000;

/// Read-only RAR support backed by the unrar library.
pub struct RarCodec;

impl RarCodec {
    pub fn compress(&self, _request: &CompressRequest) -> Result<()> {
        Err(Error::UnsupportedCompression {
            format: ArchiveType::Rar,
        })
    }

    pub fn extract(&self, request: &ExtractRequest) -> Result<()> {
        let path = &request.archive;
        let file = existing(path)?;
        let mut archive = Archive::new(&file)
            .open_for_processing()
            .map_err(|e| Error::corrupted(Operation::Extract, path, e))?;

        // `None` from read_header marks the end of the entry stream
        while let Some(header) = archive
            .read_header()
            .map_err(|e| Error::corrupted(Operation::Extract, path, e))?
        {
            let entry = header.entry();
            let name = entry_name(&entry.filename);
            let target = resolve_entry(&request.destination, &name)?;

            if entry.is_directory() {
                ensure_dir(&target)?;
                archive = header
                    .skip()
                    .map_err(|e| Error::corrupted(Operation::Extract, path, e))?;
                continue;
            }
            if skip_existing(&target, request.overwrite) {
                archive = header
                    .skip()
                    .map_err(|e| Error::corrupted(Operation::Extract, path, e))?;
                continue;
            }

            let attr = entry.file_attr;
            let (data, next) = header
                .read()
                .map_err(|e| Error::corrupted(Operation::Extract, path, e))?;
            archive = next;

            create_file(&target)?
                .write_all(&data)
                .map_err(|e| Error::write(&target, e))?;
            debug!(path = %target.display(), bytes = data.len(), "extracted");

            if request.preserve_permissions && attr & UNIX_TYPE_MASK != 0 {
                apply_mode(&target, attr)?;
            }
        }
        Ok(())
    }

    pub fn analyze(&self, path: &Path) -> Result<ArchiveInfo> {
        let compressed_size = archive_len(path)?;
        let checksum = sha256_file(path)?;
        let mut info = ArchiveInfo::new(ArchiveType::Rar, compressed_size, checksum);

        let file = existing(path)?;
        let listing = Archive::new(&file)
            .open_for_listing()
            .map_err(|e| Error::corrupted(Operation::Analyze, path, e))?;
        for header in listing {
            let header = header.map_err(|e| Error::corrupted(Operation::Analyze, path, e))?;
            info.record(FileEntry {
                name: entry_name(&header.filename),
                size: header.unpacked_size,
                is_dir: header.is_directory(),
                modified: format_dos_time(header.file_time),
            });
        }
        Ok(info.finish())
    }
}

/// The decoder reports a missing file as a generic open failure; check first so the error
/// names the path.
fn existing(path: &Path) -> Result<PathBuf> {
    fs::metadata(path).map_err(|e| Error::open(path, e))?;
    Ok(path.to_path_buf())
}

fn entry_name(filename: &Path) -> String {
    filename.to_string_lossy().replace('\\', "/")
}
