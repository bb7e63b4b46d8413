use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use std::thread;
use std::time::SystemTime;

use chrono::{Datelike, Timelike, Utc};
use tracing::debug;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::{
    apply_mode, archive_len, check_source, create_file, ensure_dir, skip_existing, walk_source,
    write_entry,
};
use crate::checksum::sha256_file;
use crate::data::options::{CompressRequest, ExtractRequest};
use crate::data::report::{ArchiveInfo, FileEntry, format_civil_time};
use crate::error::{Error, Operation, Result};
use crate::filter::PathFilter;
use crate::format::ArchiveType;
use crate::sanitize::resolve_entry;

/// ZIP archives, deflate-compressed. Only regular files are stored.
pub struct ZipCodec;

impl ZipCodec {
    pub fn compress(&self, request: &CompressRequest) -> Result<()> {
        check_source(&request.source)?;
        let filter = PathFilter::new(&request.exclude, &request.include);
        let output = &request.output;

        let mut writer = ZipWriter::new(BufWriter::new(create_file(output)?));
        let base = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(deflate_level(request.level));

        for entry in walk_source(&request.source, &filter) {
            let entry = entry?;
            if entry.is_dir {
                continue;
            }

            let mut options = base.unix_permissions(entry.mode);
            if let Some(time) = entry.modified.and_then(zip_time) {
                options = options.last_modified_time(time);
            }
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(|e| zip_error(Operation::Compress, output, e))?;

            let mut source = File::open(&entry.path).map_err(|e| Error::open(&entry.path, e))?;
            io::copy(&mut source, &mut writer).map_err(|e| Error::write(output, e))?;
            debug!(name = %entry.name, "stored");
        }

        let mut inner = writer
            .finish()
            .map_err(|e| zip_error(Operation::Compress, output, e))?;
        inner.flush().map_err(|e| Error::write(output, e))
    }

    pub fn extract(&self, request: &ExtractRequest) -> Result<()> {
        let path = &request.archive;
        let mut archive = open(path, Operation::Extract)?;

        for i in 0..archive.len() {
            let file = archive
                .by_index(i)
                .map_err(|e| zip_error(Operation::Extract, path, e))?;
            let target = resolve_entry(&request.destination, file.name())?;

            if file.is_dir() {
                ensure_dir(&target)?;
                continue;
            }
            if skip_existing(&target, request.overwrite) {
                continue;
            }

            let mode = file.unix_mode();
            write_entry(file, &target, path)?;
            if let Some(mode) = mode.filter(|_| request.preserve_permissions) {
                apply_mode(&target, mode)?;
            }
        }
        Ok(())
    }

    pub fn analyze(&self, path: &Path) -> Result<ArchiveInfo> {
        let compressed_size = archive_len(path)?;

        thread::scope(|scope| {
            let checksum = scope.spawn(|| sha256_file(path));

            let mut info = ArchiveInfo::new(ArchiveType::Zip, compressed_size, String::new());
            let listing = list(path, &mut info);
            info.checksum = checksum
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic))?;
            listing?;
            Ok(info.finish())
        })
    }
}

/// Record every central-directory entry into `info`, which caps the listing itself.
fn list(path: &Path, info: &mut ArchiveInfo) -> Result<()> {
    let mut archive = open(path, Operation::Analyze)?;
    for i in 0..archive.len() {
        let file = archive
            .by_index_raw(i)
            .map_err(|e| zip_error(Operation::Analyze, path, e))?;
        info.record(FileEntry {
            name: file.name().to_string(),
            size: file.size(),
            is_dir: file.is_dir(),
            modified: format_zip_time(file.last_modified()),
        });
    }
    Ok(())
}

fn open(path: &Path, operation: Operation) -> Result<ZipArchive<BufReader<File>>> {
    let file = File::open(path).map_err(|e| Error::open(path, e))?;
    ZipArchive::new(BufReader::new(file)).map_err(|e| zip_error(operation, path, e))
}

fn zip_error(operation: Operation, path: &Path, e: ZipError) -> Error {
    match e {
        ZipError::Io(e) => super::read_error(operation, path, e),
        other => Error::corrupted(operation, path, other),
    }
}

/// Deflate accepts 1..=9; 0 falls back to the library default.
fn deflate_level(level: u32) -> Option<i64> {
    match level {
        0 => None,
        level => Some(i64::from(level.min(9))),
    }
}

fn zip_time(time: SystemTime) -> Option<zip::DateTime> {
    let time = chrono::DateTime::<Utc>::from(time);
    zip::DateTime::from_date_and_time(
        u16::try_from(time.year()).ok()?,
        time.month() as u8,
        time.day() as u8,
        time.hour() as u8,
        time.minute() as u8,
        time.second() as u8,
    )
    .ok()
}

// `last_modified` is optional in some zip releases and not in others
fn format_zip_time(time: impl Into<Option<zip::DateTime>>) -> String {
    time.into()
        .map(|t| {
            format_civil_time(
                i32::from(t.year()),
                u32::from(t.month()),
                u32::from(t.day()),
                u32::from(t.hour()),
                u32::from(t.minute()),
                u32::from(t.second()),
            )
        })
        .unwrap_or_default()
}
