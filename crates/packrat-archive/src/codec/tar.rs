use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use tracing::debug;

use super::{
    apply_mode, archive_len, check_source, create_file, ensure_dir, read_error, skip_existing,
    walk_source, write_entry,
};
use crate::checksum::sha256_file;
use crate::data::options::{CompressRequest, ExtractRequest};
use crate::data::report::{ArchiveInfo, FileEntry, format_unix_time};
use crate::error::{Error, Operation, Result};
use crate::filter::PathFilter;
use crate::format::{ArchiveType, Decoder, TarCompress};
use crate::sanitize::resolve_entry;

/// Plain or gzip-wrapped tar streams. Directory entries are stored.
pub struct TarCodec {
    compress: TarCompress,
}

impl TarCodec {
    pub fn new(compress: TarCompress) -> Self {
        Self { compress }
    }

    pub fn archive_type(&self) -> ArchiveType {
        self.compress.archive_type()
    }

    pub fn compress(&self, request: &CompressRequest) -> Result<()> {
        check_source(&request.source)?;
        let filter = PathFilter::new(&request.exclude, &request.include);
        let output = &request.output;

        let writer = BufWriter::new(create_file(output)?);
        let mut builder = tar::Builder::new(self.compress.encoder(writer, request.level));
        builder.mode(tar::HeaderMode::Complete);

        for entry in walk_source(&request.source, &filter) {
            let entry = entry?;
            if entry.is_dir {
                builder
                    .append_dir(&entry.name, &entry.path)
                    .map_err(|e| Error::write(output, e))?;
            } else {
                let mut file =
                    File::open(&entry.path).map_err(|e| Error::open(&entry.path, e))?;
                builder
                    .append_file(&entry.name, &mut file)
                    .map_err(|e| Error::write(output, e))?;
            }
            debug!(name = %entry.name, dir = entry.is_dir, "stored");
        }

        let encoder = builder.into_inner().map_err(|e| Error::write(output, e))?;
        let mut writer = encoder.finish().map_err(|e| Error::write(output, e))?;
        writer.flush().map_err(|e| Error::write(output, e))
    }

    pub fn extract(&self, request: &ExtractRequest) -> Result<()> {
        let path = &request.archive;
        let mut archive = self.open(path)?;
        let entries = archive
            .entries()
            .map_err(|e| read_error(Operation::Extract, path, e))?;

        for entry in entries {
            let entry = entry.map_err(|e| read_error(Operation::Extract, path, e))?;
            let name = entry_name(&entry, Operation::Extract, path)?;
            let target = resolve_entry(&request.destination, &name)?;
            let kind = entry.header().entry_type();

            if kind.is_dir() {
                ensure_dir(&target)?;
            } else if kind.is_file() {
                // unread payloads are skipped by the entry iterator
                if skip_existing(&target, request.overwrite) {
                    continue;
                }
                let mode = entry.header().mode().ok();
                write_entry(entry, &target, path)?;
                if let Some(mode) = mode.filter(|_| request.preserve_permissions) {
                    apply_mode(&target, mode)?;
                }
            } else {
                debug!(name = %name, kind = ?kind, "ignoring unsupported entry");
            }
        }
        Ok(())
    }

    /// Hash the whole file, then re-read it from the start to list entries.
    pub fn analyze(&self, path: &Path) -> Result<ArchiveInfo> {
        let compressed_size = archive_len(path)?;
        let checksum = sha256_file(path)?;
        let mut info = ArchiveInfo::new(self.archive_type(), compressed_size, checksum);

        let mut archive = self.open(path)?;
        let entries = archive
            .entries()
            .map_err(|e| read_error(Operation::Analyze, path, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| read_error(Operation::Analyze, path, e))?;
            let header = entry.header();
            info.record(FileEntry {
                name: entry_name(&entry, Operation::Analyze, path)?,
                size: entry.size(),
                is_dir: header.entry_type().is_dir(),
                modified: header.mtime().map(format_unix_time).unwrap_or_default(),
            });
        }
        Ok(info.finish())
    }

    fn open(&self, path: &Path) -> Result<tar::Archive<Decoder<BufReader<File>>>> {
        let file = File::open(path).map_err(|e| Error::open(path, e))?;
        Ok(tar::Archive::new(self.compress.decoder(BufReader::new(file))))
    }
}

fn entry_name<R: Read>(
    entry: &tar::Entry<'_, R>,
    operation: Operation,
    archive: &Path,
) -> Result<String> {
    let path = entry
        .path()
        .map_err(|e| Error::corrupted(operation, archive, e))?;
    let name = path.to_string_lossy();
    Ok(name.trim_end_matches('/').to_string())
}
