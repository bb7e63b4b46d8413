use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use flate2::GzBuilder;
use flate2::read::MultiGzDecoder;
use tracing::debug;

use super::{archive_len, check_source, create_file, read_error, skip_existing, write_entry};
use crate::checksum::sha256_file;
use crate::data::options::{CompressRequest, ExtractRequest};
use crate::data::report::ArchiveInfo;
use crate::error::{Error, Operation, Result};
use crate::format::{ArchiveType, gzip_level};
use crate::sanitize::resolve_entry;

/// 10-byte header plus 8-byte trailer.
const MIN_GZIP_LEN: u64 = 18;

/// A single gzip-compressed file; there is no archive structure.
pub struct GzipCodec;

impl GzipCodec {
    pub fn compress(&self, request: &CompressRequest) -> Result<()> {
        let source = &request.source;
        let metadata = check_source(source)?;
        if metadata.is_dir() {
            return Err(Error::InvalidInput(format!(
                "GZIP compresses a single file, '{}' is a directory",
                source.display()
            )));
        }

        let mut builder = GzBuilder::new();
        if let Some(name) = source.file_name() {
            builder = builder.filename(name.to_string_lossy().as_bytes());
        }
        if let Some(secs) = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .and_then(|d| u32::try_from(d.as_secs()).ok())
        {
            builder = builder.mtime(secs);
        }

        let output = &request.output;
        let mut input = File::open(source).map_err(|e| Error::open(source, e))?;
        let mut encoder = builder.write(
            BufWriter::new(create_file(output)?),
            gzip_level(request.level),
        );
        io::copy(&mut input, &mut encoder).map_err(|e| Error::write(output, e))?;
        let mut writer = encoder.finish().map_err(|e| Error::write(output, e))?;
        writer.flush().map_err(|e| Error::write(output, e))
    }

    pub fn extract(&self, request: &ExtractRequest) -> Result<()> {
        let path = &request.archive;
        let file = File::open(path).map_err(|e| Error::open(path, e))?;
        let decoder = MultiGzDecoder::new(BufReader::new(file));

        let name = output_name(path, decoder.header().and_then(|h| h.filename()));
        let target = resolve_entry(&request.destination, &name)?;
        if skip_existing(&target, request.overwrite) {
            return Ok(());
        }
        write_entry(decoder, &target, path)?;
        Ok(())
    }

    /// Fast path: the uncompressed size comes from the ISIZE trailer (mod 2^32).
    ///
    /// For a stream of several concatenated members the trailer only describes the last one;
    /// [`GzipCodec::verify`] and extraction read every member.
    pub fn analyze(&self, path: &Path) -> Result<ArchiveInfo> {
        let compressed_size = archive_len(path)?;
        let uncompressed = read_trailer_size(path, compressed_size)?;
        let checksum = sha256_file(path)?;

        let mut info = ArchiveInfo::new(ArchiveType::Gzip, compressed_size, checksum);
        info.file_count = 1;
        info.total_size = uncompressed;
        Ok(info.finish())
    }

    /// Decompress the whole stream so the CRC and length trailer are checked, then analyze.
    pub fn verify(&self, path: &Path) -> Result<ArchiveInfo> {
        let file = File::open(path).map_err(|e| Error::open(path, e))?;
        let mut decoder = MultiGzDecoder::new(BufReader::new(file));
        let bytes = io::copy(&mut decoder, &mut io::sink())
            .map_err(|e| read_error(Operation::Analyze, path, e))?;
        debug!(path = %path.display(), bytes, "gzip stream verified");
        self.analyze(path)
    }
}

/// Name of the decompressed file.
///
/// A `.gz` suffix is stripped; failing that the name stored in the gzip header is used, and
/// as a last resort `.out` is appended to the archive name.
fn output_name(archive: &Path, stored: Option<&[u8]>) -> String {
    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem_len = file_name.len().saturating_sub(3);
    if file_name.is_char_boundary(stem_len)
        && file_name[stem_len..].eq_ignore_ascii_case(".gz")
        && stem_len > 0
    {
        return file_name[..stem_len].to_string();
    }

    let stored = stored
        .map(|raw| String::from_utf8_lossy(raw).into_owned())
        .and_then(|raw| {
            PathBuf::from(raw.replace('\\', "/"))
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .filter(|n| !n.is_empty());
    stored.unwrap_or_else(|| format!("{file_name}.out"))
}

fn read_trailer_size(path: &Path, len: u64) -> Result<u64> {
    let mut file = File::open(path).map_err(|e| Error::open(path, e))?;
    let mut magic = [0u8; 2];
    let too_short = len < MIN_GZIP_LEN;
    if too_short || file.read_exact(&mut magic).is_err() || magic != [0x1F, 0x8B] {
        return Err(Error::corrupted(
            Operation::Analyze,
            path,
            "missing gzip header",
        ));
    }

    let mut isize = [0u8; 4];
    file.seek(SeekFrom::End(-4))
        .and_then(|_| file.read_exact(&mut isize))
        .map_err(|e| Error::read(path, e))?;
    Ok(u64::from(u32::from_le_bytes(isize)))
}
