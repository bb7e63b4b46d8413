//! Archive type detection from file names and magic bytes.
//!
//! The extension is authoritative: when it names a known format the file is never opened.
//! Otherwise up to [`HEADER_LEN`] bytes are read and matched against signatures in priority
//! order ZIP, GZIP (refined to TAR.GZ when the decompressed stream carries a tar header),
//! TAR, RAR. Unknown content yields [`ArchiveType::Auto`], which is not an error.

use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::format::ArchiveType;

/// Number of leading bytes inspected for signatures.
pub const HEADER_LEN: usize = 512;

const ZIP_MAGIC: &[u8] = &[0x50, 0x4B];
const GZIP_MAGIC: &[u8] = &[0x1F, 0x8B];
const RAR_MAGIC: &[u8] = b"Rar!";
const USTAR_OFFSET: usize = 257;
const USTAR_MAGIC: &[u8] = b"ustar";

/// Classify `path`, consulting its extension first and its content second.
pub fn detect(path: impl AsRef<Path>) -> Result<ArchiveType> {
    let path = path.as_ref();
    if let Some(archive_type) = from_extension(path) {
        return Ok(archive_type);
    }

    let mut file = File::open(path).map_err(|e| Error::open(path, e))?;
    let detected = detect_from_reader(&mut file).map_err(|e| Error::read(path, e))?;
    debug!(path = %path.display(), %detected, "detected archive type from content");
    Ok(detected)
}

/// Map a file name's extension to an archive type without touching the filesystem.
pub fn from_extension(path: impl AsRef<Path>) -> Option<ArchiveType> {
    let path = path.as_ref();
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "zip" => Some(ArchiveType::Zip),
        "tar" => Some(ArchiveType::Tar),
        "tgz" => Some(ArchiveType::TarGz),
        "gz" => {
            let name = path.to_string_lossy().to_ascii_lowercase();
            if name.ends_with(".tar.gz") {
                Some(ArchiveType::TarGz)
            } else {
                Some(ArchiveType::Gzip)
            }
        }
        "rar" => Some(ArchiveType::Rar),
        _ => None,
    }
}

/// Classify a header slice by its magic bytes.
///
/// Gzip content is reported as [`ArchiveType::Gzip`]; telling it apart from TAR.GZ needs the
/// decompressed stream, which [`detect_from_reader`] takes care of.
pub fn detect_format(data: &[u8]) -> ArchiveType {
    if data.starts_with(ZIP_MAGIC) {
        ArchiveType::Zip
    } else if data.starts_with(GZIP_MAGIC) {
        ArchiveType::Gzip
    } else if is_tar_header(data) {
        ArchiveType::Tar
    } else if data.starts_with(RAR_MAGIC) {
        ArchiveType::Rar
    } else {
        ArchiveType::Auto
    }
}

fn is_tar_header(data: &[u8]) -> bool {
    data.len() >= USTAR_OFFSET + USTAR_MAGIC.len()
        && &data[USTAR_OFFSET..USTAR_OFFSET + USTAR_MAGIC.len()] == USTAR_MAGIC
}

/// Read the header from `reader` and classify it, peeking into gzip streams for a tar header.
///
/// The reader is rewound before returning.
pub fn detect_from_reader<R: Read + Seek>(reader: &mut R) -> io::Result<ArchiveType> {
    let header = read_header(&mut *reader)?;
    let mut detected = detect_format(&header);

    if detected == ArchiveType::Gzip {
        reader.rewind()?;
        let decoder = flate2::read::GzDecoder::new(&mut *reader);
        // a stream that fails to decompress stays plain GZIP
        if let Ok(inner) = read_header(decoder) {
            if is_tar_header(&inner) {
                detected = ArchiveType::TarGz;
            }
        }
    }

    reader.rewind()?;
    Ok(detected)
}

fn read_header<R: Read>(reader: R) -> io::Result<Vec<u8>> {
    let mut header = Vec::with_capacity(HEADER_LEN);
    reader.take(HEADER_LEN as u64).read_to_end(&mut header)?;
    Ok(header)
}
