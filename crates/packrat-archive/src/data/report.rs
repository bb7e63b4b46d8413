use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::format::ArchiveType;

/// Maximum number of entries kept in [`ArchiveInfo::files`].
pub const LISTING_LIMIT: usize = 100;

/// Layout of [`FileEntry::modified`].
pub const MOD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One archive member as reported by analysis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Archive-relative path, `/` separated.
    pub name: String,
    pub size: u64,
    pub is_dir: bool,
    /// Formatted with [`MOD_TIME_FORMAT`]; empty when the archive carries no timestamp.
    pub modified: String,
}

/// Summary of an archive produced by `analyze`.
///
/// `file_count` and `total_size` cover every entry; `files` holds at most
/// [`LISTING_LIMIT`] of them, in archive order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchiveInfo {
    pub archive_type: ArchiveType,
    pub file_count: usize,
    pub total_size: u64,
    pub compressed_size: u64,
    pub compression_ratio: f64,
    pub files: Vec<FileEntry>,
    /// Lowercase hex SHA-256 of the whole archive file.
    pub checksum: String,
}

impl ArchiveInfo {
    pub(crate) fn new(archive_type: ArchiveType, compressed_size: u64, checksum: String) -> Self {
        Self {
            archive_type,
            file_count: 0,
            total_size: 0,
            compressed_size,
            compression_ratio: 0.0,
            files: Vec::new(),
            checksum,
        }
    }

    /// Account for one entry; only the first [`LISTING_LIMIT`] are listed.
    pub(crate) fn record(&mut self, entry: FileEntry) {
        self.file_count += 1;
        self.total_size += entry.size;
        if self.files.len() < LISTING_LIMIT {
            self.files.push(entry);
        }
    }

    /// Fill in `compression_ratio` from the size totals.
    pub(crate) fn finish(mut self) -> Self {
        self.compression_ratio = compression_ratio(self.compressed_size, self.total_size);
        self
    }
}

impl fmt::Display for ArchiveInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Archive Statistics:")?;
        writeln!(f, "  Type: {}", self.archive_type)?;
        writeln!(f, "  Files: {}", self.file_count)?;
        writeln!(f, "  Total Size: {} bytes", self.total_size)?;
        writeln!(f, "  Compressed Size: {} bytes", self.compressed_size)?;
        writeln!(f, "  Compression Ratio: {:.2}%", self.compression_ratio)?;
        write!(f, "  Checksum: {}", self.checksum)
    }
}

/// Percentage of space saved: `(1 - compressed / total) * 100`, or 0 for empty archives.
pub fn compression_ratio(compressed_size: u64, total_size: u64) -> f64 {
    if total_size == 0 {
        return 0.0;
    }
    (1.0 - compressed_size as f64 / total_size as f64) * 100.0
}

/// Render a byte count with a binary unit, e.g. `1.5 KB`.
pub fn format_bytes(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    if bytes < UNIT {
        return format!("{bytes} B");
    }
    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }
    let unit = ['K', 'M', 'G', 'T', 'P', 'E'][exp];
    format!("{:.1} {unit}B", bytes as f64 / div as f64)
}

pub(crate) fn format_unix_time(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|t| t.format(MOD_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

pub(crate) fn format_civil_time(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> String {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, second))
        .map(|t: NaiveDateTime| t.format(MOD_TIME_FORMAT).to_string())
        .unwrap_or_default()
}

/// Decode an MS-DOS packed date/time (date in the high word).
#[cfg_attr(not(feature = "rar"), allow(dead_code))]
pub(crate) fn format_dos_time(packed: u32) -> String {
    let date = packed >> 16;
    let time = packed & 0xFFFF;
    format_civil_time(
        ((date >> 9) & 0x7F) as i32 + 1980,
        (date >> 5) & 0x0F,
        date & 0x1F,
        (time >> 11) & 0x1F,
        (time >> 5) & 0x3F,
        (time & 0x1F) * 2,
    )
}
