//! Metadata-only diffing of two archives.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::archive::analyze;
use crate::data::report::{ArchiveInfo, FileEntry};
use crate::error::{Error, Result, Side};
use crate::format::ArchiveType;

/// A name present in both archives whose size or modification time differs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DifferentFile {
    pub name: String,
    pub size_first: u64,
    pub size_second: u64,
    pub modified_first: String,
    pub modified_second: String,
}

/// Result of [`compare`]. All lists are sorted by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonResult {
    pub only_in_first: Vec<String>,
    pub only_in_second: Vec<String>,
    pub in_both: Vec<String>,
    pub different: Vec<DifferentFile>,
    pub summary: String,
}

impl ComparisonResult {
    /// True when neither side has unique names and nothing differs.
    pub fn is_identical(&self) -> bool {
        self.only_in_first.is_empty() && self.only_in_second.is_empty() && self.different.is_empty()
    }
}

/// Analyze both archives and diff their listings by name, size and modification time.
///
/// Content bytes are never compared. Only the entries present in each listing take part,
/// so archives beyond the listing limit are compared on their first entries.
pub fn compare(
    first: impl AsRef<Path>,
    first_type: ArchiveType,
    second: impl AsRef<Path>,
    second_type: ArchiveType,
) -> Result<ComparisonResult> {
    let first = analyze(first, first_type).map_err(|e| Error::Compare {
        side: Side::First,
        source: Box::new(e),
    })?;
    let second = analyze(second, second_type).map_err(|e| Error::Compare {
        side: Side::Second,
        source: Box::new(e),
    })?;
    Ok(compare_info(&first, &second))
}

/// Diff two analysis snapshots.
pub fn compare_info(first: &ArchiveInfo, second: &ArchiveInfo) -> ComparisonResult {
    let first = by_name(&first.files);
    let second = by_name(&second.files);
    let mut result = ComparisonResult::default();

    for (name, a) in &first {
        let Some(b) = second.get(name) else {
            result.only_in_first.push(name.to_string());
            continue;
        };
        result.in_both.push(name.to_string());
        if a.size != b.size || a.modified != b.modified {
            result.different.push(DifferentFile {
                name: name.to_string(),
                size_first: a.size,
                size_second: b.size,
                modified_first: a.modified.clone(),
                modified_second: b.modified.clone(),
            });
        }
    }
    result.only_in_second = second
        .keys()
        .filter(|name| !first.contains_key(*name))
        .map(|name| name.to_string())
        .collect();

    result.summary = format!(
        "Comparison Summary:\n  Files in both: {}\n  Only in first: {}\n  Only in second: {}\n  Different: {}",
        result.in_both.len(),
        result.only_in_first.len(),
        result.only_in_second.len(),
        result.different.len(),
    );
    result
}

// later duplicates win, matching a plain map insert
fn by_name(files: &[FileEntry]) -> BTreeMap<&str, &FileEntry> {
    files.iter().map(|f| (f.name.as_str(), f)).collect()
}
