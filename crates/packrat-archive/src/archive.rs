//! Entry points that dispatch requests to the matching codec.

use std::path::Path;

use tracing::{debug, info};

use crate::codec::{codec_for, ensure_dir};
use crate::data::options::{CompressRequest, ExtractRequest};
use crate::data::report::ArchiveInfo;
use crate::detect;
use crate::error::{Error, Result};
use crate::format::ArchiveType;

/// Compress `request.source` into `request.output`.
///
/// RAR always fails, before the request is even validated. [`ArchiveType::Auto`] is a no-op:
/// callers resolve the type with [`detect`](crate::detect::detect) first.
pub fn compress(request: &CompressRequest) -> Result<()> {
    if request.archive_type == ArchiveType::Rar {
        return Err(Error::UnsupportedCompression {
            format: ArchiveType::Rar,
        });
    }
    let Some(codec) = codec_for(request.archive_type) else {
        debug!(archive_type = %request.archive_type, "no codec, nothing to compress");
        return Ok(());
    };
    request.validate()?;

    info!(
        source = %request.source.display(),
        output = %request.output.display(),
        archive_type = %request.archive_type,
        "compressing"
    );
    codec.compress(request)?;

    if request.verify {
        let verified = codec.verify(&request.output).map_err(|e| Error::Verification {
            path: request.output.clone(),
            source: Box::new(e),
        })?;
        debug!(output = %request.output.display(), files = verified.file_count, "verified");
    }
    Ok(())
}

/// Extract `request.archive` into `request.destination`, creating the destination first.
///
/// [`ArchiveType::Auto`] is a no-op. RAR without the `rar` feature is an unsupported type.
pub fn extract(request: &ExtractRequest) -> Result<()> {
    let Some(codec) = codec_for(request.archive_type) else {
        if request.archive_type == ArchiveType::Rar {
            return Err(Error::UnsupportedType(ArchiveType::Rar));
        }
        debug!(archive_type = %request.archive_type, "no codec, nothing to extract");
        return Ok(());
    };
    request.validate()?;

    info!(
        archive = %request.archive.display(),
        destination = %request.destination.display(),
        archive_type = %request.archive_type,
        "extracting"
    );
    ensure_dir(&request.destination)?;
    codec.extract(request)
}

/// Analyze an archive of a known, concrete type.
pub fn analyze(path: impl AsRef<Path>, archive_type: ArchiveType) -> Result<ArchiveInfo> {
    let path = path.as_ref();
    let codec = codec_for(archive_type).ok_or(Error::UnsupportedType(archive_type))?;
    if path.as_os_str().is_empty() {
        return Err(Error::InvalidInput("archive path is empty".into()));
    }
    codec.analyze(path)
}

/// Detect the type of `path`, then analyze it.
pub fn analyze_auto(path: impl AsRef<Path>) -> Result<ArchiveInfo> {
    let path = path.as_ref();
    let archive_type = detect::detect(path)?;
    analyze(path, archive_type)
}

/// Human-readable statistics block for an archive.
pub fn stats(path: impl AsRef<Path>, archive_type: ArchiveType) -> Result<String> {
    analyze(path, archive_type).map(|info| info.to_string())
}
