//! Multi-format archive engine: compress, extract, analyze, compare and convert ZIP, TAR,
//! TAR.GZ, GZIP and (read-only) RAR archives.
//!
//! # Architecture
//!
//! - `detect.rs` - Type detection from extensions and magic bytes
//! - `filter.rs` - Include/exclude patterns for compression sources
//! - `codec/` - Per-format compress/extract/analyze
//! - `archive.rs` - Facade dispatching requests to codecs
//! - `compare.rs` - Metadata diff of two archives
//! - `convert.rs` - Extract-then-compress format conversion
//! - `sanitize.rs` - Zip-slip prevention for extracted entry names
//! - `data/` - Request and report types
//!
//! ```no_run
//! use packrat_archive::{ArchiveType, CompressRequest, compress, analyze};
//!
//! let request = CompressRequest::new("project", "project.tar.gz", ArchiveType::TarGz)
//!     .exclude(["*.log", "target/*"])
//!     .level(9);
//! compress(&request)?;
//! let info = analyze("project.tar.gz", ArchiveType::TarGz)?;
//! println!("{} files, {:.1}% saved", info.file_count, info.compression_ratio);
//! # Ok::<(), packrat_archive::Error>(())
//! ```

pub use archive::{analyze, analyze_auto, compress, extract, stats};
pub use compare::{ComparisonResult, DifferentFile, compare};
pub use config::Config;
pub use convert::convert;
pub use data::options::{CompressRequest, DEFAULT_COMPRESSION_LEVEL, ExtractRequest};
pub use data::report::{ArchiveInfo, FileEntry, LISTING_LIMIT, format_bytes};
pub use detect::detect;
pub use error::{ConvertPhase, Error, Operation, Result, Side};
pub use filter::{PathFilter, should_include};
pub use format::ArchiveType;

pub mod archive;
pub mod checksum;
pub mod codec;
pub mod compare;
pub mod config;
pub mod convert;
pub mod data;
pub mod detect;
mod error;
pub mod filter;
pub mod format;
mod sanitize;
