//! Batch orchestration of `packrat-archive` compress and extract requests.
//!
//! Items run one after another, or on a bounded pool of worker threads draining a shared
//! index queue. Each item's outcome lands at its input index, and failures are recorded per
//! item instead of aborting the run.
//!
//! ```no_run
//! use packrat_archive::{ArchiveType, CompressRequest};
//! use packrat_batch::{BatchCallbacks, BatchJob, BatchOptions};
//!
//! let requests = ["docs", "assets", "src"]
//!     .map(|dir| CompressRequest::new(dir, format!("{dir}.zip"), ArchiveType::Zip));
//! let results = BatchJob::new(requests)
//!     .options(BatchOptions::parallel(2))
//!     .observer(BatchCallbacks::new().with_complete(|i, label| {
//!         println!("#{i} wrote {}", label.display());
//!     }))
//!     .run();
//! assert_eq!(results.len(), 3);
//! ```

pub use callbacks::{BatchCallbacks, BatchObserver};
pub use error::{BatchError, Result};
pub use job::{BatchItem, BatchJob, CompressBatch, ExtractBatch};
pub use options::{BatchOptions, DEFAULT_MAX_WORKERS};

pub mod callbacks;
mod error;
pub mod job;
pub mod options;
