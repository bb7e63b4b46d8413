use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::thread;

use packrat_archive::{CompressRequest, ExtractRequest};
use tracing::{debug, info, warn};

use crate::callbacks::BatchObserver;
use crate::error::{BatchError, Result};
use crate::options::BatchOptions;

/// One unit of batch work.
pub trait BatchItem: Sync {
    /// Path reported to observers for this item.
    fn label(&self) -> &Path;

    fn run(&self) -> packrat_archive::Result<()>;
}

impl BatchItem for CompressRequest {
    fn label(&self) -> &Path {
        &self.output
    }

    fn run(&self) -> packrat_archive::Result<()> {
        packrat_archive::compress(self)
    }
}

impl BatchItem for ExtractRequest {
    fn label(&self) -> &Path {
        &self.archive
    }

    fn run(&self) -> packrat_archive::Result<()> {
        packrat_archive::extract(self)
    }
}

pub type CompressBatch = BatchJob<CompressRequest>;
pub type ExtractBatch = BatchJob<ExtractRequest>;

/// An ordered list of items plus the policy and observer used to run them.
///
/// [`BatchJob::run`] returns one outcome per item, at the item's input index, however the
/// workers interleave. A failing or panicking item never stops its siblings.
pub struct BatchJob<T> {
    items: Vec<T>,
    options: BatchOptions,
    observer: Box<dyn BatchObserver>,
}

impl<T: BatchItem> BatchJob<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: items.into_iter().collect(),
            options: BatchOptions::default(),
            observer: Box::new(()),
        }
    }

    pub fn options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn observer(mut self, observer: impl BatchObserver + 'static) -> Self {
        self.observer = Box::new(observer);
        self
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn run(&self) -> Vec<Result<()>> {
        let total = self.items.len();
        info!(total, parallel = self.options.parallel, "starting batch");

        let results = if self.options.parallel && total > 1 {
            self.run_parallel()
        } else {
            self.run_sequential()
        };

        let failed = results.iter().filter(|r| r.is_err()).count();
        info!(total, failed, "batch finished");
        results
    }

    fn run_sequential(&self) -> Vec<Result<()>> {
        let total = self.items.len();
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| run_item(index, total, item, self.observer.as_ref()))
            .collect()
    }

    fn run_parallel(&self) -> Vec<Result<()>> {
        let total = self.items.len();
        let workers = self.options.worker_count(total);
        debug!(total, workers, "spawning batch workers");

        let (job_tx, job_rx) = crossbeam_channel::bounded(total);
        for index in 0..total {
            // capacity equals the item count and the receiver is alive
            if job_tx.send(index).is_err() {
                break;
            }
        }
        drop(job_tx);

        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let items = &self.items;
        let observer = self.observer.as_ref();
        thread::scope(|scope| {
            for worker in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for index in job_rx.iter() {
                        let outcome = run_item(index, total, &items[index], observer);
                        if result_tx.send((index, outcome)).is_err() {
                            break;
                        }
                    }
                    debug!(worker, "batch worker done");
                });
            }
        });
        drop(result_tx);

        let mut slots: Vec<Option<Result<()>>> = (0..total).map(|_| None).collect();
        for (index, outcome) in result_rx.iter() {
            slots[index] = Some(outcome);
        }
        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    Err(BatchError::Panicked {
                        index,
                        message: "worker exited without recording an outcome".to_string(),
                    })
                })
            })
            .collect()
    }
}

impl<T> fmt::Debug for BatchJob<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchJob")
            .field("items", &self.items.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn run_item<T: BatchItem>(
    index: usize,
    total: usize,
    item: &T,
    observer: &dyn BatchObserver,
) -> Result<()> {
    let label = item.label();
    observer.on_progress(index + 1, total, label);
    debug!(index, label = %label.display(), "running batch item");

    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| item.run())) {
        Ok(result) => result.map_err(BatchError::from),
        Err(payload) => Err(BatchError::Panicked {
            index,
            message: panic_message(payload.as_ref()),
        }),
    };

    match &outcome {
        Ok(()) => observer.on_complete(index, label),
        Err(e) => {
            warn!(index, label = %label.display(), error = %e, "batch item failed");
            observer.on_error(index, label, e);
        }
    }
    outcome
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use packrat_archive::Error;

    use crate::callbacks::BatchCallbacks;

    struct Probe {
        label: PathBuf,
        outcome: fn() -> packrat_archive::Result<()>,
    }

    impl Probe {
        fn ok(name: &str) -> Self {
            Self {
                label: PathBuf::from(name),
                outcome: || Ok(()),
            }
        }

        fn failing(name: &str) -> Self {
            Self {
                label: PathBuf::from(name),
                outcome: || Err(Error::InvalidInput("bad item".into())),
            }
        }

        fn panicking(name: &str) -> Self {
            Self {
                label: PathBuf::from(name),
                outcome: || panic!("codec exploded"),
            }
        }
    }

    impl BatchItem for Probe {
        fn label(&self) -> &Path {
            &self.label
        }

        fn run(&self) -> packrat_archive::Result<()> {
            (self.outcome)()
        }
    }

    fn mixed() -> Vec<Probe> {
        vec![
            Probe::ok("a"),
            Probe::failing("b"),
            Probe::panicking("c"),
            Probe::ok("d"),
        ]
    }

    fn check_mixed(results: &[Result<()>]) {
        assert_eq!(results.len(), 4);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(BatchError::Archive(Error::InvalidInput(_)))
        ));
        match &results[2] {
            Err(BatchError::Panicked { index, message }) => {
                assert_eq!(*index, 2);
                assert_eq!(message, "codec exploded");
            }
            other => panic!("expected a panic outcome, got {other:?}"),
        }
        assert!(results[3].is_ok());
    }

    #[test]
    fn sequential_isolates_failures() {
        check_mixed(&BatchJob::new(mixed()).run());
    }

    #[test]
    fn parallel_isolates_failures() {
        let job = BatchJob::new(mixed()).options(BatchOptions::parallel(3));
        check_mixed(&job.run());
    }

    #[test]
    fn sequential_callbacks_run_in_order() {
        let events = std::sync::Arc::new(Mutex::new(Vec::new()));
        let (p, e, c) = (events.clone(), events.clone(), events.clone());
        let callbacks = BatchCallbacks::new()
            .with_progress(move |i, total, _| p.lock().unwrap().push(format!("p{i}/{total}")))
            .with_error(move |i, _, _| e.lock().unwrap().push(format!("e{i}")))
            .with_complete(move |i, _| c.lock().unwrap().push(format!("c{i}")));

        BatchJob::new(vec![Probe::ok("a"), Probe::failing("b")])
            .observer(callbacks)
            .run();
        assert_eq!(*events.lock().unwrap(), vec!["p1/2", "c0", "p2/2", "e1"]);
    }

    #[test]
    fn parallel_callbacks_fire_once_per_item() {
        #[derive(Default)]
        struct Counts {
            progress: AtomicUsize,
            error: AtomicUsize,
            complete: AtomicUsize,
        }

        impl BatchObserver for std::sync::Arc<Counts> {
            fn on_progress(&self, _: usize, _: usize, _: &Path) {
                self.progress.fetch_add(1, Ordering::SeqCst);
            }

            fn on_error(&self, _: usize, _: &Path, _: &BatchError) {
                self.error.fetch_add(1, Ordering::SeqCst);
            }

            fn on_complete(&self, _: usize, _: &Path) {
                self.complete.fetch_add(1, Ordering::SeqCst);
            }
        }

        let counts = std::sync::Arc::new(Counts::default());
        let items: Vec<_> = (0..20)
            .map(|i| {
                if i % 5 == 0 {
                    Probe::failing("x")
                } else {
                    Probe::ok("y")
                }
            })
            .collect();
        let results = BatchJob::new(items)
            .options(BatchOptions::parallel(4))
            .observer(counts.clone())
            .run();

        assert_eq!(results.len(), 20);
        assert_eq!(counts.progress.load(Ordering::SeqCst), 20);
        assert_eq!(counts.error.load(Ordering::SeqCst), 4);
        assert_eq!(counts.complete.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn empty_batch() {
        let job: BatchJob<Probe> = BatchJob::new(Vec::new()).options(BatchOptions::parallel(2));
        assert!(job.is_empty());
        assert!(job.run().is_empty());
    }
}
