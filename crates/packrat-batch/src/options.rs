use serde::{Deserialize, Serialize};

/// Worker count used when none is configured.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Execution policy for a batch run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOptions {
    pub parallel: bool,
    /// Upper bound on concurrent workers; 0 means [`DEFAULT_MAX_WORKERS`].
    pub max_workers: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            parallel: false,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl BatchOptions {
    pub fn sequential() -> Self {
        Self::default()
    }

    pub fn parallel(max_workers: usize) -> Self {
        Self {
            parallel: true,
            max_workers,
        }
    }

    /// Workers actually spawned for `jobs` items: never more than there are jobs.
    pub fn worker_count(&self, jobs: usize) -> usize {
        let configured = match self.max_workers {
            0 => DEFAULT_MAX_WORKERS,
            n => n,
        };
        configured.min(jobs).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = BatchOptions::default();
        assert!(!options.parallel);
        assert_eq!(options.max_workers, 4);
    }

    #[test]
    fn worker_count_bounds() {
        assert_eq!(BatchOptions::parallel(0).worker_count(10), 4);
        assert_eq!(BatchOptions::parallel(2).worker_count(3), 2);
        assert_eq!(BatchOptions::parallel(8).worker_count(3), 3);
        assert_eq!(BatchOptions::parallel(8).worker_count(0), 1);
    }

    #[test]
    fn deserializes_with_defaults() {
        let options: BatchOptions = toml::from_str("parallel = true").unwrap();
        assert_eq!(options, BatchOptions::parallel(4));
        let options: BatchOptions = toml::from_str("max_workers = 2").unwrap();
        assert!(!options.parallel);
        assert_eq!(options.max_workers, 2);
    }
}
