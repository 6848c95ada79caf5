//! Rayon thread pool configuration
//!
//! The spatial reductions of the plotter run on the global Rayon pool;
//! this wires the `--threads` CLI flag into it.

use crate::errors::{ClimaPrepError, Result};
use rayon::ThreadPoolBuilder;

/// Configuration for parallel processing
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    /// Create a new parallel configuration
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Create a configuration that uses all available CPU cores
    pub fn all_cores() -> Self {
        Self {
            num_threads: Some(num_cpus::get()),
        }
    }

    /// Set up the global Rayon thread pool with the specified configuration.
    ///
    /// A no-op when no thread count was requested; the default pool is
    /// used in that case.
    pub fn setup_global_pool(&self) -> Result<()> {
        if let Some(num_threads) = self.num_threads {
            ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build_global()
                .map_err(|e| {
                    ClimaPrepError::ThreadPoolError(format!(
                        "Failed to initialize thread pool with {} threads: {}",
                        num_threads, e
                    ))
                })?;
            log::info!("configured parallel processing with {} threads", num_threads);
        }
        Ok(())
    }

    /// Get the current number of threads being used
    pub fn current_threads(&self) -> usize {
        rayon::current_num_threads()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_thread_count() {
        assert!(ParallelConfig::default().num_threads.is_none());
    }

    #[test]
    fn all_cores_matches_cpu_count() {
        assert_eq!(ParallelConfig::all_cores().num_threads, Some(num_cpus::get()));
    }
}
