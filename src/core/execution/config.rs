//! Configuration for how the replicates of a trial are executed
//!
//! A single run is always single-threaded. These settings only decide
//! whether independent runs are executed one after another or fanned out
//! over a rayon thread pool.

use serde::{Deserialize, Serialize};

/// Enumeration of supported concurrency modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConcurrencyMode {
    /// Runs execute one after another on the calling thread
    #[default]
    Sequential,
    /// Runs execute in parallel using Rayon; output order is still by run index
    Rayon,
}

/// Configuration for replicate execution
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// The concurrency mode to use for execution
    pub concurrency_mode: ConcurrencyMode,
    /// The size of the thread pool for parallel execution
    /// Only relevant when concurrency_mode is Rayon; `None` uses rayon's default
    pub thread_pool_size: Option<usize>,
}

impl ExecutionConfig {
    /// Create a new execution configuration with default values
    ///
    /// Default configuration uses Sequential mode with no thread pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency mode
    pub fn with_concurrency(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }

    /// Set the thread pool size for parallel execution
    ///
    /// # Note
    /// This setting only affects execution when concurrency_mode is Rayon
    pub fn with_thread_pool_size(mut self, size: usize) -> Self {
        self.thread_pool_size = Some(size);
        self
    }
}
