//! Parallel batch consolidation using Rayon
//!
//! Consolidates many independent input files at once:
//! - One engine call per file, no shared state between them
//! - Configurable thread pool
//! - Individual error handling per file
//! - Progress reporting

use anyhow::Result;
use ipcon_engine::{consolidate_report, Consolidation};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::info;

use crate::input::collect_lines;

/// Batch processing result
#[derive(Debug, Clone)]
pub struct BatchResult {
    pub input: String,
    pub result: Result<Consolidation, String>,
}

/// Batch processor with parallel execution
pub struct BatchProcessor {
    thread_pool: rayon::ThreadPool,
    max_input_lines: usize,
}

impl BatchProcessor {
    /// Create a new batch processor
    ///
    /// # Arguments
    ///
    /// * `num_threads` - Number of threads (default: CPU cores)
    /// * `max_input_lines` - Per-file line limit
    pub fn new(num_threads: Option<usize>, max_input_lines: usize) -> Result<Self> {
        let num_threads = num_threads.unwrap_or_else(num_cpus::get);

        let thread_pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()?;

        Ok(Self {
            thread_pool,
            max_input_lines,
        })
    }

    /// Consolidate each file in parallel
    ///
    /// Results come back in the same order as `paths`.
    pub fn process_files(&self, paths: Vec<PathBuf>) -> Vec<BatchResult> {
        let total = paths.len();
        let processed = AtomicUsize::new(0);

        self.thread_pool.install(|| {
            paths
                .into_par_iter()
                .map(|path| {
                    let result = std::fs::read_to_string(&path)
                        .map_err(|e| format!("Failed to read file: {}", e))
                        .and_then(|content| self.consolidate_text(&content));

                    let count = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    info!(file = %path.display(), "processed {}/{} files", count, total);

                    BatchResult {
                        input: path.display().to_string(),
                        result,
                    }
                })
                .collect()
        })
    }

    /// Consolidate one input text
    fn consolidate_text(&self, content: &str) -> Result<Consolidation, String> {
        let lines = collect_lines(content, self.max_input_lines).map_err(|e| e.to_string())?;
        Ok(consolidate_report(&lines))
    }

    /// Get thread pool info
    pub fn thread_count(&self) -> usize {
        self.thread_pool.current_num_threads()
    }
}
