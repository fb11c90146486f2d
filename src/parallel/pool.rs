//! Thread sizing for finalist estimation. A request may pin the worker count;
//! otherwise estimation shares Rayon's global pool.

use std::num::NonZeroUsize;

use rayon::ThreadPoolBuilder;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerPool {
    /// `None` runs on the global pool (all cores).
    threads: Option<NonZeroUsize>,
}

impl WorkerPool {
    /// `0` means all cores.
    pub fn with_workers(workers: usize) -> Self {
        Self {
            threads: NonZeroUsize::new(workers),
        }
    }

    /// Pool for a request's `workers` option.
    pub fn for_request(workers: Option<usize>) -> Self {
        Self::with_workers(workers.unwrap_or(0))
    }

    /// Threads the estimator will see inside [install](WorkerPool::install).
    pub fn threads(&self) -> usize {
        self.threads
            .map_or_else(rayon::current_num_threads, NonZeroUsize::get)
    }

    /// Run `f` with this pool's thread count. A pinned pool is built per call; if
    /// the OS refuses the threads, `f` runs on the global pool instead.
    pub fn install<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        let Some(threads) = self.threads else {
            return f();
        };
        match ThreadPoolBuilder::new().num_threads(threads.get()).build() {
            Ok(pool) => pool.install(f),
            Err(_) => f(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_pool_runs_with_requested_threads() {
        let pool = WorkerPool::for_request(Some(3));
        assert_eq!(pool.threads(), 3);
        assert_eq!(pool.install(rayon::current_num_threads), 3);
    }

    #[test]
    fn missing_or_zero_workers_use_the_global_pool() {
        assert_eq!(WorkerPool::for_request(None), WorkerPool::default());
        assert_eq!(WorkerPool::with_workers(0), WorkerPool::default());
        assert_eq!(WorkerPool::default().threads(), rayon::current_num_threads());
        assert_eq!(WorkerPool::default().install(|| 6 * 7), 42);
    }
}
