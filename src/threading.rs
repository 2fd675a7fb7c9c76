//! Worker budget and fork-join execution.
//!
//! An [`Executor`] owns the worker count `W` the engine partitions by, the
//! rayon pool that runs those partitions, and the [`VectorBackend`] that
//! performs the per-run primitive.

use std::env;
use std::sync::{Arc, OnceLock};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::backend::{PortableBackend, VectorBackend};
use crate::{Result, WORKERS_ENV};
#[cfg(feature = "parallel")]
use crate::MIN_PARALLEL_LEN;

/// Explicit parallelism configuration threaded through every engine call.
#[derive(Clone)]
pub struct Executor {
    workers: usize,
    #[cfg(feature = "parallel")]
    pool: Option<Arc<rayon::ThreadPool>>,
    backend: Arc<dyn VectorBackend>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("workers", &self.workers)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// An executor with exactly `workers` partitions (clamped to at least 1).
    ///
    /// # Errors
    /// [`NdError::ThreadPool`](crate::NdError::ThreadPool) if the rayon pool
    /// cannot be built.
    pub fn new(workers: usize) -> Result<Self> {
        let workers = workers.max(1);
        let exec = Self {
            workers,
            #[cfg(feature = "parallel")]
            pool: build_pool(workers)?,
            backend: Arc::new(PortableBackend),
        };
        tracing::debug!(workers, "executor created");
        Ok(exec)
    }

    /// A single-worker executor that runs on the calling thread.
    pub fn serial() -> Self {
        Self {
            workers: 1,
            #[cfg(feature = "parallel")]
            pool: None,
            backend: Arc::new(PortableBackend),
        }
    }

    /// Resolve the worker count from the environment.
    ///
    /// Uses [`WORKERS_ENV`] when it holds a positive integer, otherwise the
    /// host's logical core count.
    pub fn from_env() -> Result<Self> {
        let explicit = env::var(WORKERS_ENV)
            .ok()
            .and_then(|value| value.trim().parse::<usize>().ok())
            .filter(|&workers| workers > 0);
        let workers = match explicit {
            Some(workers) => {
                tracing::debug!(workers, source = WORKERS_ENV, "worker budget");
                workers
            }
            None => {
                let workers = std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1);
                tracing::debug!(workers, source = "available_parallelism", "worker budget");
                workers
            }
        };
        Self::new(workers)
    }

    /// The process-wide executor used by the method-style operations.
    ///
    /// Initialized on first use from [`Executor::from_env`]; falls back to
    /// [`Executor::serial`] if the pool cannot be built.
    pub fn global() -> &'static Executor {
        static GLOBAL: OnceLock<Executor> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            Self::from_env().unwrap_or_else(|err| {
                tracing::warn!(%err, "falling back to a serial executor");
                Self::serial()
            })
        })
    }

    /// Replace the vector backend.
    pub fn with_backend(mut self, backend: Arc<dyn VectorBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Worker budget `W`.
    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[inline]
    pub fn backend(&self) -> &dyn VectorBackend {
        &*self.backend
    }

    /// Run `f(i, chunk)` for every `chunk_len`-sized chunk of `dst`.
    ///
    /// Chunk `i` starts at `i * chunk_len`, so each call owns a statically
    /// disjoint region. Blocks until every chunk is written. Outputs shorter
    /// than [`MIN_PARALLEL_LEN`](crate::MIN_PARALLEL_LEN) run in order on the calling thread.
    pub(crate) fn for_each_partition<F>(&self, dst: &mut [f32], chunk_len: usize, f: F)
    where
        F: Fn(usize, &mut [f32]) + Send + Sync,
    {
        if dst.is_empty() || chunk_len == 0 {
            return;
        }

        #[cfg(feature = "parallel")]
        {
            if let Some(pool) = &self.pool {
                if dst.len() >= MIN_PARALLEL_LEN && dst.len() > chunk_len {
                    pool.install(|| {
                        dst.par_chunks_mut(chunk_len)
                            .enumerate()
                            .for_each(|(i, chunk)| f(i, chunk));
                    });
                    return;
                }
            }
        }

        for (i, chunk) in dst.chunks_mut(chunk_len).enumerate() {
            f(i, chunk);
        }
    }
}

impl Default for Executor {
    fn default() -> Self {
        Self::global().clone()
    }
}

#[cfg(feature = "parallel")]
fn build_pool(workers: usize) -> Result<Option<Arc<rayon::ThreadPool>>> {
    if workers <= 1 {
        return Ok(None);
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("strided-ndarray-{i}"))
        .build()
        .map(|pool| Some(Arc::new(pool)))
        .map_err(|err| crate::NdError::ThreadPool(err.to_string()))
}
