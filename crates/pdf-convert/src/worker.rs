//! Bounded pool for CPU-heavy codec work
//!
//! Jobs run on tokio's blocking threads; a semaphore caps how many run at
//! once. Each job reports back through its own oneshot channel.

use std::num::NonZeroUsize;
use std::sync::Arc;

use tokio::sync::{Semaphore, oneshot};

use crate::types::{ConvertError, Result};

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// A pool running at most `size` jobs at once (at least one)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Queue `job` on the pool.
    ///
    /// Must be called from within a tokio runtime. Dropping the returned
    /// handle before the job starts cancels it; a job that already started
    /// runs to completion and its result is discarded.
    pub fn dispatch<T, F>(&self, job: F) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let permits = Arc::clone(&self.permits);

        tokio::spawn(async move {
            let Ok(_permit) = permits.acquire_owned().await else {
                return;
            };
            if tx.is_closed() {
                log::debug!("Skipping job abandoned before it started");
                return;
            }
            let result = match tokio::task::spawn_blocking(job).await {
                Ok(result) => result,
                Err(e) => Err(ConvertError::from(e)),
            };
            let _ = tx.send(result);
        });

        JobHandle { rx }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        let size = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(4);
        Self::new(size)
    }
}

/// Pending result of a dispatched job
#[derive(Debug)]
pub struct JobHandle<T> {
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> JobHandle<T> {
    pub async fn join(self) -> Result<T> {
        self.rx.await.map_err(|_| ConvertError::WorkerGone)?
    }
}
