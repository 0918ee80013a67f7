//! Bounded worker pool running the network exchanges of a client.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::thread;

use log::debug;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinError, JoinHandle};

use crate::auth::transport::{CONNECT_TIMEOUT, READ_TIMEOUT};

/// Fixed set of worker threads backed by a multi-threaded tokio runtime.
///
/// At most `size` spawned futures run at once, the others wait for a permit.
/// The pool is owned by the client instead of borrowed from the caller, so
/// the blocking operations work from plain threads as well as from threads
/// that already run another runtime.
///
/// Dropping the pool lets every spawned task finish. Outside of async code
/// the drop waits for them, inside async code they are drained from a
/// separate thread and the drop returns immediately.
pub struct WorkerPool {
    /// Taken on drop to hand over to the shutdown.
    runtime: Option<Runtime>,
    handle: Handle,
    size: usize,
    permits: Arc<Semaphore>,
    /// Cloned into every task, the channel closes once all tasks are gone.
    in_flight: mpsc::Sender<()>,
    drained: mpsc::Receiver<()>,
}

impl WorkerPool {
    /// Create a new [WorkerPool] with `size` worker threads (at least 1).
    pub fn new(size: usize) -> io::Result<Self> {
        let size = size.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(size)
            .thread_name("teealloy-worker")
            .enable_all()
            .build()?;
        let handle = runtime.handle().clone();
        let (in_flight, drained) = mpsc::channel(1);
        debug!("started worker pool with {} threads", size);

        Ok(WorkerPool {
            runtime: Some(runtime),
            handle,
            size,
            permits: Arc::new(Semaphore::new(size)),
            in_flight,
            drained,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Runs `future` on the pool and returns immediately.
    ///
    /// The future starts once one of the `size` permits is free.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let guard = self.in_flight.clone();
        let permits = Arc::clone(&self.permits);
        self.handle.spawn(async move {
            let _guard = guard;
            // The semaphore is never closed
            let _permit = permits.acquire_owned().await.ok();
            future.await
        })
    }

    /// Runs `future` on the pool and parks the calling thread until it ends.
    ///
    /// Must not be called from a pool thread: with every worker waiting on
    /// itself the pool deadlocks.
    pub fn run<F>(&self, future: F) -> Result<F::Output, JoinError>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        futures::executor::block_on(self.spawn(future))
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let Some(runtime) = self.runtime.take() else {
            return;
        };

        // Every task holds a sender, recv yields None once the last one is gone
        let (closed_tx, closed_rx) = mpsc::channel(1);
        drop(std::mem::replace(&mut self.in_flight, closed_tx));
        let mut drained = std::mem::replace(&mut self.drained, closed_rx);

        let shutdown = move || {
            runtime.block_on(drained.recv());
            runtime.shutdown_timeout(CONNECT_TIMEOUT + READ_TIMEOUT);
            debug!("stopped worker pool");
        };

        // A runtime cannot block while dropped from async code
        if Handle::try_current().is_ok() {
            thread::spawn(shutdown);
        } else {
            shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_size_is_at_least_one() {
        let pool = WorkerPool::new(0).unwrap();
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn test_run_returns_output() {
        let pool = WorkerPool::new(2).unwrap();
        assert_eq!(pool.run(async { 40 + 2 }).unwrap(), 42);
    }

    #[test]
    fn test_run_reports_panics() {
        let pool = WorkerPool::new(1).unwrap();
        let result: Result<u8, JoinError> = pool.run(async { panic!("boom") });
        assert!(result.unwrap_err().is_panic());
    }

    #[test]
    fn test_spawn_runs_on_worker_thread() {
        let pool = WorkerPool::new(1).unwrap();
        let (tx, rx) = mpsc::channel();

        pool.spawn(async move {
            let name = std::thread::current().name().map(str::to_owned);
            tx.send(name).unwrap();
        });

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("teealloy-worker"));
    }

    #[test]
    fn test_drop_waits_for_spawned_tasks() {
        let pool = WorkerPool::new(1).unwrap();
        let (tx, rx) = mpsc::channel();

        pool.spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tx.send(()).unwrap();
        });
        drop(pool);

        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn test_spawn_runs_at_most_size_futures() {
        let pool = WorkerPool::new(2).unwrap();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();

        for _ in 0..6 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            let tx = tx.clone();
            pool.spawn(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                tx.send(()).unwrap();
            });
        }
        drop(tx);

        assert_eq!(rx.iter().take(6).count(), 6);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_drop_inside_runtime_does_not_panic() {
        let pool = WorkerPool::new(1).unwrap();
        drop(pool);
    }

    #[tokio::test]
    async fn test_drop_inside_runtime_finishes_spawned_tasks() {
        let pool = WorkerPool::new(1).unwrap();
        let (tx, rx) = mpsc::channel();

        pool.spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(()).unwrap();
        });
        drop(pool);

        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}
