//! Bounded worker pool
//!
//! Replaces ad-hoc future chaining with explicit task submission: a fixed
//! number of workers drain a bounded queue. Both single-transfer dispatch and
//! batch fan-out go through the same pool. Submission blocks when the queue
//! is full; callers must not hold a database transaction while waiting for a
//! slot.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub struct WorkerPool {
    tx: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    pub fn new(workers: usize, queue_depth: usize) -> Self {
        let (tx, rx) = mpsc::channel::<Job>(queue_depth);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let mut handles = Vec::with_capacity(workers);
        for worker_id in 0..workers {
            let rx = rx.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    // Take one job at a time; the receiver lock is released
                    // before the job runs so the other workers keep draining
                    let job = { rx.lock().await.recv().await };
                    match job {
                        Some(job) => job.await,
                        None => {
                            debug!(worker_id = worker_id, "Worker pool channel closed");
                            break;
                        }
                    }
                }
            }));
        }

        info!(workers = workers, queue_depth = queue_depth, "Worker pool started");
        Self {
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(handles),
        }
    }

    /// Submit a job, blocking while the queue is full
    pub async fn submit<F>(&self, job: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let tx = self.tx.lock().unwrap().clone();
        match tx {
            Some(tx) => {
                if tx.send(Box::pin(job)).await.is_err() {
                    warn!("Worker pool shut down, job dropped");
                }
            }
            None => warn!("Worker pool shut down, job dropped"),
        }
    }

    /// Submit without blocking. Returns false when the queue is full or the
    /// pool is shut down; the caller falls back to the recovery sweep.
    pub fn try_submit<F>(&self, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let tx = self.tx.lock().unwrap().clone();
        match tx {
            Some(tx) => tx.try_send(Box::pin(job)).is_ok(),
            None => false,
        }
    }

    /// Drain and stop: close the queue, then wait for every worker to finish
    /// its in-flight job
    pub async fn shutdown(&self) {
        let tx = self.tx.lock().unwrap().take();
        drop(tx);

        let handles: Vec<_> = self.workers.lock().unwrap().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        info!("Worker pool drained and stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_jobs_complete() {
        let pool = WorkerPool::new(2, 16);
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let counter = counter.clone();
            pool.submit(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;
        }

        pool.shutdown().await;
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn test_parallelism_is_bounded() {
        let pool = WorkerPool::new(2, 16);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..6 {
            let running = running.clone();
            let peak = peak.clone();
            pool.submit(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            })
            .await;
        }

        pool.shutdown().await;
        assert!(peak.load(Ordering::SeqCst) <= 2, "pool must bound parallelism");
    }

    #[tokio::test]
    async fn test_try_submit_reports_full_queue() {
        let pool = WorkerPool::new(1, 1);

        // Occupy the worker and fill the queue
        pool.submit(async { tokio::time::sleep(Duration::from_millis(50)).await })
            .await;
        pool.submit(async { tokio::time::sleep(Duration::from_millis(50)).await })
            .await;

        assert!(!pool.try_submit(async {}));

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_dropped() {
        let pool = WorkerPool::new(1, 4);
        pool.shutdown().await;

        // Neither call may panic
        pool.submit(async {}).await;
        assert!(!pool.try_submit(async {}));
    }
}
