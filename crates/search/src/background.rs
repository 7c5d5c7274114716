//! Bounded worker pool for CPU-bound search and ingestion work.
//!
//! A fixed set of named threads serves two FIFO lanes. The search lane is
//! always emptied before the ingest lane, so chunk decoding during an update
//! burst never holds up a query. Callers await each job's result with
//! [`WorkerPool::run`].

use kwindex_core::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::oneshot;
use tracing::error;

/// Lane a pool job is queued on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPriority {
    /// Chunk decoding during ingestion
    Ingest,
    /// Stage 1 / stage 2 of a search
    Search,
}

/// Pool metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Jobs waiting in either lane
    pub queue_depth: usize,
    /// Jobs a worker is executing right now
    pub active_jobs: usize,
    /// Jobs finished since the pool started, panicked ones included
    pub jobs_completed: u64,
    /// Worker threads the pool was started with
    pub worker_count: usize,
}

type Job = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct Lanes {
    search: VecDeque<Job>,
    ingest: VecDeque<Job>,
    active: usize,
    completed: u64,
    closed: bool,
}

impl Lanes {
    fn queued(&self) -> usize {
        self.search.len() + self.ingest.len()
    }

    fn next(&mut self) -> Option<Job> {
        self.search.pop_front().or_else(|| self.ingest.pop_front())
    }
}

struct Shared {
    lanes: Mutex<Lanes>,
    job_ready: Condvar,
    capacity: usize,
}

/// Fixed-size pool of worker threads.
///
/// Dropping the pool shuts it down once the queued jobs have run.
pub struct WorkerPool {
    shared: Arc<Shared>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl WorkerPool {
    /// Start `worker_count` threads sharing a queue of at most `capacity` jobs
    ///
    /// Threads are named `kwindex-worker-<n>`.
    pub fn new(worker_count: usize, capacity: usize) -> std::io::Result<Self> {
        let pool = WorkerPool {
            shared: Arc::new(Shared {
                lanes: Mutex::new(Lanes::default()),
                job_ready: Condvar::new(),
                capacity,
            }),
            threads: Mutex::new(Vec::with_capacity(worker_count)),
            worker_count,
        };

        for n in 0..worker_count {
            let shared = Arc::clone(&pool.shared);
            // On error `pool` drops here and joins the threads already started
            let handle = std::thread::Builder::new()
                .name(format!("kwindex-worker-{}", n))
                .spawn(move || serve(&shared))?;
            pool.threads.lock().push(handle);
        }

        Ok(pool)
    }

    /// Run `f` on a worker and await its result
    ///
    /// # Errors
    ///
    /// - `Error::Backpressure` if the queue is full or the pool is shut down
    /// - `Error::WorkerLost` if `f` panicked
    pub async fn run<T, F>(&self, priority: JobPriority, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.enqueue(
            priority,
            Box::new(move || {
                // Receiver gone means the caller stopped waiting
                let _ = tx.send(f());
            }),
        )?;
        rx.await.map_err(|_| Error::WorkerLost)
    }

    fn enqueue(&self, priority: JobPriority, job: Job) -> Result<()> {
        {
            let mut lanes = self.shared.lanes.lock();
            if lanes.closed || lanes.queued() >= self.shared.capacity {
                return Err(Error::Backpressure);
            }
            match priority {
                JobPriority::Search => lanes.search.push_back(job),
                JobPriority::Ingest => lanes.ingest.push_back(job),
            }
        }
        self.shared.job_ready.notify_one();
        Ok(())
    }

    /// Stop accepting jobs and join the workers after the queue empties
    ///
    /// Idempotent.
    pub fn shutdown(&self) {
        {
            let mut lanes = self.shared.lanes.lock();
            lanes.closed = true;
            self.shared.job_ready.notify_all();
        }

        for handle in self.threads.lock().drain(..) {
            let _ = handle.join();
        }
    }

    /// Whether `shutdown` has been called
    pub fn is_shut_down(&self) -> bool {
        self.shared.lanes.lock().closed
    }

    /// Current queue and throughput figures
    pub fn stats(&self) -> PoolStats {
        let lanes = self.shared.lanes.lock();
        PoolStats {
            queue_depth: lanes.queued(),
            active_jobs: lanes.active,
            jobs_completed: lanes.completed,
            worker_count: self.worker_count,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn serve(shared: &Shared) {
    loop {
        let job = {
            let mut lanes = shared.lanes.lock();
            loop {
                if let Some(job) = lanes.next() {
                    lanes.active += 1;
                    break job;
                }
                if lanes.closed {
                    return;
                }
                shared.job_ready.wait(&mut lanes);
            }
        };

        // A panicking job drops its oneshot sender; the caller sees WorkerLost
        let outcome = catch_unwind(AssertUnwindSafe(job));

        {
            let mut lanes = shared.lanes.lock();
            lanes.active -= 1;
            lanes.completed += 1;
        }

        if let Err(panic) = outcome {
            let reason = panic
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("(non-string panic)");
            error!(reason, "worker job panicked");
        }
    }
}
