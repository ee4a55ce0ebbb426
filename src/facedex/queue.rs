//! # Persistence Queue
//!
//! Likes must never make a request wait on disk. Mutations hand a deep copy of the whole
//! document to this queue and return; one background thread drains it, runs the replace
//! pipeline in reverse and overwrites the source file.
//!
//! ## Ordering
//!
//! Jobs are written strictly in FIFO order by a single consumer. Producers enqueue while
//! still holding the cache lock, so for any source the last job in the queue is the
//! latest state of the document. Intermediate writes may be stale, the final one is not.
//!
//! ## Failures
//!
//! A failed write is logged and dropped. It is not retried and the consumer keeps going.
//! A panicking write is treated the same way.
//!
//! ## Shutdown
//!
//! [`PersistQueue::shutdown`] first stops accepting jobs, then blocks until every job
//! accepted so far has been written (or has failed), then joins the consumer. Once it
//! returns, no accepted like can be lost.
//!
//! A [`WriteSlot`] counts as pending from the moment it is reserved. Callers reserve a
//! slot before touching a document, so shutdown either refuses the mutation up front or
//! waits for its snapshot.

use crate::error::{FacedexError, Result};
use crate::model::Document;
use crate::store::StorageBackend;
use crate::transform::ReplacePipeline;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info};

const POLL_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Debug)]
struct WriteJob {
    source: PathBuf,
    snapshot: Document,
}

#[derive(Debug)]
struct BacklogState {
    pending: usize,
    accepting: bool,
}

/// Counts accepted-but-unwritten jobs. `accepting` and `pending` share one lock so a
/// job can never slip in after shutdown has observed an empty backlog.
#[derive(Debug)]
struct Backlog {
    state: Mutex<BacklogState>,
    drained: Condvar,
}

impl Backlog {
    fn new() -> Self {
        Self {
            state: Mutex::new(BacklogState {
                pending: 0,
                accepting: true,
            }),
            drained: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BacklogState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn complete_one(&self) {
        let mut state = self.lock();
        state.pending = state.pending.saturating_sub(1);
        if state.pending == 0 {
            self.drained.notify_all();
        }
    }

    fn wait_drained(&self) {
        let mut state = self.lock();
        while state.pending > 0 {
            state = self
                .drained
                .wait(state)
                .unwrap_or_else(|e| e.into_inner());
        }
    }

    /// True once shutdown has begun and nothing is left to write.
    fn finished(&self) -> bool {
        let state = self.lock();
        !state.accepting && state.pending == 0
    }
}

pub struct PersistQueue {
    sender: Sender<WriteJob>,
    backlog: Arc<Backlog>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PersistQueue {
    /// Spawns the consumer thread.
    pub fn start<B: StorageBackend>(backend: Arc<B>, pipeline: ReplacePipeline) -> Result<Self> {
        let (sender, receiver) = unbounded::<WriteJob>();
        let backlog = Arc::new(Backlog::new());

        let worker_backlog = Arc::clone(&backlog);
        let handle = thread::Builder::new()
            .name("facedex-persist".to_string())
            .spawn(move || consume(receiver, backend, pipeline, worker_backlog))?;

        Ok(Self {
            sender,
            backlog,
            worker: Mutex::new(Some(handle)),
        })
    }

    /// Claims room for one write. Fails once shutdown has begun.
    pub fn reserve(&self) -> Result<WriteSlot<'_>> {
        let mut state = self.backlog.lock();
        if !state.accepting {
            return Err(FacedexError::ShuttingDown);
        }
        state.pending += 1;
        Ok(WriteSlot {
            queue: self,
            sent: false,
        })
    }

    /// Hands a snapshot to the consumer. Never waits on disk.
    pub fn enqueue(&self, source: &Path, snapshot: Document) -> Result<()> {
        self.reserve()?.send(source, snapshot)
    }

    /// Jobs accepted but not yet written.
    pub fn pending(&self) -> usize {
        self.backlog.lock().pending
    }

    pub fn is_accepting(&self) -> bool {
        self.backlog.lock().accepting
    }

    /// Blocks until every accepted job has been processed, without stopping the queue.
    pub fn wait_drained(&self) {
        self.backlog.wait_drained();
    }

    /// Stops accepting jobs, waits for the backlog, joins the consumer. Idempotent.
    pub fn shutdown(&self) {
        {
            let mut state = self.backlog.lock();
            if state.accepting {
                info!(pending = state.pending, "persistence queue draining");
            }
            state.accepting = false;
        }
        self.backlog.wait_drained();

        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                error!("persistence consumer panicked");
            }
        }
    }
}

/// A reserved place in the queue. Dropping it unsent gives the place back.
pub struct WriteSlot<'a> {
    queue: &'a PersistQueue,
    sent: bool,
}

impl WriteSlot<'_> {
    pub fn send(mut self, source: &Path, snapshot: Document) -> Result<()> {
        let job = WriteJob {
            source: source.to_path_buf(),
            snapshot,
        };
        if self.queue.sender.send(job).is_err() {
            return Err(FacedexError::ShuttingDown);
        }
        self.sent = true;
        Ok(())
    }
}

impl Drop for WriteSlot<'_> {
    fn drop(&mut self) {
        if !self.sent {
            self.queue.backlog.complete_one();
        }
    }
}

impl Drop for PersistQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn consume<B: StorageBackend>(
    receiver: Receiver<WriteJob>,
    backend: Arc<B>,
    pipeline: ReplacePipeline,
    backlog: Arc<Backlog>,
) {
    info!("persistence consumer started");
    loop {
        match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(job) => {
                let source = job.source.clone();
                let written = panic::catch_unwind(AssertUnwindSafe(|| {
                    write_job(backend.as_ref(), &pipeline, job)
                }));
                if written.is_err() {
                    error!(source = %source.display(), "async save panicked");
                }
                backlog.complete_one();
            }
            Err(RecvTimeoutError::Timeout) => {
                if backlog.finished() {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    info!("persistence consumer stopped");
}

fn write_job<B: StorageBackend>(backend: &B, pipeline: &ReplacePipeline, job: WriteJob) {
    let WriteJob { source, snapshot } = job;
    let result = pipeline
        .reverse(snapshot)
        .and_then(|original| backend.save_document(&source, &original));
    match result {
        Ok(()) => debug!(source = %source.display(), "persisted document"),
        Err(e) => error!(source = %source.display(), error = %e, "async save failed"),
    }
}
