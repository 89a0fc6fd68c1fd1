//! Single-worker enrichment queue
//!
//! Every enrichment job in the process runs on one worker, one job at a time,
//! in the order the jobs were received. Submission never blocks: jobs go into
//! an unbounded channel and the caller returns immediately.
//!
//! A panicking job is caught at the job boundary and the worker moves on.
//! That only holds when panics unwind: the release profile builds with
//! `panic = "abort"`, where a panicking job ends the process.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// A unit of enrichment work
pub type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Job),
    Barrier(oneshot::Sender<()>),
}

#[derive(Default)]
struct QueueState {
    closed: AtomicBool,
    submitted: AtomicU64,
    completed: AtomicU64,
}

/// Cloneable submission side of the queue, held by records
#[derive(Clone)]
pub struct EnrichmentHandle {
    sender: mpsc::UnboundedSender<Message>,
    state: Arc<QueueState>,
}

impl EnrichmentHandle {
    /// Enqueue a job. Returns [`Error::QueueClosed`] once the queue has shut down.
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.state.closed.load(Ordering::Acquire) {
            return Err(Error::QueueClosed);
        }

        self.sender
            .send(Message::Run(Box::new(job)))
            .map_err(|_| Error::QueueClosed)?;
        self.state.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Whether the queue has stopped accepting jobs
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for EnrichmentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrichmentHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Owner of the enrichment worker
pub struct EnrichmentQueue {
    handle: EnrichmentHandle,
    cancel: CancellationToken,
    worker: Option<JoinHandle<()>>,
}

impl EnrichmentQueue {
    /// Spawn the worker on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn start() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let state = Arc::new(QueueState::default());
        let cancel = CancellationToken::new();

        let worker = tokio::spawn(enrichment_worker(
            receiver,
            Arc::clone(&state),
            cancel.clone(),
        ));

        info!("Enrichment queue started with 1 worker");

        Self {
            handle: EnrichmentHandle { sender, state },
            cancel,
            worker: Some(worker),
        }
    }

    /// A submission handle sharing this queue
    pub fn handle(&self) -> EnrichmentHandle {
        self.handle.clone()
    }

    /// Enqueue a job through the owner
    pub fn submit<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.handle.submit(job)
    }

    /// Wait until every job submitted before this call has finished
    pub async fn drain(&self) -> Result<()> {
        if self.handle.is_closed() {
            return Err(Error::QueueClosed);
        }

        let (tx, rx) = oneshot::channel();
        self.handle
            .sender
            .send(Message::Barrier(tx))
            .map_err(|_| Error::QueueClosed)?;
        rx.await.map_err(|_| Error::QueueClosed)
    }

    /// Number of jobs accepted so far
    pub fn submitted(&self) -> u64 {
        self.handle.state.submitted.load(Ordering::Relaxed)
    }

    /// Number of jobs that have finished, successfully or not
    pub fn completed(&self) -> u64 {
        self.handle.state.completed.load(Ordering::Relaxed)
    }

    /// Whether the queue has stopped accepting jobs
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    /// Stop accepting jobs, abandon the ones still pending and wait for the worker.
    ///
    /// A job already running is allowed to finish.
    pub async fn shutdown(mut self) {
        self.handle.state.closed.store(true, Ordering::Release);
        self.cancel.cancel();

        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                error!(error = %e, "Enrichment worker terminated abnormally");
            }
        }

        info!(
            submitted = self.submitted(),
            completed = self.completed(),
            "Enrichment queue shut down"
        );
    }
}

impl Drop for EnrichmentQueue {
    fn drop(&mut self) {
        self.handle.state.closed.store(true, Ordering::Release);
        self.cancel.cancel();
    }
}

async fn enrichment_worker(
    mut receiver: mpsc::UnboundedReceiver<Message>,
    state: Arc<QueueState>,
    cancel: CancellationToken,
) {
    debug!("Enrichment worker started");

    loop {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            message = receiver.recv() => message,
        };

        let Some(message) = message else {
            break;
        };

        match message {
            Message::Run(job) => {
                // Awaited before the next recv: at most one job is ever in flight.
                if let Err(e) = tokio::task::spawn_blocking(job).await {
                    error!(error = %e, "Enrichment job panicked");
                }
                state.completed.fetch_add(1, Ordering::Relaxed);
            }
            Message::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }

    debug!("Enrichment worker shutting down");
}
