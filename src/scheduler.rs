//! Transfer scheduling: FIFO intake, one worker, per-request result handles.
//!
//! A single consumer thread receives requests over a channel and runs them one
//! at a time. Serialization and FIFO order therefore hold by construction; no
//! check-then-act flag guards admission. The busy flag kept here is purely
//! observational (true exactly while a traversal executes).
//!
//! A request leaves the pending count unconditionally once its traversal
//! attempt finishes, success or failure. There is no retry or dead-letter
//! path, and no bulk-reset operation exists at all.

use anyhow::{Result, bail};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error};

use crate::errors::TransferError;
use crate::request::{TransferOutcome, TransferRequest};
use crate::traverse::run_transfer;

struct Ticket {
    request: TransferRequest,
    done: Sender<Result<TransferOutcome>>,
}

struct Shared {
    busy: AtomicBool,
    pending: AtomicUsize,
    stop: AtomicBool,
}

/// Cloneable cooperative-stop signal for a scheduler.
/// Raising it aborts the running traversal between stack frames and fails
/// still-queued requests without running them. Safe to call from a signal
/// handler.
#[derive(Clone)]
pub struct StopSignal(Arc<Shared>);

impl StopSignal {
    pub fn raise(&self) {
        self.0.stop.store(true, Ordering::Relaxed);
    }

    pub fn is_raised(&self) -> bool {
        self.0.stop.load(Ordering::Relaxed)
    }
}

/// Handle correlating one submitted request with its eventual result.
/// Dropping it reverts the request to fire-and-forget; the transfer still runs.
pub struct TransferHandle {
    rx: Receiver<Result<TransferOutcome>>,
    // Keeps a result observed by wait_timeout so a later wait still sees it.
    result: Option<Result<TransferOutcome>>,
}

impl TransferHandle {
    /// Block until the transfer finishes and return its result.
    pub fn wait(mut self) -> Result<TransferOutcome> {
        if let Some(result) = self.result.take() {
            return result;
        }
        match self.rx.recv() {
            Ok(result) => result,
            // Worker gone without reporting; only possible after a panic.
            Err(_) => bail!(TransferError::SchedulerClosed),
        }
    }

    /// Non-consuming wait with a deadline. Returns None on timeout; once the
    /// result has arrived it stays observable here and through `wait`.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<&Result<TransferOutcome>> {
        if self.result.is_none() {
            self.result = self.rx.recv_timeout(timeout).ok();
        }
        self.result.as_ref()
    }
}

/// Owned transfer scheduler. Construct one per scope that needs serialized
/// directory transfers; independent schedulers do not affect each other.
pub struct TransferScheduler {
    tx: Option<Sender<Ticket>>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl TransferScheduler {
    pub fn new() -> Self {
        let (tx, rx) = unbounded::<Ticket>();
        let shared = Arc::new(Shared {
            busy: AtomicBool::new(false),
            pending: AtomicUsize::new(0),
            stop: AtomicBool::new(false),
        });
        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("relay-worker".into())
            .spawn(move || worker_loop(rx, worker_shared))
            .expect("failed to spawn transfer worker thread");
        Self {
            tx: Some(tx),
            shared,
            worker: Some(worker),
        }
    }

    /// Enqueue a transfer. Never blocks; the returned handle observes the
    /// eventual result. Fails only once the scheduler has shut down.
    pub fn submit(&self, request: TransferRequest) -> Result<TransferHandle> {
        let Some(tx) = self.tx.as_ref() else {
            bail!(TransferError::SchedulerClosed);
        };
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        self.shared.pending.fetch_add(1, Ordering::SeqCst);
        let ticket = Ticket {
            request,
            done: done_tx,
        };
        if tx.send(ticket).is_err() {
            self.shared.pending.fetch_sub(1, Ordering::SeqCst);
            bail!(TransferError::SchedulerClosed);
        }
        Ok(TransferHandle {
            rx: done_rx,
            result: None,
        })
    }

    /// True exactly while a traversal is executing.
    pub fn is_busy(&self) -> bool {
        self.shared.busy.load(Ordering::SeqCst)
    }

    /// Requests submitted but not yet finished (including the running one).
    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::SeqCst)
    }

    pub fn stop_signal(&self) -> StopSignal {
        StopSignal(Arc::clone(&self.shared))
    }

    /// Stop accepting new requests, let queued work drain, and join the worker.
    /// Every already-submitted handle still receives a result.
    pub fn shutdown(mut self) {
        self.close_and_join();
    }

    fn close_and_join(&mut self) {
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("Transfer worker panicked during shutdown");
            }
        }
    }
}

impl Default for TransferScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TransferScheduler {
    fn drop(&mut self) {
        self.close_and_join();
    }
}

fn worker_loop(rx: Receiver<Ticket>, shared: Arc<Shared>) {
    // Sole consumer: tickets arrive and run strictly in submission order.
    for ticket in rx.iter() {
        let result = if shared.stop.load(Ordering::Relaxed) {
            debug!(
                src = %ticket.request.source.display(),
                "Stop raised; failing queued request without running it"
            );
            Err(TransferError::Interrupted.into())
        } else {
            shared.busy.store(true, Ordering::SeqCst);
            let result = run_transfer(&ticket.request, &shared.stop);
            shared.busy.store(false, Ordering::SeqCst);
            result
        };
        shared.pending.fetch_sub(1, Ordering::SeqCst);

        if let Err(e) = &result {
            error!(
                src = %ticket.request.source.display(),
                dest = %ticket.request.destination.display(),
                error = %e,
                "Transfer failed"
            );
        }
        // Handle may have been dropped (fire-and-forget); nothing to do then.
        let _ = ticket.done.send(result);
    }
}
