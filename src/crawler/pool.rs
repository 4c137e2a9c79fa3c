//! Worker pool
//!
//! A fixed number of workers pull tasks from a shared pending queue, run
//! them and push them to the completed queue. The pool shares the scan's
//! state channel as its gate: workers wait while the scan is paused and exit
//! once it leaves the running state.

use crate::crawler::{CrawlTask, Fetcher, ScanState};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

pub struct WorkerPool {
    size: usize,
    fetcher: Fetcher,
    gate: watch::Receiver<ScanState>,
    todo_tx: UnboundedSender<CrawlTask>,
    todo_rx: Arc<Mutex<UnboundedReceiver<CrawlTask>>>,
    done_tx: UnboundedSender<CrawlTask>,
    done_rx: UnboundedReceiver<CrawlTask>,
    /// Tasks added but not yet drained; only touched by the pool's owner
    pending: usize,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Creates a pool of `size` workers (at least one)
    pub fn new(size: usize, fetcher: Fetcher, gate: watch::Receiver<ScanState>) -> Self {
        let (todo_tx, todo_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = mpsc::unbounded_channel();

        Self {
            size: size.max(1),
            fetcher,
            gate,
            todo_tx,
            todo_rx: Arc::new(Mutex::new(todo_rx)),
            done_tx,
            done_rx,
            pending: 0,
            workers: Vec::new(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of tasks added and not yet drained
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Queues a task for execution
    pub fn add(&mut self, task: CrawlTask) {
        // The receiver lives as long as the pool, so this cannot fail
        if self.todo_tx.send(task).is_ok() {
            self.pending += 1;
        }
    }

    /// Launches the workers
    ///
    /// Calling this more than once has no effect.
    pub fn start(&mut self) {
        if !self.workers.is_empty() {
            return;
        }

        for id in 0..self.size {
            let fetcher = self.fetcher.clone();
            let gate = self.gate.clone();
            let todo = Arc::clone(&self.todo_rx);
            let done = self.done_tx.clone();

            self.workers
                .push(tokio::spawn(worker_loop(id, fetcher, gate, todo, done)));
        }

        tracing::debug!("Started {} workers", self.size);
    }

    /// Waits for the next completed task
    ///
    /// Returns `None` once every added task has been drained. Cancel safe:
    /// a completed task is only counted as drained when it is returned.
    pub async fn next_completed(&mut self) -> Option<CrawlTask> {
        if self.pending == 0 {
            return None;
        }

        let task = self.done_rx.recv().await?;
        self.pending -= 1;
        Some(task)
    }

    /// Closes the pending queue and waits for the workers to exit
    pub async fn shutdown(self) {
        let Self {
            todo_tx, workers, ..
        } = self;
        drop(todo_tx);

        for worker in workers {
            if let Err(e) = worker.await {
                tracing::warn!("Worker panicked: {}", e);
            }
        }
    }
}

async fn worker_loop(
    id: usize,
    fetcher: Fetcher,
    mut gate: watch::Receiver<ScanState>,
    todo: Arc<Mutex<UnboundedReceiver<CrawlTask>>>,
    done: UnboundedSender<CrawlTask>,
) {
    loop {
        if !wait_until_runnable(&mut gate).await {
            break;
        }

        let next = {
            let mut rx = todo.lock().await;
            rx.recv().await
        };
        let Some(mut task) = next else {
            break;
        };

        // A pause may have arrived while this worker was waiting for work
        if !wait_until_runnable(&mut gate).await {
            break;
        }

        tracing::trace!("Worker {} fetching {}", id, task.link);
        task.run(&fetcher).await;

        if done.send(task).is_err() {
            break;
        }
    }

    tracing::trace!("Worker {} exiting", id);
}

/// Blocks while the scan is paused
///
/// Returns whether the scan is running afterwards; `false` means the caller
/// should wind down.
pub(crate) async fn wait_until_runnable(gate: &mut watch::Receiver<ScanState>) -> bool {
    match gate.wait_for(|state| *state != ScanState::Paused).await {
        Ok(state) => *state == ScanState::Running,
        Err(_) => false,
    }
}
