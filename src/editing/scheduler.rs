//! Debounced background re-diffing for a live editing session.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::config::SessionConfig;
use crate::diff::{Opcode, TextDiffer};

enum Command {
    Diff {
        generation: u64,
        left: String,
        right: String,
    },
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffResult {
    pub generation: u64,
    pub opcodes: Vec<Opcode>,
}

/// Runs diffs on a worker thread. Requests arriving within the debounce
/// window replace each other, and only the newest request's result is
/// ever handed back.
pub struct DiffScheduler {
    tx: Sender<Command>,
    rx: Receiver<DiffResult>,
    handle: Option<JoinHandle<()>>,
    latest: u64,
}

impl DiffScheduler {
    pub fn new(differ: TextDiffer, debounce: Duration) -> Result<Self> {
        let (tx, worker_rx) = mpsc::channel::<Command>();
        let (worker_tx, rx) = mpsc::channel::<DiffResult>();
        let handle = thread::Builder::new()
            .name("docalign-diff".to_string())
            .spawn(move || worker_main(differ, debounce, worker_rx, worker_tx))
            .context("failed to spawn diff worker")?;
        Ok(Self {
            tx,
            rx,
            handle: Some(handle),
            latest: 0,
        })
    }

    pub fn from_config(differ: TextDiffer, config: &SessionConfig) -> Result<Self> {
        Self::new(differ, Duration::from_millis(config.debounce_ms))
    }

    pub fn request(&mut self, left: impl Into<String>, right: impl Into<String>) -> u64 {
        self.latest += 1;
        let sent = self.tx.send(Command::Diff {
            generation: self.latest,
            left: left.into(),
            right: right.into(),
        });
        if sent.is_err() {
            debug!(generation = self.latest, "diff worker is gone; request dropped");
        }
        self.latest
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest
    }

    /// The newest finished result, if it belongs to the latest request.
    pub fn poll(&mut self) -> Option<DiffResult> {
        let mut current = None;
        while let Ok(result) = self.rx.try_recv() {
            if let Some(result) = self.accept(result) {
                current = Some(result);
            }
        }
        current
    }

    /// Blocks until the latest request's result arrives or `timeout` passes.
    pub fn wait_latest(&mut self, timeout: Duration) -> Option<DiffResult> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            let result = self.rx.recv_timeout(remaining).ok()?;
            if let Some(result) = self.accept(result) {
                return Some(result);
            }
        }
    }

    fn accept(&self, result: DiffResult) -> Option<DiffResult> {
        if result.generation == self.latest {
            Some(result)
        } else {
            debug!(
                generation = result.generation,
                latest = self.latest,
                "discarding stale diff result"
            );
            None
        }
    }
}

impl Drop for DiffScheduler {
    fn drop(&mut self) {
        let _ = self.tx.send(Command::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn worker_main(
    differ: TextDiffer,
    debounce: Duration,
    rx: Receiver<Command>,
    tx: Sender<DiffResult>,
) {
    while let Ok(Command::Diff {
        mut generation,
        mut left,
        mut right,
    }) = rx.recv()
    {
        // Keep absorbing newer requests until the input settles.
        loop {
            match rx.recv_timeout(debounce) {
                Ok(Command::Diff {
                    generation: g,
                    left: l,
                    right: r,
                }) => {
                    generation = g;
                    left = l;
                    right = r;
                }
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => return,
                Err(RecvTimeoutError::Timeout) => break,
            }
        }
        let opcodes = differ.diff_str(&left, &right);
        debug!(generation, ops = opcodes.len(), "diff finished");
        if tx.send(DiffResult { generation, opcodes }).is_err() {
            return;
        }
    }
}
