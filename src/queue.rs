// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Bounded job queue (C2).
//!
//! A blocking, fixed-capacity FIFO shared by every producer (application
//! threads calling `add`) and every consumer (worker proxy threads). FIFO
//! ordering holds among successful `put` calls; there is no priority and
//! no timeout.

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::job::Job;

/// An item on the queue: either a job to dispatch, or the single QUIT
/// sentinel that every proxy re-enqueues before exiting so all proxies
/// eventually observe it.
pub enum WorkItem {
    Job(Box<dyn Job>),
    Quit,
}

/// Cloning a `JobQueue` shares the same underlying channel; this is how
/// the queue is handed to the listener and to every proxy it spawns.
#[derive(Clone)]
pub struct JobQueue {
    tx: Sender<WorkItem>,
    rx: Receiver<WorkItem>,
}

impl JobQueue {
    pub fn bounded(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx }
    }

    /// Blocks when the queue is full.
    pub fn put(&self, item: WorkItem) {
        self.tx
            .send(item)
            .expect("job queue disconnected: no receivers remain");
    }

    /// Blocks when the queue is empty.
    pub fn get(&self) -> WorkItem {
        self.rx
            .recv()
            .expect("job queue disconnected: no senders remain")
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rx.len()
    }
}
