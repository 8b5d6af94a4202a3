// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Pool façade (C5).
//!
//! `spec.md` describes the pool as a process-wide singleton reached
//! through `init`/`instance`. Per that spec's own design notes (§9), the
//! singleton is a re-architecture candidate: the underlying requirement is
//! a single listening endpoint and a single job queue *per pool instance*,
//! not a single pool per process. `Pool` is therefore a plain factory —
//! construct as many as you like, each with its own port and queue — and
//! [`crate::global`] layers the literal `init`/`instance`/`add`/`close`
//! singleton API on top for callers that want exactly one process-wide
//! pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use log::info;

use crate::error::Error;
use crate::job::Job;
use crate::listener;
use crate::proxy::{Status, WorkerProxy};
use crate::queue::{JobQueue, WorkItem};

/// Default listening port (`spec.md` §3, §6).
pub const DEFAULT_PORT: u16 = 11111;
/// Default queue capacity (`spec.md` §3, §6).
pub const DEFAULT_QUEUE_SIZE: usize = 5000;

const MIN_PORT: u16 = 1024;
const MAX_QUEUE_SIZE: usize = 1_000_000_000;

/// Pool configuration. No environment variables, no persisted state —
/// these two bounded integers are the entire configuration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub queue_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            queue_size: DEFAULT_QUEUE_SIZE,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        if self.port < MIN_PORT {
            return Err(Error::Config {
                reason: format!("port {} is below the minimum of {}", self.port, MIN_PORT),
            });
        }
        if self.queue_size < 1 || self.queue_size > MAX_QUEUE_SIZE {
            return Err(Error::Config {
                reason: format!(
                    "queue_size {} out of range 1..={}",
                    self.queue_size, MAX_QUEUE_SIZE
                ),
            });
        }
        Ok(())
    }
}

/// A read-only snapshot of one worker proxy, returned from [`Pool::join`].
#[derive(Debug, Clone)]
pub struct ProxyReport {
    pub name: String,
    pub peer_addr: std::net::SocketAddr,
    pub remote_pid: u32,
    pub n_jobs: u64,
    pub status: Status,
}

impl ProxyReport {
    fn from(proxy: &Arc<WorkerProxy>) -> Self {
        Self {
            name: proxy.name.clone(),
            peer_addr: proxy.peer_addr,
            remote_pid: proxy.remote_pid,
            n_jobs: proxy.n_jobs(),
            status: proxy.status(),
        }
    }
}

/// The job-queue + listener pair that makes up one dispatch pool.
pub struct Pool {
    queue: JobQueue,
    closed: Arc<AtomicBool>,
    listener: Mutex<Option<JoinHandle<Vec<Arc<WorkerProxy>>>>>,
}

impl Pool {
    /// Validates `config`, binds the listener, and returns immediately;
    /// the listener thread runs in the background from this point on.
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        let queue = JobQueue::bounded(config.queue_size);
        let closed = Arc::new(AtomicBool::new(false));
        let listener = listener::spawn(config.port, queue.clone(), closed.clone());

        Ok(Self {
            queue,
            closed,
            listener: Mutex::new(Some(listener)),
        })
    }

    /// Places `job` on the queue. Blocks when the queue is at capacity.
    pub fn add(&self, job: impl Job + 'static) {
        self.queue.put(WorkItem::Job(Box::new(job)));
    }

    /// Idempotent. Marks the pool closed and enqueues the single QUIT
    /// sentinel; non-blocking. Callers subsequently wait with [`Pool::join`].
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            info!("devolve: pool already closed");
            return;
        }
        self.queue.put(WorkItem::Quit);
    }

    /// Waits for the listener (and transitively every proxy it spawned) to
    /// terminate, and returns a snapshot of each. Calling this more than
    /// once is harmless — later calls simply return no proxies, since the
    /// listener handle has already been taken.
    pub fn join(&self) -> Vec<ProxyReport> {
        let handle = self.listener.lock().expect("listener lock poisoned").take();
        match handle {
            Some(handle) => {
                let proxies = handle.join().unwrap_or_default();
                proxies.iter().map(ProxyReport::from).collect()
            }
            None => Vec::new(),
        }
    }
}
