// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Worker proxy (C3): one per connected worker, executed on a dedicated
//! thread. Pops jobs off the shared queue, runs each one end-to-end
//! against its worker socket, and updates its own lifecycle status.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use log::{debug, warn};

use crate::queue::{JobQueue, WorkItem};
use crate::wire::{Connection, Recv, POST_QUIT_GRACE};

/// Lifecycle of a [`WorkerProxy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Busy,
    Done,
    Error,
}

/// Boss-side state for one connected worker.
///
/// Owned exclusively by the listener's proxy registry; `n_jobs` and
/// `status` are written only by this proxy's own thread and are safe to
/// read from other threads only after that thread has been joined.
pub struct WorkerProxy {
    pub name: String,
    pub peer_addr: SocketAddr,
    pub remote_pid: u32,
    n_jobs: AtomicU64,
    status: Mutex<Status>,
}

impl WorkerProxy {
    pub(crate) fn new(name: String, peer_addr: SocketAddr, remote_pid: u32) -> Self {
        Self {
            name,
            peer_addr,
            remote_pid,
            n_jobs: AtomicU64::new(0),
            status: Mutex::new(Status::Busy),
        }
    }

    pub fn n_jobs(&self) -> u64 {
        self.n_jobs.load(Ordering::Acquire)
    }

    pub fn status(&self) -> Status {
        *self.status.lock().expect("proxy status lock poisoned")
    }

    fn set_status(&self, status: Status) {
        *self.status.lock().expect("proxy status lock poisoned") = status;
    }
}

/// Runs the proxy's job loop for the lifetime of its connection. Returns
/// once the proxy has observed QUIT or failed irrecoverably; the caller
/// (the listener) is expected to `join` the thread this runs on.
pub(crate) fn run(proxy: &WorkerProxy, mut conn: Connection, queue: JobQueue) {
    proxy.set_status(Status::Busy);

    loop {
        match queue.get() {
            WorkItem::Quit => {
                // Every proxy that observes QUIT re-publishes it so the
                // remaining proxies (and the listener, at wrapup) also see
                // exactly one terminal sentinel.
                queue.put(WorkItem::Quit);
                shutdown(proxy, &mut conn, Status::Done);
                return;
            }
            WorkItem::Job(mut job) => {
                let payload = job.get_work();
                debug!(
                    "worker {}: dispatching job ({} bytes)",
                    proxy.name,
                    payload.len()
                );

                match dispatch(&mut conn, &payload) {
                    Ok(bytes) => {
                        job.put_result(Some(bytes));
                        proxy.n_jobs.fetch_add(1, Ordering::AcqRel);
                    }
                    Err(reason) => {
                        warn!("worker {}: {}", proxy.name, reason);
                        job.put_result(None);
                        shutdown(proxy, &mut conn, Status::Error);
                        return;
                    }
                }
            }
        }
    }
}

/// Sends one job's payload and waits for the worker's response. Any
/// failure (transport or protocol) is reported as a single string; the
/// caller is responsible for the exactly-once `put_result(None)` that
/// follows.
fn dispatch(conn: &mut Connection, payload: &[u8]) -> Result<Vec<u8>, String> {
    conn.send(payload).map_err(|e| e.to_string())?;
    match conn.recv().map_err(|e| e.to_string())? {
        Recv::Payload(bytes) => Ok(bytes),
        Recv::Quit => Err("worker sent quit mid-dispatch".to_string()),
    }
}

/// Sends the out-of-band `quit` line, waits a short grace period for the
/// worker to flush and close, then drops the connection.
fn shutdown(proxy: &WorkerProxy, conn: &mut Connection, status: Status) {
    conn.send_quit();
    std::thread::sleep(POST_QUIT_GRACE);
    proxy.set_status(status);
}
