// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Listener (C4): the singleton accept loop. Binds the configured port,
//! admits workers, performs the handshake, spawns one proxy thread per
//! worker, and tears everything down once told to close.

use std::io;
use std::net::{SocketAddr, TcpListener as StdTcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::error::Error;
use crate::proxy::{self, Status, WorkerProxy};
use crate::queue::JobQueue;
use crate::wire::Connection;

/// How often the accept loop polls `closed` while no connection is
/// pending. Chosen to bound shutdown latency well under `spec.md`'s
/// 30-second accept-timeout figure, per that section's explicit
/// allowance to swap the wait mechanism as long as termination semantics
/// are preserved.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct ProxyHandle {
    proxy: Arc<WorkerProxy>,
    thread: JoinHandle<()>,
}

/// Spawns the listener thread and returns its handle. Joining that handle
/// yields every proxy that was ever registered, in accept order, for the
/// pool façade to summarize after shutdown.
pub(crate) fn spawn(
    port: u16,
    queue: JobQueue,
    closed: Arc<AtomicBool>,
) -> JoinHandle<Vec<Arc<WorkerProxy>>> {
    thread::Builder::new()
        .name("devolve-listener".to_string())
        .spawn(move || run(port, queue, closed))
        .expect("failed to spawn devolve listener thread")
}

fn run(port: u16, queue: JobQueue, closed: Arc<AtomicBool>) -> Vec<Arc<WorkerProxy>> {
    let listener = match StdTcpListener::bind(("0.0.0.0", port)) {
        Ok(listener) => listener,
        Err(e) => {
            error!("devolve: failed to bind port {}: {}", port, e);
            return Vec::new();
        }
    };
    if let Err(e) = listener.set_nonblocking(true) {
        error!("devolve: failed to configure listener on port {}: {}", port, e);
        return Vec::new();
    }

    info!("devolve: listening on port {}", port);

    let mut registry: Vec<ProxyHandle> = Vec::new();
    loop {
        match listener.accept() {
            Ok((stream, addr)) => admit(stream, addr, &queue, &mut registry),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                if closed.load(Ordering::Acquire) {
                    break;
                }
                thread::sleep(ACCEPT_POLL_INTERVAL);
            }
            Err(e) => {
                error!("devolve: accept failed: {}", e);
                break;
            }
        }
    }

    drop(listener);
    info!("devolve: accept loop stopped, joining {} proxies", registry.len());

    let mut proxies = Vec::with_capacity(registry.len());
    for handle in registry {
        let _ = handle.thread.join();
        if handle.proxy.status() == Status::Error {
            error!(
                "devolve: worker {} (pid {}) exited with error after {} job(s)",
                handle.proxy.name,
                handle.proxy.remote_pid,
                handle.proxy.n_jobs()
            );
        }
        proxies.push(handle.proxy);
    }
    proxies
}

fn admit(stream: TcpStream, addr: SocketAddr, queue: &JobQueue, registry: &mut Vec<ProxyHandle>) {
    if let Err(e) = stream.set_nonblocking(false) {
        warn!("devolve: could not configure connection from {}: {}", addr, e);
        return;
    }

    let mut conn = match Connection::new(stream) {
        Ok(conn) => conn,
        Err(e) => {
            warn!("devolve: failed to wrap connection from {}: {}", addr, e);
            return;
        }
    };

    let (name, pid) = match handshake(&mut conn, addr) {
        Ok(pair) => pair,
        Err(e) => {
            warn!("devolve: rejecting connection from {}: {}", addr, e);
            return;
        }
    };

    debug!("devolve: worker {} (pid {}) connected from {}", name, pid, addr);

    let proxy = Arc::new(WorkerProxy::new(name, addr, pid));
    let proxy_for_thread = proxy.clone();
    let queue_for_thread = queue.clone();
    let thread_name = format!("devolve-proxy-{}", proxy.name);

    let thread = thread::Builder::new()
        .name(thread_name)
        .spawn(move || proxy::run(&proxy_for_thread, conn, queue_for_thread))
        .expect("failed to spawn devolve proxy thread");

    registry.push(ProxyHandle { proxy, thread });
}

/// Reads the worker's name and pid lines. Any read failure, a blank name,
/// or a non-positive pid is reported as a single `Error::Handshake` so
/// callers can match on the failure kind rather than its string content.
fn handshake(conn: &mut Connection, addr: SocketAddr) -> Result<(String, u32), Error> {
    let name = conn.read_line().map_err(|e| Error::Handshake {
        reason: format!("failed to read worker name from {}: {}", addr, e),
    })?;
    if name.trim().is_empty() {
        return Err(Error::Handshake {
            reason: format!("blank worker name from {}", addr),
        });
    }

    let pid_line = conn.read_line().map_err(|e| Error::Handshake {
        reason: format!("failed to read pid for worker {} ({}): {}", name, addr, e),
    })?;
    let pid: u32 = pid_line.parse().map_err(|_| Error::Handshake {
        reason: format!("invalid pid {:?} for worker {} ({})", pid_line, name, addr),
    })?;
    if pid == 0 {
        return Err(Error::Handshake {
            reason: format!("non-positive pid for worker {} ({})", name, addr),
        });
    }

    Ok((name, pid))
}
