// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The literal `init`/`instance`/`add`/`close`/`join` singleton API from
//! `spec.md` §4.5, layered over the testable [`crate::pool::Pool`] factory.
//! Prefer constructing a [`crate::pool::Pool`] directly in tests and in any
//! process that wants more than one pool; this module exists for parity
//! with applications that want exactly one process-wide pool.

use std::sync::{Mutex, OnceLock};

use log::warn;

use crate::error::Error;
use crate::job::Job;
use crate::pool::{Config, Pool, ProxyReport};

static PENDING_CONFIG: Mutex<Option<Config>> = Mutex::new(None);
static POOL: OnceLock<Pool> = OnceLock::new();

/// Validates and stashes `config` for the pool that [`instance`] will
/// lazily construct. Idempotent-by-guard: if the singleton already
/// exists, logs a warning and returns without touching it.
pub fn init(config: Config) -> Result<(), Error> {
    config.validate()?;
    if POOL.get().is_some() {
        warn!("devolve: pool already initialized; ignoring subsequent init() call");
        return Ok(());
    }
    *PENDING_CONFIG.lock().expect("pending config lock poisoned") = Some(config);
    Ok(())
}

/// Lazily constructs the singleton pool (using whatever [`init`] stashed,
/// or the defaults) and returns it.
pub fn instance() -> &'static Pool {
    POOL.get_or_init(|| {
        let config = PENDING_CONFIG
            .lock()
            .expect("pending config lock poisoned")
            .take()
            .unwrap_or_default();
        Pool::new(config).expect("devolve: failed to start the pool")
    })
}

/// Places `job` on the singleton pool's queue.
pub fn add(job: impl Job + 'static) {
    instance().add(job);
}

/// Closes the singleton pool.
pub fn close() {
    instance().close();
}

/// Waits for the singleton pool's listener and all of its proxies.
pub fn join() -> Vec<ProxyReport> {
    instance().join()
}
