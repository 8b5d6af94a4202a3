// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Devolve: a lightweight distributed-work dispatch library.
//!
//! A long-lived "boss" process hands opaque work units to a dynamic set of
//! "worker" processes over TCP and collects their results. The boss side —
//! the bounded job queue, the listener that admits workers, the per-worker
//! proxy state machine, the framed wire protocol, and orderly shutdown —
//! is what this crate implements. Worker-side compute logic, payload
//! marshalling, and process supervision are all the application's concern;
//! see [`Job`] for the only interface the core requires of it.
//!
//! ```no_run
//! use devolve::{Job, Pool, Config};
//!
//! struct Reverse(Vec<u8>);
//! impl Job for Reverse {
//!     fn get_work(&mut self) -> Vec<u8> { self.0.clone() }
//!     fn put_result(&mut self, result: Option<Vec<u8>>) {
//!         println!("{:?}", result);
//!     }
//! }
//!
//! let pool = Pool::new(Config::default()).unwrap();
//! pool.add(Reverse(b"hello".to_vec()));
//! pool.close();
//! pool.join();
//! ```

pub mod error;
pub mod global;
pub mod job;
pub(crate) mod listener;
pub mod logging;
pub mod pool;
pub(crate) mod proxy;
pub(crate) mod queue;
pub(crate) mod wire;

pub use error::Error;
pub use job::Job;
pub use pool::{Config, Pool, ProxyReport};
pub use proxy::Status;
