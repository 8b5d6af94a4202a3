// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! The abstract job contract (C6).
//!
//! The core consumes jobs only through these two operations and never
//! inspects their payloads; marshalling application objects into bytes is
//! entirely the application's concern.

/// An application-supplied unit of work.
///
/// Dequeued exactly once (absent re-enqueue by `put_result` itself) and
/// consumed by exactly one [`crate::proxy::WorkerProxy`].
pub trait Job: Send {
    /// Produces the payload to send to a worker. Called exactly once per
    /// successful dispatch, immediately before sending; may be expensive —
    /// this is the deferral hook that lets applications keep jobs cheap in
    /// the queue and materialize payloads only at dispatch time.
    fn get_work(&mut self) -> Vec<u8>;

    /// Delivers the outcome of one dispatch attempt. Called exactly once
    /// per attempt: `Some(bytes)` carries the worker's raw response,
    /// `None` signals a transport or protocol failure that kept the job
    /// from completing. The application decides whether to re-enqueue.
    fn put_result(&mut self, result: Option<Vec<u8>>);
}
