// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Shared test helpers: a minimal worker harness written directly against
//! `std::net::TcpStream`. Worker-side compute logic is out of scope for
//! the core (`spec.md` §1), but a stand-in is needed to drive the wire
//! protocol end-to-end.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use devolve::Job;

static NEXT_PORT: AtomicUsize = AtomicUsize::new(15_000);

/// Opts into `env_logger` output when `RUST_LOG` is set; harmless to call
/// more than once across a test binary's test functions.
pub fn enable_logging() {
    let _ = env_logger::try_init();
}

/// Hands out distinct ports so tests can run concurrently without
/// colliding on the same listening socket.
pub fn next_port() -> u16 {
    NEXT_PORT.fetch_add(1, Ordering::Relaxed) as u16
}

/// A `Job` whose payload is fixed up front and whose result is delivered
/// into a shared slot, so the test driving it can block on the result.
pub struct RecordingJob {
    payload: Vec<u8>,
    result: Arc<Mutex<Option<Option<Vec<u8>>>>>,
}

impl RecordingJob {
    pub fn new(payload: impl Into<Vec<u8>>) -> (Self, Arc<Mutex<Option<Option<Vec<u8>>>>>) {
        let result = Arc::new(Mutex::new(None));
        (
            Self {
                payload: payload.into(),
                result: result.clone(),
            },
            result,
        )
    }
}

impl Job for RecordingJob {
    fn get_work(&mut self) -> Vec<u8> {
        self.payload.clone()
    }
    fn put_result(&mut self, result: Option<Vec<u8>>) {
        *self.result.lock().unwrap() = Some(result);
    }
}

/// Connects to the boss, performs the handshake, then calls `round` for
/// every framed request it receives, writing back whatever `round`
/// returns. Returns once the boss sends `quit` or the connection drops.
pub fn run_echoing_worker(
    port: u16,
    name: &str,
    pid: u32,
    mut round: impl FnMut(&[u8]) -> Vec<u8>,
) {
    let stream = TcpStream::connect(("127.0.0.1", port)).expect("worker connect failed");
    let mut writer = stream.try_clone().expect("clone stream");
    let mut reader = BufReader::new(stream);

    writeln!(writer, "{}", name).unwrap();
    writeln!(writer, "{}", pid).unwrap();

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap() == 0 {
            return; // boss hung up
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed == "quit" {
            return;
        }

        let len: usize = trimmed.parse().expect("malformed length line");
        let mut payload = vec![0u8; len];
        reader.read_exact(&mut payload).unwrap();

        writeln!(writer, "ack").unwrap();
        writer.flush().unwrap();

        let response = round(&payload);
        writeln!(writer, "{}", response.len()).unwrap();
        writer.write_all(&response).unwrap();
        writer.flush().unwrap();

        let mut ack_line = String::new();
        if reader.read_line(&mut ack_line).unwrap() == 0 {
            return;
        }
    }
}

pub fn reverse(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().rev().copied().collect()
}
