// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

mod common;

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::thread;
use std::time::Duration;

use devolve::{Config, Pool, Status};

use common::{next_port, RecordingJob};

fn wait_for<F: Fn() -> bool>(predicate: F, timeout: Duration) -> bool {
    let deadline = std::time::Instant::now() + timeout;
    while std::time::Instant::now() < deadline {
        if predicate() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    predicate()
}

/// Scenario 3 (`spec.md` §8): the worker reads the length line then
/// disconnects without ever responding. `put_result(None)` must still
/// fire exactly once and the proxy must end up `Status::Error`.
#[test]
fn worker_crash_mid_job_delivers_null_result() {
    common::enable_logging();
    let port = next_port();
    let pool = Pool::new(Config { port, queue_size: 5 }).unwrap();

    let (job, result) = RecordingJob::new(b"payload".to_vec());
    pool.add(job);

    let worker = thread::spawn(move || {
        let stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        writeln!(writer, "crashy").unwrap();
        writeln!(writer, "99").unwrap();

        let mut line = String::new();
        reader.read_line(&mut line).unwrap(); // the length line
        // Drop the connection without reading the payload or responding.
    });

    assert!(wait_for(|| result.lock().unwrap().is_some(), Duration::from_secs(5)));
    assert_eq!(result.lock().unwrap().clone().unwrap(), None);
    worker.join().unwrap();

    pool.close();
    let reports = pool.join();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].status, Status::Error);
}

/// Scenario 4 (`spec.md` §8): the worker skips the `ack` line it owes the
/// boss for the dispatched payload and writes its response directly. The
/// boss's `send` observes a mismatched line where it expected `ack` and
/// reports a protocol error for the in-flight job.
#[test]
fn missing_ack_is_treated_as_protocol_error() {
    common::enable_logging();
    let port = next_port();
    let pool = Pool::new(Config { port, queue_size: 5 }).unwrap();

    let (job, result) = RecordingJob::new(b"ping".to_vec());
    pool.add(job);

    let worker = thread::spawn(move || {
        let stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        writeln!(writer, "silent").unwrap();
        writeln!(writer, "1").unwrap();

        let mut len_line = String::new();
        reader.read_line(&mut len_line).unwrap();
        let len: usize = len_line.trim().parse().unwrap();
        let mut payload = vec![0u8; len];
        reader.read_exact(&mut payload).unwrap();

        // Skip the "ack" the codec requires here and answer directly.
        writeln!(writer, "4").unwrap();
        writer.write_all(b"pong").unwrap();
        writer.flush().unwrap();
    });

    assert!(wait_for(|| result.lock().unwrap().is_some(), Duration::from_secs(5)));
    assert_eq!(result.lock().unwrap().clone().unwrap(), None);
    worker.join().unwrap();

    pool.close();
    let reports = pool.join();
    assert_eq!(reports[0].status, Status::Error);
}

/// Worker connects, completes the handshake, then disconnects immediately
/// — the proxy observes EOF on its first dispatch.
#[test]
fn worker_disconnect_immediately_after_handshake_is_isolated() {
    common::enable_logging();
    let port = next_port();
    let pool = Pool::new(Config { port, queue_size: 5 }).unwrap();

    let (job, result) = RecordingJob::new(b"work".to_vec());
    pool.add(job);

    let worker = thread::spawn(move || {
        let stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
        let mut writer = stream;
        writeln!(writer, "ghost").unwrap();
        writeln!(writer, "7").unwrap();
        // Drop immediately.
    });
    worker.join().unwrap();

    assert!(wait_for(|| result.lock().unwrap().is_some(), Duration::from_secs(5)));
    assert_eq!(result.lock().unwrap().clone().unwrap(), None);

    pool.close();
    let reports = pool.join();
    assert_eq!(reports[0].status, Status::Error);
}
