// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Framed request/response codec (C1).
//!
//! Length-prefix-plus-ACK gives flow control at message granularity without
//! negotiating a full higher-level protocol, and lets the sender detect
//! peer-side parse failures that would otherwise cause hangs.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::time::Duration;

use crate::error::Error;

/// Reserved wire tokens.
const ACK: &str = "ack";
const QUIT: &str = "quit";

/// Grace period after sending `quit` before the proxy closes the socket.
pub const POST_QUIT_GRACE: Duration = Duration::from_secs(1);

/// Result of a single `recv`.
pub enum Recv {
    /// An ordinary framed payload.
    Payload(Vec<u8>),
    /// The worker (or, on the handshake connection, the boss) sent `quit`.
    Quit,
}

/// One worker connection, framed.
///
/// Wraps a single `TcpStream` with a buffered reader so line-oriented reads
/// (handshake, length prefix, ACK) and exact-length payload reads share one
/// read position. The writer half is an independent clone of the same
/// socket, matching the usual split-stream idiom.
pub struct Connection {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Result<Self, Error> {
        let writer = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(stream),
            writer,
        })
    }

    /// Reads one CR/LF-terminated line, stripped of its trailing whitespace.
    ///
    /// An empty string return on a non-EOF read is legal (blank line); EOF
    /// before any bytes are seen is reported as an `Io` error so callers
    /// can tell "peer hung up" apart from "peer sent a blank line".
    pub fn read_line(&mut self) -> Result<String, Error> {
        let mut line = String::new();
        let n = self.reader.read_line(&mut line)?;
        if n == 0 {
            return Err(Error::Io {
                source: std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "connection closed before line was terminated",
                ),
            });
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    fn write_line(&mut self, line: &str) -> Result<(), Error> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Sends `payload` and blocks for the peer's ACK.
    pub fn send(&mut self, payload: &[u8]) -> Result<(), Error> {
        self.write_line(&payload.len().to_string())?;
        self.writer.write_all(payload)?;
        self.writer.flush()?;

        let ack = self.read_line()?;
        if ack != ACK {
            return Err(Error::Protocol {
                reason: format!("expected ack, got {:?}", ack),
            });
        }
        Ok(())
    }

    /// Reads one framed payload (or the QUIT sentinel) and, for a payload,
    /// replies with an ACK.
    pub fn recv(&mut self) -> Result<Recv, Error> {
        let line = self.read_line()?;
        if line == QUIT {
            return Ok(Recv::Quit);
        }

        let len: usize = line.parse().map_err(|_| Error::Protocol {
            reason: format!("malformed length line {:?}", line),
        })?;

        let mut buf = vec![0u8; len];
        std::io::Read::read_exact(&mut self.reader, &mut buf)?;

        self.write_line(ACK)?;
        self.writer.flush()?;

        Ok(Recv::Payload(buf))
    }

    /// Sends the out-of-band `quit` line with no length prefix and no ACK
    /// expectation; best-effort only (used during shutdown, where the peer
    /// may already be gone).
    pub fn send_quit(&mut self) {
        let _ = self.write_line(QUIT);
        let _ = self.writer.flush();
    }
}
