// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use custom_error::custom_error;

custom_error! {
    /// Crate-wide error type.
    ///
    /// The core never retries on any of these; `Protocol`/`Io` are caught at
    /// the proxy boundary and turned into `Job::put_result(None)` plus a
    /// logged warning rather than propagated to application code.
    pub Error
    Io{source: std::io::Error} = "I/O error: {source}",
    Protocol{reason: String} = "protocol violation: {reason}",
    Handshake{reason: String} = "worker handshake failed: {reason}",
    Config{reason: String} = "invalid pool configuration: {reason}",
}
