// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

//! Optional logging bootstrap (C7). The core never calls this itself —
//! every diagnostic goes through the plain `log` facade, and the core
//! behaves identically whether or not a logger backend is installed.
//! Application binaries that want colored, leveled console output can call
//! [`init`] once at startup.

use flexi_logger::{Logger, LoggerHandle};

/// Starts `flexi_logger` with `RUST_LOG`/`info` as the default filter
/// spec. Returns a handle that must be kept alive for the duration of the
/// process; dropping it detaches the logger.
pub fn init() -> Result<LoggerHandle, flexi_logger::FlexiLoggerError> {
    Logger::try_with_env_or_str("info")?.start()
}
