// Copyright (c) 2026 MCU-Debug Authors.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Logger setup for the command-line front end. The library itself only
//! emits through the `log` facade.

use std::sync::OnceLock;

use anyhow::{Context, Result};
use flexi_logger::{LogSpecification, Logger, LoggerHandle};

static DEBUG_ENABLED: OnceLock<bool> = OnceLock::new();

/// Record the debug flag. Only the first call has an effect.
pub fn set_debug(enabled: bool) {
    DEBUG_ENABLED.set(enabled).ok();
}

pub fn is_debug() -> bool {
    *DEBUG_ENABLED.get().unwrap_or(&false)
}

/// Level spec: `debug` when asked for, otherwise `RUST_LOG` or `warn`.
pub fn log_spec(debug: bool) -> LogSpecification {
    if debug {
        return LogSpecification::debug();
    }
    LogSpecification::env_or_parse("warn").unwrap_or_else(|_| LogSpecification::warn())
}

/// Start logging to stderr. Keep the handle alive for the life of the program.
pub fn init_logging(debug: bool) -> Result<LoggerHandle> {
    set_debug(debug);
    Logger::with(log_spec(debug))
        .log_to_stderr()
        .format(flexi_logger::default_format)
        .start()
        .context("failed to start logger")
}
