// Copyright 2025 John Brosnihan
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
//! Logger setup
//!
//! The library only emits through the `log` facade. Binaries and demos call
//! [`init`] once to install an `env_logger` backend; `RUST_LOG` overrides
//! the default level.

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Install the global logger
///
/// Shows `info` and above by default, or `debug` and above when `verbose`
/// is set. Returns false if a logger was already installed, which makes
/// repeated calls from tests harmless.
pub fn init(verbose: bool) -> bool {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    init_with_filter(&level.to_string())
}

/// Install the global logger with an explicit default filter
///
/// `filter` uses `env_logger` syntax, for example
/// `"info,anomaloid_engine::integrity=warn"`.
pub fn init_with_filter(filter: &str) -> bool {
    let env = Env::default().default_filter_or(filter);
    Builder::from_env(env).format_timestamp_millis().try_init().is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_harmless() {
        init(false);
        assert!(!init(true));
    }
}
