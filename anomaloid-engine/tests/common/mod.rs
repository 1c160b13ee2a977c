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
//! Shared helpers for integration tests

#![allow(dead_code)]

use anomaloid_engine::config::SpawnConfig;
use anomaloid_engine::ecs::components::{Mass, Position};
use anomaloid_engine::ecs::{Entity, World};
use anomaloid_engine::error::INTEGRITY_TARGET;
use anomaloid_engine::random::SeededRandom;
use anomaloid_engine::spawner::Spawner;
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::cell::RefCell;
use std::sync::Once;

/// One captured log line
#[derive(Debug, Clone)]
pub struct Captured {
    pub level: Level,
    pub target: String,
    pub message: String,
}

thread_local! {
    static RECORDS: RefCell<Vec<Captured>> = RefCell::new(Vec::new());
}

/// Logger that keeps records per test thread
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        RECORDS.with(|records| {
            records.borrow_mut().push(Captured {
                level: record.level(),
                target: record.target().to_string(),
                message: record.args().to_string(),
            })
        });
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT: Once = Once::new();

/// Install the capture logger and forget this thread's earlier records
pub fn capture_logs() {
    INIT.call_once(|| {
        if log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    });
    RECORDS.with(|records| records.borrow_mut().clear());
}

/// Records captured on this thread since the last `capture_logs`
pub fn captured() -> Vec<Captured> {
    RECORDS.with(|records| records.borrow().clone())
}

/// Number of data-integrity warnings captured on this thread
pub fn integrity_warnings() -> usize {
    captured()
        .iter()
        .filter(|c| c.level == Level::Warn && c.target == INTEGRITY_TARGET)
        .count()
}

/// Warning messages captured on this thread
pub fn warnings() -> Vec<String> {
    captured()
        .into_iter()
        .filter(|c| c.level == Level::Warn)
        .map(|c| c.message)
        .collect()
}

/// Spawn an anomaloid with the default spawn settings
pub fn anomaloid(world: &mut World, mass: f64, x: f64, y: f64) -> Entity {
    let spawner = Spawner::new(SpawnConfig::default()).unwrap();
    let mut rng = SeededRandom::from_seed(0);
    spawner
        .spawn(world, &mut rng, Mass::new(mass), Position::new(x, y))
        .unwrap()
}
