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

//! Entry points of the analysis engine.
//!
//! Each call reads the whole map, runs classifier → accumulator → assembler
//! on the calling thread and returns. Nothing is cached between calls.

use std::path::Path;
use std::time::Instant;

use log::{debug, info};

use crate::accumulator::Accumulator;
use crate::classifier::classify;
use crate::error::ParseError;
use crate::registry::RegionRegistry;
use crate::stats::{assemble, Analysis, MemoryStats};

/// Parse a linker map with the default GNU rule table.
pub fn parse_map_file(path: impl AsRef<Path>) -> Result<MemoryStats, ParseError> {
    analyze_map_file(path, &RegionRegistry::default()).map(|analysis| analysis.stats)
}

/// Parse a linker map with a caller-supplied rule table.
pub fn analyze_map_file(
    path: impl AsRef<Path>,
    registry: &RegionRegistry,
) -> Result<Analysis, ParseError> {
    let path = path.as_ref();
    let input = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| ParseError::Unreadable {
        input: input.clone(),
        reason: e.to_string(),
    })?;
    let text = decode_text(bytes).ok_or_else(|| ParseError::Unreadable {
        input: input.clone(),
        reason: "binary content, not a text linker map".to_string(),
    })?;
    analyze(&text, registry, input)
}

/// Analyze map text already in memory.
pub fn analyze_map_text(text: &str, registry: &RegionRegistry) -> Result<Analysis, ParseError> {
    analyze(text, registry, "<memory>".to_string())
}

/// UTF-8 if possible, Latin-1 otherwise. `None` for NUL-bearing (binary) data.
pub(crate) fn decode_text(bytes: Vec<u8>) -> Option<String> {
    if bytes.contains(&0) {
        return None;
    }
    let text = match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            debug!("map is not UTF-8, decoding as Latin-1");
            e.into_bytes().iter().map(|&b| b as char).collect()
        }
    };
    match text.strip_prefix('\u{feff}') {
        Some(rest) => Some(rest.to_string()),
        None => Some(text),
    }
}

fn analyze(text: &str, registry: &RegionRegistry, input: String) -> Result<Analysis, ParseError> {
    let now = Instant::now();

    let mut records = classify(text);
    let mut accumulator = Accumulator::new(registry);
    for record in records.by_ref() {
        accumulator.feed(record);
    }
    let classified = records.counters();
    let accumulated = accumulator.finish();
    let (stats, missing_totals) = assemble(&accumulated);

    debug!(
        "{}: {} lines, {} records, {} noise, {} duplicates, {} ignored sections",
        input,
        classified.lines,
        classified.records,
        classified.noise,
        accumulated.counters.duplicates,
        accumulated.counters.ignored
    );

    if stats.is_empty() {
        return Err(ParseError::NoUsableData { input });
    }

    info!(
        "Analyzed {} in {:.2?}: STACK {}/{}, FLASH {}/{}, RAM {}/{} bytes",
        input,
        now.elapsed(),
        stats.stack_used,
        stats.stack_total,
        stats.flash_used,
        stats.flash_total,
        stats.ram_used,
        stats.ram_total
    );

    Ok(Analysis {
        stats,
        partial: !missing_totals.is_empty(),
        missing_totals,
        lines: classified.lines,
        records: classified.records,
        noise_lines: classified.noise,
        duplicates_skipped: accumulated.counters.duplicates,
    })
}
