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

//! Rendering of an `Analysis` for the terminal and for JSON consumers.
//!
//! This is a pure consumer of the engine's output: figures are converted to
//! kilobytes exactly once here, and the pass/fail threshold is a parameter
//! that never reaches the engine.

use std::fmt::Write;

use serde_json::{json, Value};

use crate::region::Region;
use crate::stats::{Analysis, RegionUsage};

/// PASS/FAIL against `threshold`, or NO DATA when the map declared no size.
fn status(analysis: &Analysis, usage: &RegionUsage, threshold: f64) -> &'static str {
    if analysis.missing_totals.contains(&usage.region) {
        "NO DATA"
    } else if usage.passes(threshold) {
        "PASS"
    } else {
        "FAIL"
    }
}

/// Plain-text usage table in kilobytes.
pub fn render_table(analysis: &Analysis, threshold: f64) -> String {
    let kb = analysis.stats.to_kilobytes();
    let mut out = String::new();

    let _ = writeln!(
        out,
        "{:<8}{:>12}{:>12}{:>12}{:>10}  Status",
        "Type", "Total (KB)", "Used (KB)", "Free (KB)", "Usage"
    );
    for region in Region::ALL {
        let usage = kb.usage(region);
        let status = status(analysis, &usage, threshold);
        let _ = writeln!(
            out,
            "{:<8}{:>12.2}{:>12.2}{:>12.2}{:>9.2}%  {}",
            region.as_str(),
            usage.total,
            usage.used,
            usage.free,
            usage.percent,
            status
        );
    }

    for region in analysis.stats.overcommitted() {
        let _ = writeln!(out, "warning: {} usage exceeds its declared size", region);
    }
    if analysis.partial {
        let missing: Vec<&str> = analysis.missing_totals.iter().map(|r| r.as_str()).collect();
        let _ = writeln!(out, "note: no declared size for {}", missing.join(", "));
    }
    out
}

/// JSON document with byte figures, kilobyte rows and the threshold verdicts.
/// `pass` is null for a region without a declared size.
pub fn render_json(analysis: &Analysis, threshold: f64) -> Value {
    let kb = analysis.stats.to_kilobytes();
    let rows: Vec<Value> = Region::ALL
        .iter()
        .map(|&region| {
            let usage = kb.usage(region);
            let status = status(analysis, &usage, threshold);
            let pass = match status {
                "NO DATA" => Value::Null,
                _ => Value::Bool(usage.passes(threshold)),
            };
            json!({
                "region": region,
                "total_kb": usage.total,
                "used_kb": usage.used,
                "free_kb": usage.free,
                "percent": usage.percent,
                "status": status,
                "pass": pass,
            })
        })
        .collect();

    json!({
        "stats": analysis.stats,
        "partial": analysis.partial,
        "missing_totals": analysis.missing_totals,
        "overcommitted": analysis.stats.overcommitted(),
        "threshold": threshold,
        "regions": rows,
    })
}
