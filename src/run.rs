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

//! Entry points for the `analyze` and `rules` subcommands.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use log::debug;

use crate::logging::is_debug;
use crate::parser::analyze_map_file;
use crate::registry::{gnu_rule_table, RegionRegistry};
use crate::report::{render_json, render_table};
use crate::utils::resolve_map_path;

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Linker map file, as a path or a file:// URI
    pub map: String,

    /// JSON rule table replacing the built-in GNU rules
    #[arg(short = 'r', long = "rules")]
    pub rules: Option<PathBuf>,

    /// Usage percentage a region must reach to be reported as PASS
    #[arg(short = 't', long = "threshold", default_value_t = 50.0)]
    pub threshold: f64,

    /// Print a JSON document instead of a table
    #[arg(long = "json", default_value_t = false)]
    pub json: bool,

    /// Enable debug output
    #[arg(short = 'd', long = "debug", default_value_t = false)]
    pub debug: bool,
}

pub fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let registry = match &args.rules {
        Some(path) => RegionRegistry::from_json_file(path)?,
        None => RegionRegistry::default(),
    };

    let path = resolve_map_path(&args.map);
    debug!("Analyzing {}", path.display());
    let analysis = analyze_map_file(&path, &registry)?;

    if args.json {
        let doc = render_json(&analysis, args.threshold);
        println!(
            "{}",
            serde_json::to_string_pretty(&doc).context("failed to encode report")?
        );
    } else {
        print!("{}", render_table(&analysis, args.threshold));
    }

    if is_debug() {
        eprintln!(
            "{} lines, {} records, {} noise lines, {} duplicates skipped",
            analysis.lines, analysis.records, analysis.noise_lines, analysis.duplicates_skipped
        );
    }
    Ok(())
}

/// Print the built-in rule table, ready to be edited and passed to `--rules`.
pub fn run_rules() -> Result<()> {
    let table = gnu_rule_table();
    println!(
        "{}",
        serde_json::to_string_pretty(&table).context("failed to encode rule table")?
    );
    Ok(())
}
