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

use anyhow::Result;
use clap::{Parser, Subcommand};

use map_analyzer::logging::init_logging;
use map_analyzer::run::{run_analyze, run_rules, AnalyzeArgs};

#[derive(Parser, Debug)]
#[command(name = "map-analyzer", version, about = "STACK/FLASH/RAM usage from a linker map")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze a linker map and print its memory usage
    Analyze(AnalyzeArgs),
    /// Print the built-in section/memory rule table as JSON
    Rules,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Analyze(args) => {
            let _logger = init_logging(args.debug)?;
            run_analyze(args)
        }
        Command::Rules => run_rules(),
    }
}
