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

//! Data-driven mapping from section, symbol and memory-block names to regions.
//!
//! Linker vendors name things differently, so nothing here is keyed on a
//! toolchain. A new toolchain is supported by loading a different rule table,
//! either from JSON or by building a `RuleTable` in code.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Exact,
    Prefix,
    Contains,
}

/// One row of a rule table. An empty `regions` list is an explicit IGNORED.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameRule {
    pub pattern: String,
    pub kind: MatchKind,
    pub regions: Vec<Region>,
    /// The section also reserves space outside its regions (heap + stack).
    /// A size symbol for the region replaces it when one is present.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub combined: bool,
}

impl NameRule {
    pub fn new(pattern: &str, kind: MatchKind, regions: &[Region]) -> Self {
        Self {
            pattern: pattern.to_string(),
            kind,
            regions: regions.to_vec(),
            combined: false,
        }
    }

    pub fn combined(mut self) -> Self {
        self.combined = true;
        self
    }

    // `name` must already be lowercased
    fn matches(&self, name: &str) -> bool {
        match self.kind {
            MatchKind::Exact => name == self.pattern,
            MatchKind::Prefix => name.starts_with(&self.pattern),
            MatchKind::Contains => name.contains(&self.pattern),
        }
    }
}

/// Two symbols bounding a reserved range, e.g. `_sstack` / `_estack`.
/// Names match exactly, ignoring case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolPair {
    pub start: String,
    pub end: String,
    pub region: Region,
}

impl SymbolPair {
    pub fn new(start: &str, end: &str, region: Region) -> Self {
        Self {
            start: start.to_string(),
            end: end.to_string(),
            region,
        }
    }
}

/// Serializable form of the registry, as read from or written to a rules file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleTable {
    /// Output and input section names (`.text`, `.bss.foo`, `COMMON`, ...)
    pub sections: Vec<NameRule>,
    /// Symbols whose assigned value is a size (`_Min_Stack_Size = 0x400`)
    #[serde(default)]
    pub symbols: Vec<NameRule>,
    /// Start/end symbols giving a region's size when no section or size
    /// symbol does
    #[serde(default)]
    pub symbol_pairs: Vec<SymbolPair>,
    /// Memory-configuration block names that provide a region's declared total
    pub memory_blocks: Vec<NameRule>,
}

/// Immutable after construction. Matching is case-insensitive and the first
/// matching rule wins; names no rule matches are ignored.
#[derive(Debug, Clone)]
pub struct RegionRegistry {
    table: RuleTable,
}

impl Default for RegionRegistry {
    fn default() -> Self {
        Self::new(gnu_rule_table())
    }
}

impl RegionRegistry {
    pub fn new(mut table: RuleTable) -> Self {
        for rule in table
            .sections
            .iter_mut()
            .chain(table.symbols.iter_mut())
            .chain(table.memory_blocks.iter_mut())
        {
            rule.pattern = rule.pattern.to_ascii_lowercase();
        }
        for pair in table.symbol_pairs.iter_mut() {
            pair.start = pair.start.to_ascii_lowercase();
            pair.end = pair.end.to_ascii_lowercase();
        }
        Self { table }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let table: RuleTable = serde_json::from_str(json).context("invalid rule table")?;
        Ok(Self::new(table))
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read rule table {}", path.display()))?;
        Self::from_json_str(&text)
            .with_context(|| format!("failed to load rule table {}", path.display()))
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    pub fn section_rule(&self, name: &str) -> Option<&NameRule> {
        let name = name.to_ascii_lowercase();
        self.table.sections.iter().find(|rule| rule.matches(&name))
    }

    pub fn section_regions(&self, name: &str) -> &[Region] {
        first_match(&self.table.sections, name)
    }

    pub fn symbol_regions(&self, name: &str) -> &[Region] {
        first_match(&self.table.symbols, name)
    }

    pub fn block_regions(&self, name: &str) -> &[Region] {
        first_match(&self.table.memory_blocks, name)
    }

    /// Pairs bounding `region`, in table order.
    pub fn symbol_pairs(&self, region: Region) -> impl Iterator<Item = &SymbolPair> {
        self.table
            .symbol_pairs
            .iter()
            .filter(move |pair| pair.region == region)
    }

    /// Whether `name` is the start or end of any symbol pair.
    pub fn is_pair_symbol(&self, name: &str) -> bool {
        self.table
            .symbol_pairs
            .iter()
            .any(|pair| {
                pair.start.eq_ignore_ascii_case(name) || pair.end.eq_ignore_ascii_case(name)
            })
    }
}

fn first_match<'a>(rules: &'a [NameRule], name: &str) -> &'a [Region] {
    let name = name.to_ascii_lowercase();
    rules
        .iter()
        .find(|rule| rule.matches(&name))
        .map(|rule| rule.regions.as_slice())
        .unwrap_or(&[])
}

/// Rules for the GNU ld conventions used by most Cortex-M and RISC-V SDKs.
pub fn gnu_rule_table() -> RuleTable {
    use MatchKind::*;
    use Region::*;

    let sections = vec![
        NameRule::new(".stack", Exact, &[Stack]),
        NameRule::new("stack", Exact, &[Stack]),
        NameRule::new("_stack", Exact, &[Stack]),
        // heap and stack in one reservation; `_Min_Stack_Size` is preferred
        NameRule::new("._user_heap_stack", Exact, &[Stack]).combined(),
        NameRule::new(".stack", Prefix, &[Stack]),
        NameRule::new(".isr_vector", Prefix, &[Flash]),
        NameRule::new(".vectors", Prefix, &[Flash]),
        NameRule::new(".text", Prefix, &[Flash]),
        NameRule::new(".rodata", Prefix, &[Flash]),
        NameRule::new(".srodata", Prefix, &[Flash]),
        NameRule::new(".arm", Exact, &[Flash]),
        NameRule::new(".arm.extab", Prefix, &[Flash]),
        NameRule::new(".arm.exidx", Prefix, &[Flash]),
        NameRule::new(".preinit_array", Prefix, &[Flash]),
        NameRule::new(".init", Prefix, &[Flash]),
        NameRule::new(".fini", Prefix, &[Flash]),
        // the load image lives in flash, the run-time copy in ram
        NameRule::new(".data", Prefix, &[Flash, Ram]),
        NameRule::new(".sdata", Prefix, &[Flash, Ram]),
        NameRule::new(".bss", Prefix, &[Ram]),
        NameRule::new(".sbss", Prefix, &[Ram]),
        NameRule::new(".noinit", Prefix, &[Ram]),
        NameRule::new(".heap", Exact, &[Ram]),
        NameRule::new("common", Exact, &[Ram]),
    ];

    let symbols = vec![
        NameRule::new("_min_stack_size", Exact, &[Stack]),
        NameRule::new("__stack_size__", Exact, &[Stack]),
        NameRule::new("__stack_size", Exact, &[Stack]),
        NameRule::new("_stack_size", Exact, &[Stack]),
    ];

    let symbol_pairs = vec![
        SymbolPair::new("_sstack", "_estack", Stack),
        SymbolPair::new("__stack_start__", "__stack_end__", Stack),
        SymbolPair::new("__stacklimit", "__stacktop", Stack),
    ];

    let memory_blocks = vec![
        NameRule::new("stack", Prefix, &[Stack]),
        NameRule::new("flash", Prefix, &[Flash]),
        NameRule::new("rom", Prefix, &[Flash]),
        NameRule::new("irom", Prefix, &[Flash]),
        NameRule::new("m_text", Exact, &[Flash]),
        NameRule::new("ram", Prefix, &[Ram]),
        NameRule::new("sram", Prefix, &[Ram]),
        NameRule::new("iram", Prefix, &[Ram]),
        NameRule::new("m_data", Exact, &[Ram]),
    ];

    RuleTable {
        sections,
        symbols,
        symbol_pairs,
        memory_blocks,
    }
}
