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

//! Per-region accumulation of used bytes and declared totals.
//!
//! Records are collected first and resolved in `finish`, so the result does
//! not depend on whether a map prints its top-level table before or after
//! the per-object breakdown.

use std::collections::{HashMap, HashSet};

use log::{debug, trace};

use crate::classifier::{RawRecord, Role};
use crate::range::{union_size, AddressRange};
use crate::region::{PerRegion, Region};
use crate::registry::RegionRegistry;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct AccumulatorCounters {
    /// (name, address) pairs already counted for the same region
    pub duplicates: usize,
    /// Section records no rule claimed
    pub ignored: usize,
}

/// A breakdown row, kept with its run-time range so it can be matched
/// against the output section it belongs to.
struct BreakdownRow {
    run: AddressRange,
    counted: AddressRange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Accumulated {
    pub used: PerRegion<u64>,
    pub declared: PerRegion<Option<u64>>,
    pub counters: AccumulatorCounters,
}

pub(crate) struct Accumulator<'r> {
    registry: &'r RegionRegistry,
    declared: PerRegion<Option<u64>>,
    // ranges that count towards `used`, at the address relevant to the region
    sections: PerRegion<Vec<AddressRange>>,
    // the same output sections at their run-time address
    section_runs: PerRegion<Vec<AddressRange>>,
    breakdown: PerRegion<Vec<BreakdownRow>>,
    // sections that also hold another reservation, e.g. heap + stack
    combined: PerRegion<Vec<AddressRange>>,
    // sizes of records printed without an address
    unplaced: PerRegion<u64>,
    symbol_sizes: PerRegion<Option<u64>>,
    // values of start/end symbols, keyed by lowercased name
    pair_values: HashMap<String, u64>,
    seen: HashSet<(Region, String, Option<u64>)>,
    counters: AccumulatorCounters,
}

impl<'r> Accumulator<'r> {
    pub fn new(registry: &'r RegionRegistry) -> Self {
        Self {
            registry,
            declared: PerRegion::default(),
            sections: PerRegion::default(),
            section_runs: PerRegion::default(),
            breakdown: PerRegion::default(),
            combined: PerRegion::default(),
            unplaced: PerRegion::default(),
            symbol_sizes: PerRegion::default(),
            pair_values: HashMap::new(),
            seen: HashSet::new(),
            counters: AccumulatorCounters::default(),
        }
    }

    pub fn feed(&mut self, record: RawRecord) {
        match record.role {
            Role::MemoryBlock => self.memory_block(&record),
            Role::OutputSection | Role::InputSection => self.section(&record),
            Role::SymbolSize => {
                self.pair_value(&record.name, record.size);
                self.symbol_size(&record);
            }
            Role::Symbol => {
                if let Some(address) = record.address {
                    self.pair_value(&record.name, address);
                }
            }
        }
    }

    fn memory_block(&mut self, record: &RawRecord) {
        let registry = self.registry;
        for &region in registry.block_regions(&record.name) {
            let slot = self.declared.get_mut(region);
            if slot.is_some() {
                debug!(
                    "line {}: {} already declared, ignoring memory block {}",
                    record.line, region, record.name
                );
                continue;
            }
            debug!(
                "line {}: {} total {} bytes from memory block {}",
                record.line, region, record.size, record.name
            );
            *slot = Some(record.size);
        }
    }

    fn section(&mut self, record: &RawRecord) {
        let registry = self.registry;
        let Some(rule) = registry
            .section_rule(&record.name)
            .filter(|rule| !rule.regions.is_empty())
        else {
            self.counters.ignored += 1;
            return;
        };
        if record.size == 0 {
            return;
        }

        for &region in &rule.regions {
            let key = (region, record.name.clone(), record.address);
            if !self.seen.insert(key) {
                trace!(
                    "line {}: {} at {:x?} already counted for {}",
                    record.line,
                    record.name,
                    record.address,
                    region
                );
                self.counters.duplicates += 1;
                continue;
            }

            let Some(run_address) = record.address else {
                let slot = self.unplaced.get_mut(region);
                *slot = slot.saturating_add(record.size);
                continue;
            };
            // flash holds the load image of initialised data
            let address = match (region, record.load_address) {
                (Region::Flash, Some(load)) => load,
                _ => run_address,
            };
            let run = AddressRange::new(region, run_address, record.size);
            let counted = AddressRange::new(region, address, record.size);

            if rule.combined {
                self.combined.get_mut(region).push(counted);
                if record.role == Role::OutputSection {
                    self.section_runs.get_mut(region).push(run);
                }
                continue;
            }
            match record.role {
                Role::OutputSection => {
                    self.sections.get_mut(region).push(counted);
                    self.section_runs.get_mut(region).push(run);
                }
                _ => self
                    .breakdown
                    .get_mut(region)
                    .push(BreakdownRow { run, counted }),
            }
        }
    }

    fn symbol_size(&mut self, record: &RawRecord) {
        let registry = self.registry;
        for &region in registry.symbol_regions(&record.name) {
            let slot = self.symbol_sizes.get_mut(region);
            if slot.is_none() {
                trace!(
                    "line {}: {} size {} from symbol {}",
                    record.line,
                    region,
                    record.size,
                    record.name
                );
                *slot = Some(record.size);
            }
        }
    }

    fn pair_value(&mut self, name: &str, value: u64) {
        if self.registry.is_pair_symbol(name) {
            self.pair_values
                .entry(name.to_ascii_lowercase())
                .or_insert(value);
        }
    }

    /// `end - start` of the first pair of `region` with both symbols seen.
    fn pair_size(&self, region: Region) -> Option<u64> {
        self.registry.symbol_pairs(region).find_map(|pair| {
            let start = *self.pair_values.get(&pair.start)?;
            let end = *self.pair_values.get(&pair.end)?;
            if end < start {
                debug!("{} ends before it starts, skipping {}", pair.end, region);
                return None;
            }
            Some(end - start)
        })
    }

    pub fn finish(self) -> Accumulated {
        let mut used: PerRegion<u64> = PerRegion::default();

        for region in Region::ALL {
            let runs = self.section_runs.get(region);
            let symbol_size = *self.symbol_sizes.get(region);
            let mut counted: Vec<AddressRange> = self.sections.get(region).clone();
            // breakdown rows inside a counted output section are already in it
            counted.extend(
                self.breakdown
                    .get(region)
                    .iter()
                    .filter(|row| !runs.iter().any(|out| out.encloses(&row.run)))
                    .map(|row| row.counted),
            );
            // a size symbol says how much of a combined reservation is ours
            if symbol_size.is_none() {
                counted.extend(self.combined.get(region).iter().copied());
            }

            debug_assert!(counted.iter().all(|r| r.region == region));

            let unplaced = *self.unplaced.get(region);
            let total = if !counted.is_empty() || unplaced > 0 {
                union_size(&counted).saturating_add(unplaced)
            } else if let Some(size) = symbol_size {
                size
            } else {
                self.pair_size(region).unwrap_or(0)
            };
            debug!("{} used {} bytes from {} ranges", region, total, counted.len());
            *used.get_mut(region) = total;
        }

        Accumulated {
            used,
            declared: self.declared,
            counters: self.counters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;

    fn accumulate(text: &str) -> Accumulated {
        let registry = RegionRegistry::default();
        let mut acc = Accumulator::new(&registry);
        for record in classify(text) {
            acc.feed(record);
        }
        acc.finish()
    }

    #[test]
    fn first_memory_block_sets_the_total() {
        let acc = accumulate(
            "\
Memory Configuration

Name             Origin             Length             Attributes
FLASH            0x08000000         0x00080000         xr
FLASH_BANK2      0x08080000         0x00080000         xr
RAM              0x20000000         0x00020000         xrw
",
        );
        assert_eq!(*acc.declared.get(Region::Flash), Some(0x80000));
        assert_eq!(*acc.declared.get(Region::Ram), Some(0x20000));
        assert_eq!(*acc.declared.get(Region::Stack), None);
        assert_eq!(*acc.used.get(Region::Flash), 0);
    }

    #[test]
    fn repeated_name_and_address_counts_once() {
        let acc = accumulate(
            "\
.text           0x08000000     0x4000
.text           0x08000000     0x4000
",
        );
        assert_eq!(*acc.used.get(Region::Flash), 0x4000);
        assert_eq!(acc.counters.duplicates, 1);
    }

    #[test]
    fn breakdown_inside_an_output_section_is_not_added() {
        let acc = accumulate(
            "\
.text           0x08000000      0x300
 .text          0x08000000      0x100 main.o
 .text.foo      0x08000100      0x200 foo.o
.bss            0x20000000       0x40
 .bss           0x20000000       0x20 main.o
 COMMON         0x20000020       0x20 main.o
",
        );
        assert_eq!(*acc.used.get(Region::Flash), 0x300);
        assert_eq!(*acc.used.get(Region::Ram), 0x40);
    }

    #[test]
    fn breakdown_alone_is_counted() {
        let acc = accumulate(
            "\
 .text.a        0x08000000      0x100 a.o
 .text.b        0x08000100      0x100 b.o
 .rodata        0x08000200       0x80 b.o
",
        );
        assert_eq!(*acc.used.get(Region::Flash), 0x280);
    }

    #[test]
    fn initialised_data_counts_in_flash_and_ram() {
        let acc = accumulate(
            "\
.text           0x08000000     0x1000
.data           0x20000000      0x100 load address 0x08001000
 .data          0x20000000      0x100 main.o
.bss            0x20000100      0x200
",
        );
        assert_eq!(*acc.used.get(Region::Flash), 0x1100);
        assert_eq!(*acc.used.get(Region::Ram), 0x300);
    }

    #[test]
    fn overlapping_sections_under_different_names_merge() {
        let acc = accumulate(
            "\
.bss            0x20000000      0x200
.noinit         0x20000100      0x200
",
        );
        assert_eq!(*acc.used.get(Region::Ram), 0x300);
    }

    #[test]
    fn stack_symbol_fills_in_without_a_stack_section() {
        let acc = accumulate(
            "\
                0x00000400                _Min_Stack_Size = 0x400
                0x00000800                __stack_size__ = 0x800
",
        );
        assert_eq!(*acc.used.get(Region::Stack), 0x400);

        let acc = accumulate(
            "\
                0x00000400                _Min_Stack_Size = 0x400
.stack          0x20001000      0x800
",
        );
        assert_eq!(*acc.used.get(Region::Stack), 0x800);
    }

    #[test]
    fn stack_size_symbol_replaces_heap_and_stack_reservation() {
        let acc = accumulate(
            "\
                0x00000200                _Min_Heap_Size = 0x200
                0x00000400                _Min_Stack_Size = 0x400
._user_heap_stack
                0x20000100      0x600
 *fill*         0x20000100      0x600
",
        );
        assert_eq!(*acc.used.get(Region::Stack), 0x400);

        // without the symbol the whole reservation is the best figure
        let acc = accumulate(
            "\
._user_heap_stack
                0x20000100      0x600
",
        );
        assert_eq!(*acc.used.get(Region::Stack), 0x600);
    }

    #[test]
    fn stack_from_start_and_end_symbols() {
        let acc = accumulate(
            "\
                0x2001fc00                _sstack
                0x20020000                _estack = (ORIGIN (RAM) + LENGTH (RAM))
",
        );
        assert_eq!(*acc.used.get(Region::Stack), 0x400);

        let acc = accumulate(
            "\
                0x20020000                __stack_end__ = .
                0x2001f800                __stack_start__ = .
",
        );
        assert_eq!(*acc.used.get(Region::Stack), 0x800);
    }

    #[test]
    fn stack_symbols_yield_to_sections_and_sizes() {
        let acc = accumulate(
            "\
                0x2001fc00                _sstack
                0x20020000                _estack
.stack          0x2001f000      0x200
",
        );
        assert_eq!(*acc.used.get(Region::Stack), 0x200);

        let acc = accumulate(
            "\
                0x00000100                _Min_Stack_Size = 0x100
                0x2001fc00                _sstack
                0x20020000                _estack
",
        );
        assert_eq!(*acc.used.get(Region::Stack), 0x100);

        // only one end of a pair is not a range
        let acc = accumulate("                0x20020000                _estack = .\n");
        assert_eq!(*acc.used.get(Region::Stack), 0);

        let acc = accumulate(
            "\
                0x20020000                _sstack
                0x2001fc00                _estack
",
        );
        assert_eq!(*acc.used.get(Region::Stack), 0);
    }

    #[test]
    fn unclaimed_and_empty_sections_are_ignored() {
        let acc = accumulate(
            "\
.debug_info     0x00000000     0x9000
.comment        0x00000000       0x40
.bss            0x20000000        0x0
",
        );
        assert_eq!(acc.counters.ignored, 2);
        assert!(acc.used.iter().all(|(_, used)| *used == 0));
    }
}
