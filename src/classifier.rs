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

//! Line classifier for textual linker maps.
//!
//! Tags each line of a map by its structural role and yields the interesting
//! ones as `RawRecord`s. The grammar is loose: GNU ld layout is
//! understood in detail (memory configuration table, output sections, the
//! per-object breakdown, wrapped names, symbol assignments) and any other
//! toolchain that prints `name address size` rows is picked up by the same
//! patterns. Anything unrecognised is noise and is dropped, never an error.

use log::trace;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::iter::Enumerate;
use std::str::Lines;

macro_rules! static_regex {
    ($name:ident, $str:expr) => {
        static $name: Lazy<Regex> = Lazy::new(|| Regex::new($str).unwrap());
    };
}

// Headings that switch the table being read
static_regex!(MEMORY_CONFIG_START, r"(?i)^\s*memory configuration\s*$");
static_regex!(MEMORY_MAP_START, r"(?i)^\s*linker script and memory map\s*$");
static_regex!(
    SKIPPED_START,
    r"(?i)^\s*(discarded input sections|allocating common symbols|archive member included.*|cross reference table)\s*$"
);

// `FLASH  0x08000000  0x00100000  xr`
static_regex!(
    MEMORY_ROW,
    r"^(?P<name>\S+)\s+(?P<origin>0[xX][0-9A-Fa-f]+|[0-9][0-9A-Fa-f]*[hH]?)\s+(?P<length>0[xX][0-9A-Fa-f]+|[0-9][0-9A-Fa-f]*[hH]?)(?:\s+\S+)?\s*$"
);
// `FLASH (rx) : ORIGIN = 0x08000000, LENGTH = 512K`, also `FLASH: origin 0x0, length 0x10000`
static_regex!(
    MEMORY_COMMAND,
    r"(?i)^\s*(?P<name>[a-z_][\w.]*)\s*(?:\([^)]*\))?\s*:\s*(?:origin|org|o)\s*=?\s*(?P<origin>[0-9a-fxh]+)\s*,\s*(?:length|len|l)\s*=?\s*(?P<length>[0-9a-fxh]+[km]?)\s*$"
);
// `.text  0x08000000  0x4000` at column 0, ` .text  0x08000000  0x100 main.o` indented
static_regex!(
    SECTION_ROW,
    r"^(?P<indent>\s*)(?P<name>[^\s*0-9][^\s]*)\s+(?P<addr>0[xX][0-9A-Fa-f]+|[0-9][0-9A-Fa-f]*[hH]?)\s+(?P<size>0[xX][0-9A-Fa-f]+|[0-9][0-9A-Fa-f]*[hH]?)(?P<rest>\s.*)?$"
);
// `.text size 0x4000`, a summary row without an address
static_regex!(
    SIZE_ROW,
    r"(?i)^(?P<name>[^\s*0-9][^\s]*)\s+size\s*[=:]?\s*(?P<size>0x[0-9a-f]+|[0-9][0-9a-f]*h?)\s*$"
);
// long names are printed alone and the numbers follow on the next line
static_regex!(WRAPPED_NAME, r"^(?P<indent>\s*)(?P<name>\.\S+|COMMON)\s*$");
static_regex!(
    CONTINUATION,
    r"^\s+(?P<addr>0[xX][0-9A-Fa-f]+)\s+(?P<size>0[xX][0-9A-Fa-f]+|[0-9]+)(?P<rest>\s.*)?$"
);
static_regex!(LOAD_ADDRESS, r"(?i)load address\s+(?P<addr>0x[0-9a-f]+)");
// `0x00000400   _Min_Stack_Size = 0x400` or a bare `_Min_Stack_Size = 0x400;`
static_regex!(
    SYMBOL_ASSIGN,
    r"^\s*(?:(?P<value>0[xX][0-9A-Fa-f]+)\s+)?(?:PROVIDE(?:_HIDDEN)?\s*\(\s*)?(?P<name>[A-Za-z_.$][\w.$]*)\s*=\s*(?P<expr>[^;]*?)\s*\)?\s*;?\s*$"
);
// `                0x08000100                main`
static_regex!(
    SYMBOL_ROW,
    r"^\s+(?P<addr>0[xX][0-9A-Fa-f]+)\s+(?P<name>[A-Za-z_.$~][^=]*?)\s*$"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    /// Memory-configuration row: address is the origin, size the length
    MemoryBlock,
    /// Top-level section table row
    OutputSection,
    /// Per-object breakdown row nested under an output section
    InputSection,
    /// Symbol assignment; `size` holds the assigned value
    SymbolSize,
    /// Plain `address name` symbol row
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawRecord {
    pub role: Role,
    pub name: String,
    pub address: Option<u64>,
    pub load_address: Option<u64>,
    pub size: u64,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ClassifierCounters {
    pub lines: usize,
    pub records: usize,
    pub noise: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Table {
    /// Section tables, or any text before the first heading
    Body,
    MemoryConfig,
    /// Discarded sections, common-symbol allocation, archive members
    Skipped,
}

struct Pending {
    name: String,
    role: Role,
}

/// Parse an unsigned number in the base the map presents it in: `0x` prefix
/// or `h` suffix for hex, decimal otherwise. `K`/`M` multipliers are accepted
/// as in linker-script `LENGTH` expressions.
pub fn parse_number(token: &str) -> Option<u64> {
    let token = token.trim();
    if let Some(hex) = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
    {
        return u64::from_str_radix(hex, 16).ok();
    }
    let (digits, multiplier) = match token.as_bytes().last()? {
        b'k' | b'K' => (&token[..token.len() - 1], 1024),
        b'm' | b'M' => (&token[..token.len() - 1], 1024 * 1024),
        b'h' | b'H' => {
            let hex = &token[..token.len() - 1];
            if !hex.starts_with(|c: char| c.is_ascii_digit()) {
                return None;
            }
            return u64::from_str_radix(hex, 16).ok();
        }
        _ => (token, 1),
    };
    digits
        .parse::<u64>()
        .ok()
        .and_then(|v| v.checked_mul(multiplier))
}

/// Lazily classify `text`. Restart by calling again on the same input.
pub(crate) fn classify(text: &str) -> Records<'_> {
    Records {
        lines: text.lines().enumerate(),
        table: Table::Body,
        pending: None,
        counters: ClassifierCounters::default(),
    }
}

pub(crate) struct Records<'a> {
    lines: Enumerate<Lines<'a>>,
    table: Table,
    pending: Option<Pending>,
    counters: ClassifierCounters,
}

impl Records<'_> {
    pub fn counters(&self) -> ClassifierCounters {
        self.counters
    }

    fn classify_line(&mut self, line: &str, line_no: usize) -> Option<RawRecord> {
        if line.trim().is_empty() {
            self.pending = None;
            return None;
        }

        if MEMORY_CONFIG_START.is_match(line) {
            self.switch_table(Table::MemoryConfig, line_no);
            return None;
        }
        if MEMORY_MAP_START.is_match(line) {
            self.switch_table(Table::Body, line_no);
            return None;
        }
        if SKIPPED_START.is_match(line) {
            self.switch_table(Table::Skipped, line_no);
            return None;
        }

        match self.table {
            Table::Skipped => None,
            Table::MemoryConfig => memory_row(line, line_no),
            Table::Body => self.body_line(line, line_no),
        }
    }

    fn switch_table(&mut self, table: Table, line_no: usize) {
        trace!("line {}: entering {:?}", line_no, table);
        self.table = table;
        self.pending = None;
    }

    fn body_line(&mut self, line: &str, line_no: usize) -> Option<RawRecord> {
        if let Some(pending) = self.pending.take() {
            if let Some(caps) = CONTINUATION.captures(line) {
                return section_record(pending.role, pending.name, &caps, line_no);
            }
        }

        if let Some(caps) = MEMORY_COMMAND.captures(line) {
            let origin = parse_number(&caps["origin"]);
            let length = parse_number(&caps["length"])?;
            return Some(RawRecord {
                role: Role::MemoryBlock,
                name: caps["name"].to_string(),
                address: origin,
                load_address: None,
                size: length,
                line: line_no,
            });
        }

        if let Some(caps) = SYMBOL_ASSIGN.captures(line) {
            let name = &caps["name"];
            if name == "." {
                return None;
            }
            // the value column holds the evaluated expression when present
            let value = match caps.name("value") {
                Some(v) => parse_number(v.as_str()),
                None => parse_number(&caps["expr"]),
            }?;
            return Some(RawRecord {
                role: Role::SymbolSize,
                name: name.to_string(),
                address: None,
                load_address: None,
                size: value,
                line: line_no,
            });
        }

        if let Some(caps) = SECTION_ROW.captures(line) {
            let role = if caps["indent"].is_empty() {
                Role::OutputSection
            } else {
                Role::InputSection
            };
            return section_record(role, caps["name"].to_string(), &caps, line_no);
        }

        if let Some(caps) = SIZE_ROW.captures(line) {
            let size = parse_number(&caps["size"])?;
            return Some(RawRecord {
                role: Role::OutputSection,
                name: caps["name"].to_string(),
                address: None,
                load_address: None,
                size,
                line: line_no,
            });
        }

        if let Some(caps) = WRAPPED_NAME.captures(line) {
            let role = if caps["indent"].is_empty() {
                Role::OutputSection
            } else {
                Role::InputSection
            };
            self.pending = Some(Pending {
                name: caps["name"].to_string(),
                role,
            });
            return None;
        }

        if let Some(caps) = SYMBOL_ROW.captures(line) {
            return Some(RawRecord {
                role: Role::Symbol,
                name: caps["name"].to_string(),
                address: parse_number(&caps["addr"]),
                load_address: None,
                size: 0,
                line: line_no,
            });
        }

        None
    }
}

impl Iterator for Records<'_> {
    type Item = RawRecord;

    fn next(&mut self) -> Option<RawRecord> {
        while let Some((idx, line)) = self.lines.next() {
            self.counters.lines += 1;
            let waiting = self.pending.is_some();
            match self.classify_line(line, idx + 1) {
                Some(record) => {
                    self.counters.records += 1;
                    return Some(record);
                }
                // a wrapped name is half a record, not noise
                None if !waiting && self.pending.is_some() => {}
                None => self.counters.noise += 1,
            }
        }
        None
    }
}

fn memory_row(line: &str, line_no: usize) -> Option<RawRecord> {
    let caps = MEMORY_ROW.captures(line)?;
    let name = &caps["name"];
    // `*default*` covers the whole address space
    if name.starts_with('*') {
        return None;
    }
    let origin = parse_number(&caps["origin"]);
    let Some(length) = parse_number(&caps["length"]) else {
        trace!("line {}: unparsable memory length in {:?}", line_no, line);
        return None;
    };
    Some(RawRecord {
        role: Role::MemoryBlock,
        name: name.to_string(),
        address: origin,
        load_address: None,
        size: length,
        line: line_no,
    })
}

fn section_record(role: Role, name: String, caps: &Captures, line_no: usize) -> Option<RawRecord> {
    let (Some(address), Some(size)) = (parse_number(&caps["addr"]), parse_number(&caps["size"]))
    else {
        trace!("line {}: unparsable section numbers for {}", line_no, name);
        return None;
    };
    let load_address = caps
        .name("rest")
        .and_then(|rest| LOAD_ADDRESS.captures(rest.as_str()))
        .and_then(|c| parse_number(&c["addr"]));
    Some(RawRecord {
        role,
        name,
        address: Some(address),
        load_address,
        size,
        line: line_no,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(text: &str) -> Vec<RawRecord> {
        classify(text).collect()
    }

    #[test]
    fn numbers_follow_the_presented_base() {
        assert_eq!(parse_number("0x10000"), Some(65536));
        assert_eq!(parse_number("0X1f"), Some(31));
        assert_eq!(parse_number("4096"), Some(4096));
        assert_eq!(parse_number("1000h"), Some(4096));
        assert_eq!(parse_number("0FFh"), Some(255));
        assert_eq!(parse_number("512K"), Some(512 * 1024));
        assert_eq!(parse_number("2M"), Some(2 * 1024 * 1024));
        assert_eq!(parse_number("0x"), None);
        assert_eq!(parse_number("08000abc"), None);
        assert_eq!(parse_number("FFh"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn memory_configuration_rows_are_blocks() {
        let text = "\
Memory Configuration

Name             Origin             Length             Attributes
FLASH            0x08000000         0x00100000         xr
RAM              0x20000000         0x00020000         xrw
*default*        0x00000000         0xffffffff
";
        let recs = records(text);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].role, Role::MemoryBlock);
        assert_eq!(recs[0].name, "FLASH");
        assert_eq!(recs[0].address, Some(0x0800_0000));
        assert_eq!(recs[0].size, 0x0010_0000);
        assert_eq!(recs[1].name, "RAM");
        assert_eq!(recs[1].line, 5);
    }

    #[test]
    fn linker_script_memory_command_is_a_block() {
        let recs = records("  FLASH (rx) : ORIGIN = 0x08000000, LENGTH = 512K\n");
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].role, Role::MemoryBlock);
        assert_eq!(recs[0].size, 512 * 1024);
    }

    #[test]
    fn memory_command_without_equals_signs() {
        let recs = records("FLASH: origin 0x0, length 0x10000\n");
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].role, Role::MemoryBlock);
        assert_eq!(recs[0].name, "FLASH");
        assert_eq!(recs[0].address, Some(0));
        assert_eq!(recs[0].size, 0x10000);
    }

    #[test]
    fn size_rows_have_no_address() {
        let recs = records(".text size 0x4000\n.rodata size: 4096\nFLASH size unknown\n");
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].role, Role::OutputSection);
        assert_eq!(recs[0].name, ".text");
        assert_eq!(recs[0].address, None);
        assert_eq!(recs[0].size, 0x4000);
        assert_eq!(recs[1].size, 4096);
    }

    #[test]
    fn output_and_input_sections_are_told_apart_by_indent() {
        let text = "\
Linker script and memory map

.text           0x08000000     0x4000
 *(.text)
 .text          0x08000000      0x100 build/main.o
                0x08000000                main
 *fill*         0x08000100        0x4
.data           0x20000000      0x100 load address 0x08004000
";
        let recs = records(text);
        let roles: Vec<Role> = recs.iter().map(|r| r.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::OutputSection,
                Role::InputSection,
                Role::Symbol,
                Role::OutputSection
            ]
        );
        assert_eq!(recs[0].size, 0x4000);
        assert_eq!(recs[1].address, Some(0x0800_0000));
        assert_eq!(recs[2].name, "main");
        assert_eq!(recs[3].load_address, Some(0x0800_4000));
        assert_eq!(recs[3].address, Some(0x2000_0000));
    }

    #[test]
    fn wrapped_section_names_are_joined() {
        let text = "\
.text           0x08000000      0x200
 .text.HAL_RCC_OscConfig
                0x08000000      0x1f0 Drivers/stm32f4xx_hal_rcc.o
.isr_vector_with_a_long_name
                0x08000200       0x40
";
        let recs = records(text);
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[1].name, ".text.HAL_RCC_OscConfig");
        assert_eq!(recs[1].role, Role::InputSection);
        assert_eq!(recs[1].size, 0x1f0);
        assert_eq!(recs[2].name, ".isr_vector_with_a_long_name");
        assert_eq!(recs[2].role, Role::OutputSection);
        assert_eq!(recs[2].line, 5);
    }

    #[test]
    fn wrapped_name_without_numbers_is_dropped() {
        let text = "\
 .text.unused

.bss            0x20000000       0x10
";
        let recs = records(text);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].name, ".bss");
    }

    #[test]
    fn symbol_assignments_carry_their_value() {
        let text = "\
                0x00000400                _Min_Stack_Size = 0x400
                0x20020000                _estack = (ORIGIN (RAM) + LENGTH (RAM))
__stack_size__ = 2048;
                0x00000000                . = ALIGN (0x4)
";
        let recs = records(text);
        assert_eq!(recs.len(), 3);
        assert!(recs.iter().all(|r| r.role == Role::SymbolSize));
        assert_eq!(recs[0].name, "_Min_Stack_Size");
        assert_eq!(recs[0].size, 0x400);
        assert_eq!(recs[1].size, 0x2002_0000);
        assert_eq!(recs[2].name, "__stack_size__");
        assert_eq!(recs[2].size, 2048);
    }

    #[test]
    fn discarded_sections_are_never_records() {
        let text = "\
Discarded input sections

 .text          0x00000000       0x14 build/unused.o
 .data          0x00000000        0x4 build/unused.o

Memory Configuration

Name             Origin             Length             Attributes
RAM              0x20000000         0x00020000         xrw

Linker script and memory map

.bss            0x20000000       0x80
";
        let recs = records(text);
        let names: Vec<&str> = recs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["RAM", ".bss"]);
    }

    #[test]
    fn noise_is_counted_not_fatal() {
        let text = "\
GNU ld (GNU Arm Embedded Toolchain) 10.3
Archive member included to satisfy reference by file (symbol)

/usr/lib/libc.a(lib_a-memcpy.o)
                              build/main.o (memcpy)

Linker script and memory map

LOAD build/main.o
.text           0x08000000     0xZZZZ
.rodata         0x08000100     0x80
OUTPUT(build/firmware.elf elf32-littlearm)
";
        let mut it = classify(text);
        let recs: Vec<RawRecord> = it.by_ref().collect();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].name, ".rodata");
        let counters = it.counters();
        assert_eq!(counters.lines, 12);
        assert_eq!(counters.records, 1);
        assert_eq!(counters.noise, 11);
    }

    #[test]
    fn generic_tables_use_decimal_and_suffix_hex() {
        let text = "\
Section          Address     Size
.text            8000000h    1000h
.bss             536870912   512
";
        let recs = records(text);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].address, Some(0x0800_0000));
        assert_eq!(recs[0].size, 0x1000);
        assert_eq!(recs[1].size, 512);
    }
}
