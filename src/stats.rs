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

use log::warn;
use serde::{Deserialize, Serialize};

use crate::accumulator::Accumulated;
use crate::region::Region;

/**
 * Memory usage of a linked image, in bytes. One (used, total) pair per region.
 *
 * A zero total means the map declared no capacity for that region. `used` may
 * exceed `total`; that is reported as-is so callers can flag the map.
 */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ts_rs::TS)]
#[ts(export, export_to = "../bindings/")]
pub struct MemoryStats {
    pub stack_used: u64,
    pub stack_total: u64,
    pub flash_used: u64,
    pub flash_total: u64,
    pub ram_used: u64,
    pub ram_total: u64,
}

/// `MemoryStats` scaled to kilobytes, as shown in tables and charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KilobyteStats {
    pub stack_used: f64,
    pub stack_total: f64,
    pub flash_used: f64,
    pub flash_total: f64,
    pub ram_used: f64,
    pub ram_total: f64,
}

/// One row of a usage table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionUsage {
    pub region: Region,
    pub used: f64,
    pub total: f64,
    /// Negative when the region is overcommitted
    pub free: f64,
    pub percent: f64,
}

impl RegionUsage {
    fn new(region: Region, used: f64, total: f64) -> Self {
        let percent = if total > 0.0 {
            used * 100.0 / total
        } else {
            0.0
        };
        Self {
            region,
            used,
            total,
            free: total - used,
            percent,
        }
    }

    /// Pass/fail against a percentage threshold: a region passes when its
    /// usage reaches the threshold.
    pub fn passes(&self, threshold: f64) -> bool {
        self.percent >= threshold
    }
}

impl MemoryStats {
    pub fn get(&self, region: Region) -> (u64, u64) {
        match region {
            Region::Stack => (self.stack_used, self.stack_total),
            Region::Flash => (self.flash_used, self.flash_total),
            Region::Ram => (self.ram_used, self.ram_total),
        }
    }

    fn set(&mut self, region: Region, used: u64, total: u64) {
        let (u, t) = match region {
            Region::Stack => (&mut self.stack_used, &mut self.stack_total),
            Region::Flash => (&mut self.flash_used, &mut self.flash_total),
            Region::Ram => (&mut self.ram_used, &mut self.ram_total),
        };
        *u = used;
        *t = total;
    }

    /// No region has a declared total.
    pub fn is_empty(&self) -> bool {
        self.stack_total == 0 && self.flash_total == 0 && self.ram_total == 0
    }

    /// Regions whose used bytes exceed a non-zero declared total.
    pub fn overcommitted(&self) -> Vec<Region> {
        Region::ALL
            .into_iter()
            .filter(|&r| {
                let (used, total) = self.get(r);
                total > 0 && used > total
            })
            .collect()
    }

    /// Byte-level usage row for `region`.
    pub fn usage(&self, region: Region) -> RegionUsage {
        let (used, total) = self.get(region);
        RegionUsage::new(region, used as f64, total as f64)
    }

    pub fn to_kilobytes(&self) -> KilobyteStats {
        let kb = |v: u64| v as f64 / 1024.0;
        KilobyteStats {
            stack_used: kb(self.stack_used),
            stack_total: kb(self.stack_total),
            flash_used: kb(self.flash_used),
            flash_total: kb(self.flash_total),
            ram_used: kb(self.ram_used),
            ram_total: kb(self.ram_total),
        }
    }
}

impl KilobyteStats {
    pub fn usage(&self, region: Region) -> RegionUsage {
        let (used, total) = match region {
            Region::Stack => (self.stack_used, self.stack_total),
            Region::Flash => (self.flash_used, self.flash_total),
            Region::Ram => (self.ram_used, self.ram_total),
        };
        RegionUsage::new(region, used, total)
    }
}

/// Result of a successful analysis: the stats plus what the pipeline knows
/// about their quality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ts_rs::TS)]
#[ts(export, export_to = "../bindings/")]
pub struct Analysis {
    pub stats: MemoryStats,
    /// At least one region has no declared total
    pub partial: bool,
    /// Regions whose total was absent from the map and reported as 0
    pub missing_totals: Vec<Region>,
    #[ts(type = "number")]
    pub lines: usize,
    #[ts(type = "number")]
    pub records: usize,
    #[ts(type = "number")]
    pub noise_lines: usize,
    #[ts(type = "number")]
    pub duplicates_skipped: usize,
}

/// Merge accumulated sums with declared totals. A missing total is never
/// estimated; it stays 0 and the region is listed as missing.
pub(crate) fn assemble(acc: &Accumulated) -> (MemoryStats, Vec<Region>) {
    let mut stats = MemoryStats::default();
    let mut missing = Vec::new();

    for region in Region::ALL {
        let used = *acc.used.get(region);
        let total = match *acc.declared.get(region) {
            Some(total) => total,
            None => {
                missing.push(region);
                0
            }
        };
        if total > 0 && used > total {
            warn!(
                "{} uses {} bytes but only {} are declared",
                region, used, total
            );
        }
        stats.set(region, used, total);
    }

    (stats, missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::AccumulatorCounters;
    use crate::region::PerRegion;

    fn accumulated(used: [u64; 3], declared: [Option<u64>; 3]) -> Accumulated {
        let mut acc = Accumulated {
            used: PerRegion::default(),
            declared: PerRegion::default(),
            counters: AccumulatorCounters::default(),
        };
        for region in Region::ALL {
            *acc.used.get_mut(region) = used[region.index()];
            *acc.declared.get_mut(region) = declared[region.index()];
        }
        acc
    }

    #[test]
    fn declared_totals_are_used_verbatim() {
        let (stats, missing) = assemble(&accumulated(
            [0x400, 0x5000, 0x300],
            [Some(0x800), Some(0x10000), Some(0x2000)],
        ));
        assert!(missing.is_empty());
        assert_eq!(stats.get(Region::Stack), (0x400, 0x800));
        assert_eq!(stats.get(Region::Flash), (0x5000, 0x10000));
        assert_eq!(stats.get(Region::Ram), (0x300, 0x2000));
    }

    #[test]
    fn missing_total_is_zero_not_estimated() {
        let (stats, missing) =
            assemble(&accumulated([0x400, 0x5000, 0], [None, Some(0x10000), None]));
        assert_eq!(missing, vec![Region::Stack, Region::Ram]);
        assert_eq!(stats.stack_used, 0x400);
        assert_eq!(stats.stack_total, 0);
        assert_eq!(stats.ram_total, 0);
        assert!(!stats.is_empty());
    }

    #[test]
    fn overcommit_is_kept_not_clamped() {
        let (stats, _) = assemble(&accumulated([0, 0x20000, 0], [None, Some(0x10000), None]));
        assert_eq!(stats.flash_used, 0x20000);
        assert_eq!(stats.overcommitted(), vec![Region::Flash]);
        let usage = stats.usage(Region::Flash);
        assert_eq!(usage.percent, 200.0);
        assert!(usage.free < 0.0);
    }

    #[test]
    fn all_zero_totals_mean_empty() {
        assert!(MemoryStats::default().is_empty());
        let stats = MemoryStats {
            stack_used: 10,
            ..Default::default()
        };
        assert!(stats.is_empty());
    }

    #[test]
    fn kilobytes_divide_every_field_once() {
        let stats = MemoryStats {
            stack_used: 512,
            stack_total: 1024,
            flash_used: 20480,
            flash_total: 65536,
            ram_used: 0,
            ram_total: 131072,
        };
        let kb = stats.to_kilobytes();
        assert_eq!(kb.stack_used, 0.5);
        assert_eq!(kb.stack_total, 1.0);
        assert_eq!(kb.flash_used, 20.0);
        assert_eq!(kb.flash_total, 64.0);
        assert_eq!(kb.ram_total, 128.0);

        let flash = kb.usage(Region::Flash);
        assert_eq!(flash.free, 44.0);
        assert_eq!(flash.percent, 31.25);
        assert!(flash.passes(30.0));
        assert!(!flash.passes(31.5));
        assert_eq!(kb.usage(Region::Ram).percent, 0.0);
    }

    #[test]
    fn zero_total_usage_is_zero_percent() {
        let stats = MemoryStats {
            stack_used: 100,
            ..Default::default()
        };
        let usage = stats.usage(Region::Stack);
        assert_eq!(usage.percent, 0.0);
        assert!(stats.overcommitted().is_empty());
    }
}
