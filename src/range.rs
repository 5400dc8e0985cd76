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

use crate::region::Region;

/// A classified span of memory. `end` saturates so a bogus size near the top
/// of the address space cannot wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AddressRange {
    pub region: Region,
    pub start: u64,
    pub size: u64,
}

impl AddressRange {
    pub fn new(region: Region, start: u64, size: u64) -> Self {
        Self {
            region,
            start,
            size,
        }
    }

    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }

    pub fn encloses(&self, other: &AddressRange) -> bool {
        other.start >= self.start && other.end() <= self.end()
    }
}

/// Number of bytes covered by the union of `ranges`. Overlapping or nested
/// ranges count once; adjacent ones are simply summed.
pub(crate) fn union_size(ranges: &[AddressRange]) -> u64 {
    let mut sorted: Vec<(u64, u64)> = ranges
        .iter()
        .filter(|r| r.size > 0)
        .map(|r| (r.start, r.end()))
        .collect();
    sorted.sort_unstable();

    let mut total = 0u64;
    let mut current: Option<(u64, u64)> = None;
    for (start, end) in sorted {
        current = match current {
            Some((cur_start, cur_end)) if start < cur_end => Some((cur_start, cur_end.max(end))),
            Some((cur_start, cur_end)) => {
                total = total.saturating_add(cur_end - cur_start);
                Some((start, end))
            }
            None => Some((start, end)),
        };
    }
    if let Some((cur_start, cur_end)) = current {
        total = total.saturating_add(cur_end - cur_start);
    }
    total
}
