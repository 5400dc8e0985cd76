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

use std::fmt;

use serde::{Deserialize, Serialize};

/// The logical memory budgets tracked for a firmware image.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ts_rs::TS,
)]
#[ts(export, export_to = "../bindings/")]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Stack,
    Flash,
    Ram,
}

impl Region {
    /// Display order used by every report: STACK, FLASH, RAM.
    pub const ALL: [Region; 3] = [Region::Stack, Region::Flash, Region::Ram];

    pub fn index(self) -> usize {
        match self {
            Region::Stack => 0,
            Region::Flash => 1,
            Region::Ram => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Region::Stack => "STACK",
            Region::Flash => "FLASH",
            Region::Ram => "RAM",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-region storage indexed by `Region::index`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerRegion<T> {
    slots: [T; 3],
}

impl<T> PerRegion<T> {
    pub fn get(&self, region: Region) -> &T {
        &self.slots[region.index()]
    }

    pub fn get_mut(&mut self, region: Region) -> &mut T {
        &mut self.slots[region.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Region, &T)> {
        Region::ALL.into_iter().zip(self.slots.iter())
    }
}
