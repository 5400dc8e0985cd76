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

use serde::Serialize;

/// Reason category of a failed parse, for callers that only need to pick a
/// message ("file not found" vs "format not recognized").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Unreadable,
    NoUsableData,
}

/// The only error the analysis engine returns. Bad individual lines never
/// surface here; they are dropped while classifying.
#[derive(Debug)]
pub enum ParseError {
    /// Missing file, permission denied, or content that is not text
    Unreadable { input: String, reason: String },
    /// Read fine, but no region ended up with a declared total
    NoUsableData { input: String },
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::Unreadable { .. } => ErrorKind::Unreadable,
            ParseError::NoUsableData { .. } => ErrorKind::NoUsableData,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Unreadable { input, reason } => {
                write!(f, "cannot read map file {}: {}", input, reason)
            }
            ParseError::NoUsableData { input } => write!(
                f,
                "map file {} was read but no STACK, FLASH or RAM total was recognized",
                input
            ),
        }
    }
}

impl std::error::Error for ParseError {}
