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

use std::env;
use std::path::{Path, PathBuf};
use urlencoding::decode;

/// Turn a user-supplied map location into a filesystem path.
///
/// Accepts plain paths as well as `file://` URIs, which is what file managers
/// hand over on drag-and-drop. The result is absolute; it is canonical when
/// the file exists, otherwise it is returned as given so the read can fail
/// with the real OS error.
pub fn resolve_map_path(source: &str) -> PathBuf {
    let mut path_str = source.trim().to_string();

    if let Some(rest) = path_str.strip_prefix("file://") {
        let decoded = decode(rest).map(|d| d.into_owned()).unwrap_or_else(|_| rest.to_string());
        // `file://localhost/path` names the local host explicitly
        path_str = match decoded.strip_prefix("localhost/") {
            Some(local) => format!("/{}", local),
            None => decoded,
        };

        // file:///C:/... becomes /C:/... on Windows
        if cfg!(windows) && path_str.starts_with('/') && path_str.chars().nth(2) == Some(':') {
            path_str.remove(0);
        }
    }

    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().unwrap_or_default().join(path)
    };

    // dunce keeps Windows paths free of the \\?\ prefix
    dunce::canonicalize(&absolute).unwrap_or(absolute)
}
