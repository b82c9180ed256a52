// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Canonical path helpers.
//!
//! Canonical paths are `/`-separated and rooted at the provider root:
//! files look like `/sub1/sub1file1.js`, folders carry a trailing slash
//! (`/sub1/`), and the root folder is `/`. Everything here is lexical;
//! nothing touches a provider.

/// Returns true for `.`, `..`, and specifiers starting with `./` or `../`.
pub fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Iterate the non-empty segments of a canonical path.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Resolve `relative` against the folder `dir`, removing `.` and `..`.
///
/// Returns the canonical path without a trailing slash (`/` for the root
/// itself), or `None` if a `..` would climb above the root.
pub fn normalize(dir: &str, relative: &str) -> Option<String> {
    let mut components: Vec<&str> = segments(dir).collect();

    for component in relative.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                components.pop()?;
            }
            c => components.push(c),
        }
    }

    Some(format!("/{}", components.join("/")))
}

/// Split a canonical path into its folder (with trailing slash) and last segment.
///
/// The root has no last segment.
pub fn split_last(path: &str) -> (String, Option<&str>) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(pos) if pos + 1 < trimmed.len() => {
            (trimmed[..=pos].to_string(), Some(&trimmed[pos + 1..]))
        }
        _ => ("/".to_string(), None),
    }
}

/// Turn a canonical path into a folder path (`/a/b` -> `/a/b/`).
pub fn as_folder(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

/// Folder containing a module, with trailing slash (`/sub1/a.js` -> `/sub1/`).
pub fn folder_of(id: &str) -> String {
    split_last(id).0
}

/// Node-style `__dirname`: `/sub1` for `/sub1/a.js`, empty for a root file.
pub fn dirname(id: &str) -> String {
    folder_of(id).trim_end_matches('/').to_string()
}
