// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Loader configuration

use serde::{Deserialize, Serialize};

/// Id and filename given to the top-level module by default
pub const DEFAULT_MAIN_ID: &str = "<main>";

/// Configuration for a loading session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Sentinel `id`/`filename` of the top-level module
    pub main_id: String,

    /// Encoding label used by source providers
    pub encoding: String,

    /// Folder searched for bare specifiers
    pub node_modules: String,

    /// Maximum number of nested package.json `main` hops
    pub max_main_depth: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            main_id: DEFAULT_MAIN_ID.to_string(),
            encoding: "utf-8".to_string(),
            node_modules: "node_modules".to_string(),
            max_main_depth: 8,
        }
    }
}

impl LoaderConfig {
    /// Parse a JSON configuration document. Missing fields keep their defaults.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Apply `SPACEY_REQUIRE_*` environment overrides.
    pub fn merge_env(mut self) -> Self {
        if let Ok(main_id) = std::env::var("SPACEY_REQUIRE_MAIN_ID") {
            self.main_id = main_id;
        }
        if let Ok(encoding) = std::env::var("SPACEY_REQUIRE_ENCODING") {
            self.encoding = encoding;
        }
        if let Ok(depth) = std::env::var("SPACEY_REQUIRE_MAX_MAIN_DEPTH") {
            match depth.parse() {
                Ok(depth) => self.max_main_depth = depth,
                Err(_) => tracing::warn!("ignoring SPACEY_REQUIRE_MAX_MAIN_DEPTH={}", depth),
            }
        }
        self
    }
}
