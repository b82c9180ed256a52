// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module registry for require()
//!
//! Every module record of a session lives in one arena. Records refer to
//! each other by [`ModuleId`], so parent/child links never own anything.
//! Canonical paths map to the record currently serving that path; a failed
//! load is unmapped so the next `require` starts over.

use crate::path;
use std::collections::HashMap;

/// Index of a module record in its registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(usize);

/// Load state of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleState {
    /// Registered, body still running
    Loading,
    /// Body finished
    Loaded,
    /// Body raised; no longer reachable by path
    Failed,
}

/// A module record
#[derive(Debug, Clone)]
pub struct ModuleRecord<V> {
    /// Canonical path (or the main sentinel)
    pub id: String,
    /// Folder that relative requires from this module start in
    pub folder: String,
    /// Module that first required this one
    pub parent: Option<ModuleId>,
    /// Modules first loaded by this one, in load order
    pub children: Vec<ModuleId>,
    /// Load state
    pub state: ModuleState,
    /// The engine's `module` object
    pub object: V,
    /// The engine array behind `module.children`
    pub children_array: V,
}

impl<V> ModuleRecord<V> {
    /// A record for a file about to be executed
    pub fn loading(id: String, parent: ModuleId, object: V, children_array: V) -> Self {
        Self {
            folder: path::folder_of(&id),
            id,
            parent: Some(parent),
            children: Vec::new(),
            state: ModuleState::Loading,
            object,
            children_array,
        }
    }

    /// The top-level module record
    pub fn main(id: String, object: V, children_array: V) -> Self {
        Self {
            id,
            folder: "/".to_string(),
            parent: None,
            children: Vec::new(),
            state: ModuleState::Loaded,
            object,
            children_array,
        }
    }
}

/// Read-only snapshot of a module, for hosts and diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// `module.id`
    pub id: String,
    /// `module.filename`
    pub filename: String,
    /// `__dirname`
    pub dirname: String,
    /// `module.parent.id`
    pub parent: Option<String>,
    /// Ids of `module.children`
    pub children: Vec<String>,
    /// `module.loaded`
    pub loaded: bool,
}

/// Session-scoped module arena keyed by canonical path
#[derive(Debug)]
pub struct Registry<V> {
    modules: Vec<ModuleRecord<V>>,
    by_path: HashMap<String, ModuleId>,
}

impl<V> Registry<V> {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            by_path: HashMap::new(),
        }
    }

    /// Add the top-level module. It is never looked up by path.
    pub fn insert_main(&mut self, record: ModuleRecord<V>) -> ModuleId {
        let id = ModuleId(self.modules.len());
        self.modules.push(record);
        id
    }

    /// Register a record under its canonical path, before its body runs
    pub fn register(&mut self, record: ModuleRecord<V>) -> ModuleId {
        debug_assert!(!self.by_path.contains_key(&record.id));
        let id = ModuleId(self.modules.len());
        self.by_path.insert(record.id.clone(), id);
        self.modules.push(record);
        id
    }

    /// The record serving a canonical path, loading or loaded
    pub fn lookup(&self, path: &str) -> Option<ModuleId> {
        self.by_path.get(path).copied()
    }

    /// Access a record
    pub fn get(&self, id: ModuleId) -> &ModuleRecord<V> {
        &self.modules[id.0]
    }

    /// Body finished; link the module under the parent that loaded it
    pub fn mark_loaded(&mut self, id: ModuleId) {
        self.modules[id.0].state = ModuleState::Loaded;
        if let Some(parent) = self.modules[id.0].parent {
            let children = &mut self.modules[parent.0].children;
            if !children.contains(&id) {
                children.push(id);
            }
        }
    }

    /// Body raised; forget the path so a later require retries
    pub fn evict(&mut self, id: ModuleId) {
        let record = &mut self.modules[id.0];
        record.state = ModuleState::Failed;
        if self.by_path.get(&record.id) == Some(&id) {
            self.by_path.remove(&record.id);
        }
    }

    /// Number of modules reachable by path
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    /// True if no module has been loaded
    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// Canonical paths of all reachable modules, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.by_path.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Snapshot a record
    pub fn info(&self, id: ModuleId) -> ModuleInfo {
        let record = self.get(id);
        let dirname = if record.parent.is_none() {
            String::new()
        } else {
            path::dirname(&record.id)
        };
        ModuleInfo {
            id: record.id.clone(),
            filename: record.id.clone(),
            dirname,
            parent: record.parent.map(|p| self.get(p).id.clone()),
            children: record
                .children
                .iter()
                .map(|c| self.get(*c).id.clone())
                .collect(),
            loaded: record.state == ModuleState::Loaded,
        }
    }
}

impl<V> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}
