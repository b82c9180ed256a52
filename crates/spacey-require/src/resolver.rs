// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module path resolution (Node.js algorithm)
//!
//! Resolution happens in two steps. [`Resolver::plan`] turns a specifier
//! into an ordered list of probes without touching the provider; the
//! resolver then runs the probes against the provider and the first hit
//! wins. Per candidate location the order is always: exact file, `.js`,
//! `.json`, `package.json` main, `index.js`.

use crate::config::LoaderConfig;
use crate::error::{RequireError, Result};
use crate::path;
use crate::provider::{FolderRef, navigate};
use serde::Deserialize;
use tracing::{debug, trace, warn};

/// How a specifier is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecifierKind {
    /// `./x`, `../x`, `.` or `..`: resolved against the requesting folder
    Relative,
    /// Anything else: looked up in `node_modules` folders
    Bare,
}

impl SpecifierKind {
    /// Classify a specifier
    pub fn of(specifier: &str) -> Self {
        if path::is_relative(specifier) {
            Self::Relative
        } else {
            Self::Bare
        }
    }
}

/// What a probe looks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    /// The path as written
    ExactFile,
    /// The path with `.js` appended
    FileWithJsExt,
    /// The path with `.json` appended
    FileWithJsonExt,
    /// The folder's `package.json` `main` entry
    DirectoryPackageMain,
    /// The folder's `index.js`
    DirectoryIndexJs,
}

/// A single location to check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    /// Canonical path of the file, or of the folder for `DirectoryPackageMain`
    pub location: String,
    /// What to look for there
    pub kind: ProbeKind,
}

/// How a resolved source is turned into exports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Executed as a module body
    Script,
    /// Parsed as a JSON document
    Json,
}

/// A successfully resolved module
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Canonical path, the registry key
    pub id: String,
    /// Source text
    pub source: String,
    /// Script or JSON
    pub kind: SourceKind,
}

impl Resolved {
    fn new(id: String, source: String) -> Self {
        let kind = if id.ends_with(".json") {
            SourceKind::Json
        } else {
            SourceKind::Script
        };
        Self { id, source, kind }
    }
}

/// Minimal package.json structure for resolution
#[derive(Debug, Deserialize)]
struct PackageJson {
    #[serde(default)]
    main: Option<serde_json::Value>,
}

/// Resolves specifiers against a source tree
pub struct Resolver {
    root: FolderRef,
    node_modules: String,
    max_main_depth: usize,
}

impl Resolver {
    /// Create a resolver for the tree under `root`
    pub fn new(root: FolderRef, config: &LoaderConfig) -> Self {
        Self {
            root,
            node_modules: config.node_modules.clone(),
            max_main_depth: config.max_main_depth,
        }
    }

    /// The root folder
    pub fn root(&self) -> &FolderRef {
        &self.root
    }

    /// Candidate locations for a specifier, nearest first.
    ///
    /// A relative specifier has exactly one candidate. A bare specifier
    /// has one per ancestor folder (from `requesting_dir` up to the root)
    /// that is not itself a `node_modules` folder.
    pub fn candidates(&self, requesting_dir: &str, specifier: &str) -> Result<Vec<String>> {
        if specifier.is_empty() {
            return Err(RequireError::module_not_found(specifier));
        }

        match SpecifierKind::of(specifier) {
            SpecifierKind::Relative => path::normalize(requesting_dir, specifier)
                .map(|candidate| vec![candidate])
                .ok_or_else(|| RequireError::EscapesRoot {
                    specifier: specifier.to_string(),
                }),
            SpecifierKind::Bare => {
                let mut candidates = Vec::new();
                let mut dir = path::as_folder(requesting_dir);
                loop {
                    let (parent, name) = path::split_last(&dir);
                    if name != Some(self.node_modules.as_str()) {
                        let search = format!("{}{}/", dir, self.node_modules);
                        if let Some(candidate) = path::normalize(&search, specifier) {
                            candidates.push(candidate);
                        }
                    }
                    if name.is_none() {
                        break;
                    }
                    dir = parent;
                }
                Ok(candidates)
            }
        }
    }

    /// The full ordered probe list for a specifier
    pub fn plan(&self, requesting_dir: &str, specifier: &str) -> Result<Vec<Probe>> {
        Ok(self
            .candidates(requesting_dir, specifier)?
            .iter()
            .flat_map(|candidate| probes_for(candidate, names_folder(specifier)))
            .collect())
    }

    /// Resolve and read the module a specifier names
    pub fn resolve(&self, requesting_dir: &str, specifier: &str) -> Result<Resolved> {
        for probe in self.plan(requesting_dir, specifier)? {
            if let Some(resolved) = self.run(&probe, &mut Vec::new())? {
                debug!("resolved '{}' from {} to {}", specifier, requesting_dir, resolved.id);
                return Ok(resolved);
            }
        }

        debug!("cannot resolve '{}' from {}", specifier, requesting_dir);
        Err(RequireError::module_not_found(specifier))
    }

    fn run(&self, probe: &Probe, trail: &mut Vec<String>) -> Result<Option<Resolved>> {
        trace!("probe {:?} {}", probe.kind, probe.location);
        match probe.kind {
            ProbeKind::DirectoryPackageMain => self.package_main(&probe.location, trail),
            _ => self.read_file(&probe.location),
        }
    }

    fn read_file(&self, file: &str) -> Result<Option<Resolved>> {
        let (folder, name) = path::split_last(file);
        let Some(name) = name else {
            return Ok(None);
        };
        let source = navigate(&self.root, &folder).file(name)?;
        Ok(source.map(|source| Resolved::new(file.to_string(), source)))
    }

    /// Follow a folder's package.json `main`, treated as a relative
    /// specifier rooted at the folder. `trail` holds the folders already
    /// visited along this chain; revisiting one, or going deeper than the
    /// configured limit, counts as "no main".
    fn package_main(&self, dir: &str, trail: &mut Vec<String>) -> Result<Option<Resolved>> {
        if trail.iter().any(|visited| visited == dir) {
            debug!("package.json main in {} loops back, skipping", dir);
            return Ok(None);
        }
        if trail.len() >= self.max_main_depth {
            warn!("package.json main chain deeper than {} at {}", self.max_main_depth, dir);
            return Ok(None);
        }

        let Some(text) = navigate(&self.root, dir).file("package.json")? else {
            return Ok(None);
        };
        let main = match serde_json::from_str::<PackageJson>(&text) {
            Ok(package) => package.main,
            Err(e) => {
                warn!("ignoring unparsable {}package.json: {}", dir, e);
                return Ok(None);
            }
        };
        let Some(main) = main.as_ref().and_then(|m| m.as_str()) else {
            return Ok(None);
        };
        let Some(target) = path::normalize(dir, main) else {
            return Ok(None);
        };

        trail.push(dir.to_string());
        for probe in probes_for(&target, names_folder(main)) {
            if let Some(resolved) = self.run(&probe, trail)? {
                return Ok(Some(resolved));
            }
        }
        trail.pop();
        Ok(None)
    }
}

/// A trailing slash asks for a folder: `./lib/` never matches a file `lib`
fn names_folder(specifier: &str) -> bool {
    specifier.ends_with('/')
}

/// Probes for one candidate location, in tie-break order
fn probes_for(candidate: &str, folder_only: bool) -> Vec<Probe> {
    let mut probes = Vec::with_capacity(5);
    if !folder_only && path::split_last(candidate).1.is_some() {
        probes.push(Probe {
            location: candidate.to_string(),
            kind: ProbeKind::ExactFile,
        });
        probes.push(Probe {
            location: format!("{}.js", candidate),
            kind: ProbeKind::FileWithJsExt,
        });
        probes.push(Probe {
            location: format!("{}.json", candidate),
            kind: ProbeKind::FileWithJsonExt,
        });
    }

    let dir = path::as_folder(candidate);
    probes.push(Probe {
        location: dir.clone(),
        kind: ProbeKind::DirectoryPackageMain,
    });
    probes.push(Probe {
        location: format!("{}index.js", dir),
        kind: ProbeKind::DirectoryIndexJs,
    });
    probes
}
