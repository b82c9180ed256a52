// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Folder tree backed by resources embedded in the host application

use super::{FolderRef, SourceFolder, decode, encoding_for_label};
use crate::config::LoaderConfig;
use crate::error::ProviderError;
use encoding_rs::Encoding;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

/// A set of resources keyed by `/`-separated path.
///
/// Bundles are cheap to clone and can be shared between threads; each
/// loading session mounts its own [`EmbeddedFolder`] on top.
///
/// ```
/// use spacey_require::provider::{EmbeddedBundle, EmbeddedFolder, SourceFolder};
///
/// static RESOURCES: &[(&str, &[u8])] = &[
///     ("app/index.js", b"exports.ready = true;"),
/// ];
///
/// let bundle = EmbeddedBundle::from_static(RESOURCES);
/// let root = EmbeddedFolder::create(&bundle, "app", "utf-8").unwrap();
/// assert!(root.file("index.js").unwrap().is_some());
/// ```
#[derive(Debug, Clone, Default)]
pub struct EmbeddedBundle {
    files: Arc<RwLock<BTreeMap<String, Arc<[u8]>>>>,
}

impl EmbeddedBundle {
    /// Create an empty bundle
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a bundle from a static table, e.g. one made with `include_bytes!`
    pub fn from_static(entries: &[(&str, &[u8])]) -> Self {
        let bundle = Self::new();
        for (path, bytes) in entries {
            bundle.insert(path, bytes.to_vec());
        }
        bundle
    }

    /// Add a resource and return the bundle
    pub fn with_file(self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.insert(path, content);
        self
    }

    /// Add or replace a resource
    pub fn insert(&self, path: &str, content: impl Into<Vec<u8>>) {
        let content: Vec<u8> = content.into();
        self.files
            .write()
            .insert(resource_key(path), Arc::from(content));
    }

    /// Look up a resource
    pub fn get(&self, path: &str) -> Option<Arc<[u8]>> {
        self.files.read().get(&resource_key(path)).cloned()
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    /// True if the bundle holds no resources
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

fn resource_key(path: &str) -> String {
    crate::path::segments(path).collect::<Vec<_>>().join("/")
}

/// A folder inside an [`EmbeddedBundle`], mounted at a resource prefix.
#[derive(Clone)]
pub struct EmbeddedFolder {
    inner: Rc<Node>,
}

struct Node {
    bundle: EmbeddedBundle,
    prefix: String,
    path: String,
    parent: Option<FolderRef>,
    encoding: &'static Encoding,
}

impl EmbeddedFolder {
    /// Mount the resources under `prefix` as a root folder
    pub fn create(
        bundle: &EmbeddedBundle,
        prefix: &str,
        encoding: &str,
    ) -> Result<Self, ProviderError> {
        let encoding = encoding_for_label(encoding)?;
        Ok(Self {
            inner: Rc::new(Node {
                bundle: bundle.clone(),
                prefix: resource_key(prefix),
                path: "/".to_string(),
                parent: None,
                encoding,
            }),
        })
    }

    /// Mount the resources under `prefix` using the session's configured encoding
    pub fn from_config(
        bundle: &EmbeddedBundle,
        prefix: &str,
        config: &LoaderConfig,
    ) -> Result<Self, ProviderError> {
        Self::create(bundle, prefix, &config.encoding)
    }

    fn resource(&self, name: &str) -> String {
        if self.inner.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.inner.prefix, name)
        }
    }
}

impl SourceFolder for EmbeddedFolder {
    fn parent(&self) -> Option<FolderRef> {
        self.inner.parent.clone()
    }

    fn path(&self) -> &str {
        &self.inner.path
    }

    fn file(&self, name: &str) -> Result<Option<String>, ProviderError> {
        match self.inner.bundle.get(&self.resource(name)) {
            Some(bytes) => {
                let path = format!("{}{}", self.inner.path, name);
                decode(&bytes, self.inner.encoding, &path).map(Some)
            }
            None => Ok(None),
        }
    }

    fn folder(&self, name: &str) -> FolderRef {
        Rc::new(Self {
            inner: Rc::new(Node {
                bundle: self.inner.bundle.clone(),
                prefix: self.resource(name),
                path: format!("{}{}/", self.inner.path, name),
                parent: Some(Rc::new(self.clone())),
                encoding: self.inner.encoding,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle() -> EmbeddedBundle {
        EmbeddedBundle::new()
            .with_file("graal/test1/foo.js", "exports.bar = require('./subdir/bar');")
            .with_file("graal/test1/subdir/bar.js", "exports.spam = 'bar';")
            .with_file("/other/x.js", "x")
    }

    #[test]
    fn test_root_folder_properties() {
        let root = EmbeddedFolder::create(&bundle(), "graal/test1", "UTF-8").unwrap();
        assert_eq!(root.path(), "/");
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_get_file() {
        let root = EmbeddedFolder::create(&bundle(), "graal/test1", "UTF-8").unwrap();
        assert!(root.file("foo.js").unwrap().unwrap().contains("subdir"));
        assert_eq!(root.file("invalid").unwrap(), None);
        // Resources outside the mount point are invisible
        assert_eq!(root.file("x.js").unwrap(), None);
    }

    #[test]
    fn test_get_folder() {
        let root = EmbeddedFolder::create(&bundle(), "graal/test1", "UTF-8").unwrap();
        let sub = root.folder("subdir");
        assert_eq!(sub.path(), "/subdir/");
        assert_eq!(sub.parent().unwrap().path(), "/");
        assert!(sub.file("bar.js").unwrap().unwrap().contains("bar"));

        let subsub = sub.folder("subsubdir");
        assert_eq!(subsub.path(), "/subdir/subsubdir/");
        assert_eq!(subsub.parent().unwrap().path(), "/subdir/");
    }

    #[test]
    fn test_get_folder_never_fails() {
        let root = EmbeddedFolder::create(&bundle(), "graal/test1", "UTF-8").unwrap();
        let invalid = root.folder("invalid");
        assert_eq!(invalid.path(), "/invalid/");
        assert_eq!(invalid.file("bar.js").unwrap(), None);
    }

    #[test]
    fn test_encoding_from_config() {
        let bundle = EmbeddedBundle::new().with_file("app/latin.js", b"'caf\xE9'".to_vec());
        let config = LoaderConfig {
            encoding: "latin1".to_string(),
            ..LoaderConfig::default()
        };
        let root = EmbeddedFolder::from_config(&bundle, "app", &config).unwrap();
        assert_eq!(root.file("latin.js").unwrap().as_deref(), Some("'café'"));

        let strict = EmbeddedFolder::from_config(&bundle, "app", &LoaderConfig::default()).unwrap();
        assert!(matches!(strict.file("latin.js"), Err(ProviderError::Decode { .. })));
    }

    #[test]
    fn test_unprefixed_mount_and_static_table() {
        static TABLE: &[(&str, &[u8])] = &[("a.js", b"a"), ("lib/b.js", b"b")];
        let bundle = EmbeddedBundle::from_static(TABLE);
        assert_eq!(bundle.len(), 2);

        let root = EmbeddedFolder::create(&bundle, "", "utf-8").unwrap();
        assert_eq!(root.file("a.js").unwrap().as_deref(), Some("a"));
        assert_eq!(root.folder("lib").file("b.js").unwrap().as_deref(), Some("b"));
    }
}
