// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Folder tree backed by a directory on disk

use super::{FolderRef, SourceFolder, decode, encoding_for_label};
use crate::config::LoaderConfig;
use crate::error::ProviderError;
use encoding_rs::Encoding;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// A folder on the local file system.
///
/// The directory passed to [`FilesystemFolder::create`] becomes the root
/// (`/`); modules can never be resolved outside of it.
#[derive(Clone)]
pub struct FilesystemFolder {
    inner: Rc<Node>,
}

struct Node {
    dir: PathBuf,
    path: String,
    parent: Option<FolderRef>,
    encoding: &'static Encoding,
}

impl FilesystemFolder {
    /// Create a root folder for `dir`, decoding files with `encoding`
    pub fn create(dir: impl AsRef<Path>, encoding: &str) -> Result<Self, ProviderError> {
        let encoding = encoding_for_label(encoding)?;
        Ok(Self {
            inner: Rc::new(Node {
                dir: dir.as_ref().to_path_buf(),
                path: "/".to_string(),
                parent: None,
                encoding,
            }),
        })
    }

    /// Create a root folder for `dir` using the session's configured encoding
    pub fn from_config(dir: impl AsRef<Path>, config: &LoaderConfig) -> Result<Self, ProviderError> {
        Self::create(dir, &config.encoding)
    }

    /// Directory on disk this folder maps to
    pub fn dir(&self) -> &Path {
        &self.inner.dir
    }
}

impl SourceFolder for FilesystemFolder {
    fn parent(&self) -> Option<FolderRef> {
        self.inner.parent.clone()
    }

    fn path(&self) -> &str {
        &self.inner.path
    }

    fn file(&self, name: &str) -> Result<Option<String>, ProviderError> {
        let target = self.inner.dir.join(name);
        if !target.is_file() {
            return Ok(None);
        }

        let path = format!("{}{}", self.inner.path, name);
        match std::fs::read(&target) {
            Ok(bytes) => decode(&bytes, self.inner.encoding, &path).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(ProviderError::Io { path, source }),
        }
    }

    fn folder(&self, name: &str) -> FolderRef {
        Rc::new(Self {
            inner: Rc::new(Node {
                dir: self.inner.dir.join(name),
                path: format!("{}{}/", self.inner.path, name),
                parent: Some(Rc::new(self.clone())),
                encoding: self.inner.encoding,
            }),
        })
    }
}
