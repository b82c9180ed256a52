// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Source providers
//!
//! A provider exposes a read-only folder tree that the resolver probes.
//! Two implementations ship with the crate:
//! - [`FilesystemFolder`] - a real directory on disk
//! - [`EmbeddedFolder`] - resources bundled into the host application

mod embedded;
mod filesystem;

pub use embedded::{EmbeddedBundle, EmbeddedFolder};
pub use filesystem::FilesystemFolder;

use crate::error::ProviderError;
use encoding_rs::Encoding;
use std::rc::Rc;

/// Shared handle to a folder
pub type FolderRef = Rc<dyn SourceFolder>;

/// A folder in a source tree.
///
/// Lookups report absence with `Ok(None)` rather than an error; only real
/// provider faults are errors.
pub trait SourceFolder {
    /// Enclosing folder, `None` at the root
    fn parent(&self) -> Option<FolderRef>;

    /// Canonical path from the root with a trailing slash (`/`, `/sub1/`)
    fn path(&self) -> &str;

    /// Text of a file directly inside this folder
    fn file(&self, name: &str) -> Result<Option<String>, ProviderError>;

    /// Handle to a subfolder. Never fails, even when the folder does not
    /// exist; existence shows up through later `file` lookups.
    fn folder(&self, name: &str) -> FolderRef;
}

/// Look up an `encoding_rs` encoding by label (`utf-8`, `latin1`, ...)
pub(crate) fn encoding_for_label(label: &str) -> Result<&'static Encoding, ProviderError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ProviderError::UnknownEncoding(label.to_string()))
}

/// Decode file bytes, honoring a byte order mark when present.
pub(crate) fn decode(
    bytes: &[u8],
    encoding: &'static Encoding,
    path: &str,
) -> Result<String, ProviderError> {
    let (text, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(ProviderError::Decode {
            path: path.to_string(),
            encoding: used.name(),
        });
    }
    Ok(text.into_owned())
}

/// Walk from `root` to the folder with canonical path `path`.
pub fn navigate(root: &FolderRef, path: &str) -> FolderRef {
    crate::path::segments(path).fold(Rc::clone(root), |folder, name| folder.folder(name))
}
