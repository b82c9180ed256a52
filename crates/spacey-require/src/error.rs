// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for module resolution and loading

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Result type for require operations
pub type Result<T> = std::result::Result<T, RequireError>;

/// Errors that can occur while resolving or loading a module
#[derive(Debug, Error)]
pub enum RequireError {
    /// No probe candidate exists for the specifier
    #[error("Module not found: {0}")]
    ModuleNotFound(String),

    /// A relative specifier tried to step above the top-level root
    #[error("Module not found: {specifier}")]
    EscapesRoot {
        /// Specifier as written by the caller
        specifier: String,
    },

    /// The source provider failed
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A `.json` module holds malformed content
    #[error("{path}: {source}")]
    InvalidJson {
        /// Canonical path of the JSON module
        path: String,
        /// Parser error with line/column
        source: serde_json::Error,
    },

    /// The host engine raised while parsing or executing a module body
    #[error(transparent)]
    Script(#[from] ScriptError),
}

impl RequireError {
    /// Create a module not found error
    pub fn module_not_found(specifier: impl Into<String>) -> Self {
        Self::ModuleNotFound(specifier.into())
    }

    /// True for resolution failures (including attempts to leave the root)
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ModuleNotFound(_) | Self::EscapesRoot { .. })
    }
}

/// Errors raised by a source provider
#[derive(Debug, Error)]
pub enum ProviderError {
    /// I/O failure other than "not found"
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Canonical path being read
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Encoding label not known to `encoding_rs`
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// File bytes are not valid in the configured encoding
    #[error("{path} is not valid {encoding}")]
    Decode {
        /// Canonical path being read
        path: String,
        /// Encoding name
        encoding: &'static str,
    },
}

/// Position inside a module's source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    /// Canonical path of the module (or the main sentinel)
    pub file: String,
    /// 1-based line
    pub line: u32,
    /// 1-based column
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// An exception raised by the host engine.
///
/// The payload is the engine's own thrown value, kept opaque so that an
/// engine can hand it back to script code unchanged when the error crosses
/// a `require` boundary.
#[derive(Clone)]
pub struct ScriptError {
    /// Human-readable message
    pub message: String,
    /// Where the failure originated, if the engine knows
    pub location: Option<SourceLocation>,
    payload: Option<Rc<dyn Any>>,
}

impl ScriptError {
    /// Create an error with only a message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            location: None,
            payload: None,
        }
    }

    /// Attach a source location
    pub fn at(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.location = Some(SourceLocation {
            file: file.into(),
            line,
            column,
        });
        self
    }

    /// Attach the engine's thrown value
    pub fn with_payload<T: Any>(mut self, payload: T) -> Self {
        self.payload = Some(Rc::new(payload));
        self
    }

    /// Borrow the thrown value if it has the expected type
    pub fn payload<T: Any>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }
}

impl fmt::Debug for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptError")
            .field("message", &self.message)
            .field("location", &self.location)
            .field("payload", &self.payload.is_some())
            .finish()
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} ({})", self.message, location),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for ScriptError {}
