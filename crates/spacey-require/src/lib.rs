// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # spacey-require
//!
//! Node.js-compatible CommonJS `require()` for JavaScript engines embedded
//! in a Rust host.
//!
//! The crate provides:
//!
//! - Node's resolution algorithm: relative paths, `.js`/`.json` extension
//!   probing, `package.json` `main`, `index.js`, and the ancestor
//!   `node_modules` search for bare specifiers
//! - A per-session module registry that loads each file once and ends
//!   circular requires by handing out the partially built `exports`
//! - The usual module scope: `module`, `exports`, `require`, `require.main`,
//!   `require.resolve`, `__filename`, `__dirname`
//! - Source providers for a directory on disk and for resources embedded in
//!   the host binary
//!
//! The engine itself stays outside: implement [`ScriptEngine`] for yours.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use spacey_require::{enable, FilesystemFolder};
//! use std::rc::Rc;
//!
//! let root = FilesystemFolder::create("scripts", "utf-8")?;
//! let require = enable(&mut engine, Rc::new(root))?;
//! let app = require.require(&mut engine, "./app")?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod path;
pub mod provider;
pub mod registry;
pub mod resolver;

// Re-exports
pub use config::LoaderConfig;
pub use engine::{
    MODULE_WRAPPER_HEADER, ModuleScope, NativeFunction, ScriptEngine, source_position,
    wrap_module_source,
};
pub use error::{ProviderError, RequireError, Result, ScriptError, SourceLocation};
pub use loader::{Require, enable, enable_with};
pub use provider::{EmbeddedBundle, EmbeddedFolder, FilesystemFolder, FolderRef, SourceFolder};
pub use registry::ModuleInfo;
pub use resolver::{Probe, ProbeKind, Resolver, SpecifierKind};

/// Version of spacey-require
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
