// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Module loader - the `require` entry point
//!
//! A loading session owns a resolver and a registry and is bound to one
//! engine context. Loading a file goes through these steps:
//!
//! 1. resolve the specifier from the calling module's folder
//! 2. if the canonical path is registered (loading or loaded), return its
//!    current `module.exports`; this is what ends circular requires
//! 3. otherwise build the `module` object, register it, then run the body
//!    (or parse the JSON document) and return `module.exports`
//!
//! A body that raises is evicted from the registry and the error goes to
//! the caller unchanged.

use crate::config::LoaderConfig;
use crate::engine::{ModuleScope, NativeFunction, ScriptEngine, json_to_value};
use crate::error::{RequireError, Result, ScriptError};
use crate::path;
use crate::provider::FolderRef;
use crate::registry::{ModuleId, ModuleInfo, ModuleRecord, Registry};
use crate::resolver::{Resolved, Resolver, SourceKind};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Install `require`, `module`, `exports`, `__filename` and `__dirname`
/// into the engine's top-level scope, with default configuration.
pub fn enable<E: ScriptEngine>(engine: &mut E, root: FolderRef) -> Result<Require<E>> {
    enable_with(engine, root, LoaderConfig::default())
}

/// Like [`enable`], with explicit configuration
pub fn enable_with<E: ScriptEngine>(
    engine: &mut E,
    root: FolderRef,
    config: LoaderConfig,
) -> Result<Require<E>> {
    let module = engine.new_object();
    let exports = engine.new_object();
    let children = engine.new_array();
    let main_id = engine.string(&config.main_id);
    let loaded = engine.boolean(true);
    let parent = engine.null();
    engine.set(&module, "id", main_id.clone())?;
    engine.set(&module, "filename", main_id.clone())?;
    engine.set(&module, "loaded", loaded)?;
    engine.set(&module, "parent", parent)?;
    engine.set(&module, "children", children.clone())?;
    engine.set(&module, "exports", exports.clone())?;

    let mut registry = Registry::new();
    let main = registry.insert_main(ModuleRecord::main(
        config.main_id.clone(),
        module.clone(),
        children,
    ));

    let loader = Rc::new(Loader {
        resolver: Resolver::new(root, &config),
        registry: RefCell::new(registry),
        config,
        main,
    });

    let function = Loader::require_function(&loader, engine, main)?;
    let dirname = engine.string("");
    engine.define_global("require", function.clone())?;
    engine.define_global("module", module)?;
    engine.define_global("exports", exports)?;
    engine.define_global("__filename", main_id)?;
    engine.define_global("__dirname", dirname)?;

    debug!("require enabled, main module '{}'", loader.config.main_id);
    Ok(Require { loader, function })
}

/// Host-side handle to a loading session
pub struct Require<E: ScriptEngine> {
    loader: Rc<Loader<E>>,
    function: E::Value,
}

impl<E: ScriptEngine> Clone for Require<E> {
    fn clone(&self) -> Self {
        Self {
            loader: Rc::clone(&self.loader),
            function: self.function.clone(),
        }
    }
}

impl<E: ScriptEngine> Require<E> {
    /// `require(specifier)` on behalf of the top-level module
    pub fn require(&self, engine: &mut E, specifier: &str) -> Result<E::Value> {
        Loader::require(&self.loader, engine, self.loader.main, specifier)
    }

    /// `require.resolve(specifier)` on behalf of the top-level module
    pub fn resolve(&self, specifier: &str) -> Result<String> {
        self.loader.resolve(self.loader.main, specifier)
    }

    /// The `require` value installed in the top-level scope
    pub fn function(&self) -> &E::Value {
        &self.function
    }

    /// Snapshot of the top-level module
    pub fn main_module(&self) -> ModuleInfo {
        self.loader.registry.borrow().info(self.loader.main)
    }

    /// Snapshot of a loaded (or loading) module by canonical path
    pub fn module(&self, id: &str) -> Option<ModuleInfo> {
        let registry = self.loader.registry.borrow();
        registry.lookup(id).map(|m| registry.info(m))
    }

    /// Canonical paths of all registered modules
    pub fn modules(&self) -> Vec<String> {
        self.loader.registry.borrow().paths()
    }

    /// Number of registered modules, not counting the top-level one
    pub fn len(&self) -> usize {
        self.loader.registry.borrow().len()
    }

    /// True until the first module is registered
    pub fn is_empty(&self) -> bool {
        self.loader.registry.borrow().is_empty()
    }

    /// Session configuration
    pub fn config(&self) -> &LoaderConfig {
        &self.loader.config
    }
}

/// One loading session
struct Loader<E: ScriptEngine> {
    resolver: Resolver,
    registry: RefCell<Registry<E::Value>>,
    config: LoaderConfig,
    main: ModuleId,
}

impl<E: ScriptEngine> Loader<E> {
    /// Build the `require` callable for a module, with `main` and `resolve`
    fn require_function(loader: &Rc<Self>, engine: &mut E, from: ModuleId) -> Result<E::Value> {
        let session = Rc::clone(loader);
        let require: NativeFunction<E> = Rc::new(move |engine: &mut E, args: &[E::Value]| {
            let specifier = specifier_argument(engine, args)?;
            Loader::require(&session, engine, from, &specifier)
        });
        let require = engine.new_function("require", require)?;

        let session = Rc::clone(loader);
        let resolve: NativeFunction<E> = Rc::new(move |engine: &mut E, args: &[E::Value]| {
            let specifier = specifier_argument(engine, args)?;
            let id = session.resolve(from, &specifier)?;
            Ok(engine.string(&id))
        });
        let resolve = engine.new_function("resolve", resolve)?;
        engine.set(&require, "resolve", resolve)?;

        let main = loader.registry.borrow().get(loader.main).object.clone();
        engine.set(&require, "main", main)?;
        Ok(require)
    }

    fn resolve(&self, from: ModuleId, specifier: &str) -> Result<String> {
        let folder = self.registry.borrow().get(from).folder.clone();
        Ok(self.resolver.resolve(&folder, specifier)?.id)
    }

    fn require(
        loader: &Rc<Self>,
        engine: &mut E,
        from: ModuleId,
        specifier: &str,
    ) -> Result<E::Value> {
        let folder = loader.registry.borrow().get(from).folder.clone();
        let resolved = loader.resolver.resolve(&folder, specifier)?;

        let cached = {
            let registry = loader.registry.borrow();
            registry
                .lookup(&resolved.id)
                .map(|id| (registry.get(id).state, registry.get(id).object.clone()))
        };
        if let Some((state, module)) = cached {
            debug!("'{}' served from registry ({:?})", resolved.id, state);
            return engine.get(&module, "exports");
        }

        Loader::load(loader, engine, from, resolved)
    }

    fn load(
        loader: &Rc<Self>,
        engine: &mut E,
        parent: ModuleId,
        resolved: Resolved,
    ) -> Result<E::Value> {
        let parent_object = loader.registry.borrow().get(parent).object.clone();

        let module = engine.new_object();
        let exports = engine.new_object();
        let children = engine.new_array();
        let id_value = engine.string(&resolved.id);
        let loaded = engine.boolean(false);
        engine.set(&module, "id", id_value.clone())?;
        engine.set(&module, "filename", id_value)?;
        engine.set(&module, "loaded", loaded)?;
        engine.set(&module, "parent", parent_object)?;
        engine.set(&module, "children", children.clone())?;
        engine.set(&module, "exports", exports.clone())?;

        let id = loader.registry.borrow_mut().register(ModuleRecord::loading(
            resolved.id.clone(),
            parent,
            module.clone(),
            children,
        ));
        debug!("loading {}", resolved.id);

        let outcome = Loader::execute(loader, engine, id, &resolved, &module, exports)
            .and_then(|()| loader.finish(engine, parent, &module));

        match outcome {
            Ok(()) => {
                loader.registry.borrow_mut().mark_loaded(id);
                debug!("loaded {}", resolved.id);
                engine.get(&module, "exports")
            }
            Err(e) => {
                loader.registry.borrow_mut().evict(id);
                debug!("evicted {}: {}", resolved.id, e);
                Err(e)
            }
        }
    }

    fn execute(
        loader: &Rc<Self>,
        engine: &mut E,
        id: ModuleId,
        resolved: &Resolved,
        module: &E::Value,
        exports: E::Value,
    ) -> Result<()> {
        match resolved.kind {
            SourceKind::Json => {
                let json: serde_json::Value =
                    serde_json::from_str(&resolved.source).map_err(|source| {
                        RequireError::InvalidJson {
                            path: resolved.id.clone(),
                            source,
                        }
                    })?;
                let value = json_to_value(engine, &json)?;
                engine.set(module, "exports", value)
            }
            SourceKind::Script => {
                let require = Loader::require_function(loader, engine, id)?;
                let filename = engine.string(&resolved.id);
                let dirname = engine.string(&path::dirname(&resolved.id));
                let scope = ModuleScope {
                    exports,
                    require,
                    module: module.clone(),
                    filename,
                    dirname,
                };
                engine.eval_module_body(&resolved.source, &resolved.id, &scope)?;
                Ok(())
            }
        }
    }

    /// Flip `module.loaded` and append to the parent's `module.children`
    fn finish(&self, engine: &mut E, parent: ModuleId, module: &E::Value) -> Result<()> {
        let loaded = engine.boolean(true);
        engine.set(module, "loaded", loaded)?;
        let siblings = self.registry.borrow().get(parent).children_array.clone();
        engine.array_push(&siblings, module.clone())
    }
}

fn specifier_argument<E: ScriptEngine>(engine: &mut E, args: &[E::Value]) -> Result<String> {
    args.first()
        .and_then(|arg| engine.as_string(arg))
        .ok_or_else(|| {
            ScriptError::new("The \"id\" argument must be of type string").into()
        })
}
