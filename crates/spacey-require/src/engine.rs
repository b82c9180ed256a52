// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Host engine seam
//!
//! The loader never talks to a concrete JavaScript engine. Hosts implement
//! [`ScriptEngine`] for theirs; the loader only needs to build a handful of
//! values, read and write properties, wrap a Rust closure as a callable and
//! evaluate a module body with its CommonJS bindings.

use crate::error::Result;
use std::rc::Rc;

/// A Rust function exposed to script code.
///
/// The engine passes itself back in so the function can re-enter it (a
/// `require` call evaluates the child module before returning).
pub type NativeFunction<E> =
    Rc<dyn Fn(&mut E, &[<E as ScriptEngine>::Value]) -> Result<<E as ScriptEngine>::Value>>;

/// Capabilities the loader needs from a host engine
pub trait ScriptEngine: Sized + 'static {
    /// Any engine value: object, primitive or callable
    type Value: Clone + 'static;

    /// `null`
    fn null(&mut self) -> Self::Value;

    /// A boolean
    fn boolean(&mut self, value: bool) -> Self::Value;

    /// A number
    fn number(&mut self, value: f64) -> Self::Value;

    /// A string
    fn string(&mut self, value: &str) -> Self::Value;

    /// The string contents of a value, if it is a string
    fn as_string(&mut self, value: &Self::Value) -> Option<String>;

    /// An empty plain object
    fn new_object(&mut self) -> Self::Value;

    /// An empty array
    fn new_array(&mut self) -> Self::Value;

    /// Append to an array created by [`ScriptEngine::new_array`]
    fn array_push(&mut self, array: &Self::Value, item: Self::Value) -> Result<()>;

    /// Read a property
    fn get(&mut self, target: &Self::Value, key: &str) -> Result<Self::Value>;

    /// Write a property
    fn set(&mut self, target: &Self::Value, key: &str, value: Self::Value) -> Result<()>;

    /// Wrap a native function as a callable value
    fn new_function(&mut self, name: &str, function: NativeFunction<Self>) -> Result<Self::Value>;

    /// Bind a name in the context's top-level scope
    fn define_global(&mut self, name: &str, value: Self::Value) -> Result<()>;

    /// Run a module body with `scope` bound as locals.
    ///
    /// Top-level bindings of the context stay visible to the body. Errors
    /// must be reported against `filename` and the line numbers of `source`
    /// itself, not of any wrapper the engine adds.
    fn eval_module_body(
        &mut self,
        source: &str,
        filename: &str,
        scope: &ModuleScope<Self::Value>,
    ) -> Result<Self::Value>;
}

/// Local bindings of one module body
#[derive(Debug, Clone)]
pub struct ModuleScope<V> {
    /// Initially the same object as `module.exports`
    pub exports: V,
    /// `require`, bound to the module's folder
    pub require: V,
    /// The module object
    pub module: V,
    /// `__filename`
    pub filename: V,
    /// `__dirname`
    pub dirname: V,
}

impl<V: Clone> ModuleScope<V> {
    /// Parameter names, in the order of [`ModuleScope::arguments`]
    pub const PARAMETERS: [&'static str; 5] =
        ["exports", "require", "module", "__filename", "__dirname"];

    /// Binding values in parameter order
    pub fn arguments(&self) -> [V; 5] {
        [
            self.exports.clone(),
            self.require.clone(),
            self.module.clone(),
            self.filename.clone(),
            self.dirname.clone(),
        ]
    }
}

/// Text placed in front of a module body by [`wrap_module_source`]
pub const MODULE_WRAPPER_HEADER: &str =
    "(function (exports, require, module, __filename, __dirname) {";

/// Wrap a module body in the CommonJS function wrapper.
///
/// The header shares the first line with the source so reported line
/// numbers match the file, and the closing brace sits on its own line so a
/// trailing `//` comment cannot swallow it. Evaluating the result yields a
/// function taking [`ModuleScope::PARAMETERS`].
///
/// Columns on line 1 are shifted right by the header length. Engines that
/// evaluate the wrapped text should pass positions through
/// [`source_position`] before building a [`crate::ScriptError`].
pub fn wrap_module_source(source: &str) -> String {
    format!("{}{}\n}})", MODULE_WRAPPER_HEADER, source)
}

/// Map a 1-based position in [`wrap_module_source`] output back to the
/// module's own source.
pub fn source_position(line: u32, column: u32) -> (u32, u32) {
    if line == 1 {
        let shift = MODULE_WRAPPER_HEADER.chars().count() as u32;
        (1, column.saturating_sub(shift).max(1))
    } else {
        (line, column)
    }
}

/// Convert a parsed JSON document into engine values
pub fn json_to_value<E: ScriptEngine>(engine: &mut E, json: &serde_json::Value) -> Result<E::Value> {
    Ok(match json {
        serde_json::Value::Null => engine.null(),
        serde_json::Value::Bool(b) => engine.boolean(*b),
        serde_json::Value::Number(n) => engine.number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => engine.string(s),
        serde_json::Value::Array(items) => {
            let array = engine.new_array();
            for item in items {
                let value = json_to_value(engine, item)?;
                engine.array_push(&array, value)?;
            }
            array
        }
        serde_json::Value::Object(map) => {
            let object = engine.new_object();
            for (key, item) in map {
                let value = json_to_value(engine, item)?;
                engine.set(&object, key, value)?;
            }
            object
        }
    })
}
