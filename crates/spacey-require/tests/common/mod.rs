//! Shared test harness: a scripted engine and an in-memory source tree.
//!
//! Module bodies are Rust closures registered under their exact source
//! text, so a test decides what "executing" a file does.

#![allow(dead_code)]

use spacey_require::{
    EmbeddedBundle, EmbeddedFolder, FolderRef, ModuleScope, NativeFunction, RequireError, Result,
    ScriptEngine, ScriptError,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// A value of the scripted engine
#[derive(Clone)]
pub enum JsValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Object(Rc<RefCell<BTreeMap<String, JsValue>>>),
    Array(Rc<RefCell<Vec<JsValue>>>),
    Function(Rc<Function>),
}

pub struct Function {
    pub name: String,
    native: NativeFunction<MockEngine>,
    props: RefCell<BTreeMap<String, JsValue>>,
}

impl JsValue {
    pub fn str(s: &str) -> Self {
        JsValue::Str(s.to_string())
    }

    pub fn object() -> Self {
        JsValue::Object(Rc::new(RefCell::new(BTreeMap::new())))
    }

    /// Property read; missing properties are `undefined`
    pub fn get(&self, key: &str) -> JsValue {
        match self {
            JsValue::Object(props) => props.borrow().get(key).cloned().unwrap_or(JsValue::Undefined),
            JsValue::Function(f) => f.props.borrow().get(key).cloned().unwrap_or(JsValue::Undefined),
            JsValue::Array(items) if key == "length" => JsValue::Number(items.borrow().len() as f64),
            JsValue::Array(items) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| items.borrow().get(i).cloned())
                .unwrap_or(JsValue::Undefined),
            _ => JsValue::Undefined,
        }
    }

    pub fn set(&self, key: &str, value: JsValue) {
        match self {
            JsValue::Object(props) => {
                props.borrow_mut().insert(key.to_string(), value);
            }
            JsValue::Function(f) => {
                f.props.borrow_mut().insert(key.to_string(), value);
            }
            _ => panic!("cannot set '{}' on a primitive", key),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            JsValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            JsValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, JsValue::Null)
    }

    pub fn items(&self) -> Vec<JsValue> {
        match self {
            JsValue::Array(items) => items.borrow().clone(),
            _ => panic!("not an array"),
        }
    }

    /// Reference identity for objects, arrays and functions
    pub fn same(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            (JsValue::Array(a), JsValue::Array(b)) => Rc::ptr_eq(a, b),
            (JsValue::Function(a), JsValue::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for JsValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Bool(b) => write!(f, "{}", b),
            JsValue::Number(n) => write!(f, "{}", n),
            JsValue::Str(s) => write!(f, "{:?}", s),
            JsValue::Object(props) => f.debug_map().entries(props.borrow().keys().map(|k| (k, ".."))).finish(),
            JsValue::Array(items) => write!(f, "[{} items]", items.borrow().len()),
            JsValue::Function(func) => write!(f, "[Function: {}]", func.name),
        }
    }
}

type Body = Rc<dyn Fn(&mut MockEngine, &ModuleScope<JsValue>) -> Result<()>>;

/// Scripted engine
#[derive(Default)]
pub struct MockEngine {
    scripts: HashMap<String, Body>,
    globals: BTreeMap<String, JsValue>,
    executed: Vec<String>,
}

impl MockEngine {
    pub fn new() -> Self {
        init_logging();
        Self::default()
    }

    /// Register what running `source` does
    pub fn script(
        &mut self,
        source: &str,
        body: impl Fn(&mut MockEngine, &ModuleScope<JsValue>) -> Result<()> + 'static,
    ) {
        self.scripts.insert(source.to_string(), Rc::new(body));
    }

    /// Register `exports.<key> = '<value>';`
    pub fn export_const(&mut self, key: &'static str, value: &'static str) -> String {
        let source = format!("exports.{} = '{}';", key, value);
        self.script(&source, move |_, scope| {
            scope.exports.set(key, JsValue::str(value));
            Ok(())
        });
        source
    }

    pub fn global(&self, name: &str) -> JsValue {
        self.globals.get(name).cloned().unwrap_or(JsValue::Undefined)
    }

    pub fn set_global(&mut self, name: &str, value: JsValue) {
        self.globals.insert(name.to_string(), value);
    }

    /// Call a function value
    pub fn call(&mut self, function: &JsValue, args: &[JsValue]) -> Result<JsValue> {
        match function {
            JsValue::Function(f) => {
                let native = Rc::clone(&f.native);
                native(self, args)
            }
            other => Err(ScriptError::new(format!("TypeError: {:?} is not a function", other)).into()),
        }
    }

    /// `require(specifier)` through a module's own binding
    pub fn require_in(&mut self, scope: &ModuleScope<JsValue>, specifier: &str) -> Result<JsValue> {
        let require = scope.require.clone();
        self.call(&require, &[JsValue::str(specifier)])
    }

    /// `require(specifier)` through the global binding, like top-level script code
    pub fn require(&mut self, specifier: &str) -> Result<JsValue> {
        let require = self.global("require");
        self.call(&require, &[JsValue::str(specifier)])
    }

    /// How many times a module body ran
    pub fn executions(&self, filename: &str) -> usize {
        self.executed.iter().filter(|f| f.as_str() == filename).count()
    }
}

impl ScriptEngine for MockEngine {
    type Value = JsValue;

    fn null(&mut self) -> JsValue {
        JsValue::Null
    }

    fn boolean(&mut self, value: bool) -> JsValue {
        JsValue::Bool(value)
    }

    fn number(&mut self, value: f64) -> JsValue {
        JsValue::Number(value)
    }

    fn string(&mut self, value: &str) -> JsValue {
        JsValue::str(value)
    }

    fn as_string(&mut self, value: &JsValue) -> Option<String> {
        value.as_str().map(str::to_string)
    }

    fn new_object(&mut self) -> JsValue {
        JsValue::object()
    }

    fn new_array(&mut self) -> JsValue {
        JsValue::Array(Rc::new(RefCell::new(Vec::new())))
    }

    fn array_push(&mut self, array: &JsValue, item: JsValue) -> Result<()> {
        match array {
            JsValue::Array(items) => {
                items.borrow_mut().push(item);
                Ok(())
            }
            _ => Err(ScriptError::new("TypeError: not an array").into()),
        }
    }

    fn get(&mut self, target: &JsValue, key: &str) -> Result<JsValue> {
        Ok(target.get(key))
    }

    fn set(&mut self, target: &JsValue, key: &str, value: JsValue) -> Result<()> {
        match target {
            JsValue::Object(_) | JsValue::Function(_) => {
                target.set(key, value);
                Ok(())
            }
            _ => Err(ScriptError::new(format!("TypeError: cannot set '{}'", key)).into()),
        }
    }

    fn new_function(&mut self, name: &str, function: NativeFunction<Self>) -> Result<JsValue> {
        Ok(JsValue::Function(Rc::new(Function {
            name: name.to_string(),
            native: function,
            props: RefCell::new(BTreeMap::new()),
        })))
    }

    fn define_global(&mut self, name: &str, value: JsValue) -> Result<()> {
        self.globals.insert(name.to_string(), value);
        Ok(())
    }

    fn eval_module_body(
        &mut self,
        source: &str,
        filename: &str,
        scope: &ModuleScope<JsValue>,
    ) -> Result<JsValue> {
        let Some(body) = self.scripts.get(source).cloned() else {
            return Err(ScriptError::new(format!("SyntaxError: no script for {:?}", source))
                .at(filename, 1, 1)
                .into());
        };
        self.executed.push(filename.to_string());
        body(self, scope)?;
        Ok(JsValue::Undefined)
    }
}

/// Route loader logs to the test output; `RUST_LOG=spacey_require=debug`
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Build an in-memory tree
pub fn tree(files: &[(&str, &str)]) -> (EmbeddedBundle, FolderRef) {
    let bundle = EmbeddedBundle::new();
    for (path, content) in files {
        bundle.insert(path, content.as_bytes().to_vec());
    }
    let root = EmbeddedFolder::create(&bundle, "", "utf-8").expect("utf-8 is a known encoding");
    (bundle, Rc::new(root))
}

/// The tree most tests share:
///
/// ```text
/// /file1.js
/// /file2.json
/// /node_modules/nmfile1.js
/// /node_modules/nmsub1/nmsub1file1.js
/// /sub1/sub1file1.js
/// /sub1/node_modules/sub1nmfile1.js
/// /sub1/sub1/sub1sub1file1.js
/// ```
pub fn standard_tree(engine: &mut MockEngine) -> (EmbeddedBundle, FolderRef) {
    let file1 = engine.export_const("file1", "file1");
    let nmfile1 = engine.export_const("nmfile1", "nmfile1");
    let nmsub1file1 = engine.export_const("nmsub1file1", "nmsub1file1");
    let sub1file1 = engine.export_const("sub1file1", "sub1file1");
    let sub1nmfile1 = engine.export_const("sub1nmfile1", "sub1nmfile1");
    let sub1sub1file1 = engine.export_const("sub1sub1file1", "sub1sub1file1");
    tree(&[
        ("file1.js", file1.as_str()),
        ("file2.json", r#"{ "file2": "file2" }"#),
        ("node_modules/nmfile1.js", nmfile1.as_str()),
        ("node_modules/nmsub1/nmsub1file1.js", nmsub1file1.as_str()),
        ("sub1/sub1file1.js", sub1file1.as_str()),
        ("sub1/node_modules/sub1nmfile1.js", sub1nmfile1.as_str()),
        ("sub1/sub1/sub1sub1file1.js", sub1sub1file1.as_str()),
    ])
}

/// Unwrap an error's message
pub fn message(err: RequireError) -> String {
    err.to_string()
}
