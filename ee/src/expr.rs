//! Expression trees and their wire encoding.
//!
//! An [`Expr`] is a description of a computation, not its result. The
//! service receives expressions as a flat table of value nodes where
//! each function invocation or definition is stored once under a
//! numeric key and referenced everywhere else by that key:
//!
//! ```json
//! {
//!   "result": "1",
//!   "values": {
//!     "0": { "functionInvocationValue": { "functionName": "ImageCollection.load", "arguments": { "id": { "constantValue": "MODIS/061/MOD11A2" } } } },
//!     "1": { "functionInvocationValue": { "functionName": "ImageCollection.mosaic", "arguments": { "collection": { "valueReference": "0" } } } }
//!   }
//! }
//! ```

use serde_json::{json, Map, Value};
use std::{
    collections::{BTreeMap, HashMap},
    sync::atomic::{AtomicUsize, Ordering},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal JSON value.
    Constant(Value),

    /// Call of a named service algorithm.
    Invoke {
        function: String,
        args: BTreeMap<String, Expr>,
    },

    /// Reference to a parameter of an enclosing [`Expr::Function`].
    Argument(String),

    /// Anonymous function, e.g. the body of a `Collection.map`.
    Function { params: Vec<String>, body: Box<Expr> },

    Array(Vec<Expr>),

    Dictionary(BTreeMap<String, Expr>),
}

impl Expr {
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }

    pub fn null() -> Self {
        Self::Constant(Value::Null)
    }

    /// Returns an invocation of `function` with named `args`.
    pub fn invoke<I, K>(function: &str, args: I) -> Self
    where
        I: IntoIterator<Item = (K, Expr)>,
        K: Into<String>,
    {
        Self::Invoke {
            function: function.to_owned(),
            args: args.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Returns a one-parameter function built by calling `f` with a
    /// reference to that parameter.
    ///
    /// Parameters are named `_MAPPING_VAR_<depth>_0` where `<depth>` is
    /// the number of function definitions nested inside the body, so
    /// nested lambdas never shadow each other and identical bodies
    /// always encode identically.
    pub fn lambda<F>(f: F) -> Self
    where
        F: FnOnce(Expr) -> Expr,
    {
        static PENDING: AtomicUsize = AtomicUsize::new(0);
        let placeholder = format!(
            "_MAPPING_VAR_PENDING_{}",
            PENDING.fetch_add(1, Ordering::Relaxed)
        );
        let body = f(Self::Argument(placeholder.clone()));
        let name = format!("_MAPPING_VAR_{}_0", body.function_depth());
        Self::Function {
            body: Box::new(body.rename_argument(&placeholder, &name)),
            params: vec![name],
        }
    }

    /// Name of the invoked algorithm, if this is an invocation.
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Self::Invoke { function, .. } => Some(function),
            _ => None,
        }
    }

    /// Named argument of an invocation.
    pub fn arg(&self, name: &str) -> Option<&Expr> {
        match self {
            Self::Invoke { args, .. } => args.get(name),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Value> {
        match self {
            Self::Constant(value) => Some(value),
            _ => None,
        }
    }

    /// Encodes this expression in the service's value table format.
    pub fn encode(&self) -> Value {
        let mut encoder = Encoder::default();
        let result = encoder.key(self);
        json!({ "result": result, "values": Value::Object(encoder.values) })
    }

    fn function_depth(&self) -> usize {
        match self {
            Self::Constant(_) | Self::Argument(_) => 0,
            Self::Function { body, .. } => 1 + body.function_depth(),
            Self::Invoke { args, .. } | Self::Dictionary(args) => {
                args.values().map(Self::function_depth).max().unwrap_or(0)
            }
            Self::Array(items) => items.iter().map(Self::function_depth).max().unwrap_or(0),
        }
    }

    fn rename_argument(self, from: &str, to: &str) -> Self {
        match self {
            Self::Argument(name) if name == from => Self::Argument(to.to_owned()),
            Self::Invoke { function, args } => Self::Invoke {
                function,
                args: args
                    .into_iter()
                    .map(|(k, v)| (k, v.rename_argument(from, to)))
                    .collect(),
            },
            Self::Function { params, body } => Self::Function {
                params,
                body: Box::new(body.rename_argument(from, to)),
            },
            Self::Array(items) => Self::Array(
                items
                    .into_iter()
                    .map(|v| v.rename_argument(from, to))
                    .collect(),
            ),
            Self::Dictionary(entries) => Self::Dictionary(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, v.rename_argument(from, to)))
                    .collect(),
            ),
            other => other,
        }
    }
}

/// Builds the `values` table, storing each distinct invocation or
/// definition once.
#[derive(Default)]
struct Encoder {
    values: Map<String, Value>,
    keys: HashMap<String, String>,
}

impl Encoder {
    /// Returns the table key holding `expr`, inserting it if needed.
    fn key(&mut self, expr: &Expr) -> String {
        let node = self.node(expr);
        match node.get("valueReference").and_then(Value::as_str) {
            Some(key) => key.to_owned(),
            None => self.intern(node),
        }
    }

    fn node(&mut self, expr: &Expr) -> Value {
        match expr {
            Expr::Constant(value) => json!({ "constantValue": value }),
            Expr::Argument(name) => json!({ "argumentReference": name }),
            Expr::Array(items) => {
                let values: Vec<Value> = items.iter().map(|item| self.node(item)).collect();
                json!({ "arrayValue": { "values": values } })
            }
            Expr::Dictionary(entries) => {
                let values: Map<String, Value> = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), self.node(v)))
                    .collect();
                json!({ "dictionaryValue": { "values": values } })
            }
            Expr::Invoke { function, args } => {
                let arguments: Map<String, Value> = args
                    .iter()
                    .map(|(k, v)| (k.clone(), self.node(v)))
                    .collect();
                let node = json!({
                    "functionInvocationValue": {
                        "functionName": function,
                        "arguments": arguments,
                    }
                });
                json!({ "valueReference": self.intern(node) })
            }
            Expr::Function { params, body } => {
                let body = self.key(body);
                let node = json!({
                    "functionDefinitionValue": {
                        "argumentNames": params,
                        "body": body,
                    }
                });
                json!({ "valueReference": self.intern(node) })
            }
        }
    }

    fn intern(&mut self, node: Value) -> String {
        let fingerprint = node.to_string();
        if let Some(key) = self.keys.get(&fingerprint) {
            return key.clone();
        }
        let key = self.values.len().to_string();
        self.values.insert(key.clone(), node);
        self.keys.insert(fingerprint, key.clone());
        key
    }
}
