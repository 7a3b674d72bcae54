//! Variable bindings available to expressions during one render call.
//!
//! A [`Context`] owns its bindings and may borrow a parent context. Derived
//! contexts (one per loop iteration) are a single binding layered over a
//! borrowed parent, so the caller's bindings are never copied or mutated.
//!
//! ```
//! use weft_expr::{Context, Value};
//!
//! let root = Context::new().with("user", serde_json::json!({"name": "Ada"}));
//! let inner = root.derive("item", 3);
//!
//! assert_eq!(inner.resolve("user.name"), Value::from("Ada"));
//! assert_eq!(inner.resolve("item"), Value::from(3));
//! assert_eq!(root.resolve("item"), Value::Null);
//! ```

use serde::Serialize;

use crate::error::HelperResult;
use crate::value::{Function, Map, Value};

/// Scoped mapping from variable names to values.
#[derive(Debug, Clone, Default)]
pub struct Context<'p> {
    vars: Map,
    parent: Option<&'p Context<'p>>,
}

impl Context<'static> {
    /// Creates an empty root context.
    pub fn new() -> Self {
        Context::default()
    }

    /// Creates a root context from a map value.
    ///
    /// Returns `None` if the value is not a map.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(vars) => Some(Context { vars, parent: None }),
            _ => None,
        }
    }

    /// Creates a root context from any serializable struct or map.
    ///
    /// Values that do not serialize to a map yield an empty context.
    pub fn from_serialize<T: Serialize + ?Sized>(data: &T) -> Result<Self, serde_json::Error> {
        let value = Value::from_serialize(data)?;
        Ok(Context::from_value(value).unwrap_or_default())
    }
}

impl<'p> Context<'p> {
    /// Adds or overrides a binding in this scope.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Binds a callable, invocable from expressions as `name(args)`.
    pub fn with_function<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> HelperResult + Send + Sync + 'static,
    {
        self.with(name, Function::new(f))
    }

    /// Creates a derived context: `self` plus one binding.
    pub fn derive(&self, name: impl Into<String>, value: impl Into<Value>) -> Context<'_> {
        let mut vars = Map::with_capacity(1);
        vars.insert(name.into(), value.into());
        Context {
            vars,
            parent: Some(self),
        }
    }

    /// Looks up a top-level binding, innermost scope first.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut scope = Some(self);
        while let Some(ctx) = scope {
            if let Some(value) = ctx.vars.get(name) {
                return Some(value);
            }
            scope = ctx.parent;
        }
        None
    }

    /// Returns `true` if `name` is bound in any scope.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Resolves a dotted path against this context.
    ///
    /// A trimmed path that is itself a bound name wins, so keys containing dots
    /// or other unusual characters still resolve. Otherwise each segment
    /// descends into a map key or a sequence index; `length` yields the size of
    /// a string, sequence or map. Any miss is `Value::Null`.
    pub fn resolve(&self, path: &str) -> Value {
        let path = path.trim();
        if let Some(value) = self.get(path) {
            return value.clone();
        }

        let mut segments = path.split('.').map(str::trim);
        let Some(first) = segments.next() else {
            return Value::Null;
        };
        let Some(mut current) = self.get(first) else {
            return Value::Null;
        };

        let mut segments = segments.peekable();
        while let Some(segment) = segments.next() {
            match current.get(segment) {
                Some(next) => current = next,
                None if segment == "length" && segments.peek().is_none() => {
                    return current.length().map_or(Value::Null, Value::from);
                }
                None => return Value::Null,
            }
        }
        current.clone()
    }

    /// Number of bindings visible from this scope (shadowed names count once).
    pub fn len(&self) -> usize {
        self.names().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty() && self.parent.map_or(true, |p| p.is_empty())
    }

    /// Visible binding names, innermost scope first.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let mut scope = Some(self);
        while let Some(ctx) = scope {
            for name in ctx.vars.keys() {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            scope = ctx.parent;
        }
        names
    }
}
