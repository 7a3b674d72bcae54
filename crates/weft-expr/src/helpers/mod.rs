//! Helper Function Registry and the built-in helper library.
//!
//! A [`HelperRegistry`] is an immutable-after-construction table of named
//! [`Function`]s. Build it once, wrap it in an `Arc`, and share it between
//! every render.
//!
//! ```
//! use weft_expr::{HelperRegistry, Value};
//!
//! let helpers = HelperRegistry::builtin()
//!     .register("shout", |args: &[Value]| Ok(Value::from(format!("{}!", args[0]))));
//!
//! assert!(helpers.contains("upper"));
//! let shout = helpers.get("shout").unwrap();
//! assert_eq!(shout.call(&[Value::from("hey")]).unwrap(), Value::from("hey!"));
//! ```
//!
//! Helpers are grouped by topic:
//!
//! | Module | Helpers |
//! |--------|---------|
//! | `string` | `upper`, `lower`, `capitalize`, `title`, `trim`, `substr`, `replace`, `split`, `join`, `pad`, `slugify`, `escape`, ... |
//! | `number` | `round`, `floor`, `min`, `max`, `sum`, `add`, `divide`, `format_currency`, `random_int`, ... |
//! | `collection` | `first`, `last`, `slice`, `sort`, `unique`, `pluck`, `group_by`, `chunk`, `range`, ... |
//! | `mapping` | `keys`, `values`, `get`, `has`, `merge`, `pick`, `omit`, `data_get` |
//! | `date` | `now`, `date`, `format_date`, `add_days`, `diff_days`, ... |
//! | `logic` | conversions, predicates, `default`, `ternary`, `coalesce`, JSON |
//! | `ident` | `uuid`, `random_string`, `md5`, `sha1`, `sha256` |

use std::collections::HashMap;

use crate::error::{HelperError, HelperResult};
use crate::value::{Function, Map, Number, Value};

pub(crate) mod collection;
pub(crate) mod date;
pub(crate) mod ident;
pub(crate) mod logic;
pub(crate) mod mapping;
pub(crate) mod number;
pub(crate) mod string;

/// Named helper functions callable from expressions.
#[derive(Debug, Clone, Default)]
pub struct HelperRegistry {
    helpers: HashMap<String, Function>,
}

impl HelperRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        HelperRegistry::default()
    }

    /// Creates a registry holding the full built-in library.
    pub fn builtin() -> Self {
        let mut registry = HelperRegistry::new();
        string::register(&mut registry);
        number::register(&mut registry);
        collection::register(&mut registry);
        mapping::register(&mut registry);
        date::register(&mut registry);
        logic::register(&mut registry);
        ident::register(&mut registry);
        registry
    }

    /// Adds a helper, replacing any existing one with the same name.
    pub fn register<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> HelperResult + Send + Sync + 'static,
    {
        self.insert(name, f);
        self
    }

    /// In-place form of [`register`](Self::register).
    pub fn insert<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[Value]) -> HelperResult + Send + Sync + 'static,
    {
        self.helpers.insert(name.into(), Function::new(f));
    }

    pub fn get(&self, name: &str) -> Option<&Function> {
        self.helpers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.helpers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }
}

// Argument handling shared by the helper modules.

static NULL: Value = Value::Null;

/// Argument `i`, or `Null` when absent.
pub(crate) fn arg(args: &[Value], i: usize) -> &Value {
    args.get(i).unwrap_or(&NULL)
}

/// Checks the argument count; `max == usize::MAX` means unbounded.
pub(crate) fn arity(args: &[Value], min: usize, max: usize) -> Result<(), HelperError> {
    if (min..=max).contains(&args.len()) {
        return Ok(());
    }
    let expected = if min == max {
        min.to_string()
    } else if max == usize::MAX {
        format!("at least {}", min)
    } else {
        format!("{} to {}", min, max)
    };
    Err(HelperError::Arity {
        expected,
        got: args.len(),
    })
}

/// Numeric view of a value: numbers, numeric strings and booleans.
pub(crate) fn to_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(n.to_f64()),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Required numeric argument.
pub(crate) fn num_arg(args: &[Value], i: usize) -> Result<f64, HelperError> {
    let value = arg(args, i);
    to_f64(value).ok_or_else(|| {
        HelperError::invalid(format!(
            "argument {} must be numeric, got {}",
            i + 1,
            value.type_name()
        ))
    })
}

/// Optional integer argument, truncating toward zero.
pub(crate) fn int_arg(args: &[Value], i: usize, default: i64) -> Result<i64, HelperError> {
    match arg(args, i) {
        Value::Null => Ok(default),
        Value::Number(Number::Int(n)) => Ok(*n),
        _ => num_arg(args, i).map(|x| x as i64),
    }
}

/// Stringified argument (`Null` is the empty string).
pub(crate) fn text(args: &[Value], i: usize) -> String {
    arg(args, i).to_string()
}

pub(crate) fn seq_arg(args: &[Value], i: usize) -> Result<&[Value], HelperError> {
    let value = arg(args, i);
    value.as_seq().ok_or_else(|| {
        HelperError::invalid(format!(
            "argument {} must be an array, got {}",
            i + 1,
            value.type_name()
        ))
    })
}

pub(crate) fn map_arg(args: &[Value], i: usize) -> Result<&Map, HelperError> {
    let value = arg(args, i);
    value.as_map().ok_or_else(|| {
        HelperError::invalid(format!(
            "argument {} must be an object, got {}",
            i + 1,
            value.type_name()
        ))
    })
}

/// Integral results come back as integers so they print without a fraction.
pub(crate) fn int_or_float(x: f64) -> Value {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 9.0e15 {
        Value::Number(Number::Int(x as i64))
    } else {
        Value::Number(Number::Float(x))
    }
}

/// Upper bound on sequences and strings built by `repeat`, `range` and friends.
pub(crate) const MAX_GENERATED: usize = 100_000;
