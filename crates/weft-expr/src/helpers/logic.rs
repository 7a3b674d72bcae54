//! Conversions, predicates, conditional helpers and JSON.

use super::{arg, arity, text, to_f64, HelperRegistry};
use crate::error::{HelperError, HelperResult};
use crate::helpers::date::Moment;
use crate::value::{Number, Value};

pub(super) fn register(registry: &mut HelperRegistry) {
    // Conversions
    registry.insert("str", |args: &[Value]| {
        arity(args, 1, 1)?;
        Ok(Value::String(text(args, 0)))
    });
    registry.insert("int", to_int);
    registry.insert("float", to_float);
    registry.insert("bool", |args: &[Value]| {
        arity(args, 1, 1)?;
        Ok(Value::Bool(arg(args, 0).is_truthy()))
    });
    registry.insert("len", length);
    registry.insert("length", length);
    registry.insert("type", |args: &[Value]| {
        arity(args, 1, 1)?;
        Ok(Value::from(arg(args, 0).type_name()))
    });
    registry.insert("raw", |args: &[Value]| {
        arity(args, 1, 1)?;
        Ok(arg(args, 0).clone())
    });
    registry.insert("debug", |args: &[Value]| {
        arity(args, 1, 1)?;
        Ok(Value::String(format!("<!-- Debug: {} -->", arg(args, 0))))
    });

    // JSON
    registry.insert("json_encode", json_encode);
    registry.insert("to_json", json_encode);
    registry.insert("json_decode", json_decode);
    registry.insert("from_json", json_decode);

    // Predicates
    predicate(registry, "is_empty", |v| !v.is_truthy());
    predicate(registry, "is_not_empty", Value::is_truthy);
    predicate(registry, "is_null", Value::is_null);
    predicate(registry, "is_not_null", |v| !v.is_null());
    predicate(registry, "is_numeric", is_numeric);
    predicate(registry, "is_string", |v| matches!(v, Value::String(_)));
    predicate(registry, "is_array", |v| matches!(v, Value::Seq(_)));
    predicate(registry, "is_object", |v| matches!(v, Value::Map(_)));
    predicate(registry, "is_boolean", |v| matches!(v, Value::Bool(_)));
    predicate(registry, "is_date", |v| {
        matches!(v, Value::String(_)) && Moment::parse(v).is_some()
    });
    predicate(registry, "is_true", Value::is_truthy);
    predicate(registry, "is_false", |v| !v.is_truthy());

    // Conditionals mirroring `??` and `?:`
    registry.insert("default", |args: &[Value]| {
        arity(args, 2, 2)?;
        let value = arg(args, 0);
        Ok(if is_blank(value) { arg(args, 1) } else { value }.clone())
    });
    registry.insert("ternary", |args: &[Value]| {
        arity(args, 3, 3)?;
        let chosen = if arg(args, 0).is_truthy() { 1 } else { 2 };
        Ok(arg(args, chosen).clone())
    });
    registry.insert("coalesce", |args: &[Value]| {
        Ok(args.iter().find(|v| !is_blank(v)).cloned().unwrap_or_default())
    });
}

fn predicate(registry: &mut HelperRegistry, name: &str, test: fn(&Value) -> bool) {
    registry.insert(name, move |args: &[Value]| {
        arity(args, 1, 1)?;
        Ok(Value::Bool(test(arg(args, 0))))
    });
}

/// `null` or the empty string.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Numbers, and strings of digits with an optional sign and one decimal point.
fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.to_f64().is_finite(),
        Value::String(s) => {
            let digits = s.trim().strip_prefix('-').unwrap_or(s.trim());
            let digits = digits.replacen('.', "", 1);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        }
        _ => false,
    }
}

fn to_int(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    let value = arg(args, 0);
    if let Value::String(s) = value {
        if let Ok(n) = s.trim().parse::<i64>() {
            return Ok(Value::from(n));
        }
    }
    match to_f64(value) {
        Some(x) if x.is_finite() => Ok(Value::Number(Number::Int(x.trunc() as i64))),
        _ => Err(HelperError::invalid(format!(
            "cannot convert {} to int",
            value.type_name()
        ))),
    }
}

fn to_float(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    let value = arg(args, 0);
    to_f64(value).map(Value::from).ok_or_else(|| {
        HelperError::invalid(format!("cannot convert {} to float", value.type_name()))
    })
}

fn length(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    let value = arg(args, 0);
    value.length().map(Value::from).ok_or_else(|| {
        HelperError::invalid(format!("{} has no length", value.type_name()))
    })
}

/// `json_encode(value, indent?)`; any indent argument pretty-prints.
fn json_encode(args: &[Value]) -> HelperResult {
    arity(args, 1, 2)?;
    let value = arg(args, 0);
    let encoded = match arg(args, 1) {
        Value::Null => serde_json::to_string(value),
        _ => serde_json::to_string_pretty(value),
    };
    encoded
        .map(Value::String)
        .map_err(|err| HelperError::invalid(err.to_string()))
}

fn json_decode(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    serde_json::from_str::<serde_json::Value>(&text(args, 0))
        .map(Value::from)
        .map_err(|err| HelperError::invalid(format!("invalid JSON: {}", err)))
}
