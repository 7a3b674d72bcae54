//! Numeric helpers: rounding, aggregation, arithmetic by name, formatting.

use std::cmp::Ordering;
use std::f64::consts;

use rand::Rng;

use super::{arg, arity, int_arg, int_or_float, num_arg, text, to_f64, HelperRegistry};
use crate::error::{HelperError, HelperResult};
use crate::value::{Number, Value};

const MAX_DECIMALS: i64 = 100;

pub(super) fn register(registry: &mut HelperRegistry) {
    registry.insert("round", round);
    registry.insert("floor", |args: &[Value]| unary(args, f64::floor));
    registry.insert("ceil", |args: &[Value]| unary(args, f64::ceil));
    registry.insert("abs", abs);
    registry.insert("min", |args: &[Value]| extreme(args, Ordering::Less));
    registry.insert("max", |args: &[Value]| extreme(args, Ordering::Greater));
    registry.insert("sum", sum);
    registry.insert("add", |args: &[Value]| binary(args, |x, y| Some(x + y)));
    registry.insert("subtract", |args: &[Value]| binary(args, |x, y| Some(x - y)));
    registry.insert("multiply", |args: &[Value]| binary(args, |x, y| Some(x * y)));
    registry.insert("divide", |args: &[Value]| {
        binary(args, |x, y| if y == 0.0 { None } else { Some(x / y) })
    });
    registry.insert("modulo", |args: &[Value]| {
        binary(args, |x, y| if y == 0.0 { None } else { Some(x % y) })
    });
    registry.insert("power", |args: &[Value]| binary(args, |x, y| Some(x.powf(y))));
    registry.insert("sqrt", sqrt);
    registry.insert("log", log);
    registry.insert("log10", |args: &[Value]| {
        arity(args, 1, 1)?;
        positive(num_arg(args, 0)?).map(|x| Value::from(x.log10()))
    });
    registry.insert("sin", |args: &[Value]| unary(args, f64::sin));
    registry.insert("cos", |args: &[Value]| unary(args, f64::cos));
    registry.insert("tan", |args: &[Value]| unary(args, f64::tan));
    registry.insert("pi", |args: &[Value]| constant(args, consts::PI));
    registry.insert("e", |args: &[Value]| constant(args, consts::E));
    registry.insert("format", format);
    registry.insert("format_number", format_number);
    registry.insert("format_currency", format_currency);
    registry.insert("format_percent", format_percent);
    registry.insert("random", random);
    registry.insert("random_int", random_int);
}

fn unary(args: &[Value], f: fn(f64) -> f64) -> HelperResult {
    arity(args, 1, 1)?;
    Ok(int_or_float(f(num_arg(args, 0)?)))
}

/// Arithmetic by name. `None` from `f` (a zero divisor) yields `0`.
fn binary(args: &[Value], f: impl Fn(f64, f64) -> Option<f64>) -> HelperResult {
    arity(args, 2, 2)?;
    let (x, y) = (num_arg(args, 0)?, num_arg(args, 1)?);
    Ok(f(x, y).map_or(Value::from(0), int_or_float))
}

fn constant(args: &[Value], value: f64) -> HelperResult {
    arity(args, 0, 0)?;
    Ok(Value::from(value))
}

fn positive(x: f64) -> Result<f64, HelperError> {
    if x > 0.0 {
        Ok(x)
    } else {
        Err(HelperError::invalid(format!("math domain error for {}", x)))
    }
}

/// `round(x)` to an integer, or `round(x, digits)`.
fn round(args: &[Value]) -> HelperResult {
    arity(args, 1, 2)?;
    let x = num_arg(args, 0)?;
    match arg(args, 1) {
        Value::Null => Ok(int_or_float(x.round())),
        _ => {
            let digits = int_arg(args, 1, 0)?.clamp(-15, 15) as i32;
            let scale = 10f64.powi(digits);
            Ok(Value::from((x * scale).round() / scale))
        }
    }
}

fn abs(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    match arg(args, 0) {
        Value::Number(Number::Int(n)) => Ok(n
            .checked_abs()
            .map_or(Value::from((*n as f64).abs()), Value::from)),
        _ => Ok(Value::from(num_arg(args, 0)?.abs())),
    }
}

/// `min`/`max` over the arguments, or over a single sequence argument.
fn extreme(args: &[Value], wanted: Ordering) -> HelperResult {
    let items = match args {
        [Value::Seq(items)] => items.as_slice(),
        _ => args,
    };
    let mut best: Option<&Value> = None;
    for item in items {
        best = match best {
            None => Some(item),
            Some(current) => match item.compare(current) {
                Some(ordering) if ordering == wanted => Some(item),
                Some(_) => Some(current),
                None => {
                    return Err(HelperError::invalid(format!(
                        "cannot compare {} with {}",
                        item.type_name(),
                        current.type_name()
                    )))
                }
            },
        };
    }
    best.cloned()
        .ok_or_else(|| HelperError::invalid("empty sequence"))
}

/// Sum of a sequence, with an optional start value. Integers stay exact.
fn sum(args: &[Value]) -> HelperResult {
    arity(args, 1, 2)?;
    let items = super::seq_arg(args, 0)?;
    let start = match arg(args, 1) {
        Value::Null => Number::Int(0),
        Value::Number(n) => *n,
        other => {
            return Err(HelperError::invalid(format!(
                "start must be numeric, got {}",
                other.type_name()
            )))
        }
    };
    let mut total = start;
    for item in items {
        let Value::Number(n) = item else {
            return Err(HelperError::invalid(format!(
                "cannot sum {}",
                item.type_name()
            )));
        };
        total = match (total, *n) {
            (Number::Int(a), Number::Int(b)) => a
                .checked_add(b)
                .map_or(Number::Float(a as f64 + b as f64), Number::Int),
            (a, b) => Number::Float(a.to_f64() + b.to_f64()),
        };
    }
    Ok(Value::Number(total))
}

fn sqrt(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    let x = num_arg(args, 0)?;
    if x < 0.0 {
        return Err(HelperError::invalid(format!("math domain error for {}", x)));
    }
    Ok(int_or_float(x.sqrt()))
}

/// Natural logarithm, or `log(x, base)`.
fn log(args: &[Value]) -> HelperResult {
    arity(args, 1, 2)?;
    let x = positive(num_arg(args, 0)?)?;
    match arg(args, 1) {
        Value::Null => Ok(Value::from(x.ln())),
        _ => {
            let base = positive(num_arg(args, 1)?)?;
            if base == 1.0 {
                return Err(HelperError::invalid("logarithm base 1"));
            }
            Ok(Value::from(x.ln() / base.ln()))
        }
    }
}

fn decimals(args: &[Value], i: usize, default: i64) -> Result<usize, HelperError> {
    let digits = int_arg(args, i, default)?;
    if !(0..=MAX_DECIMALS).contains(&digits) {
        return Err(HelperError::invalid(format!(
            "decimals must be between 0 and {}, got {}",
            MAX_DECIMALS, digits
        )));
    }
    Ok(digits as usize)
}

fn fixed(x: f64, digits: usize) -> String {
    if !x.is_finite() {
        return Number::Float(x).to_string();
    }
    // Avoid "-0.00" for negative zero.
    let x = if x == 0.0 { 0.0 } else { x };
    format!("{:.*}", digits, x)
}

/// Renders `value` with exactly `digits` fractional digits.
///
/// Backs both the `toFixed` method and the `format` helper. Numeric strings
/// are accepted; `null` is an error, so a missing value stays missing.
pub(crate) fn to_fixed(value: &Value, digits: &Value) -> HelperResult {
    let x = to_f64(value).ok_or_else(|| {
        HelperError::invalid(format!("cannot format {} as a number", value.type_name()))
    })?;
    let digits = decimals(std::slice::from_ref(digits), 0, 0)?;
    Ok(Value::String(fixed(x, digits)))
}

fn format(args: &[Value]) -> HelperResult {
    arity(args, 1, 2)?;
    to_fixed(arg(args, 0), arg(args, 1))
}

fn format_number(args: &[Value]) -> HelperResult {
    arity(args, 1, 2)?;
    Ok(Value::String(fixed(num_arg(args, 0)?, decimals(args, 1, 2)?)))
}

/// `format_currency(n, symbol = "$", decimals = 2)`
fn format_currency(args: &[Value]) -> HelperResult {
    arity(args, 1, 3)?;
    let symbol = match arg(args, 1) {
        Value::Null => "$".to_string(),
        _ => text(args, 1),
    };
    let amount = fixed(num_arg(args, 0)?, decimals(args, 2, 2)?);
    Ok(Value::String(format!("{}{}", symbol, amount)))
}

/// `format_percent(0.125)` is `"12.50%"`.
fn format_percent(args: &[Value]) -> HelperResult {
    arity(args, 1, 2)?;
    let pct = fixed(num_arg(args, 0)? * 100.0, decimals(args, 1, 2)?);
    Ok(Value::String(format!("{}%", pct)))
}

/// Uniform float in `[0, 1)`.
fn random(args: &[Value]) -> HelperResult {
    arity(args, 0, 0)?;
    Ok(Value::from(rand::thread_rng().gen::<f64>()))
}

/// Uniform integer in `[low, high]`.
fn random_int(args: &[Value]) -> HelperResult {
    arity(args, 2, 2)?;
    let low = int_arg(args, 0, 0)?;
    let high = int_arg(args, 1, 0)?;
    if low > high {
        return Err(HelperError::invalid(format!(
            "empty range {}..={}",
            low, high
        )));
    }
    Ok(Value::from(rand::thread_rng().gen_range(low..=high)))
}
