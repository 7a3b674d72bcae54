//! Object helpers.

use super::{arg, arity, map_arg, text, HelperRegistry};
use crate::error::{HelperError, HelperResult};
use crate::value::{Map, Value};

pub(super) fn register(registry: &mut HelperRegistry) {
    registry.insert("keys", keys);
    registry.insert("values", values);
    registry.insert("items", items);
    registry.insert("get", get);
    registry.insert("has", has);
    registry.insert("merge", merge);
    registry.insert("pick", pick);
    registry.insert("omit", omit);
    registry.insert("data_get", data_get);
    registry.insert("data_set", data_set);
}

fn keys(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    Ok(Value::Seq(
        map_arg(args, 0)?.keys().map(|k| Value::from(k.as_str())).collect(),
    ))
}

fn values(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    Ok(Value::Seq(map_arg(args, 0)?.values().cloned().collect()))
}

/// `[key, value]` pairs in insertion order.
fn items(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    Ok(Value::Seq(
        map_arg(args, 0)?
            .iter()
            .map(|(k, v)| Value::Seq(vec![Value::from(k.as_str()), v.clone()]))
            .collect(),
    ))
}

/// `get(obj, key, default?)`: one level, no dotted traversal.
fn get(args: &[Value]) -> HelperResult {
    arity(args, 2, 3)?;
    Ok(arg(args, 0)
        .get(&text(args, 1))
        .unwrap_or_else(|| arg(args, 2))
        .clone())
}

fn has(args: &[Value]) -> HelperResult {
    arity(args, 2, 2)?;
    Ok(Value::Bool(arg(args, 0).get(&text(args, 1)).is_some()))
}

/// Shallow merge; later objects win.
fn merge(args: &[Value]) -> HelperResult {
    let mut merged = Map::new();
    for i in 0..args.len() {
        for (k, v) in map_arg(args, i)? {
            merged.insert(k.clone(), v.clone());
        }
    }
    Ok(Value::Map(merged))
}

/// Key names given either as separate arguments or as one array.
fn key_list(args: &[Value]) -> Vec<String> {
    match &args[1..] {
        [Value::Seq(keys)] => keys.iter().map(Value::to_string).collect(),
        keys => keys.iter().map(Value::to_string).collect(),
    }
}

fn pick(args: &[Value]) -> HelperResult {
    arity(args, 1, usize::MAX)?;
    let source = map_arg(args, 0)?;
    let picked = key_list(args)
        .into_iter()
        .filter_map(|k| source.get(&k).cloned().map(|v| (k, v)))
        .collect();
    Ok(Value::Map(picked))
}

fn omit(args: &[Value]) -> HelperResult {
    arity(args, 1, usize::MAX)?;
    let dropped = key_list(args);
    let kept = map_arg(args, 0)?
        .iter()
        .filter(|(k, _)| !dropped.contains(k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    Ok(Value::Map(kept))
}

/// `data_get(data, "a.b.0", default?)`
fn data_get(args: &[Value]) -> HelperResult {
    arity(args, 2, 3)?;
    let path = text(args, 1);
    let mut current = arg(args, 0);
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Ok(arg(args, 2).clone()),
        }
    }
    Ok(current.clone())
}

/// `data_set(data, "a.b", value)`: a copy of `data` with the path assigned,
/// creating intermediate objects as needed.
fn data_set(args: &[Value]) -> HelperResult {
    arity(args, 3, 3)?;
    let path = text(args, 1);
    let segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(HelperError::invalid("empty path"));
    }
    let mut root = arg(args, 0).clone();
    assign(&mut root, &segments, arg(args, 2).clone());
    Ok(root)
}

fn assign(target: &mut Value, segments: &[&str], value: Value) {
    let Some((head, rest)) = segments.split_first() else {
        *target = value;
        return;
    };
    if let Value::Seq(items) = target {
        if let Some(slot) = head.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
            assign(slot, rest, value);
            return;
        }
    }
    if !matches!(target, Value::Map(_)) {
        *target = Value::Map(Map::new());
    }
    if let Value::Map(map) = target {
        let slot = map.entry(head.to_string()).or_default();
        assign(slot, rest, value);
    }
}
