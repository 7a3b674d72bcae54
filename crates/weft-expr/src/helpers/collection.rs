//! Sequence helpers.

use std::cmp::Ordering;

use indexmap::IndexMap;
use rand::seq::SliceRandom;

use super::{arg, arity, int_arg, seq_arg, text, HelperRegistry, MAX_GENERATED};
use crate::error::{HelperError, HelperResult};
use crate::value::{Map, Value};

pub(super) fn register(registry: &mut HelperRegistry) {
    registry.insert("first", first);
    registry.insert("head", first);
    registry.insert("last", last);
    registry.insert("slice", slice);
    registry.insert("reverse", reverse);
    registry.insert("sort", sort);
    registry.insert("shuffle", shuffle);
    registry.insert("unique", unique);
    registry.insert("count", count);
    registry.insert("in_array", in_array);
    registry.insert("pluck", pluck);
    registry.insert("group_by", group_by);
    registry.insert("chunk", chunk);
    registry.insert("range", range);
    registry.insert("sequence", sequence);
    registry.insert("array", |args: &[Value]| Ok(Value::Seq(args.to_vec())));
}

/// Items of a sequence, or the characters of a string.
fn items(args: &[Value], i: usize) -> Result<Vec<Value>, HelperError> {
    match arg(args, i) {
        Value::String(s) => Ok(s.chars().map(|c| Value::String(c.to_string())).collect()),
        _ => seq_arg(args, i).map(<[Value]>::to_vec),
    }
}

/// Rebuilds the receiver kind: strings stay strings.
fn same_kind(original: &Value, items: Vec<Value>) -> Value {
    match original {
        Value::String(_) => Value::String(items.iter().map(Value::to_string).collect()),
        _ => Value::Seq(items),
    }
}

fn first(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    Ok(items(args, 0)?.into_iter().next().unwrap_or_default())
}

fn last(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    Ok(items(args, 0)?.pop().unwrap_or_default())
}

/// Clamps a slice bound, counting negatives from the end.
fn bound(index: i64, len: usize) -> usize {
    let len = len as i64;
    let index = if index < 0 { len + index } else { index };
    index.clamp(0, len) as usize
}

/// `slice(seq, start, end?)`
fn slice(args: &[Value]) -> HelperResult {
    arity(args, 2, 3)?;
    let all = items(args, 0)?;
    let start = bound(int_arg(args, 1, 0)?, all.len());
    let end = bound(int_arg(args, 2, all.len() as i64)?, all.len());
    let picked = if start < end {
        all[start..end].to_vec()
    } else {
        Vec::new()
    };
    Ok(same_kind(arg(args, 0), picked))
}

fn reverse(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    let mut all = items(args, 0)?;
    all.reverse();
    Ok(same_kind(arg(args, 0), all))
}

fn compare(a: &Value, b: &Value) -> Result<Ordering, HelperError> {
    a.compare(b).ok_or_else(|| {
        HelperError::invalid(format!(
            "cannot order {} against {}",
            a.type_name(),
            b.type_name()
        ))
    })
}

/// Sorts ascending; `sort(items, key)` orders objects by a field.
fn sort(args: &[Value]) -> HelperResult {
    arity(args, 1, 2)?;
    let mut all = seq_arg(args, 0)?.to_vec();
    let key = match arg(args, 1) {
        Value::Null => None,
        _ => Some(text(args, 1)),
    };
    let sort_key = |v: &Value| -> Value {
        match &key {
            Some(key) => v.get(key).cloned().unwrap_or_default(),
            None => v.clone(),
        }
    };

    // Validate first so the comparator itself cannot fail.
    for pair in all.windows(2) {
        compare(&sort_key(&pair[0]), &sort_key(&pair[1]))?;
    }
    if let Some(v) = all.first() {
        compare(&sort_key(v), &sort_key(v))?;
    }
    all.sort_by(|a, b| {
        sort_key(a)
            .compare(&sort_key(b))
            .unwrap_or(Ordering::Equal)
    });
    Ok(Value::Seq(all))
}

fn shuffle(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    let mut all = seq_arg(args, 0)?.to_vec();
    all.shuffle(&mut rand::thread_rng());
    Ok(Value::Seq(all))
}

/// Drops repeated items, keeping first occurrences in order.
fn unique(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    let mut seen: Vec<Value> = Vec::new();
    for item in seq_arg(args, 0)? {
        if !seen.contains(item) {
            seen.push(item.clone());
        }
    }
    Ok(Value::Seq(seen))
}

fn count(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    let value = arg(args, 0);
    value.length().map(Value::from).ok_or_else(|| {
        HelperError::invalid(format!("{} has no length", value.type_name()))
    })
}

/// `in_array(item, seq)`
fn in_array(args: &[Value]) -> HelperResult {
    arity(args, 2, 2)?;
    Ok(Value::Bool(seq_arg(args, 1)?.contains(arg(args, 0))))
}

/// Field `key` of every object in the sequence; other items are skipped.
fn pluck(args: &[Value]) -> HelperResult {
    arity(args, 2, 2)?;
    let key = text(args, 1);
    let values = seq_arg(args, 0)?
        .iter()
        .filter_map(Value::as_map)
        .map(|map| map.get(&key).cloned().unwrap_or_default())
        .collect();
    Ok(Value::Seq(values))
}

/// Groups objects by the stringified value of `key`, in first-seen order.
fn group_by(args: &[Value]) -> HelperResult {
    arity(args, 2, 2)?;
    let key = text(args, 1);
    let mut groups: IndexMap<String, Vec<Value>> = IndexMap::new();
    for item in seq_arg(args, 0)? {
        let group = item.get(&key).map(Value::to_string).unwrap_or_default();
        groups.entry(group).or_default().push(item.clone());
    }
    let groups: Map = groups
        .into_iter()
        .map(|(group, members)| (group, Value::Seq(members)))
        .collect();
    Ok(Value::Map(groups))
}

fn chunk(args: &[Value]) -> HelperResult {
    arity(args, 2, 2)?;
    let size = int_arg(args, 1, 0)?;
    if size <= 0 {
        return Err(HelperError::invalid("chunk size must be positive"));
    }
    let chunks = seq_arg(args, 0)?
        .chunks(size as usize)
        .map(|c| Value::Seq(c.to_vec()))
        .collect();
    Ok(Value::Seq(chunks))
}

fn stepped(start: i64, stop: i64, step: i64, inclusive: bool) -> HelperResult {
    if step == 0 {
        return Err(HelperError::invalid("step must not be zero"));
    }
    let mut out = Vec::new();
    let mut n = start;
    loop {
        let more = match (step > 0, inclusive) {
            (true, false) => n < stop,
            (true, true) => n <= stop,
            (false, false) => n > stop,
            (false, true) => n >= stop,
        };
        if !more {
            break;
        }
        if out.len() >= MAX_GENERATED {
            return Err(HelperError::invalid("range too large"));
        }
        out.push(Value::from(n));
        match n.checked_add(step) {
            Some(next) => n = next,
            None => break,
        }
    }
    Ok(Value::Seq(out))
}

/// `range(stop)`, `range(start, stop)`, `range(start, stop, step)`; `stop` excluded.
fn range(args: &[Value]) -> HelperResult {
    arity(args, 1, 3)?;
    let (start, stop) = if args.len() == 1 {
        (0, int_arg(args, 0, 0)?)
    } else {
        (int_arg(args, 0, 0)?, int_arg(args, 1, 0)?)
    };
    stepped(start, stop, int_arg(args, 2, 1)?, false)
}

/// `sequence(start, end, step = 1)`; `end` included.
fn sequence(args: &[Value]) -> HelperResult {
    arity(args, 2, 3)?;
    stepped(
        int_arg(args, 0, 0)?,
        int_arg(args, 1, 0)?,
        int_arg(args, 2, 1)?,
        true,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    mod access {
        use super::*;

        #[test]
        fn first_and_last() {
            assert_eq!(first(&[v(json!([1, 2]))]).unwrap(), Value::from(1));
            assert_eq!(last(&[v(json!([1, 2]))]).unwrap(), Value::from(2));
            assert_eq!(first(&[v(json!([]))]).unwrap(), Value::Null);
            assert_eq!(last(&[Value::from("abc")]).unwrap(), Value::from("c"));
            assert!(first(&[Value::from(3)]).is_err());
        }

        #[test]
        fn slice_clamps_out_of_range_bounds() {
            let seq = v(json!([0, 1, 2, 3, 4]));
            assert_eq!(slice(&[seq.clone(), Value::from(1), Value::from(3)]).unwrap(), v(json!([1, 2])));
            assert_eq!(slice(&[seq.clone(), Value::from(-2)]).unwrap(), v(json!([3, 4])));
            assert_eq!(slice(&[seq, Value::from(4), Value::from(1)]).unwrap(), v(json!([])));
            assert_eq!(
                slice(&[Value::from("weft"), Value::from(1), Value::from(-1)]).unwrap(),
                Value::from("ef")
            );
        }
    }

    mod ordering {
        use super::*;

        #[test]
        fn sort_plain_and_by_key() {
            assert_eq!(sort(&[v(json!([3, 1, 2]))]).unwrap(), v(json!([1, 2, 3])));
            let people = v(json!([{"n": "b", "age": 3}, {"n": "a", "age": 1}]));
            assert_eq!(
                sort(&[people, Value::from("age")]).unwrap(),
                v(json!([{"n": "a", "age": 1}, {"n": "b", "age": 3}]))
            );
            assert!(sort(&[v(json!([1, "a"]))]).is_err());
        }

        #[test]
        fn reverse_and_shuffle() {
            assert_eq!(reverse(&[v(json!([1, 2, 3]))]).unwrap(), v(json!([3, 2, 1])));
            assert_eq!(reverse(&[Value::from("abc")]).unwrap(), Value::from("cba"));
            let shuffled = shuffle(&[v(json!([1, 2, 3, 4]))]).unwrap();
            let mut back: Vec<i64> = shuffled
                .as_seq()
                .unwrap()
                .iter()
                .map(|x| x.as_number().unwrap().as_i64().unwrap())
                .collect();
            back.sort();
            assert_eq!(back, vec![1, 2, 3, 4]);
        }
    }

    mod grouping {
        use super::*;

        #[test]
        fn unique_keeps_first_occurrence() {
            assert_eq!(unique(&[v(json!([2, 1, 2, 3, 1]))]).unwrap(), v(json!([2, 1, 3])));
        }

        #[test]
        fn pluck_and_group_by() {
            let rows = v(json!([
                {"kind": "fruit", "name": "apple"},
                {"kind": "veg", "name": "leek"},
                {"kind": "fruit", "name": "pear"},
                "not an object"
            ]));
            assert_eq!(
                pluck(&[rows.clone(), Value::from("name")]).unwrap(),
                v(json!(["apple", "leek", "pear"]))
            );
            let groups = group_by(&[v(json!([
                {"kind": "veg", "name": "leek"},
                {"kind": "fruit", "name": "apple"},
                {"kind": "veg", "name": "kale"}
            ])), Value::from("kind")])
            .unwrap();
            assert_eq!(
                groups,
                v(json!({
                    "veg": [{"kind": "veg", "name": "leek"}, {"kind": "veg", "name": "kale"}],
                    "fruit": [{"kind": "fruit", "name": "apple"}]
                }))
            );
        }

        #[test]
        fn chunk_sizes() {
            assert_eq!(
                chunk(&[v(json!([1, 2, 3, 4, 5])), Value::from(2)]).unwrap(),
                v(json!([[1, 2], [3, 4], [5]]))
            );
            assert!(chunk(&[v(json!([1])), Value::from(0)]).is_err());
        }

        #[test]
        fn count_and_membership() {
            assert_eq!(count(&[v(json!({"a": 1}))]).unwrap(), Value::from(1));
            assert_eq!(in_array(&[Value::from(2), v(json!([1, 2]))]).unwrap(), Value::from(true));
        }
    }

    mod generation {
        use super::*;

        #[test]
        fn ranges() {
            assert_eq!(range(&[Value::from(3)]).unwrap(), v(json!([0, 1, 2])));
            assert_eq!(range(&[Value::from(5), Value::from(0), Value::from(-2)]).unwrap(), v(json!([5, 3, 1])));
            assert_eq!(sequence(&[Value::from(1), Value::from(3)]).unwrap(), v(json!([1, 2, 3])));
            assert!(range(&[Value::from(0), Value::from(1), Value::from(0)]).is_err());
            assert!(range(&[Value::from(10_000_000)]).is_err());
        }
    }
}
