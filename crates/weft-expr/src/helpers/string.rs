//! String helpers.

use deunicode::deunicode;
use once_cell::sync::Lazy;
use regex::Regex;

use super::{arg, arity, int_arg, text, HelperRegistry, MAX_GENERATED};
use crate::error::{HelperError, HelperResult};
use crate::value::Value;

static NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

pub(super) fn register(registry: &mut HelperRegistry) {
    registry.insert("upper", upper);
    registry.insert("lower", lower);
    registry.insert("capitalize", capitalize);
    registry.insert("title", title);
    registry.insert("trim", trim);
    registry.insert("ltrim", ltrim);
    registry.insert("rtrim", rtrim);
    registry.insert("substr", substr);
    registry.insert("replace", replace);
    registry.insert("split", split);
    registry.insert("join", join);
    registry.insert("concat", concat);
    registry.insert("pad", pad_right);
    registry.insert("pad_left", pad_left);
    registry.insert("pad_right", pad_right);
    registry.insert("repeat", repeat);
    registry.insert("slugify", slugify);
    registry.insert("nl2br", nl2br);
    registry.insert("escape", escape);
}

fn upper(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    Ok(Value::String(text(args, 0).to_uppercase()))
}

fn lower(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    Ok(Value::String(text(args, 0).to_lowercase()))
}

/// First character upper case, the rest lower case.
fn capitalize(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    let s = text(args, 0);
    let mut chars = s.chars();
    let out = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    };
    Ok(Value::String(out))
}

/// Upper-cases every letter that follows a non-letter.
fn title(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    let mut out = String::new();
    let mut after_letter = false;
    for c in text(args, 0).chars() {
        if after_letter {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        after_letter = c.is_alphabetic();
    }
    Ok(Value::String(out))
}

fn strip_set(args: &[Value]) -> Option<Vec<char>> {
    match arg(args, 1) {
        Value::Null => None,
        chars => Some(chars.to_string().chars().collect()),
    }
}

fn trim(args: &[Value]) -> HelperResult {
    arity(args, 1, 2)?;
    let s = text(args, 0);
    Ok(Value::from(match strip_set(args) {
        Some(set) => s.trim_matches(set.as_slice()),
        None => s.trim(),
    }))
}

fn ltrim(args: &[Value]) -> HelperResult {
    arity(args, 1, 2)?;
    let s = text(args, 0);
    Ok(Value::from(match strip_set(args) {
        Some(set) => s.trim_start_matches(set.as_slice()),
        None => s.trim_start(),
    }))
}

fn rtrim(args: &[Value]) -> HelperResult {
    arity(args, 1, 2)?;
    let s = text(args, 0);
    Ok(Value::from(match strip_set(args) {
        Some(set) => s.trim_end_matches(set.as_slice()),
        None => s.trim_end(),
    }))
}

/// `substr(s, start, length?)` over characters.
///
/// A negative start counts from the end; a missing or zero length takes the
/// rest of the string.
fn substr(args: &[Value]) -> HelperResult {
    arity(args, 2, 3)?;
    let chars: Vec<char> = text(args, 0).chars().collect();
    let len = chars.len() as i64;
    let start = int_arg(args, 1, 0)?;
    let start = if start < 0 { (len + start).max(0) } else { start.min(len) };
    let end = match int_arg(args, 2, 0)? {
        0 => len,
        n if n < 0 => (len + n).max(start),
        n => start.saturating_add(n).min(len),
    };
    Ok(Value::String(
        chars[start as usize..end.max(start) as usize].iter().collect(),
    ))
}

fn replace(args: &[Value]) -> HelperResult {
    arity(args, 3, 3)?;
    let from = text(args, 1);
    if from.is_empty() {
        return Ok(Value::String(text(args, 0)));
    }
    Ok(Value::String(text(args, 0).replace(&from, &text(args, 2))))
}

/// Splits on a separator, or on runs of whitespace when none is given.
fn split(args: &[Value]) -> HelperResult {
    arity(args, 1, 2)?;
    let s = text(args, 0);
    let parts: Vec<Value> = match arg(args, 1) {
        Value::Null => s.split_whitespace().map(Value::from).collect(),
        sep => {
            let sep = sep.to_string();
            if sep.is_empty() {
                return Err(HelperError::invalid("empty separator"));
            }
            s.split(sep.as_str()).map(Value::from).collect()
        }
    };
    Ok(Value::Seq(parts))
}

fn join(args: &[Value]) -> HelperResult {
    arity(args, 1, 2)?;
    let sep = text(args, 1);
    let joined = match arg(args, 0) {
        Value::Seq(items) => items
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join(&sep),
        Value::Map(map) => map.keys().cloned().collect::<Vec<_>>().join(&sep),
        other => other.to_string(),
    };
    Ok(Value::String(joined))
}

fn concat(args: &[Value]) -> HelperResult {
    Ok(Value::String(args.iter().map(Value::to_string).collect()))
}

fn pad_char(args: &[Value]) -> Result<char, HelperError> {
    match arg(args, 2) {
        Value::Null => Ok(' '),
        fill => {
            let fill = fill.to_string();
            let mut chars = fill.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(HelperError::invalid("fill must be exactly one character")),
            }
        }
    }
}

fn padding(args: &[Value]) -> Result<(String, String), HelperError> {
    arity(args, 2, 3)?;
    let s = text(args, 0);
    let width = int_arg(args, 1, 0)?.clamp(0, MAX_GENERATED as i64) as usize;
    let missing = width.saturating_sub(s.chars().count());
    Ok((s, pad_char(args)?.to_string().repeat(missing)))
}

fn pad_left(args: &[Value]) -> HelperResult {
    let (s, fill) = padding(args)?;
    Ok(Value::String(fill + &s))
}

fn pad_right(args: &[Value]) -> HelperResult {
    let (s, fill) = padding(args)?;
    Ok(Value::String(s + &fill))
}

/// Repeats a string, or builds a list holding any other value `times` times.
fn repeat(args: &[Value]) -> HelperResult {
    arity(args, 2, 2)?;
    let times = int_arg(args, 1, 0)?.max(0) as usize;
    match arg(args, 0) {
        Value::String(s) => {
            if s.chars().count().saturating_mul(times) > MAX_GENERATED {
                return Err(HelperError::invalid("result too large"));
            }
            Ok(Value::String(s.repeat(times)))
        }
        item => {
            if times > MAX_GENERATED {
                return Err(HelperError::invalid("result too large"));
            }
            Ok(Value::Seq(vec![item.clone(); times]))
        }
    }
}

/// Lower-case ASCII slug: transliterated, runs of other characters become `-`.
fn slugify(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    let ascii = deunicode(&text(args, 0)).to_lowercase();
    let slug = NON_SLUG.replace_all(&ascii, "-");
    Ok(Value::from(slug.trim_matches('-')))
}

fn nl2br(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    Ok(Value::String(text(args, 0).replace('\n', "<br>")))
}

/// HTML-escapes `& < > " '`.
pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn escape(args: &[Value]) -> HelperResult {
    arity(args, 1, 1)?;
    Ok(Value::String(escape_html(&text(args, 0))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: fn(&[Value]) -> HelperResult, args: &[Value]) -> Value {
        f(args).unwrap()
    }

    fn s(v: &str) -> Value {
        Value::from(v)
    }

    mod case {
        use super::*;

        #[test]
        fn upper_lower_capitalize_title() {
            assert_eq!(call(upper, &[s("straße")]), s("STRASSE"));
            assert_eq!(call(lower, &[s("ÀB")]), s("àb"));
            assert_eq!(call(capitalize, &[s("hELLO world")]), s("Hello world"));
            assert_eq!(call(title, &[s("they're o'neil-smith")]), s("They'Re O'Neil-Smith"));
            assert_eq!(call(upper, &[Value::from(12)]), s("12"));
        }

        #[test]
        fn arity_is_checked() {
            assert!(upper(&[]).is_err());
            assert!(upper(&[s("a"), s("b")]).is_err());
        }
    }

    mod slicing {
        use super::*;

        #[test]
        fn substr_follows_slice_rules() {
            let word = s("template");
            assert_eq!(call(substr, &[word.clone(), Value::from(0), Value::from(4)]), s("temp"));
            assert_eq!(call(substr, &[word.clone(), Value::from(4)]), s("late"));
            assert_eq!(call(substr, &[word.clone(), Value::from(-4)]), s("late"));
            assert_eq!(call(substr, &[word.clone(), Value::from(6), Value::from(10)]), s("te"));
            assert_eq!(call(substr, &[word.clone(), Value::from(20)]), s(""));
            assert_eq!(call(substr, &[word, Value::from(1), Value::from(-1)]), s("emplat"));
        }

        #[test]
        fn trimming() {
            assert_eq!(call(trim, &[s("  a b  ")]), s("a b"));
            assert_eq!(call(ltrim, &[s("xxaxx"), s("x")]), s("axx"));
            assert_eq!(call(rtrim, &[s("path///"), s("/")]), s("path"));
        }

        #[test]
        fn split_and_join() {
            assert_eq!(
                call(split, &[s(" a  b c ")]),
                Value::from(vec!["a", "b", "c"])
            );
            assert_eq!(call(split, &[s("a,b"), s(",")]), Value::from(vec!["a", "b"]));
            assert!(split(&[s("a"), s("")]).is_err());
            assert_eq!(call(join, &[Value::from(vec![1, 2]), s(", ")]), s("1, 2"));
            assert_eq!(call(join, &[Value::from(vec!["a", "b"])]), s("ab"));
        }
    }

    mod building {
        use super::*;

        #[test]
        fn padding() {
            assert_eq!(call(pad_left, &[Value::from(7), Value::from(3), s("0")]), s("007"));
            assert_eq!(call(pad_right, &[s("ab"), Value::from(4)]), s("ab  "));
            assert_eq!(call(pad_right, &[s("abcdef"), Value::from(2)]), s("abcdef"));
            assert!(pad_left(&[s("a"), Value::from(3), s("ab")]).is_err());
        }

        #[test]
        fn repeat_strings_and_values() {
            assert_eq!(call(repeat, &[s("ab"), Value::from(3)]), s("ababab"));
            assert_eq!(call(repeat, &[Value::from(1), Value::from(2)]), Value::from(vec![1, 1]));
            assert_eq!(call(repeat, &[s("x"), Value::from(-1)]), s(""));
            assert!(repeat(&[s("x"), Value::from(1_000_000)]).is_err());
        }

        #[test]
        fn concat_and_replace() {
            assert_eq!(call(concat, &[s("a"), Value::from(1), Value::Null]), s("a1"));
            assert_eq!(call(replace, &[s("a-b-c"), s("-"), s("+")]), s("a+b+c"));
            assert_eq!(call(replace, &[s("abc"), s(""), s("+")]), s("abc"));
        }
    }

    mod markup {
        use super::*;

        #[test]
        fn slugify_transliterates() {
            assert_eq!(call(slugify, &[s("Héllo, Wörld!")]), s("hello-world"));
            assert_eq!(call(slugify, &[s("  --Already-slugged-- ")]), s("already-slugged"));
        }

        #[test]
        fn escape_and_nl2br() {
            assert_eq!(
                call(escape, &[s(r#"<a href="x">'&'</a>"#)]),
                s("&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;")
            );
            assert_eq!(call(nl2br, &[s("a\nb")]), s("a<br>b"));
        }
    }
}
