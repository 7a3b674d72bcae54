//! Date helpers.
//!
//! Dates travel through templates as strings. Accepted inputs are RFC 3339,
//! `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`, and integer Unix
//! seconds. Results keep the date-only or date-time shape of their input.
//! Inputs that do not parse are passed through unchanged, as are the results
//! of date arithmetic on them.

use std::fmt::Write;

use chrono::{DateTime, Days, Local, Months, NaiveDate, NaiveDateTime};

use super::{arg, arity, int_arg, text, HelperRegistry};
use crate::error::{HelperError, HelperResult};
use crate::value::Value;

const DATE: &str = "%Y-%m-%d";
const DATETIME: &str = "%Y-%m-%d %H:%M:%S";

pub(super) fn register(registry: &mut HelperRegistry) {
    registry.insert("now", |args: &[Value]| now_formatted(args, DATETIME));
    registry.insert("date", |args: &[Value]| now_formatted(args, DATE));
    registry.insert("time", |args: &[Value]| now_formatted(args, "%H:%M:%S"));
    registry.insert("datetime", |args: &[Value]| now_formatted(args, DATETIME));
    registry.insert("format_date", format_date);
    registry.insert("add_days", |args: &[Value]| shift(args, Unit::Days));
    registry.insert("add_months", |args: &[Value]| shift(args, Unit::Months));
    registry.insert("add_years", |args: &[Value]| shift(args, Unit::Years));
    registry.insert("diff_days", diff_days);
}

/// A parsed date, remembering whether it carried a time of day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Moment {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Moment {
    pub(crate) fn parse(value: &Value) -> Option<Moment> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|dt| Moment::DateTime(dt.naive_utc())),
            Value::String(s) => {
                let s = s.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                    return Some(Moment::DateTime(dt.naive_local()));
                }
                for fmt in [DATETIME, "%Y-%m-%dT%H:%M:%S"] {
                    if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                        return Some(Moment::DateTime(dt));
                    }
                }
                NaiveDate::parse_from_str(s, DATE).ok().map(Moment::Date)
            }
            _ => None,
        }
    }

    fn datetime(self) -> NaiveDateTime {
        match self {
            Moment::Date(d) => d.and_time(chrono::NaiveTime::MIN),
            Moment::DateTime(dt) => dt,
        }
    }

    fn format(self, fmt: &str) -> Result<String, HelperError> {
        let mut out = String::new();
        let written = match self {
            Moment::Date(d) => write!(out, "{}", d.format(fmt)),
            Moment::DateTime(dt) => write!(out, "{}", dt.format(fmt)),
        };
        written.map_err(|_| HelperError::invalid(format!("invalid date format '{}'", fmt)))?;
        Ok(out)
    }

    fn render(self) -> String {
        match self {
            Moment::Date(d) => d.format(DATE).to_string(),
            Moment::DateTime(dt) => dt.format(DATETIME).to_string(),
        }
    }
}

fn format_arg(args: &[Value], i: usize, default: &str) -> String {
    match arg(args, i) {
        Value::Null => default.to_string(),
        _ => text(args, i),
    }
}

/// The current local time, formatted with an optional strftime pattern.
fn now_formatted(args: &[Value], default: &str) -> HelperResult {
    arity(args, 0, 1)?;
    let fmt = format_arg(args, 0, default);
    Moment::DateTime(Local::now().naive_local())
        .format(&fmt)
        .map(Value::String)
}

/// `format_date(date, fmt = "%Y-%m-%d")`
fn format_date(args: &[Value]) -> HelperResult {
    arity(args, 1, 2)?;
    match Moment::parse(arg(args, 0)) {
        Some(moment) => moment.format(&format_arg(args, 1, DATE)).map(Value::String),
        None => Ok(arg(args, 0).clone()),
    }
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Days,
    Months,
    Years,
}

fn shift_by(moment: Moment, unit: Unit, amount: i64) -> Option<Moment> {
    let magnitude = amount.unsigned_abs();
    match unit {
        Unit::Days => {
            let days = Days::new(magnitude);
            match (moment, amount < 0) {
                (Moment::Date(d), false) => d.checked_add_days(days).map(Moment::Date),
                (Moment::Date(d), true) => d.checked_sub_days(days).map(Moment::Date),
                (Moment::DateTime(dt), false) => dt.checked_add_days(days).map(Moment::DateTime),
                (Moment::DateTime(dt), true) => dt.checked_sub_days(days).map(Moment::DateTime),
            }
        }
        Unit::Months | Unit::Years => {
            let months = match unit {
                Unit::Years => magnitude.checked_mul(12)?,
                _ => magnitude,
            };
            let months = Months::new(u32::try_from(months).ok()?);
            match (moment, amount < 0) {
                (Moment::Date(d), false) => d.checked_add_months(months).map(Moment::Date),
                (Moment::Date(d), true) => d.checked_sub_months(months).map(Moment::Date),
                (Moment::DateTime(dt), false) => dt.checked_add_months(months).map(Moment::DateTime),
                (Moment::DateTime(dt), true) => dt.checked_sub_months(months).map(Moment::DateTime),
            }
        }
    }
}

/// `add_days(date, n)` and friends; month arithmetic clamps to month end.
fn shift(args: &[Value], unit: Unit) -> HelperResult {
    arity(args, 2, 2)?;
    let Some(moment) = Moment::parse(arg(args, 0)) else {
        return Ok(arg(args, 0).clone());
    };
    let amount = int_arg(args, 1, 0)?;
    shift_by(moment, unit, amount)
        .map(|shifted| Value::String(shifted.render()))
        .ok_or_else(|| HelperError::invalid("date out of range"))
}

/// Whole days from the first date to the second; `0` if either does not parse.
fn diff_days(args: &[Value]) -> HelperResult {
    arity(args, 2, 2)?;
    match (Moment::parse(arg(args, 0)), Moment::parse(arg(args, 1))) {
        (Some(from), Some(to)) => Ok(Value::from(
            to.datetime().signed_duration_since(from.datetime()).num_days(),
        )),
        _ => Ok(Value::from(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    mod parsing {
        use super::*;

        #[test]
        fn accepted_shapes() {
            assert!(matches!(Moment::parse(&s("2024-02-29")), Some(Moment::Date(_))));
            assert!(matches!(
                Moment::parse(&s("2024-02-29 10:30:00")),
                Some(Moment::DateTime(_))
            ));
            assert!(matches!(
                Moment::parse(&s("2024-02-29T10:30:00")),
                Some(Moment::DateTime(_))
            ));
            assert!(matches!(
                Moment::parse(&s("2024-02-29T10:30:00+02:00")),
                Some(Moment::DateTime(_))
            ));
            assert_eq!(
                Moment::parse(&Value::from(0)).map(Moment::render),
                Some("1970-01-01 00:00:00".to_string())
            );
        }

        #[test]
        fn rejected_shapes() {
            assert_eq!(Moment::parse(&s("2024-02-30")), None);
            assert_eq!(Moment::parse(&s("yesterday")), None);
            assert_eq!(Moment::parse(&Value::from(true)), None);
        }
    }

    mod formatting {
        use super::*;

        #[test]
        fn format_date_with_pattern() {
            assert_eq!(format_date(&[s("2024-03-05")]).unwrap(), s("2024-03-05"));
            assert_eq!(
                format_date(&[s("2024-03-05 14:07:00"), s("%d/%m/%Y %H:%M")]).unwrap(),
                s("05/03/2024 14:07")
            );
            assert_eq!(format_date(&[s("not a date"), s("%Y")]).unwrap(), s("not a date"));
        }

        #[test]
        fn invalid_pattern_is_an_error_not_a_panic() {
            assert!(format_date(&[s("2024-03-05"), s("%Q")]).is_err());
            assert!(now_formatted(&[s("%Q")], DATE).is_err());
        }

        #[test]
        fn now_uses_default_shapes() {
            let today = now_formatted(&[], DATE).unwrap();
            assert!(matches!(Moment::parse(&today), Some(Moment::Date(_))));
            let stamp = now_formatted(&[], DATETIME).unwrap();
            assert!(matches!(Moment::parse(&stamp), Some(Moment::DateTime(_))));
        }
    }

    mod arithmetic {
        use super::*;

        #[test]
        fn shifting_keeps_shape() {
            assert_eq!(shift(&[s("2024-01-31"), Value::from(1)], Unit::Days).unwrap(), s("2024-02-01"));
            assert_eq!(shift(&[s("2024-01-31"), Value::from(1)], Unit::Months).unwrap(), s("2024-02-29"));
            assert_eq!(shift(&[s("2024-02-29"), Value::from(-1)], Unit::Years).unwrap(), s("2023-02-28"));
            assert_eq!(
                shift(&[s("2024-01-01 08:00:00"), Value::from(-1)], Unit::Days).unwrap(),
                s("2023-12-31 08:00:00")
            );
            assert_eq!(shift(&[s("soon"), Value::from(1)], Unit::Days).unwrap(), s("soon"));
        }

        #[test]
        fn diff_in_days() {
            assert_eq!(diff_days(&[s("2024-01-01"), s("2024-03-01")]).unwrap(), Value::from(60));
            assert_eq!(diff_days(&[s("2024-03-01"), s("2024-01-01 12:00:00")]).unwrap(), Value::from(-59));
            assert_eq!(diff_days(&[s("x"), s("2024-01-01")]).unwrap(), Value::from(0));
        }
    }
}
