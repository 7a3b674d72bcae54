//! Property-based tests for the expression evaluator using proptest.

use proptest::prelude::*;
use weft_expr::{Context, Evaluator, HelperRegistry, Value};

// ============================================================================
// Test helpers
// ============================================================================

fn eval(source: &str, ctx: &Context<'_>) -> Value {
    let helpers = HelperRegistry::builtin();
    Evaluator::new(&helpers).evaluate(source, ctx)
}

fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e9f64..1.0e9).prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
    ]
}

// Token soup that looks like expressions, to reach deeper parser states
// than uniformly random strings do.
fn expression_like() -> impl Strategy<Value = String> {
    let token = prop_oneof![
        Just("a".to_string()),
        Just("b.c".to_string()),
        Just("items[0]".to_string()),
        Just("upper(".to_string()),
        Just(".toFixed(2)".to_string()),
        Just("?".to_string()),
        Just(":".to_string()),
        Just("??".to_string()),
        Just("&&".to_string()),
        Just("||".to_string()),
        Just("(".to_string()),
        Just(")".to_string()),
        Just("'s'".to_string()),
        Just("1.5".to_string()),
        Just("/ 0".to_string()),
        Just(",".to_string()),
        Just("!".to_string()),
        Just("==".to_string()),
    ];
    prop::collection::vec(token, 0..16).prop_map(|tokens| tokens.join(" "))
}

fn sample_context() -> Context<'static> {
    Context::new()
        .with("a", 3)
        .with("b", serde_json::json!({"c": "nested"}))
        .with("items", vec![10, 20])
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// evaluate never panics on arbitrary input.
    #[test]
    fn evaluate_never_panics_on_arbitrary_text(source in any::<String>()) {
        let _ = eval(&source, &sample_context());
    }

    /// evaluate never panics on expression-shaped input either.
    #[test]
    fn evaluate_never_panics_on_token_soup(source in expression_like()) {
        let _ = eval(&source, &sample_context());
    }

    /// A bound name always evaluates to its value.
    #[test]
    fn bound_names_resolve_to_their_value(
        name in "[a-z_][a-z0-9_]{0,10}",
        value in scalar_strategy(),
    ) {
        prop_assume!(!["true", "false", "null", "none", "undefined", "not", "and", "or", "in"]
            .contains(&name.as_str()));
        let ctx = Context::new().with(name.clone(), value.clone());
        prop_assert_eq!(eval(&name, &ctx), value);
    }

    /// Integer arithmetic agrees with i64 when it does not overflow.
    #[test]
    fn integer_addition_matches_native(x in -1_000_000i64..1_000_000, y in -1_000_000i64..1_000_000) {
        let ctx = Context::new().with("x", x).with("y", y);
        prop_assert_eq!(eval("x + y", &ctx), Value::from(x + y));
        prop_assert_eq!(eval("x * y", &ctx), Value::from(x * y));
        prop_assert_eq!(eval("x < y", &ctx), Value::from(x < y));
    }

    /// Ternaries select exactly one branch by truthiness.
    #[test]
    fn ternary_selects_by_truthiness(cond in scalar_strategy()) {
        let expected = if cond.is_truthy() { "yes" } else { "no" };
        let ctx = Context::new().with("cond", cond);
        prop_assert_eq!(eval("cond ? 'yes' : 'no'", &ctx), Value::from(expected));
    }

    /// `??` only replaces null.
    #[test]
    fn coalesce_only_replaces_null(value in scalar_strategy()) {
        let ctx = Context::new().with("v", value.clone());
        let expected = if value.is_null() { Value::from("fallback") } else { value };
        prop_assert_eq!(eval("v ?? 'fallback'", &ctx), expected);
    }

    /// toFixed always yields the requested number of fractional digits.
    #[test]
    fn to_fixed_digit_count(x in -1.0e6f64..1.0e6, digits in 0usize..8) {
        let ctx = Context::new().with("x", x);
        let out = eval(&format!("x.toFixed({})", digits), &ctx).to_string();
        match out.split_once('.') {
            Some((_, fraction)) => prop_assert_eq!(fraction.len(), digits),
            None => prop_assert_eq!(digits, 0),
        }
    }

    /// Missing paths resolve to null at any depth.
    #[test]
    fn missing_paths_are_null(segments in prop::collection::vec("[a-z]{1,6}", 1..5)) {
        let path = format!("missing_root.{}", segments.join("."));
        prop_assert_eq!(eval(&path, &Context::new()), Value::Null);
    }
}
