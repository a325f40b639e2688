//! Predicate evaluation for `filter`.
//!
//! Evaluation is total: anything that cannot be compared (missing field,
//! wrong binder, mismatched types) is a non-match, never an error.

use super::state::IterationContext;
use crate::dsl::{CompareOp, Predicate, Value};

pub fn evaluate(predicate: &Predicate, ctx: &IterationContext<'_>) -> bool {
    if predicate.binder != ctx.var {
        return false;
    }
    let Some(field) = ctx.item.field(&predicate.field) else {
        return false;
    };
    compare(&field, predicate.op, &predicate.literal)
}

/// Compare an item field (left) against a literal (right).
pub fn compare(field: &Value, op: CompareOp, literal: &Value) -> bool {
    match op {
        CompareOp::In => match literal {
            Value::Array(candidates) => candidates.iter().any(|c| members_equal(field, c)),
            _ => false,
        },
        op if op.is_ordering() => {
            let (Some(l), Some(r)) = (field.to_number(), literal.to_number()) else {
                return false;
            };
            match op {
                CompareOp::Lt => l < r,
                CompareOp::Gt => l > r,
                CompareOp::LtEq => l <= r,
                CompareOp::GtEq => l >= r,
                _ => false,
            }
        }
        CompareOp::Eq => equal(field, literal),
        CompareOp::NotEq => match literal {
            // A bool literal only matches bool fields, either way round.
            Value::Bool(_) if field.as_bool().is_none() => false,
            _ => !equal(field, literal),
        },
        _ => false,
    }
}

/// `==`: booleans by value, everything else by formatted string.
fn equal(field: &Value, literal: &Value) -> bool {
    match literal {
        Value::Bool(b) => field.as_bool() == Some(*b),
        _ => field.to_string() == literal.to_string(),
    }
}

fn members_equal(field: &Value, candidate: &Value) -> bool {
    match (field, candidate) {
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::Bool(_), _) | (_, Value::Bool(_)) => false,
        _ => field.to_string() == candidate.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Clip, Item, Track};

    fn track(name: &str, muted: bool, volume_db: f64) -> Item {
        Item::Track(Track {
            index: Some(0),
            name: Some(name.to_string()),
            muted,
            volume_db: Some(volume_db),
            ..Default::default()
        })
    }

    fn pred(binder: &str, field: &str, op: CompareOp, literal: Value) -> Predicate {
        Predicate {
            binder: binder.into(),
            field: field.into(),
            op,
            literal,
        }
    }

    fn eval(p: &Predicate, item: &Item, var: &str) -> bool {
        evaluate(p, &IterationContext { var, item })
    }

    #[test]
    fn string_equality() {
        let item = track("Bass", false, 0.0);
        let p = pred("track", "name", CompareOp::Eq, Value::String("Bass".into()));
        assert!(eval(&p, &item, "track"));
        let p = pred("track", "name", CompareOp::NotEq, Value::String("Bass".into()));
        assert!(!eval(&p, &item, "track"));
    }

    #[test]
    fn bool_equality_requires_bool_field() {
        let item = track("Bass", true, 0.0);
        assert!(eval(
            &pred("track", "muted", CompareOp::Eq, Value::Bool(true)),
            &item,
            "track"
        ));
        assert!(!eval(
            &pred("track", "name", CompareOp::Eq, Value::Bool(true)),
            &item,
            "track"
        ));
        assert!(!eval(
            &pred("track", "name", CompareOp::NotEq, Value::Bool(true)),
            &item,
            "track"
        ));
        assert!(eval(
            &pred("track", "muted", CompareOp::NotEq, Value::Bool(false)),
            &item,
            "track"
        ));
    }

    #[test]
    fn numeric_ordering() {
        let clip = Item::Clip(Clip {
            length: Some(1.2),
            ..Default::default()
        });
        assert!(eval(
            &pred("clip", "length", CompareOp::Lt, Value::Number(1.5)),
            &clip,
            "clip"
        ));
        assert!(!eval(
            &pred("clip", "length", CompareOp::GtEq, Value::Number(1.5)),
            &clip,
            "clip"
        ));
        assert!(eval(
            &pred("clip", "length", CompareOp::LtEq, Value::Number(1.2)),
            &clip,
            "clip"
        ));
    }

    #[test]
    fn numeric_ordering_coerces_numeric_strings() {
        assert!(compare(
            &Value::String("10".into()),
            CompareOp::Gt,
            &Value::Number(9.0)
        ));
        assert!(!compare(
            &Value::String("ten".into()),
            CompareOp::Gt,
            &Value::Number(9.0)
        ));
        assert!(!compare(&Value::Bool(true), CompareOp::Gt, &Value::Number(0.0)));
    }

    #[test]
    fn number_equality_formats_as_string() {
        assert!(compare(
            &Value::Number(3.0),
            CompareOp::Eq,
            &Value::String("3".into())
        ));
        assert!(compare(&Value::Number(-6.0), CompareOp::Eq, &Value::Number(-6.0)));
    }

    #[test]
    fn membership() {
        let names = Value::Array(vec![
            Value::String("Bass".into()),
            Value::String("Drums".into()),
        ]);
        assert!(compare(&Value::String("Drums".into()), CompareOp::In, &names));
        assert!(!compare(&Value::String("Keys".into()), CompareOp::In, &names));

        let indices = Value::Array(vec![Value::Number(0.0), Value::Number(2.0)]);
        assert!(compare(&Value::Number(2.0), CompareOp::In, &indices));
        assert!(!compare(&Value::Number(1.0), CompareOp::In, &indices));

        assert!(!compare(
            &Value::Bool(true),
            CompareOp::In,
            &Value::Array(vec![Value::String("true".into())])
        ));
        assert!(!compare(
            &Value::String("Bass".into()),
            CompareOp::In,
            &Value::String("Bass".into())
        ));
    }

    #[test]
    fn missing_field_never_matches() {
        let item = track("Bass", false, 0.0);
        let p = pred("track", "color", CompareOp::NotEq, Value::String("red".into()));
        assert!(!eval(&p, &item, "track"));
    }

    #[test]
    fn binder_mismatch_never_matches() {
        let item = track("Bass", false, 0.0);
        let p = pred("clip", "name", CompareOp::Eq, Value::String("Bass".into()));
        assert!(!eval(&p, &item, "track"));
    }
}
