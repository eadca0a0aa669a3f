//! Solver value to native value coercion
//!
//! Total over `(ModelValue, RequestedType)`: every pair yields a value.
//! Conversions that lose the value fall back to the requested type's zero
//! and carry a warning.

use crate::features::smt::domain::ModelValue;
use crate::features::test_generation::domain::{Coerced, RequestedType};
use crate::shared::NativeValue;

fn rational_to_f64(num: i64, den: i64) -> Option<f64> {
    (den != 0).then(|| num as f64 / den as f64)
}

fn render(value: &ModelValue) -> String {
    match value {
        ModelValue::Rational { num, den } => format!("{}/{}", num, den),
        other => other.to_native().to_string(),
    }
}

pub fn coerce(value: &ModelValue, requested: RequestedType) -> Coerced {
    use ModelValue as M;
    use NativeValue as N;

    match (requested, value) {
        (RequestedType::Untyped, M::Rational { num, den }) => {
            if *den == 1 {
                Coerced::clean(N::Int(*num))
            } else {
                match rational_to_f64(*num, *den) {
                    Some(f) => Coerced::clean(N::Float(f)),
                    None => Coerced::fallback(render(value), requested),
                }
            }
        }
        (RequestedType::Untyped, other) => Coerced::clean(other.to_native()),

        (RequestedType::Int, M::Int(v)) => Coerced::clean(N::Int(*v)),
        (RequestedType::Int, M::Bool(b)) => Coerced::clean(N::Int(i64::from(*b))),
        (RequestedType::Int, M::Rational { num, den }) => match num.checked_div(*den) {
            // Python int() truncates toward zero
            Some(v) => Coerced::clean(N::Int(v)),
            None => Coerced::fallback(render(value), requested),
        },
        (RequestedType::Int, M::Str(s)) => match s.trim().parse::<i64>() {
            Ok(v) => Coerced::clean(N::Int(v)),
            Err(_) => Coerced::fallback(render(value), requested),
        },

        (RequestedType::Float, M::Int(v)) => Coerced::clean(N::Float(*v as f64)),
        (RequestedType::Float, M::Bool(b)) => Coerced::clean(N::Float(if *b { 1.0 } else { 0.0 })),
        (RequestedType::Float, M::Rational { num, den }) => match rational_to_f64(*num, *den) {
            Some(f) => Coerced::clean(N::Float(f)),
            None => Coerced::fallback(render(value), requested),
        },
        (RequestedType::Float, M::Str(s)) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Coerced::clean(N::Float(f)),
            _ => Coerced::fallback(render(value), requested),
        },

        (RequestedType::Bool, M::Bool(b)) => Coerced::clean(N::Bool(*b)),
        (RequestedType::Bool, M::Int(v)) => Coerced::clean(N::Bool(*v != 0)),
        (RequestedType::Bool, M::Rational { num, .. }) => Coerced::clean(N::Bool(*num != 0)),
        (RequestedType::Bool, M::Str(s)) => Coerced::clean(N::Bool(!s.is_empty())),

        (RequestedType::Str, M::Str(s)) => Coerced::clean(N::Str(s.clone())),
        (RequestedType::Str, M::Rational { num, den }) => match rational_to_f64(*num, *den) {
            Some(f) => Coerced::clean(N::Str(N::Float(f).to_string())),
            None => Coerced::fallback(render(value), requested),
        },
        (RequestedType::Str, other) => Coerced::clean(N::Str(other.to_native().to_string())),

        // zero denominators and scalar values for container requests
        _ => Coerced::fallback(render(value), requested),
    }
}

/// Coerce an already-native value (boundary picks, literals)
pub fn coerce_native(value: &NativeValue, requested: RequestedType) -> Coerced {
    match (value, requested) {
        (NativeValue::List(_), RequestedType::List) | (NativeValue::Dict(_), RequestedType::Dict) => {
            Coerced::clean(value.clone())
        }
        _ => match ModelValue::from_native(value) {
            Some(m) => coerce(&m, requested),
            None => Coerced::fallback(value, requested),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_untyped_integer_like_stays_int() {
        assert_eq!(coerce(&ModelValue::Int(7), RequestedType::Untyped).value, NativeValue::Int(7));
        let r = ModelValue::Rational { num: 4, den: 1 };
        assert_eq!(coerce(&r, RequestedType::Untyped).value, NativeValue::Int(4));
        let half = ModelValue::Rational { num: 1, den: 2 };
        assert_eq!(coerce(&half, RequestedType::Untyped).value, NativeValue::Float(0.5));
    }

    #[test]
    fn test_requested_conversions() {
        assert_eq!(coerce(&ModelValue::Int(3), RequestedType::Float).value, NativeValue::Float(3.0));
        assert_eq!(coerce(&ModelValue::Int(0), RequestedType::Bool).value, NativeValue::Bool(false));
        assert_eq!(
            coerce(&ModelValue::Bool(true), RequestedType::Str).value,
            NativeValue::Str("True".into())
        );
        assert_eq!(
            coerce(&ModelValue::Rational { num: -7, den: 2 }, RequestedType::Int).value,
            NativeValue::Int(-3)
        );
    }

    #[test]
    fn test_unparseable_string_falls_back_with_warning() {
        let c = coerce(&ModelValue::Str("abc".into()), RequestedType::Float);
        assert_eq!(c.value, NativeValue::Float(0.0));
        let warning = c.warning.unwrap();
        assert_eq!(warning.requested, RequestedType::Float);
        assert!(warning.to_string().contains("'abc'"));
    }

    #[test]
    fn test_zero_denominator_falls_back() {
        let c = coerce(&ModelValue::Rational { num: 1, den: 0 }, RequestedType::Float);
        assert_eq!(c.value, NativeValue::Float(0.0));
        assert!(c.warning.is_some());
    }

    fn model_value() -> impl Strategy<Value = ModelValue> {
        prop_oneof![
            any::<i64>().prop_map(ModelValue::Int),
            (any::<i64>(), any::<i64>()).prop_map(|(num, den)| ModelValue::Rational { num, den }),
            ".*".prop_map(ModelValue::Str),
            any::<bool>().prop_map(ModelValue::Bool),
        ]
    }

    fn requested() -> impl Strategy<Value = RequestedType> {
        prop_oneof![
            Just(RequestedType::Untyped),
            Just(RequestedType::Int),
            Just(RequestedType::Float),
            Just(RequestedType::Bool),
            Just(RequestedType::Str),
            Just(RequestedType::List),
            Just(RequestedType::Dict),
        ]
    }

    proptest! {
        #[test]
        fn prop_coercion_is_total_and_typed(value in model_value(), ty in requested()) {
            let c = coerce(&value, ty);
            let matches = match (ty, &c.value) {
                (RequestedType::Untyped, _) => true,
                (RequestedType::Int, NativeValue::Int(_)) => true,
                (RequestedType::Float, NativeValue::Float(_)) => true,
                (RequestedType::Bool, NativeValue::Bool(_)) => true,
                (RequestedType::Str, NativeValue::Str(_)) => true,
                (RequestedType::List, NativeValue::List(_)) => true,
                (RequestedType::Dict, NativeValue::Dict(_)) => true,
                _ => false,
            };
            prop_assert!(matches, "{:?} as {:?} gave {:?}", value, ty, c.value);
            if let Some(w) = &c.warning {
                prop_assert_eq!(w.requested, ty);
            }
        }
    }
}
