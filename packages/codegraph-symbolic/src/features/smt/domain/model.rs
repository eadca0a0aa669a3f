//! Solver models

use crate::shared::NativeValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Solver-native value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelValue {
    Int(i64),
    Rational { num: i64, den: i64 },
    Str(String),
    Bool(bool),
}

fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a.max(1) as i64
}

impl ModelValue {
    /// Exact for decimals with up to six fractional digits
    pub fn rational_from_f64(value: f64) -> Self {
        let mut den: i64 = 1;
        while den < 1_000_000 && ((value * den as f64).round() - value * den as f64).abs() > 1e-9 {
            den *= 10;
        }
        let num = (value * den as f64).round() as i64;
        let g = gcd(num, den);
        ModelValue::Rational {
            num: num / g,
            den: den / g,
        }
    }

    pub fn from_native(value: &NativeValue) -> Option<Self> {
        match value {
            NativeValue::Int(v) => Some(ModelValue::Int(*v)),
            NativeValue::Float(v) if v.is_finite() => Some(Self::rational_from_f64(*v)),
            NativeValue::Bool(v) => Some(ModelValue::Bool(*v)),
            NativeValue::Str(v) => Some(ModelValue::Str(v.clone())),
            _ => None,
        }
    }

    pub fn to_native(&self) -> NativeValue {
        match self {
            ModelValue::Int(v) => NativeValue::Int(*v),
            ModelValue::Rational { num, den } => {
                if *den == 0 {
                    NativeValue::Float(f64::NAN)
                } else {
                    NativeValue::Float(*num as f64 / *den as f64)
                }
            }
            ModelValue::Str(v) => NativeValue::Str(v.clone()),
            ModelValue::Bool(v) => NativeValue::Bool(*v),
        }
    }
}

/// Variable assignment for one satisfiable path, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolverModel(BTreeMap<String, ModelValue>);

impl SolverModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ModelValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ModelValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ModelValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, ModelValue)> for SolverModel {
    fn from_iter<I: IntoIterator<Item = (String, ModelValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rational_from_decimal() {
        assert_eq!(
            ModelValue::rational_from_f64(0.5),
            ModelValue::Rational { num: 1, den: 2 }
        );
        assert_eq!(
            ModelValue::rational_from_f64(-2.25),
            ModelValue::Rational { num: -9, den: 4 }
        );
        assert_eq!(
            ModelValue::rational_from_f64(3.0),
            ModelValue::Rational { num: 3, den: 1 }
        );
    }

    #[test]
    fn test_model_serializes_in_name_order() {
        let model: SolverModel = vec![
            ("y".to_string(), ModelValue::Bool(true)),
            ("x".to_string(), ModelValue::Int(1)),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            serde_json::to_string(&model).unwrap(),
            "{\"x\":1,\"y\":true}"
        );
    }
}
