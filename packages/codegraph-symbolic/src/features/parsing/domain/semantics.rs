//! Python value semantics over `NativeValue`
//!
//! Shared by the solver's term evaluator and the concrete interpreter so the
//! two can never disagree on what `-7 // 2` or `'a' in s` means. `None`
//! results mean the operation would raise (type error, division by zero,
//! overflow).

use super::tree::{ArithOp, CmpOp};
use crate::shared::NativeValue;
use std::cmp::Ordering;

/// Python floor division on integers
pub fn floor_div(a: i64, b: i64) -> Option<i64> {
    if b == 0 {
        return None;
    }
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Python modulo on integers (result takes the divisor's sign)
pub fn py_mod(a: i64, b: i64) -> Option<i64> {
    if b == 0 {
        return None;
    }
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

fn int_like(v: &NativeValue) -> Option<i64> {
    match v {
        NativeValue::Int(i) => Some(*i),
        NativeValue::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

pub fn arith(op: ArithOp, l: &NativeValue, r: &NativeValue) -> Option<NativeValue> {
    use NativeValue as V;

    match (l, r) {
        (V::Str(a), V::Str(b)) if op == ArithOp::Add => return Some(V::Str(format!("{}{}", a, b))),
        (V::List(a), V::List(b)) if op == ArithOp::Add => {
            return Some(V::List(a.iter().chain(b.iter()).cloned().collect()))
        }
        (V::Str(s), n) | (n, V::Str(s)) if op == ArithOp::Mul => {
            let times = int_like(n)?;
            if times <= 0 {
                return Some(V::Str(String::new()));
            }
            if s.len().saturating_mul(times as usize) > 1 << 16 {
                return None;
            }
            return Some(V::Str(s.repeat(times as usize)));
        }
        _ => {}
    }

    if let (Some(a), Some(b)) = (int_like(l), int_like(r)) {
        return match op {
            ArithOp::Add => a.checked_add(b).map(V::Int),
            ArithOp::Sub => a.checked_sub(b).map(V::Int),
            ArithOp::Mul => a.checked_mul(b).map(V::Int),
            ArithOp::Div => {
                if b == 0 {
                    None
                } else {
                    Some(V::Float(a as f64 / b as f64))
                }
            }
            ArithOp::FloorDiv => floor_div(a, b).map(V::Int),
            ArithOp::Mod => py_mod(a, b).map(V::Int),
        };
    }

    let a = l.as_f64()?;
    let b = r.as_f64()?;
    let out = match op {
        ArithOp::Add => a + b,
        ArithOp::Sub => a - b,
        ArithOp::Mul => a * b,
        ArithOp::Div => {
            if b == 0.0 {
                return None;
            }
            a / b
        }
        ArithOp::FloorDiv => {
            if b == 0.0 {
                return None;
            }
            (a / b).floor()
        }
        ArithOp::Mod => {
            if b == 0.0 {
                return None;
            }
            a - b * (a / b).floor()
        }
    };
    Some(V::Float(out))
}

pub fn negate(v: &NativeValue) -> Option<NativeValue> {
    match v {
        NativeValue::Int(i) => i.checked_neg().map(NativeValue::Int),
        NativeValue::Bool(b) => Some(NativeValue::Int(-i64::from(*b))),
        NativeValue::Float(f) => Some(NativeValue::Float(-f)),
        _ => None,
    }
}

/// Structural equality with numeric promotion (`1 == 1.0 == True`)
pub fn py_eq(l: &NativeValue, r: &NativeValue) -> bool {
    use NativeValue as V;
    match (l, r) {
        (V::None, V::None) => true,
        (V::Str(a), V::Str(b)) => a == b,
        (V::List(a), V::List(b)) => a.len() == b.len() && a.iter().zip(b).all(|(x, y)| py_eq(x, y)),
        (V::Dict(a), V::Dict(b)) => {
            a.len() == b.len()
                && a.iter().all(|(k, v)| {
                    b.iter()
                        .find(|(k2, _)| py_eq(k, k2))
                        .is_some_and(|(_, v2)| py_eq(v, v2))
                })
        }
        _ => match (l.as_f64(), r.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn ordering(l: &NativeValue, r: &NativeValue) -> Option<Ordering> {
    use NativeValue as V;
    match (l, r) {
        (V::Str(a), V::Str(b)) => Some(a.cmp(b)),
        (V::List(a), V::List(b)) => {
            for (x, y) in a.iter().zip(b) {
                if !py_eq(x, y) {
                    return ordering(x, y);
                }
            }
            Some(a.len().cmp(&b.len()))
        }
        _ => {
            if let (Some(a), Some(b)) = (int_like(l), int_like(r)) {
                return Some(a.cmp(&b));
            }
            l.as_f64()?.partial_cmp(&r.as_f64()?)
        }
    }
}

/// Membership (`needle in haystack`)
pub fn contains(haystack: &NativeValue, needle: &NativeValue) -> Option<bool> {
    match haystack {
        NativeValue::Str(h) => match needle {
            NativeValue::Str(n) => Some(h.contains(n.as_str())),
            _ => None,
        },
        NativeValue::List(items) => Some(items.iter().any(|i| py_eq(i, needle))),
        NativeValue::Dict(entries) => Some(entries.iter().any(|(k, _)| py_eq(k, needle))),
        _ => None,
    }
}

pub fn compare(op: CmpOp, l: &NativeValue, r: &NativeValue) -> Option<bool> {
    match op {
        CmpOp::Eq => Some(py_eq(l, r)),
        CmpOp::Ne => Some(!py_eq(l, r)),
        CmpOp::In => contains(r, l),
        CmpOp::NotIn => contains(r, l).map(|b| !b),
        CmpOp::Lt => ordering(l, r).map(|o| o == Ordering::Less),
        CmpOp::Le => ordering(l, r).map(|o| o != Ordering::Greater),
        CmpOp::Gt => ordering(l, r).map(|o| o == Ordering::Greater),
        CmpOp::Ge => ordering(l, r).map(|o| o != Ordering::Less),
    }
}
