//! Prefix and infix operators.
//!
//! Mixed numeric operands are promoted before the operation: a Decimal on either side
//! makes both Decimal, otherwise a Float makes both Float, otherwise a signed Integer
//! makes both Integer. Integer arithmetic wraps.

use std::cmp::Ordering;

use crate::ast::{InfixOp, PrefixOp};
use crate::decimal::Decimal;
use crate::error::{ErrorKind, RuntimeError};
use crate::interpreter::value::Object;
use crate::span::Span;

use super::{Interpreter, RuntimeResult};

/// Both operands after promotion to a common numeric type.
enum NumPair {
    Int(i64, i64),
    UInt(u64, u64),
    Float(f64, f64),
    Decimal(Decimal, Decimal),
}

fn as_decimal(value: &Object, span: Span) -> RuntimeResult<Option<Decimal>> {
    let decimal = match value {
        Object::Integer(n) => Decimal::from_i64(*n),
        Object::UInteger(n) => Decimal::from_u64(*n),
        Object::Float(f) => Decimal::from_f64(*f)
            .map_err(|err| RuntimeError::new(ErrorKind::InvalidArgument(err.to_string()), span))?,
        Object::Decimal(d) => d.clone(),
        _ => return Ok(None),
    };
    Ok(Some(decimal))
}

fn as_float(value: &Object) -> Option<f64> {
    match value {
        Object::Integer(n) => Some(*n as f64),
        Object::UInteger(n) => Some(*n as f64),
        Object::Float(f) => Some(*f),
        _ => None,
    }
}

fn promote(left: &Object, right: &Object, span: Span) -> RuntimeResult<Option<NumPair>> {
    use Object::{Float, Integer, UInteger};
    let pair = match (left, right) {
        (Integer(a), Integer(b)) => NumPair::Int(*a, *b),
        (UInteger(a), UInteger(b)) => NumPair::UInt(*a, *b),
        (Integer(a), UInteger(b)) => NumPair::Int(*a, *b as i64),
        (UInteger(a), Integer(b)) => NumPair::Int(*a as i64, *b),
        (Object::Decimal(_), _) | (_, Object::Decimal(_)) => {
            match (as_decimal(left, span)?, as_decimal(right, span)?) {
                (Some(a), Some(b)) => NumPair::Decimal(a, b),
                _ => return Ok(None),
            }
        }
        (Float(_), _) | (_, Float(_)) => match (as_float(left), as_float(right)) {
            (Some(a), Some(b)) => NumPair::Float(a, b),
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };
    Ok(Some(pair))
}

fn ordering_result(op: InfixOp, ordering: Option<Ordering>) -> Object {
    let result = match (op, ordering) {
        (InfixOp::Equal, ord) => ord == Some(Ordering::Equal),
        (InfixOp::NotEqual, ord) => ord != Some(Ordering::Equal),
        (_, None) => false,
        (InfixOp::Less, Some(ord)) => ord == Ordering::Less,
        (InfixOp::LessEqual, Some(ord)) => ord != Ordering::Greater,
        (InfixOp::Greater, Some(ord)) => ord == Ordering::Greater,
        (InfixOp::GreaterEqual, Some(ord)) => ord != Ordering::Less,
        _ => false,
    };
    Object::Boolean(result)
}

fn is_comparison(op: InfixOp) -> bool {
    matches!(
        op,
        InfixOp::Equal | InfixOp::NotEqual | InfixOp::Less | InfixOp::LessEqual | InfixOp::Greater | InfixOp::GreaterEqual
    )
}

fn int_pow(base: i64, exp: i64) -> Object {
    match u32::try_from(exp) {
        Ok(exp) => Object::Integer(base.wrapping_pow(exp)),
        // Negative exponents give a fraction.
        Err(_) => Object::Float((base as f64).powf(exp as f64)),
    }
}

impl Interpreter {
    pub(crate) fn apply_prefix(&self, op: PrefixOp, operand: Object, span: Span) -> RuntimeResult<Object> {
        let result = match (op, &operand) {
            (PrefixOp::Not, value) => Object::Boolean(!value.is_truthy()),
            (PrefixOp::Negate, Object::Integer(n)) => Object::Integer(n.wrapping_neg()),
            (PrefixOp::Negate, Object::UInteger(n)) => Object::Integer((*n as i64).wrapping_neg()),
            (PrefixOp::Negate, Object::Float(f)) => Object::Float(-f),
            (PrefixOp::Negate, Object::Decimal(d)) => Object::Decimal(d.neg()),
            (PrefixOp::Plus, Object::Integer(_) | Object::UInteger(_) | Object::Float(_) | Object::Decimal(_)) => {
                operand.clone()
            }
            _ => {
                return Err(RuntimeError::new(
                    ErrorKind::PrefixOp {
                        op: op.to_string(),
                        operand: operand.type_name(),
                    },
                    span,
                ))
            }
        };
        Ok(result)
    }

    pub(crate) fn apply_infix(&self, op: InfixOp, left: Object, right: Object, span: Span) -> RuntimeResult<Object> {
        let unsupported = || RuntimeError::new(ErrorKind::infix(left.type_name(), op.to_string(), right.type_name()), span);

        if let Some(pair) = promote(&left, &right, span)? {
            return numeric_infix(op, pair, span)?.ok_or_else(unsupported);
        }

        let result = match (&left, &right) {
            (Object::String(a), Object::String(b)) => match op {
                InfixOp::Add => Object::String(format!("{}{}", a, b)),
                op if is_comparison(op) => ordering_result(op, Some(a.cmp(b))),
                _ => return Err(unsupported()),
            },
            (Object::String(s), Object::Integer(n)) | (Object::Integer(n), Object::String(s))
                if op == InfixOp::Multiply =>
            {
                Object::String(repeat_string(s, (*n).max(0)).map_err(|kind| RuntimeError::new(kind, span))?)
            }
            (Object::Array(a), Object::Array(b)) if op == InfixOp::Add => {
                let mut items = a.read().clone();
                items.extend(b.read().iter().cloned());
                Object::array(items)
            }
            (Object::Tuple(a), Object::Tuple(b)) if op == InfixOp::Add => {
                Object::tuple(a.iter().chain(b.iter()).cloned().collect())
            }
            _ => match op {
                InfixOp::Equal => Object::Boolean(left == right),
                InfixOp::NotEqual => Object::Boolean(left != right),
                _ => return Err(unsupported()),
            },
        };
        Ok(result)
    }
}

/// Largest string `*` and `repeat` may build.
pub(crate) const MAX_REPEAT_BYTES: usize = 1 << 30;

/// `s` repeated `times` times, refusing negative counts and results over
/// [`MAX_REPEAT_BYTES`].
pub(crate) fn repeat_string(s: &str, times: i64) -> Result<String, ErrorKind> {
    let too_long = || ErrorKind::InvalidArgument(format!("repeat count {} is too large", times));
    let count = usize::try_from(times).map_err(|_| ErrorKind::InvalidArgument(times.to_string()))?;
    match s.len().checked_mul(count) {
        Some(total) if total <= MAX_REPEAT_BYTES => Ok(s.repeat(count)),
        _ => Err(too_long()),
    }
}

/// Arithmetic or comparison on promoted operands. `None` for operators numbers do not support.
fn numeric_infix(op: InfixOp, pair: NumPair, span: Span) -> RuntimeResult<Option<Object>> {
    let divide_by_zero = || RuntimeError::new(ErrorKind::DivideByZero, span);
    let result = match pair {
        NumPair::Int(a, b) => match op {
            InfixOp::Add => Object::Integer(a.wrapping_add(b)),
            InfixOp::Subtract => Object::Integer(a.wrapping_sub(b)),
            InfixOp::Multiply => Object::Integer(a.wrapping_mul(b)),
            InfixOp::Divide if b == 0 => return Err(divide_by_zero()),
            InfixOp::Divide => Object::Integer(a.wrapping_div(b)),
            InfixOp::Modulo if b == 0 => return Err(divide_by_zero()),
            InfixOp::Modulo => Object::Integer(a.wrapping_rem(b)),
            InfixOp::Power => int_pow(a, b),
            op if is_comparison(op) => ordering_result(op, Some(a.cmp(&b))),
            _ => return Ok(None),
        },
        NumPair::UInt(a, b) => match op {
            InfixOp::Add => Object::UInteger(a.wrapping_add(b)),
            InfixOp::Subtract => Object::UInteger(a.wrapping_sub(b)),
            InfixOp::Multiply => Object::UInteger(a.wrapping_mul(b)),
            InfixOp::Divide if b == 0 => return Err(divide_by_zero()),
            InfixOp::Divide => Object::UInteger(a / b),
            InfixOp::Modulo if b == 0 => return Err(divide_by_zero()),
            InfixOp::Modulo => Object::UInteger(a % b),
            InfixOp::Power => match u32::try_from(b) {
                Ok(exp) => Object::UInteger(a.wrapping_pow(exp)),
                Err(_) => Object::Float((a as f64).powf(b as f64)),
            },
            op if is_comparison(op) => ordering_result(op, Some(a.cmp(&b))),
            _ => return Ok(None),
        },
        NumPair::Float(a, b) => match op {
            InfixOp::Add => Object::Float(a + b),
            InfixOp::Subtract => Object::Float(a - b),
            InfixOp::Multiply => Object::Float(a * b),
            InfixOp::Divide if b == 0.0 => return Err(divide_by_zero()),
            InfixOp::Divide => Object::Float(a / b),
            InfixOp::Modulo if b == 0.0 => return Err(divide_by_zero()),
            InfixOp::Modulo => Object::Float(a % b),
            InfixOp::Power => Object::Float(a.powf(b)),
            op if is_comparison(op) => ordering_result(op, a.partial_cmp(&b)),
            _ => return Ok(None),
        },
        NumPair::Decimal(a, b) => match op {
            InfixOp::Add => Object::Decimal(a.add(&b)),
            InfixOp::Subtract => Object::Decimal(a.sub(&b)),
            InfixOp::Multiply => Object::Decimal(a.mul(&b)),
            InfixOp::Divide => Object::Decimal(a.checked_div(&b).ok_or_else(divide_by_zero)?),
            InfixOp::Modulo if b.is_zero() => return Err(divide_by_zero()),
            InfixOp::Modulo => Object::Decimal(a.modulo(&b)),
            InfixOp::Power => Object::Decimal(a.pow(&b).map_err(|_| divide_by_zero())?),
            op if is_comparison(op) => ordering_result(op, Some(a.cmp(&b))),
            _ => return Ok(None),
        },
    };
    Ok(Some(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::environment::{OutputBuffer, Scope};
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn interp() -> Interpreter {
        Interpreter::new(Scope::with_buffer(&OutputBuffer::new()))
    }

    fn infix(op: InfixOp, left: Object, right: Object) -> RuntimeResult<Object> {
        interp().apply_infix(op, left, right, Span::at_line(1))
    }

    #[test]
    fn test_numeric_promotion() {
        assert_eq!(infix(InfixOp::Add, Object::Integer(2), Object::UInteger(3)).unwrap(), Object::Integer(5));
        assert_eq!(infix(InfixOp::Multiply, Object::Integer(2), Object::Float(1.5)).unwrap(), Object::Float(3.0));
        let sum = infix(
            InfixOp::Add,
            Object::Float(0.5),
            Object::Decimal(Decimal::from_str("1.25").unwrap()),
        )
        .unwrap();
        assert_eq!(sum.inspect(), "1.75");
        assert_eq!(infix(InfixOp::Subtract, Object::UInteger(0), Object::UInteger(1)).unwrap(), Object::UInteger(u64::MAX));
    }

    #[test]
    fn test_integer_overflow_wraps() {
        assert_eq!(infix(InfixOp::Add, Object::Integer(i64::MAX), Object::Integer(1)).unwrap(), Object::Integer(i64::MIN));
    }

    #[test]
    fn test_divide_by_zero_for_every_numeric_kind() {
        for (left, right) in [
            (Object::Integer(1), Object::Integer(0)),
            (Object::Float(1.0), Object::Float(0.0)),
            (Object::Decimal(Decimal::from_i64(1)), Object::Integer(0)),
        ] {
            let err = infix(InfixOp::Divide, left, right).unwrap_err();
            assert_eq!(err.code(), "DIVIDE_BY_ZERO");
        }
    }

    #[test]
    fn test_string_operators() {
        assert_eq!(infix(InfixOp::Add, Object::string("ab"), Object::string("c")).unwrap(), Object::string("abc"));
        assert_eq!(infix(InfixOp::Multiply, Object::string("ab"), Object::Integer(3)).unwrap(), Object::string("ababab"));
        assert_eq!(infix(InfixOp::Less, Object::string("a"), Object::string("b")).unwrap(), Object::Boolean(true));
        let err = infix(InfixOp::Subtract, Object::string("a"), Object::Integer(1)).unwrap_err();
        assert_eq!(err.code(), "INFIX_OP");
    }

    #[test]
    fn test_string_repetition_is_bounded() {
        assert_eq!(infix(InfixOp::Multiply, Object::string("ab"), Object::Integer(-2)).unwrap(), Object::string(""));
        let err = infix(InfixOp::Multiply, Object::string("ab"), Object::Integer(i64::MAX)).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        let err = infix(InfixOp::Multiply, Object::Integer(1 << 40), Object::string("x")).unwrap_err();
        assert_eq!(err.code(), "INVALID_ARGUMENT");
        assert_eq!(repeat_string("", i64::MAX), Ok(String::new()));
        assert!(repeat_string("x", -1).is_err());
    }

    #[test]
    fn test_mixed_equality_is_false_not_error() {
        assert_eq!(infix(InfixOp::Equal, Object::string("1"), Object::Integer(1)).unwrap(), Object::Boolean(false));
        assert_eq!(infix(InfixOp::NotEqual, Object::Nil, Object::Boolean(false)).unwrap(), Object::Boolean(true));
    }

    #[test]
    fn test_prefix_operators() {
        let interp = interp();
        let span = Span::at_line(1);
        assert_eq!(interp.apply_prefix(PrefixOp::Negate, Object::Integer(4), span).unwrap(), Object::Integer(-4));
        assert_eq!(interp.apply_prefix(PrefixOp::Not, Object::Nil, span).unwrap(), Object::Boolean(true));
        assert_eq!(
            interp.apply_prefix(PrefixOp::Negate, Object::string("x"), span).unwrap_err().code(),
            "PREFIX_OP"
        );
    }
}
