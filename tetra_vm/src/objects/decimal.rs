//! The arbitrary-precision Decimal class.
//!
//! A Decimal is a rational number with arbitrary-size numerator and
//! denominator. It exists to exercise the builtin dispatch protocol with a
//! full operator set:
//!
//! ```ruby
//! "3.14".to_d            # => 3.14
//! "-0.7238943".to_d      # => -0.7238943
//! "355/113".to_d         # => 3.14159292
//!
//! a = "1.1".to_d
//! b = "1.0".to_d
//! c = "0.1".to_d
//! a - b # => 0.1
//! a - b == c # => true
//! ```
//!
//! `Decimal.new` is not supported; decimals come from `String#to_d`.

use std::rc::Rc;

use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{pow, One, Signed, Zero};

use super::class::RClass;
use super::method::{BuiltinMethodObject, CallContext};
use super::{ErrorKind, Value};
use crate::thread::Thread;

/// Fractional digits rendered by `to_s` before trailing-zero stripping.
const DISPLAY_DIGITS: usize = 60;

pub struct DecimalObject {
    pub class: Rc<RClass>,
    pub value: BigRational,
}

impl DecimalObject {
    pub fn new(class: Rc<RClass>, value: BigRational) -> Self {
        Self { class, value }
    }

    /// Display form: 60 fractional digits, rounded to nearest with halves
    /// away from zero, trailing zeros stripped, then exactly one `0`
    /// appended. For printing only; parse the result back with
    /// [`parse_decimal`] when a value is needed.
    pub fn to_formatted_string(&self) -> String {
        let fixed = float_string(&self.value, DISPLAY_DIGITS);
        let trimmed = fixed.trim_end_matches('0');
        format!("{}0", trimmed)
    }
}

// =============================================================================
// Class methods
// =============================================================================

pub(crate) fn class_methods() -> Vec<BuiltinMethodObject> {
    vec![BuiltinMethodObject::new("new", decimal_new)]
}

fn decimal_new(thread: &mut Thread, call: CallContext) -> Value {
    thread.unsupported_method_error("#new", &call.receiver)
}

// =============================================================================
// Instance methods
// =============================================================================

pub(crate) fn instance_methods() -> Vec<BuiltinMethodObject> {
    vec![
        BuiltinMethodObject::new("+", decimal_add),
        BuiltinMethodObject::new("-", decimal_sub),
        BuiltinMethodObject::new("*", decimal_mul),
        BuiltinMethodObject::new("/", decimal_div),
        BuiltinMethodObject::new(">", decimal_gt),
        BuiltinMethodObject::new(">=", decimal_ge),
        BuiltinMethodObject::new("<", decimal_lt),
        BuiltinMethodObject::new("<=", decimal_le),
        BuiltinMethodObject::new("<=>", decimal_rocket),
        BuiltinMethodObject::new("==", decimal_eq),
        BuiltinMethodObject::new("!=", decimal_ne),
        BuiltinMethodObject::new("to_s", decimal_to_s),
    ]
}

fn decimal_add(thread: &mut Thread, call: CallContext) -> Value {
    arithmetic_operation(thread, &call, |left, right| left + right)
}

fn decimal_sub(thread: &mut Thread, call: CallContext) -> Value {
    arithmetic_operation(thread, &call, |left, right| left - right)
}

fn decimal_mul(thread: &mut Thread, call: CallContext) -> Value {
    arithmetic_operation(thread, &call, |left, right| left * right)
}

fn decimal_div(thread: &mut Thread, call: CallContext) -> Value {
    // The zero check must happen before the pure operation runs.
    if let Some(Value::Decimal(right)) = call.args.first() {
        if right.value.is_zero() {
            return thread
                .machine()
                .init_error_object(ErrorKind::Argument, "Divided by 0".to_string());
        }
    }
    arithmetic_operation(thread, &call, |left, right| left / right)
}

fn decimal_gt(thread: &mut Thread, call: CallContext) -> Value {
    numeric_comparison(thread, &call, |left, right| left > right)
}

fn decimal_ge(thread: &mut Thread, call: CallContext) -> Value {
    numeric_comparison(thread, &call, |left, right| left >= right)
}

fn decimal_lt(thread: &mut Thread, call: CallContext) -> Value {
    numeric_comparison(thread, &call, |left, right| left < right)
}

fn decimal_le(thread: &mut Thread, call: CallContext) -> Value {
    numeric_comparison(thread, &call, |left, right| left <= right)
}

/// `<=>` answers -1, 0, or 1 following signed comparison.
fn decimal_rocket(thread: &mut Thread, call: CallContext) -> Value {
    let Value::Decimal(left) = &call.receiver else {
        return thread.wrong_type_error("Decimal", &call.receiver);
    };
    match call.args.first() {
        Some(Value::Decimal(right)) => {
            let ordering = left.value.cmp(&right.value);
            Value::Integer(ordering as i64)
        }
        Some(other) => thread.wrong_type_error("Decimal", other),
        None => thread.wrong_type_error("Decimal", &Value::Null),
    }
}

/// `==` against a foreign class is `false`, never a type error.
fn decimal_eq(_thread: &mut Thread, call: CallContext) -> Value {
    equality_test(&call, true)
}

/// `!=` against a foreign class is `true`, never a type error.
fn decimal_ne(_thread: &mut Thread, call: CallContext) -> Value {
    equality_test(&call, false)
}

fn decimal_to_s(thread: &mut Thread, call: CallContext) -> Value {
    let Value::Decimal(receiver) = &call.receiver else {
        return thread.wrong_type_error("Decimal", &call.receiver);
    };
    Value::string(&receiver.to_formatted_string())
}

// =============================================================================
// Coercion helpers
// =============================================================================

/// Apply a pure rational operation after coercing the right operand.
fn arithmetic_operation(
    thread: &mut Thread,
    call: &CallContext,
    operation: fn(&BigRational, &BigRational) -> BigRational,
) -> Value {
    let Value::Decimal(left) = &call.receiver else {
        return thread.wrong_type_error("Decimal", &call.receiver);
    };
    match call.args.first() {
        Some(Value::Decimal(right)) => {
            let result = operation(&left.value, &right.value);
            thread.machine().init_decimal(result)
        }
        Some(other) => thread.wrong_type_error("Decimal", other),
        None => thread.wrong_type_error("Decimal", &Value::Null),
    }
}

/// Apply an ordered comparison after coercing the right operand.
fn numeric_comparison(
    thread: &mut Thread,
    call: &CallContext,
    operation: fn(&BigRational, &BigRational) -> bool,
) -> Value {
    let Value::Decimal(left) = &call.receiver else {
        return thread.wrong_type_error("Decimal", &call.receiver);
    };
    match call.args.first() {
        Some(Value::Decimal(right)) => Value::Boolean(operation(&left.value, &right.value)),
        Some(other) => thread.wrong_type_error("Decimal", other),
        None => thread.wrong_type_error("Decimal", &Value::Null),
    }
}

/// Equality with fall-through: a non-decimal operand compares unequal.
fn equality_test(call: &CallContext, non_inverse: bool) -> Value {
    match (&call.receiver, call.args.first()) {
        (Value::Decimal(left), Some(Value::Decimal(right))) => {
            Value::Boolean((left.value == right.value) == non_inverse)
        }
        _ => Value::Boolean(!non_inverse),
    }
}

// =============================================================================
// Parsing and formatting
// =============================================================================

/// Parse decimal notation (`"3.14"`) or fraction notation (`"355/113"`).
pub(crate) fn parse_decimal(input: &str) -> Option<BigRational> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Some((numerator, denominator)) = input.split_once('/') {
        let numerator: BigInt = numerator.trim().parse().ok()?;
        let denominator: BigInt = denominator.trim().parse().ok()?;
        if denominator.is_zero() {
            return None;
        }
        return Some(BigRational::new(numerator, denominator));
    }

    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input.strip_prefix('+').unwrap_or(input)),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if !all_digits(int_part) || !all_digits(frac_part) {
        return None;
    }

    let mut numerator = if int_part.is_empty() {
        BigInt::zero()
    } else {
        int_part.parse::<BigInt>().ok()?
    };
    let denominator = pow(BigInt::from(10), frac_part.len());
    numerator *= &denominator;
    if !frac_part.is_empty() {
        numerator += frac_part.parse::<BigInt>().ok()?;
    }
    if negative {
        numerator = -numerator;
    }
    Some(BigRational::new(numerator, denominator))
}

/// Fixed-point rendering with exactly `digits` fractional digits, rounded
/// to nearest with halves away from zero.
fn float_string(value: &BigRational, digits: usize) -> String {
    let negative = value.is_negative();
    let magnitude = value.abs();
    let numerator = magnitude.numer();
    let denominator = magnitude.denom();

    let mut int_part = numerator / denominator;
    let remainder = numerator % denominator;

    let scale = pow(BigInt::from(10), digits);
    let scaled = &remainder * &scale;
    let mut frac_part = &scaled / denominator;
    let round_remainder = &scaled % denominator;
    if &round_remainder * BigInt::from(2) >= *denominator {
        frac_part += BigInt::one();
    }
    if frac_part == scale {
        int_part += BigInt::one();
        frac_part = BigInt::zero();
    }

    let sign = if negative { "-" } else { "" };
    format!(
        "{}{}.{:0>width$}",
        sign,
        int_part,
        frac_part.to_string(),
        width = digits
    )
}
