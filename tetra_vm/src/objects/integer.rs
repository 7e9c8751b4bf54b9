//! Integer builtins.
//!
//! Arithmetic and ordered comparison require an Integer operand and answer
//! `TypeError` otherwise. Equality never raises: `==` against a foreign
//! class is `false`, `!=` is `true`.

use std::cmp::Ordering;

use super::method::{BuiltinMethodObject, CallContext};
use super::Value;
use crate::thread::Thread;

pub(crate) fn instance_methods() -> Vec<BuiltinMethodObject> {
    vec![
        BuiltinMethodObject::new("+", integer_add),
        BuiltinMethodObject::new("-", integer_sub),
        BuiltinMethodObject::new("*", integer_mul),
        BuiltinMethodObject::new("==", integer_eq),
        BuiltinMethodObject::new("!=", integer_ne),
        BuiltinMethodObject::new("<", integer_lt),
        BuiltinMethodObject::new("<=", integer_le),
        BuiltinMethodObject::new(">", integer_gt),
        BuiltinMethodObject::new(">=", integer_ge),
        BuiltinMethodObject::new("<=>", integer_rocket),
    ]
}

// =============================================================================
// Helpers
// =============================================================================

fn operands(thread: &Thread, call: &CallContext) -> Result<(i64, i64), Value> {
    let Value::Integer(left) = call.receiver else {
        return Err(thread.wrong_type_error("Integer", &call.receiver));
    };
    match call.args.first() {
        Some(Value::Integer(right)) => Ok((left, *right)),
        Some(other) => Err(thread.wrong_type_error("Integer", other)),
        None => Err(thread.wrong_type_error("Integer", &Value::Null)),
    }
}

fn arithmetic(thread: &mut Thread, call: CallContext, op: fn(i64, i64) -> i64) -> Value {
    match operands(thread, &call) {
        Ok((left, right)) => Value::Integer(op(left, right)),
        Err(error) => error,
    }
}

fn comparison(thread: &mut Thread, call: CallContext, op: fn(&i64, &i64) -> bool) -> Value {
    match operands(thread, &call) {
        Ok((left, right)) => Value::Boolean(op(&left, &right)),
        Err(error) => error,
    }
}

fn equality(call: &CallContext, non_inverse: bool) -> Value {
    match (&call.receiver, call.args.first()) {
        (Value::Integer(left), Some(Value::Integer(right))) => {
            Value::Boolean((left == right) == non_inverse)
        }
        _ => Value::Boolean(!non_inverse),
    }
}

// =============================================================================
// Bodies
// =============================================================================

fn integer_add(thread: &mut Thread, call: CallContext) -> Value {
    arithmetic(thread, call, i64::wrapping_add)
}

fn integer_sub(thread: &mut Thread, call: CallContext) -> Value {
    arithmetic(thread, call, i64::wrapping_sub)
}

fn integer_mul(thread: &mut Thread, call: CallContext) -> Value {
    arithmetic(thread, call, i64::wrapping_mul)
}

fn integer_eq(_thread: &mut Thread, call: CallContext) -> Value {
    equality(&call, true)
}

fn integer_ne(_thread: &mut Thread, call: CallContext) -> Value {
    equality(&call, false)
}

fn integer_lt(thread: &mut Thread, call: CallContext) -> Value {
    comparison(thread, call, i64::lt)
}

fn integer_le(thread: &mut Thread, call: CallContext) -> Value {
    comparison(thread, call, i64::le)
}

fn integer_gt(thread: &mut Thread, call: CallContext) -> Value {
    comparison(thread, call, i64::gt)
}

fn integer_ge(thread: &mut Thread, call: CallContext) -> Value {
    comparison(thread, call, i64::ge)
}

fn integer_rocket(thread: &mut Thread, call: CallContext) -> Value {
    match operands(thread, &call) {
        Ok((left, right)) => Value::Integer(match left.cmp(&right) {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        }),
        Err(error) => error,
    }
}
