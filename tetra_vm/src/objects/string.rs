//! String builtins.

use super::decimal;
use super::method::{BuiltinMethodObject, CallContext};
use super::{ErrorKind, Value};
use crate::thread::Thread;

pub(crate) fn instance_methods() -> Vec<BuiltinMethodObject> {
    vec![
        BuiltinMethodObject::new("+", string_concat),
        BuiltinMethodObject::new("==", string_eq),
        BuiltinMethodObject::new("!=", string_ne),
        BuiltinMethodObject::new("length", string_length),
        BuiltinMethodObject::new("to_d", string_to_d),
    ]
}

fn string_concat(thread: &mut Thread, call: CallContext) -> Value {
    let Value::String(left) = &call.receiver else {
        return thread.wrong_type_error("String", &call.receiver);
    };
    match call.args.first() {
        Some(Value::String(right)) => Value::string(&format!("{}{}", left, right)),
        Some(other) => thread.wrong_type_error("String", other),
        None => thread.wrong_type_error("String", &Value::Null),
    }
}

fn string_eq(_thread: &mut Thread, call: CallContext) -> Value {
    string_equality(&call, true)
}

fn string_ne(_thread: &mut Thread, call: CallContext) -> Value {
    string_equality(&call, false)
}

fn string_equality(call: &CallContext, non_inverse: bool) -> Value {
    match (&call.receiver, call.args.first()) {
        (Value::String(left), Some(Value::String(right))) => {
            Value::Boolean((left == right) == non_inverse)
        }
        _ => Value::Boolean(!non_inverse),
    }
}

fn string_length(thread: &mut Thread, call: CallContext) -> Value {
    let Value::String(s) = &call.receiver else {
        return thread.wrong_type_error("String", &call.receiver);
    };
    Value::Integer(s.chars().count() as i64)
}

/// Parses the receiver as an arbitrary-precision decimal.
///
/// Accepts decimal notation (`"3.14"`, `"-0.7238943"`) and fraction
/// notation (`"355/113"`); anything else is an `ArgumentError`.
fn string_to_d(thread: &mut Thread, call: CallContext) -> Value {
    let Value::String(s) = &call.receiver else {
        return thread.wrong_type_error("String", &call.receiver);
    };
    match decimal::parse_decimal(s) {
        Some(value) => thread.machine().init_decimal(value),
        None => thread.machine().init_error_object(
            ErrorKind::Argument,
            format!("Invalid numeric string: '{}'", s),
        ),
    }
}
