//! End-to-end tests for the Decimal builtin protocol.

use std::sync::Arc;

use tetra_vm::instruction::{InstructionSetBuilder, Param};
use tetra_vm::objects::ErrorKind;
use tetra_vm::{Machine, Thread, Value};

const FILE: &str = "decimal_tests.tt";

fn run_program(machine: &std::rc::Rc<Machine>, builder: InstructionSetBuilder) -> (Thread, Value) {
    let program = Arc::new(builder.finish().unwrap());
    let mut thread = machine.new_thread();
    let result = thread.run(&program);
    (thread, result)
}

/// Emit `"<literal>".to_d`, leaving the decimal on the stack.
fn emit_to_d(builder: &mut InstructionSetBuilder, literal: &str) {
    builder.emit_put_object(Param::Str(literal.into()));
    builder.emit_put_object(Param::Str("to_d".into()));
    builder.emit_send("to_d", 0, "");
}

fn assert_string(result: &Value, expected: &str) {
    match result {
        Value::String(s) => assert_eq!(&**s, expected),
        other => panic!("expected string '{}', got {}", expected, other),
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

#[test]
fn test_addition_formats_with_trailing_zero() {
    // ("3.14".to_d + "0.01".to_d).to_s == "3.150"
    let machine = Machine::new();
    let mut builder = InstructionSetBuilder::program(FILE);
    emit_to_d(&mut builder, "3.14");
    builder.emit_put_object(Param::Str("+".into()));
    emit_to_d(&mut builder, "0.01");
    builder.emit_send("+", 1, "");
    builder.emit_put_object(Param::Str("to_s".into()));
    builder.emit_send("to_s", 0, "");
    builder.emit_leave();

    let (thread, result) = run_program(&machine, builder);
    assert_string(&result, "3.150");
    assert_eq!(thread.stack.sp(), 1);
}

#[test]
fn test_subtraction_is_exact() {
    // "1.1".to_d - "1.0".to_d == "0.1".to_d
    let machine = Machine::new();
    let mut builder = InstructionSetBuilder::program(FILE);
    emit_to_d(&mut builder, "1.1");
    builder.emit_put_object(Param::Str("-".into()));
    emit_to_d(&mut builder, "1.0");
    builder.emit_send("-", 1, "");
    builder.emit_put_object(Param::Str("==".into()));
    emit_to_d(&mut builder, "0.1");
    builder.emit_send("==", 1, "");
    builder.emit_leave();

    let (_, result) = run_program(&machine, builder);
    assert!(matches!(result, Value::Boolean(true)));
}

#[test]
fn test_fraction_literal_division_chain() {
    // ("355/113".to_d * "113".to_d).to_s == "355.0"
    let machine = Machine::new();
    let mut builder = InstructionSetBuilder::program(FILE);
    emit_to_d(&mut builder, "355/113");
    builder.emit_put_object(Param::Str("*".into()));
    emit_to_d(&mut builder, "113");
    builder.emit_send("*", 1, "");
    builder.emit_put_object(Param::Str("to_s".into()));
    builder.emit_send("to_s", 0, "");
    builder.emit_leave();

    let (_, result) = run_program(&machine, builder);
    assert_string(&result, "355.0");
}

#[test]
fn test_division_by_zero_is_an_error() {
    let machine = Machine::new();
    let mut builder = InstructionSetBuilder::program(FILE);
    emit_to_d(&mut builder, "1.0");
    builder.emit_put_object(Param::Str("/".into()));
    emit_to_d(&mut builder, "0");
    builder.emit_send("/", 1, "");
    builder.emit_leave();

    let (_, result) = run_program(&machine, builder);
    match result {
        Value::Error(error) => {
            assert_eq!(error.kind, ErrorKind::Argument);
            assert_eq!(error.message, "Divided by 0");
        }
        other => panic!("expected error, got {}", other),
    }
}

// =============================================================================
// Type coercion contract
// =============================================================================

#[test]
fn test_arithmetic_against_foreign_class_is_a_type_error() {
    // "1.0".to_d + 1
    let machine = Machine::new();
    let mut builder = InstructionSetBuilder::program(FILE);
    emit_to_d(&mut builder, "1.0");
    builder.emit_put_object(Param::Str("+".into()));
    builder.emit_put_object(Param::Int(1));
    builder.emit_send("+", 1, "");
    builder.emit_leave();

    let (thread, result) = run_program(&machine, builder);
    match result {
        Value::Error(error) => {
            assert_eq!(error.kind, ErrorKind::Type);
            assert_eq!(error.message, "wrong argument type Decimal, got Integer");
        }
        other => panic!("expected error, got {}", other),
    }
    assert_eq!(thread.stack.sp(), 1);
}

#[test]
fn test_equality_falls_through_instead_of_raising() {
    // "1.0".to_d == 1 is false; "1.0".to_d != "x" is true.
    let machine = Machine::new();
    let mut builder = InstructionSetBuilder::program(FILE);
    emit_to_d(&mut builder, "1.0");
    builder.emit_put_object(Param::Str("==".into()));
    builder.emit_put_object(Param::Int(1));
    builder.emit_send("==", 1, "");
    builder.emit_leave();
    let (_, result) = run_program(&machine, builder);
    assert!(matches!(result, Value::Boolean(false)));

    let mut builder = InstructionSetBuilder::program(FILE);
    emit_to_d(&mut builder, "1.0");
    builder.emit_put_object(Param::Str("!=".into()));
    builder.emit_put_object(Param::Str("x".into()));
    builder.emit_send("!=", 1, "");
    builder.emit_leave();
    let (_, result) = run_program(&machine, builder);
    assert!(matches!(result, Value::Boolean(true)));
}

#[test]
fn test_rocket_comparison_is_signed() {
    let machine = Machine::new();
    for (left, right, expected) in [("1.5", "3", -1i64), ("1.0", "1", 0), ("3.5", "1", 1)] {
        let mut builder = InstructionSetBuilder::program(FILE);
        emit_to_d(&mut builder, left);
        builder.emit_put_object(Param::Str("<=>".into()));
        emit_to_d(&mut builder, right);
        builder.emit_send("<=>", 1, "");
        builder.emit_leave();
        let (_, result) = run_program(&machine, builder);
        match result {
            Value::Integer(i) => assert_eq!(i, expected, "{} <=> {}", left, right),
            other => panic!("expected integer, got {}", other),
        }
    }
}

#[test]
fn test_ordered_comparisons() {
    let machine = Machine::new();
    for (operator, left, right, expected) in [
        (">", "3.16", "3.14", true),
        (">", "3.14", "3.16", false),
        (">=", "3.14", "3.14", true),
        ("<", "3.14", "3.16", true),
        ("<=", "3.16", "3.14", false),
    ] {
        let mut builder = InstructionSetBuilder::program(FILE);
        emit_to_d(&mut builder, left);
        builder.emit_put_object(Param::Str(operator.into()));
        emit_to_d(&mut builder, right);
        builder.emit_send(operator, 1, "");
        builder.emit_leave();
        let (_, result) = run_program(&machine, builder);
        match result {
            Value::Boolean(b) => assert_eq!(b, expected, "{} {} {}", left, operator, right),
            other => panic!("expected boolean, got {}", other),
        }
    }
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_decimal_new_is_unsupported() {
    let machine = Machine::new();
    let mut builder = InstructionSetBuilder::program(FILE);
    builder.emit_get_constant("Decimal");
    builder.emit_put_object(Param::Str("new".into()));
    builder.emit_send("new", 0, "");
    builder.emit_leave();

    let (_, result) = run_program(&machine, builder);
    match result {
        Value::Error(error) => {
            assert_eq!(error.kind, ErrorKind::UnsupportedMethod);
            assert_eq!(error.message, "Unsupported Method #new for Decimal");
        }
        other => panic!("expected error, got {}", other),
    }
}

#[test]
fn test_to_d_rejects_garbage() {
    let machine = Machine::new();
    let mut builder = InstructionSetBuilder::program(FILE);
    emit_to_d(&mut builder, "3x14");
    builder.emit_leave();

    let (_, result) = run_program(&machine, builder);
    match result {
        Value::Error(error) => {
            assert_eq!(error.kind, ErrorKind::Argument);
            assert_eq!(error.message, "Invalid numeric string: '3x14'");
        }
        other => panic!("expected error, got {}", other),
    }
}

// =============================================================================
// Round trip
// =============================================================================

#[test]
fn test_to_s_round_trips_through_to_d() {
    // value.to_s.to_d == value, for denominators whose expansion fits the
    // display precision.
    let machine = Machine::new();
    for literal in ["0.5", "3.14", "-7/8", "355/100", "0.001", "123456789.25"] {
        let mut builder = InstructionSetBuilder::program(FILE);
        emit_to_d(&mut builder, literal);
        builder.emit_put_object(Param::Str("to_s".into()));
        builder.emit_send("to_s", 0, "");
        builder.emit_put_object(Param::Str("to_d".into()));
        builder.emit_send("to_d", 0, "");
        builder.emit_put_object(Param::Str("==".into()));
        emit_to_d(&mut builder, literal);
        builder.emit_send("==", 1, "");
        builder.emit_leave();

        let (_, result) = run_program(&machine, builder);
        assert!(
            matches!(result, Value::Boolean(true)),
            "round trip failed for {}",
            literal
        );
    }
}
