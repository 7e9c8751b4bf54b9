//! End-to-end tests for blocks: lexical capture through the environment
//! pointer, builtin yields, and the `yield` opcode.

use std::sync::Arc;

use tetra_bytecode::{block_flag, block_label, ArgSet, ParamKind};
use tetra_vm::instruction::{InstructionSetBuilder, Param};
use tetra_vm::objects::ErrorKind;
use tetra_vm::{Machine, Thread, Value};

const FILE: &str = "block_tests.tt";

fn run_program(machine: &std::rc::Rc<Machine>, builder: InstructionSetBuilder) -> (Thread, Value) {
    let program = Arc::new(builder.finish().unwrap());
    let mut thread = machine.new_thread();
    let result = thread.run(&program);
    (thread, result)
}

/// Registers block 0: `{ |x| sum = sum + x }` where `sum` lives one frame
/// up the `ep` chain.
fn define_accumulator_block(machine: &std::rc::Rc<Machine>) -> String {
    let label = block_label(0);
    let mut block = InstructionSetBuilder::block(&label, FILE);
    block.emit_get_local(0, 1);
    block.emit_put_object(Param::Str("+".into()));
    block.emit_get_local(0, 0);
    block.emit_send("+", 1, "");
    block.emit_set_local(0, 1);
    block.emit_leave();
    machine.define_block_set(block.finish().unwrap());
    block_flag(&label)
}

// =============================================================================
// Builtin yield (Array#each)
// =============================================================================

#[test]
fn test_each_accumulates_through_lexical_capture() {
    // sum = 0; [10, 20, 30].each { |x| sum = sum + x }; sum
    let machine = Machine::new();
    let flag = define_accumulator_block(&machine);

    let mut builder = InstructionSetBuilder::program(FILE);
    builder.emit_put_object(Param::Int(0));
    builder.emit_set_local(0, 0);
    builder.emit_pop();
    builder.emit_put_object(Param::Int(10));
    builder.emit_put_object(Param::Int(20));
    builder.emit_put_object(Param::Int(30));
    builder.emit_new_array(3);
    builder.emit_put_object(Param::Str("each".into()));
    builder.emit_send("each", 0, &flag);
    builder.emit_pop();
    builder.emit_get_local(0, 0);
    builder.emit_leave();

    let (thread, result) = run_program(&machine, builder);
    assert!(matches!(result, Value::Integer(60)));
    assert_eq!(thread.stack.sp(), 1);
    assert!(thread.call_frame_stack.is_empty());
}

#[test]
fn test_each_returns_the_receiver() {
    let machine = Machine::new();
    let flag = define_accumulator_block(&machine);

    let mut builder = InstructionSetBuilder::program(FILE);
    builder.emit_put_object(Param::Int(0));
    builder.emit_set_local(0, 0);
    builder.emit_pop();
    builder.emit_put_object(Param::Int(1));
    builder.emit_put_object(Param::Int(2));
    builder.emit_new_array(2);
    builder.emit_put_object(Param::Str("each".into()));
    builder.emit_send("each", 0, &flag);
    builder.emit_leave();

    let (_, result) = run_program(&machine, builder);
    match result {
        Value::Array(array) => assert_eq!(array.borrow().elements.len(), 2),
        other => panic!("expected the receiver array back, got {}", other),
    }
}

#[test]
fn test_each_without_block_is_an_error() {
    let machine = Machine::new();
    let mut builder = InstructionSetBuilder::program(FILE);
    builder.emit_put_object(Param::Int(1));
    builder.emit_new_array(1);
    builder.emit_put_object(Param::Str("each".into()));
    builder.emit_send("each", 0, "");
    builder.emit_leave();

    let (_, result) = run_program(&machine, builder);
    match result {
        Value::Error(error) => {
            assert_eq!(error.kind, ErrorKind::Internal);
            assert_eq!(error.message, "Method each requires a block argument");
        }
        other => panic!("expected error, got {}", other),
    }
}

#[test]
fn test_error_raised_inside_block_aborts_iteration() {
    let machine = Machine::new();

    // { |x| x.nope } fails on the first element.
    let label = block_label(0);
    let mut block = InstructionSetBuilder::block(&label, FILE);
    block.emit_get_local(0, 0);
    block.emit_put_object(Param::Str("nope".into()));
    block.emit_send("nope", 0, "");
    block.emit_leave();
    machine.define_block_set(block.finish().unwrap());

    let mut builder = InstructionSetBuilder::program(FILE);
    builder.emit_put_object(Param::Int(1));
    builder.emit_put_object(Param::Int(2));
    builder.emit_new_array(2);
    builder.emit_put_object(Param::Str("each".into()));
    builder.emit_send("each", 0, &block_flag(&label));
    builder.emit_put_object(Param::Int(99));
    builder.emit_leave();

    let (thread, result) = run_program(&machine, builder);
    match result {
        Value::Error(error) => assert_eq!(error.kind, ErrorKind::UndefinedMethod),
        other => panic!("expected the block error to unwind, got {}", other),
    }
    assert_eq!(thread.stack.sp(), 1);
}

// =============================================================================
// The yield opcode
// =============================================================================

/// `def twice; yield(1); yield(2); end`; the last yield's value returns.
fn define_twice(machine: &std::rc::Rc<Machine>) {
    let mut body = InstructionSetBuilder::method("twice", FILE);
    body.emit_put_self();
    body.emit_put_object(Param::Int(1));
    body.emit_invoke_block(1);
    body.emit_pop();
    body.emit_put_self();
    body.emit_put_object(Param::Int(2));
    body.emit_invoke_block(1);
    body.emit_leave();
    machine.define_method_set(body.finish().unwrap());
}

#[test]
fn test_yield_reads_current_binding_at_yield_time() {
    // x = 0; twice { |v| x = x + v }; x  -- the block must observe the
    // binding as updated by its own prior invocation.
    let machine = Machine::new();
    define_twice(&machine);
    let flag = define_accumulator_block(&machine);

    let mut builder = InstructionSetBuilder::program(FILE);
    builder.emit_put_object(Param::Int(0));
    builder.emit_set_local(0, 0);
    builder.emit_pop();
    builder.emit_def_method("twice");
    builder.emit_put_self();
    builder.emit_put_object(Param::Str("twice".into()));
    builder.emit_send("twice", 0, &flag);
    builder.emit_pop();
    builder.emit_get_local(0, 0);
    builder.emit_leave();

    let (thread, result) = run_program(&machine, builder);
    assert!(matches!(result, Value::Integer(3)));
    assert_eq!(thread.stack.sp(), 1);
}

#[test]
fn test_method_returns_last_yield_value() {
    let machine = Machine::new();
    define_twice(&machine);

    // { |v| v * 10 }
    let label = block_label(1);
    let mut block = InstructionSetBuilder::block(&label, FILE);
    block.emit_get_local(0, 0);
    block.emit_put_object(Param::Str("*".into()));
    block.emit_put_object(Param::Int(10));
    block.emit_send("*", 1, "");
    block.emit_leave();
    machine.define_block_set(block.finish().unwrap());

    let mut builder = InstructionSetBuilder::program(FILE);
    builder.emit_def_method("twice");
    builder.emit_put_self();
    builder.emit_put_object(Param::Str("twice".into()));
    builder.emit_send("twice", 0, &block_flag(&label));
    builder.emit_leave();

    let (_, result) = run_program(&machine, builder);
    assert!(matches!(result, Value::Integer(20)));
}

#[test]
fn test_yield_without_block_is_an_internal_error() {
    let machine = Machine::new();
    define_twice(&machine);

    let mut builder = InstructionSetBuilder::program(FILE);
    builder.emit_def_method("twice");
    builder.emit_put_self();
    builder.emit_put_object(Param::Str("twice".into()));
    builder.emit_send("twice", 0, "");
    builder.emit_leave();

    let (_, result) = run_program(&machine, builder);
    match result {
        Value::Error(error) => {
            assert_eq!(error.kind, ErrorKind::Internal);
            assert_eq!(error.message, "Can't yield without a block");
        }
        other => panic!("expected error, got {}", other),
    }
}

// =============================================================================
// block_given?
// =============================================================================

#[test]
fn test_block_given_reflects_the_call_site() {
    let machine = Machine::new();

    // def check; block_given?; end
    let mut body = InstructionSetBuilder::method("check", FILE);
    body.emit_put_self();
    body.emit_put_object(Param::Str("block_given?".into()));
    body.emit_send("block_given?", 0, "");
    body.emit_leave();
    machine.define_method_set(body.finish().unwrap());

    // An empty block just to have one at the call site.
    let label = block_label(0);
    let mut block = InstructionSetBuilder::block(&label, FILE);
    block.emit_put_object(Param::Null);
    block.emit_leave();
    machine.define_block_set(block.finish().unwrap());

    let mut with_block = InstructionSetBuilder::program(FILE);
    with_block.emit_def_method("check");
    with_block.emit_put_self();
    with_block.emit_put_object(Param::Str("check".into()));
    with_block.emit_send("check", 0, &block_flag(&label));
    with_block.emit_leave();
    let (_, result) = run_program(&machine, with_block);
    assert!(matches!(result, Value::Boolean(true)));

    let mut without_block = InstructionSetBuilder::program(FILE);
    without_block.emit_def_method("check");
    without_block.emit_put_self();
    without_block.emit_put_object(Param::Str("check".into()));
    without_block.emit_send("check", 0, "");
    without_block.emit_leave();
    let (_, result) = run_program(&machine, without_block);
    assert!(matches!(result, Value::Boolean(false)));
}
