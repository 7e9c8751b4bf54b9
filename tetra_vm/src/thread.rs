//! The interpreter thread.
//!
//! One [`Thread`] drives one fetch/decode/execute loop over its own
//! evaluation stack and call-frame stack. Threads are cooperative: control
//! leaves the dispatch loop only at method calls, block yields, and errors.
//!
//! # Error unwinding
//!
//! Errors are values. Whatever produces one writes it over the receiver
//! slot of the failing call, which positions it as the caller's
//! top-of-stack. After every executed instruction the loop checks that
//! sentinel; on detection it returns without popping the frame, the calling
//! loop observes the same sentinel on its next iteration, and the stack
//! unwinds frame by frame with no separate exception channel.
//!
//! # Frame discipline
//!
//! Whoever pushes a frame pops it after its dispatch loop returns; `leave`
//! only forces the frame's `pc` to the end. This keeps frame lifetimes
//! scoped to the re-entry point that created them, including on unwind.

use std::rc::Rc;
use std::sync::Arc;

use smallvec::SmallVec;
use tetra_bytecode::ArgSet;

use crate::call_object::CallObject;
use crate::frame::{CallFrame, CallFrameStack, FrameRef};
use crate::instruction::InstructionSet;
use crate::machine::Machine;
use crate::objects::{BuiltinMethodObject, CallContext, ErrorKind, Value};
use crate::stack::EvalStack;

pub struct Thread {
    machine: Rc<Machine>,
    pub stack: EvalStack,
    pub call_frame_stack: CallFrameStack,
}

impl Thread {
    pub(crate) fn new(machine: Rc<Machine>) -> Self {
        Self {
            machine,
            stack: EvalStack::new(),
            call_frame_stack: CallFrameStack::new(),
        }
    }

    pub fn machine(&self) -> &Rc<Machine> {
        &self.machine
    }

    /// Execute a program set to completion and return the value it left on
    /// top of the stack (an error value if the program raised).
    pub fn run(&mut self, set: &Arc<InstructionSet>) -> Value {
        let frame = CallFrame::new(set.clone(), self.machine.main_object()).into_ref();
        self.call_frame_stack.push(frame);
        self.start_from_top_frame();
        self.call_frame_stack.pop();
        self.stack.top().cloned().unwrap_or(Value::Null)
    }

    // =========================================================================
    // Dispatch loop
    // =========================================================================

    /// Re-entry point for the initial program, nested method calls, and
    /// block yields: runs the dispatch loop on the current top frame.
    pub fn start_from_top_frame(&mut self) {
        if let Some(frame) = self.call_frame_stack.top().cloned() {
            self.eval_call_frame(&frame);
        }
    }

    fn eval_call_frame(&mut self, frame: &FrameRef) {
        loop {
            let instruction = {
                let mut f = frame.borrow_mut();
                let set = f.instruction_set.clone();
                if f.pc >= set.instructions.len() {
                    break;
                }
                let instruction = set.instructions[f.pc].clone();
                f.pc += 1;
                f.source_line = instruction.source_line;
                instruction
            };
            (instruction.action.operation)(self, frame, &instruction.params);
            if self.has_error() {
                // Leave the error visible to the calling frame's loop.
                return;
            }
        }
    }

    /// The error sentinel: an error value in the top pointer slot.
    pub fn has_error(&self) -> bool {
        matches!(self.stack.top(), Some(Value::Error(_)))
    }

    // =========================================================================
    // Method send protocol
    // =========================================================================

    /// Dispatch a call following the shared calling convention.
    ///
    /// On entry the stack holds `[receiver, name-marker, arg0..argN-1]` and
    /// `arg_count` counts the marker plus the N actuals. The marker slot is
    /// compacted away unconditionally before lookup; a splat-tagged array on
    /// top is expanded into individual actuals first.
    pub fn send_method(
        &mut self,
        name: &str,
        arg_count: usize,
        block_frame: Option<FrameRef>,
        call_args: &ArgSet,
        source_line: usize,
    ) {
        if arg_count == 0 || self.stack.sp() < arg_count + 1 {
            self.push_error_object(
                ErrorKind::Internal,
                format!("malformed call site for '{}'", name),
            );
            return;
        }
        let mut arg_count = arg_count;

        // Splat expansion: the array itself stops counting, its elements do.
        let splat = match self.stack.top() {
            Some(Value::Array(array)) if array.borrow().splat => Some(array.clone()),
            _ => None,
        };
        if let Some(array) = splat {
            self.stack.pop();
            let elements = array.borrow().elements.clone();
            arg_count = arg_count - 1 + elements.len();
            for element in elements {
                self.stack.push(element);
            }
        }

        let arg_ptr = self.stack.sp() - arg_count;
        let receiver_ptr = arg_ptr - 1;
        let receiver = self.stack.get(receiver_ptr).cloned().unwrap_or(Value::Null);

        // Compact the name marker: shift the actuals one slot down over it.
        for i in 0..arg_count - 1 {
            let value = self.stack.get(arg_ptr + i + 1).cloned().unwrap_or(Value::Null);
            self.stack.set(arg_ptr + i, value);
        }
        arg_count -= 1;
        self.stack.set_sp(self.stack.sp() - 1);

        let Some(method) = receiver.find_method(&self.machine, name) else {
            let error = self.machine.init_error_object(
                ErrorKind::UndefinedMethod,
                format!("Undefined Method '{}' for {}", name, receiver),
            );
            self.stack.set(receiver_ptr, error);
            self.stack.set_sp(receiver_ptr + 1);
            return;
        };

        match method {
            Value::Method(method) => {
                let call = CallObject::new(
                    receiver,
                    method,
                    receiver_ptr,
                    arg_count,
                    call_args.clone(),
                    block_frame,
                );
                self.eval_method_object(call);
            }
            Value::Builtin(method) => {
                self.eval_builtin_method(
                    receiver,
                    method,
                    receiver_ptr,
                    arg_count,
                    call_args,
                    block_frame,
                    source_line,
                );
            }
            Value::Error(error) => {
                self.push_error_object(ErrorKind::Internal, error.message.clone());
            }
            other => {
                self.push_error_object(
                    ErrorKind::Internal,
                    format!("method table entry '{}' is not callable ({})", name, other),
                );
            }
        }
    }

    // =========================================================================
    // Builtin invocation
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn eval_builtin_method(
        &mut self,
        receiver: Value,
        method: Rc<BuiltinMethodObject>,
        receiver_ptr: usize,
        arg_count: usize,
        call_args: &ArgSet,
        block_frame: Option<FrameRef>,
        source_line: usize,
    ) {
        let arg_ptr = receiver_ptr + 1;
        let mut args: SmallVec<[Value; 8]> = SmallVec::with_capacity(arg_count);
        for i in 0..arg_count {
            args.push(self.stack.get(arg_ptr + i).cloned().unwrap_or(Value::Null));
        }

        let context = CallContext {
            receiver: receiver.clone(),
            args,
            block_frame: block_frame.clone(),
            source_line,
        };
        let evaluated = (method.body)(self, context);

        // `new` on a class: a fresh instance that carries an initializer is
        // immediately constructed with the same argument window.
        if method.name == "new" {
            if let (Value::Class(_), Value::Instance(instance)) = (&receiver, &evaluated) {
                if let Some(initializer) = instance.initialize_method() {
                    let call = CallObject::new(
                        evaluated.clone(),
                        initializer,
                        receiver_ptr,
                        arg_count,
                        call_args.clone(),
                        block_frame,
                    );
                    self.eval_method_object(call);
                    if self.has_error() {
                        return;
                    }
                }
            }
        }

        self.stack.set(receiver_ptr, evaluated);
        self.stack.set_sp(arg_ptr);
    }

    // =========================================================================
    // Compiled-method invocation (the argument binder lives in CallObject)
    // =========================================================================

    pub(crate) fn eval_method_object(&mut self, call: CallObject) {
        let receiver_ptr = call.receiver_ptr();
        let arg_ptr = call.arg_ptr();
        let method_name = call.method_name().to_string();
        let params_count = call.param_count();
        let normal_params_count = call.normal_param_count();

        if call.arg_count() > params_count && !call.has_splat() {
            self.report_argument_error(params_count, &method_name, call.arg_count(), receiver_ptr);
            return;
        }
        if normal_params_count > call.arg_count() {
            self.report_argument_error(
                normal_params_count,
                &method_name,
                call.arg_count(),
                receiver_ptr,
            );
            return;
        }

        // Every required keyword must be present before any assignment runs.
        if let Some(missing) = call.missing_required_keyword() {
            let error = self.machine.init_error_object(
                ErrorKind::Argument,
                format!("Method {} requires key argument {}", method_name, missing),
            );
            self.stack.set(receiver_ptr, error);
            self.stack.set_sp(arg_ptr);
            return;
        }

        if let Err(message) = call.assign_keyword_arguments(self) {
            let error = self.machine.init_error_object(ErrorKind::Argument, message);
            self.stack.set(receiver_ptr, error);
            self.stack.set_sp(arg_ptr);
            return;
        }

        if call.needs_parameter_walk() {
            if let Err(error) = call.assign_parameters(self) {
                self.stack.set(receiver_ptr, error);
                self.stack.set_sp(arg_ptr);
                return;
            }
        } else {
            call.assign_normal_arguments(self);
        }

        // Frame activation: run the callee, then collapse the call so its
        // result (or error) occupies the receiver slot.
        self.call_frame_stack.push(call.callee_frame().clone());
        self.start_from_top_frame();
        self.call_frame_stack.pop();

        let result = self.stack.top().cloned().unwrap_or(Value::Null);
        self.stack.set(receiver_ptr, result);
        self.stack.set_sp(arg_ptr);
    }

    pub(crate) fn report_argument_error(
        &mut self,
        ideal_arg_count: usize,
        method_name: &str,
        exact_arg_count: usize,
        receiver_ptr: usize,
    ) {
        let message = if ideal_arg_count > exact_arg_count {
            format!(
                "Expect at least {} args for method '{}'. got: {}",
                ideal_arg_count, method_name, exact_arg_count
            )
        } else {
            format!(
                "Expect at most {} args for method '{}'. got: {}",
                ideal_arg_count, method_name, exact_arg_count
            )
        };
        let error = self.machine.init_error_object(ErrorKind::Argument, message);
        self.stack.set(receiver_ptr, error);
        self.stack.set_sp(receiver_ptr + 1);
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    /// Yield from a builtin into `block_frame` with positional `args`.
    ///
    /// Builds a block invocation frame (`ep` and `self` inherited from the
    /// block's defining frame), seeds its locals, re-enters the dispatch
    /// loop, and hands back the block's result. The stack is restored to its
    /// pre-yield height; callers must propagate an error result themselves.
    pub fn builtin_method_yield(&mut self, block_frame: &FrameRef, args: &[Value]) -> Value {
        let sp_before = self.stack.sp();
        let invocation = {
            let block = block_frame.borrow();
            let mut frame =
                CallFrame::new(block.instruction_set.clone(), block.self_value.clone());
            frame.is_block = true;
            frame.ep = block.ep.clone();
            frame.into_ref()
        };
        {
            let mut frame = invocation.borrow_mut();
            for (index, arg) in args.iter().enumerate() {
                frame.insert_local(index, arg.clone());
            }
        }

        self.call_frame_stack.push(invocation);
        self.start_from_top_frame();
        self.call_frame_stack.pop();

        let result = self.stack.top().cloned().unwrap_or(Value::Null);
        self.stack.set_sp(sp_before);
        result
    }

    /// Materialize the block a call site carries.
    ///
    /// Looks the block body up in the calling frame's file, pushes a
    /// block-flagged frame whose `ep` is the calling frame (lexical
    /// capture), and returns it. The `send` opcode pops the frame again
    /// once the call completes. A missing registration pushes an
    /// `InternalError` and returns `None`.
    pub fn retrieve_block(&mut self, frame: &FrameRef, block_flag: &str) -> Option<FrameRef> {
        let Some(label) = tetra_bytecode::parse_block_flag(block_flag) else {
            self.push_error_object(
                ErrorKind::Internal,
                format!("malformed block flag '{}'", block_flag),
            );
            return None;
        };
        let filename = frame.borrow().instruction_set.filename.clone();
        let Some(set) = self.machine.get_block(label, &filename) else {
            self.push_error_object(
                ErrorKind::Internal,
                format!("Undefined block '{}' in {}", label, filename),
            );
            return None;
        };

        let block_frame = {
            let caller = frame.borrow();
            let mut block = CallFrame::new(set, caller.self_value.clone());
            block.is_block = true;
            block.ep = Some(frame.clone());
            block.into_ref()
        };
        self.call_frame_stack.push(block_frame.clone());
        Some(block_frame)
    }

    // =========================================================================
    // Error helpers
    // =========================================================================

    /// Build an error through the factory and push it (the sentinel).
    pub fn push_error_object(&mut self, kind: ErrorKind, message: String) {
        let error = self.machine.init_error_object(kind, message);
        self.stack.push(error);
    }

    pub fn unsupported_method_error(&self, method_name: &str, receiver: &Value) -> Value {
        self.machine.init_error_object(
            ErrorKind::UnsupportedMethod,
            format!("Unsupported Method {} for {}", method_name, receiver),
        )
    }

    pub fn wrong_type_error(&self, expected: &str, got: &Value) -> Value {
        self.machine.init_error_object(
            ErrorKind::Type,
            format!("wrong argument type {}, got {}", expected, got.class_name()),
        )
    }
}
