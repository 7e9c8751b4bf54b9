//! Call objects: the argument binder.
//!
//! A [`CallObject`] is the transient descriptor built when a compiled
//! method is about to run: receiver, resolved method, the receiver's stack
//! position, the actual count, the call-site keyword descriptor, and the
//! freshly allocated callee frame. It lives exactly as long as binding
//! takes; once the callee frame is populated and pushed, the call object
//! is dropped.
//!
//! Binding order: arity, then required-keyword presence, then keyword
//! assignment, then positional assignment. The splat parameter absorbs the positional
//! remainder; keyword actuals are never absorbed by it. Optioned defaults
//! are evaluated in the callee frame, in left-to-right parameter order.

use std::rc::Rc;

use tetra_bytecode::{ArgSet, ParamKind};

use crate::frame::{CallFrame, FrameRef};
use crate::objects::{ErrorKind, MethodObject, Value};
use crate::thread::Thread;

pub struct CallObject {
    method: Rc<MethodObject>,
    receiver_ptr: usize,
    arg_count: usize,
    call_args: ArgSet,
    callee_frame: FrameRef,
}

impl CallObject {
    /// Allocate the callee frame and wrap everything binding needs. The
    /// receiver becomes the callee frame's `self`.
    pub fn new(
        receiver: Value,
        method: Rc<MethodObject>,
        receiver_ptr: usize,
        arg_count: usize,
        call_args: ArgSet,
        block_frame: Option<FrameRef>,
    ) -> Self {
        let mut frame = CallFrame::new(method.instruction_set.clone(), receiver);
        frame.block_frame = block_frame;
        Self {
            method,
            receiver_ptr,
            arg_count,
            call_args,
            callee_frame: frame.into_ref(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn receiver_ptr(&self) -> usize {
        self.receiver_ptr
    }

    /// Stack index of the first actual.
    pub fn arg_ptr(&self) -> usize {
        self.receiver_ptr + 1
    }

    pub fn arg_count(&self) -> usize {
        self.arg_count
    }

    pub fn method_name(&self) -> &str {
        &self.method.name
    }

    pub fn callee_frame(&self) -> &FrameRef {
        &self.callee_frame
    }

    fn arg_set(&self) -> &ArgSet {
        self.method.arg_set()
    }

    pub fn param_count(&self) -> usize {
        self.arg_set().len()
    }

    pub fn normal_param_count(&self) -> usize {
        self.arg_set().normal_count()
    }

    pub fn has_splat(&self) -> bool {
        self.arg_set().has_splat()
    }

    // =========================================================================
    // Keyword binding
    // =========================================================================

    /// Index (into the actuals) of the keyword actual named `name`.
    fn keyword_actual_index(&self, name: &str) -> Option<usize> {
        self.call_args
            .keyword_index(name)
            .filter(|index| *index < self.arg_count)
    }

    /// First required keyword parameter missing from the call site.
    pub fn missing_required_keyword(&self) -> Option<String> {
        self.arg_set()
            .iter()
            .find(|(_, name, kind)| {
                *kind == ParamKind::RequiredKeyword && self.keyword_actual_index(name).is_none()
            })
            .map(|(_, name, _)| name.to_string())
    }

    /// Bind every keyword actual to its parameter slot.
    pub fn assign_keyword_arguments(&self, thread: &Thread) -> Result<(), String> {
        for (actual_index, name, kind) in self.call_args.iter() {
            if !kind.is_keyword() || actual_index >= self.arg_count {
                continue;
            }
            let Some(param_index) = self.arg_set().keyword_index(name) else {
                return Err(format!(
                    "unknown keyword argument '{}' for method '{}'",
                    name,
                    self.method_name()
                ));
            };
            let value = thread
                .stack
                .get(self.arg_ptr() + actual_index)
                .cloned()
                .unwrap_or(Value::Null);
            self.callee_frame.borrow_mut().insert_local(param_index, value);
        }
        Ok(())
    }

    // =========================================================================
    // Positional binding
    // =========================================================================

    /// The fast path only fits an all-normal signature saturated exactly;
    /// any optioned, splat, or keyword parameter needs the full walk.
    pub fn needs_parameter_walk(&self) -> bool {
        self.param_count() != self.normal_param_count()
            || self.arg_count != self.normal_param_count()
    }

    /// Fast path: every parameter is normal and every actual is positional.
    pub fn assign_normal_arguments(&self, thread: &Thread) {
        let mut frame = self.callee_frame.borrow_mut();
        for param_index in 0..self.param_count() {
            let value = thread
                .stack
                .get(self.arg_ptr() + param_index)
                .cloned()
                .unwrap_or(Value::Null);
            frame.insert_local(param_index, value);
        }
    }

    /// Full walk over the parameter list: positional actuals feed normal and
    /// optioned parameters in order, an unsupplied optioned parameter
    /// evaluates its default, and the splat parameter collects whatever
    /// positionals remain.
    pub fn assign_parameters(&self, thread: &mut Thread) -> Result<(), Value> {
        let positionals: Vec<usize> = (0..self.arg_count)
            .filter(|index| !self.call_args.is_keyword_at(*index))
            .collect();
        let mut cursor = 0usize;
        let arg_set = self.arg_set().clone();

        for (param_index, _, kind) in arg_set.iter() {
            match kind {
                ParamKind::Normal => {
                    if cursor >= positionals.len() {
                        return Err(thread.machine().init_error_object(
                            ErrorKind::Argument,
                            format!(
                                "Expect at least {} args for method '{}'. got: {}",
                                arg_set.normal_count(),
                                self.method_name(),
                                positionals.len()
                            ),
                        ));
                    }
                    self.bind_positional(thread, param_index, positionals[cursor]);
                    cursor += 1;
                }
                ParamKind::Optioned { default_index } => {
                    if cursor < positionals.len() {
                        self.bind_positional(thread, param_index, positionals[cursor]);
                        cursor += 1;
                    } else {
                        let value = self.eval_default(thread, default_index)?;
                        self.callee_frame.borrow_mut().insert_local(param_index, value);
                    }
                }
                ParamKind::Splat => {
                    let rest: Vec<Value> = positionals[cursor..]
                        .iter()
                        .map(|actual_index| {
                            thread
                                .stack
                                .get(self.arg_ptr() + actual_index)
                                .cloned()
                                .unwrap_or(Value::Null)
                        })
                        .collect();
                    cursor = positionals.len();
                    let array = thread.machine().init_array(rest);
                    self.callee_frame.borrow_mut().insert_local(param_index, array);
                }
                // Keyword parameters were bound in the keyword phase; an
                // unsupplied optional keyword simply reads as nil.
                ParamKind::RequiredKeyword | ParamKind::OptionalKeyword => {}
            }
        }
        Ok(())
    }

    fn bind_positional(&self, thread: &Thread, param_index: usize, actual_index: usize) {
        let value = thread
            .stack
            .get(self.arg_ptr() + actual_index)
            .cloned()
            .unwrap_or(Value::Null);
        self.callee_frame.borrow_mut().insert_local(param_index, value);
    }

    /// Run one default sequence with the callee frame current, so the
    /// default expression sees parameters already bound to its left. The
    /// frame's instruction set and pc are swapped out and restored around
    /// the nested dispatch.
    fn eval_default(&self, thread: &mut Thread, default_index: usize) -> Result<Value, Value> {
        let Some(default_set) = self
            .method
            .instruction_set
            .defaults
            .get(default_index)
            .cloned()
        else {
            return Err(thread.machine().init_error_object(
                ErrorKind::Argument,
                format!(
                    "missing default sequence {} for method '{}'",
                    default_index,
                    self.method_name()
                ),
            ));
        };

        let saved = {
            let mut frame = self.callee_frame.borrow_mut();
            let saved = (frame.instruction_set.clone(), frame.pc);
            frame.instruction_set = default_set;
            frame.pc = 0;
            saved
        };

        thread.call_frame_stack.push(self.callee_frame.clone());
        thread.start_from_top_frame();
        thread.call_frame_stack.pop();

        {
            let mut frame = self.callee_frame.borrow_mut();
            frame.instruction_set = saved.0;
            frame.pc = saved.1;
        }

        if thread.has_error() {
            let error = thread.stack.pop().unwrap_or(Value::Null);
            return Err(error);
        }
        Ok(thread.stack.pop().unwrap_or(Value::Null))
    }
}
