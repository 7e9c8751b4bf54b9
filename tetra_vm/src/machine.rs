//! The machine: process-wide interpreter state.
//!
//! A [`Machine`] owns the instruction-set registries the compiler fills,
//! the top-level class table, and the error-object factory. Registries are
//! keyed `(label, filename)` so names from different source files never
//! collide, and sit behind `RwLock`: they are effectively immutable once
//! compilation finishes, and the lock is the synchronization contract
//! offered to embedders that share a machine between interpreter threads.
//!
//! Booting a machine registers the builtin classes and their methods;
//! threads are then spawned with [`Machine::new_thread`].

use std::rc::Rc;
use std::sync::Arc;

use num_rational::BigRational;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::instruction::{InstructionSet, SetKind};
use crate::objects::{
    array, decimal, integer, object_class, string, ArrayObject, DecimalObject, ErrorKind,
    ErrorObject, RClass, RObject, Value,
};
use crate::thread::Thread;

type SetRegistry = RwLock<FxHashMap<(String, String), Arc<InstructionSet>>>;

pub struct Machine {
    method_sets: SetRegistry,
    block_sets: SetRegistry,
    class_sets: SetRegistry,
    classes: RwLock<FxHashMap<String, Rc<RClass>>>,
    object_class: Rc<RClass>,
    main_object: Rc<RObject>,
}

impl Machine {
    /// Create and boot a machine: builtin classes registered, builtin
    /// methods attached, main object allocated.
    pub fn new() -> Rc<Machine> {
        let object_class = RClass::new("Object", None);
        let main_object = RObject::new(object_class.clone());
        let machine = Rc::new(Machine {
            method_sets: RwLock::new(FxHashMap::default()),
            block_sets: RwLock::new(FxHashMap::default()),
            class_sets: RwLock::new(FxHashMap::default()),
            classes: RwLock::new(FxHashMap::default()),
            object_class,
            main_object,
        });
        machine.boot();
        machine
    }

    fn boot(&self) {
        self.object_class
            .set_builtin_methods(object_class::instance_methods(), false);
        self.object_class
            .set_builtin_methods(object_class::class_methods(), true);
        self.classes
            .write()
            .insert("Object".to_string(), self.object_class.clone());

        self.register_class("Class");
        self.register_class("Method");
        self.register_class("Boolean");
        self.register_class("Null");

        let integer_class = self.register_class("Integer");
        integer_class.set_builtin_methods(integer::instance_methods(), false);

        let string_class = self.register_class("String");
        string_class.set_builtin_methods(string::instance_methods(), false);

        let array_class = self.register_class("Array");
        array_class.set_builtin_methods(array::instance_methods(), false);

        let decimal_class = self.register_class("Decimal");
        decimal_class.set_builtin_methods(decimal::instance_methods(), false);
        decimal_class.set_builtin_methods(decimal::class_methods(), true);

        for kind in ErrorKind::ALL {
            self.register_class(kind.class_name());
        }
    }

    fn register_class(&self, name: &str) -> Rc<RClass> {
        let class = RClass::new(name, Some(self.object_class.clone()));
        self.classes.write().insert(name.to_string(), class.clone());
        class
    }

    /// Spawn an interpreter thread bound to this machine. Each thread owns
    /// its evaluation stack and call-frame stack.
    pub fn new_thread(self: &Rc<Self>) -> Thread {
        Thread::new(self.clone())
    }

    // =========================================================================
    // Class table
    // =========================================================================

    pub fn object_class(&self) -> Rc<RClass> {
        self.object_class.clone()
    }

    /// Look up a registered top-level class by name.
    pub fn top_level_class(&self, name: &str) -> Option<Rc<RClass>> {
        self.classes.read().get(name).cloned()
    }

    /// Get or create the top-level class `name` (used by `def_class`).
    /// Reopening an existing class returns it unchanged.
    pub fn define_top_level_class(&self, name: &str) -> Rc<RClass> {
        if let Some(existing) = self.top_level_class(name) {
            return existing;
        }
        self.register_class(name)
    }

    /// The receiver bound to top-level frames.
    pub fn main_object(&self) -> Value {
        Value::Instance(self.main_object.clone())
    }

    // =========================================================================
    // Instruction-set registries
    // =========================================================================

    /// Register a compiled method body. Returns the shared handle.
    pub fn define_method_set(&self, set: InstructionSet) -> Arc<InstructionSet> {
        debug_assert_eq!(set.kind, SetKind::Method);
        Self::insert(&self.method_sets, set)
    }

    /// Register a compiled block body.
    pub fn define_block_set(&self, set: InstructionSet) -> Arc<InstructionSet> {
        debug_assert_eq!(set.kind, SetKind::Block);
        Self::insert(&self.block_sets, set)
    }

    /// Register a compiled class body.
    pub fn define_class_set(&self, set: InstructionSet) -> Arc<InstructionSet> {
        debug_assert_eq!(set.kind, SetKind::ClassBody);
        Self::insert(&self.class_sets, set)
    }

    fn insert(registry: &SetRegistry, set: InstructionSet) -> Arc<InstructionSet> {
        let key = (set.label.to_string(), set.filename.to_string());
        let set = Arc::new(set);
        registry.write().insert(key, set.clone());
        set
    }

    fn fetch(registry: &SetRegistry, label: &str, filename: &str) -> Option<Arc<InstructionSet>> {
        registry
            .read()
            .get(&(label.to_string(), filename.to_string()))
            .cloned()
    }

    /// Method-body lookup, scoped by source file.
    pub fn get_method_is(&self, name: &str, filename: &str) -> Option<Arc<InstructionSet>> {
        Self::fetch(&self.method_sets, name, filename)
    }

    /// Block-body lookup, scoped by source file.
    pub fn get_block(&self, label: &str, filename: &str) -> Option<Arc<InstructionSet>> {
        Self::fetch(&self.block_sets, label, filename)
    }

    /// Class-body lookup, scoped by source file.
    pub fn get_class_is(&self, name: &str, filename: &str) -> Option<Arc<InstructionSet>> {
        Self::fetch(&self.class_sets, name, filename)
    }

    // =========================================================================
    // Value factories
    // =========================================================================

    /// The single error-object factory. Every error kind maps to a
    /// registered class so errors answer `class` like any other value.
    pub fn init_error_object(&self, kind: ErrorKind, message: String) -> Value {
        let class = self
            .top_level_class(kind.class_name())
            .unwrap_or_else(|| self.object_class());
        Value::Error(Rc::new(ErrorObject {
            class,
            kind,
            message,
        }))
    }

    pub fn init_array(&self, elements: Vec<Value>) -> Value {
        let class = self
            .top_level_class("Array")
            .unwrap_or_else(|| self.object_class());
        Value::Array(Rc::new(std::cell::RefCell::new(ArrayObject::new(
            class, elements,
        ))))
    }

    pub fn init_decimal(&self, value: BigRational) -> Value {
        let class = self
            .top_level_class("Decimal")
            .unwrap_or_else(|| self.object_class());
        Value::Decimal(Rc::new(DecimalObject::new(class, value)))
    }
}
