//! Class objects.
//!
//! An [`RClass`] holds two method tables: instance methods (searched for
//! ordinary receivers) and class methods (searched when the receiver is the
//! class itself). Lookup climbs the superclass chain; every chain ends at
//! `Object`.
//!
//! Both tables store [`Value`] entries so that compiled methods and builtins
//! dispatch through the same slot.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::method::BuiltinMethodObject;
use super::Value;

pub struct RClass {
    name: String,
    superclass: RefCell<Option<Rc<RClass>>>,
    methods: RefCell<FxHashMap<String, Value>>,
    class_methods: RefCell<FxHashMap<String, Value>>,
}

impl RClass {
    pub fn new(name: &str, superclass: Option<Rc<RClass>>) -> Rc<RClass> {
        Rc::new(RClass {
            name: name.to_string(),
            superclass: RefCell::new(superclass),
            methods: RefCell::new(FxHashMap::default()),
            class_methods: RefCell::new(FxHashMap::default()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<Rc<RClass>> {
        self.superclass.borrow().clone()
    }

    pub fn define_instance_method(&self, name: &str, method: Value) {
        self.methods.borrow_mut().insert(name.to_string(), method);
    }

    pub fn define_class_method(&self, name: &str, method: Value) {
        self.class_methods
            .borrow_mut()
            .insert(name.to_string(), method);
    }

    /// Search the instance-method chain.
    pub fn lookup_instance_method(&self, name: &str) -> Option<Value> {
        if let Some(found) = self.methods.borrow().get(name) {
            return Some(found.clone());
        }
        self.superclass()?.lookup_instance_method(name)
    }

    /// Search the class-method chain.
    pub fn lookup_class_method(&self, name: &str) -> Option<Value> {
        if let Some(found) = self.class_methods.borrow().get(name) {
            return Some(found.clone());
        }
        self.superclass()?.lookup_class_method(name)
    }

    /// Attach a batch of builtins, instance-level or class-level.
    pub fn set_builtin_methods(&self, methods: Vec<BuiltinMethodObject>, class_level: bool) {
        for method in methods {
            let name = method.name;
            let value = Value::Builtin(Rc::new(method));
            if class_level {
                self.define_class_method(name, value);
            } else {
                self.define_instance_method(name, value);
            }
        }
    }
}

impl std::fmt::Debug for RClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RClass({})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::method::CallContext;
    use crate::thread::Thread;

    fn stub(_thread: &mut Thread, _call: CallContext) -> Value {
        Value::Null
    }

    #[test]
    fn test_lookup_climbs_superclass_chain() {
        let object = RClass::new("Object", None);
        object.set_builtin_methods(vec![BuiltinMethodObject::new("to_s", stub)], false);

        let integer = RClass::new("Integer", Some(object.clone()));
        integer.set_builtin_methods(vec![BuiltinMethodObject::new("+", stub)], false);

        assert!(integer.lookup_instance_method("+").is_some());
        assert!(integer.lookup_instance_method("to_s").is_some());
        assert!(integer.lookup_instance_method("missing").is_none());
        assert!(object.lookup_instance_method("+").is_none());
    }

    #[test]
    fn test_class_methods_are_separate() {
        let object = RClass::new("Object", None);
        object.set_builtin_methods(vec![BuiltinMethodObject::new("new", stub)], true);

        let decimal = RClass::new("Decimal", Some(object.clone()));
        assert!(decimal.lookup_class_method("new").is_some());
        assert!(decimal.lookup_instance_method("new").is_none());

        // Overriding in the subclass shadows the inherited entry.
        decimal.set_builtin_methods(vec![BuiltinMethodObject::new("new", stub)], true);
        assert!(decimal.lookup_class_method("new").is_some());
    }
}
