//! Instances of user-defined classes.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::class::RClass;
use super::method::MethodObject;
use super::Value;

/// An ordinary object: a class pointer plus instance variables.
///
/// `initialize_method` is populated when `Class#new` allocates the instance
/// and the class defines `initialize`; the interpreter then binds the
/// constructor arguments against it before handing the instance back.
pub struct RObject {
    pub class: Rc<RClass>,
    ivars: RefCell<FxHashMap<String, Value>>,
    initialize_method: RefCell<Option<Rc<MethodObject>>>,
}

impl RObject {
    pub fn new(class: Rc<RClass>) -> Rc<RObject> {
        Rc::new(RObject {
            class,
            ivars: RefCell::new(FxHashMap::default()),
            initialize_method: RefCell::new(None),
        })
    }

    pub fn instance_variable(&self, name: &str) -> Option<Value> {
        self.ivars.borrow().get(name).cloned()
    }

    pub fn set_instance_variable(&self, name: &str, value: Value) {
        self.ivars.borrow_mut().insert(name.to_string(), value);
    }

    pub fn initialize_method(&self) -> Option<Rc<MethodObject>> {
        self.initialize_method.borrow().clone()
    }

    pub fn set_initialize_method(&self, method: Rc<MethodObject>) {
        *self.initialize_method.borrow_mut() = Some(method);
    }

    pub(crate) fn ivars_to_json(&self) -> String {
        let ivars = self.ivars.borrow();
        let mut names: Vec<&String> = ivars.keys().collect();
        names.sort();
        let parts: Vec<String> = names
            .iter()
            .map(|name| format!("\"{}\":{}", name, ivars[*name].to_json()))
            .collect();
        format!("{{{}}}", parts.join(","))
    }
}
