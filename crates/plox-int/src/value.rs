//! Runtime values.
//!
//! Values form a closed sum. Strings are shared (`Rc<str>`); functions,
//! classes, and instances are reference-counted objects compared by
//! identity. Truthiness and per-kind equality live here so every operator
//! shares one definition.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use plox_util::{FxHashMap, Symbol};
use plox_par::FuncDecl;

use crate::env::{Frame, FrameRef};

/// A Plox runtime value.
#[derive(Clone, Debug)]
pub enum Value {
    Number(f64),
    Str(Rc<str>),
    Bool(bool),
    Nil,
    Function(Rc<Function>),
    Class(Rc<Class>),
    Instance(Rc<Instance>),
}

impl Value {
    /// Truthiness: `nil`, `false`, and `0.0` are false; everything else
    /// (including the empty string) is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            _ => true,
        }
    }
}

/// Equality is structural per kind and identity-based for objects.
/// Values of different kinds are never equal.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Nil, Value::Nil) => true,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // f64 Display already prints integral values without a
            // fractional part (2, not 2.0) and non-integral values in
            // standard form.
            Value::Number(n) => write!(f, "{}", n),
            Value::Str(s) => f.write_str(s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Nil => f.write_str("nil"),
            Value::Function(function) => {
                write!(f, "<fn {}: {}>", function.name(), function.arity())
            }
            Value::Class(class) => f.write_str(class.name.as_str()),
            Value::Instance(instance) => {
                write!(f, "<instance of {}>", instance.class.name)
            }
        }
    }
}

/// A function value: a shared declaration plus the frame stack captured
/// where the declaration executed.
pub struct Function {
    /// The declaration, shared with the AST.
    pub decl: Rc<FuncDecl>,
    /// Captured frame stack. Shared frames, not copies: assignments to a
    /// captured variable are visible everywhere the frame is held.
    pub closure: Vec<FrameRef>,
}

impl Function {
    pub fn name(&self) -> Symbol {
        self.decl.name
    }

    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }

    pub fn is_initializer(&self) -> bool {
        self.decl.is_initializer
    }

    /// Bind this function to an instance, producing a new function whose
    /// closure carries an extra `{ this }` frame on top.
    pub fn bind(&self, instance: &Rc<Instance>, this_sym: Symbol) -> Function {
        let mut closure = self.closure.clone();
        let frame = Frame::new_ref();
        frame
            .borrow_mut()
            .set(this_sym, Value::Instance(instance.clone()));
        closure.push(frame);
        Function {
            decl: self.decl.clone(),
            closure,
        }
    }
}

// Closures can be cyclic (a frame can hold the function that captured
// it), so Debug prints the signature only.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}: {}>", self.name(), self.arity())
    }
}

/// A class value: a method table plus an optional superclass.
pub struct Class {
    pub name: Symbol,
    pub methods: FxHashMap<Symbol, Rc<Function>>,
    pub superclass: Option<Rc<Class>>,
}

impl Class {
    /// Look up a method, walking the superclass chain.
    pub fn find_method(&self, name: Symbol) -> Option<Rc<Function>> {
        if let Some(method) = self.methods.get(&name) {
            return Some(method.clone());
        }
        self.superclass
            .as_ref()
            .and_then(|superclass| superclass.find_method(name))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

/// An instance: a class reference plus dynamically created fields.
///
/// Field storage keeps insertion order so behavior is deterministic.
pub struct Instance {
    pub class: Rc<Class>,
    fields: RefCell<IndexMap<Symbol, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: RefCell::new(IndexMap::new()),
        }
    }

    /// Read a field. Fields shadow methods of the same name.
    pub fn get_field(&self, name: Symbol) -> Option<Value> {
        self.fields.borrow().get(&name).cloned()
    }

    /// Create or overwrite a field.
    pub fn set_field(&self, name: Symbol, value: Value) {
        self.fields.borrow_mut().insert(name, value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<instance of {}>", self.class.name)
    }
}
