//! Lexical variable environments
//!
//! A scope maps identifier names to values and chains to its parent.
//! Lookup walks the chain; assignment targets the innermost scope that
//! declares the name, falling back to the global scope for undeclared
//! names. `populate` performs the hoisting pre-pass over a body before it
//! executes: `var` names are declared as `undefined`, function declarations
//! are bound to their closures.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::ast::{ForInit, Statement};
use crate::value::{Closure, JsString, JsValue};

pub type ScopeRef = Rc<RefCell<Scope>>;

#[derive(Debug)]
pub struct Scope {
    parent: Option<ScopeRef>,
    vars: FxHashMap<JsString, JsValue>,
}

impl Scope {
    /// Create a global scope, seeded with the value bindings every program
    /// can see
    pub fn new_global() -> ScopeRef {
        let scope = Rc::new(RefCell::new(Scope {
            parent: None,
            vars: FxHashMap::default(),
        }));
        Scope::new_var(&scope, JsString::from("undefined"), JsValue::Undefined);
        Scope::new_var(&scope, JsString::from("NaN"), JsValue::Number(f64::NAN));
        Scope::new_var(
            &scope,
            JsString::from("Infinity"),
            JsValue::Number(f64::INFINITY),
        );
        scope
    }

    /// Create an empty scope chained to `parent`
    pub fn new_child(parent: &ScopeRef) -> ScopeRef {
        Rc::new(RefCell::new(Scope {
            parent: Some(parent.clone()),
            vars: FxHashMap::default(),
        }))
    }

    /// Read a variable, walking parent scopes; undeclared names read as
    /// `undefined`
    pub fn get_var(scope: &ScopeRef, name: &JsString) -> JsValue {
        let mut current = scope.clone();
        loop {
            let next = {
                let borrowed = current.borrow();
                if let Some(value) = borrowed.vars.get(name) {
                    return value.clone();
                }
                borrowed.parent.clone()
            };
            match next {
                Some(parent) => current = parent,
                None => return JsValue::Undefined,
            }
        }
    }

    /// Write a variable in the innermost scope that declares it; an
    /// undeclared name is created on the global scope
    pub fn set_var(scope: &ScopeRef, name: &JsString, value: JsValue) {
        let mut current = scope.clone();
        loop {
            let (declared_here, next) = {
                let borrowed = current.borrow();
                (borrowed.vars.contains_key(name), borrowed.parent.clone())
            };
            if declared_here {
                current.borrow_mut().vars.insert(name.clone(), value);
                return;
            }
            match next {
                Some(parent) => current = parent,
                None => break,
            }
        }
        // `current` is the global scope here
        current.borrow_mut().vars.insert(name.clone(), value);
    }

    /// Declare a variable in this scope, overwriting any previous binding
    pub fn new_var(scope: &ScopeRef, name: JsString, value: JsValue) {
        scope.borrow_mut().vars.insert(name, value);
    }

    /// Pre-declare the `var` and function-declaration names of a body.
    /// `var` declaration is idempotent: an existing binding keeps its
    /// value. Function declarations bind their closures, later ones win.
    pub fn populate(scope: &ScopeRef, body: &[Rc<Statement>]) {
        for stmt in body {
            Scope::populate_statement(scope, stmt);
        }
    }

    fn populate_statement(scope: &ScopeRef, stmt: &Rc<Statement>) {
        match &**stmt {
            Statement::Variable(decl) => {
                let mut borrowed = scope.borrow_mut();
                for declarator in &decl.declarations {
                    borrowed
                        .vars
                        .entry(declarator.name.clone())
                        .or_insert(JsValue::Undefined);
                }
            }
            Statement::Function(decl) => {
                let function = &decl.function;
                let Some(name) = function.name.clone() else {
                    return;
                };
                let closure = Closure {
                    name: Some(name.clone()),
                    params: function.params.clone(),
                    body: function.body.clone(),
                    scope: scope.clone(),
                };
                scope
                    .borrow_mut()
                    .vars
                    .insert(name, JsValue::Function(Rc::new(closure)));
            }
            Statement::Block(block) => Scope::populate(scope, &block.body),
            Statement::If(node) => {
                Scope::populate_statement(scope, &node.consequent);
                if let Some(alternate) = &node.alternate {
                    Scope::populate_statement(scope, alternate);
                }
            }
            Statement::While(node) => Scope::populate_statement(scope, &node.body),
            Statement::DoWhile(node) => Scope::populate_statement(scope, &node.body),
            Statement::For(node) => {
                if let Some(ForInit::Variable(init)) = &node.init {
                    Scope::populate_statement(scope, init);
                }
                Scope::populate_statement(scope, &node.body);
            }
            Statement::Try(node) => {
                Scope::populate(scope, &node.block.body);
                if let Some(handler) = &node.handler {
                    Scope::populate(scope, &handler.body.body);
                }
                if let Some(finalizer) = &node.finalizer {
                    Scope::populate(scope, &finalizer.body);
                }
            }
            Statement::Labeled(node) => Scope::populate_statement(scope, &node.body),
            // Nested functions keep their own hoisting; everything else
            // declares nothing
            Statement::Return(_)
            | Statement::Break(_)
            | Statement::Continue(_)
            | Statement::Throw(_)
            | Statement::Expression(_)
            | Statement::Empty(_) => {}
        }
    }
}
