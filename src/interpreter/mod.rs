//! Interpreter for executing ECMAScript AST
//!
//! The interpreter owns the global scope, the default object prototype,
//! and an optional prepared program. Execution is step-based: each call to
//! [`Interpreter::step`] advances the current evaluation state by one
//! logical step, which gives hosts full control over scheduling. A host
//! can interleave programs, impose step budgets, or abandon a computation
//! by dropping the interpreter; [`Interpreter::eval`] is the convenience
//! loop that runs a source string to completion.

// Lexical variable environments
pub mod scope;

// Reified evaluation states
pub mod state;

use crate::ast::{BinaryOp, Program, UnaryOp};
use crate::error::JsError;
use crate::parser::Parser;
use crate::value::{
    to_int32, to_uint32, JsObject, JsObjectRef, JsString, JsValue,
};

use scope::{Scope, ScopeRef};
use state::{Completion, CompletionKind, State};

/// Result of executing one step
#[derive(Debug)]
pub enum StepResult {
    /// Execution continues; call `step` again
    Continue,
    /// The prepared program finished with this value
    Complete(JsValue),
    /// Nothing is prepared for execution
    Done,
}

/// The interpreter state
pub struct Interpreter {
    /// Prototype of every object created by object literals
    object_prototype: JsObjectRef,
    /// Global scope shared by every prepared program
    global: ScopeRef,
    /// Current evaluation state, when a program is prepared
    state: Option<Box<State>>,
    /// Completion value to feed the next step
    cv: Option<Completion>,
}

impl Interpreter {
    /// Create a new interpreter with a fresh global scope
    pub fn new() -> Self {
        Self {
            object_prototype: JsObject::with_proto(None),
            global: Scope::new_global(),
            state: None,
            cv: None,
        }
    }

    /// The global scope, for hosts that want to pre-bind values
    pub fn global_scope(&self) -> ScopeRef {
        self.global.clone()
    }

    /// Parse a source string and set it up for step-based execution
    pub fn prepare(&mut self, source: &str) -> Result<(), JsError> {
        let program = Parser::new(source).parse_program()?;
        let scope = self.global.clone();
        Scope::populate(&scope, &program.body);
        self.state = Some(State::from_program(&program, scope));
        self.cv = None;
        Ok(())
    }

    /// Advance the prepared program by one step
    pub fn step(&mut self) -> Result<StepResult, JsError> {
        let Some(current) = self.state.take() else {
            return Ok(StepResult::Done);
        };
        let cv = self.cv.take();
        let (next, cv) = current.step(self, cv)?;
        match next {
            Some(next) => {
                self.state = Some(next);
                self.cv = cv;
                Ok(StepResult::Continue)
            }
            None => {
                // The program root returned to the sentinel
                match cv {
                    Some(c) if c.kind == CompletionKind::Throw => Err(JsError::uncaught(c.payload())),
                    Some(c) if c.is_abrupt() => Err(JsError::internal(
                        "abrupt completion escaped the program root",
                    )),
                    Some(c) => Ok(StepResult::Complete(c.payload())),
                    None => Ok(StepResult::Complete(JsValue::Undefined)),
                }
            }
        }
    }

    /// Parse and run a source string to completion
    pub fn eval(&mut self, source: &str) -> Result<JsValue, JsError> {
        self.prepare(source)?;
        loop {
            match self.step()? {
                StepResult::Continue => continue,
                StepResult::Complete(value) => return Ok(value),
                StepResult::Done => return Ok(JsValue::Undefined),
            }
        }
    }

    /// Run a parsed program under an explicit scope and hand back its raw
    /// completion value; an uncaught throw arrives as a THROW completion
    /// rather than an error. This is the entry point for hosts that manage
    /// their own scopes and programs.
    pub fn run_program(
        &mut self,
        program: &Program,
        scope: ScopeRef,
    ) -> Result<Completion, JsError> {
        Scope::populate(&scope, &program.body);
        let mut state = Some(State::from_program(program, scope));
        let mut cv = None;
        while let Some(current) = state {
            (state, cv) = current.step(self, cv)?;
        }
        Ok(cv.unwrap_or_else(Completion::empty))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Value adapter: the narrow object-model surface the states consume
    // ═══════════════════════════════════════════════════════════════════

    /// Fresh empty object carrying the default prototype
    pub fn new_object(&self) -> JsObjectRef {
        JsObject::with_proto(Some(self.object_prototype.clone()))
    }

    /// A TypeError as a throwable error: an object with `name` and
    /// `message` properties, wrapped for THROW propagation
    pub fn type_error(&self, message: impl Into<String>) -> JsError {
        let err = self.new_object();
        JsObject::set_property(&err, JsString::from("name"), JsValue::from("TypeError"));
        JsObject::set_property(&err, JsString::from("message"), JsValue::from(message.into()));
        JsError::thrown(JsValue::Object(err))
    }

    /// Read `base.name`, walking the prototype chain. Reading from
    /// `null`/`undefined` throws a TypeError; other primitives read as
    /// `undefined` (strings expose `length`).
    pub fn get_property(&self, base: &JsValue, name: &JsString) -> Result<JsValue, JsError> {
        match base {
            JsValue::Object(obj) => {
                Ok(JsObject::get_property(obj, name).unwrap_or(JsValue::Undefined))
            }
            JsValue::String(s) => {
                if name == "length" {
                    Ok(JsValue::Number(s.as_str().chars().count() as f64))
                } else {
                    Ok(JsValue::Undefined)
                }
            }
            JsValue::Undefined | JsValue::Null => Err(self.type_error(format!(
                "Cannot read property '{}' of {}",
                name,
                base.to_js_string()
            ))),
            _ => Ok(JsValue::Undefined),
        }
    }

    /// Write `base.name`. Writing to `null`/`undefined` throws a
    /// TypeError; writes to other primitives are silently dropped.
    pub fn set_property(
        &self,
        base: &JsValue,
        name: JsString,
        value: JsValue,
    ) -> Result<(), JsError> {
        match base {
            JsValue::Object(obj) => {
                JsObject::set_property(obj, name, value);
                Ok(())
            }
            JsValue::Undefined | JsValue::Null => Err(self.type_error(format!(
                "Cannot set property '{}' of {}",
                name,
                base.to_js_string()
            ))),
            _ => Ok(()),
        }
    }

    /// Apply a binary operator to two already-evaluated operands
    pub fn binary_op(&self, op: BinaryOp, left: &JsValue, right: &JsValue) -> JsValue {
        match op {
            BinaryOp::Add => {
                // ToPrimitive first, then string concatenation wins
                let left = to_primitive(left);
                let right = to_primitive(right);
                if left.as_str().is_some() || right.as_str().is_some() {
                    let mut s = left.to_js_string().as_str().to_string();
                    s.push_str(right.to_js_string().as_str());
                    JsValue::from(s)
                } else {
                    JsValue::Number(left.to_number() + right.to_number())
                }
            }
            BinaryOp::Sub => JsValue::Number(left.to_number() - right.to_number()),
            BinaryOp::Mul => JsValue::Number(left.to_number() * right.to_number()),
            BinaryOp::Div => JsValue::Number(left.to_number() / right.to_number()),
            BinaryOp::Mod => JsValue::Number(left.to_number() % right.to_number()),

            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                let left = to_primitive(left);
                let right = to_primitive(right);
                let result = match (left.as_str(), right.as_str()) {
                    (Some(a), Some(b)) => match op {
                        BinaryOp::Lt => a < b,
                        BinaryOp::LtEq => a <= b,
                        BinaryOp::Gt => a > b,
                        _ => a >= b,
                    },
                    _ => {
                        let (a, b) = (left.to_number(), right.to_number());
                        match op {
                            BinaryOp::Lt => a < b,
                            BinaryOp::LtEq => a <= b,
                            BinaryOp::Gt => a > b,
                            _ => a >= b,
                        }
                    }
                };
                JsValue::Boolean(result)
            }

            BinaryOp::Eq => JsValue::Boolean(left.loose_equals(right)),
            BinaryOp::NotEq => JsValue::Boolean(!left.loose_equals(right)),
            BinaryOp::StrictEq => JsValue::Boolean(left.strict_equals(right)),
            BinaryOp::StrictNotEq => JsValue::Boolean(!left.strict_equals(right)),

            BinaryOp::BitAnd => {
                JsValue::Number((to_int32(left.to_number()) & to_int32(right.to_number())) as f64)
            }
            BinaryOp::BitOr => {
                JsValue::Number((to_int32(left.to_number()) | to_int32(right.to_number())) as f64)
            }
            BinaryOp::BitXor => {
                JsValue::Number((to_int32(left.to_number()) ^ to_int32(right.to_number())) as f64)
            }
            BinaryOp::LShift => {
                let lhs = to_int32(left.to_number());
                let rhs = to_uint32(right.to_number()) & 0x1f;
                JsValue::Number(lhs.wrapping_shl(rhs) as f64)
            }
            BinaryOp::RShift => {
                let lhs = to_int32(left.to_number());
                let rhs = to_uint32(right.to_number()) & 0x1f;
                JsValue::Number(lhs.wrapping_shr(rhs) as f64)
            }
            BinaryOp::URShift => {
                let lhs = to_uint32(left.to_number());
                let rhs = to_uint32(right.to_number()) & 0x1f;
                JsValue::Number(lhs.wrapping_shr(rhs) as f64)
            }
        }
    }

    /// Apply a unary operator to an already-evaluated operand
    pub fn unary_op(&self, op: UnaryOp, operand: &JsValue) -> JsValue {
        match op {
            UnaryOp::Minus => JsValue::Number(-operand.to_number()),
            UnaryOp::Plus => JsValue::Number(operand.to_number()),
            UnaryOp::Not => JsValue::Boolean(!operand.to_boolean()),
            UnaryOp::BitNot => JsValue::Number(!to_int32(operand.to_number()) as f64),
            UnaryOp::Typeof => JsValue::String(JsString::from(operand.type_of())),
            UnaryOp::Void => JsValue::Undefined,
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// ToPrimitive for ordinary objects: their string form (no valueOf hooks
/// in this object model)
fn to_primitive(value: &JsValue) -> JsValue {
    match value {
        JsValue::Object(_) | JsValue::Function(_) => JsValue::String(value.to_js_string()),
        other => other.clone(),
    }
}
