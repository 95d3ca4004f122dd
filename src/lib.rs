//! A minimal ECMAScript 5.1 interpreter for embedding in applications.
//!
//! This crate provides a tree-walking interpreter built as an explicit
//! continuation machine: every pending sub-evaluation is a first-class
//! state object with a parent pointer, and a driver advances the current
//! state one logical step at a time. Because the interpreter never
//! recurses on the host stack, a host can run programs incrementally,
//! interleave several of them, or abandon one mid-flight by dropping its
//! state chain.
//!
//! # Quick Start
//!
//! ```
//! use jsrun::Interpreter;
//!
//! let mut interp = Interpreter::new();
//! let value = interp
//!     .eval("var total = 0; var i; for (i = 1; i <= 4; i++) total += i; total")
//!     .unwrap();
//! assert_eq!(value.as_number(), Some(10.0));
//! ```
//!
//! # Execution Model
//!
//! The interpreter uses step-based execution, giving hosts full control:
//!
//! - [`Interpreter::prepare`] parses code and sets up the root state
//! - [`Interpreter::step`] advances by one step, returning [`StepResult`]
//! - [`Interpreter::eval`] is the run-to-completion convenience loop
//!
//! ```
//! use jsrun::{Interpreter, StepResult};
//!
//! let mut interp = Interpreter::new();
//! interp.prepare("1 + 2 + 3").unwrap();
//!
//! loop {
//!     match interp.step().unwrap() {
//!         StepResult::Continue => continue,
//!         StepResult::Complete(value) => {
//!             assert_eq!(value.as_number(), Some(6.0));
//!             break;
//!         }
//!         StepResult::Done => break,
//!     }
//! }
//! ```
//!
//! The host decides how many steps a program may take; an infinite loop in
//! user code never escapes the step budget the host enforces.
//!
//! # Working with Values
//!
//! Runtime values are [`JsValue`]s. The [`api`] module converts between
//! them and `serde_json` values, and the global scope can be pre-seeded
//! before execution:
//!
//! ```
//! use jsrun::{api, Interpreter, JsValue, Scope};
//!
//! let mut interp = Interpreter::new();
//! Scope::new_var(&interp.global_scope(), "limit".into(), JsValue::Number(2.0));
//! let value = interp.eval("limit < 3 ? 'low' : 'high'").unwrap();
//! assert_eq!(value.as_str(), Some("low"));
//! ```
//!
//! # Errors
//!
//! Program-level failures (uncaught throws, syntax errors) surface as
//! [`JsError`]. Values thrown by user code and caught by user code never
//! reach the host: `throw`, `try`/`catch`/`finally` and the control-flow
//! statements are handled entirely inside the state machine.

pub mod api;
pub mod ast;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod value;

pub use error::JsError;
pub use interpreter::scope::{Scope, ScopeRef};
pub use interpreter::state::{Completion, CompletionKind, State};
pub use interpreter::{Interpreter, StepResult};
pub use parser::Parser;
pub use value::{Closure, JsObject, JsObjectRef, JsString, JsValue};
