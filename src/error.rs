//! Error types for the interpreter
//!
//! Two layers, kept clearly apart: values thrown by the program travel as
//! `Thrown`/`Uncaught`, while `Internal` marks an evaluator invariant
//! violation (an interpreter bug, never a program bug).

use thiserror::Error;

use crate::value::{JsObject, JsString, JsValue};

/// Main error type for the interpreter
#[derive(Debug, Error)]
pub enum JsError {
    #[error("SyntaxError: {message} at {line}:{column}")]
    Syntax {
        message: String,
        line: u32,
        column: u32,
    },

    /// A program value was thrown and nothing caught it
    #[error("Uncaught {message}")]
    Uncaught { message: String, value: JsValue },

    /// Marker carrying a thrown value out of an adapter operation; the
    /// raising state converts it into a THROW completion value
    #[error("Thrown")]
    Thrown { value: JsValue },

    /// Evaluator invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl JsError {
    pub fn syntax(message: impl Into<String>, line: u32, column: u32) -> Self {
        JsError::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    /// Wrap a thrown JsValue for propagation through adapter results
    pub fn thrown(value: JsValue) -> Self {
        JsError::Thrown { value }
    }

    /// A thrown value that escaped the program root
    pub fn uncaught(value: JsValue) -> Self {
        JsError::Uncaught {
            message: describe_thrown(&value),
            value,
        }
    }

    /// Create an internal error for unexpected interpreter states.
    /// These never happen for any AST the parser can produce.
    pub fn internal(message: impl Into<String>) -> Self {
        JsError::Internal(message.into())
    }

    /// Extract the thrown JsValue, if this error carries one
    pub fn to_value(&self) -> JsValue {
        match self {
            JsError::Thrown { value } | JsError::Uncaught { value, .. } => value.clone(),
            _ => JsValue::Undefined,
        }
    }
}

/// Human-readable form of a thrown value for diagnostics. Error-shaped
/// objects print as "Name: message", anything else via ToString.
fn describe_thrown(value: &JsValue) -> String {
    if let JsValue::Object(obj) = value {
        let name = JsObject::get_property(obj, &JsString::from("name"));
        let message = JsObject::get_property(obj, &JsString::from("message"));
        if let (Some(name), Some(message)) = (name, message) {
            return format!("{}: {}", name.to_js_string(), message.to_js_string());
        }
    }
    value.to_js_string().as_str().to_string()
}
