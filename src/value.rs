//! JavaScript value representation
//!
//! The core `JsValue` type and the coercions the evaluator consumes:
//! ToBoolean, ToNumber, ToString, ToInt32/ToUint32 and the two equality
//! algorithms. Objects are reference-counted with interior mutability;
//! identity (`===`) is pointer identity.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::ast::Statement;
use crate::interpreter::scope::ScopeRef;

/// A JavaScript value
#[derive(Clone)]
pub enum JsValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Object(JsObjectRef),
    Function(Rc<Closure>),
}

impl JsValue {
    /// Check if this value is null or undefined
    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, JsValue::Null | JsValue::Undefined)
    }

    /// Get the typeof result for this value
    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null => "object", // Historical quirk
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Object(_) => "object",
            JsValue::Function(_) => "function",
        }
    }

    /// Convert to boolean (ToBoolean)
    pub fn to_boolean(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::String(s) => !s.is_empty(),
            JsValue::Object(_) | JsValue::Function(_) => true,
        }
    }

    /// Convert to number (ToNumber)
    pub fn to_number(&self) -> f64 {
        match self {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Boolean(true) => 1.0,
            JsValue::Boolean(false) => 0.0,
            JsValue::Number(n) => *n,
            JsValue::String(s) => string_to_number(s.as_str()),
            // ToPrimitive on ordinary objects yields their string form
            JsValue::Object(_) | JsValue::Function(_) => {
                string_to_number(self.to_js_string().as_str())
            }
        }
    }

    /// Convert to string (ToString)
    pub fn to_js_string(&self) -> JsString {
        match self {
            JsValue::Undefined => JsString::from("undefined"),
            JsValue::Null => JsString::from("null"),
            JsValue::Boolean(true) => JsString::from("true"),
            JsValue::Boolean(false) => JsString::from("false"),
            JsValue::Number(n) => number_to_string(*n),
            JsValue::String(s) => s.clone(),
            JsValue::Object(_) => JsString::from("[object Object]"),
            JsValue::Function(f) => {
                let name = f.name.as_ref().map(JsString::as_str).unwrap_or("");
                JsString::from(format!("function {}() {{ ... }}", name))
            }
        }
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            (JsValue::Number(a), JsValue::Number(b)) => {
                // NaN !== NaN
                if a.is_nan() || b.is_nan() {
                    false
                } else {
                    a == b
                }
            }
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            (JsValue::Function(a), JsValue::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Abstract equality (==), ES5.1 §11.9.3
    pub fn loose_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Null | JsValue::Undefined, JsValue::Null | JsValue::Undefined) => true,
            (JsValue::Number(a), JsValue::String(b)) => {
                !a.is_nan() && *a == string_to_number(b.as_str())
            }
            (JsValue::String(a), JsValue::Number(b)) => {
                !b.is_nan() && string_to_number(a.as_str()) == *b
            }
            (JsValue::Boolean(_), _) => JsValue::Number(self.to_number()).loose_equals(other),
            (_, JsValue::Boolean(_)) => self.loose_equals(&JsValue::Number(other.to_number())),
            (JsValue::Number(_) | JsValue::String(_), JsValue::Object(_) | JsValue::Function(_)) => {
                self.loose_equals(&JsValue::String(other.to_js_string()))
            }
            (JsValue::Object(_) | JsValue::Function(_), JsValue::Number(_) | JsValue::String(_)) => {
                JsValue::String(self.to_js_string()).loose_equals(other)
            }
            _ => self.strict_equals(other),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            JsValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            JsValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            JsValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&JsObjectRef> {
        match self {
            JsValue::Object(o) => Some(o),
            _ => None,
        }
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::Number(n) => write!(f, "{}", n),
            JsValue::String(s) => write!(f, "\"{}\"", s.as_str()),
            JsValue::Object(_) => write!(f, "{{...}}"),
            JsValue::Function(func) => write!(f, "{:?}", func),
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

impl Default for JsValue {
    fn default() -> Self {
        JsValue::Undefined
    }
}

// Conversions from Rust types

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<i32> for JsValue {
    fn from(n: i32) -> Self {
        JsValue::Number(n as f64)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<JsString> for JsValue {
    fn from(s: JsString) -> Self {
        JsValue::String(s)
    }
}

/// Reference-counted string for cheap cloning between scopes and states
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString(Rc<str>);

impl JsString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString(Rc::from(s))
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString(Rc::from(s.as_str()))
    }
}

impl AsRef<str> for JsString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Shared, mutable object reference; `===` compares by pointer
pub type JsObjectRef = Rc<RefCell<JsObject>>;

/// An ordinary object: a prototype pointer plus insertion-ordered properties
pub struct JsObject {
    pub proto: Option<JsObjectRef>,
    pub properties: IndexMap<JsString, JsValue>,
}

impl JsObject {
    /// Create an object with the given prototype
    pub fn with_proto(proto: Option<JsObjectRef>) -> JsObjectRef {
        Rc::new(RefCell::new(JsObject {
            proto,
            properties: IndexMap::new(),
        }))
    }

    /// Read a property, walking the prototype chain
    pub fn get_property(obj: &JsObjectRef, name: &JsString) -> Option<JsValue> {
        let mut current = obj.clone();
        loop {
            let next = {
                let borrowed = current.borrow();
                if let Some(v) = borrowed.properties.get(name) {
                    return Some(v.clone());
                }
                borrowed.proto.clone()
            };
            match next {
                Some(proto) => current = proto,
                None => return None,
            }
        }
    }

    /// Write an own property (the prototype chain is never consulted)
    pub fn set_property(obj: &JsObjectRef, name: JsString, value: JsValue) {
        obj.borrow_mut().properties.insert(name, value);
    }
}

impl fmt::Debug for JsObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Property values may form cycles; print keys only
        let keys: Vec<&str> = self.properties.keys().map(JsString::as_str).collect();
        write!(f, "JsObject {{ {} }}", keys.join(", "))
    }
}

/// A user function: the scope it closed over, its parameter names and body
pub struct Closure {
    pub name: Option<JsString>,
    pub params: Vec<JsString>,
    pub body: Vec<Rc<Statement>>,
    pub scope: ScopeRef,
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name.as_ref().map(JsString::as_str).unwrap_or("anonymous");
        write!(f, "[Function: {}]", name)
    }
}

/// ToString for numbers, shared with the parser's object-literal keys
pub fn number_to_string(n: f64) -> JsString {
    if n.is_nan() {
        JsString::from("NaN")
    } else if n.is_infinite() {
        if n > 0.0 {
            JsString::from("Infinity")
        } else {
            JsString::from("-Infinity")
        }
    } else if n == 0.0 {
        JsString::from("0")
    } else {
        JsString::from(n.to_string())
    }
}

/// ToNumber for strings: trimmed, empty means zero, hex accepted
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return match u64::from_str_radix(hex, 16) {
            Ok(n) => n as f64,
            Err(_) => f64::NAN,
        };
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// ToInt32, ES5.1 §9.5 (wrapping, not saturating)
pub fn to_int32(n: f64) -> i32 {
    let u = to_uint32(n);
    if u >= 0x8000_0000 {
        (i64::from(u) - 0x1_0000_0000) as i32
    } else {
        u as i32
    }
}

/// ToUint32, ES5.1 §9.6
pub fn to_uint32(n: f64) -> u32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    let m = n.trunc().rem_euclid(4_294_967_296.0);
    m as u32
}
