//! Host interop: JSON conversion
//!
//! Hosts embed the interpreter to run user programs against data they
//! control. This module converts between `serde_json` values and runtime
//! values so configuration can be handed in through the global scope and
//! results read back out.
//!
//! ```
//! use jsrun::{api, Interpreter, Scope};
//!
//! let mut interp = Interpreter::new();
//! let config = api::from_json(&interp, &serde_json::json!({"limit": 3}));
//! Scope::new_var(&interp.global_scope(), "config".into(), config);
//!
//! let result = interp.eval("config.limit * 2").unwrap();
//! assert_eq!(result.as_number(), Some(6.0));
//! ```

use serde_json::{Map, Value};

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{JsObject, JsObjectRef, JsString, JsValue};

/// Convert a JSON value into a runtime value. Objects become ordinary
/// objects with the default prototype; arrays become index-keyed objects
/// carrying a `length` property (the object model has no arrays).
pub fn from_json(it: &Interpreter, json: &Value) -> JsValue {
    match json {
        Value::Null => JsValue::Null,
        Value::Bool(b) => JsValue::Boolean(*b),
        Value::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => JsValue::from(s.as_str()),
        Value::Array(items) => {
            let obj = it.new_object();
            for (index, item) in items.iter().enumerate() {
                JsObject::set_property(
                    &obj,
                    JsString::from(index.to_string()),
                    from_json(it, item),
                );
            }
            JsObject::set_property(
                &obj,
                JsString::from("length"),
                JsValue::Number(items.len() as f64),
            );
            JsValue::Object(obj)
        }
        Value::Object(entries) => {
            let obj = it.new_object();
            for (key, value) in entries {
                JsObject::set_property(&obj, JsString::from(key.as_str()), from_json(it, value));
            }
            JsValue::Object(obj)
        }
    }
}

/// Convert a runtime value to JSON. Functions and `undefined` map to
/// `null`, as do non-finite numbers; cyclic object graphs are refused with
/// a thrown TypeError, like `JSON.stringify`.
pub fn to_json(value: &JsValue) -> Result<Value, JsError> {
    let mut visiting: Vec<*const ()> = Vec::new();
    to_json_inner(value, &mut visiting)
}

fn to_json_inner(value: &JsValue, visiting: &mut Vec<*const ()>) -> Result<Value, JsError> {
    Ok(match value {
        JsValue::Undefined | JsValue::Null | JsValue::Function(_) => Value::Null,
        JsValue::Boolean(b) => Value::Bool(*b),
        JsValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        JsValue::String(s) => Value::String(s.as_str().to_string()),
        JsValue::Object(obj) => {
            let marker = object_marker(obj);
            if visiting.contains(&marker) {
                return Err(JsError::thrown(JsValue::from(
                    "TypeError: Converting circular structure to JSON",
                )));
            }
            visiting.push(marker);
            let mut entries = Map::new();
            let properties: Vec<(JsString, JsValue)> = obj
                .borrow()
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            for (key, value) in properties {
                entries.insert(
                    key.as_str().to_string(),
                    to_json_inner(&value, visiting)?,
                );
            }
            visiting.pop();
            Value::Object(entries)
        }
    })
}

fn object_marker(obj: &JsObjectRef) -> *const () {
    std::rc::Rc::as_ptr(obj).cast()
}
