//! Error surfaces: thrown values, TypeErrors, syntax errors

use super::{eval, eval_result, throws_error};
use jsrun::{JsError, JsValue};

// -----------------------------------------------------------------------------
// Thrown values
// -----------------------------------------------------------------------------

#[test]
fn test_uncaught_throw_carries_value() {
    let err = eval_result("throw 5;");
    match err {
        Err(e @ JsError::Uncaught { .. }) => assert_eq!(e.to_value(), JsValue::Number(5.0)),
        other => panic!("Expected uncaught error, got {:?}", other),
    }
}

#[test]
fn test_uncaught_throw_message() {
    assert!(throws_error("throw 'boom';", "boom"));
}

#[test]
fn test_any_value_is_throwable() {
    assert_eq!(eval("try { throw {code: 7} } catch (e) { e.code }"), JsValue::Number(7.0));
    assert_eq!(eval("try { throw null } catch (e) { e }"), JsValue::Null);
}

// -----------------------------------------------------------------------------
// TypeErrors raised by the evaluator
// -----------------------------------------------------------------------------

#[test]
fn test_property_read_on_null_throws() {
    assert!(throws_error("null.x", "TypeError"));
    assert!(throws_error("var o = {}; o.missing.x", "TypeError"));
}

#[test]
fn test_property_write_on_undefined_throws() {
    assert!(throws_error("undefined.x = 1", "TypeError"));
}

#[test]
fn test_property_type_error_is_catchable() {
    assert_eq!(
        eval("var m = ''; try { null.x; } catch (e) { m = e.name; } m"),
        JsValue::from("TypeError")
    );
    assert_eq!(
        eval("try { null.x; } catch (e) { e.message }"),
        JsValue::from("Cannot read property 'x' of null")
    );
}

#[test]
fn test_calling_a_non_function_throws() {
    assert!(throws_error("var x = 5; x()", "is not a function"));
    assert!(throws_error("missing()", "is not a function"));
}

#[test]
fn test_call_type_error_is_catchable() {
    assert_eq!(
        eval("var r = ''; try { null.f(); } catch (e) { r = e.name; } r"),
        JsValue::from("TypeError")
    );
}

#[test]
fn test_throw_in_argument_skips_call() {
    assert_eq!(
        eval(
            r#"
            var called = false;
            function f(a) { called = true; }
            function boom() { throw 'x'; }
            try { f(boom()); } catch (e) {}
            called
        "#
        ),
        JsValue::Boolean(false)
    );
}

// -----------------------------------------------------------------------------
// Syntax errors
// -----------------------------------------------------------------------------

#[test]
fn test_return_outside_function_is_syntax_error() {
    assert!(throws_error("return 1;", "Illegal return"));
}

#[test]
fn test_break_outside_loop_is_syntax_error() {
    assert!(throws_error("break;", "Illegal break"));
    assert!(throws_error("if (true) break;", "Illegal break"));
}

#[test]
fn test_continue_outside_loop_is_syntax_error() {
    assert!(throws_error("continue;", "Illegal continue"));
}

#[test]
fn test_jump_to_undefined_label_is_syntax_error() {
    assert!(throws_error("while (true) { break missing; }", "Undefined label"));
}

#[test]
fn test_labels_do_not_cross_function_boundaries() {
    assert!(throws_error(
        "outer: while (true) { var f = function () { break outer; }; }",
        "Undefined label"
    ));
}

#[test]
fn test_duplicate_label_is_syntax_error() {
    assert!(throws_error("a: a: while (true) break;", "already been declared"));
}

#[test]
fn test_invalid_assignment_target_is_syntax_error() {
    assert!(throws_error("1 = 2;", "Invalid assignment target"));
    assert!(throws_error("f() = 2;", "Invalid assignment target"));
}

#[test]
fn test_unsupported_constructs_are_rejected() {
    assert!(throws_error("this.x", "not supported"));
    assert!(throws_error("new Thing()", "not supported"));
    assert!(throws_error("delete o.x;", "not supported"));
    assert!(throws_error("switch (x) {}", "not supported"));
    assert!(throws_error("[1, 2]", "not supported"));
    assert!(throws_error("for (var k in o) {}", "not supported"));
    assert!(throws_error("with (o) {}", "not supported"));
}

#[test]
fn test_newline_after_throw_is_syntax_error() {
    assert!(throws_error("function f() { throw\n5; }", "Illegal newline after throw"));
}

#[test]
fn test_try_requires_catch_or_finally() {
    assert!(throws_error("try { 1; }", "Missing catch or finally"));
}

// -----------------------------------------------------------------------------
// Error state does not leak
// -----------------------------------------------------------------------------

#[test]
fn test_interpreter_is_reusable_after_error() {
    let mut interp = jsrun::Interpreter::new();
    assert!(interp.eval("null.x").is_err());
    assert_eq!(interp.eval("1 + 1").ok(), Some(JsValue::Number(2.0)));
}
