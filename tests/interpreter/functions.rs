//! Functions: declarations, expressions, closures, return semantics

use super::eval;
use jsrun::JsValue;

#[test]
fn test_function_declaration_and_call() {
    assert_eq!(
        eval("function f(a, b) { return a + b; } f(2, 3)"),
        JsValue::Number(5.0)
    );
}

#[test]
fn test_function_declaration_is_hoisted() {
    assert_eq!(
        eval("var r = f(); function f() { return 'hoisted'; } r"),
        JsValue::from("hoisted")
    );
}

#[test]
fn test_var_is_hoisted_as_undefined() {
    assert_eq!(
        eval(
            r#"
            function f() {
                var seen = typeof x;
                var x = 1;
                return seen;
            }
            f()
        "#
        ),
        JsValue::from("undefined")
    );
}

#[test]
fn test_function_expression() {
    assert_eq!(
        eval("var double = function (n) { return n * 2; }; double(21)"),
        JsValue::Number(42.0)
    );
}

#[test]
fn test_function_without_return_yields_undefined() {
    assert_eq!(eval("function f() { 42; } f()"), JsValue::Undefined);
}

#[test]
fn test_return_without_argument_yields_undefined() {
    assert_eq!(eval("function f() { return; } f()"), JsValue::Undefined);
}

#[test]
fn test_return_stops_execution() {
    assert_eq!(
        eval(
            r#"
            var log = '';
            function f() {
                log += 'a';
                return 1;
                log += 'b';
            }
            f();
            log
        "#
        ),
        JsValue::from("a")
    );
}

#[test]
fn test_return_with_newline_is_bare() {
    assert_eq!(eval("function f() { return\n5; } f()"), JsValue::Undefined);
}

#[test]
fn test_missing_arguments_bind_undefined() {
    assert_eq!(
        eval("function f(a, b) { return typeof b; } f(1)"),
        JsValue::from("undefined")
    );
}

#[test]
fn test_extra_arguments_are_evaluated_then_dropped() {
    assert_eq!(
        eval(
            r#"
            var log = '';
            function note(x) { log += x; return x; }
            function f(a) { return a; }
            f(note('1'), note('2'), note('3')) + log
        "#
        ),
        JsValue::from("1123")
    );
}

#[test]
fn test_recursion() {
    assert_eq!(
        eval(
            r#"
            function fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            fib(10)
        "#
        ),
        JsValue::Number(55.0)
    );
}

#[test]
fn test_closure_captures_defining_scope() {
    assert_eq!(
        eval(
            r#"
            function counter() {
                var n = 0;
                return function () { n += 1; return n; };
            }
            var c = counter();
            c();
            c();
            c()
        "#
        ),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_closures_do_not_share_scopes() {
    assert_eq!(
        eval(
            r#"
            function counter() {
                var n = 0;
                return function () { n += 1; return n; };
            }
            var a = counter();
            var b = counter();
            a();
            a();
            b()
        "#
        ),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_parameters_shadow_outer_bindings() {
    assert_eq!(
        eval(
            r#"
            var x = 'outer';
            function f(x) { return x; }
            f('inner') + ':' + x
        "#
        ),
        JsValue::from("inner:outer")
    );
}

#[test]
fn test_inner_function_reads_outer_variables() {
    assert_eq!(
        eval(
            r#"
            function outer() {
                var base = 10;
                function inner(n) { return base + n; }
                return inner(5);
            }
            outer()
        "#
        ),
        JsValue::Number(15.0)
    );
}

#[test]
fn test_function_as_value() {
    assert_eq!(
        eval(
            r#"
            function apply(f, x) { return f(x); }
            function inc(n) { return n + 1; }
            apply(inc, 41)
        "#
        ),
        JsValue::Number(42.0)
    );
}

#[test]
fn test_function_stored_in_object() {
    assert_eq!(
        eval(
            r#"
            var ops = { inc: function (n) { return n + 1; } };
            ops.inc(41)
        "#
        ),
        JsValue::Number(42.0)
    );
}

#[test]
fn test_assignment_writes_through_to_declaring_scope() {
    assert_eq!(
        eval(
            r#"
            var n = 1;
            function bump() { n = n + 1; }
            bump();
            bump();
            n
        "#
        ),
        JsValue::Number(3.0)
    );
}
