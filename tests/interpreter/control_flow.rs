//! Control flow: if/else, loops, break/continue, labels, try/catch/finally

use super::{eval, eval_result};
use jsrun::JsValue;

// -----------------------------------------------------------------------------
// If/Else
// -----------------------------------------------------------------------------

#[test]
fn test_if_true_branch() {
    assert_eq!(
        eval(
            r#"
            var result = 0;
            if (true) {
                result = 1;
            }
            result
        "#
        ),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_if_false_no_else() {
    assert_eq!(
        eval(
            r#"
            var result = 0;
            if (false) {
                result = 1;
            }
            result
        "#
        ),
        JsValue::Number(0.0)
    );
}

#[test]
fn test_if_else_chain() {
    let source = |x: i32| {
        format!(
            r#"
            var x = {};
            var result;
            if (x === 1) {{
                result = "one";
            }} else if (x === 2) {{
                result = "two";
            }} else {{
                result = "other";
            }}
            result
        "#,
            x
        )
    };
    assert_eq!(eval(&source(1)), JsValue::from("one"));
    assert_eq!(eval(&source(2)), JsValue::from("two"));
    assert_eq!(eval(&source(99)), JsValue::from("other"));
}

#[test]
fn test_if_condition_coercion() {
    assert_eq!(eval("var r = 'no'; if ('x') r = 'yes'; r"), JsValue::from("yes"));
    assert_eq!(eval("var r = 'no'; if (0) r = 'yes'; r"), JsValue::from("no"));
}

// -----------------------------------------------------------------------------
// While / do-while
// -----------------------------------------------------------------------------

#[test]
fn test_while_counts_up() {
    assert_eq!(
        eval("var x = 0; while (x < 3) x = x + 1; x"),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_while_false_never_runs_body() {
    assert_eq!(
        eval("var ran = false; while (false) ran = true; ran"),
        JsValue::Boolean(false)
    );
    assert_eq!(eval("while (false) { 1; }"), JsValue::Undefined);
}

#[test]
fn test_while_completion_value_is_last_body_value() {
    assert_eq!(eval("var i = 0; while (i < 3) { i = i + 1; }"), JsValue::Number(3.0));
}

#[test]
fn test_do_while_runs_body_at_least_once() {
    assert_eq!(eval("var j = 10; do j = j + 1; while (false); j"), JsValue::Number(11.0));
}

#[test]
fn test_do_while_loops() {
    assert_eq!(
        eval("var i = 0; do { i = i + 1; } while (i < 3); i"),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_do_while_continue_reaches_test() {
    assert_eq!(
        eval(
            r#"
            var i = 0;
            var n = 0;
            do {
                i = i + 1;
                if (i % 2 === 0) continue;
                n = n + 1;
            } while (i < 6);
            n
        "#
        ),
        JsValue::Number(3.0)
    );
}

// -----------------------------------------------------------------------------
// For
// -----------------------------------------------------------------------------

#[test]
fn test_for_loop() {
    assert_eq!(
        eval("var sum = 0; for (var i = 0; i < 10; i++) { sum += i; } sum"),
        JsValue::Number(45.0)
    );
}

#[test]
fn test_for_loop_without_clauses() {
    assert_eq!(
        eval("var n = 0; for (;;) { n++; if (n === 5) break; } n"),
        JsValue::Number(5.0)
    );
}

#[test]
fn test_for_continue_runs_update() {
    assert_eq!(
        eval(
            r#"
            var odds = '';
            for (var i = 0; i < 6; i++) {
                if (i % 2 === 0) continue;
                odds += '' + i;
            }
            odds
        "#
        ),
        JsValue::from("135")
    );
}

#[test]
fn test_for_with_expression_init() {
    assert_eq!(
        eval("var i; var n = 0; for (i = 3; i > 0; i--) n += i; n"),
        JsValue::Number(6.0)
    );
}

// -----------------------------------------------------------------------------
// Break / continue
// -----------------------------------------------------------------------------

#[test]
fn test_break_exits_loop() {
    assert_eq!(
        eval("var i = 0; while (true) { i = i + 1; if (i === 4) break; } i"),
        JsValue::Number(4.0)
    );
}

#[test]
fn test_continue_skips_rest_of_body() {
    assert_eq!(
        eval(
            r#"
            var i = 0;
            var n = 0;
            while (i < 5) {
                i = i + 1;
                if (i === 3) continue;
                n = n + 1;
            }
            n
        "#
        ),
        JsValue::Number(4.0)
    );
}

#[test]
fn test_unlabelled_break_stops_innermost_loop_only() {
    assert_eq!(
        eval(
            r#"
            var log = '';
            for (var i = 0; i < 3; i++) {
                for (var j = 0; j < 3; j++) {
                    if (j === 1) break;
                    log += '' + i + j;
                }
            }
            log
        "#
        ),
        JsValue::from("001020")
    );
}

// -----------------------------------------------------------------------------
// Labels
// -----------------------------------------------------------------------------

#[test]
fn test_labelled_break_exits_outer_loop() {
    assert_eq!(
        eval(
            r#"
            var n = 0;
            outer: while (true) {
                while (true) {
                    n = n + 1;
                    break outer;
                }
                n = 99;
            }
            n
        "#
        ),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_labelled_continue_resumes_outer_loop() {
    assert_eq!(
        eval(
            r#"
            var log = '';
            outer: for (var i = 0; i < 3; i++) {
                for (var j = 0; j < 3; j++) {
                    if (j === 1) continue outer;
                    log += '' + i + j;
                }
            }
            log
        "#
        ),
        JsValue::from("001020")
    );
}

#[test]
fn test_labelled_block_break() {
    assert_eq!(
        eval(
            r#"
            var r = 'before';
            done: {
                r = 'inside';
                break done;
                r = 'after';
            }
            r
        "#
        ),
        JsValue::from("inside")
    );
}

#[test]
fn test_doubly_labelled_loop() {
    assert_eq!(
        eval(
            r#"
            var n = 0;
            a: b: while (true) {
                n = n + 1;
                if (n === 2) break a;
            }
            n
        "#
        ),
        JsValue::Number(2.0)
    );
}

// -----------------------------------------------------------------------------
// Throw / try / catch / finally
// -----------------------------------------------------------------------------

#[test]
fn test_catch_binds_thrown_value() {
    assert_eq!(eval("try { throw 7 } catch (e) { e }"), JsValue::Number(7.0));
}

#[test]
fn test_catch_scope_is_fresh() {
    assert_eq!(
        eval(
            r#"
            var e = 'outer';
            try { throw 'inner' } catch (e) {}
            e
        "#
        ),
        JsValue::from("outer")
    );
}

#[test]
fn test_try_without_throw_skips_catch() {
    assert_eq!(
        eval("var r = 'ok'; try { 1; } catch (e) { r = 'caught'; } r"),
        JsValue::from("ok")
    );
}

#[test]
fn test_finalizer_normal_value_is_discarded() {
    assert_eq!(
        eval("try { throw 42 } catch (e) { e + 1 } finally { 99 }"),
        JsValue::Number(43.0)
    );
}

#[test]
fn test_finalizer_throw_supersedes() {
    let err = eval_result("try { throw 1 } catch (e) { throw e + 1 } finally { throw 99 }")
        .err()
        .map(|e| e.to_value());
    assert_eq!(err, Some(JsValue::Number(99.0)));
}

#[test]
fn test_finalizer_runs_without_handler() {
    assert_eq!(
        eval(
            r#"
            var log = '';
            try {
                try { throw 'x' } finally { log += 'f'; }
            } catch (e) {
                log += e;
            }
            log
        "#
        ),
        JsValue::from("fx")
    );
}

#[test]
fn test_rethrow_from_catch_is_not_recaught() {
    assert_eq!(
        eval(
            r#"
            var r = '';
            try {
                try { throw 'a' } catch (e) { throw 'b' }
            } catch (e) {
                r = e;
            }
            r
        "#
        ),
        JsValue::from("b")
    );
}

#[test]
fn test_break_in_labelled_try_finalizer_supersedes_throw() {
    assert_eq!(
        eval(
            r#"
            var r = 'survived';
            foo: try { throw 1 } finally { break foo; }
            r
        "#
        ),
        JsValue::from("survived")
    );
}

#[test]
fn test_return_through_finally() {
    assert_eq!(
        eval(
            r#"
            var log = '';
            function f() {
                try {
                    return 'early';
                } finally {
                    log += 'cleanup';
                }
            }
            f() + ':' + log
        "#
        ),
        JsValue::from("early:cleanup")
    );
}

#[test]
fn test_throw_propagates_through_loops_and_calls() {
    assert_eq!(
        eval(
            r#"
            function boom() { while (true) { throw 'bang'; } }
            var r = '';
            try { boom(); } catch (e) { r = e; }
            r
        "#
        ),
        JsValue::from("bang")
    );
}

#[test]
fn test_nested_try_finally_order() {
    assert_eq!(
        eval(
            r#"
            var log = '';
            try {
                try { log += 'a'; throw 1 } finally { log += 'b'; }
            } catch (e) {
                log += 'c';
            } finally {
                log += 'd';
            }
            log
        "#
        ),
        JsValue::from("abcd")
    );
}

// -----------------------------------------------------------------------------
// Completion values of statements
// -----------------------------------------------------------------------------

#[test]
fn test_empty_block_completes_undefined() {
    assert_eq!(eval("{}"), JsValue::Undefined);
}

#[test]
fn test_block_completion_is_last_statement_value() {
    assert_eq!(eval("{ 1; 2; 3; }"), JsValue::Number(3.0));
}

#[test]
fn test_abrupt_completion_skips_rest_of_block() {
    assert_eq!(
        eval(
            r#"
            var r = 'start';
            while (true) {
                break;
                r = 'unreachable';
            }
            r
        "#
        ),
        JsValue::from("start")
    );
}
