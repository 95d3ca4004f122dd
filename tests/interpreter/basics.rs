//! Basic evaluation: literals, variables, operators, coercions

use super::eval;
use jsrun::JsValue;

// -----------------------------------------------------------------------------
// Literals
// -----------------------------------------------------------------------------

#[test]
fn test_number_literal() {
    assert_eq!(eval("42"), JsValue::Number(42.0));
    assert_eq!(eval("1.5"), JsValue::Number(1.5));
    assert_eq!(eval("0x10"), JsValue::Number(16.0));
    assert_eq!(eval("2e3"), JsValue::Number(2000.0));
}

#[test]
fn test_string_literal() {
    assert_eq!(eval(r#""hello""#), JsValue::from("hello"));
    assert_eq!(eval("'single'"), JsValue::from("single"));
    assert_eq!(eval(r#""a\nb""#), JsValue::from("a\nb"));
}

#[test]
fn test_boolean_and_null_literals() {
    assert_eq!(eval("true"), JsValue::Boolean(true));
    assert_eq!(eval("false"), JsValue::Boolean(false));
    assert_eq!(eval("null"), JsValue::Null);
}

#[test]
fn test_global_bindings() {
    assert_eq!(eval("undefined"), JsValue::Undefined);
    assert!(eval("NaN").as_number().is_some_and(f64::is_nan));
    assert_eq!(eval("Infinity"), JsValue::Number(f64::INFINITY));
}

// -----------------------------------------------------------------------------
// Variables
// -----------------------------------------------------------------------------

#[test]
fn test_var_declaration() {
    assert_eq!(eval("var x = 5; x"), JsValue::Number(5.0));
}

#[test]
fn test_var_without_initializer() {
    assert_eq!(eval("var x; x"), JsValue::Undefined);
}

#[test]
fn test_var_multiple_declarators() {
    assert_eq!(eval("var a = 1, b = 2, c; a + b"), JsValue::Number(3.0));
}

#[test]
fn test_assignment_returns_value() {
    assert_eq!(eval("var x; x = 7"), JsValue::Number(7.0));
}

#[test]
fn test_undeclared_variable_reads_undefined() {
    assert_eq!(eval("typeof missing"), JsValue::from("undefined"));
}

#[test]
fn test_assignment_to_undeclared_creates_global() {
    assert_eq!(eval("function f() { g = 9; } f(); g"), JsValue::Number(9.0));
}

#[test]
fn test_self_assignment_is_noop() {
    assert_eq!(eval("var x = 5; x = x; x"), JsValue::Number(5.0));
}

// -----------------------------------------------------------------------------
// Arithmetic
// -----------------------------------------------------------------------------

#[test]
fn test_arithmetic() {
    assert_eq!(eval("2 + 3 * 4"), JsValue::Number(14.0));
    assert_eq!(eval("(2 + 3) * 4"), JsValue::Number(20.0));
    assert_eq!(eval("7 % 4"), JsValue::Number(3.0));
    assert_eq!(eval("10 / 4"), JsValue::Number(2.5));
}

#[test]
fn test_division_by_zero() {
    assert_eq!(eval("1 / 0"), JsValue::Number(f64::INFINITY));
    assert!(eval("0 / 0").as_number().is_some_and(f64::is_nan));
}

#[test]
fn test_expression_spans_lines() {
    assert_eq!(eval("1 +\n2"), JsValue::Number(3.0));
}

#[test]
fn test_string_concatenation() {
    assert_eq!(eval("'a' + 1"), JsValue::from("a1"));
    assert_eq!(eval("1 + 2 + 'x'"), JsValue::from("3x"));
    assert_eq!(eval("'x' + 1 + 2"), JsValue::from("x12"));
}

#[test]
fn test_numeric_coercion_in_subtraction() {
    assert_eq!(eval("'10' - 3"), JsValue::Number(7.0));
    assert_eq!(eval("true + 1"), JsValue::Number(2.0));
    assert_eq!(eval("null + 1"), JsValue::Number(1.0));
}

// -----------------------------------------------------------------------------
// Bitwise and shifts
// -----------------------------------------------------------------------------

#[test]
fn test_bitwise_operators() {
    assert_eq!(eval("12 & 10"), JsValue::Number(8.0));
    assert_eq!(eval("12 | 10"), JsValue::Number(14.0));
    assert_eq!(eval("12 ^ 10"), JsValue::Number(6.0));
    assert_eq!(eval("~5"), JsValue::Number(-6.0));
}

#[test]
fn test_shift_operators() {
    assert_eq!(eval("1 << 4"), JsValue::Number(16.0));
    assert_eq!(eval("-8 >> 1"), JsValue::Number(-4.0));
    assert_eq!(eval("-8 >>> 1"), JsValue::Number(2147483644.0));
    assert_eq!(eval("-1 >>> 0"), JsValue::Number(4294967295.0));
}

// -----------------------------------------------------------------------------
// Comparison and equality
// -----------------------------------------------------------------------------

#[test]
fn test_relational_operators() {
    assert_eq!(eval("1 < 2"), JsValue::Boolean(true));
    assert_eq!(eval("2 <= 2"), JsValue::Boolean(true));
    assert_eq!(eval("3 > 4"), JsValue::Boolean(false));
    assert_eq!(eval("'a' < 'b'"), JsValue::Boolean(true));
}

#[test]
fn test_loose_equality() {
    assert_eq!(eval("1 == '1'"), JsValue::Boolean(true));
    assert_eq!(eval("null == undefined"), JsValue::Boolean(true));
    assert_eq!(eval("0 == false"), JsValue::Boolean(true));
    assert_eq!(eval("NaN == NaN"), JsValue::Boolean(false));
}

#[test]
fn test_strict_equality() {
    assert_eq!(eval("1 === '1'"), JsValue::Boolean(false));
    assert_eq!(eval("null === undefined"), JsValue::Boolean(false));
    assert_eq!(eval("2 === 2"), JsValue::Boolean(true));
    assert_eq!(eval("'a' !== 'b'"), JsValue::Boolean(true));
}

// -----------------------------------------------------------------------------
// Unary operators
// -----------------------------------------------------------------------------

#[test]
fn test_unary_operators() {
    assert_eq!(eval("-5"), JsValue::Number(-5.0));
    assert_eq!(eval("+'3'"), JsValue::Number(3.0));
    assert_eq!(eval("!0"), JsValue::Boolean(true));
    assert_eq!(eval("void 0"), JsValue::Undefined);
}

#[test]
fn test_double_negation_is_to_boolean() {
    assert_eq!(eval("!!''"), JsValue::Boolean(false));
    assert_eq!(eval("!!'x'"), JsValue::Boolean(true));
    assert_eq!(eval("!!0"), JsValue::Boolean(false));
    assert_eq!(eval("!!{}"), JsValue::Boolean(true));
    assert_eq!(eval("!!null"), JsValue::Boolean(false));
}

#[test]
fn test_typeof() {
    assert_eq!(eval("typeof 1"), JsValue::from("number"));
    assert_eq!(eval("typeof 'a'"), JsValue::from("string"));
    assert_eq!(eval("typeof true"), JsValue::from("boolean"));
    assert_eq!(eval("typeof {}"), JsValue::from("object"));
    assert_eq!(eval("typeof null"), JsValue::from("object"));
    assert_eq!(eval("typeof function () {}"), JsValue::from("function"));
}

// -----------------------------------------------------------------------------
// Logical operators
// -----------------------------------------------------------------------------

#[test]
fn test_logical_and_or_values() {
    // && and || yield an operand, not a boolean
    assert_eq!(eval("1 && 2"), JsValue::Number(2.0));
    assert_eq!(eval("0 && 2"), JsValue::Number(0.0));
    assert_eq!(eval("0 || 'fallback'"), JsValue::from("fallback"));
    assert_eq!(eval("'first' || 'second'"), JsValue::from("first"));
}

// -----------------------------------------------------------------------------
// Conditional and sequence expressions
// -----------------------------------------------------------------------------

#[test]
fn test_conditional_expression() {
    assert_eq!(eval("1 < 2 ? 'yes' : 'no'"), JsValue::from("yes"));
    assert_eq!(eval("1 > 2 ? 'yes' : 'no'"), JsValue::from("no"));
}

#[test]
fn test_nested_conditional() {
    assert_eq!(
        eval("var x = 2; x === 1 ? 'one' : x === 2 ? 'two' : 'many'"),
        JsValue::from("two")
    );
}

#[test]
fn test_sequence_expression() {
    assert_eq!(eval("var x = (1, 2, 3); x"), JsValue::Number(3.0));
}

#[test]
fn test_sequence_evaluates_all() {
    assert_eq!(eval("var n = 0; (n = 1, n = n + 1, n * 10)"), JsValue::Number(20.0));
}

// -----------------------------------------------------------------------------
// Compound assignment
// -----------------------------------------------------------------------------

#[test]
fn test_compound_assignment() {
    assert_eq!(eval("var a = 2; a += 3; a"), JsValue::Number(5.0));
    assert_eq!(eval("var a = 9; a -= 4; a"), JsValue::Number(5.0));
    assert_eq!(eval("var a = 3; a *= 4; a"), JsValue::Number(12.0));
    assert_eq!(eval("var a = 12; a /= 4; a"), JsValue::Number(3.0));
}

#[test]
fn test_modulo_assignment() {
    assert_eq!(eval("var a = 7; a %= 4; a"), JsValue::Number(3.0));
    assert_eq!(eval("var a = 7; a %= 4"), JsValue::Number(3.0));
}

#[test]
fn test_bitwise_assignment() {
    assert_eq!(eval("var a = 1; a <<= 4; a"), JsValue::Number(16.0));
    assert_eq!(eval("var a = -8; a >>>= 1; a"), JsValue::Number(2147483644.0));
    assert_eq!(eval("var a = 12; a &= 10; a"), JsValue::Number(8.0));
    assert_eq!(eval("var a = 12; a |= 2; a"), JsValue::Number(14.0));
    assert_eq!(eval("var a = 12; a ^= 10; a"), JsValue::Number(6.0));
}

#[test]
fn test_string_append_assignment() {
    assert_eq!(eval("var s = 'a'; s += 'b'; s += 'c'; s"), JsValue::from("abc"));
}

#[test]
fn test_compound_assignment_result_is_new_value() {
    assert_eq!(eval("var a = 2; a += 3"), JsValue::Number(5.0));
}

// -----------------------------------------------------------------------------
// Update expressions
// -----------------------------------------------------------------------------

#[test]
fn test_prefix_update_returns_new_value() {
    assert_eq!(eval("var x = 5; ++x"), JsValue::Number(6.0));
    assert_eq!(eval("var x = 5; --x; x"), JsValue::Number(4.0));
}

#[test]
fn test_postfix_update_returns_old_value() {
    assert_eq!(eval("var x = 5; x++"), JsValue::Number(5.0));
    assert_eq!(eval("var x = 5; x++; x"), JsValue::Number(6.0));
}

#[test]
fn test_update_coerces_to_number() {
    assert_eq!(eval("var x = '5'; ++x"), JsValue::Number(6.0));
}

// -----------------------------------------------------------------------------
// Strings
// -----------------------------------------------------------------------------

#[test]
fn test_string_length() {
    assert_eq!(eval("'hello'.length"), JsValue::Number(5.0));
    assert_eq!(eval("''.length"), JsValue::Number(0.0));
}
