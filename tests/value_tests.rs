use ejs::value::{self, evaluate, evaluate_condition, Operator, OperatorError};

fn num(operator: Operator, lhs: &str, rhs: &str) -> String {
    evaluate(operator, lhs, rhs).expect("operator failed")
}

#[test]
fn integer_arithmetic() {
    assert_eq!(num(Operator::Plus, "2", "3"), "5");
    assert_eq!(num(Operator::Minus, "3", "5"), "-2");
    assert_eq!(num(Operator::Multiply, "6", "7"), "42");
    assert_eq!(num(Operator::Divide, "7", "2"), "3");
    assert_eq!(num(Operator::Modulo, "7", "4"), "3");
    assert_eq!(num(Operator::LeftShift, "1", "4"), "16");
    assert_eq!(num(Operator::RightShift, "16", "2"), "4");
    assert_eq!(num(Operator::Plus, "007", "1"), "8");
}

#[test]
fn division_by_zero_yields_zero() {
    assert_eq!(num(Operator::Divide, "7", "0"), "0");
    assert_eq!(num(Operator::Modulo, "7", "0"), "0");
}

#[test]
fn comparisons_yield_flags() {
    assert_eq!(num(Operator::Equal, "10", "010"), "1");
    assert_eq!(num(Operator::NotEqual, "1", "2"), "1");
    assert_eq!(num(Operator::Less, "9", "10"), "1");
    assert_eq!(num(Operator::LessEqual, "10", "10"), "1");
    assert_eq!(num(Operator::Greater, "9", "10"), "0");
    assert_eq!(num(Operator::GreaterEqual, "9", "10"), "0");
}

#[test]
fn step_and_not_ignore_one_operand() {
    assert_eq!(num(Operator::Increment, "5", "100"), "6");
    assert_eq!(num(Operator::Decrement, "5", ""), "4");
    assert_eq!(num(Operator::Not, "", "0"), "1");
    assert_eq!(num(Operator::Not, "99", "3"), "0");
}

#[test]
fn empty_strings_count_as_numbers() {
    assert!(value::is_numeric(""));
    assert_eq!(num(Operator::Plus, "", ""), "0");
    assert_eq!(num(Operator::Minus, "", "5"), "-5");
}

#[test]
fn overflow_wraps() {
    assert_eq!(
        num(Operator::Plus, "9223372036854775807", "1"),
        "-9223372036854775808"
    );
}

#[test]
fn string_operands() {
    assert_eq!(num(Operator::Plus, "ab", "c"), "abc");
    assert_eq!(num(Operator::Plus, "-2", "1"), "-21");
    assert_eq!(num(Operator::Less, "abc", "abd"), "1");
    assert_eq!(num(Operator::Greater, "b", "a"), "1");
    // Ordinal, not numeric: "10" sorts before "9" once one side is text.
    assert_eq!(num(Operator::Less, "10x", "9"), "1");
    assert_eq!(num(Operator::Equal, "a", "a"), "1");
    assert_eq!(num(Operator::NotEqual, "a", "a"), "0");
}

#[test]
fn string_operands_reject_arithmetic() {
    assert_eq!(
        evaluate(Operator::Minus, "a", "1"),
        Err(OperatorError::NonNumeric(Operator::Minus))
    );
    assert_eq!(
        evaluate(Operator::Minus, "a", "1").unwrap_err().to_string(),
        "Bad operator '-' for non-numeric operands"
    );
    assert_eq!(
        evaluate(Operator::And, "1", "1"),
        Err(OperatorError::Unsupported(Operator::And))
    );
}

#[test]
fn conditions() {
    assert_eq!(evaluate_condition(Operator::And, "1", "0"), Ok("0".to_string()));
    assert_eq!(evaluate_condition(Operator::And, "2", "3"), Ok("1".to_string()));
    assert_eq!(evaluate_condition(Operator::Or, "0", "7"), Ok("1".to_string()));
    assert_eq!(evaluate_condition(Operator::Or, "0", "0"), Ok("0".to_string()));
}

#[test]
fn conditions_require_digit_strings() {
    assert_eq!(
        evaluate_condition(Operator::And, "", "1"),
        Err(OperatorError::NonNumericCondition(String::new()))
    );
    assert_eq!(
        evaluate_condition(Operator::Or, "1", "yes").unwrap_err().to_string(),
        "Conditional must be numeric, got 'yes'"
    );
}

#[test]
fn branch_and_loop_tests_look_at_first_character() {
    assert!(value::selects_then("1"));
    assert!(value::selects_then("10"));
    assert!(!value::selects_then("2"));
    assert!(!value::selects_then(""));

    assert!(value::continues_loop(""));
    assert!(value::continues_loop("2"));
    assert!(!value::continues_loop("0"));
    assert!(!value::continues_loop("05"));
}

#[test]
fn operator_symbols() {
    assert_eq!(Operator::LeftShift.to_string(), "<<");
    assert!(Operator::Increment.is_step());
    assert!(Operator::Or.is_logical());
    assert!(!Operator::Plus.is_logical());
}
