// Parser robustness tests
//
// Every case is parsed statement by statement without executing anything,
// so scripts may mention variables and functions that do not exist.

use std::panic;

use ejs::error::ScriptError;
use ejs::parser::Parser;

struct Case {
    name: &'static str,
    input: String,
    expect: Expect,
}

enum Expect {
    Parses,
    Fails(Option<&'static str>),
}

fn parses(name: &'static str, input: impl Into<String>) -> Case {
    Case { name, input: input.into(), expect: Expect::Parses }
}

fn fails(name: &'static str, input: impl Into<String>) -> Case {
    Case { name, input: input.into(), expect: Expect::Fails(None) }
}

fn fails_with(name: &'static str, input: impl Into<String>, message: &'static str) -> Case {
    Case { name, input: input.into(), expect: Expect::Fails(Some(message)) }
}

/// `open` repeated `depth` times, then `inner`, then `close` repeated.
fn nest(open: &str, inner: &str, close: &str, depth: usize) -> String {
    format!("{}{}{}", open.repeat(depth), inner, close.repeat(depth))
}

/// Parses every top-level statement and returns how many there were.
fn parse_input(input: &str) -> Result<usize, ScriptError> {
    let mut parser = Parser::new(input);
    let mut count = 0;
    while parser.parse_statement()?.is_some() {
        count += 1;
    }
    Ok(count)
}

fn check(case: &Case) -> Result<(), String> {
    let parsed = panic::catch_unwind(|| parse_input(&case.input))
        .map_err(|_| "parser panicked".to_string())?;

    match (parsed, &case.expect) {
        (Ok(_), Expect::Parses) => Ok(()),
        (Ok(count), Expect::Fails(_)) => Err(format!("parsed {} statement(s), expected an error", count)),
        (Err(error), Expect::Parses) => Err(format!("unexpected error: {}", error.message)),
        (Err(error), Expect::Fails(Some(expected))) if !error.message.contains(expected) => {
            Err(format!("error '{}' does not mention '{}'", error.message, expected))
        }
        (Err(_), Expect::Fails(_)) => Ok(()),
    }
}

fn malformed_expressions_cases() -> Vec<Case> {
    vec![
        fails_with(
            "unmatched_opening_paren",
            "(1 + 2",
            "Expected ')' after expression",
        ),
        fails_with(
            "unmatched_opening_paren_nested",
            "((1 + 2)",
            "Expected ')' after expression",
        ),
        fails_with(
            "unmatched_closing_paren",
            "1 + 2)",
            "Expected ';' or newline after expression",
        ),
        fails_with(
            "closing_paren_at_statement_start",
            ")",
            "Expected expression, found ')'",
        ),
        fails_with(
            "empty_parentheses_in_expression",
            "1 + ()",
            "Expected expression, found ')'",
        ),
        fails_with(
            "unmatched_opening_brace",
            "{ x = 1",
            "Expected '}' after block",
        ),
        fails_with(
            "unmatched_closing_brace",
            "x = 1 }",
            "Syntax error",
        ),
    ]
}

fn edge_cases() -> Vec<Case> {
    vec![
        parses("empty_input", ""),
        parses("only_whitespace", "   \n\t  "),
        parses("only_semicolons", ";;;"),
        parses("only_comments", "// one\n/* two */"),

        fails("unexpected_eof_after_operator", "1 +"),
        fails("unexpected_eof_in_expression", "1 + ("),

        parses("nested_parens", nest("(", "1", ")", 50)),
        parses("nested_blocks", nest("{", "x", "}", 50)),
        parses("nested_ifs", nest("if (1) ", "x", "", 40)),
        fails_with("parens_too_deep", nest("(", "1", ")", 10_000), "Nesting too deep"),
        fails_with("blocks_too_deep", nest("{", "x", "}", 10_000), "Nesting too deep"),
        fails_with("ifs_too_deep", nest("if (1) ", "x", "", 10_000), "Nesting too deep"),
        fails_with("calls_too_deep", nest("f(", "1", ")", 10_000), "Nesting too deep"),
        parses("long_flat_chain", nest("", "1", " + 1", 10_000)),

        // Tokens no statement can start with are left in place until the
        // parser gives up on them.
        fails_with("stray_comma", ", x", "Syntax error"),
        fails_with("stray_else", "else 1", "Syntax error"),
        fails_with("comma_in_block", "{ , }", "Syntax error"),
    ]
}

fn operator_cases() -> Vec<Case> {
    vec![
        // A leading operator has an empty left operand.
        parses("leading_minus", "-5"),
        parses("leading_not", "!x"),
        parses("leading_plus", "+ 1"),

        fails_with(
            "missing_right_operand",
            "1 +",
            "Expected expression after '+'",
        ),
        fails("missing_both_operands", "+"),
        fails("operator_after_operator", "1 + * 2"),

        parses("postfix_increment", "x++"),
        parses("binary_increment_without_operand", "5 ++"),
        parses("binary_increment_with_operand", "1 ++ 2"),
        parses("binary_decrement", "1 -- 2"),

        parses("comparison_equal", "1 == 2"),
        parses("comparison_not_equal", "1 != 2"),
        parses("comparison_less_equal", "1 <= 2"),
        parses("shifts", "1 << 2 >> 1"),

        parses("logical_chain", "x && y || z"),
        fails_with(
            "logical_missing_right",
            "x &&",
            "Expected expression after '&&'",
        ),
        fails_with("single_pipe", "a | b", "Expected '||'"),
        fails_with("single_ampersand", "a & b", "Expected '&&'"),
    ]
}

fn control_flow_cases() -> Vec<Case> {
    vec![
        parses("valid_if", "if (1) { x = 1 }"),
        parses("if_else", "if (x) y; else z"),
        parses("else_after_blank_lines", "if (x) {\n}\n\nelse {\n}"),
        parses("else_if_chain", "if (a) 1; else if (b) 2; else 3"),
        fails_with(
            "if_missing_condition",
            "if { x = 1 }",
            "Expected '(' after 'if'",
        ),
        fails_with(
            "if_missing_body",
            "if (1)",
            "Expected statement, found end of input",
        ),
        fails_with(
            "if_unclosed_condition",
            "if (1 x",
            "Expected ')' after if condition",
        ),
        fails(
            "error_in_else_branch",
            "if (1) 5; else (",
        ),

        parses(
            "valid_for",
            "for (i = 0; i < 10; i++) { print(i) }",
        ),
        parses("for_with_var", "for (var i = 0; i < 3; i++) x"),
        parses("for_all_clauses_empty", "for (;;) {}"),
        fails_with(
            "for_missing_semicolon",
            "for (i = 0 i < 10; i++) {}",
            "Expected ';' after loop initializer",
        ),
        fails_with(
            "for_missing_close",
            "for (;; i++ {}",
            "Expected ')' after for clauses",
        ),

        parses("bare_return", "return"),
        parses("return_value", "return x + 1;"),
        parses("return_in_block", "{ return }"),
        fails("return_two_values", "return 1 2"),
    ]
}

fn literal_cases() -> Vec<Case> {
    vec![
        parses("integer_literal", "42"),
        parses("double_quoted", "\"hello\""),
        parses("single_quoted", "'hello'"),
        parses("escapes", "\"a\\n\\t\\x41\\101\\u0041\""),

        fails_with("decimal_point", "3.14", "Invalid identifier"),
        fails_with("unterminated_string", "\"hello", "Unmatched quote"),
        fails_with(
            "invalid_escape",
            "\"a\\q\"",
            "Invalid escape sequence",
        ),
        fails_with(
            "unterminated_comment",
            "1 /* open",
            "Unterminated comment",
        ),
        fails_with("bad_identifier", "#", "Invalid identifier"),
    ]
}

fn function_call_cases() -> Vec<Case> {
    vec![
        parses("simple_function_call", "foo()"),
        parses("function_call_with_args", "foo(1, 2, 3)"),
        parses("space_before_paren", "foo (1)"),
        parses("nested_calls", "foo(bar(1), baz())"),

        fails_with(
            "missing_closing_paren",
            "foo(1, 2",
            "Expected ')' after arguments",
        ),
        fails("missing_opening_paren", "foo 1, 2)"),
        fails("trailing_comma", "foo(1, 2,)"),
    ]
}

fn declaration_cases() -> Vec<Case> {
    vec![
        parses("simple_assignment", "x = 1"),
        parses("chained_assignment", "x = y = 2"),
        parses("declaration_list", "var x, y = 2, z"),

        fails_with("missing_value", "x =", "Expected expression after 'x ='"),
        fails("invalid_target", "1 = x"),
        fails_with("var_without_name", "var 1", "Expected variable name"),
        fails("var_at_end", "var"),
    ]
}

fn positive_cases() -> Vec<Case> {
    vec![
        parses("simple_arithmetic", "1 + 2 * 3"),
        parses("parentheses", "(1 + 2) * 3"),
        parses(
            "complex_expression",
            "x = (1 + 2) * 3 + foo(4, 5)",
        ),
        parses("string_concatenation", "\"hello\" + \" world\""),
        parses("newline_terminated", "x = 1\ny = 2\n"),
        parses("keyword_as_value", "x = if"),
    ]
}

#[test]
fn comprehensive_parser_tests() {
    let cases = [
        malformed_expressions_cases(),
        edge_cases(),
        operator_cases(),
        control_flow_cases(),
        literal_cases(),
        function_call_cases(),
        declaration_cases(),
        positive_cases(),
    ];

    let failures: Vec<String> = cases
        .iter()
        .flatten()
        .filter_map(|case| check(case).err().map(|why| format!("{}: {}", case.name, why)))
        .collect();

    assert!(failures.is_empty(), "parser cases failed:\n{}", failures.join("\n"));
}

#[test]
fn statements_are_counted_one_at_a_time() {
    assert_eq!(parse_input("a; b\nc").ok(), Some(3));
    assert_eq!(parse_input("if (1) a; else b").ok(), Some(1));
    assert_eq!(parse_input("if (1) a\n2").ok(), Some(2));
}
