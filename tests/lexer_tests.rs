use ejs::lexer::{LexContext, Lexer, TokenType};
use ejs::value::Operator;

fn types(script: &str, context: LexContext) -> Vec<TokenType> {
    let mut lexer = Lexer::new(script);
    let mut types = Vec::new();
    loop {
        let token = lexer.next_token(context).expect("lexing failed");
        types.push(token.token_type);
        if token.token_type == TokenType::Eof {
            return types;
        }
    }
}

fn first_literal(script: &str) -> String {
    let mut lexer = Lexer::new(script);
    let token = lexer.next_token(LexContext::Expression).expect("lexing failed");
    assert_eq!(token.token_type, TokenType::Literal);
    token.lexeme
}

fn lex_error(script: &str) -> String {
    let mut lexer = Lexer::new(script);
    loop {
        match lexer.next_token(LexContext::Expression) {
            Ok(token) if token.token_type == TokenType::Eof => panic!("expected a lexical error"),
            Ok(_) => continue,
            Err(error) => return error.message,
        }
    }
}

#[test]
fn operators_and_punctuation() {
    use TokenType::*;

    assert_eq!(
        types("( ) { } , ; = == != <= >= << >> < > ! + - * / %", LexContext::Expression),
        vec![
            LeftParen,
            RightParen,
            LeftBrace,
            RightBrace,
            Comma,
            Semicolon,
            Assign,
            Expr(Operator::Equal),
            Expr(Operator::NotEqual),
            Expr(Operator::LessEqual),
            Expr(Operator::GreaterEqual),
            Expr(Operator::LeftShift),
            Expr(Operator::RightShift),
            Expr(Operator::Less),
            Expr(Operator::Greater),
            Expr(Operator::Not),
            Expr(Operator::Plus),
            Expr(Operator::Minus),
            Expr(Operator::Multiply),
            Expr(Operator::Divide),
            Expr(Operator::Modulo),
            Eof,
        ]
    );
    assert_eq!(
        types("++ -- && ||", LexContext::Expression),
        vec![
            IncDec(Operator::Increment),
            IncDec(Operator::Decrement),
            Logical(Operator::And),
            Logical(Operator::Or),
            Eof,
        ]
    );
}

#[test]
fn operator_at_end_of_input() {
    assert_eq!(
        types("<", LexContext::Expression),
        vec![TokenType::Expr(Operator::Less), TokenType::Eof]
    );
}

#[test]
fn keywords_only_at_statement_start() {
    use TokenType::*;

    assert_eq!(
        types("if else var for return", LexContext::Statement),
        vec![If, Else, Var, For, Return, Eof]
    );
    assert_eq!(
        types("if else var for return", LexContext::Expression),
        vec![Identifier, Identifier, Identifier, Identifier, Identifier, Eof]
    );
}

#[test]
fn name_followed_by_paren_is_a_call() {
    use TokenType::*;

    assert_eq!(
        types("foo(1) bar (2) baz", LexContext::Expression),
        vec![
            FunctionCall,
            LeftParen,
            Literal,
            RightParen,
            FunctionCall,
            LeftParen,
            Literal,
            RightParen,
            Identifier,
            Eof,
        ]
    );
    // The probe does not look past a line break.
    assert_eq!(
        types("foo\n(1)", LexContext::Expression),
        vec![Identifier, Newline, LeftParen, Literal, RightParen, Eof]
    );
}

#[test]
fn identifiers_allow_dollar_and_underscore() {
    let mut lexer = Lexer::new("$a_1 _b");
    let first = lexer.next_token(LexContext::Expression).unwrap();
    let second = lexer.next_token(LexContext::Expression).unwrap();
    assert_eq!(first.lexeme, "$a_1");
    assert_eq!(second.lexeme, "_b");
}

#[test]
fn string_escapes() {
    assert_eq!(first_literal("\"a\\tb\""), "a\tb");
    assert_eq!(first_literal("'\\x41\\101\\u0041'"), "AAA");
    assert_eq!(first_literal("\"\\n\\r\\b\\f\""), "\n\r\u{8}\u{c}");
    assert_eq!(first_literal("\"it's \\\"quoted\\\" \\\\\""), "it's \"quoted\" \\");
    assert_eq!(first_literal("'say \"hi\"'"), "say \"hi\"");
}

#[test]
fn numbers_are_digit_runs() {
    let mut lexer = Lexer::new("0123+4");
    assert_eq!(lexer.next_token(LexContext::Expression).unwrap().lexeme, "0123");
    assert_eq!(
        lexer.next_token(LexContext::Expression).unwrap().token_type,
        TokenType::Expr(Operator::Plus)
    );
    assert_eq!(lexer.next_token(LexContext::Expression).unwrap().lexeme, "4");
}

#[test]
fn comments_are_skipped() {
    use TokenType::*;

    assert_eq!(
        types("1 // to end of line\n2", LexContext::Expression),
        vec![Literal, Newline, Literal, Eof]
    );
    assert_eq!(
        types("/* a\n b **/ 3", LexContext::Expression),
        vec![Literal, Eof]
    );
}

#[test]
fn lexical_errors() {
    assert_eq!(lex_error("\"open"), "Unmatched quote");
    assert_eq!(lex_error("/* open"), "Unterminated comment");
    assert_eq!(lex_error("a | b"), "Expected '||'");
    assert_eq!(lex_error("a & b"), "Expected '&&'");
    assert_eq!(lex_error("#"), "Invalid identifier #");
    assert!(lex_error("'\\q'").starts_with("Invalid escape sequence"));
}

#[test]
fn tokens_carry_their_line() {
    let mut lexer = Lexer::new("a\n\nb");
    assert_eq!(lexer.next_token(LexContext::Expression).unwrap().span.line, 1);
    assert_eq!(lexer.next_token(LexContext::Expression).unwrap().token_type, TokenType::Newline);
    assert_eq!(lexer.next_token(LexContext::Expression).unwrap().token_type, TokenType::Newline);
    let b = lexer.next_token(LexContext::Expression).unwrap();
    assert_eq!((b.lexeme.as_str(), b.span.line), ("b", 3));
    assert_eq!(lexer.line_number(), 3);
}

#[test]
fn restore_replays_the_same_tokens() {
    let mut lexer = Lexer::new("a + b\nc");
    lexer.next_token(LexContext::Expression).unwrap();
    let checkpoint = lexer.save();

    let first: Vec<_> = (0..4)
        .map(|_| lexer.next_token(LexContext::Expression).unwrap())
        .collect();
    assert_eq!(lexer.line_number(), 2);

    lexer.restore(&checkpoint);
    assert_eq!(lexer.line_number(), 1);
    let second: Vec<_> = (0..4)
        .map(|_| lexer.next_token(LexContext::Expression).unwrap())
        .collect();

    assert_eq!(first, second);
}

#[test]
fn save_keeps_the_pushed_back_token() {
    let mut lexer = Lexer::new("x y");
    let x = lexer.next_token(LexContext::Expression).unwrap();
    lexer.push_back(x.clone());
    let checkpoint = lexer.save();

    assert_eq!(lexer.next_token(LexContext::Expression).unwrap(), x);
    assert_eq!(lexer.next_token(LexContext::Expression).unwrap().lexeme, "y");

    lexer.restore(&checkpoint);
    assert_eq!(lexer.position(), x.span.start);
    assert_eq!(lexer.next_token(LexContext::Expression).unwrap(), x);
    assert_eq!(lexer.next_token(LexContext::Expression).unwrap().lexeme, "y");
}
