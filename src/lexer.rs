use crate::error::{ScriptError, Span};
use crate::source::{CharSource, Cursor};
use crate::value::Operator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    // Punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Semicolon,
    Newline,

    // Operators
    Assign,
    Expr(Operator),
    IncDec(Operator),
    Logical(Operator),

    // Names and values
    Identifier,
    /// An identifier followed by `(`.
    FunctionCall,
    Literal,

    // Keywords, only produced in statement context
    If,
    Else,
    Var,
    For,
    Return,

    Eof,
}

/// Where the parser is when it asks for a token. Keywords are recognized
/// only at the start of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexContext {
    Statement,
    Expression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token_type: TokenType,
    /// Source text, or the decoded value for string literals.
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, span: Span) -> Self {
        Self {
            token_type,
            lexeme,
            span,
        }
    }

    pub fn describe(&self) -> String {
        match self.token_type {
            TokenType::Eof => "end of input".to_string(),
            TokenType::Newline => "newline".to_string(),
            _ => format!("'{}'", self.lexeme),
        }
    }
}

/// Snapshot of the lexer's input position and pending token.
///
/// Restoring a snapshot makes the lexer produce the same tokens again,
/// so a span of source can be re-read any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputContext {
    cursor: Cursor,
    pending: Option<Token>,
}

impl InputContext {
    pub fn line_number(&self) -> usize {
        self.cursor.line_number
    }
}

pub struct Lexer {
    source: CharSource,
    pending: Option<Token>,
    start: usize,
    line: usize,
}

impl Lexer {
    pub fn new(script: &str) -> Self {
        Self {
            source: CharSource::new(script),
            pending: None,
            start: 0,
            line: 1,
        }
    }

    /// Produces the next token, or the pushed back one if there is one.
    pub fn next_token(&mut self, context: LexContext) -> Result<Token, ScriptError> {
        if let Some(token) = self.pending.take() {
            return Ok(token);
        }

        loop {
            self.start = self.source.position();
            self.line = self.source.line_number();

            let c = match self.source.next_char() {
                Some(c) => c,
                None => return Ok(self.token(TokenType::Eof)),
            };

            let token_type = match c {
                ' ' | '\t' | '\r' => continue,
                '\n' => TokenType::Newline,
                '(' => TokenType::LeftParen,
                ')' => TokenType::RightParen,
                '{' => TokenType::LeftBrace,
                '}' => TokenType::RightBrace,
                ';' => TokenType::Semicolon,
                ',' => TokenType::Comma,
                '+' => {
                    if self.match_char('+') {
                        TokenType::IncDec(Operator::Increment)
                    } else {
                        TokenType::Expr(Operator::Plus)
                    }
                }
                '-' => {
                    if self.match_char('-') {
                        TokenType::IncDec(Operator::Decrement)
                    } else {
                        TokenType::Expr(Operator::Minus)
                    }
                }
                '*' => TokenType::Expr(Operator::Multiply),
                '%' => TokenType::Expr(Operator::Modulo),
                '/' => {
                    if self.match_char('/') {
                        self.line_comment();
                        continue;
                    } else if self.match_char('*') {
                        self.block_comment()?;
                        continue;
                    }
                    TokenType::Expr(Operator::Divide)
                }
                '<' => {
                    if self.match_char('<') {
                        TokenType::Expr(Operator::LeftShift)
                    } else if self.match_char('=') {
                        TokenType::Expr(Operator::LessEqual)
                    } else {
                        TokenType::Expr(Operator::Less)
                    }
                }
                '>' => {
                    if self.match_char('>') {
                        TokenType::Expr(Operator::RightShift)
                    } else if self.match_char('=') {
                        TokenType::Expr(Operator::GreaterEqual)
                    } else {
                        TokenType::Expr(Operator::Greater)
                    }
                }
                '=' => {
                    if self.match_char('=') {
                        TokenType::Expr(Operator::Equal)
                    } else {
                        TokenType::Assign
                    }
                }
                '!' => {
                    if self.match_char('=') {
                        TokenType::Expr(Operator::NotEqual)
                    } else {
                        TokenType::Expr(Operator::Not)
                    }
                }
                '|' => {
                    if !self.match_char('|') {
                        return Err(self.error("Expected '||'".to_string()));
                    }
                    TokenType::Logical(Operator::Or)
                }
                '&' => {
                    if !self.match_char('&') {
                        return Err(self.error("Expected '&&'".to_string()));
                    }
                    TokenType::Logical(Operator::And)
                }
                '"' | '\'' => return self.string(c),
                c if c.is_ascii_digit() => return Ok(self.number()),
                c => return self.identifier(c, context),
            };

            return Ok(self.token(token_type));
        }
    }

    /// Defers `token` to the next `next_token` call, replacing any token
    /// already pushed back.
    pub fn push_back(&mut self, token: Token) {
        self.pending = Some(token);
    }

    pub fn save(&self) -> InputContext {
        InputContext {
            cursor: self.source.cursor(),
            pending: self.pending.clone(),
        }
    }

    pub fn restore(&mut self, context: &InputContext) {
        self.source.set_cursor(context.cursor);
        self.pending = context.pending.clone();
    }

    /// Where the next token starts, counting a pushed back token.
    pub fn position(&self) -> usize {
        match self.pending {
            Some(ref token) => token.span.start,
            None => self.source.position(),
        }
    }

    pub fn line_number(&self) -> usize {
        match self.pending {
            Some(ref token) => token.span.line,
            None => self.source.line_number(),
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        match self.source.next_char() {
            Some(c) if c == expected => true,
            Some(c) => {
                self.source.put_back(c);
                false
            }
            None => false,
        }
    }

    fn line_comment(&mut self) {
        while let Some(c) = self.source.next_char() {
            if c == '\n' {
                self.source.put_back(c);
                break;
            }
        }
    }

    fn block_comment(&mut self) -> Result<(), ScriptError> {
        loop {
            match self.source.next_char() {
                None => {
                    return Err(ScriptError::lex_error(
                        Span::new(self.start, self.source.position(), self.line),
                        "Unterminated comment".to_string(),
                    ));
                }
                Some('*') => {
                    if self.match_char('/') {
                        return Ok(());
                    }
                }
                Some(_) => {}
            }
        }
    }

    fn string(&mut self, quote: char) -> Result<Token, ScriptError> {
        let mut value = String::new();

        loop {
            let c = self.string_char()?;
            if c == quote {
                break;
            }
            if c != '\\' {
                value.push(c);
                continue;
            }

            let escape = self.string_char()?;
            let code = match escape {
                d if d.is_ascii_digit() => {
                    self.source.put_back(d);
                    self.char_convert(8, 3)
                }
                'n' => '\n' as u32,
                'b' => '\u{8}' as u32,
                'f' => '\u{c}' as u32,
                'r' => '\r' as u32,
                't' => '\t' as u32,
                'x' => self.char_convert(16, 2),
                'u' => {
                    let high = self.char_convert(16, 2);
                    let low = self.char_convert(16, 2);
                    high * 256 + low
                }
                '\'' | '"' | '\\' => escape as u32,
                _ => {
                    return Err(ScriptError::lex_error(
                        Span::new(self.source.position() - 2, self.source.position(), self.line),
                        format!("Invalid escape sequence '\\{}'", escape),
                    ));
                }
            };

            match char::from_u32(code) {
                Some(ch) => value.push(ch),
                None => {
                    return Err(ScriptError::lex_error(
                        Span::new(self.start, self.source.position(), self.line),
                        format!("Invalid escape sequence: code point {:#x}", code),
                    ));
                }
            }
        }

        Ok(Token::new(TokenType::Literal, value, self.span()))
    }

    fn string_char(&mut self) -> Result<char, ScriptError> {
        self.source.next_char().ok_or_else(|| {
            ScriptError::lex_error(
                Span::new(self.start, self.source.position(), self.line),
                "Unmatched quote".to_string(),
            )
        })
    }

    /// Reads up to `max_digits` digits in `base`. A character that is not a
    /// digit of the base ends the run and is left unread.
    fn char_convert(&mut self, base: u32, max_digits: usize) -> u32 {
        let mut value = 0;
        for _ in 0..max_digits {
            let c = match self.source.next_char() {
                Some(c) => c,
                None => break,
            };
            match c.to_digit(16).filter(|&d| d < base) {
                Some(digit) => value = value * base + digit,
                None => {
                    self.source.put_back(c);
                    break;
                }
            }
        }
        value
    }

    fn number(&mut self) -> Token {
        while let Some(c) = self.source.next_char() {
            if !c.is_ascii_digit() {
                self.source.put_back(c);
                break;
            }
        }
        self.token(TokenType::Literal)
    }

    fn identifier(&mut self, first: char, context: LexContext) -> Result<Token, ScriptError> {
        let mut name = String::new();
        if first != '\\' {
            name.push(first);
        }

        while let Some(c) = self.source.next_char() {
            if c == '\\' {
                continue;
            }
            if c.is_ascii_alphanumeric() || c == '$' || c == '_' {
                name.push(c);
            } else {
                self.source.put_back(c);
                break;
            }
        }

        let valid = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '$' || c == '_');
        if !valid {
            return Err(ScriptError::lex_error(
                self.span(),
                format!("Invalid identifier {}", name),
            ));
        }

        let span = self.span();
        if context == LexContext::Statement {
            let keyword = match name.as_str() {
                "if" => Some(TokenType::If),
                "else" => Some(TokenType::Else),
                "var" => Some(TokenType::Var),
                "for" => Some(TokenType::For),
                "return" => Some(TokenType::Return),
                _ => None,
            };
            if let Some(token_type) = keyword {
                return Ok(Token::new(token_type, name, span));
            }
        }

        // Whitespace between a name and '(' is consumed for good.
        while let Some(c) = self.source.peek() {
            if c != ' ' && c != '\t' && c != '\r' {
                break;
            }
            self.source.next_char();
        }

        let token_type = if self.source.peek() == Some('(') {
            TokenType::FunctionCall
        } else {
            TokenType::Identifier
        };
        Ok(Token::new(token_type, name, span))
    }

    fn span(&self) -> Span {
        Span::new(self.start, self.source.position(), self.line)
    }

    fn token(&self, token_type: TokenType) -> Token {
        let lexeme = self.source.slice(self.start, self.source.position());
        Token::new(token_type, lexeme, self.span())
    }

    fn error(&self, message: String) -> ScriptError {
        ScriptError::lex_error(self.span(), message)
    }
}
