use log::warn;

use crate::ast::{Declarator, Expr, Stmt};
use crate::error::{ScriptError, Span};
use crate::lexer::{LexContext, Lexer, Token, TokenType};
use crate::value::Operator;

/// Statement attempts allowed at one input position before the parser
/// gives up with a syntax error.
pub const MAX_STALLED_ATTEMPTS: u32 = 10;

/// How deeply statements and expressions may nest inside one top-level
/// statement. The evaluator recurses over the same tree, so this bounds it too.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Turns a parser that stops consuming input into a reported error.
#[derive(Debug, Default)]
struct ProgressGuard {
    last_position: Option<usize>,
    attempts: u32,
}

impl ProgressGuard {
    fn check(&mut self, position: usize, line: usize) -> Result<(), ScriptError> {
        if self.last_position == Some(position) {
            self.attempts += 1;
            if self.attempts > MAX_STALLED_ATTEMPTS {
                warn!("parser made no progress at offset {} (line {})", position, line);
                return Err(ScriptError::parse_error_with_help(
                    Span::single(position, line),
                    "Syntax error".to_string(),
                    "This token cannot start a statement here.".to_string(),
                ));
            }
        } else {
            self.last_position = Some(position);
            self.attempts = 0;
        }
        Ok(())
    }
}

pub struct Parser {
    lexer: Lexer,
    guard: ProgressGuard,
    depth: usize,
}

impl Parser {
    pub fn new(script: &str) -> Self {
        Self {
            lexer: Lexer::new(script),
            guard: ProgressGuard::default(),
            depth: 0,
        }
    }

    pub fn line_number(&self) -> usize {
        self.lexer.line_number()
    }

    /// Parses the next top-level statement, or returns `None` at end of input.
    pub fn parse_statement(&mut self) -> Result<Option<Stmt>, ScriptError> {
        let token = self.skip_newlines(LexContext::Statement)?;
        if token.token_type == TokenType::Eof {
            return Ok(None);
        }
        self.lexer.push_back(token);
        self.statement().map(Some)
    }

    fn statement(&mut self) -> Result<Stmt, ScriptError> {
        self.nested(Self::statement_body)
    }

    /// Runs `parse` one nesting level deeper, refusing to go past
    /// [`MAX_NESTING_DEPTH`] so deep scripts fail instead of exhausting the
    /// stack.
    fn nested<T>(&mut self, parse: fn(&mut Self) -> Result<T, ScriptError>) -> Result<T, ScriptError> {
        if self.depth >= MAX_NESTING_DEPTH {
            let position = self.lexer.position();
            warn!("nesting limit reached at offset {}", position);
            return Err(ScriptError::parse_error_with_help(
                Span::single(position, self.lexer.line_number()),
                "Nesting too deep".to_string(),
                format!(
                    "Statements, parentheses and logical operators nest at most {} levels.",
                    MAX_NESTING_DEPTH
                ),
            ));
        }

        self.depth += 1;
        let parsed = parse(self);
        self.depth -= 1;
        parsed
    }

    fn statement_body(&mut self) -> Result<Stmt, ScriptError> {
        self.guard
            .check(self.lexer.position(), self.lexer.line_number())?;

        let token = self.skip_newlines(LexContext::Statement)?;
        match token.token_type {
            TokenType::Semicolon => Ok(Stmt::Empty { span: token.span }),
            TokenType::LeftBrace => self.block(token.span),
            TokenType::If => self.if_statement(token.span),
            TokenType::For => self.for_statement(token.span),
            TokenType::Var => {
                let (declarations, span) = self.declaration_list(token.span)?;
                self.end_of_statement("declaration")?;
                Ok(Stmt::Var { declarations, span })
            }
            TokenType::Return => self.return_statement(token.span),
            // Owned by an enclosing construct: leave it unread.
            TokenType::Comma | TokenType::Else | TokenType::RightBrace => {
                let span = token.span;
                self.lexer.push_back(token);
                Ok(Stmt::Empty { span })
            }
            TokenType::Eof => Err(ScriptError::parse_error_with_help(
                token.span,
                "Expected statement, found end of input".to_string(),
                "A statement is missing after 'if', 'else' or a loop header.".to_string(),
            )),
            TokenType::RightParen => Err(ScriptError::parse_error_with_help(
                token.span,
                "Expected expression, found ')'".to_string(),
                "Found ')' without matching '('. Check for unbalanced parentheses.".to_string(),
            )),
            _ => {
                self.lexer.push_back(token);
                self.expression_statement()
            }
        }
    }

    fn block(&mut self, open: Span) -> Result<Stmt, ScriptError> {
        let mut statements = Vec::new();

        loop {
            let token = self.skip_newlines(LexContext::Statement)?;
            match token.token_type {
                TokenType::RightBrace => {
                    return Ok(Stmt::Block {
                        statements,
                        span: open.to(&token.span),
                    });
                }
                TokenType::Eof => {
                    return Err(ScriptError::parse_error_with_help(
                        token.span,
                        "Expected '}' after block".to_string(),
                        "Block statements must be closed with '}' after the opening '{'.".to_string(),
                    ));
                }
                _ => {
                    self.lexer.push_back(token);
                    statements.push(self.statement()?);
                }
            }
        }
    }

    fn if_statement(&mut self, start: Span) -> Result<Stmt, ScriptError> {
        self.consume_with_help(
            TokenType::LeftParen,
            "Expected '(' after 'if'",
            "If statements require parentheses around the condition: if (condition) statement",
        )?;
        let condition = self.expression()?;
        self.consume_with_help(
            TokenType::RightParen,
            "Expected ')' after if condition",
            "If conditions must be enclosed in parentheses: if (condition) statement",
        )?;

        let then_branch = Box::new(self.statement()?);

        // Look past blank lines for `else`; rewind if there is none so the
        // newlines stay in the input.
        let checkpoint = self.lexer.save();
        let token = self.skip_newlines(LexContext::Statement)?;
        let else_branch = if token.token_type == TokenType::Else {
            Some(Box::new(self.statement()?))
        } else {
            self.lexer.restore(&checkpoint);
            None
        };

        let end = match else_branch {
            Some(ref else_stmt) => *else_stmt.span(),
            None => *then_branch.span(),
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
            span: start.to(&end),
        })
    }

    fn for_statement(&mut self, start: Span) -> Result<Stmt, ScriptError> {
        self.consume(TokenType::LeftParen, "Expected '(' after 'for'")?;

        let token = self.lexer.next_token(LexContext::Statement)?;
        let initializer = match token.token_type {
            TokenType::Semicolon => {
                self.lexer.push_back(token);
                None
            }
            TokenType::Var => {
                let (declarations, span) = self.declaration_list(token.span)?;
                Some(Box::new(Stmt::Var { declarations, span }))
            }
            _ => {
                self.lexer.push_back(token);
                let expr = self.expression()?;
                let span = *expr.span();
                Some(Box::new(Stmt::Expression { expr, span }))
            }
        };
        self.consume(TokenType::Semicolon, "Expected ';' after loop initializer")?;

        let condition = self.optional_expression(TokenType::Semicolon)?;
        self.consume(TokenType::Semicolon, "Expected ';' after loop condition")?;

        let increment = self.optional_expression(TokenType::RightParen)?;
        self.consume(TokenType::RightParen, "Expected ')' after for clauses")?;

        let body = Box::new(self.statement()?);
        let end = *body.span();

        Ok(Stmt::For {
            initializer,
            condition,
            increment,
            body,
            span: start.to(&end),
        })
    }

    /// `name [= expr] (, name [= expr])*`, without the terminator.
    fn declaration_list(&mut self, start: Span) -> Result<(Vec<Declarator>, Span), ScriptError> {
        let mut declarations = Vec::new();
        let mut end = start;

        loop {
            let token = self.lexer.next_token(LexContext::Expression)?;
            if token.token_type != TokenType::Identifier {
                return Err(ScriptError::parse_error_with_help(
                    token.span,
                    format!("Expected variable name, found {}", token.describe()),
                    "Declarations look like: var x, y = 1".to_string(),
                ));
            }

            let next = self.lexer.next_token(LexContext::Expression)?;
            let initializer = if next.token_type == TokenType::Assign {
                Some(self.expression()?)
            } else {
                self.lexer.push_back(next);
                None
            };

            end = initializer.as_ref().map_or(token.span, |expr| *expr.span());
            declarations.push(Declarator {
                name: token.lexeme,
                initializer,
                span: token.span.to(&end),
            });

            let next = self.lexer.next_token(LexContext::Expression)?;
            if next.token_type != TokenType::Comma {
                self.lexer.push_back(next);
                break;
            }
        }

        Ok((declarations, start.to(&end)))
    }

    fn return_statement(&mut self, start: Span) -> Result<Stmt, ScriptError> {
        let value = if self.at_statement_end()? {
            None
        } else {
            Some(self.expression()?)
        };
        self.end_of_statement("return")?;

        let end = value.as_ref().map_or(start, |expr| *expr.span());
        Ok(Stmt::Return {
            value,
            span: start.to(&end),
        })
    }

    fn expression_statement(&mut self) -> Result<Stmt, ScriptError> {
        let expr = self.expression()?;
        self.end_of_statement("expression")?;

        let span = *expr.span();
        Ok(Stmt::Expression { expr, span })
    }

    /// Accepts `;` or a newline, and allows end of input or a closing
    /// brace without consuming them.
    fn end_of_statement(&mut self, what: &str) -> Result<(), ScriptError> {
        let token = self.lexer.next_token(LexContext::Expression)?;
        match token.token_type {
            TokenType::Semicolon | TokenType::Newline => Ok(()),
            TokenType::Eof | TokenType::RightBrace => {
                self.lexer.push_back(token);
                Ok(())
            }
            _ => Err(ScriptError::parse_error_with_help(
                token.span,
                format!("Expected ';' or newline after {}, found {}", what, token.describe()),
                "Statements end with ';' or a line break.".to_string(),
            )),
        }
    }

    fn at_statement_end(&mut self) -> Result<bool, ScriptError> {
        let token = self.lexer.next_token(LexContext::Expression)?;
        let end = matches!(
            token.token_type,
            TokenType::Semicolon | TokenType::Newline | TokenType::Eof | TokenType::RightBrace
        );
        self.lexer.push_back(token);
        Ok(end)
    }

    fn optional_expression(&mut self, closer: TokenType) -> Result<Option<Expr>, ScriptError> {
        let token = self.lexer.next_token(LexContext::Expression)?;
        let empty = token.token_type == closer;
        self.lexer.push_back(token);
        if empty {
            Ok(None)
        } else {
            self.expression().map(Some)
        }
    }

    /// Operands joined by operators, applied strictly left to right. A
    /// logical operator takes the rest of the expression as its right side.
    pub fn expression(&mut self) -> Result<Expr, ScriptError> {
        self.nested(Self::expression_body)
    }

    fn expression_body(&mut self) -> Result<Expr, ScriptError> {
        let first = self.lexer.next_token(LexContext::Expression)?;
        let first = match first.token_type {
            TokenType::Expr(_) | TokenType::IncDec(_) | TokenType::Logical(_) => {
                let span = Span::new(first.span.start, first.span.start, first.span.line);
                self.lexer.push_back(first);
                Expr::Empty { span }
            }
            _ => {
                self.lexer.push_back(first);
                self.operand()?
            }
        };

        let mut rest = Vec::new();
        let mut end = *first.span();
        loop {
            let token = self.lexer.next_token(LexContext::Expression)?;
            match token.token_type {
                TokenType::Expr(operator) | TokenType::IncDec(operator) => {
                    let right = if operator.is_step() && !self.starts_operand()? {
                        Expr::Empty {
                            span: Span::new(token.span.end, token.span.end, token.span.line),
                        }
                    } else {
                        self.operand_after(&token)?
                    };
                    end = *right.span();
                    rest.push((operator, right));
                }
                TokenType::Logical(operator) => {
                    if !self.starts_expression()? {
                        return Err(ScriptError::parse_error_with_help(
                            token.span,
                            format!("Expected expression after '{}'", token.lexeme),
                            "Logical operators like '&&' and '||' require expressions on both sides.".to_string(),
                        ));
                    }
                    let right = self.expression()?;
                    let left = chain(first, rest, &end);
                    let span = left.span().to(right.span());
                    return Ok(Expr::Logical {
                        left: Box::new(left),
                        operator,
                        right: Box::new(right),
                        span,
                    });
                }
                _ => {
                    self.lexer.push_back(token);
                    return Ok(chain(first, rest, &end));
                }
            }
        }
    }

    /// True when the next token can begin an expression, counting a leading
    /// operator with an empty left operand.
    fn starts_expression(&mut self) -> Result<bool, ScriptError> {
        let token = self.lexer.next_token(LexContext::Expression)?;
        let starts = matches!(
            token.token_type,
            TokenType::Expr(_) | TokenType::IncDec(_) | TokenType::Logical(_)
        );
        self.lexer.push_back(token);
        Ok(starts || self.starts_operand()?)
    }

    fn starts_operand(&mut self) -> Result<bool, ScriptError> {
        let token = self.lexer.next_token(LexContext::Expression)?;
        let starts = matches!(
            token.token_type,
            TokenType::Literal
                | TokenType::Identifier
                | TokenType::FunctionCall
                | TokenType::LeftParen
        );
        self.lexer.push_back(token);
        Ok(starts)
    }

    fn operand_after(&mut self, operator: &Token) -> Result<Expr, ScriptError> {
        if !self.starts_operand()? {
            let token = self.lexer.next_token(LexContext::Expression)?;
            return Err(ScriptError::parse_error_with_help(
                token.span,
                format!("Expected expression after '{}', found {}", operator.lexeme, token.describe()),
                "Operators like '+' and '<' require expressions on both sides.".to_string(),
            ));
        }
        self.operand()
    }

    fn operand(&mut self) -> Result<Expr, ScriptError> {
        let token = self.lexer.next_token(LexContext::Expression)?;

        match token.token_type {
            TokenType::Literal => Ok(Expr::Literal {
                value: token.lexeme,
                span: token.span,
            }),
            TokenType::Identifier => {
                let next = self.lexer.next_token(LexContext::Expression)?;
                match next.token_type {
                    TokenType::Assign => {
                        if !self.starts_expression()? {
                            return Err(ScriptError::parse_error_with_help(
                                next.span,
                                format!("Expected expression after '{} ='", token.lexeme),
                                "Assignments look like: name = expression".to_string(),
                            ));
                        }
                        let value = self.expression()?;
                        let span = token.span.to(value.span());
                        Ok(Expr::Assign {
                            name: token.lexeme,
                            value: Box::new(value),
                            span,
                        })
                    }
                    TokenType::IncDec(operator) => Ok(Expr::Step {
                        name: token.lexeme,
                        operator,
                        span: token.span.to(&next.span),
                    }),
                    _ => {
                        self.lexer.push_back(next);
                        Ok(Expr::Variable {
                            name: token.lexeme,
                            span: token.span,
                        })
                    }
                }
            }
            TokenType::FunctionCall => self.finish_call(token),
            TokenType::LeftParen => {
                let expr = self.expression()?;
                let end = self.consume_with_help(
                    TokenType::RightParen,
                    "Expected ')' after expression",
                    "Every opening parenthesis '(' must have a matching closing parenthesis ')'.",
                )?;
                Ok(Expr::Grouping {
                    expr: Box::new(expr),
                    span: token.span.to(&end.span),
                })
            }
            _ => {
                let help_msg = match token.token_type {
                    TokenType::RightParen => "Found ')' without matching '('. Check for unbalanced parentheses.",
                    TokenType::RightBrace => "Found '}' without matching '{'. Check for unbalanced braces.",
                    TokenType::Eof => "Reached end of input while expecting an expression.",
                    _ => "Expected a literal, variable, function call or parenthesized expression here.",
                };
                Err(ScriptError::parse_error_with_help(
                    token.span,
                    format!("Expected expression, found {}", token.describe()),
                    help_msg.to_string(),
                ))
            }
        }
    }

    fn finish_call(&mut self, callee: Token) -> Result<Expr, ScriptError> {
        self.consume(TokenType::LeftParen, "Expected '(' after function name")?;

        let mut args = Vec::new();
        let token = self.lexer.next_token(LexContext::Expression)?;
        let close = if token.token_type == TokenType::RightParen {
            token
        } else {
            self.lexer.push_back(token);
            loop {
                args.push(self.expression()?);

                let token = self.lexer.next_token(LexContext::Expression)?;
                match token.token_type {
                    TokenType::Comma => continue,
                    TokenType::RightParen => break token,
                    _ => {
                        return Err(ScriptError::parse_error_with_help(
                            token.span,
                            format!("Expected ')' after arguments, found {}", token.describe()),
                            "Function calls must be closed with ')' after the arguments. Example: func(arg1, arg2)".to_string(),
                        ));
                    }
                }
            }
        };

        Ok(Expr::Call {
            name: callee.lexeme,
            args,
            span: callee.span.to(&close.span),
        })
    }

    fn skip_newlines(&mut self, context: LexContext) -> Result<Token, ScriptError> {
        loop {
            let token = self.lexer.next_token(context)?;
            if token.token_type != TokenType::Newline {
                return Ok(token);
            }
        }
    }

    fn consume(&mut self, token_type: TokenType, message: &str) -> Result<Token, ScriptError> {
        let token = self.lexer.next_token(LexContext::Expression)?;
        if token.token_type == token_type {
            Ok(token)
        } else {
            Err(ScriptError::parse_error(
                token.span,
                format!("{}, found {}", message, token.describe()),
            ))
        }
    }

    fn consume_with_help(
        &mut self,
        token_type: TokenType,
        message: &str,
        help: &str,
    ) -> Result<Token, ScriptError> {
        let token = self.lexer.next_token(LexContext::Expression)?;
        if token.token_type == token_type {
            Ok(token)
        } else {
            Err(ScriptError::parse_error_with_help(
                token.span,
                format!("{}, found {}", message, token.describe()),
                help.to_string(),
            ))
        }
    }
}

fn chain(first: Expr, rest: Vec<(Operator, Expr)>, end: &Span) -> Expr {
    if rest.is_empty() {
        return first;
    }
    let span = first.span().to(end);
    Expr::Chain {
        first: Box::new(first),
        rest,
        span,
    }
}
