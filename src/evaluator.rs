use log::{debug, trace};

use crate::ast::{Declarator, Expr, Stmt};
use crate::engine::Engine;
use crate::error::{ScriptError, Span};
use crate::parser::Parser;
use crate::scope::Tier;
use crate::value::{self, OperatorError};

/// How a statement finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Normal,
    Return,
}

// Every walk takes an `exec` flag. With it clear the tree is visited but
// nothing is read, written, called or computed, and the result is left alone.
impl Engine {
    /// Parses and runs `script` one top-level statement at a time.
    pub(crate) fn run_script(&mut self, script: &str) -> Result<(), ScriptError> {
        let mut parser = Parser::new(script);
        while let Some(statement) = parser.parse_statement()? {
            if self.execute_statement(&statement, true)? == Flow::Return {
                break;
            }
        }
        Ok(())
    }

    pub fn execute_statement(&mut self, stmt: &Stmt, exec: bool) -> Result<Flow, ScriptError> {
        if exec {
            self.mark_line(stmt.span().line);
            trace!("line {}: {:?}", stmt.span().line, stmt);
        }

        match stmt {
            Stmt::Empty { .. } => Ok(Flow::Normal),
            Stmt::Expression { expr, .. } => {
                let value = self.evaluate_expression(expr, exec)?;
                if exec {
                    self.result = value;
                }
                Ok(Flow::Normal)
            }
            Stmt::Block { statements, .. } => {
                for statement in statements {
                    if self.execute_statement(statement, exec)? == Flow::Return {
                        return Ok(Flow::Return);
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                let condition = self.evaluate_expression(condition, exec)?;
                let take_then = exec && value::selects_then(&condition);

                if self.execute_statement(then_branch, take_then)? == Flow::Return {
                    return Ok(Flow::Return);
                }
                if let Some(else_stmt) = else_branch {
                    return self.execute_statement(else_stmt, exec && !take_then);
                }
                Ok(Flow::Normal)
            }
            Stmt::For {
                initializer,
                condition,
                increment,
                body,
                ..
            } => self.execute_for(
                initializer.as_deref(),
                condition.as_ref(),
                increment.as_ref(),
                body,
                exec,
            ),
            Stmt::Var { declarations, .. } => {
                let value = self.declare(declarations, exec)?;
                if exec {
                    self.result = value;
                }
                Ok(Flow::Normal)
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate_expression(expr, exec)?,
                    None => String::new(),
                };
                if !exec {
                    return Ok(Flow::Normal);
                }
                self.result = value;
                Ok(Flow::Return)
            }
        }
    }

    fn execute_for(
        &mut self,
        initializer: Option<&Stmt>,
        condition: Option<&Expr>,
        increment: Option<&Expr>,
        body: &Stmt,
        exec: bool,
    ) -> Result<Flow, ScriptError> {
        // Loop clauses never change the result.
        match initializer {
            Some(Stmt::Var { declarations, .. }) => {
                self.declare(declarations, exec)?;
            }
            Some(Stmt::Expression { expr, .. }) => {
                self.evaluate_expression(expr, exec)?;
            }
            Some(other) => {
                self.execute_statement(other, exec)?;
            }
            None => {}
        }

        let mut cond = self.loop_condition(condition, exec)?;

        if let Some(increment) = increment {
            self.evaluate_expression(increment, false)?;
        }
        self.execute_statement(body, false)?;

        while exec && value::continues_loop(&cond) {
            if self.execute_statement(body, true)? == Flow::Return {
                return Ok(Flow::Return);
            }
            if let Some(increment) = increment {
                self.evaluate_expression(increment, true)?;
            }
            cond = self.loop_condition(condition, true)?;
        }
        Ok(Flow::Normal)
    }

    fn loop_condition(&mut self, condition: Option<&Expr>, exec: bool) -> Result<String, ScriptError> {
        match condition {
            Some(expr) => self.evaluate_expression(expr, exec),
            None => Ok(String::new()),
        }
    }

    /// Binds each declarator in the current scope and returns the last
    /// declarator's value.
    fn declare(&mut self, declarations: &[Declarator], exec: bool) -> Result<String, ScriptError> {
        let mut last = String::new();

        for declarator in declarations {
            if exec && self.scopes.lookup(&declarator.name).is_some() {
                return Err(ScriptError::runtime_error_with_help(
                    declarator.span,
                    "Variable already declared".to_string(),
                    format!("'{}' is already defined in this scope or globally.", declarator.name),
                ));
            }

            let value = match declarator.initializer {
                Some(ref expr) => Some(self.evaluate_expression(expr, exec)?),
                None => None,
            };
            if exec {
                trace!("declare {} = {:?}", declarator.name, value);
                last = value.clone().unwrap_or_default();
                self.scopes.set_local(&declarator.name, value);
            }
        }
        Ok(last)
    }

    pub fn evaluate_expression(&mut self, expr: &Expr, exec: bool) -> Result<String, ScriptError> {
        match expr {
            Expr::Empty { .. } => Ok(String::new()),
            Expr::Literal { value, .. } => Ok(if exec { value.clone() } else { String::new() }),
            Expr::Variable { name, span } => {
                if !exec {
                    return Ok(String::new());
                }
                let (_, value) = self.resolve(name, span)?;
                Ok(value.unwrap_or_default())
            }
            Expr::Assign { name, value, .. } => {
                let value = self.evaluate_expression(value, exec)?;
                if exec {
                    let tier = self.scopes.assign(name, value.clone());
                    trace!("assign {:?} {} = {}", tier, name, value);
                }
                Ok(value)
            }
            Expr::Step {
                name,
                operator,
                span,
            } => {
                if !exec {
                    return Ok(String::new());
                }
                let (tier, current) = self.resolve(name, span)?;
                let current = current.unwrap_or_default();
                let stepped = value::evaluate(*operator, &current, "")
                    .map_err(|error| operator_error(error, span))?;

                match tier {
                    Tier::Local => self.scopes.set_local(name, Some(stepped.clone())),
                    Tier::Global => self.scopes.set_global(name, Some(stepped.clone())),
                }
                Ok(stepped)
            }
            Expr::Chain { first, rest, span } => {
                let mut acc = self.evaluate_expression(first, exec)?;
                for (operator, operand) in rest {
                    let rhs = self.evaluate_expression(operand, exec)?;
                    if exec {
                        acc = value::evaluate(*operator, &acc, &rhs)
                            .map_err(|error| operator_error(error, span))?;
                    }
                }
                Ok(if exec { acc } else { String::new() })
            }
            Expr::Logical {
                left,
                operator,
                right,
                span,
            } => {
                let lhs = self.evaluate_expression(left, exec)?;
                let rhs = self.evaluate_expression(right, exec)?;
                if !exec {
                    return Ok(String::new());
                }
                value::evaluate_condition(*operator, &lhs, &rhs)
                    .map_err(|error| operator_error(error, span))
            }
            Expr::Call { name, args, span } => self.call(name, args, span, exec),
            Expr::Grouping { expr, .. } => self.evaluate_expression(expr, exec),
        }
    }

    fn call(&mut self, name: &str, args: &[Expr], span: &Span, exec: bool) -> Result<String, ScriptError> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.evaluate_expression(arg, exec)?);
        }
        if !exec {
            return Ok(String::new());
        }

        let function = self.functions.lookup(name).ok_or_else(|| {
            ScriptError::runtime_error_with_help(
                *span,
                format!("Undefined procedure {}", name),
                "Only functions registered by the host can be called.".to_string(),
            )
        })?;

        debug!("calling {} with {} argument(s)", name, values.len());
        function(self, &values).map_err(|message| ScriptError::runtime_error(*span, message))?;
        Ok(self.result.clone())
    }

    fn resolve(&self, name: &str, span: &Span) -> Result<(Tier, Option<String>), ScriptError> {
        self.scopes.lookup(name).ok_or_else(|| {
            ScriptError::runtime_error_with_help(
                *span,
                format!("Undefined variable {}", name),
                format!("Declare it first with 'var {}'.", name),
            )
        })
    }
}

fn operator_error(error: OperatorError, span: &Span) -> ScriptError {
    ScriptError::runtime_error(*span, error.to_string())
}
