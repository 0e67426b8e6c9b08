use crate::error::Span;
use crate::value::Operator;

/// One top-level statement is parsed at a time and executed before the
/// next is read, so statements ahead of a syntax error still take effect.
#[derive(Debug, Clone)]
pub enum Stmt {
    /// A lone `;`, or a token left for the enclosing construct.
    Empty {
        span: Span,
    },
    Expression {
        expr: Expr,
        span: Span,
    },
    /// Braces group statements; they do not open a scope.
    Block {
        statements: Vec<Stmt>,
        span: Span,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },
    For {
        initializer: Option<Box<Stmt>>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: Box<Stmt>,
        span: Span,
    },
    Var {
        declarations: Vec<Declarator>,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Empty { span } => span,
            Stmt::Expression { span, .. } => span,
            Stmt::Block { span, .. } => span,
            Stmt::If { span, .. } => span,
            Stmt::For { span, .. } => span,
            Stmt::Var { span, .. } => span,
            Stmt::Return { span, .. } => span,
        }
    }
}

/// `name` or `name = initializer` inside a `var` list.
#[derive(Debug, Clone)]
pub struct Declarator {
    pub name: String,
    pub initializer: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Expr {
    /// Missing operand: the left side of `!x` or `-5`, or the right side
    /// of a trailing `++`/`--`.
    Empty {
        span: Span,
    },
    Literal {
        value: String,
        span: Span,
    },
    Variable {
        name: String,
        span: Span,
    },
    Assign {
        name: String,
        value: Box<Expr>,
        span: Span,
    },
    /// `name++` / `name--`: updates the variable in place.
    Step {
        name: String,
        operator: Operator,
        span: Span,
    },
    /// `first op operand op operand ...`, applied strictly left to right.
    /// Kept flat so a long chain does not nest.
    Chain {
        first: Box<Expr>,
        rest: Vec<(Operator, Expr)>,
        span: Span,
    },
    Logical {
        left: Box<Expr>,
        operator: Operator,
        right: Box<Expr>,
        span: Span,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        span: Span,
    },
    Grouping {
        expr: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Empty { span } => span,
            Expr::Literal { span, .. } => span,
            Expr::Variable { span, .. } => span,
            Expr::Assign { span, .. } => span,
            Expr::Step { span, .. } => span,
            Expr::Chain { span, .. } => span,
            Expr::Logical { span, .. } => span,
            Expr::Call { span, .. } => span,
            Expr::Grouping { span, .. } => span,
        }
    }
}
