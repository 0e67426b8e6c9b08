// ejs: an embeddable scripting engine
//
// Every value is a string. Scripts declare variables, branch, loop and call
// functions registered by the host, which reads back the textual result of
// each evaluation.

// Public modules
pub mod ast;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod function;
pub mod lexer;
pub mod parser;
pub mod repl;
pub mod runner;
pub mod scope;
pub mod source;
pub mod value;

// Re-export commonly used items
pub use ast::{Declarator, Expr, Stmt};
pub use engine::{Engine, EngineId, Registry};
pub use error::{EngineError, ErrorKind, ScriptError, Span};
pub use evaluator::Flow;
pub use function::{ArgValue, Args, FunctionTable, NativeFunction};
pub use lexer::{InputContext, LexContext, Lexer, Token, TokenType};
pub use parser::Parser;
pub use scope::{BlockId, Tier, VariableTable};
pub use value::Operator;

// Re-export main functions
pub use repl::start as start_repl;
pub use runner::{install_host_functions, run};
