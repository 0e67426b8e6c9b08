use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::engine::EngineId;

/// Character range of a token or construct, plus the line it starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize) -> Self {
        Self { start, end, line }
    }

    pub fn single(pos: usize, line: usize) -> Self {
        Self {
            start: pos,
            end: pos + 1,
            line,
        }
    }

    /// Span from the start of `self` to the end of `other`.
    pub fn to(&self, other: &Span) -> Self {
        Self {
            start: self.start,
            end: other.end.max(self.end),
            line: self.line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    LexError,
    ParseError,
    RuntimeError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ScriptError {
    pub kind: ErrorKind,
    pub span: Span,
    pub message: String,
    pub help: Option<String>,
}

impl ScriptError {
    pub fn new(kind: ErrorKind, span: Span, message: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: None,
        }
    }

    pub fn new_with_help(kind: ErrorKind, span: Span, message: String, help: String) -> Self {
        Self {
            kind,
            span,
            message,
            help: Some(help),
        }
    }

    pub fn lex_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::LexError, span, message)
    }

    pub fn parse_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::ParseError, span, message)
    }

    pub fn parse_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::ParseError, span, message, help)
    }

    pub fn runtime_error(span: Span, message: String) -> Self {
        Self::new(ErrorKind::RuntimeError, span, message)
    }

    pub fn runtime_error_with_help(span: Span, message: String, help: String) -> Self {
        Self::new_with_help(ErrorKind::RuntimeError, span, message, help)
    }

    pub fn line(&self) -> usize {
        self.span.line
    }

    /// Plain-text diagnostic kept by the engine as its current error:
    /// the message, the line number and the full text of that line.
    pub fn diagnostic(&self, source: &str) -> String {
        let text = source
            .lines()
            .nth(self.span.line.saturating_sub(1))
            .unwrap_or("");
        format!(
            "{}\n At line {}, line => \n\n{}\n",
            self.message, self.span.line, text
        )
    }

    /// Colored report on stderr, used by the command-line host.
    pub fn report(&self, source: &str, filename: Option<&str>) -> std::io::Result<()> {
        let filename = filename.unwrap_or("<repl>");

        let color = match self.kind {
            ErrorKind::LexError => Color::Red,
            ErrorKind::ParseError => Color::Yellow,
            ErrorKind::RuntimeError => Color::Magenta,
        };

        let kind_str = match self.kind {
            ErrorKind::LexError => "Lexical Error",
            ErrorKind::ParseError => "Syntax Error",
            ErrorKind::RuntimeError => "Runtime Error",
        };

        let end = self.span.end.max(self.span.start + 1);
        let mut report_builder = Report::build(ReportKind::Error, filename, self.span.start)
            .with_message(format!("{}: {}", kind_str.fg(color), self.message))
            .with_label(
                Label::new((filename, self.span.start..end))
                    .with_message(&self.message)
                    .with_color(color),
            );

        if let Some(ref help_text) = self.help {
            report_builder =
                report_builder.with_note(format!("{}: {}", "help".fg(Color::Cyan), help_text));
        }

        report_builder
            .finish()
            .eprint((filename, Source::from(source)))
    }
}

/// Misuse of the host-facing API, as opposed to a fault in a script.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Bad handle {0}")]
    BadHandle(EngineId),
    #[error("engine {0} is already evaluating; use the engine passed to the callback")]
    Busy(EngineId),
    #[error("block {found} closed while block {expected} is the current scope")]
    BlockOrder { expected: u64, found: u64 },
    #[error("the global scope cannot be closed")]
    GlobalScope,
    #[error(transparent)]
    Script(#[from] ScriptError),
}
