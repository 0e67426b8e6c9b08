use std::fmt;

use thiserror::Error;

/// Every operator the tokenizer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    LeftShift,
    RightShift,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    /// Unary-looking `!`; binary in position, the left operand is ignored.
    Not,
    /// `++` as a binary operator: left plus one, right ignored.
    Increment,
    /// `--` as a binary operator: left minus one, right ignored.
    Decrement,
    And,
    Or,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::LeftShift => "<<",
            Operator::RightShift => ">>",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Not => "!",
            Operator::Increment => "++",
            Operator::Decrement => "--",
            Operator::And => "&&",
            Operator::Or => "||",
        }
    }

    pub fn is_step(&self) -> bool {
        matches!(self, Operator::Increment | Operator::Decrement)
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, Operator::And | Operator::Or)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperatorError {
    #[error("Bad operator '{0}' for non-numeric operands")]
    NonNumeric(Operator),
    #[error("Bad operator '{0}'")]
    Unsupported(Operator),
    #[error("Conditional must be numeric, got '{0}'")]
    NonNumericCondition(String),
}

/// True when every character is a decimal digit. The empty string counts,
/// which is what makes `!x` and `-5` work with an empty left operand.
pub fn is_numeric(value: &str) -> bool {
    value.bytes().all(|b| b.is_ascii_digit())
}

/// Reads a digit string as an integer; overflow wraps.
pub fn to_integer(value: &str) -> i64 {
    value.bytes().fold(0i64, |acc, b| {
        acc.wrapping_mul(10).wrapping_add(i64::from(b - b'0'))
    })
}

fn flag(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

/// Applies an arithmetic, relational, equality, step or complement operator.
///
/// Integer semantics apply only when both operands are digit strings;
/// otherwise `+` concatenates, comparisons are ordinal and everything else
/// is an error.
pub fn evaluate(operator: Operator, lhs: &str, rhs: &str) -> Result<String, OperatorError> {
    if is_numeric(lhs) && is_numeric(rhs) {
        let l = to_integer(lhs);
        let r = to_integer(rhs);
        let value = match operator {
            Operator::Plus => l.wrapping_add(r),
            Operator::Increment => l.wrapping_add(1),
            Operator::Minus => l.wrapping_sub(r),
            Operator::Decrement => l.wrapping_sub(1),
            Operator::Multiply => l.wrapping_mul(r),
            Operator::Divide => {
                if r != 0 {
                    l.wrapping_div(r)
                } else {
                    0
                }
            }
            Operator::Modulo => {
                if r != 0 {
                    l.wrapping_rem(r)
                } else {
                    0
                }
            }
            Operator::LeftShift => l.wrapping_shl(r as u32),
            Operator::RightShift => l.wrapping_shr(r as u32),
            Operator::Equal => flag(l == r),
            Operator::NotEqual => flag(l != r),
            Operator::Less => flag(l < r),
            Operator::LessEqual => flag(l <= r),
            Operator::Greater => flag(l > r),
            Operator::GreaterEqual => flag(l >= r),
            Operator::Not => flag(r == 0),
            Operator::And | Operator::Or => return Err(OperatorError::Unsupported(operator)),
        };
        return Ok(value.to_string());
    }

    let value = match operator {
        Operator::Plus => return Ok(format!("{}{}", lhs, rhs)),
        Operator::Less => lhs < rhs,
        Operator::LessEqual => lhs <= rhs,
        Operator::Greater => lhs > rhs,
        Operator::GreaterEqual => lhs >= rhs,
        Operator::Equal => lhs == rhs,
        Operator::NotEqual => lhs != rhs,
        Operator::And | Operator::Or => return Err(OperatorError::Unsupported(operator)),
        _ => return Err(OperatorError::NonNumeric(operator)),
    };
    Ok(flag(value).to_string())
}

/// Applies `&&` or `||`. Both operands must be non-empty digit strings.
pub fn evaluate_condition(operator: Operator, lhs: &str, rhs: &str) -> Result<String, OperatorError> {
    for operand in [lhs, rhs] {
        if operand.is_empty() || !is_numeric(operand) {
            return Err(OperatorError::NonNumericCondition(operand.to_string()));
        }
    }

    let l = to_integer(lhs) != 0;
    let r = to_integer(rhs) != 0;
    let value = match operator {
        Operator::And => l && r,
        Operator::Or => l || r,
        _ => return Err(OperatorError::Unsupported(operator)),
    };
    Ok(flag(value).to_string())
}

/// An `if` takes its then-branch when the condition starts with `1`.
pub fn selects_then(condition: &str) -> bool {
    condition.starts_with('1')
}

/// A `for` loop keeps running while its condition does not start with `0`.
pub fn continues_loop(condition: &str) -> bool {
    !condition.starts_with('0')
}
