//! Calculator tool: evaluates an arithmetic expression given as text.
//!
//! Grammar (lowest to highest precedence):
//!
//! ```text
//! sum     = product (('+' | '-') product)*
//! product = power (('*' | '/' | '%') power)*
//! power   = unary ('^' power)?          right-associative
//! unary   = '-' unary | atom
//! atom    = NUMBER | '(' sum ')'
//! ```

use async_trait::async_trait;
use ledgerloop_core::error::ToolError;
use ledgerloop_core::tool::{Tool, ToolContext};
use std::iter::Peekable;
use std::str::CharIndices;
use tracing::debug;

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression. Supports + - * / % ^, parentheses and decimals. \
         Input: the expression, e.g. (2 + 3) * 4"
    }

    async fn call(&self, ctx: &ToolContext<'_>, input: &str) -> Result<String, ToolError> {
        if ctx.cancellation.is_cancelled() {
            return Err(ToolError::Cancelled(format!("{} skipped '{input}'", self.name())));
        }
        let value = evaluate(input).map_err(|e| ToolError::InvalidInput {
            tool_name: self.name().into(),
            reason: e.to_string(),
        })?;
        debug!(expression = input, value, "Calculator evaluated expression");
        Ok(format_number(value))
    }
}

/// Why an expression could not be evaluated.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalcError {
    #[error("empty expression")]
    Empty,

    #[error("unexpected character '{found}' at offset {offset}")]
    UnexpectedChar { found: char, offset: usize },

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("missing closing parenthesis")]
    UnclosedParen,

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NotFinite,

    #[error("expression nested deeper than {} levels", MAX_DEPTH)]
    TooDeep,
}

/// Nesting limit for parentheses, unary minus and chained powers.
pub const MAX_DEPTH: usize = 256;

/// Evaluate an arithmetic expression.
pub fn evaluate(expr: &str) -> Result<f64, CalcError> {
    if expr.trim().is_empty() {
        return Err(CalcError::Empty);
    }
    let mut eval = Evaluator {
        chars: expr.char_indices().peekable(),
        depth: 0,
    };
    let value = eval.sum()?;
    eval.skip_whitespace();
    if let Some((offset, found)) = eval.chars.next() {
        return Err(CalcError::UnexpectedChar { found, offset });
    }
    if !value.is_finite() {
        return Err(CalcError::NotFinite);
    }
    Ok(value)
}

/// Integers print without a fractional part.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

struct Evaluator<'a> {
    chars: Peekable<CharIndices<'a>>,
    depth: usize,
}

impl Evaluator<'_> {
    /// Run `f` one nesting level deeper.
    fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, CalcError>,
    ) -> Result<T, CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::TooDeep);
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    /// Consume `op` if it is the next non-space character.
    fn eat(&mut self, op: char) -> bool {
        self.skip_whitespace();
        self.chars.next_if(|(_, c)| *c == op).is_some()
    }

    fn sum(&mut self) -> Result<f64, CalcError> {
        let mut acc = self.product()?;
        loop {
            if self.eat('+') {
                acc += self.product()?;
            } else if self.eat('-') {
                acc -= self.product()?;
            } else {
                return Ok(acc);
            }
        }
    }

    fn product(&mut self) -> Result<f64, CalcError> {
        let mut acc = self.power()?;
        loop {
            if self.eat('*') {
                acc *= self.power()?;
            } else if self.eat('/') {
                acc /= nonzero(self.power()?)?;
            } else if self.eat('%') {
                acc %= nonzero(self.power()?)?;
            } else {
                return Ok(acc);
            }
        }
    }

    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.unary()?;
        if self.eat('^') {
            let exponent = self.nested(Self::power)?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.eat('-') {
            return Ok(-self.nested(Self::unary)?);
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<f64, CalcError> {
        if self.eat('(') {
            let inner = self.nested(Self::sum)?;
            if !self.eat(')') {
                return Err(CalcError::UnclosedParen);
            }
            return Ok(inner);
        }

        self.skip_whitespace();
        let mut literal = String::new();
        while let Some((_, c)) = self.chars.next_if(|(_, c)| c.is_ascii_digit() || *c == '.') {
            literal.push(c);
        }
        if literal.is_empty() {
            return match self.chars.peek() {
                Some(&(offset, found)) => Err(CalcError::UnexpectedChar { found, offset }),
                None => Err(CalcError::UnexpectedEnd),
            };
        }
        literal
            .parse()
            .map_err(|_| CalcError::InvalidNumber(literal))
    }
}

fn nonzero(divisor: f64) -> Result<f64, CalcError> {
    if divisor == 0.0 {
        Err(CalcError::DivisionByZero)
    } else {
        Ok(divisor)
    }
}
