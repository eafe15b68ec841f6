//! Postfix (reverse-Polish) arithmetic.
//!
//! Tokens are separated by whitespace. Each operator pops its right operand
//! and then its left operand, so `10 3 -` is `10 - 3`. Division truncates
//! toward zero.

use super::error::CellError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    fn parse(token: &str) -> Option<Operator> {
        match token {
            "+" => Some(Operator::Add),
            "-" => Some(Operator::Sub),
            "*" => Some(Operator::Mul),
            "/" => Some(Operator::Div),
            _ => None,
        }
    }

    fn symbol(self) -> char {
        match self {
            Operator::Add => '+',
            Operator::Sub => '-',
            Operator::Mul => '*',
            Operator::Div => '/',
        }
    }

    fn apply(self, lhs: i64, rhs: i64) -> Result<i64, CellError> {
        let result = match self {
            Operator::Add => lhs.checked_add(rhs),
            Operator::Sub => lhs.checked_sub(rhs),
            Operator::Mul => lhs.checked_mul(rhs),
            Operator::Div => {
                if rhs == 0 {
                    return Err(CellError::DivisionByZero);
                }
                lhs.checked_div(rhs)
            }
        };
        result.ok_or(CellError::Overflow)
    }
}

/// Evaluate a whitespace-separated postfix expression.
///
/// Any failure discards the whole computation; exactly one value must be
/// left on the stack at the end.
pub fn eval_postfix(expression: &str) -> Result<i64, CellError> {
    let mut operands: Vec<i64> = Vec::new();

    for token in expression.split_whitespace() {
        if let Some(op) = Operator::parse(token) {
            if operands.len() < 2 {
                return Err(CellError::InsufficientOperands(op.symbol()));
            }
            let rhs = operands.pop().unwrap_or_default();
            let lhs = operands.pop().unwrap_or_default();
            operands.push(op.apply(lhs, rhs)?);
        } else {
            let number = token
                .parse::<i64>()
                .map_err(|_| CellError::InvalidToken(token.to_string()))?;
            operands.push(number);
        }
    }

    match operands.as_slice() {
        [value] => Ok(*value),
        rest => Err(CellError::UnbalancedExpression(rest.len())),
    }
}
