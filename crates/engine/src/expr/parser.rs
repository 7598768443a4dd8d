//! Recursive-descent evaluators for the two grammars.
//!
//! Arithmetic: `*` and `/` bind tighter than `+` and `-`, left-associative
//! at equal precedence. Boolean: `!` > `&&` > `||`. Parentheses override in
//! both. The evaluators are pure; the only failure modes are syntax errors
//! and division by zero.

use super::ExprError;
use super::lexer::{BoolToken, MathToken};

pub(super) fn eval_math(tokens: &[MathToken]) -> Result<f64, ExprError> {
    let mut parser = MathParser { tokens, pos: 0 };
    let value = parser.expression()?;
    parser.expect_end()?;
    Ok(value)
}

pub(super) fn eval_bool(tokens: &[BoolToken]) -> Result<bool, ExprError> {
    let mut parser = BoolParser { tokens, pos: 0 };
    let value = parser.or_expression()?;
    parser.expect_end()?;
    Ok(value)
}

struct MathParser<'a> {
    tokens: &'a [MathToken],
    pos: usize,
}

impl MathParser<'_> {
    fn peek(&self) -> Option<MathToken> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<MathToken> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expression(&mut self) -> Result<f64, ExprError> {
        let mut value = self.term()?;
        while let Some(op @ (MathToken::Plus | MathToken::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = match op {
                MathToken::Plus => value + rhs,
                _ => value - rhs,
            };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ExprError> {
        let mut value = self.factor()?;
        while let Some(op @ (MathToken::Star | MathToken::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            value = match op {
                MathToken::Star => value * rhs,
                _ => {
                    if rhs == 0.0 {
                        return Err(ExprError::DivisionByZero);
                    }
                    value / rhs
                }
            };
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, ExprError> {
        match self.bump() {
            Some(MathToken::Number(value)) => Ok(value),
            Some(MathToken::Minus) => Ok(-self.factor()?),
            Some(MathToken::LParen) => {
                let value = self.expression()?;
                match self.bump() {
                    Some(MathToken::RParen) => Ok(value),
                    _ => Err(ExprError::Syntax("missing closing parenthesis".to_string())),
                }
            }
            Some(_) => Err(ExprError::Syntax("expected a number".to_string())),
            None => Err(ExprError::Syntax("incomplete expression".to_string())),
        }
    }

    fn expect_end(&self) -> Result<(), ExprError> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(ExprError::Syntax("unexpected trailing input".to_string()))
        }
    }
}

struct BoolParser<'a> {
    tokens: &'a [BoolToken],
    pos: usize,
}

impl BoolParser<'_> {
    fn peek(&self) -> Option<BoolToken> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<BoolToken> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn or_expression(&mut self) -> Result<bool, ExprError> {
        let mut value = self.and_expression()?;
        while self.peek() == Some(BoolToken::Or) {
            self.pos += 1;
            let rhs = self.and_expression()?;
            value = value || rhs;
        }
        Ok(value)
    }

    fn and_expression(&mut self) -> Result<bool, ExprError> {
        let mut value = self.not_expression()?;
        while self.peek() == Some(BoolToken::And) {
            self.pos += 1;
            let rhs = self.not_expression()?;
            value = value && rhs;
        }
        Ok(value)
    }

    fn not_expression(&mut self) -> Result<bool, ExprError> {
        match self.bump() {
            Some(BoolToken::Not) => Ok(!self.not_expression()?),
            Some(BoolToken::True) => Ok(true),
            Some(BoolToken::False) => Ok(false),
            Some(BoolToken::LParen) => {
                let value = self.or_expression()?;
                match self.bump() {
                    Some(BoolToken::RParen) => Ok(value),
                    _ => Err(ExprError::Syntax("missing closing parenthesis".to_string())),
                }
            }
            Some(_) => Err(ExprError::Syntax("expected a boolean literal".to_string())),
            None => Err(ExprError::Syntax("incomplete expression".to_string())),
        }
    }

    fn expect_end(&self) -> Result<(), ExprError> {
        if self.pos == self.tokens.len() {
            Ok(())
        } else {
            Err(ExprError::Syntax("unexpected trailing input".to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::lexer::{tokenize_bool, tokenize_math};
    use super::*;

    fn math(input: &str) -> Result<f64, ExprError> {
        eval_math(&tokenize_math(input)?)
    }

    fn boolean(input: &str) -> Result<bool, ExprError> {
        eval_bool(&tokenize_bool(input)?)
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        assert_eq!(math("3 + 4 * 2").unwrap(), 11.0);
        assert_eq!(math("(3 + 4) * 2").unwrap(), 14.0);
    }

    #[test]
    fn equal_precedence_is_left_associative() {
        assert_eq!(math("10 - 4 - 3").unwrap(), 3.0);
        assert_eq!(math("24 / 4 / 2").unwrap(), 3.0);
    }

    #[test]
    fn unary_minus() {
        assert_eq!(math("-3 + 5").unwrap(), 2.0);
        assert_eq!(math("2 * -4").unwrap(), -8.0);
    }

    #[test]
    fn division_by_zero_is_reported() {
        assert_eq!(math("5 / 0"), Err(ExprError::DivisionByZero));
        assert_eq!(math("1 / (2 - 2)"), Err(ExprError::DivisionByZero));
    }

    #[test]
    fn math_syntax_errors() {
        assert!(matches!(math("3 +"), Err(ExprError::Syntax(_))));
        assert!(matches!(math("(3 + 4"), Err(ExprError::Syntax(_))));
        assert!(matches!(math("3 4"), Err(ExprError::Syntax(_))));
        assert!(matches!(math(""), Err(ExprError::Syntax(_))));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert!(boolean("true || false && false").unwrap());
        assert!(!boolean("(true || false) && false").unwrap());
    }

    #[test]
    fn not_binds_tightest() {
        assert!(boolean("!false && true").unwrap());
        assert!(boolean("!(true && false)").unwrap());
        assert!(!boolean("!!false").unwrap());
    }

    #[test]
    fn bool_syntax_errors() {
        assert!(matches!(boolean("true &&"), Err(ExprError::Syntax(_))));
        assert!(matches!(boolean("(true"), Err(ExprError::Syntax(_))));
        assert!(matches!(boolean("true false"), Err(ExprError::Syntax(_))));
        assert!(matches!(boolean(""), Err(ExprError::Syntax(_))));
    }
}
