//! Expression evaluation for the calculator grammars.
//!
//! Raw input uses keyword operators (`3 SUMA 4 MULTIPLICA 2`,
//! `true OR false AND true`). [`translate`] substitutes the keywords into
//! their symbolic form, producing the processed expression that gets stored
//! in the operation history; [`evaluate`] then tokenizes and parses that
//! processed form with a dedicated recursive-descent evaluator per grammar.
//!
//! The evaluators only ever see the two closed vocabularies. User input is
//! never handed to any general-purpose evaluation facility.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{EngineError, Permission};

mod lexer;
mod parser;

/// The two supported expression grammars.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Math,
    Boolean,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Math => "matematica",
            Self::Boolean => "booleana",
        }
    }

    /// The permission a role must hold to evaluate this kind of expression.
    pub fn required_permission(self) -> Permission {
        match self {
            Self::Math => Permission::EvaluateMath,
            Self::Boolean => Permission::EvaluateBoolean,
        }
    }
}

impl TryFrom<&str> for OperationKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "matematica" => Ok(Self::Math),
            "booleana" => Ok(Self::Boolean),
            other => Err(EngineError::InvalidInput(format!(
                "invalid operation kind: {other}"
            ))),
        }
    }
}

/// Evaluation failures caused by the expression itself.
///
/// These are user-input problems, always recoverable; they are reported to
/// the caller as a normal outcome and never abort the session.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExprError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("division by zero")]
    DivisionByZero,
}

/// Substitutes the keyword vocabulary into symbolic operators.
///
/// Matching is case-insensitive and word-based; anything that is not a
/// recognized keyword passes through untouched and is left for the
/// tokenizer to accept or reject. The returned string is the processed
/// expression recorded in the history.
pub fn translate(kind: OperationKind, raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_alphabetic() {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if c.is_alphabetic() {
                    word.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            match keyword_symbol(kind, &word) {
                Some(symbol) => out.push_str(symbol),
                None => out.push_str(&word),
            }
        } else {
            out.push(ch);
            chars.next();
        }
    }

    out
}

/// Evaluates a processed expression. Pure: same input, same output.
pub fn evaluate(kind: OperationKind, processed: &str) -> Result<String, ExprError> {
    match kind {
        OperationKind::Math => {
            let tokens = lexer::tokenize_math(processed)?;
            parser::eval_math(&tokens).map(format_number)
        }
        OperationKind::Boolean => {
            let tokens = lexer::tokenize_bool(processed)?;
            parser::eval_bool(&tokens).map(|value| value.to_string())
        }
    }
}

fn keyword_symbol(kind: OperationKind, word: &str) -> Option<&'static str> {
    match kind {
        OperationKind::Math => match word.to_ascii_uppercase().as_str() {
            "SUMA" => Some("+"),
            "RESTA" => Some("-"),
            "MULTIPLICA" => Some("*"),
            "DIVIDE" => Some("/"),
            _ => None,
        },
        OperationKind::Boolean => match word.to_ascii_uppercase().as_str() {
            "TRUE" => Some("true"),
            "FALSE" => Some("false"),
            "AND" => Some("&&"),
            "OR" => Some("||"),
            "NOT" => Some("!"),
            _ => None,
        },
    }
}

/// Integer-valued results print without a decimal part.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
