//! Tokenizers for the processed expression forms.
//!
//! Both vocabularies are closed: anything outside them is rejected here
//! with a syntax error instead of reaching the parser.

use super::ExprError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) enum MathToken {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum BoolToken {
    True,
    False,
    And,
    Or,
    Not,
    LParen,
    RParen,
}

pub(super) fn tokenize_math(input: &str) -> Result<Vec<MathToken>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '+' => {
                chars.next();
                tokens.push(MathToken::Plus);
            }
            '-' => {
                chars.next();
                tokens.push(MathToken::Minus);
            }
            '*' => {
                chars.next();
                tokens.push(MathToken::Star);
            }
            '/' => {
                chars.next();
                tokens.push(MathToken::Slash);
            }
            '(' => {
                chars.next();
                tokens.push(MathToken::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(MathToken::RParen);
            }
            c if c.is_ascii_digit() => {
                let mut text = String::new();
                let mut seen_dot = false;
                while let Some(&c) = chars.peek() {
                    if c.is_ascii_digit() || (c == '.' && !seen_dot) {
                        seen_dot |= c == '.';
                        text.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = text
                    .parse::<f64>()
                    .map_err(|_| ExprError::Syntax(format!("invalid number '{text}'")))?;
                tokens.push(MathToken::Number(value));
            }
            c if c.is_alphabetic() => {
                let word = take_word(&mut chars);
                return Err(ExprError::Syntax(format!("unknown token '{word}'")));
            }
            other => {
                return Err(ExprError::Syntax(format!("unexpected character '{other}'")));
            }
        }
    }

    Ok(tokens)
}

pub(super) fn tokenize_bool(input: &str) -> Result<Vec<BoolToken>, ExprError> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            '!' => {
                chars.next();
                tokens.push(BoolToken::Not);
            }
            '(' => {
                chars.next();
                tokens.push(BoolToken::LParen);
            }
            ')' => {
                chars.next();
                tokens.push(BoolToken::RParen);
            }
            '&' | '|' => {
                chars.next();
                if chars.peek() == Some(&ch) {
                    chars.next();
                    tokens.push(if ch == '&' { BoolToken::And } else { BoolToken::Or });
                } else {
                    return Err(ExprError::Syntax(format!("expected '{ch}{ch}'")));
                }
            }
            c if c.is_alphabetic() => {
                let word = take_word(&mut chars);
                match word.to_ascii_lowercase().as_str() {
                    "true" => tokens.push(BoolToken::True),
                    "false" => tokens.push(BoolToken::False),
                    _ => return Err(ExprError::Syntax(format!("unknown token '{word}'"))),
                }
            }
            other => {
                return Err(ExprError::Syntax(format!("unexpected character '{other}'")));
            }
        }
    }

    Ok(tokens)
}

fn take_word(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphabetic() {
            word.push(c);
            chars.next();
        } else {
            break;
        }
    }
    word
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn math_numbers_and_operators() {
        let tokens = tokenize_math("3.5 + (4 * 2)").unwrap();
        assert_eq!(
            tokens,
            vec![
                MathToken::Number(3.5),
                MathToken::Plus,
                MathToken::LParen,
                MathToken::Number(4.0),
                MathToken::Star,
                MathToken::Number(2.0),
                MathToken::RParen,
            ]
        );
    }

    #[test]
    fn math_rejects_words_and_stray_characters() {
        assert!(matches!(tokenize_math("3 + foo"), Err(ExprError::Syntax(_))));
        assert!(matches!(tokenize_math("3 ; 4"), Err(ExprError::Syntax(_))));
        assert!(matches!(
            tokenize_math("1.2.3"),
            Err(ExprError::Syntax(_))
        ));
    }

    #[test]
    fn bool_literals_and_operators() {
        let tokens = tokenize_bool("!true && (false || true)").unwrap();
        assert_eq!(
            tokens,
            vec![
                BoolToken::Not,
                BoolToken::True,
                BoolToken::And,
                BoolToken::LParen,
                BoolToken::False,
                BoolToken::Or,
                BoolToken::True,
                BoolToken::RParen,
            ]
        );
    }

    #[test]
    fn bool_rejects_single_ampersand_and_unknown_words() {
        assert!(matches!(
            tokenize_bool("true & false"),
            Err(ExprError::Syntax(_))
        ));
        assert!(matches!(tokenize_bool("maybe"), Err(ExprError::Syntax(_))));
    }
}
