// File: src/model/expr.rs
//! Splitter for the date-expression language understood by `when`.
//!
//! This is not an evaluator and not a precedence grammar. The text is split
//! at the leftmost occurrence of the first operator (in a fixed order) whose
//! two sides both parse. Existing calendar files were written against exactly
//! this behaviour, so operator characters inside literal tokens are split too.
//!
//! Example: `j>5 & y>2020` becomes
//! `Binary("&", Binary(">", j, 5), Binary(">", y, 2020))`.

use thiserror::Error;

/// Operators in the order they are tried.
pub const OPERATORS: [&str; 11] = ["|", "&", "!", "=", "!=", "<", ">", "<=", ">=", "-", "%"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprNode {
    Literal(String),
    Unary(&'static str, Box<ExprNode>),
    Binary(&'static str, Box<ExprNode>, Box<ExprNode>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("parentheses are not well-nested")]
    UnbalancedParens,
    #[error("cannot parse '{0}'")]
    Unparseable(String),
}

impl ExprNode {
    pub fn literal(&self) -> Option<&str> {
        match self {
            ExprNode::Literal(s) => Some(s),
            _ => None,
        }
    }

    /// True for a literal made only of ASCII digits (at least one).
    pub fn is_number(&self) -> bool {
        self.literal()
            .is_some_and(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
    }
}

pub fn parse(text: &str) -> Result<ExprNode, ParseError> {
    let text = text.trim();
    check_nesting(text)?;

    if let Some(inner) = strip_outer_parens(text) {
        return parse(inner);
    }

    for op in OPERATORS {
        let Some(pos) = text.find(op) else {
            continue;
        };
        let left = &text[..pos];
        let right = &text[pos + op.len()..];

        if op == "!" {
            if let Ok(operand) = parse(right) {
                return Ok(ExprNode::Unary(op, Box::new(operand)));
            }
            continue;
        }

        if let (Ok(l), Ok(r)) = (parse(left), parse(right)) {
            return Ok(ExprNode::Binary(op, Box::new(l), Box::new(r)));
        }
    }

    if text.chars().any(char::is_whitespace) {
        return Err(ParseError::Unparseable(text.to_string()));
    }
    Ok(ExprNode::Literal(text.to_string()))
}

fn check_nesting(text: &str) -> Result<(), ParseError> {
    let mut depth: i64 = 0;
    for c in text.chars() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 {
                    return Err(ParseError::UnbalancedParens);
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ParseError::UnbalancedParens);
    }
    Ok(())
}

/// Returns the inside of `(...)` when the opening paren at the start is
/// closed by the final character and not earlier.
fn strip_outer_parens(text: &str) -> Option<&str> {
    if !(text.starts_with('(') && text.ends_with(')')) || text.len() < 2 {
        return None;
    }
    let mut depth = 0;
    let last = text.len() - 1;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 && i != last {
                    return None;
                }
            }
            _ => {}
        }
    }
    Some(&text[1..last])
}
