// Predicates deciding which structural edits an entry supports.
//
// Everything here is total: a parse failure simply makes the predicate false.
// Threshold detection deliberately looks at the raw text with the same lexical
// rule `when` applies, not at the parse tree.
use crate::model::entry;
use crate::model::expr::{ExprNode, parse};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    /// `j > N`, ordinal day.
    Julian,
    /// `y > N`, year.
    Yearly,
}

impl Threshold {
    pub fn variable(self) -> &'static str {
        match self {
            Threshold::Julian => "j",
            Threshold::Yearly => "y",
        }
    }

    fn pattern(self) -> &'static Regex {
        static JULIAN: OnceLock<Regex> = OnceLock::new();
        static YEARLY: OnceLock<Regex> = OnceLock::new();
        let (cell, src) = match self {
            Threshold::Julian => (&JULIAN, r"\b(j\s*>\s*)(\d+)\b"),
            Threshold::Yearly => (&YEARLY, r"\b(y\s*>\s*)(\d+)\b"),
        };
        cell.get_or_init(|| Regex::new(src).expect("static threshold regex"))
    }

    fn occurs_once_in(self, d: &str) -> bool {
        self.pattern().find_iter(d).count() == 1
    }
}

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("static url regex"))
}

pub fn is_literal_date(d: &str) -> bool {
    if parse(d).is_ok() {
        return false;
    }
    let tokens: Vec<&str> = d.split_whitespace().collect();
    tokens.len() == 3 && !tokens.contains(&"*")
}

pub fn happens_only_once(d: &str) -> bool {
    if is_literal_date(d) {
        return true;
    }
    match parse(d) {
        Ok(ExprNode::Binary("=", a, b)) => {
            (a.literal() == Some("j") && b.is_number())
                || (b.literal() == Some("j") && a.is_number())
        }
        _ => false,
    }
}

pub fn has_julian_threshold(d: &str) -> bool {
    Threshold::Julian.occurs_once_in(d)
}

pub fn has_yearly_threshold(d: &str) -> bool {
    Threshold::Yearly.occurs_once_in(d)
}

pub fn variable_to_replace(d: &str) -> Option<Threshold> {
    if has_julian_threshold(d) {
        Some(Threshold::Julian)
    } else if has_yearly_threshold(d) {
        Some(Threshold::Yearly)
    } else {
        None
    }
}

pub fn is_advanceable(d: &str) -> bool {
    let Some(var) = variable_to_replace(d) else {
        return false;
    };
    match parse(d) {
        Ok(tree) => has_threshold_conjunct(&tree, var.variable()),
        Err(_) => false,
    }
}

fn is_threshold_node(node: &ExprNode, var: &str) -> bool {
    matches!(node, ExprNode::Binary(">", l, r) if l.literal() == Some(var) && r.is_number())
}

/// Looks at the node itself, then down the right spine of an `&` chain.
fn has_threshold_conjunct(node: &ExprNode, var: &str) -> bool {
    if is_threshold_node(node, var) {
        return true;
    }
    match node {
        ExprNode::Binary("&", l, r) => is_threshold_node(l, var) || has_threshold_conjunct(r, var),
        _ => false,
    }
}

pub fn contains_url(text: &str) -> bool {
    url_regex().is_match(text)
}

pub fn first_url(text: &str) -> Option<&str> {
    url_regex().find(text).map(|m| m.as_str())
}

/// Rewrites the number of the single threshold clause in the date expression
/// of `line`. Nothing outside the number changes.
pub fn advance(line: &str, threshold: Threshold, value: i64) -> Option<String> {
    let expr = entry::expression(line)?;
    if !threshold.occurs_once_in(expr) {
        return None;
    }
    let replaced = threshold
        .pattern()
        .replace(expr, |caps: &regex::Captures| format!("{}{}", &caps[1], value));
    Some(format!("{}{}", replaced, &line[expr.len()..]))
}

/// What the currently selected entry allows, computed once per frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub happens_once: bool,
    pub advanceable: bool,
    pub has_url: bool,
}

impl Capabilities {
    pub fn of(source_line: &str, rendered: &str) -> Self {
        let expr = entry::expression(source_line).unwrap_or("");
        Self {
            happens_once: happens_only_once(expr),
            advanceable: is_advanceable(expr),
            has_url: contains_url(rendered),
        }
    }
}
