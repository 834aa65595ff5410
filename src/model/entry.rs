// Splits calendar lines into their date expression and event text.

/// Blank lines and `#` comments are ignored by the oracle.
pub fn is_inert(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Text before the first comma. Lines without a comma have no expression.
pub fn expression(line: &str) -> Option<&str> {
    if is_inert(line) {
        return None;
    }
    line.split_once(',').map(|(expr, _)| expr)
}

/// Event text after the first comma, with surrounding whitespace removed.
pub fn event_text(line: &str) -> Option<&str> {
    line.split_once(',').map(|(_, text)| text.trim())
}

/// Replaces the date expression of `line`, keeping the whitespace that
/// framed the old expression and every byte from the comma on. `None` when
/// `line` has no comma, or when `new_expression` has one, since that would
/// move the start of the event text.
pub fn with_expression(line: &str, new_expression: &str) -> Option<String> {
    if new_expression.contains(',') {
        return None;
    }
    let (expr, rest) = line.split_once(',')?;
    let lead = &expr[..expr.len() - expr.trim_start().len()];
    let trail = &expr[expr.trim_end().len()..];
    // An all-whitespace expression is counted once, as leading space.
    let trail = if expr.trim().is_empty() { "" } else { trail };
    Some(format!("{}{}{},{}", lead, new_expression.trim(), trail, rest))
}

pub fn commented_out(line: &str) -> String {
    format!("#{}", line)
}
