// File: ./src/projector.rs
//! Renders the calendar through the oracle and maps each rendered line back
//! to the source line it came from.
//!
//! The oracle sees a numbered working copy where every non-blank line ends in
//! `-<index>`. Its output lines carry that suffix through, which is how a
//! displayed item knows which line an edit must touch.

use crate::oracle::{ERROR_SENTINEL, Oracle, OracleError, Window};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use strum::{Display, EnumString};
use thiserror::Error;

/// Positional fields `when` puts in front of the event text
/// (day, year, month, day of month).
const PREFIX_FIELDS: usize = 4;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("invalid date expression: {0}")]
    InvalidExpression(String),
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("the oracle referenced line {0}, which does not exist")]
    DanglingReference(usize),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SearchMode {
    Substring,
    #[default]
    CaseInsensitive,
    Regex,
}

#[derive(Debug, Clone)]
pub struct SearchPattern {
    source: String,
    mode: SearchMode,
    regex: Regex,
}

impl SearchPattern {
    pub fn new(source: &str, mode: SearchMode) -> Result<Self, regex::Error> {
        let regex = match mode {
            SearchMode::Substring => Regex::new(&regex::escape(source))?,
            SearchMode::CaseInsensitive => RegexBuilder::new(&regex::escape(source))
                .case_insensitive(true)
                .build()?,
            SearchMode::Regex => Regex::new(source)?,
        };
        Ok(Self {
            source: source.to_string(),
            mode,
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn matches(&self, description: &str) -> bool {
        self.regex.is_match(description)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewMode {
    pub past_days: Option<i32>,
    pub future_days: Option<i32>,
    pub search: Option<SearchPattern>,
}

impl ViewMode {
    pub fn window(&self) -> Window {
        Window {
            past_days: self.past_days,
            future_days: self.future_days,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayItem {
    pub text: String,
    /// Index of the source line in the document.
    pub line: usize,
}

/// Items in the oracle's order, stamped with the document generation they
/// were derived from.
#[derive(Debug, Clone, Default)]
pub struct Projection {
    pub items: Vec<DisplayItem>,
    pub generation: u64,
}

impl Projection {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&DisplayItem> {
        self.items.get(idx)
    }

    pub fn back_refs(&self) -> Vec<usize> {
        self.items.iter().map(|i| i.line).collect()
    }
}

pub struct ViewProjector {
    oracle: Box<dyn Oracle>,
}

impl ViewProjector {
    pub fn new(oracle: Box<dyn Oracle>) -> Self {
        Self { oracle }
    }

    pub fn oracle(&self) -> &dyn Oracle {
        self.oracle.as_ref()
    }

    /// Projects `lines` under `view`. Fails if the oracle flags any
    /// expression in the document, not only in the displayed window.
    pub fn project(
        &self,
        lines: &[String],
        view: &ViewMode,
        generation: u64,
    ) -> Result<Projection, ProjectionError> {
        let output = self.oracle.render(&working_copy(lines), view.window())?;
        let items = parse_rendered(&output, lines.len())?
            .into_iter()
            .filter(|item| match &view.search {
                Some(pattern) => pattern.matches(description(&item.text)),
                None => true,
            })
            .collect();
        Ok(Projection { items, generation })
    }

    pub fn month_calendar(&self, lines: &[String]) -> Result<String, OracleError> {
        self.oracle.month_calendar(&working_copy(lines))
    }
}

/// Suffixes every non-blank line with `-<index>`.
pub fn working_copy(lines: &[String]) -> String {
    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            out.push_str(line);
        } else {
            out.push_str(&format!("{}-{}", line, i));
        }
        out.push('\n');
    }
    out
}

fn numbered_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+)-(\d+)$").expect("static numbered-line regex"))
}

fn description_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^\s*(?:\S+\s+){{{}}}(.*)$", PREFIX_FIELDS))
            .expect("static description regex")
    })
}

pub fn parse_rendered(output: &str, line_count: usize) -> Result<Vec<DisplayItem>, ProjectionError> {
    let mut items = Vec::new();
    for raw in output.lines() {
        if raw.starts_with(ERROR_SENTINEL) {
            return Err(ProjectionError::InvalidExpression(raw.to_string()));
        }
        let Some(caps) = numbered_line().captures(raw) else {
            continue;
        };
        let line: usize = caps[2]
            .parse()
            .map_err(|_| ProjectionError::InvalidExpression(raw.to_string()))?;
        if line >= line_count {
            return Err(ProjectionError::DanglingReference(line));
        }
        items.push(DisplayItem {
            text: caps[1].to_string(),
            line,
        });
    }
    Ok(items)
}

/// Event text of a rendered line, after the oracle's date fields.
pub fn description(rendered: &str) -> &str {
    description_regex()
        .captures(rendered)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_copy_numbers_non_blank_lines() {
        let lines = vec![
            "j=5, dentist".to_string(),
            "".to_string(),
            "# old".to_string(),
            "  ".to_string(),
        ];
        assert_eq!(working_copy(&lines), "j=5, dentist-0\n\n# old-2\n  \n");
    }

    #[test]
    fn test_parse_rendered_keeps_oracle_order() {
        let out = "today     2026 Oct 19 b-3\n\ntomorrow  2026 Oct 20 a-1\n";
        let items = parse_rendered(out, 4).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].line, 3);
        assert_eq!(items[0].text, "today     2026 Oct 19 b");
        assert_eq!(items[1].line, 1);
    }

    #[test]
    fn test_parse_rendered_sentinel_and_dangling() {
        assert!(matches!(
            parse_rendered("today 2026 Oct 19 a-0\n*error\n", 1),
            Err(ProjectionError::InvalidExpression(_))
        ));
        assert!(matches!(
            parse_rendered("today 2026 Oct 19 a-7\n", 2),
            Err(ProjectionError::DanglingReference(7))
        ));
    }

    #[test]
    fn test_description_skips_four_fields() {
        assert_eq!(
            description("today     2026 Oct 19 Call the bank, ask for Bob"),
            "Call the bank, ask for Bob"
        );
        assert_eq!(description("sun 2026 Oct"), "");
    }

    #[test]
    fn test_search_modes() {
        let sub = SearchPattern::new("Bank", SearchMode::Substring).unwrap();
        assert!(sub.matches("call Bank"));
        assert!(!sub.matches("call bank"));

        let ci = SearchPattern::new("bank.", SearchMode::CaseInsensitive).unwrap();
        assert!(ci.matches("call BANK."));
        assert!(!ci.matches("call banks"));

        let re = SearchPattern::new("^call (bank|mom)$", SearchMode::Regex).unwrap();
        assert!(re.matches("call mom"));
        assert!(SearchPattern::new("(", SearchMode::Regex).is_err());
    }

    #[test]
    fn test_search_mode_names() {
        assert_eq!("case_insensitive".parse::<SearchMode>().unwrap(), SearchMode::CaseInsensitive);
        assert_eq!(SearchMode::Regex.to_string(), "regex");
    }
}
