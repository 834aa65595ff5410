// File: ./src/cli.rs
//! Command-line arguments and how they override the configuration.

use crate::config::Config;
use crate::projector::{SearchMode, SearchPattern, ViewMode};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(
    name = "someday",
    version,
    about = "Browse and edit your `when` calendar",
    long_about = "Browse the entries `when` considers due, and delete, reschedule, comment out, \
advance, duplicate or create entries. Every edit is checked by running `when` on the result \
before it is kept; the calendar file is only written on exit, after a backup.",
    after_help = "Keys:\n  Up/Down, j/k     move through the items\n  Left/Right, h/l  move through the menu\n  Space            run the highlighted action\n  Enter            show the whole item\n  q, Esc           save and quit"
)]
pub struct Args {
    /// Use a different directory for config and logs.
    #[arg(short = 'r', long = "root")]
    pub root: Option<PathBuf>,

    /// Calendar file (default: taken from ~/.when/preferences).
    #[arg(short = 'c', long = "calendar")]
    pub calendar: Option<PathBuf>,

    /// Command used to run `when`.
    #[arg(long = "oracle")]
    pub oracle: Option<String>,

    /// Days before today to show.
    #[arg(short = 'p', long = "past", allow_negative_numbers = true)]
    pub past: Option<i32>,

    /// Days after today to show.
    #[arg(short = 'f', long = "future", allow_negative_numbers = true)]
    pub future: Option<i32>,

    /// Only show items whose text matches this pattern.
    #[arg(short = 's', long = "search")]
    pub search: Option<String>,

    /// How --search is matched: substring, case_insensitive or regex.
    #[arg(long = "search-mode", value_parser = parse_search_mode)]
    pub search_mode: Option<SearchMode>,

    /// Log at debug level.
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

fn parse_search_mode(s: &str) -> Result<SearchMode, String> {
    s.parse()
        .map_err(|_| format!("unknown search mode '{}' (substring, case_insensitive, regex)", s))
}

impl Args {
    /// Folds the flags into `cfg`; flags win.
    pub fn apply_to(&self, cfg: &mut Config) {
        if let Some(calendar) = &self.calendar {
            cfg.calendar = Some(calendar.clone());
        }
        if let Some(oracle) = &self.oracle {
            cfg.oracle = oracle.clone();
        }
        if self.past.is_some() {
            cfg.past_days = self.past;
        }
        if self.future.is_some() {
            cfg.future_days = self.future;
        }
        if let Some(mode) = self.search_mode {
            cfg.search_mode = mode;
        }
        if self.verbose {
            cfg.log_level = "debug".to_string();
        }
    }

    /// Initial view. A bad pattern given on the command line is fatal.
    pub fn initial_view(&self, cfg: &Config) -> Result<ViewMode> {
        let search = match &self.search {
            Some(p) if !p.is_empty() => Some(
                SearchPattern::new(p, cfg.search_mode)
                    .with_context(|| format!("Invalid search pattern '{}'", p))?,
            ),
            _ => None,
        };
        Ok(ViewMode {
            past_days: cfg.past_days,
            future_days: cfg.future_days,
            search,
        })
    }
}
