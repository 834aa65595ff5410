// File: ./src/config.rs
// Handles configuration loading, defaults, and locating the calendar file.
use crate::context::AppContext;
use crate::projector::SearchMode;
use anyhow::{Result, anyhow};
use log::LevelFilter;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const NO_CALENDAR_MESSAGE: &str = "No calendar configuration for 'when' was found.";

fn default_oracle() -> String {
    "when".to_string()
}

fn default_backup_suffix() -> String {
    ".bak".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    /// Command used to run the oracle.
    #[serde(default = "default_oracle")]
    pub oracle: String,
    /// Calendar file. When unset, the oracle's own preferences decide.
    #[serde(default)]
    pub calendar: Option<PathBuf>,
    #[serde(default)]
    pub when_preferences: Option<PathBuf>,

    #[serde(default)]
    pub past_days: Option<i32>,
    #[serde(default)]
    pub future_days: Option<i32>,
    #[serde(default)]
    pub search_mode: SearchMode,

    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oracle: default_oracle(),
            calendar: None,
            when_preferences: None,
            past_days: None,
            future_days: None,
            search_mode: SearchMode::default(),
            backup_suffix: default_backup_suffix(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load the configuration from disk. A missing file means defaults;
    /// an unreadable or malformed one is an error.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path).map_err(|e| {
            anyhow!("Failed to read config file '{}': {}", path.display(), e)
        })?;

        let config: Config = toml::from_str(&contents).map_err(|e| {
            anyhow!("Failed to parse config file '{}': {}", path.display(), e)
        })?;

        if config.backup_suffix.is_empty() {
            return Err(anyhow!(
                "Invalid config file '{}': backup_suffix must not be empty",
                path.display()
            ));
        }

        Ok(config)
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }

    /// Resolves the calendar file: explicit setting first, then the
    /// `calendar = ...` line of the oracle preferences.
    pub fn calendar_path(&self, ctx: &dyn AppContext) -> Result<PathBuf> {
        if let Some(path) = &self.calendar {
            return Ok(expand_home(path, ctx));
        }

        let prefs = match &self.when_preferences {
            Some(p) => expand_home(p, ctx),
            None => ctx
                .get_home_dir()
                .ok_or_else(|| anyhow!(NO_CALENDAR_MESSAGE))?
                .join(".when")
                .join("preferences"),
        };

        let contents = fs::read_to_string(&prefs)
            .map_err(|e| anyhow!("{} ({}: {})", NO_CALENDAR_MESSAGE, prefs.display(), e))?;
        let calendar = calendar_from_preferences(&contents).ok_or_else(|| anyhow!(NO_CALENDAR_MESSAGE))?;
        Ok(expand_home(Path::new(&calendar), ctx))
    }
}

/// Value of the first `calendar = <path>` line.
pub fn calendar_from_preferences(contents: &str) -> Option<String> {
    let re = Regex::new(r"(?m)^\s*calendar\s*=\s*(.+)$").ok()?;
    re.captures(contents)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

fn expand_home(path: &Path, ctx: &dyn AppContext) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~")
        && let Some(home) = ctx.get_home_dir()
    {
        return home.join(rest);
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;

    #[test]
    fn test_missing_file_gives_defaults() {
        let ctx = TestContext::new();
        let cfg = Config::load(&ctx).unwrap();
        assert_eq!(cfg.oracle, "when");
        assert_eq!(cfg.backup_suffix, ".bak");
        assert_eq!(cfg.search_mode, SearchMode::CaseInsensitive);
        assert_eq!(cfg.log_level(), LevelFilter::Info);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let ctx = TestContext::new();
        fs::write(
            ctx.get_config_file_path().unwrap(),
            "future_days = 14\nsearch_mode = \"regex\"\nlog_level = \"debug\"\n",
        )
        .unwrap();
        let cfg = Config::load(&ctx).unwrap();
        assert_eq!(cfg.future_days, Some(14));
        assert_eq!(cfg.past_days, None);
        assert_eq!(cfg.search_mode, SearchMode::Regex);
        assert_eq!(cfg.log_level(), LevelFilter::Debug);
        assert_eq!(cfg.oracle, "when");
    }

    #[test]
    fn test_syntax_error_is_reported_with_path() {
        let ctx = TestContext::new();
        fs::write(ctx.get_config_file_path().unwrap(), "future_days = = 3").unwrap();
        let err = Config::load(&ctx).unwrap_err();
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_empty_backup_suffix_is_rejected() {
        let ctx = TestContext::new();
        fs::write(ctx.get_config_file_path().unwrap(), "backup_suffix = \"\"\n").unwrap();
        let err = Config::load(&ctx).unwrap_err();
        assert!(err.to_string().contains("backup_suffix"));
    }

    #[test]
    fn test_calendar_from_preferences() {
        let prefs = "editor = vi\n  calendar = ~/cal/when.txt  \nwrap = 0\n";
        assert_eq!(
            calendar_from_preferences(prefs).as_deref(),
            Some("~/cal/when.txt")
        );
        assert_eq!(calendar_from_preferences("editor = vi\n"), None);
    }

    #[test]
    fn test_calendar_path_resolution() {
        let ctx = TestContext::new();
        let home = ctx.get_home_dir().unwrap();

        // No preferences at all is fatal.
        let err = Config::default().calendar_path(&ctx).unwrap_err();
        assert!(err.to_string().contains(NO_CALENDAR_MESSAGE));

        fs::create_dir_all(home.join(".when")).unwrap();
        fs::write(home.join(".when/preferences"), "calendar = ~/calendar\n").unwrap();
        assert_eq!(
            Config::default().calendar_path(&ctx).unwrap(),
            home.join("calendar")
        );

        let cfg = Config {
            calendar: Some(PathBuf::from("/tmp/explicit")),
            ..Config::default()
        };
        assert_eq!(cfg.calendar_path(&ctx).unwrap(), PathBuf::from("/tmp/explicit"));
    }
}
