// File: ./src/oracle.rs
//! The external `when` process, the only authority on date expressions.
//!
//! Nothing in this crate evaluates dates. Everything that needs to know
//! whether an entry is due, or whether an expression is well formed, goes
//! through an [`Oracle`]. `WhenOracle` shells out to the real program; tests
//! provide their own implementation of the trait.

use anyhow::{Result, bail};
use regex::Regex;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use thiserror::Error;

/// A rendered line starting with this character reports a malformed
/// expression somewhere in the input.
pub const ERROR_SENTINEL: char = '*';

/// Suffix of the numbered working copy written next to the calendar.
pub const WORKING_COPY_SUFFIX: &str = ".SOMEDAY";

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("could not run '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("could not write the working copy '{path}': {source}")]
    WorkingCopy {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("'{command}' exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("unexpected output: {0}")]
    UnexpectedOutput(String),
}

/// Day window around today that the oracle renders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Window {
    pub past_days: Option<i32>,
    pub future_days: Option<i32>,
}

pub trait Oracle {
    /// Renders the entries of `working_copy` that are due inside `window`,
    /// one per line, in the oracle's own order.
    fn render(&self, working_copy: &str, window: Window) -> Result<String, OracleError>;

    /// Ordinal day of a literal date, or of today when `date` is `None`.
    fn ordinal_day(&self, date: Option<&str>) -> Result<i64, OracleError>;

    /// Today's date as the oracle prints it.
    fn today(&self) -> Result<String, OracleError>;

    /// Month grid for the current month, marking days with entries.
    fn month_calendar(&self, working_copy: &str) -> Result<String, OracleError>;
}

#[derive(Debug)]
pub struct WhenOracle {
    command: String,
    working_copy: PathBuf,
    ordinals: RefCell<HashMap<Option<String>, i64>>,
}

impl WhenOracle {
    /// Refuses to start when a working copy for `calendar` already exists:
    /// another session is editing it, or a previous one crashed.
    pub fn new(command: &str, calendar: &Path) -> Result<Self> {
        let mut name = calendar.as_os_str().to_owned();
        name.push(WORKING_COPY_SUFFIX);
        let working_copy = PathBuf::from(name);
        if working_copy.exists() {
            bail!(
                "The calendar seems to be in edition. Delete the file {} and try again.",
                working_copy.display()
            );
        }
        Ok(Self {
            command: command.to_string(),
            working_copy,
            ordinals: RefCell::new(HashMap::new()),
        })
    }

    pub fn working_copy_path(&self) -> &Path {
        &self.working_copy
    }

    fn write_working_copy(&self, contents: &str) -> Result<(), OracleError> {
        fs::write(&self.working_copy, contents).map_err(|source| OracleError::WorkingCopy {
            path: self.working_copy.clone(),
            source,
        })
    }

    fn calendar_arg(&self) -> String {
        format!("--calendar={}", self.working_copy.display())
    }

    /// Runs the oracle and returns stdout. A failing exit status is an error
    /// unless stdout carries the sentinel, which the caller interprets.
    fn run(&self, args: &[String]) -> Result<String, OracleError> {
        log::debug!("Running {} {:?}", self.command, args);
        let output = Command::new(&self.command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| OracleError::Launch {
                command: self.command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() || has_sentinel(&stdout) {
            return Ok(stdout);
        }
        Err(OracleError::Failed {
            command: self.command.clone(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

impl Oracle for WhenOracle {
    fn render(&self, working_copy: &str, window: Window) -> Result<String, OracleError> {
        self.write_working_copy(working_copy)?;
        let mut args = vec![
            self.calendar_arg(),
            "--noheader".to_string(),
            "--wrap=0".to_string(),
        ];
        if let Some(past) = window.past_days {
            args.push(format!("--past={}", past));
        }
        if let Some(future) = window.future_days {
            args.push(format!("--future={}", future));
        }
        self.run(&args)
    }

    fn ordinal_day(&self, date: Option<&str>) -> Result<i64, OracleError> {
        let key = date.map(|d| d.trim().to_string());
        if let Some(cached) = self.ordinals.borrow().get(&key) {
            return Ok(*cached);
        }

        let mut args = vec!["j".to_string()];
        if let Some(d) = &key {
            args.extend(d.split_whitespace().map(str::to_string));
        }
        let out = self.run(&args)?;
        let day = last_integer(&out).ok_or_else(|| OracleError::UnexpectedOutput(out.clone()))?;

        self.ordinals.borrow_mut().insert(key, day);
        Ok(day)
    }

    fn today(&self) -> Result<String, OracleError> {
        Ok(self.run(&["d".to_string()])?.trim_end().to_string())
    }

    fn month_calendar(&self, working_copy: &str) -> Result<String, OracleError> {
        self.write_working_copy(working_copy)?;
        self.run(&[self.calendar_arg(), "c".to_string()])
    }
}

impl Drop for WhenOracle {
    fn drop(&mut self) {
        if self.working_copy.exists()
            && let Err(e) = fs::remove_file(&self.working_copy)
        {
            log::warn!(
                "Could not remove working copy {}: {}",
                self.working_copy.display(),
                e
            );
        }
    }
}

pub fn has_sentinel(output: &str) -> bool {
    output.lines().any(|l| l.starts_with(ERROR_SENTINEL))
}

fn last_integer(text: &str) -> Option<i64> {
    static INT: OnceLock<Regex> = OnceLock::new();
    let re = INT.get_or_init(|| Regex::new(r"-?\d+").expect("static integer regex"));
    re.find_iter(text).last()?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;

    #[test]
    fn test_last_integer() {
        assert_eq!(last_integer("Modified Julian day 61332\n"), Some(61332));
        assert_eq!(last_integer("2026 Oct 19 is day 61332"), Some(61332));
        assert_eq!(last_integer("no digits"), None);
    }

    #[test]
    fn test_sentinel_detection() {
        assert!(has_sentinel("today 2026 Oct 19 x-1\n*error in line 3\n"));
        assert!(!has_sentinel("today 2026 Oct 19 x *-1\n"));
    }

    #[test]
    fn test_existing_working_copy_refuses_start() {
        let ctx = TestContext::new();
        let calendar = ctx.root.join("calendar");
        fs::write(&calendar, "").unwrap();

        let oracle = WhenOracle::new("when", &calendar).unwrap();
        fs::write(oracle.working_copy_path(), "j=1, x-0\n").unwrap();

        let err = WhenOracle::new("when", &calendar).unwrap_err();
        assert!(err.to_string().contains("seems to be in edition"));

        // Dropping the first handle cleans its working copy up.
        drop(oracle);
        assert!(WhenOracle::new("when", &calendar).is_ok());
    }

    /// Writes an executable stand-in for `when` that logs each call to
    /// `calls` and then runs `body`.
    #[cfg(unix)]
    fn fake_when(ctx: &TestContext, body: &str) -> (String, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let calls = ctx.root.join("calls");
        let script = ctx.root.join("fake-when");
        fs::write(
            &script,
            format!("#!/bin/sh\necho \"$*\" >> '{}'\n{}\n", calls.display(), body),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        (script.to_string_lossy().to_string(), calls)
    }

    #[cfg(unix)]
    fn call_count(calls: &Path) -> usize {
        fs::read_to_string(calls).map(|s| s.lines().count()).unwrap_or(0)
    }

    #[cfg(unix)]
    #[test]
    fn test_ordinal_day_runs_once_per_date() {
        let ctx = TestContext::new();
        let (command, calls) = fake_when(&ctx, "echo 'Modified Julian day 61332'");
        let oracle = WhenOracle::new(&command, &ctx.root.join("calendar")).unwrap();

        assert_eq!(oracle.ordinal_day(None).unwrap(), 61332);
        assert_eq!(oracle.ordinal_day(None).unwrap(), 61332);
        assert_eq!(call_count(&calls), 1);

        // A different date is a different question.
        oracle.ordinal_day(Some("2026 oct 19")).unwrap();
        oracle.ordinal_day(Some(" 2026 oct 19 ")).unwrap();
        assert_eq!(call_count(&calls), 2);
        assert_eq!(
            fs::read_to_string(&calls).unwrap().lines().last(),
            Some("j 2026 oct 19")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_exit_status_is_an_error() {
        let ctx = TestContext::new();
        let (command, _) = fake_when(&ctx, "echo 'out of memory' >&2; exit 3");
        let oracle = WhenOracle::new(&command, &ctx.root.join("calendar")).unwrap();

        let err = oracle.render("w=mon, gym-0\n", Window::default()).unwrap_err();
        match err {
            OracleError::Failed { stderr, .. } => assert_eq!(stderr, "out of memory"),
            other => panic!("expected Failed, got {:?}", other),
        }
        // Failures are not cached.
        assert!(oracle.ordinal_day(None).is_err());
        assert!(oracle.ordinal_day(None).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_sentinel_output_is_returned_despite_exit_status() {
        let ctx = TestContext::new();
        let (command, _) = fake_when(&ctx, "echo '*** bad expression: (j>5'; exit 1");
        let oracle = WhenOracle::new(&command, &ctx.root.join("calendar")).unwrap();

        let out = oracle.render("(j>5, x-0\n", Window::default()).unwrap();
        assert!(has_sentinel(&out));
    }

    #[test]
    fn test_missing_binary_is_a_launch_error() {
        let ctx = TestContext::new();
        let calendar = ctx.root.join("calendar");
        let oracle = WhenOracle::new("someday-no-such-oracle-binary", &calendar).unwrap();
        let err = oracle.render("", Window::default()).unwrap_err();
        assert!(matches!(err, OracleError::Launch { .. }));
    }
}
