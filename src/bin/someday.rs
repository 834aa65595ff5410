use anyhow::{Context, Result};
use clap::Parser;
use someday::cli::Args;
use someday::config::Config;
use someday::context::{AppContext, StandardContext};
use someday::document::{CalendarDocument, SaveOutcome};
use someday::oracle::WhenOracle;
use someday::projector::ViewProjector;
use someday::tui::{self, state::AppState};
use std::fs::File;
use std::io::{self, Write};

fn main() {
    if let Err(e) = run() {
        log::error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let ctx = StandardContext::new(args.root.clone());

    let mut cfg = Config::load(&ctx)?;
    args.apply_to(&mut cfg);
    init_logging(&ctx, &cfg);
    if let Some(path) = ctx.get_panic_log_path() {
        tui::install_panic_hook(path);
    }

    let calendar = cfg.calendar_path(&ctx)?;
    log::info!("Calendar {} checked by '{}'", calendar.display(), cfg.oracle);
    let document = CalendarDocument::load(&calendar)?;
    let oracle = WhenOracle::new(&cfg.oracle, &calendar)?;
    let projector = ViewProjector::new(Box::new(oracle));
    let view = args.initial_view(&cfg)?;

    let mut state = AppState::new(document, projector, view, cfg.search_mode)
        .with_context(|| format!("'{}' could not read {}", cfg.oracle, calendar.display()))?;

    let browsed = tui::run(&mut state);
    // Committed edits are valid even if the loop failed, so save them first.
    save(&mut state.document, &cfg.backup_suffix)?;
    browsed
}

/// Logs go to a file: the terminal belongs to the TUI.
fn init_logging(ctx: &dyn AppContext, cfg: &Config) {
    let Ok(path) = ctx.get_log_path() else {
        return;
    };
    match File::create(&path) {
        Ok(file) => {
            if let Err(e) =
                simplelog::WriteLogger::init(cfg.log_level(), simplelog::Config::default(), file)
            {
                eprintln!("Warning: cannot start logging to {}: {}", path.display(), e);
            }
        }
        Err(e) => eprintln!("Warning: cannot write log file {}: {}", path.display(), e),
    }
}

fn save(document: &mut CalendarDocument, backup_suffix: &str) -> Result<()> {
    match document.save(backup_suffix, false)? {
        SaveOutcome::Unchanged => {}
        SaveOutcome::Saved { backup } => {
            println!(
                "Saved {} (previous version in {}).",
                document.path().display(),
                backup.display()
            );
        }
        SaveOutcome::Conflict => {
            print!(
                "{} was changed by another program while you were editing it.\nOverwrite it with your version? [y/N] ",
                document.path().display()
            );
            io::stdout().flush()?;
            let mut answer = String::new();
            io::stdin().read_line(&mut answer)?;
            if answer.trim().eq_ignore_ascii_case("y") {
                if let SaveOutcome::Saved { backup } = document.save(backup_suffix, true)? {
                    println!(
                        "Saved {} (previous version in {}).",
                        document.path().display(),
                        backup.display()
                    );
                }
            } else {
                println!("Your changes were not saved.");
            }
        }
    }
    Ok(())
}
