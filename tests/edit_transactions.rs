// File: tests/edit_transactions.rs
mod common;

use common::{FakeOracle, document, projector};
use someday::document::EditError;
use someday::projector::{ProjectionError, SearchMode, SearchPattern, ViewMode, ViewProjector};
use someday::tui::state::AppState;

fn lines(doc: &someday::document::CalendarDocument) -> Vec<String> {
    doc.lines().to_vec()
}

// --- Rollback leaves no trace ---
#[test]
fn test_rejected_edit_restores_document() {
    let mut doc = document(&["j=61000, dentist", "# note", "w=mon, gym"]);
    let before = lines(&doc);
    let projector = projector();
    let view = ViewMode::default();

    let err = doc
        .update_line(0, "(j>5 , dentist", &projector, &view)
        .unwrap_err();
    assert!(matches!(
        err,
        EditError::Rejected(ProjectionError::InvalidExpression(_))
    ));

    assert_eq!(lines(&doc), before);
    assert_eq!(doc.generation(), 0);
    assert!(!doc.is_modified());
}

#[test]
fn test_rejected_append_pops_the_line() {
    let mut doc = document(&["w=mon, gym"]);
    let projector = projector();
    let view = ViewMode::default();

    assert!(doc.append_line("no comma here", &projector, &view).is_err());
    assert_eq!(doc.len(), 1);
    assert!(!doc.is_modified());
}

#[test]
fn test_commit_bumps_generation_and_returns_projection() {
    let mut doc = document(&["j=61000, dentist", "w=mon, gym"]);
    let projector = projector();
    let view = ViewMode::default();

    let projection = doc
        .update_line(1, "w=tue, gym", &projector, &view)
        .unwrap();

    assert_eq!(doc.line(1), Some("w=tue, gym"));
    assert_eq!(doc.generation(), 1);
    assert!(doc.is_modified());
    assert_eq!(projection.generation, 1);
    assert_eq!(projection.back_refs(), vec![0, 1]);
}

#[test]
fn test_append_then_delete_round_trip() {
    let mut doc = document(&["j=61000, dentist", "", "w=mon, gym"]);
    let before = lines(&doc);
    let projector = projector();
    let view = ViewMode::default();

    let appended = doc.append_line("2026 oct 20, party", &projector, &view).unwrap();
    assert_eq!(appended.back_refs(), vec![0, 2, 3]);

    doc.delete_line(3, &projector, &view).unwrap();
    assert_eq!(lines(&doc), before);
    assert_eq!(doc.generation(), 2);
    // Content is back, but the file was still edited.
    assert!(doc.is_modified());
}

#[test]
fn test_blank_replacement_deletes() {
    let mut doc = document(&["j=61000, dentist", "w=mon, gym"]);
    let projector = projector();
    let view = ViewMode::default();

    doc.update_line(0, "   ", &projector, &view).unwrap();
    assert_eq!(lines(&doc), vec!["w=mon, gym".to_string()]);
}

#[test]
fn test_missing_line_is_reported() {
    let mut doc = document(&["w=mon, gym"]);
    let projector = projector();
    let view = ViewMode::default();

    assert!(matches!(
        doc.delete_line(5, &projector, &view),
        Err(EditError::NoSuchLine(5))
    ));
    assert_eq!(doc.generation(), 0);
}

#[test]
fn test_whole_document_is_validated() {
    // The broken line is hidden from the view, yet no edit can commit
    // while it is there.
    let mut doc = document(&["w=mon, gym", "(never, broken"]);
    let projector = projector();
    let view = ViewMode::default();

    assert!(doc.project(&projector, &view).is_err());
    assert!(doc.append_line("w=tue, swim", &projector, &view).is_err());
    assert_eq!(doc.len(), 2);
}

// --- Projection ---
#[test]
fn test_inert_lines_never_show() {
    let doc = document(&["# w=mon, commented", "", "never, hidden", "w=mon, gym"]);
    let projection = doc.project(&projector(), &ViewMode::default()).unwrap();
    assert_eq!(projection.back_refs(), vec![3]);
    assert_eq!(projection.items[0].text, "today     2026 Oct 19 gym");
}

#[test]
fn test_search_filters_on_description_only() {
    let doc = document(&["w=mon, Dentist", "w=mon, gym", "w=mon, today's walk"]);
    let view = ViewMode {
        search: Some(SearchPattern::new("dentist", SearchMode::CaseInsensitive).unwrap()),
        ..ViewMode::default()
    };
    let projection = doc.project(&projector(), &view).unwrap();
    assert_eq!(projection.back_refs(), vec![0]);

    // "today" is a date field, not part of the description.
    let view = ViewMode {
        search: Some(SearchPattern::new("today", SearchMode::Substring).unwrap()),
        ..ViewMode::default()
    };
    let projection = doc.project(&projector(), &view).unwrap();
    assert_eq!(projection.back_refs(), vec![2]);
}

#[test]
fn test_each_edit_reprojects_once() {
    let oracle = FakeOracle::new();
    let renders = oracle.renders.clone();
    let projector = ViewProjector::new(Box::new(oracle));
    let mut doc = document(&["w=mon, gym"]);
    let view = ViewMode::default();

    doc.update_line(0, "w=tue, gym", &projector, &view).unwrap();
    let _ = doc.update_line(0, "(w=tue, gym", &projector, &view);
    assert_eq!(renders.get(), 2);
}

// --- Oracle failures ---
#[test]
fn test_failing_oracle_rolls_back_like_a_rejection() {
    let oracle = FakeOracle::new();
    let failing = oracle.failing.clone();
    let projector = ViewProjector::new(Box::new(oracle));
    let mut doc = document(&["w=mon, gym", "j=61000, dentist"]);
    let before = lines(&doc);
    let view = ViewMode::default();

    failing.set(true);
    let err = doc.update_line(0, "w=tue, gym", &projector, &view).unwrap_err();
    assert!(matches!(
        err,
        EditError::Rejected(ProjectionError::Oracle(_))
    ));
    assert!(doc.delete_line(1, &projector, &view).is_err());
    assert!(doc.append_line("w=fri, swim", &projector, &view).is_err());

    assert_eq!(lines(&doc), before);
    assert_eq!(doc.generation(), 0);
    assert!(!doc.is_modified());

    // Once the oracle answers again, the same edit goes through.
    failing.set(false);
    doc.update_line(0, "w=tue, gym", &projector, &view).unwrap();
    assert_eq!(doc.line(0), Some("w=tue, gym"));
}

#[test]
fn test_failing_oracle_at_first_load_is_fatal() {
    let oracle = FakeOracle::new();
    oracle.failing.set(true);

    let result = AppState::new(
        document(&["w=mon, gym"]),
        ViewProjector::new(Box::new(oracle)),
        ViewMode::default(),
        SearchMode::CaseInsensitive,
    );
    assert!(matches!(result, Err(ProjectionError::Oracle(_))));
}
