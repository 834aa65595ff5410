// File: ./src/tui/state.rs
// Manages the application state for the TUI.
use crate::document::{CalendarDocument, EditError};
use crate::model::Capabilities;
use crate::projector::{
    DisplayItem, Projection, ProjectionError, SearchMode, ViewMode, ViewProjector,
};
use crate::tui::cursor::ListCursor;
use crate::tui::menu::MenuModel;

pub struct AppState {
    // Data
    pub document: CalendarDocument,
    pub projector: ViewProjector,
    pub view: ViewMode,
    pub projection: Projection,

    // UI State
    pub cursor: ListCursor,
    pub menu: MenuModel,
    pub header: String,
    pub message: String,

    // Settings
    pub search_mode: SearchMode,
}

impl AppState {
    /// Builds the state and the first projection. A calendar the oracle
    /// rejects at this point cannot be browsed, so the error is returned.
    pub fn new(
        document: CalendarDocument,
        projector: ViewProjector,
        view: ViewMode,
        search_mode: SearchMode,
    ) -> Result<Self, ProjectionError> {
        let projection = document.project(&projector, &view)?;
        let mut state = Self {
            document,
            projector,
            view,
            projection,
            cursor: ListCursor::new(1),
            menu: MenuModel::default(),
            header: String::new(),
            message: String::new(),
            search_mode,
        };
        state.refresh_header();
        state.sync();
        Ok(state)
    }

    pub fn refresh_header(&mut self) {
        self.header = match self.projector.oracle().today() {
            Ok(today) => today,
            Err(e) => {
                log::warn!("Could not get today's date: {}", e);
                String::new()
            }
        };
    }

    /// Brings the projection up to date with the document, then the cursor
    /// with the projection, then the menu with the selection. Run once per
    /// frame, before drawing and before reading a key.
    pub fn sync(&mut self) {
        if self.projection.generation != self.document.generation() {
            self.refresh_header();
            match self.document.project(&self.projector, &self.view) {
                Ok(p) => self.projection = p,
                Err(e) => {
                    log::error!("Re-projection failed: {}", e);
                    self.message = format!("Error: {}", e);
                    self.projection = Projection {
                        items: Vec::new(),
                        generation: self.document.generation(),
                    };
                }
            }
        }
        self.cursor.set_len(self.projection.len());
        let caps = self.selection_capabilities();
        self.menu.rebuild(caps.as_ref());
    }

    pub fn selected_item(&self) -> Option<&DisplayItem> {
        self.cursor
            .selection()
            .and_then(|idx| self.projection.get(idx))
    }

    /// Index and text of the source line behind the selected item.
    pub fn selected_line(&self) -> Option<(usize, &str)> {
        let item = self.selected_item()?;
        self.document.line(item.line).map(|text| (item.line, text))
    }

    pub fn selection_capabilities(&self) -> Option<Capabilities> {
        let item = self.selected_item()?;
        let line = self.document.line(item.line)?;
        Some(Capabilities::of(line, &item.text))
    }

    /// Installs the projection of a committed edit.
    pub fn accept(&mut self, projection: Projection) {
        self.projection = projection;
        self.refresh_header();
        self.sync();
    }

    pub fn update_line(&mut self, index: usize, text: &str) -> Result<(), EditError> {
        let p = self
            .document
            .update_line(index, text, &self.projector, &self.view)?;
        self.accept(p);
        Ok(())
    }

    pub fn delete_line(&mut self, index: usize) -> Result<(), EditError> {
        let p = self.document.delete_line(index, &self.projector, &self.view)?;
        self.accept(p);
        Ok(())
    }

    pub fn append_line(&mut self, text: &str) -> Result<(), EditError> {
        let p = self.document.append_line(text, &self.projector, &self.view)?;
        self.accept(p);
        Ok(())
    }

    /// Switches to `view` only if the document projects under it.
    pub fn set_view(&mut self, view: ViewMode) -> Result<(), ProjectionError> {
        let projection = self.document.project(&self.projector, &view)?;
        self.view = view;
        self.projection = projection;
        self.cursor.top();
        self.refresh_header();
        self.sync();
        Ok(())
    }

    pub fn month_calendar(&self) -> Result<String, crate::oracle::OracleError> {
        self.projector.month_calendar(self.document.lines())
    }
}
