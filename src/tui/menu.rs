// Per-selection action menu with a highlight that sticks to its label.
use crate::model::Capabilities;
use crate::tui::action::ActionKind;
use strum::IntoEnumIterator;

#[derive(Debug, Clone)]
pub struct MenuModel {
    actions: Vec<ActionKind>,
    highlighted: usize,
    last_label: Option<String>,
}

impl Default for MenuModel {
    fn default() -> Self {
        let mut menu = Self {
            actions: Vec::new(),
            highlighted: 0,
            last_label: None,
        };
        menu.rebuild(None);
        menu
    }
}

impl MenuModel {
    /// Recomputes the actions for the current selection. The previously
    /// highlighted action stays highlighted if it is still offered.
    pub fn rebuild(&mut self, caps: Option<&Capabilities>) {
        self.actions = ActionKind::iter().filter(|a| a.enabled(caps)).collect();
        self.highlighted = self
            .last_label
            .as_deref()
            .and_then(|label| self.actions.iter().position(|a| a.to_string() == label))
            .unwrap_or(0);
        self.remember();
    }

    pub fn actions(&self) -> &[ActionKind] {
        &self.actions
    }

    pub fn highlighted(&self) -> usize {
        self.highlighted
    }

    pub fn highlighted_action(&self) -> Option<ActionKind> {
        self.actions.get(self.highlighted).copied()
    }

    pub fn left(&mut self) {
        self.highlighted = self.highlighted.saturating_sub(1);
        self.remember();
    }

    pub fn right(&mut self) {
        if self.highlighted + 1 < self.actions.len() {
            self.highlighted += 1;
        }
        self.remember();
    }

    /// Space picks the highlighted action; other keys look up bindings of
    /// the actions currently offered.
    pub fn resolve(&self, key: char) -> Option<ActionKind> {
        if key == ' ' {
            return self.highlighted_action();
        }
        self.actions.iter().copied().find(|a| a.keys().contains(&key))
    }

    fn remember(&mut self) {
        if let Some(action) = self.highlighted_action() {
            self.last_label = Some(action.to_string());
        }
    }
}
