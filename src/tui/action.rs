// Defines the actions the menu can offer for the selected item.
use crate::model::Capabilities;
use strum::{Display, EnumIter};

/// Declaration order is menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum ActionKind {
    Edit,
    New,
    #[strum(to_string = "View mode")]
    ViewMode,
    #[strum(to_string = "Calendar")]
    MonthlyCalendar,
    Delete,
    Reschedule,
    Comment,
    Advance,
    #[strum(to_string = "Browse url")]
    BrowseUrl,
    Duplicate,
}

impl ActionKind {
    pub fn keys(self) -> &'static [char] {
        match self {
            ActionKind::Edit => &['e'],
            ActionKind::New => &['n'],
            ActionKind::ViewMode => &['v'],
            ActionKind::MonthlyCalendar => &['m'],
            ActionKind::Delete => &['d'],
            ActionKind::Reschedule => &['r'],
            ActionKind::Comment => &['c', '#'],
            ActionKind::Advance => &['a'],
            ActionKind::BrowseUrl => &['b'],
            ActionKind::Duplicate => &['y'],
        }
    }

    /// `caps` is `None` when no item is selected.
    pub fn enabled(self, caps: Option<&Capabilities>) -> bool {
        match self {
            ActionKind::Edit
            | ActionKind::New
            | ActionKind::ViewMode
            | ActionKind::MonthlyCalendar => true,
            ActionKind::Delete | ActionKind::Reschedule | ActionKind::Comment => {
                caps.is_some_and(|c| c.happens_once)
            }
            ActionKind::Advance => caps.is_some_and(|c| c.advanceable),
            ActionKind::BrowseUrl => caps.is_some_and(|c| c.has_url),
            ActionKind::Duplicate => caps.is_some(),
        }
    }
}

/// Outcome of handling one key in the browsing loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}
