//! TUI screen definitions.
//!
//! Each screen corresponds to a tab. Screens read the [`AppContext`] to draw
//! and hand edits back as [`ScreenAction`]s; only the app applies them.

mod apis;
mod teams;
mod values;

use std::fmt;

use crossterm::event::KeyCode;
use ratatui::prelude::*;

use apidash_core::{AppContext, EditIntent, Notification};

/// Screen identifiers, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScreenId {
    Apis,
    Teams,
    Values,
}

impl ScreenId {
    pub(crate) const ALL: [ScreenId; 3] = [Self::Apis, Self::Teams, Self::Values];
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apis => write!(f, "APIs"),
            Self::Teams => write!(f, "Teams"),
            Self::Values => write!(f, "Valid Values"),
        }
    }
}

/// What a key press asks the app to do.
#[derive(Debug)]
pub(crate) enum ScreenAction {
    Apply(EditIntent),
    Notify(Notification),
}

/// State for every screen.
pub(crate) struct Screens {
    pub apis: apis::ApisScreen,
    pub teams: teams::TeamsScreen,
    pub values: values::ValuesScreen,
}

impl Screens {
    pub(crate) fn new() -> Self {
        Self {
            apis: apis::ApisScreen::new(),
            teams: teams::TeamsScreen::new(),
            values: values::ValuesScreen,
        }
    }

    /// Whether the screen is capturing keys (text input or a confirmation).
    pub(crate) fn is_editing(&self, id: ScreenId) -> bool {
        match id {
            ScreenId::Apis => self.apis.is_editing(),
            ScreenId::Teams => self.teams.is_editing(),
            ScreenId::Values => false,
        }
    }

    /// Keep selections inside the current row counts.
    pub(crate) fn clamp(&mut self, ctx: &AppContext) {
        self.apis.clamp(ctx.visible_apis().len());
        self.teams.clamp(ctx.catalog().teams().len());
    }

    pub(crate) fn draw(&self, id: ScreenId, f: &mut Frame, area: Rect, ctx: &AppContext) {
        match id {
            ScreenId::Apis => self.apis.draw(f, area, ctx),
            ScreenId::Teams => self.teams.draw(f, area, ctx),
            ScreenId::Values => self.values.draw(f, area, ctx),
        }
    }

    pub(crate) fn handle_key(
        &mut self,
        id: ScreenId,
        code: KeyCode,
        ctx: &mut AppContext,
    ) -> Option<ScreenAction> {
        match id {
            ScreenId::Apis => self.apis.handle_key(code, ctx),
            ScreenId::Teams => self.teams.handle_key(code, ctx),
            ScreenId::Values => self.values.handle_key(code),
        }
    }
}
