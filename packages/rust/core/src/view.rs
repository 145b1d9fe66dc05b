//! Front-end agnostic view state, edit intents and notifications.

use apidash_shared::{ApiRecord, Team, ValueList};

use crate::catalog::Catalog;
use crate::submit::ChangeAction;

/// Search and team filter applied to the API table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub search_term: String,
    /// `None` shows every team.
    pub team_filter: Option<String>,
}

impl ViewState {
    /// APIs passing the current filter and search, in catalog order.
    pub fn visible_apis<'a>(&self, catalog: &'a Catalog) -> Vec<&'a ApiRecord> {
        catalog.query(self.team_filter.as_deref().unwrap_or(""), &self.search_term)
    }

    /// Step the team filter through `All → team 1 → … → team n → All`.
    pub fn cycle_team_filter(&mut self, catalog: &Catalog) {
        let teams = catalog.teams();
        self.team_filter = match &self.team_filter {
            None => teams.first().map(|t| t.name.clone()),
            Some(current) => teams
                .iter()
                .position(|t| &t.name == current)
                .and_then(|idx| teams.get(idx + 1))
                .map(|t| t.name.clone()),
        };
    }

    /// Drop a filter that names a team the catalog no longer has.
    pub fn retain_valid(&mut self, catalog: &Catalog) {
        if let Some(team) = &self.team_filter {
            if catalog.team(team).is_none() {
                self.team_filter = None;
            }
        }
    }
}

/// A user edit, as front ends hand it to [`crate::AppContext::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum EditIntent {
    UpsertApi(ApiRecord),
    ReassignApi { asset_id: String, new_team: String },
    DeleteApi { asset_id: String },
    AddTeam(Team),
    DeleteTeam { name: String },
    AddValidValue { list: ValueList, value: String },
    RemoveValidValue { list: ValueList, value: String },
}

impl EditIntent {
    /// Change-request action this intent submits as.
    pub fn action(&self) -> ChangeAction {
        match self {
            Self::UpsertApi(_) => ChangeAction::UpdateApi,
            Self::ReassignApi { .. } => ChangeAction::AssignApiToTeam,
            Self::DeleteApi { .. } => ChangeAction::DeleteApi,
            Self::AddTeam(_) => ChangeAction::AddTeam,
            Self::DeleteTeam { .. } => ChangeAction::DeleteTeam,
            Self::AddValidValue { .. } => ChangeAction::AddValidValue,
            Self::RemoveValidValue { .. } => ChangeAction::RemoveValidValue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Warning,
    Error,
}

/// Transient message produced by an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

impl std::fmt::Display for Notification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{api, sample};

    #[test]
    fn filter_cycles_through_teams_and_back() {
        let catalog = sample();
        let mut view = ViewState::default();

        view.cycle_team_filter(&catalog);
        assert_eq!(view.team_filter.as_deref(), Some("Platform"));
        view.cycle_team_filter(&catalog);
        assert_eq!(view.team_filter.as_deref(), Some("Data"));
        view.cycle_team_filter(&catalog);
        assert_eq!(view.team_filter, None);
    }

    #[test]
    fn visible_apis_combine_filter_and_search() {
        let mut catalog = sample();
        catalog
            .upsert_api(api("orders", "Platform", &["Retail"]))
            .unwrap();

        let mut view = ViewState::default();
        assert_eq!(view.visible_apis(&catalog).len(), 2);

        view.search_term = "RETAIL".into();
        assert_eq!(view.visible_apis(&catalog)[0].asset_id, "orders");

        view.team_filter = Some("Data".into());
        assert!(view.visible_apis(&catalog).is_empty());
    }

    #[test]
    fn stale_filter_is_dropped() {
        let catalog = sample();
        let mut view = ViewState {
            team_filter: Some("Gone".into()),
            ..ViewState::default()
        };
        view.retain_valid(&catalog);
        assert_eq!(view.team_filter, None);
    }

    #[test]
    fn intents_map_to_actions() {
        let intent = EditIntent::ReassignApi {
            asset_id: "abc-123".into(),
            new_team: "Platform".into(),
        };
        assert_eq!(intent.action(), ChangeAction::AssignApiToTeam);
        assert_eq!(
            EditIntent::UpsertApi(ApiRecord::default()).action(),
            ChangeAction::UpdateApi
        );
    }
}
