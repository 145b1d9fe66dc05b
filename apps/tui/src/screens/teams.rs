//! "Teams" screen: team summaries with delete.

use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState};

use apidash_core::{AppContext, EditIntent, Notification};

use super::ScreenAction;
use crate::widgets::confirm_popup;

pub(crate) struct TeamsScreen {
    selected: usize,
    confirm_delete: Option<String>,
}

impl TeamsScreen {
    pub(crate) fn new() -> Self {
        Self {
            selected: 0,
            confirm_delete: None,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.confirm_delete.is_some()
    }

    pub(crate) fn clamp(&mut self, rows: usize) {
        self.selected = self.selected.min(rows.saturating_sub(1));
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, ctx: &AppContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(area);

        let catalog = ctx.catalog();
        let rows = catalog.teams().iter().zip(catalog.team_summaries()).map(|(team, summary)| {
            let groups: Vec<&str> = team.business_groups.iter().map(String::as_str).collect();
            Row::new([
                team.name.clone(),
                team.owner.clone(),
                team.owner_email.clone(),
                team.cmdb_assignment_group.clone(),
                groups.join(", "),
                summary.api_count.to_string(),
            ])
        });

        let header = Row::new(["Team", "Owner", "Email", "CMDB Group", "Business Groups", "APIs"])
            .style(Style::default().add_modifier(Modifier::BOLD));
        let widths = [
            Constraint::Percentage(20),
            Constraint::Percentage(16),
            Constraint::Percentage(22),
            Constraint::Percentage(16),
            Constraint::Percentage(18),
            Constraint::Percentage(8),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Teams ({}) ", catalog.teams().len())),
            )
            .row_highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▸ ");

        let mut state = TableState::default();
        if !catalog.teams().is_empty() {
            state.select(Some(self.selected));
        }
        f.render_stateful_widget(table, chunks[0], &mut state);

        f.render_widget(
            Paragraph::new("d delete team · ↑/↓ select")
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            chunks[1],
        );

        if let Some(name) = &self.confirm_delete {
            confirm_popup(f, area, &format!("Delete team '{name}'?"));
        }
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, ctx: &mut AppContext) -> Option<ScreenAction> {
        if let Some(name) = self.confirm_delete.take() {
            return match code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    Some(ScreenAction::Apply(EditIntent::DeleteTeam { name }))
                }
                _ => None,
            };
        }

        let teams = ctx.catalog().teams();
        match code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < teams.len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('d') => match teams.get(self.selected) {
                Some(team) => self.confirm_delete = Some(team.name.clone()),
                None => {
                    return Some(ScreenAction::Notify(Notification::warning("No team selected")));
                }
            },
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::tests::fixture_context;

    #[test]
    fn delete_asks_then_emits_intent() {
        let (_rt, mut ctx) = fixture_context();
        let mut screen = TeamsScreen::new();

        screen.handle_key(KeyCode::Char('j'), &mut ctx);
        screen.handle_key(KeyCode::Char('d'), &mut ctx);
        assert!(screen.is_editing());

        match screen.handle_key(KeyCode::Char('y'), &mut ctx) {
            Some(ScreenAction::Apply(EditIntent::DeleteTeam { name })) => assert_eq!(name, "Data"),
            other => panic!("expected delete intent, got {other:?}"),
        }
    }

    #[test]
    fn selection_stays_in_bounds() {
        let (_rt, mut ctx) = fixture_context();
        let mut screen = TeamsScreen::new();
        for _ in 0..10 {
            screen.handle_key(KeyCode::Down, &mut ctx);
        }
        assert_eq!(screen.selected, 2);
        screen.clamp(1);
        assert_eq!(screen.selected, 0);
    }
}
