//! "APIs" screen: searchable, team-filterable API table.

use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, TableState};

use apidash_core::{AppContext, EditIntent, Notification};

use super::ScreenAction;
use crate::widgets::confirm_popup;

pub(crate) struct ApisScreen {
    selected: usize,
    /// Search box has focus; keys edit the search term.
    searching: bool,
    /// Asset id awaiting delete confirmation.
    confirm_delete: Option<String>,
}

impl ApisScreen {
    pub(crate) fn new() -> Self {
        Self {
            selected: 0,
            searching: false,
            confirm_delete: None,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.searching || self.confirm_delete.is_some()
    }

    pub(crate) fn clamp(&mut self, rows: usize) {
        self.selected = self.selected.min(rows.saturating_sub(1));
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, ctx: &AppContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search / filter
                Constraint::Min(1),    // Table
                Constraint::Length(1), // Hint
            ])
            .split(area);

        let search_style = if self.searching {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let filter = ctx.view.team_filter.as_deref().unwrap_or("All teams");
        let search = Paragraph::new(ctx.view.search_term.as_str()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Search · {filter} "))
                .border_style(search_style),
        );
        f.render_widget(search, chunks[0]);

        let apis = ctx.visible_apis();
        let header = Row::new([
            "API Name",
            "Asset ID",
            "Team",
            "Owner",
            "MUnit",
            "Business Groups",
            "Updated",
        ])
        .style(Style::default().add_modifier(Modifier::BOLD));

        let rows = apis.iter().map(|api| {
            let munit = match (api.munit_exempt, api.custom_coverage) {
                (true, Some(coverage)) => format!("exempt {coverage}%"),
                (true, None) => "exempt".to_string(),
                (false, _) => "required".to_string(),
            };
            let groups: Vec<&str> = api.business_groups.iter().map(String::as_str).collect();
            Row::new([
                api.api_name.clone(),
                api.asset_id.clone(),
                api.team_name.clone(),
                api.api_owner.clone(),
                munit,
                groups.join(", "),
                api.last_updated.format("%Y-%m-%d").to_string(),
            ])
        });

        let widths = [
            Constraint::Percentage(20),
            Constraint::Percentage(16),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
            Constraint::Percentage(10),
            Constraint::Percentage(16),
            Constraint::Percentage(10),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" APIs ({}) ", apis.len())),
            )
            .row_highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▸ ");

        let mut state = TableState::default();
        if !apis.is_empty() {
            state.select(Some(self.selected.min(apis.len() - 1)));
        }
        f.render_stateful_widget(table, chunks[1], &mut state);

        let hint = if self.searching {
            "Type to search · Enter to keep · Esc to clear"
        } else {
            "/ search · t team filter · d delete · ↑/↓ select"
        };
        f.render_widget(
            Paragraph::new(hint)
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center),
            chunks[2],
        );

        if let Some(asset_id) = &self.confirm_delete {
            confirm_popup(f, area, &format!("Delete API '{asset_id}'?"));
        }
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, ctx: &mut AppContext) -> Option<ScreenAction> {
        if let Some(asset_id) = self.confirm_delete.take() {
            return match code {
                KeyCode::Char('y') | KeyCode::Char('Y') => {
                    Some(ScreenAction::Apply(EditIntent::DeleteApi { asset_id }))
                }
                _ => None,
            };
        }

        if self.searching {
            match code {
                KeyCode::Enter => self.searching = false,
                KeyCode::Esc => {
                    self.searching = false;
                    ctx.view.search_term.clear();
                }
                KeyCode::Backspace => {
                    ctx.view.search_term.pop();
                }
                KeyCode::Char(c) => ctx.view.search_term.push(c),
                _ => {}
            }
            self.selected = 0;
            return None;
        }

        let rows = ctx.visible_apis().len();
        match code {
            KeyCode::Char('/') => self.searching = true,
            KeyCode::Char('t') => {
                ctx.cycle_team_filter();
                self.selected = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < rows {
                    self.selected += 1;
                }
            }
            KeyCode::Char('d') => match ctx.visible_apis().get(self.selected) {
                Some(api) => self.confirm_delete = Some(api.asset_id.clone()),
                None => return Some(ScreenAction::Notify(Notification::warning("No API selected"))),
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
    fn search_edits_view_state() {
        let (_rt, mut ctx) = fixture_context();
        let mut screen = ApisScreen::new();

        screen.handle_key(KeyCode::Char('/'), &mut ctx);
        assert!(screen.is_editing());
        for c in "ledger".chars() {
            screen.handle_key(KeyCode::Char(c), &mut ctx);
        }
        screen.handle_key(KeyCode::Enter, &mut ctx);

        assert!(!screen.is_editing());
        assert_eq!(ctx.view.search_term, "ledger");
        assert_eq!(ctx.visible_apis().len(), 1);

        screen.handle_key(KeyCode::Char('/'), &mut ctx);
        screen.handle_key(KeyCode::Esc, &mut ctx);
        assert!(ctx.view.search_term.is_empty());
    }

    #[test]
    fn team_filter_cycles() {
        let (_rt, mut ctx) = fixture_context();
        let mut screen = ApisScreen::new();

        screen.handle_key(KeyCode::Char('t'), &mut ctx);
        assert_eq!(ctx.view.team_filter.as_deref(), Some("Platform"));
        assert!(ctx.visible_apis().is_empty());

        screen.handle_key(KeyCode::Char('t'), &mut ctx);
        assert_eq!(ctx.visible_apis().len(), 2);
    }

    #[test]
    fn delete_requires_confirmation() {
        let (_rt, mut ctx) = fixture_context();
        let mut screen = ApisScreen::new();

        screen.handle_key(KeyCode::Down, &mut ctx);
        assert!(screen.handle_key(KeyCode::Char('d'), &mut ctx).is_none());
        assert!(screen.is_editing());
        assert!(screen.handle_key(KeyCode::Char('n'), &mut ctx).is_none());
        assert!(!screen.is_editing());

        screen.handle_key(KeyCode::Char('d'), &mut ctx);
        match screen.handle_key(KeyCode::Char('y'), &mut ctx) {
            Some(ScreenAction::Apply(EditIntent::DeleteApi { asset_id })) => {
                assert_eq!(asset_id, "ledger-xapi");
            }
            other => panic!("expected delete intent, got {other:?}"),
        }
    }
}
