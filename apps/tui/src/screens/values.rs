//! "Valid Values" screen: catalog totals and the valid-value lists.

use crossterm::event::KeyCode;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};

use apidash_core::AppContext;
use apidash_shared::ValueList;

use super::ScreenAction;

pub(crate) struct ValuesScreen;

impl ValuesScreen {
    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, ctx: &AppContext) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(1)])
            .split(area);

        let catalog = ctx.catalog();
        let stats = catalog.stats();
        let summary = Paragraph::new(vec![
            Line::from(format!("Source:          {}", ctx.store_description())),
            Line::from(format!("Teams:           {}", catalog.teams().len())),
            Line::from(format!("APIs:            {}", stats.total)),
            Line::from(format!("MUnit required:  {}", stats.munit_required)),
            Line::from(format!("MUnit exempt:    {}", stats.munit_exempt)),
        ])
        .block(Block::default().borders(Borders::ALL).title(" Catalog "));
        f.render_widget(summary, chunks[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        for (list, column) in [ValueList::CmdbAssignmentGroups, ValueList::BusinessGroups]
            .into_iter()
            .zip(columns.iter())
        {
            let values = catalog.values(list);
            let items: Vec<ListItem> = values.iter().map(|v| ListItem::new(format!("  {v}"))).collect();
            let widget = List::new(items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" Valid {list} ({}) ", values.len())),
            );
            f.render_widget(widget, *column);
        }
    }

    pub(crate) fn handle_key(&mut self, _code: KeyCode) -> Option<ScreenAction> {
        None
    }
}
