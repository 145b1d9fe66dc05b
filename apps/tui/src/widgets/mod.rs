//! Reusable TUI widgets.

use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use apidash_core::NotificationLevel;

use crate::app::centered_rect;

/// Bottom status bar, colored by notification level when one is shown.
pub(crate) fn status_bar(msg: &str, level: Option<NotificationLevel>) -> Paragraph<'static> {
    let bg = match level {
        Some(NotificationLevel::Success) => Color::Green,
        Some(NotificationLevel::Warning) => Color::Yellow,
        Some(NotificationLevel::Error) => Color::Red,
        None => Color::DarkGray,
    };
    let fg = match level {
        Some(NotificationLevel::Warning) => Color::Black,
        _ => Color::White,
    };
    Paragraph::new(format!(" {msg}")).style(Style::default().bg(bg).fg(fg))
}

/// Centered yes/no prompt drawn over `area`.
pub(crate) fn confirm_popup(f: &mut Frame, area: Rect, question: &str) {
    let popup = centered_rect(50, 25, area);
    let body = Paragraph::new(vec![
        Line::from(question.to_string()),
        Line::from(""),
        Line::from("y to confirm · n or Esc to cancel").style(Style::default().fg(Color::Gray)),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Confirm ")
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(Clear, popup);
    f.render_widget(body, popup);
}
