use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Book, Member};

/// One catalog row: id, title, author, category and who holds it.
pub(crate) fn book_line(book: &Book, holder: Option<&Member>) -> Line<'static> {
    let status_style = if book.issued {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Green)
    };
    let status = match holder {
        Some(member) if book.issued => format!("Issued to #{}", member.id),
        _ => book.status_label().to_string(),
    };

    Line::from(vec![
        Span::styled(format!("{:>5} ", book.id), Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{} ", book.title)),
        Span::styled(format!("by {} ", book.author), Style::default().fg(Color::Gray)),
        Span::styled(format!("[{}] ", book.category), Style::default().fg(Color::Cyan)),
        Span::styled(status, status_style),
    ])
}

/// One membership row with the ids the member holds.
pub(crate) fn member_line(member: &Member) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:>3} ", member.id), Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{member} ")),
        Span::styled(
            format!("holds {}", member.issued_summary()),
            Style::default().fg(Color::Gray),
        ),
    ])
}

/// Dialog area: `percent_x` of the width and `percent_y` of the height of
/// `area`, centered on both axes.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    let [dialog] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    dialog
}
