// Category filter bar.
// Highlights the active category and shows how many benefits each one holds.

use ratatui::{prelude::*, widgets::*};

use crate::app::{App, category_filters, filter_title};

/// Draw the category tab bar at the top of the screen.
pub fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let filters = category_filters();

    let tab_titles: Vec<Line> = filters
        .iter()
        .map(|filter| {
            let count = app
                .benefits
                .iter()
                .filter(|b| filter.is_none_or(|category| b.category == category))
                .count();
            let title = format!("{} ({})", filter_title(*filter), count);

            let style = if *filter == app.category {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else if count == 0 {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };

            Line::from(Span::styled(title, style))
        })
        .collect();

    let selected_index = filters
        .iter()
        .position(|f| *f == app.category)
        .unwrap_or(0);

    let tabs_widget = Tabs::new(tab_titles)
        .block(
            Block::default()
                .borders(Borders::BOTTOM)
                .border_style(Style::default().fg(Color::DarkGray))
                .title(" Student Benefits Hub ")
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .select(selected_index)
        .highlight_style(Style::default().fg(Color::Yellow))
        .divider(Span::raw(" │ "));

    frame.render_widget(tabs_widget, area);
}
