// UI module for rendering the TUI.
// Contains the category bar, search line, benefit list, details pane, and status bar.

mod list;
mod tabs;

pub use list::format_stars;

use ratatui::{prelude::*, widgets::*};

use crate::app::App;

/// Main draw function that renders the entire UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Category bar
            Constraint::Length(3), // Search
            Constraint::Min(1),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    tabs::draw_tabs(frame, app, chunks[0]);
    draw_search(frame, app, chunks[1]);
    draw_content(frame, app, chunks[2]);
    draw_status_bar(frame, app, chunks[3]);

    // Help overlay (rendered last, on top of everything)
    if app.show_help {
        draw_help_overlay(frame);
    }
}

/// Draw the search input.
fn draw_search(frame: &mut Frame, app: &App, area: Rect) {
    let border_color = if app.search_active {
        Color::Yellow
    } else {
        Color::DarkGray
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Search ");

    let line = if app.query.is_empty() && !app.search_active {
        Line::from(Span::styled(
            "Search tools, categories, or tags...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let mut spans = vec![
            Span::styled("/", Style::default().fg(Color::Yellow)),
            Span::raw(app.query.as_str()),
        ];
        if app.search_active {
            spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
        }
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
}

/// Draw the benefit list and the details of the selected entry side by side.
fn draw_content(frame: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    list::render_benefit_list(frame, app, chunks[0]);
    list::render_details(frame, app.selected_benefit(), &app.stars, chunks[1]);
}

/// Draw the status bar with keybinding hints, lookup progress, and rate limit.
fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mut hints = if let Some(message) = &app.status_message {
        vec![Span::styled(
            format!(" {}", message),
            Style::default().fg(Color::Cyan),
        )]
    } else {
        vec![
            Span::raw(" ↑↓ "),
            Span::styled("Navigate", Style::default().fg(Color::DarkGray)),
            Span::raw("  ↵ "),
            Span::styled("Open", Style::default().fg(Color::DarkGray)),
            Span::raw("  Tab "),
            Span::styled("Category", Style::default().fg(Color::DarkGray)),
            Span::raw("  Type "),
            Span::styled("Search", Style::default().fg(Color::DarkGray)),
            Span::raw("  ? "),
            Span::styled("Help", Style::default().fg(Color::DarkGray)),
            Span::raw("  Esc "),
            Span::styled("Quit", Style::default().fg(Color::DarkGray)),
        ]
    };

    let pending = app.pending_lookups();
    if pending > 0 {
        hints.push(Span::styled(
            format!("  ⏳ fetching stars ({})", pending),
            Style::default().fg(Color::Yellow),
        ));
    }

    if let Some(rate) = app.rate_limit() {
        let rate_color = if rate.remaining < 10 {
            Color::Red
        } else if rate.remaining < 30 {
            Color::Yellow
        } else {
            Color::DarkGray
        };
        hints.push(Span::styled(
            format!("  API: {}/{}", rate.remaining, rate.limit),
            Style::default().fg(rate_color),
        ));
    }

    let status = Paragraph::new(Line::from(hints));
    frame.render_widget(status, area);
}

/// Draw the help overlay.
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    // Create a centered popup
    let popup_width = 52u16.min(area.width);
    let popup_height = 16u16.min(area.height);
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;

    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let key = |keys: &'static str, action: &'static str| {
        Line::from(vec![
            Span::styled(keys, Style::default().fg(Color::Cyan)),
            Span::raw(action),
        ])
    };

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        key("  a-z, 0-9      ", "Start searching"),
        key("  /             ", "Focus search"),
        key("  Backspace     ", "Edit search"),
        key("  Ctrl-U        ", "Clear search"),
        key("  ↑/↓ Home/End  ", "Move selection"),
        key("  Tab/Shift-Tab ", "Switch category"),
        key("  Enter         ", "Open benefit link"),
        key("  Esc           ", "Leave search / clear / quit"),
        key("  Ctrl-C        ", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("Press ", Style::default().fg(Color::DarkGray)),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::styled(" or ", Style::default().fg(Color::DarkGray)),
            Span::styled("?", Style::default().fg(Color::Yellow)),
            Span::styled(" to close", Style::default().fg(Color::DarkGray)),
        ]),
    ];

    let help_paragraph = Paragraph::new(help_text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help ")
                .title_style(
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
        )
        .alignment(Alignment::Left);

    frame.render_widget(help_paragraph, popup_area);
}
