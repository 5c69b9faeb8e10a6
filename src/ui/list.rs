// Benefit list and detail rendering.
// Shows ranked benefits with star badges, plus the selected benefit's details.

use ratatui::{prelude::*, widgets::*};

use crate::app::App;
use crate::catalog::Benefit;
use crate::stars::StarsSnapshot;

/// Format a star count compactly (e.g., 1234 -> "1.2k").
pub fn format_stars(stars: u64) -> String {
    if stars >= 1000 {
        let thousands = format!("{:.1}", stars as f64 / 1000.0);
        format!("{}k", thousands.trim_end_matches(".0"))
    } else {
        stars.to_string()
    }
}

/// Star badge for a benefit, only when its count is known.
fn star_badge(benefit: &Benefit, stars: &StarsSnapshot) -> Option<String> {
    let repo = benefit.repo.as_ref()?;
    stars.get(repo).map(|count| format!("★ {}", format_stars(count)))
}

/// Render an empty state message.
pub fn render_empty(frame: &mut Frame, area: Rect, block: Block, message: &str) {
    let text = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray))
        .block(block);
    frame.render_widget(text, area);
}

/// Render the ranked benefit list.
pub fn render_benefit_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem<'static>> = app
        .visible()
        .iter()
        .map(|benefit| {
            let mut spans = vec![Span::styled(
                benefit.name.clone(),
                Style::default().fg(Color::White),
            )];
            if let Some(badge) = star_badge(benefit, &app.stars) {
                spans.push(Span::raw(" "));
                spans.push(Span::styled(badge, Style::default().fg(Color::Yellow)));
            }
            spans.push(Span::styled(
                format!("  {}", benefit.category),
                Style::default().fg(Color::DarkGray),
            ));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let noun = if items.len() == 1 { "perk" } else { "perks" };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Found {} {} ", items.len(), noun));

    if items.is_empty() {
        render_empty(
            frame,
            area,
            block,
            "No benefits found. Try a different search or category.",
        );
        return;
    }

    let list_widget = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list_widget, area, &mut app.list_state);
}

/// Render details for the selected benefit.
pub fn render_details(frame: &mut Frame, benefit: Option<&Benefit>, stars: &StarsSnapshot, area: Rect) {
    let block = Block::default().borders(Borders::ALL).title(" Details ");

    let Some(benefit) = benefit else {
        render_empty(frame, area, block, "Nothing selected");
        return;
    };

    let label = |text: &'static str| Span::styled(text, Style::default().fg(Color::DarkGray));

    let mut lines = vec![
        Line::from(Span::styled(
            benefit.name.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![label("Category: "), Span::raw(benefit.category.title())]),
        Line::from(""),
        Line::from(benefit.description.clone()),
        Line::from(""),
    ];

    if !benefit.tags.is_empty() {
        lines.push(Line::from(vec![
            label("Tags: "),
            Span::styled(benefit.tags.join(", "), Style::default().fg(Color::Magenta)),
        ]));
    }

    if let Some(repo) = &benefit.repo {
        let stars_text = match stars.get(repo) {
            Some(count) => format!("★ {}", format_stars(count)),
            None => "★ unknown".to_string(),
        };
        lines.push(Line::from(vec![
            label("Repo: "),
            Span::raw(repo.to_string()),
            Span::raw(" "),
            Span::styled(stars_text, Style::default().fg(Color::Yellow)),
        ]));
    }

    lines.push(Line::from(vec![
        label("Link: "),
        Span::styled(
            benefit.link.clone(),
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
        ),
    ]));

    let details = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(details, area);
}
