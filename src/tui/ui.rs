use crate::output::highlight_span;
use crate::tui::app::{App, Mode};
use crate::utils::normalize;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

const UNCATEGORIZED: &str = "(uncategorized)";

const HELP_LINES: &[(&str, &str)] = &[
    ("type", "search as you type"),
    ("Up / Down, Tab", "move selection"),
    ("Ctrl+j / Ctrl+k", "move selection"),
    ("PageUp / PageDown", "move by ten"),
    ("Ctrl+a / Ctrl+e", "first / last result"),
    ("Enter", "open result ($BROWSER) or show its location"),
    ("Ctrl+w", "delete word"),
    ("Esc", "clear query, quit when empty"),
    ("Ctrl+c / Ctrl+q", "quit"),
];

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Query input
            Constraint::Min(5),    // Results
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    draw_query_input(f, app, chunks[0]);
    draw_results_list(f, app, chunks[1]);
    draw_status_bar(f, app, chunks[2]);

    if app.mode == Mode::Help {
        draw_help(f, chunks[1]);
    }
}

fn draw_query_input(f: &mut Frame, app: &App, area: Rect) {
    let input = Paragraph::new(app.query.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Search (Enter: open, F1: help, Esc: quit) "),
        );

    f.render_widget(input, area);

    // Show cursor
    if app.mode == Mode::Search {
        let width = app.query.chars().count() as u16;
        f.set_cursor_position((area.x + width + 1, area.y + 1));
    }
}

fn draw_results_list(f: &mut Frame, app: &App, area: Rect) {
    let view = app.view();
    let tokens = normalize(&app.query).tokens;

    let mut items: Vec<ListItem> = Vec::new();
    let mut selected_row = None;
    let mut index = 0;

    let header_style = Style::default()
        .fg(Color::Magenta)
        .add_modifier(Modifier::BOLD);
    let url_style = Style::default().fg(Color::Blue);

    for group in &view.results.groups {
        items.push(ListItem::new(Line::from(Span::styled(
            group.category.as_deref().unwrap_or(UNCATEGORIZED).to_string(),
            header_style,
        ))));

        for hit in &group.hits {
            let style = if index == view.cursor {
                selected_row = Some(items.len());
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let mut spans = vec![Span::raw("  ")];
            spans.extend(highlight_label(&hit.occurrence.label, &tokens));
            spans.push(Span::raw("  "));
            spans.push(Span::styled(hit.occurrence.url.clone(), url_style));

            items.push(ListItem::new(Line::from(spans)).style(style));
            index += 1;
        }
    }

    let title = if view.degraded {
        format!(" Results ({}, partial) ", view.results.len())
    } else {
        format!(" Results ({}) ", view.results.len())
    };

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title(title));

    let mut state = ListState::default();
    state.select(selected_row);
    f.render_stateful_widget(list, area, &mut state);
}

/// Label spans with the first query token highlighted
fn highlight_label(label: &str, tokens: &[String]) -> Vec<Span<'static>> {
    let Some((start, end)) = highlight_span(label, tokens) else {
        return vec![Span::raw(label.to_string())];
    };

    let mut spans = Vec::new();

    if start > 0 {
        spans.push(Span::raw(label[..start].to_string()));
    }

    spans.push(Span::styled(
        label[start..end].to_string(),
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ));

    if end < label.len() {
        spans.push(Span::raw(label[end..].to_string()));
    }

    spans
}

fn draw_help(f: &mut Frame, area: Rect) {
    let lines: Vec<Line> = HELP_LINES
        .iter()
        .map(|(keys, action)| {
            Line::from(vec![
                Span::styled(format!("{:>20}  ", keys), Style::default().fg(Color::Yellow)),
                Span::raw(*action),
            ])
        })
        .collect();

    let height = (lines.len() as u16 + 2).min(area.height);
    let width = 70.min(area.width);
    let popup = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    };

    let help = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Help (any key to close) "));

    f.render_widget(Clear, popup);
    f.render_widget(help, popup);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let status = Paragraph::new(app.status_message.as_str())
        .style(Style::default().fg(Color::Cyan));

    f.render_widget(status, area);
}
