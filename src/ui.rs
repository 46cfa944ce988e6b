use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    prelude::Stylize,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::dashboard::DashboardState;
use crate::event::{Action, Event, Filter};
use crate::format::{badge_color, branch_transition, format_event};

pub const TITLE: &str = "GitHub Events Monitor";
pub const LOADING_TEXT: &str = "Loading events...";
pub const EMPTY_TEXT: &str = "No events found";

/// What the body shows, decided in strict precedence: loading, then error,
/// then empty, then the list.
#[derive(Debug, PartialEq)]
pub enum BodyView<'a> {
    Loading,
    Error(&'a str),
    Empty,
    Events(&'a [Event]),
}

pub fn body_view(state: &DashboardState) -> BodyView<'_> {
    if state.is_loading {
        BodyView::Loading
    } else if let Some(error) = &state.error {
        BodyView::Error(error)
    } else if state.events.is_empty() {
        BodyView::Empty
    } else {
        BodyView::Events(&state.events)
    }
}

/// Display knobs that don't live in dashboard state.
#[derive(Debug, Clone, Copy)]
pub struct ViewOptions {
    pub scroll_offset: usize,
    pub poll_interval_secs: u64,
    pub show_branch_transition: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            scroll_offset: 0,
            poll_interval_secs: 15,
            show_branch_transition: true,
        }
    }
}

/// Rows for a single event: badge and timestamp, the sentence, and for
/// anything but a push the branch transition.
pub fn event_lines(event: &Event, show_branch_transition: bool) -> Vec<Line<'static>> {
    let badge_style = Style::default()
        .fg(Color::Black)
        .bg(badge_color(&event.action))
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!(" {} ", event.action), badge_style),
            Span::raw("  "),
            Span::styled(event.timestamp.clone(), Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(Span::raw(format_event(event))),
    ];

    if show_branch_transition && event.action != Action::Push {
        let code = Style::default().fg(Color::Yellow);
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(event.from_branch.clone().unwrap_or_default(), code),
            Span::styled(" → ", Style::default().fg(Color::Gray)),
            Span::styled(event.to_branch.clone(), code),
        ]));
    }

    lines
}

pub fn render(frame: &mut Frame, state: &DashboardState, options: &ViewOptions) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Length(3), // Filter
            Constraint::Min(1),    // Events
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    let title = Paragraph::new(TITLE)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    frame.render_widget(title, chunks[0]);

    render_filter_bar(frame, chunks[1], &state.filter);
    render_body(frame, chunks[2], state, options);

    let footer = Paragraph::new(Line::from(vec![
        format!("Auto-refreshing every {} seconds  ", options.poll_interval_secs).into(),
        "f".fg(Color::Yellow).add_modifier(Modifier::BOLD),
        " filter, ".into(),
        "r".fg(Color::Yellow).add_modifier(Modifier::BOLD),
        " refresh, ".into(),
        "j,k".fg(Color::Yellow).add_modifier(Modifier::BOLD),
        " scroll, ".into(),
        "q".fg(Color::Yellow).add_modifier(Modifier::BOLD),
        " quit".into(),
    ]))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center)
    .style(Style::default().fg(Color::Gray));
    frame.render_widget(footer, chunks[3]);
}

fn render_filter_bar(frame: &mut Frame, area: Rect, active: &Filter) {
    let mut spans = Vec::new();
    for (index, filter) in Filter::CYCLE.iter().enumerate() {
        let label = format!(" {} {} ", index, filter.label());
        if filter == active {
            spans.push(Span::styled(
                label,
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::styled(label, Style::default().fg(Color::Gray)));
        }
        spans.push(Span::raw(" "));
    }

    let bar = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Filter"));
    frame.render_widget(bar, area);
}

fn render_body(frame: &mut Frame, area: Rect, state: &DashboardState, options: &ViewOptions) {
    let message = |text: String, style: Style| {
        Paragraph::new(text)
            .block(Block::default().borders(Borders::ALL).title("Events"))
            .style(style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
    };

    match body_view(state) {
        BodyView::Loading => {
            frame.render_widget(message(LOADING_TEXT.to_string(), Style::default()), area);
        }
        BodyView::Error(error) => {
            let text = format!("Error: {}", error);
            frame.render_widget(message(text, Style::default().fg(Color::Red)), area);
        }
        BodyView::Empty => {
            frame.render_widget(message(EMPTY_TEXT.to_string(), Style::default()), area);
        }
        BodyView::Events(events) => {
            let mut lines = Vec::new();
            for event in events.iter().skip(options.scroll_offset) {
                lines.extend(event_lines(event, options.show_branch_transition));
                lines.push(Line::from(""));
            }

            let list = Paragraph::new(lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!("Events ({})", events.len())),
                )
                .wrap(Wrap { trim: false });
            frame.render_widget(list, area);
        }
    }
}

/// Plain-text rendering with the same precedence, for non-interactive use.
pub fn render_plain(state: &DashboardState, show_branch_transition: bool) -> String {
    match body_view(state) {
        BodyView::Loading => LOADING_TEXT.to_string(),
        BodyView::Error(error) => format!("Error: {}", error),
        BodyView::Empty => EMPTY_TEXT.to_string(),
        BodyView::Events(events) => events
            .iter()
            .map(|event| {
                let mut line = format!(
                    "[{}] {}  {}",
                    event.action,
                    event.timestamp,
                    format_event(event)
                );
                if show_branch_transition {
                    if let Some(transition) = branch_transition(event) {
                        line.push_str(&format!("  ({})", transition));
                    }
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}
