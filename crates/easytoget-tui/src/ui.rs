// UI rendering logic
use crate::app::{App, FeedKind, InputMode};
use easytoget_core::{relative_time, FeedStatus, NotificationKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
    Frame,
};

const TOAST_WIDTH: u16 = 48;

pub fn render(frame: &mut Frame, app: &mut App) {
    let screen_height = frame.area().height;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3.min(screen_height / 6)), // Tabs
            Constraint::Length(3.min(screen_height / 8)), // Search input
            Constraint::Min(5),                           // Main content
            Constraint::Length(1),                        // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_search_input(frame, app, chunks[1]);

    // Narrow screens give the list more room
    let (results_pct, detail_pct) = if frame.area().width < 100 {
        (60, 40)
    } else {
        (50, 50)
    };

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(results_pct),
            Constraint::Percentage(detail_pct),
        ])
        .split(chunks[2]);

    render_results_list(frame, app, content_chunks[0]);
    render_detail(frame, app, content_chunks[1]);
    render_status_bar(frame, app, chunks[3]);

    render_toasts(frame, app, chunks[2]);

    if app.show_help {
        crate::help_ui::render_help_popup(frame, frame.area());
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = App::tab_titles().into_iter().map(Line::from).collect();

    let tabs = Tabs::new(titles)
        .select(app.tab)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Span::styled(
                    " EasyToGet ",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )),
        )
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .divider("|");

    frame.render_widget(tabs, area);
}

fn render_search_input(frame: &mut Frame, app: &App, area: Rect) {
    let input_style = match app.input_mode {
        InputMode::Searching => Style::default().fg(Color::Yellow),
        InputMode::Normal => Style::default(),
    };

    let query = app.search.query();
    let input = Paragraph::new(query).style(input_style).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Search (ESC to navigate, / to search)")
            .border_style(input_style),
    );

    frame.render_widget(input, area);

    if app.input_mode == InputMode::Searching {
        frame.set_cursor_position((area.x + query.chars().count() as u16 + 1, area.y + 1));
    }
}

fn results_title(app: &App) -> String {
    match app.active_feed() {
        FeedKind::Search if app.search.settled_query().trim().is_empty() => {
            " Latest downloads ".to_string()
        }
        FeedKind::Search => format!(" Results for \"{}\" ", app.search.settled_query().trim()),
        FeedKind::Category => format!(" {} ", app.category.heading()),
    }
}

fn render_results_list(frame: &mut Frame, app: &mut App, area: Rect) {
    let title = results_title(app);

    if app.listing().is_loading() && app.items().is_empty() {
        let loading = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "Loading...",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title(title))
        .alignment(Alignment::Center);
        frame.render_widget(loading, area);
        return;
    }

    if app.items().is_empty() {
        let text = app
            .listing()
            .message()
            .unwrap_or("Nothing here yet.")
            .to_string();
        let color = if app.status() == FeedStatus::Error {
            Color::Red
        } else {
            Color::DarkGray
        };
        let empty = Paragraph::new(vec![Line::from(""), Line::from(Span::styled(text, Style::default().fg(color)))])
            .block(Block::default().borders(Borders::ALL).title(title))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(empty, area);
        return;
    }

    let now = chrono::Utc::now();
    let desc_max = (area.width.saturating_sub(8) as usize).max(20);

    let items: Vec<ListItem> = app
        .items()
        .iter()
        .enumerate()
        .map(|(i, link)| {
            let name_style = if i == app.selected_index {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            };

            let line1 = Line::from(vec![
                Span::styled(link.name.clone(), name_style),
                Span::raw("  "),
                Span::styled(
                    relative_time(link.parsed_timestamp(), now),
                    Style::default().fg(Color::DarkGray),
                ),
            ]);
            let line2 = Line::from(Span::styled(
                truncate(&link.content, desc_max),
                Style::default().fg(Color::White),
            ));
            let line3 = Line::from(Span::styled(
                truncate(&link.url, desc_max),
                Style::default().fg(Color::Blue),
            ));

            ListItem::new(vec![line1, line2, line3, Line::from("")])
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::Rgb(40, 40, 60)))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let Some(link) = app.selected_link() else {
        let empty = Paragraph::new("No download selected")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(" Details "));
        frame.render_widget(empty, area);
        return;
    };

    let label = Style::default().fg(Color::DarkGray);
    let lines = vec![
        Line::from(Span::styled(
            link.name.clone(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![Span::styled("Site:      ", label), Span::raw(link.domain())]),
        Line::from(vec![
            Span::styled("Added:     ", label),
            Span::raw(relative_time(link.parsed_timestamp(), chrono::Utc::now())),
        ]),
        Line::from(vec![
            Span::styled("URL:       ", label),
            Span::styled(link.url.clone(), Style::default().fg(Color::Blue)),
        ]),
        Line::from(vec![
            Span::styled("Thumbnail: ", label),
            Span::raw(link.thumbnail.clone()),
        ]),
        Line::from(""),
        Line::from(link.content.clone()),
        Line::from(""),
        Line::from(Span::styled(
            "o/Enter: open in browser | y: copy URL",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let detail = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Details "))
        .wrap(Wrap { trim: true });
    frame.render_widget(detail, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let status = if let Some(message) = &app.status_message {
        vec![Span::styled(message.clone(), Style::default().fg(Color::Green))]
    } else {
        match app.input_mode {
            InputMode::Searching => vec![Span::styled(
                "SEARCH MODE | ESC: normal mode | ENTER: search now",
                Style::default().fg(Color::Yellow),
            )],
            InputMode::Normal => {
                let listing = app.listing();
                let status_style = match listing.status() {
                    FeedStatus::Error => Style::default().fg(Color::Red),
                    FeedStatus::Loading => Style::default().fg(Color::Cyan),
                    _ => Style::default().fg(Color::Green),
                };
                let info = listing.page_info();
                let pages = match info.pages {
                    Some(pages) if pages > 0 => format!("page {}/{}", app.page(), pages),
                    _ => format!("page {}", app.page()),
                };
                vec![
                    Span::styled(format!("[{}]", listing.status()), status_style),
                    Span::raw(format!(" {} | {} items | ", pages, listing.items().len())),
                    Span::raw("j/k: navigate | /: search | TAB: categories | [ ]: page | r: retry | x: dismiss | ?: help | q: quit"),
                ]
            }
        }
    };

    frame.render_widget(Paragraph::new(Line::from(status)), area);
}

fn toast_color(kind: NotificationKind) -> Color {
    match kind {
        NotificationKind::Info => Color::Blue,
        NotificationKind::Success => Color::Green,
        NotificationKind::Warning => Color::Yellow,
        NotificationKind::Error => Color::Red,
    }
}

/// Newest toast on top, stacked down the right edge of `area`
fn render_toasts(frame: &mut Frame, app: &App, area: Rect) {
    let toasts = app.toasts();
    if toasts.is_empty() {
        return;
    }

    let width = TOAST_WIDTH.min(area.width);
    let mut y = area.y;
    for toast in toasts.iter().rev() {
        if y + 3 > area.y + area.height {
            break;
        }
        let rect = Rect {
            x: area.x + area.width - width,
            y,
            width,
            height: 3,
        };
        let color = toast_color(toast.kind);
        let widget = Paragraph::new(truncate(&toast.message, width.saturating_sub(4) as usize))
            .style(Style::default().fg(color))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(color))
                    .title(format!(" {} ", toast.kind)),
            );
        frame.render_widget(Clear, rect);
        frame.render_widget(widget, rect);
        y += 3;
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
