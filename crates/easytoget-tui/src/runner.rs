// Event loop: terminal setup, key handling, and fetch dispatch
use crate::app::{App, Dispatch, FeedKind, InputMode};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use easytoget_api::CatalogSource;
use easytoget_core::{FetchOutcome, FetchTicket};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, warn};

// Upper bound on how long we block waiting for input; toasts and replies
// arriving in the background get drawn at least this often.
const TICK: Duration = Duration::from_millis(100);

struct Completed {
    feed: FeedKind,
    ticket: FetchTicket,
    outcome: FetchOutcome,
}

pub struct TuiOptions {
    pub mouse_enabled: bool,
}

pub async fn run_tui(
    mut app: App,
    source: Arc<dyn CatalogSource>,
    options: TuiOptions,
) -> anyhow::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    if options.mouse_enabled {
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    } else {
        execute!(stdout, EnterAlternateScreen)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let initial = app.start();
    spawn_fetch(&source, &tx, initial);

    let result = event_loop(&mut terminal, &mut app, &source, &tx, &mut rx).await;

    // Restore terminal even if the loop failed
    disable_raw_mode()?;
    if options.mouse_enabled {
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    } else {
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    }
    terminal.show_cursor()?;

    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    source: &Arc<dyn CatalogSource>,
    tx: &mpsc::UnboundedSender<Completed>,
    rx: &mut mpsc::UnboundedReceiver<Completed>,
) -> anyhow::Result<()> {
    loop {
        while let Ok(done) = rx.try_recv() {
            app.apply(done.feed, &done.ticket, done.outcome);
        }

        if let Some(dispatch) = app.poll() {
            spawn_fetch(source, tx, dispatch);
        }

        terminal.draw(|f| crate::ui::render(f, app))?;

        if app.should_quit {
            return Ok(());
        }

        if event::poll(poll_timeout(app.next_deadline(), Instant::now()))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(dispatch) = handle_key(app, key) {
                        spawn_fetch(source, tx, dispatch);
                    }
                }
            }
        }

        tokio::task::yield_now().await;
    }
}

/// Wake up for whichever comes first: the debounce deadline or the next tick
fn poll_timeout(deadline: Option<Instant>, now: Instant) -> Duration {
    match deadline {
        Some(deadline) => deadline.saturating_duration_since(now).min(TICK),
        None => TICK,
    }
}

fn spawn_fetch(
    source: &Arc<dyn CatalogSource>,
    tx: &mpsc::UnboundedSender<Completed>,
    dispatch: Dispatch,
) {
    let source = source.clone();
    let tx = tx.clone();
    debug!("Dispatching {:?} fetch #{}", dispatch.feed, dispatch.ticket.seq);

    tokio::spawn(async move {
        let outcome = dispatch.ticket.run(source.as_ref()).await;
        let done = Completed {
            feed: dispatch.feed,
            ticket: dispatch.ticket,
            outcome,
        };
        if tx.send(done).is_err() {
            debug!("UI closed before fetch completed");
        }
    });
}

/// Apply one key press. Returns a fetch to run, if the key asked for one.
fn handle_key(app: &mut App, key: KeyEvent) -> Option<Dispatch> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return None;
    }

    if app.show_help {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.show_help = false;
        }
        return None;
    }

    match app.input_mode {
        InputMode::Searching => match key.code {
            KeyCode::Enter => app.submit(),
            KeyCode::Esc => {
                app.enter_normal_mode();
                None
            }
            KeyCode::Backspace => {
                app.pop_char();
                None
            }
            KeyCode::Char(c) => {
                app.push_char(c);
                None
            }
            _ => None,
        },
        InputMode::Normal => {
            app.status_message = None;
            match key.code {
                KeyCode::Char('q') => {
                    app.should_quit = true;
                    None
                }
                KeyCode::Char('/') => {
                    app.enter_search_mode();
                    None
                }
                KeyCode::Char('?') => {
                    app.toggle_help();
                    None
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    app.next_result();
                    None
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    app.previous_result();
                    None
                }
                KeyCode::Tab => app.next_tab(),
                KeyCode::BackTab => app.previous_tab(),
                KeyCode::Char(']') => app.next_page(),
                KeyCode::Char('[') => app.prev_page(),
                KeyCode::Char('r') => app.retry(),
                KeyCode::Char('x') => {
                    app.dismiss_newest_toast();
                    None
                }
                KeyCode::Enter | KeyCode::Char('o') => {
                    open_selected(app);
                    None
                }
                KeyCode::Char('y') => {
                    copy_selected(app);
                    None
                }
                _ => None,
            }
        }
    }
}

fn open_selected(app: &mut App) {
    let Some(url) = app.selected_link().map(|link| link.url.clone()) else {
        return;
    };
    app.status_message = Some(match open::that(&url) {
        Ok(()) => format!("Opened {}", url),
        Err(e) => {
            warn!("Failed to open {}: {}", url, e);
            format!("Failed to open browser: {}", e)
        }
    });
}

fn copy_selected(app: &mut App) {
    let Some(url) = app.selected_link().map(|link| link.url.clone()) else {
        return;
    };
    let copied = arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(url.clone()));
    app.status_message = Some(match copied {
        Ok(()) => format!("Copied {}", url),
        Err(e) => {
            warn!("Clipboard unavailable: {}", e);
            format!("Failed to copy URL: {}", e)
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use easytoget_core::{
        CategoryFeed, ManualClock, ManualTimer, NotificationHub, SearchFeed, CATEGORIES,
    };

    fn app() -> App {
        let clock = ManualClock::new();
        let timer = ManualTimer::new(clock.clone());
        let hub = NotificationHub::new(Arc::new(clock.clone()), Arc::new(timer));
        let search = SearchFeed::new(Arc::new(clock.clone()), hub.clone());
        let category = CategoryFeed::new(Arc::new(clock));
        App::new(search, category, hub)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_poll_timeout_tracks_deadline() {
        let now = Instant::now();
        assert_eq!(poll_timeout(None, now), TICK);
        assert_eq!(
            poll_timeout(Some(now + Duration::from_millis(30)), now),
            Duration::from_millis(30)
        );
        assert_eq!(poll_timeout(Some(now + Duration::from_secs(3)), now), TICK);
        assert_eq!(poll_timeout(Some(now), now + Duration::from_millis(5)), Duration::ZERO);
    }

    #[test]
    fn test_search_keys() {
        let mut app = app();
        assert!(handle_key(&mut app, press(KeyCode::Char('/'))).is_none());
        assert_eq!(app.input_mode, InputMode::Searching);

        // 'q' is text while searching
        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert_eq!(app.search.query(), "q");

        handle_key(&mut app, press(KeyCode::Backspace));
        handle_key(&mut app, press(KeyCode::Char('7')));
        let dispatch = handle_key(&mut app, press(KeyCode::Enter)).unwrap();
        assert_eq!(dispatch.feed, FeedKind::Search);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_tab_keys_dispatch_category_loads() {
        let mut app = app();
        let dispatch = handle_key(&mut app, press(KeyCode::Tab)).unwrap();
        assert_eq!(dispatch.feed, FeedKind::Category);
        assert_eq!(app.category.slug(), Some(CATEGORIES[0]));

        assert!(handle_key(&mut app, press(KeyCode::BackTab)).is_none());
        assert_eq!(app.tab, 0);
    }

    #[test]
    fn test_help_swallows_keys_until_closed() {
        let mut app = app();
        handle_key(&mut app, press(KeyCode::Char('?')));
        assert!(app.show_help);

        assert!(handle_key(&mut app, press(KeyCode::Tab)).is_none());
        assert_eq!(app.tab, 0);

        handle_key(&mut app, press(KeyCode::Esc));
        assert!(!app.show_help);

        handle_key(&mut app, press(KeyCode::Char('q')));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits_from_search_mode() {
        let mut app = app();
        app.enter_search_mode();
        handle_key(
            &mut app,
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        );
        assert!(app.should_quit);
    }
}
