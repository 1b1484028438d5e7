// Application state for the TUI
use easytoget_core::{
    CategoryFeed, DisplayLink, FeedStatus, FetchOutcome, FetchTicket, Listing, Notification,
    NotificationHub, SearchFeed, Subscription, CATEGORIES,
};
use ratatui::widgets::ListState;
use std::sync::{Arc, Mutex};
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,    // Navigating results
    Searching, // Typing in search box
}

/// Which feed a fetch belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Search,
    Category,
}

/// A fetch the runner should perform, tagged with the feed that asked for it
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub feed: FeedKind,
    pub ticket: FetchTicket,
}

impl Dispatch {
    fn search(ticket: FetchTicket) -> Self {
        Self {
            feed: FeedKind::Search,
            ticket,
        }
    }

    fn category(ticket: FetchTicket) -> Self {
        Self {
            feed: FeedKind::Category,
            ticket,
        }
    }
}

pub struct App {
    pub input_mode: InputMode,
    pub search: SearchFeed,
    pub category: CategoryFeed,
    /// 0 is Home, 1.. index into CATEGORIES
    pub tab: usize,
    pub selected_index: usize,
    pub list_state: ListState,
    pub show_help: bool,
    pub should_quit: bool,
    /// One-line feedback for local actions (copy, open)
    pub status_message: Option<String>,
    hub: NotificationHub,
    toasts: Arc<Mutex<Vec<Notification>>>,
    subscription: Option<Subscription>,
}

impl App {
    pub fn new(search: SearchFeed, category: CategoryFeed, hub: NotificationHub) -> Self {
        let toasts = Arc::new(Mutex::new(hub.snapshot()));
        let mirror = toasts.clone();
        let subscription = hub.subscribe(move |list| {
            if let Ok(mut toasts) = mirror.lock() {
                *toasts = list.to_vec();
            }
        });

        let mut list_state = ListState::default();
        list_state.select(Some(0));

        Self {
            input_mode: InputMode::Normal,
            search,
            category,
            tab: 0,
            selected_index: 0,
            list_state,
            show_help: false,
            should_quit: false,
            status_message: None,
            hub,
            toasts,
            subscription: Some(subscription),
        }
    }

    pub fn tab_titles() -> Vec<String> {
        std::iter::once("Home".to_string())
            .chain(CATEGORIES.iter().map(|slug| easytoget_api::category_heading(slug)))
            .collect()
    }

    pub fn active_feed(&self) -> FeedKind {
        if self.tab == 0 {
            FeedKind::Search
        } else {
            FeedKind::Category
        }
    }

    pub fn listing(&self) -> &Listing {
        match self.active_feed() {
            FeedKind::Search => self.search.listing(),
            FeedKind::Category => self.category.listing(),
        }
    }

    pub fn items(&self) -> &[DisplayLink] {
        self.listing().items()
    }

    pub fn status(&self) -> FeedStatus {
        self.listing().status()
    }

    pub fn page(&self) -> u32 {
        match self.active_feed() {
            FeedKind::Search => self.search.page(),
            FeedKind::Category => self.category.page(),
        }
    }

    pub fn selected_link(&self) -> Option<&DisplayLink> {
        self.items().get(self.selected_index)
    }

    pub fn next_result(&mut self) {
        if self.selected_index + 1 < self.items().len() {
            self.selected_index += 1;
            self.list_state.select(Some(self.selected_index));
        }
    }

    pub fn previous_result(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
            self.list_state.select(Some(self.selected_index));
        }
    }

    fn reset_selection(&mut self) {
        self.selected_index = 0;
        self.list_state.select(Some(0));
    }

    pub fn enter_search_mode(&mut self) {
        self.input_mode = InputMode::Searching;
        self.tab = 0;
        self.reset_selection();
    }

    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn push_char(&mut self, c: char) {
        let mut query = self.search.query().to_string();
        query.push(c);
        self.search.set_query(query);
    }

    pub fn pop_char(&mut self) {
        let mut query = self.search.query().to_string();
        if query.pop().is_some() {
            self.search.set_query(query);
        }
    }

    /// The initial catalog load
    pub fn start(&mut self) -> Dispatch {
        Dispatch::search(self.search.start())
    }

    /// Fire the debounced search once its quiet period is over
    pub fn poll(&mut self) -> Option<Dispatch> {
        self.search.poll().map(Dispatch::search)
    }

    /// Enter in the search box: skip the rest of the debounce
    pub fn submit(&mut self) -> Option<Dispatch> {
        self.enter_normal_mode();
        self.search.submit().map(Dispatch::search)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.search.next_deadline()
    }

    pub fn next_tab(&mut self) -> Option<Dispatch> {
        let count = CATEGORIES.len() + 1;
        self.select_tab((self.tab + 1) % count)
    }

    pub fn previous_tab(&mut self) -> Option<Dispatch> {
        let count = CATEGORIES.len() + 1;
        self.select_tab((self.tab + count - 1) % count)
    }

    /// Switch tabs. Category tabs load on every visit.
    pub fn select_tab(&mut self, tab: usize) -> Option<Dispatch> {
        if tab > CATEGORIES.len() {
            return None;
        }
        self.tab = tab;
        self.reset_selection();
        if tab == 0 {
            return None;
        }
        Some(Dispatch::category(self.category.open(CATEGORIES[tab - 1])))
    }

    pub fn retry(&mut self) -> Option<Dispatch> {
        match self.active_feed() {
            FeedKind::Search => Some(Dispatch::search(self.search.retry())),
            FeedKind::Category => self.category.reload().map(Dispatch::category),
        }
    }

    pub fn next_page(&mut self) -> Option<Dispatch> {
        let dispatch = match self.active_feed() {
            FeedKind::Search => self.search.next_page().map(Dispatch::search),
            FeedKind::Category => self.category.next_page().map(Dispatch::category),
        };
        if dispatch.is_some() {
            self.reset_selection();
        }
        dispatch
    }

    pub fn prev_page(&mut self) -> Option<Dispatch> {
        let dispatch = match self.active_feed() {
            FeedKind::Search => self.search.prev_page().map(Dispatch::search),
            FeedKind::Category => self.category.prev_page().map(Dispatch::category),
        };
        if dispatch.is_some() {
            self.reset_selection();
        }
        dispatch
    }

    /// Route a finished fetch back to its feed
    pub fn apply(&mut self, feed: FeedKind, ticket: &FetchTicket, outcome: FetchOutcome) {
        let applied = match feed {
            FeedKind::Search => self.search.apply(ticket, outcome),
            FeedKind::Category => self.category.apply(ticket, outcome),
        };
        if applied && feed == self.active_feed() {
            let len = self.items().len();
            if self.selected_index >= len {
                self.reset_selection();
            }
        }
    }

    /// Active toasts, oldest first
    pub fn toasts(&self) -> Vec<Notification> {
        self.toasts
            .lock()
            .map(|toasts| toasts.clone())
            .unwrap_or_default()
    }

    pub fn dismiss_newest_toast(&mut self) -> bool {
        match self.toasts().last() {
            Some(newest) => self.hub.dismiss(newest.id),
            None => false,
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}
