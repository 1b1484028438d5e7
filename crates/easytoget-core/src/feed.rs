// Debounced search over the content API
use easytoget_api::{CatalogSource, ContentPage, FetchTarget, PageInfo, PageRequest};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::debounce::Debounced;
use crate::models::{to_display_links, DisplayLink};
use crate::notify::{NotificationHub, NotificationKind};

/// Quiet period after the last keystroke before a search goes out
pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(500);

/// What a fetch produced, as handed back to a feed
pub type FetchOutcome = easytoget_api::Result<ContentPage>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FeedStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Empty,
    Error,
}

impl std::fmt::Display for FeedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedStatus::Idle => write!(f, "Idle"),
            FeedStatus::Loading => write!(f, "Loading"),
            FeedStatus::Success => write!(f, "Success"),
            FeedStatus::Empty => write!(f, "Empty"),
            FeedStatus::Error => write!(f, "Error"),
        }
    }
}

/// One fetch a feed wants performed.
///
/// The host runs it however it likes (usually a spawned task) and hands the
/// outcome back with the ticket. `seq` lets the feed drop outcomes that a newer
/// request has already superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub target: FetchTarget,
    pub page: Option<PageRequest>,
}

impl FetchTicket {
    pub async fn run(&self, source: &dyn CatalogSource) -> FetchOutcome {
        source.fetch(&self.target, self.page).await
    }
}

/// Items, status and message of a listing, plus the request sequence guard
#[derive(Debug, Clone, Default)]
pub struct Listing {
    items: Vec<DisplayLink>,
    status: FeedStatus,
    message: Option<String>,
    page_info: PageInfo,
    latest_seq: u64,
}

impl Listing {
    pub fn items(&self) -> &[DisplayLink] {
        &self.items
    }

    pub fn status(&self) -> FeedStatus {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn page_info(&self) -> &PageInfo {
        &self.page_info
    }

    pub fn is_loading(&self) -> bool {
        self.status == FeedStatus::Loading
    }

    /// Sequence number of the most recent request
    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    pub(crate) fn begin(&mut self) -> u64 {
        self.status = FeedStatus::Loading;
        self.message = None;
        self.latest_seq += 1;
        self.latest_seq
    }

    /// Drop the rows but keep the sequence counter running
    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.page_info = PageInfo::default();
        self.message = None;
        self.status = FeedStatus::Idle;
    }

    pub(crate) fn is_current(&self, seq: u64) -> bool {
        seq == self.latest_seq
    }

    pub(crate) fn succeed(&mut self, items: Vec<DisplayLink>, info: PageInfo, message: Option<String>) {
        self.status = if items.is_empty() {
            FeedStatus::Empty
        } else {
            FeedStatus::Success
        };
        self.items = items;
        self.page_info = info;
        self.message = message;
    }

    pub(crate) fn fail(&mut self, message: String, keep_items: bool) {
        self.status = FeedStatus::Error;
        self.message = Some(message);
        if !keep_items {
            self.items.clear();
            self.page_info = PageInfo::default();
        }
    }
}

/// The search box and its result list.
///
/// Keystrokes go in through [`set_query`](Self::set_query); the host calls
/// [`poll`](Self::poll) from its loop and runs any ticket it gets back, then
/// reports through [`apply`](Self::apply). Only the newest ticket's outcome is
/// applied.
pub struct SearchFeed {
    clock: Arc<dyn Clock>,
    hub: NotificationHub,
    query: String,
    debounced: Debounced<String>,
    listing: Listing,
    page: u32,
    per_page: Option<u32>,
    keep_results_on_error: bool,
}

impl SearchFeed {
    pub fn new(clock: Arc<dyn Clock>, hub: NotificationHub) -> Self {
        let debounced = Debounced::new(String::new(), SEARCH_DEBOUNCE, clock.clone());
        Self {
            clock,
            hub,
            query: String::new(),
            debounced,
            listing: Listing::default(),
            page: 1,
            per_page: None,
            keep_results_on_error: false,
        }
    }

    pub fn with_per_page(mut self, per_page: Option<u32>) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn keep_results_on_error(mut self, keep: bool) -> Self {
        self.keep_results_on_error = keep;
        self
    }

    /// Initial load of the default catalog
    pub fn start(&mut self) -> FetchTicket {
        self.begin()
    }

    /// Update the live query. Nothing is fetched until the debounce settles.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.debounced.set(self.query.clone());
    }

    /// Fire a fetch if the query has settled on a new value
    pub fn poll(&mut self) -> Option<FetchTicket> {
        self.debounced.poll()?;
        self.page = 1;
        Some(self.begin())
    }

    /// Settle the pending query right away (Enter in the search box)
    pub fn submit(&mut self) -> Option<FetchTicket> {
        self.debounced.flush()?;
        self.page = 1;
        Some(self.begin())
    }

    /// Fetch the current query again. There is no automatic retry; this is the user asking.
    pub fn retry(&mut self) -> FetchTicket {
        self.begin()
    }

    pub fn next_page(&mut self) -> Option<FetchTicket> {
        if !self.listing.page_info.has_next() {
            return None;
        }
        self.page += 1;
        Some(self.begin())
    }

    pub fn prev_page(&mut self) -> Option<FetchTicket> {
        if self.page <= 1 {
            return None;
        }
        self.page -= 1;
        Some(self.begin())
    }

    fn begin(&mut self) -> FetchTicket {
        let target = FetchTarget::for_query(
            self.debounced.settled(),
            self.clock.wall_now().timestamp_millis(),
        );
        let page = PageRequest::for_page(self.page, self.per_page);

        let seq = self.listing.begin();
        debug!("Issuing fetch #{} for {:?}", seq, target);
        FetchTicket { seq, target, page }
    }

    /// Apply a finished fetch. Returns false if a newer request superseded it.
    pub fn apply(&mut self, ticket: &FetchTicket, outcome: FetchOutcome) -> bool {
        if !self.listing.is_current(ticket.seq) {
            debug!(
                "Discarding stale response #{} (latest is #{})",
                ticket.seq,
                self.listing.latest_seq()
            );
            return false;
        }

        let query = ticket.target.query();
        match outcome {
            Ok(page) => {
                let links = to_display_links(page.items, self.clock.wall_now());
                let count = links.len();
                let message = if count == 0 {
                    "No results found.".to_string()
                } else {
                    format!("Found {} result(s).", count)
                };
                info!("Fetch #{} returned {} displayable items", ticket.seq, count);

                self.listing.succeed(links, page.info, Some(message.clone()));

                if !query.is_empty() {
                    let kind = if count == 0 {
                        NotificationKind::Info
                    } else {
                        NotificationKind::Success
                    };
                    self.hub.notify(message, kind);
                }
            }
            Err(e) => {
                warn!("Fetch #{} failed: {}", ticket.seq, e);
                let message = format!("Error fetching data: {}", e);
                self.listing.fail(message.clone(), self.keep_results_on_error);

                if !query.is_empty() {
                    self.hub.notify(message, NotificationKind::Error);
                }
            }
        }
        true
    }

    /// The live (undebounced) query
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The query the current results belong to
    pub fn settled_query(&self) -> &str {
        self.debounced.settled()
    }

    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    pub fn items(&self) -> &[DisplayLink] {
        self.listing.items()
    }

    pub fn status(&self) -> FeedStatus {
        self.listing.status()
    }

    pub fn message(&self) -> Option<&str> {
        self.listing.message()
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// When the pending keystrokes will settle, so a host can wake up in time
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debounced.deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::timer::ManualTimer;
    use easytoget_api::{ApiError, CatalogItem};

    fn feed() -> (SearchFeed, ManualClock, NotificationHub) {
        let clock = ManualClock::new();
        let timer = ManualTimer::new(clock.clone());
        let hub = NotificationHub::new(Arc::new(clock.clone()), Arc::new(timer));
        let feed = SearchFeed::new(Arc::new(clock.clone()), hub.clone());
        (feed, clock, hub)
    }

    fn page_of(urls: &[&str]) -> ContentPage {
        ContentPage {
            items: urls
                .iter()
                .map(|url| CatalogItem {
                    title: format!("title for {}", url),
                    url: url.to_string(),
                    content: None,
                    timestamp: None,
                    id: None,
                    category: None,
                })
                .collect(),
            info: PageInfo::default(),
        }
    }

    #[test]
    fn test_start_loads_catalog_silently() {
        let (mut feed, _clock, hub) = feed();
        let ticket = feed.start();
        assert_eq!(ticket.target, FetchTarget::Catalog);
        assert_eq!(ticket.page, None);
        assert_eq!(feed.status(), FeedStatus::Loading);

        assert!(feed.apply(&ticket, Ok(page_of(&["https://git-scm.com/downloads"]))));
        assert_eq!(feed.status(), FeedStatus::Success);
        assert_eq!(feed.message(), Some("Found 1 result(s)."));
        assert!(hub.is_empty());
    }

    #[test]
    fn test_keystrokes_coalesce_into_one_search() {
        let (mut feed, clock, _hub) = feed();
        let _ = feed.start();

        feed.set_query("v");
        clock.advance(Duration::from_millis(100));
        assert!(feed.poll().is_none());
        feed.set_query("vl");
        clock.advance(Duration::from_millis(499));
        assert!(feed.poll().is_none());
        feed.set_query("vlc ");
        clock.advance(Duration::from_millis(500));

        let ticket = feed.poll().expect("settled");
        assert_eq!(ticket.target.query(), "vlc");
        assert!(matches!(ticket.target, FetchTarget::Search { .. }));
        assert!(feed.poll().is_none());
    }

    #[test]
    fn test_stale_response_is_ignored() {
        let (mut feed, clock, hub) = feed();
        let _ = feed.start();

        feed.set_query("zoom");
        clock.advance(SEARCH_DEBOUNCE);
        let slow = feed.poll().unwrap();

        feed.set_query("zip");
        clock.advance(SEARCH_DEBOUNCE);
        let fast = feed.poll().unwrap();
        assert!(fast.seq > slow.seq);

        assert!(feed.apply(&fast, Ok(page_of(&["https://www.7-zip.org/"]))));
        assert!(!feed.apply(&slow, Ok(page_of(&["https://zoom.us/", "https://zoom.com/"]))));

        assert_eq!(feed.items().len(), 1);
        assert_eq!(feed.items()[0].url, "https://www.7-zip.org/");
        assert_eq!(hub.len(), 1);
    }

    #[test]
    fn test_error_clears_items_by_default() {
        let (mut feed, clock, hub) = feed();
        let first = feed.start();
        feed.apply(&first, Ok(page_of(&["https://brave.com/"])));

        feed.set_query("brave");
        clock.advance(SEARCH_DEBOUNCE);
        let ticket = feed.poll().unwrap();
        feed.apply(&ticket, Err(ApiError::Http { status: 503 }));

        assert_eq!(feed.status(), FeedStatus::Error);
        assert!(feed.items().is_empty());
        assert!(feed.message().unwrap().contains("503"));
        assert_eq!(hub.snapshot()[0].kind, NotificationKind::Error);
    }

    #[test]
    fn test_error_can_keep_stale_results() {
        let (feed, clock, _hub) = feed();
        let mut feed = feed.keep_results_on_error(true);
        let first = feed.start();
        feed.apply(&first, Ok(page_of(&["https://brave.com/"])));

        feed.set_query("brave");
        clock.advance(SEARCH_DEBOUNCE);
        let ticket = feed.poll().unwrap();
        feed.apply(&ticket, Err(ApiError::Http { status: 500 }));

        assert_eq!(feed.status(), FeedStatus::Error);
        assert_eq!(feed.items().len(), 1);
    }

    #[test]
    fn test_paging_follows_page_info() {
        let (mut feed, _clock, _hub) = feed();
        let ticket = feed.start();
        assert!(feed.prev_page().is_none());

        let mut page = page_of(&["https://slack.com/downloads/"]);
        page.info = PageInfo {
            page: Some(1),
            per_page: Some(10),
            total: Some(14),
            pages: Some(2),
            next_page: Some("/content?page=2&per_page=10".into()),
        };
        feed.apply(&ticket, Ok(page));

        let next = feed.next_page().expect("has a second page");
        assert_eq!(next.page, Some(PageRequest { page: 2, per_page: None }));
        assert_eq!(feed.page(), 2);

        let prev = feed.prev_page().expect("can go back");
        assert_eq!(feed.page(), 1);
        assert_eq!(prev.page, None);
    }

    #[test]
    fn test_submit_skips_debounce() {
        let (mut feed, _clock, _hub) = feed();
        let _ = feed.start();
        feed.set_query("gimp");
        let ticket = feed.submit().expect("flushed");
        assert_eq!(ticket.target.query(), "gimp");
        assert_eq!(feed.settled_query(), "gimp");
    }
}
