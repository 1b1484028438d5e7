use easytoget_api::{category_heading, ApiError, FetchTarget, PageRequest};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::feed::{FeedStatus, FetchOutcome, FetchTicket, Listing};
use crate::models::{to_display_links, DisplayLink};

/// Categories linked from the header, as route slugs
pub const CATEGORIES: &[&str] = &[
    "software-categories",
    "operating-systems",
    "graphic-design",
    "multimedia",
    "development",
    "antivirus",
    "backup-softwares",
];

/// Listing for a single category. Loads on open, never toasts.
pub struct CategoryFeed {
    clock: Arc<dyn Clock>,
    slug: Option<String>,
    listing: Listing,
    page: u32,
    per_page: Option<u32>,
    keep_results_on_error: bool,
}

impl CategoryFeed {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            slug: None,
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

    /// Switch to `slug` and load its first page
    pub fn open(&mut self, slug: impl Into<String>) -> FetchTicket {
        let slug = slug.into();
        if self.slug.as_deref() != Some(slug.as_str()) {
            // Another category's rows must not linger under this heading
            self.listing.clear();
        }
        self.slug = Some(slug);
        self.page = 1;
        self.begin()
    }

    /// Reload the current category, if one is open
    pub fn reload(&mut self) -> Option<FetchTicket> {
        self.slug.as_ref()?;
        Some(self.begin())
    }

    pub fn next_page(&mut self) -> Option<FetchTicket> {
        if self.slug.is_none() || !self.listing.page_info().has_next() {
            return None;
        }
        self.page += 1;
        Some(self.begin())
    }

    pub fn prev_page(&mut self) -> Option<FetchTicket> {
        if self.slug.is_none() || self.page <= 1 {
            return None;
        }
        self.page -= 1;
        Some(self.begin())
    }

    fn begin(&mut self) -> FetchTicket {
        let slug = self.slug.clone().unwrap_or_default();
        let page = PageRequest::for_page(self.page, self.per_page);
        let seq = self.listing.begin();
        debug!("Issuing category fetch #{} for {}", seq, slug);
        FetchTicket {
            seq,
            target: FetchTarget::Category { slug },
            page,
        }
    }

    /// Apply a finished fetch. Returns false if a newer request superseded it.
    pub fn apply(&mut self, ticket: &FetchTicket, outcome: FetchOutcome) -> bool {
        if !self.listing.is_current(ticket.seq) {
            debug!("Discarding stale category response #{}", ticket.seq);
            return false;
        }

        match outcome {
            Ok(page) => {
                let links = to_display_links(page.items, self.clock.wall_now());
                let message = if links.is_empty() {
                    Some("No download links found.".to_string())
                } else {
                    None
                };
                self.listing.succeed(links, page.info, message);
            }
            Err(e) => {
                warn!("Category fetch #{} failed: {}", ticket.seq, e);
                let message = match &e {
                    ApiError::Http { status } => {
                        format!("Failed to fetch category content. Status: {}", status)
                    }
                    ApiError::Rejected { .. } => "Failed to load category content.".to_string(),
                    other => format!("Error fetching category content: {}", other),
                };
                self.listing.fail(message, self.keep_results_on_error);
            }
        }
        true
    }

    pub fn slug(&self) -> Option<&str> {
        self.slug.as_deref()
    }

    /// Heading for the open category: the slug with spaces for hyphens
    pub fn heading(&self) -> String {
        self.slug.as_deref().map(category_heading).unwrap_or_default()
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
}
