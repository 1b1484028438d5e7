// Everything between the content API and the screen: feeds, toasts, time
pub mod category;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod error;
pub mod feed;
pub mod models;
pub mod notify;
pub mod timer;

pub use category::{CategoryFeed, CATEGORIES};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use debounce::Debounced;
pub use error::Error;
pub use feed::{FeedStatus, FetchOutcome, FetchTicket, Listing, SearchFeed, SEARCH_DEBOUNCE};
pub use models::{relative_time, DisplayLink};
pub use notify::{Notification, NotificationHub, NotificationKind, Subscription};
pub use timer::{ManualTimer, Timer, TokioTimer};

/// Result type alias for fallible core operations
pub type Result<T> = std::result::Result<T, Error>;
