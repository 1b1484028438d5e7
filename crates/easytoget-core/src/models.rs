use chrono::{DateTime, SecondsFormat, Utc};
use easytoget_api::CatalogItem;
use serde::{Deserialize, Serialize};

/// Logo service used for result thumbnails
pub const THUMBNAIL_SERVICE: &str = "https://logo.clearbit.com";

/// Shown when no host can be pulled out of an item's URL
pub const PLACEHOLDER_THUMBNAIL: &str = "https://via.placeholder.com/120x90.png?text=Image";

/// A catalog entry ready for display.
///
/// Rebuilt from scratch on every fetch; nothing holds on to these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayLink {
    pub name: String,
    pub url: String,
    pub content: String,
    pub thumbnail: String,
    /// Either the server's timestamp or a cosmetic one, see [`to_display_links`]
    pub timestamp: String,
}

impl DisplayLink {
    /// Host part of the URL without `www.`, or the raw URL when it does not parse
    pub fn domain(&self) -> String {
        domain_of(&self.url).unwrap_or_else(|| self.url.clone())
    }

    /// Timestamp parsed back, if it is in a format we understand
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.timestamp)
    }
}

/// Host of `url` with a leading `www.` stripped
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    if host.is_empty() {
        return None;
    }
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

/// Logo URL for an item, falling back to the placeholder for malformed URLs
pub fn derive_thumbnail(url: &str) -> String {
    match domain_of(url) {
        Some(domain) => format!("{}/{}", THUMBNAIL_SERVICE, domain),
        None => PLACEHOLDER_THUMBNAIL.to_string(),
    }
}

/// Filter out placeholder items and convert the rest.
///
/// Items without a timestamp get `now - index hours`, where `index` is the
/// position in the filtered list. That value is cosmetic, not an event time.
pub fn to_display_links(items: Vec<CatalogItem>, now: DateTime<Utc>) -> Vec<DisplayLink> {
    items
        .into_iter()
        .filter(|item| !item.is_placeholder())
        .enumerate()
        .map(|(index, item)| {
            let timestamp = item
                .timestamp
                .unwrap_or_else(|| synthesize_timestamp(now, index));
            DisplayLink {
                thumbnail: derive_thumbnail(&item.url),
                name: item.title,
                url: item.url,
                content: item.content.unwrap_or_default(),
                timestamp,
            }
        })
        .collect()
}

fn synthesize_timestamp(now: DateTime<Utc>, index: usize) -> String {
    let offset = chrono::Duration::hours(index as i64);
    (now - offset).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Accepts RFC 3339 as well as the zone-less ISO form the backend emits
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// "3 hours ago" style rendering relative to `now`
pub fn relative_time(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(ts) = timestamp else {
        return "Unknown time".to_string();
    };

    let delta = now.signed_duration_since(ts);
    if delta.num_seconds() < 0 {
        return "in the future".to_string();
    }

    let (amount, unit) = if delta.num_minutes() < 1 {
        return "less than a minute ago".to_string();
    } else if delta.num_hours() < 1 {
        (delta.num_minutes(), "minute")
    } else if delta.num_days() < 1 {
        (delta.num_hours(), "hour")
    } else if delta.num_days() < 30 {
        (delta.num_days(), "day")
    } else if delta.num_days() < 365 {
        (delta.num_days() / 30, "month")
    } else {
        (delta.num_days() / 365, "year")
    };

    if amount == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", amount, unit)
    }
}
