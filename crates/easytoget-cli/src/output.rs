// Plain-text and JSON printing for the one-shot commands
use chrono::{DateTime, Utc};
use easytoget_core::{relative_time, DisplayLink};

pub fn print_links(links: &[DisplayLink], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(links)?);
        return Ok(());
    }

    if links.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    let now = Utc::now();
    for link in links {
        println!("{}", format_link(link, now));
    }
    println!("{} result(s)", links.len());
    Ok(())
}

fn format_link(link: &DisplayLink, now: DateTime<Utc>) -> String {
    let mut out = format!(
        "{}  ({}, {})\n  {}",
        link.name,
        link.domain(),
        relative_time(link.parsed_timestamp(), now),
        link.url
    );
    if !link.content.is_empty() {
        out.push_str("\n  ");
        out.push_str(&link.content);
    }
    out.push('\n');
    out
}
