use clap::Parser;
use easytoget_api::{CatalogSource, ContentClient, FetchTarget, PageRequest};
use easytoget_core::models::to_display_links;
use easytoget_core::{
    CategoryFeed, Config, NotificationHub, SearchFeed, SystemClock, TokioTimer, CATEGORIES,
};
use easytoget_tui::{App, TuiOptions};
use std::sync::{Arc, Mutex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod output;

#[derive(Parser)]
#[command(name = "easytoget")]
#[command(version, about = "Browse and search official software download links", long_about = None)]
struct Cli {
    /// Base URL of the content API, e.g. http://localhost:5001
    #[arg(long, global = true, env = "EASYTOGET_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Interactive terminal UI (the default)
    Tui,
    /// Search downloads by keyword
    Search {
        /// Search query
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
    /// List one category
    Category {
        /// Category slug, e.g. operating-systems
        slug: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        json: bool,
    },
    /// Dump the whole catalog in one request
    All {
        #[arg(long)]
        json: bool,
    },
    /// Check that the content API is up
    Health,
    /// Show the config file, or write the defaults with --init
    Config {
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);

    init_logging(matches!(command, Commands::Tui))?;

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api.base_url = Some(url);
    }

    let base_url = config.api.resolved_base_url();
    let client = ContentClient::with_timeout(base_url.as_str(), config.api.timeout())?;
    tracing::debug!("Using content API at {}", base_url);

    match command {
        Commands::Tui => run_tui(config, client).await,
        Commands::Search { query, page, json } => {
            let target = FetchTarget::for_query(&query, chrono::Utc::now().timestamp_millis());
            if target == FetchTarget::Catalog {
                tracing::info!("Empty query, listing the default catalog");
            }
            print_listing(&client, &target, page, config.api.per_page, json).await
        }
        Commands::Category { slug, page, json } => {
            if !CATEGORIES.contains(&slug.as_str()) {
                tracing::warn!("{} is not one of the known categories", slug);
            }
            let target = FetchTarget::Category { slug };
            print_listing(&client, &target, page, config.api.per_page, json).await
        }
        Commands::All { json } => {
            let page = client.all().await?;
            let links = to_display_links(page.items, chrono::Utc::now());
            output::print_links(&links, json)
        }
        Commands::Health => {
            let health = client.health().await?;
            println!(
                "{} is up{}",
                client.base_url(),
                health
                    .message
                    .map(|m| format!(": {}", m))
                    .unwrap_or_default()
            );
            Ok(())
        }
        Commands::Config { init } => {
            let path = Config::config_path()?;
            if init {
                config.save()?;
                println!("Wrote {}", path.display());
            } else {
                println!("# {}", path.display());
                print!("{}", toml::to_string_pretty(&config)?);
            }
            Ok(())
        }
    }
}

async fn print_listing(
    client: &ContentClient,
    target: &FetchTarget,
    page: u32,
    per_page: Option<u32>,
    json: bool,
) -> anyhow::Result<()> {
    let result = client.fetch(target, PageRequest::for_page(page, per_page)).await?;
    let info = result.info.clone();
    let links = to_display_links(result.items, chrono::Utc::now());

    output::print_links(&links, json)?;
    if let (false, Some(pages)) = (json, info.pages) {
        if pages > 1 {
            println!("page {} of {}", info.page.unwrap_or(page), pages);
        }
    }
    Ok(())
}

async fn run_tui(config: Config, client: ContentClient) -> anyhow::Result<()> {
    let clock = Arc::new(SystemClock);
    let timer = Arc::new(TokioTimer::current()?);
    let hub = NotificationHub::with_default_duration(
        clock.clone(),
        timer,
        config.notifications.default_duration(),
    );

    let search = SearchFeed::new(clock.clone(), hub.clone())
        .with_per_page(config.api.per_page)
        .keep_results_on_error(config.feed.keep_results_on_error);
    let category = CategoryFeed::new(clock)
        .with_per_page(config.api.per_page)
        .keep_results_on_error(config.feed.keep_results_on_error);

    let mut app = App::new(search, category, hub);
    app.show_help = config.ui.show_help_on_start;

    let source: Arc<dyn CatalogSource> = Arc::new(client);
    easytoget_tui::run_tui(
        app,
        source,
        TuiOptions {
            mouse_enabled: config.ui.mouse_enabled,
        },
    )
    .await
}

/// Log to stderr, or to a file while the TUI owns the terminal
fn init_logging(tui: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "easytoget=info".into());

    if tui {
        let dir = Config::log_dir()?;
        std::fs::create_dir_all(&dir)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("easytoget.log"))?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}
