// ABOUTME: CLI for the dramaqu scrape pipeline.
// ABOUTME: Runs one operation against the site, or against a saved HTML page, and prints the scored JSON envelope.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use dramaqu_scrape::records::{detail, episode, home, listing, schedule};
use dramaqu_scrape::score::{score_home, score_record, score_records, score_schedule};
use dramaqu_scrape::{load_builtin_rules, Client, Scored, Weekday};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Scrape dramaqu pages and print scored records as JSON.
#[derive(Parser, Debug)]
#[command(name = "dramaqu")]
#[command(about = "Scrape dramaqu pages into scored JSON records", long_about = None)]
struct Args {
    /// Site root to scrape.
    #[arg(long, env = "DRAMAQU_BASE_URL", default_value = "https://dramaqu.ad", global = true)]
    base_url: String,

    /// Per-request timeout in seconds.
    #[arg(long, env = "DRAMAQU_TIMEOUT_SECS", default_value_t = 30, global = true)]
    timeout: u64,

    /// Override the browser User-Agent.
    #[arg(long, env = "DRAMAQU_USER_AGENT", global = true)]
    user_agent: Option<String>,

    /// Read the page from a saved HTML file instead of fetching it.
    #[arg(long, global = true)]
    html: Option<PathBuf>,

    /// Page URL of the saved HTML (defaults to the operation's own URL).
    #[arg(long, global = true)]
    page_url: Option<String>,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Home page aggregate: top ranked, new episodes, movies and the schedule.
    Home,
    /// Ongoing drama listing.
    Ongoing {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Full drama list.
    Movies {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Search titles.
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Weekly release schedule, or a single day of it.
    Schedule {
        #[arg(long)]
        day: Option<String>,
    },
    /// Title detail by slug, path or URL.
    Detail { slug: String },
    /// Episode playback with its streaming link.
    Episode { url: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let output = match &args.html {
        Some(path) => run_offline(&args, path)?,
        None => run_online(&args).await?,
    };

    if args.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

async fn run_online(args: &Args) -> Result<serde_json::Value> {
    let mut builder = Client::builder()
        .base_url(&args.base_url)
        .timeout(Duration::from_secs(args.timeout))
        .secondary_timeout(Duration::from_secs(args.timeout));
    if let Some(ua) = &args.user_agent {
        builder = builder.user_agent(ua);
    }
    let client = builder.build();
    tracing::debug!(command = ?args.command, base_url = %args.base_url, "fetching");

    let value = match &args.command {
        Command::Home => to_json(client.home().await?)?,
        Command::Ongoing { page } => to_json(client.listing(*page).await?)?,
        Command::Movies { page } => to_json(client.movie_list(*page).await?)?,
        Command::Search { query, page } => to_json(client.search(query, *page).await?)?,
        Command::Schedule { day: Some(day) } => to_json(client.schedule_for_day(day).await?)?,
        Command::Schedule { day: None } => to_json(client.schedule().await?)?,
        Command::Detail { slug } => to_json(client.detail(slug).await?)?,
        Command::Episode { url } => to_json(client.episode_playback(url).await?)?,
    };
    Ok(value)
}

/// Builds records from a saved page. No request is made, so episode pages
/// come back without a streaming link.
fn run_offline(args: &Args, path: &PathBuf) -> Result<serde_json::Value> {
    let html = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let page = match &args.page_url {
        Some(url) => Url::parse(url).with_context(|| format!("invalid --page-url {}", url))?,
        None => default_page_url(args)?,
    };
    let source = page.host_str().unwrap_or_default().to_string();
    let rules = load_builtin_rules();
    tracing::debug!(command = ?args.command, file = %path.display(), page_url = %page, "parsing saved page");

    let value = match &args.command {
        Command::Home => {
            // The saved main page doubles as the schedule source.
            let data = home::home(&rules, &html, &page, &html, &page);
            let confidence = score_home(&data);
            to_json(Scored::new(data, confidence, source))?
        }
        Command::Ongoing { .. } => {
            let data = listing::ongoing(&rules, &html, &page);
            let confidence = score_records(&data);
            to_json(Scored::new(data, confidence, source))?
        }
        Command::Movies { .. } => {
            let data = listing::movie_list(&rules, &html, &page);
            let confidence = score_records(&data);
            to_json(Scored::new(data, confidence, source))?
        }
        Command::Search { .. } => {
            let data = listing::search(&rules, &html, &page);
            let confidence = score_records(&data);
            to_json(Scored::new(data, confidence, source))?
        }
        Command::Schedule { day: Some(day) } => {
            let day: Weekday = day.parse()?;
            let data = schedule::schedule_for_day(&rules, &html, &page, day);
            let confidence = score_records(&data);
            to_json(Scored::new(data, confidence, source))?
        }
        Command::Schedule { day: None } => {
            let data = schedule::schedule(&rules, &html, &page);
            let confidence = score_schedule(&data);
            to_json(Scored::new(data, confidence, source))?
        }
        Command::Detail { .. } => {
            let data = detail::detail(&rules, &html, &page);
            let confidence = score_record(&data);
            to_json(Scored::new(data, confidence, source))?
        }
        Command::Episode { .. } => {
            let data = episode::episode_page(&rules, &html, &page, Utc::now()).playback;
            let confidence = score_record(&data);
            to_json(Scored::new(data, confidence, source))?
        }
    };
    Ok(value)
}

/// URL the operation would have fetched, used to resolve relative links.
fn default_page_url(args: &Args) -> Result<Url> {
    let base = Url::parse(&format!("{}/", args.base_url.trim_end_matches('/')))
        .with_context(|| format!("invalid --base-url {}", args.base_url))?;
    let path = match &args.command {
        Command::Home => String::new(),
        Command::Ongoing { .. } | Command::Schedule { .. } => {
            "category/ongoing-drama/".to_string()
        }
        Command::Movies { .. } => "drama-list/".to_string(),
        Command::Search { .. } => String::new(),
        Command::Detail { slug } => format!("{}/", slug.trim_matches('/')),
        Command::Episode { url } => {
            return Url::parse(url).with_context(|| format!("invalid episode URL {}", url));
        }
    };
    Ok(base.join(&path)?)
}

fn to_json<T: Serialize>(value: T) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}
