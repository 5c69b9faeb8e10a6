// benefits-hub: browse student benefits in the terminal, ranked by GitHub stars.

mod app;
mod catalog;
mod config;
mod error;
mod github;
mod stars;
mod ui;

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::app::App;
use crate::catalog::Benefit;
use crate::config::Config;
use crate::error::{HubError, Result};
use crate::github::GitHubClient;
use crate::stars::{FileStore, KeyValueStore, MemoryStore, StarsCache, StarsSnapshot, SystemClock};

#[derive(Parser)]
#[command(name = "benefits-hub")]
#[command(version)]
#[command(about = "Browse student benefits, ranked by GitHub stars")]
struct Cli {
    /// GitHub token for a higher API rate limit
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API root, for GitHub Enterprise installations
    #[arg(long, env = "GITHUB_API_URL", value_name = "URL")]
    api_url: Option<String>,

    /// Directory for the stars cache and log file
    #[arg(long, env = "BENEFITS_HUB_CACHE_DIR", value_name = "DIR")]
    cache_dir: Option<PathBuf>,

    /// Keep the stars cache in memory only
    #[arg(long, conflicts_with = "cache_dir")]
    no_cache: bool,

    /// Minutes before a cached star count is refreshed
    #[arg(long, default_value_t = 60, value_name = "MINUTES")]
    ttl_minutes: u64,

    /// Seconds before a single star lookup is abandoned
    #[arg(long, default_value_t = 10, value_name = "SECONDS")]
    lookup_timeout_secs: u64,

    /// Catalog JSON file to use instead of the bundled one
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Initial category filter
    #[arg(short, long, default_value = "All")]
    category: String,

    /// Initial search query
    #[arg(short, long, default_value = "")]
    query: String,

    /// Print the ranked list and exit instead of starting the TUI
    #[arg(long)]
    plain: bool,

    /// Log level
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let cache_dir = if self.no_cache {
            None
        } else {
            self.cache_dir.or_else(config::default_cache_dir)
        };

        let ttl_secs = self
            .ttl_minutes
            .checked_mul(60)
            .ok_or_else(|| HubError::Other(format!("ttl too large: {} minutes", self.ttl_minutes)))?;

        let config = Config {
            github_token: Config::normalize_token(self.token),
            api_url: self.api_url.filter(|url| !url.trim().is_empty()),
            cache_dir,
            ttl: Duration::from_secs(ttl_secs),
            lookup_timeout: Duration::from_secs(self.lookup_timeout_secs),
            catalog_path: self.catalog,
            category: Config::parse_category(&self.category)?,
            query: self.query,
            plain: self.plain,
            log_level: self.log_level,
        };
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Cli::parse().into_config()?;
    init_logging(&config)?;

    let benefits = match &config.catalog_path {
        Some(path) => catalog::load_from(path)?,
        None => catalog::load_embedded()?,
    };
    info!(benefits = benefits.len(), "loaded catalog");

    let mut client = GitHubClient::new(config.github_token.as_deref())?;
    if let Some(api_url) = &config.api_url {
        client = client.with_base_url(api_url);
    }
    let client = Arc::new(client);
    let store: Arc<dyn KeyValueStore> = match &config.cache_dir {
        Some(dir) => Arc::new(FileStore::new(dir)),
        None => Arc::new(MemoryStore::new()),
    };
    let cache = StarsCache::new(store, client.clone(), Arc::new(SystemClock))
        .with_ttl(config.ttl)
        .with_lookup_timeout(config.lookup_timeout);

    if config.plain {
        return print_plain(&config, &benefits, &cache).await;
    }

    let mut app = App::new(benefits, cache, Some(client)).with_filters(config.category, &config.query);
    let mut terminal = ratatui::init();
    let result = app.run(&mut terminal);
    ratatui::restore();
    result?;

    Ok(())
}

/// Initialize tracing. The TUI owns the terminal, so it logs to a file.
fn init_logging(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("benefits_hub={}", config.log_level)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match config.log_path() {
        Some(path) if !config.plain => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| HubError::Other(e.to_string()))
        }
        // Without a cache directory there is nowhere to write a log file;
        // stay silent rather than draw over the TUI.
        None if !config.plain => Ok(()),
        _ => builder
            .with_writer(io::stderr)
            .try_init()
            .map_err(|e| HubError::Other(e.to_string())),
    }
}

/// Print the ranked catalog once star lookups have settled.
async fn print_plain(config: &Config, benefits: &[Benefit], cache: &StarsCache) -> Result<()> {
    let repos = catalog::repo_ids(benefits);
    let mut resolution = cache.resolve(repos.iter().map(|r| r.as_str()));

    let deadline = settle_deadline(config.lookup_timeout);
    let stars = match tokio::time::timeout(deadline, resolution.settled()).await {
        Ok(stars) => stars,
        Err(_) => {
            warn!("star lookups did not settle in time, printing what is known");
            resolution.snapshot()
        }
    };

    let ranked = catalog::rank(benefits, config.category, &config.query, &stars);
    let mut out = io::stdout().lock();
    write_ranked(&mut out, &ranked, &stars)?;
    Ok(())
}

/// How long `--plain` waits for lookups. Each lookup is already bounded by
/// `lookup_timeout`; the extra second only guards against a stuck runtime.
fn settle_deadline(lookup_timeout: Duration) -> Duration {
    lookup_timeout.saturating_add(Duration::from_secs(1))
}

fn write_ranked(out: &mut impl Write, ranked: &[&Benefit], stars: &StarsSnapshot) -> io::Result<()> {
    let noun = if ranked.len() == 1 { "perk" } else { "perks" };
    writeln!(out, "Found {} {}", ranked.len(), noun)?;

    for benefit in ranked {
        let badge = benefit
            .repo
            .as_ref()
            .and_then(|repo| stars.get(repo))
            .map(|count| format!("★ {}", ui::format_stars(count)))
            .unwrap_or_default();
        writeln!(
            out,
            "{:<40} {:>8}  {:<20} {}",
            benefit.name,
            badge,
            benefit.category.title(),
            benefit.link
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Category;
    use crate::stars::RepoId;

    #[test]
    fn test_cli_defaults() {
        let config = Cli::parse_from(["benefits-hub"]).into_config().unwrap();
        assert_eq!(config.ttl, Duration::from_secs(3600));
        assert_eq!(config.lookup_timeout, Duration::from_secs(10));
        assert!(config.category.is_none());
        assert!(config.api_url.is_none());
        assert!(!config.plain);
    }

    #[test]
    fn test_cli_api_url() {
        let config = Cli::parse_from(["benefits-hub", "--api-url", "https://github.example.com/api/v3/"])
            .into_config()
            .unwrap();
        assert_eq!(config.api_url.as_deref(), Some("https://github.example.com/api/v3/"));
    }

    #[test]
    fn test_cli_flags() {
        let config = Cli::parse_from([
            "benefits-hub",
            "--no-cache",
            "--ttl-minutes",
            "5",
            "--category",
            "design",
            "--query",
            "figma",
            "--plain",
        ])
        .into_config()
        .unwrap();

        assert!(config.cache_dir.is_none());
        assert_eq!(config.ttl, Duration::from_secs(300));
        assert_eq!(config.category, Some(Category::Design));
        assert_eq!(config.query, "figma");
        assert!(config.plain);
    }

    #[test]
    fn test_cli_rejects_unknown_category() {
        assert!(
            Cli::parse_from(["benefits-hub", "--category", "Snacks"])
                .into_config()
                .is_err()
        );
    }

    #[test]
    fn test_cli_rejects_overflowing_ttl() {
        let result = Cli::parse_from(["benefits-hub", "--ttl-minutes", "18446744073709551615"])
            .into_config();
        assert!(matches!(result, Err(HubError::Other(_))));
    }

    #[test]
    fn test_cli_accepts_huge_lookup_timeout() {
        let config = Cli::parse_from(["benefits-hub", "--lookup-timeout-secs", "18446744073709551615"])
            .into_config()
            .unwrap();
        assert_eq!(settle_deadline(config.lookup_timeout), Duration::MAX);
        assert_eq!(settle_deadline(Duration::from_secs(10)), Duration::from_secs(11));
    }

    #[test]
    fn test_log_level_short_flag() {
        let config = Cli::parse_from(["benefits-hub", "-l", "debug"]).into_config().unwrap();
        assert_eq!(config.log_level, "debug");
        assert!(Cli::try_parse_from(["benefits-hub", "-v", "debug"]).is_err());
    }

    #[test]
    fn test_write_ranked() {
        let benefit = Benefit {
            id: "next".to_string(),
            name: "Vercel".to_string(),
            category: Category::CloudHosting,
            description: String::new(),
            link: "https://vercel.com".to_string(),
            tags: Vec::new(),
            popularity: 9,
            repo: RepoId::parse("vercel/next.js"),
        };
        let stars: StarsSnapshot = [(RepoId::parse("vercel/next.js").unwrap(), 128_000)]
            .into_iter()
            .collect();

        let mut out = Vec::new();
        write_ranked(&mut out, &[&benefit], &stars).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Found 1 perk\n"));
        assert!(text.contains("★ 128k"));
        assert!(text.contains("https://vercel.com"));
    }
}
