use anyhow::{anyhow, Error};
use clap::Parser;
use delivery_fee_core::{
    find_config_file, load_config, ConfigSource, DEFAULT_INGEST_MINUTE, DEFAULT_SERVER_PORT,
};
use reqwest::Client;
use reqwest_middleware::ClientBuilder;
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use slog::{debug, o, Drain, Level, Logger};
use std::{env, time::Duration};
use time::{Duration as TimeDuration, OffsetDateTime};

pub const DEFAULT_SOURCE_URL: &str =
    "https://www.ilmateenistus.ee/ilma_andmed/xml/observations.php";

pub const DEFAULT_STATIONS: [&str; 3] = ["Tallinn-Harku", "Tartu-Tõravere", "Pärnu"];

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "Weather daemon - fetches Estonian weather observations for the fee server"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $DELIVERY_FEE_DAEMON_CONFIG, ./daemon.toml,
    /// $XDG_CONFIG_HOME/delivery-fee/daemon.toml, /etc/delivery-fee/daemon.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "WEATHER_DAEMON_LEVEL")]
    pub level: Option<String>,

    /// Fee server URL observations are sent to
    #[arg(short, long, env = "WEATHER_DAEMON_SERVER_URL")]
    pub server_url: Option<String>,

    /// Observations XML feed
    #[arg(long, env = "WEATHER_DAEMON_SOURCE_URL")]
    pub source_url: Option<String>,

    /// Station names to keep, comma separated
    #[arg(long, env = "WEATHER_DAEMON_STATIONS", value_delimiter = ',')]
    pub stations: Option<Vec<String>>,

    /// Minute of every hour (UTC) at which the feed is read
    #[arg(short, long, env = "WEATHER_DAEMON_INGEST_MINUTE")]
    pub ingest_minute: Option<u8>,

    /// HTTP User-Agent header for outgoing requests
    #[arg(short, long, env = "WEATHER_DAEMON_USER_AGENT")]
    pub user_agent: Option<String>,
}

impl Cli {
    pub fn server_url(&self) -> String {
        self.server_url
            .clone()
            .unwrap_or_else(|| format!("http://localhost:{}", DEFAULT_SERVER_PORT))
    }

    pub fn source_url(&self) -> String {
        self.source_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string())
    }

    pub fn stations(&self) -> Vec<String> {
        self.stations
            .clone()
            .unwrap_or_else(|| DEFAULT_STATIONS.iter().map(|s| s.to_string()).collect())
    }

    pub fn ingest_minute(&self) -> u8 {
        self.ingest_minute.unwrap_or(DEFAULT_INGEST_MINUTE)
    }

    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("weather-daemon/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Fill every unset field from `file`; values already set (CLI or env) win.
    pub fn merge(self, file: Cli) -> Cli {
        Cli {
            config: self.config,
            level: self.level.or(file.level),
            server_url: self.server_url.or(file.server_url),
            source_url: self.source_url.or(file.source_url),
            stations: self.stations.or(file.stations),
            ingest_minute: self.ingest_minute.or(file.ingest_minute),
            user_agent: self.user_agent.or(file.user_agent),
        }
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("DELIVERY_FEE_DAEMON_CONFIG", "daemon.toml")
    };

    let file_config: Cli = load_config(&source).unwrap_or_default();
    cli_args.merge(file_config)
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "warn" => Level::Warning,
        "error" => Level::Error,
        _ => Level::Info,
    }
}

pub fn setup_logger(cli: &Cli) -> Logger {
    let log_level = match cli.level.as_ref() {
        Some(level) => parse_level(level),
        None => parse_level(&env::var("RUST_LOG").unwrap_or_default()),
    };

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = drain.filter_level(log_level).fuse();
    slog::Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}

/// Next instant strictly after `now` whose minute is `minute` and seconds are zero.
pub fn next_run_after(now: OffsetDateTime, minute: u8) -> Result<OffsetDateTime, Error> {
    let candidate = now
        .replace_minute(minute)
        .and_then(|t| t.replace_second(0))
        .and_then(|t| t.replace_nanosecond(0))
        .map_err(|e| anyhow!("invalid ingest minute {}: {}", minute, e))?;

    if candidate > now {
        Ok(candidate)
    } else {
        Ok(candidate + TimeDuration::hours(1))
    }
}

/// How long to sleep from `now` until the next ingestion slot.
pub fn wait_until_next_run(now: OffsetDateTime, minute: u8) -> Result<Duration, Error> {
    let next = next_run_after(now, minute)?;
    Duration::try_from(next - now).map_err(|e| anyhow!("negative wait until {}: {}", next, e))
}

pub struct XmlFetcher {
    logger: Logger,
    user_agent: String,
}

impl XmlFetcher {
    pub fn new(logger: Logger, user_agent: String) -> XmlFetcher {
        Self { logger, user_agent }
    }

    pub async fn fetch_xml(&self, url: &str) -> Result<String, Error> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(Client::builder().user_agent(&self.user_agent).build()?)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        debug!(self.logger, "requesting: {}", url);
        let response = client
            .get(url)
            .timeout(Duration::from_secs(20))
            .send()
            .await
            .map_err(|e| anyhow!("error sending request: {}", e))?;
        if !response.status().is_success() {
            return Err(anyhow!(
                "error response from {}: {}",
                url,
                response.status()
            ));
        }
        match response.text().await {
            Ok(xml_content) => Ok(xml_content),
            Err(e) => Err(anyhow!("error parsing body of request: {}", e)),
        }
    }
}
