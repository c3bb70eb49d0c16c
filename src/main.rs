use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use live_playlist_lib::resolver::{FetchConfig, Provider, RefererPolicy};
use live_playlist_lib::{run, RunConfig};

/// Resolve a live-event catalog into an M3U playlist
#[derive(Parser, Debug)]
#[command(name = "live-playlist", version, about)]
struct Cli {
    /// Catalog site: ppv or streambtw
    #[arg(short, long, default_value = "ppv")]
    provider: Provider,

    /// Playlist path (default: <provider>.m3u8)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Override the provider's catalog URL
    #[arg(long)]
    catalog_url: Option<String>,

    /// Override the referer sent to embed pages and written to the playlist
    #[arg(long)]
    referer: Option<String>,

    /// User-Agent for page requests and for players
    #[arg(long)]
    user_agent: Option<String>,

    /// Read the catalog from a local file instead of the network
    #[arg(long)]
    catalog_file: Option<PathBuf>,

    /// Directory for the fallback catalog copy
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Do not read or write the fallback catalog copy
    #[arg(long)]
    no_cache: bool,

    /// HTTP/HTTPS/SOCKS5 proxy, e.g. socks5h://127.0.0.1:1080
    #[arg(long)]
    proxy: Option<String>,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 20)]
    timeout: u64,

    /// Pause before every request, in milliseconds
    #[arg(long, default_value_t = 300)]
    delay_ms: u64,

    /// Attempts per request on 429/5xx
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Referer advertised to players: canonical or candidate
    #[arg(long, default_value = "canonical")]
    referer_policy: RefererPolicy,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> RunConfig {
        let mut config = RunConfig::new(self.provider);

        if let Some(output) = self.output {
            config.output = output;
        }
        config.catalog_file = self.catalog_file;
        if self.no_cache {
            config.cache_dir = None;
        } else if let Some(dir) = self.cache_dir {
            config.cache_dir = Some(dir);
        }
        if let Some(url) = self.catalog_url {
            config.profile = config.profile.with_catalog_url(url);
        }
        if let Some(referer) = self.referer {
            config.profile = config.profile.with_referer(referer);
        }
        config.referer_policy = self.referer_policy;
        config.fetch = FetchConfig::default()
            .with_timeout(self.timeout)
            .with_politeness_delay(self.delay_ms)
            .with_max_attempts(self.retries)
            .with_proxy(self.proxy);
        if let Some(user_agent) = self.user_agent {
            config.profile = config.profile.with_user_agent(user_agent.clone());
            config.fetch = config.fetch.with_user_agent(user_agent);
        }

        config
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = cli.into_config();
    info!("Provider: {}", config.profile.provider);

    match run(config).await {
        Ok(summary) => {
            if summary.catalog_from_cache {
                info!("Catalog was served from the local cache");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Critical error: {}", e);
            ExitCode::FAILURE
        }
    }
}
