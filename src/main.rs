use anyhow::Result;
use clap::Parser;
use s3ms_site::commands::{self, Settings, config};
use s3ms_site::platform::{Signals, UserAgentDetector};
use std::path::PathBuf;
use std::time::Duration;

/// s3ms-site - S3 Migration Scheduler download site helper
///
/// Detects the visitor's platform, fetches repository and container image
/// statistics through a short-lived cache, and renders them for the site.
///
/// Examples:
///   s3ms-site detect --user-agent "Mozilla/5.0 (X11; Linux x86_64)"
///   s3ms-site stats --json
///   s3ms-site downloads --pattern "*.AppImage"
#[derive(Parser, Debug)]
#[command(author, version = env!("S3MS_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// GitHub repository to report on
    #[arg(
        long,
        env = "S3MS_REPO",
        default_value = config::DEFAULT_REPO,
        value_name = "OWNER/REPO",
        global = true
    )]
    repo: String,

    /// Docker Hub image to report on
    #[arg(
        long,
        env = "S3MS_IMAGE",
        default_value = config::DEFAULT_IMAGE,
        value_name = "NAMESPACE/NAME",
        global = true
    )]
    image: String,

    /// GitHub API URL (defaults to https://api.github.com)
    #[arg(long = "api-url", env = "S3MS_API_URL", value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Docker Hub API URL (defaults to https://hub.docker.com)
    #[arg(
        long = "registry-url",
        env = "S3MS_REGISTRY_URL",
        value_name = "URL",
        global = true
    )]
    registry_url: Option<String>,

    /// Cache directory (defaults to the user cache directory)
    #[arg(long = "cache-dir", env = "S3MS_CACHE_DIR", value_name = "PATH", global = true)]
    cache_dir: Option<PathBuf>,

    /// How long cached responses stay valid
    #[arg(
        long = "cache-ttl",
        env = "S3MS_CACHE_TTL",
        default_value_t = config::DEFAULT_CACHE_TTL_SECS,
        value_name = "SECONDS",
        global = true
    )]
    cache_ttl: u64,

    /// Keep responses in memory only
    #[arg(long = "no-cache", global = true)]
    no_cache: bool,

    /// Per-request timeout
    #[arg(
        long,
        default_value_t = config::DEFAULT_TIMEOUT_SECS,
        value_name = "SECONDS",
        global = true
    )]
    timeout: u64,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            repo: self.repo.clone(),
            image: self.image.clone(),
            api_url: self.api_url.clone(),
            registry_url: self.registry_url.clone(),
            cache_dir: self.cache_dir.clone(),
            cache_ttl: Duration::from_secs(self.cache_ttl),
            no_cache: self.no_cache,
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Guess the platform from browser signals and suggest a download
    Detect(DetectArgs),

    /// Fetch and render repository and image statistics
    Stats(StatsArgs),

    /// List the latest release's downloads per platform
    Downloads(DownloadsArgs),

    /// Inspect or clear cached responses
    #[command(subcommand)]
    Cache(CacheCommands),
}

#[derive(clap::Args, Debug)]
struct DetectArgs {
    /// Browser user-agent string
    #[arg(long = "user-agent", value_name = "UA")]
    user_agent: String,

    /// Browser platform string, e.g. "Win32" or "MacIntel"
    #[arg(long, default_value = "")]
    platform: String,

    /// Maximum simultaneous touch points reported by the browser
    #[arg(long = "touch-points", default_value_t = 0)]
    touch_points: u32,

    /// Screen width in pixels
    #[arg(long = "screen-width", default_value_t = 0)]
    screen_width: u32,
}

#[derive(clap::Args, Debug)]
struct StatsArgs {
    /// Print the rendered insertion points as JSON
    #[arg(long)]
    json: bool,

    /// Browser user-agent string; fills the detected platform and smart download
    #[arg(long = "user-agent", value_name = "UA")]
    user_agent: Option<String>,

    /// Browser platform string, e.g. "Win32" or "MacIntel"
    #[arg(long, default_value = "", requires = "user_agent")]
    platform: String,

    /// Maximum simultaneous touch points reported by the browser
    #[arg(long = "touch-points", default_value_t = 0, requires = "user_agent")]
    touch_points: u32,

    /// Screen width in pixels
    #[arg(long = "screen-width", default_value_t = 0, requires = "user_agent")]
    screen_width: u32,
}

impl StatsArgs {
    fn signals(&self) -> Option<Signals> {
        self.user_agent.as_ref().map(|user_agent| {
            Signals::new(user_agent.clone(), self.platform.clone())
                .with_touch_points(self.touch_points)
                .with_screen_width(self.screen_width)
        })
    }
}

#[derive(clap::Args, Debug)]
struct DownloadsArgs {
    /// Also select the first asset matching this glob (repeatable)
    #[arg(long = "pattern", short = 'p', value_name = "GLOB")]
    patterns: Vec<String>,
}

#[derive(clap::Subcommand, Debug)]
enum CacheCommands {
    /// Show cached entries and their age
    Show,

    /// Remove all cached entries
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let runtime = s3ms_site::runtime::RealRuntime;
    let settings = cli.settings();

    match cli.command {
        Commands::Detect(args) => {
            let signals = Signals::new(args.user_agent, args.platform)
                .with_touch_points(args.touch_points)
                .with_screen_width(args.screen_width);
            commands::detect(&UserAgentDetector, &signals)?
        }
        Commands::Stats(args) => {
            commands::stats(runtime, &settings, args.signals().as_ref(), args.json).await?
        }
        Commands::Downloads(args) => {
            commands::downloads(runtime, &settings, &args.patterns).await?
        }
        Commands::Cache(CacheCommands::Show) => commands::cache_show(runtime, &settings)?,
        Commands::Cache(CacheCommands::Clear { yes }) => {
            commands::cache_clear(runtime, &settings, yes)?
        }
    }
    Ok(())
}
