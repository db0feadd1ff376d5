mod render;

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use upcoming_core::cache::CacheStore;
use upcoming_core::config::Config;
use upcoming_core::widget::{Widget, WidgetState};

use render::{JsonPresenter, TerminalPresenter};

/// Show a YouTube channel's upcoming live streams.
#[derive(Debug, Parser)]
#[command(name = "yt-upcoming", version)]
struct Args {
    /// YouTube Data API key.
    #[arg(long, env = "YT_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Channel id (UC...).
    #[arg(long, env = "YT_CHANNEL_ID")]
    channel_id: Option<String>,

    /// Channel handle, used for the "watch live" link.
    #[arg(long)]
    handle: Option<String>,

    /// Maximum number of streams to look up (1-50).
    #[arg(long)]
    max_results: Option<u32>,

    /// Playback mode: "modal" or "newtab".
    #[arg(long)]
    mode: Option<String>,

    /// Display time zone: "UTC", "local", or an offset like "+09:00".
    #[arg(long = "tz")]
    time_zone: Option<String>,

    /// Hours past its scheduled start an unstarted stream is still listed.
    #[arg(long)]
    grace_hours: Option<f64>,

    /// Alternate config file (defaults to the platform config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Skip the local cache entirely.
    #[arg(long)]
    no_cache: bool,

    /// Print the fetched result as JSON.
    #[arg(long)]
    json: bool,

    /// Print where selecting this video id would take the viewer, then exit.
    #[arg(long, value_name = "VIDEO_ID")]
    select: Option<String>,

    /// Log to stderr instead of the log file.
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(v) = &self.api_key {
            config.channel.api_key = v.clone();
        }
        if let Some(v) = &self.channel_id {
            config.channel.channel_id = v.clone();
        }
        if let Some(v) = &self.handle {
            config.channel.handle = v.clone();
        }
        if let Some(v) = self.max_results {
            config.display.max_results = v;
        }
        if let Some(v) = &self.mode {
            config.display.mode = v.clone();
        }
        if let Some(v) = &self.time_zone {
            config.display.time_zone = v.clone();
        }
        if let Some(v) = self.grace_hours {
            config.schedule.grace_hours = v;
        }
        if self.no_cache {
            config.cache.enabled = false;
        }
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    // Allow RUST_LOG override; keep HTTP client internals quiet by default.
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        "info,upcoming_core=debug,hyper_util=warn,reqwest=warn,hyper=warn".to_string()
    });

    if verbose {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(log_filter.as_str())
            .init();
        return Ok(());
    }

    let data_dir = upcoming_core::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("yt-upcoming.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("yt-upcoming log: {}", log_path.display());
    Ok(())
}

/// An explicit `--config` must load; the platform default falls back to
/// built-in defaults when it cannot be read.
fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read config {}", p.display()))?;
            toml::from_str(&content).with_context(|| format!("invalid config {}", p.display()))
        }
        None => Ok(Config::load().unwrap_or_else(|e| {
            tracing::warn!("config unreadable, using defaults: {}", e);
            eprintln!("yt-upcoming: config unreadable ({e}), using defaults");
            Config::default()
        })),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(args.verbose) {
        eprintln!("yt-upcoming: could not set up logging: {e}");
    }

    let mut config = match load_config(args.config.as_ref()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("configuration error: {:#}", e);
            eprintln!("yt-upcoming: {e:#}");
            return ExitCode::from(2);
        }
    };
    args.apply(&mut config);

    let widget_config = match config.widget_config() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("configuration error: {}", e);
            eprintln!("yt-upcoming: {e}");
            return ExitCode::from(2);
        }
    };

    let tz = widget_config.time_zone;
    let mode = widget_config.display_mode;
    let cache = config
        .cache
        .enabled
        .then(|| CacheStore::new(config.cache.dir.clone()));

    let mut widget = match Widget::new(widget_config, cache) {
        Ok(w) => w,
        Err(e) => {
            tracing::error!("failed to start widget: {:#}", e);
            eprintln!("yt-upcoming: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    if let Some(video_id) = &args.select {
        println!("{}", render::describe_target(&widget.select(video_id)));
        return ExitCode::SUCCESS;
    }

    tracing::info!("yt-upcoming starting for channel {}", widget.config().channel_id);

    let state = if args.json {
        let mut presenter = JsonPresenter::new(std::io::stdout(), tz, mode);
        widget.run(&mut presenter).await.clone()
    } else {
        let mut presenter = TerminalPresenter::new(std::io::stdout(), tz, mode);
        widget.run(&mut presenter).await.clone()
    };

    tracing::info!("finished in state {:?}", state);
    match state {
        WidgetState::Errored(_) => ExitCode::FAILURE,
        _ => ExitCode::SUCCESS,
    }
}
