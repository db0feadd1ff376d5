//! One widget instance: cached snapshot first, then a single refresh.
//!
//! ## Lifecycle
//!
//!   Idle -> LoadingFromCache -> Fetching -> Rendered | RenderedEmpty | Errored
//!
//! The cache read is synchronous and happens before any network call, so a
//! warm cache renders immediately. The refresh is one attempt (search, then
//! videos); there is no retry and no polling. All mutable state lives on the
//! `Widget`, so several instances can run side by side.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::api::YoutubeClient;
use crate::cache::{channel_key, CacheStore};
use crate::config::{DisplayMode, WidgetConfig};
use crate::error::RemoteCallError;
use crate::event::{embed_url, filter_and_sort, watch_url, GracePeriod, UpcomingEvent};

/// Two-stage lookup: upcoming ids for the channel, then their details in one
/// batch. The result is already filtered and ordered.
pub async fn fetch_upcoming(
    client: &YoutubeClient,
    channel_id: &str,
    max_results: u32,
    grace: GracePeriod,
    now: DateTime<Utc>,
) -> Result<Vec<UpcomingEvent>, RemoteCallError> {
    let ids = client.search_upcoming(channel_id, max_results).await?;
    if ids.is_empty() {
        info!("[fetch] nothing scheduled for channel={}", channel_id);
        return Ok(Vec::new());
    }

    let events = client.video_details(&ids).await?;
    let kept = filter_and_sort(&events, now, grace);
    info!(
        "[fetch] channel={} ids={} details={} kept={}",
        channel_id,
        ids.len(),
        events.len(),
        kept.len()
    );
    Ok(kept)
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WidgetState {
    #[default]
    Idle,
    LoadingFromCache,
    Fetching,
    Rendered,
    RenderedEmpty,
    Errored(String),
}

/// Result of a successful refresh. An empty schedule is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Events(Vec<UpcomingEvent>),
    Empty,
}

/// Where a rendered list came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snapshot {
    Cached,
    Fresh,
}

/// Where to send the viewer after they pick an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackTarget {
    /// Embedded player URL, shown in place.
    Modal(String),
    /// Watch page URL, opened in a new context.
    NewTab(String),
}

impl PlaybackTarget {
    pub fn for_mode(mode: DisplayMode, video_id: &str) -> Self {
        match mode {
            DisplayMode::Modal => Self::Modal(embed_url(video_id)),
            DisplayMode::NewTab => Self::NewTab(watch_url(video_id)),
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Self::Modal(url) | Self::NewTab(url) => url,
        }
    }
}

/// Implemented by whatever draws the widget.
pub trait Presenter {
    fn render_events(&mut self, events: &[UpcomingEvent], snapshot: Snapshot);

    /// Nothing scheduled; `live_url` is the channel's call-to-action link.
    fn render_empty(&mut self, live_url: &str);

    fn render_error(&mut self, error: &RemoteCallError);
}

pub struct Widget {
    config: WidgetConfig,
    client: YoutubeClient,
    cache: Option<CacheStore>,
    cache_key: String,
    state: WidgetState,
}

impl Widget {
    pub fn new(config: WidgetConfig, cache: Option<CacheStore>) -> anyhow::Result<Self> {
        let client = YoutubeClient::new(config.api_key.clone())?;
        Ok(Self::with_client(config, client, cache))
    }

    pub fn with_client(config: WidgetConfig, client: YoutubeClient, cache: Option<CacheStore>) -> Self {
        let cache_key = channel_key(&config.channel_id);
        Self {
            config,
            client,
            cache,
            cache_key,
            state: WidgetState::Idle,
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn state(&self) -> &WidgetState {
        &self.state
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Fresh cached events for this channel, if any.
    pub fn cached_snapshot(&mut self) -> Option<Vec<UpcomingEvent>> {
        let cache = self.cache.as_ref()?;
        self.state = WidgetState::LoadingFromCache;
        cache.read(&self.cache_key)
    }

    /// Fetch authoritative data. On success the cache is overwritten, even
    /// with an empty list; on failure it is left as it was.
    pub async fn refresh(&mut self) -> Result<FetchOutcome, RemoteCallError> {
        self.refresh_at(Utc::now()).await
    }

    pub async fn refresh_at(&mut self, now: DateTime<Utc>) -> Result<FetchOutcome, RemoteCallError> {
        self.state = WidgetState::Fetching;

        let result = fetch_upcoming(
            &self.client,
            &self.config.channel_id,
            self.config.max_results,
            self.config.grace,
            now,
        )
        .await;

        let events = match result {
            Ok(events) => events,
            Err(e) => {
                warn!("[widget] refresh failed for channel={}: {}", self.config.channel_id, e);
                self.state = WidgetState::Errored(e.to_string());
                return Err(e);
            }
        };

        if let Some(cache) = &self.cache {
            cache.write_at(&self.cache_key, &events, now).await;
        }

        if events.is_empty() {
            self.state = WidgetState::RenderedEmpty;
            Ok(FetchOutcome::Empty)
        } else {
            self.state = WidgetState::Rendered;
            Ok(FetchOutcome::Events(events))
        }
    }

    /// Render the cached snapshot (if any), refresh, then render the result.
    pub async fn run<P: Presenter>(&mut self, presenter: &mut P) -> &WidgetState {
        if let Some(events) = self.cached_snapshot() {
            if !events.is_empty() {
                presenter.render_events(&events, Snapshot::Cached);
            }
        }

        match self.refresh().await {
            Ok(FetchOutcome::Events(events)) => presenter.render_events(&events, Snapshot::Fresh),
            Ok(FetchOutcome::Empty) => presenter.render_empty(&self.live_url()),
            Err(e) => presenter.render_error(&e),
        }
        &self.state
    }

    /// The "user selected event X" hook.
    pub fn select(&self, video_id: &str) -> PlaybackTarget {
        PlaybackTarget::for_mode(self.config.display_mode, video_id)
    }

    /// Channel "live" page, preferring the human-friendly handle form.
    pub fn live_url(&self) -> String {
        match &self.config.handle {
            Some(handle) => format!("https://www.youtube.com/@{}/live", handle),
            None => format!("https://www.youtube.com/channel/{}/live", self.config.channel_id),
        }
    }
}
