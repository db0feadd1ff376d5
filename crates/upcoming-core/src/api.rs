//! YouTube Data API v3 client: the `search` and `videos` endpoints only.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{Endpoint, RemoteCallError};
use crate::event::{default_thumbnail, UpcomingEvent};

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Hard upper bound the platform puts on `maxResults`.
pub const MAX_RESULTS_CEILING: u32 = 50;
pub const DEFAULT_MAX_RESULTS: u32 = 12;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const UNTITLED: &str = "Untitled stream";

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: SearchResultId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResultId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<Video>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Video {
    id: String,
    snippet: Option<VideoSnippet>,
    live_streaming_details: Option<LiveStreamingDetails>,
}

#[derive(Debug, Deserialize)]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    default: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveStreamingDetails {
    scheduled_start_time: Option<DateTime<Utc>>,
    actual_start_time: Option<DateTime<Utc>>,
    actual_end_time: Option<DateTime<Utc>>,
}

/// `{"error": {"code": 403, "message": "..."}}`
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl Video {
    /// A video without `liveStreamingDetails` comes through with no times at
    /// all, which the freshness filter treats as "time TBA".
    fn into_event(self) -> UpcomingEvent {
        let details = self.live_streaming_details.unwrap_or_default();
        let (title, thumbnails) = match self.snippet {
            Some(s) => (s.title, s.thumbnails),
            None => (String::new(), Thumbnails::default()),
        };

        let title = match title.trim() {
            "" => UNTITLED.to_string(),
            t => t.to_string(),
        };
        let thumbnail = thumbnails
            .high
            .or(thumbnails.medium)
            .or(thumbnails.default)
            .map(|t| t.url)
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| default_thumbnail(&self.id));

        UpcomingEvent {
            id: self.id,
            title,
            scheduled_start: details.scheduled_start_time,
            actual_start: details.actual_start_time,
            actual_end: details.actual_end_time,
            thumbnail,
        }
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct YoutubeClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl YoutubeClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_API_BASE)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("yt-upcoming/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Video ids of the channel's upcoming broadcasts, newest first.
    /// `max_results` is clamped to `1..=MAX_RESULTS_CEILING`.
    pub async fn search_upcoming(
        &self,
        channel_id: &str,
        max_results: u32,
    ) -> Result<Vec<String>, RemoteCallError> {
        let max_results = max_results.clamp(1, MAX_RESULTS_CEILING);
        info!("[api] search upcoming: channel={} max={}", channel_id, max_results);
        let max_results = max_results.to_string();

        let response: SearchListResponse = self
            .get_json(
                Endpoint::Search,
                &[
                    ("key", self.api_key.as_str()),
                    ("channelId", channel_id),
                    ("part", "snippet"),
                    ("type", "video"),
                    ("eventType", "upcoming"),
                    ("order", "date"),
                    ("maxResults", max_results.as_str()),
                ],
            )
            .await?;

        let ids: Vec<String> = response
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .filter(|id| !id.is_empty())
            .collect();
        debug!("[api] search returned {} ids", ids.len());
        Ok(ids)
    }

    /// Scheduling details for `ids` in a single request.
    pub async fn video_details(&self, ids: &[String]) -> Result<Vec<UpcomingEvent>, RemoteCallError> {
        info!("[api] videos: {} ids", ids.len());

        let joined = ids.join(",");
        let response: VideoListResponse = self
            .get_json(
                Endpoint::Videos,
                &[
                    ("key", self.api_key.as_str()),
                    ("id", joined.as_str()),
                    ("part", "snippet,liveStreamingDetails"),
                ],
            )
            .await?;

        Ok(response.items.into_iter().map(Video::into_event).collect())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
    ) -> Result<T, RemoteCallError> {
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await
            .map_err(|source| RemoteCallError::Network { endpoint, source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| RemoteCallError::Network { endpoint, source })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .map(|b| b.error.message);
            warn!("[api] {} returned {}: {:?}", endpoint, status, message);
            return Err(RemoteCallError::Status {
                endpoint,
                status,
                message,
            });
        }

        serde_json::from_str(&body).map_err(|source| RemoteCallError::Malformed { endpoint, source })
    }
}
