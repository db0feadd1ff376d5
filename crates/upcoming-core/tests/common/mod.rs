#![allow(dead_code)]

//! Local stand-in for the two YouTube Data API endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use upcoming_core::api::YoutubeClient;
use upcoming_core::config::{DisplayMode, TimeZoneOverride, WidgetConfig};
use upcoming_core::event::GracePeriod;

pub const CHANNEL_ID: &str = "UCmockchannel";
pub const API_KEY: &str = "test-key";

type Reply = (StatusCode, Value);

#[derive(Clone)]
pub struct MockApi {
    search: Arc<Mutex<Reply>>,
    videos: Arc<Mutex<Reply>>,
    pub search_hits: Arc<AtomicUsize>,
    pub videos_hits: Arc<AtomicUsize>,
    pub last_search_query: Arc<Mutex<HashMap<String, String>>>,
    pub last_videos_query: Arc<Mutex<HashMap<String, String>>>,
}

impl MockApi {
    pub fn set_videos(&self, status: StatusCode, body: Value) {
        *self.videos.lock().unwrap() = (status, body);
    }

    pub fn search_hits(&self) -> usize {
        self.search_hits.load(Ordering::SeqCst)
    }

    pub fn videos_hits(&self) -> usize {
        self.videos_hits.load(Ordering::SeqCst)
    }

    pub fn search_param(&self, name: &str) -> Option<String> {
        self.last_search_query.lock().unwrap().get(name).cloned()
    }

    pub fn videos_param(&self, name: &str) -> Option<String> {
        self.last_videos_query.lock().unwrap().get(name).cloned()
    }
}

pub struct MockServer {
    pub base_url: String,
    pub api: MockApi,
    handle: JoinHandle<()>,
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn search(
    State(api): State<MockApi>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    api.search_hits.fetch_add(1, Ordering::SeqCst);
    *api.last_search_query.lock().unwrap() = query;
    let (status, body) = api.search.lock().unwrap().clone();
    (status, Json(body))
}

async fn videos(
    State(api): State<MockApi>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    api.videos_hits.fetch_add(1, Ordering::SeqCst);
    *api.last_videos_query.lock().unwrap() = query;
    let (status, body) = api.videos.lock().unwrap().clone();
    (status, Json(body))
}

pub async fn spawn_mock(search_reply: Reply, videos_reply: Reply) -> MockServer {
    let api = MockApi {
        search: Arc::new(Mutex::new(search_reply)),
        videos: Arc::new(Mutex::new(videos_reply)),
        search_hits: Arc::new(AtomicUsize::new(0)),
        videos_hits: Arc::new(AtomicUsize::new(0)),
        last_search_query: Arc::new(Mutex::new(HashMap::new())),
        last_videos_query: Arc::new(Mutex::new(HashMap::new())),
    };

    let app = Router::new()
        .route("/youtube/v3/search", get(search))
        .route("/youtube/v3/videos", get(videos))
        .with_state(api.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind api mock");
    let addr = listener.local_addr().expect("mock addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve api mock");
    });

    MockServer {
        base_url: format!("http://{addr}/youtube/v3"),
        api,
        handle,
    }
}

pub fn client(base_url: &str) -> YoutubeClient {
    YoutubeClient::with_base_url(API_KEY, base_url).expect("client should initialize")
}

pub fn widget_config() -> WidgetConfig {
    WidgetConfig {
        api_key: API_KEY.to_string(),
        channel_id: CHANNEL_ID.to_string(),
        handle: Some("mockchannel".to_string()),
        max_results: 12,
        display_mode: DisplayMode::Modal,
        time_zone: TimeZoneOverride::Utc,
        grace: GracePeriod::default(),
    }
}

pub fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Whole-second "now" so timestamps survive the RFC 3339 round trip exactly.
pub fn now() -> DateTime<Utc> {
    let t = Utc::now();
    t - Duration::nanoseconds(t.timestamp_subsec_nanos() as i64)
}

pub fn search_body(ids: &[&str]) -> Value {
    let items: Vec<Value> = ids
        .iter()
        .map(|id| json!({ "kind": "youtube#searchResult", "id": { "kind": "youtube#video", "videoId": id } }))
        .collect();
    json!({ "kind": "youtube#searchListResponse", "items": items })
}

pub fn video(id: &str, title: &str, details: Value) -> Value {
    json!({
        "kind": "youtube#video",
        "id": id,
        "snippet": {
            "title": title,
            "thumbnails": {
                "high": { "url": format!("https://i.ytimg.com/vi/{id}/hqdefault_live.jpg") }
            }
        },
        "liveStreamingDetails": details
    })
}

pub fn videos_body(items: Vec<Value>) -> Value {
    json!({ "kind": "youtube#videoListResponse", "items": items })
}

pub fn forbidden() -> Reply {
    (
        StatusCode::FORBIDDEN,
        json!({ "error": { "code": 403, "message": "The request cannot be completed because you have exceeded your quota." } }),
    )
}
