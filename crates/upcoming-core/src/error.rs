use std::fmt;

/// Required input missing or unusable. Fatal to the widget.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing API key (set channel.api_key, --api-key or YT_API_KEY)")]
    MissingApiKey,
    #[error("missing channel id (set channel.channel_id, --channel-id or YT_CHANNEL_ID)")]
    MissingChannelId,
    #[error("invalid display mode {0:?}, expected \"modal\" or \"newtab\"")]
    InvalidDisplayMode(String),
    #[error("invalid time zone {0:?}, expected \"UTC\", \"local\" or an offset like \"+09:00\"")]
    InvalidTimeZone(String),
    #[error("invalid grace period {0} hours, must be a non-negative number")]
    InvalidGracePeriod(f64),
}

/// Which of the two remote endpoints a call went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Search,
    Videos,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Search => f.write_str("search"),
            Self::Videos => f.write_str("videos"),
        }
    }
}

/// A failed call to the platform API. The caller surfaces it; the cache is left alone.
#[derive(Debug, thiserror::Error)]
pub enum RemoteCallError {
    #[error("{endpoint} endpoint returned {status}{}", detail(.message))]
    Status {
        endpoint: Endpoint,
        status: reqwest::StatusCode,
        message: Option<String>,
    },
    #[error("{endpoint} request failed: {source}")]
    Network {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint} response could not be decoded: {source}")]
    Malformed {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
}

fn detail(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

impl RemoteCallError {
    pub fn endpoint(&self) -> Endpoint {
        match self {
            Self::Status { endpoint, .. }
            | Self::Network { endpoint, .. }
            | Self::Malformed { endpoint, .. } => *endpoint,
        }
    }

    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
