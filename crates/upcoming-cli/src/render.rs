use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::io::Write;

use upcoming_core::config::{DisplayMode, TimeZoneOverride};
use upcoming_core::error::RemoteCallError;
use upcoming_core::event::UpcomingEvent;
use upcoming_core::widget::{PlaybackTarget, Presenter, Snapshot};

const TIME_FORMAT: &str = "%a %d %b %Y %H:%M";

/// Human-readable start time in the configured zone.
pub fn format_start(event: &UpcomingEvent, tz: TimeZoneOverride) -> String {
    if event.is_live() {
        return "LIVE NOW".to_string();
    }
    match event.scheduled_start {
        Some(start) => format_time(start, tz),
        None => "Time TBA".to_string(),
    }
}

fn format_time(t: DateTime<Utc>, tz: TimeZoneOverride) -> String {
    match tz {
        TimeZoneOverride::Local => t.with_timezone(&Local).format(&format!("{TIME_FORMAT} %:z")).to_string(),
        TimeZoneOverride::Utc => t.format(&format!("{TIME_FORMAT} UTC")).to_string(),
        TimeZoneOverride::Fixed(offset) => t
            .with_timezone(&offset)
            .format(&format!("{TIME_FORMAT} %:z"))
            .to_string(),
    }
}

/// Two lines per event: start time and title, then the playback link.
pub struct TerminalPresenter<W: Write> {
    out: W,
    tz: TimeZoneOverride,
    mode: DisplayMode,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W, tz: TimeZoneOverride, mode: DisplayMode) -> Self {
        Self { out, tz, mode }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn render_events(&mut self, events: &[UpcomingEvent], snapshot: Snapshot) {
        let header = match snapshot {
            Snapshot::Cached => format!("Upcoming streams ({}, cached)", events.len()),
            Snapshot::Fresh => format!("Upcoming streams ({})", events.len()),
        };
        let _ = writeln!(self.out, "{}", header);
        for event in events {
            let when = format_start(event, self.tz);
            let link = PlaybackTarget::for_mode(self.mode, &event.id);
            let _ = writeln!(self.out, "  {:<28} {}", when, event.title);
            let _ = writeln!(self.out, "  {:<28} {}", "", link.url());
        }
        let _ = writeln!(self.out);
    }

    fn render_empty(&mut self, live_url: &str) {
        let _ = writeln!(self.out, "No upcoming streams scheduled.");
        let _ = writeln!(self.out, "Visit the channel: {}", live_url);
    }

    fn render_error(&mut self, error: &RemoteCallError) {
        let _ = writeln!(self.out, "Could not load upcoming streams: {}", error);
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonEvent<'a> {
    #[serde(flatten)]
    event: &'a UpcomingEvent,
    is_live: bool,
    display_start: String,
    playback_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase", tag = "status")]
enum JsonOutput<'a> {
    Ok { events: Vec<JsonEvent<'a>> },
    Empty { live_url: &'a str },
    Error { error: String },
}

/// Emits only the authoritative result, as one JSON document.
pub struct JsonPresenter<W: Write> {
    out: W,
    tz: TimeZoneOverride,
    mode: DisplayMode,
}

impl<W: Write> JsonPresenter<W> {
    pub fn new(out: W, tz: TimeZoneOverride, mode: DisplayMode) -> Self {
        Self { out, tz, mode }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, output: &JsonOutput<'_>) {
        match serde_json::to_string_pretty(output) {
            Ok(json) => {
                let _ = writeln!(self.out, "{}", json);
            }
            Err(e) => tracing::error!("failed to encode JSON output: {}", e),
        }
    }
}

impl<W: Write> Presenter for JsonPresenter<W> {
    fn render_events(&mut self, events: &[UpcomingEvent], snapshot: Snapshot) {
        if snapshot == Snapshot::Cached {
            return;
        }
        let events = events
            .iter()
            .map(|event| JsonEvent {
                event,
                is_live: event.is_live(),
                display_start: format_start(event, self.tz),
                playback_url: PlaybackTarget::for_mode(self.mode, &event.id).url().to_string(),
            })
            .collect();
        self.emit(&JsonOutput::Ok { events });
    }

    fn render_empty(&mut self, live_url: &str) {
        self.emit(&JsonOutput::Empty { live_url });
    }

    fn render_error(&mut self, error: &RemoteCallError) {
        self.emit(&JsonOutput::Error {
            error: error.to_string(),
        });
    }
}

pub fn describe_target(target: &PlaybackTarget) -> String {
    match target {
        PlaybackTarget::Modal(url) => format!("modal: {}", url),
        PlaybackTarget::NewTab(url) => format!("new tab: {}", url),
    }
}
