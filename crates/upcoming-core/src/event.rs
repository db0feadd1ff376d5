//! Upcoming live-stream records and the freshness policy applied to them.
//!
//! A fetched page of events is cleaned in one pass:
//!
//!   1. anything with an actual end time is dropped (the stream is over),
//!   2. anything scheduled, never started, and older than the grace period is
//!      dropped (the stream was abandoned),
//!   3. the rest is ordered by scheduled start, start-less ("time TBA")
//!      events last in their original order.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_GRACE_HOURS: f64 = 6.0;

/// One scheduled, live, or finished stream on the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingEvent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub scheduled_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_end: Option<DateTime<Utc>>,
    pub thumbnail: String,
}

impl UpcomingEvent {
    pub fn has_ended(&self) -> bool {
        self.actual_end.is_some()
    }

    pub fn is_live(&self) -> bool {
        self.actual_start.is_some() && self.actual_end.is_none()
    }

    /// No scheduled or actual start time announced yet.
    pub fn is_time_tba(&self) -> bool {
        self.scheduled_start.is_none() && self.actual_start.is_none()
    }

    /// Scheduled, never started, and past `scheduled_start + grace`.
    /// A deadline beyond the representable range is never reached.
    pub fn is_stale(&self, now: DateTime<Utc>, grace: GracePeriod) -> bool {
        match (self.scheduled_start, self.actual_start) {
            (Some(start), None) => start
                .checked_add_signed(grace.0)
                .map_or(false, |deadline| deadline < now),
            _ => false,
        }
    }

    pub fn watch_url(&self) -> String {
        watch_url(&self.id)
    }

    pub fn embed_url(&self) -> String {
        embed_url(&self.id)
    }
}

pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

pub fn embed_url(id: &str) -> String {
    format!("https://www.youtube.com/embed/{}?autoplay=1", id)
}

/// Thumbnail URL derivable from the video id alone.
pub fn default_thumbnail(id: &str) -> String {
    format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id)
}

/// How long past its scheduled start an unstarted event stays visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GracePeriod(Duration);

impl GracePeriod {
    pub fn from_hours(hours: f64) -> Result<Self, ConfigError> {
        if !hours.is_finite() || hours < 0.0 {
            return Err(ConfigError::InvalidGracePeriod(hours));
        }
        let millis = (hours * 3_600_000.0).round() as i64;
        Duration::try_milliseconds(millis)
            .map(Self)
            .ok_or(ConfigError::InvalidGracePeriod(hours))
    }

    pub fn zero() -> Self {
        Self(Duration::zero())
    }

    pub fn duration(&self) -> Duration {
        self.0
    }
}

impl Default for GracePeriod {
    fn default() -> Self {
        Self(Duration::hours(DEFAULT_GRACE_HOURS as i64))
    }
}

/// Drop ended and stale events, then order the rest by scheduled start.
///
/// The input is left untouched. Sorting is stable, so events without a
/// scheduled start keep their relative order at the tail.
pub fn filter_and_sort(
    events: &[UpcomingEvent],
    now: DateTime<Utc>,
    grace: GracePeriod,
) -> Vec<UpcomingEvent> {
    let mut kept: Vec<UpcomingEvent> = events
        .iter()
        .filter(|e| !e.has_ended() && !e.is_stale(now, grace))
        .cloned()
        .collect();
    kept.sort_by(by_scheduled_start);
    kept
}

fn by_scheduled_start(a: &UpcomingEvent, b: &UpcomingEvent) -> Ordering {
    match (a.scheduled_start, b.scheduled_start) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn event(id: &str, scheduled: Option<DateTime<Utc>>) -> UpcomingEvent {
        UpcomingEvent {
            id: id.into(),
            title: format!("Stream {id}"),
            scheduled_start: scheduled,
            actual_start: None,
            actual_end: None,
            thumbnail: default_thumbnail(id),
        }
    }

    fn ids(events: &[UpcomingEvent]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_ended_events_always_dropped() {
        let now = t0();
        let mut future = event("future", Some(now + Duration::hours(3)));
        future.actual_end = Some(now);
        let mut live = event("live", Some(now - Duration::hours(1)));
        live.actual_start = Some(now - Duration::minutes(50));
        live.actual_end = Some(now - Duration::minutes(5));
        let mut tba = event("tba", None);
        tba.actual_end = Some(now - Duration::days(2));

        let out = filter_and_sort(&[future, live, tba], now, GracePeriod::default());
        assert!(out.is_empty());
    }

    #[test]
    fn test_grace_boundary() {
        let now = t0();
        for hours in [0i64, 1, 6, 24] {
            let grace = GracePeriod::from_hours(hours as f64).unwrap();
            let stale = event("stale", Some(now - Duration::hours(hours + 1)));
            let fresh = event("fresh", Some(now - Duration::hours(hours) + Duration::hours(1)));
            let out = filter_and_sort(&[stale, fresh], now, grace);
            assert_eq!(ids(&out), vec!["fresh"], "grace {hours}h");
        }
    }

    #[test]
    fn test_exactly_at_grace_edge_is_kept() {
        let now = t0();
        let edge = event("edge", Some(now - Duration::hours(6)));
        let out = filter_and_sort(&[edge], now, GracePeriod::default());
        assert_eq!(ids(&out), vec!["edge"]);
    }

    #[test]
    fn test_zero_grace_drops_as_soon_as_time_passes() {
        let now = t0();
        let just_passed = event("passed", Some(now - Duration::seconds(1)));
        let out = filter_and_sort(&[just_passed], now, GracePeriod::zero());
        assert!(out.is_empty());
    }

    #[test]
    fn test_live_event_kept_regardless_of_age() {
        let now = t0();
        let mut live = event("live", Some(now - Duration::days(3)));
        live.actual_start = Some(now - Duration::days(3));
        let out = filter_and_sort(&[live], now, GracePeriod::zero());
        assert_eq!(ids(&out), vec!["live"]);
        assert!(out[0].is_live());
    }

    #[test]
    fn test_tba_events_never_stale_and_sorted_last_in_input_order() {
        let now = t0();
        let input = vec![
            event("tba-1", None),
            event("late", Some(now + Duration::hours(5))),
            event("tba-2", None),
            event("early", Some(now + Duration::hours(1))),
            event("tba-3", None),
        ];
        let out = filter_and_sort(&input, now + Duration::days(365), GracePeriod::zero());
        assert_eq!(ids(&out), vec!["tba-1", "tba-2", "tba-3"]);

        let out = filter_and_sort(&input, now, GracePeriod::default());
        assert_eq!(ids(&out), vec!["early", "late", "tba-1", "tba-2", "tba-3"]);
        assert!(out[2].is_time_tba());
    }

    #[test]
    fn test_filter_is_idempotent_and_does_not_mutate_input() {
        let now = t0();
        let mut ended = event("ended", Some(now));
        ended.actual_end = Some(now);
        let input = vec![
            event("b", Some(now + Duration::hours(2))),
            ended,
            event("tba", None),
            event("a", Some(now - Duration::hours(2))),
            event("old", Some(now - Duration::hours(12))),
        ];
        let snapshot = input.clone();

        let once = filter_and_sort(&input, now, GracePeriod::default());
        let twice = filter_and_sort(&once, now, GracePeriod::default());
        assert_eq!(once, twice);
        assert_eq!(ids(&once), vec!["a", "b", "tba"]);
        assert_eq!(input, snapshot);
    }

    #[test]
    fn test_grace_period_validation() {
        assert!(GracePeriod::from_hours(-1.0).is_err());
        assert!(GracePeriod::from_hours(f64::NAN).is_err());
        assert_eq!(
            GracePeriod::from_hours(1.5).unwrap().duration(),
            Duration::minutes(90)
        );
        assert_eq!(GracePeriod::default().duration(), Duration::hours(6));
    }

    #[test]
    fn test_huge_grace_keeps_unstarted_events() {
        let now = t0();
        let grace = GracePeriod::from_hours(1e10).unwrap();
        let old = event("old", Some(now - Duration::days(365)));
        let soon = event("soon", Some(now + Duration::hours(1)));

        let out = filter_and_sort(&[soon, old], now, grace);
        assert_eq!(ids(&out), vec!["old", "soon"]);

        let grace = GracePeriod::from_hours(1e12).unwrap();
        assert!(!event("x", Some(now - Duration::days(1))).is_stale(now, grace));
    }

    #[test]
    fn test_urls() {
        let e = event("abc123", None);
        assert_eq!(e.watch_url(), "https://www.youtube.com/watch?v=abc123");
        assert_eq!(e.embed_url(), "https://www.youtube.com/embed/abc123?autoplay=1");
        assert_eq!(e.thumbnail, "https://i.ytimg.com/vi/abc123/hqdefault.jpg");
    }
}
