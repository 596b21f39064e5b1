use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

/// Bounds of a time window, as offsets from the start of the planning horizon.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeWindow {
    #[serde(default)]
    start: Option<SignedDuration>,
    #[serde(default)]
    end: Option<SignedDuration>,
}

impl TimeWindow {
    pub fn new(start: Option<SignedDuration>, end: Option<SignedDuration>) -> Self {
        TimeWindow { start, end }
    }

    pub fn from_secs(start: i64, end: i64) -> Self {
        TimeWindow {
            start: Some(SignedDuration::from_secs(start)),
            end: Some(SignedDuration::from_secs(end)),
        }
    }

    pub fn start(&self) -> Option<SignedDuration> {
        self.start
    }

    pub fn end(&self) -> Option<SignedDuration> {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn start_secs(&self) -> Option<i64> {
        self.start.map(|start| start.as_secs())
    }

    pub fn end_secs(&self) -> Option<i64> {
        self.end.map(|end| end.as_secs())
    }
}

/// Closed range of seconds, unbounded sides replaced by `[0, open_end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecondsRange {
    pub start: i64,
    pub end: i64,
}

impl SecondsRange {
    /// Span covered by a list of windows: first window start to last window end.
    pub fn covering(time_windows: &[TimeWindow], open_end: i64) -> Self {
        let start = time_windows
            .first()
            .and_then(|tw| tw.start_secs())
            .unwrap_or(0);
        let end = time_windows
            .last()
            .and_then(|tw| tw.end_secs())
            .unwrap_or(open_end);

        SecondsRange { start, end }
    }

    pub fn overlaps(&self, other: &SecondsRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    pub fn intersection(&self, other: &SecondsRange) -> Option<SecondsRange> {
        if !self.overlaps(other) {
            return None;
        }

        Some(SecondsRange {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }
}
