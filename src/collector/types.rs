//! Ambient interaction event types for the Synheart Presence detector.
//!
//! These types carry timing and, where needed, coordinates - never key identity
//! or any typed content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of ambient signal an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Pointer,
    Click,
    Key,
    Scroll,
    Touch,
}

impl SignalKind {
    pub const ALL: [SignalKind; 5] = [
        SignalKind::Pointer,
        SignalKind::Click,
        SignalKind::Key,
        SignalKind::Scroll,
        SignalKind::Touch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Pointer => "pointer",
            SignalKind::Click => "click",
            SignalKind::Key => "key",
            SignalKind::Scroll => "scroll",
            SignalKind::Touch => "touch",
        }
    }
}

impl std::fmt::Display for SignalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload of an input event.
///
/// Privacy guarantee: key presses carry no key code or character.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    /// Pointer moved to viewport coordinates
    PointerMove { x: f64, y: f64 },
    /// Primary button click
    Click {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<f64>,
    },
    /// A key went down (timing only)
    KeyDown,
    /// Page scrolled; carries the vertical scroll offset
    Scroll { scroll_y: f64 },
    /// A touch began
    TouchStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        x: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        y: Option<f64>,
    },
}

/// A raw input event as delivered by the host input subsystem.
///
/// On the wire this is a flat JSON object tagged by `kind`. When `time` is
/// absent the event is stamped with the receipt time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    #[serde(default = "Utc::now")]
    pub time: DateTime<Utc>,
    #[serde(flatten)]
    pub signal: Signal,
}

impl InputEvent {
    /// Create an event stamped with the current time.
    pub fn now(signal: Signal) -> Self {
        Self {
            time: Utc::now(),
            signal,
        }
    }

    /// Create an event with an explicit timestamp.
    pub fn at(time: DateTime<Utc>, signal: Signal) -> Self {
        Self { time, signal }
    }

    pub fn pointer_move(time: DateTime<Utc>, x: f64, y: f64) -> Self {
        Self::at(time, Signal::PointerMove { x, y })
    }

    pub fn click(time: DateTime<Utc>) -> Self {
        Self::at(time, Signal::Click { x: None, y: None })
    }

    pub fn key_down(time: DateTime<Utc>) -> Self {
        Self::at(time, Signal::KeyDown)
    }

    pub fn scroll(time: DateTime<Utc>, scroll_y: f64) -> Self {
        Self::at(time, Signal::Scroll { scroll_y })
    }

    pub fn touch_start(time: DateTime<Utc>) -> Self {
        Self::at(time, Signal::TouchStart { x: None, y: None })
    }

    /// The signal kind this event feeds.
    pub fn kind(&self) -> SignalKind {
        match self.signal {
            Signal::PointerMove { .. } => SignalKind::Pointer,
            Signal::Click { .. } => SignalKind::Click,
            Signal::KeyDown => SignalKind::Key,
            Signal::Scroll { .. } => SignalKind::Scroll,
            Signal::TouchStart { .. } => SignalKind::Touch,
        }
    }

    /// Parse a single NDJSON line.
    pub fn from_json_line(line: &str) -> Result<Self, EventParseError> {
        serde_json::from_str(line).map_err(|e| EventParseError(e.to_string()))
    }
}

/// An immutable timestamped observation held in a rolling buffer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scroll_y: Option<f64>,
    pub time: DateTime<Utc>,
}

impl Sample {
    /// Build the sample recorded for an event.
    pub fn from_event(event: &InputEvent) -> Self {
        let (x, y, scroll_y) = match event.signal {
            Signal::PointerMove { x, y } => (Some(x), Some(y), None),
            Signal::Click { x, y } | Signal::TouchStart { x, y } => (x, y, None),
            Signal::KeyDown => (None, None, None),
            Signal::Scroll { scroll_y } => (None, None, Some(scroll_y)),
        };
        Self {
            x,
            y,
            scroll_y,
            time: event.time,
        }
    }
}

/// A line of input that could not be decoded into an event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid input event: {0}")]
pub struct EventParseError(pub String);

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_pointer_move_line() {
        let event = InputEvent::from_json_line(
            r#"{"kind":"pointer_move","x":10,"y":20.5,"time":"2024-01-22T10:00:01Z"}"#,
        )
        .unwrap();

        assert_eq!(event.kind(), SignalKind::Pointer);
        assert_eq!(event.signal, Signal::PointerMove { x: 10.0, y: 20.5 });
        assert_eq!(event.time, Utc.with_ymd_and_hms(2024, 1, 22, 10, 0, 1).unwrap());
    }

    #[test]
    fn test_missing_time_is_stamped_on_receipt() {
        let before = Utc::now();
        let event = InputEvent::from_json_line(r#"{"kind":"key_down"}"#).unwrap();
        assert_eq!(event.kind(), SignalKind::Key);
        assert!(event.time >= before);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = InputEvent::from_json_line(r#"{"kind":"device_motion"}"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid input event"));
    }

    #[test]
    fn test_sample_fields_follow_kind() {
        let t = Utc::now();
        let scroll = Sample::from_event(&InputEvent::scroll(t, 340.0));
        assert_eq!(scroll.scroll_y, Some(340.0));
        assert_eq!(scroll.x, None);

        let key = Sample::from_event(&InputEvent::key_down(t));
        assert_eq!((key.x, key.y, key.scroll_y), (None, None, None));
        assert_eq!(key.time, t);
    }
}
