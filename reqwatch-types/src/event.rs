//! Lifecycle events delivered by an event producer.

use crate::{EndReason, RequestId, RequestKind, ViewId};

/// A request has started.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestBegin {
    pub request_id: RequestId,
    /// Full URL of the request at the time it was issued.
    pub url: String,
    /// Originating view, or [`ViewId::NONE`].
    #[cfg_attr(feature = "serde", serde(default = "no_view"))]
    pub view_id: ViewId,
    pub kind: RequestKind,
    /// Monotonic timestamp in milliseconds. When absent the consumer stamps
    /// the event on arrival.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub timestamp_ms: Option<f64>,
}

#[cfg(feature = "serde")]
fn no_view() -> ViewId {
    ViewId::NONE
}

impl RequestBegin {
    /// Create a begin event without a timestamp.
    pub fn new(
        request_id: impl Into<RequestId>,
        url: impl Into<String>,
        view_id: ViewId,
        kind: RequestKind,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            url: url.into(),
            view_id,
            kind,
            timestamp_ms: None,
        }
    }

    /// Set the event timestamp in milliseconds.
    pub fn at(mut self, timestamp_ms: f64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }
}

/// A request has finished, successfully or not.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RequestEnd {
    pub request_id: RequestId,
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub timestamp_ms: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub reason: EndReason,
}

impl RequestEnd {
    /// Create a completed end event without a timestamp.
    pub fn new(request_id: impl Into<RequestId>) -> Self {
        Self {
            request_id: request_id.into(),
            timestamp_ms: None,
            reason: EndReason::Completed,
        }
    }

    /// Set the event timestamp in milliseconds.
    pub fn at(mut self, timestamp_ms: f64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    /// Mark the request as having ended in an error.
    pub fn failed(mut self) -> Self {
        self.reason = EndReason::Error;
        self
    }
}

/// Focus state of a view changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewFocusChange {
    pub view_id: ViewId,
    /// The view is the selected one within its window.
    pub active: bool,
    /// The view's window has input focus.
    pub window_focused: bool,
}

/// Anything an event producer can send.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum Event {
    RequestBegin(RequestBegin),
    RequestEnd(RequestEnd),
    ViewFocus(ViewFocusChange),
    ViewClosed { view_id: ViewId },
    /// Preview the configured alert sound, bypassing every alert rule.
    PlayTestSound,
}

impl Event {
    /// Short name of the event type, as used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            Event::RequestBegin(_) => "request_begin",
            Event::RequestEnd(_) => "request_end",
            Event::ViewFocus(_) => "view_focus",
            Event::ViewClosed { .. } => "view_closed",
            Event::PlayTestSound => "play_test_sound",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builders_set_fields() {
        let begin = RequestBegin::new(1u64, "https://a.test/", ViewId(3), RequestKind::Fetch).at(5.0);
        assert_eq!(begin.request_id.as_str(), "1");
        assert_eq!(begin.timestamp_ms, Some(5.0));

        let end = RequestEnd::new("1").failed();
        assert_eq!(end.reason, EndReason::Error);
        assert!(end.timestamp_ms.is_none());
    }

    #[test]
    fn event_names() {
        assert_eq!(Event::PlayTestSound.name(), "play_test_sound");
        assert_eq!(Event::ViewClosed { view_id: ViewId(1) }.name(), "view_closed");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_event_stream_lines() {
        let begin: Event = serde_json::from_str(
            r#"{"type":"request_begin","request_id":1,"url":"https://slow.example.com/x","view_id":5,"kind":"fetch","timestamp_ms":0}"#,
        )
        .unwrap();
        let Event::RequestBegin(begin) = begin else {
            panic!("expected begin");
        };
        assert_eq!(begin.request_id.as_str(), "1");
        assert_eq!(begin.view_id, ViewId(5));
        assert_eq!(begin.kind, RequestKind::Fetch);
        assert_eq!(begin.timestamp_ms, Some(0.0));

        let end: Event =
            serde_json::from_str(r#"{"type":"request_end","request_id":"1","timestamp_ms":12000}"#)
                .unwrap();
        let Event::RequestEnd(end) = end else {
            panic!("expected end");
        };
        assert_eq!(end.reason, EndReason::Completed);
        assert_eq!(end.timestamp_ms, Some(12000.0));

        let focus: Event = serde_json::from_str(
            r#"{"type":"view_focus","view_id":5,"active":true,"window_focused":false}"#,
        )
        .unwrap();
        assert_eq!(
            focus,
            Event::ViewFocus(ViewFocusChange {
                view_id: ViewId(5),
                active: true,
                window_focused: false,
            })
        );

        let test_sound: Event = serde_json::from_str(r#"{"type":"play_test_sound"}"#).unwrap();
        assert_eq!(test_sound, Event::PlayTestSound);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn begin_without_view_uses_sentinel() {
        let event: Event = serde_json::from_str(
            r#"{"type":"request_begin","request_id":"a","url":"https://x.test/","kind":"main_frame"}"#,
        )
        .unwrap();
        let Event::RequestBegin(begin) = event else {
            panic!("expected begin");
        };
        assert_eq!(begin.view_id, ViewId::NONE);
        assert!(begin.timestamp_ms.is_none());
    }
}
