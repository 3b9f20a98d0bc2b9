//! Core value types carried through the hub.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// An immutable event published to one or more channels.
///
/// Cloning is cheap: the strings are shared, so fanning one event out to
/// many subscribers does not copy the payload.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    id: Arc<str>,
    event: Arc<str>,
    data: Arc<str>,
}

impl Event {
    /// Create an event from its id, type name and payload.
    pub fn new(id: impl Into<Arc<str>>, event: impl Into<Arc<str>>, data: impl Into<Arc<str>>) -> Self {
        Self {
            id: id.into(),
            event: event.into(),
            data: data.into(),
        }
    }

    /// Stable identifier, used as the resume point for replay.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Event type name.
    pub fn event(&self) -> &str {
        &self.event
    }

    /// Payload.
    pub fn data(&self) -> &str {
        &self.data
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event({}, {}, {} bytes)", self.id, self.event, self.data.len())
    }
}

/// An immutable comment line, delivered outside the event ordering (keep-alives etc).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Comment(Arc<str>);

impl Comment {
    /// Create a comment from its text (without the leading colon).
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Comment(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Comment {
    fn from(text: &str) -> Self {
        Comment(Arc::from(text))
    }
}

impl From<String> for Comment {
    fn from(text: String) -> Self {
        Comment(Arc::from(text))
    }
}

impl fmt::Debug for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Comment({:?})", &*self.0)
    }
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_accessors() {
        let event = Event::new("42", "Tick", "2013-01-01 00:00:00 +0000 UTC");
        assert_eq!(event.id(), "42");
        assert_eq!(event.event(), "Tick");
        assert_eq!(event.data(), "2013-01-01 00:00:00 +0000 UTC");
    }

    #[test]
    fn test_event_clone_shares_payload() {
        let event = Event::new("1", "message", "x".repeat(1024));
        let copy = event.clone();
        assert!(std::ptr::eq(event.data(), copy.data()));
        assert_eq!(event, copy);
    }

    #[test]
    fn test_event_json_shape() {
        let event = Event::new("7", "update", "{\"n\":1}");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["id"], "7");
        assert_eq!(json["event"], "update");

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_comment_constructors_agree() {
        let owned = Comment::new(String::from("keep-alive"));
        assert_eq!(owned, Comment::from("keep-alive"));
        assert_eq!(owned, Comment::from(String::from("keep-alive")));
    }

    #[test]
    fn test_comment_is_transparent_string() {
        let comment = Comment::from("keep-alive");
        assert_eq!(comment.as_str(), "keep-alive");
        assert_eq!(comment.to_string(), "keep-alive");
        assert_eq!(serde_json::to_string(&comment).unwrap(), "\"keep-alive\"");
    }
}
