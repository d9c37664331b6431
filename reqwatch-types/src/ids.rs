//! Identifiers supplied by the event producer.

use core::fmt;

/// Opaque identifier of an in-flight request.
///
/// Only unique while the request is outstanding; producers are free to reuse
/// an id once its end event has been delivered. Browsers hand these out as
/// strings, some producers use integers, so both deserialize.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RequestId(pub String);

impl RequestId {
    /// Create a request id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequestId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RequestId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for RequestId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RequestId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self(text),
            Raw::Number(number) => Self(number.to_string()),
        })
    }
}

/// Identifier of the view (tab, window, pane) that issued a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ViewId(pub i64);

impl ViewId {
    /// Sentinel for requests that are not associated with any view
    /// (background fetches, service workers).
    pub const NONE: ViewId = ViewId(-1);

    /// Whether this id refers to an actual view.
    pub const fn is_some(&self) -> bool {
        self.0 != Self::NONE.0
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_conversions() {
        assert_eq!(RequestId::from(17u64).as_str(), "17");
        assert_eq!(RequestId::from("abc"), RequestId::new("abc"));
        assert_eq!(RequestId::from(String::from("x")).to_string(), "x");
    }

    #[test]
    fn none_view_is_not_some() {
        assert!(!ViewId::NONE.is_some());
        assert!(ViewId(0).is_some());
        assert!(ViewId(12).is_some());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn request_id_deserializes_from_string_or_number() {
        let from_text: RequestId = serde_json::from_str("\"req-9\"").unwrap();
        let from_number: RequestId = serde_json::from_str("9").unwrap();

        assert_eq!(from_text.as_str(), "req-9");
        assert_eq!(from_number.as_str(), "9");
        assert_eq!(serde_json::to_string(&from_number).unwrap(), "\"9\"");
    }
}
