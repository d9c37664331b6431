//! Request classification.

/// The kind of resource a request loads.
///
/// Names follow the resource types reported by browser request APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RequestKind {
    /// Top-level navigation of a view.
    MainFrame,
    /// Navigation of an embedded frame.
    SubFrame,
    /// `XMLHttpRequest` issued by page script.
    #[cfg_attr(feature = "serde", serde(rename = "xmlhttprequest", alias = "xhr"))]
    XmlHttpRequest,
    /// `fetch()` issued by page script.
    Fetch,
    Script,
    Image,
    Stylesheet,
    /// Anything else, including kinds this crate does not know about.
    #[cfg_attr(feature = "serde", serde(other))]
    Other,
}

impl RequestKind {
    /// Whether requests of this kind are something a user waits on:
    /// a top-level navigation or a programmatic fetch/XHR.
    pub const fn is_trackable(&self) -> bool {
        matches!(
            self,
            RequestKind::MainFrame | RequestKind::XmlHttpRequest | RequestKind::Fetch
        )
    }
}

/// How a request finished.
///
/// Both variants end the request the same way; the distinction is kept for
/// logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EndReason {
    #[default]
    Completed,
    Error,
}
