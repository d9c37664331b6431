//! View focus bookkeeping.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwatch_types::{ViewFocusChange, ViewId};
use tracing::trace;

use crate::error::FocusError;
use crate::sink::FocusQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewState {
    /// The view is the selected one in its window.
    pub active: bool,
    /// Its window has input focus.
    pub window_focused: bool,
}

impl ViewState {
    pub fn is_focused(&self) -> bool {
        self.active && self.window_focused
    }
}

/// Focus state of every known view, fed by focus events.
///
/// Cloning is cheap and clones share state, so one handle can be given to
/// the engine as its [`FocusQuery`] while another receives updates.
#[derive(Debug, Clone, Default)]
pub struct ViewRegistry {
    views: Arc<RwLock<HashMap<ViewId, ViewState>>>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the focus state of a view.
    pub fn set(&self, view: ViewId, active: bool, window_focused: bool) {
        trace!(view_id = %view, active, window_focused, "View focus updated");
        self.views.write().insert(
            view,
            ViewState {
                active,
                window_focused,
            },
        );
    }

    pub fn apply(&self, change: &ViewFocusChange) {
        self.set(change.view_id, change.active, change.window_focused);
    }

    /// Forget a closed view. Later queries for it fail.
    pub fn close(&self, view: ViewId) {
        self.views.write().remove(&view);
    }

    pub fn get(&self, view: ViewId) -> Option<ViewState> {
        self.views.read().get(&view).copied()
    }

    pub fn len(&self) -> usize {
        self.views.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.read().is_empty()
    }
}

#[async_trait]
impl FocusQuery for ViewRegistry {
    async fn is_focused(&self, view: ViewId) -> Result<bool, FocusError> {
        self.get(view)
            .map(|state| state.is_focused())
            .ok_or(FocusError::UnknownView(view))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_view_is_an_error() {
        let registry = ViewRegistry::new();
        assert!(matches!(
            registry.is_focused(ViewId(3)).await,
            Err(FocusError::UnknownView(ViewId(3)))
        ));
    }

    #[tokio::test]
    async fn test_focus_requires_active_and_window_focus() {
        let registry = ViewRegistry::new();
        registry.set(ViewId(1), true, true);
        registry.set(ViewId(2), true, false);
        registry.set(ViewId(3), false, true);

        assert!(registry.is_focused(ViewId(1)).await.unwrap());
        assert!(!registry.is_focused(ViewId(2)).await.unwrap());
        assert!(!registry.is_focused(ViewId(3)).await.unwrap());
    }

    #[tokio::test]
    async fn test_closed_view_is_forgotten() {
        let registry = ViewRegistry::new();
        registry.set(ViewId(5), true, true);
        registry.close(ViewId(5));
        assert!(registry.is_empty());
        assert!(registry.is_focused(ViewId(5)).await.is_err());
    }

    #[test]
    fn test_clones_share_state() {
        let registry = ViewRegistry::new();
        let handle = registry.clone();
        handle.apply(&ViewFocusChange {
            view_id: ViewId(8),
            active: true,
            window_focused: false,
        });
        assert_eq!(
            registry.get(ViewId(8)),
            Some(ViewState {
                active: true,
                window_focused: false
            })
        );
        assert_eq!(registry.len(), 1);
    }
}
