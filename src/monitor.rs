//! Event loop tying a source, the focus registry and the engine together.

use reqwatch_types::Event;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::focus::ViewRegistry;
use crate::settings::Settings;
use crate::source::EventSource;
use crate::tracker::{AlertDecision, AlertEngine, EngineStats};

/// Routes events to the engine and to the view registry.
///
/// The registry handed to `new` must be the one the engine queries for
/// focus, otherwise focus events have no effect on alerts.
#[derive(Debug)]
pub struct Monitor {
    engine: AlertEngine,
    views: ViewRegistry,
}

impl Monitor {
    pub fn new(engine: AlertEngine, views: ViewRegistry) -> Self {
        Self { engine, views }
    }

    pub fn engine(&self) -> &AlertEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut AlertEngine {
        &mut self.engine
    }

    pub fn views(&self) -> &ViewRegistry {
        &self.views
    }

    pub fn into_engine(self) -> AlertEngine {
        self.engine
    }

    /// Handle a single event. Returns the alert decision for request ends
    /// that produced one.
    pub async fn handle(&mut self, event: Event) -> Option<AlertDecision> {
        match event {
            Event::RequestBegin(begin) => {
                self.engine.on_request_begin(begin);
                None
            }
            Event::RequestEnd(end) => self.engine.on_request_end(end).await,
            Event::ViewFocus(change) => {
                self.views.apply(&change);
                None
            }
            Event::ViewClosed { view_id } => {
                self.views.close(view_id);
                None
            }
            Event::PlayTestSound => {
                self.engine.play_test_sound().await;
                None
            }
        }
    }

    /// Process events until the source is exhausted.
    ///
    /// When a settings channel is given, every new snapshot published on it
    /// replaces the engine's settings. A closed settings channel is ignored
    /// from then on.
    pub async fn run<S>(
        &mut self,
        source: &mut S,
        settings: Option<watch::Receiver<Settings>>,
    ) -> EngineStats
    where
        S: EventSource + ?Sized,
    {
        let mut settings = settings;
        if let Some(rx) = settings.as_mut() {
            let initial = rx.borrow_and_update().clone();
            self.engine.apply_settings(initial);
        }

        info!(source = %source.description(), "Watching requests");

        loop {
            tokio::select! {
                biased;

                changed = settings_changed(&mut settings) => {
                    if changed {
                        if let Some(rx) = settings.as_mut() {
                            let next = rx.borrow_and_update().clone();
                            self.engine.apply_settings(next);
                        }
                    } else {
                        debug!("Settings channel closed");
                        settings = None;
                    }
                }

                event = source.next_event() => match event {
                    Some(event) => {
                        self.handle(event).await;
                    }
                    None => break,
                },
            }
        }

        if let Some(error) = source.error() {
            warn!(source = %source.description(), error = %error, "Event source reported an error");
        }

        let stats = self.engine.stats();
        info!(
            source = %source.description(),
            alerted = stats.alerted,
            pending = self.engine.pending_count(),
            "Event source exhausted"
        );
        stats
    }
}

async fn settings_changed(settings: &mut Option<watch::Receiver<Settings>>) -> bool {
    match settings {
        Some(rx) => rx.changed().await.is_ok(),
        None => std::future::pending().await,
    }
}
