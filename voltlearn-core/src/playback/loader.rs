//! Video load state machine.
//!
//! `VideoLoader` turns a resource locator into a validated, playable handle or
//! a classified failure, exposing exactly one of four states to the
//! presentation layer at any time. The machine owns the current player and its
//! single position-observation subscription; both are released when a new load
//! supersedes them or the loader is dropped.
//!
//! All state mutation happens under one mutex that is never held across an
//! await, so observers of the watch channel see transitions in a strictly
//! serialized order. Each `load` call is tagged with a sequence number; a
//! validation result arriving after a newer `load` has started is discarded
//! instead of overwriting the newer state.

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::watch;

use super::player::{PlayerFactory, PlayerHandle, PositionSubscription};
use super::probe::MediaProbe;
use crate::analytics::{AnalyticsEvent, AnalyticsSink, NullAnalyticsSink};
use crate::locator::ResourceLocator;

/// Why a load attempt failed. All four kinds are terminal for that attempt and
/// non-fatal to the process; the caller retries by calling `load` again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VideoLoadError {
    /// The locator does not resolve to an existing local asset.
    #[error("no asset at {locator}")]
    ResourceNotFound {
        /// The locator that failed to resolve.
        locator: String,
    },

    /// The asset exists but the probe reports it unplayable.
    #[error("asset is not playable")]
    NotPlayable,

    /// The asset is playable but reports non-positive duration.
    #[error("asset reports zero duration")]
    ZeroDuration,

    /// Any other probe or construction error, passed through unreinterpreted.
    #[error("{0}")]
    Underlying(String),
}

impl VideoLoadError {
    /// Stable short name of the failure kind, for analytics and diagnostics.
    pub fn classification(&self) -> &'static str {
        match self {
            Self::ResourceNotFound { .. } => "resource_not_found",
            Self::NotPlayable => "not_playable",
            Self::ZeroDuration => "zero_duration",
            Self::Underlying(_) => "underlying",
        }
    }
}

/// Current state of a `VideoLoader`.
#[derive(Clone)]
pub enum VideoLoadState {
    /// No load attempted yet.
    Idle,
    /// Validation in flight.
    Loading,
    /// Asset validated; holds the playable handle.
    Ready(Arc<dyn PlayerHandle>),
    /// Load attempt failed with a classification.
    Failed(VideoLoadError),
}

impl VideoLoadState {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// The failure classification, when failed.
    pub fn error(&self) -> Option<&VideoLoadError> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

impl std::fmt::Debug for VideoLoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Loading => write!(f, "Loading"),
            Self::Ready(player) => f
                .debug_struct("Ready")
                .field("duration", &player.duration())
                .finish(),
            Self::Failed(error) => f.debug_tuple("Failed").field(error).finish(),
        }
    }
}

/// Last position reported by the periodic observation callback.
///
/// The callback holds only a `Weak` to this tracker, so an in-flight tick
/// cannot keep a discarded session alive.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    last: Mutex<Option<Duration>>,
}

impl ProgressTracker {
    fn record(&self, position: Duration) {
        *self.last.lock() = Some(position);
    }

    pub fn last_position(&self) -> Option<Duration> {
        *self.last.lock()
    }
}

/// A validated player together with its single observation subscription.
///
/// Dropping the session drops the subscription guard, which unregisters the
/// observer exactly once.
struct PlayerSession {
    player: Arc<dyn PlayerHandle>,
    tracker: Arc<ProgressTracker>,
    _subscription: PositionSubscription,
}

impl PlayerSession {
    fn start(player: Arc<dyn PlayerHandle>, interval: Duration) -> Self {
        let tracker = Arc::new(ProgressTracker::default());
        let weak: Weak<ProgressTracker> = Arc::downgrade(&tracker);
        let subscription = player.observe_position(
            interval,
            Box::new(move |position| {
                if let Some(tracker) = weak.upgrade() {
                    tracker.record(position);
                }
            }),
        );
        Self {
            player,
            tracker,
            _subscription: subscription,
        }
    }
}

struct LoaderInner {
    /// Monotonically increasing per-`load` sequence; stale completions bail.
    sequence: u64,
    session: Option<PlayerSession>,
}

/// Four-state video load machine over injected probe and player capabilities.
///
/// Single logical owner per instance: the loader is designed for one
/// presentation controller driving it, with observers reading the watch
/// channel.
pub struct VideoLoader<P: MediaProbe, F: PlayerFactory> {
    probe: P,
    factory: F,
    position_interval: Duration,
    analytics: Arc<dyn AnalyticsSink>,
    state_tx: watch::Sender<VideoLoadState>,
    inner: Mutex<LoaderInner>,
}

impl<P: MediaProbe, F: PlayerFactory> VideoLoader<P, F> {
    pub fn new(probe: P, factory: F, position_interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(VideoLoadState::Idle);
        Self {
            probe,
            factory,
            position_interval,
            analytics: Arc::new(NullAnalyticsSink),
            state_tx,
            inner: Mutex::new(LoaderInner {
                sequence: 0,
                session: None,
            }),
        }
    }

    /// Routes load outcome events into the given analytics sink.
    ///
    /// Without this the loader stays silent; superseded loads never emit.
    pub fn with_analytics(mut self, analytics: Arc<dyn AnalyticsSink>) -> Self {
        self.analytics = analytics;
        self
    }

    /// Current state snapshot.
    pub fn state(&self) -> VideoLoadState {
        self.state_tx.borrow().clone()
    }

    /// Reactive state observation; receivers wake on every transition.
    pub fn subscribe(&self) -> watch::Receiver<VideoLoadState> {
        self.state_tx.subscribe()
    }

    /// Last playback position reported by the current session's observer.
    pub fn progress(&self) -> Option<Duration> {
        self.inner
            .lock()
            .session
            .as_ref()
            .and_then(|session| session.tracker.last_position())
    }

    /// Loads and validates the asset behind `locator`.
    ///
    /// Transitions to `Loading` immediately, releasing any prior player and
    /// subscription, then suspends on validation: local existence, probe
    /// playability, positive duration, in that order, failing fast onto the
    /// matching `VideoLoadError`. On success the machine holds the player and
    /// exactly one position subscription and publishes `Ready`.
    ///
    /// A later `load` call supersedes this one: if this call's result arrives
    /// after a newer load has started, the result is discarded and the newer
    /// state stands. The returned state is whatever the machine is in when
    /// this call completes.
    pub async fn load(&self, locator: ResourceLocator) -> VideoLoadState {
        let sequence = {
            let mut inner = self.inner.lock();
            inner.sequence += 1;
            let superseded = inner.session.take();
            drop(superseded);
            self.state_tx.send_replace(VideoLoadState::Loading);
            inner.sequence
        };
        tracing::debug!(%locator, sequence, "load started");

        let outcome = self.resolve(&locator).await;

        let mut inner = self.inner.lock();
        if inner.sequence != sequence {
            // A newer load started while this one was in flight; discard the
            // stale result (dropping any session it built).
            tracing::debug!(%locator, sequence, "load superseded, result discarded");
            return self.state_tx.borrow().clone();
        }

        let state = match outcome {
            Ok(session) => {
                let player = Arc::clone(&session.player);
                inner.session = Some(session);
                VideoLoadState::Ready(player)
            }
            Err(error) => {
                tracing::debug!(%locator, %error, "load failed");
                VideoLoadState::Failed(error)
            }
        };
        self.state_tx.send_replace(state.clone());
        drop(inner);

        let event = match &state {
            VideoLoadState::Failed(error) => AnalyticsEvent::new("playback_failed")
                .with_attribute("locator", locator.to_string())
                .with_attribute("reason", error.classification()),
            _ => AnalyticsEvent::new("playback_ready")
                .with_attribute("locator", locator.to_string()),
        };
        self.analytics.record(event);

        state
    }

    async fn resolve(&self, locator: &ResourceLocator) -> Result<PlayerSession, VideoLoadError> {
        if let Some(path) = locator.as_local_path() {
            match tokio::fs::try_exists(path).await {
                Ok(true) => {}
                Ok(false) => {
                    return Err(VideoLoadError::ResourceNotFound {
                        locator: locator.to_string(),
                    });
                }
                // Not a verdict about existence (e.g. unreadable parent);
                // passes through rather than masquerading as not-found.
                Err(e) => return Err(VideoLoadError::Underlying(e.to_string())),
            }
        }

        let properties = self
            .probe
            .probe(locator)
            .await
            .map_err(|e| VideoLoadError::Underlying(e.to_string()))?;

        if !properties.playable {
            return Err(VideoLoadError::NotPlayable);
        }
        if properties.duration.is_zero() {
            return Err(VideoLoadError::ZeroDuration);
        }

        let player = self
            .factory
            .create_player(locator, &properties)
            .await
            .map_err(|e| VideoLoadError::Underlying(e.to_string()))?;

        Ok(PlayerSession::start(player, self.position_interval))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::super::simulation::{SimulationMediaProbe, SimulationPlayerFactory};
    use super::*;

    fn loader_with(
        probe: SimulationMediaProbe,
    ) -> VideoLoader<SimulationMediaProbe, SimulationPlayerFactory> {
        VideoLoader::new(
            probe,
            SimulationPlayerFactory::new(),
            Duration::from_millis(5),
        )
    }

    fn remote(name: &str) -> ResourceLocator {
        ResourceLocator::parse(&format!("https://cdn.example.com/{name}"))
    }

    #[tokio::test]
    async fn test_initial_state_is_idle() {
        let loader = loader_with(SimulationMediaProbe::new());
        assert!(matches!(loader.state(), VideoLoadState::Idle));
    }

    #[tokio::test]
    async fn test_missing_local_asset_fails_not_found() {
        let loader = loader_with(SimulationMediaProbe::new());
        let locator = ResourceLocator::Local(PathBuf::from("/nonexistent/lesson.mp4"));

        let state = loader.load(locator).await;

        assert!(matches!(
            state.error(),
            Some(VideoLoadError::ResourceNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_failed_existence_check_is_underlying_not_not_found() {
        // A path whose parent is a regular file makes the existence check
        // itself error out; that is not the same as "does not exist".
        let file = tempfile::NamedTempFile::new().unwrap();
        let locator = ResourceLocator::Local(file.path().join("lesson.mp4"));
        let loader = loader_with(SimulationMediaProbe::new());

        let state = loader.load(locator).await;

        assert!(matches!(
            state.error(),
            Some(VideoLoadError::Underlying(_))
        ));
    }

    #[tokio::test]
    async fn test_unplayable_asset_fails_not_playable() {
        let probe = SimulationMediaProbe::new();
        probe.script_unplayable(remote("broken.mp4"));
        let loader = loader_with(probe);

        let state = loader.load(remote("broken.mp4")).await;

        assert_eq!(state.error(), Some(&VideoLoadError::NotPlayable));
    }

    #[tokio::test]
    async fn test_zero_duration_asset_fails() {
        let probe = SimulationMediaProbe::new();
        probe.script_playable(remote("empty.mp4"), Duration::ZERO);
        let loader = loader_with(probe);

        let state = loader.load(remote("empty.mp4")).await;

        assert_eq!(state.error(), Some(&VideoLoadError::ZeroDuration));
    }

    #[tokio::test]
    async fn test_probe_error_passes_through_as_underlying() {
        let probe = SimulationMediaProbe::new();
        probe.script_error(remote("flaky.mp4"), "backend exploded");
        let loader = loader_with(probe);

        let state = loader.load(remote("flaky.mp4")).await;

        match state.error() {
            Some(VideoLoadError::Underlying(message)) => {
                assert!(message.contains("backend exploded"));
            }
            other => panic!("expected Underlying, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_valid_asset_reaches_ready() {
        let probe = SimulationMediaProbe::new();
        probe.script_playable(remote("1-1.mp4"), Duration::from_secs(240));
        let loader = loader_with(probe);

        let state = loader.load(remote("1-1.mp4")).await;

        match state {
            VideoLoadState::Ready(player) => {
                assert_eq!(player.duration(), Duration::from_secs(240));
            }
            other => panic!("expected Ready, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_then_retry_reaches_ready() {
        let probe = SimulationMediaProbe::new();
        probe.script_unplayable(remote("lesson.mp4"));
        let loader = loader_with(probe);

        let first = loader.load(remote("lesson.mp4")).await;
        assert_eq!(first.error(), Some(&VideoLoadError::NotPlayable));

        loader
            .probe
            .script_playable(remote("lesson.mp4"), Duration::from_secs(90));
        let second = loader.load(remote("lesson.mp4")).await;
        assert!(second.is_ready());
    }

    #[tokio::test]
    async fn test_load_outcomes_reach_analytics_sink() {
        use crate::analytics::ChannelAnalyticsSink;

        let probe = SimulationMediaProbe::new();
        probe.script_unplayable(remote("broken.mp4"));
        probe.script_playable(remote("1-3.mp4"), Duration::from_secs(60));
        let (sink, mut rx) = ChannelAnalyticsSink::new();
        let loader = loader_with(probe).with_analytics(Arc::new(sink));

        loader.load(remote("broken.mp4")).await;
        let event = rx.recv().await.unwrap();
        assert_eq!(event.name, "playback_failed");
        assert_eq!(
            event.attributes.get("reason").map(String::as_str),
            Some("not_playable")
        );

        loader.load(remote("1-3.mp4")).await;
        let event = rx.recv().await.unwrap();
        assert_eq!(event.name, "playback_ready");
        assert!(
            event
                .attributes
                .get("locator")
                .is_some_and(|l| l.contains("1-3.mp4"))
        );
    }

    #[tokio::test]
    async fn test_watch_observers_see_transitions() {
        let probe = SimulationMediaProbe::new();
        probe.script_playable(remote("1-2.mp4"), Duration::from_secs(60));
        let loader = loader_with(probe);
        let mut rx = loader.subscribe();

        loader.load(remote("1-2.mp4")).await;

        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_ready());
    }
}
