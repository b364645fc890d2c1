//! Playable handles and their construction.
//!
//! A `PlayerHandle` is the opaque, stateful object the loader hands to the
//! presentation layer once an asset validates: it can start and stop playback,
//! report position, and host exactly one periodic position-observation
//! subscription. Construction goes through `PlayerFactory` so tests and
//! simulation can substitute counting fakes for the real thing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::probe::{MediaProperties, ProbeError};
use crate::locator::ResourceLocator;

/// Periodic position-observation callback.
pub type PositionCallback = Box<dyn Fn(Duration) + Send + Sync>;

/// A controllable playback handle bound to a validated asset.
pub trait PlayerHandle: Send + Sync {
    /// Starts or resumes playback.
    fn play(&self);

    /// Pauses playback, retaining position.
    fn pause(&self);

    fn is_playing(&self) -> bool;

    /// Current playback position, clamped to the asset duration.
    fn position(&self) -> Duration;

    /// Total asset duration as reported at validation time.
    fn duration(&self) -> Duration;

    /// Registers a periodic position observer.
    ///
    /// The returned guard is the subscription's sole owner: dropping it
    /// unregisters the observer exactly once. Callers must not register more
    /// than one observer per handle.
    fn observe_position(&self, interval: Duration, callback: PositionCallback)
    -> PositionSubscription;
}

/// Guard for a position-observation subscription.
///
/// Unregistering happens on drop and cannot happen twice: the cancel closure
/// is consumed the first time it runs.
pub struct PositionSubscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl PositionSubscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for PositionSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for PositionSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PositionSubscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Constructs playback handles for validated assets.
#[async_trait]
pub trait PlayerFactory: Send + Sync {
    /// Builds a player bound to the asset behind `locator`.
    ///
    /// Called only after the asset validated as playable with positive
    /// duration.
    ///
    /// # Errors
    ///
    /// - `ProbeError::BackendUnavailable` - Playback backend missing
    /// - `ProbeError::Io` - Construction failed in the backend
    async fn create_player(
        &self,
        locator: &ResourceLocator,
        properties: &MediaProperties,
    ) -> Result<Arc<dyn PlayerHandle>, ProbeError>;
}

struct ClockState {
    /// Position accumulated across previous play intervals.
    base: Duration,
    /// Set while playing; elapsed time since it adds to `base`.
    playing_since: Option<Instant>,
}

/// Wall-clock driven playback handle.
///
/// Position advances in real time while playing, clamped to the asset
/// duration. Periodic observation runs as a spawned tokio task aborted by the
/// subscription guard. This is the production handle for environments without
/// a platform player (the CLI, headless checks); embedding targets supply
/// their own `PlayerHandle` over the platform SDK.
pub struct ClockPlayer {
    duration: Duration,
    state: Arc<Mutex<ClockState>>,
}

impl ClockPlayer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            state: Arc::new(Mutex::new(ClockState {
                base: Duration::ZERO,
                playing_since: None,
            })),
        }
    }

    fn position_of(state: &ClockState, duration: Duration) -> Duration {
        let elapsed = state
            .playing_since
            .map(|since| since.elapsed())
            .unwrap_or(Duration::ZERO);
        (state.base + elapsed).min(duration)
    }
}

impl PlayerHandle for ClockPlayer {
    fn play(&self) {
        let mut state = self.state.lock();
        if state.playing_since.is_none() {
            state.playing_since = Some(Instant::now());
        }
    }

    fn pause(&self) {
        let mut state = self.state.lock();
        if let Some(since) = state.playing_since.take() {
            state.base = (state.base + since.elapsed()).min(self.duration);
        }
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing_since.is_some()
    }

    fn position(&self) -> Duration {
        Self::position_of(&self.state.lock(), self.duration)
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn observe_position(
        &self,
        interval: Duration,
        callback: PositionCallback,
    ) -> PositionSubscription {
        let state = Arc::clone(&self.state);
        let duration = self.duration;
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let position = Self::position_of(&state.lock(), duration);
                callback(position);
            }
        });
        PositionSubscription::new(move || task.abort())
    }
}

/// Factory producing `ClockPlayer` handles.
#[derive(Debug, Default)]
pub struct ClockPlayerFactory;

impl ClockPlayerFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PlayerFactory for ClockPlayerFactory {
    async fn create_player(
        &self,
        _locator: &ResourceLocator,
        properties: &MediaProperties,
    ) -> Result<Arc<dyn PlayerHandle>, ProbeError> {
        Ok(Arc::new(ClockPlayer::new(properties.duration)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_clock_player_starts_paused_at_zero() {
        let player = ClockPlayer::new(Duration::from_secs(60));
        assert!(!player.is_playing());
        assert_eq!(player.position(), Duration::ZERO);
        assert_eq!(player.duration(), Duration::from_secs(60));
    }

    #[test]
    fn test_pause_retains_position() {
        let player = ClockPlayer::new(Duration::from_secs(60));
        player.play();
        std::thread::sleep(Duration::from_millis(30));
        player.pause();
        let paused_at = player.position();
        assert!(paused_at > Duration::ZERO);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(player.position(), paused_at);
    }

    #[test]
    fn test_position_clamped_to_duration() {
        let player = ClockPlayer::new(Duration::from_millis(10));
        player.play();
        std::thread::sleep(Duration::from_millis(40));
        assert_eq!(player.position(), Duration::from_millis(10));
    }

    #[tokio::test]
    async fn test_observe_position_ticks_and_stops_on_drop() {
        let player = ClockPlayer::new(Duration::from_secs(60));
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&ticks);

        let subscription = player.observe_position(
            Duration::from_millis(5),
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(ticks.load(Ordering::SeqCst) > 0);

        drop(subscription);
        let after_drop = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        // Allow at most one in-flight tick that raced the abort.
        assert!(ticks.load(Ordering::SeqCst) <= after_drop + 1);
    }

    #[test]
    fn test_subscription_cancel_runs_exactly_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let subscription = PositionSubscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(subscription);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
