//! Simulation implementations of the playback capabilities.
//!
//! Used by tests and the CLI's demo mode: a probe with scripted per-locator
//! outcomes (including artificial latency, for exercising superseded loads)
//! and a player that counts subscribe/unsubscribe calls so resource-release
//! properties can be asserted.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::player::{PlayerFactory, PlayerHandle, PositionCallback, PositionSubscription};
use super::probe::{MediaProbe, MediaProperties, ProbeError};
use crate::locator::ResourceLocator;

#[derive(Debug, Clone)]
enum ScriptedOutcome {
    Playable(Duration),
    Unplayable,
    Error(String),
}

#[derive(Debug, Clone)]
struct ScriptedEntry {
    outcome: ScriptedOutcome,
    delay: Duration,
}

/// Probe returning scripted per-locator outcomes.
///
/// Unscripted locators report a playable two-minute asset so simple tests
/// need no setup.
#[derive(Debug, Default)]
pub struct SimulationMediaProbe {
    scripts: Mutex<HashMap<ResourceLocator, ScriptedEntry>>,
}

impl SimulationMediaProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a playable asset with the given duration.
    pub fn script_playable(&self, locator: ResourceLocator, duration: Duration) {
        self.script(
            locator,
            ScriptedOutcome::Playable(duration),
            Duration::ZERO,
        );
    }

    /// Scripts a playable asset whose probe takes `delay` to complete.
    pub fn script_playable_with_delay(
        &self,
        locator: ResourceLocator,
        duration: Duration,
        delay: Duration,
    ) {
        self.script(locator, ScriptedOutcome::Playable(duration), delay);
    }

    /// Scripts an asset the probe reports as unplayable.
    pub fn script_unplayable(&self, locator: ResourceLocator) {
        self.script(locator, ScriptedOutcome::Unplayable, Duration::ZERO);
    }

    /// Scripts a probe-level failure for the locator.
    pub fn script_error(&self, locator: ResourceLocator, message: &str) {
        self.script(
            locator,
            ScriptedOutcome::Error(message.to_string()),
            Duration::ZERO,
        );
    }

    fn script(&self, locator: ResourceLocator, outcome: ScriptedOutcome, delay: Duration) {
        self.scripts
            .lock()
            .insert(locator, ScriptedEntry { outcome, delay });
    }
}

#[async_trait]
impl MediaProbe for SimulationMediaProbe {
    async fn probe(&self, locator: &ResourceLocator) -> Result<MediaProperties, ProbeError> {
        let entry = self.scripts.lock().get(locator).cloned();
        let Some(entry) = entry else {
            return Ok(MediaProperties {
                playable: true,
                duration: Duration::from_secs(120),
            });
        };

        if !entry.delay.is_zero() {
            tokio::time::sleep(entry.delay).await;
        }

        match entry.outcome {
            ScriptedOutcome::Playable(duration) => Ok(MediaProperties {
                playable: true,
                duration,
            }),
            ScriptedOutcome::Unplayable => Ok(MediaProperties {
                playable: false,
                duration: Duration::ZERO,
            }),
            ScriptedOutcome::Error(message) => Err(ProbeError::UnreadableOutput(message)),
        }
    }
}

/// Subscribe/unsubscribe tallies across every player a factory produced.
#[derive(Debug, Default)]
pub struct SubscriptionCounters {
    subscribed: AtomicUsize,
    unsubscribed: AtomicUsize,
}

impl SubscriptionCounters {
    pub fn subscribed(&self) -> usize {
        self.subscribed.load(Ordering::SeqCst)
    }

    pub fn unsubscribed(&self) -> usize {
        self.unsubscribed.load(Ordering::SeqCst)
    }

    /// Subscriptions registered and not yet released.
    pub fn active(&self) -> usize {
        self.subscribed() - self.unsubscribed()
    }
}

struct SimulationPlayerInner {
    playing: AtomicBool,
    position: Mutex<Duration>,
    observer: Mutex<Option<PositionCallback>>,
    counters: Arc<SubscriptionCounters>,
}

/// Playback handle with manually advanced position and counted subscriptions.
pub struct SimulationPlayer {
    duration: Duration,
    inner: Arc<SimulationPlayerInner>,
}

impl SimulationPlayer {
    pub fn new(duration: Duration, counters: Arc<SubscriptionCounters>) -> Self {
        Self {
            duration,
            inner: Arc::new(SimulationPlayerInner {
                playing: AtomicBool::new(false),
                position: Mutex::new(Duration::ZERO),
                observer: Mutex::new(None),
                counters,
            }),
        }
    }

    /// Advances position and delivers it to the registered observer, if any.
    pub fn advance(&self, by: Duration) {
        let position = {
            let mut position = self.inner.position.lock();
            *position = (*position + by).min(self.duration);
            *position
        };
        if let Some(callback) = self.inner.observer.lock().as_ref() {
            callback(position);
        }
    }
}

impl PlayerHandle for SimulationPlayer {
    fn play(&self) {
        self.inner.playing.store(true, Ordering::SeqCst);
    }

    fn pause(&self) {
        self.inner.playing.store(false, Ordering::SeqCst);
    }

    fn is_playing(&self) -> bool {
        self.inner.playing.load(Ordering::SeqCst)
    }

    fn position(&self) -> Duration {
        *self.inner.position.lock()
    }

    fn duration(&self) -> Duration {
        self.duration
    }

    fn observe_position(
        &self,
        _interval: Duration,
        callback: PositionCallback,
    ) -> PositionSubscription {
        self.inner.counters.subscribed.fetch_add(1, Ordering::SeqCst);
        *self.inner.observer.lock() = Some(callback);

        let inner = Arc::clone(&self.inner);
        PositionSubscription::new(move || {
            inner.observer.lock().take();
            inner.counters.unsubscribed.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// Factory producing `SimulationPlayer` handles over shared counters.
#[derive(Default)]
pub struct SimulationPlayerFactory {
    counters: Arc<SubscriptionCounters>,
    fail_reason: Mutex<Option<String>>,
    created: AtomicUsize,
}

impl SimulationPlayerFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters shared by every player this factory has produced.
    pub fn counters(&self) -> Arc<SubscriptionCounters> {
        Arc::clone(&self.counters)
    }

    /// Number of players constructed so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Makes every subsequent construction fail with the given reason.
    pub fn fail_with(&self, reason: &str) {
        *self.fail_reason.lock() = Some(reason.to_string());
    }
}

#[async_trait]
impl PlayerFactory for SimulationPlayerFactory {
    async fn create_player(
        &self,
        _locator: &ResourceLocator,
        properties: &MediaProperties,
    ) -> Result<Arc<dyn PlayerHandle>, ProbeError> {
        if let Some(reason) = self.fail_reason.lock().clone() {
            return Err(ProbeError::BackendUnavailable { reason });
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(SimulationPlayer::new(
            properties.duration,
            self.counters(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unscripted_locator_defaults_to_playable() {
        let probe = SimulationMediaProbe::new();
        let locator = ResourceLocator::parse("https://cdn.example.com/any.mp4");

        let props = probe.probe(&locator).await.unwrap();

        assert!(props.playable);
        assert!(props.duration > Duration::ZERO);
    }

    #[tokio::test]
    async fn test_scripted_error_surfaces() {
        let probe = SimulationMediaProbe::new();
        let locator = ResourceLocator::parse("https://cdn.example.com/bad.mp4");
        probe.script_error(locator.clone(), "scripted failure");

        let result = probe.probe(&locator).await;

        assert!(matches!(result, Err(ProbeError::UnreadableOutput(_))));
    }

    #[test]
    fn test_subscription_counting() {
        let counters = Arc::new(SubscriptionCounters::default());
        let player = SimulationPlayer::new(Duration::from_secs(10), Arc::clone(&counters));

        let subscription = player.observe_position(Duration::from_millis(250), Box::new(|_| {}));
        assert_eq!(counters.subscribed(), 1);
        assert_eq!(counters.active(), 1);

        drop(subscription);
        assert_eq!(counters.unsubscribed(), 1);
        assert_eq!(counters.active(), 0);
    }

    #[test]
    fn test_advance_delivers_to_observer() {
        let counters = Arc::new(SubscriptionCounters::default());
        let player = SimulationPlayer::new(Duration::from_secs(10), counters);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let _subscription = player.observe_position(
            Duration::from_millis(250),
            Box::new(move |position| sink.lock().push(position)),
        );
        player.advance(Duration::from_secs(3));
        player.advance(Duration::from_secs(4));

        assert_eq!(
            *seen.lock(),
            vec![Duration::from_secs(3), Duration::from_secs(7)]
        );
    }

    #[test]
    fn test_advance_clamps_to_duration() {
        let counters = Arc::new(SubscriptionCounters::default());
        let player = SimulationPlayer::new(Duration::from_secs(5), counters);
        player.advance(Duration::from_secs(30));
        assert_eq!(player.position(), Duration::from_secs(5));
    }
}
