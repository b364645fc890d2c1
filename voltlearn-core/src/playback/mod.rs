//! Video playback pipeline: probing, player construction, and the load
//! state machine.
//!
//! The presentation layer resolves a lesson to a locator via the catalog,
//! hands it to a `VideoLoader`, and renders whatever `VideoLoadState` the
//! loader publishes. Probing and player construction sit behind capability
//! traits with production and simulation implementations.

pub mod loader;
pub mod player;
pub mod probe;
pub mod simulation;

pub use loader::{ProgressTracker, VideoLoadError, VideoLoadState, VideoLoader};
pub use player::{
    ClockPlayer, ClockPlayerFactory, PlayerFactory, PlayerHandle, PositionCallback,
    PositionSubscription,
};
pub use probe::{FfprobeMediaProbe, MediaProbe, MediaProperties, ProbeError};
pub use simulation::{
    SimulationMediaProbe, SimulationPlayer, SimulationPlayerFactory, SubscriptionCounters,
};
