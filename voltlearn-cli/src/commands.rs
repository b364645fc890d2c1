//! CLI command implementations

use std::sync::Arc;

use clap::Subcommand;
use voltlearn_core::Result;
use voltlearn_core::analytics::{
    AnalyticsEvent, AnalyticsSink, TracingAnalyticsSink, select_sink,
};
use voltlearn_core::catalog::Catalog;
use voltlearn_core::config::VoltlearnConfig;
use voltlearn_core::device::{DeviceIdentity, FileKeyValueStore};
use voltlearn_core::locator::ResourceLocator;
use voltlearn_core::playback::{
    ClockPlayerFactory, FfprobeMediaProbe, MediaProbe, PlayerFactory, SimulationMediaProbe,
    SimulationPlayerFactory, VideoLoadState, VideoLoader,
};

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Inspect the lesson catalog
    #[command(subcommand)]
    Catalog(CatalogCommands),
    /// Validate a media locator through the load state machine
    Probe {
        /// Local path or remote URL of the media asset
        locator: String,
        /// Use simulated probing instead of ffprobe
        #[arg(long)]
        simulate: bool,
    },
    /// Manage the device identifier
    #[command(subcommand)]
    Device(DeviceCommands),
}

/// Catalog subcommands
#[derive(Subcommand)]
pub enum CatalogCommands {
    /// Resolve a legacy lesson id to its playback id
    Lookup {
        /// Lesson id, e.g. "1-1"
        lesson_id: String,
    },
    /// Show per-table lesson counts
    Counts,
    /// List every known lesson
    List,
}

/// Device identity subcommands
#[derive(Subcommand)]
pub enum DeviceCommands {
    /// Show the device identifier, creating one if needed
    Show,
    /// Discard the device identifier and generate a fresh one
    Reset,
}

/// Handle the CLI command
///
/// # Errors
/// Returns appropriate error based on the command that fails
pub async fn handle_command(command: Commands) -> Result<()> {
    let config = VoltlearnConfig::from_env();
    let analytics = select_sink(&config.analytics, Arc::new(TracingAnalyticsSink::new()));

    match command {
        Commands::Catalog(command) => handle_catalog(command, analytics.as_ref()),
        Commands::Probe { locator, simulate } => {
            probe_locator(&config, analytics, locator, simulate).await
        }
        Commands::Device(command) => handle_device(&config, command).await,
    }
}

fn handle_catalog(command: CatalogCommands, analytics: &dyn AnalyticsSink) -> Result<()> {
    let catalog = Catalog::new();
    match command {
        CatalogCommands::Lookup { lesson_id } => match catalog.lookup(&lesson_id) {
            Some(playback_id) => {
                analytics.record(AnalyticsEvent::new("lesson_opened").with_lesson(lesson_id.as_str()));
                println!("{lesson_id} -> {playback_id}");
            }
            None => println!("{lesson_id}: not in catalog"),
        },
        CatalogCommands::Counts => {
            let counts = catalog.counts();
            println!("basic:    {}", counts.basic);
            println!("advanced: {}", counts.advanced);
            println!("total:    {}", counts.total);
        }
        CatalogCommands::List => {
            for (lesson_id, playback_id) in catalog.entries() {
                println!("{lesson_id}  {playback_id}");
            }
        }
    }
    Ok(())
}

/// Run a locator through the load state machine and report the outcome
///
/// # Errors
/// - `VoltlearnError::Probe` - ffprobe missing when probing for real
async fn probe_locator(
    config: &VoltlearnConfig,
    analytics: Arc<dyn AnalyticsSink>,
    locator: String,
    simulate: bool,
) -> Result<()> {
    let locator = ResourceLocator::parse(&locator);

    if simulate {
        let loader = VideoLoader::new(
            SimulationMediaProbe::new(),
            SimulationPlayerFactory::new(),
            config.playback.position_interval,
        )
        .with_analytics(analytics);
        report_load(&loader, locator).await;
    } else {
        let loader = VideoLoader::new(
            FfprobeMediaProbe::new(config.playback.probe_timeout),
            ClockPlayerFactory::new(),
            config.playback.position_interval,
        )
        .with_analytics(analytics);
        report_load(&loader, locator).await;
    }
    Ok(())
}

async fn report_load<P: MediaProbe, F: PlayerFactory>(
    loader: &VideoLoader<P, F>,
    locator: ResourceLocator,
) {
    println!("Probing {locator}");
    match loader.load(locator).await {
        VideoLoadState::Ready(player) => {
            println!("ready: playable, duration {:?}", player.duration());
        }
        VideoLoadState::Failed(error) => {
            println!("failed: {error}");
        }
        state => println!("unexpected state: {state:?}"),
    }
}

async fn handle_device(config: &VoltlearnConfig, command: DeviceCommands) -> Result<()> {
    let store = Arc::new(FileKeyValueStore::new(config.device.store_path.clone()));
    let identity = DeviceIdentity::new(store, config.device.storage_key);

    match command {
        DeviceCommands::Show => {
            let id = identity.identifier().await?;
            println!("{id}");
        }
        DeviceCommands::Reset => {
            let id = identity.reset().await?;
            println!("Device identifier reset: {id}");
        }
    }
    Ok(())
}
