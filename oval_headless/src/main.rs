use algorithm::{fusion::MeanFusion, nmea::DialectKind};
use clap::{Args, Parser, Subcommand};
use common::{channel::ChannelId, clock::SystemClock};
use dirs::data_local_dir;
use gnss::serial_source::{SerialConfig, SerialLineSource};
use module_core::{Event, EventBus, EventKind, Module};
use publisher::FixPublisher;
use replay::ReplayEngine;
use scheduler::{
    config::{ChannelConfig, LiveConfig, ReplayConfig},
    live::{LiveScheduler, open_channels},
    playback::ReplayScheduler,
};
use std::{path::PathBuf, sync::Arc, time::Duration};
use storage::FixStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Fuses the positions of two satellite receivers and publishes them as
/// `[latitude, longitude, heading]` lines on stdout.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Folder of the fix logs [default: <local data dir>/oval]
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Read both receivers, log their fixes and publish the fused position.
    Live(LiveArgs),
    /// Publish the logged fixes of one channel again.
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct LiveArgs {
    /// Serial device of receiver A
    #[arg(long)]
    device_a: String,
    /// Serial device of receiver B
    #[arg(long)]
    device_b: String,
    #[arg(long, default_value = "gprmc")]
    dialect_a: DialectKind,
    #[arg(long, default_value = "gnrmc")]
    dialect_b: DialectKind,
    #[arg(long, default_value_t = 115200)]
    baud: u32,
    #[arg(long, default_value_t = 1000)]
    read_timeout_ms: u64,
    #[arg(long, default_value_t = 1000)]
    write_timeout_ms: u64,
    /// Cycles per second
    #[arg(long, default_value_t = 10)]
    rate_hz: u32,
    /// Sentence sent to receiver A after opening it, may be repeated
    #[arg(long = "init-a")]
    init_a: Vec<String>,
    /// Sentence sent to receiver B after opening it, may be repeated
    #[arg(long = "init-b")]
    init_b: Vec<String>,
}

impl LiveArgs {
    fn to_config(&self) -> LiveConfig {
        let channel = |id, path: &str, dialect, init: &[String]| ChannelConfig {
            id,
            serial: SerialConfig {
                path: path.to_owned(),
                baud_rate: self.baud,
                read_timeout: Duration::from_millis(self.read_timeout_ms),
                write_timeout: Duration::from_millis(self.write_timeout_ms),
            },
            dialect,
            init_sentences: init.to_vec(),
        };
        LiveConfig {
            channels: vec![
                channel(ChannelId::A, &self.device_a, self.dialect_a, &self.init_a),
                channel(ChannelId::B, &self.device_b, self.dialect_b, &self.init_b),
            ],
            rate_hz: self.rate_hz,
        }
    }
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Channel whose log is replayed
    #[arg(long, default_value = "b")]
    channel: ChannelId,
    /// Delay between two published fixes
    #[arg(long, default_value_t = 2000)]
    delay_ms: u64,
}

impl ReplayArgs {
    fn to_config(&self) -> ReplayConfig {
        ReplayConfig {
            channel: self.channel,
            delay: Duration::from_millis(self.delay_ms),
        }
    }
}

fn get_storage_dir(cli: &Cli) -> Result<PathBuf, ()> {
    if let Some(store_dir) = &cli.store_dir {
        return Ok(store_dir.clone());
    }
    let mut storage_dir = data_local_dir().ok_or_else(|| {
        error!("Could not determine local data directory");
    })?;
    storage_dir.push("oval");
    Ok(storage_dir)
}

async fn create_live_scheduler(
    eb: &EventBus,
    store: &FixStore,
    config: &LiveConfig,
) -> Result<Box<dyn Module>, ()> {
    let channels = open_channels(
        &config.channels,
        store,
        Arc::new(SystemClock),
        SerialLineSource::open_boxed,
    )
    .await
    .map_err(|e| error!("Failed to open the receivers. Error: {}", e))?;
    Ok(Box::new(LiveScheduler::new(
        eb.context(),
        channels,
        Box::new(MeanFusion),
        config.period(),
    )))
}

fn create_replay_scheduler(
    eb: &EventBus,
    store: &FixStore,
    config: &ReplayConfig,
) -> Box<dyn Module> {
    let engine = ReplayEngine::new(store, config.channel, config.delay);
    Box::new(ReplayScheduler::new(eb.context(), engine))
}

fn install_quit_handler(eb: &EventBus) -> Result<(), ()> {
    let sender = eb.sender();
    ctrlc::set_handler(move || {
        info!("Shutdown requested");
        let _ = sender.send(Event {
            kind: EventKind::QuitEvent,
        });
    })
    .map_err(|e| error!("Failed to install the signal handler. Error: {}", e))
}

#[tokio::main]
async fn main() -> Result<(), ()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let storage_dir = get_storage_dir(&cli)?;
    let store = FixStore::new(&storage_dir).map_err(|e| {
        error!(
            "Failed to create fix storage in {}. Error: {}",
            storage_dir.to_string_lossy(),
            e
        )
    })?;
    let eb = EventBus::default();
    let mut scheduler = match &cli.mode {
        Mode::Live(args) => create_live_scheduler(&eb, &store, &args.to_config()).await?,
        Mode::Replay(args) => create_replay_scheduler(&eb, &store, &args.to_config()),
    };
    let mut publisher = FixPublisher::new(eb.context(), Box::new(std::io::stdout()));
    install_quit_handler(&eb)?;

    let quit = eb.sender();
    let scheduler_run = async {
        let result = scheduler.run().await;
        if result.is_err() {
            let _ = quit.send(Event {
                kind: EventKind::QuitEvent,
            });
        }
        result
    };

    info!("Starting modules...");
    let (scheduler_result, publisher_result) = tokio::join!(scheduler_run, publisher.run());
    scheduler_result.and(publisher_result)
}
