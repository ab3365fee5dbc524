use algorithm::nmea::DialectKind;
use common::channel::ChannelId;
use gnss::serial_source::SerialConfig;
use std::time::Duration;

/// Startup settings of one receiver channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelConfig {
    pub id: ChannelId,
    pub serial: SerialConfig,
    pub dialect: DialectKind,
    /// Sentences written to the receiver once after opening it.
    pub init_sentences: Vec<String>,
}

/// Settings of the LIVE mode.
#[derive(Clone, Debug, PartialEq)]
pub struct LiveConfig {
    pub channels: Vec<ChannelConfig>,
    /// Cycle frequency, nominally 10 Hz.
    pub rate_hz: u32,
}

impl LiveConfig {
    /// Time between the start of two cycles. A rate of 0 is treated as 1 Hz.
    pub fn period(&self) -> Duration {
        Duration::from_secs(1) / self.rate_hz.max(1)
    }
}

/// Settings of the REPLAY mode.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReplayConfig {
    /// The channel whose log is replayed.
    pub channel: ChannelId,
    pub delay: Duration,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        ReplayConfig {
            channel: ChannelId::B,
            delay: Duration::from_secs(2),
        }
    }
}
