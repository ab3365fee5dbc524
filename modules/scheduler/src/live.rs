// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::config::ChannelConfig;
use algorithm::fusion::{FusionPolicy, LatestFixes};
use common::{clock::Clock, error::NavError, position::FusionOutput};
use futures::future::join_all;
use gnss::{
    channel::{ChannelHandle, ChannelReading, ReceiverChannel},
    serial_source::SerialConfig,
    source::LineSource,
};
use module_core::{ChannelFix, EventKind, Module, ModuleCtx};
use std::{sync::Arc, time::Duration};
use storage::FixStore;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Opens the receiver channels of the LIVE mode.
///
/// A channel whose device can't be opened is left out and the remaining
/// channels run degraded. Configuration sentences that can't be written are
/// logged, the channel is used anyway.
///
/// # Errors
///
/// * [`NavError::DeviceUnavailable`] if no device could be opened.
/// * [`NavError::PersistenceFailure`] if the log of a channel can't be opened.
pub async fn open_channels<F>(
    configs: &[ChannelConfig],
    store: &FixStore,
    clock: Arc<dyn Clock>,
    open: F,
) -> Result<Vec<ReceiverChannel>, NavError>
where
    F: Fn(&SerialConfig) -> Result<Box<dyn LineSource>, NavError>,
{
    let mut channels = vec![];
    let mut last_error = None;
    for config in configs {
        let source = match open(&config.serial) {
            Ok(source) => source,
            Err(e) => {
                error!("Channel {} unavailable. Error: {}", config.id, e);
                last_error = Some(e);
                continue;
            }
        };
        let writer = store
            .open_writer(config.id)
            .await
            .map_err(|source| NavError::PersistenceFailure {
                channel: config.id,
                source,
            })?;
        let mut channel = ReceiverChannel::new(
            config.id,
            source,
            config.dialect.dialect(),
            writer,
            clock.clone(),
        );
        if let Err(e) = channel.configure(&config.init_sentences).await {
            warn!("Channel {} not configured. Error: {}", config.id, e);
        }
        channels.push(channel);
    }

    if channels.is_empty() {
        return Err(last_error.unwrap_or_else(|| NavError::DeviceUnavailable {
            path: String::new(),
            reason: "no receiver configured".to_owned(),
        }));
    }
    if channels.len() < configs.len() {
        warn!(
            "Running degraded on channel {}",
            channels
                .iter()
                .map(|c| c.id().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    Ok(channels)
}

/// Drives the receiver channels on a fixed cadence.
///
/// Every cycle requests one acquisition of every channel, waits for all
/// replies, fuses them and publishes the result. A cycle that yields no fix
/// publishes nothing. Ticks missed because of a slow cycle are delayed, not
/// caught up.
pub struct LiveScheduler {
    ctx: ModuleCtx,
    channels: Vec<ReceiverChannel>,
    policy: Box<dyn FusionPolicy>,
    period: Duration,
    cancel: CancellationToken,
}

impl LiveScheduler {
    pub fn new(
        ctx: ModuleCtx,
        channels: Vec<ReceiverChannel>,
        policy: Box<dyn FusionPolicy>,
        period: Duration,
    ) -> Self {
        LiveScheduler {
            ctx,
            channels,
            policy,
            period,
            cancel: CancellationToken::new(),
        }
    }

    fn publish_cycle(&self, readings: &[ChannelReading]) {
        let mut latest = LatestFixes::default();
        for reading in readings {
            latest.set(reading.channel, reading.fix);
            if let Some(fix) = reading.fix {
                self.publish(EventKind::ChannelFixEvent(Arc::new(ChannelFix {
                    channel: reading.channel,
                    fix,
                })));
            }
            if reading.persistence_failed {
                self.publish(EventKind::PersistenceFailureEvent(reading.channel));
            }
        }
        match self.policy.fuse(&latest) {
            FusionOutput::Fix(fused) => self.publish(EventKind::FusedFixEvent(Arc::new(fused))),
            FusionOutput::NoFix => debug!("No fix in this cycle"),
        }
    }

    fn publish(&self, kind: EventKind) {
        if let Err(e) = self.ctx.publish_event(kind) {
            warn!("Failed to publish {:?}", e.0.kind);
        }
    }
}

#[async_trait::async_trait]
impl Module for LiveScheduler {
    async fn run(&mut self) -> Result<(), ()> {
        let handles: Vec<ChannelHandle> = std::mem::take(&mut self.channels)
            .into_iter()
            .map(|channel| ChannelHandle::spawn(channel, self.cancel.child_token()))
            .collect();
        info!(
            "Live scheduler started with {} channels every {:?}",
            handles.len(),
            self.period
        );

        let mut cadence = tokio::time::interval(self.period);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Delay);
        'cycles: loop {
            tokio::select! {
                () = self.ctx.wait_for_quit() => break 'cycles,
                _ = cadence.tick() => {
                    let readings = tokio::select! {
                        readings = join_all(handles.iter().map(ChannelHandle::acquire)) => readings,
                        () = self.ctx.wait_for_quit() => break 'cycles,
                    };
                    self.publish_cycle(&readings);
                }
            }
        }

        self.cancel.cancel();
        for handle in handles {
            handle.join().await;
        }
        info!("Live scheduler stopped");
        Ok(())
    }
}
