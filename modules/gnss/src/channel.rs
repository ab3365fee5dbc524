// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use crate::source::LineSource;
use algorithm::{coordinate::normalize, nmea::SentenceDialect};
use common::{channel::ChannelId, clock::Clock, error::NavError, position::Fix};
use std::sync::Arc;
use storage::FixWriter;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Result of one acquisition of a channel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChannelReading {
    pub channel: ChannelId,
    /// The accepted fix, `None` if the cycle yielded no fix.
    pub fix: Option<Fix>,
    /// The fix was accepted but could not be written to the log.
    pub persistence_failed: bool,
}

impl ChannelReading {
    pub fn no_fix(channel: ChannelId) -> Self {
        ChannelReading {
            channel,
            fix: None,
            persistence_failed: false,
        }
    }
}

/// The processing path of one receiver: read, parse, normalize and persist.
///
/// The channel exclusively owns its byte stream and the writer of its log.
pub struct ReceiverChannel {
    id: ChannelId,
    source: Box<dyn LineSource>,
    dialect: Box<dyn SentenceDialect>,
    writer: FixWriter,
    clock: Arc<dyn Clock>,
    device_lost: bool,
}

impl ReceiverChannel {
    pub fn new(
        id: ChannelId,
        source: Box<dyn LineSource>,
        dialect: Box<dyn SentenceDialect>,
        writer: FixWriter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        ReceiverChannel {
            id,
            source,
            dialect,
            writer,
            clock,
            device_lost: false,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Sends configuration sentences to the receiver, e.g. to select the
    /// reported sentences or the update rate.
    pub async fn configure(&mut self, sentences: &[String]) -> Result<(), NavError> {
        for sentence in sentences {
            self.source.write_line(sentence).await?;
            debug!("Channel {}: sent \"{}\"", self.id, sentence);
        }
        Ok(())
    }

    /// Reads the next line of the receiver, bounded by the read timeout.
    pub async fn read_line(&mut self) -> Result<String, NavError> {
        self.source.read_line().await
    }

    /// Turns the outcome of a read into the reading of this cycle.
    ///
    /// An accepted fix is appended to the log before it is returned. If the
    /// append fails the fix is still returned, flagged as not persisted.
    pub async fn accept(&mut self, line: Result<String, NavError>) -> ChannelReading {
        let lost = matches!(line, Err(NavError::DeviceUnavailable { .. }));
        let reported = self.device_lost && lost;
        self.device_lost = lost;
        let line = match line {
            Ok(line) => line,
            Err(e) if reported => {
                debug!("Channel {}: no fix. {}", self.id, e);
                return ChannelReading::no_fix(self.id);
            }
            Err(e) => {
                self.log_failure(&e, None);
                return ChannelReading::no_fix(self.id);
            }
        };
        let fix = match self.extract(&line) {
            Ok(fix) => fix,
            Err(e) => {
                self.log_failure(&e, Some(&line));
                return ChannelReading::no_fix(self.id);
            }
        };
        let persistence_failed = match self.writer.append(&fix).await {
            Ok(()) => false,
            Err(e) => {
                self.log_failure(&e, Some(&line));
                true
            }
        };
        ChannelReading {
            channel: self.id,
            fix: Some(fix),
            persistence_failed,
        }
    }

    /// Reads one line and processes it.
    pub async fn acquire(&mut self) -> ChannelReading {
        let line = self.read_line().await;
        self.accept(line).await
    }

    pub fn close(&mut self) {
        self.source.close();
    }

    fn extract(&self, line: &str) -> Result<Fix, NavError> {
        let raw = self
            .dialect
            .parse(line)
            .map_err(|e| NavError::MalformedSentence {
                line: line.to_owned(),
                reason: e.to_string(),
            })?;
        normalize(&raw, self.clock.now())
    }

    fn log_failure(&self, error: &NavError, line: Option<&str>) {
        let line = line.unwrap_or_default();
        match error {
            NavError::ReadTimeout(_) | NavError::MalformedSentence { .. } => {
                debug!("Channel {}: no fix. {}", self.id, error)
            }
            NavError::MalformedToken { .. }
            | NavError::OutOfRangeCoordinate { .. }
            | NavError::InvalidHeading(_) => {
                warn!("Channel {}: rejected \"{}\". {}", self.id, line, error)
            }
            NavError::DeviceUnavailable { .. } => {
                error!("Channel {}: device {} lost. {}", self.id, self.source.name(), error)
            }
            NavError::PersistenceFailure { .. } => {
                error!("Channel {}: fix of \"{}\" not persisted. {}", self.id, line, error)
            }
            NavError::StoreExhausted => debug!("Channel {}: {}", self.id, error),
        }
    }
}

/// Asks a channel task for one acquisition.
#[derive(Debug)]
pub struct CycleRequest {
    pub reply: oneshot::Sender<ChannelReading>,
}

/// Handle of a channel running as its own task.
pub struct ChannelHandle {
    id: ChannelId,
    requests: mpsc::Sender<CycleRequest>,
    task: tokio::task::JoinHandle<()>,
}

impl ChannelHandle {
    /// Spawns the task of `channel`. The task ends when `cancel` is triggered
    /// or the handle is dropped, closing the device on its way out.
    pub fn spawn(channel: ReceiverChannel, cancel: CancellationToken) -> Self {
        let id = channel.id();
        let (requests, receiver) = mpsc::channel(1);
        let task = tokio::spawn(channel_task(channel, receiver, cancel));
        ChannelHandle { id, requests, task }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Requests one acquisition and waits for its reading.
    ///
    /// A stopped task yields no fix.
    pub async fn acquire(&self) -> ChannelReading {
        let (reply, response) = oneshot::channel();
        if self.requests.send(CycleRequest { reply }).await.is_err() {
            return ChannelReading::no_fix(self.id);
        }
        response
            .await
            .unwrap_or_else(|_| ChannelReading::no_fix(self.id))
    }

    /// Waits until the task has closed its device.
    pub async fn join(self) {
        drop(self.requests);
        if let Err(e) = self.task.await {
            error!("Channel {} task failed. Error: {}", self.id, e);
        }
    }
}

async fn channel_task(
    mut channel: ReceiverChannel,
    mut requests: mpsc::Receiver<CycleRequest>,
    cancel: CancellationToken,
) {
    info!("Channel {} started", channel.id());
    loop {
        let request = tokio::select! {
            _ = cancel.cancelled() => break,
            request = requests.recv() => match request {
                Some(request) => request,
                None => break,
            },
        };
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            line = channel.read_line() => line,
        };
        // A started append always completes, the log never ends in a torn row.
        let reading = channel.accept(line).await;
        let _ = request.reply.send(reading);
    }
    channel.close();
    info!("Channel {} stopped", channel.id());
}
