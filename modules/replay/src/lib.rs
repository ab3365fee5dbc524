// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::{channel::ChannelId, position::FusedFix};
use futures::{StreamExt, stream::BoxStream};
use std::{io, path::PathBuf, time::Duration};
use storage::{FixStore, read_log};
use tracing::info;

/// Re-emits the persisted fixes of one channel at a fixed cadence.
///
/// Every call of [`ReplayEngine::replay`] starts over at the first entry of the
/// log, the log itself is only read.
#[derive(Clone, Debug)]
pub struct ReplayEngine {
    log: PathBuf,
    delay: Duration,
}

impl ReplayEngine {
    /// Creates an engine replaying the log of `channel` with `delay` between
    /// two consecutive outputs.
    pub fn new(store: &FixStore, channel: ChannelId, delay: Duration) -> Self {
        ReplayEngine {
            log: store.log_path(channel),
            delay,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns the outputs of the log in persisted order.
    ///
    /// The first output is ready immediately, each further one `delay` after
    /// its predecessor. The stream ends after the last entry, an empty or
    /// missing log yields an empty stream.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors of reading the log.
    pub async fn replay(&self) -> io::Result<BoxStream<'static, FusedFix>> {
        let fixes = read_log(&self.log).await?;
        info!(
            "Replaying {} fixes of {} every {:?}",
            fixes.len(),
            self.log.to_string_lossy(),
            self.delay
        );
        let delay = self.delay;
        let outputs = futures::stream::iter(fixes.into_iter().enumerate()).then(
            move |(index, fix)| async move {
                if index > 0 {
                    tokio::time::sleep(delay).await;
                }
                FusedFix::from(fix)
            },
        );
        Ok(outputs.boxed())
    }
}
