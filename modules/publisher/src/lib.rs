// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::position::FusedFix;
use module_core::{EventKind, Module, ModuleCtx};
use std::io::{self, Write};
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};

/// The publish boundary towards the drive-command subsystem.
///
/// Writes one JSON record `[latitude, longitude, heading]` per fused fix to its
/// sink. A missing heading is published as [`DEFAULT_HEADING`](common::position::DEFAULT_HEADING).
pub struct FixPublisher {
    ctx: ModuleCtx,
    sink: Box<dyn Write + Send>,
}

impl FixPublisher {
    pub fn new(ctx: ModuleCtx, sink: Box<dyn Write + Send>) -> Self {
        FixPublisher { ctx, sink }
    }

    fn write_record(&mut self, fix: &FusedFix) -> io::Result<()> {
        serde_json::to_writer(&mut self.sink, &fix.as_wire())?;
        self.sink.write_all(b"\n")?;
        self.sink.flush()
    }
}

#[async_trait::async_trait]
impl Module for FixPublisher {
    async fn run(&mut self) -> Result<(), ()> {
        info!("Fix publisher started");
        loop {
            match self.ctx.receiver.recv().await {
                Ok(event) => match event.kind {
                    EventKind::QuitEvent => break,
                    EventKind::FusedFixEvent(fix) => {
                        if let Err(e) = self.write_record(&fix) {
                            error!("Failed to publish {:?}. Error: {}", fix, e);
                        }
                    }
                    _ => {}
                },
                Err(RecvError::Lagged(missed)) => warn!("Fix publisher missed {} events", missed),
                Err(RecvError::Closed) => break,
            }
        }
        info!("Fix publisher stopped");
        Ok(())
    }
}
