// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

use common::error::NavError;
use futures::StreamExt;
use module_core::{EventKind, Module, ModuleCtx};
use replay::ReplayEngine;
use std::sync::Arc;
use tracing::{error, info};

/// Publishes the outputs of a [`ReplayEngine`] as fused fixes.
///
/// After the last output a [`EventKind::ReplayCompleteEvent`] is published and
/// the scheduler idles until it is told to quit.
pub struct ReplayScheduler {
    ctx: ModuleCtx,
    engine: ReplayEngine,
}

impl ReplayScheduler {
    pub fn new(ctx: ModuleCtx, engine: ReplayEngine) -> Self {
        ReplayScheduler { ctx, engine }
    }
}

#[async_trait::async_trait]
impl Module for ReplayScheduler {
    async fn run(&mut self) -> Result<(), ()> {
        let mut outputs = match self.engine.replay().await {
            Ok(outputs) => outputs,
            Err(e) => {
                error!("Failed to read the replay log. Error: {}", e);
                return Err(());
            }
        };
        let mut replaying = true;
        loop {
            tokio::select! {
                () = self.ctx.wait_for_quit() => break,
                output = outputs.next(), if replaying => {
                    let kind = match output {
                        Some(fused) => EventKind::FusedFixEvent(Arc::new(fused)),
                        None => {
                            replaying = false;
                            info!("Replay complete, {}", NavError::StoreExhausted);
                            EventKind::ReplayCompleteEvent
                        }
                    };
                    if let Err(e) = self.ctx.publish_event(kind) {
                        error!("Failed to publish {:?}", e.0.kind);
                    }
                }
            }
        }
        info!("Replay scheduler stopped");
        Ok(())
    }
}
