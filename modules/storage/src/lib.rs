// SPDX-FileCopyrightText: 2025 All contributors
//
// SPDX-License-Identifier: GPL-2.0-or-later

//! Storage Modul for the positioning pipeline
//!
//! Provides the append-only, per-channel fix log that is the ground truth for
//! replay and audit.

use chrono::{DateTime, Utc};
use common::{channel::ChannelId, error::NavError, position::Fix, serde::timestamp};
use serde::{Deserialize, Serialize};
use std::{
    fs::DirBuilder,
    io::{self, ErrorKind, SeekFrom},
    path::{Path, PathBuf},
};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, info, warn};

/// One persisted row: `latitude,longitude,heading,observed_at`.
///
/// The heading field is empty if the receiver reported none, the observation
/// time is stored as decimal seconds since the Unix epoch.
#[derive(Debug, Serialize, Deserialize)]
struct FixRecord {
    latitude: f64,
    longitude: f64,
    heading: Option<f64>,
    #[serde(with = "timestamp")]
    observed_at: DateTime<Utc>,
}

impl From<&Fix> for FixRecord {
    fn from(fix: &Fix) -> Self {
        FixRecord {
            latitude: fix.latitude(),
            longitude: fix.longitude(),
            heading: fix.heading(),
            observed_at: fix.observed_at(),
        }
    }
}

/// A file system based store of the fix logs of all channels.
///
/// Every channel has its own human-readable CSV log
/// `<root_dir>/gps_data_<channel>.csv`. Rows are only ever appended, there is
/// no update or delete.
///
/// ## Important
///
/// Writing is done through a [`FixWriter`] which is exclusively owned by the
/// processing path of one channel. **Only one writer should exist per channel
/// and `root_dir` at any time**, the store does not lock the log files.
#[derive(Clone, Debug)]
pub struct FixStore {
    root_dir: PathBuf,
}

impl FixStore {
    /// Opens the store in `root_dir`, creating the folder if needed.
    ///
    /// # Errors
    ///
    /// Propagates the I/O error if the folder can't be created. The caller
    /// treats this as a fatal storage initialization failure.
    pub fn new(root_dir: &Path) -> io::Result<Self> {
        DirBuilder::new().recursive(true).create(root_dir)?;
        info!("Using fix storage folder: {}", root_dir.to_string_lossy());
        Ok(FixStore {
            root_dir: root_dir.to_path_buf(),
        })
    }

    /// Path of the log file of `channel`.
    pub fn log_path(&self, channel: ChannelId) -> PathBuf {
        let mut file_path = self.root_dir.clone();
        file_path.push(format!("gps_data_{channel}"));
        file_path.set_extension("csv");
        file_path
    }

    /// Opens the log of `channel` for appending, creating it if needed.
    ///
    /// A last row torn by a crash is terminated first, so the next appended
    /// row starts on a line of its own.
    pub async fn open_writer(&self, channel: ChannelId) -> io::Result<FixWriter> {
        let path = self.log_path(channel);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .await?;
        terminate_torn_row(&mut file, &path).await?;
        debug!(
            "Opened fix log {} of channel {channel} for appending",
            path.to_string_lossy()
        );
        Ok(FixWriter {
            channel,
            path,
            file,
        })
    }

    /// Returns every fix appended to the log of `channel`, in append order.
    ///
    /// See [`read_log`] for the handling of damaged rows.
    pub async fn read_all(&self, channel: ChannelId) -> io::Result<Vec<Fix>> {
        read_log(&self.log_path(channel)).await
    }
}

/// The exclusive append handle for the log of one channel.
///
/// Appends take `&mut self`, so appends of one channel are serialized in
/// arrival order, while writers of different channels never wait on each other.
#[derive(Debug)]
pub struct FixWriter {
    channel: ChannelId,
    path: PathBuf,
    file: tokio::fs::File,
}

impl FixWriter {
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Durably appends `fix` to the log.
    ///
    /// The record is written in a single call and synced to disk before the
    /// function returns, nothing is buffered across calls.
    ///
    /// # Errors
    ///
    /// [`NavError::PersistenceFailure`] if encoding, writing or syncing fails.
    /// The fix itself stays valid and may still be used by the caller.
    pub async fn append(&mut self, fix: &Fix) -> Result<(), NavError> {
        let persist = async {
            let record = encode_record(fix)?;
            self.file.write_all(&record).await?;
            self.file.flush().await?;
            self.file.sync_data().await
        };
        persist.await.map_err(|source| NavError::PersistenceFailure {
            channel: self.channel,
            source,
        })?;
        debug!(
            "Appended fix {:?} to {}",
            fix,
            self.path.to_string_lossy()
        );
        Ok(())
    }
}

async fn terminate_torn_row(file: &mut tokio::fs::File, path: &Path) -> io::Result<()> {
    let len = file.metadata().await?.len();
    if len == 0 {
        return Ok(());
    }
    file.seek(SeekFrom::Start(len - 1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    if last[0] != b'\n' {
        warn!(
            "Fix log {} ends with a torn row, terminating it",
            path.to_string_lossy()
        );
        file.write_all(b"\n").await?;
        file.flush().await?;
        file.sync_data().await?;
    }
    Ok(())
}

fn encode_record(fix: &Fix) -> io::Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(vec![]);
    writer.serialize(FixRecord::from(fix)).map_err(io::Error::other)?;
    writer
        .into_inner()
        .map_err(|e| io::Error::other(e.to_string()))
}

/// Reads a fix log written by a [`FixWriter`].
///
/// A missing file is an empty log. Rows that can't be decoded, e.g. a torn
/// last line after a power loss, or that violate the [`Fix`] invariants are
/// skipped and logged, a position is never fabricated from them.
///
/// # Errors
///
/// Propagates I/O errors other than [`ErrorKind::NotFound`].
pub async fn read_log(path: &Path) -> io::Result<Vec<Fix>> {
    let content = match tokio::fs::read(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No fix log found in {}", path.to_string_lossy());
            return Ok(vec![]);
        }
        Err(e) => return Err(e),
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_slice());
    let mut fixes = vec![];
    for (row, record) in reader.deserialize::<FixRecord>().enumerate() {
        let fix = match record {
            Ok(record) => Fix::new(
                record.latitude,
                record.longitude,
                record.heading,
                record.observed_at,
            ),
            Err(e) => {
                warn!(
                    "Skipping undecodable row {} of {}. Error: {}",
                    row + 1,
                    path.to_string_lossy(),
                    e
                );
                continue;
            }
        };
        match fix {
            Ok(fix) => fixes.push(fix),
            Err(e) => warn!(
                "Skipping invalid row {} of {}. Error: {}",
                row + 1,
                path.to_string_lossy(),
                e
            ),
        }
    }
    debug!(
        "Read {} fixes from {}",
        fixes.len(),
        path.to_string_lossy()
    );
    Ok(fixes)
}
