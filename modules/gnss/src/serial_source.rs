use crate::source::LineSource;
use common::error::NavError;
use serialport::SerialPort;
use std::{
    io::{self, BufRead, BufReader, ErrorKind, Write},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Lines buffered between the reader thread and the channel.
const LINE_BUFFER: usize = 16;

/// Settings to open one serial receiver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyACM0`.
    pub path: String,
    pub baud_rate: u32,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
}

/// A [`LineSource`] reading from a serial port.
///
/// The blocking port is read by a dedicated thread which forwards complete
/// lines over a bounded channel, so an async read can be bounded and cancelled
/// without losing a partially received line.
pub struct SerialLineSource {
    path: String,
    read_timeout: Duration,
    write_timeout: Duration,
    lines: Option<mpsc::Receiver<io::Result<String>>>,
    writer: Option<Arc<Mutex<Box<dyn SerialPort>>>>,
    stop: Arc<AtomicBool>,
}

impl SerialLineSource {
    /// Opens the device and starts its reader thread.
    ///
    /// # Errors
    ///
    /// [`NavError::DeviceUnavailable`] if the port can't be opened.
    pub fn open(config: &SerialConfig) -> Result<Self, NavError> {
        let unavailable = |reason: String| NavError::DeviceUnavailable {
            path: config.path.clone(),
            reason,
        };
        let port = serialport::new(&config.path, config.baud_rate)
            .timeout(config.read_timeout)
            .open()
            .map_err(|e| unavailable(e.to_string()))?;
        let reader_port = port.try_clone().map_err(|e| unavailable(e.to_string()))?;

        let (sender, lines) = mpsc::channel(LINE_BUFFER);
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = stop.clone();
        let thread_path = config.path.clone();
        std::thread::Builder::new()
            .name(format!("serial {}", config.path))
            .spawn(move || read_lines(reader_port, &thread_path, sender, &thread_stop))
            .map_err(|e| unavailable(e.to_string()))?;

        info!(
            "Opened serial device {} with {} baud",
            config.path, config.baud_rate
        );
        Ok(SerialLineSource {
            path: config.path.clone(),
            read_timeout: config.read_timeout,
            write_timeout: config.write_timeout,
            lines: Some(lines),
            writer: Some(Arc::new(Mutex::new(port))),
            stop,
        })
    }

    /// Opens the device as a boxed [`LineSource`].
    pub fn open_boxed(config: &SerialConfig) -> Result<Box<dyn LineSource>, NavError> {
        Ok(Box::new(SerialLineSource::open(config)?))
    }

    fn closed(&self) -> NavError {
        NavError::DeviceUnavailable {
            path: self.path.clone(),
            reason: "device closed".to_owned(),
        }
    }
}

/// Reads complete lines until the device fails, the receiver is dropped or
/// `stop` is set.
///
/// A read timeout of the port keeps the partial line in the buffer, the line is
/// completed by the next read.
fn read_lines(
    port: Box<dyn SerialPort>,
    path: &str,
    sender: mpsc::Sender<io::Result<String>>,
    stop: &AtomicBool,
) {
    let mut reader = BufReader::new(port);
    let mut buffer = Vec::new();
    while !stop.load(Ordering::Relaxed) {
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => {
                let _ = sender.blocking_send(Err(io::Error::from(ErrorKind::UnexpectedEof)));
                break;
            }
            Ok(_) => {
                if !buffer.ends_with(b"\n") {
                    continue;
                }
                let line = String::from_utf8_lossy(&buffer).trim().to_owned();
                buffer.clear();
                if sender.blocking_send(Ok(line)).is_err() {
                    break;
                }
            }
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {}
            Err(e) => {
                warn!("Reading serial device {} failed. Error: {}", path, e);
                let _ = sender.blocking_send(Err(e));
                break;
            }
        }
    }
    debug!("Reader thread of {} stopped", path);
}

#[async_trait::async_trait]
impl LineSource for SerialLineSource {
    fn name(&self) -> &str {
        &self.path
    }

    async fn read_line(&mut self) -> Result<String, NavError> {
        let read_timeout = self.read_timeout;
        let Some(lines) = self.lines.as_mut() else {
            return Err(self.closed());
        };
        match tokio::time::timeout(read_timeout, lines.recv()).await {
            Err(_) => Err(NavError::ReadTimeout(read_timeout)),
            Ok(Some(Ok(line))) => Ok(line),
            Ok(Some(Err(e))) => Err(NavError::DeviceUnavailable {
                path: self.path.clone(),
                reason: e.to_string(),
            }),
            Ok(None) => Err(NavError::DeviceUnavailable {
                path: self.path.clone(),
                reason: "reader stopped".to_owned(),
            }),
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<(), NavError> {
        let Some(port) = self.writer.clone() else {
            return Err(self.closed());
        };
        let data = format!("{line}\r\n");
        let write_timeout = self.write_timeout;
        let written = tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut port = port.lock().unwrap_or_else(|e| e.into_inner());
            port.set_timeout(write_timeout)?;
            port.write_all(data.as_bytes())?;
            port.flush()
        })
        .await
        .map_err(io::Error::other)
        .and_then(|result| result);
        written.map_err(|e| NavError::DeviceUnavailable {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    fn close(&mut self) {
        if self.lines.is_none() {
            return;
        }
        self.stop.store(true, Ordering::Relaxed);
        self.lines = None;
        self.writer = None;
        info!("Closed serial device {}", self.path);
    }
}

impl Drop for SerialLineSource {
    fn drop(&mut self) {
        self.close();
    }
}
