use crate::source::LineSource;
use common::error::NavError;
use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

/// One reaction of a [`ScriptedSource`] to a read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScriptStep {
    /// The device delivers this line.
    Line(String),
    /// The device stays silent for the whole read timeout.
    Silence,
    /// The device disappears.
    Unplug,
}

/// A [`LineSource`] that replays a script instead of talking to a device.
///
/// Once the script is exhausted the source behaves like a silent device.
pub struct ScriptedSource {
    name: String,
    steps: VecDeque<ScriptStep>,
    read_timeout: Duration,
    probe: ScriptProbe,
}

/// Observes a [`ScriptedSource`] after it was moved into the code under test.
#[derive(Clone, Debug, Default)]
pub struct ScriptProbe {
    written: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl ScriptProbe {
    pub fn written(&self) -> Vec<String> {
        self.written.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl ScriptedSource {
    pub fn new(name: &str, steps: Vec<ScriptStep>, read_timeout: Duration) -> Self {
        ScriptedSource {
            name: name.to_owned(),
            steps: steps.into(),
            read_timeout,
            probe: ScriptProbe::default(),
        }
    }

    /// A source delivering the given lines one per read.
    pub fn from_lines(name: &str, lines: &[&str], read_timeout: Duration) -> Self {
        let steps = lines
            .iter()
            .map(|line| ScriptStep::Line(line.to_string()))
            .collect();
        ScriptedSource::new(name, steps, read_timeout)
    }

    pub fn probe(&self) -> ScriptProbe {
        self.probe.clone()
    }
}

#[async_trait::async_trait]
impl LineSource for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_line(&mut self) -> Result<String, NavError> {
        if self.probe.is_closed() {
            return Err(NavError::DeviceUnavailable {
                path: self.name.clone(),
                reason: "device closed".to_owned(),
            });
        }
        match self.steps.pop_front().unwrap_or(ScriptStep::Silence) {
            ScriptStep::Line(line) => Ok(line),
            ScriptStep::Silence => {
                tokio::time::sleep(self.read_timeout).await;
                Err(NavError::ReadTimeout(self.read_timeout))
            }
            ScriptStep::Unplug => Err(NavError::DeviceUnavailable {
                path: self.name.clone(),
                reason: "unplugged".to_owned(),
            }),
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<(), NavError> {
        self.probe
            .written
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_owned());
        Ok(())
    }

    fn close(&mut self) {
        self.probe.closed.store(true, Ordering::SeqCst);
    }
}
