use common::error::NavError;

/// A line oriented byte stream of one receiver.
///
/// Implementations bound every read by the read timeout they were opened with,
/// a silent device never blocks its caller longer than that.
#[async_trait::async_trait]
pub trait LineSource: Send {
    /// Human readable name of the device, used in log messages.
    fn name(&self) -> &str;

    /// Reads the next complete line without the line terminator.
    ///
    /// # Errors
    ///
    /// * [`NavError::ReadTimeout`] if no complete line arrived in time.
    /// * [`NavError::DeviceUnavailable`] if the device is gone or closed.
    async fn read_line(&mut self) -> Result<String, NavError>;

    /// Writes `line` followed by `\r\n` to the device.
    async fn write_line(&mut self, line: &str) -> Result<(), NavError>;

    /// Releases the device. Reads and writes fail afterwards.
    fn close(&mut self);
}
