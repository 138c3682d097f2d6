//! Byte-transport boundary consumed by the serial monitor.
//!
//! The monitor only needs a handful of operations from a serial
//! connection, so they live behind a trait: the real implementation
//! wraps a `serialport` handle, tests substitute scripted mocks.

use std::io::{self, Read};
use std::time::Duration;

use tracing::{debug, info};

/// Sniffing firmware talks at a fixed rate.
const BAUD_RATE: u32 = 115_200;

/// Upper bound on a single blocking read so a poll tick can never
/// stall the scheduler.
const READ_TIMEOUT: Duration = Duration::from_millis(10);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Failed to open port: {0}")]
    OpenError(String),

    #[error("Transport I/O failed: {0}")]
    IoError(String),
}

/// An open, already-configured byte-oriented serial connection.
///
/// All failures surface as [`TransportError`]; the monitor treats any
/// I/O error as a disconnect. `close` is infallible and idempotent so
/// it can race with an in-flight tick without further ceremony.
pub trait SerialTransport: Send {
    fn open(&mut self) -> Result<(), TransportError>;
    fn close(&mut self);
    fn is_open(&self) -> bool;
    /// Bytes currently available without blocking.
    fn bytes_to_read(&mut self) -> Result<usize, TransportError>;
    /// Bounded read into `buf`; returns the count actually read.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;
}

/// [`SerialTransport`] backed by a real serial port.
pub struct SerialPortTransport {
    port_name: String,
    port: Option<Box<dyn serialport::SerialPort>>,
}

impl SerialPortTransport {
    /// `port_name` may be a friendly name; everything after the first
    /// space is ignored.
    pub fn new(port_name: &str) -> Self {
        let port_name = port_name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_owned();
        Self {
            port_name,
            port: None,
        }
    }
}

impl SerialTransport for SerialPortTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        if self.port.is_some() {
            return Ok(());
        }

        info!("Opening serial port {} at {} baud", self.port_name, BAUD_RATE);
        let port = serialport::new(&self.port_name, BAUD_RATE)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| TransportError::OpenError(e.to_string()))?;
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!("Closed serial port {}", self.port_name);
        }
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn bytes_to_read(&mut self) -> Result<usize, TransportError> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| TransportError::IoError("port is not open".to_owned()))?;
        port.bytes_to_read()
            .map(|n| n as usize)
            .map_err(|e| TransportError::IoError(e.to_string()))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| TransportError::IoError("port is not open".to_owned()))?;
        match port.read(buf) {
            Ok(count) => Ok(count),
            // A timeout just means fewer bytes than expected this tick.
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(TransportError::IoError(e.to_string())),
        }
    }
}
