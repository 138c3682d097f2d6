//! Serial packet framer.
//!
//! Turns the unbounded, arbitrarily chunked byte stream of a sniffing
//! microcontroller into discrete packets for one registered decoder:
//!
//! ```text
//! Serial port ──► SerialMonitor ──► PacketDecoder ──► ControllerEvent
//!                 (framing)         (per family)      (mpsc channel)
//! ```
//!
//! [`serial_monitor`] owns the receive buffer and the poll loop,
//! [`framing`] the delimiter / printer-sentinel extraction rules, and
//! [`transport`] the boundary to the actual serial port.

pub mod framing;
pub mod serial_monitor;
pub mod transport;

pub use serial_monitor::{MonitorError, MonitorHandle, MonitorSettings, SerialMonitor};
pub use transport::{SerialPortTransport, SerialTransport, TransportError};
