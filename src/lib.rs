//! retroprobe: normalized controller state from sniffed console buses.
//!
//! A serial-connected microcontroller relays the controller bus of a
//! retro console as a byte stream; this crate frames that stream into
//! packets, decodes each packet with a protocol-specific decoder into a
//! canonical named-button / named-axis snapshot, and hands snapshots to
//! the host over a channel. An alternative polled reader feeds the same
//! model from the OS game-controller API instead of a serial port.
//!
//! ```text
//! Serial port ──► monitor ──► decode ──► ControllerEvent ──► host
//! OS gamepad  ──► xinput  ─────────────► ControllerEvent ──► host
//!                              │
//!                              └──► mirror (virtual joystick, optional)
//! ```
//!
//! Rendering, port discovery, and settings dialogs live in the host
//! application, not here.

pub mod config;
pub mod decode;
pub mod mirror;
pub mod monitor;
pub mod state;
pub mod xinput;

pub use decode::{PacketDecoder, Protocol};
pub use monitor::{MonitorHandle, MonitorSettings, SerialPortTransport};
pub use state::{AnalogAxis, ControllerEvent, ControllerState, ControllerStateBuilder};
pub use xinput::{GilrsPoller, XInputReaderHandle, XInputSettings};
