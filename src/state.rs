//! Canonical controller state shared by every decoder and reader.
//!
//! Wire formats differ per console family, but everything downstream
//! (display layer, virtual-joystick mirror) consumes the same snapshot
//! model: named boolean buttons plus named analog axes carrying both a
//! normalized float and the raw wire sample.

use std::collections::HashMap;
use std::time::SystemTime;

/// One analog axis sample.
///
/// `normalized` is what drives logic ([-1, 1] for sticks, [0, 1] for
/// triggers); `raw` keeps the wire-level sample for diagnostic display.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AnalogAxis {
    pub normalized: f32,
    pub raw: i32,
}

/// Immutable controller snapshot.
///
/// A button missing from the map was not reported by the packet at all,
/// which is distinct from a button reported as released. Each decode
/// call produces a fresh instance; nothing mutates a built state.
#[derive(Clone, Debug)]
pub struct ControllerState {
    buttons: HashMap<String, bool>,
    analogs: HashMap<String, AnalogAxis>,
    timestamp: SystemTime,
}

impl ControllerState {
    /// Pressed state of a named button, or `None` if the packet did not
    /// report it.
    pub fn button(&self, name: &str) -> Option<bool> {
        self.buttons.get(name).copied()
    }

    pub fn analog(&self, name: &str) -> Option<AnalogAxis> {
        self.analogs.get(name).copied()
    }

    pub fn buttons(&self) -> &HashMap<String, bool> {
        &self.buttons
    }

    pub fn analogs(&self) -> &HashMap<String, AnalogAxis> {
        &self.analogs
    }

    /// When this snapshot was built.
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }
}

/// Write-only accumulator for building a [`ControllerState`].
///
/// Decoders set defaults first and override per special case (the D-pad
/// handling relies on last-write-wins), then hand the finished snapshot
/// to the caller with [`build`](Self::build).
#[derive(Debug, Default)]
pub struct ControllerStateBuilder {
    buttons: HashMap<String, bool>,
    analogs: HashMap<String, AnalogAxis>,
}

impl ControllerStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_button(&mut self, name: &str, pressed: bool) {
        self.buttons.insert(name.to_owned(), pressed);
    }

    pub fn set_analog(&mut self, name: &str, normalized: f32, raw: i32) {
        self.analogs.insert(name.to_owned(), AnalogAxis { normalized, raw });
    }

    pub fn build(self) -> ControllerState {
        ControllerState {
            buttons: self.buttons,
            analogs: self.analogs,
            timestamp: SystemTime::now(),
        }
    }
}

/// Notifications emitted by the serial monitor and the polled reader.
#[derive(Clone, Debug)]
pub enum ControllerEvent {
    /// A packet or poll sample decoded into a fresh snapshot.
    StateChange(ControllerState),
    /// The transport or device went away; the emitting instance has
    /// stopped itself and will not send anything further.
    Disconnected,
}
