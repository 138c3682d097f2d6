//! Virtual-joystick mirror boundary.
//!
//! Some decoders and the polled reader forward a subset of their
//! normalized values into an OS-level virtual joystick so other
//! applications can consume the sniffed controller as a real device.
//! The mirror is a best-effort side channel: it is injected as a trait
//! object, defaults to a no-op, and can never affect the canonical
//! [`ControllerState`](crate::state::ControllerState) output.

/// Axes of the virtual device, in the axis order virtual-pad drivers
/// conventionally expose (X/Y left stick, Z/Zr right stick, Xr/Yr
/// triggers).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MirrorAxis {
    X,
    Y,
    Z,
    Zr,
    Xr,
    Yr,
}

/// Injected capability for mirroring state into a virtual joystick.
///
/// Implementations wrap whatever driver is available on the platform.
/// Buttons are addressed by the driver's numeric IDs, axes by
/// [`MirrorAxis`], and the POV hat by an 8-way direction code
/// (0..=7 clockwise from up) or -1 for centered.
pub trait VirtualJoystick: Send {
    fn set_button(&mut self, id: u32, pressed: bool);
    fn set_axis(&mut self, axis: MirrorAxis, value: f32);
    fn set_pov(&mut self, direction: i32);
}

/// Mirror that discards everything. Used when no virtual device is
/// wanted and as the default injection.
#[derive(Debug, Default)]
pub struct NullJoystick;

impl VirtualJoystick for NullJoystick {
    fn set_button(&mut self, _id: u32, _pressed: bool) {}
    fn set_axis(&mut self, _axis: MirrorAxis, _value: f32) {}
    fn set_pov(&mut self, _direction: i32) {}
}

#[cfg(test)]
pub(crate) mod recording {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, Default)]
    pub(crate) struct Recorded {
        pub buttons: Vec<(u32, bool)>,
        pub axes: Vec<(MirrorAxis, f32)>,
        pub povs: Vec<i32>,
    }

    /// Test mirror that records every call it receives. Clones share
    /// the same log, so a test can keep one handle while the decoder
    /// owns the other.
    #[derive(Clone, Debug, Default)]
    pub(crate) struct RecordingJoystick {
        inner: Arc<Mutex<Recorded>>,
    }

    impl RecordingJoystick {
        pub(crate) fn recorded(&self) -> Recorded {
            self.inner.lock().unwrap().clone()
        }
    }

    impl VirtualJoystick for RecordingJoystick {
        fn set_button(&mut self, id: u32, pressed: bool) {
            self.inner.lock().unwrap().buttons.push((id, pressed));
        }

        fn set_axis(&mut self, axis: MirrorAxis, value: f32) {
            self.inner.lock().unwrap().axes.push((axis, value));
        }

        fn set_pov(&mut self, direction: i32) {
            self.inner.lock().unwrap().povs.push(direction);
        }
    }
}
