//! Polled-input reader for OS-level game controllers.
//!
//! Instead of sniffing a console bus over serial, this reader asks the
//! host's controller API for one of up to four device slots on a fixed
//! period and feeds the same canonical state model. The slot query is a
//! boundary trait so tests (and other backends) can stand in for the
//! real one, which adapts `gilrs`.
//!
//! Polling begins at spawn and a failed query is terminal: the reader
//! emits `Disconnected` once and stops. Resuming a slot means
//! constructing a fresh reader.

use gilrs::{Axis, Button, Gilrs};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::mirror::{MirrorAxis, NullJoystick, VirtualJoystick};
use crate::state::{ControllerEvent, ControllerState, ControllerStateBuilder};

/// The controller API exposes at most four slots.
pub const SLOT_COUNT: usize = 4;

// XINPUT_GAMEPAD button mask bits.
const MASK_DPAD_UP: u16 = 0x0001;
const MASK_DPAD_DOWN: u16 = 0x0002;
const MASK_DPAD_LEFT: u16 = 0x0004;
const MASK_DPAD_RIGHT: u16 = 0x0008;
const MASK_START: u16 = 0x0010;
const MASK_BACK: u16 = 0x0020;
const MASK_LEFT_THUMB: u16 = 0x0040;
const MASK_RIGHT_THUMB: u16 = 0x0080;
const MASK_LEFT_SHOULDER: u16 = 0x0100;
const MASK_RIGHT_SHOULDER: u16 = 0x0200;
const MASK_A: u16 = 0x1000;
const MASK_B: u16 = 0x2000;
const MASK_X: u16 = 0x4000;
const MASK_Y: u16 = 0x8000;

/// One gamepad sample in the fixed layout the controller API returns:
/// a button bitmask, two signed 16-bit stick pairs, two 8-bit triggers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct XInputSample {
    pub buttons: u16,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
    pub left_trigger: u8,
    pub right_trigger: u8,
}

/// Query-by-slot boundary over the OS controller API. `None` means the
/// slot holds no device right now.
pub trait GamepadPoller: Send {
    fn poll_slot(&mut self, slot: usize) -> Option<XInputSample>;
}

/// Slots that currently hold a device.
pub fn connected_slots(poller: &mut dyn GamepadPoller) -> Vec<usize> {
    (0..SLOT_COUNT)
        .filter(|&slot| poller.poll_slot(slot).is_some())
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum XInputError {
    #[error("Failed to initialize controller backend: {0}")]
    InitializationError(String),
}

/// [`GamepadPoller`] backed by gilrs.
pub struct GilrsPoller {
    gilrs: Gilrs,
}

impl GilrsPoller {
    pub fn new() -> Result<Self, XInputError> {
        info!("Initializing gilrs controller interface");
        let gilrs =
            Gilrs::new().map_err(|e| XInputError::InitializationError(e.to_string()))?;
        Ok(Self { gilrs })
    }
}

impl GamepadPoller for GilrsPoller {
    fn poll_slot(&mut self, slot: usize) -> Option<XInputSample> {
        // gilrs only refreshes cached state while its event queue is
        // drained.
        while self.gilrs.next_event().is_some() {}

        let (_, gamepad) = self.gilrs.gamepads().nth(slot)?;
        if !gamepad.is_connected() {
            return None;
        }

        let mut buttons = 0u16;
        let mapping = [
            (Button::South, MASK_A),
            (Button::East, MASK_B),
            (Button::North, MASK_Y),
            (Button::West, MASK_X),
            (Button::Start, MASK_START),
            (Button::Select, MASK_BACK),
            (Button::LeftThumb, MASK_LEFT_THUMB),
            (Button::RightThumb, MASK_RIGHT_THUMB),
            (Button::LeftTrigger, MASK_LEFT_SHOULDER),
            (Button::RightTrigger, MASK_RIGHT_SHOULDER),
            (Button::DPadUp, MASK_DPAD_UP),
            (Button::DPadDown, MASK_DPAD_DOWN),
            (Button::DPadLeft, MASK_DPAD_LEFT),
            (Button::DPadRight, MASK_DPAD_RIGHT),
        ];
        for (button, mask) in mapping {
            if gamepad.is_pressed(button) {
                buttons |= mask;
            }
        }

        let stick = |axis: Axis| (gamepad.value(axis).clamp(-1.0, 1.0) * 32767.0) as i16;
        let trigger =
            |axis: Axis| (gamepad.value(axis).clamp(0.0, 1.0) * 255.0) as u8;

        Some(XInputSample {
            buttons,
            thumb_lx: stick(Axis::LeftStickX),
            thumb_ly: stick(Axis::LeftStickY),
            thumb_rx: stick(Axis::RightStickX),
            thumb_ry: stick(Axis::RightStickY),
            left_trigger: trigger(Axis::LeftZ),
            right_trigger: trigger(Axis::RightZ),
        })
    }
}

/// Configuration for one reader instance.
#[derive(Clone, Debug)]
pub struct XInputSettings {
    /// Which device slot to poll.
    pub slot: usize,

    /// Poll period in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for XInputSettings {
    fn default() -> Self {
        Self {
            slot: 0,
            poll_interval_ms: 30,
        }
    }
}

/// Build the canonical state from one sample and mirror it into the
/// virtual joystick.
pub fn decode_sample(
    sample: &XInputSample,
    mirror: &mut dyn VirtualJoystick,
) -> ControllerState {
    let mut builder = ControllerStateBuilder::new();
    let pressed = |mask: u16| sample.buttons & mask != 0;

    builder.set_button("a", pressed(MASK_A));
    mirror.set_button(2, pressed(MASK_A));
    builder.set_button("b", pressed(MASK_B));
    mirror.set_button(4, pressed(MASK_B));
    builder.set_button("x", pressed(MASK_X));
    mirror.set_button(1, pressed(MASK_X));
    builder.set_button("y", pressed(MASK_Y));
    mirror.set_button(3, pressed(MASK_Y));

    let up = pressed(MASK_DPAD_UP);
    let right = pressed(MASK_DPAD_RIGHT);
    let down = pressed(MASK_DPAD_DOWN);
    let left = pressed(MASK_DPAD_LEFT);
    builder.set_button("up", up);
    builder.set_button("down", down);
    builder.set_button("left", left);
    builder.set_button("right", right);
    mirror.set_pov(crate::decode::signal::pov_direction(up, right, down, left));

    builder.set_button("start", pressed(MASK_START));
    mirror.set_button(10, pressed(MASK_START));
    builder.set_button("back", pressed(MASK_BACK));
    mirror.set_button(9, pressed(MASK_BACK));
    builder.set_button("l3", pressed(MASK_LEFT_THUMB));
    mirror.set_button(11, pressed(MASK_LEFT_THUMB));
    builder.set_button("r3", pressed(MASK_RIGHT_THUMB));
    mirror.set_button(12, pressed(MASK_RIGHT_THUMB));
    builder.set_button("l", pressed(MASK_LEFT_SHOULDER));
    mirror.set_button(5, pressed(MASK_LEFT_SHOULDER));
    builder.set_button("r", pressed(MASK_RIGHT_SHOULDER));
    mirror.set_button(6, pressed(MASK_RIGHT_SHOULDER));

    let lstick_x = f32::from(sample.thumb_lx) / 32768.0;
    builder.set_analog("lstick_x", lstick_x, i32::from(sample.thumb_lx));
    mirror.set_axis(MirrorAxis::X, lstick_x);
    let lstick_y = f32::from(sample.thumb_ly) / 32768.0;
    builder.set_analog("lstick_y", lstick_y, i32::from(sample.thumb_ly));
    mirror.set_axis(MirrorAxis::Y, lstick_y);
    let rstick_x = f32::from(sample.thumb_rx) / 32768.0;
    builder.set_analog("rstick_x", rstick_x, i32::from(sample.thumb_rx));
    mirror.set_axis(MirrorAxis::Z, rstick_x);
    let rstick_y = f32::from(sample.thumb_ry) / 32768.0;
    builder.set_analog("rstick_y", rstick_y, i32::from(sample.thumb_ry));
    mirror.set_axis(MirrorAxis::Zr, rstick_y);

    let trig_l = f32::from(sample.left_trigger) / 255.0;
    builder.set_analog("trig_l", trig_l, i32::from(sample.left_trigger));
    mirror.set_axis(MirrorAxis::Xr, trig_l);
    builder.set_button("trig_l_d", trig_l > 0.0);
    mirror.set_button(7, trig_l > 0.0);
    let trig_r = f32::from(sample.right_trigger) / 255.0;
    builder.set_analog("trig_r", trig_r, i32::from(sample.right_trigger));
    mirror.set_axis(MirrorAxis::Yr, trig_r);
    builder.set_button("trig_r_d", trig_r > 0.0);
    mirror.set_button(8, trig_r > 0.0);

    builder.build()
}

/// Handle for a polled reader running as a tokio task.
pub struct XInputReaderHandle {
    cancel: CancellationToken,
}

impl XInputReaderHandle {
    /// Begin polling immediately. The task runs until the slot stops
    /// answering, the host drops the receiver, or [`stop`](Self::stop)
    /// is called.
    pub fn spawn(
        poller: Box<dyn GamepadPoller>,
        settings: Option<XInputSettings>,
        mirror: Option<Box<dyn VirtualJoystick>>,
        event_sender: mpsc::Sender<ControllerEvent>,
    ) -> Self {
        let settings = settings.unwrap_or_default();
        let mirror = mirror.unwrap_or_else(|| Box::new(NullJoystick));
        info!("Spawning polled reader with settings: {:?}", settings);

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            run_reader_loop(poller, settings, mirror, event_sender, token).await;
        });

        Self { cancel }
    }

    /// Stop polling. Safe to call repeatedly; emits no `Disconnected`
    /// notification.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

async fn run_reader_loop(
    mut poller: Box<dyn GamepadPoller>,
    settings: XInputSettings,
    mut mirror: Box<dyn VirtualJoystick>,
    event_sender: mpsc::Sender<ControllerEvent>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(tokio::time::Duration::from_millis(
        settings.poll_interval_ms,
    ));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Entering polled reader loop for slot {}", settings.slot);
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Polled reader stopped by host");
                break;
            }
            _ = interval.tick() => {
                let Some(sample) = poller.poll_slot(settings.slot) else {
                    warn!("Slot {} stopped answering, reader stopping", settings.slot);
                    if event_sender.send(ControllerEvent::Disconnected).await.is_err() {
                        warn!("Event receiver dropped before disconnect notification");
                    }
                    break;
                };

                debug!("Polled sample: {:?}", sample);
                let state = decode_sample(&sample, mirror.as_mut());
                if event_sender
                    .send(ControllerEvent::StateChange(state))
                    .await
                    .is_err()
                {
                    error!("Event receiver dropped, reader stopping");
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::recording::RecordingJoystick;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct ScriptedPoller {
        samples: Arc<Mutex<VecDeque<Option<XInputSample>>>>,
    }

    impl ScriptedPoller {
        fn push(&self, sample: Option<XInputSample>) {
            self.samples.lock().unwrap().push_back(sample);
        }
    }

    impl GamepadPoller for ScriptedPoller {
        fn poll_slot(&mut self, _slot: usize) -> Option<XInputSample> {
            // Past the end of the script the slot is empty.
            self.samples.lock().unwrap().pop_front().flatten()
        }
    }

    #[test]
    fn a_button_bit_maps_to_a() {
        let sample = XInputSample {
            buttons: 0x1000,
            ..XInputSample::default()
        };
        let state = decode_sample(&sample, &mut NullJoystick);

        assert_eq!(state.button("a"), Some(true));
        for name in [
            "b", "x", "y", "up", "down", "left", "right", "start", "back", "l3", "r3",
            "l", "r", "trig_l_d", "trig_r_d",
        ] {
            assert_eq!(state.button(name), Some(false), "button {name}");
        }
        for name in ["lstick_x", "lstick_y", "rstick_x", "rstick_y", "trig_l", "trig_r"] {
            assert_eq!(state.analog(name).unwrap().normalized, 0.0, "axis {name}");
        }
    }

    #[test]
    fn sticks_and_triggers_use_the_api_scale() {
        let sample = XInputSample {
            thumb_lx: -32768,
            thumb_ry: 16384,
            right_trigger: 255,
            ..XInputSample::default()
        };
        let state = decode_sample(&sample, &mut NullJoystick);

        assert_eq!(state.analog("lstick_x").unwrap().normalized, -1.0);
        assert_eq!(state.analog("lstick_x").unwrap().raw, -32768);
        assert_eq!(state.analog("rstick_y").unwrap().normalized, 0.5);
        assert_eq!(state.analog("trig_r").unwrap().normalized, 1.0);
        assert_eq!(state.button("trig_r_d"), Some(true));
        assert_eq!(state.button("trig_l_d"), Some(false));
    }

    #[test]
    fn mirror_receives_buttons_axes_and_pov() {
        let mirror = RecordingJoystick::default();
        let sample = XInputSample {
            buttons: 0x1000 | MASK_DPAD_UP | MASK_DPAD_RIGHT,
            left_trigger: 255,
            ..XInputSample::default()
        };
        decode_sample(&sample, &mut mirror.clone());

        let recorded = mirror.recorded();
        assert!(recorded.buttons.contains(&(2, true)));
        assert!(recorded.buttons.contains(&(7, true)));
        assert_eq!(recorded.povs, vec![1]);
        assert!(recorded
            .axes
            .contains(&(MirrorAxis::Xr, 1.0)));
    }

    #[test]
    fn connected_slots_reports_answering_slots() {
        struct EvenSlots;
        impl GamepadPoller for EvenSlots {
            fn poll_slot(&mut self, slot: usize) -> Option<XInputSample> {
                (slot % 2 == 0).then(XInputSample::default)
            }
        }
        assert_eq!(connected_slots(&mut EvenSlots), vec![0, 2]);
    }

    #[tokio::test]
    async fn reader_emits_states_then_one_disconnect() {
        let poller = ScriptedPoller::default();
        poller.push(Some(XInputSample {
            buttons: 0x1000,
            ..XInputSample::default()
        }));
        poller.push(None);

        let (tx, mut rx) = mpsc::channel(16);
        let settings = XInputSettings {
            slot: 0,
            poll_interval_ms: 1,
        };
        let _handle =
            XInputReaderHandle::spawn(Box::new(poller), Some(settings), None, tx);

        match rx.recv().await {
            Some(ControllerEvent::StateChange(state)) => {
                assert_eq!(state.button("a"), Some(true));
            }
            other => panic!("expected a state change, got {other:?}"),
        }
        assert!(matches!(rx.recv().await, Some(ControllerEvent::Disconnected)));
        // The task ended; the channel closes with no further events.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn manual_stop_is_silent() {
        struct AlwaysAnswering;
        impl GamepadPoller for AlwaysAnswering {
            fn poll_slot(&mut self, _slot: usize) -> Option<XInputSample> {
                Some(XInputSample::default())
            }
        }

        let (tx, mut rx) = mpsc::channel(16);
        let handle = XInputReaderHandle::spawn(Box::new(AlwaysAnswering), None, None, tx);
        // Consume whatever was emitted before the stop, then cancel.
        let _ = rx.recv().await;
        handle.stop();
        handle.stop();

        tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        while let Ok(event) = rx.try_recv() {
            assert!(
                !matches!(event, ControllerEvent::Disconnected),
                "manual stop must not report a disconnect"
            );
        }
    }
}
