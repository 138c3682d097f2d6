//! Switch decoder, second-generation ASCII-hex wire format.
//!
//! One decoder covers three sub-variants, discriminated by the raw line
//! length: 129 bytes for a Pro controller report, 17 for a Pokken pad,
//! 75 for the GameCube USB adapter. Pro reports carry a mode flag at
//! decoded offset 55 selecting between analog and digital triggers, and
//! their 12-bit stick fields arrive nibble-swizzled across byte pairs.
//!
//! This family also feeds the virtual-joystick mirror: button IDs map
//! through fixed vJoy tables, sticks onto the X/Y/Z/Zr axes and the
//! D-pad onto the POV hat.

use super::signal::{
    decode_hex, pov_direction, stick_centered, stick_signed, stick_wrapped,
};
use super::{PacketDecoder, Protocol};
use crate::mirror::{MirrorAxis, NullJoystick, VirtualJoystick};
use crate::state::{ControllerState, ControllerStateBuilder};

const PRO_PACKET_SIZE: usize = 129;
const POKKEN_PACKET_SIZE: usize = 17;
const GC_PACKET_SIZE: usize = 75;

const PRO_BUTTONS: [Option<&str>; 24] = [
    Some("y"),
    Some("x"),
    Some("b"),
    Some("a"),
    None,
    None,
    Some("r"),
    Some("zr"),
    Some("-"),
    Some("+"),
    Some("rs"),
    Some("ls"),
    Some("home"),
    Some("capture"),
    None,
    None,
    Some("down"),
    Some("up"),
    Some("right"),
    Some("left"),
    None,
    None,
    Some("l"),
    Some("zl"),
];

/// vJoy button IDs for [`PRO_BUTTONS`]; 0 means "not mirrored".
const PRO_BUTTONS_VJOY: [u32; 24] = [
    1, 4, 2, 3, 0, 0, 6, 8, 9, 10, 12, 11, 13, 14, 0, 0, 0, 0, 0, 0, 0, 0, 5, 7,
];

const POKKEN_BUTTONS: [Option<&str>; 16] = [
    Some("y"),
    Some("b"),
    Some("a"),
    Some("x"),
    Some("l"),
    Some("r"),
    Some("zl"),
    Some("zr"),
    Some("-"),
    Some("+"),
    None,
    None,
    Some("home"),
    Some("capture"),
    None,
    None,
];

const POKKEN_BUTTONS_VJOY: [u32; 16] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 0, 0, 13, 14, 0, 0];

const GC_BUTTONS: [Option<&str>; 16] = [
    Some("a"),
    Some("b"),
    Some("x"),
    Some("y"),
    Some("left"),
    Some("right"),
    Some("down"),
    Some("up"),
    Some("start"),
    Some("z"),
    Some("r"),
    Some("l"),
    None,
    None,
    None,
    None,
];

pub struct Switch2Decoder {
    mirror: Box<dyn VirtualJoystick>,
}

impl Switch2Decoder {
    pub fn new() -> Self {
        Self {
            mirror: Box::new(NullJoystick),
        }
    }

    /// Replace the no-op mirror with a real virtual-joystick sink.
    pub fn with_mirror(mirror: Box<dyn VirtualJoystick>) -> Self {
        Self { mirror }
    }

    fn decode_pro(&mut self, binary: &[u8]) -> Option<ControllerState> {
        if binary[0] != 0x30 {
            return None;
        }

        // Trailer validation: the report is padded with zeros whose
        // extent depends on the trigger mode flag at offset 55.
        if binary[55] == 1 {
            for i in 0..8 {
                if i != 0 && i != 4 && binary[binary.len() - i - 1] != 0x00 {
                    return None;
                }
            }
        } else {
            for i in 0..15 {
                if binary[binary.len() - i - 1] != 0x00 {
                    return None;
                }
            }
        }

        let mut builder = ControllerStateBuilder::new();
        for i in 0..3 {
            for j in 0..8 {
                let Some(name) = PRO_BUTTONS[i * 8 + j] else {
                    continue;
                };
                let pressed = binary[i + 3] & (1 << j) != 0x00;
                builder.set_button(name, pressed);
                let vjoy_id = PRO_BUTTONS_VJOY[i * 8 + j];
                if vjoy_id != 0 {
                    self.mirror.set_button(vjoy_id, pressed);
                }
            }
        }

        let up = binary[5] & (1 << 1) != 0x00;
        let right = binary[5] & (1 << 2) != 0x00;
        let down = binary[5] & (1 << 0) != 0x00;
        let left = binary[5] & (1 << 3) != 0x00;
        self.mirror.set_pov(pov_direction(up, right, down, left));

        // 12-bit stick fields, nibble-swizzled across byte pairs and
        // re-centered with +127 (the cast truncates like the wire's).
        let lstick_x_raw =
            ((i32::from(binary[7] & 0x0F) << 4) | (i32::from(binary[6] & 0xF0) >> 4)) + 127;
        let lstick_y_raw = i32::from(binary[8]) + 127;
        let rstick_x_raw =
            ((i32::from(binary[10] & 0x0F) << 4) | (i32::from(binary[9] & 0xF0) >> 4)) + 127;
        let rstick_y_raw = i32::from(binary[11]) + 127;

        let lstick_x = stick_wrapped(lstick_x_raw as u8);
        let lstick_y = stick_wrapped(lstick_y_raw as u8);
        let rstick_x = stick_wrapped(rstick_x_raw as u8);
        let rstick_y = stick_wrapped(rstick_y_raw as u8);

        builder.set_analog("lstick_x", lstick_x, lstick_x_raw);
        self.mirror.set_axis(MirrorAxis::X, lstick_x);
        builder.set_analog("lstick_y", lstick_y, lstick_y_raw);
        self.mirror.set_axis(MirrorAxis::Y, lstick_y);
        builder.set_analog("rstick_x", rstick_x, rstick_x_raw);
        self.mirror.set_axis(MirrorAxis::Z, rstick_x);
        builder.set_analog("rstick_y", rstick_y, rstick_y_raw);
        self.mirror.set_axis(MirrorAxis::Zr, rstick_y);

        if binary[55] == 1 {
            let r2 = f32::from(binary[63]) / 255.0;
            let l2 = f32::from(binary[59]) / 255.0;
            builder.set_analog("r2", r2, i32::from(binary[63]));
            self.mirror.set_axis(MirrorAxis::Yr, r2);
            builder.set_analog("l2", l2, i32::from(binary[59]));
            self.mirror.set_axis(MirrorAxis::Xr, l2);
        } else {
            let r2 = if binary[7] != 0 { 1.0 } else { 0.0 };
            let l2 = if binary[23] != 0 { 1.0 } else { 0.0 };
            builder.set_analog("r2", r2, if binary[7] != 0 { 255 } else { 0 });
            self.mirror.set_axis(MirrorAxis::Yr, r2);
            builder.set_analog("l2", l2, if binary[23] != 0 { 255 } else { 0 });
            self.mirror.set_axis(MirrorAxis::Xr, l2);
        }

        Some(builder.build())
    }

    fn decode_pokken(&mut self, binary: &[u8]) -> Option<ControllerState> {
        let mut builder = ControllerStateBuilder::new();
        for i in 0..2 {
            for j in 0..8 {
                let Some(name) = POKKEN_BUTTONS[i * 8 + j] else {
                    continue;
                };
                let pressed = binary[i] & (1 << j) != 0x00;
                builder.set_button(name, pressed);
                let vjoy_id = POKKEN_BUTTONS_VJOY[i * 8 + j];
                if vjoy_id != 0 {
                    self.mirror.set_button(vjoy_id, pressed);
                }
            }
        }

        builder.set_analog(
            "lstick_x",
            stick_centered(binary[3], false),
            i32::from(binary[3]),
        );
        self.mirror
            .set_axis(MirrorAxis::X, stick_centered(binary[3], false));
        builder.set_analog(
            "lstick_y",
            stick_centered(binary[4], true),
            i32::from(binary[4]),
        );
        self.mirror
            .set_axis(MirrorAxis::Y, stick_centered(binary[4], false));
        builder.set_analog(
            "rstick_x",
            stick_centered(binary[5], false),
            i32::from(binary[5]),
        );
        self.mirror
            .set_axis(MirrorAxis::Z, stick_centered(binary[5], false));
        builder.set_analog(
            "rstick_y",
            stick_centered(binary[6], true),
            i32::from(binary[6]),
        );
        self.mirror
            .set_axis(MirrorAxis::Zr, stick_centered(binary[6], false));

        let position = binary[2];
        self.mirror
            .set_pov(if position <= 7 { i32::from(position) } else { -1 });
        let _ = super::signal::apply_dpad(&mut builder, position);

        Some(builder.build())
    }

    fn decode_gc(&mut self, binary: &[u8]) -> Option<ControllerState> {
        let mut builder = ControllerStateBuilder::new();
        for i in 0..2 {
            for j in 0..8 {
                let Some(name) = GC_BUTTONS[i * 8 + j] else {
                    continue;
                };
                builder.set_button(name, binary[i + 2] & (1 << j) != 0x00);
            }
        }

        builder.set_analog("lstick_x", stick_signed(binary[4]), i32::from(binary[4]));
        builder.set_analog("lstick_y", stick_signed(binary[5]), i32::from(binary[5]));
        builder.set_analog("cstick_x", stick_signed(binary[6]), i32::from(binary[6]));
        builder.set_analog("cstick_y", stick_signed(binary[7]), i32::from(binary[7]));
        builder.set_analog("trig_l", stick_signed(binary[8]), i32::from(binary[8]));
        builder.set_analog("trig_r", stick_signed(binary[9]), i32::from(binary[9]));

        Some(builder.build())
    }
}

impl Default for Switch2Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketDecoder for Switch2Decoder {
    fn decode(&mut self, packet: &[u8]) -> Option<ControllerState> {
        if packet.len() < POKKEN_PACKET_SIZE {
            return None;
        }

        match packet.len() {
            PRO_PACKET_SIZE => {
                let binary = decode_hex(packet)?;
                (binary.len() == 64).then_some(())?;
                self.decode_pro(&binary)
            }
            POKKEN_PACKET_SIZE => {
                let binary = decode_hex(packet)?;
                (binary.len() == 8).then_some(())?;
                self.decode_pokken(&binary)
            }
            GC_PACKET_SIZE => {
                let binary = decode_hex(packet)?;
                (binary.len() == 37).then_some(())?;
                self.decode_gc(&binary)
            }
            _ => None,
        }
    }

    fn protocol(&self) -> Protocol {
        Protocol::Switch2
    }
}
