//! Switch Pro / Pokken decoder, first-generation wire format.
//!
//! Bit-per-byte packets: 57 bytes for a Pro controller, 58 for a Pokken
//! pad. The two layouts share nothing but the encoding, so packet
//! length is the discriminator. Pokken reports its D-pad as a 4-bit
//! 8-way code and its sticks centered on 128 with Y flipped; the Pro
//! controller reports direction bits directly and wrap-around sticks.

use super::signal::{apply_dpad, ascii_bit, pack_byte_lsb, stick_centered, stick_wrapped};
use super::{PacketDecoder, Protocol};
use crate::state::{ControllerState, ControllerStateBuilder};

const PRO_PACKET_SIZE: usize = 57;
const POKKEN_PACKET_SIZE: usize = 58;
const POLISHED_PACKET_SIZE: usize = 28;

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

const POKKEN_BUTTONS: [Option<&str>; 14] = [
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
];

pub struct SwitchDecoder;

impl SwitchDecoder {
    fn decode_pro(packet: &[u8]) -> ControllerState {
        let mut polished = [0u8; POLISHED_PACKET_SIZE];
        for i in 0..24 {
            polished[i] = ascii_bit(packet[i]);
        }
        for i in 0..4 {
            polished[24 + i] = pack_byte_lsb(&packet[24 + i * 8..24 + i * 8 + 8]);
        }

        let mut builder = ControllerStateBuilder::new();
        for (i, name) in PRO_BUTTONS.iter().enumerate() {
            if let Some(name) = name {
                builder.set_button(name, polished[i] != 0x00);
            }
        }

        builder.set_analog("rstick_x", stick_wrapped(polished[26]), i32::from(polished[26]));
        builder.set_analog("rstick_y", stick_wrapped(polished[27]), i32::from(polished[27]));
        builder.set_analog("lstick_x", stick_wrapped(polished[24]), i32::from(polished[24]));
        builder.set_analog("lstick_y", stick_wrapped(polished[25]), i32::from(polished[25]));

        builder.build()
    }

    fn decode_pokken(packet: &[u8]) -> ControllerState {
        let mut polished = [0u8; POLISHED_PACKET_SIZE];
        for i in 0..16 {
            polished[i] = ascii_bit(packet[i]);
        }
        polished[16] = pack_byte_lsb(&packet[16..20]) & 0x0F;
        for i in 0..4 {
            polished[17 + i] = pack_byte_lsb(&packet[24 + i * 8..24 + i * 8 + 8]);
        }

        let mut builder = ControllerStateBuilder::new();
        for (i, name) in POKKEN_BUTTONS.iter().enumerate() {
            if let Some(name) = name {
                builder.set_button(name, polished[i] != 0x00);
            }
        }

        // Pokken pads have no analog D-pad mapping; only the direction
        // buttons are reported.
        let _ = apply_dpad(&mut builder, polished[16]);

        builder.set_analog(
            "lstick_x",
            stick_centered(polished[17], false),
            i32::from(polished[17]),
        );
        builder.set_analog(
            "lstick_y",
            stick_centered(polished[18], true),
            i32::from(polished[18]),
        );
        builder.set_analog(
            "rstick_x",
            stick_centered(polished[19], false),
            i32::from(polished[19]),
        );
        builder.set_analog(
            "rstick_y",
            stick_centered(polished[20], true),
            i32::from(polished[20]),
        );

        builder.build()
    }
}

impl PacketDecoder for SwitchDecoder {
    fn decode(&mut self, packet: &[u8]) -> Option<ControllerState> {
        if packet.len() < PRO_PACKET_SIZE {
            return None;
        }

        match packet.len() {
            PRO_PACKET_SIZE => Some(Self::decode_pro(packet)),
            POKKEN_PACKET_SIZE => Some(Self::decode_pokken(packet)),
            _ => None,
        }
    }

    fn protocol(&self) -> Protocol {
        Protocol::Switch
    }
}
