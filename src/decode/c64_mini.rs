//! THEC64 Mini joystick decoder.
//!
//! 58-byte bit-per-byte packets: two 8-bit axis fields at the front,
//! button bits at offsets 40..56. The joystick is digital; the analog
//! pair is derived from the axis bytes' position relative to center.

use super::signal::{ascii_bit, clamp_to_unit_circle, pack_byte_lsb};
use super::{PacketDecoder, Protocol};
use crate::state::{ControllerState, ControllerStateBuilder};

const PACKET_SIZE: usize = 58;
const POLISHED_PACKET_SIZE: usize = 28;

const BUTTONS: [Option<&str>; 16] = [
    None,
    None,
    None,
    None,
    Some("1"),
    Some("2"),
    Some("tl"),
    Some("tr"),
    Some("a"),
    Some("b"),
    Some("c"),
    Some("menu"),
    None,
    None,
    None,
    None,
];

pub struct C64MiniDecoder;

impl PacketDecoder for C64MiniDecoder {
    fn decode(&mut self, packet: &[u8]) -> Option<ControllerState> {
        if packet.len() < PACKET_SIZE {
            return None;
        }

        let mut polished = [0u8; POLISHED_PACKET_SIZE];
        for i in 40..56 {
            polished[i - 40] = ascii_bit(packet[i]);
        }
        for i in 0..2 {
            polished[16 + i] = pack_byte_lsb(&packet[i * 8..i * 8 + 8]);
        }

        let mut builder = ControllerStateBuilder::new();

        for (i, name) in BUTTONS.iter().enumerate() {
            if let Some(name) = name {
                builder.set_button(name, polished[i] != 0x00);
            }
        }

        builder.set_button("left", polished[16] < 0x7f);
        builder.set_button("right", polished[16] > 0x7f);
        builder.set_button("up", polished[17] < 0x7f);
        builder.set_button("down", polished[17] > 0x7f);

        let mut x = 0.0;
        let mut y = 0.0;
        if polished[16] > 0x7f {
            x = 1.0;
        } else if polished[16] < 0x7f {
            x = -1.0;
        }
        if polished[17] > 0x7f {
            y = -1.0;
        } else if polished[17] < 0x7f {
            y = 1.0;
        }
        let (x, y) = clamp_to_unit_circle(x, y);

        builder.set_analog("x", x, i32::from(polished[16]));
        builder.set_analog("y", y, i32::from(polished[17]));

        Some(builder.build())
    }

    fn protocol(&self) -> Protocol {
        Protocol::C64Mini
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Axis bytes are sent LSB-first as ASCII bits.
    fn wire_axis(value: u8) -> [u8; 8] {
        let mut bits = [0x30u8; 8];
        for (i, bit) in bits.iter_mut().enumerate() {
            if value & (1 << i) != 0 {
                *bit = 0x31;
            }
        }
        bits
    }

    fn packet(x: u8, y: u8, button_bits: [u8; 16]) -> Vec<u8> {
        let mut packet = vec![0x30u8; PACKET_SIZE];
        packet[0..8].copy_from_slice(&wire_axis(x));
        packet[8..16].copy_from_slice(&wire_axis(y));
        packet[40..56].copy_from_slice(&button_bits);
        packet
    }

    #[test]
    fn short_packet_is_ignored() {
        let mut decoder = C64MiniDecoder;
        assert!(decoder.decode(&[0x30; PACKET_SIZE - 1]).is_none());
    }

    #[test]
    fn centered_stick_reports_origin() {
        let mut decoder = C64MiniDecoder;
        let state = decoder.decode(&packet(0x7f, 0x7f, [0x30; 16])).unwrap();
        assert_eq!(state.analog("x").unwrap().normalized, 0.0);
        assert_eq!(state.analog("y").unwrap().normalized, 0.0);
        assert_eq!(state.button("left"), Some(false));
        assert_eq!(state.button("right"), Some(false));
    }

    #[test]
    fn diagonal_is_projected_onto_the_unit_circle() {
        let mut decoder = C64MiniDecoder;
        // Stick pushed right and up.
        let state = decoder.decode(&packet(0xff, 0x00, [0x30; 16])).unwrap();
        assert_eq!(state.button("right"), Some(true));
        assert_eq!(state.button("up"), Some(true));

        let x = state.analog("x").unwrap();
        let y = state.analog("y").unwrap();
        let magnitude = (x.normalized.powi(2) + y.normalized.powi(2)).sqrt();
        assert!((magnitude - 1.0).abs() < 1e-6);
        assert_eq!(x.raw, 0xff);
        assert_eq!(y.raw, 0x00);
    }

    #[test]
    fn fire_buttons_follow_the_name_table() {
        let mut decoder = C64MiniDecoder;
        let mut bits = [0x30u8; 16];
        bits[8] = 0x31; // "a"
        bits[11] = 0x31; // "menu"
        let state = decoder.decode(&packet(0x7f, 0x7f, bits)).unwrap();
        assert_eq!(state.button("a"), Some(true));
        assert_eq!(state.button("menu"), Some(true));
        assert_eq!(state.button("b"), Some(false));
        // Positions 0..4 carry no button in this family.
        assert_eq!(state.button(""), None);
    }
}
