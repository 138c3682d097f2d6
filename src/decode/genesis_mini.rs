//! Genesis / Mega Drive Mini decoder.
//!
//! 58-byte bit-per-byte packets. The first four polished bits identify
//! the pad type: all ones is a 3-button pad, all zeros a 6-button pad,
//! anything else is noise. The two pad types report different button
//! name tables and slightly different D-pad center values.

use super::signal::{ascii_bit, pack_byte_lsb};
use super::{PacketDecoder, Protocol};
use crate::state::{ControllerState, ControllerStateBuilder};

const PACKET_SIZE: usize = 58;
const POLISHED_PACKET_SIZE: usize = 28;

const THREE_BUTTONS: [Option<&str>; 16] = [
    None,
    None,
    None,
    None,
    Some("y"),
    Some("b"),
    Some("a"),
    Some("x"),
    Some("z"),
    Some("c"),
    None,
    None,
    Some("mode"),
    Some("start"),
    None,
    None,
];

const SIX_BUTTONS: [Option<&str>; 16] = [
    None,
    None,
    None,
    None,
    Some("x"),
    Some("a"),
    Some("b"),
    Some("y"),
    Some("c"),
    Some("z"),
    Some("l"),
    Some("r"),
    Some("mode"),
    Some("start"),
    None,
    None,
];

pub struct GenesisMiniDecoder;

impl PacketDecoder for GenesisMiniDecoder {
    fn decode(&mut self, packet: &[u8]) -> Option<ControllerState> {
        if packet.len() < PACKET_SIZE {
            return None;
        }

        let mut polished = [0u8; POLISHED_PACKET_SIZE];
        for i in 40..56 {
            polished[i - 40] = ascii_bit(packet[i]);
        }
        for i in 0..2 {
            polished[16 + i] = pack_byte_lsb(&packet[24 + i * 8..24 + i * 8 + 8]);
        }

        if polished[..4] == [1, 1, 1, 1] {
            let mut builder = ControllerStateBuilder::new();
            for (i, name) in THREE_BUTTONS.iter().enumerate() {
                if let Some(name) = name {
                    builder.set_button(name, polished[i] != 0x00);
                }
            }

            builder.set_button("left", polished[16] < 0x7f);
            builder.set_button("right", polished[16] > 0x7f);
            builder.set_button("up", polished[17] < 0x7f);
            builder.set_button("down", polished[17] > 0x7f);
            Some(builder.build())
        } else if polished[..4] == [0, 0, 0, 0] {
            let mut builder = ControllerStateBuilder::new();
            for (i, name) in SIX_BUTTONS.iter().enumerate() {
                if let Some(name) = name {
                    builder.set_button(name, polished[i] != 0x00);
                }
            }

            builder.set_button("left", polished[16] < 0x80);
            builder.set_button("right", polished[16] > 0x80);
            builder.set_button("up", polished[17] < 0x80);
            builder.set_button("down", polished[17] > 0x80);
            Some(builder.build())
        } else {
            None
        }
    }

    fn protocol(&self) -> Protocol {
        Protocol::GenesisMini
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire_axis(value: u8) -> [u8; 8] {
        let mut bits = [0x30u8; 8];
        for (i, bit) in bits.iter_mut().enumerate() {
            if value & (1 << i) != 0 {
                *bit = 0x31;
            }
        }
        bits
    }

    fn packet(pad_probe: u8, x: u8, y: u8, button_bits: &[(usize, u8)]) -> Vec<u8> {
        let mut packet = vec![0x30u8; PACKET_SIZE];
        packet[24..32].copy_from_slice(&wire_axis(x));
        packet[32..40].copy_from_slice(&wire_axis(y));
        for i in 0..4 {
            packet[40 + i] = pad_probe;
        }
        for &(index, value) in button_bits {
            packet[40 + index] = value;
        }
        packet
    }

    #[test]
    fn three_button_pad_uses_its_own_table() {
        let mut decoder = GenesisMiniDecoder;
        let state = decoder
            .decode(&packet(0x31, 0x7f, 0x7f, &[(6, 0x31)]))
            .unwrap();
        // Position 6 is "a" on a 3-button pad.
        assert_eq!(state.button("a"), Some(true));
        assert_eq!(state.button("b"), Some(false));
        // 6-button-only names are not reported.
        assert_eq!(state.button("l"), None);
    }

    #[test]
    fn six_button_pad_uses_its_own_table() {
        let mut decoder = GenesisMiniDecoder;
        let state = decoder
            .decode(&packet(0x30, 0x80, 0x80, &[(10, 0x31)]))
            .unwrap();
        assert_eq!(state.button("l"), Some(true));
        assert_eq!(state.button("r"), Some(false));
        assert_eq!(state.button("left"), Some(false));
        assert_eq!(state.button("right"), Some(false));
    }

    #[test]
    fn mixed_probe_bits_are_noise() {
        let mut decoder = GenesisMiniDecoder;
        let mut packet = packet(0x30, 0x80, 0x80, &[]);
        packet[40] = 0x31;
        assert!(decoder.decode(&packet).is_none());
    }

    #[test]
    fn directions_follow_the_center_thresholds() {
        let mut decoder = GenesisMiniDecoder;
        let state = decoder.decode(&packet(0x31, 0xff, 0x00, &[])).unwrap();
        assert_eq!(state.button("right"), Some(true));
        assert_eq!(state.button("up"), Some(true));
        assert_eq!(state.button("left"), Some(false));
        assert_eq!(state.button("down"), Some(false));
    }
}
