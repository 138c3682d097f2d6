//! Neo Geo Mini decoders.
//!
//! First-generation firmware sends 25-byte bit-per-byte packets;
//! second-generation firmware sends the same fields ASCII-hex encoded
//! in 22-byte lines. Both report the stick as an 8-way D-pad code that
//! is mapped onto the analog unit circle for display.

use super::signal::{apply_dpad, decode_hex, pack_byte_lsb, BIT_SET};
use super::{PacketDecoder, Protocol};
use crate::state::{ControllerState, ControllerStateBuilder};

const PACKET_SIZE: usize = 25;
const HEX_PACKET_SIZE: usize = 22;

const BUTTONS: [Option<&str>; 12] = [
    Some("A"),
    Some("B"),
    Some("G1"),
    Some("C"),
    Some("D"),
    Some("G2"),
    Some("W1"),
    Some("W2"),
    None,
    Some("options"),
    Some("select"),
    Some("start"),
];

fn apply_stick(builder: &mut ControllerStateBuilder, position: u8) {
    let (x, y) = apply_dpad(builder, position);
    builder.set_analog("lstick_x", x, 0);
    builder.set_analog("lstick_y", y, 0);
}

/// First-generation (bit-per-byte) wire format.
pub struct NeoGeoMiniDecoder;

impl PacketDecoder for NeoGeoMiniDecoder {
    fn decode(&mut self, packet: &[u8]) -> Option<ControllerState> {
        if packet.len() < PACKET_SIZE {
            return None;
        }

        let mut builder = ControllerStateBuilder::new();
        for (i, name) in BUTTONS.iter().enumerate() {
            if let Some(name) = name {
                builder.set_button(name, packet[i] == BIT_SET);
            }
        }

        let position = pack_byte_lsb(&packet[16..20]) & 0x0F;
        apply_stick(&mut builder, position);

        Some(builder.build())
    }

    fn protocol(&self) -> Protocol {
        Protocol::NeoGeoMini
    }
}

/// Second-generation (ASCII-hex) wire format.
pub struct NeoGeoMini2Decoder;

impl PacketDecoder for NeoGeoMini2Decoder {
    fn decode(&mut self, packet: &[u8]) -> Option<ControllerState> {
        if packet.len() < HEX_PACKET_SIZE {
            return None;
        }

        let binary = decode_hex(packet)?;
        if binary.len() * 8 < BUTTONS.len() {
            return None;
        }

        let mut builder = ControllerStateBuilder::new();
        for (i, name) in BUTTONS.iter().enumerate() {
            if let Some(name) = name {
                builder.set_button(name, binary[i / 8] & (1 << (i % 8)) != 0);
            }
        }

        let position = binary.get(2)? & 0x0F;
        apply_stick(&mut builder, position);

        Some(builder.build())
    }

    fn protocol(&self) -> Protocol {
        Protocol::NeoGeoMini2
    }
}
