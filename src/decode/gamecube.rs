//! GameCube decoder family.
//!
//! Three wire layouts share one decoder: the 64-byte raw-bit packet
//! (56-byte variant with 4-bit triggers from older adapters), the 8-byte
//! compact encoding used by NicoHood-API adapters, and a 3-byte keyboard
//! packet from the ASCII keyboard controller.
//!
//! The keyboard adapter sniffs on its own serial port, so its keycodes
//! arrive on a different stream than the pad data. [`keyboard_pair`]
//! returns a pad decoder and a keyboard feed sharing one explicitly
//! owned keycode buffer: 3-byte packets on the feed update the buffer,
//! and every subsequent full-size pad decode reports which keys are
//! held. This is the only decoder state that survives across calls.

use std::sync::{Arc, Mutex};

use super::signal::{pack_byte_msb, stick_signed, trigger_ratio};
use super::{PacketDecoder, Protocol};
use crate::state::{ControllerState, ControllerStateBuilder};

const PACKET_SIZE: usize = 64;
const NICOHOOD_PACKET_SIZE: usize = 8;
const KEYBOARD_PACKET_SIZE: usize = 3;

const BUTTONS: [Option<&str>; 16] = [
    None,
    None,
    None,
    Some("start"),
    Some("y"),
    Some("x"),
    Some("b"),
    Some("a"),
    None,
    Some("l"),
    Some("r"),
    Some("z"),
    Some("up"),
    Some("down"),
    Some("right"),
    Some("left"),
];

// Button order for the NicoHood Nintendo API; each byte is reversed
// relative to BUTTONS. https://github.com/NicoHood/Nintendo
const NICOHOOD_BUTTONS: [Option<&str>; 16] = [
    Some("a"),
    Some("b"),
    Some("x"),
    Some("y"),
    Some("start"),
    None,
    None,
    None,
    Some("left"),
    Some("right"),
    Some("down"),
    Some("up"),
    Some("z"),
    Some("r"),
    Some("l"),
    None,
];

#[rustfmt::skip]
const KEYS: [Option<&str>; 112] = [
    None, None, None, None, None, None, Some("Home"), Some("End"),
    Some("PageUp"), Some("PageDown"), None, Some("ScrollLock"), None, None, None, None,
    Some("K_A"), Some("K_B"), Some("C"), Some("D"), Some("E"), Some("F"), Some("G"), Some("H"),
    Some("I"), Some("J"), Some("K"), Some("K_L"), Some("M"), Some("N"), Some("O"), Some("P"),
    Some("Q"), Some("K_R"), Some("S"), Some("T"), Some("U"), Some("V"), Some("W"), Some("K_X"),
    Some("K_Y"), Some("K_Z"), Some("D1"), Some("D2"), Some("D3"), Some("D4"), Some("D5"), Some("D6"),
    Some("D7"), Some("D8"), Some("D9"), Some("D0"), Some("Minus"), Some("Equals"), Some("Yen"), Some("LeftBracket"),
    Some("RightBracket"), Some("Semicolon"), Some("Apostrophe"), Some("LeftOfReturn"), Some("Comma"), Some("Period"), Some("Slash"), Some("JpSlash"),
    Some("F1"), Some("F2"), Some("F3"), Some("F4"), Some("F5"), Some("F6"), Some("F7"), Some("F8"),
    Some("F9"), Some("F10"), Some("F11"), Some("F12"), Some("Escape"), Some("Insert"), Some("Delete"), Some("Grave"),
    Some("Back"), Some("Tab"), None, Some("Capital"), Some("LeftShift"), Some("RightShift"), Some("LeftControl"), Some("LeftAlt"),
    Some("LeftWindowsKey"), Some("Space"), Some("RightWindowsKey"), Some("Applications"), Some("K_left"), Some("K_down"), Some("K_up"), Some("K_right"),
    None, Some("Return"), None, None, None, None, None, None,
    None, None, None, None, None, None, None, None,
];

/// Keycodes 6..=9 and 11 double as the Fn-shifted navigation cluster.
const FUNCTION_KEY_CODES: [u8; 5] = [6, 7, 8, 9, 11];

fn function_key(code: u8) -> bool {
    FUNCTION_KEY_CODES.contains(&code)
}

/// Last keycodes seen on the keyboard adapter stream.
#[derive(Debug, Default)]
struct KeyboardCodes {
    codes: [u8; 3],
}

fn key_name(code: u8) -> Option<&'static str> {
    KEYS.get(code as usize).copied().flatten()
}

fn apply_keys(builder: &mut ControllerStateBuilder, codes: &[u8]) {
    for name in KEYS.iter().flatten() {
        builder.set_button(name, false);
    }
    for &code in codes {
        if let Some(name) = key_name(code) {
            builder.set_button(name, true);
        }
    }

    builder.set_button("Function", false);
    for &code in codes {
        if function_key(code) {
            builder.set_button("Function", true);
        }
    }
}

/// Decoder for the pad data stream.
pub struct GameCubeDecoder {
    keyboard: Arc<Mutex<KeyboardCodes>>,
}

/// Decoder for the keyboard adapter stream paired with a
/// [`GameCubeDecoder`]. Never produces a state itself; it only stores
/// the keycodes for the pad decoder to report.
pub struct GameCubeKeyboardFeed {
    keyboard: Arc<Mutex<KeyboardCodes>>,
}

/// A pad decoder and keyboard feed sharing one keycode buffer. Use one
/// pair per physical keyboard adapter; pairs are never shared across
/// streams.
pub fn keyboard_pair() -> (GameCubeDecoder, GameCubeKeyboardFeed) {
    let keyboard = Arc::new(Mutex::new(KeyboardCodes::default()));
    (
        GameCubeDecoder {
            keyboard: Arc::clone(&keyboard),
        },
        GameCubeKeyboardFeed { keyboard },
    )
}

impl GameCubeDecoder {
    /// Standalone pad decoder with no keyboard adapter attached.
    pub fn new() -> Self {
        Self {
            keyboard: Arc::new(Mutex::new(KeyboardCodes::default())),
        }
    }

    fn decode_keyboard_packet(packet: &[u8]) -> ControllerState {
        let mut builder = ControllerStateBuilder::new();
        apply_keys(&mut builder, packet);
        builder.build()
    }

    fn decode_nicohood(packet: &[u8]) -> ControllerState {
        let mut builder = ControllerStateBuilder::new();

        for (i, name) in NICOHOOD_BUTTONS.iter().enumerate() {
            if let Some(name) = name {
                let bit = (packet[i / 8] >> (i % 8)) & 0x1;
                builder.set_button(name, bit != 0x00);
            }
        }

        builder.set_analog("lstick_x", stick_signed(packet[2]), i32::from(packet[2]));
        builder.set_analog("lstick_y", stick_signed(packet[3]), i32::from(packet[3]));
        builder.set_analog("cstick_x", stick_signed(packet[4]), i32::from(packet[4]));
        builder.set_analog("cstick_y", stick_signed(packet[5]), i32::from(packet[5]));
        builder.set_analog(
            "trig_l",
            trigger_ratio(packet[6], 256.0),
            i32::from(packet[6]),
        );
        builder.set_analog(
            "trig_r",
            trigger_ratio(packet[7], 256.0),
            i32::from(packet[7]),
        );

        builder.build()
    }

    fn decode_pad(&self, packet: &[u8]) -> ControllerState {
        let mut builder = ControllerStateBuilder::new();

        for (i, name) in BUTTONS.iter().enumerate() {
            if let Some(name) = name {
                builder.set_button(name, packet[i] != 0x00);
            }
        }

        {
            let keyboard = self.keyboard.lock().expect("keyboard buffer poisoned");
            apply_keys(&mut builder, &keyboard.codes);
        }

        let base = BUTTONS.len();
        let lstick_x = pack_byte_msb(packet, base, 8);
        let lstick_y = pack_byte_msb(packet, base + 8, 8);
        let cstick_x = pack_byte_msb(packet, base + 16, 8);
        let cstick_y = pack_byte_msb(packet, base + 24, 8);

        builder.set_analog("lstick_x", stick_signed(lstick_x), i32::from(lstick_x));
        builder.set_analog("lstick_y", stick_signed(lstick_y), i32::from(lstick_y));
        builder.set_analog("cstick_x", stick_signed(cstick_x), i32::from(cstick_x));
        builder.set_analog("cstick_y", stick_signed(cstick_y), i32::from(cstick_y));

        if packet.len() == PACKET_SIZE {
            let trig_l = pack_byte_msb(packet, base + 32, 8);
            let trig_r = pack_byte_msb(packet, base + 40, 8);
            builder.set_analog("trig_l", trigger_ratio(trig_l, 256.0), i32::from(trig_l));
            builder.set_analog("trig_r", trigger_ratio(trig_r, 256.0), i32::from(trig_r));
        } else {
            // Older adapters report 4-bit triggers.
            let trig_l = pack_byte_msb(packet, base + 32, 4);
            let trig_r = pack_byte_msb(packet, base + 36, 4);
            builder.set_analog("trig_l", trigger_ratio(trig_l, 15.0), i32::from(trig_l));
            builder.set_analog("trig_r", trigger_ratio(trig_r, 15.0), i32::from(trig_r));
        }

        builder.build()
    }
}

impl Default for GameCubeDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketDecoder for GameCubeDecoder {
    fn decode(&mut self, packet: &[u8]) -> Option<ControllerState> {
        if packet.len() == KEYBOARD_PACKET_SIZE {
            return Some(Self::decode_keyboard_packet(packet));
        }
        if packet.len() == NICOHOOD_PACKET_SIZE {
            return Some(Self::decode_nicohood(packet));
        }
        if packet.len() != PACKET_SIZE && packet.len() != PACKET_SIZE - 8 {
            return None;
        }
        Some(self.decode_pad(packet))
    }

    fn protocol(&self) -> Protocol {
        Protocol::GameCube
    }
}

impl PacketDecoder for GameCubeKeyboardFeed {
    fn decode(&mut self, packet: &[u8]) -> Option<ControllerState> {
        if packet.len() == KEYBOARD_PACKET_SIZE {
            let mut keyboard = self.keyboard.lock().expect("keyboard buffer poisoned");
            keyboard.codes.copy_from_slice(packet);
        }
        None
    }

    fn protocol(&self) -> Protocol {
        Protocol::GameCube
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pad_packet(pressed: &[usize], sticks: [u8; 4], triggers: [u8; 2]) -> Vec<u8> {
        let mut packet = vec![0u8; PACKET_SIZE];
        for &i in pressed {
            packet[i] = 1;
        }
        let fields = [
            sticks[0],
            sticks[1],
            sticks[2],
            sticks[3],
            triggers[0],
            triggers[1],
        ];
        for (field, &value) in fields.iter().enumerate() {
            for bit in 0..8 {
                packet[16 + field * 8 + bit] = (value >> (7 - bit)) & 0x1;
            }
        }
        packet
    }

    #[test]
    fn unrecognized_lengths_are_ignored() {
        let mut decoder = GameCubeDecoder::new();
        for len in [1, 2, 4, 7, 9, 55, 57, 63, 65] {
            assert!(decoder.decode(&vec![0u8; len]).is_none(), "len {len}");
        }
    }

    #[test]
    fn pad_buttons_and_analogs() {
        let mut decoder = GameCubeDecoder::new();
        let state = decoder
            .decode(&pad_packet(&[7, 3], [128, 255, 0, 128], [128, 0]))
            .unwrap();
        assert_eq!(state.button("a"), Some(true));
        assert_eq!(state.button("start"), Some(true));
        assert_eq!(state.button("b"), Some(false));
        assert_eq!(state.analog("lstick_x").unwrap().normalized, 0.0);
        assert_eq!(state.analog("lstick_y").unwrap().normalized, 127.0 / 128.0);
        assert_eq!(state.analog("cstick_x").unwrap().normalized, -1.0);
        assert_eq!(state.analog("trig_l").unwrap().normalized, 0.5);
        assert_eq!(state.analog("trig_r").unwrap().normalized, 0.0);
    }

    #[test]
    fn short_variant_scales_four_bit_triggers() {
        let mut decoder = GameCubeDecoder::new();
        let mut packet = vec![0u8; PACKET_SIZE - 8];
        // trig_l = 0b1111 -> fully pressed; trig_r stays 0.
        for bit in 48..52 {
            packet[bit] = 1;
        }
        let state = decoder.decode(&packet).unwrap();
        assert_eq!(state.analog("trig_l").unwrap().normalized, 1.0);
        assert_eq!(state.analog("trig_l").unwrap().raw, 15);
        assert_eq!(state.analog("trig_r").unwrap().normalized, 0.0);
    }

    #[test]
    fn keyboard_packet_reports_keys_by_code() {
        let mut decoder = GameCubeDecoder::new();
        let state = decoder.decode(&[0x10, 0x00, 0x00]).unwrap();
        // 0x10 is the letter key "K_A"; it is not part of the Fn cluster.
        assert_eq!(state.button("K_A"), Some(true));
        assert_eq!(state.button("K_B"), Some(false));
        assert_eq!(state.button("Function"), Some(false));
    }

    #[test]
    fn function_cluster_sets_the_function_key() {
        let mut decoder = GameCubeDecoder::new();
        let state = decoder.decode(&[0x06, 0x00, 0x00]).unwrap();
        assert_eq!(state.button("Home"), Some(true));
        assert_eq!(state.button("Function"), Some(true));
    }

    #[test]
    fn keyboard_feed_is_consumed_by_the_pad_decoder() {
        let (mut pad, mut feed) = keyboard_pair();

        // The feed itself never emits a state.
        assert!(feed.decode(&[0x10, 0x59, 0x00]).is_none());

        let state = pad.decode(&pad_packet(&[], [128; 4], [0, 0])).unwrap();
        assert_eq!(state.button("K_A"), Some(true));
        assert_eq!(state.button("Space"), Some(true));
        assert_eq!(state.button("Return"), Some(false));

        // A standalone decoder reports no held keys.
        let mut fresh = GameCubeDecoder::new();
        let state = fresh.decode(&pad_packet(&[], [128; 4], [0, 0])).unwrap();
        assert_eq!(state.button("K_A"), Some(false));
        assert_eq!(state.button("Space"), Some(false));
    }

    #[test]
    fn nicohood_packet_uses_reversed_button_order() {
        let mut decoder = GameCubeDecoder::new();
        let packet = [0x01, 0x10, 128, 128, 128, 128, 64, 0];
        let state = decoder.decode(&packet).unwrap();
        assert_eq!(state.button("a"), Some(true));
        assert_eq!(state.button("z"), Some(true));
        assert_eq!(state.button("b"), Some(false));
        assert_eq!(state.analog("trig_l").unwrap().normalized, 0.25);
    }
}
