//! Protocol decoders: one per supported console family.
//!
//! Every decoder translates a single framed packet into the canonical
//! [`ControllerState`](crate::state::ControllerState). Decoders never
//! fail loudly: a packet whose length matches no recognized layout for
//! the family yields `None` and the caller drops it. Status lines and
//! partial frames are expected background noise on the wire, not errors.
//!
//! The host selects the decoder; nothing in here sniffs the stream to
//! guess which family it is looking at.

pub mod c64_mini;
pub mod gamecube;
pub mod genesis_mini;
pub mod neogeo_mini;
pub mod signal;
pub mod switch;
pub mod switch2;

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::state::ControllerState;

/// A packet decoder for one console family.
///
/// `decode` takes `&mut self` because one family (the GameCube keyboard
/// adapter) persists a small amount of state between calls; every other
/// decoder is a pure function over the packet bytes. Implementations
/// must be safe to drive from any thread, one packet at a time.
pub trait PacketDecoder: Send {
    /// Translate one packet. `None` means "ignore this packet".
    fn decode(&mut self, packet: &[u8]) -> Option<ControllerState>;

    /// The family this decoder understands.
    fn protocol(&self) -> Protocol;
}

/// Selector for the supported console families.
///
/// Serializable so configuration files can name the protocol a port
/// speaks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    C64Mini,
    GenesisMini,
    NeoGeoMini,
    /// Second-generation Neo Geo Mini firmware (ASCII-hex wire format).
    NeoGeoMini2,
    /// Switch Pro / Pokken over the bit-per-byte wire format.
    Switch,
    /// Second-generation Switch firmware (ASCII-hex wire format,
    /// Pro / Pokken / GameCube-adapter sub-variants).
    Switch2,
    GameCube,
}

impl Protocol {
    /// Construct a fresh decoder for this family.
    pub fn decoder(self) -> Box<dyn PacketDecoder> {
        match self {
            Protocol::C64Mini => Box::new(c64_mini::C64MiniDecoder),
            Protocol::GenesisMini => Box::new(genesis_mini::GenesisMiniDecoder),
            Protocol::NeoGeoMini => Box::new(neogeo_mini::NeoGeoMiniDecoder),
            Protocol::NeoGeoMini2 => Box::new(neogeo_mini::NeoGeoMini2Decoder),
            Protocol::Switch => Box::new(switch::SwitchDecoder),
            Protocol::Switch2 => Box::new(switch2::Switch2Decoder::new()),
            Protocol::GameCube => Box::new(gamecube::GameCubeDecoder::new()),
        }
    }
}

impl Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::C64Mini => write!(f, "C64 Mini"),
            Protocol::GenesisMini => write!(f, "Genesis Mini"),
            Protocol::NeoGeoMini => write!(f, "Neo Geo Mini"),
            Protocol::NeoGeoMini2 => write!(f, "Neo Geo Mini (hex)"),
            Protocol::Switch => write!(f, "Switch"),
            Protocol::Switch2 => write!(f, "Switch (hex)"),
            Protocol::GameCube => write!(f, "GameCube"),
        }
    }
}
