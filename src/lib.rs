#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Bridge`**: Owns the collaborators and runs the poll loop (bus, inputs, script)
//! - **`Command`**: An opcode plus three argument bytes, from the bus or a script line
//! - **`dispatch`**: Applies a command to `RuntimeState` and returns the `Effect` to perform
//! - **`Datagram`**: The 8-byte checksummed packet sent over infrared
//! - **`IrTransmitter`**: Frames datagrams and short codes as timed carrier pulses
//! - **`ScriptPlayer`**: Tick-driven interpreter for stored scripts
//! - **`Repeats`** / **`JumpCondition`**: Repeat count and deferred jump, with their
//!   sentinels as variants
//! - **`BusListener`**, **`Storage`**, **`IrCarrier`**, **`InputSampler`**, **`TickSource`**:
//!   Traits to implement for your hardware
//!
//! Everything runs on one thread of control. Only the tick counter is shared
//! with an interrupt, through `TickCounter`.

#[macro_use]
mod fmt;

pub mod bridge;
pub mod bus;
pub mod colors;
pub mod config;
pub mod datagram;
pub mod dispatch;
pub mod inputs;
pub mod player;
pub mod protocol;
pub mod pulse;
pub mod repeater;
pub mod script;
pub mod state;
pub mod store;
pub mod tick;
pub mod types;

// Re-export Srgb from palette for script authoring
pub use palette::Srgb;

pub use bridge::Bridge;
pub use bus::{BusListener, BusRequest, PROTOCOL_VERSION};
pub use config::BridgeConfig;
pub use datagram::Datagram;
pub use dispatch::{Effect, Reply, dispatch};
pub use inputs::{DigitalInputs, InputSampler, NoInputs};
pub use player::ScriptPlayer;
pub use protocol::{IrTransmitter, Scheme};
pub use pulse::IrCarrier;
pub use repeater::IrRepeater;
pub use script::{Script, ScriptBuilder};
pub use state::{PlayerState, RuntimeState};
pub use store::{BootConfig, BootMode, RamStore, ScriptLayout, Storage};
pub use tick::{TickCounter, TickSource};
pub use types::{CarrierTiming, Command, JumpCondition, Repeats, ScriptError, ScriptLine};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn types_compile() {
        let _ = Repeats::Infinite;
        let _ = Repeats::Finite(1);
        let _ = JumpCondition::Disabled;
        let _ = PlayerState::Idle;
    }
}
