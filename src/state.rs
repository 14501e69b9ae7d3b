//! Process-wide mutable registers shared by the dispatcher and the script player.

use crate::config::BridgeConfig;
use crate::types::{CarrierTiming, JumpCondition, Repeats};

/// Default unit address of outgoing datagrams.
pub const DEFAULT_PEER_ADDR: u8 = 0x09;

/// Default group address of outgoing datagrams (0 = all).
pub const DEFAULT_FREEM_ADDR: u8 = 0x00;

/// Observable state of the script player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlayerState {
    /// No script playing.
    Idle,
    /// Counting down the current line's duration.
    Playing,
    /// Suspended by a `w` command.
    Waiting,
}

/// Runtime registers. One instance lives for the whole process.
///
/// The tick counter is not stored here; it belongs to the interrupt and is
/// reached through a [`TickSource`](crate::tick::TickSource).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RuntimeState {
    /// Group address of outgoing datagrams.
    pub freem_addr: u8,
    /// Unit address of outgoing datagrams.
    pub peer_addr: u8,

    /// Carrier timer top value.
    pub ir_period: u8,
    /// Carrier timer compare value.
    pub ir_duty: u8,
    /// Clock used to convert `#` frequencies.
    pub clock_hz: u32,

    pub script_id: u8,
    /// Index of the current line; `< script_len` while playing.
    pub script_position: u8,
    /// Line count of the current script; 0 = not playing.
    pub script_len: u8,
    pub script_repeats: Repeats,
    /// Wait units left; nonzero suspends line advancement.
    pub wait_ticks_remaining: u16,

    /// Signed adjustment applied to every line duration at load time.
    pub time_adjustment: i8,

    pub conditional_jump: JumpCondition,
    pub sampled_inputs: [u8; 4],
}

impl RuntimeState {
    /// Creates the boot-time state for the given hardware.
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            freem_addr: DEFAULT_FREEM_ADDR,
            peer_addr: DEFAULT_PEER_ADDR,
            ir_period: config.carrier.period,
            ir_duty: config.carrier.duty,
            clock_hz: config.clock_hz,
            script_id: 0,
            script_position: 0,
            script_len: 0,
            script_repeats: Repeats::Infinite,
            wait_ticks_remaining: 0,
            time_adjustment: 0,
            conditional_jump: JumpCondition::Disabled,
            sampled_inputs: [0; 4],
        }
    }

    /// Current carrier timing.
    #[inline]
    pub fn carrier_timing(&self) -> CarrierTiming {
        CarrierTiming::new(self.ir_period, self.ir_duty)
    }

    /// Raw repeat byte: 0 = infinite.
    #[inline]
    pub fn script_repeats_left(&self) -> u8 {
        self.script_repeats.raw()
    }

    /// Moves the script position by a signed offset.
    ///
    /// The offset is relative to the line after the current one, so the
    /// position lands one short of the target and the next advance completes it.
    pub fn jump_relative(&mut self, offset: u8) {
        self.script_position = self
            .script_position
            .wrapping_add(offset.wrapping_sub(1));
    }

    /// Returns the player state derived from the registers.
    pub fn player_state(&self) -> PlayerState {
        if self.script_len == 0 {
            PlayerState::Idle
        } else if self.wait_ticks_remaining > 0 {
            PlayerState::Waiting
        } else {
            PlayerState::Playing
        }
    }

    /// Returns true if a script is playing or waiting.
    pub fn is_playing(&self) -> bool {
        self.script_len != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boot_state_is_idle_with_default_carrier() {
        let state = RuntimeState::new(&BridgeConfig::default());
        assert_eq!(state.player_state(), PlayerState::Idle);
        assert_eq!(state.carrier_timing(), CarrierTiming::new(210, 70));
        assert_eq!(state.peer_addr, 0x09);
    }

    #[test]
    fn jump_relative_is_signed() {
        let mut state = RuntimeState::new(&BridgeConfig::default());
        state.script_position = 4;
        state.jump_relative((-2i8) as u8);
        assert_eq!(state.script_position, 1);
        state.jump_relative(3);
        assert_eq!(state.script_position, 3);
    }

    #[test]
    fn waiting_only_while_playing() {
        let mut state = RuntimeState::new(&BridgeConfig::default());
        state.wait_ticks_remaining = 5;
        assert_eq!(state.player_state(), PlayerState::Idle);
        state.script_len = 2;
        assert_eq!(state.player_state(), PlayerState::Waiting);
    }
}
