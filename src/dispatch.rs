//! Command dispatch shared by the bus path and script playback.
//!
//! [`dispatch`] applies a command's state changes and describes the output it
//! requires as an [`Effect`]; the caller performs the output. Only a handful
//! of opcodes mean something to the bridge itself. Every other byte is an
//! opaque peripheral command forwarded inside a datagram.

use crate::datagram::Datagram;
use crate::state::RuntimeState;
use crate::types::{CarrierTiming, Command, JumpCondition, opcode};

/// Bytes returned to the bus master.
pub type Reply = heapless::Vec<u8, 4>;

/// Builds a reply from up to four bytes.
pub fn reply(bytes: &[u8]) -> Reply {
    let mut reply = Reply::new();
    for &b in bytes.iter().take(reply.capacity()) {
        let _ = reply.push(b);
    }
    reply
}

/// Output required by a handled command.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Effect {
    /// Nothing to emit.
    NoOutput,
    /// Datagram destination changed.
    SetAddress { freem_addr: u8, peer_addr: u8 },
    /// Carrier timing changed; applies from the next transmission.
    SetIrTiming(CarrierTiming),
    /// Continuous carrier on or off.
    SetIrEnable(bool),
    /// Send a 12-bit Sony code.
    SendRawCode(u16),
    /// Transmit a datagram.
    ForwardDatagram(Datagram),
    /// Reply to the bus master.
    ReturnValue(Reply),
    /// Own bus address changed and persisted.
    ChangeBusAddress(u8),
}

/// Applies `command` to `state` and returns the output it requires.
///
/// Every command except `w` clears a pending wait.
pub fn dispatch(command: Command, state: &mut RuntimeState) -> Effect {
    let Command { opcode: op, args } = command;
    debug!("dispatch {=u8:#x} {}", op, args);

    let effect = match op {
        opcode::SET_ADDRESS => {
            state.freem_addr = args[0];
            state.peer_addr = args[1];
            Effect::SetAddress {
                freem_addr: args[0],
                peer_addr: args[1],
            }
        }
        opcode::SET_IR_TIMING => {
            let freq = u16::from_be_bytes([args[0], args[1]]);
            match CarrierTiming::from_frequency(state.clock_hz, freq, args[2]) {
                Some(timing) => {
                    state.ir_period = timing.period;
                    state.ir_duty = timing.duty;
                    Effect::SetIrTiming(timing)
                }
                None => {
                    warn!("ignoring carrier timing {} Hz {}%", freq, args[2]);
                    Effect::NoOutput
                }
            }
        }
        opcode::IR_ENABLE => Effect::SetIrEnable(args[0] != 0),
        opcode::SEND_CODE => Effect::SendRawCode(u16::from_be_bytes([args[0], args[1]])),
        opcode::JUMP => {
            state.jump_relative(args[0]);
            Effect::NoOutput
        }
        opcode::INPUT_JUMP => {
            if let Some(index) = args[0].checked_sub(JumpCondition::INPUT_BASE) {
                let value = state.sampled_inputs.get(usize::from(index));
                if matches!(value, Some(&v) if v > args[1]) {
                    state.jump_relative(args[2]);
                }
            }
            Effect::NoOutput
        }
        opcode::ARM_INPUT_JUMP => {
            state.conditional_jump = JumpCondition::from_args(args);
            Effect::NoOutput
        }
        opcode::WAIT => {
            state.wait_ticks_remaining = u16::from_le_bytes([args[0], args[1]]);
            return Effect::NoOutput;
        }
        opcode::PLAY_COLORSPOT => Effect::ForwardDatagram(Datagram::play_colorspot(
            state.freem_addr,
            args[0],
            args[1],
        )),
        opcode::STOP => {
            // Stops local playback, then forwards like any peripheral command.
            state.script_len = 0;
            Effect::ForwardDatagram(Datagram::command(state.freem_addr, state.peer_addr, command))
        }
        _ => Effect::ForwardDatagram(Datagram::command(state.freem_addr, state.peer_addr, command)),
    };

    state.wait_ticks_remaining = 0;
    effect
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BridgeConfig;
    use crate::state::PlayerState;
    use crate::types::Repeats;

    fn state() -> RuntimeState {
        RuntimeState::new(&BridgeConfig::default())
    }

    fn forwarded(effect: Effect) -> [u8; 8] {
        match effect {
            Effect::ForwardDatagram(dg) => *dg.as_bytes(),
            other => panic!("expected datagram, got {:?}", other),
        }
    }

    #[test]
    fn set_address_then_fade_builds_generic_datagram() {
        let mut state = state();
        assert_eq!(
            dispatch(Command::new(b'@', [0x01, 0x09, 0]), &mut state),
            Effect::SetAddress {
                freem_addr: 0x01,
                peer_addr: 0x09
            }
        );

        let bytes = forwarded(dispatch(Command::new(b'c', [0xFF, 0x00, 0xFF]), &mut state));
        let sum = (0x55u32 + 0x01 + 0x09 + 0x63 + 0xFF + 0x00 + 0xFF) % 256;
        assert_eq!(bytes, [0x55, 0x01, 0x09, b'c', 0xFF, 0x00, 0xFF, sum as u8]);
    }

    #[test]
    fn play_colorspot_uses_marker_unit() {
        let mut state = state();
        state.freem_addr = 0x55;
        let bytes = forwarded(dispatch(Command::new(b'*', [3, b'c', 0x00]), &mut state));
        let sum = (0x55u32 + 0x55 + 0xFD + 3 + 0x63) % 256;
        assert_eq!(bytes, [0x55, 0x55, 0xFD, 3, b'c', 0x00, 0x00, sum as u8]);
    }

    #[test]
    fn wait_sets_little_endian_count() {
        let mut state = state();
        dispatch(Command::new(b'w', [0x10, 0x01, 0]), &mut state);
        assert_eq!(state.wait_ticks_remaining, 0x0110);
    }

    #[test]
    fn every_other_opcode_clears_wait() {
        for op in 0..=u8::MAX {
            if op == opcode::WAIT {
                continue;
            }
            let mut state = state();
            state.wait_ticks_remaining = 7;
            dispatch(Command::new(op, [1, 2, 3]), &mut state);
            assert_eq!(state.wait_ticks_remaining, 0, "opcode {:#x}", op);
        }
    }

    #[test]
    fn every_forwarded_datagram_has_valid_checksum() {
        for op in 0..=u8::MAX {
            let mut state = state();
            state.freem_addr = op;
            state.peer_addr = op.wrapping_mul(7);
            let command = Command::new(op, [op, 0xFF, 0x80]);
            if let Effect::ForwardDatagram(dg) = dispatch(command, &mut state) {
                assert!(dg.is_valid(), "opcode {:#x}", op);
            }
        }
    }

    #[test]
    fn stop_ends_playback_and_forwards() {
        let mut state = state();
        state.script_len = 4;
        state.script_repeats = Repeats::Finite(2);
        state.wait_ticks_remaining = 3;

        let bytes = forwarded(dispatch(Command::bare(b'O'), &mut state));
        assert_eq!(&bytes[..4], &[0x55, 0x00, 0x09, b'O']);
        assert_eq!(state.player_state(), PlayerState::Idle);
        assert_eq!(state.wait_ticks_remaining, 0);
    }

    #[test]
    fn ir_timing_converts_frequency() {
        let mut state = state();
        let effect = dispatch(Command::new(b'#', [0x94, 0x70, 100]), &mut state);
        // 38000 Hz
        assert_eq!(effect, Effect::SetIrTiming(CarrierTiming::new(209, 209)));
        assert_eq!(state.ir_period, 209);

        let before = state.carrier_timing();
        assert_eq!(dispatch(Command::new(b'#', [0, 0, 33]), &mut state), Effect::NoOutput);
        assert_eq!(state.carrier_timing(), before);
    }

    #[test]
    fn raw_code_and_carrier_enable() {
        let mut state = state();
        assert_eq!(
            dispatch(Command::new(b'$', [0x0A, 0x90, 0]), &mut state),
            Effect::SendRawCode(0x0A90)
        );
        assert_eq!(
            dispatch(Command::new(b'%', [1, 0, 0]), &mut state),
            Effect::SetIrEnable(true)
        );
        assert_eq!(
            dispatch(Command::new(b'%', [0, 0, 0]), &mut state),
            Effect::SetIrEnable(false)
        );
    }

    #[test]
    fn input_jump_requires_bus_input_above_threshold() {
        let mut state = state();
        state.script_position = 5;
        state.sampled_inputs = [0, 0x90, 0, 0];

        // input 1 (0x41) above 0x80: jump back 2
        dispatch(Command::new(b'i', [0x41, 0x80, (-2i8) as u8]), &mut state);
        assert_eq!(state.script_position, 2);

        // below threshold
        dispatch(Command::new(b'i', [0x41, 0x90, (-2i8) as u8]), &mut state);
        assert_eq!(state.script_position, 2);

        // inputs below 0x40 are not set
        dispatch(Command::new(b'i', [0x01, 0x00, 3]), &mut state);
        assert_eq!(state.script_position, 2);
    }

    #[test]
    fn arm_input_jump_stores_condition() {
        let mut state = state();
        dispatch(Command::new(b'I', [0x40, 0x10, 4]), &mut state);
        assert_eq!(
            state.conditional_jump,
            JumpCondition::Active {
                input: 0,
                threshold: 0x10,
                target: 4
            }
        );
    }

    #[test]
    fn reply_truncates_to_capacity() {
        assert_eq!(reply(&[1, 2, 3, 4, 5]).as_slice(), &[1, 2, 3, 4]);
    }
}
