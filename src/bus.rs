//! Incoming command bus: the listener trait and request decoding.
//!
//! A request is one opcode byte followed by a fixed number of argument bytes.
//! Opcodes the bus does not know are dropped without reading arguments.

use crate::datagram::{DATAGRAM_LEN, Datagram};
use crate::types::{Command, opcode};

/// Reply to [`opcode::GET_VERSION`].
pub const PROTOCOL_VERSION: [u8; 2] = [b'b', b'b'];

/// Guard bytes of an address-change request: `{addr, 0xD0, 0x0D, addr}`.
pub const ADDRESS_GUARD: [u8; 2] = [0xD0, 0x0D];

/// Trait for abstracting the bus slave transceiver.
///
/// Implement this for your I2C (or similar) slave peripheral. Handle any
/// hardware errors internally - these methods cannot fail.
pub trait BusListener {
    /// Returns true if at least one received byte is buffered.
    fn has_data(&mut self) -> bool;

    /// Returns the next received byte. May block until one arrives.
    fn receive_byte(&mut self) -> u8;

    /// Queues a byte for the master to read.
    fn transmit_byte(&mut self, byte: u8);

    /// Re-initialises the slave at a new address.
    fn set_address(&mut self, address: u8);
}

/// A decoded bus request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusRequest {
    /// Handled by the shared dispatcher, same as a script line.
    Dispatch(Command),
    /// Transmit eight bytes verbatim.
    RawDatagram(Datagram),
    /// Store a colour at a peer colorspot.
    SetColorspot { position: u8, rgb: [u8; 3] },
    /// Reply with the stored bus address.
    QueryAddress,
    /// Change the bus address if the guard bytes match.
    SetBusAddress([u8; 4]),
    /// Reply with [`PROTOCOL_VERSION`].
    QueryVersion,
    /// Start a stored script.
    PlayScript { id: u8, repeats: u8, position: u8 },
    /// Reply with a stored script's length and repeat count.
    QueryScript { id: u8 },
    /// Reply with the four sampled inputs.
    QueryInputs,
}

impl BusRequest {
    /// Number of argument bytes that follow `op`, or `None` if the bus
    /// does not accept it.
    pub fn arg_count(op: u8) -> Option<usize> {
        let count = match op {
            opcode::SET_ADDRESS => 2,
            opcode::SET_IR_TIMING => 3,
            opcode::IR_ENABLE => 1,
            opcode::SEND_CODE => 2,
            opcode::RAW_DATAGRAM => DATAGRAM_LEN,
            opcode::SET_COLORSPOT => 4,
            opcode::PLAY_COLORSPOT => 3,
            opcode::GET_BUS_ADDRESS => 0,
            opcode::SET_BUS_ADDRESS => 4,
            opcode::GET_VERSION => 0,
            opcode::PLAY_SCRIPT => 3,
            opcode::SET_RGB
            | opcode::FADE_TO_RGB
            | opcode::FADE_TO_RANDOM_RGB
            | opcode::FADE_TO_HSV
            | opcode::FADE_TO_RANDOM_HSV
            | opcode::PLAY_PEER_SCRIPT => 3,
            opcode::SET_FADE_SPEED | opcode::SET_TIME_ADJUST => 1,
            opcode::STOP_PEER_SCRIPT | opcode::STOP => 0,
            opcode::GET_SCRIPT_INFO => 1,
            opcode::GET_INPUTS => 0,
            _ => return None,
        };
        Some(count)
    }

    /// Builds a request from `op` and its argument bytes.
    ///
    /// Bytes past the opcode's argument count are expected to be zero.
    pub fn decode(op: u8, args: &[u8; DATAGRAM_LEN]) -> Option<Self> {
        let request = match op {
            opcode::RAW_DATAGRAM => BusRequest::RawDatagram(Datagram::from_bytes(*args)),
            opcode::SET_COLORSPOT => BusRequest::SetColorspot {
                position: args[0],
                rgb: [args[1], args[2], args[3]],
            },
            opcode::GET_BUS_ADDRESS => BusRequest::QueryAddress,
            opcode::SET_BUS_ADDRESS => {
                BusRequest::SetBusAddress([args[0], args[1], args[2], args[3]])
            }
            opcode::GET_VERSION => BusRequest::QueryVersion,
            opcode::PLAY_SCRIPT => BusRequest::PlayScript {
                id: args[0],
                repeats: args[1],
                position: args[2],
            },
            opcode::GET_SCRIPT_INFO => BusRequest::QueryScript { id: args[0] },
            opcode::GET_INPUTS => BusRequest::QueryInputs,
            op => {
                Self::arg_count(op)?;
                BusRequest::Dispatch(Command::new(op, [args[0], args[1], args[2]]))
            }
        };
        Some(request)
    }

    /// Reads one request from `bus`.
    ///
    /// Returns `None` if nothing is buffered or the opcode is unknown.
    pub fn receive<B: BusListener>(bus: &mut B) -> Option<Self> {
        if !bus.has_data() {
            return None;
        }

        let op = bus.receive_byte();
        let Some(count) = Self::arg_count(op) else {
            warn!("unknown bus opcode {=u8:#x}", op);
            return None;
        };

        let mut args = [0u8; DATAGRAM_LEN];
        for arg in args.iter_mut().take(count) {
            *arg = bus.receive_byte();
        }

        let request = Self::decode(op, &args);
        debug!("bus request {}", request);
        request
    }
}

/// Returns the new address if `bytes` is a well-formed address change.
///
/// The address must be nonzero, repeated in the last byte, with
/// [`ADDRESS_GUARD`] in between.
pub fn validate_address_change(bytes: [u8; 4]) -> Option<u8> {
    let [addr, g0, g1, confirm] = bytes;
    (addr != 0 && addr == confirm && [g0, g1] == ADDRESS_GUARD).then_some(addr)
}
