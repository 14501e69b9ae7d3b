//! Infrared framings built on top of the pulse encoder.
//!
//! The bridge's own traffic uses [`IrTransmitter::send_datagram`], a 64-bit
//! stretch of the Sony SIRC framing. The short-code schemes follow the
//! published timing tables so generic receivers decode them.
//!
//! Every send blocks for the full length of the frame. Carrier timing is
//! taken from the `timing` argument at the start of each frame.

use crate::datagram::Datagram;
use crate::pulse::{IrCarrier, PulseEncoder};
use crate::types::CarrierTiming;
use embedded_hal::delay::DelayNs;

/// Pulse timings in units of 10 µs.
pub mod timing {
    pub const RC5_T1: u16 = 89;

    pub const RC6_HDR_MARK: u16 = 266;
    pub const RC6_HDR_SPACE: u16 = 89;
    pub const RC6_T1: u16 = 44;

    pub const NEC_HDR_MARK: u16 = 900;
    pub const NEC_HDR_SPACE: u16 = 450;
    pub const NEC_BIT_MARK: u16 = 56;
    pub const NEC_ONE_SPACE: u16 = 160;
    pub const NEC_ZERO_SPACE: u16 = 56;

    pub const SONY_HDR_MARK: u16 = 240;
    pub const SONY_HDR_SPACE: u16 = 60;
    pub const SONY_ONE_MARK: u16 = 120;
    pub const SONY_ZERO_MARK: u16 = 60;
    /// Default Sony code width.
    pub const SONY_BITS: u8 = 12;

    // ~771 bits/second
    pub const BYTE_HDR_MARK: u16 = 240;
    pub const BYTE_HDR_SPACE: u16 = 30;
    pub const BYTE_ZERO_MARK: u16 = 30;
    pub const BYTE_ZERO_SPACE: u16 = 30;
    pub const BYTE_ONE_MARK: u16 = 60;
    pub const BYTE_ONE_SPACE: u16 = 30;
    /// Gap between bytes so receivers don't lock up, in ms.
    pub const BYTE_GAP_MS: u32 = 3;
}

use timing::*;

const TOPBIT: u32 = 0x8000_0000;

/// Short-code infrared schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Scheme {
    Sony,
    Nec,
    Rc5,
    Rc6,
}

/// Left-aligns the low `bits` bits of `value` in a 32-bit word.
fn align_msb(value: u32, bits: u8) -> u32 {
    value.checked_shl(32 - u32::from(bits.min(32))).unwrap_or(0)
}

/// Frames payloads into IR pulse trains.
pub struct IrTransmitter<C: IrCarrier, D: DelayNs> {
    pulses: PulseEncoder<C, D>,
}

impl<C: IrCarrier, D: DelayNs> IrTransmitter<C, D> {
    /// Creates a transmitter over the given carrier and delay provider.
    pub fn new(carrier: C, delay: D) -> Self {
        Self {
            pulses: PulseEncoder::new(carrier, delay),
        }
    }

    /// Sends `value` using the given scheme.
    pub fn send(&mut self, timing: CarrierTiming, scheme: Scheme, value: u32, bits: u8) {
        match scheme {
            Scheme::Sony => self.send_code(timing, value, bits),
            Scheme::Nec => self.send_nec(timing, value, bits),
            Scheme::Rc5 => self.send_rc5(timing, value, bits),
            Scheme::Rc6 => self.send_rc6(timing, value, bits),
        }
    }

    /// Sends the low `bits` bits of `value` as a Sony code, MSB first.
    pub fn send_code(&mut self, timing: CarrierTiming, value: u32, bits: u8) {
        self.pulses.enable(timing);
        self.pulses.mark(SONY_HDR_MARK);
        self.pulses.space(SONY_HDR_SPACE);

        let mut data = align_msb(value, bits);
        for _ in 0..bits.min(32) {
            let mark = if data & TOPBIT != 0 {
                SONY_ONE_MARK
            } else {
                SONY_ZERO_MARK
            };
            self.pulses.mark(mark);
            self.pulses.space(SONY_HDR_SPACE);
            data <<= 1;
        }
        self.pulses.space(0);
    }

    /// Sends an 8-byte datagram as one 64-bit Sony-style frame.
    ///
    /// Bytes go out in order, each MSB first. No trailing gap is added.
    pub fn send_datagram(&mut self, timing: CarrierTiming, datagram: &Datagram) {
        self.pulses.enable(timing);
        self.pulses.mark(SONY_HDR_MARK);
        self.pulses.space(SONY_HDR_SPACE);

        for &byte in datagram.as_bytes() {
            let mut bits = byte;
            for _ in 0..8 {
                let mark = if bits & 0x80 != 0 {
                    SONY_ONE_MARK
                } else {
                    SONY_ZERO_MARK
                };
                self.pulses.mark(mark);
                self.pulses.space(SONY_HDR_SPACE);
                bits <<= 1;
            }
        }
    }

    /// Sends a NEC frame. The top `bits` bits of the 32-bit `value` are sent.
    pub fn send_nec(&mut self, timing: CarrierTiming, value: u32, bits: u8) {
        self.pulses.enable(timing);
        self.pulses.mark(NEC_HDR_MARK);
        self.pulses.space(NEC_HDR_SPACE);

        let mut data = value;
        for _ in 0..bits.min(32) {
            let space = if data & TOPBIT != 0 {
                NEC_ONE_SPACE
            } else {
                NEC_ZERO_SPACE
            };
            self.pulses.mark(NEC_BIT_MARK);
            self.pulses.space(space);
            data <<= 1;
        }
        self.pulses.mark(NEC_BIT_MARK);
        self.pulses.space(0);
    }

    /// Sends an RC5 frame. The first data bit must be the start bit (one).
    pub fn send_rc5(&mut self, timing: CarrierTiming, value: u32, bits: u8) {
        self.pulses.enable(timing);
        let mut data = align_msb(value, bits);
        self.pulses.mark(RC5_T1);
        self.pulses.space(RC5_T1);
        self.pulses.mark(RC5_T1);
        for _ in 0..bits.min(32) {
            if data & TOPBIT != 0 {
                self.pulses.space(RC5_T1);
                self.pulses.mark(RC5_T1);
            } else {
                self.pulses.mark(RC5_T1);
                self.pulses.space(RC5_T1);
            }
            data <<= 1;
        }
        self.pulses.space(0);
    }

    /// Sends an RC6 frame. The caller flips the toggle bit.
    pub fn send_rc6(&mut self, timing: CarrierTiming, value: u32, bits: u8) {
        self.pulses.enable(timing);
        let mut data = align_msb(value, bits);
        self.pulses.mark(RC6_HDR_MARK);
        self.pulses.space(RC6_HDR_SPACE);
        self.pulses.mark(RC6_T1);
        self.pulses.space(RC6_T1);
        for i in 0..bits.min(32) {
            // trailer bit is double width
            let t = if i == 3 { 2 * RC6_T1 } else { RC6_T1 };
            if data & TOPBIT != 0 {
                self.pulses.mark(t);
                self.pulses.space(t);
            } else {
                self.pulses.space(t);
                self.pulses.mark(t);
            }
            data <<= 1;
        }
        self.pulses.space(0);
    }

    /// Sends alternating mark/space durations, starting with a mark.
    pub fn send_raw(&mut self, timing: CarrierTiming, durations: &[u16]) {
        self.pulses.enable(timing);
        for (i, &t) in durations.iter().enumerate() {
            if i % 2 == 1 {
                self.pulses.space(t);
            } else {
                self.pulses.mark(t);
            }
        }
        self.pulses.space(0);
    }

    /// Sends one byte in the compact byte framing, LSB first.
    pub fn send_byte(&mut self, timing: CarrierTiming, value: u8) {
        self.pulses.enable(timing);
        self.pulses.mark(BYTE_HDR_MARK);
        self.pulses.space(BYTE_HDR_SPACE);
        for bit in 0..8 {
            if value & (1 << bit) == 0 {
                self.pulses.mark(BYTE_ZERO_MARK);
                self.pulses.space(BYTE_ZERO_SPACE);
            } else {
                self.pulses.mark(BYTE_ONE_MARK);
                self.pulses.space(BYTE_ONE_SPACE);
            }
        }
    }

    /// Sends each byte with [`IrTransmitter::send_byte`], pausing between them.
    pub fn send_bytes(&mut self, timing: CarrierTiming, bytes: &[u8]) {
        for &b in bytes {
            self.send_byte(timing, b);
            self.pulses.delay_ms(BYTE_GAP_MS);
        }
    }

    /// Switches the continuous carrier on or off.
    pub fn set_carrier(&mut self, timing: CarrierTiming, on: bool) {
        if on {
            self.pulses.enable(timing);
            self.pulses.on();
        } else {
            self.pulses.off();
        }
    }

    /// Busy-waits without touching the carrier.
    pub fn delay_ms(&mut self, ms: u32) {
        self.pulses.delay_ms(ms);
    }

    /// Releases the carrier and delay provider.
    pub fn release(self) -> (C, D) {
        self.pulses.release()
    }
}
