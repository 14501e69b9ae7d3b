//! Mark/space pulse generation on a modulated carrier.
//!
//! Durations are expressed in units of 10 µs. Each call busy-waits for its
//! full duration; there is no way to cancel a pulse in flight.

use crate::types::CarrierTiming;
use embedded_hal::delay::DelayNs;

/// Trait for abstracting the carrier timer driving the IR LED.
///
/// Implement this for the PWM timer wired to the LED. Handle any hardware
/// errors internally - these methods cannot fail.
pub trait IrCarrier {
    /// Programs the carrier period and duty cycle. The output stays off.
    fn configure(&mut self, timing: CarrierTiming);

    /// Gates the modulated output on or off.
    fn set_output(&mut self, on: bool);
}

/// Converts mark/space durations into timed carrier-on/carrier-off intervals.
pub struct PulseEncoder<C: IrCarrier, D: DelayNs> {
    carrier: C,
    delay: D,
}

impl<C: IrCarrier, D: DelayNs> PulseEncoder<C, D> {
    /// Creates an encoder over the given carrier and delay provider.
    pub fn new(carrier: C, delay: D) -> Self {
        Self { carrier, delay }
    }

    /// Programs the carrier for the next transmission.
    pub fn enable(&mut self, timing: CarrierTiming) {
        self.carrier.configure(timing);
    }

    /// Carrier on for `ten_us` × 10 µs.
    pub fn mark(&mut self, ten_us: u16) {
        self.carrier.set_output(true);
        self.delay.delay_us(u32::from(ten_us) * 10);
    }

    /// Carrier off for `ten_us` × 10 µs.
    pub fn space(&mut self, ten_us: u16) {
        self.carrier.set_output(false);
        self.delay.delay_us(u32::from(ten_us) * 10);
    }

    /// Leaves the carrier running until [`PulseEncoder::off`] is called.
    pub fn on(&mut self) {
        self.carrier.set_output(true);
    }

    /// Turns the carrier off without waiting.
    pub fn off(&mut self) {
        self.carrier.set_output(false);
    }

    /// Busy-waits without touching the carrier.
    pub fn delay_ms(&mut self, ms: u32) {
        self.delay.delay_ms(ms);
    }

    /// Releases the carrier and delay provider.
    pub fn release(self) -> (C, D) {
        (self.carrier, self.delay)
    }
}
