//! Repeater mode: mirror a demodulated input onto the carrier.
//!
//! The alternative firmware image. No bus, no scripts; the input pin is
//! active low and drives the carrier directly.

use crate::pulse::IrCarrier;
use crate::types::CarrierTiming;
use embedded_hal::digital::InputPin;

/// Mirrors an input pin onto the IR carrier.
pub struct IrRepeater<P: InputPin, C: IrCarrier> {
    input: P,
    carrier: C,
    on: bool,
}

impl<P: InputPin, C: IrCarrier> IrRepeater<P, C> {
    /// Programs the carrier and starts with the output off.
    pub fn new(input: P, mut carrier: C, timing: CarrierTiming) -> Self {
        carrier.configure(timing);
        carrier.set_output(false);
        Self {
            input,
            carrier,
            on: false,
        }
    }

    /// Samples the input once and updates the carrier.
    ///
    /// Returns true if the carrier is now on.
    ///
    /// # Errors
    /// Propagates the pin's read error; the carrier is left unchanged.
    pub fn poll(&mut self) -> Result<bool, P::Error> {
        let on = self.input.is_low()?;
        if on != self.on {
            self.carrier.set_output(on);
            self.on = on;
        }
        Ok(on)
    }

    /// Repeats forever. Read errors are skipped.
    pub fn run(&mut self) -> ! {
        loop {
            let _ = self.poll();
        }
    }

    /// Releases the pin and carrier.
    pub fn release(self) -> (P, C) {
        (self.input, self.carrier)
    }
}
