//! Sensor sampling for conditional jumps.

use embedded_hal::digital::InputPin;

/// Value of a digital input that reads high.
pub const INPUT_HIGH: u8 = 255;

/// Trait for abstracting the sensor inputs.
///
/// Called once per loop iteration. Implementations fill whichever of the
/// four slots they own and leave the rest untouched. Handle any hardware
/// errors internally - this method cannot fail.
pub trait InputSampler {
    fn sample(&mut self, inputs: &mut [u8; 4]);
}

/// Two digital pins sampled into inputs 0 and 1 as 0 or 255.
///
/// A pin that fails to read counts as low.
pub struct DigitalInputs<P0: InputPin, P1: InputPin> {
    pin0: P0,
    pin1: P1,
}

impl<P0: InputPin, P1: InputPin> DigitalInputs<P0, P1> {
    pub fn new(pin0: P0, pin1: P1) -> Self {
        Self { pin0, pin1 }
    }

    /// Releases the pins.
    pub fn release(self) -> (P0, P1) {
        (self.pin0, self.pin1)
    }
}

fn level<P: InputPin>(pin: &mut P) -> u8 {
    match pin.is_high() {
        Ok(true) => INPUT_HIGH,
        _ => 0,
    }
}

impl<P0: InputPin, P1: InputPin> InputSampler for DigitalInputs<P0, P1> {
    fn sample(&mut self, inputs: &mut [u8; 4]) {
        inputs[0] = level(&mut self.pin0);
        inputs[1] = level(&mut self.pin1);
    }
}

/// Sampler for boards without sensor inputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInputs;

impl InputSampler for NoInputs {
    fn sample(&mut self, _inputs: &mut [u8; 4]) {}
}
