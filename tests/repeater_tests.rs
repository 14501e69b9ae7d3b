//! Integration tests for repeater mode

mod common;

use std::cell::Cell;
use std::convert::Infallible;
use std::rc::Rc;

use common::*;
use embedded_hal::digital::{ErrorType, InputPin};
use ir_bridge::{CarrierTiming, IrRepeater};

/// Input pin whose level the test controls
#[derive(Clone)]
struct SharedPin(Rc<Cell<bool>>);

impl ErrorType for SharedPin {
    type Error = Infallible;
}

impl InputPin for SharedPin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}

#[test]
fn low_input_turns_carrier_on() {
    let level = Rc::new(Cell::new(true));
    let (carrier, _delay, log) = ir_hardware();
    let timing = CarrierTiming::new(105, 35);
    let mut repeater = IrRepeater::new(SharedPin(level.clone()), carrier, timing);

    assert_eq!(
        *log.borrow(),
        vec![PulseEvent::Configure(timing), PulseEvent::Output(false)]
    );

    assert_eq!(repeater.poll(), Ok(false));
    level.set(false);
    assert_eq!(repeater.poll(), Ok(true));
    assert_eq!(repeater.poll(), Ok(true));
    level.set(true);
    assert_eq!(repeater.poll(), Ok(false));

    // output only toggles on edges
    assert_eq!(
        log.borrow()[2..],
        [PulseEvent::Output(true), PulseEvent::Output(false)]
    );
}
