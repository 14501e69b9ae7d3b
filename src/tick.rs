//! Interrupt-driven tick counter shared between the timer ISR and the main loop.

use core::cell::Cell;
use critical_section::Mutex;

/// Trait for abstracting the script tick counter.
///
/// The counter is incremented by a periodic interrupt and read, reset or
/// forced by the main loop. Implementations must make every access atomic
/// with respect to that interrupt.
pub trait TickSource {
    /// Returns the current tick count.
    fn ticks(&self) -> u16;

    /// Overwrites the tick count.
    fn set_ticks(&self, ticks: u16);
}

/// Tick counter guarded by a critical section.
///
/// Place it in a `static` and call [`TickCounter::tick`] from the timer
/// overflow interrupt. The count wraps on overflow.
pub struct TickCounter {
    count: Mutex<Cell<u16>>,
}

impl TickCounter {
    /// Creates a counter starting at zero.
    pub const fn new() -> Self {
        Self {
            count: Mutex::new(Cell::new(0)),
        }
    }

    /// Advances the counter by one tick. Call from the timer interrupt.
    pub fn tick(&self) {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            count.set(count.get().wrapping_add(1));
        });
    }

    /// Advances the counter by `n` ticks at once.
    pub fn advance(&self, n: u16) {
        critical_section::with(|cs| {
            let count = self.count.borrow(cs);
            count.set(count.get().wrapping_add(n));
        });
    }
}

impl Default for TickCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for TickCounter {
    fn ticks(&self) -> u16 {
        critical_section::with(|cs| self.count.borrow(cs).get())
    }

    fn set_ticks(&self, ticks: u16) {
        critical_section::with(|cs| self.count.borrow(cs).set(ticks));
    }
}
