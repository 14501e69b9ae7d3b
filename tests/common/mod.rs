//! Shared test infrastructure for ir-bridge integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use ir_bridge::dispatch::dispatch;
use ir_bridge::store::MIN_STORE_SIZE;
use ir_bridge::{
    BootConfig, Bridge, BridgeConfig, BusListener, CarrierTiming, Command, InputSampler, IrCarrier,
    RamStore, RuntimeState, Script, ScriptLayout, ScriptPlayer, TickCounter,
};

pub type TestStore = RamStore<MIN_STORE_SIZE>;

// ============================================================================
// Mock Bus
// ============================================================================

/// Mock bus slave fed from a byte queue
#[derive(Default)]
pub struct MockBus {
    incoming: VecDeque<u8>,
    transmitted: Vec<u8>,
    addresses: Vec<u8>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues bytes as if written by the bus master
    pub fn push(&mut self, bytes: &[u8]) {
        self.incoming.extend(bytes.iter().copied());
    }

    pub fn transmitted(&self) -> &[u8] {
        &self.transmitted
    }

    /// Addresses passed to `set_address`, in order
    pub fn addresses(&self) -> &[u8] {
        &self.addresses
    }

    pub fn pending(&self) -> usize {
        self.incoming.len()
    }
}

impl BusListener for MockBus {
    fn has_data(&mut self) -> bool {
        !self.incoming.is_empty()
    }

    fn receive_byte(&mut self) -> u8 {
        self.incoming.pop_front().unwrap_or(0)
    }

    fn transmit_byte(&mut self, byte: u8) {
        self.transmitted.push(byte);
    }

    fn set_address(&mut self, address: u8) {
        self.addresses.push(address);
    }
}

// ============================================================================
// Mock IR Hardware
// ============================================================================

/// Something the carrier or delay provider was asked to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseEvent {
    Configure(CarrierTiming),
    Output(bool),
    DelayUs(u32),
}

pub type PulseLog = Rc<RefCell<Vec<PulseEvent>>>;

pub struct MockCarrier {
    log: PulseLog,
}

impl IrCarrier for MockCarrier {
    fn configure(&mut self, timing: CarrierTiming) {
        self.log.borrow_mut().push(PulseEvent::Configure(timing));
    }

    fn set_output(&mut self, on: bool) {
        self.log.borrow_mut().push(PulseEvent::Output(on));
    }
}

/// Delay that records instead of sleeping
pub struct MockDelay {
    log: PulseLog,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.log.borrow_mut().push(PulseEvent::DelayUs(ns / 1_000));
    }

    fn delay_us(&mut self, us: u32) {
        self.log.borrow_mut().push(PulseEvent::DelayUs(us));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.log.borrow_mut().push(PulseEvent::DelayUs(ms * 1_000));
    }
}

/// Creates a carrier and delay sharing one event log
pub fn ir_hardware() -> (MockCarrier, MockDelay, PulseLog) {
    let log: PulseLog = Rc::new(RefCell::new(Vec::new()));
    (
        MockCarrier { log: log.clone() },
        MockDelay { log: log.clone() },
        log,
    )
}

/// Collapses the event log into `(carrier_on, microseconds)` intervals.
///
/// Zero-length intervals are dropped and adjacent intervals with the same
/// carrier state are merged.
pub fn intervals(events: &[PulseEvent]) -> Vec<(bool, u32)> {
    let mut on = false;
    let mut out: Vec<(bool, u32)> = Vec::new();
    for event in events {
        match *event {
            PulseEvent::Output(state) => on = state,
            PulseEvent::DelayUs(0) | PulseEvent::Configure(_) => {}
            PulseEvent::DelayUs(us) => match out.last_mut() {
                Some((last_on, total)) if *last_on == on => *total += us,
                _ => out.push((on, us)),
            },
        }
    }
    out
}

/// Marks only, in microseconds
pub fn marks(events: &[PulseEvent]) -> Vec<u32> {
    intervals(events)
        .into_iter()
        .filter_map(|(on, us)| on.then_some(us))
        .collect()
}

/// Decodes every 64-bit datagram frame found in the log
pub fn decode_datagrams(events: &[PulseEvent]) -> Vec<[u8; 8]> {
    let marks = marks(events);
    let mut frames = Vec::new();
    let mut i = 0;
    while i < marks.len() {
        let is_frame = marks[i] == 2400
            && marks.len() - i > 64
            && marks[i + 1..i + 65].iter().all(|&m| m == 600 || m == 1200);
        if !is_frame {
            i += 1;
            continue;
        }
        let mut bytes = [0u8; 8];
        for (bit, &mark) in marks[i + 1..i + 65].iter().enumerate() {
            if mark == 1200 {
                bytes[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
        frames.push(bytes);
        i += 65;
    }
    frames
}

// ============================================================================
// Mock Inputs
// ============================================================================

/// Sampler returning whatever the test put in `values`
#[derive(Default)]
pub struct MockInputs {
    pub values: [u8; 4],
}

impl InputSampler for MockInputs {
    fn sample(&mut self, inputs: &mut [u8; 4]) {
        *inputs = self.values;
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub type TestBridge<'t> =
    Bridge<'t, MockBus, TestStore, MockCarrier, MockDelay, MockInputs, TickCounter>;

/// Store with the default boot configuration and `script` in slot 0
pub fn store_with<const N: usize>(script: &Script<N>) -> TestStore {
    let mut store = TestStore::new();
    BootConfig::default().save(&mut store);
    ScriptLayout::default()
        .write_script(&mut store, 0, script)
        .unwrap();
    store
}

/// Bridge over mocks, not yet booted
pub fn test_bridge(ticks: &TickCounter, store: TestStore) -> (TestBridge<'_>, PulseLog) {
    let (carrier, delay, log) = ir_hardware();
    let bridge = Bridge::new(
        MockBus::new(),
        store,
        carrier,
        delay,
        MockInputs::default(),
        ticks,
        BridgeConfig::default(),
    );
    (bridge, log)
}

/// Script player with its registers and store, dispatching every line it
/// starts and recording the commands.
pub struct PlayerRig<'t> {
    pub ticks: &'t TickCounter,
    pub player: ScriptPlayer<'t, TickCounter>,
    pub state: RuntimeState,
    pub store: TestStore,
    pub executed: Vec<Command>,
}

impl<'t> PlayerRig<'t> {
    pub fn new<const N: usize>(ticks: &'t TickCounter, script: &Script<N>) -> Self {
        let config = BridgeConfig::default();
        Self {
            ticks,
            player: ScriptPlayer::new(ticks, config.layout, config.ticks_per_wait_unit),
            state: RuntimeState::new(&config),
            store: store_with(script),
            executed: Vec::new(),
        }
    }

    pub fn play(&mut self, repeats: u8, position: u8) {
        if let Some(command) =
            self.player
                .play(&mut self.state, &mut self.store, 0, repeats, position)
        {
            self.execute(command);
        }
    }

    /// One main-loop pass without a bus: input jump check, then playback
    pub fn poll(&mut self) {
        self.player.check_jump_condition(&mut self.state);
        if let Some(command) = self.player.service(&mut self.state, &mut self.store) {
            self.execute(command);
        }
    }

    /// `n` timer ticks, polling after each
    pub fn run_ticks(&mut self, n: u32) {
        for _ in 0..n {
            self.ticks.tick();
            self.poll();
        }
    }

    fn execute(&mut self, command: Command) {
        dispatch(command, &mut self.state);
        self.executed.push(command);
    }

    pub fn opcodes(&self) -> Vec<u8> {
        self.executed.iter().map(|c| c.opcode).collect()
    }
}
