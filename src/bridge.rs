//! The bus-to-infrared bridge.
//!
//! Owns the collaborators and the runtime state, and runs the cooperative
//! main loop. Each [`Bridge::poll`] handles at most one bus request, then
//! samples the inputs, then services the script player, in that order.

use crate::bus::{BusListener, BusRequest, PROTOCOL_VERSION, validate_address_change};
use crate::config::BridgeConfig;
use crate::datagram::Datagram;
use crate::dispatch::{Effect, dispatch, reply};
use crate::inputs::InputSampler;
use crate::player::ScriptPlayer;
use crate::protocol::{IrTransmitter, timing::SONY_BITS};
use crate::pulse::IrCarrier;
use crate::state::{PlayerState, RuntimeState};
use crate::store::{ADDR_BUS_ADDRESS, BootConfig, BootMode, Storage};
use crate::tick::TickSource;
use crate::types::Command;
use embedded_hal::delay::DelayNs;

/// Settle time after re-initialising the bus at a new address, in ms.
const ADDRESS_CHANGE_SETTLE_MS: u32 = 5;

/// Bus-to-infrared bridge.
///
/// # Type Parameters
/// * `'t` - Lifetime of the tick source reference
/// * `B` - Bus slave
/// * `S` - Non-volatile store
/// * `C` - IR carrier output
/// * `D` - Busy-wait delay used for pulse timing
/// * `I` - Sensor sampler
/// * `T` - Tick source shared with the timer interrupt
pub struct Bridge<'t, B, S, C, D, I, T>
where
    B: BusListener,
    S: Storage,
    C: IrCarrier,
    D: DelayNs,
    I: InputSampler,
    T: TickSource,
{
    bus: B,
    store: S,
    ir: IrTransmitter<C, D>,
    inputs: I,
    player: ScriptPlayer<'t, T>,
    state: RuntimeState,
    config: BridgeConfig,
}

impl<'t, B, S, C, D, I, T> Bridge<'t, B, S, C, D, I, T>
where
    B: BusListener,
    S: Storage,
    C: IrCarrier,
    D: DelayNs,
    I: InputSampler,
    T: TickSource,
{
    /// Creates an idle bridge. Call [`Bridge::boot`] before polling.
    pub fn new(
        bus: B,
        store: S,
        carrier: C,
        delay: D,
        inputs: I,
        ticks: &'t T,
        config: BridgeConfig,
    ) -> Self {
        Self {
            bus,
            store,
            ir: IrTransmitter::new(carrier, delay),
            inputs,
            player: ScriptPlayer::new(ticks, config.layout, config.ticks_per_wait_unit),
            state: RuntimeState::new(&config),
            config,
        }
    }

    /// Applies the persisted boot configuration.
    ///
    /// Sets the bus address and time adjustment, and starts the boot script
    /// if the boot mode asks for it.
    pub fn boot(&mut self) -> BootConfig {
        let boot = BootConfig::load(&mut self.store, self.config.default_bus_address);
        info!(
            "boot: addr {=u8:#x} mode {} script {} reps {} adj {}",
            boot.bus_address, boot.mode, boot.script_id, boot.repeats, boot.time_adjustment
        );

        self.bus.set_address(boot.bus_address);
        self.state.time_adjustment = boot.time_adjustment;

        if boot.mode == BootMode::PlayScript {
            self.play(boot.script_id, boot.repeats, 0);
        }
        boot
    }

    /// Runs one main-loop iteration.
    pub fn poll(&mut self) {
        self.handle_bus();
        self.sample_inputs();
        self.service_script();
    }

    /// Runs the main loop forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.poll();
        }
    }

    /// Handles one pending bus request, if any.
    ///
    /// Returns true if a request was handled.
    pub fn handle_bus(&mut self) -> bool {
        let Some(request) = BusRequest::receive(&mut self.bus) else {
            return false;
        };
        let effect = self.handle_request(request);
        self.apply(effect);
        true
    }

    /// Samples the inputs and fires the armed input jump.
    pub fn sample_inputs(&mut self) {
        self.inputs.sample(&mut self.state.sampled_inputs);
        self.player.check_jump_condition(&mut self.state);
    }

    /// Advances script playback and executes a newly started line.
    pub fn service_script(&mut self) {
        if let Some(command) = self.player.service(&mut self.state, &mut self.store) {
            self.execute(command);
        }
    }

    /// Starts a stored script and executes its first line.
    pub fn play(&mut self, id: u8, repeats: u8, position: u8) {
        if let Some(command) = self
            .player
            .play(&mut self.state, &mut self.store, id, repeats, position)
        {
            self.execute(command);
        }
    }

    /// Dispatches `command` and performs its output.
    pub fn execute(&mut self, command: Command) {
        let effect = dispatch(command, &mut self.state);
        self.apply(effect);
    }

    fn handle_request(&mut self, request: BusRequest) -> Effect {
        match request {
            BusRequest::Dispatch(command) => dispatch(command, &mut self.state),
            BusRequest::RawDatagram(datagram) => Effect::ForwardDatagram(datagram),
            BusRequest::SetColorspot { position, rgb } => Effect::ForwardDatagram(
                Datagram::set_colorspot(self.state.freem_addr, position, rgb),
            ),
            BusRequest::QueryAddress => {
                Effect::ReturnValue(reply(&[self.store.read_byte(ADDR_BUS_ADDRESS)]))
            }
            BusRequest::SetBusAddress(bytes) => match validate_address_change(bytes) {
                Some(address) => {
                    self.store.write_byte(ADDR_BUS_ADDRESS, address);
                    Effect::ChangeBusAddress(address)
                }
                None => {
                    warn!("rejected bus address change {}", bytes);
                    Effect::NoOutput
                }
            },
            BusRequest::QueryVersion => Effect::ReturnValue(reply(&PROTOCOL_VERSION)),
            BusRequest::PlayScript {
                id,
                repeats,
                position,
            } => {
                self.play(id, repeats, position);
                Effect::NoOutput
            }
            BusRequest::QueryScript { id } => {
                let info = match self.player.layout().read_header(&mut self.store, id) {
                    Some(header) => [header.len, header.repeats.raw()],
                    None => [0, 0],
                };
                Effect::ReturnValue(reply(&info))
            }
            BusRequest::QueryInputs => Effect::ReturnValue(reply(&self.state.sampled_inputs)),
        }
    }

    fn apply(&mut self, effect: Effect) {
        let timing = self.state.carrier_timing();
        match effect {
            Effect::ForwardDatagram(datagram) => self.ir.send_datagram(timing, &datagram),
            Effect::SendRawCode(code) => self.ir.send_code(timing, u32::from(code), SONY_BITS),
            Effect::SetIrEnable(on) => self.ir.set_carrier(timing, on),
            Effect::ReturnValue(bytes) => {
                for byte in bytes {
                    self.bus.transmit_byte(byte);
                }
            }
            Effect::ChangeBusAddress(address) => {
                info!("bus address now {=u8:#x}", address);
                self.bus.set_address(address);
                self.ir.delay_ms(ADDRESS_CHANGE_SETTLE_MS);
            }
            Effect::NoOutput | Effect::SetAddress { .. } | Effect::SetIrTiming(_) => {}
        }
    }

    /// Returns the runtime registers.
    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    /// Returns the player state.
    #[inline]
    pub fn player_state(&self) -> PlayerState {
        self.state.player_state()
    }

    /// Returns the hardware configuration.
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn inputs_mut(&mut self) -> &mut I {
        &mut self.inputs
    }
}
