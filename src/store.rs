//! Non-volatile storage: boot configuration and script records.
//!
//! Layout, one byte per field unless noted:
//!
//! | Offset | Field |
//! |---|---|
//! | 0 | bus address |
//! | 1 | boot mode |
//! | 2 | boot script id |
//! | 3 | boot repeats |
//! | 4 | boot fade speed |
//! | 5 | boot time adjustment (`i8`) |
//! | 6 | reserved |
//! | 7 + slot × 247 | script record: `len`, `reps`, 49 lines × 5 bytes |

use crate::script::Script;
use crate::types::{Command, Repeats, ScriptError, ScriptLine, opcode};

/// Trait for abstracting byte-addressed non-volatile memory.
///
/// Writes must survive power loss. Handle any hardware errors internally -
/// these methods cannot fail.
pub trait Storage {
    /// Reads one byte.
    fn read_byte(&mut self, addr: u16) -> u8;

    /// Writes one byte.
    fn write_byte(&mut self, addr: u16, value: u8);

    /// Reads `buf.len()` bytes starting at `addr`.
    fn read_block(&mut self, addr: u16, buf: &mut [u8]) {
        for (offset, byte) in (0u16..).zip(buf.iter_mut()) {
            *byte = self.read_byte(addr.wrapping_add(offset));
        }
    }

    /// Writes `data` starting at `addr`.
    fn write_block(&mut self, addr: u16, data: &[u8]) {
        for (offset, &byte) in (0u16..).zip(data.iter()) {
            self.write_byte(addr.wrapping_add(offset), byte);
        }
    }
}

pub const ADDR_BUS_ADDRESS: u16 = 0;
pub const ADDR_BOOT_MODE: u16 = 1;
pub const ADDR_BOOT_SCRIPT_ID: u16 = 2;
pub const ADDR_BOOT_REPEATS: u16 = 3;
pub const ADDR_BOOT_FADE_SPEED: u16 = 4;
pub const ADDR_BOOT_TIME_ADJUST: u16 = 5;
pub const ADDR_RESERVED: u16 = 6;
/// First script record.
pub const ADDR_SCRIPTS: u16 = 7;

/// Lines a script record can hold.
pub const MAX_SCRIPT_LINES: usize = 49;

/// Bytes per script record.
pub const SCRIPT_RECORD_SIZE: u16 = 2 + (MAX_SCRIPT_LINES * ScriptLine::SIZE) as u16;

/// Bytes needed for the header plus one script record.
pub const MIN_STORE_SIZE: usize = ADDR_SCRIPTS as usize + SCRIPT_RECORD_SIZE as usize;

/// What the bridge does at power-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootMode {
    /// Wait for bus commands.
    Nothing,
    /// Start the boot script before entering the main loop.
    PlayScript,
}

impl BootMode {
    /// Decodes the stored byte; unknown values mean `Nothing`.
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            1 => BootMode::PlayScript,
            _ => BootMode::Nothing,
        }
    }

    pub const fn raw(self) -> u8 {
        match self {
            BootMode::Nothing => 0,
            BootMode::PlayScript => 1,
        }
    }
}

/// Persisted boot configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootConfig {
    pub bus_address: u8,
    pub mode: BootMode,
    pub script_id: u8,
    /// Raw repeat byte; 0 keeps the script's own count.
    pub repeats: u8,
    /// Stored for peer tooling; the bridge does not act on it.
    pub fade_speed: u8,
    pub time_adjustment: i8,
}

impl BootConfig {
    /// Reads the boot configuration.
    ///
    /// A stored bus address of 0 or above 0x7F is replaced by `default_address`.
    pub fn load<S: Storage>(store: &mut S, default_address: u8) -> Self {
        let stored = store.read_byte(ADDR_BUS_ADDRESS);
        let bus_address = if stored == 0 || stored > 0x7F {
            default_address
        } else {
            stored
        };

        Self {
            bus_address,
            mode: BootMode::from_raw(store.read_byte(ADDR_BOOT_MODE)),
            script_id: store.read_byte(ADDR_BOOT_SCRIPT_ID),
            repeats: store.read_byte(ADDR_BOOT_REPEATS),
            fade_speed: store.read_byte(ADDR_BOOT_FADE_SPEED),
            time_adjustment: store.read_byte(ADDR_BOOT_TIME_ADJUST) as i8,
        }
    }

    /// Writes the boot configuration.
    pub fn save<S: Storage>(&self, store: &mut S) {
        store.write_byte(ADDR_BUS_ADDRESS, self.bus_address);
        store.write_byte(ADDR_BOOT_MODE, self.mode.raw());
        store.write_byte(ADDR_BOOT_SCRIPT_ID, self.script_id);
        store.write_byte(ADDR_BOOT_REPEATS, self.repeats);
        store.write_byte(ADDR_BOOT_FADE_SPEED, self.fade_speed);
        store.write_byte(ADDR_BOOT_TIME_ADJUST, self.time_adjustment as u8);
    }
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            bus_address: 0x09,
            mode: BootMode::Nothing,
            script_id: 0,
            repeats: 0,
            fade_speed: 0x08,
            time_adjustment: 0,
        }
    }
}

/// Length and repeat count of a stored script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScriptHeader {
    /// Line count; 0 = blank script.
    pub len: u8,
    pub repeats: Repeats,
}

/// How many script records the store holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScriptLayout {
    pub slots: u8,
}

impl ScriptLayout {
    pub const fn new(slots: u8) -> Self {
        Self { slots }
    }

    /// Offset of the record for `id`, or `None` past the last slot.
    pub fn record_addr(&self, id: u8) -> Option<u16> {
        (id < self.slots).then(|| ADDR_SCRIPTS + u16::from(id) * SCRIPT_RECORD_SIZE)
    }

    /// Offset of line `position` of script `id`.
    pub fn line_addr(&self, id: u8, position: u8) -> Option<u16> {
        self.record_addr(id)
            .map(|base| base + 2 + u16::from(position) * ScriptLine::SIZE as u16)
    }

    /// Reads the header of script `id`.
    ///
    /// A length larger than a record can hold (such as erased memory) reads
    /// as a blank script.
    pub fn read_header<S: Storage>(&self, store: &mut S, id: u8) -> Option<ScriptHeader> {
        let base = self.record_addr(id)?;
        let len = match store.read_byte(base) {
            len if usize::from(len) > MAX_SCRIPT_LINES => 0,
            len => len,
        };
        let repeats = Repeats::from_raw(store.read_byte(base + 1));
        Some(ScriptHeader { len, repeats })
    }

    /// Reads one line of script `id`.
    pub fn read_line<S: Storage>(&self, store: &mut S, id: u8, position: u8) -> Option<ScriptLine> {
        let addr = self.line_addr(id, position)?;
        let mut bytes = [0u8; ScriptLine::SIZE];
        store.read_block(addr, &mut bytes);
        Some(ScriptLine::from_bytes(bytes))
    }

    /// Writes `script` into slot `id`.
    ///
    /// # Errors
    /// * `SlotOutOfRange` - The layout has no slot `id`
    /// * `TooManyLines` - The script does not fit a record
    pub fn write_script<S: Storage, const N: usize>(
        &self,
        store: &mut S,
        id: u8,
        script: &Script<N>,
    ) -> Result<(), ScriptError> {
        let base = self.record_addr(id).ok_or(ScriptError::SlotOutOfRange(id))?;
        if script.len() > MAX_SCRIPT_LINES {
            return Err(ScriptError::TooManyLines);
        }

        let mut addr = base + 2;
        for line in script.lines() {
            store.write_block(addr, &line.to_bytes());
            addr += ScriptLine::SIZE as u16;
        }
        // Header last so a torn write leaves the old length or a blank script.
        store.write_byte(base + 1, script.repeats().raw());
        store.write_byte(base, script.len() as u8);
        Ok(())
    }

    /// Marks slot `id` as blank.
    pub fn erase_script<S: Storage>(&self, store: &mut S, id: u8) -> Result<(), ScriptError> {
        let base = self.record_addr(id).ok_or(ScriptError::SlotOutOfRange(id))?;
        store.write_byte(base, 0);
        Ok(())
    }
}

impl Default for ScriptLayout {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Reserved byte value in a factory image.
pub const FACTORY_RESERVED: u8 = 0xDA;

/// Factory demo script: set fade speed, stop the peer's own script, then
/// cycle four colours forever.
pub fn factory_script() -> Result<Script<6>, ScriptError> {
    Script::<6>::builder()
        .line(0, Command::new(opcode::SET_FADE_SPEED, [0x22, 0x33, 0x44]))?
        .line(0, Command::bare(opcode::STOP_PEER_SCRIPT))?
        .line(10, Command::new(opcode::FADE_TO_RGB, [0x33, 0x66, 0x00]))?
        .line(10, Command::new(opcode::FADE_TO_RGB, [0x11, 0x11, 0x11]))?
        .line(10, Command::new(opcode::FADE_TO_RGB, [0x00, 0x66, 0x33]))?
        .line(10, Command::new(opcode::FADE_TO_RGB, [0xFF, 0xFF, 0xFF]))?
        .repeats(Repeats::Infinite)
        .build()
}

/// Writes the factory boot configuration and demo script into slot 0.
pub fn write_factory_defaults<S: Storage>(
    store: &mut S,
    layout: &ScriptLayout,
) -> Result<(), ScriptError> {
    BootConfig::default().save(store);
    store.write_byte(ADDR_RESERVED, FACTORY_RESERVED);
    layout.write_script(store, 0, &factory_script()?)
}

/// In-memory store, erased to `0xFF`.
///
/// Useful on hosts and in tests. Out-of-range reads return `0xFF` and
/// out-of-range writes are dropped.
#[derive(Debug, Clone)]
pub struct RamStore<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> RamStore<N> {
    pub const fn new() -> Self {
        Self { bytes: [0xFF; N] }
    }

    /// Returns the raw contents.
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.bytes
    }
}

impl<const N: usize> Default for RamStore<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Storage for RamStore<N> {
    fn read_byte(&mut self, addr: u16) -> u8 {
        self.bytes.get(usize::from(addr)).copied().unwrap_or(0xFF)
    }

    fn write_byte(&mut self, addr: u16, value: u8) {
        if let Some(byte) = self.bytes.get_mut(usize::from(addr)) {
            *byte = value;
        }
    }
}
