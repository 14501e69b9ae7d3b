//! Core types shared by the dispatcher, the script player and the store.

/// One-byte command identifiers understood by the bridge itself.
///
/// Any byte not listed here is forwarded verbatim to the peripheral.
pub mod opcode {
    /// `{'@', group, unit}` set datagram destination.
    pub const SET_ADDRESS: u8 = b'@';
    /// `{'#', freq_hi, freq_lo, duty_percent}` set carrier timing.
    pub const SET_IR_TIMING: u8 = b'#';
    /// `{'%', on}` continuous carrier on/off.
    pub const IR_ENABLE: u8 = b'%';
    /// `{'$', hi, lo}` send a 12-bit Sony code.
    pub const SEND_CODE: u8 = b'$';
    /// `{'!', b0..b7}` forward raw datagram (bus only).
    pub const RAW_DATAGRAM: u8 = b'!';
    /// `{'^', pos, r, g, b}` set colorspot (bus only).
    pub const SET_COLORSPOT: u8 = b'^';
    /// `{'*', pos, cmd, arg}` play colorspot.
    pub const PLAY_COLORSPOT: u8 = b'*';
    /// `{'a'}` read bus address (bus only).
    pub const GET_BUS_ADDRESS: u8 = b'a';
    /// `{'A', addr, 0xD0, 0x0D, addr}` write bus address (bus only).
    pub const SET_BUS_ADDRESS: u8 = b'A';
    /// `{'Z'}` read protocol version (bus only).
    pub const GET_VERSION: u8 = b'Z';
    /// `{'P', id, reps, pos}` play a stored script (bus only).
    pub const PLAY_SCRIPT: u8 = b'P';
    /// `{'l', id}` read script length and repeats (bus only).
    pub const GET_SCRIPT_INFO: u8 = b'l';
    /// `{'j', offset}` relative jump (script only).
    pub const JUMP: u8 = b'j';
    /// `{'i', input, threshold, offset}` input-conditioned relative jump in
    /// scripts; `{'i'}` reads the sampled inputs on the bus.
    pub const INPUT_JUMP: u8 = b'i';
    /// Same byte as [`INPUT_JUMP`], as read on the bus.
    pub const GET_INPUTS: u8 = INPUT_JUMP;
    /// `{'I', input, threshold, target}` arm the deferred absolute jump.
    pub const ARM_INPUT_JUMP: u8 = b'I';
    /// `{'w', lo, hi}` wait a number of wait units.
    pub const WAIT: u8 = b'w';
    /// `{'O'}` stop local playback and forward.
    pub const STOP: u8 = b'O';

    /// Peripheral commands with three arguments.
    pub const SET_RGB: u8 = b'n';
    pub const FADE_TO_RGB: u8 = b'c';
    pub const FADE_TO_RANDOM_RGB: u8 = b'C';
    pub const FADE_TO_HSV: u8 = b'h';
    pub const FADE_TO_RANDOM_HSV: u8 = b'H';
    pub const PLAY_PEER_SCRIPT: u8 = b'p';
    /// Peripheral commands with one argument.
    pub const SET_FADE_SPEED: u8 = b'f';
    pub const SET_TIME_ADJUST: u8 = b't';
    /// Peripheral stop, no arguments.
    pub const STOP_PEER_SCRIPT: u8 = b'o';
}

/// A command value built once per invocation and handed to the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    pub opcode: u8,
    pub args: [u8; 3],
}

impl Command {
    /// Creates a command with explicit arguments.
    #[inline]
    pub const fn new(opcode: u8, args: [u8; 3]) -> Self {
        Self { opcode, args }
    }

    /// Creates a command whose arguments are all zero.
    #[inline]
    pub const fn bare(opcode: u8) -> Self {
        Self::new(opcode, [0; 3])
    }
}

/// One timed line of a stored script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScriptLine {
    /// Line duration in ticks, before time adjustment.
    pub duration: u8,

    /// Command executed when the line starts.
    pub command: Command,
}

impl ScriptLine {
    /// Size of a line in the store.
    pub const SIZE: usize = 5;

    /// Creates a new script line.
    #[inline]
    pub const fn new(duration: u8, command: Command) -> Self {
        Self { duration, command }
    }

    /// Duration after applying the global time adjustment.
    ///
    /// Never goes below zero and never wraps past 255.
    pub fn adjusted_duration(&self, adjustment: i8) -> u8 {
        let adjusted = i16::from(self.duration) + i16::from(adjustment);
        adjusted.clamp(0, i16::from(u8::MAX)) as u8
    }

    /// Decodes a line from its stored form `{dur, cmd, a0, a1, a2}`.
    pub fn from_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self::new(
            bytes[0],
            Command::new(bytes[1], [bytes[2], bytes[3], bytes[4]]),
        )
    }

    /// Encodes the line into its stored form.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let [a0, a1, a2] = self.command.args;
        [self.duration, self.command.opcode, a0, a1, a2]
    }
}

/// How many more passes a script plays.
///
/// Stored as a raw byte where `0` means infinite. Completing a pass from
/// `Finite(1)` ends playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Repeats {
    /// Play this many more passes.
    Finite(u8),

    /// Play forever.
    #[default]
    Infinite,
}

/// What happens after a script pass completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PassOutcome {
    /// Wrap to the first line with the remaining repeats.
    Continue(Repeats),

    /// No repeats left.
    Finished,
}

impl Repeats {
    /// Decodes the stored repeat byte.
    #[inline]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Repeats::Infinite,
            n => Repeats::Finite(n),
        }
    }

    /// Encodes the repeat byte.
    #[inline]
    pub const fn raw(self) -> u8 {
        match self {
            Repeats::Infinite => 0,
            Repeats::Finite(n) => n,
        }
    }

    /// Counts one completed pass.
    ///
    /// Equivalent to decrementing the raw byte where a wrap from 0 to 255
    /// means "infinite, reset to 0" and reaching exactly 0 means "stop".
    pub const fn after_pass(self) -> PassOutcome {
        match self {
            Repeats::Infinite | Repeats::Finite(0) => PassOutcome::Continue(Repeats::Infinite),
            Repeats::Finite(1) => PassOutcome::Finished,
            Repeats::Finite(n) => PassOutcome::Continue(Repeats::Finite(n - 1)),
        }
    }
}

/// Deferred input-triggered jump armed by `I`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JumpCondition {
    /// No jump armed.
    #[default]
    Disabled,

    /// Jump to `target` whenever input `input` reads above `threshold`.
    Active { input: u8, threshold: u8, target: u8 },
}

impl JumpCondition {
    /// Byte value that disables the input or threshold field.
    pub const DISABLED: u8 = 0xFF;

    /// Offset of bus-derived input numbers.
    pub const INPUT_BASE: u8 = 0x40;

    /// Builds the condition from `{'I', input, threshold, target}` arguments.
    pub fn from_args(args: [u8; 3]) -> Self {
        let input = args[0].wrapping_sub(Self::INPUT_BASE);
        let threshold = args[1];
        if input == Self::DISABLED || threshold == Self::DISABLED {
            JumpCondition::Disabled
        } else {
            JumpCondition::Active {
                input,
                threshold,
                target: args[2],
            }
        }
    }

    /// Returns the absolute target line if the condition fires.
    pub fn evaluate(&self, inputs: &[u8; 4]) -> Option<u8> {
        match *self {
            JumpCondition::Disabled => None,
            JumpCondition::Active {
                input,
                threshold,
                target,
            } => match inputs.get(usize::from(input)) {
                Some(&value) if value > threshold => Some(target),
                _ => None,
            },
        }
    }
}

/// Carrier timer compare values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CarrierTiming {
    /// Timer top value, sets the carrier frequency.
    pub period: u8,

    /// Compare value, sets the duty cycle.
    pub duty: u8,
}

impl CarrierTiming {
    #[inline]
    pub const fn new(period: u8, duty: u8) -> Self {
        Self { period, duty }
    }

    /// Converts a target frequency and duty percentage into timer values.
    ///
    /// `period = clock / freq - 1` and `duty = period * 100 / duty_percent`,
    /// both truncated to the 8-bit timer registers. Returns `None` for a zero
    /// frequency or a zero duty percentage.
    pub fn from_frequency(clock_hz: u32, freq_hz: u16, duty_percent: u8) -> Option<Self> {
        let divided = clock_hz.checked_div(u32::from(freq_hz))?;
        let timer_value = divided.saturating_sub(1);
        let duty = timer_value.saturating_mul(100).checked_div(u32::from(duty_percent))?;
        Some(Self::new(timer_value as u8, duty as u8))
    }
}

/// Script authoring and storage errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScriptError {
    /// No lines provided.
    EmptyScript,

    /// More lines than a store slot can hold.
    TooManyLines,

    /// Builder capacity exceeded.
    CapacityExceeded,

    /// Script slot does not exist in the store layout.
    SlotOutOfRange(u8),
}

impl core::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ScriptError::EmptyScript => write!(f, "script must have at least one line"),
            ScriptError::TooManyLines => {
                write!(f, "script exceeds the maximum stored line count")
            }
            ScriptError::CapacityExceeded => write!(f, "script builder capacity exceeded"),
            ScriptError::SlotOutOfRange(id) => write!(f, "script slot {} does not exist", id),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ScriptError {}
