//! Tick-driven script player.
//!
//! Walks a stored script one line at a time. Each line's command is handed
//! back to the caller for dispatch; the player itself only moves the position,
//! counts ticks and counts repeats.
//!
//! States (derived from [`RuntimeState`], see [`PlayerState`]):
//! - `Idle`: `script_len == 0`.
//! - `Playing`: waiting for the tick counter to reach the line duration.
//! - `Waiting`: a `w` command is counting down whole wait units.
//!
//! Zero-duration lines advance on the very next service call, so a run of
//! them executes back to back.

use crate::state::{PlayerState, RuntimeState};
use crate::store::{ScriptLayout, Storage};
use crate::tick::TickSource;
use crate::types::{Command, PassOutcome, Repeats};

/// Controls playback of stored scripts.
///
/// # Type Parameters
/// * `'t` - Lifetime of the tick source reference
/// * `T` - Tick source implementation type
pub struct ScriptPlayer<'t, T: TickSource> {
    ticks: &'t T,
    layout: ScriptLayout,
    ticks_per_wait_unit: u16,
    line_duration: u8,
    jump_pending: bool,
}

impl<'t, T: TickSource> ScriptPlayer<'t, T> {
    /// Creates an idle player.
    pub fn new(ticks: &'t T, layout: ScriptLayout, ticks_per_wait_unit: u16) -> Self {
        Self {
            ticks,
            layout,
            ticks_per_wait_unit,
            line_duration: 0,
            jump_pending: false,
        }
    }

    /// Starts script `id` at `position` and returns the first line's command.
    ///
    /// A nonzero `repeats` overrides the stored repeat count. Returns `None`
    /// and leaves the player idle if the slot is missing or blank. A start
    /// position past the end starts at line 0.
    pub fn play<S: Storage>(
        &mut self,
        state: &mut RuntimeState,
        store: &mut S,
        id: u8,
        repeats: u8,
        position: u8,
    ) -> Option<Command> {
        self.ticks.set_ticks(0);
        self.jump_pending = false;
        state.script_id = id;

        let Some(header) = self.layout.read_header(store, id) else {
            warn!("no script slot {}", id);
            state.script_len = 0;
            return None;
        };

        state.script_len = header.len;
        state.script_repeats = if repeats != 0 {
            Repeats::from_raw(repeats)
        } else {
            header.repeats
        };
        state.script_position = if position < header.len { position } else { 0 };

        if header.len == 0 {
            warn!("script {} is blank", id);
            return None;
        }

        info!(
            "play script {} len {} reps {} from {}",
            id,
            header.len,
            state.script_repeats_left(),
            state.script_position
        );
        self.load_line(state, store)
    }

    /// Advances playback if the current line or wait unit has elapsed.
    ///
    /// Returns the command of a newly started line, if any.
    pub fn service<S: Storage>(
        &mut self,
        state: &mut RuntimeState,
        store: &mut S,
    ) -> Option<Command> {
        match state.player_state() {
            PlayerState::Idle => None,
            PlayerState::Waiting => {
                if self.ticks.ticks() >= self.ticks_per_wait_unit {
                    // a jump fired during a wait only consumes one unit
                    self.jump_pending = false;
                    state.wait_ticks_remaining -= 1;
                    self.ticks.set_ticks(0);
                    trace!("wait units left {}", state.wait_ticks_remaining);
                }
                None
            }
            PlayerState::Playing => {
                if !self.jump_pending && self.ticks.ticks() < u16::from(self.line_duration) {
                    return None;
                }
                self.jump_pending = false;
                self.ticks.set_ticks(0);
                self.advance(state, store)
            }
        }
    }

    /// Fires the armed input jump, if its input is above threshold.
    ///
    /// Moves the position to one before the target and marks the current line
    /// as elapsed, so the next [`ScriptPlayer::service`] starts the target line
    /// regardless of timer ticks taken in between.
    pub fn check_jump_condition(&mut self, state: &mut RuntimeState) {
        if let Some(target) = state.conditional_jump.evaluate(&state.sampled_inputs) {
            trace!("input jump to {}", target);
            state.script_position = target.wrapping_sub(1);
            self.jump_pending = true;
            self.ticks.set_ticks(u16::MAX);
        }
    }

    /// Stops playback.
    pub fn stop(&mut self, state: &mut RuntimeState) {
        self.jump_pending = false;
        state.wait_ticks_remaining = 0;
        state.script_len = 0;
    }

    /// Adjusted duration of the current line.
    pub fn line_duration(&self) -> u8 {
        self.line_duration
    }

    /// Returns the store layout used to find scripts.
    pub fn layout(&self) -> &ScriptLayout {
        &self.layout
    }

    fn advance<S: Storage>(
        &mut self,
        state: &mut RuntimeState,
        store: &mut S,
    ) -> Option<Command> {
        state.script_position = state.script_position.wrapping_add(1);

        if state.script_position >= state.script_len {
            state.script_position = 0;
            match state.script_repeats.after_pass() {
                PassOutcome::Finished => {
                    info!("script {} finished", state.script_id);
                    state.script_len = 0;
                    return None;
                }
                PassOutcome::Continue(left) => state.script_repeats = left,
            }
        }

        self.load_line(state, store)
    }

    fn load_line<S: Storage>(
        &mut self,
        state: &mut RuntimeState,
        store: &mut S,
    ) -> Option<Command> {
        let line = self
            .layout
            .read_line(store, state.script_id, state.script_position)?;
        self.line_duration = line.adjusted_duration(state.time_adjustment);
        debug!(
            "line {} dur {} cmd {=u8:#x}",
            state.script_position, self.line_duration, line.command.opcode
        );
        Some(line.command)
    }
}
