//! Script authoring: building the line lists that get written to the store.
//!
//! The player never holds a whole script in memory; it reads one line at a
//! time from the store. These types exist for provisioning tools and tests.

use crate::store::MAX_SCRIPT_LINES;
use crate::types::{Command, Repeats, ScriptError, ScriptLine};
use heapless::Vec;

/// A script ready to be written to a store slot.
///
/// # Type Parameters
/// * `N` - Maximum number of lines this script can hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script<const N: usize> {
    lines: Vec<ScriptLine, N>,
    repeats: Repeats,
}

impl<const N: usize> Script<N> {
    /// Creates a new script builder.
    pub fn builder() -> ScriptBuilder<N> {
        ScriptBuilder::new()
    }

    /// Returns the lines in play order.
    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }

    /// Returns the number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Always false for a built script.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the repeat configuration.
    pub fn repeats(&self) -> Repeats {
        self.repeats
    }
}

/// Builder for constructing validated scripts.
#[derive(Debug)]
pub struct ScriptBuilder<const N: usize> {
    lines: Vec<ScriptLine, N>,
    repeats: Repeats,
}

impl<const N: usize> ScriptBuilder<N> {
    /// Creates a new empty builder. Scripts repeat forever by default.
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            repeats: Repeats::Infinite,
        }
    }

    /// Appends a line.
    ///
    /// # Errors
    /// * `CapacityExceeded` - The builder already holds `N` lines
    pub fn line(mut self, duration: u8, command: Command) -> Result<Self, ScriptError> {
        self.lines
            .push(ScriptLine::new(duration, command))
            .map_err(|_| ScriptError::CapacityExceeded)?;
        Ok(self)
    }

    /// Sets how many passes the script plays.
    pub fn repeats(mut self, repeats: Repeats) -> Self {
        self.repeats = repeats;
        self
    }

    /// Builds and validates the script.
    ///
    /// # Errors
    /// * `EmptyScript` - No lines were added
    /// * `TooManyLines` - More lines than a store slot holds
    pub fn build(self) -> Result<Script<N>, ScriptError> {
        if self.lines.is_empty() {
            return Err(ScriptError::EmptyScript);
        }
        if self.lines.len() > MAX_SCRIPT_LINES {
            return Err(ScriptError::TooManyLines);
        }

        Ok(Script {
            lines: self.lines,
            repeats: self.repeats,
        })
    }
}

impl<const N: usize> Default for ScriptBuilder<N> {
    fn default() -> Self {
        Self::new()
    }
}
