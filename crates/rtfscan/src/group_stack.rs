//! Saved scan states of the enclosing RTF groups.

use std::collections::TryReserveError;

use tracing::debug;

use crate::state::ScanState;

/// Capacity added each time the stack is full.
const GROWTH: usize = 128;
const INITIAL_CAPACITY: usize = 16;

/// Saved states of the enclosing `{ }` groups.
///
/// Groups opened while the current state is the default one are not pushed;
/// the current state counts them in `default_run` instead, so documents with
/// deep but meaningless nesting cost no memory.
#[derive(Debug)]
pub(crate) struct GroupStack {
    states: Vec<ScanState>,
    warned: bool,
}

impl GroupStack {
    pub(crate) fn new() -> Self {
        Self {
            states: Vec::with_capacity(INITIAL_CAPACITY),
            warned: false,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }

    /// Opens a group. `current` becomes the child state, which inherits only
    /// the top-level flags.
    pub(crate) fn push(&mut self, current: &mut ScanState) -> Result<(), TryReserveError> {
        if current.is_default() {
            current.default_run += 1;
            return Ok(());
        }

        if self.states.len() == self.states.capacity() {
            self.states.try_reserve_exact(GROWTH)?;
        }
        let child = ScanState::with_top_level(current.top_level);
        self.states.push(core::mem::replace(current, child));
        Ok(())
    }

    /// Closes a group, restoring the parent into `current`.
    ///
    /// The caller must end `current`'s handler first. An unbalanced `}` is
    /// tolerated: the parent is taken to be a fresh default state.
    pub(crate) fn pop(&mut self, current: &mut ScanState) {
        if current.default_run > 0 {
            // top-level flags seen inside a counted group stay in scope
            *current = ScanState {
                top_level: current.top_level,
                default_run: current.default_run - 1,
                ..ScanState::default()
            };
            return;
        }

        match self.states.pop() {
            Some(parent) => *current = parent,
            None => {
                if !self.warned {
                    debug!("unbalanced '}}': attempt to pop from an empty group stack");
                    self.warned = true;
                }
                *current = ScanState::default();
            }
        }
    }

    /// Removes every saved state, innermost first.
    pub(crate) fn drain(&mut self) -> impl Iterator<Item = ScanState> + '_ {
        self.states.drain(..).rev()
    }
}
