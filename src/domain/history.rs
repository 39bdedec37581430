//! Linear undo/redo timeline with dirty tracking.
//!
//! Entries past `current` form the redo tail and are discarded as soon as a
//! new command is recorded. The timeline is bounded; once full, the oldest
//! entry is evicted and every index shifts down by one.

use std::collections::VecDeque;
use std::fmt;

use super::command::Command;
use super::models::CellRange;

pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Which point of the timeline matches the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedIndex {
    /// Nothing has been executed since the grid was loaded.
    Initial,
    /// The state right after entry `n` was applied.
    At(usize),
    /// The saved state was evicted or discarded and can never be reached again.
    Lost,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub command: Command,
    /// Selection rectangle right before the command ran.
    pub range: CellRange,
    /// Copy indicator visible right before the command ran.
    pub copy_range: Option<CellRange>,
}

/// Selection and copy indicator to restore after an undo or redo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryOutcome {
    pub range: CellRange,
    pub copy_range: Option<CellRange>,
}

pub type DirtyListener = Box<dyn FnMut(bool)>;

pub struct History {
    entries: VecDeque<HistoryEntry>,
    current: Option<usize>,
    saved: SavedIndex,
    capacity: usize,
    listeners: Vec<DirtyListener>,
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("entries", &self.entries.len())
            .field("current", &self.current)
            .field("saved", &self.saved)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            current: None,
            saved: SavedIndex::Initial,
            capacity: capacity.max(1),
            listeners: Vec::new(),
        }
    }

    /// Registers a callback fired with the dirty flag after every change.
    pub fn subscribe(&mut self, listener: DirtyListener) {
        self.listeners.push(listener);
    }

    /// Runs `command` against `grid` and records it.
    ///
    /// Returns `false` without touching the grid when the command carries
    /// no effective change.
    pub fn execute_command(
        &mut self,
        command: Command,
        grid: &mut super::models::Grid,
        range: CellRange,
        copy_range: Option<CellRange>,
    ) -> bool {
        let Some(mut command) = command.without_noops() else {
            return false;
        };
        command.execute(grid);
        tracing::debug!(command = %command, "executed command");
        self.record(command, range, copy_range);
        true
    }

    /// Records a command whose effect the caller already applied.
    pub fn push_command(&mut self, command: Command, range: CellRange, copy_range: Option<CellRange>) -> bool {
        let Some(command) = command.without_noops() else {
            return false;
        };
        tracing::debug!(command = %command, "recorded command");
        self.record(command, range, copy_range);
        true
    }

    fn record(&mut self, command: Command, range: CellRange, copy_range: Option<CellRange>) {
        let keep = self.current.map_or(0, |c| c + 1);
        if keep < self.entries.len() {
            self.entries.truncate(keep);
            if let SavedIndex::At(saved) = self.saved {
                if saved >= keep {
                    self.saved = SavedIndex::Lost;
                }
            }
        }

        self.entries.push_back(HistoryEntry { command, range, copy_range });
        self.current = Some(self.entries.len() - 1);

        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            self.current = self.current.and_then(|c| c.checked_sub(1));
            self.saved = match self.saved {
                SavedIndex::At(0) | SavedIndex::Initial => SavedIndex::Lost,
                SavedIndex::At(n) => SavedIndex::At(n - 1),
                SavedIndex::Lost => SavedIndex::Lost,
            };
        }

        self.notify();
    }

    /// Reverts the entry at the cursor.
    pub fn undo(&mut self, grid: &mut super::models::Grid) -> Option<HistoryOutcome> {
        let index = self.current?;
        let entry = &mut self.entries[index];
        entry.command.undo(grid);
        tracing::debug!(command = %entry.command, "undo");
        let outcome = HistoryOutcome {
            range: entry.range,
            copy_range: entry.copy_range,
        };
        self.current = index.checked_sub(1);
        self.notify();
        Some(outcome)
    }

    /// Re-applies the entry after the cursor.
    ///
    /// Cell changes report the envelope of every changed cell together with
    /// the original selection, since their effect may extend past it. The copy
    /// indicator follows lanes moved by a structural command.
    pub fn redo(&mut self, grid: &mut super::models::Grid) -> Option<HistoryOutcome> {
        let index = self.current.map_or(0, |c| c + 1);
        let entry = self.entries.get_mut(index)?;
        entry.command.redo(grid);
        tracing::debug!(command = %entry.command, "redo");

        let range = match &entry.command {
            Command::CellChange { .. } => entry
                .command
                .changed_range()
                .map_or(entry.range, |changed| entry.range.union(&changed)),
            _ => entry.range,
        };
        let outcome = HistoryOutcome {
            range,
            copy_range: entry.copy_range.map(|copy| entry.command.shift_range(copy)),
        };
        self.current = Some(index);
        self.notify();
        Some(outcome)
    }

    pub fn can_undo(&self) -> bool {
        self.current.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.current.map_or(0, |c| c + 1) < self.entries.len()
    }

    pub fn mark_saved(&mut self) {
        self.saved = match self.current {
            Some(index) => SavedIndex::At(index),
            None => SavedIndex::Initial,
        };
        self.notify();
    }

    pub fn is_dirty(&self) -> bool {
        match self.saved {
            SavedIndex::Initial => self.current.is_some(),
            SavedIndex::At(index) => self.current != Some(index),
            SavedIndex::Lost => true,
        }
    }

    /// Forgets every entry; the current grid becomes the saved state.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.current = None;
        self.saved = SavedIndex::Initial;
        self.notify();
    }

    /// Clears the recorded copy indicator on the run of entries around the
    /// cursor that recorded exactly `range`, so that undo and redo do not
    /// bring back an indicator the user dismissed.
    pub fn clear_copy_range(&mut self, range: CellRange) {
        let Some(current) = self.current else {
            if let Some(entry) = self.entries.front_mut() {
                if entry.copy_range == Some(range) {
                    Self::clear_forward(&mut self.entries, 0, range);
                }
            }
            return;
        };

        for index in (0..=current).rev() {
            let entry = &mut self.entries[index];
            if entry.copy_range != Some(range) {
                break;
            }
            entry.copy_range = None;
        }
        Self::clear_forward(&mut self.entries, current + 1, range);
    }

    fn clear_forward(entries: &mut VecDeque<HistoryEntry>, from: usize, range: CellRange) {
        for entry in entries.iter_mut().skip(from) {
            if entry.copy_range != Some(range) {
                break;
            }
            entry.copy_range = None;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn saved_index(&self) -> SavedIndex {
        self.saved
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Description of the command the next undo would revert.
    pub fn undo_description(&self) -> Option<String> {
        self.current.map(|index| self.entries[index].command.description())
    }

    fn notify(&mut self) {
        let dirty = self.is_dirty();
        for listener in &mut self.listeners {
            listener(dirty);
        }
    }
}
