//! Move counter
//!
//! Counts rolls for the current level and across a session. Fed from the
//! simulation's event stream.

use serde::{Deserialize, Serialize};

use crate::sim::GameEvent;

/// Per-level and running move totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveCounter {
    /// Rolls since the current level started
    pub level_moves: u32,
    /// Rolls across every level played
    pub total_moves: u32,
    /// `total_moves` when the current level started
    pub total_at_level_start: u32,
}

impl MoveCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_move(&mut self) {
        self.level_moves += 1;
        self.total_moves += 1;
    }

    /// Count a `Moved` event; everything else is ignored
    pub fn observe(&mut self, event: &GameEvent) {
        if let GameEvent::Moved { .. } = event {
            self.add_move();
        }
    }

    /// Throw away this level's moves
    pub fn restart_level(&mut self) {
        self.total_moves = self.total_at_level_start;
        self.level_moves = 0;
    }

    /// Keep this level's moves and start counting the next one
    pub fn complete_level(&mut self) {
        log::info!(
            "Level finished in {} moves ({} total)",
            self.level_moves,
            self.total_moves
        );
        self.total_at_level_start = self.total_moves;
        self.level_moves = 0;
    }

    pub fn reset_all(&mut self) {
        *self = Self::default();
    }
}
