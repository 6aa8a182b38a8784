//! Logical turn clock.
//!
//! Combat turns are separated by a fixed pause. Instead of sleeping, the
//! engine queues a continuation here and runs it once the host advances the
//! clock past its due time. Cancelled tickets never come back out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnActor {
    Player,
    Monster,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnTicket {
    pub id: u64,
    pub encounter_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTurn {
    pub ticket: TurnTicket,
    pub actor: TurnActor,
    pub due_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct TurnScheduler {
    now_ms: u64,
    next_ticket: u64,
    /// Keyed by (due time, ticket id) so due turns pop out in order
    queue: BTreeMap<(u64, u64), ScheduledTurn>,
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty()
    }

    /// Due time of the earliest queued turn
    pub fn next_due(&self) -> Option<u64> {
        self.queue.keys().next().map(|(due, _)| *due)
    }

    pub fn schedule(&mut self, encounter_id: u64, actor: TurnActor, delay_ms: u64) -> TurnTicket {
        self.next_ticket += 1;
        let ticket = TurnTicket {
            id: self.next_ticket,
            encounter_id,
        };
        let due_ms = self.now_ms.saturating_add(delay_ms);
        self.queue.insert(
            (due_ms, ticket.id),
            ScheduledTurn {
                ticket,
                actor,
                due_ms,
            },
        );
        trace!(encounter_id, ?actor, due_ms, "turn scheduled");
        ticket
    }

    /// Drop every queued turn of one encounter. Returns how many were dropped.
    pub fn cancel_encounter(&mut self, encounter_id: u64) -> usize {
        let before = self.queue.len();
        self.queue.retain(|_, turn| turn.ticket.encounter_id != encounter_id);
        before - self.queue.len()
    }

    pub fn cancel_all(&mut self) -> usize {
        let dropped = self.queue.len();
        self.queue.clear();
        dropped
    }

    /// Move the clock forward and hand back the turns that fell due
    pub fn advance(&mut self, ms: u64) -> Vec<ScheduledTurn> {
        self.now_ms = self.now_ms.saturating_add(ms);
        let later = self.queue.split_off(&(self.now_ms.saturating_add(1), 0));
        let due = std::mem::replace(&mut self.queue, later);
        due.into_values().collect()
    }
}
