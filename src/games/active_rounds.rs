use crate::games::crash::CrashRound;
use crate::games::mines::MinesRound;
use crate::ledger::Reservation;
use dashmap::DashMap;
use std::time::{Duration, Instant};

/// An interactive round that has committed its stake but not yet settled
pub enum ActiveRound {
    Crash(CrashRound),
    Mines(MinesRound),
}

impl ActiveRound {
    pub fn id(&self) -> &str {
        match self {
            ActiveRound::Crash(r) => r.id(),
            ActiveRound::Mines(r) => r.id(),
        }
    }
}

/// Pool entry pairing the machine with its ledger reservation
pub struct ActiveEntry {
    pub round: ActiveRound,
    pub reservation: Reservation,
    pub committed_at: Instant,
}

/// Thread-safe pool of committed rounds awaiting resolution
pub struct ActiveRoundsPool {
    rounds: DashMap<String, ActiveEntry>,
}

impl ActiveRoundsPool {
    pub fn new() -> Self {
        Self {
            rounds: DashMap::new(),
        }
    }

    /// Track a committed round
    pub fn insert(&self, round: ActiveRound, reservation: Reservation) {
        let id = round.id().to_string();
        self.rounds.insert(
            id,
            ActiveEntry {
                round,
                reservation,
                committed_at: Instant::now(),
            },
        );
    }

    /// Remove a round for settlement
    pub fn take(&self, round_id: &str) -> Option<ActiveEntry> {
        self.rounds.remove(round_id).map(|(_, entry)| entry)
    }

    /// Mutate a round in place (non-terminal reveals and ticks)
    pub fn with_mut<T>(
        &self,
        round_id: &str,
        f: impl FnOnce(&mut ActiveRound) -> T,
    ) -> Option<T> {
        self.rounds
            .get_mut(round_id)
            .map(|mut entry| f(&mut entry.round))
    }

    pub fn active_count(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    /// Remove every round resolving longer than the deadline
    pub fn drain_expired(&self, deadline: Duration) -> Vec<ActiveEntry> {
        let expired: Vec<String> = self
            .rounds
            .iter()
            .filter(|entry| entry.committed_at.elapsed() > deadline)
            .map(|entry| entry.key().clone())
            .collect();
        expired
            .into_iter()
            .filter_map(|id| self.take(&id))
            .collect()
    }

    /// Remove every active round (engine teardown)
    pub fn drain_all(&self) -> Vec<ActiveEntry> {
        let ids: Vec<String> = self.rounds.iter().map(|e| e.key().clone()).collect();
        ids.into_iter().filter_map(|id| self.take(&id)).collect()
    }
}

impl Default for ActiveRoundsPool {
    fn default() -> Self {
        Self::new()
    }
}
