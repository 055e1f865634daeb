//! Identity, queue and death/restart tracking for the local player

use log::{info, warn};
use shared::{DeathStats, Packet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Unassigned,
    Queued(u32),
    Joined(String),
}

#[derive(Debug, Clone)]
pub struct LifecycleController {
    state: LifecycleState,
    dead: bool,
    death_stats: Option<DeathStats>,
}

impl LifecycleController {
    pub fn new() -> Self {
        Self {
            state: LifecycleState::Unassigned,
            dead: false,
            death_stats: None,
        }
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn identity(&self) -> Option<&str> {
        match &self.state {
            LifecycleState::Joined(id) => Some(id),
            _ => None,
        }
    }

    pub fn queue_position(&self) -> Option<u32> {
        match self.state {
            LifecycleState::Queued(position) => Some(position),
            _ => None,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn death_stats(&self) -> Option<DeathStats> {
        self.death_stats
    }

    pub fn queued(&mut self, position: u32) {
        info!("Queued at position {}", position);
        self.state = LifecycleState::Queued(position);
    }

    pub fn joined(&mut self, id: String) {
        info!("Joined game with player ID: {}", id);
        self.state = LifecycleState::Joined(id);
        self.dead = false;
        self.death_stats = None;
    }

    /// Returns false when there is no joined player to attach the stats to.
    pub fn died(&mut self, stats: DeathStats) -> bool {
        if self.identity().is_none() {
            warn!("Death notice without a joined player, ignoring");
            return false;
        }
        info!(
            "Player died: score {}, survived {}s",
            stats.score, stats.survival_time
        );
        self.dead = true;
        self.death_stats = Some(stats);
        true
    }

    /// Death seen in a snapshot before (or without) the explicit notice.
    pub fn observe_death(&mut self) -> bool {
        if self.dead || self.identity().is_none() {
            return false;
        }
        self.dead = true;
        true
    }

    /// Respawn confirmed by the server. Only a joined player can restart.
    pub fn restarted(&mut self, id: String) -> bool {
        let Some(current) = self.identity() else {
            warn!("Restart confirmed for {} without a joined player, ignoring", id);
            return false;
        };
        if current != id {
            warn!("Restart confirmed for {} while joined as {}", id, current);
        }
        self.state = LifecycleState::Joined(id);
        self.dead = false;
        self.death_stats = None;
        true
    }

    /// User request to respawn; nothing changes locally until the server confirms.
    pub fn restart(&self) -> Option<Packet> {
        self.identity().map(|_| Packet::Restart)
    }

    pub fn disconnected(&mut self) {
        self.state = LifecycleState::Unassigned;
        self.dead = false;
        self.death_stats = None;
    }
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new()
    }
}
