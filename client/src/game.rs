use log::debug;
use macroquad::math::{vec3, Vec3};
use shared::{DeathStats, PlayerState, SCALE_FACTOR};
use std::collections::HashMap;

/// Maps arena coordinates onto the render plane (arena y becomes depth).
pub fn to_render_space(x: f32, y: f32) -> Vec3 {
    vec3(x / SCALE_FACTOR, 0.0, y / SCALE_FACTOR)
}

/// Mirror of the last authoritative snapshot plus the values derived from it.
#[derive(Debug, Clone, Default)]
pub struct StateSynchronizer {
    players: HashMap<String, PlayerState>,
    human_count: usize,
    bot_count: usize,
    score: u32,
    survival_time: u32,
    last_local_position: Vec3,
}

impl StateSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the mirror wholesale. Local-player fields are only refreshed
    /// when `local_id` is present in the new snapshot.
    pub fn apply_snapshot(
        &mut self,
        players: HashMap<String, PlayerState>,
        local_id: Option<&str>,
    ) -> Option<&PlayerState> {
        self.players = players;

        self.bot_count = self.players.values().filter(|p| p.is_bot).count();
        self.human_count = self.players.len() - self.bot_count;

        let local = local_id.and_then(|id| self.players.get(id));
        match local {
            Some(player) => {
                self.score = player.score;
                self.survival_time = player.survival_time;
                self.last_local_position = to_render_space(player.x, player.y);
            }
            None => {
                if let Some(id) = local_id {
                    debug!("Local player {} missing from snapshot", id);
                }
            }
        }
        local
    }

    pub fn player(&self, id: &str) -> Option<&PlayerState> {
        self.players.get(id)
    }

    /// The local entry, but only while it is alive.
    pub fn alive_player(&self, id: Option<&str>) -> Option<&PlayerState> {
        id.and_then(|id| self.players.get(id))
            .filter(|player| !player.is_dead)
    }

    pub fn players(&self) -> &HashMap<String, PlayerState> {
        &self.players
    }

    pub fn human_count(&self) -> usize {
        self.human_count
    }

    pub fn bot_count(&self) -> usize {
        self.bot_count
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn survival_time(&self) -> u32 {
        self.survival_time
    }

    /// Last known local position in render units; survives removal of the entry.
    pub fn last_local_position(&self) -> Vec3 {
        self.last_local_position
    }

    pub fn record_death(&mut self, stats: DeathStats) {
        self.score = stats.score;
        self.survival_time = stats.survival_time;
    }

    pub fn reset_local_stats(&mut self) {
        self.score = 0;
        self.survival_time = 0;
    }
}
