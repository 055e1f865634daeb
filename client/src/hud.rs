//! Pure formatting helpers for the HUD overlays

use shared::PlayerState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthLevel {
    Healthy,
    Warning,
    Critical,
}

/// `m:ss`
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Buckets health for display; the value itself is not clamped.
pub fn health_level(health: f32) -> HealthLevel {
    if health > 50.0 {
        HealthLevel::Healthy
    } else if health > 20.0 {
        HealthLevel::Warning
    } else {
        HealthLevel::Critical
    }
}

/// Health as a bar fraction in [0, 1].
pub fn health_fraction(health: f32) -> f32 {
    (health / 100.0).clamp(0.0, 1.0)
}

pub fn player_label(player: &PlayerState) -> String {
    if player.is_bot {
        let number = player.id.split('-').nth(1).unwrap_or(&player.id);
        format!("Bot {}", number)
    } else {
        let short: String = player.id.chars().take(4).collect();
        format!("Player {}", short)
    }
}

/// Parses `#rrggbb`.
pub fn parse_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}
