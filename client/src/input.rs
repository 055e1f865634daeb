//! Key-state table and fixed-rate movement sampling

use shared::{Direction, Packet, PlayerState, MOVE_SPEED};
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Logical keys the client reacts to, independent of the physical keyboard layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    Attack,
    Block,
    ToggleCamera,
    Recenter,
}

impl Key {
    pub fn is_movement(self) -> bool {
        matches!(self, Key::Up | Key::Down | Key::Left | Key::Right)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Pressed(Key),
    Released(Key),
}

/// Pressed-state per logical key. Written only through [`InputSampler::handle_edge`].
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pressed: HashMap<Key, bool>,
}

impl InputState {
    pub fn is_down(&self, key: Key) -> bool {
        self.pressed.get(&key).copied().unwrap_or(false)
    }

    pub fn any_movement(&self) -> bool {
        self.pressed
            .iter()
            .any(|(key, down)| *down && key.is_movement())
    }
}

/// Physical keys held per logical key. Aliases such as W and Up share a
/// logical key; it is released only when the last of them goes up.
#[derive(Debug, Clone)]
pub struct HeldKeys<P> {
    held: HashMap<Key, HashSet<P>>,
}

impl<P: Eq + Hash> HeldKeys<P> {
    pub fn new() -> Self {
        Self {
            held: HashMap::new(),
        }
    }

    /// A pressed edge for the first physical key held for `key`, otherwise nothing.
    pub fn press(&mut self, physical: P, key: Key) -> Option<KeyEdge> {
        let held = self.held.entry(key).or_default();
        let first = held.is_empty();
        (held.insert(physical) && first).then_some(KeyEdge::Pressed(key))
    }

    /// A released edge once no physical key is left holding `key`.
    pub fn release(&mut self, physical: P, key: Key) -> Option<KeyEdge> {
        let held = self.held.get_mut(&key)?;
        (held.remove(&physical) && held.is_empty()).then_some(KeyEdge::Released(key))
    }
}

impl<P: Eq + Hash> Default for HeldKeys<P> {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns key edges and the held-key table into outbound commands
#[derive(Debug, Default)]
pub struct InputSampler {
    state: InputState,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &InputState {
        &self.state
    }

    /// Records a key edge. Attack and block fire once on release, and only
    /// when the session has an assigned identity.
    pub fn handle_edge(&mut self, edge: KeyEdge, has_identity: bool) -> Option<Packet> {
        match edge {
            KeyEdge::Pressed(key) => {
                self.state.pressed.insert(key, true);
                None
            }
            KeyEdge::Released(key) => {
                let was_down = self.state.is_down(key);
                self.state.pressed.insert(key, false);

                if !was_down || !has_identity {
                    return None;
                }
                match key {
                    Key::Attack => Some(Packet::PlayerAttack),
                    Key::Block => Some(Packet::PlayerBlock),
                    _ => None,
                }
            }
        }
    }

    /// One sampling tick against the last mirrored position of the local player.
    pub fn tick(&self, local: &PlayerState) -> Vec<Packet> {
        let mut commands = Vec::new();

        let mut x = local.x;
        let mut y = local.y;
        let mut direction = local.direction;

        if self.state.is_down(Key::Up) {
            y -= MOVE_SPEED;
        }
        if self.state.is_down(Key::Down) {
            y += MOVE_SPEED;
        }
        if self.state.is_down(Key::Left) {
            x -= MOVE_SPEED;
            direction = Direction::Left;
        }
        if self.state.is_down(Key::Right) {
            x += MOVE_SPEED;
            direction = Direction::Right;
        }

        if x != local.x || y != local.y {
            commands.push(Packet::PlayerMove { x, y, direction });
        }

        if !self.state.any_movement() {
            commands.push(Packet::PlayerIdle);
        }

        commands
    }

    /// Forgets every held key, e.g. when the session ends.
    pub fn clear(&mut self) {
        self.state.pressed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn me() -> PlayerState {
        PlayerState::new("p1", 100.0, 100.0)
    }

    #[test]
    fn test_no_keys_emits_idle_only() {
        let sampler = InputSampler::new();
        assert_eq!(sampler.tick(&me()), vec![Packet::PlayerIdle]);
    }

    #[test]
    fn test_held_right_moves_and_faces_right() {
        let mut sampler = InputSampler::new();
        sampler.handle_edge(KeyEdge::Pressed(Key::Right), true);

        assert_eq!(
            sampler.tick(&me()),
            vec![Packet::PlayerMove {
                x: 105.0,
                y: 100.0,
                direction: Direction::Right,
            }]
        );
    }

    #[test]
    fn test_up_decreases_vertical_axis_and_keeps_direction() {
        let mut sampler = InputSampler::new();
        let mut player = me();
        player.direction = Direction::Left;
        sampler.handle_edge(KeyEdge::Pressed(Key::Up), true);

        assert_eq!(
            sampler.tick(&player),
            vec![Packet::PlayerMove {
                x: 100.0,
                y: 95.0,
                direction: Direction::Left,
            }]
        );
    }

    #[test]
    fn test_opposing_keys_cancel_without_move() {
        let mut sampler = InputSampler::new();
        sampler.handle_edge(KeyEdge::Pressed(Key::Left), true);
        sampler.handle_edge(KeyEdge::Pressed(Key::Right), true);

        // Position unchanged, but a movement key is held: nothing goes out.
        assert!(sampler.tick(&me()).is_empty());
    }

    #[test]
    fn test_release_reports_idle() {
        let mut sampler = InputSampler::new();
        sampler.handle_edge(KeyEdge::Pressed(Key::Down), true);
        assert_eq!(sampler.tick(&me()).len(), 1);

        sampler.handle_edge(KeyEdge::Released(Key::Down), true);
        assert_eq!(sampler.tick(&me()), vec![Packet::PlayerIdle]);
    }

    #[test]
    fn test_non_movement_key_does_not_block_idle() {
        let mut sampler = InputSampler::new();
        sampler.handle_edge(KeyEdge::Pressed(Key::Attack), true);
        assert_eq!(sampler.tick(&me()), vec![Packet::PlayerIdle]);
    }

    #[test]
    fn test_attack_fires_once_on_release() {
        let mut sampler = InputSampler::new();
        assert_eq!(sampler.handle_edge(KeyEdge::Pressed(Key::Attack), true), None);
        assert_eq!(sampler.handle_edge(KeyEdge::Pressed(Key::Attack), true), None);
        assert_eq!(
            sampler.handle_edge(KeyEdge::Released(Key::Attack), true),
            Some(Packet::PlayerAttack)
        );
        // A second release without a press is not a new cycle.
        assert_eq!(sampler.handle_edge(KeyEdge::Released(Key::Attack), true), None);
    }

    #[test]
    fn test_block_fires_on_release() {
        let mut sampler = InputSampler::new();
        sampler.handle_edge(KeyEdge::Pressed(Key::Block), true);
        assert_eq!(
            sampler.handle_edge(KeyEdge::Released(Key::Block), true),
            Some(Packet::PlayerBlock)
        );
    }

    #[test]
    fn test_actions_need_identity() {
        let mut sampler = InputSampler::new();
        sampler.handle_edge(KeyEdge::Pressed(Key::Attack), false);
        assert_eq!(sampler.handle_edge(KeyEdge::Released(Key::Attack), false), None);
        assert!(!sampler.state().is_down(Key::Attack));
    }

    #[test]
    fn test_aliased_keys_release_on_last() {
        let mut held = HeldKeys::new();
        assert_eq!(held.press('w', Key::Up), Some(KeyEdge::Pressed(Key::Up)));
        assert_eq!(held.press('^', Key::Up), None);

        // W up while the arrow is still held keeps moving.
        assert_eq!(held.release('w', Key::Up), None);
        assert_eq!(held.release('^', Key::Up), Some(KeyEdge::Released(Key::Up)));
    }

    #[test]
    fn test_held_keys_ignore_unknown_release_and_repeat() {
        let mut held = HeldKeys::new();
        assert_eq!(held.release('a', Key::Left), None);

        assert_eq!(held.press('a', Key::Left), Some(KeyEdge::Pressed(Key::Left)));
        assert_eq!(held.press('a', Key::Left), None);
        assert_eq!(held.release('a', Key::Left), Some(KeyEdge::Released(Key::Left)));
        assert_eq!(held.release('a', Key::Left), None);
    }

    #[test]
    fn test_aliases_keep_sampler_moving() {
        let mut held = HeldKeys::new();
        let mut sampler = InputSampler::new();

        for edge in [held.press('d', Key::Right), held.press('>', Key::Right)]
            .into_iter()
            .flatten()
        {
            sampler.handle_edge(edge, true);
        }
        if let Some(edge) = held.release('d', Key::Right) {
            sampler.handle_edge(edge, true);
        }

        assert_eq!(
            sampler.tick(&me()),
            vec![Packet::PlayerMove {
                x: 105.0,
                y: 100.0,
                direction: Direction::Right,
            }]
        );
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut sampler = InputSampler::new();
        sampler.handle_edge(KeyEdge::Pressed(Key::Left), true);
        sampler.clear();
        assert!(!sampler.state().any_movement());
    }
}
