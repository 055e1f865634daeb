use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Arena units per render unit.
pub const SCALE_FACTOR: f32 = 10.0;
/// Arena units travelled per input tick on each held axis.
pub const MOVE_SPEED: f32 = 5.0;
pub const INPUT_TICK_MS: u64 = 30;
pub const CAMERA_TRANSITION_MS: u64 = 50;
/// Follow offset from the player in render units: lateral, height, depth.
pub const CAMERA_OFFSET: [f32; 3] = [-2.0, 4.0, 8.0];
pub const CLIENT_VERSION: u32 = 1;
pub const MAX_DATAGRAM: usize = 65_536;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    // client -> server
    Connect {
        client_version: u32,
    },
    PlayerMove {
        x: f32,
        y: f32,
        direction: Direction,
    },
    PlayerIdle,
    PlayerAttack,
    PlayerBlock,
    Restart,
    Disconnect,

    // server -> client
    Connected,
    GameState {
        players: HashMap<String, PlayerState>,
    },
    PlayerJoined {
        id: String,
    },
    PlayerDied(DeathStats),
    PlayerRestarted {
        id: String,
    },
    Queued {
        position: u32,
    },
    Disconnected {
        reason: String,
    },
}

impl Packet {
    /// Event name as used on the wire contract.
    pub fn event_name(&self) -> &'static str {
        match self {
            Packet::Connect { .. } => "connect",
            Packet::PlayerMove { .. } => "playerMove",
            Packet::PlayerIdle => "playerIdle",
            Packet::PlayerAttack => "playerAttack",
            Packet::PlayerBlock => "playerBlock",
            Packet::Restart => "restart",
            Packet::Disconnect => "disconnect",
            Packet::Connected => "connected",
            Packet::GameState { .. } => "gameState",
            Packet::PlayerJoined { .. } => "playerJoined",
            Packet::PlayerDied(_) => "playerDied",
            Packet::PlayerRestarted { .. } => "playerRestarted",
            Packet::Queued { .. } => "queued",
            Packet::Disconnected { .. } => "disconnected",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    #[default]
    Neutral,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Idle,
    Attack,
    Block,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub direction: Direction,
    pub action: Action,
    pub health: f32,
    pub score: u32,
    pub survival_time: u32,
    pub is_dead: bool,
    pub is_bot: bool,
    pub color: String,
}

impl PlayerState {
    pub fn new(id: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            direction: Direction::Neutral,
            action: Action::Idle,
            health: 100.0,
            score: 0,
            survival_time: 0,
            is_dead: false,
            is_bot: false,
            color: String::from("#3498db"),
        }
    }

    pub fn bot(id: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            is_bot: true,
            color: String::from("#e74c3c"),
            ..Self::new(id, x, y)
        }
    }
}

/// Score and survival time frozen at the moment of death.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeathStats {
    pub score: u32,
    pub survival_time: u32,
}

pub fn encode(packet: &Packet) -> Result<Vec<u8>, bincode::Error> {
    bincode::serialize(packet)
}

pub fn decode(bytes: &[u8]) -> Result<Packet, bincode::Error> {
    bincode::deserialize(bytes)
}
