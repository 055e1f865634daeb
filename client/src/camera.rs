//! Follow/Free camera state machine with a timed transition lock

use log::{debug, info};
use macroquad::math::{vec3, Vec3};
use shared::{CAMERA_OFFSET, CAMERA_TRANSITION_MS};
use std::f32::consts::PI;
use tokio::time::{Duration, Instant};

pub const MIN_DISTANCE: f32 = 3.0;
pub const MAX_DISTANCE: f32 = 50.0;
pub const MAX_POLAR_ANGLE: f32 = PI / 2.1;
const MIN_POLAR_ANGLE: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    Follow,
    Free,
}

/// What happens when a pending transition's timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transition {
    Flip,
    EnterFollow,
    /// Superseded by death or reset; only the lock is released.
    Unlock,
}

#[derive(Debug, Clone, Copy)]
struct PendingTransition {
    due: Instant,
    transition: Transition,
}

pub fn follow_offset() -> Vec3 {
    vec3(CAMERA_OFFSET[0], CAMERA_OFFSET[1], CAMERA_OFFSET[2])
}

#[derive(Debug, Clone)]
pub struct CameraController {
    mode: CameraMode,
    position: Vec3,
    target: Vec3,
    pending: Option<PendingTransition>,
    delay: Duration,
}

impl CameraController {
    pub fn new() -> Self {
        Self {
            mode: CameraMode::Follow,
            position: vec3(0.0, 4.0, 10.0),
            target: Vec3::ZERO,
            pending: None,
            delay: Duration::from_millis(CAMERA_TRANSITION_MS),
        }
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn is_locked(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending transition, if any, is due.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|pending| pending.due)
    }

    /// Manual Follow/Free toggle. Dropped while locked.
    pub fn request_toggle(&mut self, now: Instant, local_position: Option<Vec3>) -> bool {
        if self.is_locked() {
            debug!("Camera toggle dropped: transition in progress");
            return false;
        }

        if self.mode == CameraMode::Follow {
            if let Some(position) = local_position {
                self.target = position;
            }
        }

        self.lock(now, Transition::Flip);
        true
    }

    /// One-shot move behind the local player, then Follow once the lock clears.
    /// Only valid in Free mode with a live local player.
    pub fn request_recenter(&mut self, now: Instant, alive_position: Option<Vec3>) -> bool {
        let Some(position) = alive_position else {
            return false;
        };
        if self.mode != CameraMode::Free || self.is_locked() {
            return false;
        }

        self.place_behind(position);
        self.lock(now, Transition::EnterFollow);
        true
    }

    /// Applies the pending transition once its deadline has passed.
    pub fn poll(&mut self, now: Instant, local_position: Option<Vec3>) -> bool {
        let Some(pending) = self.pending else {
            return false;
        };
        if now < pending.due {
            return false;
        }
        self.pending = None;

        let next = match pending.transition {
            Transition::Flip => match self.mode {
                CameraMode::Follow => CameraMode::Free,
                CameraMode::Free => CameraMode::Follow,
            },
            Transition::EnterFollow => CameraMode::Follow,
            Transition::Unlock => return true,
        };

        if next != self.mode {
            info!("Camera mode: {:?} -> {:?}", self.mode, next);
        }
        self.mode = next;

        if self.mode == CameraMode::Follow {
            if let Some(position) = local_position {
                self.place_behind(position);
            }
        }
        true
    }

    /// Continuous recompute after a snapshot. Skipped in Free mode or while locked.
    pub fn follow(&mut self, local_position: Vec3) {
        if self.mode == CameraMode::Follow && !self.is_locked() {
            self.place_behind(local_position);
        }
    }

    /// Death always wins: Free immediately, any pending transition only unlocks.
    pub fn force_free(&mut self) {
        if self.mode != CameraMode::Free {
            info!("Camera mode: {:?} -> Free (local player died)", self.mode);
        }
        self.mode = CameraMode::Free;
        self.demote_pending();
    }

    /// Join or restart: back to Follow regardless of the lock.
    pub fn reset(&mut self) {
        self.mode = CameraMode::Follow;
        self.demote_pending();
    }

    /// Drops a pending transition without applying it.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Free-mode rotation of the position around the target.
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        if self.mode != CameraMode::Free || self.is_locked() {
            return;
        }

        let offset = self.position - self.target;
        let radius = offset.length().max(MIN_DISTANCE);
        let azimuth = offset.x.atan2(offset.z) + yaw;
        let polar = ((offset.y / radius).clamp(-1.0, 1.0).acos() + pitch)
            .clamp(MIN_POLAR_ANGLE, MAX_POLAR_ANGLE);

        self.position = self.target + spherical(radius, polar, azimuth);
    }

    /// Free-mode zoom; `factor` < 1 moves closer.
    pub fn zoom(&mut self, factor: f32) {
        if self.mode != CameraMode::Free || self.is_locked() || factor <= 0.0 {
            return;
        }

        let offset = self.position - self.target;
        let radius = offset.length();
        if radius <= f32::EPSILON {
            return;
        }
        let scaled = (radius * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.position = self.target + offset * (scaled / radius);
    }

    fn place_behind(&mut self, position: Vec3) {
        self.target = position;
        self.position = position + follow_offset();
    }

    fn lock(&mut self, now: Instant, transition: Transition) {
        self.pending = Some(PendingTransition {
            due: now + self.delay,
            transition,
        });
    }

    fn demote_pending(&mut self) {
        if let Some(pending) = self.pending.as_mut() {
            pending.transition = Transition::Unlock;
        }
    }
}

impl Default for CameraController {
    fn default() -> Self {
        Self::new()
    }
}

fn spherical(radius: f32, polar: f32, azimuth: f32) -> Vec3 {
    vec3(
        radius * polar.sin() * azimuth.sin(),
        radius * polar.cos(),
        radius * polar.sin() * azimuth.cos(),
    )
}
