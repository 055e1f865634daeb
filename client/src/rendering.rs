use crate::camera::CameraMode;
use crate::game::to_render_space;
use crate::hud::{
    format_time, health_fraction, health_level, parse_color, player_label, HealthLevel,
};
use crate::network::{ClientView, ConnectionStatus};
use macroquad::prelude::*;
use shared::{Action, Direction, PlayerState};

const ARENA_SIZE: f32 = 200.0;
const BODY_SIZE: Vec3 = Vec3::new(0.3, 0.6, 0.3);
const HEAD_RADIUS: f32 = 0.12;
const FONT_SIZE: f32 = 20.0;

const CONTROLS: [(&str, &str); 10] = [
    ("W / Up", "Move up"),
    ("A / Left", "Move left"),
    ("S / Down", "Move down"),
    ("D / Right", "Move right"),
    ("Space", "Attack (on release)"),
    ("Shift", "Block (on release)"),
    ("C", "Toggle camera Follow/Free"),
    ("G", "Go to player (Free mode)"),
    ("Drag / Wheel", "Rotate / zoom in Free mode"),
    ("H", "Toggle this help"),
];

/// Draws a [`ClientView`]; holds no game state of its own.
pub struct Renderer {
    show_help: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer { show_help: false }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn render(&mut self, view: &ClientView) {
        clear_background(Color::from_rgba(26, 26, 26, 255));

        let camera = Camera3D {
            position: view.camera.position,
            target: view.camera.target,
            up: vec3(0.0, 1.0, 0.0),
            fovy: 60.0_f32.to_radians(),
            ..Default::default()
        };
        set_camera(&camera);

        self.draw_arena();
        for player in &view.players {
            let is_local = view.local_id.as_deref() == Some(player.id.as_str());
            self.draw_player(player, is_local);
        }

        let matrix = camera.matrix();
        set_default_camera();

        for player in &view.players {
            self.draw_player_label(player, matrix);
        }
        self.draw_hud(view);

        if self.show_help {
            self.draw_help();
        }
        if view.is_dead {
            if let Some(stats) = view.death_stats {
                self.draw_death_banner(stats.score, stats.survival_time);
            }
        }
        if let Some(position) = view.queue_position {
            self.draw_queue_banner(position);
        }
    }

    fn draw_arena(&mut self) {
        draw_plane(
            vec3(0.0, -0.01, 0.0),
            vec2(ARENA_SIZE / 2.0, ARENA_SIZE / 2.0),
            None,
            Color::from_rgba(44, 62, 80, 255),
        );
        draw_grid(
            ARENA_SIZE as u32,
            1.0,
            Color::from_rgba(52, 73, 94, 255),
            Color::from_rgba(52, 73, 94, 255),
        );
    }

    fn draw_player(&mut self, player: &PlayerState, is_local: bool) {
        let base = to_render_space(player.x, player.y);
        let color = player_color(player);

        if player.is_dead {
            draw_cube(
                base + vec3(0.0, 0.05, 0.0),
                vec3(BODY_SIZE.y, 0.1, BODY_SIZE.x),
                None,
                color,
            );
            draw_sphere(base + vec3(0.0, 0.15, 0.0), 0.05, None, RED);
            return;
        }

        let body = base + vec3(0.0, BODY_SIZE.y / 2.0, 0.0);
        draw_cube(body, BODY_SIZE, None, color);
        draw_sphere(
            base + vec3(0.0, BODY_SIZE.y + HEAD_RADIUS, 0.0),
            HEAD_RADIUS,
            None,
            color,
        );

        let facing = match player.direction {
            Direction::Left => -1.0,
            Direction::Right | Direction::Neutral => 1.0,
        };
        let hand = body + vec3(facing * 0.25, 0.1, 0.0);
        match player.action {
            Action::Attack => draw_cube(hand, vec3(0.35, 0.05, 0.05), None, YELLOW),
            Action::Block => draw_cube(hand, vec3(0.05, 0.4, 0.3), None, SKYBLUE),
            Action::Idle => draw_sphere(hand, 0.04, None, color),
        }

        if is_local {
            draw_cube_wires(body, BODY_SIZE * 1.15, WHITE);
        }
    }

    fn draw_player_label(&mut self, player: &PlayerState, matrix: Mat4) {
        let anchor = to_render_space(player.x, player.y) + vec3(0.0, 1.2, 0.0);
        let clip = matrix * anchor.extend(1.0);
        if clip.w <= 0.0 {
            return;
        }
        let ndc = clip.truncate() / clip.w;
        let x = (ndc.x + 1.0) / 2.0 * screen_width();
        let y = (1.0 - ndc.y) / 2.0 * screen_height();

        let mut label = player_label(player);
        if player.is_dead {
            label.push_str(" (dead)");
        }
        let size = measure_text(&label, None, 16, 1.0);
        draw_text(&label, x - size.width / 2.0, y, 16.0, WHITE);

        if !player.is_dead {
            let bar_width = 60.0;
            let bar_color = match health_level(player.health) {
                HealthLevel::Healthy => Color::from_rgba(46, 204, 113, 255),
                HealthLevel::Warning => Color::from_rgba(243, 156, 18, 255),
                HealthLevel::Critical => Color::from_rgba(231, 76, 60, 255),
            };
            let left = x - bar_width / 2.0;
            draw_rectangle(left, y + 4.0, bar_width, 5.0, Color::from_rgba(51, 51, 51, 255));
            draw_rectangle(
                left,
                y + 4.0,
                bar_width * health_fraction(player.health),
                5.0,
                bar_color,
            );
        }
    }

    fn draw_hud(&mut self, view: &ClientView) {
        let mut y = 30.0;
        let line = FONT_SIZE + 6.0;

        if view.local_player().is_some() && !view.is_dead {
            draw_text(&format!("Score: {}", view.score), 10.0, y, FONT_SIZE, GOLD);
            y += line;
            draw_text(
                &format!("Time: {}", format_time(view.survival_time)),
                10.0,
                y,
                FONT_SIZE,
                WHITE,
            );
            y += line;
        }

        draw_text(
            &format!("Players: {}  Bots: {}", view.human_count, view.bot_count),
            10.0,
            y,
            FONT_SIZE,
            WHITE,
        );
        y += line;

        let status_color = match view.status {
            ConnectionStatus::Connected => GREEN,
            ConnectionStatus::Connecting => YELLOW,
            ConnectionStatus::Error(_) => RED,
        };
        draw_text(&view.status.to_string(), 10.0, y, FONT_SIZE, status_color);

        let mode = match view.camera.mode {
            CameraMode::Follow => "Camera: Follow",
            CameraMode::Free => "Camera: Free",
        };
        let right = screen_width() - 220.0;
        draw_text(mode, right, 30.0, FONT_SIZE, WHITE);
        draw_text("Press C to toggle", right, 30.0 + line, 16.0, LIGHTGRAY);
        if view.can_recenter() {
            draw_text("Press G to go to player", right, 30.0 + 2.0 * line, 16.0, LIGHTGRAY);
        }
        draw_text("H: controls", 10.0, screen_height() - 12.0, 16.0, LIGHTGRAY);
    }

    fn draw_help(&mut self) {
        let width = 360.0;
        let height = 40.0 + CONTROLS.len() as f32 * 22.0;
        let left = (screen_width() - width) / 2.0;
        let top = 60.0;

        draw_rectangle(left, top, width, height, Color::from_rgba(0, 0, 0, 200));
        draw_rectangle_lines(left, top, width, height, 1.0, WHITE);
        draw_text("Game Controls", left + 12.0, top + 26.0, 22.0, WHITE);

        for (i, (keys, description)) in CONTROLS.iter().enumerate() {
            let y = top + 52.0 + i as f32 * 22.0;
            draw_text(keys, left + 12.0, y, 18.0, GOLD);
            draw_text(description, left + 130.0, y, 18.0, WHITE);
        }
    }

    fn draw_death_banner(&mut self, score: u32, survival_time: u32) {
        let score = format!("Final Score: {}", score);
        let time = format!("Survival Time: {}", format_time(survival_time));
        self.draw_banner(&[
            ("Game Over", 40.0, RED),
            (score.as_str(), 24.0, WHITE),
            (time.as_str(), 24.0, WHITE),
            ("Press R to play again", 20.0, LIGHTGRAY),
        ]);
    }

    fn draw_queue_banner(&mut self, position: u32) {
        let position = format!("Your position in queue: {}", position);
        self.draw_banner(&[
            ("Waiting to Join", 36.0, WHITE),
            (position.as_str(), 24.0, GOLD),
            ("You will join when a spot opens up", 18.0, LIGHTGRAY),
        ]);
    }

    fn draw_banner(&mut self, lines: &[(&str, f32, Color)]) {
        let width = 420.0;
        let height = 30.0 + lines.iter().map(|(_, size, _)| size + 12.0).sum::<f32>();
        let left = (screen_width() - width) / 2.0;
        let top = (screen_height() - height) / 2.0;

        draw_rectangle(left, top, width, height, Color::from_rgba(0, 0, 0, 210));

        let mut y = top + 15.0;
        for (text, size, color) in lines {
            y += size + 6.0;
            let dims = measure_text(text, None, *size as u16, 1.0);
            draw_text(text, left + (width - dims.width) / 2.0, y, *size, *color);
            y += 6.0;
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

fn player_color(player: &PlayerState) -> Color {
    match parse_color(&player.color) {
        Some((r, g, b)) => Color::from_rgba(r, g, b, 255),
        None => Color::from_rgba(136, 136, 136, 255),
    }
}
