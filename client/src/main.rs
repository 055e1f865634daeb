use clap::Parser;
use client::camera::CameraMode;
use client::input::{HeldKeys, Key, KeyEdge};
use client::network::{Client, ClientHandle, UiEvent};
use client::rendering::Renderer;
use log::{error, info};
use macroquad::prelude::*;
use std::sync::mpsc as std_mpsc;
use std::thread;

const ROTATE_SPEED: f32 = 2.2;
const ZOOM_STEP: f32 = 0.9;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:3001")]
    server: String,

    /// Window width
    #[arg(short = 'w', long, default_value = "1280")]
    width: i32,

    /// Window height (no short flag to avoid conflict with --help)
    #[arg(long, default_value = "720")]
    height: i32,
}

fn window_conf() -> Conf {
    let args = Args::parse();
    Conf {
        window_title: "Arena".to_owned(),
        window_width: args.width,
        window_height: args.height,
        ..Default::default()
    }
}

/// Runs the session on its own current-thread runtime and hands back the UI side.
/// A failed start still yields a handle; its view carries the error.
fn spawn_session(server: String) -> Result<(ClientHandle, thread::JoinHandle<()>), String> {
    let (ready_tx, ready_rx) = std_mpsc::channel();

    let session = thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(e) => {
                error!("Failed to start runtime: {}", e);
                let _ = ready_tx.send(ClientHandle::offline(e.to_string()));
                return;
            }
        };

        runtime.block_on(async move {
            let (client, handle) = Client::connect_or_offline(&server).await;
            let _ = ready_tx.send(handle);

            if let Some(client) = client {
                client.run().await;
            }
        });
    });

    let handle = ready_rx.recv().map_err(|e| e.to_string())?;
    Ok((handle, session))
}

fn map_key(code: KeyCode) -> Option<Key> {
    match code {
        KeyCode::W | KeyCode::Up => Some(Key::Up),
        KeyCode::S | KeyCode::Down => Some(Key::Down),
        KeyCode::A | KeyCode::Left => Some(Key::Left),
        KeyCode::D | KeyCode::Right => Some(Key::Right),
        KeyCode::Space => Some(Key::Attack),
        KeyCode::LeftShift | KeyCode::RightShift => Some(Key::Block),
        KeyCode::C => Some(Key::ToggleCamera),
        KeyCode::G => Some(Key::Recenter),
        _ => None,
    }
}

/// Forwards this frame's key edges and mouse gestures; returns false on quit.
fn forward_input(
    handle: &ClientHandle,
    held: &mut HeldKeys<KeyCode>,
    renderer: &mut Renderer,
) -> bool {
    let (is_dead, free_camera) = {
        let view = handle.view.borrow();
        (view.is_dead, view.camera.mode == CameraMode::Free)
    };
    let mut events = Vec::new();

    for code in get_keys_pressed() {
        match code {
            KeyCode::Escape => return false,
            KeyCode::H => renderer.toggle_help(),
            KeyCode::R | KeyCode::Enter if is_dead => events.push(UiEvent::Restart),
            _ => {}
        }
        if let Some(edge) = map_key(code).and_then(|key| held.press(code, key)) {
            events.push(edge_event(edge));
        }
    }
    for code in get_keys_released() {
        if let Some(edge) = map_key(code).and_then(|key| held.release(code, key)) {
            events.push(edge_event(edge));
        }
    }

    let delta = mouse_delta_position();
    if free_camera && is_mouse_button_down(MouseButton::Left) && delta != Vec2::ZERO {
        events.push(UiEvent::Orbit {
            yaw: delta.x * ROTATE_SPEED,
            pitch: delta.y * ROTATE_SPEED,
        });
    }
    let (_, wheel) = mouse_wheel();
    if free_camera && wheel != 0.0 {
        let factor = if wheel > 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
        events.push(UiEvent::Zoom(factor));
    }

    // A closed channel means the session already ended; keep showing its last view.
    for event in events {
        if handle.events.send(event).is_err() {
            break;
        }
    }
    true
}

fn edge_event(edge: KeyEdge) -> UiEvent {
    match edge {
        KeyEdge::Pressed(key) => UiEvent::KeyDown(key),
        KeyEdge::Released(key) => UiEvent::KeyUp(key),
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!("Controls: WASD/arrows to move, Space to attack, Shift to block, C camera, H help");

    let (handle, session) = match spawn_session(args.server) {
        Ok(started) => started,
        Err(e) => {
            error!("Failed to start session: {}", e);
            return;
        }
    };

    let mut renderer = Renderer::new();
    let mut held = HeldKeys::new();

    loop {
        if !forward_input(&handle, &mut held, &mut renderer) {
            break;
        }

        let view = handle.view.borrow().clone();
        renderer.render(&view);

        next_frame().await;
    }

    let _ = handle.events.send(UiEvent::Quit);
    if session.join().is_err() {
        error!("Session thread panicked");
    }
}
