//! Performance benchmarks for the client's per-message and per-tick paths

use client::camera::CameraController;
use client::game::StateSynchronizer;
use client::input::{InputSampler, Key, KeyEdge};
use shared::{decode, encode, Packet, PlayerState};
use std::collections::HashMap;
use std::time::Instant;

fn crowded_snapshot(count: usize) -> HashMap<String, PlayerState> {
    (0..count)
        .map(|i| {
            let player = if i % 3 == 0 {
                PlayerState::bot(format!("bot-{}", i), i as f32 * 10.0, 100.0)
            } else {
                PlayerState::new(format!("player-{}", i), i as f32 * 10.0, 200.0)
            };
            (player.id.clone(), player)
        })
        .collect()
}

/// Benchmarks snapshot replacement with derived counts
#[test]
fn benchmark_snapshot_application() {
    let mut sync = StateSynchronizer::new();
    let snapshot = crowded_snapshot(100);

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        sync.apply_snapshot(snapshot.clone(), Some("player-1"));
    }

    let duration = start.elapsed();
    println!(
        "Snapshot application: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert_eq!(sync.bot_count() + sync.human_count(), 100);
    // Well under one server frame per snapshot
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks encoding and decoding a full game state
#[test]
fn benchmark_game_state_serialization() {
    let packet = Packet::GameState {
        players: crowded_snapshot(100),
    };

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let bytes = encode(&packet).unwrap();
        let _ = decode(&bytes).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Game state serialization: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    let size = encode(&packet).unwrap().len();
    println!("Encoded 100-player snapshot: {} bytes", size);
    assert!(size < shared::MAX_DATAGRAM);
    assert!(duration.as_millis() < 3000);
}

/// Stress tests the input tick with every movement key held
#[test]
fn stress_test_input_ticks() {
    let mut sampler = InputSampler::new();
    for key in [Key::Up, Key::Left] {
        sampler.handle_edge(KeyEdge::Pressed(key), true);
    }
    let mut player = PlayerState::new("p1", 500.0, 500.0);

    let iterations = 100_000;
    let start = Instant::now();
    let mut sent = 0;

    for _ in 0..iterations {
        for command in sampler.tick(&player) {
            if let Packet::PlayerMove { x, y, direction } = command {
                player.x = x;
                player.y = y;
                player.direction = direction;
                sent += 1;
            }
        }
    }

    let duration = start.elapsed();
    println!(
        "Input ticks: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert_eq!(sent, iterations);
    assert!(duration.as_millis() < 1000);
}

/// Benchmarks the Follow-mode recompute that runs on every snapshot
#[test]
fn benchmark_camera_follow() {
    let mut camera = CameraController::new();
    let snapshot = crowded_snapshot(10);
    let mut sync = StateSynchronizer::new();

    let iterations = 100_000;
    let start = Instant::now();

    for i in 0..iterations {
        if i % 1000 == 0 {
            sync.apply_snapshot(snapshot.clone(), Some("player-1"));
        }
        camera.follow(sync.last_local_position());
    }

    let duration = start.elapsed();
    println!(
        "Camera follow: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert_eq!(camera.target(), sync.last_local_position());
    assert!(duration.as_millis() < 1000);
}
