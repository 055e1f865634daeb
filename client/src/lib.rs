//! # Arena Client Library
//!
//! Client-side synchronization and control for the arena game. The server is
//! authoritative; this crate mirrors its world state, turns local input into
//! movement and action commands, and drives a camera that follows the local
//! player or can be steered freely.
//!
//! ## Module Organization
//!
//! ### Network Module (`network`)
//! - `Connection`: one UDP session with a single reader task and a status
//!   (`Connecting`, `Connected`, `Error`)
//! - `Client`: the session event loop wiring every other component together
//! - `ClientView`: the read-only picture handed to the renderer
//!
//! ### Game Module (`game`)
//! Last-write-wins snapshot mirror, human/bot counts and the local player's
//! score, survival time and last known position.
//!
//! ### Input Module (`input`)
//! Key-state table, release-triggered attack/block, and the 30 ms movement tick.
//!
//! ### Camera Module (`camera`)
//! Follow/Free state machine with a timed transition lock.
//!
//! ### Lifecycle Module (`lifecycle`)
//! Identity assignment, queueing, death and restart.
//!
//! ### HUD and Rendering (`hud`, `rendering`)
//! Stateless formatting helpers and the macroquad renderer. Neither feeds
//! anything back into the session.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::{Client, UiEvent};
//! use client::input::Key;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let (client, handle) = Client::connect("127.0.0.1:3001").await?;
//! let session = tokio::spawn(client.run());
//!
//! handle.events.send(UiEvent::KeyDown(Key::Right))?;
//! println!("{}", handle.view.borrow().status);
//!
//! handle.events.send(UiEvent::Quit)?;
//! session.await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! The session is single-threaded and cooperative: inbound packets, UI events,
//! the input tick and the camera transition deadline are multiplexed in one
//! `tokio::select!` loop on a current-thread runtime. Within one source events
//! keep arrival order; across sources there is no ordering guarantee.
//!
//! Snapshots carry no sequence number, so a reordered datagram regresses the
//! mirror to stale state without detection.

pub mod camera;
pub mod game;
pub mod hud;
pub mod input;
pub mod lifecycle;
pub mod network;
pub mod rendering;
