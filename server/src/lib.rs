//! # Arena Server Library
//!
//! Authoritative server for the toroidal multiplayer arena. It owns the
//! canonical player state, resolves queued events once per fixed-rate tick,
//! and fans the results out to every connected client.
//!
//! ## Architecture
//!
//! A single logical thread of control drives everything: transport tasks
//! (accept loop, per-connection readers and writers) only pass messages to
//! the main loop over channels, and the main loop is the sole owner of the
//! [`game::Simulation`]. That removes all locking between I/O callbacks and
//! the tick body.
//!
//! Each tick drains the event queue and resolves it in a fixed order - the
//! join/leave classification pass (with same-tick coincidence suppression),
//! greetings for new arrivals, join and leave announcements, movement intent
//! application and echo, then lockstep integration of every player by the
//! fixed tick duration.
//!
//! ## Module Organization
//!
//! - [`registry`] - connected players, identity assignment, capacity limit
//! - [`game`] - event queue, tick resolution, movement integration
//! - [`broadcast`] - wire encoding and counted fan-out
//! - [`network`] - TCP transport tasks and the main select loop
//! - [`stats`] - counters consumed by the external stats side-channel
//!
//! ## Usage
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(
//!         "127.0.0.1:6970",
//!         Duration::from_secs_f32(1.0 / shared::SERVER_TPS as f32),
//!         69,
//!     )
//!     .await?;
//!     server.run().await
//! }
//! ```

pub mod broadcast;
pub mod game;
pub mod network;
pub mod registry;
pub mod stats;
