//! # Game Client Library
//!
//! Client-side implementation for the networked multiplayer game: keyboard
//! intent capture, the socket thread, the locally predicted world, and
//! rendering.
//!
//! ## Architecture Overview
//!
//! The server is authoritative. The client sends movement intents, mirrors
//! every state change the server broadcasts, and between broadcasts advances
//! all players locally with the shared movement law so motion stays smooth at
//! any frame rate. Authoritative position snapshots overwrite the prediction
//! whenever they arrive.
//!
//! ## Module Organization
//!
//! - [`game`]: the predicted world and the handling of server messages
//! - [`input`]: keyboard press/release edges mapped to movement intents
//! - [`network`]: background I/O thread speaking the line protocol
//! - [`rendering`]: drawing players and the own-player outline

pub mod game;
pub mod input;
pub mod network;
pub mod rendering;
