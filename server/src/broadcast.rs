//! Broadcast encoder: serializes resolved events into wire frames and fans
//! them out, counting every message and byte handed to the transport.
//!
//! Sends are fire-and-forget. A connection whose writer has gone away is
//! skipped with a debug log; it never aborts the rest of the fan-out.

use crate::registry::{Connection, Registry};
use crate::stats::Stats;
use log::{debug, error};
use shared::Message;

/// Encodes `message` and queues it for one connection.
pub fn send_to(connection: &Connection, message: &Message, stats: &mut Stats) {
    match message.encode() {
        Ok(text) => {
            // +1 for the newline framing the writer task appends
            let bytes = text.len() + 1;
            if connection.push_raw(text) {
                stats.record_sent(bytes);
            } else {
                debug!(
                    "Dropping message for player {}: writer gone",
                    connection.player.id
                );
            }
        }
        Err(e) => error!("Failed to encode {:?}: {}", message, e),
    }
}

/// Fans `message` out to every currently registered player.
pub fn broadcast(registry: &Registry, message: &Message, stats: &mut Stats) {
    for connection in registry.iter() {
        send_to(connection, message, stats);
    }
}
