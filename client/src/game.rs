//! Client-side prediction mirror.
//!
//! Between authoritative ticks, every known player is advanced locally per
//! rendered frame with the same integrator the server uses, so movement
//! stays smooth despite the coarser server tick rate. Any authoritative
//! message overwrites local state outright - no blending, no input replay.
//! The brief visible snap on correction is accepted, not hidden.

use shared::{update_player, Message, Player};
use std::collections::HashMap;
use std::fmt;

/// The server said something this mirror cannot reconcile. The only sane
/// response is to drop the connection; the mirror has no recovery path.
#[derive(Debug, PartialEq, Eq)]
pub enum ProtocolError {
    /// A movement update referenced a player we were never told about.
    UnknownPlayer(u32),
    /// A client-to-server kind arrived from the server.
    UnexpectedKind,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::UnknownPlayer(id) => {
                write!(f, "server referenced unknown player {}", id)
            }
            ProtocolError::UnexpectedKind => write!(f, "unexpected message kind from server"),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Locally held copy of the world, driven entirely by server messages plus
/// local integration.
#[derive(Debug, Default)]
pub struct World {
    pub own_id: Option<u32>,
    pub players: HashMap<u32, Player>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one authoritative message as a hard overwrite.
    pub fn handle_message(&mut self, message: Message) -> Result<(), ProtocolError> {
        match message {
            Message::Hello { id, x, y, style } => {
                self.own_id = Some(id);
                self.players.insert(id, Player::new(id, x, y, style));
            }
            Message::PlayerJoined { id, x, y, style } => {
                self.players.insert(id, Player::new(id, x, y, style));
            }
            Message::PlayerLeft { id } => {
                self.players.remove(&id);
            }
            Message::PlayerMoving {
                id,
                x,
                y,
                start,
                direction,
            } => match self.players.get_mut(&id) {
                Some(player) => {
                    // Snap to the authoritative position, then adopt the flag.
                    player.x = x;
                    player.y = y;
                    player.moving.set(direction, start);
                }
                None => return Err(ProtocolError::UnknownPlayer(id)),
            },
            Message::PlayerMoveRequest { .. } => return Err(ProtocolError::UnexpectedKind),
        }
        Ok(())
    }

    /// Advances every known player by the measured frame time using the
    /// shared movement law.
    pub fn update(&mut self, dt: f32) {
        for player in self.players.values_mut() {
            update_player(player, dt);
        }
    }

    pub fn own_player(&self) -> Option<&Player> {
        self.own_id.and_then(|id| self.players.get(&id))
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }
}
