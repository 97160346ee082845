//! Player registry: the set of currently connected players and their
//! authoritative state.
//!
//! The registry enforces the capacity limit, assigns identities, and couples
//! each player with the outbound channel of its connection. Identity values
//! are monotonically assigned and never reused, so a stale id held anywhere
//! else in the system can only age out, never alias a new player.

use log::info;
use shared::Player;
use std::collections::HashMap;
use tokio::sync::mpsc::UnboundedSender;

/// A registered player together with the write side of its connection.
#[derive(Debug)]
pub struct Connection {
    pub player: Player,
    outbound: UnboundedSender<String>,
}

impl Connection {
    pub fn new(player: Player, outbound: UnboundedSender<String>) -> Self {
        Self { player, outbound }
    }

    /// Queues one encoded frame for the writer task. Returns false if the
    /// writer is gone; the caller drops the message and moves on.
    pub fn push_raw(&self, text: String) -> bool {
        self.outbound.send(text).is_ok()
    }
}

/// Owns all connected players, indexed by id.
pub struct Registry {
    connections: HashMap<u32, Connection>,
    next_id: u32,
    max_players: usize,
}

impl Registry {
    pub fn new(max_players: usize) -> Self {
        Self {
            connections: HashMap::new(),
            next_id: 1,
            max_players,
        }
    }

    /// Registers a new player, returning its assigned id.
    ///
    /// Returns `None` once the player count has reached the configured limit.
    /// A rejected registration has no side effect: no id is consumed.
    pub fn register(
        &mut self,
        x: f32,
        y: f32,
        style: String,
        outbound: UnboundedSender<String>,
    ) -> Option<u32> {
        if self.connections.len() >= self.max_players {
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;

        info!("Player {} registered at ({:.1}, {:.1})", id, x, y);
        self.connections
            .insert(id, Connection::new(Player::new(id, x, y, style), outbound));

        Some(id)
    }

    /// Removes a player. Returns true if it was present.
    pub fn remove(&mut self, id: u32) -> bool {
        self.connections.remove(&id).is_some()
    }

    pub fn get(&self, id: u32) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Connection> {
        self.connections.values_mut()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn outbound() -> UnboundedSender<String> {
        mpsc::unbounded_channel().0
    }

    #[test]
    fn test_registry_creation() {
        let registry = Registry::new(5);
        assert_eq!(registry.len(), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_assigns_monotonic_ids() {
        let mut registry = Registry::new(4);

        let id1 = registry.register(10.0, 20.0, "#111111".into(), outbound()).unwrap();
        let id2 = registry.register(30.0, 40.0, "#222222".into(), outbound()).unwrap();

        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
        assert_eq!(registry.len(), 2);

        let player = &registry.get(id1).unwrap().player;
        assert_eq!(player.id, id1);
        assert_eq!(player.x, 10.0);
        assert_eq!(player.y, 20.0);
        assert_eq!(player.style, "#111111");
        assert!(!player.moving.any());
    }

    #[test]
    fn test_register_rejects_at_capacity() {
        let mut registry = Registry::new(1);

        assert!(registry.register(0.0, 0.0, "#111111".into(), outbound()).is_some());
        assert!(registry.register(0.0, 0.0, "#222222".into(), outbound()).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_rejected_registration_consumes_no_id() {
        let mut registry = Registry::new(1);

        let id1 = registry.register(0.0, 0.0, "#111111".into(), outbound()).unwrap();
        assert!(registry.register(0.0, 0.0, "#222222".into(), outbound()).is_none());

        registry.remove(id1);
        let id2 = registry.register(0.0, 0.0, "#333333".into(), outbound()).unwrap();
        assert_eq!(id2, id1 + 1);
    }

    #[test]
    fn test_ids_never_reused_after_removal() {
        let mut registry = Registry::new(8);

        let id1 = registry.register(0.0, 0.0, "#111111".into(), outbound()).unwrap();
        registry.remove(id1);

        let id2 = registry.register(0.0, 0.0, "#222222".into(), outbound()).unwrap();
        assert_ne!(id1, id2);
        assert!(registry.get(id1).is_none());
    }

    #[test]
    fn test_remove_nonexistent() {
        let mut registry = Registry::new(2);
        assert!(!registry.remove(999));
    }

    #[test]
    fn test_iteration_covers_all_players() {
        let mut registry = Registry::new(4);
        let id1 = registry.register(0.0, 0.0, "#111111".into(), outbound()).unwrap();
        let id2 = registry.register(0.0, 0.0, "#222222".into(), outbound()).unwrap();

        let mut ids: Vec<u32> = registry.iter().map(|c| c.player.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![id1, id2]);
    }

    #[test]
    fn test_push_raw_reports_dead_writer() {
        let mut registry = Registry::new(2);
        let (tx, rx) = mpsc::unbounded_channel();
        let id = registry.register(0.0, 0.0, "#111111".into(), tx).unwrap();

        drop(rx);
        assert!(!registry.get(id).unwrap().push_raw("hello".into()));
    }
}
