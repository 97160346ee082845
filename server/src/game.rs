//! Authoritative simulation: the per-tick event queue and its resolution.
//!
//! Transport callbacks never touch player state directly; they register or
//! remove connections and enqueue events here. [`Simulation::run_tick`] is
//! the only place events are resolved and positions advance, so all mutation
//! is serialized to tick boundaries without locking.

use crate::broadcast::{broadcast, send_to};
use crate::registry::Registry;
use crate::stats::Stats;
use rand::Rng;
use shared::{update_player, Direction, Message, PLAYER_SIZE, TICK_DT, WORLD_HEIGHT, WORLD_WIDTH};
use std::collections::HashSet;
use tokio::sync::mpsc::UnboundedSender;

/// A lifecycle notification or intent buffered between ticks. Consumed by
/// the next tick, then discarded; events never outlive a tick boundary.
#[derive(Debug, Clone)]
pub enum Event {
    Joined {
        id: u32,
        x: f32,
        y: f32,
        style: String,
    },
    Left {
        id: u32,
    },
    Moving {
        id: u32,
        x: f32,
        y: f32,
        start: bool,
        direction: Direction,
    },
}

/// The whole world in one value: registry, event queue, tick counter.
pub struct Simulation {
    pub registry: Registry,
    events: Vec<Event>,
    ticks: u64,
}

impl Simulation {
    pub fn new(max_players: usize) -> Self {
        Self {
            registry: Registry::new(max_players),
            events: Vec::new(),
            ticks: 0,
        }
    }

    pub fn tick(&self) -> u64 {
        self.ticks
    }

    pub fn enqueue(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Connection-accept callback: registers the player at a random spawn
    /// position and queues its `Joined` event. Returns `None` at capacity,
    /// in which case nothing was registered and nothing was queued.
    pub fn connect(&mut self, outbound: UnboundedSender<String>) -> Option<u32> {
        let mut rng = rand::thread_rng();
        let x = rng.gen_range(0.0..WORLD_WIDTH - PLAYER_SIZE);
        let y = rng.gen_range(0.0..WORLD_HEIGHT - PLAYER_SIZE);
        let style = random_style(&mut rng);

        let id = self.registry.register(x, y, style.clone(), outbound)?;
        self.events.push(Event::Joined { id, x, y, style });
        Some(id)
    }

    /// Close callback: removes the player immediately and queues its `Left`
    /// event. Any already-queued event referencing the id is skipped at
    /// resolution time. Returns false if the id was not registered.
    pub fn disconnect(&mut self, id: u32) -> bool {
        if self.registry.remove(id) {
            self.events.push(Event::Left { id });
            true
        } else {
            false
        }
    }

    /// One authoritative tick. Drains the queue and resolves it in a fixed
    /// order: classify joins/leaves, greet new arrivals, announce joins,
    /// announce leaves, apply and broadcast movement, then integrate every
    /// registered player by the fixed tick duration.
    pub fn run_tick(&mut self, stats: &mut Stats) {
        let events = std::mem::take(&mut self.events);

        // Classification pass. An id that both joined and left within this
        // tick is suppressed on both sides: the connection's entire lifetime
        // fit inside one tick and no one else ever hears about it.
        let mut joined: Vec<u32> = Vec::new();
        let mut left: HashSet<u32> = HashSet::new();
        for event in &events {
            match event {
                Event::Joined { id, .. } => joined.push(*id),
                Event::Left { id } => {
                    left.insert(*id);
                }
                Event::Moving { .. } => {}
            }
        }
        let coincident: HashSet<u32> =
            joined.iter().copied().filter(|id| left.contains(id)).collect();
        joined.retain(|id| !coincident.contains(id));
        left.retain(|id| !coincident.contains(id));
        let joined_set: HashSet<u32> = joined.iter().copied().collect();

        // Greet each surviving join: its own identity, then the rest of the
        // post-classification registry, including each existing player's
        // active movement directions so the arrival's flags match the world.
        // Self-knowledge is implicit in Hello and not resent.
        for &id in &joined {
            let connection = match self.registry.get(id) {
                Some(connection) => connection,
                None => continue,
            };
            let me = &connection.player;
            send_to(
                connection,
                &Message::Hello {
                    id: me.id,
                    x: me.x,
                    y: me.y,
                    style: me.style.clone(),
                },
                stats,
            );

            for other in self.registry.iter() {
                if other.player.id == id {
                    continue;
                }
                send_to(
                    connection,
                    &Message::PlayerJoined {
                        id: other.player.id,
                        x: other.player.x,
                        y: other.player.y,
                        style: other.player.style.clone(),
                    },
                    stats,
                );
                for direction in other.player.moving.active() {
                    send_to(
                        connection,
                        &Message::PlayerMoving {
                            id: other.player.id,
                            x: other.player.x,
                            y: other.player.y,
                            start: true,
                            direction,
                        },
                        stats,
                    );
                }
            }
        }

        // Announce surviving joins to everyone else.
        for event in &events {
            if let Event::Joined { id, x, y, style } = event {
                if !joined_set.contains(id) {
                    continue;
                }
                let message = Message::PlayerJoined {
                    id: *id,
                    x: *x,
                    y: *y,
                    style: style.clone(),
                };
                for other in self.registry.iter() {
                    if other.player.id != *id {
                        send_to(other, &message, stats);
                    }
                }
            }
        }

        // Announce surviving leaves. The left id was removed from the
        // registry at close time, so it can never be a recipient here.
        for &id in &left {
            broadcast(&self.registry, &Message::PlayerLeft { id }, stats);
        }

        // Apply movement intents and echo them verbatim to everyone,
        // including the source. An id that no longer resolves is a
        // same-tick join-move-leave race and is silently skipped.
        for event in &events {
            if let Event::Moving {
                id,
                x,
                y,
                start,
                direction,
            } = event
            {
                match self.registry.get_mut(*id) {
                    Some(connection) => connection.player.moving.set(*direction, *start),
                    None => continue,
                }
                broadcast(
                    &self.registry,
                    &Message::PlayerMoving {
                        id: *id,
                        x: *x,
                        y: *y,
                        start: *start,
                        direction: *direction,
                    },
                    stats,
                );
            }
        }

        // Lockstep integration at the fixed tick duration, regardless of
        // measured wall-clock jitter.
        for connection in self.registry.iter_mut() {
            update_player(&mut connection.player, TICK_DT);
        }

        self.ticks += 1;
    }
}

fn random_style<R: Rng>(rng: &mut R) -> String {
    // Channels biased upward so players stay visible on a dark background.
    format!(
        "#{:02x}{:02x}{:02x}",
        rng.gen_range(0x40..=0xffu8),
        rng.gen_range(0x40..=0xffu8),
        rng.gen_range(0x40..=0xffu8),
    )
}
