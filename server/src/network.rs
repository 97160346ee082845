//! Server network layer: TCP transport tasks and tick loop coordination.
//!
//! Connection tasks never mutate player state. The accept, read and close
//! paths all funnel [`ServerEvent`]s into the single main loop, which is the
//! only place the simulation is touched, so no locking is needed between
//! I/O callbacks and the tick body.

use crate::game::{Event, Simulation};
use crate::stats::Stats;
use log::{debug, info, warn};
use shared::Message;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Transport callbacks, funneled into the main loop. They carry raw frames
/// and lifecycle notifications only; all resolution happens at tick
/// boundaries inside the simulation.
#[derive(Debug)]
pub enum ServerEvent {
    Accepted { stream: TcpStream, addr: SocketAddr },
    Inbound { id: u32, raw: String },
    Closed { id: u32 },
}

/// Main server coordinating the transport tasks and the fixed-rate tick loop.
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    simulation: Simulation,
    stats: Stats,
    tick_duration: Duration,
    readers: HashMap<u32, JoinHandle<()>>,

    events_tx: mpsc::UnboundedSender<ServerEvent>,
    events_rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        max_players: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            local_addr,
            simulation: Simulation::new(max_players),
            stats: Stats::default(),
            tick_duration,
            readers: HashMap::new(),
            events_tx,
            events_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Spawns the accept loop feeding new connections into the main loop.
    fn spawn_listener(&mut self) {
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => return,
        };
        let events_tx = self.events_tx.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        if events_tx.send(ServerEvent::Accepted { stream, addr }).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Accept failed: {}", e);
                    }
                }
            }
        });
    }

    fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Accepted { stream, addr } => self.handle_accept(stream, addr),
            ServerEvent::Inbound { id, raw } => self.handle_inbound(id, raw),
            ServerEvent::Closed { id } => self.close_connection(id),
        }
    }

    /// Capacity is enforced here, before registration: a rejected stream is
    /// simply dropped, which closes the socket, and no event is queued.
    fn handle_accept(&mut self, stream: TcpStream, addr: SocketAddr) {
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<String>();

        match self.simulation.connect(outbound_tx) {
            Some(id) => {
                self.stats.players_joined += 1;
                info!("Player {} connected from {}", id, addr);

                let (read_half, write_half) = stream.into_split();
                tokio::spawn(connection_writer(write_half, outbound_rx));
                let reader =
                    tokio::spawn(connection_reader(read_half, id, self.events_tx.clone()));
                self.readers.insert(id, reader);
            }
            None => {
                warn!("Rejecting connection from {}: server is full", addr);
            }
        }
    }

    fn handle_inbound(&mut self, id: u32, raw: String) {
        // A forced close may race frames already sitting in the event
        // channel; anything from an unregistered id is dropped uncounted.
        let (x, y) = match self.simulation.registry.get(id) {
            Some(connection) => (connection.player.x, connection.player.y),
            None => {
                debug!("Dropping frame from unregistered player {}", id);
                return;
            }
        };
        self.stats.record_received(raw.len() + 1);

        match Message::decode(&raw) {
            Ok(Message::PlayerMoveRequest { start, direction }) => {
                // Events snapshot the position at receipt; the flag change
                // itself is deferred to the next tick boundary.
                self.simulation.enqueue(Event::Moving {
                    id,
                    x,
                    y,
                    start,
                    direction,
                });
            }
            Ok(other) => {
                warn!(
                    "Unexpected {:?} from player {}, closing connection",
                    other, id
                );
                self.stats.record_invalid();
                self.close_connection(id);
            }
            Err(e) => {
                warn!("Invalid message from player {}: {}", id, e);
                self.stats.record_invalid();
                self.close_connection(id);
            }
        }
    }

    /// Removes the player immediately; its queued events are defensively
    /// skipped at the next tick. Dropping the registry entry closes the
    /// outbound channel, which shuts the writer task and the socket down.
    /// The reader task is aborted as well, so a forced close cannot leave
    /// it parked on a half-open socket the peer never closes.
    fn close_connection(&mut self, id: u32) {
        if self.simulation.disconnect(id) {
            self.stats.players_left += 1;
            info!("Player {} disconnected", id);
        }
        if let Some(reader) = self.readers.remove(&id) {
            reader.abort();
        }
    }

    /// Main loop: transport events interleaved with the fixed-rate tick.
    /// The tick body runs to completion without suspension; sends are
    /// fire-and-forget through each connection's outbound channel.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_listener();

        let mut tick_interval = interval(self.tick_duration);
        // Reschedule relative to when the previous tick finished rather
        // than trying to catch up on missed ticks.
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Server started successfully");

        loop {
            tokio::select! {
                event = self.events_rx.recv() => {
                    match event {
                        Some(event) => self.handle_event(event),
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                _ = tick_interval.tick() => {
                    let started = Instant::now();
                    self.simulation.run_tick(&mut self.stats);
                    self.stats.record_tick(started.elapsed());

                    if self.simulation.tick() % 60 == 0 && !self.simulation.registry.is_empty() {
                        self.stats.log_summary(self.simulation.registry.len());
                    }
                },
            }
        }

        Ok(())
    }
}

/// Reads newline-delimited frames and forwards them to the main loop. EOF
/// and read errors both end in a `Closed` notification.
async fn connection_reader(
    read_half: OwnedReadHalf,
    id: u32,
    events_tx: mpsc::UnboundedSender<ServerEvent>,
) {
    let mut lines = BufReader::new(read_half).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(raw)) => {
                if events_tx.send(ServerEvent::Inbound { id, raw }).is_err() {
                    return;
                }
            }
            Ok(None) => break,
            Err(e) => {
                debug!("Read error from player {}: {}", id, e);
                break;
            }
        }
    }
    let _ = events_tx.send(ServerEvent::Closed { id });
}

/// Drains the outbound channel onto the socket. The channel closing means
/// the player was removed from the registry; shut the write side down so
/// the peer sees the connection end.
async fn connection_writer(
    mut write_half: OwnedWriteHalf,
    mut outbound_rx: mpsc::UnboundedReceiver<String>,
) {
    while let Some(mut text) = outbound_rx.recv().await {
        text.push('\n');
        if write_half.write_all(text.as_bytes()).await.is_err() {
            break;
        }
    }
    let _ = write_half.shutdown().await;
}
