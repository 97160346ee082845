//! Background networking thread bridging the async socket to the frame loop.
//!
//! macroquad owns the main loop, so the socket lives on its own thread with
//! a current-thread tokio runtime. Decoded messages flow to the frame loop
//! over a channel and intents flow back the other way; the frame loop never
//! blocks on the network.

use log::{debug, error, info};
use shared::Message;
use std::io;
use std::sync::mpsc::{self as std_mpsc, Receiver, Sender};
use std::thread;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc as tokio_mpsc;

#[derive(Debug)]
pub enum NetEvent {
    Message(Message),
    Disconnected,
}

pub struct NetworkClient {
    inbound: Receiver<NetEvent>,
    outbound: tokio_mpsc::UnboundedSender<Message>,
}

impl NetworkClient {
    /// Connects to the server and spawns the I/O thread. Returns once the
    /// TCP connection is established or has failed.
    pub fn connect(server_addr: &str) -> io::Result<Self> {
        let addr = server_addr.to_string();
        let (inbound_tx, inbound_rx) = std_mpsc::channel();
        let (outbound_tx, outbound_rx) = tokio_mpsc::unbounded_channel();
        let (ready_tx, ready_rx) = std_mpsc::channel();

        thread::spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    let _ = ready_tx.send(Err(e));
                    return;
                }
            };
            runtime.block_on(io_loop(addr, inbound_tx, outbound_rx, ready_tx));
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(NetworkClient {
                inbound: inbound_rx,
                outbound: outbound_tx,
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::ConnectionAborted,
                "network thread exited before connecting",
            )),
        }
    }

    /// Next pending event, if any. Never blocks the frame.
    pub fn poll(&self) -> Option<NetEvent> {
        self.inbound.try_recv().ok()
    }

    /// Queues an intent for the server. Silently dropped once disconnected;
    /// the frame loop learns about that through [`NetEvent::Disconnected`].
    pub fn send(&self, message: Message) {
        let _ = self.outbound.send(message);
    }
}

async fn io_loop(
    addr: String,
    inbound_tx: Sender<NetEvent>,
    mut outbound_rx: tokio_mpsc::UnboundedReceiver<Message>,
    ready_tx: Sender<io::Result<()>>,
) {
    let stream = match TcpStream::connect(&addr).await {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));
    info!("Connected to {}", addr);

    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(raw)) => match Message::decode(&raw) {
                        Ok(message) => {
                            if inbound_tx.send(NetEvent::Message(message)).is_err() {
                                return;
                            }
                        }
                        Err(e) => {
                            // An undecodable server is a server we can no
                            // longer trust; hang up.
                            debug!("Failed to decode server message: {}", e);
                            break;
                        }
                    },
                    Ok(None) => {
                        debug!("Server closed the connection");
                        break;
                    }
                    Err(e) => {
                        debug!("Read error: {}", e);
                        break;
                    }
                }
            },

            message = outbound_rx.recv() => {
                match message {
                    Some(message) => match message.encode() {
                        Ok(mut text) => {
                            text.push('\n');
                            if write_half.write_all(text.as_bytes()).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => error!("Failed to encode {:?}: {}", message, e),
                    },
                    // Frame loop dropped its handle; we are shutting down.
                    None => break,
                }
            },
        }
    }

    let _ = inbound_tx.send(NetEvent::Disconnected);
}
