mod game;
mod input;
mod network;
mod rendering;

use clap::Parser;
use game::World;
use log::{info, warn};
use macroquad::prelude::*;
use network::{NetEvent, NetworkClient};
use shared::{Message, WORLD_HEIGHT, WORLD_WIDTH};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:6970")]
    server: String,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Torus Arena".to_string(),
        window_width: WORLD_WIDTH as i32,
        window_height: WORLD_HEIGHT as i32,
        window_resizable: false,
        ..Default::default()
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    info!("Connecting to: {}", args.server);
    info!("Controls: WASD or arrow keys to move");

    let client = match NetworkClient::connect(&args.server) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Failed to connect to {}: {}", args.server, e);
            return;
        }
    };

    let mut world = World::new();

    'game: loop {
        while let Some(event) = client.poll() {
            match event {
                NetEvent::Message(message) => {
                    if let Err(e) = world.handle_message(message) {
                        warn!("Protocol violation from server: {}", e);
                        break 'game;
                    }
                }
                NetEvent::Disconnected => {
                    warn!("Disconnected from server");
                    break 'game;
                }
            }
        }

        for (direction, start) in input::poll_intents() {
            client.send(Message::PlayerMoveRequest { direction, start });
        }

        world.update(get_frame_time());
        rendering::render(&world);

        next_frame().await;
    }
}
