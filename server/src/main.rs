use clap::Parser;
use log::info;
use server::network::Server;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value = "6970")]
    port: u16,

    /// Tick rate (authoritative updates per second)
    #[arg(short, long, default_value_t = shared::SERVER_TPS)]
    tick_rate: u32,

    /// Maximum number of concurrent players
    #[arg(short, long, default_value = "69")]
    max_players: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();

    let addr = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f32(1.0 / args.tick_rate as f32);

    info!(
        "Starting server at {} ({} ticks/s, {} players max)",
        addr, args.tick_rate, args.max_players
    );

    let mut server = Server::new(&addr, tick_duration, args.max_players).await?;

    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}
