//! Types and constants shared verbatim between the server and the client.
//!
//! Both sides run [`update_player`] with the same constants, so the client's
//! per-frame prediction follows exactly the same movement law as the server's
//! fixed-rate authoritative integration.

use serde::{Deserialize, Serialize};

pub const WORLD_WIDTH: f32 = 800.0;
pub const WORLD_HEIGHT: f32 = 600.0;
pub const PLAYER_SIZE: f32 = 30.0;
pub const PLAYER_SPEED: f32 = 500.0;
pub const SERVER_TPS: u32 = 30;
pub const TICK_DT: f32 = 1.0 / SERVER_TPS as f32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    West,
    East,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::West,
        Direction::East,
    ];

    /// Unit vector for this direction. Positive y points south, matching the
    /// screen-space coordinates the world is defined in.
    pub fn vector(self) -> (f32, f32) {
        match self {
            Direction::North => (0.0, -1.0),
            Direction::South => (0.0, 1.0),
            Direction::West => (-1.0, 0.0),
            Direction::East => (1.0, 0.0),
        }
    }

    fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::South => 1,
            Direction::West => 2,
            Direction::East => 3,
        }
    }
}

/// One independent boolean per movement direction. Opposite directions can be
/// active at the same time; they cancel out in the integrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveFlags([bool; 4]);

impl MoveFlags {
    pub fn get(&self, direction: Direction) -> bool {
        self.0[direction.index()]
    }

    /// Last write wins; a repeated start or stop is not counted.
    pub fn set(&mut self, direction: Direction, value: bool) {
        self.0[direction.index()] = value;
    }

    pub fn active(&self) -> impl Iterator<Item = Direction> + '_ {
        Direction::ALL.into_iter().filter(|d| self.get(*d))
    }

    pub fn any(&self) -> bool {
        self.0.iter().any(|v| *v)
    }
}

/// A connected player as both sides model it. The `style` token is opaque to
/// the simulation; only the client's renderer interprets it.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub style: String,
    pub moving: MoveFlags,
}

impl Player {
    pub fn new(id: u32, x: f32, y: f32, style: String) -> Self {
        Self {
            id,
            x,
            y,
            style,
            moving: MoveFlags::default(),
        }
    }
}

/// True modulo: the result is always in `[0, range)`, even for negative input.
/// The `%` operator alone is a remainder and would leave negatives as-is.
pub fn wrap(value: f32, range: f32) -> f32 {
    let rem = value % range;
    if rem < 0.0 {
        rem + range
    } else {
        rem
    }
}

/// Advances a player's position by `dt` seconds according to its active
/// movement flags.
///
/// Summed direction vectors are normalized to unit length, so diagonal
/// movement covers the same distance per second as axis-aligned movement.
/// Both axes wrap toroidally; the position is always in
/// `[0, WORLD_WIDTH) x [0, WORLD_HEIGHT)` afterwards.
///
/// This is a pure function of the player's state and `dt`: the server calls
/// it with the fixed tick duration, the client with measured frame time, and
/// both trace the same path.
pub fn update_player(player: &mut Player, dt: f32) {
    let mut dx = 0.0;
    let mut dy = 0.0;
    for direction in Direction::ALL {
        if player.moving.get(direction) {
            let (vx, vy) = direction.vector();
            dx += vx;
            dy += vy;
        }
    }

    let len = (dx * dx + dy * dy).sqrt();
    if len > 0.0 {
        dx /= len;
        dy /= len;
    }

    player.x = wrap(player.x + dx * PLAYER_SPEED * dt, WORLD_WIDTH);
    player.y = wrap(player.y + dy * PLAYER_SPEED * dt, WORLD_HEIGHT);
}

/// Wire protocol. Every message is a JSON object tagged by a `kind` field;
/// decoding anything with an unknown kind or a missing field fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Message {
    /// Server -> client: your identity and spawn state after connecting.
    Hello { id: u32, x: f32, y: f32, style: String },
    /// Server -> client: another player is present in the world.
    PlayerJoined { id: u32, x: f32, y: f32, style: String },
    /// Server -> client: a player disconnected.
    PlayerLeft { id: u32 },
    /// Server -> client: authoritative movement flag change, with the
    /// player's position at the time the change was resolved.
    PlayerMoving {
        id: u32,
        x: f32,
        y: f32,
        start: bool,
        direction: Direction,
    },
    /// Client -> server: request to start or stop moving in a direction.
    /// Not authoritative; the server echoes it back as `PlayerMoving`.
    PlayerMoveRequest { start: bool, direction: Direction },
}

impl Message {
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn decode(raw: &str) -> serde_json::Result<Message> {
        serde_json::from_str(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_wrap_true_modulo() {
        assert_approx_eq!(wrap(10.0, 800.0), 10.0);
        assert_approx_eq!(wrap(810.0, 800.0), 10.0);
        assert_approx_eq!(wrap(-10.0, 800.0), 790.0);
        assert_approx_eq!(wrap(0.0, 800.0), 0.0);
        assert_approx_eq!(wrap(-800.0, 800.0), 0.0);
    }

    #[test]
    fn test_single_direction_north() {
        let mut player = Player::new(1, 100.0, 100.0, "#ffffff".to_string());
        player.moving.set(Direction::North, true);

        update_player(&mut player, TICK_DT);

        assert_approx_eq!(player.x, 100.0);
        assert_approx_eq!(player.y, 100.0 - PLAYER_SPEED * TICK_DT, 0.001);
    }

    #[test]
    fn test_opposite_directions_cancel() {
        let mut player = Player::new(1, 200.0, 300.0, "#ffffff".to_string());
        player.moving.set(Direction::North, true);
        player.moving.set(Direction::South, true);

        update_player(&mut player, TICK_DT);

        assert_approx_eq!(player.x, 200.0);
        assert_approx_eq!(player.y, 300.0);
    }

    #[test]
    fn test_diagonal_speed_is_normalized() {
        // Spawn at (100, 100) with north + east held for one 1/30 s tick at
        // speed 500: displacement is 16.67 / sqrt(2) per axis.
        let mut player = Player::new(1, 100.0, 100.0, "#ffffff".to_string());
        player.moving.set(Direction::North, true);
        player.moving.set(Direction::East, true);

        update_player(&mut player, TICK_DT);

        assert_approx_eq!(player.x, 111.785, 0.01);
        assert_approx_eq!(player.y, 88.215, 0.01);
    }

    #[test]
    fn test_diagonal_distance_equals_axis_distance() {
        let mut axis = Player::new(1, 400.0, 300.0, "#ffffff".to_string());
        axis.moving.set(Direction::East, true);
        update_player(&mut axis, TICK_DT);
        let axis_dist = axis.x - 400.0;

        let mut diagonal = Player::new(2, 400.0, 300.0, "#ffffff".to_string());
        diagonal.moving.set(Direction::East, true);
        diagonal.moving.set(Direction::South, true);
        update_player(&mut diagonal, TICK_DT);
        let dx = diagonal.x - 400.0;
        let dy = diagonal.y - 300.0;

        assert_approx_eq!((dx * dx + dy * dy).sqrt(), axis_dist, 0.001);
    }

    #[test]
    fn test_west_movement_wraps_toroidally() {
        // x=5 moving west for one tick crosses the edge and comes back in on
        // the far side at ~788.33.
        let mut player = Player::new(1, 5.0, 5.0, "#ffffff".to_string());
        player.moving.set(Direction::West, true);

        update_player(&mut player, TICK_DT);

        assert_approx_eq!(player.x, WORLD_WIDTH + 5.0 - PLAYER_SPEED * TICK_DT, 0.01);
        assert!(player.x >= 0.0 && player.x < WORLD_WIDTH);
        assert_approx_eq!(player.y, 5.0);
    }

    #[test]
    fn test_position_stays_in_bounds_over_many_steps() {
        let mut player = Player::new(1, 0.0, 0.0, "#ffffff".to_string());
        player.moving.set(Direction::West, true);
        player.moving.set(Direction::North, true);

        for _ in 0..1000 {
            update_player(&mut player, TICK_DT);
            assert!(player.x >= 0.0 && player.x < WORLD_WIDTH);
            assert!(player.y >= 0.0 && player.y < WORLD_HEIGHT);
        }
    }

    #[test]
    fn test_idle_player_does_not_move() {
        let mut player = Player::new(1, 123.0, 456.0, "#ffffff".to_string());
        update_player(&mut player, 10.0);
        assert_approx_eq!(player.x, 123.0);
        assert_approx_eq!(player.y, 456.0);
    }

    #[test]
    fn test_move_flags_last_write_wins() {
        let mut flags = MoveFlags::default();
        flags.set(Direction::East, true);
        flags.set(Direction::East, true);
        flags.set(Direction::East, false);
        assert!(!flags.get(Direction::East));

        flags.set(Direction::East, false);
        flags.set(Direction::East, true);
        assert!(flags.get(Direction::East));
    }

    #[test]
    fn test_move_flags_active_iteration() {
        let mut flags = MoveFlags::default();
        assert!(!flags.any());

        flags.set(Direction::North, true);
        flags.set(Direction::West, true);
        let active: Vec<Direction> = flags.active().collect();
        assert_eq!(active, vec![Direction::North, Direction::West]);
        assert!(flags.any());
    }

    #[test]
    fn test_message_roundtrip_all_kinds() {
        let messages = vec![
            Message::Hello {
                id: 7,
                x: 12.5,
                y: 400.0,
                style: "#1a2b3c".to_string(),
            },
            Message::PlayerJoined {
                id: 8,
                x: 1.0,
                y: 2.0,
                style: "#ff0000".to_string(),
            },
            Message::PlayerLeft { id: 8 },
            Message::PlayerMoving {
                id: 7,
                x: 100.0,
                y: 200.0,
                start: true,
                direction: Direction::West,
            },
            Message::PlayerMoveRequest {
                start: false,
                direction: Direction::South,
            },
        ];

        for message in messages {
            let encoded = message.encode().unwrap();
            let decoded = Message::decode(&encoded).unwrap();
            assert_eq!(decoded, message);
        }
    }

    #[test]
    fn test_message_kind_discriminator_on_wire() {
        let encoded = Message::PlayerLeft { id: 3 }.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["kind"], "PlayerLeft");
        assert_eq!(value["id"], 3);
    }

    #[test]
    fn test_direction_serializes_lowercase() {
        let encoded = Message::PlayerMoveRequest {
            start: true,
            direction: Direction::North,
        }
        .encode()
        .unwrap();
        assert!(encoded.contains("\"north\""));
    }

    #[test]
    fn test_decode_rejects_unknown_kind() {
        let result = Message::decode(r#"{"kind":"SelfDestruct","id":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let result = Message::decode(r#"{"kind":"PlayerMoveRequest","start":true}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_rejects_invalid_json() {
        assert!(Message::decode("not json at all").is_err());
        assert!(Message::decode("").is_err());
        assert!(Message::decode(r#"{"kind":"PlayerLeft","id":"#).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_direction() {
        let result =
            Message::decode(r#"{"kind":"PlayerMoveRequest","start":true,"direction":"up"}"#);
        assert!(result.is_err());
    }
}
