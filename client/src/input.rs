//! Keyboard edge detection for movement intents.

use macroquad::prelude::*;
use shared::Direction;

/// Two bindings per direction, WASD and arrows.
const KEY_BINDINGS: [(KeyCode, Direction); 8] = [
    (KeyCode::W, Direction::North),
    (KeyCode::Up, Direction::North),
    (KeyCode::S, Direction::South),
    (KeyCode::Down, Direction::South),
    (KeyCode::A, Direction::West),
    (KeyCode::Left, Direction::West),
    (KeyCode::D, Direction::East),
    (KeyCode::Right, Direction::East),
];

/// Collects this frame's press and release edges as `(direction, start)`
/// pairs. Held keys produce nothing; only transitions are reported.
pub fn poll_intents() -> Vec<(Direction, bool)> {
    let mut intents = Vec::new();
    for (key, direction) in KEY_BINDINGS {
        if is_key_pressed(key) {
            intents.push((direction, true));
        }
        if is_key_released(key) {
            intents.push((direction, false));
        }
    }
    intents
}
