//! Drawing the predicted world each frame.

use crate::game::World;
use macroquad::prelude::*;
use shared::PLAYER_SIZE;

const BACKGROUND: Color = Color::new(0.08, 0.08, 0.1, 1.0);

/// Parses a "#rrggbb" style token. Anything the client does not
/// understand falls back to gray rather than failing the frame.
pub fn parse_style(style: &str) -> Color {
    let hex = match style.strip_prefix('#') {
        Some(hex) if hex.len() == 6 => hex,
        _ => return GRAY,
    };
    // The token comes off the wire; `get` keeps a multibyte payload from
    // landing on a non-boundary slice.
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|pair| u8::from_str_radix(pair, 16).ok())
            .map(|v| v as f32 / 255.0)
    };
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) => Color::new(r, g, b, 1.0),
        _ => GRAY,
    }
}

pub fn render(world: &World) {
    clear_background(BACKGROUND);

    for player in world.players() {
        draw_rectangle(
            player.x,
            player.y,
            PLAYER_SIZE,
            PLAYER_SIZE,
            parse_style(&player.style),
        );
    }

    // Outline our own square so it stands out in a crowd.
    if let Some(own) = world.own_player() {
        draw_rectangle_lines(own.x, own.y, PLAYER_SIZE, PLAYER_SIZE, 3.0, WHITE);
    }
}
