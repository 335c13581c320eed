use serde::{Deserialize, Serialize};

/// Direction a tile is split toward, from the user's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }

    /// Whether the new tile lands before the split leaf in child order.
    pub fn places_before(self) -> bool {
        matches!(self, Direction::Up | Direction::Left)
    }
}

/// Payload of a context-menu selection targeting a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "option", rename_all = "kebab-case")]
pub enum ContextParams {
    Split { direction: Direction },
    SetUrl { url: String },
    Delete,
}
