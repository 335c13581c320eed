use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Pixel margins between a tile's logical rectangle and the screen
/// rectangle its surface actually occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutInsets {
    /// Gap on every side of a tile, doubling as the drag-handle width.
    pub border_px: i32,
    /// Height of the tab strip drawn above each tile.
    pub titlebar_px: i32,
}

impl Default for LayoutInsets {
    fn default() -> Self {
        Self {
            border_px: 2,
            titlebar_px: 32,
        }
    }
}

impl LayoutInsets {
    /// Converts a tile rectangle into the screen rectangle of its
    /// surface. Dimensions never go negative.
    pub fn screen_rect(&self, rect: Rect) -> Rect {
        Rect {
            x: rect.x + self.border_px,
            y: rect.y + self.titlebar_px + self.border_px,
            width: (rect.width - 2 * self.border_px).max(0),
            height: (rect.height - 2 * self.border_px).max(0),
        }
    }

    pub fn set_border(&mut self, px: i32) {
        self.border_px = px.max(0);
    }

    pub fn adjust_border(&mut self, delta: i32) {
        self.border_px = (self.border_px + delta).max(0);
    }

    pub fn set_titlebar(&mut self, px: i32) {
        self.titlebar_px = px.max(0);
    }
}
