use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Bounds and usable work area of a display, as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub bounds: Rect,
    pub work_area: Rect,
}

/// Snapshot handed to presentation layers that size themselves around
/// the OS taskbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayMetrics {
    pub screen: DisplayInfo,
    pub taskbar: Rect,
}

/// Derives the taskbar strip from the gap between display bounds and
/// work area. Checks the bottom edge first since that is where most
/// desktops dock it. Returns a zero-area rect when the work area covers
/// the whole display.
pub fn taskbar_bounds(display: &DisplayInfo) -> Rect {
    let bounds = display.bounds;
    let work = display.work_area;

    if work.bottom() < bounds.bottom() {
        Rect::new(
            bounds.x,
            work.bottom(),
            bounds.width,
            bounds.bottom() - work.bottom(),
        )
    } else if work.y > bounds.y {
        Rect::new(bounds.x, bounds.y, bounds.width, work.y - bounds.y)
    } else if work.x > bounds.x {
        Rect::new(bounds.x, bounds.y, work.x - bounds.x, bounds.height)
    } else if work.right() < bounds.right() {
        Rect::new(
            work.right(),
            bounds.y,
            bounds.right() - work.right(),
            bounds.height,
        )
    } else {
        Rect::new(bounds.x, bounds.bottom(), bounds.width, 0)
    }
}
