//! Display metrics served to presentation layers.

use mosaic_common::{taskbar_bounds, DisplayMetrics};
use mosaic_view::DisplayQuery;

/// Combines the primary display's geometry with the derived taskbar
/// strip.
pub fn display_metrics(display: &dyn DisplayQuery) -> DisplayMetrics {
    let screen = display.primary();
    DisplayMetrics {
        screen,
        taskbar: taskbar_bounds(&screen),
    }
}
