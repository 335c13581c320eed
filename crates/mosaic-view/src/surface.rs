//! Toolkit contracts: surfaces, host windows, overlay, display queries.
//!
//! The registry and shell speak only through these traits, so the real
//! toolkit backend and the headless one in [`crate::headless`] are
//! interchangeable.

use std::sync::{Arc, Mutex};

use mosaic_common::{DisplayInfo, NodeId, Rect, SurfaceError, Vector2, ViewId};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

pub type SurfaceResult<T> = std::result::Result<T, SurfaceError>;

/// Options applied when a surface is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceOptions {
    pub url: Option<String>,
    pub transparent: bool,
    pub zoom_factor: f64,
    pub user_agent: Option<String>,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            url: None,
            transparent: false,
            zoom_factor: 1.0,
            user_agent: Some("Mosaic/0.1".to_string()),
        }
    }
}

impl SurfaceOptions {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Input the toolkit reports from inside a surface. Backends wire the
/// equivalent native notifications to these when a surface is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEventKind {
    /// User asked for a context menu inside the surface.
    ContextMenu,
    /// User zoomed with the toolkit's own gesture; the shell re-applies
    /// it in fixed steps.
    ZoomChanged { direction: ZoomDirection },
    /// Any other input. `pointer_move` distinguishes hover noise from
    /// presses and key events.
    InputActivity { pointer_move: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceEvent {
    pub view: ViewId,
    pub kind: SurfaceEventKind,
}

/// Shared queue surfaces push their events into.
pub type EventSink = Arc<Mutex<Vec<SurfaceEvent>>>;

/// One rectangle of web content. Implementations wrap whatever the
/// toolkit calls this object and must stay cheap to call; the registry
/// invokes these on every layout pass.
pub trait ContentSurface: Send {
    /// Positions the surface in host-window coordinates.
    fn set_bounds(&self, bounds: Rect) -> SurfaceResult<()>;

    fn bounds(&self) -> Rect;

    fn navigate(&self, url: &str) -> SurfaceResult<()>;

    fn set_visible(&self, visible: bool) -> SurfaceResult<()>;

    fn zoom_factor(&self) -> f64;

    fn set_zoom(&self, factor: f64) -> SurfaceResult<()>;

    /// Starts an asynchronous JPEG capture of the surface at the given
    /// quality. The receiver resolves once the frame is encoded.
    fn begin_capture(&self, quality: u8) -> oneshot::Receiver<SurfaceResult<Vec<u8>>>;
}

/// A top-level window surfaces can be parented to.
pub trait HostWindow: Send + Sync {
    fn attach(&self, id: &ViewId);

    /// Removes the surface from this window. Returns whether it was
    /// attached here.
    fn detach(&self, id: &ViewId) -> bool;

    fn is_attached(&self, id: &ViewId) -> bool;

    fn focus(&self);
}

/// Click-through layer stacked above the main window, used for the pie
/// menu.
pub trait OverlayWindow: Send + Sync {
    /// While `true` the overlay passes pointer events through to the
    /// content below it.
    fn set_ignore_cursor_events(&self, ignore: bool);

    fn show_pie_menu(&self, tile: &NodeId, position: Vector2);

    fn focus(&self);
}

/// Read-only questions about the host's displays and cursor.
pub trait DisplayQuery: Send + Sync {
    fn primary(&self) -> DisplayInfo;

    fn cursor_position(&self) -> Vector2;
}

/// Creates surfaces. Implementations receive the shared event sink and
/// must wire the surface's native notifications to push into it.
pub trait SurfaceFactory: Send {
    fn create(
        &self,
        id: &ViewId,
        options: &SurfaceOptions,
        events: EventSink,
    ) -> SurfaceResult<Box<dyn ContentSurface>>;
}
