//! In-memory toolkit backend.
//!
//! Implements every contract in [`crate::surface`] against plain
//! structs, recording each call so tests can assert on what the shell
//! asked the toolkit to do. Also serves as the fallback backend on
//! hosts without a real toolkit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::oneshot;

use mosaic_common::{DisplayInfo, NodeId, Rect, SurfaceError, Vector2, ViewId};

use crate::surface::{
    ContentSurface, DisplayQuery, EventSink, HostWindow, OverlayWindow, SurfaceEvent,
    SurfaceEventKind, SurfaceFactory, SurfaceOptions, SurfaceResult,
};

#[derive(Debug)]
struct SurfaceState {
    bounds: Rect,
    url: Option<String>,
    visible: bool,
    zoom: f64,
    capture_payload: Vec<u8>,
    captured_qualities: Vec<u8>,
    bounds_calls: usize,
}

/// Surface whose state lives behind a shared handle, so a clone kept by
/// a test still observes the instance the registry owns.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    state: Arc<Mutex<SurfaceState>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SurfaceState {
                bounds: Rect::default(),
                url: None,
                visible: true,
                zoom: 1.0,
                capture_payload: b"headless-frame".to_vec(),
                captured_qualities: Vec::new(),
                bounds_calls: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SurfaceState> {
        self.state.lock().unwrap()
    }

    pub fn set_capture_payload(&self, payload: Vec<u8>) {
        self.lock().capture_payload = payload;
    }

    pub fn last_url(&self) -> Option<String> {
        self.lock().url.clone()
    }

    pub fn visible(&self) -> bool {
        self.lock().visible
    }

    pub fn zoom(&self) -> f64 {
        self.lock().zoom
    }

    pub fn captured_qualities(&self) -> Vec<u8> {
        self.lock().captured_qualities.clone()
    }

    pub fn bounds_calls(&self) -> usize {
        self.lock().bounds_calls
    }
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentSurface for HeadlessSurface {
    fn set_bounds(&self, bounds: Rect) -> SurfaceResult<()> {
        let mut state = self.lock();
        state.bounds = bounds;
        state.bounds_calls += 1;
        Ok(())
    }

    fn bounds(&self) -> Rect {
        self.lock().bounds
    }

    fn navigate(&self, url: &str) -> SurfaceResult<()> {
        self.lock().url = Some(url.to_string());
        Ok(())
    }

    fn set_visible(&self, visible: bool) -> SurfaceResult<()> {
        self.lock().visible = visible;
        Ok(())
    }

    fn zoom_factor(&self) -> f64 {
        self.lock().zoom
    }

    fn set_zoom(&self, factor: f64) -> SurfaceResult<()> {
        self.lock().zoom = factor;
        Ok(())
    }

    fn begin_capture(&self, quality: u8) -> oneshot::Receiver<SurfaceResult<Vec<u8>>> {
        let (tx, rx) = oneshot::channel();
        let payload = {
            let mut state = self.lock();
            state.captured_qualities.push(quality);
            state.capture_payload.clone()
        };
        let _ = tx.send(Ok(payload));
        rx
    }
}

#[derive(Debug, Default)]
struct WindowState {
    attached: Vec<ViewId>,
    attach_calls: HashMap<ViewId, usize>,
    detach_calls: HashMap<ViewId, usize>,
    focus_calls: usize,
    refuse_detach: bool,
}

/// Host window that tracks which surfaces are parented to it.
#[derive(Debug, Default)]
pub struct HeadlessWindow {
    state: Mutex<WindowState>,
}

impl HeadlessWindow {
    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap()
    }

    pub fn attach_count(&self, id: &ViewId) -> usize {
        self.lock().attach_calls.get(id).copied().unwrap_or(0)
    }

    /// Number of detach calls that actually removed the surface.
    pub fn detach_count(&self, id: &ViewId) -> usize {
        self.lock().detach_calls.get(id).copied().unwrap_or(0)
    }

    pub fn focus_count(&self) -> usize {
        self.lock().focus_calls
    }

    pub fn attached_views(&self) -> Vec<ViewId> {
        self.lock().attached.clone()
    }

    /// Makes subsequent detach calls fail, for exercising the stale
    /// attachment path.
    pub fn set_detach_refused(&self, refused: bool) {
        self.lock().refuse_detach = refused;
    }
}

impl HostWindow for HeadlessWindow {
    fn attach(&self, id: &ViewId) {
        let mut state = self.lock();
        if !state.attached.contains(id) {
            state.attached.push(id.clone());
        }
        *state.attach_calls.entry(id.clone()).or_insert(0) += 1;
    }

    fn detach(&self, id: &ViewId) -> bool {
        let mut state = self.lock();
        if state.refuse_detach {
            return false;
        }
        if let Some(slot) = state.attached.iter().position(|view| view == id) {
            state.attached.remove(slot);
            *state.detach_calls.entry(id.clone()).or_insert(0) += 1;
            true
        } else {
            false
        }
    }

    fn is_attached(&self, id: &ViewId) -> bool {
        self.lock().attached.contains(id)
    }

    fn focus(&self) {
        self.lock().focus_calls += 1;
    }
}

#[derive(Debug)]
struct OverlayState {
    ignoring: bool,
    pie_requests: Vec<(NodeId, Vector2)>,
    focus_calls: usize,
}

/// Overlay that records pie-menu requests and its click-through state.
/// Starts click-through, matching a freshly created overlay.
#[derive(Debug)]
pub struct HeadlessOverlay {
    state: Mutex<OverlayState>,
}

impl Default for HeadlessOverlay {
    fn default() -> Self {
        Self {
            state: Mutex::new(OverlayState {
                ignoring: true,
                pie_requests: Vec::new(),
                focus_calls: 0,
            }),
        }
    }
}

impl HeadlessOverlay {
    fn lock(&self) -> MutexGuard<'_, OverlayState> {
        self.state.lock().unwrap()
    }

    pub fn ignoring(&self) -> bool {
        self.lock().ignoring
    }

    pub fn pie_requests(&self) -> Vec<(NodeId, Vector2)> {
        self.lock().pie_requests.clone()
    }

    pub fn focus_count(&self) -> usize {
        self.lock().focus_calls
    }
}

impl OverlayWindow for HeadlessOverlay {
    fn set_ignore_cursor_events(&self, ignore: bool) {
        self.lock().ignoring = ignore;
    }

    fn show_pie_menu(&self, tile: &NodeId, position: Vector2) {
        self.lock().pie_requests.push((tile.clone(), position));
    }

    fn focus(&self) {
        self.lock().focus_calls += 1;
    }
}

/// Display query with a scriptable cursor position.
#[derive(Debug)]
pub struct HeadlessDisplay {
    info: DisplayInfo,
    cursor: Mutex<Vector2>,
}

impl HeadlessDisplay {
    pub fn new(info: DisplayInfo) -> Self {
        Self {
            info,
            cursor: Mutex::new(Vector2::default()),
        }
    }

    pub fn set_cursor(&self, position: Vector2) {
        *self.cursor.lock().unwrap() = position;
    }
}

impl Default for HeadlessDisplay {
    fn default() -> Self {
        Self::new(DisplayInfo {
            bounds: Rect::new(0, 0, 1920, 1080),
            work_area: Rect::new(0, 0, 1920, 1040),
        })
    }
}

impl DisplayQuery for HeadlessDisplay {
    fn primary(&self) -> DisplayInfo {
        self.info
    }

    fn cursor_position(&self) -> Vector2 {
        *self.cursor.lock().unwrap()
    }
}

#[derive(Debug, Default)]
struct FactoryState {
    surfaces: HashMap<ViewId, HeadlessSurface>,
    sinks: HashMap<ViewId, EventSink>,
    capture_payload: Option<Vec<u8>>,
    creates: usize,
    fail_next_create: bool,
}

/// Factory that hands out [`HeadlessSurface`]s and keeps a probe handle
/// to each one. Clones share state, so a test can keep one clone while
/// the registry owns another.
#[derive(Debug, Clone, Default)]
pub struct HeadlessFactory {
    inner: Arc<Mutex<FactoryState>>,
}

impl HeadlessFactory {
    fn lock(&self) -> MutexGuard<'_, FactoryState> {
        self.inner.lock().unwrap()
    }

    /// Probe handle to the most recent surface created for `id`.
    pub fn surface(&self, id: &ViewId) -> Option<HeadlessSurface> {
        self.lock().surfaces.get(id).cloned()
    }

    pub fn created_count(&self) -> usize {
        self.lock().creates
    }

    pub fn set_capture_payload(&self, payload: Vec<u8>) {
        self.lock().capture_payload = Some(payload);
    }

    pub fn fail_next_create(&self) {
        self.lock().fail_next_create = true;
    }

    /// Pushes an event as if the surface bound to `id` had reported it.
    pub fn emit(&self, id: &ViewId, kind: SurfaceEventKind) {
        let state = self.lock();
        if let Some(sink) = state.sinks.get(id) {
            sink.lock().unwrap().push(SurfaceEvent {
                view: id.clone(),
                kind,
            });
        }
    }
}

impl SurfaceFactory for HeadlessFactory {
    fn create(
        &self,
        id: &ViewId,
        options: &SurfaceOptions,
        events: EventSink,
    ) -> SurfaceResult<Box<dyn ContentSurface>> {
        let mut state = self.lock();
        if state.fail_next_create {
            state.fail_next_create = false;
            return Err(SurfaceError::Backend(
                "headless factory rejected create".to_string(),
            ));
        }

        let surface = HeadlessSurface::new();
        if let Some(payload) = &state.capture_payload {
            surface.set_capture_payload(payload.clone());
        }
        if let Some(url) = &options.url {
            surface.navigate(url)?;
        }
        surface.set_zoom(options.zoom_factor)?;

        state.creates += 1;
        state.surfaces.insert(id.clone(), surface.clone());
        state.sinks.insert(id.clone(), events);
        Ok(Box::new(surface))
    }
}
