//! Registry that binds tile ids to positioned content surfaces.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use mosaic_common::{LayoutInsets, Rect, SurfaceError, ViewError, ViewId};

use crate::surface::{
    ContentSurface, EventSink, HostWindow, SurfaceEvent, SurfaceFactory, SurfaceOptions,
    ZoomDirection,
};

/// JPEG quality for resize-capture frames.
pub const CAPTURE_JPEG_QUALITY: u8 = 80;

/// Zoom factor change applied per zoom event.
pub const ZOOM_STEP: f64 = 0.1;

/// Which top-level window a new surface is parented to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostTarget {
    Main,
    Hidden,
}

/// A live binding: the surface plus the state last pushed into it.
pub struct ViewInstance {
    id: ViewId,
    surface: Box<dyn ContentSurface>,
    rect: Option<Rect>,
    url: Option<String>,
}

impl ViewInstance {
    pub fn id(&self) -> &ViewId {
        &self.id
    }

    pub fn surface(&self) -> &dyn ContentSurface {
        self.surface.as_ref()
    }

    /// Tile-space rectangle last assigned, before insets. `None` until
    /// the first placement.
    pub fn rect(&self) -> Option<Rect> {
        self.rect
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

/// Per-view snapshot served to state queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewData {
    pub url: Option<String>,
    pub rectangle: Option<Rect>,
}

/// Maps view ids to surfaces and owns the windows they are parented to.
/// All surface mutations funnel through here so the stored state and
/// the toolkit never drift apart.
pub struct ViewRegistry {
    views: HashMap<ViewId, ViewInstance>,
    factory: Box<dyn SurfaceFactory>,
    main_window: Arc<dyn HostWindow>,
    hidden_window: Arc<dyn HostWindow>,
    events: EventSink,
    insets: LayoutInsets,
}

impl ViewRegistry {
    pub fn new(
        factory: Box<dyn SurfaceFactory>,
        main_window: Arc<dyn HostWindow>,
        hidden_window: Arc<dyn HostWindow>,
    ) -> Self {
        Self {
            views: HashMap::new(),
            factory,
            main_window,
            hidden_window,
            events: Arc::new(Mutex::new(Vec::new())),
            insets: LayoutInsets::default(),
        }
    }

    fn host(&self, target: HostTarget) -> &Arc<dyn HostWindow> {
        match target {
            HostTarget::Main => &self.main_window,
            HostTarget::Hidden => &self.hidden_window,
        }
    }

    /// Creates a surface for `id` and attaches it to the target window.
    /// An existing view under the same id is detached from every host
    /// window and dropped first, so the id never names two surfaces.
    pub fn create_view(
        &mut self,
        id: &ViewId,
        target: HostTarget,
        options: &SurfaceOptions,
    ) -> Result<(), ViewError> {
        if self.views.remove(id).is_some() {
            self.detach_from_hosts(id)?;
            debug!(view_id = %id, "replacing existing view");
        }

        let surface = self.factory.create(id, options, Arc::clone(&self.events))?;
        self.host(target).attach(id);
        self.views.insert(
            id.clone(),
            ViewInstance {
                id: id.clone(),
                surface,
                rect: None,
                url: options.url.clone(),
            },
        );
        debug!(view_id = %id, target = ?target, "view created");
        Ok(())
    }

    /// Detaches `id` from any window that parents it, then verifies
    /// nothing still claims it.
    fn detach_from_hosts(&self, id: &ViewId) -> Result<(), ViewError> {
        for host in [&self.main_window, &self.hidden_window] {
            if host.is_attached(id) {
                host.detach(id);
            }
        }
        for host in [&self.main_window, &self.hidden_window] {
            if host.is_attached(id) {
                return Err(ViewError::StaleAttachment(id.clone()));
            }
        }
        Ok(())
    }

    /// Stores the tile rectangle and positions the surface at its
    /// inset-adjusted screen rectangle.
    pub fn set_rectangle(&mut self, id: &ViewId, rect: Rect) -> Result<(), ViewError> {
        let screen = self.insets.screen_rect(rect);
        let view = self
            .views
            .get_mut(id)
            .ok_or_else(|| ViewError::ViewNotFound(id.clone()))?;
        view.rect = Some(rect);
        view.surface.set_bounds(screen)?;
        Ok(())
    }

    pub fn set_url(&mut self, id: &ViewId, url: &str) -> Result<(), ViewError> {
        let view = self
            .views
            .get_mut(id)
            .ok_or_else(|| ViewError::ViewNotFound(id.clone()))?;
        view.url = Some(url.to_string());
        view.surface.navigate(url)?;
        Ok(())
    }

    /// Snapshot of every view's stored url and rectangle.
    pub fn get_all(&self) -> HashMap<ViewId, ViewData> {
        self.views
            .iter()
            .map(|(id, view)| {
                (
                    id.clone(),
                    ViewData {
                        url: view.url.clone(),
                        rectangle: view.rect,
                    },
                )
            })
            .collect()
    }

    /// Screen rectangle the surface itself reports.
    pub fn view_rectangle(&self, id: &ViewId) -> Result<Rect, ViewError> {
        let view = self
            .views
            .get(id)
            .ok_or_else(|| ViewError::ViewNotFound(id.clone()))?;
        Ok(view.surface.bounds())
    }

    /// Detaches and drops the view. Returns `false` when the id is
    /// unknown; deleting twice is not an error.
    pub fn delete_view(&mut self, id: &ViewId) -> bool {
        if self.views.remove(id).is_none() {
            debug!(view_id = %id, "delete ignored for unknown view");
            return false;
        }
        for host in [&self.main_window, &self.hidden_window] {
            if host.is_attached(id) {
                host.detach(id);
            }
        }
        debug!(view_id = %id, "view deleted");
        true
    }

    /// Applies the rectangle, then captures the reflowed frame as JPEG.
    pub async fn resize_capture(&mut self, id: &ViewId, rect: Rect) -> Result<Vec<u8>, ViewError> {
        self.set_rectangle(id, rect)?;
        let receiver = {
            let view = self
                .views
                .get(id)
                .ok_or_else(|| ViewError::ViewNotFound(id.clone()))?;
            view.surface.begin_capture(CAPTURE_JPEG_QUALITY)
        };
        match receiver.await {
            Ok(frame) => frame.map_err(ViewError::from),
            Err(_) => Err(ViewError::Surface(SurfaceError::CaptureFailed(
                "capture channel closed".to_string(),
            ))),
        }
    }

    /// Re-applies every stored rectangle through the current insets.
    /// Views without a placement yet are skipped.
    pub fn refresh_all_bounds(&self) {
        for (id, view) in &self.views {
            if let Some(rect) = view.rect {
                if let Err(err) = view.surface.set_bounds(self.insets.screen_rect(rect)) {
                    warn!(view_id = %id, error = %err, "failed to reposition view");
                }
            }
        }
    }

    pub fn hide_all(&self) {
        self.set_all_visible(false);
    }

    pub fn unhide_all(&self) {
        self.set_all_visible(true);
    }

    fn set_all_visible(&self, visible: bool) {
        for (id, view) in &self.views {
            if let Err(err) = view.surface.set_visible(visible) {
                warn!(view_id = %id, visible, error = %err, "failed to toggle view visibility");
            }
        }
    }

    /// Steps the zoom factor and returns the value applied.
    pub fn adjust_zoom(&self, id: &ViewId, direction: ZoomDirection) -> Result<f64, ViewError> {
        let view = self
            .views
            .get(id)
            .ok_or_else(|| ViewError::ViewNotFound(id.clone()))?;
        let current = view.surface.zoom_factor();
        let next = match direction {
            ZoomDirection::In => current + ZOOM_STEP,
            ZoomDirection::Out => current - ZOOM_STEP,
        };
        view.surface.set_zoom(next)?;
        debug!(view_id = %id, zoom = next, "zoom adjusted");
        Ok(next)
    }

    pub fn insets(&self) -> LayoutInsets {
        self.insets
    }

    pub fn set_border_px(&mut self, px: i32) {
        self.insets.set_border(px);
    }

    pub fn adjust_border_px(&mut self, delta: i32) {
        self.insets.adjust_border(delta);
    }

    pub fn set_titlebar_px(&mut self, px: i32) {
        self.insets.set_titlebar(px);
    }

    pub fn focus_main_window(&self) {
        self.main_window.focus();
    }

    /// Drains all pending events surfaces have reported.
    pub fn drain_events(&self) -> Vec<SurfaceEvent> {
        let mut events = self.events.lock().unwrap();
        std::mem::take(&mut *events)
    }

    pub fn view(&self, id: &ViewId) -> Option<&ViewInstance> {
        self.views.get(id)
    }

    pub fn contains(&self, id: &ViewId) -> bool {
        self.views.contains_key(id)
    }

    pub fn count(&self) -> usize {
        self.views.len()
    }

    pub fn view_ids(&self) -> Vec<ViewId> {
        self.views.keys().cloned().collect()
    }
}
