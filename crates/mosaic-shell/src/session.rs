//! Request router that keeps the tile tree, the view registry, and the
//! overlay in step.

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use mosaic_common::{ContextParams, Direction, NodeId, Rect, Result, Vector2};
use mosaic_tiling::{layout, TileNode, TileTree};
use mosaic_view::{
    DisplayQuery, HostTarget, OverlayWindow, SurfaceEventKind, SurfaceOptions, ViewRegistry,
};

use crate::metrics::display_metrics;
use crate::request::{Notice, Request, Response};

/// Pie menu shown but not yet answered. Dropping the responder tells
/// the receiver the menu was superseded.
struct PendingMenu {
    tile: NodeId,
    responder: oneshot::Sender<Option<ContextParams>>,
}

/// Owns one window's worth of shell state and applies every mutation to
/// the tree and the registry together, so a split or delete can never
/// leave a tile without its view.
pub struct Session {
    tree: TileTree,
    registry: ViewRegistry,
    overlay: Arc<dyn OverlayWindow>,
    display: Arc<dyn DisplayQuery>,
    viewport: Rect,
    pending_menu: Option<PendingMenu>,
    notices: Vec<Notice>,
}

impl Session {
    pub fn new(
        tree: TileTree,
        registry: ViewRegistry,
        overlay: Arc<dyn OverlayWindow>,
        display: Arc<dyn DisplayQuery>,
        viewport: Rect,
    ) -> Self {
        Self {
            tree,
            registry,
            overlay,
            display,
            viewport,
            pending_menu: None,
            notices: Vec::new(),
        }
    }

    pub fn tree(&self) -> &TileTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut TileTree {
        &mut self.tree
    }

    pub fn registry(&self) -> &ViewRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ViewRegistry {
        &mut self.registry
    }

    pub fn viewport(&self) -> Rect {
        self.viewport
    }

    /// Stores the new viewport and lays every tile out again.
    pub fn set_viewport(&mut self, viewport: Rect) -> Result<()> {
        self.viewport = viewport;
        self.propagate_layout()
    }

    /// Routes one request to the subsystem that owns it. Everything
    /// applies synchronously except capture, which awaits its frame.
    pub async fn handle(&mut self, request: Request) -> Result<Response> {
        debug!(channel = request.channel(), "handling request");
        match request {
            Request::CreateView {
                id,
                target,
                options,
            } => {
                self.registry.create_view(&id, target, &options)?;
                Ok(Response::Ack)
            }
            Request::SetViewRectangle { id, rect } => {
                self.registry.set_rectangle(&id, rect)?;
                Ok(Response::Ack)
            }
            Request::SetViewUrl { id, url } => {
                if self.tree.tile(&id).is_some() {
                    self.tree.set_tile_url(&id, &url)?;
                }
                self.registry.set_url(&id, &url)?;
                Ok(Response::Ack)
            }
            Request::GetViewData => Ok(Response::ViewData {
                views: self.registry.get_all(),
            }),
            Request::GetViewRectangle { id } => Ok(Response::ViewRectangle {
                rect: self.registry.view_rectangle(&id)?,
            }),
            Request::DeleteView { id } => {
                self.registry.delete_view(&id);
                Ok(Response::Ack)
            }
            Request::ResizeCapture { id, rect } => {
                let bytes = self.registry.resize_capture(&id, rect).await?;
                Ok(Response::Image { bytes })
            }
            Request::ShowPieMenu { id, position } => {
                let _selection = self.show_pie_menu(&id, position);
                Ok(Response::Ack)
            }
            Request::CallTileContextBehavior {
                id,
                params,
                position,
            } => {
                if let Some(position) = position {
                    debug!(tile_id = %id, x = position.x, y = position.y, "context selection at position");
                }
                self.call_tile_context_behavior(&id, &params)?;
                Ok(Response::Ack)
            }
            Request::GetDisplayMetrics => Ok(Response::DisplayMetrics {
                metrics: display_metrics(self.display.as_ref()),
            }),
            Request::SetOverlayIgnore { ignoring } => {
                self.set_overlay_ignore(ignoring);
                Ok(Response::Ack)
            }
            Request::AdjustBorderPx { delta } => {
                self.registry.adjust_border_px(delta);
                self.registry.refresh_all_bounds();
                Ok(Response::Ack)
            }
            Request::UpdateBorderPx { px } => {
                self.registry.set_border_px(px);
                self.registry.refresh_all_bounds();
                Ok(Response::Ack)
            }
            Request::UpdateTitlebarPx { px } => {
                self.registry.set_titlebar_px(px);
                self.registry.refresh_all_bounds();
                Ok(Response::Ack)
            }
            Request::RefreshAllViewBounds => {
                self.registry.refresh_all_bounds();
                Ok(Response::Ack)
            }
            Request::FocusMainWindow => {
                self.registry.focus_main_window();
                Ok(Response::Ack)
            }
            Request::HideAllViews => {
                self.registry.hide_all();
                Ok(Response::Ack)
            }
            Request::UnhideAllViews => {
                self.registry.unhide_all();
                Ok(Response::Ack)
            }
        }
    }

    /// Runs a context-menu selection against the tile it targets, then
    /// invokes the tile's own context hook. The hook is captured first
    /// so a delete still reaches it.
    pub fn call_tile_context_behavior(
        &mut self,
        id: &NodeId,
        params: &ContextParams,
    ) -> Result<()> {
        let hook = self.tree.require_tile(id)?.context_hook();

        if self
            .pending_menu
            .as_ref()
            .is_some_and(|pending| pending.tile == *id)
        {
            if let Some(pending) = self.pending_menu.take() {
                let _ = pending.responder.send(Some(params.clone()));
            }
        }

        match params {
            ContextParams::Split { direction } => self.split_tile(id, *direction)?,
            ContextParams::SetUrl { url } => self.set_view_url(id, url)?,
            ContextParams::Delete => self.delete_tile(id)?,
        }

        (hook)(id, params);
        Ok(())
    }

    /// Splits `id` toward `direction` and binds a fresh view to the new
    /// tile. The new tile takes over the source tile's hooks.
    pub fn split_tile(&mut self, id: &NodeId, direction: Direction) -> Result<()> {
        let source = self.tree.require_tile(id)?;
        let new_tile = TileNode::new()
            .with_context_hook(source.context_hook())
            .with_resize_hook(source.resize_hook());

        let outcome = self.tree.split(id, direction, new_tile)?;
        self.registry
            .create_view(&outcome.tile, HostTarget::Main, &SurfaceOptions::default())?;
        self.propagate_layout()?;

        if let Some(container) = self.tree.container(&outcome.container) {
            container.request_refresh();
        }
        Ok(())
    }

    /// Removes the tile and its view, then re-lays out the survivors.
    pub fn delete_tile(&mut self, id: &NodeId) -> Result<()> {
        let parent = self.tree.require_tile(id)?.parent().cloned();

        self.registry.delete_view(id);
        self.tree.delete(id)?;
        if !self.tree.is_empty() {
            self.propagate_layout()?;
        }

        // The parent container collapses away when the delete left it
        // with one child; fall back to a tree-level refresh then.
        match parent.as_ref().and_then(|pid| self.tree.container(pid)) {
            Some(container) => container.request_refresh(),
            None => self.tree.request_refresh(),
        }
        Ok(())
    }

    /// Stores the url on the tile and navigates its view.
    pub fn set_view_url(&mut self, id: &NodeId, url: &str) -> Result<()> {
        self.tree.set_tile_url(id, url)?;
        self.registry.set_url(id, url)?;
        Ok(())
    }

    /// Opens the pie menu over `tile`, at `position` or at the cursor.
    /// The receiver resolves with the selection, `None` when the menu
    /// was dismissed, or an error when a newer menu replaced this one.
    pub fn show_pie_menu(
        &mut self,
        tile: &NodeId,
        position: Option<Vector2>,
    ) -> oneshot::Receiver<Option<ContextParams>> {
        let position = position.unwrap_or_else(|| self.display.cursor_position());
        self.overlay.set_ignore_cursor_events(false);
        self.overlay.show_pie_menu(tile, position);
        self.overlay.focus();

        let (responder, receiver) = oneshot::channel();
        if let Some(previous) = self.pending_menu.replace(PendingMenu {
            tile: tile.clone(),
            responder,
        }) {
            debug!(tile_id = %previous.tile, "pie menu superseded");
        }
        receiver
    }

    /// Applies the overlay's click-through state. Turning it back on
    /// dismisses any menu still waiting for a selection.
    pub fn set_overlay_ignore(&mut self, ignoring: bool) {
        self.overlay.set_ignore_cursor_events(ignoring);
        if ignoring {
            if let Some(pending) = self.pending_menu.take() {
                debug!(tile_id = %pending.tile, "pie menu dismissed");
                let _ = pending.responder.send(None);
            }
        }
    }

    /// Lays the tree out over the current viewport and pushes each
    /// tile's rectangle into its view. Tiles without a bound view are
    /// skipped so one missing binding cannot stall the rest.
    pub fn propagate_layout(&mut self) -> Result<()> {
        let placements = layout::compute(&self.tree, self.viewport)?;
        for (id, rect) in placements {
            if let Err(err) = self.registry.set_rectangle(&id, rect) {
                warn!(view_id = %id, error = %err, "layout skipped a view");
                continue;
            }
            if let Some(tile) = self.tree.tile(&id) {
                tile.notify_resize(rect);
            }
        }
        Ok(())
    }

    /// Drains events the surfaces reported and reacts to each: context
    /// menus open the pie menu at the cursor, zoom gestures step the
    /// zoom factor, and non-pointer input queues a handle release.
    pub fn pump_surface_events(&mut self) {
        for event in self.registry.drain_events() {
            match event.kind {
                SurfaceEventKind::ContextMenu => {
                    let _selection = self.show_pie_menu(&event.view, None);
                }
                SurfaceEventKind::ZoomChanged { direction } => {
                    if let Err(err) = self.registry.adjust_zoom(&event.view, direction) {
                        warn!(view_id = %event.view, error = %err, "zoom event dropped");
                    }
                }
                SurfaceEventKind::InputActivity { pointer_move } => {
                    if !pointer_move {
                        self.notices.push(Notice::ReleaseHandles);
                    }
                }
            }
        }
    }

    /// Queues a display-metrics notice for the presentation layer.
    pub fn notify_display_changed(&mut self) {
        let metrics = display_metrics(self.display.as_ref());
        self.notices.push(Notice::DisplayMetricsChanged { metrics });
    }

    /// Drains queued notices for delivery to the presentation layer.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Moves a container's handles and lays out to match.
    pub fn set_handle_percents(&mut self, container_id: &NodeId, percents: Vec<f64>) -> Result<()> {
        self.tree.set_handle_percents(container_id, percents)?;
        self.propagate_layout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use mosaic_common::{ShellError, TreeError};
    use mosaic_view::headless::{HeadlessDisplay, HeadlessFactory, HeadlessOverlay, HeadlessWindow};
    use mosaic_view::{ContentSurface, HostWindow, ZoomDirection};

    struct Fixture {
        session: Session,
        factory: HeadlessFactory,
        main: Arc<HeadlessWindow>,
        hidden: Arc<HeadlessWindow>,
        overlay: Arc<HeadlessOverlay>,
        display: Arc<HeadlessDisplay>,
        root: NodeId,
    }

    fn fixture() -> Fixture {
        fixture_with_tree(TileTree::new(TileNode::new()))
    }

    /// Session over `tree` with a view bound to every tile and an
    /// initial layout pass applied over an 800x600 viewport.
    fn fixture_with_tree(tree: TileTree) -> Fixture {
        let factory = HeadlessFactory::default();
        let main = Arc::new(HeadlessWindow::default());
        let hidden = Arc::new(HeadlessWindow::default());
        let overlay = Arc::new(HeadlessOverlay::default());
        let display = Arc::new(HeadlessDisplay::default());

        let root = tree.tile_ids().first().cloned().expect("tree has a tile");
        let registry = ViewRegistry::new(Box::new(factory.clone()), main.clone(), hidden.clone());
        let mut session = Session::new(
            tree,
            registry,
            overlay.clone(),
            display.clone(),
            Rect::new(0, 0, 800, 600),
        );
        for id in session.tree().tile_ids() {
            session
                .registry_mut()
                .create_view(&id, HostTarget::Main, &SurfaceOptions::default())
                .unwrap();
        }
        session.propagate_layout().unwrap();

        Fixture {
            session,
            factory,
            main,
            hidden,
            overlay,
            display,
            root,
        }
    }

    fn other_tile(fx: &Fixture) -> NodeId {
        fx.session
            .tree()
            .tile_ids()
            .into_iter()
            .find(|id| *id != fx.root)
            .expect("a second tile")
    }

    #[tokio::test]
    async fn create_view_request_attaches_to_hidden_window() {
        let mut fx = fixture();
        let id = NodeId::new();

        let response = fx
            .session
            .handle(Request::CreateView {
                id: id.clone(),
                target: HostTarget::Hidden,
                options: SurfaceOptions::with_url("https://example.com"),
            })
            .await
            .unwrap();

        assert_eq!(response, Response::Ack);
        assert!(fx.hidden.is_attached(&id));
        assert!(!fx.main.is_attached(&id));
        assert_eq!(fx.session.registry().count(), 2);
    }

    #[tokio::test]
    async fn split_via_context_behavior() {
        let mut fx = fixture();

        fx.session
            .handle(Request::CallTileContextBehavior {
                id: fx.root.clone(),
                params: ContextParams::Split {
                    direction: Direction::Right,
                },
                position: None,
            })
            .await
            .unwrap();

        assert_eq!(fx.session.tree().tile_count(), 2);
        assert_eq!(fx.session.registry().count(), 2);

        let new_tile = other_tile(&fx);
        assert!(fx.main.is_attached(&new_tile));
        assert_eq!(
            fx.session.registry().view(&fx.root).unwrap().rect(),
            Some(Rect::new(0, 0, 400, 600))
        );
        assert_eq!(
            fx.session.registry().view(&new_tile).unwrap().rect(),
            Some(Rect::new(400, 0, 400, 600))
        );
    }

    #[tokio::test]
    async fn delete_via_context_behavior() {
        let mut fx = fixture();
        fx.session
            .handle(Request::CallTileContextBehavior {
                id: fx.root.clone(),
                params: ContextParams::Split {
                    direction: Direction::Right,
                },
                position: None,
            })
            .await
            .unwrap();
        let new_tile = other_tile(&fx);

        fx.session
            .handle(Request::CallTileContextBehavior {
                id: new_tile.clone(),
                params: ContextParams::Delete,
                position: None,
            })
            .await
            .unwrap();

        assert_eq!(fx.session.tree().tile_count(), 1);
        assert_eq!(fx.session.tree().container_count(), 0);
        assert_eq!(fx.session.registry().count(), 1);
        assert!(!fx.session.registry().contains(&new_tile));
        assert_eq!(
            fx.session.registry().view(&fx.root).unwrap().rect(),
            Some(Rect::new(0, 0, 800, 600))
        );
    }

    #[tokio::test]
    async fn set_url_via_context_behavior() {
        let mut fx = fixture();

        fx.session
            .handle(Request::CallTileContextBehavior {
                id: fx.root.clone(),
                params: ContextParams::SetUrl {
                    url: "https://example.com/docs".into(),
                },
                position: None,
            })
            .await
            .unwrap();

        assert_eq!(
            fx.session.tree().tile(&fx.root).unwrap().url(),
            Some("https://example.com/docs")
        );
        assert_eq!(
            fx.factory.surface(&fx.root).unwrap().last_url().as_deref(),
            Some("https://example.com/docs")
        );
    }

    #[tokio::test]
    async fn context_behavior_on_unknown_tile_fails() {
        let mut fx = fixture();

        let err = fx
            .session
            .handle(Request::CallTileContextBehavior {
                id: NodeId::new(),
                params: ContextParams::Delete,
                position: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ShellError::Tree(TreeError::NodeNotFound(_))
        ));
    }

    #[tokio::test]
    async fn context_hook_runs_after_delete() {
        let calls: Arc<Mutex<Vec<(NodeId, ContextParams)>>> = Arc::new(Mutex::new(Vec::new()));
        let recorder = calls.clone();
        let tile = TileNode::new().with_context_hook(Arc::new(move |id, params| {
            recorder.lock().unwrap().push((id.clone(), params.clone()));
        }));
        let mut fx = fixture_with_tree(TileTree::new(tile));

        fx.session
            .handle(Request::CallTileContextBehavior {
                id: fx.root.clone(),
                params: ContextParams::Delete,
                position: None,
            })
            .await
            .unwrap();

        assert!(fx.session.tree().is_empty());
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, fx.root);
        assert_eq!(calls[0].1, ContextParams::Delete);
    }

    #[tokio::test]
    async fn split_copies_behavior_to_new_tile() {
        let calls: Arc<Mutex<Vec<NodeId>>> = Arc::new(Mutex::new(Vec::new()));
        let recorder = calls.clone();
        let tile = TileNode::new().with_context_hook(Arc::new(move |id, _params| {
            recorder.lock().unwrap().push(id.clone());
        }));
        let mut fx = fixture_with_tree(TileTree::new(tile));

        fx.session
            .handle(Request::CallTileContextBehavior {
                id: fx.root.clone(),
                params: ContextParams::Split {
                    direction: Direction::Right,
                },
                position: None,
            })
            .await
            .unwrap();
        let new_tile = other_tile(&fx);

        fx.session
            .handle(Request::CallTileContextBehavior {
                id: new_tile.clone(),
                params: ContextParams::Split {
                    direction: Direction::Down,
                },
                position: None,
            })
            .await
            .unwrap();

        assert_eq!(*calls.lock().unwrap(), vec![fx.root.clone(), new_tile]);
        assert_eq!(fx.session.tree().tile_count(), 3);
    }

    #[tokio::test]
    async fn pie_menu_flow_resolves_selection() {
        let mut fx = fixture();
        fx.display.set_cursor(Vector2::new(333, 444));

        let receiver = fx.session.show_pie_menu(&fx.root, None);
        assert!(!fx.overlay.ignoring());
        assert_eq!(
            fx.overlay.pie_requests(),
            vec![(fx.root.clone(), Vector2::new(333, 444))]
        );
        assert_eq!(fx.overlay.focus_count(), 1);

        fx.session
            .handle(Request::CallTileContextBehavior {
                id: fx.root.clone(),
                params: ContextParams::SetUrl {
                    url: "https://example.com/a".into(),
                },
                position: None,
            })
            .await
            .unwrap();

        let selection = receiver.await.unwrap();
        assert_eq!(
            selection,
            Some(ContextParams::SetUrl {
                url: "https://example.com/a".into(),
            })
        );
    }

    #[tokio::test]
    async fn overlay_ignore_dismisses_pending_menu() {
        let mut fx = fixture();

        let receiver = fx.session.show_pie_menu(&fx.root, Some(Vector2::new(10, 10)));
        fx.session
            .handle(Request::SetOverlayIgnore { ignoring: true })
            .await
            .unwrap();

        assert!(fx.overlay.ignoring());
        assert_eq!(receiver.await.unwrap(), None);
    }

    #[tokio::test]
    async fn second_menu_supersedes_first() {
        let mut fx = fixture();

        let first = fx.session.show_pie_menu(&fx.root, Some(Vector2::new(1, 1)));
        let second = fx.session.show_pie_menu(&fx.root, Some(Vector2::new(2, 2)));

        assert!(first.await.is_err());

        fx.session
            .handle(Request::CallTileContextBehavior {
                id: fx.root.clone(),
                params: ContextParams::Delete,
                position: None,
            })
            .await
            .unwrap();
        assert_eq!(second.await.unwrap(), Some(ContextParams::Delete));
    }

    #[test]
    fn pump_context_menu_opens_pie_at_cursor() {
        let mut fx = fixture();
        fx.display.set_cursor(Vector2::new(50, 60));

        fx.factory.emit(&fx.root, SurfaceEventKind::ContextMenu);
        fx.session.pump_surface_events();

        assert!(!fx.overlay.ignoring());
        assert_eq!(
            fx.overlay.pie_requests(),
            vec![(fx.root.clone(), Vector2::new(50, 60))]
        );
    }

    #[test]
    fn pump_zoom_events_step_zoom() {
        let mut fx = fixture();

        fx.factory.emit(
            &fx.root,
            SurfaceEventKind::ZoomChanged {
                direction: ZoomDirection::In,
            },
        );
        fx.session.pump_surface_events();
        assert!((fx.factory.surface(&fx.root).unwrap().zoom() - 1.1).abs() < 1e-9);

        fx.factory.emit(
            &fx.root,
            SurfaceEventKind::ZoomChanged {
                direction: ZoomDirection::Out,
            },
        );
        fx.session.pump_surface_events();
        assert!((fx.factory.surface(&fx.root).unwrap().zoom() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn pump_input_activity_requests_handle_release() {
        let mut fx = fixture();

        fx.factory.emit(
            &fx.root,
            SurfaceEventKind::InputActivity { pointer_move: true },
        );
        fx.factory.emit(
            &fx.root,
            SurfaceEventKind::InputActivity {
                pointer_move: false,
            },
        );
        fx.session.pump_surface_events();

        assert_eq!(fx.session.drain_notices(), vec![Notice::ReleaseHandles]);
        assert!(fx.session.drain_notices().is_empty());
    }

    #[tokio::test]
    async fn border_commands_reposition_views() {
        let mut fx = fixture();

        fx.session
            .handle(Request::UpdateBorderPx { px: 0 })
            .await
            .unwrap();
        fx.session
            .handle(Request::UpdateTitlebarPx { px: 0 })
            .await
            .unwrap();
        assert_eq!(
            fx.factory.surface(&fx.root).unwrap().bounds(),
            Rect::new(0, 0, 800, 600)
        );

        fx.session
            .handle(Request::AdjustBorderPx { delta: 5 })
            .await
            .unwrap();
        assert_eq!(
            fx.factory.surface(&fx.root).unwrap().bounds(),
            Rect::new(5, 5, 790, 590)
        );
    }

    #[tokio::test]
    async fn display_metrics_request() {
        let mut fx = fixture();

        let response = fx.session.handle(Request::GetDisplayMetrics).await.unwrap();
        match response {
            Response::DisplayMetrics { metrics } => {
                assert_eq!(metrics.taskbar, Rect::new(0, 1040, 1920, 40));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[test]
    fn notify_display_changed_queues_metrics() {
        let mut fx = fixture();

        fx.session.notify_display_changed();

        let notices = fx.session.drain_notices();
        assert_eq!(notices.len(), 1);
        assert!(matches!(notices[0], Notice::DisplayMetricsChanged { .. }));
    }

    #[tokio::test]
    async fn focus_hide_unhide_requests() {
        let mut fx = fixture();

        fx.session.handle(Request::FocusMainWindow).await.unwrap();
        assert_eq!(fx.main.focus_count(), 1);

        fx.session.handle(Request::HideAllViews).await.unwrap();
        assert!(!fx.factory.surface(&fx.root).unwrap().visible());

        fx.session.handle(Request::UnhideAllViews).await.unwrap();
        assert!(fx.factory.surface(&fx.root).unwrap().visible());
    }

    #[tokio::test]
    async fn view_data_and_rectangle_requests() {
        let mut fx = fixture();

        let response = fx.session.handle(Request::GetViewData).await.unwrap();
        match response {
            Response::ViewData { views } => {
                assert_eq!(views.len(), 1);
                let data = views.get(&fx.root).unwrap();
                assert_eq!(data.rectangle, Some(Rect::new(0, 0, 800, 600)));
            }
            other => panic!("unexpected response: {other:?}"),
        }

        let response = fx
            .session
            .handle(Request::GetViewRectangle {
                id: fx.root.clone(),
            })
            .await
            .unwrap();
        match response {
            Response::ViewRectangle { rect } => {
                assert_eq!(rect, Rect::new(2, 34, 796, 596));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn set_view_url_request_updates_tile() {
        let mut fx = fixture();

        fx.session
            .handle(Request::SetViewUrl {
                id: fx.root.clone(),
                url: "https://example.com/feed".into(),
            })
            .await
            .unwrap();

        assert_eq!(
            fx.session.tree().tile(&fx.root).unwrap().url(),
            Some("https://example.com/feed")
        );
        assert_eq!(
            fx.factory.surface(&fx.root).unwrap().last_url().as_deref(),
            Some("https://example.com/feed")
        );
    }

    #[tokio::test]
    async fn resize_capture_request_returns_frame() {
        let mut fx = fixture();
        fx.factory
            .surface(&fx.root)
            .unwrap()
            .set_capture_payload(b"tab-preview".to_vec());

        let response = fx
            .session
            .handle(Request::ResizeCapture {
                id: fx.root.clone(),
                rect: Rect::new(0, 0, 320, 240),
            })
            .await
            .unwrap();

        match response {
            Response::Image { bytes } => assert_eq!(bytes, b"tab-preview"),
            other => panic!("unexpected response: {other:?}"),
        }
        assert_eq!(
            fx.session.registry().view(&fx.root).unwrap().rect(),
            Some(Rect::new(0, 0, 320, 240))
        );
    }

    #[tokio::test]
    async fn delete_view_request_ignores_unknown_ids() {
        let mut fx = fixture();

        let response = fx
            .session
            .handle(Request::DeleteView { id: NodeId::new() })
            .await
            .unwrap();
        assert_eq!(response, Response::Ack);
        assert_eq!(fx.session.registry().count(), 1);
    }

    #[tokio::test]
    async fn set_handle_percents_moves_layout() {
        let mut fx = fixture();
        fx.session
            .handle(Request::CallTileContextBehavior {
                id: fx.root.clone(),
                params: ContextParams::Split {
                    direction: Direction::Right,
                },
                position: None,
            })
            .await
            .unwrap();
        let container = fx.session.tree().root().cloned().unwrap();

        fx.session
            .set_handle_percents(&container, vec![0.25, 0.75])
            .unwrap();

        let new_tile = other_tile(&fx);
        assert_eq!(
            fx.session.registry().view(&fx.root).unwrap().rect(),
            Some(Rect::new(0, 0, 200, 600))
        );
        assert_eq!(
            fx.session.registry().view(&new_tile).unwrap().rect(),
            Some(Rect::new(200, 0, 600, 600))
        );
    }

    #[test]
    fn set_viewport_relayouts() {
        let mut fx = fixture();

        fx.session.set_viewport(Rect::new(0, 0, 1000, 700)).unwrap();

        assert_eq!(fx.session.viewport(), Rect::new(0, 0, 1000, 700));
        assert_eq!(
            fx.session.registry().view(&fx.root).unwrap().rect(),
            Some(Rect::new(0, 0, 1000, 700))
        );
    }

    #[tokio::test]
    async fn set_viewport_retiles_split_views() {
        let mut fx = fixture();
        fx.session
            .handle(Request::CallTileContextBehavior {
                id: fx.root.clone(),
                params: ContextParams::Split {
                    direction: Direction::Right,
                },
                position: None,
            })
            .await
            .unwrap();
        let new_tile = other_tile(&fx);

        fx.session.set_viewport(Rect::new(0, 0, 1001, 733)).unwrap();

        // Odd width: the second slice absorbs the rounding remainder and
        // both share the inner edge.
        assert_eq!(
            fx.session.registry().view(&fx.root).unwrap().rect(),
            Some(Rect::new(0, 0, 501, 733))
        );
        assert_eq!(
            fx.session.registry().view(&new_tile).unwrap().rect(),
            Some(Rect::new(501, 0, 500, 733))
        );

        fx.session
            .handle(Request::RefreshAllViewBounds)
            .await
            .unwrap();
        assert_eq!(
            fx.factory.surface(&fx.root).unwrap().bounds(),
            Rect::new(2, 34, 497, 729)
        );
        assert_eq!(
            fx.factory.surface(&new_tile).unwrap().bounds(),
            Rect::new(503, 34, 496, 729)
        );
    }

    #[tokio::test]
    async fn refresh_requests_reach_renderer() {
        let refreshes = Arc::new(Mutex::new(0usize));
        let counter = refreshes.clone();
        let tree = TileTree::with_refresh(
            TileNode::new(),
            Arc::new(move || {
                *counter.lock().unwrap() += 1;
            }),
        );
        let mut fx = fixture_with_tree(tree);

        fx.session
            .handle(Request::CallTileContextBehavior {
                id: fx.root.clone(),
                params: ContextParams::Split {
                    direction: Direction::Right,
                },
                position: None,
            })
            .await
            .unwrap();
        assert_eq!(*refreshes.lock().unwrap(), 1);

        let new_tile = other_tile(&fx);
        fx.session
            .handle(Request::CallTileContextBehavior {
                id: new_tile,
                params: ContextParams::Delete,
                position: None,
            })
            .await
            .unwrap();
        assert_eq!(*refreshes.lock().unwrap(), 2);
    }

    #[test]
    fn resize_hooks_fire_on_layout() {
        let resizes: Arc<Mutex<Vec<(NodeId, Rect)>>> = Arc::new(Mutex::new(Vec::new()));
        let recorder = resizes.clone();
        let tile = TileNode::new().with_resize_hook(Arc::new(move |id, rect| {
            recorder.lock().unwrap().push((id.clone(), rect));
        }));
        let mut fx = fixture_with_tree(TileTree::new(tile));

        fx.session.set_viewport(Rect::new(0, 0, 1000, 700)).unwrap();

        let records = resizes.lock().unwrap();
        assert_eq!(
            *records,
            vec![
                (fx.root.clone(), Rect::new(0, 0, 800, 600)),
                (fx.root.clone(), Rect::new(0, 0, 1000, 700)),
            ]
        );
    }

    #[test]
    fn layout_skips_views_without_bindings() {
        let mut fx = fixture();
        fx.session
            .tree_mut()
            .split(&fx.root, Direction::Right, TileNode::new())
            .unwrap();

        fx.session.propagate_layout().unwrap();

        assert_eq!(fx.session.registry().count(), 1);
        assert_eq!(
            fx.session.registry().view(&fx.root).unwrap().rect(),
            Some(Rect::new(0, 0, 400, 600))
        );
    }
}
