//! Wire types for the shell's command surface.
//!
//! Each request variant serializes under a `channel` tag whose name is
//! the channel the host transport routes it on.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use mosaic_common::{ContextParams, DisplayMetrics, NodeId, Rect, Vector2, ViewId};
use mosaic_view::{HostTarget, SurfaceOptions, ViewData};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "kebab-case")]
pub enum Request {
    CreateView {
        id: ViewId,
        target: HostTarget,
        options: SurfaceOptions,
    },
    SetViewRectangle {
        id: ViewId,
        rect: Rect,
    },
    SetViewUrl {
        id: ViewId,
        url: String,
    },
    GetViewData,
    GetViewRectangle {
        id: ViewId,
    },
    DeleteView {
        id: ViewId,
    },
    ResizeCapture {
        id: ViewId,
        rect: Rect,
    },
    ShowPieMenu {
        id: NodeId,
        position: Option<Vector2>,
    },
    CallTileContextBehavior {
        id: NodeId,
        params: ContextParams,
        position: Option<Vector2>,
    },
    GetDisplayMetrics,
    SetOverlayIgnore {
        ignoring: bool,
    },
    AdjustBorderPx {
        delta: i32,
    },
    UpdateBorderPx {
        px: i32,
    },
    UpdateTitlebarPx {
        px: i32,
    },
    RefreshAllViewBounds,
    FocusMainWindow,
    HideAllViews,
    UnhideAllViews,
}

impl Request {
    /// Name of the transport channel this request arrives on.
    pub fn channel(&self) -> &'static str {
        match self {
            Request::CreateView { .. } => "create-view",
            Request::SetViewRectangle { .. } => "set-view-rectangle",
            Request::SetViewUrl { .. } => "set-view-url",
            Request::GetViewData => "get-view-data",
            Request::GetViewRectangle { .. } => "get-view-rectangle",
            Request::DeleteView { .. } => "delete-view",
            Request::ResizeCapture { .. } => "resize-capture",
            Request::ShowPieMenu { .. } => "show-pie-menu",
            Request::CallTileContextBehavior { .. } => "call-tile-context-behavior",
            Request::GetDisplayMetrics => "get-display-metrics",
            Request::SetOverlayIgnore { .. } => "set-overlay-ignore",
            Request::AdjustBorderPx { .. } => "adjust-border-px",
            Request::UpdateBorderPx { .. } => "update-border-px",
            Request::UpdateTitlebarPx { .. } => "update-titlebar-px",
            Request::RefreshAllViewBounds => "refresh-all-view-bounds",
            Request::FocusMainWindow => "focus-main-window",
            Request::HideAllViews => "hide-all-views",
            Request::UnhideAllViews => "unhide-all-views",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Response {
    Ack,
    ViewData { views: HashMap<ViewId, ViewData> },
    ViewRectangle { rect: Rect },
    Image { bytes: Vec<u8> },
    DisplayMetrics { metrics: DisplayMetrics },
}

/// Unsolicited messages the shell queues for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "notice", rename_all = "kebab-case")]
pub enum Notice {
    /// Input landed in a surface while a drag may be in progress; the
    /// renderer should release any held resize handles.
    ReleaseHandles,
    DisplayMetricsChanged { metrics: DisplayMetrics },
}
