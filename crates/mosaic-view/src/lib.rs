pub mod headless;
pub mod registry;
pub mod surface;

pub use registry::{
    HostTarget, ViewData, ViewInstance, ViewRegistry, CAPTURE_JPEG_QUALITY, ZOOM_STEP,
};
pub use surface::{
    ContentSurface, DisplayQuery, EventSink, HostWindow, OverlayWindow, SurfaceEvent,
    SurfaceEventKind, SurfaceFactory, SurfaceOptions, SurfaceResult, ZoomDirection,
};
