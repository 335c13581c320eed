pub mod context;
pub mod display;
pub mod errors;
pub mod geometry;
pub mod id;
pub mod insets;
pub mod style;

pub use context::{ContextParams, Direction};
pub use display::{taskbar_bounds, DisplayInfo, DisplayMetrics};
pub use errors::{ShellError, SurfaceError, TreeError, ViewError};
pub use geometry::{Rect, Vector2};
pub use id::{new_id, NodeId, ViewId};
pub use insets::LayoutInsets;
pub use style::StyleMap;

pub type Result<T> = std::result::Result<T, ShellError>;
