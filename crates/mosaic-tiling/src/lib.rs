pub mod layout;
pub mod tree;

pub use layout::{compute, split_rect};
pub use tree::{
    ContainerNode, ContextHook, NodeRef, Orientation, RefreshHook, ResizeHook, SplitOutcome,
    TileNode, TileTree, PERCENT_EPSILON,
};
