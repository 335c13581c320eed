//! Core types for the tile tree: nodes, behavior hooks, and the arena.

use mosaic_common::{ContextParams, Direction, NodeId, Rect, StyleMap, TreeError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Tolerance when checking that handle percents sum to 1.
pub const PERCENT_EPSILON: f64 = 1e-6;

/// Axis a container distributes its children along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    Row,
    Column,
}

impl From<Direction> for Orientation {
    fn from(direction: Direction) -> Self {
        if direction.is_horizontal() {
            Orientation::Row
        } else {
            Orientation::Column
        }
    }
}

/// Invoked when a context-menu selection lands on a tile.
pub type ContextHook = Arc<dyn Fn(&NodeId, &ContextParams) + Send + Sync>;
/// Invoked when layout assigns a tile a new rectangle.
pub type ResizeHook = Arc<dyn Fn(&NodeId, Rect) + Send + Sync>;
/// Requests a re-render of the presentation that owns the tree.
pub type RefreshHook = Arc<dyn Fn() + Send + Sync>;

fn default_context_hook() -> ContextHook {
    Arc::new(|id, _params| {
        tracing::debug!(tile_id = %id, "tile has no context behavior bound");
    })
}

fn default_resize_hook() -> ResizeHook {
    Arc::new(|id, _rect| {
        tracing::trace!(tile_id = %id, "tile has no resize behavior bound");
    })
}

/// Leaf of the tree. Carries the identity its bound view shares plus
/// presentation state the shell stores but never interprets.
#[derive(Clone)]
pub struct TileNode {
    pub(super) id: NodeId,
    pub(super) parent: Option<NodeId>,
    pub(super) url: Option<String>,
    pub(super) class_name: Option<String>,
    pub(super) style: StyleMap,
    pub(super) on_context: ContextHook,
    pub(super) on_resize: ResizeHook,
}

impl TileNode {
    pub fn new() -> Self {
        Self::with_id(NodeId::new())
    }

    pub fn with_id(id: NodeId) -> Self {
        Self {
            id,
            parent: None,
            url: None,
            class_name: None,
            style: StyleMap::new(),
            on_context: default_context_hook(),
            on_resize: default_resize_hook(),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    pub fn with_style(mut self, style: StyleMap) -> Self {
        self.style = style;
        self
    }

    pub fn with_context_hook(mut self, hook: ContextHook) -> Self {
        self.on_context = hook;
        self
    }

    pub fn with_resize_hook(mut self, hook: ResizeHook) -> Self {
        self.on_resize = hook;
        self
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn style(&self) -> &StyleMap {
        &self.style
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = Some(url.into());
    }

    pub fn set_context_hook(&mut self, hook: ContextHook) {
        self.on_context = hook;
    }

    pub fn set_resize_hook(&mut self, hook: ResizeHook) {
        self.on_resize = hook;
    }

    /// Clone of the context hook, so a split can hand the new sibling
    /// the same behavior.
    pub fn context_hook(&self) -> ContextHook {
        Arc::clone(&self.on_context)
    }

    pub fn resize_hook(&self) -> ResizeHook {
        Arc::clone(&self.on_resize)
    }

    pub fn notify_context(&self, params: &ContextParams) {
        (self.on_context)(&self.id, params);
    }

    pub fn notify_resize(&self, rect: Rect) {
        (self.on_resize)(&self.id, rect);
    }
}

impl Default for TileNode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TileNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileNode")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("url", &self.url)
            .field("class_name", &self.class_name)
            .finish()
    }
}

/// Interior node. Children are ordered along the orientation axis and
/// sized by a percent vector with one entry per child.
#[derive(Clone)]
pub struct ContainerNode {
    pub(super) id: NodeId,
    pub(super) parent: Option<NodeId>,
    pub(super) orientation: Orientation,
    pub(super) children: Vec<NodeId>,
    pub(super) handle_percents: Vec<f64>,
    pub(super) style: StyleMap,
    pub(super) refresh: RefreshHook,
}

impl ContainerNode {
    pub(super) fn new(
        orientation: Orientation,
        children: Vec<NodeId>,
        handle_percents: Vec<f64>,
        refresh: RefreshHook,
    ) -> Self {
        Self {
            id: NodeId::new(),
            parent: None,
            orientation,
            children,
            handle_percents,
            style: StyleMap::new(),
            refresh,
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn handle_percents(&self) -> &[f64] {
        &self.handle_percents
    }

    pub fn style(&self) -> &StyleMap {
        &self.style
    }

    pub fn request_refresh(&self) {
        (self.refresh)();
    }
}

impl fmt::Debug for ContainerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerNode")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("orientation", &self.orientation)
            .field("children", &self.children)
            .field("handle_percents", &self.handle_percents)
            .finish()
    }
}

/// Borrowed view of either node kind, for callers that resolve an id
/// without knowing what it names.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Tile(&'a TileNode),
    Container(&'a ContainerNode),
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> &NodeId {
        match self {
            NodeRef::Tile(tile) => tile.id(),
            NodeRef::Container(container) => container.id(),
        }
    }

    pub fn parent(&self) -> Option<&NodeId> {
        match self {
            NodeRef::Tile(tile) => tile.parent(),
            NodeRef::Container(container) => container.parent(),
        }
    }

    pub fn is_tile(&self) -> bool {
        matches!(self, NodeRef::Tile(_))
    }

    pub fn is_container(&self) -> bool {
        matches!(self, NodeRef::Container(_))
    }
}

/// Ids produced by a split: the container that took the leaf's place
/// and the tile created beside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOutcome {
    pub container: NodeId,
    pub tile: NodeId,
}

/// Arena of tiles and containers plus the id of the root node.
/// Parent links point upward; containers list children downward.
pub struct TileTree {
    pub(super) root: Option<NodeId>,
    pub(super) tiles: HashMap<NodeId, TileNode>,
    pub(super) containers: HashMap<NodeId, ContainerNode>,
    pub(super) refresh: RefreshHook,
}

impl TileTree {
    /// Tree holding a single root tile.
    pub fn new(root: TileNode) -> Self {
        Self::with_refresh(root, Arc::new(|| {}))
    }

    /// Tree holding a single root tile, with a re-render callback that
    /// splits hand down to the containers they create.
    pub fn with_refresh(mut root: TileNode, refresh: RefreshHook) -> Self {
        root.parent = None;
        let root_id = root.id.clone();
        let mut tiles = HashMap::new();
        tiles.insert(root_id.clone(), root);
        Self {
            root: Some(root_id),
            tiles,
            containers: HashMap::new(),
            refresh,
        }
    }

    /// Tree whose root is a container over the given tiles. Rejects an
    /// empty tile list and percent vectors that fail validation.
    pub fn with_root_container(
        orientation: Orientation,
        tiles: Vec<TileNode>,
        handle_percents: Vec<f64>,
    ) -> Result<Self, TreeError> {
        if tiles.is_empty() {
            return Err(TreeError::EmptyTree);
        }
        validate_percents(tiles.len(), &handle_percents)?;

        let refresh: RefreshHook = Arc::new(|| {});
        let mut container = ContainerNode::new(
            orientation,
            Vec::with_capacity(tiles.len()),
            handle_percents,
            Arc::clone(&refresh),
        );
        let container_id = container.id.clone();

        let mut tile_map = HashMap::new();
        for mut tile in tiles {
            tile.parent = Some(container_id.clone());
            container.children.push(tile.id.clone());
            tile_map.insert(tile.id.clone(), tile);
        }

        let mut containers = HashMap::new();
        containers.insert(container_id.clone(), container);
        Ok(Self {
            root: Some(container_id),
            tiles: tile_map,
            containers,
            refresh,
        })
    }

    pub fn root(&self) -> Option<&NodeId> {
        self.root.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.tiles.contains_key(id) || self.containers.contains_key(id)
    }

    pub fn resolve(&self, id: &NodeId) -> Option<NodeRef<'_>> {
        if let Some(tile) = self.tiles.get(id) {
            return Some(NodeRef::Tile(tile));
        }
        self.containers.get(id).map(NodeRef::Container)
    }

    pub fn tile(&self, id: &NodeId) -> Option<&TileNode> {
        self.tiles.get(id)
    }

    pub fn tile_mut(&mut self, id: &NodeId) -> Option<&mut TileNode> {
        self.tiles.get_mut(id)
    }

    pub fn container(&self, id: &NodeId) -> Option<&ContainerNode> {
        self.containers.get(id)
    }

    pub fn require_tile(&self, id: &NodeId) -> Result<&TileNode, TreeError> {
        match self.tiles.get(id) {
            Some(tile) => Ok(tile),
            None if self.containers.contains_key(id) => Err(TreeError::NotATile(id.clone())),
            None => Err(TreeError::NodeNotFound(id.clone())),
        }
    }

    pub fn require_container(&self, id: &NodeId) -> Result<&ContainerNode, TreeError> {
        match self.containers.get(id) {
            Some(container) => Ok(container),
            None if self.tiles.contains_key(id) => Err(TreeError::NotAContainer(id.clone())),
            None => Err(TreeError::NodeNotFound(id.clone())),
        }
    }

    /// Collects tile ids in depth-first child order.
    pub fn tile_ids(&self) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.tiles.len());
        if let Some(root) = &self.root {
            self.collect_tile_ids(root, &mut ids);
        }
        ids
    }

    fn collect_tile_ids(&self, id: &NodeId, out: &mut Vec<NodeId>) {
        if self.tiles.contains_key(id) {
            out.push(id.clone());
            return;
        }
        if let Some(container) = self.containers.get(id) {
            for child in &container.children {
                self.collect_tile_ids(child, out);
            }
        }
    }

    pub fn request_refresh(&self) {
        (self.refresh)();
    }

    pub(super) fn refresh_hook(&self) -> RefreshHook {
        Arc::clone(&self.refresh)
    }
}

impl fmt::Debug for TileTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileTree")
            .field("root", &self.root)
            .field("tiles", &self.tiles)
            .field("containers", &self.containers)
            .finish()
    }
}

pub(crate) fn validate_percents(expected: usize, percents: &[f64]) -> Result<(), TreeError> {
    if percents.len() != expected {
        return Err(TreeError::PercentCountMismatch {
            expected,
            got: percents.len(),
        });
    }
    for (index, value) in percents.iter().enumerate() {
        if *value < 0.0 {
            return Err(TreeError::NegativePercent {
                index,
                value: *value,
            });
        }
    }
    let sum: f64 = percents.iter().sum();
    if (sum - 1.0).abs() > PERCENT_EPSILON {
        return Err(TreeError::PercentSumInvalid { sum });
    }
    Ok(())
}
