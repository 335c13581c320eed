//! Pure layout pass: divides a viewport among the tree's tiles.

use mosaic_common::{NodeId, Rect, TreeError};

use crate::tree::{validate_percents, Orientation, TileTree};

/// Computes the rectangle of every tile for the given viewport.
/// Containers divide their rectangle among children by handle percents;
/// tiles take their rectangle whole. Placements come back in
/// depth-first child order. An empty tree yields no placements.
pub fn compute(tree: &TileTree, viewport: Rect) -> Result<Vec<(NodeId, Rect)>, TreeError> {
    let mut placements = Vec::with_capacity(tree.tile_count());
    if let Some(root) = tree.root() {
        place_node(tree, root, viewport, &mut placements)?;
    }
    Ok(placements)
}

fn place_node(
    tree: &TileTree,
    id: &NodeId,
    rect: Rect,
    out: &mut Vec<(NodeId, Rect)>,
) -> Result<(), TreeError> {
    if tree.tile(id).is_some() {
        out.push((id.clone(), rect));
        return Ok(());
    }
    let container = tree
        .container(id)
        .ok_or_else(|| TreeError::NodeNotFound(id.clone()))?;
    validate_percents(container.child_count(), container.handle_percents())?;
    let slices = split_rect(rect, container.orientation(), container.handle_percents());
    for (child, slice) in container.children().iter().zip(slices) {
        place_node(tree, child, slice, out)?;
    }
    Ok(())
}

/// Divides `rect` along `orientation` into one slice per percent.
/// Inner edges are rounded cumulative sums, so neighbors share each
/// edge exactly and the last slice absorbs the rounding remainder.
pub fn split_rect(rect: Rect, orientation: Orientation, percents: &[f64]) -> Vec<Rect> {
    let count = percents.len();
    if count == 0 {
        return Vec::new();
    }

    let total = match orientation {
        Orientation::Row => rect.width,
        Orientation::Column => rect.height,
    };
    if total <= 0 {
        let collapsed = match orientation {
            Orientation::Row => Rect::new(rect.x, rect.y, 0, rect.height),
            Orientation::Column => Rect::new(rect.x, rect.y, rect.width, 0),
        };
        return vec![collapsed; count];
    }

    let mut edges = Vec::with_capacity(count + 1);
    edges.push(0);
    let mut acc = 0.0;
    for (i, percent) in percents.iter().enumerate() {
        acc += percent;
        let edge = if i == count - 1 {
            total
        } else {
            (total as f64 * acc).round() as i32
        };
        let prev = edges[i];
        edges.push(edge.clamp(prev, total));
    }

    let mut slices = Vec::with_capacity(count);
    for i in 0..count {
        let (start, end) = (edges[i], edges[i + 1]);
        let slice = match orientation {
            Orientation::Row => Rect::new(rect.x + start, rect.y, end - start, rect.height),
            Orientation::Column => Rect::new(rect.x, rect.y + start, rect.width, end - start),
        };
        slices.push(slice);
    }
    slices
}
