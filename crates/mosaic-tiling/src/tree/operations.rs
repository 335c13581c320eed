//! Mutating operations on the tile tree: split, delete, handle percents.

use mosaic_common::{Direction, NodeId, StyleMap, TreeError};

use super::{validate_percents, ContainerNode, Orientation, SplitOutcome, TileNode, TileTree};

impl TileTree {
    /// Splits the tile `leaf_id` by inserting a two-child container in
    /// its place. Left and Right build a Row, Up and Down a Column; Up
    /// and Left put the new tile first. Both children start at half.
    pub fn split(
        &mut self,
        leaf_id: &NodeId,
        direction: Direction,
        mut new_tile: TileNode,
    ) -> Result<SplitOutcome, TreeError> {
        let parent_id = self.require_tile(leaf_id)?.parent().cloned();

        let new_tile_id = new_tile.id.clone();
        let children = if direction.places_before() {
            vec![new_tile_id.clone(), leaf_id.clone()]
        } else {
            vec![leaf_id.clone(), new_tile_id.clone()]
        };
        let mut container = ContainerNode::new(
            Orientation::from(direction),
            children,
            vec![0.5, 0.5],
            self.refresh_hook(),
        );
        container.parent = parent_id.clone();
        let container_id = container.id.clone();

        // Put the container into the slot the leaf occupied.
        match &parent_id {
            Some(pid) => {
                let parent = self
                    .containers
                    .get_mut(pid)
                    .ok_or_else(|| TreeError::NodeNotFound(pid.clone()))?;
                let slot = parent
                    .children
                    .iter()
                    .position(|child| child == leaf_id)
                    .ok_or_else(|| TreeError::NodeNotFound(leaf_id.clone()))?;
                parent.children[slot] = container_id.clone();
            }
            None => self.root = Some(container_id.clone()),
        }

        if let Some(leaf) = self.tiles.get_mut(leaf_id) {
            leaf.parent = Some(container_id.clone());
        }
        new_tile.parent = Some(container_id.clone());
        self.tiles.insert(new_tile_id.clone(), new_tile);
        self.containers.insert(container_id.clone(), container);

        tracing::debug!(leaf_id = %leaf_id, container_id = %container_id, "split tile");
        Ok(SplitOutcome {
            container: container_id,
            tile: new_tile_id,
        })
    }

    /// Removes the tile `leaf_id`. Sibling percents are renormalized to
    /// sum to 1; a container left with one child collapses so the
    /// survivor takes its slot. Deleting the root tile, or the last
    /// child of the root container, empties the tree.
    pub fn delete(&mut self, leaf_id: &NodeId) -> Result<(), TreeError> {
        let parent_id = self.require_tile(leaf_id)?.parent().cloned();
        self.tiles.remove(leaf_id);

        let container_id = match parent_id {
            Some(id) => id,
            None => {
                self.root = None;
                tracing::debug!(leaf_id = %leaf_id, "deleted root tile");
                return Ok(());
            }
        };

        let (remaining, survivor) = {
            let container = self
                .containers
                .get_mut(&container_id)
                .ok_or_else(|| TreeError::NodeNotFound(container_id.clone()))?;
            if let Some(slot) = container.children.iter().position(|child| child == leaf_id) {
                container.children.remove(slot);
                if slot < container.handle_percents.len() {
                    container.handle_percents.remove(slot);
                }
            }
            if container.children.len() > 1 {
                renormalize(&mut container.handle_percents);
            }
            (container.children.len(), container.children.first().cloned())
        };

        match (remaining, survivor) {
            // Zero children happens only at a root container that held a
            // single child; splits and collapses keep interior containers
            // at two or more.
            (0, None) => {
                self.containers.remove(&container_id);
                self.root = None;
            }
            (1, Some(survivor)) => self.collapse(&container_id, survivor)?,
            _ => {}
        }
        tracing::debug!(leaf_id = %leaf_id, "deleted tile");
        Ok(())
    }

    /// Replaces a collapsed container with its only remaining child.
    fn collapse(&mut self, container_id: &NodeId, survivor: NodeId) -> Result<(), TreeError> {
        let container = self
            .containers
            .remove(container_id)
            .ok_or_else(|| TreeError::NodeNotFound(container_id.clone()))?;
        let grandparent = container.parent.clone();

        if let Some(tile) = self.tiles.get_mut(&survivor) {
            tile.parent = grandparent.clone();
        } else if let Some(child) = self.containers.get_mut(&survivor) {
            child.parent = grandparent.clone();
        }

        match grandparent {
            Some(gp_id) => {
                let gp = self
                    .containers
                    .get_mut(&gp_id)
                    .ok_or_else(|| TreeError::NodeNotFound(gp_id.clone()))?;
                if let Some(slot) = gp.children.iter().position(|child| child == container_id) {
                    gp.children[slot] = survivor;
                }
            }
            None => self.root = Some(survivor),
        }
        Ok(())
    }

    /// Overwrites a container's percent vector. The vector is validated
    /// before anything mutates, so a rejected call leaves the old
    /// percents in place.
    pub fn set_handle_percents(
        &mut self,
        container_id: &NodeId,
        percents: Vec<f64>,
    ) -> Result<(), TreeError> {
        let expected = self.require_container(container_id)?.child_count();
        validate_percents(expected, &percents)?;
        if let Some(container) = self.containers.get_mut(container_id) {
            container.handle_percents = percents;
        }
        Ok(())
    }

    pub fn set_tile_url(&mut self, id: &NodeId, url: impl Into<String>) -> Result<(), TreeError> {
        match self.tiles.get_mut(id) {
            Some(tile) => {
                tile.url = Some(url.into());
                Ok(())
            }
            None if self.containers.contains_key(id) => Err(TreeError::NotATile(id.clone())),
            None => Err(TreeError::NodeNotFound(id.clone())),
        }
    }

    /// Merges style overrides into either node kind.
    pub fn append_style(&mut self, id: &NodeId, patch: &StyleMap) -> Result<(), TreeError> {
        if let Some(tile) = self.tiles.get_mut(id) {
            tile.style.append(patch);
            return Ok(());
        }
        if let Some(container) = self.containers.get_mut(id) {
            container.style.append(patch);
            return Ok(());
        }
        Err(TreeError::NodeNotFound(id.clone()))
    }
}

/// Scales percents back to a sum of 1, or to equal shares when the
/// remainder sums to zero.
fn renormalize(percents: &mut [f64]) {
    let sum: f64 = percents.iter().sum();
    if sum > super::PERCENT_EPSILON {
        for percent in percents.iter_mut() {
            *percent /= sum;
        }
    } else if !percents.is_empty() {
        let equal = 1.0 / percents.len() as f64;
        for percent in percents.iter_mut() {
            *percent = equal;
        }
    }
}
