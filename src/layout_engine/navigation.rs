use tracing::{debug, trace};

use crate::common::config::LayoutSettings;
use crate::layout_engine::frame::{FrameError, FrameId, Side};
use crate::layout_engine::frame_tree::FrameTree;
use crate::layout_engine::systems::{TilingAlgorithm, visible_chain};
use crate::layout_engine::{Direction, NavigationScope};
use crate::model::{ClientId, ClientRegistry};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("no neighbour found towards {0}")]
    NoNeighbour(Direction),
    #[error("no client to move")]
    NoClient,
    #[error(transparent)]
    Frame(#[from] FrameError),
}

impl FrameTree {
    /// The closest split above `from` whose other child lies in `direction`.
    pub fn neighbour_split(&self, from: FrameId, direction: Direction) -> Option<FrameId> {
        let align = direction.orientation();
        let behind = Side::towards(direction).other();
        let mut child = from;
        while let Some(parent) = self.parent(child) {
            let split = self.split_node(parent)?;
            if split.align == align && split.side_of(child) == Some(behind) {
                return Some(parent);
            }
            child = parent;
        }
        None
    }

    /// Index of the client next to the selection inside the focused leaf.
    fn internal_neighbour(
        &self,
        direction: Direction,
        scope: NavigationScope,
        settings: &LayoutSettings,
    ) -> Option<usize> {
        let depth = scope.internal_depth()?;
        let leaf = self.leaf(self.focused_leaf())?;
        if leaf.is_empty() {
            return None;
        }
        leaf.layout.neighbour(direction, depth, leaf.selection, leaf.clients.len(), settings)
    }

    fn flip_selection(&mut self, split: FrameId) {
        if let Some(split) = self.split_mut(split) {
            split.selection = split.selection.other();
        }
    }

    /// Moves the input focus in `direction`, first inside the focused leaf
    /// and then, unless `scope` forbids it, to the adjacent leaf.
    pub fn focus(
        &mut self,
        direction: Direction,
        scope: NavigationScope,
        settings: &LayoutSettings,
    ) -> Result<(), NavigationError> {
        let focused = self.focused_leaf();
        if let Some(index) = self.internal_neighbour(direction, scope, settings) {
            self.checked_leaf_mut(focused)?.selection = index;
            trace!(%direction, index, "focus inside leaf");
            return Ok(());
        }
        if !scope.may_leave_leaf() {
            return Err(NavigationError::NoNeighbour(direction));
        }
        let split = self
            .neighbour_split(focused, direction)
            .ok_or(NavigationError::NoNeighbour(direction))?;
        self.flip_selection(split);
        debug!(%direction, leaf = ?self.focused_leaf(), "focus moved to leaf");
        Ok(())
    }

    /// Moves the focused client in `direction`: swaps it with its neighbour
    /// inside the leaf, or carries it into the adjacent leaf.
    pub fn shift(
        &mut self,
        direction: Direction,
        scope: NavigationScope,
        settings: &LayoutSettings,
    ) -> Result<(), NavigationError> {
        let source = self.focused_leaf();
        let client = self.checked_leaf(source)?.selected().ok_or(NavigationError::NoClient)?;

        if let Some(index) = self.internal_neighbour(direction, scope, settings) {
            let leaf = self.checked_leaf_mut(source)?;
            leaf.clients.swap(leaf.selection, index);
            leaf.selection = index;
            trace!(%client, %direction, index, "shift inside leaf");
            return Ok(());
        }
        if !scope.may_leave_leaf() {
            return Err(NavigationError::NoNeighbour(direction));
        }
        let split = self
            .neighbour_split(source, direction)
            .ok_or(NavigationError::NoNeighbour(direction))?;

        let leaf = self.checked_leaf_mut(source)?;
        leaf.clients.retain(|&c| c != client);
        leaf.clamp_selection();
        self.flip_selection(split);

        let target = self.focused_leaf();
        let leaf = self.checked_leaf_mut(target)?;
        let index = if leaf.clients.is_empty() { 0 } else { leaf.selection + 1 };
        leaf.clients.insert(index, client);
        leaf.selection = index;
        debug!(%client, %direction, ?target, "shifted client to leaf");
        Ok(())
    }

    /// The next leaf in document order (`delta > 0`) or the previous one,
    /// wrapping around at the root.
    pub fn adjacent_leaf(&self, from: FrameId, delta: isize) -> FrameId {
        let forward = delta > 0;
        let boundary = if forward { Side::First } else { Side::Second };
        let mut child = from;
        while let Some(parent) = self.parent(child) {
            let Some(split) = self.split_node(parent) else { break };
            if split.side_of(child) == Some(boundary) {
                let other = split.child(boundary.other());
                return if forward { self.first_leaf(other) } else { self.last_leaf(other) };
            }
            child = parent;
        }
        if forward { self.first_leaf(self.root()) } else { self.last_leaf(self.root()) }
    }

    /// Client indices of `leaf` that `cycle_all` may stop at.
    fn cycle_stops(
        &self,
        leaf: FrameId,
        skip_invisible: bool,
        registry: &dyn ClientRegistry,
    ) -> Vec<usize> {
        let Some(leaf) = self.leaf(leaf) else { return Vec::new() };
        if skip_invisible && leaf.layout.is_max() {
            visible_chain(&leaf.clients, leaf.selection, registry)
                .into_iter()
                .enumerate()
                .filter_map(|(i, visible)| visible.then_some(i))
                .collect()
        } else {
            (0..leaf.clients.len()).collect()
        }
    }

    /// Steps through all clients of the tree as one ring.
    pub fn cycle_all(
        &mut self,
        delta: isize,
        skip_invisible: bool,
        registry: &dyn ClientRegistry,
    ) -> Result<Option<ClientId>, NavigationError> {
        if self.clients().is_empty() {
            return Err(NavigationError::NoClient);
        }
        let forward = match delta.signum() {
            0 => return Ok(self.focused_client()),
            sign => sign > 0,
        };

        let focused = self.focused_leaf();
        let current = self.checked_leaf(focused)?.selection;
        let stops = self.cycle_stops(focused, skip_invisible, registry);
        let within = if forward {
            stops.iter().copied().find(|&s| s > current)
        } else {
            stops.iter().copied().rev().find(|&s| s < current)
        };
        if let Some(index) = within {
            self.checked_leaf_mut(focused)?.selection = index;
            return Ok(self.focused_client());
        }

        let mut node = focused;
        // Every leaf is visited at most once before coming back around.
        for _ in 0..=self.frame_count() {
            node = self.adjacent_leaf(node, delta);
            let stops = self.cycle_stops(node, skip_invisible, registry);
            let stop = if forward { stops.first() } else { stops.last() };
            if let Some(&index) = stop {
                self.focus_frame(node);
                self.checked_leaf_mut(node)?.selection = index;
                trace!(leaf = ?node, index, "cycle_all crossed leaves");
                return Ok(self.focused_client());
            }
        }
        Ok(self.focused_client())
    }

    /// Focuses the leaf `delta` steps away in document order, empty leaves
    /// included. Only split selections change.
    pub fn cycle_frame(&mut self, delta: isize) -> FrameId {
        let mut node = self.focused_leaf();
        let step = delta.signum();
        let ring = self.leaves().len().max(1);
        for _ in 0..delta.unsigned_abs() % ring {
            node = self.adjacent_leaf(node, step);
        }
        self.focus_frame(node);
        node
    }
}
