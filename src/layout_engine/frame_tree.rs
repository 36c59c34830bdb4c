use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use strum::{Display, EnumString};
use tracing::{debug, trace};

use crate::common::config::LayoutSettings;
use crate::layout_engine::frame::{Frame, FrameError, FrameId, FrameKind, Leaf, Side, Split};
use crate::layout_engine::geometry::Rect;
use crate::layout_engine::systems::{LeafInput, TilingAlgorithm, TilingContext, wrap_index};
use crate::layout_engine::tiling::{FrameStep, TilingResult};
use crate::layout_engine::{Direction, Fraction, LayoutAlgorithm, Orientation};
use crate::model::{ClientId, ClientRegistry};

/// Named ways of splitting a leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum SplitMode {
    /// New empty frame above the content.
    Top,
    /// New empty frame below the content.
    Bottom,
    /// New empty frame left of the content.
    Left,
    /// New empty frame right of the content.
    Right,
    Vertical,
    Horizontal,
    /// Split along the longer side of the frame.
    Auto,
    /// Like `Auto`, and half of the clients move into the new frame.
    Explode,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MirrorAxis {
    Horizontal,
    Vertical,
    #[default]
    Both,
}

impl MirrorAxis {
    fn matches(self, align: Orientation) -> bool {
        match self {
            MirrorAxis::Horizontal => align == Orientation::Horizontal,
            MirrorAxis::Vertical => align == Orientation::Vertical,
            MirrorAxis::Both => true,
        }
    }
}

/// The frame layout of one tag: a binary tree of splits whose leaves hold
/// clients. The focused leaf is reached from the root by following the
/// selection of every split.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FrameTree {
    frames: SlotMap<FrameId, Frame>,
    root: FrameId,
}

impl Default for FrameTree {
    fn default() -> Self { Self::new(LayoutAlgorithm::default()) }
}

impl FrameTree {
    pub fn new(layout: LayoutAlgorithm) -> Self {
        let mut frames = SlotMap::with_key();
        let root = frames.insert(Frame::new(None, FrameKind::Leaf(Leaf::new(layout))));
        Self { frames, root }
    }

    pub fn root(&self) -> FrameId { self.root }

    pub fn frame(&self, id: FrameId) -> Option<&Frame> { self.frames.get(id) }

    pub fn frame_count(&self) -> usize { self.frames.len() }

    pub fn leaf(&self, id: FrameId) -> Option<&Leaf> { self.frames.get(id)?.as_leaf() }

    pub(crate) fn leaf_mut(&mut self, id: FrameId) -> Option<&mut Leaf> {
        self.frames.get_mut(id)?.as_leaf_mut()
    }

    pub fn split_node(&self, id: FrameId) -> Option<&Split> { self.frames.get(id)?.as_split() }

    pub(crate) fn split_mut(&mut self, id: FrameId) -> Option<&mut Split> {
        self.frames.get_mut(id)?.as_split_mut()
    }

    pub fn parent(&self, id: FrameId) -> Option<FrameId> { self.frames.get(id)?.parent }

    pub fn last_rect(&self, id: FrameId) -> Option<Rect> { Some(self.frames.get(id)?.last_rect.get()) }

    pub(crate) fn checked_leaf(&self, id: FrameId) -> Result<&Leaf, FrameError> {
        self.frames.get(id).ok_or(FrameError::UnknownFrame)?.as_leaf().ok_or(FrameError::NotALeaf)
    }

    pub(crate) fn checked_leaf_mut(&mut self, id: FrameId) -> Result<&mut Leaf, FrameError> {
        self.frames
            .get_mut(id)
            .ok_or(FrameError::UnknownFrame)?
            .as_leaf_mut()
            .ok_or(FrameError::NotALeaf)
    }

    /// The leaf reached from `id` by following split selections.
    pub fn selected_leaf_under(&self, mut id: FrameId) -> FrameId {
        while let Some(split) = self.split_node(id) {
            id = split.selected_child();
        }
        id
    }

    pub fn focused_leaf(&self) -> FrameId { self.selected_leaf_under(self.root) }

    pub fn focused_client(&self) -> Option<ClientId> { self.leaf(self.focused_leaf())?.selected() }

    pub fn is_focused_leaf(&self, id: FrameId) -> bool { self.focused_leaf() == id }

    pub fn first_leaf(&self, mut id: FrameId) -> FrameId {
        while let Some(split) = self.split_node(id) {
            id = split.children[0];
        }
        id
    }

    pub fn last_leaf(&self, mut id: FrameId) -> FrameId {
        while let Some(split) = self.split_node(id) {
            id = split.children[1];
        }
        id
    }

    /// Every frame of the subtree at `id`, parents before children, first
    /// child before second.
    pub fn subtree(&self, id: FrameId) -> Vec<FrameId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            if !self.frames.contains_key(node) {
                continue;
            }
            out.push(node);
            if let Some(split) = self.split_node(node) {
                stack.push(split.children[1]);
                stack.push(split.children[0]);
            }
        }
        out
    }

    pub fn leaves(&self) -> Vec<FrameId> { self.leaves_under(self.root) }

    pub fn leaves_under(&self, id: FrameId) -> Vec<FrameId> {
        self.subtree(id).into_iter().filter(|&f| self.frames[f].is_leaf()).collect()
    }

    /// All clients in document order.
    pub fn clients(&self) -> Vec<ClientId> { self.clients_under(self.root) }

    pub fn clients_under(&self, id: FrameId) -> Vec<ClientId> {
        self.leaves_under(id)
            .into_iter()
            .filter_map(|leaf| self.leaf(leaf))
            .flat_map(|leaf| leaf.clients.iter().copied())
            .collect()
    }

    pub fn leaf_of(&self, client: ClientId) -> Option<FrameId> {
        self.leaves().into_iter().find(|&leaf| {
            self.leaf(leaf).is_some_and(|l| l.clients.contains(&client))
        })
    }

    pub fn contains(&self, client: ClientId) -> bool { self.leaf_of(client).is_some() }

    /// Number of splits with alignment `align` above `id`.
    pub fn alignment_depth(&self, id: FrameId, align: Orientation) -> usize {
        let mut depth = 0;
        let mut node = self.parent(id);
        while let Some(parent) = node {
            if self.split_node(parent).is_some_and(|s| s.align == align) {
                depth += 1;
            }
            node = self.parent(parent);
        }
        depth
    }

    /// Largest number of splits with alignment `align` on a path from `id`
    /// (included) down to a leaf.
    pub fn nested_depth(&self, id: FrameId, align: Orientation) -> usize {
        match self.split_node(id) {
            Some(split) => {
                let own = usize::from(split.align == align);
                let below = split.children.iter().map(|&c| self.nested_depth(c, align)).max().unwrap_or(0);
                own + below
            }
            None => 0,
        }
    }

    /// Points `parent`'s link (or the root) at `new` instead of `old`.
    fn replace_child(&mut self, parent: Option<FrameId>, old: FrameId, new: FrameId) {
        match parent {
            None => self.root = new,
            Some(parent) => {
                if let Some(split) = self.split_mut(parent) {
                    for child in split.children.iter_mut() {
                        if *child == old {
                            *child = new;
                        }
                    }
                }
            }
        }
    }

    fn destroy(&mut self, id: FrameId) {
        for frame in self.subtree(id) {
            self.frames.remove(frame);
        }
    }

    /// Drops everything below `id` and turns it into `leaf`.
    pub(crate) fn replace_with_leaf(&mut self, id: FrameId, leaf: Leaf) {
        if let Some(split) = self.split_node(id) {
            let children = split.children;
            for child in children {
                self.destroy(child);
            }
        }
        if let Some(frame) = self.frames.get_mut(id) {
            frame.kind = FrameKind::Leaf(leaf);
        }
    }

    /// Replaces `leaf` by a split of `leaf` and a new empty leaf with the
    /// same layout. `leaf` keeps its identity and content. Returns the split.
    pub fn split(
        &mut self,
        leaf: FrameId,
        align: Orientation,
        fraction: Fraction,
        frame_to_first: bool,
        max_depth: usize,
    ) -> Result<FrameId, FrameError> {
        let layout = self.checked_leaf(leaf)?.layout;
        let limit = max_depth;
        if self.alignment_depth(leaf, align) + 1 > limit {
            return Err(FrameError::DepthExceeded { align, limit });
        }

        let parent = self.frames[leaf].parent;
        let rect = self.frames[leaf].last_rect.get();
        let fresh = self.frames.insert(Frame::new(None, FrameKind::Leaf(Leaf::new(layout))));
        let (children, selection) = if frame_to_first {
            ([leaf, fresh], Side::First)
        } else {
            ([fresh, leaf], Side::Second)
        };
        let split = self.frames.insert(Frame::new(
            parent,
            FrameKind::Split(Split {
                align,
                fraction: fraction.clamped(),
                selection,
                children,
            }),
        ));
        self.frames[split].last_rect.set(rect);
        self.frames[leaf].parent = Some(split);
        self.frames[fresh].parent = Some(split);
        self.replace_child(parent, leaf, split);

        debug!(?leaf, ?split, %align, %fraction, frame_to_first, "split frame");
        Ok(split)
    }

    pub fn split_mode(
        &mut self,
        leaf: FrameId,
        mode: SplitMode,
        fraction: Fraction,
        max_depth: usize,
    ) -> Result<FrameId, FrameError> {
        let rect = self.frames.get(leaf).ok_or(FrameError::UnknownFrame)?.last_rect.get();
        let along_long_side = if rect.is_wide() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        let (align, frame_to_first) = match mode {
            SplitMode::Top => (Orientation::Vertical, false),
            SplitMode::Bottom | SplitMode::Vertical => (Orientation::Vertical, true),
            SplitMode::Left => (Orientation::Horizontal, false),
            SplitMode::Right | SplitMode::Horizontal => (Orientation::Horizontal, true),
            SplitMode::Auto | SplitMode::Explode => (along_long_side, true),
        };
        let split = self.split(leaf, align, fraction, frame_to_first, max_depth)?;
        if mode == SplitMode::Explode {
            self.explode(split);
        }
        Ok(split)
    }

    /// Moves the second half of the first child's clients into the second child.
    fn explode(&mut self, split: FrameId) {
        let Some(&Split { children: [content, fresh], .. }) = self.split_node(split) else {
            return;
        };
        let Some(leaf) = self.leaf_mut(content) else { return };
        let count = leaf.clients.len();
        if count < 2 {
            return;
        }
        let keep = count.div_ceil(2);
        let selected = leaf.selection;
        let moved = leaf.clients.split_off(keep);
        leaf.selection = selected.min(keep - 1);
        if let Some(other) = self.leaf_mut(fresh) {
            other.clients = moved;
            other.selection = selected.saturating_sub(keep);
            other.clamp_selection();
        }
        if selected >= keep {
            if let Some(s) = self.split_mut(split) {
                s.selection = Side::Second;
            }
        }
    }

    /// Removes `frame`, merging its clients into its sibling, which takes
    /// the parent's place. Returns the sibling.
    pub fn remove(&mut self, frame: FrameId) -> Result<FrameId, FrameError> {
        let parent = self
            .frames
            .get(frame)
            .ok_or(FrameError::UnknownFrame)?
            .parent
            .ok_or(FrameError::RemoveRoot)?;
        let Some(split) = self.split_node(parent) else {
            return Err(FrameError::UnknownFrame);
        };
        let side = split.side_of(frame).ok_or(FrameError::UnknownFrame)?;
        let sibling = split.child(side.other());

        let moved = self.clients_under(frame);
        let target = match side {
            Side::First => self.first_leaf(sibling),
            Side::Second => self.last_leaf(sibling),
        };
        if let Some(leaf) = self.leaf_mut(target) {
            let selected = leaf.selected();
            match side {
                Side::First => {
                    leaf.clients.splice(0..0, moved);
                }
                Side::Second => leaf.clients.extend(moved),
            }
            leaf.reselect(selected);
        }

        let grandparent = self.frames[parent].parent;
        self.frames[sibling].parent = grandparent;
        self.replace_child(grandparent, parent, sibling);
        self.destroy(frame);
        self.frames.remove(parent);

        debug!(?frame, ?sibling, "removed frame");
        Ok(sibling)
    }

    /// Inserts `client` right after the selection of `leaf`. The selection
    /// follows the new client when `leaf` is focused.
    pub fn insert_client(&mut self, client: ClientId, leaf: FrameId) -> Result<(), FrameError> {
        if self.contains(client) {
            return Err(FrameError::AlreadyManaged(client));
        }
        let focused = self.is_focused_leaf(leaf);
        let target = self.checked_leaf_mut(leaf)?;
        let index = if target.clients.is_empty() { 0 } else { target.selection + 1 };
        target.clients.insert(index, client);
        if focused {
            target.selection = index;
        }
        trace!(%client, ?leaf, index, "inserted client");
        Ok(())
    }

    /// Returns the leaf the client was removed from.
    pub fn remove_client(&mut self, client: ClientId) -> Result<FrameId, FrameError> {
        let id = self.leaf_of(client).ok_or(FrameError::UnknownClient(client))?;
        let leaf = self.checked_leaf_mut(id)?;
        if let Some(index) = leaf.position(client) {
            leaf.clients.remove(index);
            if index < leaf.selection {
                leaf.selection -= 1;
            }
            leaf.clamp_selection();
        }
        trace!(%client, leaf = ?id, "removed client");
        Ok(id)
    }

    /// Resolves a path of child selectors starting at the root.
    ///
    /// `0`/`1` pick a child, `/` the unselected child, `@` the focused leaf
    /// below the current frame, anything else the selected child. Walking
    /// stops at a leaf.
    pub fn lookup(&self, path: &str) -> FrameId {
        let mut node = self.root;
        for ch in path.chars() {
            let Some(split) = self.split_node(node) else { break };
            node = match ch {
                '0' => split.children[0],
                '1' => split.children[1],
                '/' => split.unselected_child(),
                '@' => self.selected_leaf_under(node),
                _ => split.selected_child(),
            };
        }
        node
    }

    /// Marks every split between the root and `id` as selecting towards `id`.
    pub fn focus_frame(&mut self, id: FrameId) {
        let mut child = id;
        while let Some(parent) = self.parent(child) {
            if let Some(split) = self.split_mut(parent) {
                if let Some(side) = split.side_of(child) {
                    split.selection = side;
                }
            }
            child = parent;
        }
    }

    pub fn focus_client(&mut self, client: ClientId) -> Result<(), FrameError> {
        let id = self.leaf_of(client).ok_or(FrameError::UnknownClient(client))?;
        self.focus_frame(id);
        let leaf = self.checked_leaf_mut(id)?;
        leaf.reselect(Some(client));
        Ok(())
    }

    /// Rotates the subtree at `frame` by 90 degrees counter-clockwise.
    pub fn rotate(&mut self, frame: FrameId) {
        for id in self.subtree(frame) {
            if let Some(split) = self.split_mut(id) {
                match split.align {
                    Orientation::Horizontal => {
                        split.align = Orientation::Vertical;
                        split.swap_children();
                    }
                    Orientation::Vertical => split.align = Orientation::Horizontal,
                }
            }
        }
        debug!(?frame, "rotated");
    }

    pub fn mirror(&mut self, frame: FrameId, axis: MirrorAxis) {
        for id in self.subtree(frame) {
            if let Some(split) = self.split_mut(id) {
                if axis.matches(split.align) {
                    split.swap_children();
                }
            }
        }
        debug!(?frame, %axis, "mirrored");
    }

    /// Moves the border of the focused leaf in `direction` by `delta`.
    /// Returns the new fraction of the split that moved.
    pub fn resize(&mut self, direction: Direction, delta: Fraction) -> Result<Fraction, FrameError> {
        let align = direction.orientation();
        let wanted = Side::towards(direction).other();
        let mut chosen = None;
        let mut fallback = None;
        let mut child = self.focused_leaf();
        while let Some(parent) = self.parent(child) {
            if let Some(split) = self.split_node(parent).filter(|s| s.align == align) {
                if split.side_of(child) == Some(wanted) {
                    chosen = Some(parent);
                    break;
                }
                fallback.get_or_insert(parent);
            }
            child = parent;
        }
        let target = chosen.or(fallback).ok_or(FrameError::NoSplit(direction))?;
        let step = if direction.is_forward() {
            delta
        } else {
            Fraction::from_units(-delta.units())
        };
        let split = self.split_mut(target).ok_or(FrameError::UnknownFrame)?;
        split.fraction = split.fraction.adjusted(step);
        debug!(split = ?target, fraction = %split.fraction, "resized");
        Ok(split.fraction)
    }

    pub fn set_layout(&mut self, leaf: FrameId, layout: LayoutAlgorithm) -> Result<(), FrameError> {
        self.checked_leaf_mut(leaf)?.layout = layout;
        Ok(())
    }

    /// Switches the focused leaf to the next layout in `names`, or in the
    /// full list of algorithms when `names` is empty.
    pub fn cycle_layout(
        &mut self,
        delta: isize,
        names: &[LayoutAlgorithm],
    ) -> Result<LayoutAlgorithm, FrameError> {
        let id = self.focused_leaf();
        let leaf = self.checked_leaf_mut(id)?;
        let next = if names.is_empty() {
            leaf.layout.cycled(delta)
        } else {
            leaf.layout.cycled_within(delta, names).unwrap_or(leaf.layout)
        };
        leaf.layout = next;
        Ok(next)
    }

    /// Rotates the selection of the focused leaf.
    pub fn cycle(&mut self, delta: isize) {
        let id = self.focused_leaf();
        if let Some(leaf) = self.leaf_mut(id) {
            if !leaf.clients.is_empty() {
                leaf.selection = wrap_index(leaf.selection, delta, leaf.clients.len());
            }
        }
    }

    /// Lays out the whole tree inside `rect`, caching each frame's rectangle.
    pub fn compute_layout(
        &self,
        rect: Rect,
        settings: &LayoutSettings,
        registry: &dyn ClientRegistry,
    ) -> TilingResult {
        let mut result = TilingResult::new();
        let focused = self.focused_leaf();
        let cx = TilingContext { settings, registry };
        self.layout_frame(self.root, rect, focused, cx, &mut result);
        result.focus = self.focused_client();
        trace!(%rect, steps = result.len(), "computed layout");
        result
    }

    fn layout_frame(
        &self,
        id: FrameId,
        rect: Rect,
        focused: FrameId,
        cx: TilingContext<'_>,
        result: &mut TilingResult,
    ) {
        let frame = &self.frames[id];
        frame.last_rect.set(rect);
        match &frame.kind {
            FrameKind::Split(split) => {
                let first_len = split.fraction.of(rect.extent(split.align));
                let (first, second) = rect.split_at(split.align, first_len);
                self.layout_frame(split.children[0], first, focused, cx, result);
                self.layout_frame(split.children[1], second, focused, cx, result);
            }
            FrameKind::Leaf(leaf) => {
                let input = LeafInput {
                    clients: &leaf.clients,
                    selection: leaf.selection,
                    rect,
                };
                result.merge(leaf.layout.arrange(input, cx));
                result.frames.push(FrameStep {
                    frame: id,
                    geometry: rect,
                    focused: id == focused,
                });
            }
        }
    }

    /// ASCII rendering of the tree; `*` marks selected children and the
    /// selected client of each leaf is bracketed.
    pub fn draw_tree(&self) -> String {
        let tree = self.ascii_tree(self.root, "");
        let mut out = String::new();
        // Writing into a String does not fail.
        let _ = ascii_tree::write_tree(&mut out, &tree);
        out
    }

    fn ascii_tree(&self, id: FrameId, marker: &str) -> ascii_tree::Tree {
        match &self.frames[id].kind {
            FrameKind::Split(split) => {
                let desc = format!("{marker}{} {}", split.align, split.fraction);
                let children = [Side::First, Side::Second]
                    .into_iter()
                    .map(|side| {
                        let mark = if side == split.selection { "* " } else { "" };
                        self.ascii_tree(split.child(side), mark)
                    })
                    .collect();
                ascii_tree::Tree::Node(desc, children)
            }
            FrameKind::Leaf(leaf) => {
                let clients: Vec<String> = leaf
                    .clients
                    .iter()
                    .enumerate()
                    .map(|(i, c)| if i == leaf.selection { format!("[{c}]") } else { c.to_string() })
                    .collect();
                let body = if clients.is_empty() { "(empty)".to_string() } else { clients.join(" ") };
                ascii_tree::Tree::Leaf(vec![format!("{marker}{}: {body}", leaf.layout)])
            }
        }
    }

    /// Panics if a structural invariant does not hold. Used by tests.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert!(self.frames.contains_key(self.root));
        assert_eq!(self.frames[self.root].parent, None);
        let reachable = self.subtree(self.root);
        assert_eq!(reachable.len(), self.frames.len(), "unreachable frames in the arena");
        let mut seen = std::collections::HashSet::new();
        for id in reachable {
            match &self.frames[id].kind {
                FrameKind::Split(split) => {
                    for child in split.children {
                        assert_eq!(self.frames[child].parent, Some(id));
                    }
                }
                FrameKind::Leaf(leaf) => {
                    assert!(leaf.selection < leaf.clients.len().max(1));
                    for client in &leaf.clients {
                        assert!(seen.insert(*client), "{client} appears twice");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;
    use crate::layout_engine::systems::{GridLayout, HorizontalLayout, MaxLayout};
    use crate::model::ClientTable;

    const DEPTH: usize = 4;

    fn ids(range: std::ops::RangeInclusive<u64>) -> Vec<ClientId> { range.map(ClientId).collect() }

    fn tree_with(clients: &[u64], layout: LayoutAlgorithm) -> FrameTree {
        let mut tree = FrameTree::new(layout);
        let root = tree.root();
        for &c in clients {
            tree.insert_client(ClientId(c), root).unwrap();
        }
        tree
    }

    fn max() -> LayoutAlgorithm { LayoutAlgorithm::Max(MaxLayout) }

    #[test]
    fn new_tree_is_one_empty_leaf() {
        let tree = FrameTree::default();
        assert_eq!(tree.frame_count(), 1);
        assert_eq!(tree.focused_leaf(), tree.root());
        assert_eq!(tree.focused_client(), None);
        assert!(tree.leaf(tree.root()).unwrap().is_empty());
        tree.assert_consistent();
    }

    #[test]
    fn insert_goes_after_selection_and_is_selected_when_focused() {
        let mut tree = tree_with(&[1, 2], LayoutAlgorithm::default());
        let root = tree.root();
        assert_eq!(tree.focused_client(), Some(ClientId(2)));
        tree.cycle(-1);
        tree.insert_client(ClientId(3), root).unwrap();
        assert_eq!(tree.clients(), vec![ClientId(1), ClientId(3), ClientId(2)]);
        assert_eq!(tree.focused_client(), Some(ClientId(3)));
        assert_eq!(tree.insert_client(ClientId(2), root), Err(FrameError::AlreadyManaged(ClientId(2))));
    }

    #[test]
    fn insert_into_unfocused_leaf_keeps_its_selection() {
        let mut tree = tree_with(&[1], LayoutAlgorithm::default());
        let root = tree.root();
        let split = tree.split(root, Orientation::Vertical, Fraction::HALF, true, DEPTH).unwrap();
        let other = tree.split_node(split).unwrap().children[1];
        tree.insert_client(ClientId(2), other).unwrap();
        tree.insert_client(ClientId(3), other).unwrap();
        assert_eq!(tree.leaf(other).unwrap().selected(), Some(ClientId(2)));
        assert_eq!(tree.focused_client(), Some(ClientId(1)));
    }

    #[test]
    fn remove_client_keeps_selection_on_the_same_client() {
        let mut tree = tree_with(&[1, 2, 3], LayoutAlgorithm::default());
        assert_eq!(tree.focused_client(), Some(ClientId(3)));
        tree.remove_client(ClientId(1)).unwrap();
        assert_eq!(tree.focused_client(), Some(ClientId(3)));
        tree.remove_client(ClientId(3)).unwrap();
        assert_eq!(tree.focused_client(), Some(ClientId(2)));
        tree.remove_client(ClientId(2)).unwrap();
        assert_eq!(tree.focused_client(), None);
        assert_eq!(tree.remove_client(ClientId(2)), Err(FrameError::UnknownClient(ClientId(2))));
        tree.assert_consistent();
    }

    #[test]
    fn split_keeps_the_leaf_and_its_content() {
        let mut tree = tree_with(&[1, 2], max());
        let leaf = tree.root();
        tree.cycle(1);
        let split = tree.split(leaf, Orientation::Vertical, Fraction::HALF, true, DEPTH).unwrap();
        assert_eq!(tree.root(), split);
        let s = tree.split_node(split).unwrap().clone();
        assert_eq!(s.align, Orientation::Vertical);
        assert_eq!(s.fraction, Fraction::HALF);
        assert_eq!(s.selection, Side::First);
        assert_eq!(s.children[0], leaf);

        let content = tree.leaf(leaf).unwrap();
        assert_eq!(content.clients, ids(1..=2));
        assert_eq!(content.selection, 0);
        assert_eq!(content.layout, max());
        let fresh = tree.leaf(s.children[1]).unwrap();
        assert!(fresh.is_empty());
        assert_eq!(fresh.layout, max());
        assert_eq!(tree.focused_leaf(), leaf);
        tree.assert_consistent();
    }

    #[test]
    fn split_with_content_second() {
        let mut tree = tree_with(&[1], LayoutAlgorithm::default());
        let leaf = tree.root();
        let split = tree
            .split(leaf, Orientation::Horizontal, Fraction::from_units(9_900), false, DEPTH)
            .unwrap();
        let s = tree.split_node(split).unwrap();
        assert_eq!(s.children[1], leaf);
        assert_eq!(s.selection, Side::Second);
        assert_eq!(s.fraction, Fraction::from_units(9_000));
        assert_eq!(tree.focused_leaf(), leaf);
    }

    #[test]
    fn split_depth_is_limited_per_alignment() {
        let mut tree = FrameTree::default();
        for _ in 0..DEPTH {
            let leaf = tree.focused_leaf();
            tree.split(leaf, Orientation::Vertical, Fraction::HALF, true, DEPTH).unwrap();
        }
        let leaf = tree.focused_leaf();
        let frames = tree.frame_count();
        assert_eq!(
            tree.split(leaf, Orientation::Vertical, Fraction::HALF, true, DEPTH),
            Err(FrameError::DepthExceeded { align: Orientation::Vertical, limit: DEPTH })
        );
        assert_eq!(tree.frame_count(), frames);
        tree.split(leaf, Orientation::Horizontal, Fraction::HALF, true, DEPTH).unwrap();
        tree.assert_consistent();
    }

    #[test]
    fn split_rejects_non_leaves() {
        let mut tree = FrameTree::default();
        let root = tree.root();
        let split = tree.split(root, Orientation::Vertical, Fraction::HALF, true, DEPTH).unwrap();
        assert_eq!(
            tree.split(split, Orientation::Vertical, Fraction::HALF, true, DEPTH),
            Err(FrameError::NotALeaf)
        );
    }

    #[test]
    fn remove_restores_the_concatenated_client_list() {
        let mut tree = tree_with(&[1, 2], LayoutAlgorithm::default());
        let leaf = tree.root();
        let split = tree.split(leaf, Orientation::Horizontal, Fraction::HALF, true, DEPTH).unwrap();
        let other = tree.split_node(split).unwrap().children[1];
        tree.insert_client(ClientId(3), other).unwrap();
        tree.insert_client(ClientId(4), other).unwrap();
        let before = tree.clients();

        let survivor = tree.remove(other).unwrap();
        assert_eq!(survivor, leaf);
        assert_eq!(tree.root(), leaf);
        assert_eq!(tree.clients(), before);
        assert_eq!(tree.focused_client(), Some(ClientId(2)));
        assert_eq!(tree.frame_count(), 1);
        tree.assert_consistent();
    }

    #[test]
    fn removing_a_first_child_prepends_its_clients() {
        let mut tree = tree_with(&[1, 2], LayoutAlgorithm::default());
        let leaf = tree.root();
        let split = tree.split(leaf, Orientation::Vertical, Fraction::HALF, true, DEPTH).unwrap();
        let other = tree.split_node(split).unwrap().children[1];
        tree.insert_client(ClientId(3), other).unwrap();

        let survivor = tree.remove(leaf).unwrap();
        assert_eq!(survivor, other);
        assert_eq!(tree.clients(), ids(1..=3));
        // the merged leaf keeps its own selected client
        assert_eq!(tree.focused_client(), Some(ClientId(3)));
        tree.assert_consistent();
    }

    #[test]
    fn remove_merges_a_whole_subtree_into_the_sibling() {
        let mut tree = tree_with(&[1], LayoutAlgorithm::default());
        let a = tree.root();
        let top = tree.split(a, Orientation::Horizontal, Fraction::HALF, true, DEPTH).unwrap();
        let b = tree.split_node(top).unwrap().children[1];
        tree.insert_client(ClientId(2), b).unwrap();
        let inner = tree.split(b, Orientation::Vertical, Fraction::HALF, true, DEPTH).unwrap();
        let c = tree.split_node(inner).unwrap().children[1];
        tree.insert_client(ClientId(3), c).unwrap();

        tree.remove(inner).unwrap();
        assert_eq!(tree.root(), a);
        assert_eq!(tree.clients(), ids(1..=3));
        assert_eq!(tree.frame_count(), 1);
        tree.assert_consistent();
    }

    #[test]
    fn root_cannot_be_removed() {
        let mut tree = FrameTree::default();
        assert_eq!(tree.remove(tree.root()), Err(FrameError::RemoveRoot));
    }

    #[test]
    fn lookup_paths() {
        let mut tree = FrameTree::default();
        let a = tree.root();
        let top = tree.split(a, Orientation::Horizontal, Fraction::HALF, true, DEPTH).unwrap();
        let b = tree.split_node(top).unwrap().children[1];
        let inner = tree.split(b, Orientation::Vertical, Fraction::HALF, false, DEPTH).unwrap();
        let c = tree.split_node(inner).unwrap().children[0];

        assert_eq!(tree.lookup(""), top);
        assert_eq!(tree.lookup("0"), a);
        assert_eq!(tree.lookup("1"), inner);
        assert_eq!(tree.lookup("10"), c);
        assert_eq!(tree.lookup("11"), b);
        assert_eq!(tree.lookup("."), a);
        assert_eq!(tree.lookup("/"), inner);
        assert_eq!(tree.lookup("/."), b);
        assert_eq!(tree.lookup("x"), a);
        assert_eq!(tree.lookup("0111"), a);
        assert_eq!(tree.lookup("@"), a);

        tree.focus_frame(c);
        assert_eq!(tree.lookup("@"), c);
        assert_eq!(tree.lookup("1@"), c);
    }

    #[test]
    fn layout_divides_space_without_losing_pixels() {
        let mut tree = tree_with(&[1, 2], LayoutAlgorithm::default());
        let a = tree.root();
        let top = tree.split(a, Orientation::Horizontal, Fraction::HALF, true, DEPTH).unwrap();
        let b = tree.split_node(top).unwrap().children[1];
        tree.insert_client(ClientId(3), b).unwrap();

        let settings = LayoutSettings::default();
        let registry = ClientTable::new();
        let rect = Rect::new(0, 0, 101, 60);
        let result = tree.compute_layout(rect, &settings, &registry);

        assert_eq!(result.frames.len(), 2);
        assert_eq!(result.frames[0].geometry, Rect::new(0, 0, 50, 60));
        assert_eq!(result.frames[1].geometry, Rect::new(50, 0, 51, 60));
        assert!(result.frames[0].focused);
        assert_eq!(tree.last_rect(b), Some(Rect::new(50, 0, 51, 60)));
        assert_eq!(tree.last_rect(top), Some(rect));

        let clients: Vec<_> = result.steps.iter().map(|s| s.client).collect();
        assert_eq!(clients, ids(1..=3));
        let area: i64 = result.steps.iter().map(|s| s.geometry.area()).sum();
        assert_eq!(area, rect.area());
        assert_eq!(result.focus, Some(ClientId(2)));
    }

    #[test]
    fn auto_split_follows_the_last_rect() {
        let settings = LayoutSettings::default();
        let registry = ClientTable::new();
        let mut tree = FrameTree::default();
        tree.compute_layout(Rect::new(0, 0, 1920, 1080), &settings, &registry);
        let leaf = tree.root();
        let split = tree.split_mode(leaf, SplitMode::Auto, Fraction::HALF, DEPTH).unwrap();
        assert_eq!(tree.split_node(split).unwrap().align, Orientation::Horizontal);

        tree.compute_layout(Rect::new(0, 0, 1920, 1080), &settings, &registry);
        let split = tree.split_mode(leaf, SplitMode::Auto, Fraction::HALF, DEPTH).unwrap();
        // the leaf is now 960x1080
        assert_eq!(tree.split_node(split).unwrap().align, Orientation::Vertical);
    }

    #[test]
    fn named_split_modes() {
        for (mode, align, content_first) in [
            (SplitMode::Top, Orientation::Vertical, false),
            (SplitMode::Bottom, Orientation::Vertical, true),
            (SplitMode::Left, Orientation::Horizontal, false),
            (SplitMode::Right, Orientation::Horizontal, true),
            (SplitMode::Horizontal, Orientation::Horizontal, true),
            (SplitMode::Vertical, Orientation::Vertical, true),
        ] {
            let mut tree = FrameTree::default();
            let leaf = tree.root();
            let split = tree.split_mode(leaf, mode, Fraction::HALF, DEPTH).unwrap();
            let s = tree.split_node(split).unwrap();
            assert_eq!(s.align, align, "{mode}");
            assert_eq!(s.children[0] == leaf, content_first, "{mode}");
        }
        assert_eq!("explode".parse::<SplitMode>(), Ok(SplitMode::Explode));
        assert!("diagonal".parse::<SplitMode>().is_err());
    }

    #[test]
    fn explode_divides_the_clients() {
        let mut tree = tree_with(&[1, 2, 3, 4, 5], LayoutAlgorithm::default());
        let leaf = tree.root();
        tree.cycle(-1); // select 0x4
        let split = tree.split_mode(leaf, SplitMode::Explode, Fraction::HALF, DEPTH).unwrap();
        let s = tree.split_node(split).unwrap().clone();
        assert_eq!(tree.leaf(s.children[0]).unwrap().clients, ids(1..=3));
        assert_eq!(tree.leaf(s.children[1]).unwrap().clients, ids(4..=5));
        assert_eq!(s.selection, Side::Second);
        assert_eq!(tree.focused_client(), Some(ClientId(4)));
        tree.assert_consistent();

        let mut single = tree_with(&[1], LayoutAlgorithm::default());
        let leaf = single.root();
        let split = single.split_mode(leaf, SplitMode::Explode, Fraction::HALF, DEPTH).unwrap();
        let s = single.split_node(split).unwrap();
        assert_eq!(single.leaf(s.children[0]).unwrap().clients, ids(1..=1));
        assert!(single.leaf(s.children[1]).unwrap().is_empty());
    }

    #[test]
    fn rotate_turns_counter_clockwise() {
        let mut tree = FrameTree::default();
        let a = tree.root();
        let top = tree.split(a, Orientation::Horizontal, Fraction::from_units(3_000), true, DEPTH).unwrap();
        let b = tree.split_node(top).unwrap().children[1];

        tree.rotate(top);
        let s = tree.split_node(top).unwrap().clone();
        assert_eq!(s.align, Orientation::Vertical);
        assert_eq!(s.children, [b, a]);
        assert_eq!(s.selection, Side::Second);
        assert_eq!(s.fraction, Fraction::from_units(7_000));
        assert_eq!(tree.focused_leaf(), a);

        tree.rotate(top);
        let s = tree.split_node(top).unwrap();
        assert_eq!(s.align, Orientation::Horizontal);
        assert_eq!(s.children, [b, a]);
    }

    #[test]
    fn mirror_only_touches_matching_splits() {
        let mut tree = FrameTree::default();
        let a = tree.root();
        let top = tree.split(a, Orientation::Horizontal, Fraction::from_units(4_000), true, DEPTH).unwrap();
        let b = tree.split_node(top).unwrap().children[1];
        let inner = tree.split(b, Orientation::Vertical, Fraction::HALF, true, DEPTH).unwrap();
        let inner_children = tree.split_node(inner).unwrap().children;

        tree.mirror(top, MirrorAxis::Horizontal);
        let s = tree.split_node(top).unwrap();
        assert_eq!(s.children, [inner, a]);
        assert_eq!(s.fraction, Fraction::from_units(6_000));
        assert_eq!(tree.split_node(inner).unwrap().children, inner_children);
        assert_eq!(tree.focused_leaf(), a);

        tree.mirror(top, MirrorAxis::Both);
        let [x, y] = inner_children;
        assert_eq!(tree.split_node(inner).unwrap().children, [y, x]);
        assert_eq!(tree.split_node(top).unwrap().children, [a, inner]);
    }

    #[test]
    fn resize_moves_the_nearest_matching_border() {
        let mut tree = FrameTree::default();
        let a = tree.root();
        let top = tree.split(a, Orientation::Horizontal, Fraction::HALF, true, DEPTH).unwrap();
        let step = Fraction::from_units(200);

        assert_eq!(tree.resize(Direction::Right, step), Ok(Fraction::from_units(5_200)));
        assert_eq!(tree.resize(Direction::Left, step), Ok(Fraction::HALF));
        assert_eq!(tree.resize(Direction::Down, step), Err(FrameError::NoSplit(Direction::Down)));

        // from the right child, moving left uses the same split
        let b = tree.split_node(top).unwrap().children[1];
        tree.focus_frame(b);
        assert_eq!(tree.resize(Direction::Left, step), Ok(Fraction::from_units(4_800)));
        // and a huge delta is clamped
        assert_eq!(tree.resize(Direction::Left, Fraction::from_units(9_000)), Ok(Fraction::from_units(1_000)));
    }

    #[test]
    fn layouts_cycle_on_the_focused_leaf() {
        let mut tree = FrameTree::default();
        let grid = LayoutAlgorithm::Grid(GridLayout);
        assert_eq!(tree.cycle_layout(1, &[]), Ok(LayoutAlgorithm::Horizontal(HorizontalLayout)));
        assert_eq!(tree.cycle_layout(1, &[max(), grid]), Ok(max()));
        assert_eq!(tree.cycle_layout(1, &[max(), grid]), Ok(grid));
        tree.set_layout(tree.root(), LayoutAlgorithm::default()).unwrap();
        assert_eq!(tree.leaf(tree.root()).unwrap().layout, LayoutAlgorithm::default());
    }

    #[test]
    fn cycle_wraps_within_the_leaf() {
        let mut tree = tree_with(&[1, 2, 3], LayoutAlgorithm::default());
        tree.cycle(1);
        assert_eq!(tree.focused_client(), Some(ClientId(1)));
        tree.cycle(-2);
        assert_eq!(tree.focused_client(), Some(ClientId(2)));

        let mut empty = FrameTree::default();
        empty.cycle(1);
        assert_eq!(empty.focused_client(), None);
    }

    #[test]
    fn focus_client_updates_the_path() {
        let mut tree = tree_with(&[1, 2], LayoutAlgorithm::default());
        let a = tree.root();
        let top = tree.split(a, Orientation::Vertical, Fraction::HALF, true, DEPTH).unwrap();
        let b = tree.split_node(top).unwrap().children[1];
        tree.insert_client(ClientId(3), b).unwrap();
        tree.insert_client(ClientId(4), b).unwrap();

        tree.focus_client(ClientId(3)).unwrap();
        assert_eq!(tree.focused_leaf(), b);
        assert_eq!(tree.focused_client(), Some(ClientId(3)));
        tree.focus_client(ClientId(1)).unwrap();
        assert_eq!(tree.focused_client(), Some(ClientId(1)));
        assert_eq!(tree.focus_client(ClientId(9)), Err(FrameError::UnknownClient(ClientId(9))));
    }

    #[test]
    fn draws_the_tree() {
        let mut tree = tree_with(&[1, 2], LayoutAlgorithm::default());
        let a = tree.root();
        tree.split(a, Orientation::Horizontal, Fraction::HALF, true, DEPTH).unwrap();
        let drawing = tree.draw_tree();
        assert!(drawing.contains("horizontal 0.5"), "{drawing}");
        assert!(drawing.contains("* vertical: 0x1 [0x2]"), "{drawing}");
        assert!(drawing.contains("vertical: (empty)"), "{drawing}");
    }
}
