use std::cell::Cell;

use serde::{Deserialize, Serialize};

use crate::layout_engine::geometry::Rect;
use crate::layout_engine::{Direction, Fraction, LayoutAlgorithm, Orientation};
use crate::model::ClientId;

slotmap::new_key_type! {
    pub struct FrameId;
}

/// Which child of a split.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    #[default]
    First,
    Second,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::First => 0,
            Side::Second => 1,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Side::First),
            1 => Some(Side::Second),
            _ => None,
        }
    }

    /// The side lying in `direction` from the other one.
    pub fn towards(direction: Direction) -> Self {
        if direction.is_forward() { Side::Second } else { Side::First }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaf {
    /// Layout order, not stacking order.
    pub clients: Vec<ClientId>,
    pub selection: usize,
    pub layout: LayoutAlgorithm,
}

impl Leaf {
    pub fn new(layout: LayoutAlgorithm) -> Self {
        Self {
            clients: Vec::new(),
            selection: 0,
            layout,
        }
    }

    pub fn selected(&self) -> Option<ClientId> { self.clients.get(self.selection).copied() }

    pub fn position(&self, client: ClientId) -> Option<usize> {
        self.clients.iter().position(|&c| c == client)
    }

    pub fn is_empty(&self) -> bool { self.clients.is_empty() }

    /// Restores `selection < max(1, len)`.
    pub fn clamp_selection(&mut self) {
        self.selection = self.selection.min(self.clients.len().saturating_sub(1));
    }

    /// Points the selection back at `client` if it is still here, otherwise clamps.
    pub fn reselect(&mut self, client: Option<ClientId>) {
        match client.and_then(|c| self.position(c)) {
            Some(index) => self.selection = index,
            None => self.clamp_selection(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    pub align: Orientation,
    pub fraction: Fraction,
    pub selection: Side,
    pub children: [FrameId; 2],
}

impl Split {
    pub fn child(&self, side: Side) -> FrameId { self.children[side.index()] }

    pub fn selected_child(&self) -> FrameId { self.child(self.selection) }

    pub fn unselected_child(&self) -> FrameId { self.child(self.selection.other()) }

    pub fn side_of(&self, child: FrameId) -> Option<Side> {
        self.children.iter().position(|&c| c == child).and_then(Side::from_index)
    }

    /// Swaps the children while keeping the same child selected and the
    /// same share of space for each child.
    pub fn swap_children(&mut self) {
        self.children.swap(0, 1);
        self.selection = self.selection.other();
        self.fraction = self.fraction.complement();
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameKind {
    Leaf(Leaf),
    Split(Split),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Frame {
    pub parent: Option<FrameId>,
    #[serde(skip)]
    pub last_rect: Cell<Rect>,
    pub kind: FrameKind,
}

impl Frame {
    pub fn new(parent: Option<FrameId>, kind: FrameKind) -> Self {
        Self {
            parent,
            last_rect: Cell::default(),
            kind,
        }
    }

    pub fn as_leaf(&self) -> Option<&Leaf> {
        match &self.kind {
            FrameKind::Leaf(leaf) => Some(leaf),
            FrameKind::Split(_) => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut Leaf> {
        match &mut self.kind {
            FrameKind::Leaf(leaf) => Some(leaf),
            FrameKind::Split(_) => None,
        }
    }

    pub fn as_split(&self) -> Option<&Split> {
        match &self.kind {
            FrameKind::Split(split) => Some(split),
            FrameKind::Leaf(_) => None,
        }
    }

    pub fn as_split_mut(&mut self) -> Option<&mut Split> {
        match &mut self.kind {
            FrameKind::Split(split) => Some(split),
            FrameKind::Leaf(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool { matches!(self.kind, FrameKind::Leaf(_)) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("frame does not exist")]
    UnknownFrame,
    #[error("frame is not a leaf")]
    NotALeaf,
    #[error("the root frame cannot be removed")]
    RemoveRoot,
    #[error("too many {align} splits (limit {limit})")]
    DepthExceeded { align: Orientation, limit: usize },
    #[error("client {0} is already managed")]
    AlreadyManaged(ClientId),
    #[error("client {0} is not managed here")]
    UnknownClient(ClientId),
    #[error("no split to resize towards {0}")]
    NoSplit(Direction),
}
