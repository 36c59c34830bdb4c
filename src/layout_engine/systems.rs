use enum_dispatch::enum_dispatch;
use serde_with::{DeserializeFromStr, SerializeDisplay};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::common::config::LayoutSettings;
use crate::layout_engine::geometry::Rect;
use crate::layout_engine::tiling::TilingResult;
use crate::layout_engine::{Direction, NavigationDepth};
use crate::model::{ClientId, ClientRegistry};

/// What a leaf hands to its algorithm for one layout pass.
#[derive(Clone, Copy)]
pub struct LeafInput<'a> {
    pub clients: &'a [ClientId],
    pub selection: usize,
    pub rect: Rect,
}

#[derive(Clone, Copy)]
pub struct TilingContext<'a> {
    pub settings: &'a LayoutSettings,
    pub registry: &'a dyn ClientRegistry,
}

#[enum_dispatch]
pub trait TilingAlgorithm {
    /// Places every client of the leaf inside `leaf.rect`, in client order.
    fn arrange(&self, leaf: LeafInput<'_>, cx: TilingContext<'_>) -> TilingResult;

    /// Index of the client next to `index` in `direction`, if the leaf
    /// answers queries at `depth`.
    fn neighbour(
        &self,
        direction: Direction,
        depth: NavigationDepth,
        index: usize,
        count: usize,
        settings: &LayoutSettings,
    ) -> Option<usize>;
}

mod grid;
mod linear;
mod max;
pub use grid::{GridLayout, grid_size};
pub use linear::{HorizontalLayout, VerticalLayout};
pub use max::{MaxLayout, visible_chain};

#[enum_dispatch(TilingAlgorithm)]
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    SerializeDisplay,
    DeserializeFromStr,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LayoutAlgorithm {
    Vertical(VerticalLayout),
    Horizontal(HorizontalLayout),
    Max(MaxLayout),
    Grid(GridLayout),
}

impl Default for LayoutAlgorithm {
    fn default() -> Self { LayoutAlgorithm::Vertical(VerticalLayout) }
}

impl LayoutAlgorithm {
    pub fn name(self) -> &'static str { self.into() }

    pub fn is_max(self) -> bool { matches!(self, LayoutAlgorithm::Max(_)) }

    /// The algorithm `delta` steps further in declaration order, wrapping.
    pub fn cycled(self, delta: isize) -> Self {
        let all: Vec<_> = LayoutAlgorithm::iter().collect();
        let pos = all.iter().position(|a| *a == self).unwrap_or(0);
        all[wrap_index(pos, delta, all.len())]
    }

    /// Next entry of `names` after `self`, or the first entry when `self`
    /// is not listed.
    pub fn cycled_within(self, delta: isize, names: &[LayoutAlgorithm]) -> Option<Self> {
        if names.is_empty() {
            return None;
        }
        match names.iter().position(|a| *a == self) {
            Some(pos) => Some(names[wrap_index(pos, delta, names.len())]),
            None => Some(names[0]),
        }
    }
}

/// `(index + delta) mod len` for a non-empty ring.
pub(crate) fn wrap_index(index: usize, delta: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    let len = len as isize;
    let index = index as isize % len;
    ((index + delta.rem_euclid(len)) % len) as usize
}

/// `index + step` if it stays inside `[0, count)`.
pub(crate) fn offset_index(index: usize, step: isize, count: usize) -> Option<usize> {
    let target = index as isize + step;
    (target >= 0 && (target as usize) < count).then_some(target as usize)
}
