use super::{LeafInput, TilingAlgorithm, TilingContext, offset_index};
use crate::common::config::LayoutSettings;
use crate::layout_engine::geometry::Rect;
use crate::layout_engine::tiling::{TilingResult, TilingStep};
use crate::layout_engine::{Direction, NavigationDepth, Orientation};

/// Clients stacked top to bottom.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VerticalLayout;

/// Clients side by side, left to right.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HorizontalLayout;

impl TilingAlgorithm for VerticalLayout {
    fn arrange(&self, leaf: LeafInput<'_>, cx: TilingContext<'_>) -> TilingResult {
        arrange_linear(leaf, cx, Orientation::Vertical)
    }

    fn neighbour(
        &self,
        direction: Direction,
        _depth: NavigationDepth,
        index: usize,
        count: usize,
        _settings: &LayoutSettings,
    ) -> Option<usize> {
        linear_neighbour(Orientation::Vertical, direction, index, count)
    }
}

impl TilingAlgorithm for HorizontalLayout {
    fn arrange(&self, leaf: LeafInput<'_>, cx: TilingContext<'_>) -> TilingResult {
        arrange_linear(leaf, cx, Orientation::Horizontal)
    }

    fn neighbour(
        &self,
        direction: Direction,
        _depth: NavigationDepth,
        index: usize,
        count: usize,
        _settings: &LayoutSettings,
    ) -> Option<usize> {
        linear_neighbour(Orientation::Horizontal, direction, index, count)
    }
}

/// Equal slices along the stacking axis; the last client takes the whole
/// remainder of `extent % count`.
fn arrange_linear(leaf: LeafInput<'_>, cx: TilingContext<'_>, axis: Orientation) -> TilingResult {
    let mut result = TilingResult::new();
    let count = leaf.clients.len();
    if count == 0 {
        return result;
    }
    let extent = leaf.rect.extent(axis);
    let step = extent / count as i32;
    let remainder = extent % count as i32;
    for (i, &client) in leaf.clients.iter().enumerate() {
        let offset = step * i as i32;
        let len = if i + 1 == count { step + remainder } else { step };
        let geometry = match axis {
            Orientation::Vertical => Rect {
                y: leaf.rect.y + offset,
                height: len,
                ..leaf.rect
            },
            Orientation::Horizontal => Rect {
                x: leaf.rect.x + offset,
                width: len,
                ..leaf.rect
            },
        };
        let mut tiled = TilingStep::new(client, geometry);
        tiled.fullscreen = cx.registry.flags(client).fullscreen();
        result.add(tiled);
    }
    result
}

fn linear_neighbour(
    axis: Orientation,
    direction: Direction,
    index: usize,
    count: usize,
) -> Option<usize> {
    if direction.orientation() != axis {
        return None;
    }
    offset_index(index, direction.step(), count)
}
