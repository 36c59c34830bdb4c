use super::{LeafInput, TilingAlgorithm, TilingContext};
use crate::common::config::LayoutSettings;
use crate::layout_engine::geometry::Rect;
use crate::layout_engine::tiling::{TilingResult, TilingStep};
use crate::layout_engine::{Direction, NavigationDepth};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GridLayout;

/// `(rows, cols)` for `count` clients: the smallest `cols` with
/// `cols * cols >= count`, and as many rows as needed to hold them.
pub fn grid_size(count: usize) -> (usize, usize) {
    if count == 0 {
        return (0, 0);
    }
    let mut cols = 0;
    while cols * cols < count {
        cols += 1;
    }
    let rows = count.div_ceil(cols);
    (rows, cols)
}

impl TilingAlgorithm for GridLayout {
    fn arrange(&self, leaf: LeafInput<'_>, cx: TilingContext<'_>) -> TilingResult {
        let mut result = TilingResult::new();
        let count = leaf.clients.len();
        if count == 0 {
            return result;
        }
        let (rows, cols) = grid_size(count);
        let rect = leaf.rect;
        let width = rect.width / cols as i32;
        let height = rect.height / rows as i32;
        let last_row_open = count % cols != 0;

        for (i, &client) in leaf.clients.iter().enumerate() {
            let (r, c) = (i / cols, i % cols);
            let x = rect.x + c as i32 * width;
            let y = rect.y + r as i32 * height;
            let cell_height = if r == rows - 1 { rect.height - r as i32 * height } else { height };
            let cell_width = if cx.settings.gapless_grid && i == count - 1 && last_row_open {
                rect.right() - x
            } else if c == cols - 1 {
                rect.width - c as i32 * width
            } else {
                width
            };
            let mut tiled = TilingStep::new(client, Rect::new(x, y, cell_width, cell_height));
            tiled.fullscreen = cx.registry.flags(client).fullscreen();
            result.add(tiled);
        }
        result
    }

    fn neighbour(
        &self,
        direction: Direction,
        _depth: NavigationDepth,
        index: usize,
        count: usize,
        settings: &LayoutSettings,
    ) -> Option<usize> {
        let (rows, cols) = grid_size(count);
        if cols == 0 || index >= count {
            return None;
        }
        let (r, c) = (index / cols, index % cols);
        let target = match direction {
            Direction::Down => {
                let below = index + cols;
                if settings.gapless_grid && below >= count && rows >= 2 && r == rows - 2 {
                    // the stretched last client sits below us
                    count - 1
                } else {
                    below
                }
            }
            Direction::Up => index.checked_sub(cols)?,
            Direction::Right if c + 1 < cols => index + 1,
            Direction::Left if c > 0 => index - 1,
            Direction::Right | Direction::Left => return None,
        };
        (target < count).then_some(target)
    }
}
