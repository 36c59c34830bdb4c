use super::{LeafInput, TilingAlgorithm, TilingContext, offset_index};
use crate::common::config::LayoutSettings;
use crate::layout_engine::tiling::{TilingResult, TilingStep};
use crate::layout_engine::{Direction, NavigationDepth, Orientation};
use crate::model::{ClientId, ClientRegistry};

/// Every client gets the whole frame; only the selected one (plus whatever
/// shows through pseudotiled clients) is visible.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct MaxLayout;

/// Visibility of each client of a max leaf.
///
/// The selected client is always visible. Walking forward from it through
/// the list (wrapping), a client is visible while it and every client
/// between it and the selection are pseudotiled.
pub fn visible_chain(
    clients: &[ClientId],
    selection: usize,
    registry: &dyn ClientRegistry,
) -> Vec<bool> {
    let count = clients.len();
    let mut visible = vec![false; count];
    if count == 0 {
        return visible;
    }
    let selection = selection.min(count - 1);
    visible[selection] = true;
    for offset in 1..count {
        let idx = (selection + offset) % count;
        if !registry.flags(clients[idx]).pseudotile() {
            break;
        }
        visible[idx] = true;
    }
    visible
}

impl TilingAlgorithm for MaxLayout {
    fn arrange(&self, leaf: LeafInput<'_>, cx: TilingContext<'_>) -> TilingResult {
        let mut result = TilingResult::new();
        let visible = visible_chain(leaf.clients, leaf.selection, cx.registry);
        for (i, &client) in leaf.clients.iter().enumerate() {
            let mut tiled = TilingStep::new(client, leaf.rect);
            tiled.visible = visible[i];
            tiled.needs_raise = i == leaf.selection;
            tiled.fullscreen = cx.registry.flags(client).fullscreen();
            if cx.settings.tabbed_max {
                tiled.tabs = leaf.clients.to_vec();
            }
            result.add(tiled);
        }
        result
    }

    fn neighbour(
        &self,
        direction: Direction,
        depth: NavigationDepth,
        index: usize,
        count: usize,
        settings: &LayoutSettings,
    ) -> Option<usize> {
        if settings.tabbed_max {
            // Tab order only, at any depth.
            (direction.orientation() == Orientation::Horizontal)
                .then(|| offset_index(index, direction.step(), count))
                .flatten()
        } else if depth == NavigationDepth::All {
            offset_index(index, direction.step(), count)
        } else {
            None
        }
    }
}
