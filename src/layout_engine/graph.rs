use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Alignment of a split. Horizontal places the children side by side
/// (the width is divided), vertical stacks them (the height is divided).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn orientation(self) -> Orientation {
        match self {
            Direction::Left | Direction::Right => Orientation::Horizontal,
            Direction::Up | Direction::Down => Orientation::Vertical,
        }
    }

    /// Right and down point towards the second child of a split.
    pub fn is_forward(self) -> bool { matches!(self, Direction::Right | Direction::Down) }

    /// Step along a one-dimensional ordering: -1 for left/up, +1 for right/down.
    pub fn step(self) -> isize { if self.is_forward() { 1 } else { -1 } }
}

/// Granularity a leaf answers a directional query at. Tabs is the finest
/// (only a tab strip is walked), All the coarsest (every client of the
/// leaf is reachable in every direction).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationDepth {
    Tabs,
    All,
}

/// Where a directional command may look for its target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationScope {
    /// Ask the focused leaf first, then search the tree.
    #[default]
    Auto,
    /// Stay inside the focused leaf (`-i`).
    InternalOnly,
    /// Skip the focused leaf and search the tree only (`-e`).
    ExternalOnly,
}

impl NavigationScope {
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "-i" | "--internal" => Some(NavigationScope::InternalOnly),
            "-e" | "--external" => Some(NavigationScope::ExternalOnly),
            _ => None,
        }
    }

    /// Depth the leaf is queried at, or `None` when the leaf is skipped.
    pub fn internal_depth(self) -> Option<NavigationDepth> {
        match self {
            NavigationScope::Auto => Some(NavigationDepth::Tabs),
            NavigationScope::InternalOnly => Some(NavigationDepth::All),
            NavigationScope::ExternalOnly => None,
        }
    }

    pub fn may_leave_leaf(self) -> bool { !matches!(self, NavigationScope::InternalOnly) }
}
