pub mod engine;
pub mod fraction;
pub mod frame;
pub mod frame_tree;
pub mod geometry;
pub(crate) mod graph;
pub mod navigation;
pub mod serialize;
pub mod systems;
pub mod tiling;

pub use engine::{CommandError, LayoutCommand, LayoutEngine};
pub use fraction::{FRACTION_UNIT, Fraction, MIN_FRACTION};
pub use frame::{Frame, FrameError, FrameId, FrameKind, Leaf, Side, Split};
pub use frame_tree::{FrameTree, MirrorAxis, SplitMode};
pub use geometry::Rect;
pub use graph::{Direction, NavigationDepth, NavigationScope, Orientation};
pub use navigation::NavigationError;
pub use serialize::LoadError;
pub use systems::{LayoutAlgorithm, TilingAlgorithm};
pub use tiling::{FrameStep, TilingResult, TilingStep};
