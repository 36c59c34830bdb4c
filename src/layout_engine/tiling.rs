use serde::Serialize;

use crate::layout_engine::FrameId;
use crate::layout_engine::geometry::Rect;
use crate::model::ClientId;

/// Placement of one client for a single layout pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TilingStep {
    pub client: ClientId,
    pub geometry: Rect,
    pub visible: bool,
    pub needs_raise: bool,
    pub fullscreen: bool,
    /// Sibling clients to draw as tabs; empty unless the leaf shows a tab strip.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tabs: Vec<ClientId>,
}

impl TilingStep {
    pub fn new(client: ClientId, geometry: Rect) -> Self {
        Self {
            client,
            geometry,
            visible: true,
            needs_raise: false,
            fullscreen: false,
            tabs: Vec::new(),
        }
    }
}

/// Rectangle of a leaf, for frame decorations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FrameStep {
    pub frame: FrameId,
    pub geometry: Rect,
    pub focused: bool,
}

/// Everything the window system binding needs to apply a layout.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TilingResult {
    pub steps: Vec<TilingStep>,
    pub frames: Vec<FrameStep>,
    /// Client that should hold the input focus after this pass.
    pub focus: Option<ClientId>,
}

impl TilingResult {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, step: TilingStep) { self.steps.push(step); }

    /// Appends `other` after the steps already collected, keeping document order.
    pub fn merge(&mut self, other: TilingResult) {
        self.steps.extend(other.steps);
        self.frames.extend(other.frames);
        if other.focus.is_some() {
            self.focus = other.focus;
        }
    }

    pub fn visible_clients(&self) -> impl Iterator<Item = ClientId> + '_ {
        self.steps.iter().filter(|s| s.visible).map(|s| s.client)
    }

    pub fn len(&self) -> usize { self.steps.len() }

    pub fn is_empty(&self) -> bool { self.steps.is_empty() }
}
