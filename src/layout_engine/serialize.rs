//! Text form of a frame subtree.
//!
//! ```text
//! leaf  := "(" "clients" layout ":" selection client* ")"
//! split := "(" "split" align ":" fraction ":" selection node node ")"
//! ```
//!
//! For example `(split horizontal:0.5:0 (clients max:0 0x1 0x2) (clients vertical:0))`.

use std::fmt::Write as _;

use tracing::{debug, warn};

use crate::layout_engine::frame::{FrameError, FrameId, FrameKind, Leaf, Side};
use crate::layout_engine::frame_tree::FrameTree;
use crate::layout_engine::{Fraction, LayoutAlgorithm, Orientation};
use crate::model::ClientId;

/// Where and why `load` stopped. Changes made before the failure stay applied.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} at offset {offset}, near \"{remainder}\"")]
pub struct LoadError {
    pub offset: usize,
    pub remainder: String,
    pub message: String,
}

impl FrameTree {
    pub fn dump(&self, frame: FrameId) -> String {
        let mut out = String::new();
        self.dump_into(frame, &mut out);
        out
    }

    fn dump_into(&self, id: FrameId, out: &mut String) {
        let Some(frame) = self.frame(id) else { return };
        // Writing into a String does not fail.
        match &frame.kind {
            FrameKind::Leaf(leaf) => {
                let _ = write!(out, "(clients {}:{}", leaf.layout, leaf.selection);
                for client in &leaf.clients {
                    let _ = write!(out, " {client}");
                }
                out.push(')');
            }
            FrameKind::Split(split) => {
                let _ = write!(
                    out,
                    "(split {}:{}:{} ",
                    split.align,
                    split.fraction,
                    split.selection.index()
                );
                self.dump_into(split.children[0], out);
                out.push(' ');
                self.dump_into(split.children[1], out);
                out.push(')');
            }
        }
    }

    /// Applies a description onto the subtree at `target`, reusing frames
    /// where the kinds agree. Clients rejected by `known` are skipped, and
    /// clients of the old subtree that the description leaves out end up
    /// in the focused leaf of the new one. Returns the unparsed remainder.
    pub fn load<'a>(
        &mut self,
        target: FrameId,
        text: &'a str,
        known: &dyn Fn(ClientId) -> bool,
        max_depth: usize,
    ) -> Result<&'a str, LoadError> {
        let mut cursor = Cursor { text, pos: 0 };
        if self.frame(target).is_none() {
            return Err(cursor.error_at(0, "frame does not exist"));
        }
        let slot = self.parent(target).and_then(|parent| {
            let side = self.split_node(parent)?.side_of(target)?;
            Some((parent, side))
        });

        let mut loader = Loader {
            tree: self,
            known,
            max_depth,
            orphans: Vec::new(),
        };
        let result = loader.node(&mut cursor, target);
        let orphans = std::mem::take(&mut loader.orphans);

        let new_target = match slot {
            Some((parent, side)) => self.split_node(parent).map(|s| s.child(side)),
            None => Some(self.root()),
        };
        if let Some(node) = new_target {
            self.adopt_orphans(node, orphans);
        }

        match result {
            Ok(()) => {
                debug!(frame = ?new_target, "loaded layout");
                Ok(cursor.rest().trim_start())
            }
            Err(err) => {
                warn!(%err, "layout description only partially applied");
                Err(err)
            }
        }
    }

    fn adopt_orphans(&mut self, node: FrameId, orphans: Vec<ClientId>) {
        let missing: Vec<_> = orphans.into_iter().filter(|&c| !self.contains(c)).collect();
        if missing.is_empty() {
            return;
        }
        let leaf = self.selected_leaf_under(node);
        if let Some(leaf) = self.leaf_mut(leaf) {
            for client in missing {
                if !leaf.clients.contains(&client) {
                    leaf.clients.push(client);
                }
            }
            leaf.clamp_selection();
        }
    }
}

struct Loader<'t, 'k> {
    tree: &'t mut FrameTree,
    known: &'k dyn Fn(ClientId) -> bool,
    max_depth: usize,
    /// Clients taken off a frame and not yet placed again.
    orphans: Vec<ClientId>,
}

impl Loader<'_, '_> {
    fn node(&mut self, cursor: &mut Cursor<'_>, id: FrameId) -> Result<(), LoadError> {
        cursor.eat('(')?;
        let (start, kind) = cursor.word("\"clients\" or \"split\"")?;
        match kind {
            "clients" => self.leaf(cursor, id),
            "split" => self.split(cursor, id),
            other => Err(cursor.error_at(start, format!("unknown frame type \"{other}\""))),
        }
    }

    fn leaf(&mut self, cursor: &mut Cursor<'_>, id: FrameId) -> Result<(), LoadError> {
        let (start, header) = cursor.word("layout:selection")?;
        let Some((name, selection)) = header.split_once(':') else {
            return Err(cursor.error_at(start, "expected layout:selection"));
        };
        let layout: LayoutAlgorithm = name
            .parse()
            .map_err(|_| cursor.error_at(start, format!("unknown layout \"{name}\"")))?;
        let selection: usize = selection
            .parse()
            .map_err(|_| cursor.error_at(start, format!("invalid selection \"{selection}\"")))?;

        let mut clients = Vec::new();
        loop {
            match cursor.peek() {
                Some(')') => break,
                None => return Err(cursor.error_at(cursor.pos, "expected ')'")),
                Some(_) => {}
            }
            let (start, token) = cursor.word("client id")?;
            let client: ClientId = token
                .parse()
                .map_err(|_| cursor.error_at(start, format!("invalid client id \"{token}\"")))?;
            if (self.known)(client) && !clients.contains(&client) {
                clients.push(client);
            }
        }
        cursor.eat(')')?;

        self.collapse(id);
        for &client in &clients {
            if self.tree.leaf_of(client).is_some_and(|leaf| leaf != id) {
                let _ = self.tree.remove_client(client);
            }
        }
        let leaf = self
            .tree
            .leaf_mut(id)
            .ok_or_else(|| cursor.error_at(start, FrameError::NotALeaf.to_string()))?;
        self.orphans.extend(leaf.clients.iter().copied().filter(|c| !clients.contains(c)));
        self.orphans.retain(|c| !clients.contains(c));
        leaf.clients = clients;
        leaf.selection = selection;
        leaf.layout = layout;
        leaf.clamp_selection();
        Ok(())
    }

    /// Turns a split into an empty-handed leaf, keeping its id. The clients
    /// of the removed subtree become orphans.
    fn collapse(&mut self, id: FrameId) {
        let Some(split) = self.tree.split_node(id) else { return };
        let children = split.children;
        let layout = self
            .tree
            .leaf(self.tree.selected_leaf_under(id))
            .map(|leaf| leaf.layout)
            .unwrap_or_default();
        for child in children {
            self.orphans.extend(self.tree.clients_under(child));
        }
        self.tree.replace_with_leaf(id, Leaf::new(layout));
    }

    fn split(&mut self, cursor: &mut Cursor<'_>, id: FrameId) -> Result<(), LoadError> {
        let (start, header) = cursor.word("align:fraction:selection")?;
        let mut parts = header.split(':');
        let (Some(align), Some(fraction), Some(selection), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(cursor.error_at(start, "expected align:fraction:selection"));
        };
        let align: Orientation = align
            .parse()
            .map_err(|_| cursor.error_at(start, format!("unknown alignment \"{align}\"")))?;
        let fraction: Fraction = fraction
            .parse()
            .map_err(|_| cursor.error_at(start, format!("invalid fraction \"{fraction}\"")))?;
        let selection = selection
            .parse::<usize>()
            .ok()
            .and_then(Side::from_index)
            .ok_or_else(|| cursor.error_at(start, format!("invalid selection \"{selection}\"")))?;

        let reusable = self.tree.split_node(id).is_some_and(|split| {
            split.align == align
                || self.tree.alignment_depth(id, align)
                    + split
                        .children
                        .iter()
                        .map(|&child| self.tree.nested_depth(child, align))
                        .max()
                        .unwrap_or(0)
                    < self.max_depth
        });
        let split_id = if reusable {
            id
        } else {
            // A realigned split whose subtree would exceed the depth limit
            // is rebuilt from scratch.
            self.collapse(id);
            self.tree
                .split(id, align, fraction, true, self.max_depth)
                .map_err(|err| cursor.error_at(start, err.to_string()))?
        };
        let children = {
            let split = self
                .tree
                .split_mut(split_id)
                .ok_or_else(|| cursor.error_at(start, "frame does not exist"))?;
            split.align = align;
            split.fraction = fraction.clamped();
            split.selection = selection;
            split.children
        };

        self.node(cursor, children[0])?;
        self.node(cursor, children[1])?;
        cursor.eat(')')
    }
}

struct Cursor<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn rest(&self) -> &'a str { &self.text[self.pos..] }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_whitespace();
        self.rest().chars().next()
    }

    fn eat(&mut self, expected: char) -> Result<(), LoadError> {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            Ok(())
        } else {
            Err(self.error_at(self.pos, format!("expected '{expected}'")))
        }
    }

    /// A run of characters up to whitespace or a parenthesis.
    fn word(&mut self, what: &str) -> Result<(usize, &'a str), LoadError> {
        self.skip_whitespace();
        let start = self.pos;
        let rest = self.rest();
        let len = rest
            .find(|c: char| c.is_whitespace() || c == '(' || c == ')')
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error_at(start, format!("expected {what}")));
        }
        self.pos += len;
        Ok((start, &rest[..len]))
    }

    fn error_at(&self, offset: usize, message: impl Into<String>) -> LoadError {
        LoadError {
            offset,
            remainder: self.text[offset..].to_string(),
            message: message.into(),
        }
    }
}
