use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::config::is_valid_tag_name;
use crate::layout_engine::{FrameError, FrameTree, LayoutAlgorithm};
use crate::model::ClientId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TagError {
    #[error("no tag named \"{0}\"")]
    UnknownTag(String),
    #[error("tag \"{0}\" already exists")]
    DuplicateTag(String),
    #[error("invalid tag name \"{0}\"")]
    InvalidName(String),
    #[error("at least one tag is required")]
    NoTags,
    #[error("cannot merge tag \"{0}\" into itself")]
    SameTag(String),
    #[error("client {0} is already managed")]
    AlreadyManaged(ClientId),
    #[error("client {0} is not managed")]
    UnknownClient(ClientId),
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// A named workspace. Every tag owns its own frame tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub tree: FrameTree,
}

/// The ordered set of tags; exactly one of them is focused. A client is
/// managed by at most one tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSet {
    tags: Vec<Tag>,
    focused: usize,
}

impl TagSet {
    pub fn new<S: AsRef<str>>(names: &[S], layout: LayoutAlgorithm) -> Result<Self, TagError> {
        let mut set = TagSet { tags: Vec::new(), focused: 0 };
        for name in names {
            set.add(name.as_ref(), layout)?;
        }
        if set.tags.is_empty() {
            return Err(TagError::NoTags);
        }
        Ok(set)
    }

    pub fn len(&self) -> usize { self.tags.len() }

    pub fn is_empty(&self) -> bool { self.tags.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> { self.tags.iter() }

    pub fn names(&self) -> impl Iterator<Item = &str> { self.tags.iter().map(|t| t.name.as_str()) }

    fn index_of(&self, name: &str) -> Result<usize, TagError> {
        self.tags
            .iter()
            .position(|t| t.name == name)
            .ok_or_else(|| TagError::UnknownTag(name.to_string()))
    }

    pub fn by_name(&self, name: &str) -> Option<&Tag> { self.tags.iter().find(|t| t.name == name) }

    pub fn focused(&self) -> &Tag { &self.tags[self.focused] }

    pub fn focused_mut(&mut self) -> &mut Tag { &mut self.tags[self.focused] }

    /// The named tag, or the focused one for `None`.
    pub fn get(&self, name: Option<&str>) -> Result<&Tag, TagError> {
        match name {
            Some(name) => Ok(&self.tags[self.index_of(name)?]),
            None => Ok(self.focused()),
        }
    }

    pub fn get_mut(&mut self, name: Option<&str>) -> Result<&mut Tag, TagError> {
        let index = match name {
            Some(name) => self.index_of(name)?,
            None => self.focused,
        };
        Ok(&mut self.tags[index])
    }

    pub fn add(&mut self, name: &str, layout: LayoutAlgorithm) -> Result<usize, TagError> {
        if !is_valid_tag_name(name) {
            return Err(TagError::InvalidName(name.to_string()));
        }
        if self.by_name(name).is_some() {
            return Err(TagError::DuplicateTag(name.to_string()));
        }
        self.tags.push(Tag {
            name: name.to_string(),
            tree: FrameTree::new(layout),
        });
        debug!(tag = name, "added tag");
        Ok(self.tags.len() - 1)
    }

    pub fn focus(&mut self, name: &str) -> Result<(), TagError> {
        self.focused = self.index_of(name)?;
        Ok(())
    }

    /// Removes tag `name`, moving all of its clients into the focused leaf
    /// of `target`.
    pub fn remove(&mut self, name: &str, target: &str) -> Result<(), TagError> {
        let index = self.index_of(name)?;
        let target_index = self.index_of(target)?;
        if index == target_index {
            return Err(TagError::SameTag(name.to_string()));
        }
        let removed = self.tags.remove(index);
        let target_index = if target_index > index { target_index - 1 } else { target_index };
        if self.focused == index {
            self.focused = target_index;
        } else if self.focused > index {
            self.focused -= 1;
        }

        let tree = &mut self.tags[target_index].tree;
        for client in removed.tree.clients() {
            let leaf = tree.focused_leaf();
            tree.insert_client(client, leaf)?;
        }
        debug!(tag = name, into = target, "merged tag");
        Ok(())
    }

    pub fn tag_of(&self, client: ClientId) -> Option<&str> {
        self.tags.iter().find(|t| t.tree.contains(client)).map(|t| t.name.as_str())
    }

    /// Puts `client` into the focused leaf of `tag` (the focused tag for `None`).
    pub fn manage(&mut self, client: ClientId, tag: Option<&str>) -> Result<(), TagError> {
        if self.tag_of(client).is_some() {
            return Err(TagError::AlreadyManaged(client));
        }
        let tree = &mut self.get_mut(tag)?.tree;
        let leaf = tree.focused_leaf();
        tree.insert_client(client, leaf)?;
        Ok(())
    }

    /// Returns the name of the tag the client was removed from.
    pub fn unmanage(&mut self, client: ClientId) -> Result<String, TagError> {
        let tag = self
            .tags
            .iter_mut()
            .find(|t| t.tree.contains(client))
            .ok_or(TagError::UnknownClient(client))?;
        tag.tree.remove_client(client)?;
        Ok(tag.name.clone())
    }

    /// Moves `client` into the focused leaf of `tag`. Nothing changes if the
    /// destination does not exist.
    pub fn move_client(&mut self, client: ClientId, tag: &str) -> Result<(), TagError> {
        let destination = self.index_of(tag)?;
        let source = self
            .tags
            .iter()
            .position(|t| t.tree.contains(client))
            .ok_or(TagError::UnknownClient(client))?;
        if source == destination {
            return Ok(());
        }
        self.tags[source].tree.remove_client(client)?;
        let tree = &mut self.tags[destination].tree;
        let leaf = tree.focused_leaf();
        tree.insert_client(client, leaf)?;
        debug!(%client, from = %self.tags[source].name, to = tag, "moved client");
        Ok(())
    }
}
