use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::common::collections::HashMap;

/// Opaque handle of a managed window. The window system owns the client;
/// frames only store the handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:#x}", self.0) }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid window id \"{0}\"")]
pub struct ClientIdParseError(pub String);

/// `0x` prefixed hex, or plain decimal.
impl FromStr for ClientId {
    type Err = ClientIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse::<u64>(),
        };
        parsed.map(ClientId).map_err(|_| ClientIdParseError(s.to_string()))
    }
}

bitflags! {
    /// The only client state the tiling engine looks at.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ClientFlags: u8 {
        /// Keeps its own size inside the tile, so clients below it show through.
        const PSEUDOTILE = 1 << 0;
        const FULLSCREEN = 1 << 1;
    }
}

impl ClientFlags {
    pub fn pseudotile(self) -> bool { self.contains(ClientFlags::PSEUDOTILE) }

    pub fn fullscreen(self) -> bool { self.contains(ClientFlags::FULLSCREEN) }
}

/// Read-only view on the client registry owned by the window system binding.
pub trait ClientRegistry {
    fn flags(&self, client: ClientId) -> ClientFlags;

    fn contains(&self, client: ClientId) -> bool;
}

/// Plain in-memory registry used by the command layer and the CLI driver.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct ClientTable {
    clients: HashMap<ClientId, ClientFlags>,
}

impl ClientTable {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, client: ClientId, flags: ClientFlags) -> bool {
        self.clients.insert(client, flags).is_none()
    }

    pub fn remove(&mut self, client: ClientId) -> bool { self.clients.remove(&client).is_some() }

    pub fn set_flags(&mut self, client: ClientId, flags: ClientFlags) {
        if let Some(existing) = self.clients.get_mut(&client) {
            *existing = flags;
        }
    }

    pub fn len(&self) -> usize { self.clients.len() }

    pub fn is_empty(&self) -> bool { self.clients.is_empty() }
}

impl ClientRegistry for ClientTable {
    fn flags(&self, client: ClientId) -> ClientFlags {
        self.clients.get(&client).copied().unwrap_or_default()
    }

    fn contains(&self, client: ClientId) -> bool { self.clients.contains_key(&client) }
}
