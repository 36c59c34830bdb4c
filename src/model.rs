pub mod client;
pub mod tags;

pub use client::{ClientFlags, ClientId, ClientIdParseError, ClientRegistry, ClientTable};
pub use tags::{Tag, TagError, TagSet};
