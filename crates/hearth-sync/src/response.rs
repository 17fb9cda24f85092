//! Wire shapes for the directory service's channel listing.

use serde::Deserialize;

use hearth_types::{Channel, Timestamp};

/// One page of `/user/@me/channels`.
#[derive(Debug, Deserialize)]
pub(crate) struct ChannelsResponse {
    pub status: String,
    /// Number of entries in this page; a page shorter than the server cap
    /// is the last one.
    pub count: u32,
    pub data: Vec<RemoteChannel>,
}

/// A channel as the directory describes it. Every field the server may omit
/// under reduced metadata defaults to absent.
#[derive(Debug, Deserialize)]
pub(crate) struct RemoteChannel {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    pub created: u64,
    #[serde(default)]
    pub created_ns: u32,
    /// Seeds the local flag on first insert only; existing channels keep
    /// whatever the user chose.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub permissions: Vec<u16>,
}

impl From<RemoteChannel> for Channel {
    fn from(remote: RemoteChannel) -> Self {
        Channel {
            id: remote.id,
            title: remote.title,
            description: remote.description,
            avatar: remote.avatar,
            created_at: Timestamp::new(remote.created, remote.created_ns),
            enabled: remote.enabled,
            permissions: remote.permissions,
        }
    }
}
