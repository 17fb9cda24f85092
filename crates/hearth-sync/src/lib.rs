//! Channel-list synchronization against the remote directory service.
//!
//! Networking here is deliberately blocking: the boundary this library sits
//! behind is synchronous, and an internal runtime would buy nothing but
//! cross-language pain. Deadlines are the caller's job.

pub mod error;
mod response;

pub use error::SyncError;

use std::collections::{HashMap, HashSet};

use reqwest::{StatusCode, Url, blocking::Client, header::AUTHORIZATION};
use tracing::{debug, info};

use hearth_db::Database;
use hearth_types::Channel;

use response::ChannelsResponse;

/// The directory caps one listing page at this many channels; longer lists
/// are fetched by advancing `offset` until a short page arrives.
pub const PAGE_SIZE: u32 = 150;

/// Fetch the authoritative channel list for the authenticated user and merge
/// it into the local store.
///
/// The merge is upsert-by-id and all-or-nothing: any network, auth, or parse
/// failure — on any page — leaves the store untouched. On success the merged
/// channels are re-read from the store, so the returned records carry the
/// preserved `created_at` and local `enabled` values rather than the raw
/// response's.
pub fn load_channels(
    db: &Database,
    uid: u64,
    token: &str,
    directory_url: &str,
) -> Result<Vec<Channel>, SyncError> {
    let endpoint = channels_endpoint(directory_url)?;
    let client = Client::builder().build()?;
    let auth = format!("{uid}-{token}");

    let mut fetched: Vec<Channel> = Vec::new();
    loop {
        let page = fetch_page(&client, &endpoint, &auth, fetched.len() as u32)?;
        let count = page.count;
        fetched.extend(page.data.into_iter().map(Channel::from));
        if count != PAGE_SIZE {
            break;
        }
    }

    db.upsert_channels(&fetched)?;

    let mut stored: HashMap<u64, Channel> = db
        .get_channels()?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let mut seen = HashSet::new();
    let merged: Vec<Channel> = fetched
        .iter()
        .filter(|c| seen.insert(c.id))
        .filter_map(|c| stored.remove(&c.id))
        .collect();

    info!("synchronized {} channels from directory", merged.len());
    Ok(merged)
}

fn channels_endpoint(directory_url: &str) -> Result<Url, SyncError> {
    let mut url = Url::parse(directory_url)
        .map_err(|_| SyncError::InvalidUrl(directory_url.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| SyncError::InvalidUrl(directory_url.to_string()))?
        .pop_if_empty()
        .extend(["user", "@me", "channels"]);
    Ok(url)
}

fn fetch_page(
    client: &Client,
    endpoint: &Url,
    auth: &str,
    offset: u32,
) -> Result<ChannelsResponse, SyncError> {
    let mut url = endpoint.clone();
    url.query_pairs_mut()
        .append_pair("sort", "asc")
        .append_pair("order", "activity")
        .append_pair("meta", "true")
        .append_pair("offset", &offset.to_string());

    debug!("requesting channel page at offset {offset}");
    let resp = client.get(url).header(AUTHORIZATION, auth).send()?;

    let status = resp.status();
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(SyncError::Auth(status.as_u16()));
    }
    if !status.is_success() {
        return Err(SyncError::Status(status.as_u16()));
    }

    let body = resp.text()?;
    let page: ChannelsResponse =
        serde_json::from_str(&body).map_err(|e| SyncError::Parse(e.to_string()))?;
    if page.status != "ok" {
        return Err(SyncError::Parse(format!(
            "directory status {:?}",
            page.status
        )));
    }
    Ok(page)
}
