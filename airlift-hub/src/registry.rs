//! Presence registry: who is connected, from where, and whether their
//! peer service answered the last reachability probe.
//!
//! One entry per user id, each holding the set of live connection handles
//! for that user. Entries outlive their connections: detaching the last
//! handle marks the user offline but keeps the stored address and
//! reachability flag, so a returning user picks up where they left off and
//! the poller keeps a last-known view for everyone it has ever seen.

use std::collections::HashMap;
use std::net::IpAddr;

use airlift_proto::presence::PresenceInfo;
use axum::extract::ws::Message;
use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

/// Identifies one WebSocket connection within a user's handle set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(Uuid);

impl HandleId {
    /// Issues a fresh handle id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for HandleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for HandleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-user presence record.
struct UserEntry {
    /// Display name from the most recent attach.
    display_name: String,
    /// Live connections, each with the sender half of its writer channel.
    handles: HashMap<HandleId, mpsc::UnboundedSender<Message>>,
    /// Remote address of the most recent attach.
    address: Option<IpAddr>,
    /// Result of the most recent reachability probe.
    reachable: bool,
}

/// Connected-user registry shared by the socket handlers, the router, the
/// poller, and the presence broadcaster.
///
/// All state sits behind a single `RwLock`; every operation takes the lock
/// once and finishes under it, so any snapshot observes a consistent point
/// in time.
pub struct PresenceRegistry {
    users: RwLock<HashMap<String, UserEntry>>,
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PresenceRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Adds a connection handle for a user, creating the entry on first
    /// sight.
    ///
    /// The stored display name and address are refreshed to the values of
    /// this attach. A brand-new entry starts unreachable until the poller
    /// has probed it.
    pub async fn attach(
        &self,
        user_id: &str,
        display_name: &str,
        handle_id: HandleId,
        sender: mpsc::UnboundedSender<Message>,
        address: IpAddr,
    ) {
        let mut users = self.users.write().await;
        let entry = users
            .entry(user_id.to_string())
            .or_insert_with(|| UserEntry {
                display_name: display_name.to_string(),
                handles: HashMap::new(),
                address: None,
                reachable: false,
            });
        entry.display_name = display_name.to_string();
        entry.address = Some(address);
        entry.handles.insert(handle_id, sender);
    }

    /// Removes one connection handle from a user's entry.
    ///
    /// The entry itself is retained even when its last handle goes away;
    /// the user merely turns offline. Unknown users and handles are a no-op.
    pub async fn detach(&self, user_id: &str, handle_id: HandleId) {
        let mut users = self.users.write().await;
        if let Some(entry) = users.get_mut(user_id) {
            entry.handles.remove(&handle_id);
        }
    }

    /// Returns a consistent point-in-time presence view of every known
    /// user, online or not. Order is unspecified.
    pub async fn snapshot(&self) -> Vec<PresenceInfo> {
        let users = self.users.read().await;
        users
            .iter()
            .map(|(id, entry)| PresenceInfo {
                id: id.clone(),
                name: entry.display_name.clone(),
                online: !entry.handles.is_empty(),
                reachable: entry.reachable,
            })
            .collect()
    }

    /// Returns clones of the user's live senders; empty for unknown or
    /// offline users.
    pub async fn handles_for(&self, user_id: &str) -> Vec<mpsc::UnboundedSender<Message>> {
        let users = self.users.read().await;
        users
            .get(user_id)
            .map(|entry| entry.handles.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns every live sender across all users, for broadcast fan-out.
    pub async fn all_handles(&self) -> Vec<mpsc::UnboundedSender<Message>> {
        let users = self.users.read().await;
        users
            .values()
            .flat_map(|entry| entry.handles.values().cloned())
            .collect()
    }

    /// Returns `(user id, address)` for every online user with a known
    /// address — the poller's worklist for one sweep.
    ///
    /// The lock is released before this returns, so probing never blocks
    /// registry traffic.
    pub async fn probe_targets(&self) -> Vec<(String, IpAddr)> {
        let users = self.users.read().await;
        users
            .iter()
            .filter(|(_, entry)| !entry.handles.is_empty())
            .filter_map(|(id, entry)| entry.address.map(|addr| (id.clone(), addr)))
            .collect()
    }

    /// Stores a probe result, reporting whether the flag actually changed.
    ///
    /// Unknown users are a no-op and report `false`.
    pub async fn set_reachability(&self, user_id: &str, reachable: bool) -> bool {
        let mut users = self.users.write().await;
        match users.get_mut(user_id) {
            Some(entry) => {
                let changed = entry.reachable != reachable;
                entry.reachable = reachable;
                changed
            }
            None => false,
        }
    }

    /// Administrative reset: closes every live connection and forgets every
    /// entry as one atomic action.
    ///
    /// A Close frame is pushed down each handle under the same write lock
    /// that clears the map, so no attach can interleave between the two.
    pub async fn reset(&self) {
        let mut users = self.users.write().await;
        for (user_id, entry) in users.iter() {
            for sender in entry.handles.values() {
                tracing::info!(user_id = %user_id, "closing connection for reset");
                let _ = sender.send(Message::Close(None));
            }
        }
        users.clear();
    }
}
