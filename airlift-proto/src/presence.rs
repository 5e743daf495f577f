//! Presence snapshot entry pushed to every connected client.

use serde::{Deserialize, Serialize};

/// One user's row in a presence broadcast.
///
/// `online` means the user has at least one live hub connection;
/// `reachable` means the last probe of the user's peer-service port
/// succeeded. The two are independent: a user can be online in a browser
/// tab while their peer service is firewalled off, and a retained offline
/// entry keeps its last-known `reachable` value until the next probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceInfo {
    /// Stable opaque user id.
    pub id: String,
    /// Display name as supplied by the identity resolver.
    pub name: String,
    /// Whether the user currently holds any hub connection.
    pub online: bool,
    /// Last probe result for the user's peer-service port.
    pub reachable: bool,
}
