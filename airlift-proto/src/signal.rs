//! Signaling wire protocol for the Airlift hub.
//!
//! Messages travel as JSON over WebSocket text frames so that browser peers
//! can speak the protocol with no extra tooling. Every frame is a tagged
//! object whose `type` field selects the variant; all field names are
//! camelCase on the wire.
//!
//! The hub relays transfer traffic without interpreting it: chunk payloads
//! are opaque strings, and a [`TransferId`] is issued once per offer and
//! then merely echoed between the two peers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlates one offer/accept/chunk handshake between two peers.
///
/// Time-ordered (UUID v7) so transfer ids sort by creation. The hub keeps no
/// record of issued ids — both peers are trusted to echo them back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferId(Uuid);

impl TransferId {
    /// Issues a fresh, unique transfer id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wraps an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID value.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Messages a client sends to the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Propose a file transfer to another user.
    ///
    /// The hub validates the declared metadata, assigns a [`TransferId`],
    /// and relays the offer to every connection the destination user holds.
    #[serde(rename_all = "camelCase")]
    Offer {
        /// User id of the intended receiver.
        destination_user_id: String,
        /// Declared file name (display only, never touched by the hub).
        file_name: String,
        /// Declared size in bytes.
        file_size: u64,
        /// Declared media type (may be empty for unknown types).
        mime_type: String,
    },

    /// Answer a previously relayed offer.
    #[serde(rename_all = "camelCase")]
    Accept {
        /// The id from the offer being answered.
        transfer_id: TransferId,
        /// User id of the original offerer, used to route the answer back.
        source_user_id: String,
        /// `true` to start the transfer, `false` to decline.
        accept: bool,
    },

    /// One slice of file data in flight from sender to receiver.
    ///
    /// Sequence number and final marker are pass-through fields the peers
    /// interpret themselves; the hub performs no reassembly or ordering.
    #[serde(rename_all = "camelCase")]
    Chunk {
        /// The transfer this slice belongs to.
        transfer_id: TransferId,
        /// User id of the receiving peer.
        destination_user_id: String,
        /// Position of this slice as assigned by the sender.
        sequence_number: u64,
        /// Marks the last slice of the transfer.
        is_final: bool,
        /// Opaque encoded slice contents (e.g. base64), never decoded here.
        payload: String,
    },
}

/// Messages the hub sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Identity acknowledgment — always the first frame on a new connection.
    #[serde(rename_all = "camelCase")]
    Welcome {
        /// The connecting user's stable id.
        id: String,
        /// The connecting user's display name.
        name: String,
    },

    /// Full presence snapshot, pushed to every client on any change.
    #[serde(rename_all = "camelCase")]
    Presence {
        /// Every known user, online or not.
        users: Vec<crate::presence::PresenceInfo>,
    },

    /// An incoming offer relayed to the destination user's connections.
    #[serde(rename_all = "camelCase")]
    OfferRelay {
        transfer_id: TransferId,
        source_user_id: String,
        source_name: String,
        file_name: String,
        file_size: u64,
        mime_type: String,
    },

    /// Confirms an offer was relayed and carries its assigned id.
    #[serde(rename_all = "camelCase")]
    OfferAck { transfer_id: TransferId },

    /// The receiver's answer relayed back to the offerer's connections.
    #[serde(rename_all = "camelCase")]
    AcceptRelay {
        transfer_id: TransferId,
        accept: bool,
        responder_user_id: String,
        responder_name: String,
    },

    /// A data slice relayed to the destination user's connections.
    #[serde(rename_all = "camelCase")]
    ChunkRelay {
        transfer_id: TransferId,
        source_user_id: String,
        sequence_number: u64,
        is_final: bool,
        payload: String,
    },

    /// Reports a problem with the sender's own request (invalid offer,
    /// recipient offline). Only ever sent to the originating connection.
    #[serde(rename_all = "camelCase")]
    Error { message: String },
}

/// Error type for signal encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Serialization or deserialization failed.
    #[error("signal codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Encodes a [`ClientMessage`] into a JSON text frame.
///
/// # Errors
///
/// Returns [`SignalError::Codec`] if the message cannot be serialized.
pub fn encode_client(msg: &ClientMessage) -> Result<String, SignalError> {
    Ok(serde_json::to_string(msg)?)
}

/// Decodes a [`ClientMessage`] from a JSON text frame.
///
/// # Errors
///
/// Returns [`SignalError::Codec`] if the text is not a valid client frame.
pub fn decode_client(text: &str) -> Result<ClientMessage, SignalError> {
    Ok(serde_json::from_str(text)?)
}

/// Encodes a [`ServerMessage`] into a JSON text frame.
///
/// # Errors
///
/// Returns [`SignalError::Codec`] if the message cannot be serialized.
pub fn encode_server(msg: &ServerMessage) -> Result<String, SignalError> {
    Ok(serde_json::to_string(msg)?)
}

/// Decodes a [`ServerMessage`] from a JSON text frame.
///
/// # Errors
///
/// Returns [`SignalError::Codec`] if the text is not a valid server frame.
pub fn decode_server(text: &str) -> Result<ServerMessage, SignalError> {
    Ok(serde_json::from_str(text)?)
}
