//! Signaling router: validates and relays offer, accept, and chunk frames.
//!
//! Every handler receives the connection's immutable [`UserIdentity`] and
//! its own reply sender. Acks and errors go only to the reply sender;
//! relays fan out to every handle the counterpart user currently holds
//! (a user reading the same account in two tabs receives the frame twice —
//! duplicate suppression is the client's job).
//!
//! Relaying is fire-and-forget: the hub keeps no transfer table and offers
//! no delivery guarantee. A send into a closing connection's channel is
//! simply lost, which peers treat like any other mid-transfer drop.

use std::sync::Arc;

use airlift_proto::signal::{self, ClientMessage, ServerMessage, TransferId};
use axum::extract::ws::Message;
use tokio::sync::mpsc;

use crate::hub::HubState;
use crate::identity::UserIdentity;

/// Checks an offer's declared metadata against the hub's limits.
///
/// # Errors
///
/// Returns the client-facing reason when the offer must be rejected.
pub fn validate_offer(
    destination_user_id: &str,
    file_name: &str,
    file_size: u64,
    max_file_size: u64,
) -> Result<(), String> {
    if destination_user_id.is_empty() {
        return Err("destination user id is empty".to_string());
    }
    if file_name.is_empty() {
        return Err("file name is empty".to_string());
    }
    if file_size > max_file_size {
        return Err(format!(
            "file too large: {file_size} bytes (max {max_file_size})"
        ));
    }
    Ok(())
}

/// Routes one decoded client frame.
pub async fn handle_message(
    state: &Arc<HubState>,
    identity: &UserIdentity,
    reply: &mpsc::UnboundedSender<Message>,
    msg: ClientMessage,
) {
    match msg {
        ClientMessage::Offer {
            destination_user_id,
            file_name,
            file_size,
            mime_type,
        } => {
            handle_offer(
                state,
                identity,
                reply,
                &destination_user_id,
                file_name,
                file_size,
                mime_type,
            )
            .await;
        }
        ClientMessage::Accept {
            transfer_id,
            source_user_id,
            accept,
        } => {
            handle_accept(state, identity, transfer_id, &source_user_id, accept).await;
        }
        ClientMessage::Chunk {
            transfer_id,
            destination_user_id,
            sequence_number,
            is_final,
            payload,
        } => {
            handle_chunk(
                state,
                identity,
                transfer_id,
                &destination_user_id,
                sequence_number,
                is_final,
                payload,
            )
            .await;
        }
    }
}

/// Validates an offer, assigns a transfer id, and relays it.
///
/// The offer goes to every destination handle; the ack with the assigned
/// id returns to the offerer's own connection afterwards.
async fn handle_offer(
    state: &Arc<HubState>,
    identity: &UserIdentity,
    reply: &mpsc::UnboundedSender<Message>,
    destination_user_id: &str,
    file_name: String,
    file_size: u64,
    mime_type: String,
) {
    if let Err(reason) = validate_offer(
        destination_user_id,
        &file_name,
        file_size,
        state.max_file_size,
    ) {
        tracing::warn!(user_id = %identity.id, reason = %reason, "rejecting offer");
        send_frame(reply, &ServerMessage::Error { message: reason });
        return;
    }

    let handles = state.registry.handles_for(destination_user_id).await;
    if handles.is_empty() {
        tracing::info!(
            user_id = %identity.id,
            destination = %destination_user_id,
            "offer to offline recipient"
        );
        send_frame(
            reply,
            &ServerMessage::Error {
                message: "recipient offline".to_string(),
            },
        );
        return;
    }

    let transfer_id = TransferId::new();
    tracing::info!(
        transfer_id = %transfer_id,
        from = %identity.id,
        to = %destination_user_id,
        file_name = %file_name,
        file_size,
        "relaying offer"
    );
    send_to_handles(
        &handles,
        &ServerMessage::OfferRelay {
            transfer_id,
            source_user_id: identity.id.clone(),
            source_name: identity.name.clone(),
            file_name,
            file_size,
            mime_type,
        },
    );
    send_frame(reply, &ServerMessage::OfferAck { transfer_id });
}

/// Relays an accept/decline answer back to the original offerer.
///
/// An absent offerer is an expected race (they may have disconnected
/// between offer and answer), so the frame is dropped without an error.
async fn handle_accept(
    state: &Arc<HubState>,
    identity: &UserIdentity,
    transfer_id: TransferId,
    source_user_id: &str,
    accept: bool,
) {
    let handles = state.registry.handles_for(source_user_id).await;
    if handles.is_empty() {
        tracing::debug!(
            transfer_id = %transfer_id,
            source = %source_user_id,
            "accept for absent offerer, dropping"
        );
        return;
    }

    tracing::info!(
        transfer_id = %transfer_id,
        responder = %identity.id,
        accept,
        "relaying transfer answer"
    );
    send_to_handles(
        &handles,
        &ServerMessage::AcceptRelay {
            transfer_id,
            accept,
            responder_user_id: identity.id.clone(),
            responder_name: identity.name.clone(),
        },
    );
}

/// Relays one data slice to the receiving user's handles.
///
/// Oversized payloads and offline destinations are dropped silently
/// (mid-transfer races are routine and an error event would only confuse
/// the sending peer's pipeline).
async fn handle_chunk(
    state: &Arc<HubState>,
    identity: &UserIdentity,
    transfer_id: TransferId,
    destination_user_id: &str,
    sequence_number: u64,
    is_final: bool,
    payload: String,
) {
    if payload.len() > state.max_chunk_size {
        tracing::warn!(
            transfer_id = %transfer_id,
            user_id = %identity.id,
            size = payload.len(),
            max = state.max_chunk_size,
            "chunk over size cap, dropping"
        );
        return;
    }

    let handles = state.registry.handles_for(destination_user_id).await;
    if handles.is_empty() {
        tracing::debug!(
            transfer_id = %transfer_id,
            destination = %destination_user_id,
            "chunk for offline recipient, dropping"
        );
        return;
    }

    send_to_handles(
        &handles,
        &ServerMessage::ChunkRelay {
            transfer_id,
            source_user_id: identity.id.clone(),
            sequence_number,
            is_final,
            payload,
        },
    );
}

/// Encodes a server frame and pushes it down a single connection channel.
pub(crate) fn send_frame(sender: &mpsc::UnboundedSender<Message>, msg: &ServerMessage) {
    match signal::encode_server(msg) {
        Ok(text) => {
            let _ = sender.send(Message::Text(text.into()));
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to encode server frame");
        }
    }
}

/// Encodes a server frame once and pushes it down every given channel.
pub(crate) fn send_to_handles(handles: &[mpsc::UnboundedSender<Message>], msg: &ServerMessage) {
    match signal::encode_server(msg) {
        Ok(text) => {
            for sender in handles {
                let _ = sender.send(Message::Text(text.clone().into()));
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to encode server frame");
        }
    }
}
