//! Hub server core: shared state, WebSocket admission and teardown, and
//! presence broadcasting.
//!
//! Admission happens before the WebSocket upgrade: the `token` query
//! parameter is resolved to a [`UserIdentity`] and an unknown token is
//! refused with HTTP 401, leaving no trace in the registry. An admitted
//! connection is greeted with a `welcome` frame, attached to the registry
//! under its user id, and announced to everyone through a full presence
//! broadcast. Teardown mirrors admission for every disconnect cause.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use airlift_proto::signal::{self, ServerMessage};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::identity::{IdentityResolver, UserIdentity};
use crate::registry::{HandleId, PresenceRegistry};
use crate::router;

/// Default maximum declared file size accepted in offers (100 GiB).
const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024 * 1024;

/// Default maximum chunk payload size in bytes (1 MiB).
const DEFAULT_MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// Shared hub state: the presence registry, the identity seam, and the
/// relay size limits.
pub struct HubState {
    /// Who is connected, from where, and whether their peer port answers.
    pub registry: PresenceRegistry,
    /// Resolves admission tokens; owned by the external login system.
    resolver: Box<dyn IdentityResolver>,
    /// Hard cap on the declared file size of an offer.
    pub max_file_size: u64,
    /// Hard cap on a single chunk payload.
    pub max_chunk_size: usize,
}

impl HubState {
    /// Creates hub state with default size limits.
    #[must_use]
    pub fn new(resolver: impl IdentityResolver + 'static) -> Self {
        Self::with_limits(resolver, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_CHUNK_SIZE)
    }

    /// Creates hub state with custom size limits from the resolved config.
    #[must_use]
    pub fn with_limits(
        resolver: impl IdentityResolver + 'static,
        max_file_size: u64,
        max_chunk_size: usize,
    ) -> Self {
        Self {
            registry: PresenceRegistry::new(),
            resolver: Box::new(resolver),
            max_file_size,
            max_chunk_size,
        }
    }

    /// Resolves an admission token through the configured resolver.
    pub async fn resolve_identity(&self, token: &str) -> Option<UserIdentity> {
        self.resolver.resolve(token).await
    }

    /// Pushes a full presence snapshot to every live connection.
    ///
    /// The same encoded frame goes to everyone; clients replace their whole
    /// view rather than patching deltas.
    pub async fn broadcast_presence(&self) {
        let users = self.registry.snapshot().await;
        let handles = self.registry.all_handles().await;
        tracing::debug!(
            users = users.len(),
            connections = handles.len(),
            "broadcasting presence"
        );
        router::send_to_handles(&handles, &ServerMessage::Presence { users });
    }

    /// Administrative reset: force-closes every connection and clears the
    /// registry as one atomic action.
    ///
    /// Exposed for the external privileged surface; the hub binary itself
    /// wires no route to it.
    pub async fn reset(&self) {
        tracing::warn!("administrative reset requested");
        self.registry.reset().await;
    }
}

/// Query parameters of the WebSocket route.
#[derive(serde::Deserialize)]
struct WsQuery {
    token: Option<String>,
}

/// axum handler that admits and upgrades a WebSocket connection.
///
/// Admission runs before the upgrade so a refused client costs nothing
/// but the HTTP exchange.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    ConnectInfo(peer_addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<HubState>>,
) -> Response {
    let Some(token) = query.token else {
        tracing::info!(addr = %peer_addr, "connection without token refused");
        return StatusCode::UNAUTHORIZED.into_response();
    };
    let Some(identity) = state.resolve_identity(&token).await else {
        tracing::info!(addr = %peer_addr, "connection with unknown token refused");
        return StatusCode::UNAUTHORIZED.into_response();
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, identity, peer_addr.ip()))
        .into_response()
}

/// Handles one admitted WebSocket connection.
///
/// The connection lifecycle:
/// 1. Queue the `welcome` frame so it precedes anything else on the wire.
/// 2. Attach the connection to the registry and broadcast presence.
/// 3. Run reader and writer tasks until either ends.
/// 4. Detach and broadcast presence again.
pub async fn handle_socket(
    socket: WebSocket,
    state: Arc<HubState>,
    identity: UserIdentity,
    address: IpAddr,
) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let handle_id = HandleId::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    // Queued before attach, so no broadcast can beat it onto the wire.
    router::send_frame(
        &tx,
        &ServerMessage::Welcome {
            id: identity.id.clone(),
            name: identity.name.clone(),
        },
    );

    let reply = tx.clone();
    state
        .registry
        .attach(&identity.id, &identity.name, handle_id, tx, address)
        .await;
    tracing::info!(
        user_id = %identity.id,
        handle_id = %handle_id,
        addr = %address,
        "user attached"
    );
    state.broadcast_presence().await;

    // Writer task: drains the connection channel into the WebSocket. A
    // forwarded Close frame ends the task, so a reset tears the connection
    // down even if the client never answers the closing handshake.
    let writer_user_id = identity.id.clone();
    let mut write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if ws_sender.send(msg).await.is_err() {
                tracing::warn!(user_id = %writer_user_id, "WebSocket write failed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    // Reader task: decodes text frames and hands them to the router.
    let reader_state = Arc::clone(&state);
    let reader_identity = identity.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Text(text) => match signal::decode_client(text.as_str()) {
                    Ok(client_msg) => {
                        router::handle_message(&reader_state, &reader_identity, &reply, client_msg)
                            .await;
                    }
                    Err(e) => {
                        tracing::debug!(
                            user_id = %reader_identity.id,
                            error = %e,
                            "dropping undecodable frame"
                        );
                    }
                },
                Message::Close(_) => {
                    tracing::info!(user_id = %reader_identity.id, "received close frame");
                    break;
                }
                _ => {
                    // Ignore binary, ping, pong frames.
                }
            }
        }
    });

    // Wait for either task to finish, then abort the other.
    tokio::select! {
        _ = &mut read_task => {
            write_task.abort();
        }
        _ = &mut write_task => {
            read_task.abort();
        }
    }

    state.registry.detach(&identity.id, handle_id).await;
    tracing::info!(user_id = %identity.id, handle_id = %handle_id, "user detached");
    state.broadcast_presence().await;
}

/// Starts the hub server on the given address and returns the bound address
/// and a join handle.
///
/// This is the primary entry point used by both `main.rs` and test code.
/// The service is built with connect-info so handlers see each client's
/// remote address.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
    state: Arc<HubState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = axum::Router::new()
        .route("/ws", axum::routing::get(ws_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        {
            tracing::error!(error = %e, "hub server error");
        }
    });

    Ok((bound_addr, handle))
}
