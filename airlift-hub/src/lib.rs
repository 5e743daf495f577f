//! Airlift signaling hub library.
//!
//! Exposes the hub server for use in tests and embedding. The hub accepts
//! WebSocket connections from authenticated users, tracks their presence
//! and peer-service reachability, and relays file-transfer signaling
//! (offer / accept / chunk) between them without ever touching file
//! contents itself.

pub mod config;
pub mod hub;
pub mod identity;
pub mod poller;
pub mod probe;
pub mod registry;
pub mod router;
