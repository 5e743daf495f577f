//! Shared protocol definitions for the Airlift signaling wire format.

pub mod presence;
pub mod signal;
