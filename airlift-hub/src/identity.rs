//! Identity resolution seam between the hub and the external login system.
//!
//! The hub performs no credential checks of its own. An admission token
//! arrives with each WebSocket request and is handed to an
//! [`IdentityResolver`]; whatever system issued the token decides who the
//! connection belongs to. A rejected token means the connection is refused
//! before any hub state exists for it.

use std::collections::HashMap;

use async_trait::async_trait;

/// Authenticated identity attached to a connection at admission.
///
/// Resolved exactly once per connection and treated as immutable from then
/// on; handlers receive it by value instead of re-reading any session state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    /// Stable opaque user id.
    pub id: String,
    /// Display name shown to other users.
    pub name: String,
}

/// Maps an admission token to the user behind it.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Returns the identity the token belongs to, or `None` to refuse
    /// admission.
    async fn resolve(&self, token: &str) -> Option<UserIdentity>;
}

/// Resolver backed by a fixed in-memory token table.
///
/// The binary fills it from the `[[tokens]]` config entries; tests build it
/// directly. Lookups are exact string matches.
#[derive(Debug, Default)]
pub struct StaticTokenResolver {
    tokens: HashMap<String, UserIdentity>,
}

impl StaticTokenResolver {
    /// Creates an empty resolver that refuses every token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token for the given user, replacing any previous mapping.
    pub fn insert(
        &mut self,
        token: impl Into<String>,
        user_id: impl Into<String>,
        display_name: impl Into<String>,
    ) {
        self.tokens.insert(
            token.into(),
            UserIdentity {
                id: user_id.into(),
                name: display_name.into(),
            },
        );
    }

    /// Number of registered tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no tokens are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl IdentityResolver for StaticTokenResolver {
    async fn resolve(&self, token: &str) -> Option<UserIdentity> {
        self.tokens.get(token).cloned()
    }
}
