//! Session Authentication — Bearer Token Handling
//!
//! Token issuance lives with an external session collaborator; this
//! adapter only holds the current bearer token and attaches it to every
//! request. A 401-equivalent response invalidates the token, which makes
//! the engine halt polling until the collaborator supplies a fresh one.

use std::sync::RwLock;

use anyhow::{Context, Result};

/// Env var holding the initial bearer token.
pub const TOKEN_ENV_VAR: &str = "MERCHANT_API_TOKEN";

/// Holds the merchant session's bearer token.
pub struct SessionAuth {
    token: RwLock<Option<String>>,
}

impl SessionAuth {
    /// Load the initial token from `MERCHANT_API_TOKEN`.
    ///
    /// The token MUST come from the environment (never committed); the
    /// external session collaborator rotates it via `set_token`.
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV_VAR)
            .with_context(|| format!("{TOKEN_ENV_VAR} not set"))?;
        Ok(Self {
            token: RwLock::new(Some(token)),
        })
    }

    /// Start without a token (tests, or login-first flows).
    pub fn unauthenticated() -> Self {
        Self {
            token: RwLock::new(None),
        }
    }

    /// Replace the token after (re-)authentication.
    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write().unwrap() = Some(token.into());
    }

    /// Drop the token; subsequent calls fail as session-expired until a
    /// new one is set.
    pub fn invalidate(&self) {
        *self.token.write().unwrap() = None;
    }

    /// Current bearer token, if any.
    pub fn bearer(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().unwrap().is_some()
    }
}
