//! Identity attached to every outbound request.
//!
//! # Design
//! The farmer id comes from an `IdentityProvider` so a real sign-in flow can
//! replace the demo constant without touching the request builder. A session
//! id is minted per screen mount from a random UUID; two mounts in the same
//! millisecond still get distinct sessions. Nothing here is persisted.

use uuid::Uuid;

/// Farmer id used until an authenticated identity exists.
pub const DEMO_FARMER_ID: &str = "farmer_demo_001";

/// Source of the current farmer's id.
pub trait IdentityProvider: Send + Sync {
    fn farmer_id(&self) -> String;
}

/// Identity provider returning a fixed id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity(pub String);

impl Default for StaticIdentity {
    fn default() -> Self {
        Self(DEMO_FARMER_ID.to_string())
    }
}

impl IdentityProvider for StaticIdentity {
    fn farmer_id(&self) -> String {
        self.0.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    farmer_id: String,
    session_id: String,
}

impl SessionContext {
    /// Start a fresh session for whoever `identity` says is signed in.
    pub fn start(identity: &dyn IdentityProvider) -> Self {
        Self::with_session_id(identity.farmer_id(), format!("session_{}", Uuid::new_v4()))
    }

    /// Rebuild a context from known ids, e.g. ones handed over the FFI boundary.
    pub fn with_session_id(farmer_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            farmer_id: farmer_id.into(),
            session_id: session_id.into(),
        }
    }

    pub fn farmer_id(&self) -> &str {
        &self.farmer_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::start(&StaticIdentity::default())
    }
}
