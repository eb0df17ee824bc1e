//! Authenticated-user lookup.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use kiosk_core::UserId;

/// Source of the currently authenticated user.
pub trait IdentityProvider: Send + Sync + 'static {
    /// The signed-in user, or `None` when nobody is authenticated.
    fn current_user(&self) -> Option<UserId>;
}

/// Shared handle to any identity provider.
pub type SharedIdentity = Arc<dyn IdentityProvider>;

/// In-process identity holder updated by the sign-in flow.
#[derive(Debug, Default, Clone)]
pub struct StaticIdentity {
    user: Arc<RwLock<Option<UserId>>>,
}

impl StaticIdentity {
    /// Nobody signed in.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Already signed in as `user_id`.
    pub fn signed_in(user_id: UserId) -> Self {
        let identity = Self::default();
        identity.sign_in(user_id);
        identity
    }

    /// Replace the current user.
    pub fn sign_in(&self, user_id: UserId) {
        *self.user.write().unwrap_or_else(PoisonError::into_inner) = Some(user_id);
        info!("User signed in: user_id={}", user_id);
    }

    /// Forget the current user.
    pub fn sign_out(&self) {
        let previous = self
            .user
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(user_id) = previous {
            info!("User signed out: user_id={}", user_id);
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Option<UserId> {
        *self.user.read().unwrap_or_else(PoisonError::into_inner)
    }
}
