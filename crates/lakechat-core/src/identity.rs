//! Current-user identity lookup.

/// Source of the signed-in user's id, used as the backend `company_id`.
///
/// `None` means nobody is signed in. That is a normal state, not an error.
pub trait IdentityProvider: Send + Sync {
    fn current_user_id(&self) -> Option<String>;
}
