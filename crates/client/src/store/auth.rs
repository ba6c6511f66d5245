//! The auth slice: actions and pure reducer.

use truewave_core::User;

/// The auth slice of the root state.
///
/// `initialized` stays false until the first identity event arrives, so
/// the UI can hold off rendering signed-out chrome during startup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub initialized: bool,
    pub error: Option<String>,
}

impl AuthState {
    /// Whether a user is signed in.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Auth slice actions.
#[derive(Debug, Clone)]
pub enum AuthAction {
    /// The identity listener resolved a sign-in (`Some`) or sign-out
    /// (`None`). Either way the slice counts as initialized.
    SetUser(Option<User>),
    /// Record a user-visible auth failure.
    SetError(String),
    /// Drop the recorded failure.
    ClearError,
}

pub(super) fn reduce(state: &mut AuthState, action: &AuthAction) {
    match action {
        AuthAction::SetUser(user) => {
            state.user = user.clone();
            state.initialized = true;
            state.error = None;
        }
        AuthAction::SetError(message) => {
            state.error = Some(message.clone());
        }
        AuthAction::ClearError => {
            state.error = None;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use truewave_core::{Email, UserId};

    fn user() -> User {
        User {
            id: UserId::new("u1"),
            email: Email::parse("user@example.com").unwrap(),
            display_name: None,
            photo_url: None,
            email_verified: false,
            is_admin: false,
        }
    }

    #[test]
    fn test_set_user_initializes_and_clears_error() {
        let mut state = AuthState::default();
        assert!(!state.initialized);

        reduce(&mut state, &AuthAction::SetError("boom".into()));
        reduce(&mut state, &AuthAction::SetUser(Some(user())));

        assert!(state.initialized);
        assert!(state.is_authenticated());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_sign_out_keeps_initialized() {
        let mut state = AuthState::default();
        reduce(&mut state, &AuthAction::SetUser(Some(user())));
        reduce(&mut state, &AuthAction::SetUser(None));

        assert!(state.initialized);
        assert!(!state.is_authenticated());
    }
}
