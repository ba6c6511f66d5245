//! Account lifecycle over the identity provider and user documents.
//!
//! The identity provider owns credentials and the core profile; the user
//! document in the external store carries application data, notably
//! `is_admin`. A missing or unreadable document never blocks sign-in: the
//! user is resolved with admin access off.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use truewave_core::{Email, ProfileUpdate, User, UserId};

use crate::backend::{AuthError, BackendError, Identity, IdentityProvider, UserRepository};

/// Build the application user from an identity and its document.
///
/// `is_admin` comes from the document; lookup failures resolve to a
/// non-admin user rather than failing the sign-in.
pub async fn resolve_user(users: &dyn UserRepository, identity: &Identity) -> User {
    let is_admin = match users.get(&identity.id).await {
        Ok(Some(record)) => record.is_admin,
        Ok(None) => false,
        Err(error) => {
            warn!(user = %identity.id, %error, "profile lookup failed; assuming non-admin");
            false
        }
    };

    User {
        id: identity.id.clone(),
        email: identity.email.clone(),
        display_name: identity.display_name.clone(),
        photo_url: identity.photo_url.clone(),
        email_verified: identity.email_verified,
        is_admin,
    }
}

/// Registration, sign-in, and profile management.
pub struct AuthService {
    identities: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    #[must_use]
    pub fn new(identities: Arc<dyn IdentityProvider>, users: Arc<dyn UserRepository>) -> Self {
        Self { identities, users }
    }

    /// Create an account, optionally set a display name, and create the
    /// user document.
    ///
    /// The document write is best-effort: if it fails the account still
    /// exists and the user signs in as non-admin.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the provider rejects the account.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        email: &Email,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<User, AuthError> {
        let mut identity = self.identities.create_account(email, password).await?;

        if let Some(name) = display_name {
            let update = ProfileUpdate {
                display_name: Some(name.to_owned()),
                photo_url: None,
            };
            self.identities.update_profile(&update).await?;
            identity.display_name = Some(name.to_owned());
        }

        if let Err(error) = self
            .users
            .create(&identity.id, email, identity.display_name.as_deref(), None)
            .await
        {
            warn!(user = %identity.id, %error, "user document creation failed");
        }

        info!(user = %identity.id, "account created");
        Ok(resolve_user(self.users.as_ref(), &identity).await)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] for a bad combination.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<User, AuthError> {
        let identity = self.identities.sign_in(email, password).await?;
        Ok(resolve_user(self.users.as_ref(), &identity).await)
    }

    /// Sign out the current user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the provider rejects the request.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.identities.sign_out().await
    }

    /// Update the signed-in user's profile in the provider and, best
    /// effort, in the user document. An empty update is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NotSignedIn`] without a signed-in user.
    #[instrument(skip_all)]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<(), AuthError> {
        if update.is_empty() {
            return Ok(());
        }

        let identity = self.identities.current().ok_or(AuthError::NotSignedIn)?;
        self.identities.update_profile(update).await?;

        if let Err(error) = self.users.update(&identity.id, update).await {
            warn!(user = %identity.id, %error, "user document update failed");
        }
        Ok(())
    }

    /// The current identity, if signed in.
    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.identities.current()
    }

    /// Grant or revoke admin status (admin panel).
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the user document is missing or the
    /// write fails.
    pub async fn set_admin(&self, id: &UserId, is_admin: bool) -> Result<(), BackendError> {
        self.users.set_admin(id, is_admin).await?;
        info!(user = %id, is_admin, "admin status changed");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::backend::memory::{MemoryBackend, MemoryIdentityProvider};

    fn service(backend: &MemoryBackend) -> AuthService {
        AuthService::new(
            Arc::new(MemoryIdentityProvider::new()),
            Arc::new(backend.clone()),
        )
    }

    #[tokio::test]
    async fn test_register_creates_account_and_document() {
        let backend = MemoryBackend::new();
        let auth = service(&backend);
        let email = Email::parse("user@example.com").unwrap();

        let user = auth
            .register(&email, "hunter22", Some("Shopper"))
            .await
            .unwrap();

        assert_eq!(user.display_name.as_deref(), Some("Shopper"));
        assert!(!user.is_admin);

        let record = UserRepository::get(&backend, &user.id).await.unwrap().unwrap();
        assert_eq!(record.email, email);
        assert_eq!(record.display_name.as_deref(), Some("Shopper"));
    }

    #[tokio::test]
    async fn test_login_resolves_admin_from_document() {
        let backend = MemoryBackend::new();
        let auth = service(&backend);
        let email = Email::parse("admin@example.com").unwrap();

        let user = auth.register(&email, "hunter22", None).await.unwrap();
        auth.set_admin(&user.id, true).await.unwrap();
        auth.logout().await.unwrap();

        let back = auth.login(&email, "hunter22").await.unwrap();
        assert!(back.is_admin);
    }

    #[tokio::test]
    async fn test_update_profile_requires_sign_in() {
        let backend = MemoryBackend::new();
        let auth = service(&backend);

        let update = ProfileUpdate {
            display_name: Some("Someone".into()),
            photo_url: None,
        };
        assert!(matches!(
            auth.update_profile(&update).await,
            Err(AuthError::NotSignedIn)
        ));

        // An empty update never touches the provider
        assert!(auth.update_profile(&ProfileUpdate::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_profile_writes_both_places() {
        let backend = MemoryBackend::new();
        let auth = service(&backend);
        let email = Email::parse("user@example.com").unwrap();
        let user = auth.register(&email, "hunter22", None).await.unwrap();

        auth.update_profile(&ProfileUpdate {
            display_name: Some("Renamed".into()),
            photo_url: Some("https://cdn.example.com/me.jpg".into()),
        })
        .await
        .unwrap();

        let identity = auth.current().unwrap();
        assert_eq!(identity.display_name.as_deref(), Some("Renamed"));

        let record = UserRepository::get(&backend, &user.id).await.unwrap().unwrap();
        assert_eq!(record.display_name.as_deref(), Some("Renamed"));
        assert_eq!(
            record.photo_url.as_deref(),
            Some("https://cdn.example.com/me.jpg")
        );
    }
}
