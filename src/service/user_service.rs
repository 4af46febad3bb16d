//! Application user profiles.

use std::sync::Arc;

use chrono::Utc;
use validator::Validate;

use super::views::UserForm;
use crate::domain::{ApplicationUser, Role, UserId};
use crate::error::EventlyError;
use crate::persistence::{Store, UnitOfWork};

/// Registers and looks up application users.
#[derive(Debug, Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    /// Creates a new `UserService`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a profile with the `User` role. The id comes from the
    /// identity provider when given and is minted otherwise.
    ///
    /// # Errors
    ///
    /// - [`EventlyError::Validation`] for malformed fields.
    /// - [`EventlyError::UsernameTaken`] when the username is in use.
    pub async fn register_user(&self, form: UserForm) -> Result<ApplicationUser, EventlyError> {
        form.validate()?;

        let mut uow = UnitOfWork::new(Arc::clone(&self.store));
        if uow.users().get_by_username(&form.username).await?.is_some() {
            return Err(EventlyError::UsernameTaken(form.username));
        }

        let user = ApplicationUser {
            id: form.id.unwrap_or_default(),
            full_name: form.full_name,
            email: form.email,
            username: form.username,
            phone: form.phone,
            role: Role::User,
            created_at: Utc::now(),
        };
        uow.users().add(user.clone());
        uow.save_changes().await?;

        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Profile by id.
    ///
    /// # Errors
    ///
    /// Returns persistence failures.
    pub async fn get_user(&self, id: UserId) -> Result<Option<ApplicationUser>, EventlyError> {
        UnitOfWork::new(Arc::clone(&self.store)).users().get(id).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    fn form(username: &str) -> UserForm {
        UserForm {
            id: None,
            full_name: "Sara Ali".to_string(),
            email: "sara@example.com".to_string(),
            username: username.to_string(),
            phone: "+201001234567".to_string(),
        }
    }

    #[tokio::test]
    async fn register_then_lookup() {
        let svc = UserService::new(Arc::new(MemoryStore::new()));
        let Ok(user) = svc.register_user(form("sara_ali")).await else {
            panic!("registration failed");
        };
        assert_eq!(user.role, Role::User);

        let Ok(Some(found)) = svc.get_user(user.id).await else {
            panic!("user missing");
        };
        assert_eq!(found.username, "sara_ali");
        assert_eq!(svc.get_user(UserId::new()).await.ok(), Some(None));
    }

    #[tokio::test]
    async fn keeps_identity_provider_id() {
        let svc = UserService::new(Arc::new(MemoryStore::new()));
        let id = UserId::new();
        let mut f = form("sara");
        f.id = Some(id);
        assert_eq!(svc.register_user(f).await.ok().map(|u| u.id), Some(id));
    }

    #[tokio::test]
    async fn rejects_taken_and_invalid_usernames() {
        let svc = UserService::new(Arc::new(MemoryStore::new()));
        assert!(svc.register_user(form("sara")).await.is_ok());
        assert!(matches!(
            svc.register_user(form("sara")).await,
            Err(EventlyError::UsernameTaken(name)) if name == "sara"
        ));
        assert!(matches!(
            svc.register_user(form("sara ali")).await,
            Err(EventlyError::Validation(_))
        ));
    }
}
