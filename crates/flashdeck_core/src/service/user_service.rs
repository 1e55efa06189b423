//! User use-case service.
//!
//! # Responsibility
//! - Provide create/read/update/delete entry points for users.
//! - Enforce email uniqueness with a lookup before every write.
//!
//! # Invariants
//! - Entity validation runs before any repository call.
//! - Uniqueness is best-effort: two concurrent writers can still race.

use crate::model::user::User;
use crate::repo::crud::PageQuery;
use crate::repo::user_repo::UserRepository;
use crate::service::{ServiceError, ServiceResult};
use log::info;

/// Use-case service wrapper for user operations.
pub struct UserService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> UserService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new user.
    ///
    /// # Errors
    /// - `Validation` for a malformed email or blank name.
    /// - `EmailAlreadyExists` when another user owns `email`.
    pub fn create_user(&self, email: &str, name: &str) -> ServiceResult<User> {
        let user = User::new(email, name)?;
        if self.repo.find_by_email(user.email())?.is_some() {
            return Err(ServiceError::EmailAlreadyExists(user.email().to_string()));
        }
        let saved = self.repo.save(&user)?;
        info!(
            "event=user_create module=service status=ok user_id={}",
            saved.id()
        );
        Ok(saved)
    }

    pub fn get_user(&self, id: &str) -> ServiceResult<User> {
        self.repo
            .find_by_id(id)?
            .ok_or_else(|| ServiceError::UserNotFound(id.to_string()))
    }

    pub fn list_users(&self, page: &PageQuery) -> ServiceResult<Vec<User>> {
        Ok(self.repo.find_all(page)?)
    }

    /// Replaces email and name of an existing user.
    ///
    /// # Errors
    /// - `UserNotFound` when `id` does not exist.
    /// - `EmailInUse` when `email` changes to one owned by another user.
    /// - `Validation` when either value is invalid; nothing is written.
    pub fn update_user(&self, id: &str, email: &str, name: &str) -> ServiceResult<User> {
        let mut user = self.get_user(id)?;
        if user.email() != email && self.repo.find_by_email(email)?.is_some() {
            return Err(ServiceError::EmailInUse(email.to_string()));
        }
        user.update_email(email)?;
        user.update_name(name)?;
        let saved = self.repo.save(&user)?;
        info!(
            "event=user_update module=service status=ok user_id={}",
            saved.id()
        );
        Ok(saved)
    }

    /// Deletes a user; cards owned by the user are left in place.
    pub fn delete_user(&self, id: &str) -> ServiceResult<()> {
        if !self.repo.delete(id)? {
            return Err(ServiceError::UserNotFound(id.to_string()));
        }
        info!("event=user_delete module=service status=ok user_id={id}");
        Ok(())
    }

    pub fn count_users(&self) -> ServiceResult<u64> {
        Ok(self.repo.count()?)
    }
}
