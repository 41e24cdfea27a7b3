use tracing::info;

use super::{vanished, JobBoard};
use crate::board::authz::{self, Principal};
use crate::board::domain::{Role, User, UserId};
use crate::board::error::{BoardError, Entity};
use crate::board::input::{IdentityEvent, ProfileUpdate, RoleAssignment};
use crate::board::store::{EntityStore, IdentityUpsert, StoreError};
use crate::board::views::ProfileView;

fn keep_unless_blank(current: &mut String, incoming: Option<String>) {
    if let Some(value) = incoming {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            *current = trimmed.to_string();
        }
    }
}

impl<S> JobBoard<S>
where
    S: EntityStore + 'static,
{
    /// Creates or refreshes a user from an identity provider event. Events other than
    /// `user.created` / `user.updated` are acknowledged without a user.
    pub fn sync_identity(&self, event: IdentityEvent) -> Result<Option<User>, BoardError> {
        if !event.is_user_sync() {
            return Ok(None);
        }
        let kind = event.kind.clone();
        let profile = event.user_data()?.validate()?;

        let initial_role = if self
            .config
            .bootstrap_admins
            .iter()
            .any(|external_id| external_id == &profile.external_id)
        {
            Role::Admin
        } else {
            Role::User
        };

        let user = self
            .store
            .upsert_identity(IdentityUpsert {
                external_id: profile.external_id,
                email: profile.email,
                name: profile.name,
                profile_image: profile.profile_image,
                initial_role,
                at: self.now(),
            })
            .map_err(|err| match err {
                StoreError::Conflict(_) => BoardError::Conflict(
                    "Email is already registered to another account".to_string(),
                ),
                other => BoardError::Store(other),
            })?;

        info!(user_id = %user.id, kind = %kind, "identity synced");
        Ok(Some(user))
    }

    /// The caller's user record plus their applications, read through
    /// `Application::applicant`.
    pub fn profile(&self, principal: &Principal) -> Result<ProfileView, BoardError> {
        let user = self
            .store
            .fetch_user(&principal.id)?
            .ok_or(BoardError::NotFound(Entity::User))?;
        let applications = self.applications_of(principal)?;
        Ok(ProfileView::new(user, applications))
    }

    pub fn update_profile(
        &self,
        principal: &Principal,
        update: ProfileUpdate,
    ) -> Result<User, BoardError> {
        let mut user = self
            .store
            .fetch_user(&principal.id)?
            .ok_or(BoardError::NotFound(Entity::User))?;

        keep_unless_blank(&mut user.name, update.name);
        keep_unless_blank(&mut user.phone, update.phone);
        keep_unless_blank(&mut user.location, update.location);
        keep_unless_blank(&mut user.experience, update.experience);
        keep_unless_blank(&mut user.education, update.education);
        keep_unless_blank(&mut user.resume, update.resume);
        if let Some(skills) = update.skills {
            user.skills = skills
                .into_iter()
                .map(|skill| skill.trim().to_string())
                .filter(|skill| !skill.is_empty())
                .collect();
        }
        user.updated_at = self.now();

        let user = self.store.save_user(user).map_err(vanished(Entity::User))?;
        info!(user_id = %user.id, "profile updated");
        Ok(user)
    }

    pub fn user_by_external_id(&self, external_id: &str) -> Result<User, BoardError> {
        self.store
            .fetch_user_by_external_id(external_id)?
            .ok_or(BoardError::NotFound(Entity::User))
    }

    pub fn assign_role(
        &self,
        principal: &Principal,
        target: &UserId,
        assignment: RoleAssignment,
    ) -> Result<User, BoardError> {
        authz::can_assign_role(principal)?;
        let mut user = self
            .store
            .fetch_user(target)?
            .ok_or(BoardError::NotFound(Entity::User))?;

        user.role = assignment.role;
        user.updated_at = self.now();
        let user = self.store.save_user(user).map_err(vanished(Entity::User))?;
        info!(
            user_id = %user.id,
            role = user.role.label(),
            assigned_by = %principal.id,
            "role assigned"
        );
        Ok(user)
    }
}
