//! Request-scoped access control.
//!
//! The caller's role and permission set are resolved once per request
//! into an [`AccessContext`]; every check afterwards is a pure
//! predicate over the resolved capability set.

use std::collections::HashSet;

use uuid::Uuid;
use vivaria_core::error::{VivariaError, VivariaResult};
use vivaria_core::repository::{RoleRepository, UserRepository};

/// Capability slugs granted through roles. Matches the seeded
/// permission catalog.
pub mod caps {
    pub const MANAGE_USERS: &str = "manage_users";
    pub const VIEW_USERS: &str = "view_users";
    pub const MANAGE_ROLES: &str = "manage_roles";
    pub const MANAGE_ALL_TERRARIUMS: &str = "manage_all_terrariums";
    pub const VIEW_ALL_TERRARIUMS: &str = "view_all_terrariums";
    pub const MANAGE_ALL_ANIMALS: &str = "manage_all_animals";
    pub const MANAGE_SPECIES: &str = "manage_species";
    pub const VIEW_STATISTICS: &str = "view_statistics";
    pub const ACCESS_ADMIN_PANEL: &str = "access_admin_panel";
}

/// An authenticated caller with its resolved permission slugs.
#[derive(Debug, Clone)]
pub struct AccessContext {
    pub user_id: Uuid,
    permissions: HashSet<String>,
}

impl AccessContext {
    /// Resolve caller → role → permission slugs.
    ///
    /// Fails with `PermissionDenied` for inactive users or roles; the
    /// caller identity itself comes from the (external) auth layer.
    pub async fn resolve(
        users: &impl UserRepository,
        roles: &impl RoleRepository,
        user_id: Uuid,
    ) -> VivariaResult<Self> {
        let user = users.get_by_id(user_id).await?;
        if !user.is_active {
            return Err(VivariaError::PermissionDenied {
                reason: "user account is inactive".into(),
            });
        }

        let role = roles.get_by_id(user.role_id).await?;
        if !role.is_active {
            return Err(VivariaError::PermissionDenied {
                reason: "role is inactive".into(),
            });
        }

        let permissions = roles
            .permissions_for_role(role.id)
            .await?
            .into_iter()
            .map(|p| p.slug)
            .collect();

        Ok(Self {
            user_id,
            permissions,
        })
    }

    /// Construct directly from an already-known permission set. Used
    /// by tests and by callers that cache role resolution.
    pub fn with_permissions(user_id: Uuid, permissions: impl IntoIterator<Item = String>) -> Self {
        Self {
            user_id,
            permissions: permissions.into_iter().collect(),
        }
    }

    pub fn can(&self, slug: &str) -> bool {
        self.permissions.contains(slug)
    }

    /// Owner match, or elevated capability bypass.
    pub fn can_access(&self, owner_id: Uuid, elevated: &str) -> bool {
        self.user_id == owner_id || self.can(elevated)
    }

    /// Checked variant of [`Self::can_access`].
    pub fn authorize_owned(&self, owner_id: Uuid, elevated: &str) -> VivariaResult<()> {
        if self.can_access(owner_id, elevated) {
            return Ok(());
        }
        Err(VivariaError::PermissionDenied {
            reason: format!("caller owns neither the resource nor the {elevated} capability"),
        })
    }

    /// Checked variant of [`Self::can`].
    pub fn authorize(&self, slug: &str) -> VivariaResult<()> {
        if self.can(slug) {
            return Ok(());
        }
        Err(VivariaError::PermissionDenied {
            reason: format!("missing required capability: {slug}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_passes_without_capabilities() {
        let owner = Uuid::new_v4();
        let ctx = AccessContext::with_permissions(owner, []);
        assert!(ctx.can_access(owner, caps::MANAGE_ALL_ANIMALS));
    }

    #[test]
    fn stranger_needs_the_elevated_capability() {
        let ctx = AccessContext::with_permissions(Uuid::new_v4(), []);
        assert!(!ctx.can_access(Uuid::new_v4(), caps::MANAGE_ALL_ANIMALS));

        let elevated = AccessContext::with_permissions(
            Uuid::new_v4(),
            [caps::MANAGE_ALL_ANIMALS.to_string()],
        );
        assert!(elevated.can_access(Uuid::new_v4(), caps::MANAGE_ALL_ANIMALS));
    }

    #[test]
    fn authorize_reports_the_missing_capability() {
        let ctx = AccessContext::with_permissions(Uuid::new_v4(), []);
        let err = ctx.authorize(caps::MANAGE_SPECIES).unwrap_err();
        assert!(matches!(err, VivariaError::PermissionDenied { .. }));
    }
}
