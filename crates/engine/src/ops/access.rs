//! Role and permission lookups.

use sea_orm::{QueryFilter, QueryOrder, prelude::*};

use crate::{EngineError, Permission, ResultEngine, Role, permissions, role_permissions, roles};

use super::Engine;

impl Engine {
    /// Returns whether `role_id` holds `permission`.
    ///
    /// A missing grant is a normal `false`; only store failures become
    /// errors, so a caller can never mistake an outage for a denial.
    pub async fn has_permission(&self, role_id: i32, permission: Permission) -> ResultEngine<bool> {
        let hit = role_permissions::Entity::find()
            .filter(role_permissions::Column::RoleId.eq(role_id))
            .inner_join(permissions::Entity)
            .filter(permissions::Column::Name.eq(permission.as_str()))
            .one(&self.database)
            .await?;
        Ok(hit.is_some())
    }

    /// Loads a role by id.
    pub async fn role(&self, role_id: i32) -> ResultEngine<Role> {
        roles::Entity::find_by_id(role_id)
            .one(&self.database)
            .await?
            .map(Role::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("role {role_id}")))
    }

    /// Lists every role, ordered by id.
    pub async fn roles(&self) -> ResultEngine<Vec<Role>> {
        let rows = roles::Entity::find()
            .order_by_asc(roles::Column::Id)
            .all(&self.database)
            .await?;
        Ok(rows.into_iter().map(Role::from).collect())
    }
}
