//! Account operations: creation, login, admin management.
//!
//! Passwords are stored as `salt$base64(sha256(salt || password))`, never
//! as plain text; comparison goes through [`verify_password`] only.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
    EngineError, NewUserCmd, ResultEngine, Session, roles, users, users::is_valid_dpi,
};

use super::{Engine, normalize_required_text, with_tx};

/// One row of the admin user listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub dpi: String,
    pub name: String,
    pub email: String,
    pub role_name: String,
    pub active: bool,
}

impl Engine {
    /// Creates an account after validating the DPI, the role, and the
    /// uniqueness of DPI and email.
    pub async fn create_user(&self, cmd: NewUserCmd) -> ResultEngine<()> {
        if !is_valid_dpi(&cmd.dpi) {
            return Err(EngineError::InvalidInput(
                "DPI must be exactly 13 digits".to_string(),
            ));
        }
        let name = normalize_required_text(&cmd.name, "name")?;
        let email = normalize_required_text(&cmd.email, "email")?;
        if cmd.password.is_empty() {
            return Err(EngineError::InvalidInput(
                "password must not be empty".to_string(),
            ));
        }

        with_tx!(self, |tx| {
            if roles::Entity::find_by_id(cmd.role_id)
                .one(&tx)
                .await?
                .is_none()
            {
                return Err(EngineError::KeyNotFound(format!("role {}", cmd.role_id)));
            }
            if users::Entity::find_by_id(cmd.dpi.clone())
                .one(&tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(cmd.dpi.clone()));
            }
            if users::Entity::find()
                .filter(users::Column::Email.eq(email.clone()))
                .one(&tx)
                .await?
                .is_some()
            {
                return Err(EngineError::ExistingKey(email.clone()));
            }

            let user = users::ActiveModel {
                dpi: ActiveValue::Set(cmd.dpi.clone()),
                name: ActiveValue::Set(name.clone()),
                email: ActiveValue::Set(email.clone()),
                password: ActiveValue::Set(hash_password(&cmd.password)),
                role_id: ActiveValue::Set(cmd.role_id),
                active: ActiveValue::Set(true),
            };
            users::Entity::insert(user).exec(&tx).await?;
            Ok(())
        })
    }

    /// Verifies credentials and builds the session context.
    ///
    /// Unknown DPI, wrong password, and an inactive account all collapse
    /// into [`EngineError::InvalidCredentials`]; a caller learns nothing
    /// about which check failed.
    pub async fn login(&self, dpi: &str, password: &str) -> ResultEngine<Session> {
        let Some(user) = users::Entity::find_by_id(dpi.to_string())
            .one(&self.database)
            .await?
        else {
            return Err(EngineError::InvalidCredentials);
        };
        if !user.active || !verify_password(password, &user.password) {
            return Err(EngineError::InvalidCredentials);
        }
        let role = self.role(user.role_id).await?;
        Ok(Session {
            user_id: user.dpi,
            name: user.name,
            role,
        })
    }

    /// Lists every account with its role name, ordered by user name.
    pub async fn list_users(&self) -> ResultEngine<Vec<UserSummary>> {
        let rows = users::Entity::find()
            .find_also_related(roles::Entity)
            .order_by_asc(users::Column::Name)
            .all(&self.database)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(user, role)| UserSummary {
                dpi: user.dpi,
                name: user.name,
                email: user.email,
                role_name: role.map(|r| r.name).unwrap_or_default(),
                active: user.active,
            })
            .collect())
    }

    /// Flips the active flag; returns the user's name and the new state.
    pub async fn toggle_user_active(&self, dpi: &str) -> ResultEngine<(String, bool)> {
        let user = users::Entity::find_by_id(dpi.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(dpi.to_string()))?;
        let name = user.name.clone();
        let now_active = !user.active;
        let mut model: users::ActiveModel = user.into();
        model.active = ActiveValue::Set(now_active);
        model.update(&self.database).await?;
        Ok((name, now_active))
    }

    /// Moves a user to another role.
    ///
    /// Quota rows for days already in progress keep the limit they were
    /// created with; the new role's limit applies from the next new day.
    pub async fn change_user_role(&self, dpi: &str, role_id: i32) -> ResultEngine<()> {
        with_tx!(self, |tx| {
            if roles::Entity::find_by_id(role_id)
                .one(&tx)
                .await?
                .is_none()
            {
                return Err(EngineError::KeyNotFound(format!("role {role_id}")));
            }
            let user = users::Entity::find_by_id(dpi.to_string())
                .one(&tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound(dpi.to_string()))?;
            let mut model: users::ActiveModel = user.into();
            model.role_id = ActiveValue::Set(role_id);
            model.update(&tx).await?;
            Ok(())
        })
    }
}

fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = Sha256::digest(format!("{salt}{password}").as_bytes());
    format!("{salt}${}", BASE64.encode(digest))
}

fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, hash)) = stored.split_once('$') else {
        return false;
    };
    let digest = Sha256::digest(format!("{salt}{password}").as_bytes());
    BASE64.encode(digest) == hash
}

#[cfg(test)]
mod tests {
    use super::{hash_password, verify_password};

    #[test]
    fn hash_and_verify_round_trip() {
        let stored = hash_password("s3cret");
        assert!(verify_password("s3cret", &stored));
        assert!(!verify_password("S3cret", &stored));
    }

    #[test]
    fn hashes_are_salted() {
        assert_ne!(hash_password("same"), hash_password("same"));
    }

    #[test]
    fn malformed_stored_value_never_verifies() {
        assert!(!verify_password("anything", "not-a-hash"));
        assert!(!verify_password("anything", ""));
    }
}
