//! Users table (accounts are keyed by DPI).
//!
//! The engine stores quota and history records by `user_id`, which is the
//! user's DPI: a 13-digit national identifier used as the login key.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub dpi: String,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub password: String,
    pub role_id: i32,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::RoleId",
        to = "super::roles::Column::Id"
    )]
    Role,
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Validates the DPI format: exactly 13 ASCII digits.
pub fn is_valid_dpi(dpi: &str) -> bool {
    dpi.len() == 13 && dpi.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::is_valid_dpi;

    #[test]
    fn accepts_thirteen_digits() {
        assert!(is_valid_dpi("1234567890123"));
    }

    #[test]
    fn rejects_wrong_length_and_non_digits() {
        assert!(!is_valid_dpi("123456789012"));
        assert!(!is_valid_dpi("12345678901234"));
        assert!(!is_valid_dpi("12345678901a3"));
        assert!(!is_valid_dpi(""));
        assert!(!is_valid_dpi("123456789012 "));
    }
}
