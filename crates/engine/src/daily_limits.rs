//! Per-user, per-day operation counters.
//!
//! One row exists per `(user_id, date)`, created lazily on the first quota
//! check of the day with `limit_max` copied from the role at that moment.
//! The limit is frozen per row: a later role change does not retroactively
//! affect a day already in progress. Rows are never deleted; a new calendar
//! date simply gets a new row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "daily_limits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub date: Date,
    pub performed: i32,
    pub limit_max: i32,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Dpi"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Result of a quota check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub used: i32,
    pub limit: i32,
}

impl QuotaStatus {
    pub fn allowed(self) -> bool {
        self.used < self.limit
    }

    pub fn remaining(self) -> i32 {
        (self.limit - self.used).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::QuotaStatus;

    #[test]
    fn allowed_below_the_limit_only() {
        assert!(QuotaStatus { used: 0, limit: 10 }.allowed());
        assert!(QuotaStatus { used: 9, limit: 10 }.allowed());
        assert!(!QuotaStatus { used: 10, limit: 10 }.allowed());
    }

    #[test]
    fn remaining_never_goes_negative() {
        assert_eq!(QuotaStatus { used: 3, limit: 10 }.remaining(), 7);
        assert_eq!(QuotaStatus { used: 10, limit: 10 }.remaining(), 0);
    }
}
