//! Daily quota tracking.

use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveValue, QueryFilter,
    prelude::*,
    sea_query::{Expr, OnConflict},
};

use crate::{EngineError, QuotaStatus, ResultEngine, Role, daily_limits};

use super::Engine;

impl Engine {
    /// Reads the day's counter for `(user_id, date)`.
    ///
    /// The row is created on the first check of the day with the limit
    /// frozen from the role at that moment; later role changes do not
    /// affect a day already in progress.
    pub async fn check_quota(
        &self,
        user_id: &str,
        role: &Role,
        date: NaiveDate,
    ) -> ResultEngine<QuotaStatus> {
        if let Some(row) = daily_limits::Entity::find_by_id((user_id.to_string(), date))
            .one(&self.database)
            .await?
        {
            return Ok(QuotaStatus {
                used: row.performed,
                limit: row.limit_max,
            });
        }

        // Concurrent first checks of the day can both miss the read above;
        // the conflict target turns the loser's insert into a no-op so both
        // land on the same row.
        let row = daily_limits::ActiveModel {
            user_id: ActiveValue::Set(user_id.to_string()),
            date: ActiveValue::Set(date),
            performed: ActiveValue::Set(0),
            limit_max: ActiveValue::Set(role.daily_limit),
            updated_at: ActiveValue::Set(Utc::now()),
        };
        daily_limits::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([daily_limits::Column::UserId, daily_limits::Column::Date])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.database)
            .await?;

        let row = daily_limits::Entity::find_by_id((user_id.to_string(), date))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("daily limit for {user_id}")))?;
        Ok(QuotaStatus {
            used: row.performed,
            limit: row.limit_max,
        })
    }

    /// Counts one operation against the day's limit.
    ///
    /// Check and increment are a single conditional UPDATE guarded by
    /// `performed < limit_max`, so the invariant `performed <= limit_max`
    /// holds even when concurrent sessions share the store. Returns whether
    /// a slot was actually taken.
    pub async fn try_increment_quota(&self, user_id: &str, date: NaiveDate) -> ResultEngine<bool> {
        let updated = daily_limits::Entity::update_many()
            .col_expr(
                daily_limits::Column::Performed,
                Expr::col(daily_limits::Column::Performed).add(1),
            )
            .col_expr(daily_limits::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(daily_limits::Column::UserId.eq(user_id))
            .filter(daily_limits::Column::Date.eq(date))
            .filter(
                Expr::col(daily_limits::Column::Performed)
                    .lt(Expr::col(daily_limits::Column::LimitMax)),
            )
            .exec(&self.database)
            .await?;
        Ok(updated.rows_affected == 1)
    }
}
