//! Operation history: best-effort append, ordered listings.

use sea_orm::{QueryFilter, QueryOrder, QuerySelect, prelude::*};

use crate::{
    HistoryEntry, ResultEngine,
    history::{self, OperationRecord},
    users,
};

use super::Engine;

impl Engine {
    /// Appends a history record, best-effort.
    ///
    /// A persistence failure here is logged and suppressed: the result of
    /// the operation that triggered the record never depends on the audit
    /// trail being writable.
    pub(crate) async fn record_operation(&self, record: OperationRecord) {
        if let Err(err) = history::ActiveModel::from(&record)
            .insert(&self.database)
            .await
        {
            tracing::error!(user_id = %record.user_id, "failed to record operation history: {err}");
        }
    }

    /// The user's most recent operations, newest first.
    pub async fn history_for_user(
        &self,
        user_id: &str,
        limit: u64,
    ) -> ResultEngine<Vec<HistoryEntry>> {
        let rows = history::Entity::find()
            .filter(history::Column::UserId.eq(user_id))
            .order_by_desc(history::Column::CreatedAt)
            .limit(limit)
            .all(&self.database)
            .await?;
        rows.into_iter().map(HistoryEntry::try_from).collect()
    }

    /// The most recent operations across all users, newest first, with the
    /// owning user's name attached.
    pub async fn history_all(&self, limit: u64) -> ResultEngine<Vec<(String, HistoryEntry)>> {
        let rows = history::Entity::find()
            .find_also_related(users::Entity)
            .order_by_desc(history::Column::CreatedAt)
            .limit(limit)
            .all(&self.database)
            .await?;
        rows.into_iter()
            .map(|(model, user)| {
                let name = user.map_or_else(|| model.user_id.clone(), |u| u.name);
                Ok((name, HistoryEntry::try_from(model)?))
            })
            .collect()
    }
}
