//! Operation history: the append-only audit trail.
//!
//! Exactly one record is appended per gateway invocation, success or
//! failure. Failed evaluations and policy refusals are history too, not
//! discarded.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, expr::OperationKind};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "operation_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub kind: String,
    pub expression: String,
    pub processed_expression: String,
    pub result: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub duration_ms: i64,
    pub created_at: DateTimeUtc,
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

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Success,
    Error,
}

impl OperationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "exitosa",
            Self::Error => "error",
        }
    }
}

impl TryFrom<&str> for OperationStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, EngineError> {
        match value {
            "exitosa" => Ok(Self::Success),
            "error" => Ok(Self::Error),
            other => Err(EngineError::InvalidInput(format!(
                "invalid operation status: {other}"
            ))),
        }
    }
}

/// A history record about to be appended.
#[derive(Clone, Debug)]
pub struct OperationRecord {
    pub user_id: String,
    pub kind: OperationKind,
    pub expression: String,
    pub processed_expression: String,
    pub result: Option<String>,
    pub status: OperationStatus,
    pub error_message: Option<String>,
    pub duration_ms: i64,
}

impl OperationRecord {
    pub fn success(
        user_id: &str,
        kind: OperationKind,
        expression: &str,
        processed: &str,
        result: &str,
        duration_ms: i64,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind,
            expression: expression.to_string(),
            processed_expression: processed.to_string(),
            result: Some(result.to_string()),
            status: OperationStatus::Success,
            error_message: None,
            duration_ms,
        }
    }

    pub fn failure(
        user_id: &str,
        kind: OperationKind,
        expression: &str,
        processed: &str,
        message: impl Into<String>,
        duration_ms: i64,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            kind,
            expression: expression.to_string(),
            processed_expression: processed.to_string(),
            result: None,
            status: OperationStatus::Error,
            error_message: Some(message.into()),
            duration_ms,
        }
    }
}

impl From<&OperationRecord> for ActiveModel {
    fn from(record: &OperationRecord) -> Self {
        Self {
            id: ActiveValue::Set(Uuid::new_v4().to_string()),
            user_id: ActiveValue::Set(record.user_id.clone()),
            kind: ActiveValue::Set(record.kind.as_str().to_string()),
            expression: ActiveValue::Set(record.expression.clone()),
            processed_expression: ActiveValue::Set(record.processed_expression.clone()),
            result: ActiveValue::Set(record.result.clone()),
            status: ActiveValue::Set(record.status.as_str().to_string()),
            error_message: ActiveValue::Set(record.error_message.clone()),
            duration_ms: ActiveValue::Set(record.duration_ms),
            created_at: ActiveValue::Set(Utc::now()),
        }
    }
}

/// A history record as returned by the listing queries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: OperationKind,
    pub expression: String,
    pub processed_expression: String,
    pub result: Option<String>,
    pub status: OperationStatus,
    pub error_message: Option<String>,
    pub duration_ms: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<Model> for HistoryEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, EngineError> {
        Ok(Self {
            kind: OperationKind::try_from(model.kind.as_str())?,
            expression: model.expression,
            processed_expression: model.processed_expression,
            result: model.result,
            status: OperationStatus::try_from(model.status.as_str())?,
            error_message: model.error_message,
            duration_ms: model.duration_ms,
            created_at: model.created_at,
        })
    }
}
