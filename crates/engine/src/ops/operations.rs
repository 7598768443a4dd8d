//! The operation gateway.
//!
//! Every calculation runs the same sequence: permission check, quota
//! check, evaluation, quota increment, history record. Any step can
//! short-circuit the rest, but a history record is written on every
//! policy or evaluation outcome, and the quota is incremented exactly
//! once per successful evaluation.

use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    ExprError, Permission, ResultEngine, Session,
    expr::{self, OperationKind},
    history::OperationRecord,
};

use super::Engine;

/// Policy refusals. These are normal outcomes, not error paths: the
/// gateway refused to run the operation, and nothing was mutated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Refusal {
    PermissionDenied { permission: Permission },
    QuotaExceeded { used: i32, limit: i32 },
}

/// The structured result of one gateway invocation.
///
/// Infrastructure failures are *not* represented here; they surface as
/// [`EngineError`](crate::EngineError) so a refusal can never mask an
/// outage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationOutcome {
    /// Evaluation succeeded; the quota slot was taken and the result
    /// recorded. `remaining` is the quota left after this operation.
    Completed {
        result: String,
        remaining: i32,
        duration_ms: i64,
    },
    /// The operation was refused before evaluation.
    Refused(Refusal),
    /// The expression itself was invalid; no quota was consumed.
    Invalid { error: ExprError, duration_ms: i64 },
}

impl Engine {
    /// Runs one gated calculation on behalf of `session`.
    ///
    /// Sequence: permission -> quota -> evaluate -> increment -> record.
    /// Exactly one history record is appended per invocation (success or
    /// failure) and the quota is incremented only after a successful
    /// evaluation. Store failures propagate as `Err` and skip the history
    /// sink, which shares the failing store.
    pub async fn perform_operation(
        &self,
        session: &Session,
        kind: OperationKind,
        raw: &str,
    ) -> ResultEngine<OperationOutcome> {
        let processed = expr::translate(kind, raw);

        let permission = kind.required_permission();
        if !self.has_permission(session.role.id, permission).await? {
            self.record_operation(OperationRecord::failure(
                &session.user_id,
                kind,
                raw,
                &processed,
                format!("permission denied: {}", permission.as_str()),
                0,
            ))
            .await;
            return Ok(OperationOutcome::Refused(Refusal::PermissionDenied {
                permission,
            }));
        }

        let today = Utc::now().date_naive();
        let quota = self
            .check_quota(&session.user_id, &session.role, today)
            .await?;
        if !quota.allowed() {
            self.record_operation(OperationRecord::failure(
                &session.user_id,
                kind,
                raw,
                &processed,
                "daily operation limit reached",
                0,
            ))
            .await;
            return Ok(OperationOutcome::Refused(Refusal::QuotaExceeded {
                used: quota.used,
                limit: quota.limit,
            }));
        }

        let started = Instant::now();
        let evaluated = expr::evaluate(kind, &processed);
        let duration_ms = started.elapsed().as_millis() as i64;

        match evaluated {
            Err(error) => {
                self.record_operation(OperationRecord::failure(
                    &session.user_id,
                    kind,
                    raw,
                    &processed,
                    error.to_string(),
                    duration_ms,
                ))
                .await;
                Ok(OperationOutcome::Invalid { error, duration_ms })
            }
            Ok(result) => {
                // The conditional increment can still lose against a
                // concurrent session that took the last slot after our
                // check; the invariant `performed <= limit` wins over the
                // stale check result.
                if !self.try_increment_quota(&session.user_id, today).await? {
                    self.record_operation(OperationRecord::failure(
                        &session.user_id,
                        kind,
                        raw,
                        &processed,
                        "daily operation limit reached",
                        duration_ms,
                    ))
                    .await;
                    return Ok(OperationOutcome::Refused(Refusal::QuotaExceeded {
                        used: quota.limit,
                        limit: quota.limit,
                    }));
                }

                self.record_operation(OperationRecord::success(
                    &session.user_id,
                    kind,
                    raw,
                    &processed,
                    &result,
                    duration_ms,
                ))
                .await;
                // Read the counter back so `remaining` accounts for any
                // concurrent session that incremented since our check.
                let status = self
                    .check_quota(&session.user_id, &session.role, today)
                    .await?;
                Ok(OperationOutcome::Completed {
                    result,
                    remaining: status.remaining(),
                    duration_ms,
                })
            }
        }
    }
}
