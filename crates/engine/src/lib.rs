//! Core engine for the permission-gated calculator.
//!
//! Every calculation goes through a single pipeline: permission check,
//! daily-quota check, expression evaluation, quota increment, history
//! record. The engine owns the database-backed stores behind those steps
//! (roles, permissions, daily limits, operation history, user accounts)
//! and exposes them through [`Engine`] methods; the expression evaluator
//! itself is a pure function in [`expr`].
//!
//! Policy refusals (missing permission, exhausted quota) and invalid
//! expressions are normal outcomes, returned as [`OperationOutcome`].
//! Only infrastructure failures surface as [`EngineError`].

pub use commands::NewUserCmd;
pub use daily_limits::QuotaStatus;
pub use error::EngineError;
pub use expr::{ExprError, OperationKind};
pub use history::{HistoryEntry, OperationStatus};
pub use ops::{Engine, EngineBuilder, OperationOutcome, Refusal, UserSummary};
pub use permissions::Permission;
pub use roles::Role;
pub use session::Session;
pub use users::is_valid_dpi;

mod commands;
mod daily_limits;
mod error;
pub mod expr;
mod history;
mod ops;
mod permissions;
mod role_permissions;
mod roles;
mod session;
mod users;

type ResultEngine<T> = Result<T, EngineError>;
