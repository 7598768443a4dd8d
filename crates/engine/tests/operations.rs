use chrono::{Duration, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    Engine, EngineError, NewUserCmd, OperationKind, OperationOutcome, OperationStatus, Permission,
    Refusal, Session,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn engine_with_file_db() -> (Engine, DatabaseConnection) {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let path = root.join(format!("engine_{}.db", Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

async fn session_with_role(engine: &Engine, role_id: i32) -> Session {
    engine
        .create_user(NewUserCmd::new(
            "1234567890123",
            "Alice",
            "alice@example.com",
            "password",
            role_id,
        ))
        .await
        .unwrap();
    engine.login("1234567890123", "password").await.unwrap()
}

#[tokio::test]
async fn successful_math_operation_completes_and_consumes_quota() {
    let (engine, _db) = engine_with_db().await;
    let session = session_with_role(&engine, 1).await;

    let outcome = engine
        .perform_operation(&session, OperationKind::Math, "3 SUMA 4 MULTIPLICA 2")
        .await
        .unwrap();

    match outcome {
        OperationOutcome::Completed {
            result, remaining, ..
        } => {
            assert_eq!(result, "11");
            assert_eq!(remaining, 9);
        }
        other => panic!("expected Completed, got {other:?}"),
    }

    let today = Utc::now().date_naive();
    let quota = engine
        .check_quota(&session.user_id, &session.role, today)
        .await
        .unwrap();
    assert_eq!(quota.used, 1);
    assert_eq!(quota.limit, 10);

    let history = engine.history_for_user(&session.user_id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, OperationStatus::Success);
    assert_eq!(history[0].processed_expression, "3 + 4 * 2");
    assert_eq!(history[0].result.as_deref(), Some("11"));
}

#[tokio::test]
async fn boolean_operation_respects_precedence() {
    let (engine, _db) = engine_with_db().await;
    let session = session_with_role(&engine, 2).await;

    let outcome = engine
        .perform_operation(&session, OperationKind::Boolean, "true OR false AND true")
        .await
        .unwrap();

    match outcome {
        OperationOutcome::Completed { result, .. } => assert_eq!(result, "true"),
        other => panic!("expected Completed, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_permission_is_refused_and_recorded_without_quota_use() {
    let (engine, _db) = engine_with_db().await;
    // Role 1 (basic) holds math but not boolean.
    let session = session_with_role(&engine, 1).await;

    let outcome = engine
        .perform_operation(&session, OperationKind::Boolean, "true AND false")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        OperationOutcome::Refused(Refusal::PermissionDenied {
            permission: Permission::EvaluateBoolean
        })
    );

    let today = Utc::now().date_naive();
    let quota = engine
        .check_quota(&session.user_id, &session.role, today)
        .await
        .unwrap();
    assert_eq!(quota.used, 0);

    let history = engine.history_for_user(&session.user_id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, OperationStatus::Error);
    assert!(history[0].result.is_none());
}

#[tokio::test]
async fn evaluation_error_is_recorded_and_does_not_consume_quota() {
    let (engine, _db) = engine_with_db().await;
    let session = session_with_role(&engine, 1).await;

    let outcome = engine
        .perform_operation(&session, OperationKind::Math, "5 DIVIDE 0")
        .await
        .unwrap();
    match outcome {
        OperationOutcome::Invalid { error, .. } => {
            assert_eq!(error, engine::ExprError::DivisionByZero);
        }
        other => panic!("expected Invalid, got {other:?}"),
    }

    let today = Utc::now().date_naive();
    let quota = engine
        .check_quota(&session.user_id, &session.role, today)
        .await
        .unwrap();
    assert_eq!(quota.used, 0);

    let history = engine.history_for_user(&session.user_id, 10).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, OperationStatus::Error);
    assert_eq!(history[0].error_message.as_deref(), Some("division by zero"));
}

#[tokio::test]
async fn quota_exhaustion_refuses_the_next_operation() {
    let (engine, _db) = engine_with_db().await;
    let session = session_with_role(&engine, 1).await;
    let today = Utc::now().date_naive();

    for i in 0..10 {
        let outcome = engine
            .perform_operation(&session, OperationKind::Math, "1 SUMA 1")
            .await
            .unwrap();
        match outcome {
            OperationOutcome::Completed { remaining, .. } => assert_eq!(remaining, 9 - i),
            other => panic!("operation {i} should complete, got {other:?}"),
        }
    }

    let outcome = engine
        .perform_operation(&session, OperationKind::Math, "1 SUMA 1")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        OperationOutcome::Refused(Refusal::QuotaExceeded {
            used: 10,
            limit: 10
        })
    );

    let quota = engine
        .check_quota(&session.user_id, &session.role, today)
        .await
        .unwrap();
    assert_eq!(quota.used, 10);

    let history = engine.history_for_user(&session.user_id, 20).await.unwrap();
    assert_eq!(history.len(), 11);
}

#[tokio::test]
async fn quota_days_are_independent() {
    let (engine, _db) = engine_with_db().await;
    let session = session_with_role(&engine, 1).await;
    let today = Utc::now().date_naive();
    let yesterday = today - Duration::days(1);

    let quota = engine
        .check_quota(&session.user_id, &session.role, yesterday)
        .await
        .unwrap();
    assert_eq!(quota.used, 0);

    for _ in 0..10 {
        assert!(
            engine
                .try_increment_quota(&session.user_id, yesterday)
                .await
                .unwrap()
        );
    }
    assert!(
        !engine
            .try_increment_quota(&session.user_id, yesterday)
            .await
            .unwrap()
    );

    let quota = engine
        .check_quota(&session.user_id, &session.role, today)
        .await
        .unwrap();
    assert_eq!(quota.used, 0);
    assert!(quota.allowed());
}

#[tokio::test]
async fn increment_without_a_daily_record_takes_no_slot() {
    let (engine, _db) = engine_with_db().await;
    let session = session_with_role(&engine, 1).await;
    let today = Utc::now().date_naive();

    assert!(
        !engine
            .try_increment_quota(&session.user_id, today)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn store_failure_surfaces_as_database_error_not_refusal() {
    let (engine, db) = engine_with_db().await;
    let session = session_with_role(&engine, 1).await;

    let backend = db.get_database_backend();
    db.execute(Statement::from_string(
        backend,
        "DROP TABLE role_permissions",
    ))
    .await
    .unwrap();

    let err = engine
        .perform_operation(&session, OperationKind::Math, "1 SUMA 1")
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));
}

#[tokio::test]
async fn history_all_attaches_user_names() {
    let (engine, _db) = engine_with_db().await;
    let alice = session_with_role(&engine, 1).await;
    engine
        .create_user(NewUserCmd::new(
            "9876543210987",
            "Bob",
            "bob@example.com",
            "hunter2",
            2,
        ))
        .await
        .unwrap();
    let bob = engine.login("9876543210987", "hunter2").await.unwrap();

    engine
        .perform_operation(&alice, OperationKind::Math, "1 SUMA 1")
        .await
        .unwrap();
    engine
        .perform_operation(&bob, OperationKind::Boolean, "NOT false")
        .await
        .unwrap();

    let all = engine.history_all(20).await.unwrap();
    assert_eq!(all.len(), 2);
    let names: Vec<&str> = all.iter().map(|(name, _)| name.as_str()).collect();
    assert!(names.contains(&"Alice"));
    assert!(names.contains(&"Bob"));
}

#[tokio::test]
async fn seeded_role_grants_match_the_permission_matrix() {
    let (engine, _db) = engine_with_db().await;

    assert!(engine.has_permission(1, Permission::EvaluateMath).await.unwrap());
    assert!(!engine.has_permission(1, Permission::EvaluateBoolean).await.unwrap());
    assert!(!engine.has_permission(1, Permission::ManageUsers).await.unwrap());

    assert!(engine.has_permission(2, Permission::EvaluateBoolean).await.unwrap());
    assert!(!engine.has_permission(2, Permission::ViewAllHistory).await.unwrap());

    assert!(engine.has_permission(3, Permission::ViewAllHistory).await.unwrap());
    assert!(engine.has_permission(3, Permission::ManageUsers).await.unwrap());
}

#[tokio::test]
async fn concurrent_first_checks_of_the_day_share_one_row() {
    let (engine, _db) = engine_with_file_db().await;
    let session = session_with_role(&engine, 1).await;
    let today = Utc::now().date_naive();

    let (a, b) = tokio::join!(
        engine.check_quota(&session.user_id, &session.role, today),
        engine.check_quota(&session.user_id, &session.role, today),
    );
    let a = a.unwrap();
    let b = b.unwrap();
    assert_eq!(a.used, 0);
    assert_eq!(b.used, 0);
    assert_eq!(a.limit, 10);
    assert_eq!(b.limit, 10);
}

#[tokio::test]
async fn reported_remaining_reflects_concurrent_consumption() {
    let (engine, _db) = engine_with_file_db().await;
    let session = session_with_role(&engine, 1).await;
    let today = Utc::now().date_naive();

    engine
        .check_quota(&session.user_id, &session.role, today)
        .await
        .unwrap();
    for _ in 0..8 {
        assert!(
            engine
                .try_increment_quota(&session.user_id, today)
                .await
                .unwrap()
        );
    }

    // Slots 9 and 10 are taken concurrently; whichever session reads its
    // counter last must see the day exhausted.
    let (a, b) = tokio::join!(
        engine.perform_operation(&session, OperationKind::Math, "1 SUMA 1"),
        engine.perform_operation(&session, OperationKind::Math, "2 SUMA 2"),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let remaining: Vec<i32> = outcomes
        .iter()
        .filter_map(|o| match o {
            OperationOutcome::Completed { remaining, .. } => Some(*remaining),
            _ => None,
        })
        .collect();
    assert_eq!(remaining.len(), 2);
    assert!(remaining.contains(&0));
}

#[tokio::test]
async fn concurrent_attempts_at_the_last_slot_admit_exactly_one() {
    let (engine, _db) = engine_with_file_db().await;
    let session = session_with_role(&engine, 1).await;
    let today = Utc::now().date_naive();

    engine
        .check_quota(&session.user_id, &session.role, today)
        .await
        .unwrap();
    for _ in 0..9 {
        assert!(
            engine
                .try_increment_quota(&session.user_id, today)
                .await
                .unwrap()
        );
    }

    let (a, b) = tokio::join!(
        engine.perform_operation(&session, OperationKind::Math, "1 SUMA 1"),
        engine.perform_operation(&session, OperationKind::Math, "2 SUMA 2"),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let completed = outcomes
        .iter()
        .filter(|o| matches!(o, OperationOutcome::Completed { .. }))
        .count();
    let refused = outcomes
        .iter()
        .filter(|o| matches!(o, OperationOutcome::Refused(Refusal::QuotaExceeded { .. })))
        .count();
    assert_eq!(completed, 1);
    assert_eq!(refused, 1);

    let quota = engine
        .check_quota(&session.user_id, &session.role, today)
        .await
        .unwrap();
    assert_eq!(quota.used, quota.limit);
}
