//! Initial schema migration - creates all tables from scratch.
//!
//! It creates the complete schema for the calculator:
//!
//! - `roles`: permission bundles with a daily operation limit
//! - `permissions`: the closed capability vocabulary
//! - `role_permissions`: grants per role
//! - `users`: accounts keyed by DPI
//! - `daily_limits`: per-user, per-day operation counters
//! - `operation_history`: append-only audit trail of evaluations
//!
//! It also seeds the three roles and the permission matrix the console
//! application expects.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Roles {
    Table,
    Id,
    Name,
    DailyLimit,
}

#[derive(Iden)]
enum Permissions {
    Table,
    Id,
    Name,
}

#[derive(Iden)]
enum RolePermissions {
    Table,
    RoleId,
    PermissionId,
}

#[derive(Iden)]
enum Users {
    Table,
    Dpi,
    Name,
    Email,
    Password,
    RoleId,
    Active,
}

#[derive(Iden)]
enum DailyLimits {
    Table,
    UserId,
    Date,
    Performed,
    LimitMax,
    UpdatedAt,
}

#[derive(Iden)]
enum OperationHistory {
    Table,
    Id,
    UserId,
    Kind,
    Expression,
    ProcessedExpression,
    Result,
    Status,
    ErrorMessage,
    DurationMs,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Roles
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Roles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Roles::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Roles::Name).string().not_null())
                    .col(ColumnDef::new(Roles::DailyLimit).integer().not_null())
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Permissions
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Permissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Permissions::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Permissions::Name)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Role grants
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(RolePermissions::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(RolePermissions::RoleId).integer().not_null())
                    .col(
                        ColumnDef::new(RolePermissions::PermissionId)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(RolePermissions::RoleId)
                            .col(RolePermissions::PermissionId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-role_permissions-role_id")
                            .from(RolePermissions::Table, RolePermissions::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-role_permissions-permission_id")
                            .from(RolePermissions::Table, RolePermissions::PermissionId)
                            .to(Permissions::Table, Permissions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Users
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Dpi)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Name).string().not_null())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Users::Password).string().not_null())
                    .col(ColumnDef::new(Users::RoleId).integer().not_null())
                    .col(
                        ColumnDef::new(Users::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-users-role_id")
                            .from(Users::Table, Users::RoleId)
                            .to(Roles::Table, Roles::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 5. Daily limits
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(DailyLimits::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(DailyLimits::UserId).string().not_null())
                    .col(ColumnDef::new(DailyLimits::Date).date().not_null())
                    .col(ColumnDef::new(DailyLimits::Performed).integer().not_null())
                    .col(ColumnDef::new(DailyLimits::LimitMax).integer().not_null())
                    .col(
                        ColumnDef::new(DailyLimits::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(DailyLimits::UserId)
                            .col(DailyLimits::Date),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-daily_limits-user_id")
                            .from(DailyLimits::Table, DailyLimits::UserId)
                            .to(Users::Table, Users::Dpi)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 6. Operation history
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(OperationHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OperationHistory::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OperationHistory::UserId).string().not_null())
                    .col(ColumnDef::new(OperationHistory::Kind).string().not_null())
                    .col(
                        ColumnDef::new(OperationHistory::Expression)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OperationHistory::ProcessedExpression)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(OperationHistory::Result).string())
                    .col(ColumnDef::new(OperationHistory::Status).string().not_null())
                    .col(ColumnDef::new(OperationHistory::ErrorMessage).string())
                    .col(
                        ColumnDef::new(OperationHistory::DurationMs)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OperationHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-operation_history-user_id")
                            .from(OperationHistory::Table, OperationHistory::UserId)
                            .to(Users::Table, Users::Dpi)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-operation_history-user_id")
                    .table(OperationHistory::Table)
                    .col(OperationHistory::UserId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 7. Seed data: roles and the permission matrix
        // ───────────────────────────────────────────────────────────────────
        manager
            .exec_stmt(
                Query::insert()
                    .into_table(Roles::Table)
                    .columns([Roles::Id, Roles::Name, Roles::DailyLimit])
                    .values_panic([1.into(), "Usuario Básico".into(), 10.into()])
                    .values_panic([2.into(), "Usuario Premium".into(), 100.into()])
                    .values_panic([3.into(), "Administrador".into(), 1000.into()])
                    .to_owned(),
            )
            .await?;

        manager
            .exec_stmt(
                Query::insert()
                    .into_table(Permissions::Table)
                    .columns([Permissions::Id, Permissions::Name])
                    .values_panic([1.into(), "calcular_matematicas".into()])
                    .values_panic([2.into(), "calcular_booleanas".into()])
                    .values_panic([3.into(), "ver_historial".into()])
                    .values_panic([4.into(), "ver_historial_todos".into()])
                    .values_panic([5.into(), "gestionar_usuarios".into()])
                    .to_owned(),
            )
            .await?;

        // Basic: math and own history. Premium: adds boolean. Admin: all.
        let grants: [(i32, i32); 10] = [
            (1, 1),
            (1, 3),
            (2, 1),
            (2, 2),
            (2, 3),
            (3, 1),
            (3, 2),
            (3, 3),
            (3, 4),
            (3, 5),
        ];
        let mut insert = Query::insert()
            .into_table(RolePermissions::Table)
            .columns([RolePermissions::RoleId, RolePermissions::PermissionId])
            .to_owned();
        for (role_id, permission_id) in grants {
            insert.values_panic([role_id.into(), permission_id.into()]);
        }
        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OperationHistory::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DailyLimits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RolePermissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Permissions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Roles::Table).to_owned())
            .await?;
        Ok(())
    }
}
