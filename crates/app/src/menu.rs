//! Interactive menus. Each menu is a loop that reads an option, calls into
//! the engine and prints the outcome; store failures bubble up and abort
//! the program.

use std::error::Error;

use engine::{
    Engine, EngineError, NewUserCmd, OperationKind, OperationOutcome, Permission, Refusal, Session,
};

use crate::console;

type MenuResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

/// Prints recoverable engine errors and rethrows store failures.
fn report(err: EngineError) -> MenuResult<()> {
    match err {
        EngineError::Database(_) => Err(err.into()),
        other => {
            println!("{other}");
            Ok(())
        }
    }
}

pub async fn main_menu(engine: &Engine) -> MenuResult<()> {
    loop {
        println!();
        println!("=== Calculadora ===");
        println!("1. Create user");
        println!("2. Log in");
        println!("3. Exit");

        match console::prompt("Option: ")?.as_str() {
            "1" => create_user(engine).await?,
            "2" => {
                if let Some(session) = login(engine).await? {
                    user_menu(engine, &session).await?;
                }
            }
            "3" => return Ok(()),
            _ => println!("Unknown option."),
        }
    }
}

async fn create_user(engine: &Engine) -> MenuResult<()> {
    let dpi = console::prompt("DPI (13 digits): ")?;
    if !engine::is_valid_dpi(&dpi) {
        println!("The DPI must be exactly 13 digits.");
        return Ok(());
    }

    let name = console::prompt("Name: ")?;
    let email = console::prompt("Email: ")?;
    let password = console::prompt_password("Password: ")?;
    if password.is_empty() {
        println!("Password must not be empty.");
        return Ok(());
    }

    println!("Roles:");
    let roles = engine.roles().await?;
    for role in &roles {
        println!("  {}. {} ({} operations/day)", role.id, role.name, role.daily_limit);
    }
    let choice = console::prompt("Role: ")?;
    let Ok(role_id) = choice.parse::<i32>() else {
        println!("Unknown role.");
        return Ok(());
    };

    match engine
        .create_user(NewUserCmd::new(&dpi, &name, &email, &password, role_id))
        .await
    {
        Ok(()) => println!("User created."),
        Err(err) => report(err)?,
    }
    Ok(())
}

async fn login(engine: &Engine) -> MenuResult<Option<Session>> {
    let dpi = console::prompt("DPI: ")?;
    let password = console::prompt_password("Password: ")?;

    match engine.login(&dpi, &password).await {
        Ok(session) => {
            println!("Welcome, {} ({}).", session.name, session.role.name);
            Ok(Some(session))
        }
        Err(err) => {
            report(err)?;
            Ok(None)
        }
    }
}

async fn user_menu(engine: &Engine, session: &Session) -> MenuResult<()> {
    let sees_all_history = engine
        .has_permission(session.role.id, Permission::ViewAllHistory)
        .await?;
    let manages_users = engine
        .has_permission(session.role.id, Permission::ManageUsers)
        .await?;

    loop {
        println!();
        println!("--- {} ---", session.name);
        println!("1. Arithmetic calculation");
        println!("2. Boolean calculation");
        println!("3. My history");
        if sees_all_history {
            println!("4. All history");
        }
        if manages_users {
            println!("5. Manage users");
        }
        println!("0. Log out");

        match console::prompt("Option: ")?.as_str() {
            "1" => run_operation(engine, session, OperationKind::Math).await?,
            "2" => run_operation(engine, session, OperationKind::Boolean).await?,
            "3" => show_own_history(engine, session).await?,
            "4" if sees_all_history => show_all_history(engine).await?,
            "5" if manages_users => manage_users(engine).await?,
            "0" => return Ok(()),
            _ => println!("Unknown option."),
        }
    }
}

async fn run_operation(
    engine: &Engine,
    session: &Session,
    kind: OperationKind,
) -> MenuResult<()> {
    let hint = match kind {
        OperationKind::Math => "e.g. 3 SUMA 4 MULTIPLICA 2",
        OperationKind::Boolean => "e.g. true OR false AND true",
    };
    let raw = console::prompt(&format!("Expression ({hint}): "))?;

    match engine.perform_operation(session, kind, &raw).await? {
        OperationOutcome::Completed { result, remaining, .. } => {
            println!("Result: {result}");
            println!("Operations left today: {remaining}");
        }
        OperationOutcome::Refused(Refusal::PermissionDenied { permission }) => {
            println!("Your role lacks the '{}' permission.", permission.as_str());
        }
        OperationOutcome::Refused(Refusal::QuotaExceeded { used, limit }) => {
            println!("Daily operation limit reached ({used}/{limit}).");
        }
        OperationOutcome::Invalid { error, .. } => {
            println!("Invalid expression: {error}");
        }
    }
    Ok(())
}

async fn show_own_history(engine: &Engine, session: &Session) -> MenuResult<()> {
    let entries = engine.history_for_user(&session.user_id, 10).await?;
    if entries.is_empty() {
        println!("No operations yet.");
        return Ok(());
    }

    for entry in entries {
        print_entry(None, &entry);
    }
    Ok(())
}

async fn show_all_history(engine: &Engine) -> MenuResult<()> {
    let entries = engine.history_all(20).await?;
    if entries.is_empty() {
        println!("No operations yet.");
        return Ok(());
    }

    for (name, entry) in entries {
        print_entry(Some(&name), &entry);
    }
    Ok(())
}

fn print_entry(owner: Option<&str>, entry: &engine::HistoryEntry) {
    let when = entry.created_at.format("%Y-%m-%d %H:%M:%S");
    let outcome = match (&entry.result, &entry.error_message) {
        (Some(result), _) => format!("= {result}"),
        (None, Some(message)) => format!("! {message}"),
        (None, None) => String::new(),
    };
    match owner {
        Some(name) => println!(
            "[{when}] {name}: ({}) {} {outcome}",
            entry.kind.as_str(),
            entry.expression
        ),
        None => println!(
            "[{when}] ({}) {} {outcome}",
            entry.kind.as_str(),
            entry.expression
        ),
    }
}

async fn manage_users(engine: &Engine) -> MenuResult<()> {
    loop {
        println!();
        println!("--- User management ---");
        println!("1. List users");
        println!("2. Activate / deactivate user");
        println!("3. Change user role");
        println!("0. Back");

        match console::prompt("Option: ")?.as_str() {
            "1" => {
                for user in engine.list_users().await? {
                    let state = if user.active { "active" } else { "inactive" };
                    println!(
                        "{} {} <{}> - {} [{state}]",
                        user.dpi, user.name, user.email, user.role_name
                    );
                }
            }
            "2" => {
                let dpi = console::prompt("DPI: ")?;
                match engine.toggle_user_active(&dpi).await {
                    Ok((name, true)) => println!("{name} is now active."),
                    Ok((name, false)) => println!("{name} is now inactive."),
                    Err(err) => report(err)?,
                }
            }
            "3" => {
                let dpi = console::prompt("DPI: ")?;
                let choice = console::prompt("New role id: ")?;
                let Ok(role_id) = choice.parse::<i32>() else {
                    println!("Unknown role.");
                    continue;
                };
                match engine.change_user_role(&dpi, role_id).await {
                    Ok(()) => println!("Role updated; applies from the next login."),
                    Err(err) => report(err)?,
                }
            }
            "0" => return Ok(()),
            _ => println!("Unknown option."),
        }
    }
}
