use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{Engine, NewUserCmd};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "calculadora_admin")]
#[command(about = "Admin utilities for the calculator (bootstrap users/roles)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./calculadora.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Role(Role),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
    List,
    Toggle(UserToggleArgs),
    SetRole(UserSetRoleArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    /// 13-digit national identity number.
    #[arg(long)]
    dpi: String,
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value_t = 1)]
    role_id: i32,
}

#[derive(Args, Debug)]
struct UserToggleArgs {
    #[arg(long)]
    dpi: String,
}

#[derive(Args, Debug)]
struct UserSetRoleArgs {
    #[arg(long)]
    dpi: String,
    #[arg(long)]
    role_id: i32,
}

#[derive(Args, Debug)]
struct Role {
    #[command(subcommand)]
    command: RoleCommand,
}

#[derive(Subcommand, Debug)]
enum RoleCommand {
    List,
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> Result<Self, Box<dyn Error + Send + Sync>> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn prompt_password(prompt: &str) -> Result<String, Box<dyn Error + Send + Sync>> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_password_twice() -> Result<String, Box<dyn Error + Send + Sync>> {
    let mut out = std::io::stderr();
    for _ in 0..3 {
        let p1 = prompt_password("Password: ")?;
        if p1.is_empty() {
            execute!(
                out,
                cursor::MoveToColumn(0),
                terminal::Clear(ClearType::CurrentLine),
                Print("Password must not be empty.\r\n")
            )?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }

        execute!(
            out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print("Passwords do not match. Try again.\r\n")
        )?;
    }

    Err("too many attempts".into())
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            if !engine::is_valid_dpi(&args.dpi) {
                eprintln!("invalid DPI: {}", args.dpi);
                std::process::exit(2);
            }

            let password = prompt_password_twice()?;
            engine
                .create_user(NewUserCmd::new(
                    &args.dpi, &args.name, &args.email, &password, args.role_id,
                ))
                .await?;
            println!("created user: {} ({})", args.name, args.dpi);
        }
        Command::User(User {
            command: UserCommand::List,
        }) => {
            for user in engine.list_users().await? {
                let state = if user.active { "active" } else { "inactive" };
                println!(
                    "{} {} <{}> - {} [{state}]",
                    user.dpi, user.name, user.email, user.role_name
                );
            }
        }
        Command::User(User {
            command: UserCommand::Toggle(args),
        }) => {
            let (name, active) = engine.toggle_user_active(&args.dpi).await?;
            let state = if active { "active" } else { "inactive" };
            println!("{name} is now {state}");
        }
        Command::User(User {
            command: UserCommand::SetRole(args),
        }) => {
            engine.change_user_role(&args.dpi, args.role_id).await?;
            println!("updated role for {}", args.dpi);
        }
        Command::Role(Role {
            command: RoleCommand::List,
        }) => {
            for role in engine.roles().await? {
                println!(
                    "{}. {} ({} operations/day)",
                    role.id, role.name, role.daily_limit
                );
            }
        }
    }

    Ok(())
}
