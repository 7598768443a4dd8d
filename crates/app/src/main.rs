use migration::{Migrator, MigratorTrait};
use settings::Database;

mod console;
mod menu;
mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "calculadora={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.database).await?;
    let engine = engine::Engine::builder().database(db).build().await?;
    tracing::info!("database ready");

    println!("Calculadora con control de acceso");

    if !identity_gate()? {
        eprintln!("Too many invalid attempts.");
        std::process::exit(1);
    }

    menu::main_menu(&engine).await
}

/// Asks for a well-formed DPI before showing the menus, giving up after
/// three invalid attempts.
fn identity_gate() -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
    for attempts_left in (0..3).rev() {
        let dpi = console::prompt("Enter your DPI (13 digits): ")?;
        if engine::is_valid_dpi(&dpi) {
            return Ok(true);
        }
        println!("Invalid DPI. Attempts remaining: {attempts_left}");
    }
    Ok(false)
}

async fn parse_database(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
