use clap::Subcommand;
use mi_coach_core::users::{SeedRecord, validate_seed};
use serde_json::json;

use crate::util::{connect_db, exit_error, pretty};

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Create the users table by applying pending migrations (requires DATABASE_URL)
    CreateTables,
    /// Drop the users table and migration history (requires DATABASE_URL)
    DropAll {
        /// Confirm the drop (required)
        #[arg(long)]
        confirm: bool,
    },
    /// Insert test users from a seed file (requires DATABASE_URL)
    SeedUsers {
        /// JSON array of {"fields": {"username", "password"}} records
        #[arg(long, default_value = "seed_data.json")]
        file: String,
    },
}

pub async fn run(command: AdminCommands) -> i32 {
    match command {
        AdminCommands::CreateTables => create_tables().await,
        AdminCommands::DropAll { confirm } => drop_all(confirm).await,
        AdminCommands::SeedUsers { file } => seed_users(&file).await,
    }
}

async fn create_tables() -> i32 {
    let pool = connect_db().await;
    if let Err(e) = sqlx::migrate!("../migrations").run(&pool).await {
        exit_error(&format!("Failed to run migrations: {e}"), None);
    }
    tracing::info!("migrations applied");
    println!("{}", pretty(&json!({ "status": "tables_created" })));
    0
}

async fn drop_all(confirm: bool) -> i32 {
    if !confirm {
        exit_error(
            "drop-all removes every user row and the migration history",
            Some("Re-run with --confirm to proceed"),
        );
    }

    let pool = connect_db().await;
    for statement in [
        "DROP TABLE IF EXISTS users",
        "DROP TABLE IF EXISTS _sqlx_migrations",
    ] {
        if let Err(e) = sqlx::query(statement).execute(&pool).await {
            exit_error(&format!("Failed to drop tables: {e}"), None);
        }
    }
    tracing::warn!("all tables dropped");
    println!("{}", pretty(&json!({ "status": "tables_dropped" })));
    0
}

async fn seed_users(path: &str) -> i32 {
    let records = match load_seed_file(path) {
        Ok(records) => records,
        Err(e) => exit_error(
            &e,
            Some("Expected [{\"fields\": {\"username\": \"..\", \"password\": \"..\"}}, ..]"),
        ),
    };
    if let Err(e) = validate_seed(&records) {
        exit_error(&format!("Invalid seed file '{path}': {e}"), None);
    }

    tracing::info!(path, records = records.len(), "seeding users");
    let pool = connect_db().await;
    let mut tx = match pool.begin().await {
        Ok(tx) => tx,
        Err(e) => exit_error(&format!("Failed to start transaction: {e}"), None),
    };

    for record in &records {
        if let Err(e) = sqlx::query("INSERT INTO users (username, password) VALUES ($1, $2)")
            .bind(&record.fields.username)
            .bind(&record.fields.password)
            .execute(&mut *tx)
            .await
        {
            exit_error(
                &format!(
                    "Failed to insert user '{}': {e}",
                    record.fields.username
                ),
                Some("Nothing was inserted. Existing usernames cannot be seeded twice."),
            );
        }
    }

    if let Err(e) = tx.commit().await {
        exit_error(&format!("Failed to commit seed data: {e}"), None);
    }

    println!("{}", pretty(&json!({ "inserted": records.len() })));
    0
}

fn load_seed_file(path: &str) -> Result<Vec<SeedRecord>, String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read file '{path}': {e}"))?;
    serde_json::from_str(&raw).map_err(|e| format!("Invalid JSON in '{path}': {e}"))
}
