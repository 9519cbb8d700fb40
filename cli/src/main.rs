use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod util;

use commands::admin::AdminCommands;
use commands::chat::ChatArgs;

#[derive(Parser)]
#[command(
    name = "mi-coach",
    version,
    about = "MI Coach CLI: talk to the chat API and bootstrap the user table"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "MI_COACH_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API and database health
    Health,
    /// Send a conversation to POST /v1/chat and print the reply
    Chat(ChatArgs),
    /// Database bootstrapping (requires DATABASE_URL)
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Logs go to stderr so stdout stays machine-readable JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "mi_coach=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Health => commands::health::run(&cli.api_url).await,
        Commands::Chat(args) => commands::chat::run(&cli.api_url, args).await,
        Commands::Admin { command } => commands::admin::run(command).await,
    };

    std::process::exit(code);
}
