use clap::{Parser, Subcommand};
use manip_api::migrator::Migrator;
use sea_orm::{ConnectOptions, Database};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::info;

/// Schema management for the manip database
#[derive(Parser)]
#[command(name = "migration", version)]
struct Cli {
    /// Database URL; falls back to APP__DATABASE_URL
    #[arg(long, env = "APP__DATABASE_URL", default_value = "sqlite://manips.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending migrations (default)
    Up,
    /// Roll back the last `steps` migrations
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Drop every table and reapply all migrations
    Fresh,
    /// Print applied and pending migrations
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();

    let mut options = ConnectOptions::new(cli.database_url);
    options
        .max_connections(1)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let db = Database::connect(options).await?;

    match cli.command.unwrap_or(Command::Up) {
        Command::Up => {
            Migrator::up(&db, None).await?;
            info!("Migrations applied");
        }
        Command::Down { steps } => {
            Migrator::down(&db, Some(steps)).await?;
            info!(steps, "Migrations rolled back");
        }
        Command::Fresh => {
            Migrator::fresh(&db).await?;
            info!("Database recreated");
        }
        Command::Status => Migrator::status(&db).await?,
    }

    Ok(())
}
