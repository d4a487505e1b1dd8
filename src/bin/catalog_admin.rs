use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use catalog_api::{
    auth::{AuthConfig, AuthService},
    config, db,
};

#[derive(Parser)]
#[command(name = "catalog-admin", about = "Maintenance tasks for the catalog API", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create an account that can obtain API tokens
    CreateUser(CreateUserArgs),
}

#[derive(Args)]
struct CreateUserArgs {
    #[arg(long, help = "Login name, must be unique")]
    username: String,
    #[arg(long, help = "Plain-text password; stored as an argon2 hash")]
    password: String,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Grant the admin role (state changes and /api/admin/ routes)"
    )]
    staff: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config().context("loading configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("connecting to the database")?;

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&pool)
                .await
                .context("running migrations")?;
            println!("Migrations applied");
        }
        Commands::CreateUser(args) => {
            db::run_migrations(&pool)
                .await
                .context("running migrations")?;
            let service = AuthService::new(AuthConfig::from(&cfg), Arc::new(pool));
            let account = service
                .create_user(&args.username, &args.password, args.staff)
                .await
                .with_context(|| format!("failed to create user {}", args.username))?;
            info!(user_id = account.id, "account ready");
            println!(
                "Created user {} (id {}){}",
                account.username,
                account.id,
                if account.is_staff { " with admin role" } else { "" }
            );
        }
    }

    Ok(())
}
