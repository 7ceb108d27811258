use std::net::SocketAddr;

use clap::{Args, Parser, Subcommand};

use recipe_api::{
    build_app,
    config::{AppConfig, DatabaseConfig},
    db, users, AppState,
};

#[derive(Parser)]
#[command(
    name = "recipe-api",
    about = "Multi-user recipe API",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Used when no subcommand is given.
    #[command(flatten)]
    serve: ServeArgs,
}

#[derive(Args, Clone)]
struct ServeArgs {
    #[arg(long, env = "APP_HOST", default_value = "0.0.0.0")]
    host: String,
    #[arg(long, env = "APP_PORT", default_value_t = 8080)]
    port: u16,
}

#[derive(Subcommand)]
enum Command {
    /// Wait for the database, migrate and serve HTTP (default).
    Serve(ServeArgs),
    /// Block until the database accepts connections.
    WaitForDb,
    /// Create a staff + superuser account.
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long, env = "SUPERUSER_PASSWORD")]
        password: String,
    },
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "recipe_api=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve(cli.serve)) {
        Command::Serve(args) => serve(AppConfig::from_env()?, args).await?,
        Command::WaitForDb => {
            let database = DatabaseConfig::from_env();
            db::wait_for_db(&database.url, &database.wait).await?;
        }
        Command::CreateSuperuser { email, password } => {
            let database = DatabaseConfig::from_env();
            let pool = db::connect(&database.url).await?;
            let user = users::repo::create_superuser(&pool, &email, &password)
                .await
                .map_err(|e| anyhow::anyhow!("create superuser: {e}"))?;
            tracing::info!(user_id = user.id, email = %user.email, "superuser created");
        }
    }
    Ok(())
}

async fn serve(config: AppConfig, args: ServeArgs) -> anyhow::Result<()> {
    db::wait_for_db(&config.database_url, &config.db_wait).await?;
    let app_state = AppState::init(config).await?;
    let app = build_app(app_state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
