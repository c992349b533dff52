use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use quill::auth::session;
use quill::config::{Cli, Command, Config};
use quill::state::AppState;
use quill::{admin, db, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Parse CLI args and load config
    let cli = Cli::parse();
    let data_dir = Config::data_dir(&cli)?;
    std::fs::create_dir_all(&data_dir)?;
    tracing::info!("Data directory: {}", data_dir.display());

    let config = Config::load(&cli)?;

    // Initialize database
    let pool = db::create_pool(&config.db_path())?;
    db::run_migrations(&pool)?;

    let state = AppState::new(pool, config);

    match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => serve(state).await,
        Command::CreateUser { username, password } => {
            admin::create_user(state.blog.as_ref(), &state.config.auth, &username, &password)
                .await?;
            Ok(())
        }
        Command::CreateGroup {
            title,
            slug,
            description,
        } => {
            let group =
                admin::create_group(state.blog.as_ref(), &title, slug.as_deref(), &description)
                    .await?;
            println!("/group/{}/", group.slug);
            Ok(())
        }
    }
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    let purged = session::purge_expired(&state.db)?;
    if purged > 0 {
        tracing::info!("Removed {} expired sessions", purged);
    }

    let addr: SocketAddr =
        format!("{}:{}", state.config.server.host, state.config.server.port).parse()?;
    let app = routes::app(state);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
