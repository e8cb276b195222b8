mod cli;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use leadgate_core::adapters::{
    PostgresCatalogRepository, PostgresLeadRepository, PostgresTransactionRepository,
};
use leadgate_core::auth::AdminAuth;
use leadgate_core::config::Config;
use leadgate_core::middleware::rate_limit::build_limiter;
use leadgate_core::services::{
    CatalogService, LeadService, MailTransport, Mailer, TransactionService,
};
use leadgate_core::{cors_layer, create_app, AppState};

use cli::{Cli, Commands, DbCommands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Cli::parse();
    let config = Config::from_env()?;

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await,
        Commands::Db(DbCommands::Migrate) => {
            let pool = create_pool(&config).await?;
            run_migrations(&pool).await?;
            tracing::info!("database migrations completed");
            Ok(())
        }
        Commands::Config => {
            // from_env already validated; report the effective settings.
            tracing::info!(
                server_port = config.server_port,
                rate_limit_per_minute = config.rate_limit_per_minute,
                mail_transport = if config.mail_endpoint.is_some() {
                    "http"
                } else {
                    "memory"
                },
                "configuration is valid"
            );
            Ok(())
        }
    }
}

async fn create_pool(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(pool).await?;
    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = create_pool(&config).await?;
    run_migrations(&pool).await?;
    tracing::info!("database migrations completed");

    let lead_repo = Arc::new(PostgresLeadRepository::new(pool.clone()));
    let tx_repo = Arc::new(PostgresTransactionRepository::new(pool.clone()));
    let catalog_repo = Arc::new(PostgresCatalogRepository::new(pool.clone()));

    let transport = match &config.mail_endpoint {
        Some(endpoint) => MailTransport::Http {
            endpoint: endpoint.clone(),
            api_key: config.mail_api_key.clone(),
        },
        None => {
            tracing::warn!("MAIL_ENDPOINT not set; mail goes to the in-memory sink");
            MailTransport::Memory
        }
    };
    let mailer = Arc::new(Mailer::new(
        transport,
        config.from_email.clone(),
        config.admin_notify_email.clone(),
        config.app_base_url.clone(),
    ));

    let auth = Arc::new(AdminAuth::new(
        config.jwt_secret.as_bytes(),
        chrono::Duration::hours(config.token_ttl_hours),
        config.admin_email.clone(),
        config.admin_password_sha256.clone(),
    ));

    let state = AppState {
        leads: LeadService::new(lead_repo.clone()),
        transactions: TransactionService::new(lead_repo, tx_repo),
        catalog: CatalogService::new(catalog_repo),
        mailer,
        auth,
        rate_limiter: build_limiter(config.rate_limit_per_minute),
        start_time: Instant::now(),
    };

    // The keyed limiter store grows one entry per client IP; sweep out
    // stale keys so a long-lived process does not accumulate them.
    let sweep_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            sweep_limiter.retain_recent();
        }
    });

    let app = create_app(state).layer(cors_layer(&config.cors_origins));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
