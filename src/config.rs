use anyhow::Context;
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub admin_email: String,
    pub admin_password_sha256: String,
    pub from_email: String,
    pub admin_notify_email: String,
    pub app_base_url: String,
    pub mail_endpoint: Option<String>,
    pub mail_api_key: Option<String>,
    pub cors_origins: Vec<String>,
    pub rate_limit_per_minute: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok(); // Load .env file if present

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is required")?;
        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 bytes");
        }

        Ok(Config {
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "4000".to_string())
                .parse()
                .context("SERVER_PORT must be a port number")?,
            database_url: env::var("DATABASE_URL").context("DATABASE_URL is required")?,
            jwt_secret,
            token_ttl_hours: env::var("TOKEN_TTL_HOURS")
                .unwrap_or_else(|_| "12".to_string())
                .parse()
                .context("TOKEN_TTL_HOURS must be an integer")?,
            admin_email: env::var("ADMIN_EMAIL").context("ADMIN_EMAIL is required")?,
            admin_password_sha256: env::var("ADMIN_PASSWORD_SHA256")
                .context("ADMIN_PASSWORD_SHA256 is required")?,
            from_email: env::var("FROM_EMAIL").context("FROM_EMAIL is required")?,
            admin_notify_email: env::var("ADMIN_NOTIFY_EMAIL")
                .context("ADMIN_NOTIFY_EMAIL is required")?,
            app_base_url: env::var("APP_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:4000".to_string()),
            mail_endpoint: env::var("MAIL_ENDPOINT").ok(),
            mail_api_key: env::var("MAIL_API_KEY").ok(),
            cors_origins: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            rate_limit_per_minute: env::var("RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .context("RATE_LIMIT_PER_MINUTE must be an integer")?,
        })
    }
}
