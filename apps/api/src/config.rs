use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
///
/// `paystack_secret_key` and `session_secret` are secrets: they must never
/// appear in logs or error messages (Config deliberately does not derive Debug).
#[derive(Clone)]
pub struct Config {
    pub paystack_secret_key: String,
    pub session_secret: String,
    pub static_dir: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            paystack_secret_key: require_env("PAYSTACK_SECRET_KEY")?,
            session_secret: require_env("SESSION_SECRET")?,
            static_dir: std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
