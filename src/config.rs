use std::env;
use anyhow::{Context, Result};

/// The smallest allowed attendance token size in bytes (128 bits).
pub const MIN_TOKEN_BYTES: usize = 16;

/// The application's configuration.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The validity window of an attendance token in minutes.
    pub token_window_minutes: i64,
    /// The number of random bytes drawn for an attendance token.
    pub token_bytes: usize,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let token_window_minutes: i64 = env::var("ATTENDANCE_WINDOW_MINUTES")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .context("Invalid ATTENDANCE_WINDOW_MINUTES")?;

        if token_window_minutes <= 0 {
            anyhow::bail!("ATTENDANCE_WINDOW_MINUTES must be positive");
        }

        let token_bytes: usize = env::var("ATTENDANCE_TOKEN_BYTES")
            .unwrap_or_else(|_| "32".to_string())
            .parse()
            .context("Invalid ATTENDANCE_TOKEN_BYTES")?;

        if token_bytes < MIN_TOKEN_BYTES {
            anyhow::bail!(
                "ATTENDANCE_TOKEN_BYTES must be at least {} (128 bits of entropy)",
                MIN_TOKEN_BYTES
            );
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            token_window_minutes,
            token_bytes,
        })
    }

    /// The validity window as a duration.
    pub fn token_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.token_window_minutes)
    }
}
