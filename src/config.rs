use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::metrics::MockMetricsProvider;

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Postgres connection string for the catalog backend
    #[arg(long, env = "DATABASE_URL", global = true, hide_env_values = true)]
    pub database_url: Option<String>,

    /// Maximum pooled connections
    #[arg(long, env = "LEARNSPHERE_MAX_CONNECTIONS", default_value_t = 5, global = true)]
    pub max_connections: u32,

    /// Where the signed-in session is kept
    #[arg(long, env = "LEARNSPHERE_SESSION_FILE", global = true)]
    pub session_file: Option<PathBuf>,

    /// Fixed seed for placeholder ratings and student counts
    #[arg(long, env = "LEARNSPHERE_METRICS_SEED", global = true)]
    pub metrics_seed: Option<u64>,
}

impl Config {
    pub fn session_path(&self) -> PathBuf {
        self.session_file.clone().unwrap_or_else(default_session_path)
    }

    pub fn metrics_provider(&self) -> MockMetricsProvider {
        match self.metrics_seed {
            Some(seed) => MockMetricsProvider::seeded(seed),
            None => MockMetricsProvider::new(),
        }
    }

    pub async fn connect(&self) -> anyhow::Result<PgPool> {
        let database_url = self
            .database_url
            .as_deref()
            .context("DATABASE_URL must be set to the catalog Postgres instance")?;

        PgPoolOptions::new()
            .max_connections(self.max_connections.max(1))
            .connect(database_url)
            .await
            .context("failed to connect to Postgres")
    }
}

fn default_session_path() -> PathBuf {
    let home = std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".learnsphere").join("session.json")
}
