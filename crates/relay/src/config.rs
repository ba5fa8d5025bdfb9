// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration for the command relay server.
#[derive(Debug, Clone, clap::Parser)]
#[command(name = "cmdrelay", version, about = "Dispatch shell commands to polling agents")]
pub struct RelayConfig {
    /// Host to bind on.
    #[arg(long, default_value = "0.0.0.0", env = "RELAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080, env = "PORT")]
    pub port: u16,

    /// MySQL connection URL for the job and tag tables.
    #[arg(long, env = "DSN", hide_env_values = true)]
    pub dsn: String,

    /// Shared secret required to submit jobs.
    #[arg(long, env = "TOKEN", hide_env_values = true)]
    pub token: String,

    /// Seconds without a heartbeat before an agent counts as offline (at least 1).
    #[arg(long, default_value_t = 30, env = "RELAY_PRESENCE_TTL_SECS")]
    pub presence_ttl_secs: u64,

    /// Maximum pooled database connections.
    #[arg(long, default_value_t = 5, env = "RELAY_DB_MAX_CONNECTIONS")]
    pub db_max_connections: u32,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info", env = "RELAY_LOG_LEVEL")]
    pub log_level: String,

    /// Log format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, env = "RELAY_LOG_FORMAT")]
    pub log_format: LogFormat,
}

impl RelayConfig {
    pub fn presence_ttl(&self) -> Duration {
        Duration::from_secs(self.presence_ttl_secs)
    }

    /// Reject configurations the server cannot start with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.dsn.trim().is_empty() {
            anyhow::bail!("DSN must not be empty");
        }
        if self.token.is_empty() {
            anyhow::bail!("TOKEN must not be empty");
        }
        // A zero window would drop a host in the same instant it is touched.
        if self.presence_ttl_secs == 0 {
            anyhow::bail!("presence TTL must be at least one second");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
