use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::attendance::ShiftTable;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_check_per_min: u32,
    pub rate_report_per_min: u32,

    // Purge job
    pub retention_days: u32,
    pub purge_interval_hours: u64,

    pub log_dir: String,
    pub shifts: ShiftTable,
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let shifts = match env::var("SHIFT_TABLE") {
            Ok(table) => table.parse::<ShiftTable>().context("SHIFT_TABLE is invalid")?,
            Err(_) => ShiftTable::default(),
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api/v1".to_string()),

            rate_check_per_min: var_or("RATE_CHECK_PER_MIN", 60)?,
            rate_report_per_min: var_or("RATE_REPORT_PER_MIN", 120)?,

            retention_days: var_or("RETENTION_DAYS", 93)?,
            purge_interval_hours: var_or("PURGE_INTERVAL_HOURS", 24)?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            shifts,
        })
    }
}
