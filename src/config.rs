use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::fpl_fetch::FPL_BASE_URL;
use crate::pipeline::FetchPolicy;

const CACHE_DIR: &str = "fpl_ratings";
const DB_FILE: &str = "fpl_metrics.sqlite";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub base_url: String,
    pub db_path: PathBuf,
    pub request_timeout: Duration,
    pub fetch_policy: FetchPolicy,
}

impl BatchConfig {
    /// Reads `FPL_*` variables; `db_override` (from `--db`) wins over `FPL_DB_PATH`.
    pub fn from_env(db_override: Option<PathBuf>) -> Result<Self> {
        let base_url = env_non_empty("FPL_BASE_URL").unwrap_or_else(|| FPL_BASE_URL.to_string());
        let db_path = db_override
            .or_else(|| env_non_empty("FPL_DB_PATH").map(PathBuf::from))
            .or_else(default_db_path)
            .context("unable to resolve sqlite path (set FPL_DB_PATH or --db)")?;
        let timeout_secs = env_non_empty("FPL_REQUEST_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS)
            .clamp(1, 120);
        let fetch_policy = match env_non_empty("FPL_PLAYER_FETCH_POLICY") {
            Some(raw) => raw.parse::<FetchPolicy>()?,
            None => FetchPolicy::default(),
        };

        Ok(Self {
            base_url,
            db_path,
            request_timeout: Duration::from_secs(timeout_secs),
            fetch_policy,
        })
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Some(base) = env_non_empty("XDG_CACHE_HOME") {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = env_non_empty("HOME")?;
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}

/// `--db <path>` or `--db=<path>`.
pub fn parse_db_path_arg(args: &[String]) -> Option<PathBuf> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--db=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--db" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
