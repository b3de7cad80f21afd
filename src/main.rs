use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{error, info};

use fpl_ratings::config::{BatchConfig, parse_db_path_arg};
use fpl_ratings::fpl_fetch::HttpSource;
use fpl_ratings::logging::init_logging;
use fpl_ratings::pipeline::run_pipeline;
use fpl_ratings::store;

fn main() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    init_logging();

    if let Err(err) = run() {
        // The previous snapshot stays in place until the next successful run.
        error!(error = %format!("{err:#}"), "batch run failed");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let cfg = BatchConfig::from_env(parse_db_path_arg(&args))?;
    info!(
        base_url = %cfg.base_url,
        db = %cfg.db_path.display(),
        policy = ?cfg.fetch_policy,
        "starting batch run"
    );

    let started_at = Utc::now().to_rfc3339();
    let source = HttpSource::new(&cfg.base_url, cfg.request_timeout)?;
    let snapshot = run_pipeline(&source, cfg.fetch_policy)?;

    let mut conn = store::open_db(&cfg.db_path)?;
    store::replace_snapshot(&mut conn, &snapshot, &started_at).context("persist snapshot")?;

    info!(
        gameweek = snapshot.gameweek,
        teams = snapshot.team_metrics.len(),
        players = snapshot.player_metrics.len(),
        rated = snapshot.rated_count(),
        skipped = snapshot.skipped_players.len(),
        "batch run complete"
    );
    Ok(())
}
