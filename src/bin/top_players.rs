use anyhow::{Context, Result};

use fpl_ratings::config::{default_db_path, parse_db_path_arg};
use fpl_ratings::models::Position;
use fpl_ratings::store;

const DEFAULT_TOP: usize = 10;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env");
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let db_path = parse_db_path_arg(&args)
        .or_else(|| std::env::var("FPL_DB_PATH").ok().map(Into::into))
        .or_else(default_db_path)
        .context("unable to resolve sqlite path")?;
    let top = parse_top_arg(&args).unwrap_or(DEFAULT_TOP).max(1);
    let json = args.iter().any(|a| a == "--json");

    let conn = store::open_db(&db_path)?;
    let metrics = store::load_player_metrics(&conn)?;
    if metrics.is_empty() {
        println!("No player metrics in {} yet.", db_path.display());
        return Ok(());
    }

    if !json {
        match store::latest_round(&conn)? {
            Some(round) => println!("Gameweek {round}"),
            None => println!("Gameweek unknown"),
        }
    }

    for position in Position::ALL {
        let mut rows: Vec<_> = metrics
            .iter()
            .filter(|m| m.position == position && m.position_rank.is_some())
            .collect();
        rows.sort_by_key(|m| m.position_rank);

        if json {
            for m in rows.into_iter().take(top) {
                println!("{}", serde_json::to_string(m).context("encode player metric")?);
            }
            continue;
        }

        println!("{}", position.short_label());
        for m in rows.into_iter().take(top) {
            println!(
                "  {:>3}. {:<20} rating {:>8.2}  sel {:>2}  ppp3 {:>5.2}  diff {:.2}",
                m.position_rank.unwrap_or_default(),
                m.web_name,
                m.player_rating.unwrap_or_default(),
                m.selection_likelihood,
                m.points_per_pound_last_3,
                m.team_difficulty_next_3,
            );
        }
    }

    let unrated = metrics.iter().filter(|m| m.player_rating.is_none()).count();
    if unrated > 0 && !json {
        println!("Unrated (no upcoming fixture): {unrated}");
    }
    Ok(())
}

fn parse_top_arg(args: &[String]) -> Option<usize> {
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix("--top=") {
            return raw.trim().parse().ok();
        }
        if arg == "--top" {
            return args.get(idx + 1).and_then(|v| v.trim().parse().ok());
        }
    }
    None
}
