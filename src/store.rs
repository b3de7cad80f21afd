use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{Connection, Transaction, params};

use crate::models::Position;
use crate::pipeline::{PastRow, Snapshot};
use crate::rating::PlayerMetric;

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn =
        Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS teams (
            team_id INTEGER PRIMARY KEY,
            code INTEGER NOT NULL,
            name TEXT NOT NULL,
            short_name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS players (
            player_id INTEGER PRIMARY KEY,
            web_name TEXT NOT NULL,
            team_id INTEGER NOT NULL,
            element_type INTEGER NOT NULL,
            status TEXT NOT NULL,
            now_cost INTEGER NOT NULL,
            total_points INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS team_metrics (
            team_id INTEGER PRIMARY KEY,
            home_strength_attack REAL NOT NULL,
            home_strength_defence REAL NOT NULL,
            away_strength_attack REAL NOT NULL,
            away_strength_defence REAL NOT NULL,
            no_games_h INTEGER NOT NULL,
            no_goals_scored_h INTEGER NOT NULL,
            no_goals_conceded_h INTEGER NOT NULL,
            no_games_a INTEGER NOT NULL,
            no_goals_scored_a INTEGER NOT NULL,
            no_goals_conceded_a INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS player_metrics (
            player_id INTEGER PRIMARY KEY,
            web_name TEXT NOT NULL,
            team_id INTEGER NOT NULL,
            element_type INTEGER NOT NULL,
            total_points_per_pound REAL NOT NULL,
            points_per_pound_last_3_games REAL NOT NULL,
            points_last_3 INTEGER NOT NULL,
            min_per_90 REAL NOT NULL,
            early_sub INTEGER NOT NULL,
            games_played_factor REAL NOT NULL,
            selection_likelihood INTEGER NOT NULL,
            team_difficulty_next_3 REAL NOT NULL,
            player_rating REAL NULL,
            player_rank INTEGER NULL,
            position_rank INTEGER NULL
        );
        CREATE INDEX IF NOT EXISTS idx_player_metrics_rank ON player_metrics(player_rank);
        CREATE INDEX IF NOT EXISTS idx_player_metrics_position ON player_metrics(element_type, position_rank);

        CREATE TABLE IF NOT EXISTS player_upcoming_fixtures (
            player_id INTEGER NOT NULL,
            event INTEGER NULL,
            team_h INTEGER NOT NULL,
            team_a INTEGER NOT NULL,
            is_home INTEGER NOT NULL,
            difficulty INTEGER NULL
        );
        CREATE INDEX IF NOT EXISTS idx_upcoming_player ON player_upcoming_fixtures(player_id);

        CREATE TABLE IF NOT EXISTS player_past_fixtures (
            player_id INTEGER NOT NULL,
            round INTEGER NOT NULL,
            minutes INTEGER NULL,
            total_points INTEGER NULL,
            opponent_team INTEGER NULL,
            was_home INTEGER NULL
        );
        CREATE INDEX IF NOT EXISTS idx_past_player ON player_past_fixtures(player_id, round);

        CREATE TABLE IF NOT EXISTS batch_runs (
            run_id INTEGER PRIMARY KEY AUTOINCREMENT,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            gameweek INTEGER NOT NULL,
            players_rated INTEGER NOT NULL,
            players_unrated INTEGER NOT NULL,
            players_skipped INTEGER NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

/// Swaps the stored snapshot for `snapshot` in one transaction. A failure
/// leaves the previous run's rows in place.
pub fn replace_snapshot(conn: &mut Connection, snapshot: &Snapshot, started_at: &str) -> Result<()> {
    let tx = conn.transaction().context("begin snapshot transaction")?;
    tx.execute_batch(
        r#"
        DELETE FROM teams;
        DELETE FROM players;
        DELETE FROM team_metrics;
        DELETE FROM player_metrics;
        DELETE FROM player_upcoming_fixtures;
        DELETE FROM player_past_fixtures;
        "#,
    )
    .context("clear previous snapshot")?;

    insert_teams(&tx, snapshot)?;
    insert_players(&tx, snapshot)?;
    insert_team_metrics(&tx, snapshot)?;
    for metric in &snapshot.player_metrics {
        insert_player_metric(&tx, metric)?;
    }
    insert_upcoming(&tx, snapshot)?;
    insert_past(&tx, snapshot)?;

    let rated = snapshot.rated_count();
    tx.execute(
        "INSERT INTO batch_runs(started_at, finished_at, gameweek, players_rated, players_unrated, players_skipped)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            started_at,
            Utc::now().to_rfc3339(),
            snapshot.gameweek as i64,
            rated as i64,
            (snapshot.player_metrics.len() - rated) as i64,
            snapshot.skipped_players.len() as i64,
        ],
    )
    .context("insert batch run")?;

    tx.commit().context("commit snapshot transaction")?;
    Ok(())
}

fn insert_teams(tx: &Transaction<'_>, snapshot: &Snapshot) -> Result<()> {
    let mut stmt = tx
        .prepare("INSERT INTO teams(team_id, code, name, short_name) VALUES (?1, ?2, ?3, ?4)")
        .context("prepare team insert")?;
    for team in &snapshot.teams {
        stmt.execute(params![
            team.id as i64,
            team.code as i64,
            team.name,
            team.short_name
        ])
        .with_context(|| format!("insert team {}", team.id))?;
    }
    Ok(())
}

fn insert_players(tx: &Transaction<'_>, snapshot: &Snapshot) -> Result<()> {
    let mut stmt = tx
        .prepare(
            "INSERT INTO players(player_id, web_name, team_id, element_type, status, now_cost, total_points)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .context("prepare player insert")?;
    for p in &snapshot.players {
        stmt.execute(params![
            p.id as i64,
            p.web_name,
            p.team as i64,
            p.element_type as i64,
            p.status,
            p.now_cost as i64,
            p.total_points as i64,
        ])
        .with_context(|| format!("insert player {}", p.id))?;
    }
    Ok(())
}

fn insert_team_metrics(tx: &Transaction<'_>, snapshot: &Snapshot) -> Result<()> {
    let mut stmt = tx
        .prepare(
            r#"
            INSERT INTO team_metrics (
                team_id,
                home_strength_attack, home_strength_defence,
                away_strength_attack, away_strength_defence,
                no_games_h, no_goals_scored_h, no_goals_conceded_h,
                no_games_a, no_goals_scored_a, no_goals_conceded_a
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .context("prepare team metric insert")?;
    for tm in &snapshot.team_metrics {
        let (s, a) = (&tm.strength, &tm.aggregate);
        stmt.execute(params![
            tm.team_id as i64,
            s.home.attack,
            s.home.defence,
            s.away.attack,
            s.away.defence,
            a.home.games as i64,
            a.home.goals_scored as i64,
            a.home.goals_conceded as i64,
            a.away.games as i64,
            a.away.goals_scored as i64,
            a.away.goals_conceded as i64,
        ])
        .with_context(|| format!("insert team metric {}", tm.team_id))?;
    }
    Ok(())
}

fn insert_player_metric(tx: &Transaction<'_>, m: &PlayerMetric) -> Result<()> {
    tx.execute(
        r#"
        INSERT INTO player_metrics (
            player_id, web_name, team_id, element_type,
            total_points_per_pound, points_per_pound_last_3_games, points_last_3,
            min_per_90, early_sub, games_played_factor, selection_likelihood,
            team_difficulty_next_3, player_rating, player_rank, position_rank
        ) VALUES (
            ?1, ?2, ?3, ?4,
            ?5, ?6, ?7,
            ?8, ?9, ?10, ?11,
            ?12, ?13, ?14, ?15
        )
        "#,
        params![
            m.player_id as i64,
            m.web_name,
            m.team_id as i64,
            m.position.element_type() as i64,
            m.total_points_per_pound,
            m.points_per_pound_last_3,
            m.points_last_3 as i64,
            m.min_per_90,
            bool_to_i64(m.early_sub),
            m.games_played_factor,
            m.selection_likelihood as i64,
            m.team_difficulty_next_3,
            m.player_rating,
            m.player_rank.map(i64::from),
            m.position_rank.map(i64::from),
        ],
    )
    .with_context(|| format!("insert player metric {}", m.player_id))?;
    Ok(())
}

fn insert_upcoming(tx: &Transaction<'_>, snapshot: &Snapshot) -> Result<()> {
    let mut stmt = tx
        .prepare(
            "INSERT INTO player_upcoming_fixtures(player_id, event, team_h, team_a, is_home, difficulty)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .context("prepare upcoming fixture insert")?;
    for row in &snapshot.upcoming {
        stmt.execute(params![
            row.player_id as i64,
            row.event.map(i64::from),
            row.team_h as i64,
            row.team_a as i64,
            bool_to_i64(row.is_home),
            row.difficulty.map(i64::from),
        ])
        .with_context(|| format!("insert upcoming fixture for player {}", row.player_id))?;
    }
    Ok(())
}

fn insert_past(tx: &Transaction<'_>, snapshot: &Snapshot) -> Result<()> {
    let mut stmt = tx
        .prepare(
            "INSERT INTO player_past_fixtures(player_id, round, minutes, total_points, opponent_team, was_home)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .context("prepare past fixture insert")?;
    for row in &snapshot.past {
        stmt.execute(params![
            row.player_id as i64,
            row.round as i64,
            row.minutes.map(i64::from),
            row.total_points.map(i64::from),
            row.opponent_team.map(i64::from),
            row.was_home.map(bool_to_i64),
        ])
        .with_context(|| format!("insert past fixture for player {}", row.player_id))?;
    }
    Ok(())
}

/// Latest round with a stored past match, the gameweek the dashboard shows.
pub fn latest_round(conn: &Connection) -> Result<Option<u32>> {
    conn.query_row("SELECT MAX(round) FROM player_past_fixtures", [], |row| {
        row.get::<_, Option<u32>>(0)
    })
    .context("query latest round")
}

/// A player's most recent past matches, newest first.
pub fn load_past_fixtures(conn: &Connection, player_id: u32, limit: usize) -> Result<Vec<PastRow>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT player_id, round, minutes, total_points, opponent_team, was_home
            FROM player_past_fixtures
            WHERE player_id = ?1
            ORDER BY round DESC
            LIMIT ?2
            "#,
        )
        .context("prepare load past fixtures query")?;

    let rows = stmt
        .query_map(params![player_id as i64, limit as i64], |row| {
            Ok(PastRow {
                player_id: row.get::<_, u32>(0)?,
                round: row.get::<_, u32>(1)?,
                minutes: row.get::<_, Option<u32>>(2)?,
                total_points: row.get::<_, Option<i32>>(3)?,
                opponent_team: row.get::<_, Option<u32>>(4)?,
                was_home: row.get::<_, Option<i64>>(5)?.map(|v| v != 0),
            })
        })
        .context("query load past fixtures")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode past fixture row")?);
    }
    Ok(out)
}

/// Stored metrics ordered by global rank; unranked players come last.
pub fn load_player_metrics(conn: &Connection) -> Result<Vec<PlayerMetric>> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                player_id, web_name, team_id, element_type,
                total_points_per_pound, points_per_pound_last_3_games, points_last_3,
                min_per_90, early_sub, games_played_factor, selection_likelihood,
                team_difficulty_next_3, player_rating, player_rank, position_rank
            FROM player_metrics
            ORDER BY player_rank IS NULL, player_rank ASC, player_id ASC
            "#,
        )
        .context("prepare load player metrics query")?;

    let rows = stmt
        .query_map([], |row| {
            let element_type = row.get::<_, u8>(3)?;
            let position = Position::from_element_type(element_type).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    Type::Integer,
                    format!("unknown element_type {element_type}").into(),
                )
            })?;
            Ok(PlayerMetric {
                player_id: row.get::<_, u32>(0)?,
                web_name: row.get(1)?,
                team_id: row.get::<_, u32>(2)?,
                position,
                total_points_per_pound: row.get(4)?,
                points_per_pound_last_3: row.get(5)?,
                points_last_3: row.get::<_, i32>(6)?,
                min_per_90: row.get(7)?,
                early_sub: row.get::<_, i64>(8)? != 0,
                games_played_factor: row.get(9)?,
                selection_likelihood: row.get::<_, u8>(10)?,
                team_difficulty_next_3: row.get(11)?,
                player_rating: row.get(12)?,
                player_rank: row.get::<_, Option<u32>>(13)?,
                position_rank: row.get::<_, Option<u32>>(14)?,
            })
        })
        .context("query load player metrics")?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row.context("decode player metric row")?);
    }
    Ok(out)
}

fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}
