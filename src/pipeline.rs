use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::fixture_difficulty::{fixture_difficulty, next_unfinished};
use crate::fpl_fetch::FplSource;
use crate::models::{Bootstrap, Fixture, Player, PlayerSummary, Team};
use crate::player_form::recent_form;
use crate::rating::{PlayerAssessment, PlayerMetric, rank_players};
use crate::selection::selection_likelihood;
use crate::team_strength::{FixtureAggregates, TeamAggregate, TeamStrength, TeamStrengths, aggregate_fixtures};

/// Upcoming fixtures kept per player for the dashboard.
pub const UPCOMING_LISTED: usize = 6;

/// What to do when one player's summary cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPolicy {
    #[default]
    Abort,
    Skip,
}

impl FromStr for FetchPolicy {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "abort" | "" => Ok(FetchPolicy::Abort),
            "skip" => Ok(FetchPolicy::Skip),
            other => Err(anyhow!("unknown player fetch policy {other:?} (expected abort|skip)")),
        }
    }
}

/// Inputs for rating players. Only obtainable from finished team strengths,
/// so players cannot be assessed before normalisation has run.
#[derive(Debug, Clone, Copy)]
pub struct RatingContext<'a> {
    strengths: &'a TeamStrengths,
    current_gameweek: u32,
}

impl<'a> RatingContext<'a> {
    pub fn new(strengths: &'a TeamStrengths, current_gameweek: u32) -> Self {
        Self {
            strengths,
            current_gameweek,
        }
    }

    pub fn strengths(&self) -> &'a TeamStrengths {
        self.strengths
    }

    pub fn current_gameweek(&self) -> u32 {
        self.current_gameweek
    }
}

pub fn assess_player(
    ctx: &RatingContext<'_>,
    player: &Player,
    summary: &PlayerSummary,
) -> Result<PlayerAssessment, PipelineError> {
    let position = player.position().ok_or(PipelineError::UnknownPosition {
        player_id: player.id,
        element_type: player.element_type,
    })?;
    let form = recent_form(&summary.history, ctx.current_gameweek);
    let difficulty = fixture_difficulty(ctx.strengths, player.id, position.role(), &summary.fixtures)?;
    let selection = selection_likelihood(
        player.availability(),
        form.early_sub,
        form.games_played_factor,
    );

    Ok(PlayerAssessment {
        player_id: player.id,
        web_name: player.web_name.clone(),
        team_id: player.team,
        position,
        total_points: player.total_points,
        current_cost: player.current_cost(),
        form,
        difficulty,
        selection_likelihood: selection,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamMetric {
    pub team_id: u32,
    pub aggregate: TeamAggregate,
    pub strength: TeamStrength,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpcomingRow {
    pub player_id: u32,
    pub event: Option<u32>,
    pub team_h: u32,
    pub team_a: u32,
    pub is_home: bool,
    pub difficulty: Option<u8>,
}

/// One past match from a player's history, stored for the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct PastRow {
    pub player_id: u32,
    pub round: u32,
    pub minutes: Option<u32>,
    pub total_points: Option<i32>,
    pub opponent_team: Option<u32>,
    pub was_home: Option<bool>,
}

/// Everything one run produces. Replaces the previous run's output wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub gameweek: u32,
    pub teams: Vec<Team>,
    pub players: Vec<Player>,
    pub team_metrics: Vec<TeamMetric>,
    pub player_metrics: Vec<PlayerMetric>,
    pub upcoming: Vec<UpcomingRow>,
    pub past: Vec<PastRow>,
    pub skipped_players: Vec<u32>,
}

impl Snapshot {
    pub fn rated_count(&self) -> usize {
        self.player_metrics
            .iter()
            .filter(|m| m.player_rating.is_some())
            .count()
    }
}

/// Raw provider payloads for one run.
#[derive(Debug, Clone)]
pub struct RawData {
    pub bootstrap: Bootstrap,
    pub fixtures: Vec<Fixture>,
    pub summaries: HashMap<u32, PlayerSummary>,
    pub skipped_players: Vec<u32>,
}

/// Fetches everything a run needs, one request at a time.
pub fn fetch_raw(source: &dyn FplSource, policy: FetchPolicy) -> Result<RawData> {
    let bootstrap = source.bootstrap().context("fetch bootstrap")?;
    info!(
        teams = bootstrap.teams.len(),
        players = bootstrap.elements.len(),
        events = bootstrap.events.len(),
        "bootstrap loaded"
    );
    let fixtures = source.fixtures().context("fetch fixtures")?;
    info!(fixtures = fixtures.len(), "fixtures loaded");

    let mut summaries = HashMap::with_capacity(bootstrap.elements.len());
    let mut skipped_players = Vec::new();
    for player in &bootstrap.elements {
        match source.player_summary(player.id) {
            Ok(summary) => {
                debug!(player_id = player.id, history = summary.history.len(), "summary loaded");
                summaries.insert(player.id, summary);
            }
            Err(err) => match policy {
                FetchPolicy::Abort => {
                    return Err(err.context(format!("fetch summary for player {}", player.id)));
                }
                FetchPolicy::Skip => {
                    warn!(player_id = player.id, error = %format!("{err:#}"), "skipping player");
                    skipped_players.push(player.id);
                }
            },
        }
    }

    Ok(RawData {
        bootstrap,
        fixtures,
        summaries,
        skipped_players,
    })
}

fn team_stage(bootstrap: &Bootstrap, fixtures: &[Fixture]) -> (FixtureAggregates, TeamStrengths) {
    let aggregates = aggregate_fixtures(fixtures);
    let strengths = TeamStrengths::normalize(&aggregates, &bootstrap.teams);
    info!(
        aggregated = aggregates.len(),
        rostered = strengths.len(),
        "team strengths normalised"
    );
    (aggregates, strengths)
}

/// Pure derivation from raw payloads to the persisted snapshot.
pub fn derive_snapshot(raw: &RawData) -> Result<Snapshot, PipelineError> {
    let gameweek = raw.bootstrap.current_gameweek();
    let (aggregates, strengths) = team_stage(&raw.bootstrap, &raw.fixtures);
    let ctx = RatingContext::new(&strengths, gameweek);

    let skipped: HashSet<u32> = raw.skipped_players.iter().copied().collect();
    let mut assessments = Vec::with_capacity(raw.bootstrap.elements.len());
    let mut upcoming = Vec::new();
    let mut past = Vec::new();
    for player in raw.bootstrap.elements.iter().filter(|p| !skipped.contains(&p.id)) {
        let summary = raw
            .summaries
            .get(&player.id)
            .ok_or(PipelineError::MissingSummary {
                player_id: player.id,
            })?;
        assessments.push(assess_player(&ctx, player, summary)?);
        upcoming.extend(
            next_unfinished(&summary.fixtures)
                .into_iter()
                .take(UPCOMING_LISTED)
                .map(|f| UpcomingRow {
                    player_id: player.id,
                    event: f.event,
                    team_h: f.team_h,
                    team_a: f.team_a,
                    is_home: f.is_home,
                    difficulty: f.difficulty,
                }),
        );
        past.extend(summary.history.iter().filter_map(|h| {
            Some(PastRow {
                player_id: player.id,
                round: h.round?,
                minutes: h.minutes,
                total_points: h.total_points,
                opponent_team: h.opponent_team,
                was_home: h.was_home,
            })
        }));
    }

    let player_metrics = rank_players(&assessments);
    let team_metrics = strengths
        .iter()
        .map(|s| TeamMetric {
            team_id: s.team_id,
            aggregate: aggregates.get(s.team_id).copied().unwrap_or_default(),
            strength: *s,
        })
        .collect();

    let snapshot = Snapshot {
        gameweek,
        teams: raw.bootstrap.teams.clone(),
        players: raw.bootstrap.elements.clone(),
        team_metrics,
        player_metrics,
        upcoming,
        past,
        skipped_players: raw.skipped_players.clone(),
    };
    info!(
        gameweek,
        players = snapshot.player_metrics.len(),
        rated = snapshot.rated_count(),
        skipped = snapshot.skipped_players.len(),
        "player metrics derived"
    );
    Ok(snapshot)
}

pub fn run_pipeline(source: &dyn FplSource, policy: FetchPolicy) -> Result<Snapshot> {
    let raw = fetch_raw(source, policy)?;
    derive_snapshot(&raw).context("derive player metrics")
}
