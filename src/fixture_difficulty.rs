use crate::error::PipelineError;
use crate::models::{Role, UpcomingFixture};
use crate::team_strength::TeamStrengths;

/// Upcoming fixtures averaged into the difficulty figure.
pub const DIFFICULTY_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixtureDifficulty {
    pub fixtures_counted: usize,
    /// Mean opponent strength. 0.0 either when nothing is scheduled or when
    /// every opponent is the league's weakest side; `has_fixtures` tells them apart.
    pub avg_difficulty_next_3: f64,
}

impl FixtureDifficulty {
    pub fn has_fixtures(&self) -> bool {
        self.fixtures_counted > 0
    }
}

/// Unfinished fixtures in schedule order; fixtures without an event id go last.
pub fn next_unfinished(fixtures: &[UpcomingFixture]) -> Vec<&UpcomingFixture> {
    let mut pending: Vec<&UpcomingFixture> = fixtures.iter().filter(|f| !f.finished).collect();
    pending.sort_by_key(|f| f.event.unwrap_or(u32::MAX));
    pending
}

/// Averages opponent strength over the next three unfinished fixtures.
///
/// The opponent's strength is read at the venue they play at, the opposite of
/// the player's own. Defensive players face the opponent's attack, attacking
/// players the opponent's defence.
pub fn fixture_difficulty(
    strengths: &TeamStrengths,
    player_id: u32,
    role: Role,
    fixtures: &[UpcomingFixture],
) -> Result<FixtureDifficulty, PipelineError> {
    let mut total = 0.0;
    let mut counted = 0usize;
    for fixture in next_unfinished(fixtures).into_iter().take(DIFFICULTY_WINDOW) {
        let (opponent_id, opponent_venue) = fixture.opponent();
        let opponent = strengths
            .get(opponent_id)
            .ok_or(PipelineError::UnknownTeam {
                player_id,
                team_id: opponent_id,
            })?;
        let side = opponent.at(opponent_venue);
        total += match role {
            Role::Defensive => side.attack,
            Role::Attacking => side.defence,
        };
        counted += 1;
    }

    let avg_difficulty_next_3 = if counted == 0 {
        0.0
    } else {
        total / counted as f64
    };
    Ok(FixtureDifficulty {
        fixtures_counted: counted,
        avg_difficulty_next_3,
    })
}
