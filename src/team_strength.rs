use std::collections::HashMap;

use crate::models::{Fixture, Team, Venue};

/// Finished games kept per team per venue.
pub const VENUE_WINDOW: u8 = 3;

/// Score used when a team has no games at a venue or the league has no spread.
pub const NEUTRAL_STRENGTH: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VenueAggregate {
    pub games: u8,
    pub goals_scored: u32,
    pub goals_conceded: u32,
}

impl VenueAggregate {
    /// Adds one result unless the window is already full. A full window stays
    /// as it is; it is never reset.
    fn absorb(self, scored: u32, conceded: u32) -> Self {
        if self.games >= VENUE_WINDOW {
            return self;
        }
        Self {
            games: self.games + 1,
            goals_scored: self.goals_scored + scored,
            goals_conceded: self.goals_conceded + conceded,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeamAggregate {
    pub home: VenueAggregate,
    pub away: VenueAggregate,
}

impl TeamAggregate {
    pub fn at(&self, venue: Venue) -> &VenueAggregate {
        match venue {
            Venue::Home => &self.home,
            Venue::Away => &self.away,
        }
    }
}

/// Rolling goal aggregates keyed by team id. Teams without a finished fixture
/// are absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixtureAggregates {
    by_team: HashMap<u32, TeamAggregate>,
}

impl FixtureAggregates {
    pub fn get(&self, team_id: u32) -> Option<&TeamAggregate> {
        self.by_team.get(&team_id)
    }

    pub fn len(&self) -> usize {
        self.by_team.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_team.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &TeamAggregate)> {
        self.by_team.iter().map(|(id, agg)| (*id, agg))
    }
}

/// Folds finished fixtures into per-team home/away aggregates.
///
/// The feed lists fixtures oldest first, so the list is walked in reverse and
/// the first `VENUE_WINDOW` results seen per venue are the most recent ones.
pub fn aggregate_fixtures(fixtures: &[Fixture]) -> FixtureAggregates {
    let by_team = fixtures
        .iter()
        .rev()
        .filter_map(|f| f.final_score().map(|(h, a)| (f.team_h, f.team_a, h, a)))
        .fold(
            HashMap::<u32, TeamAggregate>::new(),
            |mut acc, (home_id, away_id, home_goals, away_goals)| {
                let away = acc.entry(away_id).or_default();
                away.away = away.away.absorb(away_goals, home_goals);
                let home = acc.entry(home_id).or_default();
                home.home = home.home.absorb(home_goals, away_goals);
                acc
            },
        );
    FixtureAggregates { by_team }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VenueStrength {
    pub attack: f64,
    pub defence: f64,
}

impl VenueStrength {
    pub const NEUTRAL: VenueStrength = VenueStrength {
        attack: NEUTRAL_STRENGTH,
        defence: NEUTRAL_STRENGTH,
    };
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeamStrength {
    pub team_id: u32,
    pub home: VenueStrength,
    pub away: VenueStrength,
}

impl TeamStrength {
    pub fn at(&self, venue: Venue) -> VenueStrength {
        match venue {
            Venue::Home => self.home,
            Venue::Away => self.away,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Span {
    min: f64,
    max: f64,
}

impl Span {
    fn of(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.fold(None, |acc, v| match acc {
            None => Some(Span { min: v, max: v }),
            Some(s) => Some(Span {
                min: s.min.min(v),
                max: s.max.max(v),
            }),
        })
    }

    fn width(&self) -> f64 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    HigherBetter,
    LowerBetter,
}

/// League-wide spread of scored/conceded totals at one venue, taken only over
/// teams that played there.
#[derive(Debug, Clone, Copy, PartialEq)]
struct VenueSpread {
    scored: Option<Span>,
    conceded: Option<Span>,
}

impl VenueSpread {
    fn from_aggregates(aggregates: &FixtureAggregates, venue: Venue) -> Self {
        Self {
            scored: Span::of(
                played_at(aggregates, venue).map(|v| f64::from(v.goals_scored)),
            ),
            conceded: Span::of(
                played_at(aggregates, venue).map(|v| f64::from(v.goals_conceded)),
            ),
        }
    }

    fn strength(&self, agg: Option<&VenueAggregate>) -> VenueStrength {
        let Some(agg) = agg.filter(|a| a.games > 0) else {
            return VenueStrength::NEUTRAL;
        };
        VenueStrength {
            attack: min_max(
                f64::from(agg.goals_scored),
                self.scored,
                Direction::HigherBetter,
            ),
            defence: min_max(
                f64::from(agg.goals_conceded),
                self.conceded,
                Direction::LowerBetter,
            ),
        }
    }
}

fn played_at(
    aggregates: &FixtureAggregates,
    venue: Venue,
) -> impl Iterator<Item = VenueAggregate> + '_ {
    aggregates
        .iter()
        .map(move |(_, agg)| *agg.at(venue))
        .filter(|v| v.games > 0)
}

fn min_max(value: f64, span: Option<Span>, direction: Direction) -> f64 {
    let Some(span) = span else {
        return NEUTRAL_STRENGTH;
    };
    let width = span.width();
    if width <= 0.0 {
        return NEUTRAL_STRENGTH;
    }
    let scaled = match direction {
        Direction::HigherBetter => (value - span.min) / width,
        Direction::LowerBetter => (span.max - value) / width,
    };
    scaled.clamp(0.0, 1.0)
}

/// Normalised [0,1] strengths for every rostered team.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamStrengths {
    teams: Vec<TeamStrength>,
    index: HashMap<u32, usize>,
}

impl TeamStrengths {
    /// Min-max normalises the aggregates across the league. Attack rises with
    /// goals scored; defence rises as goals conceded fall.
    pub fn normalize(aggregates: &FixtureAggregates, roster: &[Team]) -> Self {
        let home = VenueSpread::from_aggregates(aggregates, Venue::Home);
        let away = VenueSpread::from_aggregates(aggregates, Venue::Away);

        let teams: Vec<TeamStrength> = roster
            .iter()
            .map(|team| {
                let agg = aggregates.get(team.id);
                TeamStrength {
                    team_id: team.id,
                    home: home.strength(agg.map(|a| &a.home)),
                    away: away.strength(agg.map(|a| &a.away)),
                }
            })
            .collect();
        let index = teams
            .iter()
            .enumerate()
            .map(|(idx, t)| (t.team_id, idx))
            .collect();
        Self { teams, index }
    }

    pub fn get(&self, team_id: u32) -> Option<&TeamStrength> {
        self.index.get(&team_id).map(|idx| &self.teams[*idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &TeamStrength> {
        self.teams.iter()
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(h: u32, a: u32, hs: u32, as_: u32) -> Fixture {
        Fixture {
            id: 0,
            event: None,
            team_h: h,
            team_a: a,
            team_h_score: Some(hs),
            team_a_score: Some(as_),
            finished: true,
        }
    }

    fn team(id: u32) -> Team {
        Team {
            id,
            name: format!("Team {id}"),
            short_name: format!("T{id}"),
            code: id,
        }
    }

    #[test]
    fn window_keeps_three_most_recent_games() {
        // Oldest first: the 9-0 home win is the oldest and must fall outside the window.
        let fixtures = vec![
            finished(1, 2, 9, 0),
            finished(1, 3, 1, 0),
            finished(1, 2, 2, 2),
            finished(1, 3, 0, 1),
        ];
        let aggs = aggregate_fixtures(&fixtures);
        let home = aggs.get(1).expect("team 1").home;
        assert_eq!(home.games, 3);
        assert_eq!(home.goals_scored, 3);
        assert_eq!(home.goals_conceded, 3);
        assert_eq!(aggs.get(1).expect("team 1").away.games, 0);
    }

    #[test]
    fn unfinished_fixtures_are_ignored() {
        let mut pending = finished(1, 2, 0, 0);
        pending.finished = false;
        pending.team_h_score = None;
        pending.team_a_score = None;
        let aggs = aggregate_fixtures(&[pending]);
        assert!(aggs.is_empty());
    }

    #[test]
    fn away_side_takes_away_score_as_scored() {
        let aggs = aggregate_fixtures(&[finished(1, 2, 1, 4)]);
        let away = aggs.get(2).expect("team 2").away;
        assert_eq!(away.games, 1);
        assert_eq!(away.goals_scored, 4);
        assert_eq!(away.goals_conceded, 1);
    }

    #[test]
    fn games_never_exceed_window() {
        let fixtures: Vec<Fixture> = (0..20)
            .map(|i| {
                if i % 2 == 0 {
                    finished(1, 2, 1, 1)
                } else {
                    finished(2, 1, 2, 0)
                }
            })
            .collect();
        let aggs = aggregate_fixtures(&fixtures);
        for (_, agg) in aggs.iter() {
            assert!(agg.home.games <= VENUE_WINDOW);
            assert!(agg.away.games <= VENUE_WINDOW);
        }
    }

    #[test]
    fn normalizes_against_league_range() {
        let mut by_team = HashMap::new();
        let home = |games, goals_scored, goals_conceded| TeamAggregate {
            home: VenueAggregate {
                games,
                goals_scored,
                goals_conceded,
            },
            away: VenueAggregate::default(),
        };
        by_team.insert(1, home(3, 9, 3));
        by_team.insert(2, home(3, 2, 6));
        by_team.insert(3, home(2, 5, 1));
        let aggs = FixtureAggregates { by_team };

        let strengths = TeamStrengths::normalize(&aggs, &[team(1), team(2), team(3), team(4)]);
        let t1 = strengths.get(1).expect("team 1");
        assert!((t1.home.attack - 1.0).abs() < 1e-12);
        assert!((t1.home.defence - 0.6).abs() < 1e-12);

        // No away games anywhere, and team 4 never played.
        assert_eq!(t1.away, VenueStrength::NEUTRAL);
        assert_eq!(strengths.get(4).expect("team 4").home, VenueStrength::NEUTRAL);
    }

    #[test]
    fn flat_league_is_neutral() {
        let fixtures = vec![finished(1, 2, 1, 1), finished(2, 1, 1, 1)];
        let aggs = aggregate_fixtures(&fixtures);
        let strengths = TeamStrengths::normalize(&aggs, &[team(1), team(2)]);
        for s in strengths.iter() {
            assert_eq!(s.home, VenueStrength::NEUTRAL);
            assert_eq!(s.away, VenueStrength::NEUTRAL);
        }
    }

    #[test]
    fn normalize_is_pure() {
        let fixtures = vec![
            finished(1, 2, 3, 0),
            finished(3, 1, 2, 2),
            finished(2, 3, 0, 1),
        ];
        let roster = [team(1), team(2), team(3)];
        let aggs = aggregate_fixtures(&fixtures);
        let first = TeamStrengths::normalize(&aggs, &roster);
        let second = TeamStrengths::normalize(&aggs, &roster);
        assert_eq!(first, second);
        for s in first.iter() {
            for v in [s.home, s.away] {
                assert!((0.0..=1.0).contains(&v.attack));
                assert!((0.0..=1.0).contains(&v.defence));
            }
        }
    }
}
