use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;

use crate::fixture_difficulty::FixtureDifficulty;
use crate::models::Position;
use crate::player_form::RecentForm;

/// Everything derived for one player before ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerAssessment {
    pub player_id: u32,
    pub web_name: String,
    pub team_id: u32,
    pub position: Position,
    pub total_points: i32,
    pub current_cost: f64,
    pub form: RecentForm,
    pub difficulty: FixtureDifficulty,
    pub selection_likelihood: u8,
}

impl PlayerAssessment {
    pub fn total_points_per_pound(&self) -> f64 {
        per_pound(f64::from(self.total_points), self.current_cost)
    }

    pub fn points_per_pound_last_3(&self) -> f64 {
        per_pound(f64::from(self.form.points_last_3), self.current_cost)
    }

    pub fn rating(&self) -> Option<f64> {
        composite_rating(
            self.selection_likelihood,
            self.points_per_pound_last_3(),
            &self.difficulty,
        )
    }
}

fn per_pound(points: f64, cost: f64) -> f64 {
    if cost > 0.0 { points / cost } else { 0.0 }
}

/// Lowest difficulty used as the rating denominator. Min-max scaling puts the
/// weakest side in the league at exactly 0.0, so a scheduled fixture against
/// it still needs a finite rating.
pub const MIN_DIFFICULTY: f64 = 0.05;

/// `selection × points_per_pound_last_3 / max(difficulty, MIN_DIFFICULTY)`.
///
/// `None` only when no fixture is scheduled (blank gameweek, end of season).
/// Such players are left unranked.
pub fn composite_rating(
    selection_likelihood: u8,
    points_per_pound_last_3: f64,
    difficulty: &FixtureDifficulty,
) -> Option<f64> {
    if !difficulty.has_fixtures() {
        return None;
    }
    let denominator = difficulty.avg_difficulty_next_3.max(MIN_DIFFICULTY);
    let rating = f64::from(selection_likelihood) * points_per_pound_last_3 / denominator;
    rating.is_finite().then_some(rating)
}

/// Final per-player record handed to persistence and the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerMetric {
    pub player_id: u32,
    pub web_name: String,
    pub team_id: u32,
    pub position: Position,
    pub total_points_per_pound: f64,
    pub points_per_pound_last_3: f64,
    pub points_last_3: i32,
    pub min_per_90: f64,
    pub early_sub: bool,
    pub games_played_factor: f64,
    pub selection_likelihood: u8,
    pub team_difficulty_next_3: f64,
    pub player_rating: Option<f64>,
    pub player_rank: Option<u32>,
    pub position_rank: Option<u32>,
}

impl PlayerMetric {
    fn unranked(a: &PlayerAssessment) -> Self {
        Self {
            player_id: a.player_id,
            web_name: a.web_name.clone(),
            team_id: a.team_id,
            position: a.position,
            total_points_per_pound: a.total_points_per_pound(),
            points_per_pound_last_3: a.points_per_pound_last_3(),
            points_last_3: a.form.points_last_3,
            min_per_90: a.form.min_per_90,
            early_sub: a.form.early_sub,
            games_played_factor: a.form.games_played_factor,
            selection_likelihood: a.selection_likelihood,
            team_difficulty_next_3: a.difficulty.avg_difficulty_next_3,
            player_rating: a.rating(),
            player_rank: None,
            position_rank: None,
        }
    }
}

fn by_rating_desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Assigns global and per-position ranks by descending rating.
///
/// Both sorts are stable, so equal ratings keep input order. Players without a
/// rating keep `None` ranks and do not consume a rank number. Output order
/// matches input order.
pub fn rank_players(assessments: &[PlayerAssessment]) -> Vec<PlayerMetric> {
    let mut metrics: Vec<PlayerMetric> = assessments.iter().map(PlayerMetric::unranked).collect();

    let mut rated: Vec<(usize, f64)> = metrics
        .iter()
        .enumerate()
        .filter_map(|(idx, m)| m.player_rating.map(|r| (idx, r)))
        .collect();
    rated.sort_by(|a, b| by_rating_desc(a.1, b.1));
    for (rank, (idx, _)) in rated.iter().enumerate() {
        metrics[*idx].player_rank = Some(rank as u32 + 1);
    }

    let mut partitions: HashMap<Position, Vec<(usize, f64)>> = HashMap::new();
    for (idx, m) in metrics.iter().enumerate() {
        if let Some(rating) = m.player_rating {
            partitions.entry(m.position).or_default().push((idx, rating));
        }
    }
    for (_, mut group) in partitions {
        group.sort_by(|a, b| by_rating_desc(a.1, b.1));
        for (rank, (idx, _)) in group.iter().enumerate() {
            metrics[*idx].position_rank = Some(rank as u32 + 1);
        }
    }

    metrics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assessment(player_id: u32, position: Position, points_last_3: i32, avg: f64) -> PlayerAssessment {
        PlayerAssessment {
            player_id,
            web_name: format!("P{player_id}"),
            team_id: 1,
            position,
            total_points: 40,
            current_cost: 5.0,
            form: RecentForm {
                points_last_3,
                starts: 3,
                starter_minutes: 270,
                min_per_90: 90.0,
                early_sub: false,
                games_played_factor: 1.0,
            },
            difficulty: FixtureDifficulty {
                fixtures_counted: if avg > 0.0 { 3 } else { 0 },
                avg_difficulty_next_3: avg,
            },
            selection_likelihood: 95,
        }
    }

    #[test]
    fn rating_formula() {
        let a = assessment(1, Position::Midfielder, 10, 0.5);
        assert!((a.points_per_pound_last_3() - 2.0).abs() < 1e-12);
        assert!((a.total_points_per_pound() - 8.0).abs() < 1e-12);
        let rating = a.rating().expect("rated");
        assert!((rating - 380.0).abs() < 1e-9);
    }

    #[test]
    fn no_fixtures_has_no_rating() {
        let blank = FixtureDifficulty {
            fixtures_counted: 0,
            avg_difficulty_next_3: 0.0,
        };
        assert_eq!(composite_rating(95, 2.0, &blank), None);
        let broken = FixtureDifficulty {
            fixtures_counted: 1,
            avg_difficulty_next_3: 0.5,
        };
        assert_eq!(composite_rating(95, f64::NAN, &broken), None);
    }

    #[test]
    fn weakest_opponent_uses_difficulty_floor() {
        let mut easy = assessment(1, Position::Forward, 10, 0.5);
        easy.difficulty = FixtureDifficulty {
            fixtures_counted: 1,
            avg_difficulty_next_3: 0.0,
        };
        let hard = assessment(2, Position::Forward, 10, 0.8);

        let rating = easy.rating().expect("scheduled fixture is rated");
        assert!((rating - 95.0 * 2.0 / MIN_DIFFICULTY).abs() < 1e-9);

        let metrics = rank_players(&[hard, easy]);
        assert_eq!(metrics[1].player_rank, Some(1));
        assert_eq!(metrics[1].position_rank, Some(1));
        assert_eq!(metrics[0].player_rank, Some(2));
    }

    #[test]
    fn metric_serialises_for_json_report() {
        let metrics = rank_players(&[assessment(9, Position::Defender, 10, 0.5)]);
        let json = serde_json::to_value(&metrics[0]).expect("metric encodes");
        assert_eq!(json["player_id"], 9);
        assert_eq!(json["position"], "Defender");
        assert_eq!(json["player_rank"], 1);
        assert_eq!(json["player_rating"], 380.0);
    }

    #[test]
    fn zero_cost_is_zero_per_pound() {
        let mut a = assessment(1, Position::Forward, 10, 0.5);
        a.current_cost = 0.0;
        assert_eq!(a.points_per_pound_last_3(), 0.0);
        assert_eq!(a.rating(), Some(0.0));
    }

    #[test]
    fn ranks_are_permutations() {
        let players = vec![
            assessment(1, Position::Defender, 3, 0.5),
            assessment(2, Position::Midfielder, 9, 0.5),
            assessment(3, Position::Defender, 6, 0.5),
            assessment(4, Position::Forward, 12, 0.5),
            assessment(5, Position::Midfielder, 1, 0.5),
        ];
        let metrics = rank_players(&players);
        let mut global: Vec<u32> = metrics.iter().filter_map(|m| m.player_rank).collect();
        global.sort_unstable();
        assert_eq!(global, vec![1, 2, 3, 4, 5]);

        for position in Position::ALL {
            let mut ranks: Vec<u32> = metrics
                .iter()
                .filter(|m| m.position == position)
                .filter_map(|m| m.position_rank)
                .collect();
            ranks.sort_unstable();
            let expected: Vec<u32> = (1..=ranks.len() as u32).collect();
            assert_eq!(ranks, expected);
        }

        let by_id = |id: u32| metrics.iter().find(|m| m.player_id == id).expect("player");
        assert_eq!(by_id(4).player_rank, Some(1));
        assert_eq!(by_id(3).position_rank, Some(1));
        assert_eq!(by_id(1).position_rank, Some(2));
    }

    #[test]
    fn ties_keep_input_order() {
        let players = vec![
            assessment(7, Position::Defender, 6, 0.5),
            assessment(3, Position::Defender, 6, 0.5),
        ];
        let metrics = rank_players(&players);
        assert_eq!(metrics[0].player_rank, Some(1));
        assert_eq!(metrics[1].player_rank, Some(2));
        assert_eq!(metrics[0].position_rank, Some(1));
    }

    #[test]
    fn unrated_players_are_left_out_of_ranking() {
        let players = vec![
            assessment(1, Position::Goalkeeper, 6, 0.0),
            assessment(2, Position::Goalkeeper, 3, 0.5),
        ];
        let metrics = rank_players(&players);
        assert_eq!(metrics[0].player_rating, None);
        assert_eq!(metrics[0].player_rank, None);
        assert_eq!(metrics[0].position_rank, None);
        assert_eq!(metrics[1].player_rank, Some(1));
        assert_eq!(metrics[1].position_rank, Some(1));
    }
}
