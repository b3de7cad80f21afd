use crate::models::HistoryEntry;

/// Entries counted towards `points_last_3`.
pub const FORM_WINDOW: usize = 3;

/// Gameweeks counted towards the games-played factor.
pub const GAMEWEEK_WINDOW: u32 = 3;

/// Average minutes per start below which a player is treated as an early sub.
pub const EARLY_SUB_MINUTES: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecentForm {
    pub points_last_3: i32,
    pub starts: u32,
    pub starter_minutes: u32,
    pub min_per_90: f64,
    pub early_sub: bool,
    pub games_played_factor: f64,
}

/// A history entry with every stat present.
#[derive(Debug, Clone, Copy)]
struct CompleteEntry {
    round: Option<u32>,
    points: i32,
    minutes: u32,
    starts: u32,
}

impl CompleteEntry {
    fn from_history(entry: &HistoryEntry) -> Option<Self> {
        Some(Self {
            round: entry.round,
            points: entry.total_points?,
            minutes: entry.minutes?,
            starts: entry.starts?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    counted: usize,
    points: i32,
    starts: u32,
    starter_minutes: u32,
    recent_appearances: u32,
}

/// Summarises a player's history (oldest first, as the feed returns it).
///
/// Two windows apply and they differ on purpose: `points_last_3` takes the
/// three most recent complete entries, while the games-played factor counts
/// appearances in the last three gameweek numbers. Start totals use every
/// complete entry.
pub fn recent_form(history: &[HistoryEntry], current_gameweek: u32) -> RecentForm {
    let first_recent_round = current_gameweek.saturating_sub(GAMEWEEK_WINDOW - 1);

    let tally = history
        .iter()
        .rev()
        .filter_map(CompleteEntry::from_history)
        .fold(Tally::default(), |mut t, e| {
            if t.counted < FORM_WINDOW {
                t.counted += 1;
                t.points += e.points;
            }
            if e.starts == 1 {
                t.starts += 1;
                t.starter_minutes += e.minutes;
            }
            if e.minutes > 0 && e.round.is_some_and(|r| r >= first_recent_round) {
                t.recent_appearances += 1;
            }
            t
        });

    let min_per_90 = if tally.starts == 0 {
        0.0
    } else {
        f64::from(tally.starter_minutes) / f64::from(tally.starts)
    };

    RecentForm {
        points_last_3: tally.points,
        starts: tally.starts,
        starter_minutes: tally.starter_minutes,
        min_per_90,
        early_sub: min_per_90 < EARLY_SUB_MINUTES,
        games_played_factor: games_played_factor(tally.recent_appearances, current_gameweek),
    }
}

fn games_played_factor(appearances: u32, current_gameweek: u32) -> f64 {
    let window = current_gameweek.min(GAMEWEEK_WINDOW);
    if window == 0 {
        return 1.0;
    }
    // Double gameweeks can yield more appearances than gameweeks.
    (f64::from(appearances) / f64::from(window)).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(round: u32, points: i32, minutes: u32, starts: u32) -> HistoryEntry {
        HistoryEntry {
            round: Some(round),
            total_points: Some(points),
            minutes: Some(minutes),
            starts: Some(starts),
            ..HistoryEntry::default()
        }
    }

    #[test]
    fn short_history_counts_everything_available() {
        let history = vec![entry(1, 5, 90, 1), entry(2, 3, 90, 1)];
        let form = recent_form(&history, 2);
        assert_eq!(form.points_last_3, 8);
    }

    #[test]
    fn points_come_from_most_recent_three() {
        let history = vec![
            entry(1, 15, 90, 1),
            entry(2, 1, 90, 1),
            entry(3, 2, 90, 1),
            entry(4, 3, 90, 1),
        ];
        let form = recent_form(&history, 4);
        assert_eq!(form.points_last_3, 6);
        assert_eq!(form.starts, 4);
        assert_eq!(form.starter_minutes, 360);
        assert!((form.min_per_90 - 90.0).abs() < 1e-12);
        assert!(!form.early_sub);
        assert!((form.games_played_factor - 1.0).abs() < 1e-12);
    }

    #[test]
    fn incomplete_entries_are_skipped() {
        let mut live = entry(5, 0, 0, 0);
        live.total_points = None;
        let history = vec![
            entry(2, 2, 90, 1),
            entry(3, 4, 90, 1),
            entry(4, 6, 90, 1),
            live,
        ];
        let form = recent_form(&history, 5);
        assert_eq!(form.points_last_3, 12);
        // Rounds 3 and 4 fall inside [3, 5]; the live round 5 entry is skipped.
        assert!((form.games_played_factor - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn substitute_minutes_do_not_count_as_starts() {
        let history = vec![entry(1, 2, 55, 1), entry(2, 1, 20, 0), entry(3, 2, 50, 1)];
        let form = recent_form(&history, 3);
        assert_eq!(form.starts, 2);
        assert_eq!(form.starter_minutes, 105);
        assert!((form.min_per_90 - 52.5).abs() < 1e-12);
        assert!(form.early_sub);
    }

    #[test]
    fn only_single_start_entries_count_as_starts() {
        let history = vec![entry(1, 2, 90, 1), entry(2, 4, 120, 2)];
        let form = recent_form(&history, 2);
        assert_eq!(form.starts, 1);
        assert_eq!(form.starter_minutes, 90);
        assert_eq!(form.points_last_3, 6);
    }

    #[test]
    fn no_starts_means_zero_minutes_per_start() {
        let form = recent_form(&[entry(1, 1, 10, 0)], 1);
        assert_eq!(form.min_per_90, 0.0);
        assert!(form.early_sub);
        assert!((form.games_played_factor - 1.0).abs() < 1e-12);
    }

    #[test]
    fn gameweek_zero_has_full_factor() {
        let form = recent_form(&[], 0);
        assert_eq!(form.games_played_factor, 1.0);
        assert_eq!(form.points_last_3, 0);
    }

    #[test]
    fn double_gameweek_factor_is_capped() {
        let history = vec![entry(1, 2, 90, 1), entry(1, 2, 90, 1), entry(2, 2, 90, 1)];
        let form = recent_form(&history, 2);
        assert_eq!(form.games_played_factor, 1.0);
    }
}
