use serde::{Deserialize, Serialize};

/// Position class as carried by the `element_type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    pub fn from_element_type(element_type: u8) -> Option<Self> {
        match element_type {
            1 => Some(Position::Goalkeeper),
            2 => Some(Position::Defender),
            3 => Some(Position::Midfielder),
            4 => Some(Position::Forward),
            _ => None,
        }
    }

    pub fn element_type(self) -> u8 {
        match self {
            Position::Goalkeeper => 1,
            Position::Defender => 2,
            Position::Midfielder => 3,
            Position::Forward => 4,
        }
    }

    pub fn role(self) -> Role {
        match self {
            Position::Goalkeeper | Position::Defender => Role::Defensive,
            Position::Midfielder | Position::Forward => Role::Attacking,
        }
    }

    pub fn short_label(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GK",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

/// Which side of the opponent's strength a player is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Defensive,
    Attacking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Venue {
    Home,
    Away,
}

impl Venue {
    pub fn opposite(self) -> Self {
        match self {
            Venue::Home => Venue::Away,
            Venue::Away => Venue::Home,
        }
    }
}

/// Availability decoded from the single-letter `status` code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Available,
    Doubtful,
    Injured,
    Suspended,
    // "u" (unavailable / left the club), "n" (not eligible) and anything new.
    Other,
}

impl Availability {
    pub fn from_status(code: &str) -> Self {
        match code.trim() {
            "a" => Availability::Available,
            "d" => Availability::Doubtful,
            "i" => Availability::Injured,
            "s" => Availability::Suspended,
            _ => Availability::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Team {
    pub id: u32,
    pub name: String,
    pub short_name: String,
    pub code: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Player {
    pub id: u32,
    #[serde(default)]
    pub web_name: String,
    pub team: u32,
    pub element_type: u8,
    pub status: String,
    pub now_cost: u32,
    pub total_points: i32,
}

impl Player {
    pub fn position(&self) -> Option<Position> {
        Position::from_element_type(self.element_type)
    }

    pub fn availability(&self) -> Availability {
        Availability::from_status(&self.status)
    }

    /// Price in £m; the feed quotes tenths.
    pub fn current_cost(&self) -> f64 {
        f64::from(self.now_cost) / 10.0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: u32,
    pub can_manage: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bootstrap {
    pub teams: Vec<Team>,
    pub elements: Vec<Player>,
    pub events: Vec<Event>,
}

impl Bootstrap {
    /// Last event that can no longer be managed, or 1 before the season starts.
    pub fn current_gameweek(&self) -> u32 {
        current_gameweek(&self.events)
    }
}

pub fn current_gameweek(events: &[Event]) -> u32 {
    events
        .iter()
        .rev()
        .find(|e| !e.can_manage)
        .map(|e| e.id)
        .unwrap_or(1)
}

#[derive(Debug, Clone, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub id: u32,
    pub event: Option<u32>,
    pub team_h: u32,
    pub team_a: u32,
    pub team_h_score: Option<u32>,
    pub team_a_score: Option<u32>,
    pub finished: bool,
}

impl Fixture {
    /// `(home, away)` goals once the match is finished. A finished fixture
    /// with a missing score counts that side as 0.
    pub fn final_score(&self) -> Option<(u32, u32)> {
        if !self.finished {
            return None;
        }
        Some((
            self.team_h_score.unwrap_or(0),
            self.team_a_score.unwrap_or(0),
        ))
    }
}

/// One past match from a player's summary. Every stat can be null while a
/// gameweek is still in progress.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryEntry {
    pub round: Option<u32>,
    pub total_points: Option<i32>,
    pub minutes: Option<u32>,
    pub starts: Option<u32>,
    #[serde(default)]
    pub opponent_team: Option<u32>,
    #[serde(default)]
    pub was_home: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpcomingFixture {
    pub team_h: u32,
    pub team_a: u32,
    pub is_home: bool,
    pub event: Option<u32>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub difficulty: Option<u8>,
}

impl UpcomingFixture {
    /// Opponent id and the venue the opponent plays at.
    pub fn opponent(&self) -> (u32, Venue) {
        if self.is_home {
            (self.team_a, Venue::Away)
        } else {
            (self.team_h, Venue::Home)
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerSummary {
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub fixtures: Vec<UpcomingFixture>,
}
