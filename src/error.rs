use thiserror::Error;

/// Upstream data that the rating stages cannot work around. Any of these
/// aborts the run before anything is persisted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    #[error("player {player_id} has unknown element_type {element_type}")]
    UnknownPosition { player_id: u32, element_type: u8 },

    #[error("player {player_id} has a fixture against unknown team {team_id}")]
    UnknownTeam { player_id: u32, team_id: u32 },

    #[error("no summary fetched for player {player_id}")]
    MissingSummary { player_id: u32 },
}
