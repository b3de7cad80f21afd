pub mod config;
pub mod error;
pub mod fixture_difficulty;
pub mod fpl_fetch;
pub mod http_client;
pub mod logging;
pub mod models;
pub mod pipeline;
pub mod player_form;
pub mod rating;
pub mod selection;
pub mod store;
pub mod team_strength;
