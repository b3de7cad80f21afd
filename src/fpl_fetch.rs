use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::blocking::Client;

use crate::http_client::http_client;
use crate::models::{Bootstrap, Fixture, PlayerSummary};

pub const FPL_BASE_URL: &str = "https://fantasy.premierleague.com/api";

/// Where a batch run reads its raw data from.
pub trait FplSource {
    fn bootstrap(&self) -> Result<Bootstrap>;
    fn fixtures(&self) -> Result<Vec<Fixture>>;
    fn player_summary(&self, player_id: u32) -> Result<PlayerSummary>;
}

/// Live source backed by the public fantasy API.
pub struct HttpSource {
    client: &'static Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn get_text(&self, path: &str) -> Result<String> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("request failed: {url}"))?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("http {status} from {url}"));
        }
        Ok(body)
    }
}

impl FplSource for HttpSource {
    fn bootstrap(&self) -> Result<Bootstrap> {
        let body = self.get_text("/bootstrap-static/")?;
        parse_bootstrap_json(&body)
    }

    fn fixtures(&self) -> Result<Vec<Fixture>> {
        let body = self.get_text("/fixtures/")?;
        parse_fixtures_json(&body)
    }

    fn player_summary(&self, player_id: u32) -> Result<PlayerSummary> {
        if player_id == 0 {
            return Err(anyhow!("player id must be positive"));
        }
        let body = self.get_text(&format!("/element-summary/{player_id}/"))?;
        parse_player_summary_json(&body).with_context(|| format!("player {player_id}"))
    }
}

fn non_empty<'a>(raw: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow!("empty {what} response"));
    }
    Ok(trimmed)
}

pub fn parse_bootstrap_json(raw: &str) -> Result<Bootstrap> {
    let trimmed = non_empty(raw, "bootstrap")?;
    serde_json::from_str(trimmed).context("bootstrap response shape unexpected")
}

pub fn parse_fixtures_json(raw: &str) -> Result<Vec<Fixture>> {
    let trimmed = non_empty(raw, "fixtures")?;
    serde_json::from_str(trimmed).context("fixtures response shape unexpected (expected list)")
}

pub fn parse_player_summary_json(raw: &str) -> Result<PlayerSummary> {
    let trimmed = non_empty(raw, "player summary")?;
    serde_json::from_str(trimmed).context("player summary response shape unexpected")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_body_is_an_error() {
        assert!(parse_bootstrap_json("null").is_err());
        assert!(parse_fixtures_json("  ").is_err());
    }

    #[test]
    fn padded_body_is_trimmed_before_parsing() {
        let summary = parse_player_summary_json("\n  {\"history\":[]}  \n").expect("valid");
        assert!(summary.history.is_empty());
        let err = parse_player_summary_json(" null ").expect_err("null body");
        assert!(err.to_string().contains("empty player summary"));
    }

    #[test]
    fn summary_without_history_is_rejected() {
        let err = parse_player_summary_json(r#"{"fixtures":[]}"#).expect_err("history required");
        assert!(err.to_string().contains("shape"));
    }

    #[test]
    fn summary_without_fixtures_defaults_empty() {
        let summary = parse_player_summary_json(r#"{"history":[]}"#).expect("valid");
        assert!(summary.fixtures.is_empty());
    }
}
