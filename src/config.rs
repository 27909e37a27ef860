use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use regex::Regex;
use serde::{Deserialize, de::DeserializeOwned};

use crate::season::Season;

const ENV_PREFIX: &str = "BOXSCORE_";

/// The env vars needed for scraping. Every one of them has a default, so an
/// empty environment scrapes Anthony Davis' 2012-13 through 2024-25 seasons.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrapingConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_player_path")]
    pub player_path: String,
    #[serde(default = "default_player_name")]
    pub player_name: String,
    #[serde(default = "default_first_season")]
    pub first_season: Season,
    #[serde(default = "default_last_season")]
    pub last_season: Season,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "https://www.basketball-reference.com".to_string()
}

fn default_player_path() -> String {
    "/players/d/davisan02".to_string()
}

fn default_player_name() -> String {
    "Anthony Davis".to_string()
}

fn default_first_season() -> Season {
    Season::ending(2013)
}

fn default_last_season() -> Season {
    Season::ending(2025)
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("ad_stats")
}

fn default_request_delay_ms() -> u64 {
    2_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
        .to_string()
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            player_path: default_player_path(),
            player_name: default_player_name(),
            first_season: default_first_season(),
            last_season: default_last_season(),
            data_dir: default_data_dir(),
            request_delay_ms: default_request_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ScrapingConfig {
    pub fn new() -> anyhow::Result<Self> {
        let config = Self::load_from_env()?;
        anyhow::ensure!(
            config.first_season <= config.last_season,
            "first season {} is after last season {}",
            config.first_season,
            config.last_season
        );
        Ok(config)
    }

    pub fn player_url(&self) -> String {
        format!(
            "{}{}.html",
            self.base_url.trim_end_matches('/'),
            self.player_path
        )
    }

    /// `{base}{player}/{category}/{end_year}`, the only shape of per-season
    /// page on the site.
    pub fn season_page_url(&self, category: &str, season: Season) -> String {
        format!(
            "{}{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.player_path,
            category,
            season.end_year()
        )
    }

    pub fn seasons(&self) -> Vec<Season> {
        Season::range(self.first_season, self.last_season)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub struct SeasonFileYearExtractor {
    // Regex that can be used to extract the season end year from a season
    // file name such as `game_logs_2013.csv` or `shots_2013.json`.
    year_extraction_regex: Regex,
}

impl SeasonFileYearExtractor {
    pub fn new() -> anyhow::Result<Self> {
        let year_extraction_regex = Regex::new(r"_(\d{4})\.(?:csv|json)$")?;
        Ok(Self {
            year_extraction_regex,
        })
    }

    pub fn extract_season(&self, file_name: &str) -> anyhow::Result<Season> {
        let Some(caps) = self.year_extraction_regex.captures(file_name) else {
            return Err(anyhow::anyhow!(
                "couldn't find season year in file name: {}",
                file_name
            ));
        };
        let Some(match_) = caps.get(1) else {
            return Err(anyhow::anyhow!(
                "couldn't find season year in file name: {}",
                file_name
            ));
        };
        let year = match_.as_str().parse::<i32>()?;
        Ok(Season::ending(year))
    }
}

/// The env config needed for loading prepared data into Postgres.
#[derive(Debug, Deserialize)]
pub struct UploadingConfig {
    pub database_url: String,
}

impl UploadingConfig {
    pub fn new() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        envy::from_env::<Self>().context("DATABASE_URL must be set to upload")
    }
}

// Extension trait.
pub trait LoadFromEnv: DeserializeOwned {
    fn load_from_env() -> anyhow::Result<Self> {
        // Don't throw an error if .env file doesn't exist.
        let _ = dotenv::dotenv();
        let config = envy::prefixed(ENV_PREFIX)
            .from_env::<Self>()
            .context("failed to load env variables into config struct")?;
        Ok(config)
    }
}

impl<T: DeserializeOwned> LoadFromEnv for T {}
