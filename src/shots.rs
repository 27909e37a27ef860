use std::{fs, path::Path};

use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use log::{info, warn};
use regex::Regex;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::season::Season;

/// Shots inserted per statement.
pub const BATCH_SIZE: usize = 100;

const CREATE_SHOTS_TABLE: &str = "create table if not exists shots (
    id serial primary key,
    x double precision,
    y double precision,
    shot_type text,
    game_date date,
    season text,
    quarter text,
    time_remaining text,
    shot_description text,
    score_situation text,
    distance integer
)";

const INSERT_SHOTS: &str = "insert into shots (x, y, shot_type, game_date, season, quarter, \
     time_remaining, shot_description, score_situation, distance) ";

/// One entry of a `shots_{end_year}.json` shot chart export.
#[derive(Debug, Clone, Deserialize)]
pub struct RawShot {
    pub x: f64,
    pub y: f64,
    #[serde(rename = "type")]
    pub shot_type: String,
    /// `Oct 31, 2012, NOH vs SAS`
    pub game: String,
    /// `1st Qtr, 10:10 remaining`
    pub time: String,
    /// `Made 2-pointer from 18 ft`
    pub shot: String,
    pub score: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shot {
    pub x: f64,
    pub y: f64,
    pub shot_type: String,
    pub game_date: NaiveDate,
    pub season: Season,
    pub quarter: String,
    pub time_remaining: String,
    pub shot_description: String,
    pub score_situation: String,
    pub distance: i32,
}

pub struct ShotParser {
    distance_regex: Regex,
}

impl ShotParser {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            distance_regex: Regex::new(r"from (\d+) ft")?,
        })
    }

    pub fn parse(&self, raw: RawShot) -> anyhow::Result<Shot> {
        let (game_date, season) = game_date_and_season(&raw.game)?;
        let (quarter, time_remaining) = quarter_and_time(&raw.time)?;
        let distance = self.distance(&raw.shot);
        Ok(Shot {
            x: raw.x,
            y: raw.y,
            shot_type: raw.shot_type,
            game_date,
            season,
            quarter,
            time_remaining,
            shot_description: raw.shot,
            score_situation: raw.score,
            distance,
        })
    }

    /// Feet from the shot description; 0 when it names none.
    pub fn distance(&self, description: &str) -> i32 {
        self.distance_regex
            .captures(description)
            .and_then(|caps| caps[1].parse().ok())
            .unwrap_or(0)
    }
}

/// `Oct 31, 2012, NOH vs SAS` is a 2012-10-31 game of the 2012-13 season.
/// Games from October on belong to the season ending the next year.
pub fn game_date_and_season(game: &str) -> anyhow::Result<(NaiveDate, Season)> {
    let mut parts = game.splitn(3, ',');
    let (Some(month_day), Some(year)) = (parts.next(), parts.next()) else {
        anyhow::bail!("no game date in `{game}`");
    };
    let date = NaiveDate::parse_from_str(
        &format!("{}, {}", month_day.trim(), year.trim()),
        "%b %d, %Y",
    )
    .with_context(|| format!("no game date in `{game}`"))?;
    let end_year = if date.month() >= 10 {
        date.year() + 1
    } else {
        date.year()
    };
    Ok((date, Season::ending(end_year)))
}

/// `1st Qtr, 10:10 remaining` -> (`1st Qtr`, `10:10`).
pub fn quarter_and_time(time: &str) -> anyhow::Result<(String, String)> {
    let (quarter, remaining) = time
        .split_once(", ")
        .with_context(|| format!("no quarter and clock in `{time}`"))?;
    Ok((
        quarter.trim().to_string(),
        remaining.replace(" remaining", "").trim().to_string(),
    ))
}

/// Reads a shot chart export. Shots whose game or clock cannot be read are
/// logged and left out.
pub fn read_shots(path: &Path, parser: &ShotParser) -> anyhow::Result<Vec<Shot>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw: Vec<RawShot> = serde_json::from_str(&json)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let mut shots = Vec::with_capacity(raw.len());
    for (number, raw) in raw.into_iter().enumerate() {
        match parser.parse(raw) {
            Ok(shot) => shots.push(shot),
            Err(e) => warn!("Skipping shot {} of {}: {e:#}", number + 1, path.display()),
        }
    }
    Ok(shots)
}

async fn insert_batch(pool: &PgPool, batch: &[Shot]) -> anyhow::Result<()> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(INSERT_SHOTS);
    builder.push_values(batch, |mut row, shot| {
        row.push_bind(shot.x)
            .push_bind(shot.y)
            .push_bind(shot.shot_type.clone())
            .push_bind(shot.game_date.format("%Y-%m-%d").to_string())
            .push_unseparated("::date")
            .push_bind(shot.season.span_label())
            .push_bind(shot.quarter.clone())
            .push_bind(shot.time_remaining.clone())
            .push_bind(shot.shot_description.clone())
            .push_bind(shot.score_situation.clone())
            .push_bind(shot.distance);
    });
    builder.build().execute(pool).await?;
    Ok(())
}

/// Loads one shot chart export into `shots`, `BATCH_SIZE` shots per
/// insert. A batch that fails is logged and the rest still go in. Returns
/// the number of shots inserted.
pub async fn upload_shots(pool: &PgPool, path: &Path) -> anyhow::Result<usize> {
    let parser = ShotParser::new()?;
    let shots = read_shots(path, &parser)?;
    info!("Processing {} shots from {}", shots.len(), path.display());

    sqlx::query(CREATE_SHOTS_TABLE).execute(pool).await?;
    let mut uploaded = 0;
    for (number, batch) in shots.chunks(BATCH_SIZE).enumerate() {
        match insert_batch(pool, batch).await {
            Ok(()) => {
                uploaded += batch.len();
                info!(
                    "Uploaded {} shots ({uploaded}/{})",
                    batch.len(),
                    shots.len()
                );
            }
            Err(e) => warn!("Error uploading batch {}: {e:#}", number + 1),
        }
    }
    Ok(uploaded)
}
