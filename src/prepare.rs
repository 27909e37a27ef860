use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use log::{info, warn};

use crate::{
    config::SeasonFileYearExtractor,
    normalize::normalize_season_log,
    schema::{TableSchema, combined_sql},
    season::Season,
    table::Table,
};

pub struct PrepareOptions {
    /// Where the scraped `game_logs_{end_year}.csv` files live.
    pub input_dir: PathBuf,
    /// Where the cleaned per-season CSVs go.
    pub output_dir: PathBuf,
    /// The combined `create table` file.
    pub sql_file: PathBuf,
    pub player_name: String,
}

/// One season's game log ready to load.
#[derive(Debug)]
pub struct PreparedSeason {
    pub season: Season,
    pub schema: TableSchema,
    pub table: Table,
    pub csv_path: PathBuf,
}

pub fn game_log_table_name(season: Season) -> String {
    format!("game_logs_{}", season.table_suffix())
}

/// Prepares one season file and writes its cleaned CSV into `output_dir`.
pub fn prepare_season_file(
    path: &Path,
    season: Season,
    output_dir: &Path,
) -> anyhow::Result<PreparedSeason> {
    let raw = Table::read_csv(path)?;
    let table = normalize_season_log(raw)
        .with_context(|| format!("failed to normalize {}", path.display()))?;

    let table_name = game_log_table_name(season);
    let csv_path = output_dir.join(format!("{table_name}.csv"));
    table.write_csv(&csv_path)?;
    info!("Exported {} data to {}", season, csv_path.display());

    let schema = TableSchema::infer(&table_name, Some(season), &table);
    Ok(PreparedSeason {
        season,
        schema,
        table,
        csv_path,
    })
}

/// Season files in `dir` matching `pattern`, ordered by season.
pub fn season_files(dir: &Path, pattern: &str) -> anyhow::Result<Vec<(Season, PathBuf)>> {
    let extractor = SeasonFileYearExtractor::new()?;
    let glob_pattern = dir.join(pattern);
    let glob_pattern = glob_pattern
        .to_str()
        .with_context(|| format!("non UTF-8 path: {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in glob::glob(glob_pattern)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable path: {e}");
                continue;
            }
        };
        let file_name = path.file_name().and_then(|name| name.to_str()).unwrap_or_default();
        match extractor.extract_season(file_name) {
            Ok(season) => files.push((season, path)),
            Err(e) => warn!("Skipping {}: {e}", path.display()),
        }
    }
    files.sort();
    Ok(files)
}

/// Prepares every season log in `input_dir` and writes the combined SQL
/// file. A season that fails is logged and left out of both.
pub fn prepare_game_logs(options: &PrepareOptions) -> anyhow::Result<Vec<PreparedSeason>> {
    fs::create_dir_all(&options.output_dir)
        .with_context(|| format!("failed to create {}", options.output_dir.display()))?;

    let mut prepared = Vec::new();
    for (season, path) in season_files(&options.input_dir, "game_logs_*.csv")? {
        match prepare_season_file(&path, season, &options.output_dir) {
            Ok(season_log) => prepared.push(season_log),
            Err(e) => warn!("Skipping {}: {e:#}", path.display()),
        }
    }

    let schemas: Vec<TableSchema> = prepared.iter().map(|p| p.schema.clone()).collect();
    let sql = combined_sql(&format!("{} Game Logs Tables", options.player_name), &schemas);
    if let Some(parent) = options.sql_file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&options.sql_file, sql)
        .with_context(|| format!("failed to write {}", options.sql_file.display()))?;
    info!(
        "SQL table definitions exported to {}",
        options.sql_file.display()
    );
    Ok(prepared)
}
