use std::path::{Path, PathBuf};

use anyhow::Context;
use boxscore::{
    LiveScraper, OfflineExtractor, ScrapingConfig, ScrapingContext, Season, files,
    prepare::{self, PrepareOptions, season_files},
    shots,
    upload::{self, ReadCareerTables, ReadFromDir},
};
use clap::{Parser, Subcommand, ValueEnum};
use dotenv::dotenv;
use log::{LevelFilter, info, warn};
use sqlx::PgPool;

#[derive(Parser)]
#[command(name = "boxscore", about = "Scrape one player's basketball-reference stats into CSV, JSON and SQL")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch game logs, advanced logs, lineups and on-off stats per season.
    Scrape {
        /// Season to scrape (`2012-13` or `2013`); repeatable. Defaults to
        /// the configured range.
        #[arg(long)]
        season: Vec<Season>,
        /// Overrides BOXSCORE_DATA_DIR.
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Also fetch the main player page (biography and career tables).
        #[arg(long)]
        player_page: bool,
    },
    /// Parse a saved player page into player_info.json and career CSVs.
    Extract {
        snapshot: PathBuf,
        #[arg(long, default_value = "data")]
        out_dir: PathBuf,
    },
    /// Clean scraped game logs and write per-season CSVs plus CREATE TABLE statements.
    Prepare {
        #[arg(long, default_value = "data/game_logs")]
        input_dir: PathBuf,
        #[arg(long, default_value = "scripts/db/output")]
        output_dir: PathBuf,
        #[arg(long, default_value = "scripts/db/create_game_logs_tables.sql")]
        sql_file: PathBuf,
    },
    /// Add a .csv extension to extension-less lineup exports.
    RenameLineups {
        #[arg(long, default_value = "data/lineups")]
        base_dir: PathBuf,
        #[arg(long, default_value_t = 2013)]
        first_year: i32,
        #[arg(long, default_value_t = 2025)]
        last_year: i32,
    },
    /// Load prepared game logs, career tables or shot charts into Postgres
    /// (DATABASE_URL).
    Upload {
        #[arg(value_enum, default_value_t = UploadTarget::GameLogs)]
        target: UploadTarget,
        /// Defaults to scripts/db/output, data or data/shot_charts by target.
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Drop existing tables first (game logs and career tables).
        #[arg(long)]
        replace: bool,
        /// Shot chart season to load (`2013` or `2012-13`); repeatable.
        /// Defaults to every `shots_{year}.json` in the directory.
        #[arg(long)]
        season: Vec<Season>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum UploadTarget {
    /// `game_logs_{start}_{end}.csv` from `prepare`.
    GameLogs,
    /// per_game.csv and advanced.csv from `extract`.
    Career,
    /// `shots_{end_year}.json` shot chart exports.
    Shots,
}

impl UploadTarget {
    fn default_dir(&self) -> PathBuf {
        PathBuf::from(match self {
            UploadTarget::GameLogs => "scripts/db/output",
            UploadTarget::Career => "data",
            UploadTarget::Shots => "data/shot_charts",
        })
    }
}

async fn run_upload_shots(pool: &PgPool, dir: &Path, seasons: Vec<Season>) -> anyhow::Result<usize> {
    let files: Vec<PathBuf> = if seasons.is_empty() {
        season_files(dir, "shots_*.json")?
            .into_iter()
            .map(|(_, path)| path)
            .collect()
    } else {
        seasons
            .iter()
            .map(|season| dir.join(format!("shots_{}.json", season.end_year())))
            .collect()
    };

    let mut total = 0;
    for path in files {
        match shots::upload_shots(pool, &path).await {
            Ok(uploaded) => total += uploaded,
            Err(e) => warn!("Error processing shots in {}: {e:#}", path.display()),
        }
    }
    Ok(total)
}

async fn run_scrape(
    mut config: ScrapingConfig,
    seasons: Vec<Season>,
    data_dir: Option<PathBuf>,
    player_page: bool,
) -> anyhow::Result<()> {
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }
    let seasons = if seasons.is_empty() {
        config.seasons()
    } else {
        seasons
    };
    let scraper = LiveScraper::new(ScrapingContext::new(config)?)?;

    if player_page {
        match scraper.scrape_player_page().await {
            Ok(report) => info!(
                "Player page: {} biography fields, {} tables",
                report.biography.len(),
                report.tables_written.len()
            ),
            Err(e) => warn!("Error scraping player info: {e:#}"),
        }
    }

    let summary = scraper.scrape_all_seasons(&seasons).await;
    info!(
        "Done: {} files written, {} tables skipped",
        summary.written.len(),
        summary.failed.len()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Scrape {
            season,
            data_dir,
            player_page,
        } => run_scrape(ScrapingConfig::new()?, season, data_dir, player_page).await?,
        Command::Extract { snapshot, out_dir } => {
            let report = OfflineExtractor::new()?.extract_file(&snapshot, &out_dir)?;
            info!(
                "Extracted {} biography fields and {} tables into {}",
                report.biography.len(),
                report.tables_written.len(),
                out_dir.display()
            );
        }
        Command::Prepare {
            input_dir,
            output_dir,
            sql_file,
        } => {
            let config = ScrapingConfig::new()?;
            let prepared = prepare::prepare_game_logs(&PrepareOptions {
                input_dir,
                output_dir,
                sql_file,
                player_name: config.player_name,
            })?;
            info!("Prepared {} seasons", prepared.len());
        }
        Command::RenameLineups {
            base_dir,
            first_year,
            last_year,
        } => {
            let report = files::rename_lineup_files(&base_dir, first_year..=last_year);
            info!(
                "Renamed {} files, {} failed",
                report.renamed.len(),
                report.failed.len()
            );
        }
        Command::Upload {
            target,
            dir,
            replace,
            season,
        } => {
            let config = boxscore::config::UploadingConfig::new()?;
            let pool = upload::connect(&config.database_url)
                .await
                .context("failed to connect to the database")?;
            let dir = dir.unwrap_or_else(|| target.default_dir());
            let rows = match target {
                UploadTarget::GameLogs => upload::upload(&pool, &ReadFromDir { dir }, replace).await?,
                UploadTarget::Career => {
                    upload::upload(&pool, &ReadCareerTables { dir }, replace).await?
                }
                UploadTarget::Shots => run_upload_shots(&pool, &dir, season).await?,
            };
            info!("Uploaded {rows} rows");
        }
    }
    Ok(())
}
