use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use log::{info, warn};
use scraper::Html;

use crate::{
    biography::{Biography, BiographyExtractor},
    files::write_json,
    normalize::clean_table,
    table::{Footer, Table},
    text_manipulators::reveal_commented_markup,
};

pub const PLAYER_INFO_FILE: &str = "player_info.json";

/// Career tables of the player page and the CSV each one is saved as.
pub const CAREER_TABLES: [(&str, &str); 12] = [
    ("per_game", "per_game.csv"),
    ("totals", "totals.csv"),
    ("per_minute", "per_36_minutes.csv"),
    ("per_poss", "per_100_poss.csv"),
    ("advanced", "advanced.csv"),
    ("adj_shooting", "adjusted_shooting.csv"),
    ("pbp", "play_by_play.csv"),
    ("shooting", "shooting.csv"),
    ("highs", "game_highs.csv"),
    ("playoffs_series", "playoffs_series.csv"),
    ("all_star", "all_star_games.csv"),
    ("all_college_stats", "college_stats.csv"),
];

#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub biography: Biography,
    pub tables_written: Vec<PathBuf>,
    pub tables_skipped: Vec<(String, String)>,
}

pub struct OfflineExtractor {
    biography_extractor: BiographyExtractor,
}

impl OfflineExtractor {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            biography_extractor: BiographyExtractor::new()?,
        })
    }

    pub fn extract_file(&self, snapshot: &Path, out_dir: &Path) -> anyhow::Result<ExtractionReport> {
        let html = fs::read_to_string(snapshot)
            .with_context(|| format!("failed to read snapshot {}", snapshot.display()))?;
        self.extract_html(&html, out_dir)
    }

    /// Writes `player_info.json` and one CSV per career table found in the
    /// page. A table that is missing or fails to parse is skipped.
    pub fn extract_html(&self, html: &str, out_dir: &Path) -> anyhow::Result<ExtractionReport> {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;
        let document = Html::parse_document(&reveal_commented_markup(html));

        let biography = self.biography_extractor.extract_document(&document)?;
        write_json(&out_dir.join(PLAYER_INFO_FILE), &biography)?;
        info!(
            "Saved {} ({} fields)",
            PLAYER_INFO_FILE,
            biography.len()
        );

        let mut report = ExtractionReport {
            biography,
            ..Default::default()
        };
        for (table_id, file_name) in CAREER_TABLES {
            let path = out_dir.join(file_name);
            let saved = Table::from_html(&document, table_id, Footer::Include)
                .map(clean_table)
                .and_then(|table| table.write_csv(&path));
            match saved {
                Ok(()) => {
                    info!("Saved {file_name}");
                    report.tables_written.push(path);
                }
                Err(e) => {
                    warn!("Error processing table {table_id}: {e:#}");
                    report.tables_skipped.push((table_id.to_string(), e.to_string()));
                }
            }
        }
        Ok(report)
    }
}
