use std::{fmt, path::PathBuf};

use log::{error, info, warn};
use scraper::Html;
use serde_json::{Map, Value};

use crate::{
    files::write_json,
    normalize::clean_table,
    offline_extractor::{ExtractionReport, OfflineExtractor},
    scraping_context::ScrapingContext,
    season::Season,
    table::{Footer, Table},
    text_manipulators::reveal_commented_markup,
};

const RANK_COLUMN: &str = "Rk";

/// Table ids of the regular-season game log, newest layout last.
const GAME_LOG_TABLES: [&str; 2] = ["pgl_basic", "player_game_log_reg"];
const ADVANCED_LOG_TABLES: [&str; 2] = ["pgl_advanced", "player_game_log_adv_reg"];
const LINEUP_SIZES: [u8; 4] = [5, 4, 3, 2];
const ON_OFF_TABLE: &str = "on-off";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    GameLog,
    AdvancedLog,
    Lineups,
    OnOff,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::GameLog,
        Category::AdvancedLog,
        Category::Lineups,
        Category::OnOff,
    ];

    /// Path segment of the season page.
    pub fn page(&self) -> &'static str {
        match self {
            Category::GameLog => "gamelog",
            Category::AdvancedLog => "gamelog-advanced",
            Category::Lineups => "lineups",
            Category::OnOff => "on-off",
        }
    }

    pub fn output_dir(&self) -> &'static str {
        match self {
            Category::GameLog => "game_logs",
            Category::AdvancedLog => "advanced_logs",
            Category::Lineups => "lineups",
            Category::OnOff => "on_off",
        }
    }

    pub fn output_file(&self, season: Season) -> String {
        match self {
            Category::GameLog => format!("game_logs_{}.csv", season.end_year()),
            Category::AdvancedLog => format!("advanced_{}.csv", season.label()),
            Category::Lineups => format!("lineups_{}.json", season.label()),
            Category::OnOff => format!("on_off_{}.csv", season.label()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::GameLog => "game log",
            Category::AdvancedLog => "advanced game log",
            Category::Lineups => "lineups",
            Category::OnOff => "on-off",
        })
    }
}

#[derive(Debug, Default)]
pub struct ScrapeSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(Season, Category, String)>,
}

pub struct LiveScraper {
    context: ScrapingContext,
    offline_extractor: OfflineExtractor,
}

impl LiveScraper {
    pub fn new(context: ScrapingContext) -> anyhow::Result<Self> {
        Ok(Self {
            context,
            offline_extractor: OfflineExtractor::new()?,
        })
    }

    fn output_path(&self, category: Category, season: Season) -> PathBuf {
        self.context
            .scraping_config
            .data_dir
            .join(category.output_dir())
            .join(category.output_file(season))
    }

    async fn fetch_document(&self, url: &str) -> anyhow::Result<Html> {
        let body = self.context.request_client.fetch_url_body(url).await?;
        Ok(Html::parse_document(&reveal_commented_markup(&body)))
    }

    /// Biography and career tables of the player's main page, saved under
    /// `{data_dir}/player_info`.
    pub async fn scrape_player_page(&self) -> anyhow::Result<ExtractionReport> {
        let url = self.context.scraping_config.player_url();
        info!("Fetching player information from {url}");
        let body = self.context.request_client.fetch_url_body(&url).await?;
        let out_dir = self.context.scraping_config.data_dir.join("player_info");
        self.offline_extractor.extract_html(&body, &out_dir)
    }

    /// Fetches one season page and saves its table(s). `Ok(None)` means the
    /// page had none of the tables asked for.
    pub async fn scrape_category(
        &self,
        category: Category,
        season: Season,
    ) -> anyhow::Result<Option<PathBuf>> {
        info!("Scraping {category} for {season} season...");
        let url = self
            .context
            .scraping_config
            .season_page_url(category.page(), season);
        let document = self.fetch_document(&url).await?;
        let path = self.output_path(category, season);

        let saved = match category {
            Category::GameLog => find_table(&document, &GAME_LOG_TABLES)
                .map(|table| without_rank(table).write_csv(&path))
                .transpose()?,
            Category::AdvancedLog => find_table(&document, &ADVANCED_LOG_TABLES)
                .map(|table| clean_table(without_rank(table)).write_csv(&path))
                .transpose()?,
            Category::OnOff => find_table(&document, &[ON_OFF_TABLE])
                .map(|table| clean_table(table).write_csv(&path))
                .transpose()?,
            Category::Lineups => {
                let lineups = lineup_records(&document);
                if lineups.is_empty() {
                    None
                } else {
                    Some(write_json(&path, &lineups)?)
                }
            }
        };
        Ok(saved.map(|()| path))
    }

    pub async fn scrape_season(&self, season: Season, summary: &mut ScrapeSummary) {
        for category in Category::ALL {
            match self.scrape_category(category, season).await {
                Ok(Some(path)) => {
                    info!("Saved {}", path.display());
                    summary.written.push(path);
                }
                Ok(None) => {
                    warn!("No {category} table found for season {season}");
                    summary
                        .failed
                        .push((season, category, "table not found".to_string()));
                }
                Err(e) => {
                    error!("Failed to scrape {category} for season {season}: {e:#}");
                    summary.failed.push((season, category, e.to_string()));
                }
            }
        }
    }

    /// Walks every configured season in order. Failures are logged and
    /// collected; nothing aborts the run.
    pub async fn scrape_all_seasons(&self, seasons: &[Season]) -> ScrapeSummary {
        let mut summary = ScrapeSummary::default();
        for (done, season) in seasons.iter().enumerate() {
            info!("[{}/{}] {season}", done + 1, seasons.len());
            self.scrape_season(*season, &mut summary).await;
        }
        summary
    }
}

/// First of `ids` present in the document. A table that is present but
/// fails to parse counts as absent.
fn find_table(document: &Html, ids: &[&str]) -> Option<Table> {
    ids.iter()
        .find_map(|id| Table::from_html(document, id, Footer::Skip).ok())
}

fn without_rank(mut table: Table) -> Table {
    if let Some(rank) = table.column_position(RANK_COLUMN) {
        table.drop_column(rank);
    }
    table
}

/// `{"5-man": [...], "4-man": [...], ...}` for the lineup tables present.
fn lineup_records(document: &Html) -> Map<String, Value> {
    let mut lineups = Map::new();
    for size in LINEUP_SIZES {
        let id = format!("lineups-{size}-man");
        let Some(table) = find_table(document, &[id.as_str()]) else {
            continue;
        };
        let records = clean_table(table)
            .to_records()
            .into_iter()
            .map(Value::Object)
            .collect();
        lineups.insert(format!("{size}-man"), Value::Array(records));
    }
    lineups
}
