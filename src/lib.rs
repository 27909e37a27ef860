pub mod biography;
pub mod career;
pub mod config;
pub mod error;
pub mod files;
pub mod live_scraper;
pub mod normalize;
pub mod offline_extractor;
pub mod prepare;
pub mod schema;
pub mod season;
pub mod shots;
pub mod table;
pub mod upload;

mod ratelimit;
mod requests;
mod scraping_context;
mod text_manipulators;

pub use biography::{BioBlock, BioValue, Biography, BiographyExtractor, DuplicatePolicy};
pub use config::ScrapingConfig;
pub use error::ScrapeError;
pub use live_scraper::{Category, LiveScraper};
pub use normalize::{clean_table, normalize_season_log};
pub use offline_extractor::OfflineExtractor;
pub use schema::{SqlType, TableSchema};
pub use scraping_context::ScrapingContext;
pub use season::Season;
pub use table::Table;
