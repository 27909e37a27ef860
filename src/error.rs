use thiserror::Error;

/// Failures local to one table or one season file. Callers log these and
/// move on to the next table/season.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("no table with id `{0}` in the page")]
    TableNotFound(String),

    #[error("column `{column}` is missing from {context}")]
    MissingColumn { column: String, context: String },

    #[error("row {row} has an unparseable date: `{value}`")]
    InvalidDate { row: usize, value: String },

    #[error("`{0}` is not a season (expected e.g. `2012-13` or `2013`)")]
    InvalidSeason(String),
}
