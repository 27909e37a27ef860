//! Career tables of the player page (`per_game.csv`, `advanced.csv`)
//! reshaped for loading: one row per season and team, descriptive column
//! names, typed columns. Career, per-team and league summary lines are
//! left out.

use log::debug;
use regex::Regex;

use crate::{
    error::ScrapeError,
    normalize::ID_COLUMN,
    schema::{SqlType, TableSchema},
    table::Table,
};

const SEASON_COLUMN: &str = "Season";
/// Newer page layouts say `Team`, older ones `Tm`.
const TEAM_COLUMNS: [&str; 2] = ["Team", "Tm"];
const SUMMARY_MARKER: &str = "Yrs";

#[derive(Debug, Clone, Copy)]
pub struct CareerColumn {
    sources: &'static [&'static str],
    pub name: &'static str,
    pub sql_type: SqlType,
    blank_as: Option<&'static str>,
}

const fn column(
    sources: &'static [&'static str],
    name: &'static str,
    sql_type: SqlType,
) -> CareerColumn {
    CareerColumn {
        sources,
        name,
        sql_type,
        blank_as: None,
    }
}

impl CareerColumn {
    /// Value stored when the source cell is blank.
    const fn blank_as(mut self, value: &'static str) -> Self {
        self.blank_as = Some(value);
        self
    }
}

const PER_GAME_COLUMNS: [CareerColumn; 31] = [
    column(&["Season"], "season", SqlType::Text),
    column(&["Age"], "age", SqlType::Integer),
    column(&TEAM_COLUMNS, "team", SqlType::Text),
    column(&["Lg"], "league", SqlType::Text),
    column(&["Pos"], "position", SqlType::Text),
    column(&["G"], "games", SqlType::Integer),
    column(&["GS"], "games_started", SqlType::Integer),
    column(&["MP"], "minutes_per_game", SqlType::Numeric),
    column(&["FG"], "field_goals", SqlType::Numeric),
    column(&["FGA"], "field_goal_attempts", SqlType::Numeric),
    column(&["FG%"], "field_goal_percentage", SqlType::Numeric),
    column(&["3P"], "three_pointers", SqlType::Numeric),
    column(&["3PA"], "three_point_attempts", SqlType::Numeric),
    // A season without a three-point attempt has no percentage.
    column(&["3P%"], "three_point_percentage", SqlType::Numeric).blank_as("0"),
    column(&["2P"], "two_pointers", SqlType::Numeric),
    column(&["2PA"], "two_point_attempts", SqlType::Numeric),
    column(&["2P%"], "two_point_percentage", SqlType::Numeric),
    column(&["eFG%"], "effective_field_goal_percentage", SqlType::Numeric),
    column(&["FT"], "free_throws", SqlType::Numeric),
    column(&["FTA"], "free_throw_attempts", SqlType::Numeric),
    column(&["FT%"], "free_throw_percentage", SqlType::Numeric),
    column(&["ORB"], "offensive_rebounds", SqlType::Numeric),
    column(&["DRB"], "defensive_rebounds", SqlType::Numeric),
    column(&["TRB"], "total_rebounds", SqlType::Numeric),
    column(&["AST"], "assists", SqlType::Numeric),
    column(&["STL"], "steals", SqlType::Numeric),
    column(&["BLK"], "blocks", SqlType::Numeric),
    column(&["TOV"], "turnovers", SqlType::Numeric),
    column(&["PF"], "personal_fouls", SqlType::Numeric),
    column(&["PTS"], "points", SqlType::Numeric),
    column(&["Awards"], "awards", SqlType::Text),
];

const ADVANCED_COLUMNS: [CareerColumn; 29] = [
    column(&["Season"], "season", SqlType::Text),
    column(&["Age"], "age", SqlType::Integer),
    column(&TEAM_COLUMNS, "team", SqlType::Text),
    column(&["Lg"], "league", SqlType::Text),
    column(&["Pos"], "position", SqlType::Text),
    column(&["G"], "games", SqlType::Integer),
    column(&["GS"], "games_started", SqlType::Integer),
    column(&["MP"], "minutes_played", SqlType::Integer),
    column(&["PER"], "player_efficiency_rating", SqlType::Numeric),
    column(&["TS%"], "true_shooting_percentage", SqlType::Numeric),
    column(&["3PAr"], "three_point_attempt_rate", SqlType::Numeric),
    column(&["FTr"], "free_throw_rate", SqlType::Numeric),
    column(&["ORB%"], "offensive_rebound_percentage", SqlType::Numeric),
    column(&["DRB%"], "defensive_rebound_percentage", SqlType::Numeric),
    column(&["TRB%"], "total_rebound_percentage", SqlType::Numeric),
    column(&["AST%"], "assist_percentage", SqlType::Numeric),
    column(&["STL%"], "steal_percentage", SqlType::Numeric),
    column(&["BLK%"], "block_percentage", SqlType::Numeric),
    column(&["TOV%"], "turnover_percentage", SqlType::Numeric),
    column(&["USG%"], "usage_percentage", SqlType::Numeric),
    column(&["OWS"], "offensive_win_shares", SqlType::Numeric),
    column(&["DWS"], "defensive_win_shares", SqlType::Numeric),
    column(&["WS"], "win_shares", SqlType::Numeric),
    column(&["WS/48"], "win_shares_per_48", SqlType::Numeric),
    column(&["OBPM"], "offensive_box_plus_minus", SqlType::Numeric),
    column(&["DBPM"], "defensive_box_plus_minus", SqlType::Numeric),
    column(&["BPM"], "box_plus_minus", SqlType::Numeric),
    column(&["VORP"], "value_over_replacement", SqlType::Numeric),
    column(&["Awards"], "awards", SqlType::Text),
];

/// One career table as loaded: its CSV from the offline extraction and the
/// table it goes into.
#[derive(Debug, Clone, Copy)]
pub struct CareerTable {
    pub table_name: &'static str,
    pub file_name: &'static str,
    columns: &'static [CareerColumn],
}

pub const PER_GAME_STATS: CareerTable = CareerTable {
    table_name: "per_game_stats",
    file_name: "per_game.csv",
    columns: &PER_GAME_COLUMNS,
};

pub const ADVANCED_STATS: CareerTable = CareerTable {
    table_name: "advanced_stats",
    file_name: "advanced.csv",
    columns: &ADVANCED_COLUMNS,
};

pub const CAREER_UPLOADS: [CareerTable; 2] = [PER_GAME_STATS, ADVANCED_STATS];

pub struct SummaryRowFilter {
    // A single season such as `2012-13`.
    season_format: Regex,
}

impl SummaryRowFilter {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            season_format: Regex::new(r"^\d{4}-\d{2}$")?,
        })
    }

    /// Blank lines, `N Yrs` totals and anything whose season is not a
    /// single `YYYY-YY` (career and per-team summaries).
    pub fn is_summary_row(&self, season: &str, team: &str) -> bool {
        let (season, team) = (season.trim(), team.trim());
        season.is_empty()
            || team.is_empty()
            || season.contains(SUMMARY_MARKER)
            || team.contains(SUMMARY_MARKER)
            || !self.season_format.is_match(season)
    }
}

impl CareerTable {
    /// `id` first, then the mapped columns.
    pub fn schema(&self) -> TableSchema {
        let columns = std::iter::once((ID_COLUMN.to_string(), SqlType::Integer))
            .chain(
                self.columns
                    .iter()
                    .map(|column| (column.name.to_string(), column.sql_type)),
            )
            .collect();
        TableSchema {
            table_name: self.table_name.to_string(),
            season: None,
            columns,
        }
    }

    /// Season rows of `raw` under the table's column names, numbered from 1.
    /// A source column the page does not have loads as blank.
    pub fn reshape(&self, raw: &Table, filter: &SummaryRowFilter) -> Result<Table, ScrapeError> {
        let season = raw.require_column(SEASON_COLUMN, self.file_name)?;
        let team = TEAM_COLUMNS
            .iter()
            .find_map(|name| raw.column_position(name))
            .ok_or_else(|| ScrapeError::MissingColumn {
                column: TEAM_COLUMNS[0].to_string(),
                context: self.file_name.to_string(),
            })?;

        let sources: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|column| {
                let source = column
                    .sources
                    .iter()
                    .find_map(|name| raw.column_position(name));
                if source.is_none() {
                    debug!("{} has no column for {}", self.file_name, column.name);
                }
                source
            })
            .collect();

        let rows: Vec<Vec<String>> = raw
            .rows
            .iter()
            .filter(|row| !filter.is_summary_row(&row[season], &row[team]))
            .map(|row| {
                self.columns
                    .iter()
                    .zip(&sources)
                    .map(|(column, source)| {
                        let cell = source.map(|position| row[position].trim()).unwrap_or_default();
                        match column.blank_as {
                            Some(value) if cell.is_empty() => value.to_string(),
                            _ => cell.to_string(),
                        }
                    })
                    .collect()
            })
            .collect();

        let ids = (1..=rows.len()).map(|id| id.to_string()).collect();
        let headers = self
            .columns
            .iter()
            .map(|column| column.name.to_string())
            .collect();
        let mut table = Table::new(headers, rows);
        table.insert_column(0, ID_COLUMN, ids);
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    #[test]
    fn summary_rows() {
        let filter = SummaryRowFilter::new().unwrap();
        assert!(!filter.is_summary_row("2012-13", "NOH"));
        assert!(!filter.is_summary_row("2024-25", "2TM"));
        assert!(filter.is_summary_row("", "NOH"));
        assert!(filter.is_summary_row("2012-13", " "));
        assert!(filter.is_summary_row("13 Yrs", "NOP"));
        assert!(filter.is_summary_row("Career", "7 Yrs"));
        assert!(filter.is_summary_row("Career", "NOP"));
        assert!(filter.is_summary_row("2012-2013", "NOH"));
    }

    #[test]
    fn reshapes_per_game_rows() {
        let raw = Table::new(
            strings(&["Season", "Age", "Tm", "Lg", "Pos", "G", "GS", "MP", "3P%", "PTS", "Awards"]),
            vec![
                strings(&["2012-13", "19", "NOH", "NBA", "PF", "64", "60", "28.8", "", "13.5", ""]),
                strings(&["2013-14", "20", "NOP", "NBA", "PF", "67", "66", "35.2", ".222", "20.8", "AS"]),
                strings(&["Career", "", "", "NBA", "", "820", "815", "34.5", ".298", "24.1", ""]),
                strings(&["7 Yrs", "", "NOP", "NBA", "", "466", "461", "34.8", ".299", "23.7", ""]),
            ],
        );
        let filter = SummaryRowFilter::new().unwrap();
        let table = PER_GAME_STATS.reshape(&raw, &filter).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.headers.len(), PER_GAME_COLUMNS.len() + 1);
        assert_eq!(&table.headers[..4], ["id", "season", "age", "team"]);

        let column = |name: &str| {
            let position = table.column_position(name).unwrap();
            table.column(position).collect::<Vec<_>>()
        };
        assert_eq!(column("id"), ["1", "2"]);
        assert_eq!(column("team"), ["NOH", "NOP"]);
        assert_eq!(column("three_point_percentage"), ["0", ".222"]);
        assert_eq!(column("points"), ["13.5", "20.8"]);
        assert_eq!(column("awards"), ["", "AS"]);
        // Not in the source table.
        assert_eq!(column("field_goals"), ["", ""]);
    }

    #[test]
    fn newer_layout_names_the_team_column_team() {
        let raw = Table::new(
            strings(&["Season", "Team", "PER"]),
            vec![strings(&["2019-20", "LAL", "27.5"])],
        );
        let filter = SummaryRowFilter::new().unwrap();
        let table = ADVANCED_STATS.reshape(&raw, &filter).unwrap();
        let team = table.column_position("team").unwrap();
        assert_eq!(table.rows[0][team], "LAL");
    }

    #[test]
    fn missing_season_column_is_an_error() {
        let raw = Table::new(strings(&["Team", "PTS"]), vec![strings(&["NOH", "13.5"])]);
        let filter = SummaryRowFilter::new().unwrap();
        let err = PER_GAME_STATS.reshape(&raw, &filter).unwrap_err();
        assert!(matches!(err, ScrapeError::MissingColumn { column, .. } if column == "Season"));
    }

    #[test]
    fn schema_types_the_mapped_columns() {
        let schema = ADVANCED_STATS.schema();
        assert_eq!(schema.table_name, "advanced_stats");
        assert_eq!(schema.column_type("id"), Some(SqlType::Integer));
        assert_eq!(schema.column_type("minutes_played"), Some(SqlType::Integer));
        assert_eq!(schema.column_type("win_shares_per_48"), Some(SqlType::Numeric));
        assert_eq!(schema.column_type("awards"), Some(SqlType::Text));
        assert!(schema.create_table_sql().starts_with("-- advanced_stats\ncreate table advanced_stats (\n    id integer primary key,\n"));
    }
}
