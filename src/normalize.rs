use std::collections::HashSet;

use chrono::NaiveDate;
use log::debug;

use crate::{
    error::ScrapeError,
    schema::storage_column_name,
    table::{Table, is_placeholder},
};

pub const ID_COLUMN: &str = "id";
pub const AWAY_COLUMN: &str = "is_away";
pub const AWAY_MARKER: &str = "@";

const DATE_COLUMN: &str = "date";
const GAMES_STARTED_COLUMN: &str = "gs";
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%m/%d/%Y", "%b %d, %Y"];

/// Drops placeholder columns, repeated header rows and duplicate rows, and
/// reindexes from 0 when the row labels are no longer unique. Running it on
/// its own output changes nothing.
pub fn clean_table(mut table: Table) -> Table {
    let placeholders: Vec<usize> = (0..table.headers.len())
        .filter(|&position| is_placeholder(&table.headers[position]))
        .collect();
    for position in placeholders.into_iter().rev() {
        table.drop_column(position);
    }

    drop_repeated_headers(&mut table);
    let mut seen = HashSet::new();
    table.retain_rows(|row| seen.insert(row.to_vec()));

    let mut labels = HashSet::new();
    if !table.index.iter().all(|label| labels.insert(*label)) {
        table.index = (0..table.len()).collect();
    }
    table
}

/// Turns a raw per-season game log into storage shape:
///
/// 1. the blank home/away column becomes the boolean `is_away`,
/// 2. the other placeholder columns go, headers get storage names,
/// 3. rows are sorted by date and games not played (non-numeric `gs`) are
///    dropped,
/// 4. an `id` column numbering the remaining games from 1 is put first.
pub fn normalize_season_log(mut table: Table) -> Result<Table, ScrapeError> {
    drop_repeated_headers(&mut table);
    if let Some(marker) = find_away_marker_column(&table) {
        let is_away = table
            .column(marker)
            .map(|cell| (cell.trim() == AWAY_MARKER).to_string())
            .collect();
        table.drop_column(marker);
        table.insert_column(marker, AWAY_COLUMN, is_away);
    } else {
        debug!("no home/away marker column in season log");
    }

    let mut table = clean_table(table);
    table.headers = table
        .headers
        .iter()
        .map(|header| storage_column_name(header))
        .collect();
    if let Some(id) = table.column_position(ID_COLUMN) {
        table.drop_column(id);
    }

    let date = table.require_column(DATE_COLUMN, "season log")?;
    let games_started = table.require_column(GAMES_STARTED_COLUMN, "season log")?;

    // Games not played (non-numeric `gs`) go before dates are read: their
    // date cell may be blank.
    let mut played = Vec::with_capacity(table.len());
    for (row_number, mut row) in std::mem::take(&mut table.rows).into_iter().enumerate() {
        if !is_number(&row[games_started]) {
            continue;
        }
        let day = parse_game_date(&row[date]).ok_or_else(|| ScrapeError::InvalidDate {
            row: row_number + 1,
            value: row[date].clone(),
        })?;
        row[date] = day.format("%Y-%m-%d").to_string();
        played.push((day, row));
    }
    // Stable, so double-headers keep their source order.
    played.sort_by_key(|(day, _)| *day);
    let played: Vec<Vec<String>> = played.into_iter().map(|(_, row)| row).collect();

    let ids = (1..=played.len()).map(|id| id.to_string()).collect();
    let mut table = Table::new(table.headers, played);
    table.insert_column(0, ID_COLUMN, ids);
    Ok(table)
}

/// Multi-section markup repeats the header row inside the body.
fn drop_repeated_headers(table: &mut Table) {
    let headers = table.headers.clone();
    table.retain_rows(|row| row != headers.as_slice());
}

/// The home/away column is a placeholder-headed column whose filled cells
/// are all `@`. A season of home games only leaves that column empty, so
/// the first empty placeholder column is the fallback.
fn find_away_marker_column(table: &Table) -> Option<usize> {
    let candidates: Vec<(usize, bool)> = (0..table.headers.len())
        .filter_map(|position| {
            let header = table.headers[position].trim();
            if !header.is_empty() && !is_placeholder(header) {
                return None;
            }
            let mut filled = table
                .column(position)
                .map(str::trim)
                .filter(|cell| !cell.is_empty())
                .peekable();
            let has_marker = filled.peek().is_some();
            filled
                .all(|cell| cell == AWAY_MARKER)
                .then_some((position, has_marker))
        })
        .collect();
    candidates
        .iter()
        .find(|(_, has_marker)| *has_marker)
        .or(candidates.first())
        .map(|(position, _)| *position)
}

fn parse_game_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn is_number(value: &str) -> bool {
    value
        .trim()
        .parse::<f64>()
        .is_ok_and(|number| number.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|cell| cell.to_string()).collect()
    }

    fn raw_game_log() -> Table {
        Table::new(
            strings(&["Rk", "G", "Date", "Tm", "Unnamed: 4", "Opp", "Unnamed: 6", "GS", "PTS"]),
            vec![
                strings(&["3", "", "2012-11-05", "NOH", "", "MIL", "L (-4)", "Inactive", ""]),
                strings(&["1", "1", "2012-10-31", "NOH", "", "SAS", "L (-4)", "1", "21"]),
                strings(&["Rk", "G", "Date", "Tm", "Unnamed: 4", "Opp", "Unnamed: 6", "GS", "PTS"]),
                strings(&["2", "2", "2012-11-02", "NOH", "@", "UTA", "W (+2)", "0", "14"]),
                strings(&["4", "3", "2012-11-07", "NOH", "@", "CHA", "W (+11)", "1", "28"]),
            ],
        )
    }

    #[test]
    fn clean_table_drops_placeholder_columns() {
        let table = clean_table(raw_game_log());
        assert!(!table.headers.iter().any(|header| header.starts_with("Unnamed")));
        assert_eq!(table.headers, ["Rk", "G", "Date", "Tm", "Opp", "GS", "PTS"]);
    }

    #[test]
    fn clean_table_drops_repeated_headers_and_duplicates() {
        let mut raw = raw_game_log();
        raw.rows.push(raw.rows[0].clone());
        raw.index.push(5);
        let table = clean_table(raw);
        assert_eq!(table.len(), 4);
        assert!(table.rows.iter().all(|row| row[0] != "Rk"));
        assert_eq!(table.index, [0, 1, 3, 4]);
    }

    #[test]
    fn clean_table_reindexes_duplicate_labels() {
        let mut raw = Table::new(strings(&["a"]), vec![strings(&["1"]), strings(&["2"])]);
        raw.index = vec![7, 7];
        assert_eq!(clean_table(raw).index, [0, 1]);
    }

    #[test]
    fn clean_table_is_idempotent() {
        let once = clean_table(raw_game_log());
        let twice = clean_table(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn season_log_flags_away_games() {
        let table = normalize_season_log(raw_game_log()).unwrap();
        assert_eq!(
            table.headers,
            ["id", "rk", "g", "date", "tm", "is_away", "opp", "gs", "pts"]
        );
        let away = table.column_position("is_away").unwrap();
        assert_eq!(table.column(away).collect::<Vec<_>>(), ["false", "true", "true"]);
    }

    #[test]
    fn season_log_keeps_only_games_played() {
        let table = normalize_season_log(raw_game_log()).unwrap();
        let gs = table.column_position("gs").unwrap();
        // "Inactive" is gone, the 0 start survives.
        assert_eq!(table.column(gs).collect::<Vec<_>>(), ["1", "0", "1"]);
    }

    #[test]
    fn season_log_ids_follow_dates() {
        let table = normalize_season_log(raw_game_log()).unwrap();
        let ids: Vec<usize> = table.column(0).map(|id| id.parse().unwrap()).collect();
        assert_eq!(ids, [1, 2, 3]);
        let date = table.column_position("date").unwrap();
        let dates: Vec<&str> = table.column(date).collect();
        assert_eq!(dates, ["2012-10-31", "2012-11-02", "2012-11-07"]);
    }

    #[test]
    fn season_log_is_idempotent() {
        let once = normalize_season_log(raw_game_log()).unwrap();
        let twice = normalize_season_log(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn season_log_rejects_bad_dates() {
        let mut raw = raw_game_log();
        raw.rows[1][2] = "sometime".to_string();
        let err = normalize_season_log(raw).unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidDate { value, .. } if value == "sometime"));
    }

    #[test]
    fn season_log_requires_games_started() {
        let raw = Table::new(strings(&["Date"]), vec![strings(&["2012-10-31"])]);
        let err = normalize_season_log(raw).unwrap_err();
        assert!(matches!(err, ScrapeError::MissingColumn { column, .. } if column == "gs"));
    }

    #[test]
    fn season_log_ignores_dates_of_games_not_played() {
        let raw = Table::new(
            strings(&["Date", "Unnamed: 1", "Opp", "GS"]),
            vec![
                strings(&["2012-11-02", "@", "UTA", "1"]),
                strings(&["2012-10-31", "", "SAS", "0"]),
                strings(&["", "", "", "Did Not Play"]),
            ],
        );
        let table = normalize_season_log(raw).unwrap();
        assert_eq!(table.len(), 2);
        let date = table.column_position("date").unwrap();
        assert_eq!(table.column(date).collect::<Vec<_>>(), ["2012-10-31", "2012-11-02"]);
    }

    #[test]
    fn season_log_reports_row_of_bad_date() {
        let raw = Table::new(
            strings(&["Date", "GS"]),
            vec![strings(&["2012-10-31", "1"]), strings(&["", "1"])],
        );
        let err = normalize_season_log(raw).unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidDate { row: 2, .. }));
    }

    #[test]
    fn home_only_season_still_gets_away_flag() {
        let raw = Table::new(
            strings(&["Date", "Unnamed: 1", "Opp", "Unnamed: 3", "GS"]),
            vec![
                strings(&["2012-10-31", "", "SAS", "L (-4)", "1"]),
                strings(&["2012-11-02", "", "UTA", "W (+2)", "1"]),
            ],
        );
        let table = normalize_season_log(raw).unwrap();
        assert_eq!(table.headers, ["id", "date", "is_away", "opp", "gs"]);
        let away = table.column_position("is_away").unwrap();
        assert_eq!(table.column(away).collect::<Vec<_>>(), ["false", "false"]);
    }

    #[test]
    fn marker_column_with_at_signs_beats_empty_placeholder() {
        let raw = Table::new(
            strings(&["Unnamed: 0", "Date", "Unnamed: 2", "GS"]),
            vec![
                strings(&["", "2012-10-31", "@", "1"]),
                strings(&["", "2012-11-02", "", "1"]),
            ],
        );
        assert_eq!(find_away_marker_column(&raw), Some(2));
    }

    #[test]
    fn numbers() {
        assert!(is_number("0"));
        assert!(is_number(" 12.5 "));
        assert!(!is_number("Did Not Play"));
        assert!(!is_number(""));
        assert!(!is_number("NaN"));
    }
}
