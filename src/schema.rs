use std::fmt;

use chrono::NaiveDate;

use crate::{normalize::ID_COLUMN, season::Season, table::Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Numeric,
    Text,
    Timestamp,
    Boolean,
}

impl SqlType {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Integer => "integer",
            SqlType::Numeric => "numeric",
            SqlType::Text => "text",
            SqlType::Timestamp => "timestamp",
            SqlType::Boolean => "boolean",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

// Headers whose lower-cased form would not be a usable identifier.
const COLUMN_MAPPING: [(&str, &str); 11] = [
    ("FG%", "fg_pct"),
    ("3P", "three_p"),
    ("3PA", "three_pa"),
    ("3P%", "three_p_pct"),
    ("2P", "two_p"),
    ("2PA", "two_pa"),
    ("2P%", "two_p_pct"),
    ("eFG%", "efg_pct"),
    ("FT%", "ft_pct"),
    ("+/-", "plus_minus"),
    // Blank column indicates home/away.
    ("", "is_away"),
];

/// Maps a scraped header to a lower-case SQL identifier. Applying it to its
/// own output is a no-op.
pub fn storage_column_name(header: &str) -> String {
    let header = header.trim();
    if let Some((_, name)) = COLUMN_MAPPING.iter().find(|(from, _)| *from == header) {
        return name.to_string();
    }

    let mut name = String::with_capacity(header.len());
    for c in header.to_lowercase().chars() {
        match c {
            'a'..='z' | '0'..='9' | '_' => name.push(c),
            '%' => name.push_str("_pct"),
            _ => name.push('_'),
        }
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert_str(0, "n_");
    }
    name
}

/// Picks the narrowest storage type every value fits. Blank cells are
/// tolerated by the numeric/timestamp types (they load as NULL) but not by
/// integer and boolean; a column with nothing in it is text.
pub fn infer_sql_type<'a>(values: impl IntoIterator<Item = &'a str>) -> SqlType {
    let values: Vec<&str> = values.into_iter().map(str::trim).collect();
    let filled: Vec<&str> = values.iter().copied().filter(|v| !v.is_empty()).collect();
    if filled.is_empty() {
        return SqlType::Text;
    }
    let complete = filled.len() == values.len();

    if complete
        && filled
            .iter()
            .all(|v| v.eq_ignore_ascii_case("true") || v.eq_ignore_ascii_case("false"))
    {
        SqlType::Boolean
    } else if filled
        .iter()
        .all(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").is_ok())
    {
        SqlType::Timestamp
    } else if complete && filled.iter().all(|v| v.parse::<i64>().is_ok()) {
        SqlType::Integer
    } else if filled
        .iter()
        .all(|v| v.parse::<f64>().is_ok_and(|n| n.is_finite()))
    {
        SqlType::Numeric
    } else {
        SqlType::Text
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub table_name: String,
    pub season: Option<Season>,
    pub columns: Vec<(String, SqlType)>,
}

impl TableSchema {
    /// One column per header, typed from the column's values. `id` is
    /// always an integer.
    pub fn infer(table_name: &str, season: Option<Season>, table: &Table) -> Self {
        let columns = table
            .headers
            .iter()
            .enumerate()
            .map(|(position, header)| {
                let sql_type = if header == ID_COLUMN {
                    SqlType::Integer
                } else {
                    infer_sql_type(table.column(position))
                };
                (header.clone(), sql_type)
            })
            .collect();
        Self {
            table_name: table_name.to_string(),
            season,
            columns,
        }
    }

    pub fn column_type(&self, column: &str) -> Option<SqlType> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, sql_type)| *sql_type)
    }

    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns
            .iter()
            .map(|(name, sql_type)| {
                if name == ID_COLUMN {
                    format!("    {ID_COLUMN} integer primary key")
                } else {
                    format!("    {name} {sql_type}")
                }
            })
            .collect();

        let heading = match self.season {
            Some(season) => format!("-- {} Season", season.span_label()),
            None => format!("-- {}", self.table_name),
        };
        format!(
            "{heading}\ncreate table {} (\n{}\n);\n\n",
            self.table_name,
            columns.join(",\n")
        )
    }

    pub fn drop_table_sql(&self) -> String {
        format!("drop table if exists {};\n", self.table_name)
    }
}

/// Every schema's `create table` block under one title comment.
pub fn combined_sql(title: &str, schemas: &[TableSchema]) -> String {
    let mut sql = format!("-- {title}\n\n");
    for schema in schemas {
        sql.push_str(&schema.create_table_sql());
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_headers_to_identifiers() {
        assert_eq!(storage_column_name("FG%"), "fg_pct");
        assert_eq!(storage_column_name("3PA"), "three_pa");
        assert_eq!(storage_column_name("+/-"), "plus_minus");
        assert_eq!(storage_column_name(""), "is_away");
        assert_eq!(storage_column_name(" Game Score "), "game_score");
        assert_eq!(storage_column_name("USG%"), "usg_pct");
        assert_eq!(storage_column_name("3PAr"), "n_3par");
        assert_eq!(storage_column_name("Opp"), "opp");
    }

    #[test]
    fn renaming_is_idempotent() {
        for header in ["FG%", "3PAr", "USG%", "Game Score", "+/-", "Date"] {
            let once = storage_column_name(header);
            assert_eq!(storage_column_name(&once), once);
        }
    }

    #[test]
    fn infers_types() {
        assert_eq!(infer_sql_type(["1", "2", "30"]), SqlType::Integer);
        assert_eq!(infer_sql_type(["1", "", "30"]), SqlType::Numeric);
        assert_eq!(infer_sql_type([".512", "1.000"]), SqlType::Numeric);
        assert_eq!(infer_sql_type(["true", "false"]), SqlType::Boolean);
        assert_eq!(infer_sql_type(["2012-10-31", "2012-11-02"]), SqlType::Timestamp);
        assert_eq!(infer_sql_type(["36:12", "40:01"]), SqlType::Text);
        assert_eq!(infer_sql_type(["W (+5)", "1"]), SqlType::Text);
        assert_eq!(infer_sql_type(["", ""]), SqlType::Text);
    }

    #[test]
    fn id_is_always_the_integer_primary_key() {
        let table = Table::new(
            vec!["id".into(), "date".into(), "pts".into(), "is_away".into()],
            vec![
                vec!["1".into(), "2012-10-31".into(), "21".into(), "false".into()],
                vec!["2".into(), "2012-11-02".into(), "14.5".into(), "true".into()],
            ],
        );
        let schema = TableSchema::infer("game_logs_2012_2013", Some(Season::ending(2013)), &table);
        assert_eq!(schema.column_type("pts"), Some(SqlType::Numeric));
        assert_eq!(
            schema.create_table_sql(),
            "-- 2012-2013 Season\n\
             create table game_logs_2012_2013 (\n    \
             id integer primary key,\n    \
             date timestamp,\n    \
             pts numeric,\n    \
             is_away boolean\n\
             );\n\n"
        );
    }

    #[test]
    fn combines_blocks_under_a_title() {
        let table = Table::new(vec!["id".into()], vec![vec!["1".into()]]);
        let schemas = [
            TableSchema::infer("game_logs_2012_2013", Some(Season::ending(2013)), &table),
            TableSchema::infer("game_logs_2013_2014", Some(Season::ending(2014)), &table),
        ];
        let sql = combined_sql("Anthony Davis Game Logs Tables", &schemas);
        assert!(sql.starts_with("-- Anthony Davis Game Logs Tables\n\n-- 2012-2013 Season\n"));
        assert_eq!(sql.matches("create table").count(), 2);
    }
}
