use std::path::{Path, PathBuf};

use log::{info, warn};
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    career::{CAREER_UPLOADS, SummaryRowFilter},
    prepare::{PreparedSeason, season_files},
    schema::TableSchema,
    table::Table,
};

/// One table ready to load: its schema and rows in schema column order.
#[derive(Debug, Clone)]
pub struct UploadTable {
    pub schema: TableSchema,
    pub table: Table,
}

impl From<PreparedSeason> for UploadTable {
    fn from(prepared: PreparedSeason) -> Self {
        Self {
            schema: prepared.schema,
            table: prepared.table,
        }
    }
}

/// Where the tables to load come from.
pub trait PreparedData {
    fn tables(&self) -> anyhow::Result<Vec<UploadTable>>;
}

/// Season game logs previously written by `prepare`, e.g.
/// `game_logs_2012_2013.csv`.
pub struct ReadFromDir {
    pub dir: PathBuf,
}

/// `per_game.csv` and `advanced.csv` of an offline extraction, loaded into
/// `per_game_stats` and `advanced_stats` without their summary rows.
pub struct ReadCareerTables {
    pub dir: PathBuf,
}

impl PreparedData for ReadFromDir {
    fn tables(&self) -> anyhow::Result<Vec<UploadTable>> {
        season_files(&self.dir, "game_logs_*_*.csv")?
            .into_iter()
            .map(|(season, csv_path)| {
                let table = Table::read_csv(&csv_path)?;
                let table_name = table_name_of(&csv_path)?;
                let schema = TableSchema::infer(&table_name, Some(season), &table);
                Ok(UploadTable { schema, table })
            })
            .collect()
    }
}

impl PreparedData for ReadCareerTables {
    /// A career table that is missing or unreadable is logged and skipped.
    fn tables(&self) -> anyhow::Result<Vec<UploadTable>> {
        let filter = SummaryRowFilter::new()?;
        let mut tables = Vec::new();
        for career in CAREER_UPLOADS {
            let path = self.dir.join(career.file_name);
            let reshaped = Table::read_csv(&path)
                .and_then(|raw| Ok(career.reshape(&raw, &filter)?));
            match reshaped {
                Ok(table) => tables.push(UploadTable {
                    schema: career.schema(),
                    table,
                }),
                Err(e) => warn!("Skipping {}: {e:#}", path.display()),
            }
        }
        Ok(tables)
    }
}

fn table_name_of(path: &Path) -> anyhow::Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("no table name in {}", path.display()))
}

/// `insert into t (a, b) values ($1::integer, $2::text)`; parameters are
/// bound as text and cast server side.
pub fn insert_statement(schema: &TableSchema) -> String {
    let columns: Vec<&str> = schema.columns.iter().map(|(name, _)| name.as_str()).collect();
    let values: Vec<String> = schema
        .columns
        .iter()
        .enumerate()
        .map(|(i, (_, sql_type))| format!("${}::{}", i + 1, sql_type.as_sql()))
        .collect();
    format!(
        "insert into {} ({}) values ({})",
        schema.table_name,
        columns.join(", "),
        values.join(", ")
    )
}

/// Blank cells load as NULL.
fn bind_value(cell: &str) -> Option<String> {
    let cell = cell.trim();
    (!cell.is_empty()).then(|| cell.to_string())
}

pub async fn connect(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Creates each table and inserts its rows, one transaction per table.
/// With `replace`, an existing table is dropped first.
pub async fn upload(pool: &PgPool, data: &impl PreparedData, replace: bool) -> anyhow::Result<usize> {
    let mut total = 0;
    for upload_table in data.tables()? {
        let schema = &upload_table.schema;
        let mut tx = pool.begin().await?;
        if replace {
            sqlx::query(&schema.drop_table_sql()).execute(&mut *tx).await?;
        }
        sqlx::query(&schema.create_table_sql()).execute(&mut *tx).await?;

        let statement = insert_statement(schema);
        for row in &upload_table.table.rows {
            let mut query = sqlx::query(&statement);
            for cell in row {
                query = query.bind(bind_value(cell));
            }
            query.execute(&mut *tx).await?;
        }
        tx.commit().await?;

        info!(
            "Inserted {} rows into {}",
            upload_table.table.len(),
            schema.table_name
        );
        total += upload_table.table.len();
    }
    Ok(total)
}
