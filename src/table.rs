use std::{collections::HashMap, fs, path::Path};

use anyhow::Context;
use csv::{ReaderBuilder, WriterBuilder};
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Number, Value};

use crate::{error::ScrapeError, text_manipulators::extract_text};

/// Header prefix given to blank header cells, the same name a dataframe
/// reader would invent for them.
pub const PLACEHOLDER_PREFIX: &str = "Unnamed";

pub fn placeholder_name(position: usize) -> String {
    format!("{PLACEHOLDER_PREFIX}: {position}")
}

pub fn is_placeholder(header: &str) -> bool {
    header.starts_with(PLACEHOLDER_PREFIX)
}

pub(crate) fn selector(css: &str) -> anyhow::Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid selector `{css}`: {e}"))
}

/// Whether a parsed table keeps its `<tfoot>` rows (career or season
/// totals).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Footer {
    Include,
    Skip,
}

/// A rectangular table of strings. `index` holds one label per row, the
/// row's position in the source table until something reindexes it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub index: Vec<usize>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows: Vec<Vec<String>> = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        let index = (0..rows.len()).collect();
        Self {
            headers,
            rows,
            index,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    pub fn require_column(&self, name: &str, context: &str) -> Result<usize, ScrapeError> {
        self.column_position(name)
            .ok_or_else(|| ScrapeError::MissingColumn {
                column: name.to_string(),
                context: context.to_string(),
            })
    }

    pub fn column(&self, position: usize) -> impl Iterator<Item = &str> {
        self.rows.iter().map(move |row| row[position].as_str())
    }

    pub fn drop_column(&mut self, position: usize) {
        self.headers.remove(position);
        for row in &mut self.rows {
            row.remove(position);
        }
    }

    pub fn insert_column(&mut self, position: usize, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        self.headers.insert(position, name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.insert(position, value);
        }
    }

    /// Keeps the rows (and their index labels) for which `keep` is true.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String]) -> bool,
    {
        let (rows, index): (Vec<Vec<String>>, Vec<usize>) = std::mem::take(&mut self.rows)
            .into_iter()
            .zip(std::mem::take(&mut self.index))
            .filter(|(row, _)| keep(row))
            .unzip();
        self.rows = rows;
        self.index = index;
    }

    /// Parses `<table id="{id}">` out of a document.
    pub fn from_html(document: &Html, id: &str, footer: Footer) -> anyhow::Result<Table> {
        let table_selector = selector(&format!(r#"table[id="{id}"]"#))?;
        let table = document
            .select(&table_selector)
            .next()
            .ok_or_else(|| ScrapeError::TableNotFound(id.to_string()))?;
        parse_table_element(table, footer)
    }

    /// Rows as JSON objects keyed by header. Cells that look numeric become
    /// JSON numbers, blank cells become null.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row)
                    .map(|(header, cell)| (header.clone(), cell_to_json(cell)))
                    .collect()
            })
            .collect()
    }

    pub fn write_csv(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let mut writer = WriterBuilder::new()
            .from_path(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads a CSV with a header row. Blank header cells get placeholder
    /// names, short rows are padded.
    pub fn read_csv(path: &Path) -> anyhow::Result<Table> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let headers = reader
            .headers()
            .with_context(|| format!("failed to read CSV headers of {}", path.display()))?
            .iter()
            .enumerate()
            .map(|(position, header)| {
                if header.trim().is_empty() {
                    placeholder_name(position)
                } else {
                    header.to_string()
                }
            })
            .collect();

        let mut rows = Vec::new();
        for (line, record) in reader.records().enumerate() {
            let record = record
                .with_context(|| format!("failed to parse row {} of {}", line + 1, path.display()))?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(Table::new(headers, rows))
    }
}

fn cell_to_json(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = cell.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(number) = cell.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    Value::String(cell.to_string())
}

fn colspan(cell: ElementRef) -> usize {
    cell.value()
        .attr("colspan")
        .and_then(|span| span.parse().ok())
        .unwrap_or(1)
        .max(1)
}

/// Cell texts of one row, a `colspan="n"` cell repeated n times.
fn expand_row(row: ElementRef, cell_selector: &Selector, label: impl Fn(ElementRef) -> String) -> Vec<String> {
    row.select(cell_selector)
        .flat_map(|cell| std::iter::repeat_n(label(cell), colspan(cell)))
        .collect()
}

fn has_class(element: ElementRef, class: &str) -> bool {
    element
        .value()
        .attr("class")
        .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
}

fn parse_table_element(table: ElementRef, footer: Footer) -> anyhow::Result<Table> {
    let header_row_selector = selector("thead > tr")?;
    let body_row_selector = selector("tbody > tr")?;
    let footer_row_selector = selector("tfoot > tr")?;
    let any_row_selector = selector("tr")?;
    let cell_selector = selector("th, td")?;

    // Tables flagged `suppress_all` abbreviate their header text; the
    // aria-label carries the readable name.
    let use_aria_labels = has_class(table, "suppress_all");
    let header_label = |cell: ElementRef| match cell.value().attr("aria-label") {
        Some(label) if use_aria_labels && !label.trim().is_empty() => label.trim().to_string(),
        _ => extract_text(cell),
    };

    let mut header_rows: Vec<Vec<String>> = table
        .select(&header_row_selector)
        .map(|row| expand_row(row, &cell_selector, header_label))
        .collect();
    let headless = header_rows.is_empty();
    if headless {
        if let Some(first) = table.select(&any_row_selector).next() {
            header_rows.push(expand_row(first, &cell_selector, header_label));
        }
    }
    let headers = merge_header_rows(&header_rows);

    let mut body_rows: Vec<ElementRef> = table.select(&body_row_selector).collect();
    if headless {
        body_rows = table.select(&any_row_selector).skip(1).collect();
    }
    if footer == Footer::Include {
        body_rows.extend(table.select(&footer_row_selector));
    }

    let rows = body_rows
        .into_iter()
        .filter(|row| !has_class(*row, "thead") && !has_class(*row, "over_header"))
        .map(|row| expand_row(row, &cell_selector, extract_text))
        .filter(|cells| cells.iter().any(|cell| !cell.is_empty()))
        .collect();

    Ok(Table::new(headers, rows))
}

/// Collapses a multi-row header into one name per column. The last row
/// names the column; a name that repeats across column groups is prefixed
/// with its group label from the row above so every name stays distinct.
fn merge_header_rows(header_rows: &[Vec<String>]) -> Vec<String> {
    let Some(names) = header_rows.last() else {
        return Vec::new();
    };
    let groups = header_rows.len().checked_sub(2).map(|i| &header_rows[i]);

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for name in names {
        *counts.entry(name.as_str()).or_default() += 1;
    }

    let mut seen: HashMap<String, usize> = HashMap::new();
    names
        .iter()
        .enumerate()
        .map(|(position, name)| {
            if name.is_empty() {
                return placeholder_name(position);
            }
            let group = groups
                .and_then(|groups| groups.get(position))
                .filter(|group| !group.is_empty());
            let mut merged = match group {
                Some(group) if counts[name.as_str()] > 1 => format!("{group} {name}"),
                _ => name.clone(),
            };
            // Still ambiguous (same group, or no group at all).
            let occurrence = seen.entry(merged.clone()).or_default();
            *occurrence += 1;
            if *occurrence > 1 {
                merged = format!("{merged}.{}", *occurrence - 1);
            }
            merged
        })
        .collect()
}
