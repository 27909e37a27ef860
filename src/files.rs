use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use log::{info, warn};
use serde::Serialize;

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Default)]
pub struct RenameReport {
    pub renamed: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl RenameReport {
    fn absorb(&mut self, other: RenameReport) {
        self.renamed.extend(other.renamed);
        self.failed.extend(other.failed);
    }
}

/// Gives every extension-less file directly inside `dir` a `.csv`
/// extension. A file that cannot be renamed (e.g. the target already
/// exists) is reported and left alone.
pub fn add_csv_extension(dir: &Path) -> anyhow::Result<RenameReport> {
    let mut report = RenameReport::default();
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to list {}", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| !name.contains('.'))
        })
        .collect();
    files.sort();

    for old_path in files {
        let new_path = old_path.with_extension("csv");
        if new_path.exists() {
            warn!(
                "Not renaming {}: {} already exists",
                old_path.display(),
                new_path.display()
            );
            report
                .failed
                .push((old_path, format!("{} already exists", new_path.display())));
            continue;
        }
        match fs::rename(&old_path, &new_path) {
            Ok(()) => {
                info!("Renamed: {} -> {}", old_path.display(), new_path.display());
                report.renamed.push(new_path);
            }
            Err(e) => {
                warn!("Error renaming {}: {e}", old_path.display());
                report.failed.push((old_path, e.to_string()));
            }
        }
    }
    Ok(report)
}

/// Runs [`add_csv_extension`] over `{base_dir}/{year}` and its `playoffs`
/// subdirectory for each year that has a directory.
pub fn rename_lineup_files(base_dir: &Path, years: impl IntoIterator<Item = i32>) -> RenameReport {
    let mut report = RenameReport::default();
    for year in years {
        let year_dir = base_dir.join(year.to_string());
        if !year_dir.is_dir() {
            continue;
        }
        info!("Processing year {year}...");
        for dir in [year_dir.clone(), year_dir.join("playoffs")] {
            if !dir.is_dir() {
                continue;
            }
            match add_csv_extension(&dir) {
                Ok(dir_report) => report.absorb(dir_report),
                Err(e) => {
                    warn!("{e:#}");
                    report.failed.push((dir, e.to_string()));
                }
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renames_bare_files_in_year_and_playoff_dirs() {
        let base = tempfile::tempdir().unwrap();
        let year = base.path().join("2020");
        fs::create_dir_all(year.join("playoffs")).unwrap();
        fs::write(year.join("5-man"), "a,b\n").unwrap();
        fs::write(year.join("notes.txt"), "keep").unwrap();
        fs::write(year.join("playoffs/2-man"), "a,b\n").unwrap();

        let report = rename_lineup_files(base.path(), 2013..=2025);
        assert_eq!(report.renamed.len(), 2);
        assert!(report.failed.is_empty());
        assert!(year.join("5-man.csv").is_file());
        assert!(year.join("playoffs/2-man.csv").is_file());
        assert!(year.join("notes.txt").is_file());
    }

    #[test]
    fn collisions_are_reported_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("3-man"), "new").unwrap();
        fs::write(dir.path().join("3-man.csv"), "old").unwrap();
        fs::write(dir.path().join("4-man"), "fine").unwrap();

        let report = add_csv_extension(dir.path()).unwrap();
        assert_eq!(report.renamed, [dir.path().join("4-man.csv")]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(fs::read_to_string(dir.path().join("3-man.csv")).unwrap(), "old");
        assert!(dir.path().join("3-man").is_file());
    }

    #[test]
    fn writes_pretty_json_into_new_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a/b/info.json");
        write_json(&path, &serde_json::json!({"full_name": "Anthony Davis"})).unwrap();
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "{\n  \"full_name\": \"Anthony Davis\"\n}"
        );
    }
}
