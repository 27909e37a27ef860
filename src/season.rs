use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer};

use crate::error::ScrapeError;

/// One NBA season, keyed by the calendar year it ends in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Season {
    end_year: i32,
}

impl Season {
    pub fn ending(end_year: i32) -> Self {
        Self { end_year }
    }

    pub fn end_year(&self) -> i32 {
        self.end_year
    }

    pub fn start_year(&self) -> i32 {
        self.end_year - 1
    }

    /// `2012-13`
    pub fn label(&self) -> String {
        format!("{}-{:02}", self.start_year(), self.end_year.rem_euclid(100))
    }

    /// `2012-2013`
    pub fn span_label(&self) -> String {
        format!("{}-{}", self.start_year(), self.end_year)
    }

    /// `2012_2013`, used in table and file names.
    pub fn table_suffix(&self) -> String {
        format!("{}_{}", self.start_year(), self.end_year)
    }

    /// Every season from `first` to `last`, both inclusive.
    pub fn range(first: Season, last: Season) -> Vec<Season> {
        (first.end_year..=last.end_year).map(Season::ending).collect()
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for Season {
    type Err = ScrapeError;

    /// Accepts a bare end year (`2013`) or a season label (`2012-13`,
    /// `2012-2013`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ScrapeError::InvalidSeason(s.to_string());
        let s = s.trim();
        match s.split_once('-') {
            None => s.parse().map(Season::ending).map_err(|_| invalid()),
            Some((start, end)) => {
                let start: i32 = start.parse().map_err(|_| invalid())?;
                let end = match end.len() {
                    2 => {
                        let short: i32 = end.parse().map_err(|_| invalid())?;
                        (start / 100) * 100 + short + if short < start % 100 { 100 } else { 0 }
                    }
                    4 => end.parse().map_err(|_| invalid())?,
                    _ => return Err(invalid()),
                };
                if end != start + 1 {
                    return Err(invalid());
                }
                Ok(Season::ending(end))
            }
        }
    }
}

impl<'de> Deserialize<'de> for Season {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
