//! Free-text biography parsing.
//!
//! The player page prints its biography as a stack of `<p>` lines inside
//! `div#meta` ("Position: … ▪ Shoots: …", "Born: … in …", "Draft: …").
//! Each recognized label has its own rule, a pure function from one line to
//! the fields it finds there. Every rule runs on every line and the results
//! are merged into one [`Biography`]. A rule that cannot make sense of its
//! line simply yields nothing for it.

use std::collections::BTreeMap;

use regex::Regex;
use scraper::{ElementRef, Html, Node};
use serde::Serialize;

use crate::{
    table::selector,
    text_manipulators::{collapse_whitespace, extract_text},
};

/// Separators the site puts between labels sharing one line.
const SEPARATORS: [char; 2] = ['▪', '•'];

/// Class of the span holding a birth place's country code.
const COUNTRY_CODE_CLASS: &str = "f-i";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BioValue {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for BioValue {
    fn from(value: &str) -> Self {
        BioValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub href: String,
    pub text: String,
}

/// One paragraph of the biography: its text with whitespace collapsed, and
/// the links inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BioBlock {
    pub text: String,
    pub links: Vec<Link>,
}

impl BioBlock {
    pub fn new(text: &str) -> Self {
        Self {
            text: collapse_whitespace(text),
            links: Vec::new(),
        }
    }

    pub fn with_link(mut self, href: &str, text: &str) -> Self {
        self.links.push(Link {
            href: href.to_string(),
            text: text.trim().to_string(),
        });
        self
    }

    /// Text of the paragraph without its flag/country-code spans
    /// (`<span class="f-i f-us">us</span>` after a birth place).
    fn from_element(paragraph: ElementRef) -> anyhow::Result<Self> {
        let link_selector = selector("a")?;
        let text: String = paragraph
            .descendants()
            .filter(|node| !node.ancestors().any(|ancestor| is_country_code(ancestor.value())))
            .filter_map(|node| node.value().as_text().map(|text| &**text))
            .collect();
        let links = paragraph
            .select(&link_selector)
            .map(|a| Link {
                href: a.value().attr("href").unwrap_or_default().to_string(),
                text: extract_text(a),
            })
            .collect();
        Ok(Self {
            text: collapse_whitespace(&text),
            links,
        })
    }

    fn has_label(&self, label: &str) -> bool {
        self.text.contains(label)
    }

    /// Text after the first occurrence of `label`, trimmed.
    fn after_label(&self, label: &str) -> Option<&str> {
        self.text
            .split_once(label)
            .map(|(_, rest)| rest.trim())
    }

    fn link_where(&self, predicate: impl Fn(&str) -> bool) -> Option<&Link> {
        self.links
            .iter()
            .find(|link| predicate(&link.href.to_lowercase()))
    }

    fn first_link(&self) -> Option<&Link> {
        self.links.first().filter(|link| !link.text.is_empty())
    }
}

fn is_country_code(node: &Node) -> bool {
    node.as_element().is_some_and(|element| {
        element
            .attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|class| class == COUNTRY_CODE_CLASS))
    })
}

/// Which value survives when the same field turns up on several lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    #[default]
    LastWriteWins,
    FirstWriteWins,
}

/// Flat field name -> value snapshot of one person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Biography {
    fields: BTreeMap<String, BioValue>,
}

impl Biography {
    pub fn get(&self, field: &str) -> Option<&BioValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match self.fields.get(field)? {
            BioValue::Text(text) => Some(text.as_str()),
            BioValue::List(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn merge(&mut self, updates: Vec<FieldUpdate>, policy: DuplicatePolicy) {
        for (field, value) in updates {
            match policy {
                DuplicatePolicy::LastWriteWins => {
                    self.fields.insert(field.to_string(), value);
                }
                DuplicatePolicy::FirstWriteWins => {
                    self.fields.entry(field.to_string()).or_insert(value);
                }
            }
        }
    }
}

pub type FieldUpdate = (&'static str, BioValue);

type Rule = fn(&BioPatterns, &BioBlock) -> Vec<FieldUpdate>;

const RULES: [Rule; 13] = [
    position,
    shoots,
    height_weight,
    team,
    born,
    college,
    high_school,
    recruiting_rank,
    draft,
    nba_debut,
    experience,
    nicknames,
    social_handles,
];

/// Compiled patterns shared by the rules.
pub struct BioPatterns {
    height_weight: Regex,
    birth_date: Regex,
    birth_place: Regex,
    year: Regex,
    parenthesized_number: Regex,
    draft_slot: Regex,
    draft_year: Regex,
}

impl BioPatterns {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            height_weight: Regex::new(r"(\d+-\d+),\s*(\d+)\s*lb\s*\((\d+)\s*cm,\s*(\d+)\s*kg\)")?,
            birth_date: Regex::new(r"([A-Za-z]+ \d{1,2}, \d{4})")?,
            birth_place: Regex::new(r"\bin\s+([^(]+?)\s*(?:\(|$)")?,
            year: Regex::new(r"\d{4}")?,
            parenthesized_number: Regex::new(r"\((\d+)\)")?,
            draft_slot: Regex::new(
                r"(\d+)(?:st|nd|rd|th) round \((\d+)(?:st|nd|rd|th) pick, (\d+)(?:st|nd|rd|th) overall\)",
            )?,
            draft_year: Regex::new(r"(\d{4}) NBA Draft")?,
        })
    }
}

pub struct BiographyExtractor {
    patterns: BioPatterns,
    policy: DuplicatePolicy,
}

impl BiographyExtractor {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            patterns: BioPatterns::new()?,
            policy: DuplicatePolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn extract_blocks(&self, blocks: &[BioBlock]) -> Biography {
        let mut biography = Biography::default();
        for block in blocks {
            for rule in RULES {
                biography.merge(rule(&self.patterns, block), self.policy);
            }
        }
        biography
    }

    /// Reads `div#meta` of a player page. A page without it gives an empty
    /// biography.
    pub fn extract_document(&self, document: &Html) -> anyhow::Result<Biography> {
        let meta_selector = selector("div#meta")?;
        let name_selector = selector("h1")?;
        let paragraph_selector = selector("p")?;

        let Some(meta) = document.select(&meta_selector).next() else {
            return Ok(Biography::default());
        };

        let blocks = meta
            .select(&paragraph_selector)
            .map(BioBlock::from_element)
            .collect::<anyhow::Result<Vec<_>>>()?;
        let mut biography = self.extract_blocks(&blocks);

        if let Some(heading) = meta.select(&name_selector).next() {
            let name = extract_text(heading);
            if !name.is_empty() {
                biography.merge(vec![("full_name", name.as_str().into())], self.policy);
            }
        }
        Ok(biography)
    }
}

fn up_to_separator(text: &str) -> &str {
    text.split(SEPARATORS).next().unwrap_or(text).trim()
}

fn non_empty(field: &'static str, value: &str) -> Option<FieldUpdate> {
    let value = value.trim();
    (!value.is_empty()).then(|| (field, value.into()))
}

fn labelled_text(block: &BioBlock, label: &str, field: &'static str) -> Vec<FieldUpdate> {
    block
        .after_label(label)
        .and_then(|rest| non_empty(field, up_to_separator(rest)))
        .into_iter()
        .collect()
}

fn position(_: &BioPatterns, block: &BioBlock) -> Vec<FieldUpdate> {
    labelled_text(block, "Position:", "position")
}

fn shoots(_: &BioPatterns, block: &BioBlock) -> Vec<FieldUpdate> {
    labelled_text(block, "Shoots:", "shoots")
}

fn height_weight(patterns: &BioPatterns, block: &BioBlock) -> Vec<FieldUpdate> {
    let Some(caps) = patterns.height_weight.captures(&block.text) else {
        return Vec::new();
    };
    vec![
        ("height_ft_in", BioValue::from(&caps[1])),
        ("weight_lb", BioValue::from(&caps[2])),
        ("height_cm", BioValue::from(&caps[3])),
        ("weight_kg", BioValue::from(&caps[4])),
    ]
}

fn team(_: &BioPatterns, block: &BioBlock) -> Vec<FieldUpdate> {
    if !block.has_label("Team:") {
        return Vec::new();
    }
    match block.link_where(|href| href.contains("/teams/")) {
        Some(link) => non_empty("team", &link.text).into_iter().collect(),
        None => labelled_text(block, "Team:", "team"),
    }
}

fn born(patterns: &BioPatterns, block: &BioBlock) -> Vec<FieldUpdate> {
    let Some(rest) = block.after_label("Born:") else {
        return Vec::new();
    };
    let mut updates: Vec<FieldUpdate> = Vec::new();
    if let Some(caps) = patterns.birth_date.captures(rest) {
        updates.push(("birth_date", BioValue::from(&caps[1])));
    }
    if let Some(caps) = patterns.birth_place.captures(rest) {
        updates.extend(non_empty("birth_place", &caps[1]));
    }
    updates
}

fn college(_: &BioPatterns, block: &BioBlock) -> Vec<FieldUpdate> {
    let label = if block.has_label("Colleges:") {
        "Colleges:"
    } else {
        "College:"
    };
    if !block.has_label(label) {
        return Vec::new();
    }
    match block.first_link() {
        Some(link) => vec![("college", link.text.as_str().into())],
        None => labelled_text(block, label, "college"),
    }
}

fn high_school(_: &BioPatterns, block: &BioBlock) -> Vec<FieldUpdate> {
    let Some(rest) = block.after_label("High School:") else {
        return Vec::new();
    };
    let rest = up_to_separator(rest);
    match rest.split_once(" in ") {
        Some((school, location)) => non_empty("high_school", school)
            .into_iter()
            .chain(non_empty("high_school_location", location))
            .collect(),
        None => non_empty("high_school", rest).into_iter().collect(),
    }
}

fn recruiting_rank(patterns: &BioPatterns, block: &BioBlock) -> Vec<FieldUpdate> {
    let Some(rest) = block.after_label("Recruiting Rank:") else {
        return Vec::new();
    };
    let mut updates: Vec<FieldUpdate> = Vec::new();
    if let Some(year) = patterns.year.find(rest) {
        updates.push(("recruiting_rank_year", BioValue::from(year.as_str())));
    }
    if let Some(caps) = patterns.parenthesized_number.captures(rest) {
        updates.push(("recruiting_rank", BioValue::from(&caps[1])));
    }
    updates
}

fn draft(patterns: &BioPatterns, block: &BioBlock) -> Vec<FieldUpdate> {
    let Some(rest) = block.after_label("Draft:") else {
        return Vec::new();
    };
    let mut updates: Vec<FieldUpdate> = Vec::new();

    match block.link_where(|href| href.contains("/teams/")) {
        Some(link) => updates.extend(non_empty("draft_team", &link.text)),
        None => {
            if let Some((team, _)) = rest.split_once(',') {
                updates.extend(non_empty("draft_team", team));
            }
        }
    }

    if let Some(caps) = patterns.draft_slot.captures(rest) {
        updates.push(("draft_round", BioValue::from(&caps[1])));
        updates.push(("draft_pick", BioValue::from(&caps[2])));
        updates.push(("draft_overall", BioValue::from(&caps[3])));
    }

    let year = block
        .link_where(|href| href.contains("/draft/"))
        .and_then(|link| patterns.year.find(&link.text))
        .map(|year| year.as_str())
        .or_else(|| {
            patterns
                .draft_year
                .captures(rest)
                .and_then(|caps| caps.get(1))
                .map(|year| year.as_str())
        });
    if let Some(year) = year {
        updates.push(("draft_year", BioValue::from(year)));
    }
    updates
}

fn nba_debut(_: &BioPatterns, block: &BioBlock) -> Vec<FieldUpdate> {
    if !block.has_label("NBA Debut:") {
        return Vec::new();
    }
    match block.first_link() {
        Some(link) => vec![("nba_debut", link.text.as_str().into())],
        None => labelled_text(block, "NBA Debut:", "nba_debut"),
    }
}

fn experience(_: &BioPatterns, block: &BioBlock) -> Vec<FieldUpdate> {
    block
        .after_label("Experience:")
        .and_then(|rest| rest.split_whitespace().next())
        .map(|years| ("experience", BioValue::from(years)))
        .into_iter()
        .collect()
}

fn nicknames(_: &BioPatterns, block: &BioBlock) -> Vec<FieldUpdate> {
    let Some(inner) = block
        .text
        .strip_prefix('(')
        .and_then(|rest| rest.split_once(')'))
        .map(|(inner, _)| inner)
    else {
        return Vec::new();
    };
    let names: Vec<String> = inner
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    if names.is_empty() {
        return Vec::new();
    }
    vec![("nicknames", BioValue::List(names))]
}

fn social_handles(_: &BioPatterns, block: &BioBlock) -> Vec<FieldUpdate> {
    let instagram = block.link_where(|href| href.contains("instagram"));
    let twitter = block.link_where(|href| href.contains("twitter.com") || href.contains("//x.com"));
    instagram
        .and_then(|link| non_empty("instagram", &link.text))
        .into_iter()
        .chain(twitter.and_then(|link| non_empty("twitter", &link.text)))
        .collect()
}
