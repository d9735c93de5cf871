extern crate lazy_static;
extern crate regex;
extern crate serde;

use crate::language::Language;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref STEM: Regex = Regex::new(r"^(\d{3,6})[_-]?([A-Za-z][0-9A-Za-z]*)$").unwrap();
}

/// A problem addressed by contest id and index, e.g. `1873A`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProblemIdentifier {
    pub contest_id: u32,
    pub index: String,
}

impl ProblemIdentifier {
    pub fn new<T: Into<String>>(contest_id: u32, index: T) -> Self {
        Self {
            contest_id,
            index: index.into().to_uppercase(),
        }
    }
    /// Parses a filename stem such as `1873A` or `1873_a2`.
    pub fn parse(stem: &str) -> Option<Self> {
        let caps = STEM.captures(stem)?;
        let contest_id = caps.get(1)?.as_str().parse::<u32>().ok()?;
        if contest_id == 0 {
            return None;
        }
        Some(Self::new(contest_id, caps.get(2)?.as_str()))
    }

    pub fn submit_path(&self) -> String {
        format!("/contest/{}/submit", self.contest_id)
    }
    pub fn problem_path(&self) -> String {
        format!("/contest/{}/problem/{}", self.contest_id, self.index)
    }
    pub fn my_path(&self) -> String {
        format!("/contest/{}/my", self.contest_id)
    }
}
impl fmt::Display for ProblemIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.contest_id, self.index)
    }
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(pos) if pos > 0 => (&name[..pos], Some(&name[pos + 1..])),
        _ => (name, None),
    }
}

/// Parses a bare filename (no directories), ignoring its extension.
pub fn parse_filename(name: &str) -> Option<ProblemIdentifier> {
    ProblemIdentifier::parse(split_extension(name).0)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub problem: ProblemIdentifier,
    pub language: Language,
}
impl SourceFile {
    pub fn parse(name: &str) -> Option<Self> {
        let (stem, ext) = split_extension(name);
        Some(Self {
            problem: ProblemIdentifier::parse(stem)?,
            language: ext.map_or(Language::Plaintext, Language::from_extension),
        })
    }
}
