extern crate serde;
extern crate serde_yaml;

use super::SourceHistory;
use crate::{error::Result, problem::ProblemIdentifier};
use serde::{Deserialize, Serialize};
use serde_yaml::{from_reader, to_writer};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
};

#[derive(Serialize)]
struct SaveEntry<'a> {
    problem: &'a ProblemIdentifier,
    source: &'a str,
}
#[derive(Deserialize)]
struct LoadEntry {
    problem: ProblemIdentifier,
    source: String,
}

impl SourceHistory {
    pub fn save<W: Write>(&self, wr: W) -> Result<()> {
        let entries: Vec<_> = self
            .sources
            .iter()
            .map(|(problem, source)| SaveEntry { problem, source })
            .collect();
        to_writer(wr, &entries)?;
        Ok(())
    }
    /// Replaces the in-memory history with the content of `rdr`.
    pub fn load<R: Read>(&mut self, rdr: R) -> Result<()> {
        let entries: Vec<LoadEntry> = from_reader(rdr)?;
        self.sources = entries
            .into_iter()
            .map(|e| (e.problem, e.source))
            .collect();
        Ok(())
    }

    pub(super) fn reload(&mut self) -> Result<()> {
        match &self.path {
            Some(p) if p.exists() => {
                let file = BufReader::new(File::open(p)?);
                self.load(file)
            }
            _ => Ok(()),
        }
    }
    pub(super) fn flush(&self) -> Result<()> {
        match &self.path {
            Some(p) => self.save(BufWriter::new(File::create(p)?)),
            None => Ok(()),
        }
    }
}
