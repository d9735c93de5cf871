pub mod cache;
pub(crate) mod config;
pub mod cookie;
pub mod error;
pub mod judge;
pub mod language;
pub mod poll;
pub mod problem;
pub mod profile;
pub(crate) mod random;
pub mod submitter;
pub mod tracker;

pub use error::{Error, Kind, Result};
pub use problem::{parse_filename, ProblemIdentifier, SourceFile};
pub use submitter::{Receipt, Submitter};
