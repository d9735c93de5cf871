extern crate reqwest;
extern crate serde_yaml;

use std::{boxed::Box, convert::Into, error::Error as StdError, fmt, io, result::Result as StdResult};

#[derive(Debug)]
pub struct Error(Box<Inner>);

#[derive(Debug)]
pub enum Kind {
    Build(reqwest::Error),
    Network(reqwest::Error),
    Parse,
    Auth,
    Rejected,
    Unsupported,
    Api,
    Io(io::Error),
    Yaml(serde_yaml::Error),
}
#[derive(Debug)]
struct Inner {
    kind: Kind,
    description: Option<String>,
}

pub type Result<T> = StdResult<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.kind {
            Kind::Build(err) => write!(f, "Error building client: {}", err),
            Kind::Network(err) => write!(f, "Error sending request: {}", err),
            Kind::Parse => {
                write!(f, "Unexpected page content")?;
                self.write_description(f)
            }
            Kind::Auth => {
                write!(f, "Not logged into codeforces")?;
                self.write_description(f)
            }
            Kind::Rejected => {
                write!(f, "Submission rejected")?;
                self.write_description(f)
            }
            Kind::Unsupported => {
                write!(f, "Not submittable")?;
                self.write_description(f)
            }
            Kind::Api => {
                write!(f, "API request failed")?;
                self.write_description(f)
            }
            Kind::Io(err) => write!(f, "Error accessing file: {}", err),
            Kind::Yaml(err) => write!(f, "Error processing yaml: {}", err),
        }
    }
}
impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.0.kind {
            Kind::Build(x) | Kind::Network(x) => Some(x),
            Kind::Io(x) => Some(x),
            Kind::Yaml(x) => Some(x),
            Kind::Parse | Kind::Auth | Kind::Rejected | Kind::Unsupported | Kind::Api => None,
        }
    }
}
impl Error {
    fn new(inner: Inner) -> Self {
        Self(Box::new(inner))
    }
    pub fn with_kind(kind: Kind) -> Self {
        Self::new(Inner {
            kind,
            description: None,
        })
    }
    pub fn with_description<T: Into<String>>(kind: Kind, description: T) -> Self {
        Self::new(Inner {
            kind,
            description: Some(description.into()),
        })
    }
    pub fn kind(&self) -> &Kind {
        &self.0.kind
    }
    pub fn description(&self) -> Option<&str> {
        self.0.description.as_deref()
    }
    /// Only connectivity failures are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self.0.kind, Kind::Network(_))
    }
    fn write_description(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(d) = &self.0.description {
            write!(f, ": {}", d)
        } else {
            Ok(())
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::with_kind(Kind::Io(err))
    }
}
impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::with_kind(Kind::Yaml(err))
    }
}

pub(crate) fn network_error(err: reqwest::Error) -> Error {
    Error::with_kind(Kind::Network(err))
}
pub(crate) fn regex_mismatch<T: Into<String>>(description: T) -> Error {
    Error::with_description(Kind::Parse, description)
}
pub(crate) fn auth_error<T: Into<String>>(description: T) -> Error {
    Error::with_description(Kind::Auth, description)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_is_kept_verbatim() {
        let err = Error::with_description(
            Kind::Rejected,
            "You have submitted exactly the same code before",
        );
        assert_eq!(
            err.to_string(),
            "Submission rejected: You have submitted exactly the same code before"
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn parse_error_without_description() {
        let err = Error::with_kind(Kind::Parse);
        assert_eq!(err.to_string(), "Unexpected page content");
        assert!(err.source().is_none());
    }
}
