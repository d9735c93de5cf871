extern crate reqwest;
extern crate serde;
extern crate serde_yaml;

use crate::{
    cache::SourceHistory,
    config::{cookie::AUTH_COOKIE, session::BASE_URL},
    cookie::{CookieMode, CookieStore, FileStore, MemoryStore, NativeJar, SessionContext},
    error::{Error, Kind, Result},
    judge::Session,
    language::Language,
    submitter::Submitter,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs::File,
    io::{BufReader, Read},
    path::{Path, PathBuf},
    sync::Arc,
};

/// Runtime settings, read from a yaml file. Every field may be omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub base_url: String,
    /// Handle offered when logging in with a password.
    pub handle: Option<String>,
    pub cookie_mode: CookieMode,
    pub auth_cookie: String,
    /// Where the persistent browser cookies live; memory only when unset.
    pub cookie_file: Option<PathBuf>,
    pub history_file: Option<PathBuf>,
    pub proxy: Option<String>,
    /// Compiler id to use instead of the recommended one.
    pub language: HashMap<Language, String>,
}

impl Default for Profile {
    fn default() -> Self {
        Profile {
            base_url: BASE_URL.to_owned(),
            handle: None,
            cookie_mode: CookieMode::default(),
            auth_cookie: AUTH_COOKIE.to_owned(),
            cookie_file: None,
            history_file: None,
            proxy: None,
            language: HashMap::new(),
        }
    }
}

pub fn from_reader<R: Read>(rdr: R) -> Result<Profile> {
    Ok(serde_yaml::from_reader(rdr)?)
}

impl Profile {
    /// Reads `path`, falling back to the defaults when it does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            from_reader(BufReader::new(File::open(path)?))
        } else {
            Ok(Self::default())
        }
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|e| {
            Error::with_description(Kind::Parse, format!("Bad base url {}: {}", self.base_url, e))
        })
    }

    pub fn context(&self) -> Result<Arc<SessionContext>> {
        let base = self.base_url()?;
        let domain = base
            .host_str()
            .ok_or_else(|| {
                Error::with_description(Kind::Parse, format!("No host in {}", self.base_url))
            })?
            .to_owned();
        let persistent: Arc<dyn CookieStore> = match &self.cookie_file {
            Some(p) => Arc::new(FileStore::open(p)?),
            None => Arc::new(MemoryStore::new()),
        };
        Ok(Arc::new(SessionContext::new(
            domain,
            self.auth_cookie.clone(),
            NativeJar::new(base),
            persistent,
            Arc::new(MemoryStore::new()),
            self.cookie_mode,
        )))
    }

    pub fn session(&self) -> Result<Arc<Session>> {
        Ok(Arc::new(Session::with_proxy(
            self.base_url()?,
            self.context()?,
            self.proxy.as_deref(),
        )?))
    }

    pub fn history(&self) -> Result<SourceHistory> {
        match &self.history_file {
            Some(p) => SourceHistory::open(p),
            None => Ok(SourceHistory::new()),
        }
    }

    pub fn submitter(&self) -> Result<Submitter> {
        Ok(Submitter::new(self.session()?, self.history()?).with_compilers(self.language.clone()))
    }
}
