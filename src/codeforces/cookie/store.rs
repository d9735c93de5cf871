extern crate log;
extern crate reqwest;
extern crate serde_yaml;

use super::{merge, Cookie, CookieStore};
use crate::error::Result;
use log::{debug, warn};
use reqwest::{cookie::Jar, Url};
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

type DomainMap = BTreeMap<String, Vec<Cookie>>;

/// Cookies held only for the lifetime of the process.
#[derive(Default)]
pub struct MemoryStore {
    cookies: RwLock<DomainMap>,
}
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}
impl CookieStore for MemoryStore {
    fn cookies(&self, domain: &str) -> Vec<Cookie> {
        self.cookies
            .read()
            .map(|m| m.get(domain).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
    fn set_cookies(&self, domain: &str, cookies: &[Cookie]) {
        if let Ok(mut m) = self.cookies.write() {
            merge(m.entry(domain.to_owned()).or_default(), cookies);
        }
    }
    fn clear(&self, domain: &str) {
        if let Ok(mut m) = self.cookies.write() {
            m.remove(domain);
        }
    }
}

/// Cookies kept in a yaml file, rewritten after every change.
pub struct FileStore {
    path: PathBuf,
    cookies: RwLock<DomainMap>,
}
impl FileStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let cookies = if path.exists() {
            serde_yaml::from_reader(BufReader::new(File::open(&path)?))?
        } else {
            DomainMap::new()
        };
        Ok(Self {
            path,
            cookies: RwLock::new(cookies),
        })
    }
    fn save(&self, map: &DomainMap) -> Result<()> {
        serde_yaml::to_writer(BufWriter::new(File::create(&self.path)?), map)?;
        Ok(())
    }
    fn update<F: FnOnce(&mut DomainMap)>(&self, fun: F) {
        if let Ok(mut m) = self.cookies.write() {
            fun(&mut m);
            if let Err(e) = self.save(&m) {
                warn!("Failed to save cookies to {}: {}", self.path.display(), e);
            }
        }
    }
}
impl CookieStore for FileStore {
    fn cookies(&self, domain: &str) -> Vec<Cookie> {
        self.cookies
            .read()
            .map(|m| m.get(domain).cloned().unwrap_or_default())
            .unwrap_or_default()
    }
    fn set_cookies(&self, domain: &str, cookies: &[Cookie]) {
        self.update(|m| merge(m.entry(domain.to_owned()).or_default(), cookies));
    }
    fn clear(&self, domain: &str) {
        self.update(|m| {
            m.remove(domain);
        });
    }
}

/// The cookie jar used by the http client.
pub struct NativeJar {
    jar: Arc<Jar>,
    base: Url,
}
impl NativeJar {
    pub fn new(base: Url) -> Self {
        Self {
            jar: Arc::new(Jar::default()),
            base,
        }
    }
    pub fn jar(&self) -> Arc<Jar> {
        self.jar.clone()
    }
    fn url_for(&self, domain: &str) -> Option<Url> {
        let mut url = self.base.clone();
        url.set_host(Some(domain)).ok()?;
        url.set_path("/");
        Some(url)
    }
}
impl CookieStore for NativeJar {
    /// Cookies sent to the domain root. The jar only exposes the `Cookie`
    /// header, so every cookie returned carries the root path.
    fn cookies(&self, domain: &str) -> Vec<Cookie> {
        use reqwest::cookie::CookieStore as _;
        let header = match self.url_for(domain).and_then(|u| self.jar.cookies(&u)) {
            Some(h) => h,
            None => return Vec::new(),
        };
        header
            .to_str()
            .unwrap_or_default()
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                Some(Cookie::new(name, value))
            })
            .collect()
    }
    fn set_cookies(&self, domain: &str, cookies: &[Cookie]) {
        if let Some(url) = self.url_for(domain) {
            for c in cookies {
                self.jar
                    .add_cookie_str(&format!("{}={}; Path={}", c.name, c.value, c.path), &url);
            }
            debug!("Installed {} cookies for {} into native jar", cookies.len(), domain);
        }
    }
    fn clear(&self, domain: &str) {
        if let Some(url) = self.url_for(domain) {
            for c in self.cookies(domain) {
                self.jar
                    .add_cookie_str(&format!("{}=; Path=/; Max-Age=0", c.name), &url);
            }
        }
    }
}
