extern crate serde;

use serde::{Deserialize, Serialize};

mod context;
pub mod store;

pub use context::{CookieMode, SessionContext};
pub use store::{FileStore, MemoryStore, NativeJar};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default = "root_path")]
    pub path: String,
}
pub(crate) const ROOT_PATH: &str = "/";
fn root_path() -> String {
    String::from(ROOT_PATH)
}
impl Cookie {
    pub fn new<N: Into<String>, V: Into<String>>(name: N, value: V) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: root_path(),
        }
    }
    fn same_slot(&self, other: &Cookie) -> bool {
        self.name == other.name && self.path == other.path
    }
}

/// A cookie jar keyed by domain. Writes replace cookies with the same
/// name and path, so installing the same cookie twice is harmless.
pub trait CookieStore: Send + Sync {
    fn cookies(&self, domain: &str) -> Vec<Cookie>;
    fn set_cookies(&self, domain: &str, cookies: &[Cookie]);
    fn clear(&self, domain: &str);
}

pub(crate) fn merge(dest: &mut Vec<Cookie>, cookies: &[Cookie]) {
    for c in cookies {
        match dest.iter_mut().find(|x| x.same_slot(c)) {
            Some(slot) => slot.value = c.value.clone(),
            None => dest.push(c.clone()),
        }
    }
}

/// Returns the handle if `value` looks like one: 1 to 24 characters of
/// ascii alphanumerics, `_` or `-`.
pub fn validate_handle(value: &str) -> Option<String> {
    use crate::config::cookie::MAX_HANDLE_LEN;
    let value = value.trim().trim_matches('"');
    if value.is_empty()
        || value.len() > MAX_HANDLE_LEN
        || !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        None
    } else {
        Some(value.to_owned())
    }
}
