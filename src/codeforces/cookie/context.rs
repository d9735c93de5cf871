extern crate log;
extern crate reqwest;
extern crate serde;

use super::{validate_handle, CookieStore, NativeJar, ROOT_PATH};
use crate::poll::{poll_until, Backoff};
use log::{debug, info};
use reqwest::cookie::Jar;
use serde::{Deserialize, Serialize};
use std::{
    fmt,
    sync::{Arc, RwLock},
};

/// Which browser cookie store is in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieMode {
    Persistent,
    Ephemeral,
}
impl CookieMode {
    pub fn other(self) -> Self {
        match self {
            CookieMode::Persistent => CookieMode::Ephemeral,
            CookieMode::Ephemeral => CookieMode::Persistent,
        }
    }
}
impl Default for CookieMode {
    fn default() -> Self {
        CookieMode::Persistent
    }
}

/// Session state shared by the http client and the login browser: the
/// native jar plus the persistent and ephemeral browser stores.
pub struct SessionContext {
    domain: String,
    auth_cookie: String,
    native: Arc<NativeJar>,
    persistent: Arc<dyn CookieStore>,
    ephemeral: Arc<dyn CookieStore>,
    mode: RwLock<CookieMode>,
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionContext")
            .field("domain", &self.domain)
            .field("auth_cookie", &self.auth_cookie)
            .field("mode", &self.mode())
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(
        domain: String,
        auth_cookie: String,
        native: NativeJar,
        persistent: Arc<dyn CookieStore>,
        ephemeral: Arc<dyn CookieStore>,
        mode: CookieMode,
    ) -> Self {
        Self {
            domain,
            auth_cookie,
            native: Arc::new(native),
            persistent,
            ephemeral,
            mode: RwLock::new(mode),
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }
    pub fn auth_cookie(&self) -> &str {
        &self.auth_cookie
    }
    pub fn jar(&self) -> Arc<Jar> {
        self.native.jar()
    }
    pub fn native(&self) -> &dyn CookieStore {
        self.native.as_ref()
    }
    pub fn mode(&self) -> CookieMode {
        self.mode.read().map(|m| *m).unwrap_or_default()
    }
    pub fn set_mode(&self, mode: CookieMode) {
        if let Ok(mut m) = self.mode.write() {
            *m = mode;
        }
    }
    fn store(&self, mode: CookieMode) -> &dyn CookieStore {
        match mode {
            CookieMode::Persistent => self.persistent.as_ref(),
            CookieMode::Ephemeral => self.ephemeral.as_ref(),
        }
    }
    /// The browser store selected by the current mode.
    pub fn embedded(&self) -> &dyn CookieStore {
        self.store(self.mode())
    }

    /// Only root path cookies cross stores; the native jar cannot report
    /// the path of anything else.
    fn copy(&self, from: &dyn CookieStore, to: &dyn CookieStore) -> bool {
        let cookies: Vec<_> = from
            .cookies(&self.domain)
            .into_iter()
            .filter(|c| c.path == ROOT_PATH)
            .collect();
        if cookies.is_empty() {
            return false;
        }
        to.set_cookies(&self.domain, &cookies);
        true
    }
    pub fn sync_embedded_to_native(&self) -> bool {
        let copied = self.copy(self.embedded(), self.native());
        debug!("Synced browser cookies to native jar: {}", copied);
        copied
    }
    pub fn sync_native_to_embedded(&self) -> bool {
        let copied = self.copy(self.native(), self.embedded());
        debug!("Synced native cookies to browser store: {}", copied);
        copied
    }

    fn handle_in(&self, store: &dyn CookieStore) -> Option<String> {
        store
            .cookies(&self.domain)
            .into_iter()
            .find(|c| c.name == self.auth_cookie)
            .and_then(|c| validate_handle(&c.value))
    }
    /// Handle of the logged in user, read from the auth cookie of the browser
    /// store and then the native jar.
    pub fn current_handle(&self) -> Option<String> {
        self.handle_in(self.embedded())
            .or_else(|| self.handle_in(self.native()))
    }

    /// Copies the other mode's cookies into the active store when only the
    /// other store holds a valid login.
    pub fn try_sync_other_store_if_needed(&self) -> bool {
        let mode = self.mode();
        if self.handle_in(self.store(mode)).is_some() {
            return false;
        }
        let other = self.store(mode.other());
        if self.handle_in(other).is_none() {
            return false;
        }
        info!("Found login in {:?} cookie store, copying it", mode.other());
        self.copy(other, self.store(mode))
    }

    /// Waits for a login to become visible, re-syncing before every check.
    pub async fn wait_for_login(&self, policy: &Backoff) -> Option<String> {
        let this = self;
        poll_until(policy, move |_| async move {
            this.try_sync_other_store_if_needed();
            this.sync_embedded_to_native();
            Ok(this.current_handle())
        })
        .await
        .ok()
        .flatten()
    }

    /// Forgets the session in every store.
    pub fn clear(&self) {
        self.native.clear(&self.domain);
        self.persistent.clear(&self.domain);
        self.ephemeral.clear(&self.domain);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cookie::{Cookie, MemoryStore};
    use reqwest::Url;

    const DOMAIN: &str = "codeforces.com";

    fn context(mode: CookieMode) -> (SessionContext, Arc<MemoryStore>, Arc<MemoryStore>) {
        let persistent = Arc::new(MemoryStore::new());
        let ephemeral = Arc::new(MemoryStore::new());
        let ctx = SessionContext::new(
            DOMAIN.to_owned(),
            "X-User".to_owned(),
            NativeJar::new(Url::parse("https://codeforces.com").unwrap()),
            persistent.clone(),
            ephemeral.clone(),
            mode,
        );
        (ctx, persistent, ephemeral)
    }

    fn sorted(mut list: Vec<Cookie>) -> Vec<Cookie> {
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    #[test]
    fn sync_to_native_is_idempotent() {
        let (ctx, persistent, _) = context(CookieMode::Persistent);
        persistent.set_cookies(
            DOMAIN,
            &[Cookie::new("X-User", "tourist"), Cookie::new("JSESSIONID", "S1")],
        );
        assert!(ctx.sync_embedded_to_native());
        let first = sorted(ctx.native().cookies(DOMAIN));
        assert!(ctx.sync_embedded_to_native());
        let second = sorted(ctx.native().cookies(DOMAIN));
        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
    }

    #[test]
    fn sync_back_to_browser() {
        let (ctx, persistent, _) = context(CookieMode::Persistent);
        assert!(!ctx.sync_native_to_embedded());
        ctx.native()
            .set_cookies(DOMAIN, &[Cookie::new("JSESSIONID", "S2")]);
        assert!(ctx.sync_native_to_embedded());
        assert_eq!(persistent.cookies(DOMAIN), vec![Cookie::new("JSESSIONID", "S2")]);
    }

    #[test]
    fn not_logged_in_is_none() {
        let (ctx, persistent, _) = context(CookieMode::Persistent);
        assert_eq!(ctx.current_handle(), None);
        persistent.set_cookies(DOMAIN, &[Cookie::new("X-User", "bad handle!")]);
        assert_eq!(ctx.current_handle(), None);
        persistent.set_cookies(DOMAIN, &[Cookie::new("X-User", "tourist")]);
        assert_eq!(ctx.current_handle().as_deref(), Some("tourist"));
    }

    #[test]
    fn copies_login_from_other_mode() {
        let (ctx, persistent, ephemeral) = context(CookieMode::Ephemeral);
        assert!(!ctx.try_sync_other_store_if_needed());
        persistent.set_cookies(DOMAIN, &[Cookie::new("X-User", "tourist")]);
        assert!(ctx.try_sync_other_store_if_needed());
        assert_eq!(ephemeral.cookies(DOMAIN), vec![Cookie::new("X-User", "tourist")]);
        // active store already logged in
        assert!(!ctx.try_sync_other_store_if_needed());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_for_login_picks_up_late_cookie() {
        let (ctx, _, ephemeral) = context(CookieMode::Persistent);
        let ctx = Arc::new(ctx);
        let writer = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            ephemeral.set_cookies(DOMAIN, &[Cookie::new("X-User", "tourist")]);
        });
        let handle = ctx.wait_for_login(&Backoff::login()).await;
        writer.await.unwrap();
        assert_eq!(handle.as_deref(), Some("tourist"));
        assert_eq!(
            ctx.native().cookies(DOMAIN),
            vec![Cookie::new("X-User", "tourist")]
        );
    }

    #[test]
    fn scoped_cookies_stay_in_browser_store() {
        let (ctx, persistent, _) = context(CookieMode::Persistent);
        let mut scoped = Cookie::new("RCPC", "r1");
        scoped.path = String::from("/contest");
        persistent.set_cookies(DOMAIN, &[Cookie::new("X-User", "tourist"), scoped.clone()]);
        assert!(ctx.sync_embedded_to_native());
        assert_eq!(ctx.native().cookies(DOMAIN), vec![Cookie::new("X-User", "tourist")]);
        assert!(ctx.sync_native_to_embedded());
        assert_eq!(
            sorted(persistent.cookies(DOMAIN)),
            vec![scoped, Cookie::new("X-User", "tourist")]
        );
    }

    #[test]
    fn debug_shows_domain_and_mode() {
        let (ctx, _, _) = context(CookieMode::Ephemeral);
        let text = format!("{:?}", ctx);
        assert!(text.contains("codeforces.com"));
        assert!(text.contains("Ephemeral"));
    }

    #[test]
    fn clear_forgets_everything() {
        let (ctx, persistent, _) = context(CookieMode::Persistent);
        persistent.set_cookies(DOMAIN, &[Cookie::new("X-User", "tourist")]);
        ctx.sync_embedded_to_native();
        ctx.clear();
        assert_eq!(ctx.current_handle(), None);
        assert!(ctx.native().cookies(DOMAIN).is_empty());
    }
}
