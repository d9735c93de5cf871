extern crate log;
extern crate reqwest;

use super::{
    page::{find_csrf, find_handle, find_logout},
    retry::async_retry,
};
use crate::{
    config::session::{REQUEST_TIMEOUT, VERBOSE},
    cookie::{Cookie, SessionContext},
    error::{auth_error, network_error, regex_mismatch, Error, Kind, Result},
    random::random_ftaa,
};
use log::{debug, info};
use reqwest::{Client, ClientBuilder, Proxy, Url};
use std::sync::Arc;

pub(super) const BFAA: &str = "f1b3f18c715565b589b7823cda7448ce";
const FIREFOX_UA: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:109.0) Gecko/20100101 Firefox/115.0";

/// Http side of a login: a client sharing the native jar of `context`.
pub struct Session {
    pub(super) client: Client,
    pub(super) base: Url,
    pub(super) ftaa: String,
    pub(super) context: Arc<SessionContext>,
}

impl Session {
    fn from_builder(builder: ClientBuilder, base: Url, context: Arc<SessionContext>) -> Result<Self> {
        Ok(Session {
            client: builder
                .user_agent(FIREFOX_UA)
                .cookie_provider(context.jar())
                .timeout(REQUEST_TIMEOUT)
                .connection_verbose(VERBOSE)
                .build()
                .map_err(|e| Error::with_kind(Kind::Build(e)))?,
            base,
            ftaa: random_ftaa(18),
            context,
        })
    }
    pub fn new(base: Url, context: Arc<SessionContext>) -> Result<Self> {
        Self::from_builder(Client::builder(), base, context)
    }
    pub fn with_proxy(base: Url, context: Arc<SessionContext>, proxy: Option<&str>) -> Result<Self> {
        match proxy {
            Some(p) => Self::from_builder(
                Client::builder().proxy(Proxy::all(p).map_err(|e| Error::with_kind(Kind::Build(e)))?),
                base,
                context,
            ),
            None => Self::new(base, context),
        }
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }
    pub(super) fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| regex_mismatch(format!("Bad url {}: {}", path, e)))
    }

    /// GET with retries; returns the final url after redirects and the body.
    pub(super) async fn get_page(&self, url: Url) -> Result<(Url, String)> {
        let client = &self.client;
        debug!("GET {}", url);
        async_retry(move || {
            let request = client.get(url.clone());
            async move {
                let response = request.send().await?.error_for_status()?;
                let url = response.url().clone();
                Ok((url, response.text().await?))
            }
        })
        .await
    }
    pub(super) async fn get_csrf(&self, url: Url) -> Result<String> {
        let (_, body) = self.get_page(url).await?;
        find_csrf(&body)
    }

    pub async fn login(&self, handle: &str, password: &str) -> Result<()> {
        let url = self.url("/enter")?;
        let csrf = self.get_csrf(url.clone()).await?;
        let body = async_retry(|| {
            self.client
                .post(url.clone())
                .form(&[
                    ("csrf_token", csrf.as_str()),
                    ("action", "enter"),
                    ("ftaa", self.ftaa.as_str()),
                    ("bfaa", BFAA),
                    ("handleOrEmail", handle),
                    ("password", password),
                    ("_tta", "176"),
                    ("remember", "on"),
                ])
                .send()
        })
        .await?
        .text()
        .await
        .map_err(network_error)?;
        match find_handle(&body) {
            Some(h) => {
                info!("Logged into {} as {}", self.context.domain(), h);
                self.remember_handle(&h);
                Ok(())
            }
            None => Err(auth_error("Failed to log into codeforces")),
        }
    }

    /// Records `handle` in the auth cookie so the browser stores see the login.
    fn remember_handle(&self, handle: &str) {
        let ctx = &self.context;
        ctx.native()
            .set_cookies(ctx.domain(), &[Cookie::new(ctx.auth_cookie(), handle)]);
        ctx.sync_native_to_embedded();
    }

    /// Asks the home page who is logged in.
    pub async fn detect_handle(&self) -> Result<Option<String>> {
        let (_, body) = self.get_page(self.url("/")?).await?;
        Ok(find_handle(&body))
    }

    pub async fn logout(&self) -> Result<()> {
        let (_, body) = self.get_page(self.url("/")?).await?;
        let token = find_logout(&body).ok_or_else(|| regex_mismatch("Logout url regex mismatch"))?;
        self.get_page(self.url(&format!("/{}/logout", token))?).await?;
        self.context.clear();
        info!("Logged out from {}", self.context.domain());
        Ok(())
    }
}
