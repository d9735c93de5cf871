extern crate lazy_static;
extern crate regex;

use super::search::{search_any, search_text};
use crate::{
    error::{regex_mismatch, Result},
    language::LanguageOption,
};
use lazy_static::lazy_static;
use regex::Regex;

struct RegexSet {
    csrf: [Regex; 3],
    select: Regex,
    option: Regex,
    handle: Regex,
    logout: Regex,
    error: Regex,
}
impl RegexSet {
    fn new() -> Self {
        Self {
            csrf: [
                Regex::new(r#"name=["']X-Csrf-Token["']\s+content=["']([[:alnum:]]+)["']"#).unwrap(),
                Regex::new(r#"data-csrf=["']([[:alnum:]]+)["']"#).unwrap(),
                Regex::new(r#"name=["']csrf_token["']\s+value=["']([[:alnum:]]+)["']"#).unwrap(),
            ],
            select: Regex::new(r#"(?s)<select[^>]*name=["']programTypeId["'][^>]*>(.*?)</select>"#)
                .unwrap(),
            option: Regex::new(r#"(?s)<option[^>]*value=["']([^"']+)["'][^>]*>(.*?)</option>"#)
                .unwrap(),
            handle: Regex::new(r#"handle = "([[:word:]\-]+)""#).unwrap(),
            logout: Regex::new(r#"<a href="/([[:xdigit:]]+)/logout""#).unwrap(),
            error: Regex::new(r#"class="error[a-zA-Z_\-\\ ]*">(.*?)</span>"#).unwrap(),
        }
    }
}
lazy_static! {
    static ref REGEX: RegexSet = RegexSet::new();
}

/// What the submit form needs from the submit page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitPage {
    pub csrf_token: String,
    pub options: Vec<LanguageOption>,
}

fn unescape(text: &str) -> String {
    text.trim()
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

pub(super) fn find_csrf(html: &str) -> Result<String> {
    search_any(html, &REGEX.csrf).ok_or_else(|| regex_mismatch("Can't find csrf token"))
}

/// All scraping of the submit page lives here.
pub fn parse_submit_page(html: &str) -> Result<SubmitPage> {
    let csrf_token = find_csrf(html)?;
    let options = match REGEX.select.captures(html).and_then(|c| c.get(1)) {
        Some(body) => REGEX
            .option
            .captures_iter(body.as_str())
            .filter_map(|c| {
                Some(LanguageOption {
                    id: c.get(1)?.as_str().to_owned(),
                    display_text: unescape(c.get(2)?.as_str()),
                })
            })
            .collect(),
        None => Vec::new(),
    };
    Ok(SubmitPage {
        csrf_token,
        options,
    })
}

/// Handle of the logged in user from the page script, if any.
pub(super) fn find_handle(html: &str) -> Option<String> {
    search_text(html, &REGEX.handle)
}
pub(super) fn find_logout(html: &str) -> Option<String> {
    search_text(html, &REGEX.logout)
}
/// Inline form errors, joined when there are several.
pub(super) fn find_error(html: &str) -> Option<String> {
    let text = REGEX
        .error
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| unescape(m.as_str()))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("; ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
