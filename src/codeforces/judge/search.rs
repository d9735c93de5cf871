extern crate regex;

use regex::Regex;

pub(super) fn search_text(text: &str, regex: &Regex) -> Option<String> {
    regex
        .captures(text)
        .and_then(|v| v.get(1))
        .map(|v| v.as_str().to_owned())
}

/// First capture among `regexes` that matches.
pub(super) fn search_any(text: &str, regexes: &[Regex]) -> Option<String> {
    regexes.iter().find_map(|r| search_text(text, r))
}
